mod commands;
mod helpers;
mod loaders;

use clap::Parser;
use rastercmp_core::domain::CompareError;

pub fn run_from_env() -> i32 {
    let args = std::iter::once("rastercmp".to_string())
        .chain(std::env::args().skip(1))
        .collect::<Vec<_>>();

    match parse_and_dispatch(args) {
        Ok(code) => code,
        Err(error) => {
            let compare_error = error.as_compare_error();
            eprintln!("{}", compare_error.diagnostic_line());
            if let Some(summary_line) = compare_error.fatal_exit_line() {
                eprintln!("{}", summary_line);
            }
            compare_error.exit_code()
        }
    }
}

fn parse_and_dispatch(args: Vec<String>) -> Result<i32, CliError> {
    match Cli::try_parse_from(&args) {
        Ok(cli) => dispatch_parsed(cli.command),
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                print!("{}", err);
                Ok(0)
            }
            _ => Err(CliError::Usage(err.to_string())),
        },
    }
}

#[derive(Parser)]
#[command(
    name = "rastercmp",
    version,
    about = "Compare elevation grids produced by two implementations"
)]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// Pair serial and kernel grids in a directory and write agreement tables
    Agreement(commands::AgreementArgs),
    /// Report normalized similarity metrics between two grids
    Similarity(commands::SimilarityArgs),
}

fn dispatch_parsed(command: CliCommand) -> Result<i32, CliError> {
    match command {
        CliCommand::Agreement(args) => commands::run_agreement_command(args),
        CliCommand::Similarity(args) => commands::run_similarity_command(args),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Compare(CompareError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CliError {
    fn as_compare_error(&self) -> CompareError {
        match self {
            Self::Usage(message) => {
                CompareError::input_validation("INPUT.CLI_USAGE", message.trim_end().to_string())
            }
            Self::Compare(error) => error.clone(),
            Self::Internal(error) => CompareError::internal("INTERNAL.CLI", format!("{error:#}")),
        }
    }
}
