pub mod agreement;
pub mod plan;
pub mod report;
pub mod serialization;
pub mod similarity;

pub use agreement::{
    AgreementResult, ComparisonConfig, RoundingPolicy, compare, compare_all,
    standard_configurations,
};
pub use plan::{ComparisonPlan, PlanError, load_comparison_plan};
pub use report::{
    AgreementRow, AgreementTable, render_agreement_table, render_similarity_report,
};
pub use similarity::{
    Discrepancy, GridStatistics, PixelProbe, SimilarityReport, SimilaritySettings, analyze,
    analyze_default,
};
