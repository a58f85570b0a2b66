use rastercmp_core::domain::Grid;
use rastercmp_core::modules::agreement::{
    ComparisonConfig, RoundingPolicy, compare, compare_all, standard_configurations,
};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

fn fixture_path() -> PathBuf {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/agreement_cases.json")
}

#[derive(Debug, Deserialize)]
struct AgreementFixtures {
    cases: Vec<AgreementCase>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AgreementCase {
    id: String,
    grid_a: Vec<Vec<f64>>,
    grid_b: Vec<Vec<f64>>,
    precision: f64,
    policy: RoundingPolicy,
    expected_mismatch_count: usize,
    expected_total_cells: usize,
    expected_median_abs_diff: f64,
    expected_similarity_percent: f64,
}

fn grid(rows: Vec<Vec<f64>>) -> Grid {
    Grid::from_rows(rows).expect("fixture grid should build")
}

#[test]
fn agreement_fixture_cases_match_expected_values() {
    let content = fs::read_to_string(fixture_path()).expect("fixture should be readable");
    let fixtures: AgreementFixtures =
        serde_json::from_str(&content).expect("fixture should parse");
    assert!(!fixtures.cases.is_empty());

    for case in fixtures.cases {
        let grid_a = grid(case.grid_a);
        let grid_b = grid(case.grid_b);
        let result = compare(
            &grid_a,
            &grid_b,
            ComparisonConfig::new(case.precision, case.policy),
        )
        .unwrap_or_else(|error| panic!("{}: comparison failed: {}", case.id, error));

        assert_eq!(
            result.mismatch_count, case.expected_mismatch_count,
            "{}: mismatch count",
            case.id
        );
        assert_eq!(
            result.total_cells, case.expected_total_cells,
            "{}: total cells",
            case.id
        );
        assert!(
            (result.median_abs_diff - case.expected_median_abs_diff).abs() <= 1.0e-12,
            "{}: median {} vs {}",
            case.id,
            result.median_abs_diff,
            case.expected_median_abs_diff
        );
        assert!(
            (result.similarity_percent() - case.expected_similarity_percent).abs() <= 1.0e-9,
            "{}: similarity {} vs {}",
            case.id,
            result.similarity_percent(),
            case.expected_similarity_percent
        );
    }
}

#[test]
fn identical_grids_agree_under_every_configuration() {
    let grid_a = grid(vec![
        vec![-3.75, 0.0, 12.5, 101.01],
        vec![7.3, -0.04, 1.0e6, 0.1],
    ]);
    let configs = [
        ComparisonConfig::new(0.1, RoundingPolicy::Floor),
        ComparisonConfig::new(1.0, RoundingPolicy::Floor),
        ComparisonConfig::new(5.0, RoundingPolicy::Floor),
        ComparisonConfig::new(0.1, RoundingPolicy::Round),
        ComparisonConfig::new(1.0, RoundingPolicy::Round),
        ComparisonConfig::new(5.0, RoundingPolicy::Round),
        ComparisonConfig::new(0.003, RoundingPolicy::Round),
        ComparisonConfig::new(250.0, RoundingPolicy::Floor),
    ];

    for config in configs {
        let result = compare(&grid_a, &grid_a, config).expect("comparison should succeed");
        assert_eq!(result.mismatch_count, 0, "{config}");
        assert_eq!(result.median_abs_diff, 0.0, "{config}");
        assert_eq!(result.similarity_percent(), 100.0, "{config}");
    }
}

#[test]
fn comparison_is_symmetric() {
    let grid_a = grid(vec![vec![0.05, 1.2, f64::NAN], vec![4.4, -2.6, 9.99]]);
    let grid_b = grid(vec![vec![0.06, 1.3, 2.0], vec![4.5, -2.4, f64::NAN]]);

    for config in standard_configurations() {
        let forward = compare(&grid_a, &grid_b, config).expect("comparison should succeed");
        let backward = compare(&grid_b, &grid_a, config).expect("comparison should succeed");
        assert_eq!(forward, backward, "{config}");
    }
}

#[test]
fn floor_similarity_does_not_drop_as_precision_coarsens() {
    let grid_a = grid(vec![vec![0.05, 1.2]]);
    let grid_b = grid(vec![vec![0.06, 1.3]]);

    let similarities = [0.1, 1.0, 5.0]
        .into_iter()
        .map(|precision| {
            compare(
                &grid_a,
                &grid_b,
                ComparisonConfig::new(precision, RoundingPolicy::Floor),
            )
            .expect("comparison should succeed")
            .similarity_percent()
        })
        .collect::<Vec<_>>();

    // 0.1: 1.2 and 1.3 fall in different tenths; 1.0 and 5.0 merge both cells.
    assert_eq!(similarities, vec![50.0, 100.0, 100.0]);
    assert!(similarities.windows(2).all(|pair| pair[0] <= pair[1]));
}

#[test]
fn nan_cell_is_a_mismatch_and_leaves_the_median() {
    let grid_a = grid(vec![vec![f64::NAN, 2.0], vec![3.0, 4.0]]);
    let grid_b = grid(vec![vec![1.0, 2.0], vec![3.0, 10.0]]);

    let result = compare(
        &grid_a,
        &grid_b,
        ComparisonConfig::new(1.0, RoundingPolicy::Floor),
    )
    .expect("comparison should succeed");

    assert_eq!(result.mismatch_count, 2);
    assert_eq!(result.total_cells, 4);
    // finite differences [0, 0, 6]
    assert_eq!(result.median_abs_diff, 0.0);
}

#[test]
fn compare_all_keeps_configuration_order() {
    let grid_a = grid(vec![vec![1.04, 2.0]]);
    let grid_b = grid(vec![vec![1.06, 2.0]]);
    let configs = standard_configurations();

    let results = compare_all(&grid_a, &grid_b, &configs).expect("comparisons should succeed");
    assert_eq!(results.len(), configs.len());
    for ((config, _), expected) in results.iter().zip(&configs) {
        assert_eq!(config, expected);
    }

    let grid_c = grid(vec![vec![1.0], vec![2.0]]);
    let error = compare_all(&grid_a, &grid_c, &configs).expect_err("shapes differ");
    assert_eq!(error.placeholder(), "INPUT.SHAPE_MISMATCH");
}
