use serde_json::json;
use spectral::core::result::{Status, TestedExplore, ValidationResult, incremental_results};
use spectral::core::validation_error::ErrorRecord;

fn content_error(explore: &str, message: &str) -> ErrorRecord {
    ErrorRecord::new("ecommerce", explore, message)
}

/// A content run where `users` has one known broken reference.
fn build_validation() -> ValidationResult {
    let mut error = content_error("users", "An error occurred");
    error.metadata.insert("field_name".into(), json!("users.old"));
    error.metadata.insert("title".into(), json!("Users dashboard"));
    ValidationResult {
        status: Status::Failed,
        tested: vec![
            TestedExplore::new("ecommerce", "orders", true),
            TestedExplore::new("ecommerce", "sessions", true),
            TestedExplore::new("ecommerce", "users", false),
        ],
        errors: vec![error],
    }
}

fn all_passed() -> Vec<TestedExplore> {
    vec![
        TestedExplore::new("ecommerce", "orders", true),
        TestedExplore::new("ecommerce", "sessions", true),
        TestedExplore::new("ecommerce", "users", true),
    ]
}

#[test]
fn same_results_should_not_have_errors() {
    let main = build_validation();
    let additional = build_validation();
    let incremental = incremental_results(&main, &additional);
    assert_eq!(incremental.status, Status::Passed);
    assert!(incremental.errors.is_empty());
    assert_eq!(incremental.tested, all_passed());
}

#[test]
fn fewer_errors_than_main() {
    let main = build_validation();
    let mut additional = build_validation();
    additional.tested[2].passed = true;
    additional.errors.clear();
    let incremental = incremental_results(&main, &additional);
    assert_eq!(incremental.status, Status::Passed);
    assert!(incremental.errors.is_empty());
    assert_eq!(incremental.tested, all_passed());
}

#[test]
fn more_errors_than_main() {
    let main = build_validation();
    let mut additional = build_validation();
    additional.tested[1].passed = false;
    let extra_errors = vec![
        content_error("users", "Another error occurred"),
        content_error("sessions", "An error occurred"),
    ];
    additional.errors.extend(extra_errors.clone());
    let incremental = incremental_results(&main, &additional);
    assert_eq!(incremental.status, Status::Failed);
    assert_eq!(incremental.errors, extra_errors);
    assert_eq!(
        incremental.tested,
        vec![
            TestedExplore::new("ecommerce", "orders", true),
            TestedExplore::new("ecommerce", "sessions", false),
            TestedExplore::new("ecommerce", "users", false),
        ]
    );
}

#[test]
fn fewer_tested_explores_than_main() {
    let main = build_validation();
    let mut additional = build_validation();
    additional.tested.remove(0);
    let extra_error = content_error("users", "Another error occurred");
    additional.errors.push(extra_error.clone());
    let incremental = incremental_results(&main, &additional);
    assert_eq!(incremental.status, Status::Failed);
    assert_eq!(incremental.errors, vec![extra_error]);
    assert_eq!(
        incremental.tested,
        vec![
            TestedExplore::new("ecommerce", "sessions", true),
            TestedExplore::new("ecommerce", "users", false),
        ]
    );
}

#[test]
fn subset_ignores_pass_flags_on_additional() {
    let main = build_validation();
    let mut additional = build_validation();
    for tested in &mut additional.tested {
        tested.passed = false;
    }
    let incremental = incremental_results(&main, &additional);
    assert!(incremental.errors.is_empty());
    assert_eq!(incremental.tested, all_passed());
}

#[test]
fn metadata_difference_counts_as_new_error() {
    let main = build_validation();
    let mut additional = build_validation();
    additional.errors[0]
        .metadata
        .insert("title".into(), json!("Renamed dashboard"));
    let incremental = incremental_results(&main, &additional);
    assert_eq!(incremental.errors.len(), 1);
    assert_eq!(incremental.status, Status::Failed);
    assert!(!incremental.tested[2].passed);
}

#[test]
fn inputs_are_not_mutated() {
    let main = build_validation();
    let mut additional = build_validation();
    additional.errors.push(content_error("orders", "boom"));
    let main_before = main.clone();
    let additional_before = additional.clone();
    let _ = incremental_results(&main, &additional);
    assert_eq!(main, main_before);
    assert_eq!(additional, additional_before);
}

#[test]
fn diff_results_are_always_consistent() {
    let main = build_validation();
    let variants = [
        build_validation(),
        {
            let mut r = build_validation();
            r.errors.push(content_error("orders", "new"));
            r
        },
        {
            let mut r = build_validation();
            r.errors.clear();
            r
        },
    ];
    for additional in &variants {
        let incremental = incremental_results(&main, additional);
        assert!(incremental.is_consistent(), "{:?}", incremental);
        let self_diff = incremental_results(additional, additional);
        assert!(self_diff.passed());
        assert!(self_diff.tested.iter().all(|t| t.passed));
        assert_eq!(self_diff.tested.len(), additional.tested.len());
    }
}

#[test]
fn results_round_trip_through_json() {
    let raw = r#"{
        "status": "failed",
        "tested": [{"model": "ecommerce", "explore": "users", "passed": false}],
        "errors": [{"model": "ecommerce", "explore": "users", "test": null, "message": "boom", "metadata": {"b": 1, "a": [1, 2]}}]
    }"#;
    let main: ValidationResult = serde_json::from_str(raw).expect("parses");
    let reordered = r#"{
        "status": "failed",
        "tested": [{"model": "ecommerce", "explore": "users", "passed": false}],
        "errors": [{"model": "ecommerce", "explore": "users", "test": null, "message": "boom", "metadata": {"a": [1, 2], "b": 1}}]
    }"#;
    let additional: ValidationResult = serde_json::from_str(reordered).expect("parses");
    let incremental = incremental_results(&main, &additional);
    assert!(incremental.passed());
}
