use etl_forge::table::{self, normalize_column_names};
use etl_forge::workflow::split_steps;
use etl_forge::{describe, diagram, ingest, transform, transform_with_report, OutputFormat, Stage};
use etl_forge::{StepAction, WorkflowDocument};
use polars::prelude::*;

fn people() -> DataFrame {
    df! [
        "First Name" => ["ann", "bob", "cy", "di"],
        "Last Name" => ["lee", "ray", "ko", "sun"],
        "Age" => [25i64, 30, 35, 40],
        "Score" => [3.0, 4.8, 3.9, 4.2]
    ]
    .unwrap()
}

fn floats(df: &DataFrame, column: &str) -> Vec<Option<f64>> {
    table::float_values(df.column(column).unwrap()).unwrap()
}

fn texts(df: &DataFrame, column: &str) -> Vec<Option<String>> {
    table::text_values(df.column(column).unwrap()).unwrap()
}

#[test]
fn test_unrecognized_instruction_only_normalizes_names() {
    let df = people();
    let out = transform(&df, "hello world, nothing to see here");
    let expected = normalize_column_names(&df).unwrap();
    assert_eq!(
        out.get_column_names(),
        vec!["first_name", "last_name", "age", "score"]
    );
    assert!(out.equals_missing(&expected));
}

#[test]
fn test_caller_table_is_untouched() {
    let df = people();
    let _ = transform(&df, "filter age > 30, rename age to years, sort by score desc");
    assert_eq!(df.shape(), (4, 4));
    assert_eq!(
        df.get_column_names(),
        vec!["First Name", "Last Name", "Age", "Score"]
    );
}

#[test]
fn test_empty_table_gives_empty_table() {
    let out = transform(&DataFrame::empty(), "filter age > 30 then sort by age");
    assert_eq!(out.height(), 0);
    assert_eq!(out.width(), 0);
}

#[test]
fn test_remove_nulls_is_idempotent() {
    let df = df! [
        "city" => [Some("paris"), None, Some("oslo")],
        "sales" => [Some(1.0), Some(2.0), None]
    ]
    .unwrap();
    let once = transform(&df, "remove nulls");
    let twice = transform(&once, "remove nulls");
    assert_eq!(once.height(), 1);
    assert!(once.equals_missing(&twice));
}

#[test]
fn test_filter_greater_than() {
    let out = transform(&people(), "filter age > 30");
    assert_eq!(floats(&out, "age"), vec![Some(35.0), Some(40.0)]);
}

#[test]
fn test_group_by_and_sum() {
    let df = df! [
        "Department" => ["eng", "ops", "eng", "ops", "hr"],
        "Salary" => [100.0, 50.0, 120.0, 70.0, 40.0]
    ]
    .unwrap();
    let out = transform(&df, "group by department and sum salary");
    assert_eq!(out.height(), 3);
    assert_eq!(
        texts(&out, "department"),
        vec![
            Some("eng".to_string()),
            Some("ops".to_string()),
            Some("hr".to_string())
        ]
    );
    assert_eq!(
        floats(&out, "sum_salary"),
        vec![Some(220.0), Some(120.0), Some(40.0)]
    );
}

#[test]
fn test_rename_column() {
    let df = df! [
        "item" => ["a", "b", "c"],
        "qty" => [1i64, 2, 3]
    ]
    .unwrap();
    let out = transform(&df, "rename qty to quantity");
    assert!(out.column("qty").is_err());
    assert_eq!(floats(&out, "quantity"), floats(&df, "qty"));
}

#[test]
fn test_calculate_product_column() {
    let df = df! [
        "price" => [2.0, 3.5],
        "qty" => [3i64, 2]
    ]
    .unwrap();
    let out = transform(&df, "calculate total = price * qty");
    assert_eq!(floats(&out, "total"), vec![Some(6.0), Some(7.0)]);
}

#[test]
fn test_calculate_with_missing_operand_is_noop() {
    let df = df! [
        "price" => [2.0, 3.5],
        "qty" => [3i64, 2]
    ]
    .unwrap();
    let out = transform(&df, "calculate total = price * weight");
    assert!(out.equals_missing(&df));
}

#[test]
fn test_stages_apply_in_fixed_order() {
    // sorting runs after filtering regardless of the order in the text
    let (out, report) = transform_with_report(&people(), "sort by score desc, filter age >= 30");
    assert_eq!(floats(&out, "score"), vec![Some(4.8), Some(4.2), Some(3.9)]);
    assert_eq!(
        report.applied(),
        vec!["normalize_column_names", "predicate_filter", "sort_rows", "as_single_chunk"]
    );
    assert!(report.rolled_back_stages().is_empty());
    let stages: Vec<Stage> = report.stages.iter().map(|s| s.stage).collect();
    assert_eq!(stages.first(), Some(&Stage::CleanNames));
    assert_eq!(stages.last(), Some(&Stage::ResetIndex));
}

#[test]
fn test_full_name_and_performance_bins() {
    let out = transform(&people(), "combine names and classify performance");
    assert_eq!(
        texts(&out, "full_name"),
        vec![
            Some("ann lee".to_string()),
            Some("bob ray".to_string()),
            Some("cy ko".to_string()),
            Some("di sun".to_string())
        ]
    );
    assert_eq!(
        texts(&out, "performance_category"),
        vec![
            Some("Needs Improvement".to_string()),
            Some("Excellent".to_string()),
            Some("Good".to_string()),
            Some("Excellent".to_string())
        ]
    );
}

#[test]
fn test_csv_upload_to_records() {
    let csv = "Product Name,Unit Price,Qty\nWidget,2.5,4\nGadget,10,1\nGizmo,1,12\n";
    let df = ingest::read_table(csv.as_bytes(), "products.csv").unwrap();
    let out = transform(&df, "filter qty > 2, sort by unit_price");
    let records = table::to_records(&out);
    let rows = records.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["product_name"], "Gizmo");
    assert_eq!(rows[1]["product_name"], "Widget");
    assert_eq!(rows[1]["qty"], 4);
}

#[test]
fn test_describe_step_count_matches_fragments() {
    let instruction = "extract orders, clean rows and load them to the warehouse";
    let json = describe(instruction, OutputFormat::Json);
    let doc: WorkflowDocument = serde_json::from_str(&json).unwrap();
    assert_eq!(doc.workflow.steps.len(), split_steps(instruction).len());
    assert_eq!(doc.workflow.steps.len(), 4);
    let ids: Vec<usize> = doc.workflow.steps.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![1, 2, 3, 4]);
}

#[test]
fn test_sales_report_workflow() {
    let instruction = "workflow Sales Report then extract then clean then load";
    let doc: WorkflowDocument =
        serde_yaml::from_str(&describe(instruction, OutputFormat::Yaml)).unwrap();
    assert_eq!(doc.workflow.name, "Sales Report");
    let actions: Vec<StepAction> = doc.workflow.steps.iter().map(|s| s.action).collect();
    assert_eq!(
        actions,
        vec![StepAction::Extract, StepAction::Transform, StepAction::Load]
    );

    let dag = diagram(instruction);
    assert!(dag.starts_with("graph TD\n    Start-->Step1;"));
    assert!(dag.contains("Step1-->Step2;"));
    assert!(dag.contains("Step2-->Step3;"));
    assert!(dag.contains("Step3-->Finish;"));
    assert!(!dag.contains("Step4"));
}

#[test]
fn test_describe_and_diagram_never_fail() {
    for instruction in ["", "   ", ",,,", "then and next", "\n"] {
        let json = describe(instruction, OutputFormat::Json);
        let doc: WorkflowDocument = serde_json::from_str(&json).unwrap();
        assert!(doc.workflow.steps.is_empty());
        assert!(diagram(instruction).contains("Start-->Finish;"));
    }
}

#[test]
fn test_sort_by_existing_total_keeps_its_values() {
    let df = df! [
        "region" => ["a", "b"],
        "total" => [5.0, 9.0],
        "returns" => [100i64, 0]
    ]
    .unwrap();
    let (out, report) = transform_with_report(&df, "sort by total desc");
    assert_eq!(floats(&out, "total"), vec![Some(9.0), Some(5.0)]);
    assert_eq!(
        texts(&out, "region"),
        vec![Some("b".to_string()), Some("a".to_string())]
    );
    assert!(!report.applied().contains(&"sum_derive"));
}

#[test]
fn test_filter_on_existing_total_keeps_user_rows() {
    let df = df! [
        "price" => [2i64, 3, 50],
        "qty" => [1i64, 1, 1],
        "total" => [10i64, 200, 150]
    ]
    .unwrap();
    let (out, report) = transform_with_report(&df, "filter total > 100");
    assert_eq!(floats(&out, "total"), vec![Some(200.0), Some(150.0)]);
    assert_eq!(
        report.applied(),
        vec!["normalize_column_names", "predicate_filter", "as_single_chunk"]
    );
}

#[test]
fn test_filter_on_existing_average_is_not_recomputed() {
    let df = df! [
        "average" => [3.5, 4.5],
        "bonus" => [1.0, 2.0]
    ]
    .unwrap();
    let out = transform(&df, "filter average >= 4");
    assert_eq!(out.width(), 2);
    assert_eq!(floats(&out, "average"), vec![Some(4.5)]);
}

#[test]
fn test_sort_by_amount_does_not_derive_revenue() {
    let df = df! [
        "qty" => [2i64, 1],
        "amount" => [3.0, 8.0]
    ]
    .unwrap();
    let out = transform(&df, "sort by amount desc");
    assert!(out.column("revenue").is_err());
    assert_eq!(floats(&out, "amount"), vec![Some(8.0), Some(3.0)]);
}

#[test]
fn test_existing_timestamp_column_survives_add_timestamp() {
    let df = df! [
        "event" => ["x", "y"],
        "timestamp" => ["2024-01-02", "2024-01-01"]
    ]
    .unwrap();
    let out = transform(&df, "add timestamp then sort by timestamp");
    assert_eq!(out.width(), 2);
    assert_eq!(
        texts(&out, "timestamp"),
        vec![Some("2024-01-01".to_string()), Some("2024-01-02".to_string())]
    );
}
