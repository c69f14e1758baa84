use serde_json::json;
use taberr_core::{Column, Table};
use taberr_plan::{
    MechanismKind, Plan, plan_json_schema, validate_plan, validate_plan_against_table,
    validate_plan_json,
};

fn table() -> Table {
    Table::new(vec![
        Column::ints("A", 0..10),
        Column::floats("B", (0..10).map(|v| v as f64 * 1.5)),
        Column::categorical("C", ["x", "y", "z", "x", "y", "z", "x", "y", "z", "x"]),
    ])
    .expect("valid table")
}

fn plan_json(models: serde_json::Value) -> serde_json::Value {
    json!({
        "plan_version": "0.1",
        "seed": 42,
        "columns": [{"column": "A", "models": models}]
    })
}

#[test]
fn well_formed_plan_validates() {
    let plan = json!({
        "plan_version": "0.1",
        "seed": 42,
        "columns": [
            {
                "column": "A",
                "models": [
                    {
                        "mechanism": {"mechanism": "ECAR"},
                        "error_type": {"type": "add_delta", "add_delta_value": 2.0},
                        "error_rate": 0.3
                    },
                    {
                        "mechanism": {"mechanism": "EAR", "condition_to_column": "B"},
                        "error_type": {"type": "missing_value"},
                        "error_rate": 0.2
                    }
                ]
            },
            {
                "column": 2,
                "models": [{
                    "mechanism": {"mechanism": "ENAR"},
                    "error_type": {"type": "category_swap"},
                    "error_rate": 0.5
                }]
            }
        ]
    });

    let structural = validate_plan_json(&plan).expect("compile plan schema");
    assert!(structural.is_ok(), "structural errors: {:?}", structural.errors);

    let validated = validate_plan(&plan, &table()).expect("plan validation should succeed");
    assert!(validated.warnings.is_empty(), "{:?}", validated.warnings);
    assert_eq!(validated.plan.model_count(), 3);
    assert_eq!(
        validated.plan.columns[0].models[1].mechanism.mechanism,
        MechanismKind::Ear
    );
}

#[test]
fn schema_rejects_unknown_error_type() {
    let plan = plan_json(json!([{
        "mechanism": {"mechanism": "ECAR"},
        "error_type": {"type": "shout"},
        "error_rate": 0.1
    }]));
    let report = validate_plan_json(&plan).expect("compile plan schema");
    assert!(report.has_code("schema_violation"));
}

#[test]
fn schema_rejects_missing_required_parameter() {
    let plan = plan_json(json!([{
        "mechanism": {"mechanism": "ECAR"},
        "error_type": {"type": "wrong_unit"},
        "error_rate": 0.1
    }]));
    let report = validate_plan(&plan, &table()).expect_err("wrong_unit needs a scaling");
    assert!(!report.is_ok());
}

#[test]
fn unknown_columns_are_reported() {
    let plan: Plan = serde_json::from_value(json!({
        "plan_version": "0.1",
        "columns": [{
            "column": "missing",
            "models": [{
                "mechanism": {"mechanism": "EAR", "condition_to_column": 9},
                "error_type": {"type": "missing_value"},
                "error_rate": 0.1
            }]
        }, {
            "column": "A",
            "models": [{
                "mechanism": {"mechanism": "EAR", "condition_to_column": 9},
                "error_type": {"type": "missing_value"},
                "error_rate": 0.1
            }]
        }]
    }))
    .expect("parse plan");

    let report = validate_plan_against_table(&plan, &table());
    assert!(report.has_code("unknown_column"));
    assert!(report.has_code("unknown_condition_column"));
}

#[test]
fn capacity_is_checked_across_models() {
    let plan = plan_json(json!([
        {
            "mechanism": {"mechanism": "ECAR"},
            "error_type": {"type": "missing_value"},
            "error_rate": 0.7
        },
        {
            "mechanism": {"mechanism": "ENAR"},
            "error_type": {"type": "missing_value"},
            "error_rate": 0.4
        }
    ]));
    let report = validate_plan(&plan, &table()).expect_err("rates exceed the column");
    assert!(report.has_code("capacity_exceeded"));
    assert_eq!(report.errors[0].path, "/columns/0/models/1/error_rate");
}

#[test]
fn dtype_incompatibility_is_an_error() {
    let plan = plan_json(json!([{
        "mechanism": {"mechanism": "ECAR"},
        "error_type": {"type": "mojibake"},
        "error_rate": 0.1
    }]));
    let report = validate_plan(&plan, &table()).expect_err("mojibake needs text");
    assert!(report.has_code("incompatible_dtype"));
}

#[test]
fn mistype_without_a_changing_target_is_an_error() {
    let plan = json!({
        "plan_version": "0.1",
        "columns": [{
            "column": "C",
            "models": [{
                "mechanism": {"mechanism": "ECAR"},
                "error_type": {"type": "mistype", "mistype_dtype": "object"},
                "error_rate": 0.2
            }]
        }]
    });
    let report = validate_plan(&plan, &table()).expect_err("categories are already text");
    assert!(report.has_code("mistype_no_target"));

    let plan = plan_json(json!([{
        "mechanism": {"mechanism": "ECAR"},
        "error_type": {"type": "mistype"},
        "error_rate": 0.2
    }]));
    assert!(validate_plan(&plan, &table()).is_ok());
}

#[test]
fn invalid_parameters_are_errors() {
    let plan = plan_json(json!([{
        "mechanism": {"mechanism": "ECAR"},
        "error_type": {"type": "extraneous", "extraneous_value_template": "USD"},
        "error_rate": 0.1
    }]));
    let report = validate_plan(&plan, &table()).expect_err("template lacks placeholder");
    assert!(report.has_code("invalid_error_type_config"));
}

#[test]
fn out_of_range_rate_is_an_error() {
    let plan: Plan = serde_json::from_value(plan_json(json!([{
        "mechanism": {"mechanism": "ECAR"},
        "error_type": {"type": "missing_value"},
        "error_rate": 1.5
    }])))
    .expect("parse plan");
    let report = validate_plan_against_table(&plan, &table());
    assert!(report.has_code("invalid_error_rate"));
}

#[test]
fn soft_issues_are_warnings() {
    let plan = plan_json(json!([
        {
            "mechanism": {"mechanism": "ECAR", "condition_to_column": "B"},
            "error_type": {"type": "missing_value"},
            "error_rate": 0.0
        },
        {
            "mechanism": {"mechanism": "EAR"},
            "error_type": {"type": "missing_value"},
            "error_rate": 0.05
        },
        {
            "mechanism": {"mechanism": "EAR", "condition_to_column": "A"},
            "error_type": {"type": "missing_value"},
            "error_rate": 0.2
        }
    ]));
    let validated = validate_plan(&plan, &table()).expect("warnings do not fail validation");
    let codes: Vec<&str> = validated
        .warnings
        .iter()
        .map(|issue| issue.code.as_str())
        .collect();
    assert!(codes.contains(&"zero_error_rate"));
    assert!(codes.contains(&"condition_column_ignored"));
    assert!(codes.contains(&"condition_column_auto_selected"));
    assert!(codes.contains(&"zero_error_count"));
    assert!(codes.contains(&"ear_conditioned_on_target"));
}

#[test]
fn ear_on_single_column_table_is_an_error() {
    let single = Table::new(vec![Column::ints("A", 0..10)]).expect("valid table");
    let plan = plan_json(json!([{
        "mechanism": {"mechanism": "EAR"},
        "error_type": {"type": "missing_value"},
        "error_rate": 0.2
    }]));
    let report = validate_plan(&plan, &single).expect_err("EAR needs two columns");
    assert!(report.has_code("ear_single_column"));
}

#[test]
fn plan_schema_names_error_types() {
    let schema = serde_json::to_string(&plan_json_schema()).expect("serialize schema");
    for error_type in ["missing_value", "outlier", "mojibake", "typo", "category_swap"] {
        assert!(schema.contains(error_type), "schema lacks {error_type}");
    }
}
