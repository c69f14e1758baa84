use std::collections::BTreeMap;

use jsonschema::JSONSchema;
use serde_json::Value;
use taberr_core::{DataType, Table, error_count};

use crate::errors::{PlanError, ValidationIssue, ValidationReport};
use crate::model::{MechanismKind, ModelSpec, PLAN_VERSION, Plan};
use crate::schema::plan_json_schema;
use crate::types::ErrorTypeConfig;

/// Validated plan with accumulated warnings.
#[derive(Debug, Clone)]
pub struct ValidatedPlan {
    pub plan: Plan,
    pub warnings: Vec<ValidationIssue>,
}

/// Validate a plan JSON document against the plan JSON Schema.
pub fn validate_plan_json(plan_json: &Value) -> Result<ValidationReport, PlanError> {
    let schema = serde_json::to_value(plan_json_schema())?;
    let compiled = JSONSchema::compile(&schema).map_err(|err| PlanError::Schema(err.to_string()))?;

    let mut report = ValidationReport::default();

    if let Err(errors) = compiled.validate(plan_json) {
        for error in errors {
            let path = normalized_json_pointer(&error.instance_path.to_string());
            report.push(ValidationIssue::error(
                "schema_violation",
                path,
                error.to_string(),
                None,
            ));
        }
    }

    Ok(report)
}

/// Validate a parsed plan against the table it will be applied to.
pub fn validate_plan_against_table(plan: &Plan, table: &Table) -> ValidationReport {
    let mut report = ValidationReport::default();

    if plan.plan_version != PLAN_VERSION {
        report.push(ValidationIssue::error(
            "unsupported_plan_version",
            "/plan_version",
            format!(
                "plan_version '{}' is not supported (expected '{}')",
                plan.plan_version, PLAN_VERSION
            ),
            Some("regenerate the plan with the current plan_version"),
        ));
    }

    if table.is_empty() {
        report.push(ValidationIssue::error(
            "empty_table",
            "/",
            "the table has no rows or no columns",
            None,
        ));
        return report;
    }

    // Cells already claimed per resolved column, across repeated entries.
    let mut claimed: BTreeMap<usize, usize> = BTreeMap::new();

    for (column_idx, column_plan) in plan.columns.iter().enumerate() {
        let base_path = format!("/columns/{column_idx}");
        let target = match table.resolve(&column_plan.column) {
            Ok(target) => target,
            Err(err) => {
                report.push(ValidationIssue::error(
                    "unknown_column",
                    format!("{base_path}/column"),
                    err.to_string(),
                    None,
                ));
                continue;
            }
        };

        if column_plan.models.is_empty() {
            report.push(ValidationIssue::warning(
                "no_error_models",
                format!("{base_path}/models"),
                format!("column '{}' has no error models", column_plan.column),
                None,
            ));
            continue;
        }

        let dtype = table.columns()[target].dtype;
        for (model_idx, model) in column_plan.models.iter().enumerate() {
            let model_path = format!("{base_path}/models/{model_idx}");
            let requested = validate_model(model, &model_path, table, target, dtype, &mut report);
            let used = claimed.entry(target).or_default();
            *used += requested;
            if *used > table.n_rows() {
                report.push(ValidationIssue::error(
                    "capacity_exceeded",
                    format!("{model_path}/error_rate"),
                    format!(
                        "models on column '{}' request {} of {} cells",
                        column_plan.column,
                        used,
                        table.n_rows()
                    ),
                    Some("lower the error rates so they sum to at most 1.0 per column"),
                ));
            }
        }
    }

    report
}

/// Validate the plan end-to-end, returning structured issues on failure.
pub fn validate_plan(plan_json: &Value, table: &Table) -> Result<ValidatedPlan, ValidationReport> {
    let structural = match validate_plan_json(plan_json) {
        Ok(report) => report,
        Err(err) => {
            let mut report = ValidationReport::default();
            report.push(ValidationIssue::error(
                "schema_validation_error",
                "/",
                err.to_string(),
                None,
            ));
            return Err(report);
        }
    };

    if !structural.is_ok() {
        return Err(structural);
    }

    let plan: Plan = match serde_json::from_value(plan_json.clone()) {
        Ok(plan) => plan,
        Err(err) => {
            let mut report = ValidationReport::default();
            report.push(ValidationIssue::error(
                "invalid_plan_json",
                "/",
                err.to_string(),
                None,
            ));
            return Err(report);
        }
    };

    let table_report = validate_plan_against_table(&plan, table);
    if !table_report.is_ok() {
        return Err(table_report);
    }

    Ok(ValidatedPlan {
        plan,
        warnings: table_report.warnings,
    })
}

/// Returns the number of cells the model would claim on `target`.
fn validate_model(
    model: &ModelSpec,
    path: &str,
    table: &Table,
    target: usize,
    dtype: DataType,
    report: &mut ValidationReport,
) -> usize {
    let rate = model.error_rate;
    let mut requested = 0;
    if !rate.is_finite() || !(0.0..=1.0).contains(&rate) {
        report.push(ValidationIssue::error(
            "invalid_error_rate",
            format!("{path}/error_rate"),
            format!("error_rate {rate} is outside [0, 1]"),
            None,
        ));
    } else if rate == 0.0 {
        report.push(ValidationIssue::warning(
            "zero_error_rate",
            format!("{path}/error_rate"),
            "error_rate is 0, the model will not change anything",
            None,
        ));
    } else {
        requested = error_count(table.n_rows(), rate);
        if requested == 0 {
            report.push(ValidationIssue::warning(
                "zero_error_count",
                format!("{path}/error_rate"),
                format!(
                    "error_rate {rate} on {} rows rounds down to zero errors",
                    table.n_rows()
                ),
                Some("raise the error rate or use a larger table"),
            ));
        }
    }

    validate_mechanism(model, path, table, target, report);
    validate_error_type(&model.error_type.config, path, dtype, report);
    requested
}

fn validate_mechanism(
    model: &ModelSpec,
    path: &str,
    table: &Table,
    target: usize,
    report: &mut ValidationReport,
) {
    let spec = &model.mechanism;
    let condition_path = format!("{path}/mechanism/condition_to_column");

    if spec.condition_to_column.is_some() && table.n_columns() < 2 {
        report.push(ValidationIssue::error(
            "condition_needs_two_columns",
            condition_path.clone(),
            "a condition column requires a table with at least two columns",
            None,
        ));
    }

    let condition = match &spec.condition_to_column {
        Some(column) => match table.resolve(column) {
            Ok(index) => Some(index),
            Err(err) => {
                report.push(ValidationIssue::error(
                    "unknown_condition_column",
                    condition_path.clone(),
                    err.to_string(),
                    None,
                ));
                None
            }
        },
        None => None,
    };

    match spec.mechanism {
        MechanismKind::Ear => {
            if table.n_columns() < 2 {
                report.push(ValidationIssue::error(
                    "ear_single_column",
                    format!("{path}/mechanism"),
                    "EAR needs another column to condition on",
                    Some("use ECAR or ENAR on single-column tables"),
                ));
            } else if spec.condition_to_column.is_none() {
                report.push(ValidationIssue::warning(
                    "condition_column_auto_selected",
                    condition_path,
                    "EAR has no condition_to_column, one will be chosen at random",
                    None,
                ));
            } else if condition == Some(target) {
                report.push(ValidationIssue::warning(
                    "ear_conditioned_on_target",
                    condition_path,
                    "EAR is conditioned on its own target column and behaves like ENAR",
                    None,
                ));
            }
        }
        MechanismKind::Ecar | MechanismKind::Enar => {
            if spec.condition_to_column.is_some() {
                report.push(ValidationIssue::warning(
                    "condition_column_ignored",
                    condition_path,
                    format!("{} ignores condition_to_column", spec.mechanism),
                    None,
                ));
            }
        }
    }
}

fn validate_error_type(
    config: &ErrorTypeConfig,
    path: &str,
    dtype: DataType,
    report: &mut ValidationReport,
) {
    let type_path = format!("{path}/error_type");
    if !config.supports(dtype) {
        report.push(ValidationIssue::error(
            "incompatible_dtype",
            type_path.clone(),
            format!("{} cannot be applied to a {dtype} column", config.name()),
            None,
        ));
    }

    if let ErrorTypeConfig::Mistype(mistype) = config {
        if mistype.target_for(dtype).is_none() {
            report.push(ValidationIssue::error(
                "mistype_no_target",
                type_path.clone(),
                format!("no mistype target changes a {dtype} column"),
                Some("set mistype_dtype or an override to a different representation"),
            ));
        }
    }

    if let Err(err) = config.validate() {
        report.push(ValidationIssue::error(
            "invalid_error_type_config",
            type_path,
            err.to_string(),
            None,
        ));
    }
}

fn normalized_json_pointer(pointer: &str) -> String {
    if pointer.is_empty() {
        "/".to_string()
    } else {
        pointer.to_string()
    }
}
