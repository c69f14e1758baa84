use std::time::Instant;

use tracing::{debug, info, warn};

use taberr_core::{ColumnRef, ErrorMask, Table};
use taberr_plan::{Plan, validate_plan_against_table};

use crate::error_type::error_type_from_spec;
use crate::errors::{InjectError, Result};
use crate::mechanism::mechanism_from_spec;
use crate::model::ErrorModel;
use crate::report::{InjectionReport, ModelRecord, plan_hash};
use crate::rng::hash_seed;

/// Ordered error models per column. Columns and models are applied in the
/// order they were added.
#[derive(Debug, Default)]
pub struct MidLevelConfig {
    columns: Vec<(ColumnRef, Vec<ErrorModel>)>,
}

impl MidLevelConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_column(mut self, column: impl Into<ColumnRef>, models: Vec<ErrorModel>) -> Self {
        self.columns.push((column.into(), models));
        self
    }

    /// Append a model to the last entry for `column`, or start a new entry.
    pub fn push(&mut self, column: impl Into<ColumnRef>, model: ErrorModel) {
        let column = column.into();
        match self.columns.iter_mut().rev().find(|(key, _)| *key == column) {
            Some((_, models)) => models.push(model),
            None => self.columns.push((column, vec![model])),
        }
    }

    pub fn columns(&self) -> &[(ColumnRef, Vec<ErrorModel>)] {
        &self.columns
    }

    pub fn model_count(&self) -> usize {
        self.columns.iter().map(|(_, models)| models.len()).sum()
    }

    /// Build the models a plan describes. With a plan seed, every mechanism
    /// and error type without its own seed gets one derived from the plan
    /// seed and its position, so one seed reproduces the whole run.
    pub fn from_plan(plan: &Plan) -> Self {
        let mut config = Self::new();
        for (column_idx, column_plan) in plan.columns.iter().enumerate() {
            let models = column_plan
                .models
                .iter()
                .enumerate()
                .map(|(model_idx, spec)| {
                    let key = format!("{column_idx}:{}/{model_idx}", column_plan.column);
                    let mut mechanism = spec.mechanism.clone();
                    let mut error_type = spec.error_type.clone();
                    if let Some(seed) = plan.seed {
                        mechanism.seed = mechanism
                            .seed
                            .or_else(|| Some(hash_seed(seed, &format!("{key}/mechanism"))));
                        error_type.seed = error_type
                            .seed
                            .or_else(|| Some(hash_seed(seed, &format!("{key}/error_type"))));
                    }
                    ErrorModel {
                        mechanism: mechanism_from_spec(&mechanism),
                        error_type: error_type_from_spec(&error_type),
                        error_rate: spec.error_rate,
                    }
                })
                .collect();
            config.columns.push((column_plan.column.clone(), models));
        }
        config
    }
}

/// Apply every model of `config` to a copy of `table`.
pub fn create_errors(table: &Table, config: &MidLevelConfig) -> Result<(Table, ErrorMask)> {
    let (dirty, error_mask, _) = create_errors_with_report(table, config)?;
    Ok((dirty, error_mask))
}

/// Apply every model of `config` and report which model flagged which cells.
///
/// Mechanisms sample on the original table against the accumulated mask, so
/// a model never selects a cell an earlier model already corrupted. Each
/// error type only transforms the cells its own mechanism just selected.
pub fn create_errors_with_report(
    table: &Table,
    config: &MidLevelConfig,
) -> Result<(Table, ErrorMask, InjectionReport)> {
    let start = Instant::now();
    info!(
        rows = table.n_rows(),
        columns = table.n_columns(),
        models = config.model_count(),
        "error injection started"
    );

    let mut dirty = table.clone();
    let mut error_mask = ErrorMask::for_table(table);
    let mut report = InjectionReport::new(table);

    for (column, models) in &config.columns {
        let column_name = table.column(column)?.name.clone();
        if models.is_empty() {
            warn!(column = %column_name, "column has no error models");
            report.warn(
                "no_error_models",
                Some(&column_name),
                "column has no error models",
            );
            continue;
        }

        for (model_index, model) in models.iter().enumerate() {
            if model.error_rate == 0.0 {
                warn!(column = %column_name, model_index, "error_rate is 0");
                report.warn(
                    "zero_error_rate",
                    Some(&column_name),
                    format!("model {model_index} has an error_rate of 0"),
                );
            }

            let sampled =
                model
                    .mechanism
                    .sample(table, column, model.error_rate, &error_mask)?;
            let new_cells = error_mask.symmetric_difference(&sampled)?;
            let cells = new_cells.count();
            if cells == 0 && model.error_rate > 0.0 {
                report.warn(
                    "zero_error_count",
                    Some(&column_name),
                    format!(
                        "model {model_index} error_rate {} rounds down to zero errors",
                        model.error_rate
                    ),
                );
            }

            let values = model.error_type.apply(&dirty, &new_cells, column)?;
            dirty.set_column(column, values)?;
            error_mask = sampled;

            debug!(
                column = %column_name,
                model_index,
                mechanism = model.mechanism.name(),
                error_type = model.error_type.name(),
                error_rate = model.error_rate,
                cells,
                "error model applied"
            );
            report.record_model(ModelRecord {
                column: column_name.clone(),
                model_index,
                mechanism: model.mechanism.name().to_string(),
                error_type: model.error_type.name().to_string(),
                error_rate: model.error_rate,
                cells,
            });
        }
    }

    report.summarize(&error_mask);
    report.duration_ms = start.elapsed().as_millis() as u64;
    info!(
        cells = report.total_cells,
        proportion = report.proportion,
        warnings = report.warnings.len(),
        duration_ms = report.duration_ms,
        "error injection completed"
    );
    Ok((dirty, error_mask, report))
}

/// Validate `plan` against `table`, then apply it.
pub fn create_errors_from_plan(
    table: &Table,
    plan: &Plan,
) -> Result<(Table, ErrorMask, InjectionReport)> {
    let validation = validate_plan_against_table(plan, table);
    for issue in &validation.warnings {
        warn!(code = %issue.code, path = %issue.path, "{}", issue.message);
    }
    if !validation.is_ok() {
        let details: Vec<String> = validation
            .errors
            .iter()
            .map(|issue| format!("{} at {}: {}", issue.code, issue.path, issue.message))
            .collect();
        return Err(InjectError::Config(format!(
            "plan does not fit the table: {}",
            details.join("; ")
        )));
    }

    let config = MidLevelConfig::from_plan(plan);
    let (dirty, error_mask, mut report) = create_errors_with_report(table, &config)?;
    report.plan_hash = Some(plan_hash(plan)?);
    Ok((dirty, error_mask, report))
}
