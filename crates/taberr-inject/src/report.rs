use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use taberr_core::{ErrorMask, Table};
use taberr_plan::Plan;

use crate::errors::Result;

/// Cells attributed to one error model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRecord {
    pub column: String,
    /// Position of the model within its column.
    pub model_index: usize,
    pub mechanism: String,
    pub error_type: String,
    pub error_rate: f64,
    /// Cells newly flagged by this model.
    pub cells: usize,
}

/// Flagged cells per column after the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSummary {
    pub column: String,
    pub cells: usize,
    pub proportion: f64,
}

/// Non-fatal issue raised during a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InjectionIssue {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
}

/// Report for an injection run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InjectionReport {
    pub rows: usize,
    pub columns: usize,
    pub models: Vec<ModelRecord>,
    pub column_summaries: Vec<ColumnSummary>,
    pub total_cells: usize,
    pub proportion: f64,
    pub warnings_by_code: BTreeMap<String, u64>,
    pub warnings: Vec<InjectionIssue>,
    /// SHA-256 of the plan the run was built from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_hash: Option<String>,
    pub duration_ms: u64,
}

impl InjectionReport {
    pub fn new(table: &Table) -> Self {
        Self {
            rows: table.n_rows(),
            columns: table.n_columns(),
            models: Vec::new(),
            column_summaries: Vec::new(),
            total_cells: 0,
            proportion: 0.0,
            warnings_by_code: BTreeMap::new(),
            warnings: Vec::new(),
            plan_hash: None,
            duration_ms: 0,
        }
    }

    pub fn record_model(&mut self, record: ModelRecord) {
        self.models.push(record);
    }

    pub fn record_warning(&mut self, issue: InjectionIssue) {
        *self.warnings_by_code.entry(issue.code.clone()).or_insert(0) += 1;
        self.warnings.push(issue);
    }

    pub fn warn(&mut self, code: &str, column: Option<&str>, message: impl Into<String>) {
        self.record_warning(InjectionIssue {
            code: code.to_string(),
            message: message.into(),
            column: column.map(str::to_string),
        });
    }

    /// Fill per-column totals from the final mask.
    pub fn summarize(&mut self, mask: &ErrorMask) {
        let rows = mask.n_rows();
        self.column_summaries = mask
            .column_names()
            .iter()
            .enumerate()
            .map(|(index, column)| {
                let cells = mask.count_column(index);
                ColumnSummary {
                    column: column.clone(),
                    cells,
                    proportion: if rows == 0 {
                        0.0
                    } else {
                        cells as f64 / rows as f64
                    },
                }
            })
            .collect();
        self.total_cells = mask.count();
        self.proportion = mask.proportion();
    }

    /// Cells attributed to models on `column`.
    pub fn cells_for(&self, column: &str) -> usize {
        self.models
            .iter()
            .filter(|record| record.column == column)
            .map(|record| record.cells)
            .sum()
    }
}

/// Hex SHA-256 of the plan's canonical JSON.
pub fn plan_hash(plan: &Plan) -> Result<String> {
    let bytes = serde_json::to_vec(plan)?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}
