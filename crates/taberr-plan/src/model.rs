use std::fmt;
use std::fs;
use std::path::Path;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use taberr_core::ColumnRef;

use crate::errors::Result;
use crate::types::ErrorTypeConfig;

/// Contract version written by this crate.
pub const PLAN_VERSION: &str = "0.1";

/// Sampling policy deciding which cells of a column become errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum MechanismKind {
    /// Errors completely at random.
    Ecar,
    /// Errors at random, conditioned on another column.
    Ear,
    /// Errors not at random, conditioned on the column itself.
    Enar,
}

impl MechanismKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MechanismKind::Ecar => "ECAR",
            MechanismKind::Ear => "EAR",
            MechanismKind::Enar => "ENAR",
        }
    }
}

impl fmt::Display for MechanismKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MechanismSpec {
    pub mechanism: MechanismKind,
    /// Column whose sort order drives EAR selection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition_to_column: Option<ColumnRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl MechanismSpec {
    pub fn new(mechanism: MechanismKind) -> Self {
        Self {
            mechanism,
            condition_to_column: None,
            seed: None,
        }
    }

    pub fn conditioned_on(mut self, column: impl Into<ColumnRef>) -> Self {
        self.condition_to_column = Some(column.into());
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Error type config plus an optional seed for its random choices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ErrorTypeSpec {
    #[serde(flatten)]
    pub config: ErrorTypeConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl ErrorTypeSpec {
    pub fn new(config: ErrorTypeConfig) -> Self {
        Self { config, seed: None }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

impl From<ErrorTypeConfig> for ErrorTypeSpec {
    fn from(config: ErrorTypeConfig) -> Self {
        Self::new(config)
    }
}

/// One (mechanism, error type, rate) triple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ModelSpec {
    pub mechanism: MechanismSpec,
    pub error_type: ErrorTypeSpec,
    /// Fraction of the column's rows to corrupt, in [0, 1].
    pub error_rate: f64,
}

/// Ordered error models for one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ColumnPlan {
    pub column: ColumnRef,
    #[serde(default)]
    pub models: Vec<ModelSpec>,
}

/// Canonical error plan for one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Plan {
    /// Contract version for the plan format.
    pub plan_version: String,
    /// Seed for reproducibility; per-model seeds are derived from it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Columns in application order.
    pub columns: Vec<ColumnPlan>,
}

impl Plan {
    pub fn new(seed: Option<u64>, columns: Vec<ColumnPlan>) -> Self {
        Self {
            plan_version: PLAN_VERSION.to_string(),
            seed,
            columns,
        }
    }

    pub fn from_json_str(contents: &str) -> Result<Self> {
        Ok(serde_json::from_str(contents)?)
    }

    /// Total number of models across all columns.
    pub fn model_count(&self) -> usize {
        self.columns.iter().map(|column| column.models.len()).sum()
    }
}

/// Read a plan from a JSON file.
pub fn load_plan(path: &Path) -> Result<Plan> {
    let contents = fs::read_to_string(path)?;
    Plan::from_json_str(&contents)
}
