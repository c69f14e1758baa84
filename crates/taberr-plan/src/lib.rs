//! Error plan contracts and validation.
//!
//! A plan lists, per column, the ordered error models to apply. Each model
//! pairs a mechanism (which cells) with an error type config (how the cells
//! change) and an error rate. Plans are plain serde documents with a JSON
//! Schema, and can be validated against a concrete table before any cell is
//! touched.

pub mod errors;
pub mod model;
pub mod schema;
pub mod types;
pub mod validate;

pub use errors::{IssueSeverity, PlanError, ValidationIssue, ValidationReport};
pub use model::{
    ColumnPlan, ErrorTypeSpec, MechanismKind, MechanismSpec, ModelSpec, PLAN_VERSION, Plan,
    load_plan,
};
pub use schema::plan_json_schema;
pub use types::{
    AddDeltaConfig, AutomationPattern, CategorySwapConfig, ClippingConfig, ErrorTypeConfig,
    ExtraneousConfig, MissingValueConfig, MistypeConfig, MistypeTarget, MojibakeConfig,
    OutlierConfig, PermutateConfig, ReplaceConfig, TypoConfig, UnitScaling, WrongUnitConfig,
};
pub use validate::{ValidatedPlan, validate_plan, validate_plan_against_table, validate_plan_json};
