//! Error-injection engine for tabular data.
//!
//! An error model pairs a mechanism, which picks the cells of a column to
//! corrupt, with an error type, which rewrites the values of those cells.
//! Models are applied to a copy of the input table and every run returns the
//! dirty copy together with an error mask marking each corrupted cell.
//!
//! Three entry points build on each other: `api::low_level` applies one
//! model, `api::mid_level` composes many models per column without overlap,
//! and `api::high_level` draws random models from a target error rate.

pub mod api;
pub mod error_type;
pub mod errors;
pub mod logging;
pub mod mechanism;
pub mod metrics;
pub mod model;
pub mod output;
pub mod report;
pub mod rng;

pub use api::high_level::HighLevelOptions;
pub use api::mid_level::{MidLevelConfig, create_errors_from_plan};
pub use error_type::{ErrorType, error_type_from_spec};
pub use errors::{InjectError, Result};
pub use logging::{LogFormat, init_tracing};
pub use mechanism::{ErrorMechanism, mechanism_from_spec};
pub use metrics::{ErrorMetrics, evaluate};
pub use model::ErrorModel;
pub use report::InjectionReport;
