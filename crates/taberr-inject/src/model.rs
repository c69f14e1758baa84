use taberr_core::{ColumnRef, ErrorMask, Table};
use taberr_plan::ModelSpec;

use crate::api::low_level;
use crate::error_type::{ErrorType, error_type_from_spec};
use crate::errors::Result;
use crate::mechanism::{ErrorMechanism, mechanism_from_spec};

/// One mechanism, one error type and the share of the column to corrupt.
#[derive(Debug)]
pub struct ErrorModel {
    pub mechanism: Box<dyn ErrorMechanism>,
    pub error_type: Box<dyn ErrorType>,
    pub error_rate: f64,
}

impl ErrorModel {
    pub fn new(
        mechanism: impl ErrorMechanism + 'static,
        error_type: impl ErrorType + 'static,
        error_rate: f64,
    ) -> Self {
        Self {
            mechanism: Box::new(mechanism),
            error_type: Box::new(error_type),
            error_rate,
        }
    }

    pub fn from_spec(spec: &ModelSpec) -> Self {
        Self {
            mechanism: mechanism_from_spec(&spec.mechanism),
            error_type: error_type_from_spec(&spec.error_type),
            error_rate: spec.error_rate,
        }
    }

    /// Apply the model to a copy of `table`.
    pub fn apply_to(&self, table: &Table, column: &ColumnRef) -> Result<(Table, ErrorMask)> {
        low_level::create_errors(
            table,
            column,
            self.error_rate,
            self.mechanism.as_ref(),
            self.error_type.as_ref(),
        )
    }
}
