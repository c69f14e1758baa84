use rand_chacha::ChaCha8Rng;

use taberr_core::{Column, DataType, Value, parse_datetime};
use taberr_plan::{ErrorTypeConfig, MissingValueConfig};

use super::{ErrorType, map_rows};
use crate::errors::Result;

/// Overwrites flagged cells with a sentinel, `null` by default.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MissingValue {
    pub config: MissingValueConfig,
    pub seed: Option<u64>,
}

impl MissingValue {
    pub fn new(config: MissingValueConfig) -> Self {
        Self { config, seed: None }
    }
}

impl ErrorType for MissingValue {
    fn config(&self) -> ErrorTypeConfig {
        ErrorTypeConfig::MissingValue(self.config.clone())
    }

    fn seed(&self) -> Option<u64> {
        self.seed
    }

    fn transform(
        &self,
        column: &Column,
        rows: &[usize],
        _rng: &mut ChaCha8Rng,
    ) -> Result<Vec<Value>> {
        let mut sentinel = self.config.sentinel();
        // Plans carry datetime sentinels as strings.
        if column.dtype == DataType::DateTime {
            if let Some(parsed) = sentinel.as_str().and_then(parse_datetime) {
                sentinel = Value::DateTime(parsed);
            }
        }
        map_rows(column, rows, |_| Ok(Some(sentinel.clone())))
    }
}
