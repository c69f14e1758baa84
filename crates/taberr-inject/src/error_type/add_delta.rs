use rand_chacha::ChaCha8Rng;
use tracing::warn;

use taberr_core::{Column, Value, stats};
use taberr_plan::{AddDeltaConfig, ErrorTypeConfig};

use super::{ErrorType, map_rows};
use crate::errors::Result;

/// Adds a delta to flagged numeric cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AddDelta {
    pub config: AddDeltaConfig,
    pub seed: Option<u64>,
}

impl AddDelta {
    pub fn new(config: AddDeltaConfig) -> Self {
        Self { config, seed: None }
    }

    pub fn with_delta(delta: f64) -> Self {
        Self::new(AddDeltaConfig {
            add_delta_value: Some(delta),
        })
    }

    /// Configured delta, or one standard deviation of the column.
    fn delta(&self, column: &Column) -> f64 {
        if let Some(delta) = self.config.add_delta_value {
            return delta;
        }
        let derived = stats::std_dev(&column.numeric_values())
            .filter(|std| std.is_finite() && *std > 0.0)
            .unwrap_or(1.0);
        warn!(
            column = %column.name,
            delta = derived,
            "add_delta_value is not set, using the column standard deviation"
        );
        derived
    }
}

impl ErrorType for AddDelta {
    fn config(&self) -> ErrorTypeConfig {
        ErrorTypeConfig::AddDelta(self.config.clone())
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
        let delta = self.delta(column);
        map_rows(column, rows, |value| Ok(value.offset_by(delta)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::seeded_rng;

    #[test]
    fn integer_columns_stay_integer() {
        let column = Column::ints("A", [1, 2, 3]);
        let values = AddDelta::with_delta(10.0)
            .transform(&column, &[0, 2], &mut seeded_rng(Some(0)))
            .expect("transform");
        assert_eq!(values, vec![Value::Int(11), Value::Int(2), Value::Int(13)]);
    }

    #[test]
    fn missing_delta_falls_back_to_std_dev() {
        let column = Column::floats("A", [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        let values = AddDelta::default()
            .transform(&column, &[0], &mut seeded_rng(Some(0)))
            .expect("transform");
        let changed = values[0].as_f64().expect("float");
        assert!((changed - (2.0 + 2.138_089_935_299_395)).abs() < 1e-9);
    }

    #[test]
    fn nulls_stay_null() {
        let column = Column::new("A", vec![Value::Null, Value::Int(1)]);
        let values = AddDelta::with_delta(1.0)
            .transform(&column, &[0], &mut seeded_rng(Some(0)))
            .expect("transform");
        assert_eq!(values[0], Value::Null);
    }
}
