use rand_chacha::ChaCha8Rng;

use taberr_core::{Column, Value};
use taberr_plan::{ErrorTypeConfig, UnitScaling, WrongUnitConfig};

use super::{ErrorType, map_rows};
use crate::errors::Result;

/// Rescales flagged numeric cells as if they were recorded in another unit.
#[derive(Debug, Clone, PartialEq)]
pub struct WrongUnit {
    pub config: WrongUnitConfig,
    pub seed: Option<u64>,
}

impl WrongUnit {
    pub fn new(factor: f64, offset: f64) -> Self {
        Self {
            config: WrongUnitConfig {
                wrong_unit_scaling: UnitScaling { factor, offset },
            },
            seed: None,
        }
    }
}

impl ErrorType for WrongUnit {
    fn config(&self) -> ErrorTypeConfig {
        ErrorTypeConfig::WrongUnit(self.config.clone())
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
        let UnitScaling { factor, offset } = self.config.wrong_unit_scaling;
        map_rows(column, rows, |value| Ok(value.scaled(factor, offset)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::seeded_rng;

    #[test]
    fn celsius_to_fahrenheit() {
        let column = Column::floats("temp", [0.0, 100.0]);
        let values = WrongUnit::new(1.8, 32.0)
            .transform(&column, &[0, 1], &mut seeded_rng(Some(0)))
            .expect("transform");
        assert_eq!(values, vec![Value::Float(32.0), Value::Float(212.0)]);
    }

    #[test]
    fn integral_scaling_keeps_ints() {
        let column = Column::ints("grams", [3, 4]);
        let values = WrongUnit::new(1000.0, 0.0)
            .transform(&column, &[1], &mut seeded_rng(Some(0)))
            .expect("transform");
        assert_eq!(values, vec![Value::Int(3), Value::Int(4000)]);
    }
}
