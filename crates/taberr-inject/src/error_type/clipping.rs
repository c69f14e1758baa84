use rand_chacha::ChaCha8Rng;

use taberr_core::{Column, Value, stats};
use taberr_plan::{ClippingConfig, ErrorTypeConfig};

use super::{ErrorType, map_rows};
use crate::errors::{InjectError, Result};

/// Clamps flagged numeric cells to absolute bounds or column quantiles.
#[derive(Debug, Clone, PartialEq)]
pub struct Clipping {
    pub config: ClippingConfig,
    pub seed: Option<u64>,
}

impl Clipping {
    pub fn new(config: ClippingConfig) -> Self {
        Self { config, seed: None }
    }

    fn bound(
        column: &Column,
        numbers: &[f64],
        absolute: Option<f64>,
        quantile: Option<f64>,
    ) -> Result<Option<f64>> {
        match (absolute, quantile) {
            (Some(bound), _) => Ok(Some(bound)),
            (None, Some(q)) => stats::quantile(numbers, q).map(Some).ok_or_else(|| {
                InjectError::Config(format!(
                    "column '{}' has no values to compute the {q} quantile from",
                    column.name
                ))
            }),
            (None, None) => Ok(None),
        }
    }
}

impl ErrorType for Clipping {
    fn config(&self) -> ErrorTypeConfig {
        ErrorTypeConfig::Clipping(self.config.clone())
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
        let numbers = column.numeric_values();
        let lower = Self::bound(
            column,
            &numbers,
            self.config.clip_lower_bound,
            self.config.clip_lower_quantile,
        )?;
        let upper = Self::bound(
            column,
            &numbers,
            self.config.clip_upper_bound,
            self.config.clip_upper_quantile,
        )?;

        map_rows(column, rows, |value| {
            let Some(number) = value.as_f64() else {
                return Ok(None);
            };
            let mut clipped = number;
            if let Some(lower) = lower {
                clipped = clipped.max(lower);
            }
            if let Some(upper) = upper {
                clipped = clipped.min(upper);
            }
            Ok(Some(Value::numeric_like(value, clipped)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::seeded_rng;

    #[test]
    fn clamps_to_absolute_bounds() {
        let column = Column::ints("A", [-5, 0, 5, 50]);
        let error_type = Clipping::new(ClippingConfig {
            clip_lower_bound: Some(-1.0),
            clip_upper_bound: Some(10.0),
            ..ClippingConfig::default()
        });
        let values = error_type
            .transform(&column, &[0, 2, 3], &mut seeded_rng(Some(0)))
            .expect("transform");
        assert_eq!(
            values,
            vec![Value::Int(-1), Value::Int(0), Value::Int(5), Value::Int(10)]
        );
    }

    #[test]
    fn clamps_to_quantiles() {
        let column = Column::floats("A", [1.0, 2.0, 3.0, 4.0, 5.0]);
        let error_type = Clipping::new(ClippingConfig {
            clip_upper_quantile: Some(0.75),
            ..ClippingConfig::default()
        });
        let values = error_type
            .transform(&column, &[4], &mut seeded_rng(Some(0)))
            .expect("transform");
        assert_eq!(values[4], Value::Float(4.0));
        assert_eq!(values[0], Value::Float(1.0));
    }
}
