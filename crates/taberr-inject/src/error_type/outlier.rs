use chrono::DateTime;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

use taberr_core::{Column, DataType, Value, stats};
use taberr_plan::{ErrorTypeConfig, OutlierConfig};

use super::ErrorType;
use crate::errors::{InjectError, Result};

/// IQR used when the column has no spread.
const MIN_IQR: f64 = 1e-9;

/// Pushes flagged cells away from the median by a multiple of the IQR plus
/// Gaussian noise. Datetimes are handled as nanoseconds since the epoch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outlier {
    pub config: OutlierConfig,
    pub seed: Option<u64>,
}

impl Outlier {
    pub fn new(config: OutlierConfig) -> Self {
        Self { config, seed: None }
    }
}

impl ErrorType for Outlier {
    fn config(&self) -> ErrorTypeConfig {
        ErrorTypeConfig::Outlier(self.config.clone())
    }

    fn seed(&self) -> Option<u64> {
        self.seed
    }

    fn transform(
        &self,
        column: &Column,
        rows: &[usize],
        rng: &mut ChaCha8Rng,
    ) -> Result<Vec<Value>> {
        let is_datetime = column.dtype == DataType::DateTime;
        let numbers: Vec<f64> = column
            .values
            .iter()
            .filter_map(|value| as_number(value, is_datetime))
            .collect();

        let median = stats::median(&numbers).ok_or_else(|| {
            InjectError::Config(format!(
                "column '{}' has no values to compute outliers from",
                column.name
            ))
        })?;
        let iqr = match stats::iqr(&numbers) {
            Some(iqr) if iqr > 0.0 => iqr,
            _ => MIN_IQR,
        };

        // `true` pushes the cell below the median.
        let threshold = self.config.outlier_coin_flip_threshold;
        let mut below: Vec<bool> = rows
            .iter()
            .map(|_| rng.random::<f64>() < threshold)
            .collect();
        if below.len() > 1 {
            if below.iter().all(|flag| !flag) {
                let flip = rng.random_range(0..below.len());
                below[flip] = true;
            } else if below.iter().all(|flag| *flag) {
                let flip = rng.random_range(0..below.len());
                below[flip] = false;
            }
        }

        let noise = Normal::new(0.0, self.config.outlier_noise_coeff * iqr)
            .map_err(|err| InjectError::Config(format!("invalid outlier noise: {err}")))?;
        let shift = self.config.outlier_coefficient * iqr;

        let mut values = column.values.clone();
        for (&row, is_below) in rows.iter().zip(below) {
            let jitter = noise.sample(rng);
            let pushed = if is_below {
                median - shift - jitter
            } else {
                median + shift + jitter
            };
            values[row] = if is_datetime {
                datetime_from_nanos(pushed)
            } else {
                Value::numeric_like(&values[row], pushed)
            };
        }
        Ok(values)
    }
}

fn as_number(value: &Value, is_datetime: bool) -> Option<f64> {
    if is_datetime {
        value
            .as_datetime()
            .and_then(|datetime| datetime.and_utc().timestamp_nanos_opt())
            .map(|nanos| nanos as f64)
    } else {
        value.as_f64()
    }
}

/// Clamp to the representable nanosecond range before converting back.
fn datetime_from_nanos(nanos: f64) -> Value {
    let nanos = nanos.clamp(i64::MIN as f64, i64::MAX as f64) as i64;
    Value::DateTime(DateTime::from_timestamp_nanos(nanos).naive_utc())
}
