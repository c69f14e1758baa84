use rand_chacha::ChaCha8Rng;

use taberr_core::{Column, Value};
use taberr_plan::{ErrorTypeConfig, ExtraneousConfig};

use super::{ErrorType, map_rows};
use crate::errors::Result;

/// Wraps flagged values in a template such as `"{value} USD"`.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraneous {
    pub config: ExtraneousConfig,
    pub seed: Option<u64>,
}

impl Extraneous {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            config: ExtraneousConfig {
                extraneous_value_template: template.into(),
            },
            seed: None,
        }
    }
}

impl ErrorType for Extraneous {
    fn config(&self) -> ErrorTypeConfig {
        ErrorTypeConfig::Extraneous(self.config.clone())
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
        let template = &self.config.extraneous_value_template;
        map_rows(column, rows, |value| {
            if value.is_null() {
                return Ok(None);
            }
            Ok(Some(Value::Text(template.replace(
                ExtraneousConfig::PLACEHOLDER,
                &value.to_string(),
            ))))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::seeded_rng;

    #[test]
    fn wraps_any_dtype() {
        let column = Column::ints("price", [12, 30]);
        let values = Extraneous::new("${value}.00")
            .transform(&column, &[1], &mut seeded_rng(Some(0)))
            .expect("transform");
        assert_eq!(values, vec![Value::Int(12), Value::from("$30.00")]);
    }
}
