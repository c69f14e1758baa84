use rand_chacha::ChaCha8Rng;

use taberr_core::{Column, ColumnRef, Value};
use taberr_plan::{ErrorTypeConfig, MistypeConfig, MistypeTarget};

use super::{ErrorType, map_rows};
use crate::errors::{InjectError, Result};

/// Stores flagged cells in a different representation, e.g. `3` as `3.0`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mistype {
    pub config: MistypeConfig,
    pub seed: Option<u64>,
}

impl Mistype {
    pub fn new(config: MistypeConfig) -> Self {
        Self { config, seed: None }
    }

    pub fn to(target: MistypeTarget) -> Self {
        Self::new(MistypeConfig {
            mistype_dtype: Some(target),
            ..MistypeConfig::default()
        })
    }
}

impl ErrorType for Mistype {
    fn config(&self) -> ErrorTypeConfig {
        ErrorTypeConfig::Mistype(self.config.clone())
    }

    fn seed(&self) -> Option<u64> {
        self.seed
    }

    fn check_type(&self, column_ref: &ColumnRef, column: &Column) -> Result<()> {
        if self.config.target_for(column.dtype).is_none() {
            return Err(InjectError::IncompatibleType {
                column: column_ref.clone(),
                dtype: column.dtype,
                error_type: "mistype",
            });
        }
        Ok(())
    }

    fn transform(
        &self,
        column: &Column,
        rows: &[usize],
        _rng: &mut ChaCha8Rng,
    ) -> Result<Vec<Value>> {
        let target = self.config.target_for(column.dtype).ok_or_else(|| {
            InjectError::Config(format!(
                "no mistype target for column '{}' of dtype {}",
                column.name, column.dtype
            ))
        })?;
        map_rows(column, rows, |value| recast(value, target, &column.name))
    }
}

/// Recast one value. `None` leaves nulls and values that already have the
/// target representation alone; values with no representation in `target`
/// are an error.
fn recast(value: &Value, target: MistypeTarget, column: &str) -> Result<Option<Value>> {
    let unrepresentable = || {
        InjectError::Config(format!(
            "mistype cannot store {value} of column '{column}' as {target:?}"
        ))
    };
    let recast = match (target, value) {
        (_, Value::Null) => None,
        (MistypeTarget::Object | MistypeTarget::Text, Value::Text(_)) => None,
        (MistypeTarget::Object | MistypeTarget::Text, other) => Some(Value::Text(other.to_string())),
        (MistypeTarget::Int, Value::Int(_)) => None,
        (MistypeTarget::Int, Value::Bool(flag)) => Some(Value::Int(i64::from(*flag))),
        (MistypeTarget::Int, Value::Float(number)) => {
            Some(float_to_int(*number).ok_or_else(unrepresentable)?)
        }
        (MistypeTarget::Int, Value::Text(text)) => {
            let text = text.trim();
            let parsed = text
                .parse::<i64>()
                .ok()
                .map(Value::Int)
                .or_else(|| text.parse::<f64>().ok().and_then(float_to_int));
            Some(parsed.ok_or_else(unrepresentable)?)
        }
        (MistypeTarget::Int, Value::DateTime(datetime)) => Some(Value::Int(
            datetime
                .and_utc()
                .timestamp_nanos_opt()
                .ok_or_else(unrepresentable)?,
        )),
        (MistypeTarget::Float, Value::Float(_)) => None,
        (MistypeTarget::Float, Value::Bool(flag)) => Some(Value::Float(f64::from(u8::from(*flag)))),
        (MistypeTarget::Float, Value::Int(number)) => Some(Value::Float(*number as f64)),
        (MistypeTarget::Float, Value::Text(text)) => Some(Value::Float(
            text.trim().parse::<f64>().map_err(|_| unrepresentable())?,
        )),
        (MistypeTarget::Float, Value::DateTime(datetime)) => Some(Value::Float(
            datetime
                .and_utc()
                .timestamp_nanos_opt()
                .ok_or_else(unrepresentable)? as f64,
        )),
    };
    Ok(recast)
}

fn float_to_int(number: f64) -> Option<Value> {
    let truncated = number.trunc();
    (truncated.is_finite() && truncated >= i64::MIN as f64 && truncated < i64::MAX as f64)
        .then(|| Value::Int(truncated as i64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::seeded_rng;
    use taberr_core::DataType;

    #[test]
    fn default_mapping_swaps_int_and_float() {
        let ints = Column::ints("A", [1, 2]);
        let values = Mistype::default()
            .transform(&ints, &[0], &mut seeded_rng(Some(0)))
            .expect("transform");
        assert_eq!(values, vec![Value::Float(1.0), Value::Int(2)]);

        let floats = Column::floats("B", [1.7, 2.5]);
        let values = Mistype::default()
            .transform(&floats, &[0, 1], &mut seeded_rng(Some(0)))
            .expect("transform");
        assert_eq!(values, vec![Value::Int(1), Value::Int(2)]);
    }

    #[test]
    fn bools_become_ints() {
        let column = Column::bools("flag", [true, false]);
        let values = Mistype::default()
            .transform(&column, &[0, 1], &mut seeded_rng(Some(0)))
            .expect("transform");
        assert_eq!(values, vec![Value::Int(1), Value::Int(0)]);
    }

    #[test]
    fn explicit_text_target() {
        let column = Column::ints("A", [42]);
        let values = Mistype::to(MistypeTarget::Text)
            .transform(&column, &[0], &mut seeded_rng(Some(0)))
            .expect("transform");
        assert_eq!(values, vec![Value::from("42")]);
    }

    #[test]
    fn text_columns_have_no_default_target() {
        let column = Column::texts("A", ["1", "2"]);
        let result = Mistype::default().check_type(&"A".into(), &column);
        assert!(matches!(
            result,
            Err(InjectError::IncompatibleType {
                dtype: DataType::Text,
                ..
            })
        ));
        assert!(
            Mistype::to(MistypeTarget::Object)
                .check_type(&"A".into(), &column)
                .is_err()
        );
    }

    #[test]
    fn numeric_text_becomes_numbers() {
        let column = Column::texts("A", ["7", " 2.9 ", "x"]);
        let values = Mistype::to(MistypeTarget::Int)
            .transform(&column, &[0, 1], &mut seeded_rng(Some(0)))
            .expect("transform");
        assert_eq!(values, vec![Value::Int(7), Value::Int(2), Value::from("x")]);

        let values = Mistype::to(MistypeTarget::Float)
            .transform(&column, &[1], &mut seeded_rng(Some(0)))
            .expect("transform");
        assert_eq!(values[1], Value::Float(2.9));
    }

    #[test]
    fn unrepresentable_values_are_errors() {
        let column = Column::texts("A", ["7", "x"]);
        let result =
            Mistype::to(MistypeTarget::Int).transform(&column, &[1], &mut seeded_rng(Some(0)));
        assert!(matches!(result, Err(InjectError::Config(_))));

        let floats = Column::floats("B", [f64::NAN]);
        let result = Mistype::default().transform(&floats, &[0], &mut seeded_rng(Some(0)));
        assert!(matches!(result, Err(InjectError::Config(_))));
    }

    #[test]
    fn datetimes_become_epoch_nanos() {
        let stamp = chrono::DateTime::from_timestamp(1, 0)
            .expect("timestamp")
            .naive_utc();
        let column = Column::datetimes("when", [stamp]);
        let values = Mistype::to(MistypeTarget::Float)
            .transform(&column, &[0], &mut seeded_rng(Some(0)))
            .expect("transform");
        assert_eq!(values, vec![Value::Float(1e9)]);
    }

    #[test]
    fn object_columns_need_an_explicit_target() {
        let column = Column::with_dtype("A", DataType::Object, vec![Value::Int(1)]);
        let result = Mistype::default().check_type(&"A".into(), &column);
        assert!(matches!(
            result,
            Err(InjectError::IncompatibleType {
                dtype: DataType::Object,
                ..
            })
        ));
        assert!(
            Mistype::to(MistypeTarget::Float)
                .check_type(&"A".into(), &column)
                .is_ok()
        );
    }
}
