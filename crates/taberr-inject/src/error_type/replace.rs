use rand_chacha::ChaCha8Rng;
use regex::Regex;

use taberr_core::{Column, Value};
use taberr_plan::{ErrorTypeConfig, ReplaceConfig};

use super::{ErrorType, map_rows};
use crate::errors::{InjectError, Result};

/// Replaces a substring, or every regex match, in flagged text cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Replace {
    pub config: ReplaceConfig,
    pub seed: Option<u64>,
}

impl Replace {
    pub fn new(replace_what: impl Into<String>, replace_with: impl Into<String>) -> Self {
        Self {
            config: ReplaceConfig {
                replace_what: replace_what.into(),
                replace_with: replace_with.into(),
                regex: false,
            },
            seed: None,
        }
    }
}

impl ErrorType for Replace {
    fn config(&self) -> ErrorTypeConfig {
        ErrorTypeConfig::Replace(self.config.clone())
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
        let config = &self.config;
        let pattern = if config.regex {
            Some(Regex::new(&config.replace_what).map_err(|err| {
                InjectError::Config(format!(
                    "replace_what '{}' is not a valid regex: {err}",
                    config.replace_what
                ))
            })?)
        } else {
            None
        };

        map_rows(column, rows, |value| {
            let Some(text) = value.as_str() else {
                return Ok(None);
            };
            let replaced = match &pattern {
                Some(pattern) => pattern
                    .replace_all(text, config.replace_with.as_str())
                    .into_owned(),
                None => text.replace(&config.replace_what, &config.replace_with),
            };
            Ok(Some(Value::Text(replaced)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::seeded_rng;

    #[test]
    fn replaces_substrings_in_flagged_rows() {
        let column = Column::texts("city", ["New York", "New Delhi"]);
        let values = Replace::new("New", "Old")
            .transform(&column, &[0], &mut seeded_rng(Some(0)))
            .expect("transform");
        assert_eq!(values, vec![Value::from("Old York"), Value::from("New Delhi")]);
    }

    #[test]
    fn supports_regex_patterns() {
        let column = Column::texts("phone", ["555-0100"]);
        let mut error_type = Replace::new(r"\d", "#");
        error_type.config.regex = true;
        let values = error_type
            .transform(&column, &[0], &mut seeded_rng(Some(0)))
            .expect("transform");
        assert_eq!(values, vec![Value::from("###-####")]);
    }

    #[test]
    fn invalid_regex_is_a_config_error() {
        let column = Column::texts("A", ["x"]);
        let mut error_type = Replace::new("(", "");
        error_type.config.regex = true;
        let result = error_type.transform(&column, &[0], &mut seeded_rng(Some(0)));
        assert!(matches!(result, Err(InjectError::Config(_))));
    }
}
