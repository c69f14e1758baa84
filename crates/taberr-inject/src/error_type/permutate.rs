use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use tracing::warn;

use taberr_core::{Column, Value};
use taberr_plan::{AutomationPattern, ErrorTypeConfig, PermutateConfig};

use super::{ErrorType, map_rows};
use crate::errors::{InjectError, Result};

/// Reorders the separator-delimited tokens of flagged text cells, e.g.
/// `"Jane Doe"` to `"Doe Jane"`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Permutate {
    pub config: PermutateConfig,
    pub seed: Option<u64>,
}

impl Permutate {
    pub fn new(config: PermutateConfig) -> Self {
        Self { config, seed: None }
    }

    /// Same pattern for every cell: the configured one or a random
    /// non-identity shuffle.
    fn fixed_pattern(&self, tokens: usize, rng: &mut ChaCha8Rng) -> Result<Vec<usize>> {
        if let Some(pattern) = &self.config.permutation_pattern {
            if pattern.len() != tokens {
                return Err(InjectError::Config(format!(
                    "permutation_pattern has {} positions but values have {tokens} tokens",
                    pattern.len()
                )));
            }
            return Ok(pattern.clone());
        }
        let identity: Vec<usize> = (0..tokens).collect();
        let mut pattern = identity.clone();
        while pattern == identity {
            pattern.shuffle(rng);
        }
        Ok(pattern)
    }
}

impl ErrorType for Permutate {
    fn config(&self) -> ErrorTypeConfig {
        ErrorTypeConfig::Permutate(self.config.clone())
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
        let separator = self.config.permutation_separator.as_str();
        let mut token_counts = Vec::new();
        for value in column.values.iter().filter_map(Value::as_str) {
            let count = value.split(separator).count();
            if count < 2 {
                return Err(InjectError::Config(format!(
                    "column '{}' holds '{value}', which is not separated by '{separator}'",
                    column.name
                )));
            }
            token_counts.push(count);
        }

        let fixed = self.config.permutation_pattern.is_some()
            || self.config.permutation_automation_pattern == AutomationPattern::Fixed;
        if fixed {
            let tokens = token_counts.first().copied().unwrap_or(2);
            if token_counts.iter().any(|count| *count != tokens) {
                return Err(InjectError::Config(format!(
                    "a fixed permutation needs every value of column '{}' to have the same number of tokens",
                    column.name
                )));
            }
            let pattern = self.fixed_pattern(tokens, rng)?;
            return map_rows(column, rows, |value| {
                let Some(text) = value.as_str() else {
                    return Ok(None);
                };
                let old: Vec<&str> = text.split(separator).collect();
                let mut new = vec![""; old.len()];
                for (position, target) in pattern.iter().enumerate() {
                    new[*target] = old[position];
                }
                Ok(Some(Value::Text(new.join(separator))))
            });
        }

        map_rows(column, rows, |value| {
            let Some(text) = value.as_str() else {
                return Ok(None);
            };
            let old: Vec<&str> = text.split(separator).collect();
            if old.iter().all(|token| *token == old[0]) {
                warn!(
                    column = %column.name,
                    value = text,
                    "all tokens are identical, permutation leaves the value unchanged"
                );
                return Ok(None);
            }
            let mut new = old.clone();
            while new == old {
                new.shuffle(rng);
            }
            Ok(Some(Value::Text(new.join(separator))))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::seeded_rng;

    #[test]
    fn random_shuffle_changes_every_flagged_value() {
        let column = Column::texts("name", ["Jane Doe", "John Q Public", "Ada Lovelace"]);
        let values = Permutate::default()
            .transform(&column, &[0, 1], &mut seeded_rng(Some(2)))
            .expect("transform");
        assert_eq!(values[0], Value::from("Doe Jane"));
        assert_ne!(values[1], column.values[1]);
        assert_eq!(values[2], column.values[2]);
    }

    #[test]
    fn explicit_pattern_is_applied_to_all_rows() {
        let column = Column::texts("date", ["2024-01-31", "1999-12-24"]);
        let error_type = Permutate::new(PermutateConfig {
            permutation_separator: "-".to_string(),
            permutation_pattern: Some(vec![2, 1, 0]),
            permutation_automation_pattern: AutomationPattern::Fixed,
        });
        let values = error_type
            .transform(&column, &[0, 1], &mut seeded_rng(Some(0)))
            .expect("transform");
        assert_eq!(values, vec![Value::from("31-01-2024"), Value::from("24-12-1999")]);
    }

    #[test]
    fn unseparated_values_fail() {
        let column = Column::texts("name", ["Jane Doe", "Cher"]);
        let result = Permutate::default().transform(&column, &[0], &mut seeded_rng(Some(0)));
        assert!(matches!(result, Err(InjectError::Config(_))));
    }

    #[test]
    fn fixed_patterns_need_uniform_values() {
        let column = Column::texts("name", ["a b", "a b c"]);
        let error_type = Permutate::new(PermutateConfig {
            permutation_automation_pattern: AutomationPattern::Fixed,
            ..PermutateConfig::default()
        });
        let result = error_type.transform(&column, &[0], &mut seeded_rng(Some(0)));
        assert!(matches!(result, Err(InjectError::Config(_))));
    }
}
