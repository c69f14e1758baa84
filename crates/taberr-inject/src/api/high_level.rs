use std::collections::BTreeMap;

use rand::Rng;
use rand::seq::IndexedRandom;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Beta, Distribution};
use tracing::{debug, info};

use taberr_core::{ColumnRef, ErrorMask, Table, error_count};
use taberr_plan::{ErrorTypeConfig, ErrorTypeSpec, MechanismKind, MechanismSpec, MissingValueConfig};

use super::mid_level::{self, MidLevelConfig};
use crate::error_type::error_type_from_spec;
use crate::errors::{InjectError, Result};
use crate::mechanism::mechanism_from_spec;
use crate::model::ErrorModel;
use crate::rng::seeded_rng;

const DEFAULT_MAX_MODELS: usize = 3;

/// Knobs for randomly generated error models.
#[derive(Debug, Clone, Default)]
pub struct HighLevelOptions {
    /// Models per column. Drawn from 1 to 3 when unset.
    pub n_error_models_per_column: Option<usize>,
    pub seed: Option<u64>,
    /// Error types each column may draw from. When unset every column uses
    /// missing values; when set, columns without an entry stay clean.
    pub error_types: Option<BTreeMap<ColumnRef, Vec<ErrorTypeSpec>>>,
}

impl HighLevelOptions {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_models_per_column(mut self, n: usize) -> Self {
        self.n_error_models_per_column = Some(n);
        self
    }

    pub fn with_error_types(mut self, column: impl Into<ColumnRef>, types: Vec<ErrorTypeSpec>) -> Self {
        self.error_types
            .get_or_insert_with(BTreeMap::new)
            .insert(column.into(), types);
        self
    }
}

/// Split `total` cells into `parts` non-negative counts that sum to `total`.
/// Breakpoints are sorted Beta(1.5, 1) draws scaled to `total`.
pub fn random_subdivision(parts: usize, total: usize, rng: &mut ChaCha8Rng) -> Result<Vec<usize>> {
    if parts == 0 {
        return Ok(Vec::new());
    }
    let beta = Beta::new(1.5, 1.0)
        .map_err(|err| InjectError::Config(format!("invalid subdivision distribution: {err}")))?;
    let mut breakpoints: Vec<usize> = (1..parts)
        .map(|_| {
            let point = (beta.sample(&mut *rng) * total as f64).floor() as usize;
            point.min(total)
        })
        .collect();
    breakpoints.sort_unstable();

    let mut sizes = Vec::with_capacity(parts);
    let mut previous = 0;
    for point in breakpoints.into_iter().chain(std::iter::once(total)) {
        sizes.push(point - previous);
        previous = point;
    }
    Ok(sizes)
}

/// Build random error models that corrupt `error_rate` of every eligible
/// column.
pub fn build_config(
    table: &Table,
    error_rate: f64,
    options: &HighLevelOptions,
) -> Result<MidLevelConfig> {
    if !error_rate.is_finite() || !(0.0..=1.0).contains(&error_rate) {
        return Err(InjectError::Config(format!(
            "error_rate must be between 0 and 1, got {error_rate}"
        )));
    }
    if table.is_empty() {
        return Err(InjectError::Config("the table is empty".to_string()));
    }

    let candidates = candidate_types(table, options)?;
    let mut rng = seeded_rng(options.seed);
    let rows = table.n_rows();
    let n_errors = error_count(rows, error_rate);
    let names = table.column_names();

    let mut mechanisms = vec![MechanismKind::Ecar, MechanismKind::Enar];
    if table.n_columns() > 1 {
        mechanisms.push(MechanismKind::Ear);
    }

    let mut config = MidLevelConfig::new();
    for (index, types) in candidates.iter().enumerate() {
        if types.is_empty() {
            continue;
        }
        let n_models = match options.n_error_models_per_column {
            Some(n) => n,
            None => rng.random_range(1..=DEFAULT_MAX_MODELS),
        };
        let counts = random_subdivision(n_models, n_errors, &mut rng)?;

        let mut models = Vec::new();
        for count in counts.into_iter().filter(|count| *count > 0) {
            let kind = mechanisms.choose(&mut rng).copied().unwrap_or(MechanismKind::Ecar);
            let mut mechanism = MechanismSpec::new(kind).with_seed(rng.random());
            if kind == MechanismKind::Ear {
                let others: Vec<usize> = (0..table.n_columns()).filter(|other| *other != index).collect();
                if let Some(other) = others.choose(&mut rng) {
                    mechanism = mechanism.conditioned_on(names[*other]);
                }
            }

            let error_type = types
                .choose(&mut rng)
                .cloned()
                .unwrap_or_else(missing_value)
                .with_seed(rng.random());
            debug!(
                column = names[index],
                mechanism = %kind,
                error_type = error_type.config.name(),
                cells = count,
                "error model drawn"
            );
            models.push(ErrorModel {
                mechanism: mechanism_from_spec(&mechanism),
                error_type: error_type_from_spec(&error_type),
                error_rate: count as f64 / rows as f64,
            });
        }
        config = config.with_column(names[index], models);
    }
    Ok(config)
}

/// Corrupt `error_rate` of each eligible column with randomly drawn models.
pub fn create_errors(
    table: &Table,
    error_rate: f64,
    options: &HighLevelOptions,
) -> Result<(Table, ErrorMask)> {
    let config = build_config(table, error_rate, options)?;
    info!(
        error_rate,
        seed = ?options.seed,
        models = config.model_count(),
        "random error models built"
    );
    mid_level::create_errors(table, &config)
}

fn missing_value() -> ErrorTypeSpec {
    ErrorTypeSpec::new(ErrorTypeConfig::MissingValue(MissingValueConfig::default()))
}

/// Candidate error types per column position.
fn candidate_types(table: &Table, options: &HighLevelOptions) -> Result<Vec<Vec<ErrorTypeSpec>>> {
    let Some(error_types) = &options.error_types else {
        return Ok(vec![vec![missing_value()]; table.n_columns()]);
    };

    let mut candidates = vec![Vec::new(); table.n_columns()];
    for (column, types) in error_types {
        let index = table.resolve(column)?;
        candidates[index].extend(types.iter().cloned());
    }
    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use taberr_core::Column;

    #[test]
    fn subdivision_sums_to_total() {
        let mut rng = seeded_rng(Some(5));
        for parts in 1..6 {
            let sizes = random_subdivision(parts, 37, &mut rng).expect("subdivide");
            assert_eq!(sizes.len(), parts);
            assert_eq!(sizes.iter().sum::<usize>(), 37);
        }
        assert!(random_subdivision(0, 10, &mut rng).expect("subdivide").is_empty());
    }

    #[test]
    fn config_covers_every_column_by_default() {
        let table = Table::new(vec![
            Column::ints("A", 0..20),
            Column::texts("B", (0..20).map(|v| format!("v{v}"))),
        ])
        .expect("valid table");
        let options = HighLevelOptions::default().with_seed(9).with_models_per_column(2);
        let config = build_config(&table, 0.5, &options).expect("config");

        assert_eq!(config.columns().len(), 2);
        for (_, models) in config.columns() {
            let cells: usize = models
                .iter()
                .map(|model| error_count(20, model.error_rate))
                .sum();
            assert_eq!(cells, 10);
            assert!(models.iter().all(|model| model.error_type.name() == "missing_value"));
        }
    }

    #[test]
    fn columns_without_types_stay_clean() {
        let table = Table::new(vec![Column::ints("A", 0..10), Column::ints("B", 0..10)])
            .expect("valid table");
        let options = HighLevelOptions::default().with_seed(1).with_error_types("B", vec![missing_value()]);
        let config = build_config(&table, 0.3, &options).expect("config");
        assert_eq!(config.columns().len(), 1);
        assert_eq!(config.columns()[0].0, ColumnRef::Name("B".to_string()));
    }

    #[test]
    fn rejects_invalid_rate() {
        let table = Table::new(vec![Column::ints("A", 0..10)]).expect("valid table");
        let result = build_config(&table, -0.1, &HighLevelOptions::default());
        assert!(matches!(result, Err(InjectError::Config(_))));
    }
}
