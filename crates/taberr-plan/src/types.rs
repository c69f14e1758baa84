use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use taberr_core::{DataType, Value};

use crate::errors::{PlanError, Result};

/// Encodings Mojibake draws from when no pair is configured: the ten most
/// used character encodings on the web.
pub const MOJIBAKE_ENCODINGS: [&str; 10] = [
    "utf-8",
    "iso-8859-1",
    "windows-1252",
    "windows-1251",
    "shift_jis",
    "euc-jp",
    "gb2312",
    "euc-kr",
    "windows-1250",
    "iso-8859-2",
];

/// Receivers that garble text written with `sender`. Latin-1 style encodings
/// share most of their code points, so they are not paired with each other.
pub fn incompatible_encodings(sender: &str) -> Vec<&'static str> {
    let compatible: &[&str] = match sender {
        "iso-8859-1" | "windows-1252" | "iso-8859-2" => {
            &["iso-8859-1", "windows-1252", "windows-1250", "iso-8859-2"]
        }
        "windows-1250" => &[
            "windows-1250",
            "iso-8859-1",
            "iso-8859-2",
            "windows-1252",
            "windows-1251",
        ],
        other => {
            return MOJIBAKE_ENCODINGS
                .into_iter()
                .filter(|candidate| *candidate != other)
                .collect();
        }
    };
    MOJIBAKE_ENCODINGS
        .into_iter()
        .filter(|candidate| !compatible.contains(candidate))
        .collect()
}

/// Parameters of one error type. Each variant carries only the fields its
/// error type reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ErrorTypeConfig {
    MissingValue(MissingValueConfig),
    AddDelta(AddDeltaConfig),
    Outlier(OutlierConfig),
    Mistype(MistypeConfig),
    Mojibake(MojibakeConfig),
    Permutate(PermutateConfig),
    Replace(ReplaceConfig),
    Extraneous(ExtraneousConfig),
    WrongUnit(WrongUnitConfig),
    Clipping(ClippingConfig),
    Typo(TypoConfig),
    CategorySwap(CategorySwapConfig),
}

impl ErrorTypeConfig {
    pub fn name(&self) -> &'static str {
        match self {
            ErrorTypeConfig::MissingValue(_) => "missing_value",
            ErrorTypeConfig::AddDelta(_) => "add_delta",
            ErrorTypeConfig::Outlier(_) => "outlier",
            ErrorTypeConfig::Mistype(_) => "mistype",
            ErrorTypeConfig::Mojibake(_) => "mojibake",
            ErrorTypeConfig::Permutate(_) => "permutate",
            ErrorTypeConfig::Replace(_) => "replace",
            ErrorTypeConfig::Extraneous(_) => "extraneous",
            ErrorTypeConfig::WrongUnit(_) => "wrong_unit",
            ErrorTypeConfig::Clipping(_) => "clipping",
            ErrorTypeConfig::Typo(_) => "typo",
            ErrorTypeConfig::CategorySwap(_) => "category_swap",
        }
    }

    /// Whether the error type can be applied to a column of `dtype`.
    pub fn supports(&self, dtype: DataType) -> bool {
        match self {
            ErrorTypeConfig::MissingValue(_)
            | ErrorTypeConfig::Mistype(_)
            | ErrorTypeConfig::Extraneous(_) => true,
            ErrorTypeConfig::AddDelta(_)
            | ErrorTypeConfig::WrongUnit(_)
            | ErrorTypeConfig::Clipping(_) => dtype.is_numeric(),
            ErrorTypeConfig::Outlier(_) => dtype.is_numeric() || dtype == DataType::DateTime,
            ErrorTypeConfig::Mojibake(_)
            | ErrorTypeConfig::Permutate(_)
            | ErrorTypeConfig::Replace(_)
            | ErrorTypeConfig::Typo(_) => dtype.is_string(),
            ErrorTypeConfig::CategorySwap(_) => {
                matches!(dtype, DataType::Categorical | DataType::Text)
            }
        }
    }

    /// Check parameters that serde alone cannot enforce.
    pub fn validate(&self) -> Result<()> {
        match self {
            ErrorTypeConfig::MissingValue(_) | ErrorTypeConfig::CategorySwap(_) => Ok(()),
            ErrorTypeConfig::AddDelta(config) => config.validate(),
            ErrorTypeConfig::Outlier(config) => config.validate(),
            ErrorTypeConfig::Mistype(_) => Ok(()),
            ErrorTypeConfig::Mojibake(config) => config.validate(),
            ErrorTypeConfig::Permutate(config) => config.validate(),
            ErrorTypeConfig::Replace(config) => config.validate(),
            ErrorTypeConfig::Extraneous(config) => config.validate(),
            ErrorTypeConfig::WrongUnit(config) => config.validate(),
            ErrorTypeConfig::Clipping(config) => config.validate(),
            ErrorTypeConfig::Typo(config) => config.validate(),
        }
    }
}

fn invalid(error_type: &'static str, message: impl Into<String>) -> PlanError {
    PlanError::InvalidConfig {
        error_type,
        message: message.into(),
    }
}

/// Sentinel written into selected cells; `null` when unset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct MissingValueConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing_value: Option<Value>,
}

impl MissingValueConfig {
    pub fn sentinel(&self) -> Value {
        self.missing_value.clone().unwrap_or(Value::Null)
    }
}

/// Delta added to numeric cells; derived from the column when unset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AddDeltaConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub add_delta_value: Option<f64>,
}

impl AddDeltaConfig {
    fn validate(&self) -> Result<()> {
        match self.add_delta_value {
            Some(delta) if !delta.is_finite() => {
                Err(invalid("add_delta", "add_delta_value must be finite"))
            }
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct OutlierConfig {
    /// Distance from the median, in IQRs.
    pub outlier_coefficient: f64,
    /// Standard deviation of the Gaussian noise, in IQRs.
    pub outlier_noise_coeff: f64,
    /// Probability that a cell is pushed below the median.
    pub outlier_coin_flip_threshold: f64,
}

impl Default for OutlierConfig {
    fn default() -> Self {
        Self {
            outlier_coefficient: 1.0,
            outlier_noise_coeff: 0.1,
            outlier_coin_flip_threshold: 0.5,
        }
    }
}

impl OutlierConfig {
    fn validate(&self) -> Result<()> {
        if !self.outlier_coefficient.is_finite() || self.outlier_coefficient < 0.0 {
            return Err(invalid(
                "outlier",
                "outlier_coefficient must be a non-negative number",
            ));
        }
        if !self.outlier_noise_coeff.is_finite() || self.outlier_noise_coeff < 0.0 {
            return Err(invalid(
                "outlier",
                "outlier_noise_coeff must be a non-negative number",
            ));
        }
        if !(0.0..=1.0).contains(&self.outlier_coin_flip_threshold) {
            return Err(invalid(
                "outlier",
                "outlier_coin_flip_threshold must be between 0 and 1",
            ));
        }
        Ok(())
    }
}

/// Target representation for Mistype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MistypeTarget {
    Object,
    Text,
    Int,
    Float,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct MistypeConfig {
    /// Explicit target for every column.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mistype_dtype: Option<MistypeTarget>,
    /// Extends or replaces the built-in dtype mapping.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub overrides: BTreeMap<DataType, MistypeTarget>,
}

impl MistypeConfig {
    /// Target for a column of `dtype`: explicit target, then overrides, then
    /// the built-in mapping. `None` when nothing applies or when the target
    /// would store the cells unchanged. Text and objects are the end of the
    /// line, so text columns have no built-in target.
    pub fn target_for(&self, dtype: DataType) -> Option<MistypeTarget> {
        let target = self
            .mistype_dtype
            .or_else(|| self.overrides.get(&dtype).copied())
            .or(match dtype {
                DataType::Int => Some(MistypeTarget::Float),
                DataType::Float => Some(MistypeTarget::Int),
                DataType::Bool => Some(MistypeTarget::Int),
                DataType::Text
                | DataType::Categorical
                | DataType::DateTime
                | DataType::Object => None,
            })?;
        (!MistypeTarget::keeps(dtype, target)).then_some(target)
    }
}

impl MistypeTarget {
    /// True when values of `dtype` already have the representation of `target`.
    pub fn keeps(dtype: DataType, target: MistypeTarget) -> bool {
        matches!(
            (dtype, target),
            (
                DataType::Text | DataType::Categorical | DataType::Object,
                MistypeTarget::Text | MistypeTarget::Object
            ) | (DataType::Int, MistypeTarget::Int)
                | (DataType::Float, MistypeTarget::Float)
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct MojibakeConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoding_sender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoding_receiver: Option<String>,
}

impl MojibakeConfig {
    fn validate(&self) -> Result<()> {
        match (&self.encoding_sender, &self.encoding_receiver) {
            (None, None) => Ok(()),
            (Some(sender), Some(receiver)) => {
                for encoding in [sender, receiver] {
                    if !MOJIBAKE_ENCODINGS.contains(&encoding.as_str()) {
                        return Err(invalid(
                            "mojibake",
                            format!("unsupported encoding '{encoding}'"),
                        ));
                    }
                }
                if sender == receiver {
                    return Err(invalid(
                        "mojibake",
                        "encoding_sender and encoding_receiver must differ",
                    ));
                }
                Ok(())
            }
            _ => Err(invalid(
                "mojibake",
                "encoding_sender and encoding_receiver must be set together",
            )),
        }
    }
}

/// How Permutate chooses the new token order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AutomationPattern {
    /// A fresh shuffle per cell.
    #[default]
    Random,
    /// One shuffle shared by every cell of the column.
    Fixed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct PermutateConfig {
    pub permutation_separator: String,
    /// Explicit target position of each token; implies a fixed pattern.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permutation_pattern: Option<Vec<usize>>,
    pub permutation_automation_pattern: AutomationPattern,
}

impl Default for PermutateConfig {
    fn default() -> Self {
        Self {
            permutation_separator: " ".to_string(),
            permutation_pattern: None,
            permutation_automation_pattern: AutomationPattern::Random,
        }
    }
}

impl PermutateConfig {
    fn validate(&self) -> Result<()> {
        if self.permutation_separator.is_empty() {
            return Err(invalid(
                "permutate",
                "permutation_separator must not be empty",
            ));
        }
        if let Some(pattern) = &self.permutation_pattern {
            let mut seen = vec![false; pattern.len()];
            for position in pattern {
                match seen.get_mut(*position) {
                    Some(slot) if !*slot => *slot = true,
                    _ => {
                        return Err(invalid(
                            "permutate",
                            format!(
                                "permutation_pattern {pattern:?} is not a permutation of 0..{}",
                                pattern.len()
                            ),
                        ));
                    }
                }
            }
            if pattern.iter().enumerate().all(|(idx, pos)| idx == *pos) {
                return Err(invalid(
                    "permutate",
                    "permutation_pattern must not be the identity",
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ReplaceConfig {
    pub replace_what: String,
    #[serde(default)]
    pub replace_with: String,
    /// Treat `replace_what` as a regular expression.
    #[serde(default)]
    pub regex: bool,
}

impl ReplaceConfig {
    fn validate(&self) -> Result<()> {
        if self.replace_what.is_empty() {
            return Err(invalid("replace", "replace_what must not be empty"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ExtraneousConfig {
    /// Template with a `{value}` placeholder, e.g. `"{value} USD"`.
    pub extraneous_value_template: String,
}

impl ExtraneousConfig {
    pub const PLACEHOLDER: &'static str = "{value}";

    fn validate(&self) -> Result<()> {
        if !self.extraneous_value_template.contains(Self::PLACEHOLDER) {
            return Err(invalid(
                "extraneous",
                format!(
                    "template '{}' does not contain the placeholder {}",
                    self.extraneous_value_template,
                    Self::PLACEHOLDER
                ),
            ));
        }
        Ok(())
    }
}

/// Affine unit conversion, `value * factor + offset`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct UnitScaling {
    pub factor: f64,
    #[serde(default)]
    pub offset: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct WrongUnitConfig {
    pub wrong_unit_scaling: UnitScaling,
}

impl WrongUnitConfig {
    fn validate(&self) -> Result<()> {
        let UnitScaling { factor, offset } = self.wrong_unit_scaling;
        if !factor.is_finite() || !offset.is_finite() {
            return Err(invalid("wrong_unit", "scaling must be finite"));
        }
        if factor == 1.0 && offset == 0.0 {
            return Err(invalid(
                "wrong_unit",
                "scaling is the identity and would not change any value",
            ));
        }
        Ok(())
    }
}

/// Clamp bounds, either absolute or as column quantiles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ClippingConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clip_lower_bound: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clip_upper_bound: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clip_lower_quantile: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clip_upper_quantile: Option<f64>,
}

impl ClippingConfig {
    fn validate(&self) -> Result<()> {
        if self.clip_lower_bound.is_some() && self.clip_lower_quantile.is_some() {
            return Err(invalid(
                "clipping",
                "set either clip_lower_bound or clip_lower_quantile, not both",
            ));
        }
        if self.clip_upper_bound.is_some() && self.clip_upper_quantile.is_some() {
            return Err(invalid(
                "clipping",
                "set either clip_upper_bound or clip_upper_quantile, not both",
            ));
        }
        let has_lower = self.clip_lower_bound.is_some() || self.clip_lower_quantile.is_some();
        let has_upper = self.clip_upper_bound.is_some() || self.clip_upper_quantile.is_some();
        if !has_lower && !has_upper {
            return Err(invalid(
                "clipping",
                "at least one bound or quantile must be configured",
            ));
        }
        for quantile in [self.clip_lower_quantile, self.clip_upper_quantile]
            .into_iter()
            .flatten()
        {
            if !(0.0..=1.0).contains(&quantile) {
                return Err(invalid("clipping", "quantiles must be between 0 and 1"));
            }
        }
        if let (Some(lower), Some(upper)) = (self.clip_lower_bound, self.clip_upper_bound) {
            if lower > upper {
                return Err(invalid(
                    "clipping",
                    "clip_lower_bound must be <= clip_upper_bound",
                ));
            }
        }
        if let (Some(lower), Some(upper)) = (self.clip_lower_quantile, self.clip_upper_quantile) {
            if lower > upper {
                return Err(invalid(
                    "clipping",
                    "clip_lower_quantile must be <= clip_upper_quantile",
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct TypoConfig {
    pub keyboard_layout: String,
    /// One typo per this many characters, at least one per cell.
    pub error_period: u32,
}

impl TypoConfig {
    pub const SUPPORTED_LAYOUTS: [&'static str; 1] = ["ansi-qwerty"];

    fn validate(&self) -> Result<()> {
        if !Self::SUPPORTED_LAYOUTS.contains(&self.keyboard_layout.as_str()) {
            return Err(invalid(
                "typo",
                format!("unsupported keyboard_layout '{}'", self.keyboard_layout),
            ));
        }
        if self.error_period == 0 {
            return Err(invalid("typo", "error_period must be >= 1"));
        }
        Ok(())
    }
}

impl Default for TypoConfig {
    fn default() -> Self {
        Self {
            keyboard_layout: "ansi-qwerty".to_string(),
            error_period: 10,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CategorySwapConfig {}
