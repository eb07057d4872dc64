use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::generation::{
    DEFAULT_MAX_OUTPUT_TOKENS, DEFAULT_TEMPERATURE, DEFAULT_TOP_K, DEFAULT_TOP_P,
};
use crate::constants::sampler::{DEFAULT_MAX_ROWS, DEFAULT_TOKEN_LIMIT};
use crate::errors::InsightError;
use crate::types::{ConnectionName, ModelId};

/// Count and cost ceilings a sample must satisfy.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SampleBudget {
    /// Max records kept before cost trimming; must be positive.
    pub max_count: usize,
    /// Max aggregate cost of the kept records; must be positive and finite.
    pub max_cost: f64,
}

impl SampleBudget {
    /// Build a budget from explicit ceilings (validated at sampling time).
    pub fn new(max_count: usize, max_cost: f64) -> Self {
        Self {
            max_count,
            max_cost,
        }
    }

    /// Reject budgets the sampler cannot honor.
    pub fn validate(&self) -> Result<(), InsightError> {
        if self.max_count == 0 {
            return Err(InsightError::InvalidArgument(
                "max_count must be greater than zero".to_string(),
            ));
        }
        if !self.max_cost.is_finite() || self.max_cost <= 0.0 {
            return Err(InsightError::InvalidArgument(format!(
                "max_cost must be a positive finite number, got {}",
                self.max_cost
            )));
        }
        Ok(())
    }
}

impl Default for SampleBudget {
    fn default() -> Self {
        Self {
            max_count: DEFAULT_MAX_ROWS,
            max_cost: DEFAULT_TOKEN_LIMIT,
        }
    }
}

/// Parameters passed to the remote model in the generation `STRUCT`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Sampling temperature.
    pub temperature: f64,
    /// Cap on generated tokens.
    pub max_output_tokens: u32,
    /// Nucleus sampling threshold.
    pub top_p: f64,
    /// Top-k sampling width.
    pub top_k: u32,
    /// Ask the warehouse to flatten the model's JSON response into columns.
    pub flatten_json_output: bool,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            top_p: DEFAULT_TOP_P,
            top_k: DEFAULT_TOP_K,
            flatten_json_output: true,
        }
    }
}

impl GenerationConfig {
    /// Copy of this config with a per-request temperature.
    pub fn with_temperature(&self, temperature: f64) -> Self {
        Self {
            temperature,
            ..self.clone()
        }
    }
}

/// How the prompt subselect reaches the model.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubselectMode {
    /// `ML.GENERATE_TEXT` reads the `prompt` column directly.
    #[default]
    Native,
    /// Prompt is routed through the remote UDF.
    RemoteUdf,
}

/// Top-level configuration for an insight service.
///
/// Connection and model identifiers are explicit values supplied by the
/// caller; nothing is read from the process environment.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightConfig {
    /// Warehouse connection the generation SQL runs on.
    pub connection_name: ConnectionName,
    /// Remote model referenced by `ML.GENERATE_TEXT`.
    pub model_id: ModelId,
    /// Row/cost ceilings for the embedded data section.
    pub budget: SampleBudget,
    /// Default generation parameters; temperature is overridden per request.
    pub generation: GenerationConfig,
    /// Subselect flavour used when rendering generation SQL.
    pub subselect: SubselectMode,
}

impl InsightConfig {
    /// Parse a JSON config document; missing fields fall back to defaults.
    pub fn from_json_str(raw: &str) -> Result<Self, InsightError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a JSON config file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, InsightError> {
        let raw = fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Check budget ceilings and required identifiers.
    pub fn validate(&self) -> Result<(), InsightError> {
        self.budget
            .validate()
            .map_err(|err| InsightError::Configuration(err.to_string()))?;
        if self.model_id.trim().is_empty() {
            return Err(InsightError::Configuration(
                "model_id must not be empty".to_string(),
            ));
        }
        if self.connection_name.trim().is_empty() {
            return Err(InsightError::Configuration(
                "connection_name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
