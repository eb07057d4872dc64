//! Generative-model seam and the SQL-backed client.

use serde_json::Value;
use tracing::{debug, info};

use crate::config::{GenerationConfig, SubselectMode};
use crate::constants::generation::{GENERATED_CONTENT_COLUMN, LOG_PREFIX};
use crate::errors::InsightError;
use crate::source::QueryRunner;
use crate::sql::generate_text_sql_with;
use crate::types::{ConnectionName, ModelId};
use crate::utils::clean_model_output;

/// Turns a prompt into model text.
pub trait ModelClient: Send + Sync {
    /// Generate a response for `prompt` at the given sampling temperature.
    fn generate(&self, prompt: &str, temperature: f64) -> Result<String, InsightError>;
}

impl<F> ModelClient for F
where
    F: Fn(&str, f64) -> Result<String, InsightError> + Send + Sync,
{
    fn generate(&self, prompt: &str, temperature: f64) -> Result<String, InsightError> {
        self(prompt, temperature)
    }
}

/// Model client that runs `ML.GENERATE_TEXT` through a warehouse connection.
pub struct SqlModelClient<R> {
    runner: R,
    connection: ConnectionName,
    model_id: ModelId,
    generation: GenerationConfig,
    subselect: SubselectMode,
}

impl<R: QueryRunner> SqlModelClient<R> {
    /// Client for `model_id` on `connection` with default generation settings.
    pub fn new(runner: R, connection: impl Into<String>, model_id: impl Into<String>) -> Self {
        Self {
            runner,
            connection: connection.into(),
            model_id: model_id.into(),
            generation: GenerationConfig::default(),
            subselect: SubselectMode::Native,
        }
    }

    /// Replace the generation parameters (temperature is still taken per call).
    pub fn with_generation(mut self, generation: GenerationConfig) -> Self {
        self.generation = generation;
        self
    }

    /// Choose how the prompt subselect is rendered.
    pub fn with_subselect(mut self, subselect: SubselectMode) -> Self {
        self.subselect = subselect;
        self
    }

    /// Underlying query runner.
    pub fn runner(&self) -> &R {
        &self.runner
    }
}

impl<R: QueryRunner> ModelClient for SqlModelClient<R> {
    fn generate(&self, prompt: &str, temperature: f64) -> Result<String, InsightError> {
        let generation = self.generation.with_temperature(temperature);
        let sql = generate_text_sql_with(&self.model_id, prompt, &generation, self.subselect);
        debug!(
            "{} registering generation query ({} bytes) on '{}'",
            LOG_PREFIX,
            sql.len(),
            self.connection
        );

        let created = self.runner.create_sql_query(&self.connection, &sql)?;
        let slug = created.slug.ok_or_else(|| InsightError::QueryFailed {
            connection: self.connection.clone(),
            reason: "query service returned no slug".to_string(),
        })?;
        let rows = self.runner.run_sql_query(&slug)?;
        let content = generated_content(&rows)?;
        info!(
            "{} model '{}' returned {} chars",
            LOG_PREFIX,
            self.model_id,
            content.len()
        );
        Ok(clean_model_output(content))
    }
}

fn generated_content(rows: &[Value]) -> Result<&str, InsightError> {
    rows.first()
        .and_then(|row| row.get(GENERATED_CONTENT_COLUMN))
        .and_then(Value::as_str)
        .ok_or_else(|| InsightError::MissingField(GENERATED_CONTENT_COLUMN.to_string()))
}
