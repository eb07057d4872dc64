#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Budget and generation configuration types.
pub mod config;
/// Centralized constants used across sampling, prompts, and generation SQL.
pub mod constants;
/// Cost estimators for candidate samples.
pub mod cost;
/// Reusable example runners shared by demos and downstream crates.
pub mod example_apps;
/// Nested result-row flattening.
pub mod flatten;
/// Stable string hashing for cache keys.
pub mod hash;
/// End-to-end insight service.
pub mod insights;
/// Generative-model client seam.
pub mod model;
/// Insight prompt assembly.
pub mod prompt;
/// Bounded head/tail sampler.
pub mod sampler;
/// Query-execution seam and in-memory runner.
pub mod source;
/// Generation SQL rendering.
pub mod sql;
/// Shared type aliases.
pub mod types;
/// Escaping and model output cleanup helpers.
pub mod utils;

mod errors;

pub use config::{GenerationConfig, InsightConfig, SampleBudget, SubselectMode};
pub use cost::{ApproxTokens, CostEstimator, RecordCount, SerializedLength, estimate_cost};
pub use errors::InsightError;
pub use flatten::{flatten_row, flatten_rows, flatten_values};
pub use hash::string_to_hash;
pub use insights::{InsightService, PreparedPrompt};
pub use model::{ModelClient, SqlModelClient};
pub use prompt::{InsightRequest, PromptBuilder, PromptKind, format_rows};
pub use sampler::{BoundedSampler, Sample, SampleReport, sample_records};
pub use source::{CreatedSqlQuery, InMemoryQueryRunner, QueryRunner};
pub use sql::generate_text_sql;
pub use types::{ConnectionName, FlatRow, ModelId, PromptText, QuerySlug, SqlText};
pub use utils::{
    clean_model_output, escape_all, escape_backslashes, escape_line_breaks, escape_quotes,
};
