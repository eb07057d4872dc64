//! End-to-end insight flow: flatten, sample, prompt, generate.

use std::collections::{HashMap, VecDeque};
use std::sync::RwLock;

use tracing::{debug, info};

use crate::config::InsightConfig;
use crate::constants::cache::DEFAULT_MAX_ANSWERS;
use crate::errors::InsightError;
use crate::flatten::flatten_rows;
use crate::hash::insight_cache_key;
use crate::model::{ModelClient, SqlModelClient};
use crate::prompt::{InsightRequest, PromptBuilder, format_rows};
use crate::sampler::{BoundedSampler, SampleReport};
use crate::source::QueryRunner;
use crate::types::PromptText;

/// Prompt built for a request together with its sampling diagnostics.
#[derive(Clone, Debug)]
pub struct PreparedPrompt {
    /// Full prompt text.
    pub prompt: PromptText,
    /// How the request rows were sampled.
    pub report: SampleReport,
}

/// Drives insight requests from raw rows to model text.
///
/// Answers are cached per (prompt, temperature) so repeated renders of the
/// same tile do not re-invoke the model. The cache holds at most
/// [`DEFAULT_MAX_ANSWERS`] entries unless resized with
/// [`InsightService::with_cache_capacity`]; the oldest answer is evicted first.
pub struct InsightService<M> {
    config: InsightConfig,
    model: M,
    sampler: BoundedSampler,
    prompts: PromptBuilder,
    cache: RwLock<AnswerCache>,
}

struct CachedAnswer {
    prompt: PromptText,
    temperature: f64,
    text: String,
}

/// Insertion-ordered answer store capped at `max_answers` entries.
struct AnswerCache {
    answers: HashMap<i32, CachedAnswer>,
    order: VecDeque<i32>,
    max_answers: usize,
}

impl AnswerCache {
    fn new(max_answers: usize) -> Self {
        Self {
            answers: HashMap::new(),
            order: VecDeque::new(),
            max_answers,
        }
    }

    fn get(&self, key: i32, prompt: &str, temperature: f64) -> Option<String> {
        self.answers
            .get(&key)
            .filter(|entry| entry.prompt == prompt && entry.temperature == temperature)
            .map(|entry| entry.text.clone())
    }

    fn insert(&mut self, key: i32, answer: CachedAnswer) {
        if self.answers.insert(key, answer).is_some() {
            self.order.retain(|existing| *existing != key);
        }
        self.order.push_back(key);
        self.enforce_limit();
    }

    fn enforce_limit(&mut self) {
        while self.answers.len() > self.max_answers {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            self.answers.remove(&oldest);
        }
    }

    fn clear(&mut self) {
        self.answers.clear();
        self.order.clear();
    }
}

impl<R: QueryRunner> InsightService<SqlModelClient<R>> {
    /// Service generating through `ML.GENERATE_TEXT` on the configured connection.
    pub fn over_sql(config: InsightConfig, runner: R) -> Result<Self, InsightError> {
        let model = SqlModelClient::new(runner, &config.connection_name, &config.model_id)
            .with_generation(config.generation.clone())
            .with_subselect(config.subselect);
        Self::new(config, model)
    }
}

impl<M: ModelClient> InsightService<M> {
    /// Service over an arbitrary model client; `config` is validated up front.
    pub fn new(config: InsightConfig, model: M) -> Result<Self, InsightError> {
        config.validate()?;
        Ok(Self {
            sampler: BoundedSampler::new(config.budget),
            prompts: PromptBuilder::new(),
            cache: RwLock::new(AnswerCache::new(DEFAULT_MAX_ANSWERS)),
            config,
            model,
        })
    }

    /// Replace the prompt builder.
    pub fn with_prompt_builder(mut self, prompts: PromptBuilder) -> Self {
        self.prompts = prompts;
        self
    }

    /// Cap the answer cache at `max_answers` entries; `0` disables caching.
    pub fn with_cache_capacity(self, max_answers: usize) -> Self {
        Self {
            cache: RwLock::new(AnswerCache::new(max_answers)),
            ..self
        }
    }

    /// Number of answers currently cached.
    pub fn cached_answers(&self) -> usize {
        self.cache.read().expect("insight cache poisoned").answers.len()
    }

    /// Active configuration.
    pub fn config(&self) -> &InsightConfig {
        &self.config
    }

    /// Flatten and sample the request rows and render the prompt, without calling the model.
    pub fn prepare(&self, request: &InsightRequest) -> Result<PreparedPrompt, InsightError> {
        let flattened = flatten_rows(&request.rows);
        let sample = self.sampler.sample_with_report(flattened)?;
        let prompt = self.prompts.build(
            request.kind,
            &request.fields,
            &request.additional_context,
            &format_rows(&sample.records),
        );
        debug!(
            "[insights:service] prepared {} prompt ({} bytes, {}/{} rows)",
            request.kind,
            prompt.len(),
            sample.report.kept,
            sample.report.source_len
        );
        Ok(PreparedPrompt {
            prompt,
            report: sample.report,
        })
    }

    /// Run one insight request and return the model's cleaned text.
    pub fn send_message(&self, request: &InsightRequest) -> Result<String, InsightError> {
        let prepared = self.prepare(request)?;
        let key = insight_cache_key(&prepared.prompt, request.temperature);
        let hit = self
            .cache
            .read()
            .expect("insight cache poisoned")
            .get(key, &prepared.prompt, request.temperature);
        if let Some(text) = hit {
            debug!("[insights:service] cache hit for key {}", key);
            return Ok(text);
        }

        let text = self.model.generate(&prepared.prompt, request.temperature)?;
        info!(
            "[insights:service] {} insight ready ({} chars)",
            request.kind,
            text.len()
        );
        self.cache
            .write()
            .expect("insight cache poisoned")
            .insert(
                key,
                CachedAnswer {
                    prompt: prepared.prompt,
                    temperature: request.temperature,
                    text: text.clone(),
                },
            );
        Ok(text)
    }

    /// Drop every cached answer.
    pub fn clear_cache(&self) {
        self.cache.write().expect("insight cache poisoned").clear();
    }
}
