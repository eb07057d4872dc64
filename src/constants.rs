/// Constants used by the bounded sampler and its default budget.
pub mod sampler {
    /// Default ceiling on rows embedded into a prompt.
    pub const DEFAULT_MAX_ROWS: usize = 500;
    /// Default ceiling on aggregate serialized size of the embedded rows.
    pub const DEFAULT_TOKEN_LIMIT: f64 = 1_000_000.0;
    /// Cost trimming never shrinks a sample below this many records.
    pub const MIN_TRIMMED_LEN: usize = 2;
    /// Characters per token assumed by the approximate token estimator.
    pub const CHARS_PER_TOKEN: f64 = 4.0;
    /// Log prefix for sampler events.
    pub const LOG_PREFIX: &str = "[insights:sampler]";
}

/// Constants used when rendering generation SQL.
pub mod generation {
    /// Default sampling temperature.
    pub const DEFAULT_TEMPERATURE: f64 = 0.2;
    /// Default cap on generated tokens.
    pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 1024;
    /// Default nucleus sampling threshold.
    pub const DEFAULT_TOP_P: f64 = 0.98;
    /// Default top-k sampling width.
    pub const DEFAULT_TOP_K: u32 = 1;
    /// Column alias carrying generated text in the result set.
    pub const GENERATED_CONTENT_COLUMN: &str = "generated_content";
    /// Remote UDF used when the warehouse does not expose `ML.GENERATE_TEXT` natively.
    pub const REMOTE_UDF: &str = "llm.bq_vertex_remote";
    /// Log prefix for model invocation events.
    pub const LOG_PREFIX: &str = "[insights:model]";
}

/// Constants used by prompt assembly and response cleanup.
pub mod prompt {
    /// Separator between flattened rows in the prompt data section.
    pub const ROW_SEPARATOR: &str = "\n";
    /// Separator between `label:value` pairs within one flattened row.
    pub const PAIR_SEPARATOR: &str = ",";
    /// Field name holding the cell value in a result row entry.
    pub const VALUE_FIELD: &str = "value";
    /// Markdown fences removed from model output, longest first.
    pub const CODE_FENCES: [&str; 3] = ["```json", "```JSON", "```"];
    /// Section underline used by the prompt template.
    pub const SECTION_RULE: &str = "----------";
    /// Answer length hint given to the model when none is configured.
    pub const DEFAULT_WORD_LIMIT: usize = 50;
}

/// Constants used by the insight answer cache.
pub mod cache {
    /// Answers kept before the oldest entry is evicted.
    pub const DEFAULT_MAX_ANSWERS: usize = 64;
}
