//! Insight prompt assembly around sampled result rows.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::prompt::{DEFAULT_WORD_LIMIT, ROW_SEPARATOR, SECTION_RULE};
use crate::errors::InsightError;
use crate::types::{FlatRow, PromptText};
use crate::utils::escape_all;

/// Action the model is asked to perform on the result set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptKind {
    /// Rich summary of the returned data.
    #[default]
    Summarize,
    /// Forecast of future values from the returned data.
    Predict,
    /// Sentiment read of text-heavy result sets.
    Sentiment,
}

impl PromptKind {
    /// Wire name used in the prompt's Type section.
    pub const fn as_str(&self) -> &'static str {
        match self {
            PromptKind::Summarize => "summarize",
            PromptKind::Predict => "predict",
            PromptKind::Sentiment => "sentiment",
        }
    }
}

impl fmt::Display for PromptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PromptKind {
    type Err = InsightError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "summarize" | "summary" => Ok(PromptKind::Summarize),
            "predict" | "forecast" => Ok(PromptKind::Predict),
            "sentiment" => Ok(PromptKind::Sentiment),
            other => Err(InsightError::InvalidArgument(format!(
                "unknown prompt kind '{other}'"
            ))),
        }
    }
}

/// One insight request coming from a visualization tile.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InsightRequest {
    /// Query field metadata, embedded verbatim as JSON.
    pub fields: Value,
    /// Raw result rows in query order.
    pub rows: Vec<Value>,
    /// Requested action.
    #[serde(default)]
    pub kind: PromptKind,
    /// Per-request sampling temperature.
    pub temperature: f64,
    /// Free-form context typed by the dashboard user.
    #[serde(default)]
    pub additional_context: String,
}

/// Join flattened rows into the prompt's data section.
pub fn format_rows(rows: &[FlatRow]) -> String {
    rows.join(ROW_SEPARATOR)
}

/// Renders the insight prompt document.
#[derive(Clone, Debug, Default)]
pub struct PromptBuilder {
    word_limit: Option<usize>,
}

impl PromptBuilder {
    /// Builder with the default answer length hint ([`DEFAULT_WORD_LIMIT`] words).
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the answer length hint given to the model.
    pub fn with_word_limit(mut self, words: usize) -> Self {
        self.word_limit = Some(words);
        self
    }

    /// Render the full prompt for `kind` around already-formatted `data`.
    pub fn build(
        &self,
        kind: PromptKind,
        fields: &Value,
        additional_context: &str,
        data: &str,
    ) -> PromptText {
        let words = self.word_limit.unwrap_or(DEFAULT_WORD_LIMIT);
        let mut out = String::with_capacity(data.len() + 2048);

        section(&mut out, "Context");
        out.push_str(&format!(
            "You are a developer who will either provide a rich summary, a forecast, or a sentiment analysis of a query's result set and some metadata in a paragraph and under {words} words.\n\n"
        ));
        out.push_str("Instructions:\n");
        for line in instructions(kind) {
            out.push_str("  - ");
            out.push_str(line);
            out.push('\n');
        }
        out.push('\n');

        section(&mut out, "Type");
        out.push_str(kind.as_str());
        out.push_str("\n\n");

        section(&mut out, "Query Metadata");
        out.push_str("Metadata: ");
        out.push_str(&fields.to_string());
        out.push_str("\n\n");

        section(&mut out, "User Provided Context");
        out.push_str(&escape_all(additional_context));
        out.push_str("\n\n");

        section(&mut out, "Data");
        out.push_str(data);
        out.push_str("\n\n");

        section(&mut out, "Markdown Formatting Instructions");
        out.push_str(FORMATTING_GUIDE);
        out.push('\n');

        section(&mut out, "Output");
        out
    }
}

fn section(out: &mut String, title: &str) {
    out.push_str(title);
    out.push('\n');
    out.push_str(SECTION_RULE);
    out.push_str("\n\n");
}

fn instructions(kind: PromptKind) -> Vec<&'static str> {
    let mut lines = vec![
        "use the Type to inform what action to perform",
        "always return your response in detailed markdown, use the markdown formatting instructions",
        "do not generate headers or headings (h1, h2, h3 etc) just the text summary",
    ];
    lines.push(match kind {
        PromptKind::Summarize => {
            "use the query metadata to understand the nature of the query and then summarize the returned data"
        }
        PromptKind::Predict => "use the query data to predict future values",
        PromptKind::Sentiment => {
            "if the data has a lot of text data analyze the sentiment of the text"
        }
    });
    lines.extend([
        "use the user provided context (if any) to further customize and refine your response",
        "make the query data readable within a short amount of time, point out areas of interest and summarize long time ranges",
        "don't add next steps, but highlighting key areas of interest is important",
    ]);
    lines
}

const FORMATTING_GUIDE: &str = "\
When summarizing data, follow these guidelines to ensure clear and well-formatted markdown output.

Format numerical values consistently:
  - Use commas for thousands separators (e.g., 1,234,567)
  - Round decimals to 2 places unless more precision is necessary
  - Include relevant units (e.g., $1,234.56, 45%)

Use bold text for emphasis on key points or important data.
Don't use headers, bullet points, numbered lists, code blocks or tables; keep everything as concise paragraphs.
Use blockquotes for notable statements or findings.
Use italics for definitions or to provide additional context.
Keep formatting consistent and use white space to help readability.
";
