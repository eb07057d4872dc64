use std::error::Error;
use std::fs;
use std::path::PathBuf;

use clap::{Parser, ValueEnum, error::ErrorKind};
use serde_json::Value;

use crate::config::InsightConfig;
use crate::insights::{InsightService, PreparedPrompt};
use crate::prompt::{InsightRequest, PromptBuilder, PromptKind};
use crate::sql::generate_text_sql_with;
use crate::{InsightError, SampleReport};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum KindArg {
    Summarize,
    Predict,
    Sentiment,
}

impl From<KindArg> for PromptKind {
    fn from(value: KindArg) -> Self {
        match value {
            KindArg::Summarize => PromptKind::Summarize,
            KindArg::Predict => PromptKind::Predict,
            KindArg::Sentiment => PromptKind::Sentiment,
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "prompt_preview",
    disable_help_subcommand = true,
    about = "Preview the insight prompt for a result set",
    long_about = "Flatten and sample query result rows from a JSON file and print the prompt (and optionally the generation SQL) that would be sent to the model.",
    after_help = "Budget flags override values loaded from --config."
)]
/// CLI for `prompt_preview`.
///
/// Common usage:
/// - Preview with defaults: `--rows rows.json`
/// - Tighten the budget: `--rows rows.json --max-rows 40 --token-limit 8000`
/// - Show the SQL too: `--rows rows.json --show-sql`
struct PromptPreviewCli {
    #[arg(
        long,
        value_name = "PATH",
        help = "JSON file holding an array of result rows"
    )]
    rows: PathBuf,
    #[arg(
        long,
        value_name = "PATH",
        help = "Optional JSON file holding query field metadata"
    )]
    fields: Option<PathBuf>,
    #[arg(
        long,
        value_name = "PATH",
        help = "Optional JSON insight config (connection, model, budget, generation)"
    )]
    config: Option<PathBuf>,
    #[arg(
        long = "max-rows",
        value_parser = parse_positive_usize,
        help = "Row ceiling for the data section"
    )]
    max_rows: Option<usize>,
    #[arg(
        long = "token-limit",
        value_parser = parse_positive_f64,
        help = "Serialized-size ceiling for the data section"
    )]
    token_limit: Option<f64>,
    #[arg(long, value_enum, default_value = "summarize", help = "Prompt type")]
    kind: KindArg,
    #[arg(long, default_value = "", help = "User provided context")]
    context: String,
    #[arg(long, default_value_t = 0.2, help = "Sampling temperature")]
    temperature: f64,
    #[arg(long = "word-limit", help = "Answer length hint given to the model")]
    word_limit: Option<usize>,
    #[arg(long = "show-sql", help = "Also print the generation SQL")]
    show_sql: bool,
}

/// Parse `args_iter` as `prompt_preview` arguments and print the prompt preview.
pub fn run_prompt_preview<I>(args_iter: I) -> Result<(), Box<dyn Error>>
where
    I: Iterator<Item = String>,
{
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let Some(cli) = parse_cli::<PromptPreviewCli, _>(
        std::iter::once("prompt_preview".to_string()).chain(args_iter),
    )?
    else {
        return Ok(());
    };

    let config = resolve_config(&cli)?;
    let prepared = build_preview(&cli, &config)?;
    print_report(&prepared.report);
    println!("<<< BEGIN PROMPT >>>\n{}\n<<< END PROMPT >>>", prepared.prompt);
    if cli.show_sql {
        let generation = config.generation.with_temperature(cli.temperature);
        println!(
            "<<< BEGIN SQL >>>\n{}\n<<< END SQL >>>",
            generate_text_sql_with(
                &config.model_id,
                &prepared.prompt,
                &generation,
                config.subselect
            )
        );
    }
    Ok(())
}

fn resolve_config(cli: &PromptPreviewCli) -> Result<InsightConfig, InsightError> {
    let mut config = match &cli.config {
        Some(path) => InsightConfig::from_path(path)?,
        None => InsightConfig {
            connection_name: "preview".to_string(),
            model_id: "preview.model".to_string(),
            ..InsightConfig::default()
        },
    };
    if let Some(max_rows) = cli.max_rows {
        config.budget.max_count = max_rows;
    }
    if let Some(limit) = cli.token_limit {
        config.budget.max_cost = limit;
    }
    config.validate()?;
    Ok(config)
}

fn build_preview(
    cli: &PromptPreviewCli,
    config: &InsightConfig,
) -> Result<PreparedPrompt, InsightError> {
    let rows: Vec<Value> = serde_json::from_str(&fs::read_to_string(&cli.rows)?)?;
    let fields = match &cli.fields {
        Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
        None => Value::Null,
    };
    let mut prompts = PromptBuilder::new();
    if let Some(words) = cli.word_limit {
        prompts = prompts.with_word_limit(words);
    }
    let service = InsightService::new(config.clone(), preview_only)?.with_prompt_builder(prompts);
    service.prepare(&InsightRequest {
        fields,
        rows,
        kind: cli.kind.into(),
        temperature: cli.temperature,
        additional_context: cli.context.clone(),
    })
}

fn preview_only(_: &str, _: f64) -> Result<String, InsightError> {
    Err(InsightError::InvalidArgument(
        "prompt_preview never calls the model".to_string(),
    ))
}

fn print_report(report: &SampleReport) {
    println!("=== sample report ===");
    println!("source rows : {}", report.source_len);
    println!(
        "kept rows   : {} (head={} tail={})",
        report.kept, report.head_kept, report.tail_kept
    );
    match report.cost {
        Some(cost) => println!("cost        : {cost}"),
        None => println!("cost        : n/a (row ceiling not reached)"),
    }
    if report.over_budget {
        println!("warning     : sample still exceeds the cost budget");
    }
    println!();
}

fn parse_positive_usize(raw: &str) -> Result<usize, String> {
    let parsed = raw
        .parse::<usize>()
        .map_err(|_| format!("Could not parse '{}' as a positive integer", raw))?;
    if parsed == 0 {
        return Err("value must be greater than zero".to_string());
    }
    Ok(parsed)
}

fn parse_positive_f64(raw: &str) -> Result<f64, String> {
    let parsed = raw
        .parse::<f64>()
        .map_err(|_| format!("Could not parse '{}' as a number", raw))?;
    if !parsed.is_finite() || parsed <= 0.0 {
        return Err("value must be a positive finite number".to_string());
    }
    Ok(parsed)
}

fn parse_cli<T, I>(args: I) -> Result<Option<T>, Box<dyn Error>>
where
    T: Parser,
    I: IntoIterator,
    I::Item: Into<std::ffi::OsString> + Clone,
{
    match T::try_parse_from(args) {
        Ok(cli) => Ok(Some(cli)),
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                err.print()?;
                Ok(None)
            }
            _ => Err(err.into()),
        },
    }
}
