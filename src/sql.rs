//! Generation SQL for warehouse-hosted remote models.

use crate::config::{GenerationConfig, SubselectMode};
use crate::constants::generation::{GENERATED_CONTENT_COLUMN, REMOTE_UDF};
use crate::types::SqlText;
use crate::utils::escape_all;

/// Subselect that feeds the escaped prompt to the model.
pub fn prompt_subselect(prompt: &str, mode: SubselectMode) -> SqlText {
    let escaped = escape_all(prompt);
    match mode {
        SubselectMode::Native => format!("SELECT '{escaped}' AS prompt"),
        SubselectMode::RemoteUdf => {
            format!("SELECT {REMOTE_UDF}('{escaped}') AS r, '' AS status")
        }
    }
}

/// `ML.GENERATE_TEXT` query returning the model answer in `generated_content`.
pub fn generate_text_sql(model_id: &str, prompt: &str, generation: &GenerationConfig) -> SqlText {
    generate_text_sql_with(model_id, prompt, generation, SubselectMode::Native)
}

/// Like [`generate_text_sql`] with an explicit subselect flavour.
pub fn generate_text_sql_with(
    model_id: &str,
    prompt: &str,
    generation: &GenerationConfig,
    mode: SubselectMode,
) -> SqlText {
    let subselect = prompt_subselect(prompt, mode);
    let flatten = if generation.flatten_json_output {
        "TRUE"
    } else {
        "FALSE"
    };
    format!(
        "SELECT ml_generate_text_llm_result AS {GENERATED_CONTENT_COLUMN}
FROM ML.GENERATE_TEXT(
  MODEL `{model_id}`,
  ({subselect}),
  STRUCT(
    {temperature} AS temperature,
    {max_output_tokens} AS max_output_tokens,
    {top_p} AS top_p,
    {flatten} AS flatten_json_output,
    {top_k} AS top_k
  )
)",
        temperature = generation.temperature,
        max_output_tokens = generation.max_output_tokens,
        top_p = generation.top_p,
        top_k = generation.top_k,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_subselect_quotes_escaped_prompt() {
        assert_eq!(
            prompt_subselect("it's\nfine", SubselectMode::Native),
            "SELECT 'it\\'s\\nfine' AS prompt"
        );
    }

    #[test]
    fn remote_subselect_routes_through_udf() {
        assert_eq!(
            prompt_subselect("hi", SubselectMode::RemoteUdf),
            "SELECT llm.bq_vertex_remote('hi') AS r, '' AS status"
        );
    }

    #[test]
    fn generation_sql_carries_model_and_parameters() {
        let sql = generate_text_sql("proj.llm.gemini", "sum it", &GenerationConfig::default());
        assert!(sql.starts_with("SELECT ml_generate_text_llm_result AS generated_content"));
        assert!(sql.contains("MODEL `proj.llm.gemini`"));
        assert!(sql.contains("(SELECT 'sum it' AS prompt)"));
        assert!(sql.contains("0.2 AS temperature"));
        assert!(sql.contains("1024 AS max_output_tokens"));
        assert!(sql.contains("0.98 AS top_p"));
        assert!(sql.contains("TRUE AS flatten_json_output"));
        assert!(sql.contains("1 AS top_k"));
    }

    #[test]
    fn generation_sql_respects_overrides() {
        let generation = GenerationConfig {
            flatten_json_output: false,
            ..GenerationConfig::default()
        }
        .with_temperature(0.7);
        let sql = generate_text_sql_with("m", "p", &generation, SubselectMode::RemoteUdf);
        assert!(sql.contains("0.7 AS temperature"));
        assert!(sql.contains("FALSE AS flatten_json_output"));
        assert!(sql.contains("llm.bq_vertex_remote('p')"));
    }

    /// Byte offset of the quote closing the literal that opens at `open`.
    fn closing_quote(sql: &str, open: usize) -> usize {
        let bytes = sql.as_bytes();
        let mut idx = open + 1;
        while idx < bytes.len() {
            match bytes[idx] {
                b'\\' => idx += 2,
                b'\'' => return idx,
                _ => idx += 1,
            }
        }
        panic!("unterminated literal in {sql}");
    }

    #[test]
    fn backslash_quote_in_prompt_stays_inside_the_literal() {
        let prompt = "path C:\\'; DROP TABLE x; --";
        let sql = generate_text_sql("m", prompt, &GenerationConfig::default());
        let open = sql.find("(SELECT '").unwrap() + "(SELECT ".len();
        let close = closing_quote(&sql, open);
        assert!(sql[close..].starts_with("' AS prompt)"));
        assert_eq!(&sql[open + 1..close], "path C:\\\\\\'; DROP TABLE x; --");
    }
}
