//! Cost estimators used to keep samples under a size budget.

use std::io;

use serde::Serialize;

use crate::constants::sampler::CHARS_PER_TOKEN;
use crate::errors::InsightError;

/// Computes the aggregate cost of a candidate sample.
///
/// Implementations should be monotonic in the number of records: dropping a
/// record never increases the cost. The sampler still terminates for
/// estimators that break this, but may return an over-budget sample.
pub trait CostEstimator<T> {
    /// Aggregate cost of `records`.
    fn estimate(&self, records: &[T]) -> Result<f64, InsightError>;
}

impl<T, F> CostEstimator<T> for F
where
    F: Fn(&[T]) -> f64,
{
    fn estimate(&self, records: &[T]) -> Result<f64, InsightError> {
        Ok(self(records))
    }
}

/// Sum of each record's compact JSON length in UTF-16 code units.
///
/// Matches `JSON.stringify(record).length` on the dashboard side, so a budget
/// trims the same rows here as it does client-side.
#[derive(Clone, Copy, Debug, Default)]
pub struct SerializedLength;

impl<T: Serialize> CostEstimator<T> for SerializedLength {
    fn estimate(&self, records: &[T]) -> Result<f64, InsightError> {
        let mut total = 0usize;
        for record in records {
            total += serialized_len(record)?;
        }
        Ok(total as f64)
    }
}

/// Rough token count: serialized characters / 4, rounded up, at least 1 per record.
#[derive(Clone, Copy, Debug, Default)]
pub struct ApproxTokens;

impl<T: Serialize> CostEstimator<T> for ApproxTokens {
    fn estimate(&self, records: &[T]) -> Result<f64, InsightError> {
        let mut total = 0.0;
        for record in records {
            let chars = serde_json::to_string(record)?.chars().count();
            total += (chars as f64 / CHARS_PER_TOKEN).ceil().max(1.0);
        }
        Ok(total)
    }
}

/// Cost equal to the number of records.
#[derive(Clone, Copy, Debug, Default)]
pub struct RecordCount;

impl<T> CostEstimator<T> for RecordCount {
    fn estimate(&self, records: &[T]) -> Result<f64, InsightError> {
        Ok(records.len() as f64)
    }
}

/// Default cost of `records` (see [`SerializedLength`]).
pub fn estimate_cost<T: Serialize>(records: &[T]) -> Result<f64, InsightError> {
    SerializedLength.estimate(records)
}

fn serialized_len<T: Serialize>(record: &T) -> Result<usize, InsightError> {
    let mut counter = Utf16Counter(0);
    serde_json::to_writer(&mut counter, record)?;
    Ok(counter.0)
}

/// Counts UTF-16 code units of the UTF-8 text written through it.
struct Utf16Counter(usize);

impl io::Write for Utf16Counter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        // Every char contributes one non-continuation byte; four-byte
        // sequences encode astral chars, which take a surrogate pair.
        self.0 += buf
            .iter()
            .map(|&byte| match byte {
                0x80..=0xBF => 0,
                0xF0..=0xFF => 2,
                _ => 1,
            })
            .sum::<usize>();
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serialized_length_sums_compact_json() {
        let rows = vec![json!("abc"), json!(12), json!({"a": 1})];
        // "\"abc\"" = 5, "12" = 2, {"a":1} = 7
        assert_eq!(estimate_cost(&rows).unwrap(), 14.0);
        assert_eq!(estimate_cost::<serde_json::Value>(&[]).unwrap(), 0.0);
    }

    #[test]
    fn serialized_length_counts_utf16_units() {
        let rows = vec!["é".to_string()];
        assert_eq!(SerializedLength.estimate(&rows[..]).unwrap(), 3.0);
        // CJK stays one unit per char, emoji take a surrogate pair.
        let rows = vec!["日本".to_string(), "😀".to_string()];
        assert_eq!(SerializedLength.estimate(&rows[..]).unwrap(), 8.0);
    }

    #[test]
    fn accented_rows_trim_like_the_dashboard() {
        use crate::config::SampleBudget;
        use crate::sampler::sample_records;

        // Each "éééé" serializes to 6 units, so three rows fit 18.
        let rows = vec!["éééé".to_string(); 10];
        let kept = sample_records(rows, &SampleBudget::new(4, 18.0), &SerializedLength).unwrap();
        assert_eq!(kept.len(), 3);
        assert_eq!(estimate_cost(&kept).unwrap(), 18.0);
    }

    #[test]
    fn approx_tokens_rounds_up_per_record() {
        let rows = vec!["".to_string(), "abcdefg".to_string()];
        // "\"\"" -> 2 chars -> 1, "\"abcdefg\"" -> 9 chars -> 3
        assert_eq!(ApproxTokens.estimate(&rows[..]).unwrap(), 4.0);
    }

    #[test]
    fn closures_and_record_count_are_estimators() {
        let rows = vec![1, 2, 3];
        let sum = |records: &[i32]| records.iter().map(|v| *v as f64).sum::<f64>();
        assert_eq!(sum.estimate(&rows[..]).unwrap(), 6.0);
        assert_eq!(RecordCount.estimate(&rows[..]).unwrap(), 3.0);
    }
}
