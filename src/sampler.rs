//! Bounded head/tail sampling of ordered records under a count and cost budget.
//!
//! The sampler keeps the first and last `max_count / 2` records of an
//! oversized input, then drops records one at a time (tail side first) until
//! the configured [`CostEstimator`] reports a cost within budget or only two
//! records remain. Trimming is deterministic: identical inputs always yield
//! identical samples.

use tracing::{debug, info, warn};

use crate::config::SampleBudget;
use crate::constants::sampler::{LOG_PREFIX, MIN_TRIMMED_LEN};
use crate::cost::{CostEstimator, SerializedLength};
use crate::errors::InsightError;

/// Diagnostics describing how a sample was derived from its input.
#[derive(Clone, Debug, PartialEq)]
pub struct SampleReport {
    /// Number of input records.
    pub source_len: usize,
    /// Number of records kept.
    pub kept: usize,
    /// Kept records taken from the front of the input.
    pub head_kept: usize,
    /// Kept records taken from the back of the input.
    pub tail_kept: usize,
    /// Final cost of the kept records; `None` when the count ceiling already
    /// held and no cost was computed.
    pub cost: Option<f64>,
    /// Set when trimming stopped at the two-record floor with cost still over budget.
    pub over_budget: bool,
}

impl SampleReport {
    /// Whether any input record was dropped.
    pub fn truncated(&self) -> bool {
        self.kept < self.source_len
    }
}

/// Sampled records plus the report describing how they were chosen.
#[derive(Clone, Debug)]
pub struct Sample<T> {
    /// Kept records in input order.
    pub records: Vec<T>,
    /// How the records were selected.
    pub report: SampleReport,
}

impl<T> Sample<T> {
    fn untouched(records: Vec<T>) -> Self {
        let len = records.len();
        Self {
            records,
            report: SampleReport {
                source_len: len,
                kept: len,
                head_kept: len,
                tail_kept: 0,
                cost: None,
                over_budget: false,
            },
        }
    }

    /// Drop the report and keep the records.
    pub fn into_records(self) -> Vec<T> {
        self.records
    }
}

/// Head/tail sampler bound to a budget and a cost estimator.
#[derive(Clone, Debug)]
pub struct BoundedSampler<C = SerializedLength> {
    budget: SampleBudget,
    estimator: C,
}

impl BoundedSampler<SerializedLength> {
    /// Sampler using the serialized-length cost estimator.
    pub fn new(budget: SampleBudget) -> Self {
        Self::with_estimator(budget, SerializedLength)
    }
}

impl Default for BoundedSampler<SerializedLength> {
    fn default() -> Self {
        Self::new(SampleBudget::default())
    }
}

impl<C> BoundedSampler<C> {
    /// Sampler using a caller-supplied cost estimator.
    pub fn with_estimator(budget: SampleBudget, estimator: C) -> Self {
        Self { budget, estimator }
    }

    /// Budget this sampler enforces.
    pub fn budget(&self) -> &SampleBudget {
        &self.budget
    }

    /// Sample owned records; the identity case returns the input without copying.
    pub fn sample<T>(&self, records: Vec<T>) -> Result<Vec<T>, InsightError>
    where
        C: CostEstimator<T>,
    {
        self.sample_with_report(records).map(Sample::into_records)
    }

    /// Sample borrowed records, cloning only the records that survive the count ceiling.
    pub fn sample_slice<T: Clone>(&self, records: &[T]) -> Result<Vec<T>, InsightError>
    where
        C: CostEstimator<T>,
    {
        self.budget.validate()?;
        if records.len() <= self.budget.max_count {
            return Ok(records.to_vec());
        }
        let half = self.budget.max_count / 2;
        let mut working = Vec::with_capacity(half * 2);
        working.extend_from_slice(&records[..half]);
        working.extend_from_slice(&records[records.len() - half..]);
        trim_to_cost(working, records.len(), half, &self.budget, &self.estimator)
            .map(Sample::into_records)
    }

    /// Sample owned records and report how the sample was derived.
    pub fn sample_with_report<T>(&self, records: Vec<T>) -> Result<Sample<T>, InsightError>
    where
        C: CostEstimator<T>,
    {
        select(records, &self.budget, &self.estimator)
    }
}

/// Reduce `records` to an order-preserving head/tail sample within `budget`.
///
/// When the input already fits the count ceiling it is returned unchanged and
/// the cost ceiling is not checked. Otherwise the cost ceiling is best-effort:
/// trimming stops at two records even if the estimator still reports an
/// over-budget cost.
pub fn sample_records<T, C>(
    records: Vec<T>,
    budget: &SampleBudget,
    estimator: &C,
) -> Result<Vec<T>, InsightError>
where
    C: CostEstimator<T> + ?Sized,
{
    select(records, budget, estimator).map(Sample::into_records)
}

fn select<T, C>(
    mut records: Vec<T>,
    budget: &SampleBudget,
    estimator: &C,
) -> Result<Sample<T>, InsightError>
where
    C: CostEstimator<T> + ?Sized,
{
    budget.validate()?;
    let source_len = records.len();
    if source_len <= budget.max_count {
        debug!(
            "{} {} rows fit the {}-row ceiling; sampling skipped",
            LOG_PREFIX, source_len, budget.max_count
        );
        return Ok(Sample::untouched(records));
    }

    let half = budget.max_count / 2;
    let tail = records.split_off(source_len - half);
    records.truncate(half);
    records.extend(tail);
    trim_to_cost(records, source_len, half, budget, estimator)
}

fn trim_to_cost<T, C>(
    mut working: Vec<T>,
    source_len: usize,
    half: usize,
    budget: &SampleBudget,
    estimator: &C,
) -> Result<Sample<T>, InsightError>
where
    C: CostEstimator<T> + ?Sized,
{
    let mut head_kept = half;
    let mut tail_kept = working.len() - half;
    let mut cost = checked_cost(estimator, &working)?;

    while cost > budget.max_cost && working.len() > MIN_TRIMMED_LEN {
        // Tail side goes first; once it is empty the boundary index clamps
        // onto the last head record.
        let remove_at = if working.len() > half {
            working.len() - 1
        } else {
            half.min(working.len() - 1)
        };
        working.remove(remove_at);
        if tail_kept > 0 {
            tail_kept -= 1;
        } else {
            head_kept -= 1;
        }
        cost = checked_cost(estimator, &working)?;
    }

    let over_budget = cost > budget.max_cost;
    if over_budget {
        warn!(
            "{} sample of {} rows still costs {} (budget {})",
            LOG_PREFIX,
            working.len(),
            cost,
            budget.max_cost
        );
    }
    info!(
        "{} summarizing {} rows of the result set",
        LOG_PREFIX,
        working.len()
    );

    Ok(Sample {
        report: SampleReport {
            source_len,
            kept: working.len(),
            head_kept,
            tail_kept,
            cost: Some(cost),
            over_budget,
        },
        records: working,
    })
}

fn checked_cost<T, C>(estimator: &C, records: &[T]) -> Result<f64, InsightError>
where
    C: CostEstimator<T> + ?Sized,
{
    let cost = estimator.estimate(records)?;
    if !cost.is_finite() {
        return Err(InsightError::NonFiniteCost(cost, records.len()));
    }
    Ok(cost)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::RecordCount;

    fn budget(max_count: usize, max_cost: f64) -> SampleBudget {
        SampleBudget::new(max_count, max_cost)
    }

    #[test]
    fn inputs_within_count_ceiling_are_returned_unchanged() {
        let records: Vec<u32> = (0..10).collect();
        // Cost is never consulted on this path, so a tiny budget is ignored.
        let sampled = sample_records(records.clone(), &budget(10, 1.0), &RecordCount).unwrap();
        assert_eq!(sampled, records);
    }

    #[test]
    fn empty_input_yields_empty_sample() {
        let sampled = sample_records(Vec::<u32>::new(), &budget(500, 10.0), &RecordCount).unwrap();
        assert!(sampled.is_empty());
    }

    #[test]
    fn oversized_input_keeps_head_and_tail_halves() {
        let records: Vec<u32> = (0..1000).collect();
        let sampled = sample_records(records, &budget(500, 500.0), &RecordCount).unwrap();
        assert_eq!(sampled.len(), 500);
        let expected: Vec<u32> = (0..250).chain(750..1000).collect();
        assert_eq!(sampled, expected);
    }

    #[test]
    fn odd_count_ceiling_rounds_half_down() {
        let records: Vec<u32> = (0..20).collect();
        let sampled = sample_records(records, &budget(7, 100.0), &RecordCount).unwrap();
        assert_eq!(sampled, vec![0, 1, 2, 17, 18, 19]);
    }

    #[test]
    fn cost_trimming_consumes_tail_side_first() {
        let records: Vec<u32> = (0..10).collect();
        let sampled = sample_records(records, &budget(8, 6.0), &RecordCount).unwrap();
        assert_eq!(sampled, vec![0, 1, 2, 3, 6, 7]);
    }

    #[test]
    fn large_blobs_shrink_to_what_fits() {
        let records: Vec<String> = (0..10).map(|i| format!("{i}{}", "x".repeat(99))).collect();
        // Each blob serializes to 102 units; four fit.
        let sampler = BoundedSampler::new(budget(8, 4.0 * 102.0));
        let sample = sampler.sample_with_report(records.clone()).unwrap();
        assert_eq!(sample.records, records[..4].to_vec());
        assert_eq!(sample.report.head_kept, 4);
        assert_eq!(sample.report.tail_kept, 0);
        assert_eq!(sample.report.cost, Some(408.0));
        assert!(!sample.report.over_budget);
    }

    #[test]
    fn trimming_stops_at_two_records() {
        let records: Vec<u32> = (0..100).collect();
        let sampler = BoundedSampler::with_estimator(budget(20, 0.5), RecordCount);
        let sample = sampler.sample_with_report(records).unwrap();
        assert_eq!(sample.records, vec![0, 1]);
        assert!(sample.report.over_budget);
        assert_eq!(sample.report.cost, Some(2.0));
        assert!(sample.report.truncated());
    }

    #[test]
    fn adversarial_estimator_terminates_at_floor() {
        let records: Vec<u32> = (0..50).collect();
        let never_fits = |_: &[u32]| 1e12;
        let sampled = sample_records(records, &budget(10, 1.0), &never_fits).unwrap();
        assert_eq!(sampled.len(), 2);
    }

    #[test]
    fn count_ceiling_of_one_drops_everything_for_larger_inputs() {
        let sampled = sample_records(vec![1, 2, 3], &budget(1, 10.0), &RecordCount).unwrap();
        assert!(sampled.is_empty());
        let single = sample_records(vec![9], &budget(1, 10.0), &RecordCount).unwrap();
        assert_eq!(single, vec![9]);
    }

    #[test]
    fn invalid_budgets_fail_fast() {
        let err = sample_records(vec![1, 2], &budget(0, 10.0), &RecordCount).unwrap_err();
        assert!(matches!(err, InsightError::InvalidArgument(_)));
        let err = sample_records(vec![1, 2], &budget(5, 0.0), &RecordCount).unwrap_err();
        assert!(matches!(err, InsightError::InvalidArgument(_)));
        let err = sample_records(Vec::<u32>::new(), &budget(5, f64::NAN), &RecordCount)
            .unwrap_err();
        assert!(matches!(err, InsightError::InvalidArgument(_)));
    }

    #[test]
    fn non_finite_costs_are_rejected() {
        let records: Vec<u32> = (0..10).collect();
        let broken = |_: &[u32]| f64::NAN;
        let err = sample_records(records, &budget(4, 10.0), &broken).unwrap_err();
        assert!(matches!(err, InsightError::NonFiniteCost(_, 4)));
    }

    #[test]
    fn slice_sampling_matches_owned_sampling() {
        let records: Vec<String> = (0..40).map(|i| format!("row-{i}")).collect();
        let sampler = BoundedSampler::new(budget(12, 60.0));
        let from_slice = sampler.sample_slice(&records).unwrap();
        let owned = sampler.sample(records.clone()).unwrap();
        assert_eq!(from_slice, owned);
        assert_eq!(records.len(), 40);
    }

    #[test]
    fn untouched_report_has_no_cost() {
        let sample = BoundedSampler::default()
            .sample_with_report(vec![1, 2, 3])
            .unwrap();
        assert_eq!(sample.report.cost, None);
        assert_eq!(sample.report.kept, 3);
        assert!(!sample.report.truncated());
    }
}
