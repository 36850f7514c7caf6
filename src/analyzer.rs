use serde::Serialize;

use crate::calendar::{CampaignCalendar, CampaignWindow};
use crate::error::AnalyzerResult;
use crate::metrics;
use crate::models::{
    ComparisonResult, DataSet, Denominator, Metric, ObservationRecord, Period, PeriodObservation,
    Selection, SummaryRow,
};
use crate::stats;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    pub selection: Selection,
    pub denominator: Denominator,
    pub window: CampaignWindow,
    pub pre_test_records: usize,
    pub test_records: usize,
    pub summary: Vec<SummaryRow>,
    pub comparisons: Vec<ComparisonResult>,
}

impl Analysis {
    pub fn is_empty(&self) -> bool {
        self.pre_test_records == 0 && self.test_records == 0
    }
}

/// Filters records by the selection, labels them against the campaign
/// window and compares the pre-test and test periods.
pub fn analyze(
    records: &[ObservationRecord],
    denominator: Denominator,
    calendar: &CampaignCalendar,
    selection: &Selection,
) -> AnalyzerResult<Analysis> {
    let window = calendar.window(&selection.cohort)?;
    log::debug!(
        "cohort {}: test {}..{} ({} days), pre-test {}..{}",
        selection.cohort,
        window.test_start,
        window.test_end,
        window.test_length,
        window.pre_test_start,
        window.pre_test_end
    );

    let observations = label(records, &window, selection);
    let pre_test_records = count(&observations, Period::PreTest);
    let test_records = count(&observations, Period::Test);
    log::debug!(
        "{} of {} records fall in a period ({} pre-test, {} test)",
        observations.len(),
        records.len(),
        pre_test_records,
        test_records
    );

    let summary = metrics::summarize(&observations);
    let comparisons = compare_periods(&observations)?;

    Ok(Analysis {
        selection: selection.clone(),
        denominator,
        window,
        pre_test_records,
        test_records,
        summary,
        comparisons,
    })
}

/// Records outside both periods are dropped.
pub fn label(
    records: &[ObservationRecord],
    window: &CampaignWindow,
    selection: &Selection,
) -> Vec<PeriodObservation> {
    records
        .iter()
        .filter(|record| selection.matches(record))
        .filter_map(|record| {
            let period = window.label(record.date);
            (period != Period::Other).then(|| PeriodObservation {
                period,
                data_set: record.data_set,
                metrics: metrics::compute(record),
            })
        })
        .collect()
}

pub fn compare_periods(
    observations: &[PeriodObservation],
) -> AnalyzerResult<Vec<ComparisonResult>> {
    let mut results = Vec::new();

    for metric in Metric::ALL {
        for data_set in DataSet::ALL {
            let pre_test = metrics::sample(observations, data_set, Period::PreTest, metric);
            let test = metrics::sample(observations, data_set, Period::Test, metric);

            let Some(welch) = stats::welch_t_test(&test, &pre_test)? else {
                log::debug!(
                    "skipping {metric} for {data_set}: {} pre-test and {} test observations",
                    pre_test.len(),
                    test.len()
                );
                continue;
            };

            results.push(ComparisonResult {
                data_set,
                metric,
                pre_test_count: pre_test.len(),
                test_count: test.len(),
                t_statistic: welch.t_statistic,
                degrees_of_freedom: welch.degrees_of_freedom,
                p_value: welch.p_value,
                significant: welch.is_significant(),
            });
        }
    }

    Ok(results)
}

fn count(observations: &[PeriodObservation], period: Period) -> usize {
    observations
        .iter()
        .filter(|observation| observation.period == period)
        .count()
}
