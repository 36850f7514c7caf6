use std::collections::BTreeMap;

use crate::models::{
    DataSet, Metric, MetricValues, ObservationRecord, Period, PeriodObservation, SummaryRow,
};

/// `None` when either side is missing or the result is not finite.
pub fn ratio(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    match (numerator, denominator) {
        (Some(numerator), Some(denominator)) if denominator != 0.0 => {
            let value = numerator / denominator;
            value.is_finite().then_some(value)
        }
        _ => None,
    }
}

pub fn compute(record: &ObservationRecord) -> MetricValues {
    MetricValues {
        atc_rate: ratio(record.atc, record.denominator),
        transactor_rate: ratio(record.transactors, record.denominator),
        order_rate: ratio(record.orders, record.denominator),
        gmv_per_transactor: ratio(record.gmv, record.transactors),
    }
}

pub fn mean<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

pub fn summarize(observations: &[PeriodObservation]) -> Vec<SummaryRow> {
    let mut groups: BTreeMap<(Period, DataSet), Vec<&MetricValues>> = BTreeMap::new();

    for observation in observations {
        groups
            .entry((observation.period, observation.data_set))
            .or_default()
            .push(&observation.metrics);
    }

    groups
        .into_iter()
        .filter_map(|((period, data_set), values)| {
            let means = MetricValues::from_fn(|metric| {
                let value = mean(values.iter().filter_map(|v| v.get(metric)));
                if value.is_none() {
                    log::warn!("{metric} is undefined for every {data_set} record in {period}");
                }
                value
            });
            // A group with no defined value for any metric is empty.
            if means == MetricValues::default() {
                return None;
            }
            Some(SummaryRow {
                period,
                data_set,
                record_count: values.len(),
                means,
            })
        })
        .collect()
}

/// Defined values of one metric for a (data set, period) pair, in input order.
pub fn sample(
    observations: &[PeriodObservation],
    data_set: DataSet,
    period: Period,
    metric: Metric,
) -> Vec<f64> {
    observations
        .iter()
        .filter(|observation| observation.data_set == data_set && observation.period == period)
        .filter_map(|observation| observation.metrics.get(metric))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(
        denominator: f64,
        atc: f64,
        transactors: f64,
        orders: f64,
        gmv: f64,
    ) -> ObservationRecord {
        ObservationRecord {
            date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            cohort: "resp".to_string(),
            recency: "M1".to_string(),
            data_set: DataSet::Control,
            denominator: Some(denominator),
            atc: Some(atc),
            transactors: Some(transactors),
            orders: Some(orders),
            gmv: Some(gmv),
        }
    }

    fn observation(
        period: Period,
        data_set: DataSet,
        record: &ObservationRecord,
    ) -> PeriodObservation {
        PeriodObservation {
            period,
            data_set,
            metrics: compute(record),
        }
    }

    #[test]
    fn computes_all_four_ratios() {
        let metrics = compute(&record(200.0, 50.0, 10.0, 20.0, 1500.0));
        assert_eq!(metrics.atc_rate, Some(0.25));
        assert_eq!(metrics.transactor_rate, Some(0.05));
        assert_eq!(metrics.order_rate, Some(0.1));
        assert_eq!(metrics.gmv_per_transactor, Some(150.0));
    }

    #[test]
    fn zero_denominator_is_undefined_not_zero() {
        let metrics = compute(&record(0.0, 5.0, 0.0, 0.0, 0.0));
        assert_eq!(metrics.atc_rate, None);
        assert_eq!(metrics.transactor_rate, None);
        assert_eq!(metrics.order_rate, None);
        assert_eq!(metrics.gmv_per_transactor, None);
    }

    #[test]
    fn missing_counter_is_undefined() {
        let mut partial = record(100.0, 5.0, 2.0, 3.0, 80.0);
        partial.orders = None;
        let metrics = compute(&partial);
        assert_eq!(metrics.order_rate, None);
        assert_eq!(metrics.atc_rate, Some(0.05));
    }

    #[test]
    fn undefined_rates_are_excluded_from_means() {
        let valid_a = record(100.0, 10.0, 2.0, 2.0, 100.0);
        let valid_b = record(100.0, 30.0, 2.0, 2.0, 100.0);
        let zero_opens = record(0.0, 5.0, 2.0, 2.0, 100.0);
        let observations = vec![
            observation(Period::Test, DataSet::Control, &valid_a),
            observation(Period::Test, DataSet::Control, &zero_opens),
            observation(Period::Test, DataSet::Control, &valid_b),
        ];

        let summary = summarize(&observations);
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].record_count, 3);
        let atc_rate = summary[0].means.atc_rate.unwrap();
        assert!((atc_rate - 0.2).abs() < 1e-12);
        assert_eq!(summary[0].means.gmv_per_transactor, Some(50.0));
    }

    #[test]
    fn summary_has_only_present_groups_in_order() {
        let base = record(100.0, 10.0, 2.0, 2.0, 100.0);
        let observations = vec![
            observation(Period::Test, DataSet::Test, &base),
            observation(Period::PreTest, DataSet::Control, &base),
            observation(Period::Test, DataSet::Control, &base),
        ];

        let keys: Vec<(Period, DataSet)> = summarize(&observations)
            .iter()
            .map(|row| (row.period, row.data_set))
            .collect();
        assert_eq!(
            keys,
            vec![
                (Period::PreTest, DataSet::Control),
                (Period::Test, DataSet::Control),
                (Period::Test, DataSet::Test),
            ]
        );
    }

    #[test]
    fn group_with_only_undefined_values_has_no_row() {
        let base = record(100.0, 10.0, 2.0, 2.0, 100.0);
        let observations = vec![
            observation(Period::PreTest, DataSet::Test, &record(0.0, 1.0, 0.0, 1.0, 0.0)),
            observation(Period::Test, DataSet::Test, &base),
        ];

        let summary = summarize(&observations);
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].period, Period::Test);
    }

    #[test]
    fn partially_defined_group_keeps_row() {
        // Zero opens but transactors present: only gmv_per_transactor is defined.
        let observations = vec![observation(
            Period::PreTest,
            DataSet::Control,
            &record(0.0, 1.0, 4.0, 1.0, 200.0),
        )];

        let summary = summarize(&observations);
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].means.atc_rate, None);
        assert_eq!(summary[0].means.gmv_per_transactor, Some(50.0));
    }

    #[test]
    fn empty_input_yields_empty_summary() {
        assert!(summarize(&[]).is_empty());
        assert_eq!(mean(Vec::new()), None);
    }
}
