use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum DataSet {
    #[serde(rename = "Control Set")]
    Control,
    #[serde(rename = "Test Set")]
    Test,
}

impl DataSet {
    pub const ALL: [DataSet; 2] = [DataSet::Control, DataSet::Test];

    pub fn label(&self) -> &'static str {
        match self {
            DataSet::Control => "Control Set",
            DataSet::Test => "Test Set",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        DataSet::ALL
            .into_iter()
            .find(|data_set| data_set.label() == value)
    }
}

impl fmt::Display for DataSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Where a record falls relative to the campaign window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Period {
    #[serde(rename = "Pre-Test")]
    PreTest,
    Test,
    Other,
}

impl Period {
    pub fn label(&self) -> &'static str {
        match self {
            Period::PreTest => "Pre-Test",
            Period::Test => "Test",
            Period::Other => "Other",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    AtcRate,
    TransactorRate,
    OrderRate,
    GmvPerTransactor,
}

impl Metric {
    pub const ALL: [Metric; 4] = [
        Metric::AtcRate,
        Metric::TransactorRate,
        Metric::OrderRate,
        Metric::GmvPerTransactor,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Metric::AtcRate => "atc_rate",
            Metric::TransactorRate => "transactor_rate",
            Metric::OrderRate => "order_rate",
            Metric::GmvPerTransactor => "gmv_per_transactor",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Column used as the denominator of the three conversion rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Denominator {
    AppOpens,
    AudienceSize,
}

impl Denominator {
    pub fn column(&self) -> &'static str {
        match self {
            Denominator::AppOpens => "app_opens",
            Denominator::AudienceSize => "audience_size",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObservationRecord {
    pub date: NaiveDate,
    pub cohort: String,
    pub recency: String,
    pub data_set: DataSet,
    pub denominator: Option<f64>,
    pub atc: Option<f64>,
    pub transactors: Option<f64>,
    pub orders: Option<f64>,
    pub gmv: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct Dataset {
    pub denominator: Denominator,
    pub records: Vec<ObservationRecord>,
}

/// One value per metric. `None` marks an undefined ratio.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MetricValues {
    pub atc_rate: Option<f64>,
    pub transactor_rate: Option<f64>,
    pub order_rate: Option<f64>,
    pub gmv_per_transactor: Option<f64>,
}

impl MetricValues {
    pub fn from_fn(mut value: impl FnMut(Metric) -> Option<f64>) -> Self {
        MetricValues {
            atc_rate: value(Metric::AtcRate),
            transactor_rate: value(Metric::TransactorRate),
            order_rate: value(Metric::OrderRate),
            gmv_per_transactor: value(Metric::GmvPerTransactor),
        }
    }

    pub fn get(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::AtcRate => self.atc_rate,
            Metric::TransactorRate => self.transactor_rate,
            Metric::OrderRate => self.order_rate,
            Metric::GmvPerTransactor => self.gmv_per_transactor,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodObservation {
    pub period: Period,
    pub data_set: DataSet,
    pub metrics: MetricValues,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub period: Period,
    pub data_set: DataSet,
    pub record_count: usize,
    #[serde(flatten)]
    pub means: MetricValues,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonResult {
    pub data_set: DataSet,
    pub metric: Metric,
    pub pre_test_count: usize,
    pub test_count: usize,
    pub t_statistic: f64,
    pub degrees_of_freedom: f64,
    pub p_value: f64,
    pub significant: bool,
}

/// A filter value where `All` disables filtering on that dimension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    All,
    Only(String),
}

impl Filter {
    pub fn matches(&self, value: &str) -> bool {
        match self {
            Filter::All => true,
            Filter::Only(expected) => expected == value,
        }
    }
}

impl From<&str> for Filter {
    fn from(value: &str) -> Self {
        let value = value.trim();
        if value.eq_ignore_ascii_case("all") {
            Filter::All
        } else {
            Filter::Only(value.to_string())
        }
    }
}

impl Serialize for Filter {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::All => f.write_str("All"),
            Filter::Only(value) => f.write_str(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub cohort: Filter,
    pub recency: Filter,
}

impl Selection {
    pub fn matches(&self, record: &ObservationRecord) -> bool {
        self.cohort.matches(&record.cohort) && self.recency.matches(&record.recency)
    }
}
