use std::collections::{BTreeMap, BTreeSet};

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::error::{AnalyzerResult, ConfigurationError};
use crate::models::{Filter, Period};

const CAMPAIGN_DATES: &[(&str, &[&str])] = &[
    (
        "derma",
        &[
            "2025-03-18", "2025-03-21", "2025-03-22", "2025-03-23", "2025-03-25", "2025-03-28",
            "2025-04-01", "2025-04-02", "2025-04-05", "2025-04-07", "2025-04-08", "2025-04-10",
            "2025-04-11",
        ],
    ),
    (
        "diabetic",
        &[
            "2025-03-06", "2025-03-07", "2025-03-11", "2025-03-13", "2025-03-15", "2025-03-19",
            "2025-03-23", "2025-03-25", "2025-03-29", "2025-04-01", "2025-04-03",
        ],
    ),
    (
        "cardiac",
        &[
            "2025-03-18", "2025-03-21", "2025-03-22", "2025-03-23", "2025-03-25", "2025-04-01",
            "2025-04-02", "2025-04-05", "2025-04-07", "2025-04-10", "2025-04-12", "2025-04-15",
            "2025-04-17",
        ],
    ),
    (
        "resp",
        &[
            "2025-03-05", "2025-03-08", "2025-03-12", "2025-03-15", "2025-03-17", "2025-03-19",
            "2025-03-23", "2025-03-27", "2025-03-30", "2025-04-02", "2025-04-04",
        ],
    ),
];

/// Test window spanning the campaign days, plus an equal-length pre-test
/// window that ends the day before the test starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CampaignWindow {
    pub test_start: NaiveDate,
    pub test_end: NaiveDate,
    pub test_length: i64,
    pub pre_test_start: NaiveDate,
    pub pre_test_end: NaiveDate,
}

impl CampaignWindow {
    /// Only the earliest and latest dates matter; gaps between campaign days
    /// are part of the test window.
    pub fn from_dates<I>(dates: I) -> Option<Self>
    where
        I: IntoIterator<Item = NaiveDate>,
    {
        let mut dates = dates.into_iter();
        let first = dates.next()?;
        let (test_start, test_end) = dates.fold((first, first), |(start, end), date| {
            (start.min(date), end.max(date))
        });

        let test_length = (test_end - test_start).num_days() + 1;
        let pre_test_end = test_start - Duration::days(1);
        let pre_test_start = pre_test_end - Duration::days(test_length - 1);

        let window = CampaignWindow {
            test_start,
            test_end,
            test_length,
            pre_test_start,
            pre_test_end,
        };
        debug_assert_eq!(window.pre_test_length(), window.test_length);
        Some(window)
    }

    pub fn label(&self, date: NaiveDate) -> Period {
        if date >= self.test_start && date <= self.test_end {
            Period::Test
        } else if date >= self.pre_test_start && date <= self.pre_test_end {
            Period::PreTest
        } else {
            Period::Other
        }
    }

    pub fn pre_test_length(&self) -> i64 {
        (self.pre_test_end - self.pre_test_start).num_days() + 1
    }
}

#[derive(Debug, Clone)]
pub struct CampaignCalendar {
    cohorts: BTreeMap<String, BTreeSet<NaiveDate>>,
}

impl CampaignCalendar {
    /// The calendar compiled into the binary.
    pub fn embedded() -> AnalyzerResult<Self> {
        Self::from_iso(CAMPAIGN_DATES)
    }

    pub fn from_iso(entries: &[(&str, &[&str])]) -> AnalyzerResult<Self> {
        let mut cohorts = BTreeMap::new();

        for (cohort, dates) in entries {
            let mut parsed = BTreeSet::new();
            for value in dates.iter() {
                let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
                    ConfigurationError::InvalidCalendarDate {
                        cohort: cohort.to_string(),
                        value: value.to_string(),
                    }
                })?;
                parsed.insert(date);
            }
            cohorts.insert(cohort.to_string(), parsed);
        }

        Ok(CampaignCalendar { cohorts })
    }

    pub fn cohorts(&self) -> impl Iterator<Item = &str> {
        self.cohorts.keys().map(String::as_str)
    }

    pub fn contains(&self, cohort: &str) -> bool {
        self.cohorts.contains_key(cohort)
    }

    pub fn dates(&self, cohort: &Filter) -> AnalyzerResult<Vec<NaiveDate>> {
        let dates = match cohort {
            Filter::All => self
                .cohorts
                .values()
                .flatten()
                .copied()
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect(),
            Filter::Only(name) => self
                .cohorts
                .get(name)
                .ok_or_else(|| ConfigurationError::UnknownCohort(name.clone()))?
                .iter()
                .copied()
                .collect(),
        };
        Ok(dates)
    }

    pub fn window(&self, cohort: &Filter) -> AnalyzerResult<CampaignWindow> {
        let dates = self.dates(cohort)?;
        let window = CampaignWindow::from_dates(dates)
            .ok_or_else(|| ConfigurationError::EmptyCalendar(cohort.to_string()))?;
        Ok(window)
    }
}
