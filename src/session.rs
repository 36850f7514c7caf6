use std::collections::BTreeSet;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::analyzer::{self, Analysis};
use crate::calendar::CampaignCalendar;
use crate::config::{AnalyzerConfig, CohortSource};
use crate::error::AnalyzerResult;
use crate::loader;
use crate::models::{Dataset, Selection};

/// A loaded dataset plus the calendar it is analyzed against. Every
/// analysis is recomputed from these records.
#[derive(Debug)]
pub struct Session {
    pub id: Uuid,
    pub source: PathBuf,
    pub opened_at: DateTime<Utc>,
    config: AnalyzerConfig,
    calendar: CampaignCalendar,
    dataset: Dataset,
}

impl Session {
    pub fn open(path: &Path, config: AnalyzerConfig) -> AnalyzerResult<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(path, file, config)
    }

    pub fn from_reader<R: Read>(
        source: impl Into<PathBuf>,
        input: R,
        config: AnalyzerConfig,
    ) -> AnalyzerResult<Self> {
        let dataset = loader::load_from_reader(input, config.denominator)?;
        let session = Session {
            id: Uuid::new_v4(),
            source: source.into(),
            opened_at: Utc::now(),
            config,
            calendar: CampaignCalendar::embedded()?,
            dataset,
        };
        log::info!(
            "session {} opened with {} records from {}",
            session.id,
            session.record_count(),
            session.source.display()
        );
        Ok(session)
    }

    pub fn record_count(&self) -> usize {
        self.dataset.records.len()
    }

    /// Sorted cohort choices, from the file or the calendar depending on
    /// configuration.
    pub fn cohorts(&self) -> Vec<String> {
        match self.config.cohort_source {
            CohortSource::Data => distinct(self.dataset.records.iter().map(|r| r.cohort.as_str())),
            CohortSource::Calendar => distinct(self.calendar.cohorts()),
        }
    }

    pub fn recencies(&self) -> Vec<String> {
        distinct(self.dataset.records.iter().map(|r| r.recency.as_str()))
    }

    /// Cohorts present in the file with no campaign calendar entry.
    pub fn uncalendared_cohorts(&self) -> Vec<String> {
        distinct(self.dataset.records.iter().map(|r| r.cohort.as_str()))
            .into_iter()
            .filter(|cohort| !self.calendar.contains(cohort))
            .collect()
    }

    pub fn analyze(&self, selection: &Selection) -> AnalyzerResult<Analysis> {
        analyzer::analyze(
            &self.dataset.records,
            self.dataset.denominator,
            &self.calendar,
            selection,
        )
    }

    /// Runs `work` against the session and closes it whether or not the
    /// work succeeded.
    pub fn run<T, E>(self, work: impl FnOnce(&Session) -> Result<T, E>) -> Result<T, E> {
        let result = work(&self);
        self.close();
        result
    }

    pub fn close(self) {
        let elapsed = Utc::now() - self.opened_at;
        log::info!(
            "session {} closed after {} ms",
            self.id,
            elapsed.num_milliseconds()
        );
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    values
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}
