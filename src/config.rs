use clap::ValueEnum;
use csv::StringRecord;

use crate::models::Denominator;

/// How the rate denominator column is chosen for an input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum DenominatorChoice {
    /// Use `app_opens` when the file has it, otherwise `audience_size`
    #[default]
    Auto,
    AppOpens,
    AudienceSize,
}

impl DenominatorChoice {
    pub fn resolve(&self, headers: &StringRecord) -> Denominator {
        match self {
            DenominatorChoice::AppOpens => Denominator::AppOpens,
            DenominatorChoice::AudienceSize => Denominator::AudienceSize,
            DenominatorChoice::Auto => {
                let has_app_opens = headers
                    .iter()
                    .any(|header| header.trim() == Denominator::AppOpens.column());
                if has_app_opens {
                    Denominator::AppOpens
                } else {
                    Denominator::AudienceSize
                }
            }
        }
    }
}

/// Where the list of selectable cohorts comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum CohortSource {
    /// Distinct cohorts present in the loaded file
    #[default]
    Data,
    /// Cohorts defined in the campaign calendar
    Calendar,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AnalyzerConfig {
    pub denominator: DenominatorChoice,
    pub cohort_source: CohortSource,
}
