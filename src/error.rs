use thiserror::Error;

/// The input file does not match the expected observation schema.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("line {line}: cannot parse date '{value}'")]
    InvalidDate { line: usize, value: String },

    #[error("line {line}: unknown data_set '{value}' (expected 'Control Set' or 'Test Set')")]
    UnknownDataSet { line: usize, value: String },

    #[error("line {line}: column '{column}' is not a number ('{value}')")]
    InvalidNumber {
        line: usize,
        column: &'static str,
        value: String,
    },

    #[error("line {line}: column '{column}' is negative ({value})")]
    NegativeCounter {
        line: usize,
        column: &'static str,
        value: f64,
    },
}

/// The campaign calendar cannot serve the requested selection.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("cohort '{0}' has no entry in the campaign calendar")]
    UnknownCohort(String),

    #[error("no campaign dates available for '{0}'")]
    EmptyCalendar(String),

    #[error("cohort '{cohort}' has an invalid campaign date '{value}'")]
    InvalidCalendarDate { cohort: String, value: String },
}

#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Statistics error: {0}")]
    Statistics(#[from] statrs::StatsError),
}

pub type AnalyzerResult<T> = Result<T, AnalyzerError>;
