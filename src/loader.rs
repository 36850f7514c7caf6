use std::io::Read;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;

use crate::config::DenominatorChoice;
use crate::error::{AnalyzerResult, SchemaError};
use crate::models::{DataSet, Dataset, Denominator, ObservationRecord};

pub const REQUIRED_COLUMNS: [&str; 8] = [
    "date",
    "cohort",
    "Recency",
    "data_set",
    "atc",
    "transactors",
    "orders",
    "gmv",
];

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

#[derive(Debug, Deserialize)]
struct CsvRow {
    date: String,
    cohort: String,
    #[serde(rename = "Recency")]
    recency: String,
    data_set: String,
    #[serde(default)]
    app_opens: Option<String>,
    #[serde(default)]
    audience_size: Option<String>,
    atc: Option<String>,
    transactors: Option<String>,
    orders: Option<String>,
    gmv: Option<String>,
}

pub fn load_from_reader<R: Read>(input: R, choice: DenominatorChoice) -> AnalyzerResult<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers = reader.headers()?.clone();
    let denominator = choice.resolve(&headers);

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .chain(std::iter::once(denominator.column()))
        .filter(|column| !headers.iter().any(|header| header == *column))
        .map(str::to_string)
        .collect();
    if !missing.is_empty() {
        return Err(SchemaError::MissingColumns(missing).into());
    }

    let mut records = Vec::new();
    for (index, result) in reader.deserialize::<CsvRow>().enumerate() {
        // Line 1 is the header.
        let line = index + 2;
        let row = result?;
        records.push(to_record(row, line, denominator)?);
    }

    log::debug!(
        "loaded {} records using '{}' as denominator",
        records.len(),
        denominator.column()
    );

    Ok(Dataset {
        denominator,
        records,
    })
}

fn to_record(
    row: CsvRow,
    line: usize,
    denominator: Denominator,
) -> Result<ObservationRecord, SchemaError> {
    let date = parse_date(&row.date).ok_or_else(|| SchemaError::InvalidDate {
        line,
        value: row.date.clone(),
    })?;
    let data_set = DataSet::parse(&row.data_set).ok_or_else(|| SchemaError::UnknownDataSet {
        line,
        value: row.data_set.clone(),
    })?;
    // The unused denominator column is never parsed.
    let denominator_value = match denominator {
        Denominator::AppOpens => row.app_opens,
        Denominator::AudienceSize => row.audience_size,
    };

    Ok(ObservationRecord {
        date,
        cohort: row.cohort,
        recency: row.recency,
        data_set,
        denominator: counter(line, denominator.column(), denominator_value)?,
        atc: counter(line, "atc", row.atc)?,
        transactors: counter(line, "transactors", row.transactors)?,
        orders: counter(line, "orders", row.orders)?,
        gmv: counter(line, "gmv", row.gmv)?,
    })
}

/// Empty and `NaN` are missing; text and negative values are rejected.
fn counter(
    line: usize,
    column: &'static str,
    raw: Option<String>,
) -> Result<Option<f64>, SchemaError> {
    let value = match raw.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(text) => Some(text.parse::<f64>().map_err(|_| SchemaError::InvalidNumber {
            line,
            column,
            value: text.to_string(),
        })?),
    };
    match value {
        Some(value) if value.is_nan() => Ok(None),
        Some(value) if value < 0.0 => Err(SchemaError::NegativeCounter {
            line,
            column,
            value,
        }),
        other => Ok(other),
    }
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
                .map(|datetime| datetime.date())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalyzerError;

    const HEADER: &str = "date,cohort,Recency,data_set,app_opens,atc,transactors,orders,gmv";

    fn load(body: &str) -> AnalyzerResult<Dataset> {
        load_from_reader(body.as_bytes(), DenominatorChoice::Auto)
    }

    #[test]
    fn loads_typed_records() {
        let csv = format!(
            "{HEADER}\n2025-03-05,resp,M1,Test Set,100,10,4,5,2500.5\n\
             2025-03-06, resp ,M1,Control Set,80,8,2,2,900\n"
        );
        let dataset = load(&csv).unwrap();

        assert_eq!(dataset.denominator, Denominator::AppOpens);
        assert_eq!(dataset.records.len(), 2);
        let first = &dataset.records[0];
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2025, 3, 5).unwrap());
        assert_eq!(first.data_set, DataSet::Test);
        assert_eq!(first.denominator, Some(100.0));
        assert_eq!(first.gmv, Some(2500.5));
        assert_eq!(dataset.records[1].cohort, "resp");
    }

    #[test]
    fn audience_size_variant_is_detected() {
        let csv = "date,cohort,Recency,data_set,audience_size,atc,transactors,orders,gmv\n\
                   2025-03-05,derma,M2,Control Set,500,20,5,6,1200\n";
        let dataset = load(csv).unwrap();

        assert_eq!(dataset.denominator, Denominator::AudienceSize);
        assert_eq!(dataset.records[0].denominator, Some(500.0));
    }

    #[test]
    fn reports_every_missing_column() {
        let csv = "date,cohort,data_set,app_opens,atc,orders\n";
        let err = load(csv).unwrap_err();

        match err {
            AnalyzerError::Schema(SchemaError::MissingColumns(columns)) => {
                assert_eq!(columns, vec!["Recency", "transactors", "gmv"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn explicit_denominator_must_exist() {
        let csv = format!("{HEADER}\n");
        let err = load_from_reader(csv.as_bytes(), DenominatorChoice::AudienceSize).unwrap_err();

        match err {
            AnalyzerError::Schema(SchemaError::MissingColumns(columns)) => {
                assert_eq!(columns, vec!["audience_size"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unparsable_date_names_the_line() {
        let csv = format!(
            "{HEADER}\n2025-03-05,resp,M1,Test Set,100,10,4,5,25\n\
             yesterday,resp,M1,Test Set,100,10,4,5,25\n"
        );
        let err = load(&csv).unwrap_err();

        assert!(matches!(
            err,
            AnalyzerError::Schema(SchemaError::InvalidDate { line: 3, ref value }) if value == "yesterday"
        ));
    }

    #[test]
    fn unknown_data_set_is_rejected() {
        let csv = format!("{HEADER}\n2025-03-05,resp,M1,Holdout,100,10,4,5,25\n");
        let err = load(&csv).unwrap_err();
        assert!(matches!(
            err,
            AnalyzerError::Schema(SchemaError::UnknownDataSet { line: 2, .. })
        ));
    }

    #[test]
    fn negative_counters_are_rejected() {
        let csv = format!("{HEADER}\n2025-03-05,resp,M1,Test Set,100,-1,4,5,25\n");
        let err = load(&csv).unwrap_err();
        assert!(matches!(
            err,
            AnalyzerError::Schema(SchemaError::NegativeCounter { column: "atc", .. })
        ));
    }

    #[test]
    fn text_in_counter_is_a_schema_error() {
        let csv = format!("{HEADER}\n2025-03-05,resp,M1,Test Set,100,ten,4,5,25\n");
        let err = load(&csv).unwrap_err();
        assert!(matches!(
            err,
            AnalyzerError::Schema(SchemaError::InvalidNumber { line: 2, column: "atc", ref value })
                if value == "ten"
        ));
    }

    #[test]
    fn unused_denominator_column_is_not_parsed() {
        let csv = "date,cohort,Recency,data_set,app_opens,audience_size,atc,transactors,orders,gmv\n\
                   2025-03-05,resp,M1,Test Set,100,N/A,10,4,5,25\n";
        let dataset = load_from_reader(csv.as_bytes(), DenominatorChoice::AppOpens).unwrap();
        assert_eq!(dataset.records[0].denominator, Some(100.0));

        let err = load_from_reader(csv.as_bytes(), DenominatorChoice::AudienceSize).unwrap_err();
        assert!(matches!(
            err,
            AnalyzerError::Schema(SchemaError::InvalidNumber { column: "audience_size", .. })
        ));
    }

    #[test]
    fn empty_counters_load_as_missing() {
        let csv = format!("{HEADER}\n2025-03-05,resp,M1,Test Set,,10,,5,25\n");
        let dataset = load(&csv).unwrap();

        let record = &dataset.records[0];
        assert_eq!(record.denominator, None);
        assert_eq!(record.transactors, None);
        assert_eq!(record.orders, Some(5.0));
    }

    #[test]
    fn accepts_common_date_layouts() {
        let expected = NaiveDate::from_ymd_opt(2025, 4, 2);
        assert_eq!(parse_date("2025-04-02"), expected);
        assert_eq!(parse_date("2025/04/02"), expected);
        assert_eq!(parse_date("2025-04-02 00:00:00"), expected);
        assert_eq!(parse_date("2025-04-02T13:45:00"), expected);
        assert_eq!(parse_date("04/02/2025"), None);
    }
}
