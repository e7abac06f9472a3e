use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::{Amount, Bonus, LoyaltyEvent, LoyaltyRecord, Points};

/// Errors that can occur when reading or writing loyalty csv
#[derive(Debug, Error)]
pub enum CsvError {
    #[error("{path}: failed to open: {source}")]
    Open { path: PathBuf, source: csv::Error },

    #[error("line {line}: failed to parse row: {source}")]
    Parse { line: usize, source: csv::Error },

    #[error("line {line}: unrecognized event type '{event_type}'")]
    UnrecognizedType { line: usize, event_type: String },

    #[error("line {line}: {event_type} missing amount")]
    MissingAmount { line: usize, event_type: String },

    #[error("line {line}: {event_type} amount {value} is not finite or out of range")]
    InvalidAmount {
        line: usize,
        event_type: String,
        value: f64,
    },

    #[error("line {line}: {event_type} points must be a whole number, got {value}")]
    FractionalPoints {
        line: usize,
        event_type: String,
        value: f64,
    },

    #[error("failed to write summary: {0}")]
    Write(#[from] csv::Error),
}

#[derive(Debug, Deserialize)]
struct InputRow {
    r#type: String,
    amount: Option<f64>,
}

#[derive(Debug, Serialize)]
struct SummaryRow {
    points: Points,
    tier: String,
    total_spent: String,
    points_to_next_tier: Option<Points>,
    tier_progress: Option<u8>,
    join_date: String,
}

/// Read loyalty events from a csv file
pub fn read_events(
    path: impl AsRef<Path>,
) -> Result<impl Iterator<Item = Result<LoyaltyEvent, CsvError>>, CsvError> {
    let path = path.as_ref();
    let reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)
        .map_err(|source| CsvError::Open {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(reader
        .into_deserialize::<InputRow>()
        .enumerate()
        .map(|(idx, result)| {
            let line = idx + 2; // 1-indexed, skip header
            let row = result.map_err(|source| CsvError::Parse { line, source })?;
            parse_row(line, row)
        }))
}

fn parse_row(line: usize, row: InputRow) -> Result<LoyaltyEvent, CsvError> {
    let event_type = row.r#type.to_ascii_lowercase();
    let amount = || {
        row.amount.ok_or_else(|| CsvError::MissingAmount {
            line,
            event_type: event_type.clone(),
        })
    };
    let invalid = |value| CsvError::InvalidAmount {
        line,
        event_type: event_type.clone(),
        value,
    };
    let points = || {
        let value = amount()?;
        // i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive
        if !value.is_finite() || value < i64::MIN as f64 || value >= i64::MAX as f64 {
            return Err(invalid(value));
        }
        if value.fract() != 0.0 {
            return Err(CsvError::FractionalPoints {
                line,
                event_type: event_type.clone(),
                value,
            });
        }
        Ok(value as i64)
    };

    match event_type.as_str() {
        "purchase" => {
            let value = amount()?;
            let amount = Amount::from_float(value).ok_or_else(|| invalid(value))?;
            Ok(LoyaltyEvent::Purchase { amount })
        }
        "grant" => Ok(LoyaltyEvent::Grant { points: points()? }),
        "redeem" => Ok(LoyaltyEvent::Redeem { points: points()? }),
        "referral" => Ok(LoyaltyEvent::Bonus(Bonus::Referral)),
        "birthday" => Ok(LoyaltyEvent::Bonus(Bonus::Birthday)),
        _ => Err(CsvError::UnrecognizedType {
            line,
            event_type: row.r#type.clone(),
        }),
    }
}

/// Write a one-row summary of the record in csv format
pub fn write_summary<W: io::Write>(
    writer: W,
    record: &LoyaltyRecord,
    points_to_next_tier: Option<Points>,
    tier_progress: Option<u8>,
) -> Result<(), CsvError> {
    let mut writer = csv::Writer::from_writer(writer);

    writer.serialize(SummaryRow {
        points: record.points(),
        tier: record.tier().to_string(),
        total_spent: record.total_spent().to_string(),
        points_to_next_tier,
        tier_progress,
        join_date: record.join_date().to_rfc3339(),
    })?;

    writer.flush().map_err(|e| CsvError::Write(e.into()))?;
    Ok(())
}
