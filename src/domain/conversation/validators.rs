//! Slot-specific input validators.
//!
//! A validator either accepts the raw text (returning the value to store,
//! trimmed of surrounding whitespace only) or rejects it with a
//! `ValidationError` that the engine turns into a format hint.

use chrono::{NaiveDate, NaiveTime};

use crate::domain::foundation::ValidationError;

use super::Slot;

pub const MAX_FREE_TEXT_LEN: usize = 1000;
pub const MAX_NAME_LEN: usize = 120;
const MIN_NAME_LETTERS: usize = 2;

/// Validates `raw` for `slot`. `today` is the calendar date of the inbound message.
pub fn validate_slot(slot: Slot, raw: &str, today: NaiveDate) -> Result<String, ValidationError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(ValidationError::empty_field(slot.key()));
    }

    match slot {
        Slot::Medications | Slot::Instructions | Slot::Reason => free_text(slot, value)?,
        Slot::PatientName => patient_name(value)?,
        Slot::IssueDate => {
            parse_date(value).ok_or_else(|| date_format_error(slot))?;
        }
        Slot::AppointmentDate => {
            let date = parse_date(value).ok_or_else(|| date_format_error(slot))?;
            if date < today {
                return Err(ValidationError::invalid_format(
                    slot.key(),
                    "date must not be in the past",
                ));
            }
        }
        Slot::AppointmentTime => {
            parse_time(value).ok_or_else(|| {
                ValidationError::invalid_format(slot.key(), "expected HH:MM or HHhMM")
            })?;
        }
    }

    Ok(value.to_string())
}

fn free_text(slot: Slot, value: &str) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len > MAX_FREE_TEXT_LEN {
        return Err(ValidationError::out_of_range(
            slot.key(),
            1,
            MAX_FREE_TEXT_LEN as i32,
            len as i32,
        ));
    }
    Ok(())
}

fn patient_name(value: &str) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len > MAX_NAME_LEN {
        return Err(ValidationError::out_of_range(
            Slot::PatientName.key(),
            MIN_NAME_LETTERS as i32,
            MAX_NAME_LEN as i32,
            len as i32,
        ));
    }
    if value.chars().filter(|c| c.is_alphabetic()).count() < MIN_NAME_LETTERS {
        return Err(ValidationError::invalid_format(
            Slot::PatientName.key(),
            "name must contain at least two letters",
        ));
    }
    Ok(())
}

fn date_format_error(slot: Slot) -> ValidationError {
    ValidationError::invalid_format(slot.key(), "expected YYYY-MM-DD or DD/MM/YYYY")
}

/// Parses `YYYY-MM-DD` or `DD/MM/YYYY` into a calendar date.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(value, "%d/%m/%Y"))
        .ok()
}

/// Parses `HH:MM`, `HHhMM` or `HHh` (24h) into a time of day.
pub fn parse_time(value: &str) -> Option<NaiveTime> {
    let value = value.trim().to_ascii_lowercase();
    let (hours, minutes) = value
        .split_once(':')
        .or_else(|| value.split_once('h'))?;

    if hours.is_empty() || hours.len() > 2 || !hours.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let minutes = if minutes.is_empty() && value.contains('h') {
        "00"
    } else {
        minutes
    };
    if minutes.len() != 2 || !minutes.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    NaiveTime::from_hms_opt(hours.parse().ok()?, minutes.parse().ok()?, 0)
}
