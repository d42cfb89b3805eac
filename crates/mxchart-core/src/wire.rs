//! Request body decoding and validation
//!
//! The wire format is a JSON object `{ "tasks": [ ... ] }` whose records use
//! spreadsheet-style field names (`"Start Date"`, `"MRO"`, ...). Everything is
//! checked here so that downstream grid and layout code only ever sees
//! non-empty lists of well-formed tasks.

use chrono::{DateTime, NaiveDate};
use serde::Deserialize;
use serde_json::Value;

use crate::{MaintenanceTask, RequestError, Severity, TaskFieldError};

const COMPONENT_GROUP: &str = "Component Group";
const AIRCRAFT: &str = "Aircraft";
const FACILITY: &str = "MRO";
const WARNING: &str = "Warning";
const START_DATE: &str = "Start Date";
const END_DATE: &str = "End Date";
const PERCENT_COMPLETE: &str = "PercentComplete";

/// A task record as it appears on the wire, before validation.
///
/// Absent and `null` fields are both `None`.
#[derive(Clone, Debug, Default)]
pub struct WireTask {
    pub component_group: Option<String>,
    pub aircraft: Option<String>,
    pub facility: Option<String>,
    pub warning: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub percent_complete: Option<WirePercent>,
}

/// `PercentComplete` arrives either as a number or as a numeric string
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum WirePercent {
    Number(f64),
    Text(String),
}

impl WireTask {
    /// Validate into a domain task
    pub fn validate(self) -> Result<MaintenanceTask, TaskFieldError> {
        let start = parse_date(START_DATE, self.start_date.as_deref())?;
        let end = parse_date(END_DATE, self.end_date.as_deref())?;
        if end < start {
            return Err(TaskFieldError::EndBeforeStart { start, end });
        }

        let percent_complete = match self.percent_complete {
            None => 0.0,
            Some(value) => parse_percent(value)?,
        };

        let warning = self.warning.unwrap_or_default();
        Ok(MaintenanceTask {
            component_group: self.component_group.unwrap_or_default(),
            aircraft: self.aircraft.unwrap_or_default(),
            facility: self.facility.unwrap_or_default(),
            severity: Severity::from_warning(&warning),
            warning,
            start,
            end,
            percent_complete,
        })
    }
}

/// Decode and validate a full request body.
///
/// The first failing record is reported with its index in the `tasks` array.
pub fn parse_request(body: &[u8]) -> Result<Vec<MaintenanceTask>, RequestError> {
    let value: Value = serde_json::from_slice(body).map_err(|_| RequestError::MalformedJson)?;
    parse_tasks_value(&value)
}

/// Validate an already decoded JSON document
pub fn parse_tasks_value(value: &Value) -> Result<Vec<MaintenanceTask>, RequestError> {
    let records = value
        .get("tasks")
        .and_then(Value::as_array)
        .ok_or(RequestError::MissingTasks)?;

    if records.is_empty() {
        return Err(RequestError::EmptyTasks);
    }

    records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            parse_record(record).map_err(|source| RequestError::InvalidTask { index, source })
        })
        .collect()
}

fn parse_record(record: &Value) -> Result<MaintenanceTask, TaskFieldError> {
    let Some(fields) = record.as_object() else {
        return Err(TaskFieldError::NotAnObject);
    };

    // Decode field by field so the error can name the offending field.
    let mut wire = WireTask::default();
    for (name, value) in fields {
        if value.is_null() {
            continue;
        }
        match name.as_str() {
            COMPONENT_GROUP => wire.component_group = Some(text_field(COMPONENT_GROUP, value)?),
            AIRCRAFT => wire.aircraft = Some(text_field(AIRCRAFT, value)?),
            FACILITY => wire.facility = Some(text_field(FACILITY, value)?),
            WARNING => wire.warning = Some(text_field(WARNING, value)?),
            START_DATE => wire.start_date = Some(text_field(START_DATE, value)?),
            END_DATE => wire.end_date = Some(text_field(END_DATE, value)?),
            PERCENT_COMPLETE => {
                wire.percent_complete = Some(
                    WirePercent::deserialize(value)
                        .map_err(|_| TaskFieldError::InvalidPercent(value.to_string()))?,
                );
            }
            _ => {}
        }
    }
    wire.validate()
}

fn text_field(field: &'static str, value: &Value) -> Result<String, TaskFieldError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(TaskFieldError::WrongType { field }),
    }
}

/// Parse `YYYY-MM-DD`, or the date part of an RFC 3339 timestamp
pub fn parse_date(field: &'static str, raw: Option<&str>) -> Result<NaiveDate, TaskFieldError> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty());
    let Some(raw) = raw else {
        return Err(TaskFieldError::MissingDate { field });
    };

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
        .ok_or_else(|| TaskFieldError::InvalidDate {
            field,
            value: raw.to_string(),
        })
}

fn parse_percent(value: WirePercent) -> Result<f64, TaskFieldError> {
    let fraction = match value {
        WirePercent::Number(n) => n,
        WirePercent::Text(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Ok(0.0);
            }
            trimmed
                .parse::<f64>()
                .map_err(|_| TaskFieldError::InvalidPercent(text.clone()))?
        }
    };

    if !fraction.is_finite() {
        return Err(TaskFieldError::InvalidPercent(fraction.to_string()));
    }
    if !(0.0..=1.0).contains(&fraction) {
        return Err(TaskFieldError::PercentOutOfRange(fraction));
    }
    Ok(fraction)
}
