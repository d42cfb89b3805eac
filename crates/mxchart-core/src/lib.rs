//! # mxchart-core
//!
//! Core domain model and pure layout logic for the mxchart timeline engine.
//!
//! This crate provides:
//! - Domain types: `MaintenanceTask`, `Severity`, `ChartRequest`
//! - Request validation from the JSON wire format (`wire`)
//! - The sampled calendar axis (`grid`)
//! - Facility → aircraft → task ordering (`order`)
//! - The `Renderer` trait and error types
//!
//! ## Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use mxchart_core::{grid::DateGrid, order::order_tasks, MaintenanceTask};
//!
//! let d = |m, day| NaiveDate::from_ymd_opt(2025, m, day).unwrap();
//! let tasks = vec![
//!     MaintenanceTask::new("Wheel", "N100", "FacilityA", d(1, 1), d(1, 10)).percent_complete(0.5),
//!     MaintenanceTask::new("Brake", "N200", "FacilityA", d(1, 2), d(1, 4)),
//! ];
//!
//! let grid = DateGrid::build(&tasks, d(1, 5)).unwrap();
//! assert_eq!(grid.lower_bound(), NaiveDate::from_ymd_opt(2024, 12, 29).unwrap());
//!
//! let ordered = order_tasks(&tasks);
//! assert_eq!(ordered[0].aircraft, "N200");
//! ```

pub mod grid;
pub mod order;
pub mod wire;

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// Severity
// ============================================================================

/// Visual severity derived from a task's free-text warning
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// No warning, or a none-equivalent value ("", "N/A", "None")
    Normal,
    /// Any warning other than a work stoppage
    Caution,
    /// Work on the asset is stopped
    Critical,
}

impl Severity {
    /// Classify a warning string.
    ///
    /// `WorkStoppage` (case and whitespace insensitive) is critical, any other
    /// non-empty text that is not `N/A` or `None` is a caution.
    pub fn from_warning(warning: &str) -> Self {
        if is_none_equivalent(warning) {
            return Self::Normal;
        }
        let folded: String = warning
            .chars()
            .filter(|c| !c.is_whitespace())
            .flat_map(char::to_lowercase)
            .collect();
        if folded == "workstoppage" {
            Self::Critical
        } else {
            Self::Caution
        }
    }

    /// CSS class used by the document assembler, `None` for unstyled rows
    pub fn css_class(self) -> Option<&'static str> {
        match self {
            Self::Normal => None,
            Self::Caution => Some("sev-caution"),
            Self::Critical => Some("sev-critical"),
        }
    }
}

/// True for warning values that mean "no warning"
pub fn is_none_equivalent(warning: &str) -> bool {
    let trimmed = warning.trim();
    trimmed.is_empty() || trimmed.eq_ignore_ascii_case("n/a") || trimmed.eq_ignore_ascii_case("none")
}

// ============================================================================
// Maintenance Task
// ============================================================================

/// A validated maintenance activity, one chart row
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MaintenanceTask {
    /// Part or work category shown in the first label column
    pub component_group: String,
    /// Asset under maintenance (second grouping level)
    pub aircraft: String,
    /// Maintenance organisation (first grouping level)
    pub facility: String,
    /// Warning text as supplied by the caller
    pub warning: String,
    /// Severity derived from `warning`
    pub severity: Severity,
    /// First day of work (inclusive)
    pub start: NaiveDate,
    /// Last day of work (inclusive)
    pub end: NaiveDate,
    /// Completed fraction of the work, in `[0, 1]`
    pub percent_complete: f64,
}

impl MaintenanceTask {
    /// Create a task with no warning and no progress
    pub fn new(
        component_group: impl Into<String>,
        aircraft: impl Into<String>,
        facility: impl Into<String>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Self {
        Self {
            component_group: component_group.into(),
            aircraft: aircraft.into(),
            facility: facility.into(),
            warning: String::new(),
            severity: Severity::Normal,
            start,
            end,
            percent_complete: 0.0,
        }
    }

    /// Set the warning text (severity is re-derived)
    pub fn warning(mut self, warning: impl Into<String>) -> Self {
        self.warning = warning.into();
        self.severity = Severity::from_warning(&self.warning);
        self
    }

    /// Set the completed fraction
    pub fn percent_complete(mut self, fraction: f64) -> Self {
        self.percent_complete = fraction;
        self
    }

    /// Whether the work is finished (fraction at or above 1)
    pub fn is_complete(&self) -> bool {
        self.percent_complete >= 1.0
    }

    /// Warning text for display, empty when none-equivalent
    pub fn display_warning(&self) -> &str {
        if is_none_equivalent(&self.warning) {
            ""
        } else {
            self.warning.trim()
        }
    }
}

// ============================================================================
// Chart Request
// ============================================================================

/// Everything one render needs: the validated tasks and the date treated as today
#[derive(Clone, Debug, PartialEq)]
pub struct ChartRequest {
    pub tasks: Vec<MaintenanceTask>,
    pub today: NaiveDate,
}

impl ChartRequest {
    pub fn new(tasks: Vec<MaintenanceTask>, today: NaiveDate) -> Self {
        Self { tasks, today }
    }
}

// ============================================================================
// Traits
// ============================================================================

/// Output rendering
pub trait Renderer {
    type Output;

    /// Render a chart request to the output format
    fn render(&self, request: &ChartRequest) -> Result<Self::Output, RenderError>;
}

// ============================================================================
// Errors
// ============================================================================

/// Date grid construction error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GridError {
    #[error("Task list is empty")]
    NoTasks,

    #[error("Date {date} is too close to the calendar limit to pad the chart")]
    PaddingOutOfRange { date: NaiveDate },

    #[error("Grid lower bound {lower} is after upper bound {upper}")]
    InvertedBounds { lower: NaiveDate, upper: NaiveDate },
}

/// Span layout error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LayoutError {
    #[error("Task '{component}' ({start}..{end}) lies outside the chart grid")]
    OutsideGrid {
        component: String,
        start: NaiveDate,
        end: NaiveDate,
    },
}

/// Rendering error
#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Grid(#[from] GridError),

    #[error(transparent)]
    Layout(#[from] LayoutError),
}

/// Field-level problem with one task record
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TaskFieldError {
    #[error("task record is not an object")]
    NotAnObject,

    #[error("field '{field}' has the wrong type")]
    WrongType { field: &'static str },

    #[error("missing '{field}'")]
    MissingDate { field: &'static str },

    #[error("invalid '{field}' value '{value}'")]
    InvalidDate { field: &'static str, value: String },

    #[error("'End Date' {end} is before 'Start Date' {start}")]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },

    #[error("invalid 'PercentComplete' value '{0}'")]
    InvalidPercent(String),

    #[error("'PercentComplete' {0} is outside 0..1")]
    PercentOutOfRange(f64),
}

/// Request body validation error
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RequestError {
    #[error("Malformed JSON")]
    MalformedJson,

    #[error("Invalid or missing tasks array")]
    MissingTasks,

    #[error("Task list is empty")]
    EmptyTasks,

    #[error("Task {index}: {source}")]
    InvalidTask {
        index: usize,
        #[source]
        source: TaskFieldError,
    },
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn severity_from_warning() {
        assert_eq!(Severity::from_warning("WorkStoppage"), Severity::Critical);
        assert_eq!(Severity::from_warning("work stoppage"), Severity::Critical);
        assert_eq!(Severity::from_warning("Caution"), Severity::Caution);
        assert_eq!(Severity::from_warning("Awaiting parts"), Severity::Caution);
        assert_eq!(Severity::from_warning("N/A"), Severity::Normal);
        assert_eq!(Severity::from_warning("None"), Severity::Normal);
        assert_eq!(Severity::from_warning("  "), Severity::Normal);
    }

    #[test]
    fn severity_css_classes() {
        assert_eq!(Severity::Normal.css_class(), None);
        assert_eq!(Severity::Caution.css_class(), Some("sev-caution"));
        assert_eq!(Severity::Critical.css_class(), Some("sev-critical"));
    }

    #[test]
    fn task_builder() {
        let task = MaintenanceTask::new("Wheel", "N100", "FacilityA", date(2025, 1, 1), date(2025, 1, 10))
            .warning("Caution")
            .percent_complete(1.0);

        assert_eq!(task.component_group, "Wheel");
        assert_eq!(task.severity, Severity::Caution);
        assert_eq!(task.display_warning(), "Caution");
        assert!(task.is_complete());
    }

    #[test]
    fn display_warning_hides_none_equivalents() {
        let task = MaintenanceTask::new("Wheel", "N100", "FacilityA", date(2025, 1, 1), date(2025, 1, 1))
            .warning("N/A");
        assert_eq!(task.display_warning(), "");
        assert_eq!(task.severity, Severity::Normal);
    }

    #[test]
    fn request_error_messages() {
        assert_eq!(RequestError::MalformedJson.to_string(), "Malformed JSON");
        assert_eq!(
            RequestError::MissingTasks.to_string(),
            "Invalid or missing tasks array"
        );
        let err = RequestError::InvalidTask {
            index: 2,
            source: TaskFieldError::PercentOutOfRange(1.5),
        };
        assert_eq!(err.to_string(), "Task 2: 'PercentComplete' 1.5 is outside 0..1");
    }
}
