//! Span layout: where each task's bar sits on the sampled grid
//!
//! Spans are counted in grid columns, not calendar days. Because the grid
//! keeps only every other day, a ten-day task covers roughly five columns.
//!
//! Bars normally cover exactly the sampled days inside `[start, end]`. The one
//! exception is a task whose whole interval falls between two sampled days:
//! it has no such column, so it is drawn one column wide on the sampled day
//! just before its start rather than disappearing from the chart.

use mxchart_core::{grid::DateGrid, LayoutError, MaintenanceTask, Severity};

/// Contiguous run of grid columns occupied by a bar
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BarSpan {
    pub start_column: usize,
    pub columns: usize,
}

impl BarSpan {
    /// One past the last covered column
    pub fn end_column(&self) -> usize {
        self.start_column + self.columns
    }

    pub fn contains(&self, column: usize) -> bool {
        column >= self.start_column && column < self.end_column()
    }
}

/// Fill variant of a bar
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Completion {
    InProgress,
    Complete,
}

impl Completion {
    pub fn css_class(self) -> &'static str {
        match self {
            Self::InProgress => "in-progress",
            Self::Complete => "complete",
        }
    }
}

/// One cell of a task row, left to right after the two label columns
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowCell {
    Empty { column: usize, today: bool },
    Bar { span: BarSpan, today: bool },
}

/// Resolved layout of one task row
#[derive(Clone, Debug, PartialEq)]
pub struct TaskLayout<'a> {
    pub task: &'a MaintenanceTask,
    pub span: BarSpan,
    /// Width of the completion fill in percent of the bar, capped at 100
    pub fill_percent: f64,
    pub completion: Completion,
    /// Centered bar label, e.g. "50.0%"
    pub label: String,
    pub today_column: Option<usize>,
    pub total_columns: usize,
}

impl TaskLayout<'_> {
    pub fn severity(&self) -> Severity {
        self.task.severity
    }

    /// Cells for the whole row: one merged bar cell, empty cells elsewhere
    pub fn cells(&self) -> Vec<RowCell> {
        let mut cells = Vec::with_capacity(self.total_columns - self.span.columns + 1);
        let is_today = |column: usize| self.today_column == Some(column);

        for column in 0..self.span.start_column {
            cells.push(RowCell::Empty {
                column,
                today: is_today(column),
            });
        }
        cells.push(RowCell::Bar {
            span: self.span,
            today: self.today_column.is_some_and(|c| self.span.contains(c)),
        });
        for column in self.span.end_column()..self.total_columns {
            cells.push(RowCell::Empty {
                column,
                today: is_today(column),
            });
        }
        cells
    }
}

/// Place a task on the grid.
///
/// The bar starts at the first grid day inside `[start, end]` and covers every
/// grid day inside it. A one-day task that falls between two sampled days is
/// drawn on the sampled column just before it. An interval with no overlap
/// with the grid's calendar range is an error rather than a missing bar.
pub fn layout_task<'a>(
    task: &'a MaintenanceTask,
    grid: &DateGrid,
) -> Result<TaskLayout<'a>, LayoutError> {
    let outside = || LayoutError::OutsideGrid {
        component: task.component_group.clone(),
        start: task.start,
        end: task.end,
    };

    if !grid.overlaps(task.start, task.end) {
        return Err(outside());
    }

    let (start_column, columns) = match grid.columns_within(task.start, task.end) {
        Some(found) => found,
        None => {
            let column = grid.column_at_or_before(task.start).ok_or_else(outside)?;
            (column, 1)
        }
    };

    let completion = if task.is_complete() {
        Completion::Complete
    } else {
        Completion::InProgress
    };

    Ok(TaskLayout {
        task,
        span: BarSpan {
            start_column,
            columns,
        },
        fill_percent: (task.percent_complete * 100.0).clamp(0.0, 100.0),
        completion,
        label: percent_label(task.percent_complete),
        today_column: grid.today_column(),
        total_columns: grid.len(),
    })
}

/// Percentage with one decimal place
pub fn percent_label(fraction: f64) -> String {
    format!("{:.1}%", fraction * 100.0)
}
