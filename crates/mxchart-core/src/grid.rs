//! Sampled calendar axis
//!
//! The grid spans three days either side of the task set and keeps every
//! other day (even offsets from the lower bound), plus today's date so the
//! today marker always has a column to land on.

use chrono::{Datelike, Days, NaiveDate};

use crate::{GridError, MaintenanceTask};

/// Days of padding added before the earliest start and after the latest end
pub const GRID_PADDING_DAYS: u64 = 3;

/// Ordered, deduplicated set of calendar days forming the chart columns
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DateGrid {
    lower: NaiveDate,
    upper: NaiveDate,
    today: NaiveDate,
    days: Vec<NaiveDate>,
}

/// A run of consecutive grid columns sharing one month
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MonthBand {
    pub year: i32,
    pub month: u32,
    /// Display label, e.g. "January 2025"
    pub label: String,
    /// Number of grid columns covered
    pub span: usize,
}

impl DateGrid {
    /// Build the grid covering every task.
    ///
    /// Returns [`GridError::NoTasks`] for an empty slice instead of computing
    /// a minimum over nothing, and [`GridError::PaddingOutOfRange`] when the
    /// padded bounds fall outside the representable calendar.
    pub fn build(tasks: &[MaintenanceTask], today: NaiveDate) -> Result<Self, GridError> {
        let earliest = tasks.iter().map(|t| t.start).min().ok_or(GridError::NoTasks)?;
        let latest = tasks.iter().map(|t| t.end).max().ok_or(GridError::NoTasks)?;

        let padding = Days::new(GRID_PADDING_DAYS);
        let lower = earliest
            .checked_sub_days(padding)
            .ok_or(GridError::PaddingOutOfRange { date: earliest })?;
        let upper = latest
            .checked_add_days(padding)
            .ok_or(GridError::PaddingOutOfRange { date: latest })?;
        Self::from_bounds(lower, upper, today)
    }

    /// Build the grid for explicit bounds (both inclusive)
    pub fn from_bounds(
        lower: NaiveDate,
        upper: NaiveDate,
        today: NaiveDate,
    ) -> Result<Self, GridError> {
        if lower > upper {
            return Err(GridError::InvertedBounds { lower, upper });
        }

        let days = lower
            .iter_days()
            .take_while(|day| *day <= upper)
            .enumerate()
            .filter(|(offset, day)| offset % 2 == 0 || *day == today)
            .map(|(_, day)| day)
            .collect();

        Ok(Self {
            lower,
            upper,
            today,
            days,
        })
    }

    /// Grid columns, left to right
    pub fn days(&self) -> &[NaiveDate] {
        &self.days
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// First calendar day covered (always column 0)
    pub fn lower_bound(&self) -> NaiveDate {
        self.lower
    }

    /// Last calendar day covered (may itself be sampled out)
    pub fn upper_bound(&self) -> NaiveDate {
        self.upper
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// True if `[start, end]` shares at least one calendar day with the grid
    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        start <= self.upper && end >= self.lower
    }

    /// Column index of an exact grid day
    pub fn column_of(&self, date: NaiveDate) -> Option<usize> {
        self.days.binary_search(&date).ok()
    }

    /// Column index of today, if today lies within the grid
    pub fn today_column(&self) -> Option<usize> {
        self.column_of(self.today)
    }

    /// Columns whose date falls within `[start, end]` inclusive, as a
    /// `(first_column, count)` pair. `None` when no sampled day is inside.
    pub fn columns_within(&self, start: NaiveDate, end: NaiveDate) -> Option<(usize, usize)> {
        let first = self.days.partition_point(|day| *day < start);
        let past_end = self.days.partition_point(|day| *day <= end);
        (past_end > first).then(|| (first, past_end - first))
    }

    /// Column of the closest sampled day at or before `date`
    pub fn column_at_or_before(&self, date: NaiveDate) -> Option<usize> {
        self.days.partition_point(|day| *day <= date).checked_sub(1)
    }

    /// Run-length encode consecutive columns sharing month and year
    pub fn month_bands(&self) -> Vec<MonthBand> {
        let mut bands: Vec<MonthBand> = Vec::new();
        for day in &self.days {
            match bands.last_mut() {
                Some(band) if band.year == day.year() && band.month == day.month() => {
                    band.span += 1;
                }
                _ => bands.push(MonthBand {
                    year: day.year(),
                    month: day.month(),
                    label: day.format("%B %Y").to_string(),
                    span: 1,
                }),
            }
        }
        bands
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn task(start: NaiveDate, end: NaiveDate) -> MaintenanceTask {
        MaintenanceTask::new("Wheel", "N100", "FacilityA", start, end)
    }

    #[test]
    fn bounds_are_padded_by_three_days() {
        let tasks = vec![
            task(date(2025, 1, 5), date(2025, 1, 8)),
            task(date(2025, 1, 2), date(2025, 1, 20)),
        ];
        let grid = DateGrid::build(&tasks, date(2024, 6, 1)).unwrap();

        assert_eq!(grid.lower_bound(), date(2024, 12, 30));
        assert_eq!(grid.upper_bound(), date(2025, 1, 23));
        assert_eq!(grid.days()[0], grid.lower_bound());
    }

    #[test]
    fn keeps_even_offsets_only() {
        let grid = DateGrid::from_bounds(date(2025, 1, 1), date(2025, 1, 7), date(2020, 1, 1)).unwrap();
        assert_eq!(
            grid.days(),
            &[date(2025, 1, 1), date(2025, 1, 3), date(2025, 1, 5), date(2025, 1, 7)]
        );
    }

    #[test]
    fn keeps_today_on_odd_offset() {
        let today = date(2025, 1, 4);
        let grid = DateGrid::from_bounds(date(2025, 1, 1), date(2025, 1, 7), today).unwrap();
        assert_eq!(
            grid.days(),
            &[
                date(2025, 1, 1),
                date(2025, 1, 3),
                date(2025, 1, 4),
                date(2025, 1, 5),
                date(2025, 1, 7)
            ]
        );
        assert_eq!(grid.today_column(), Some(2));
    }

    #[test]
    fn every_day_is_even_offset_or_today() {
        let today = date(2025, 2, 11);
        let tasks = vec![task(date(2025, 1, 17), date(2025, 3, 2))];
        let grid = DateGrid::build(&tasks, today).unwrap();

        assert!(grid.days().contains(&today));
        for day in grid.days() {
            let offset = (*day - grid.lower_bound()).num_days();
            assert!(offset % 2 == 0 || *day == today, "unexpected day {day}");
        }
        assert!(grid.days().windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn today_outside_range_is_not_added() {
        let grid = DateGrid::from_bounds(date(2025, 1, 1), date(2025, 1, 5), date(2025, 3, 1)).unwrap();
        assert_eq!(grid.today_column(), None);
        assert_eq!(grid.len(), 3);
    }

    #[test]
    fn empty_task_list_is_an_error() {
        assert_eq!(DateGrid::build(&[], date(2025, 1, 1)), Err(GridError::NoTasks));
    }

    #[test]
    fn padding_past_calendar_limits_is_an_error() {
        let late = GridError::PaddingOutOfRange { date: NaiveDate::MAX };
        assert_eq!(
            DateGrid::build(&[task(NaiveDate::MAX, NaiveDate::MAX)], date(2025, 1, 1)),
            Err(late)
        );

        let early = GridError::PaddingOutOfRange { date: NaiveDate::MIN };
        assert_eq!(
            DateGrid::build(&[task(NaiveDate::MIN, NaiveDate::MIN)], date(2025, 1, 1)),
            Err(early)
        );
    }

    #[test]
    fn overlap_is_inclusive_at_both_bounds() {
        let grid = DateGrid::from_bounds(date(2025, 1, 1), date(2025, 1, 9), date(2025, 6, 1)).unwrap();
        assert!(grid.overlaps(date(2024, 12, 20), date(2025, 1, 1)));
        assert!(grid.overlaps(date(2025, 1, 9), date(2025, 2, 1)));
        assert!(!grid.overlaps(date(2024, 12, 20), date(2024, 12, 31)));
        assert!(!grid.overlaps(date(2025, 1, 10), date(2025, 1, 12)));
    }

    #[test]
    fn inverted_bounds_are_an_error() {
        let err = DateGrid::from_bounds(date(2025, 1, 5), date(2025, 1, 1), date(2025, 1, 1));
        assert!(matches!(err, Err(GridError::InvertedBounds { .. })));
    }

    #[test]
    fn columns_within_counts_sampled_days() {
        let grid = DateGrid::from_bounds(date(2025, 1, 1), date(2025, 1, 11), date(2020, 1, 1)).unwrap();
        // columns: 1, 3, 5, 7, 9, 11
        assert_eq!(grid.columns_within(date(2025, 1, 2), date(2025, 1, 7)), Some((1, 3)));
        assert_eq!(grid.columns_within(date(2025, 1, 1), date(2025, 1, 1)), Some((0, 1)));
        assert_eq!(grid.columns_within(date(2025, 1, 4), date(2025, 1, 4)), None);
        assert_eq!(grid.columns_within(date(2025, 2, 1), date(2025, 2, 5)), None);
    }

    #[test]
    fn column_at_or_before_snaps_left() {
        let grid = DateGrid::from_bounds(date(2025, 1, 1), date(2025, 1, 7), date(2020, 1, 1)).unwrap();
        assert_eq!(grid.column_at_or_before(date(2025, 1, 4)), Some(1));
        assert_eq!(grid.column_at_or_before(date(2024, 12, 31)), None);
    }

    #[test]
    fn month_bands_run_length_encode() {
        let grid = DateGrid::from_bounds(date(2025, 1, 27), date(2025, 2, 4), date(2020, 1, 1)).unwrap();
        // columns: Jan 27, 29, 31, Feb 2, 4
        let bands = grid.month_bands();
        assert_eq!(bands.len(), 2);
        assert_eq!(bands[0].label, "January 2025");
        assert_eq!(bands[0].span, 3);
        assert_eq!(bands[1].label, "February 2025");
        assert_eq!(bands[1].span, 2);
        assert_eq!(bands.iter().map(|b| b.span).sum::<usize>(), grid.len());
    }
}
