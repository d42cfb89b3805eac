//! Facility → aircraft → task ordering
//!
//! Groups are ranked by the earliest end date among their tasks so the assets
//! closest to completion surface at the top of the chart.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::MaintenanceTask;

/// One body row of the chart, in render order
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ChartRow<'a> {
    /// Separator introducing a new facility
    Facility { facility: &'a str },
    /// Separator introducing a new aircraft within the current facility
    Aircraft {
        facility: &'a str,
        aircraft: &'a str,
    },
    /// A task bar row
    Task(&'a MaintenanceTask),
}

/// Earliest end date and first input position of a group
#[derive(Clone, Copy, Debug)]
struct GroupKey {
    min_end: NaiveDate,
    first_seen: usize,
}

impl GroupKey {
    fn observe(entry: Option<&mut Self>, end: NaiveDate, index: usize) -> Option<Self> {
        match entry {
            Some(key) => {
                key.min_end = key.min_end.min(end);
                None
            }
            None => Some(Self {
                min_end: end,
                first_seen: index,
            }),
        }
    }

    fn rank(self) -> (NaiveDate, usize) {
        (self.min_end, self.first_seen)
    }
}

/// Return a new sequence in render order; the input is left untouched.
///
/// Sort keys, all ascending: facility minimum end date, aircraft minimum end
/// date within the facility, the task's own end date. The sort is stable, and
/// groups whose keys tie keep the order in which they first appear so each
/// group stays contiguous.
pub fn order_tasks(tasks: &[MaintenanceTask]) -> Vec<MaintenanceTask> {
    let mut facilities: HashMap<&str, GroupKey> = HashMap::new();
    let mut aircraft: HashMap<(&str, &str), GroupKey> = HashMap::new();

    for (index, task) in tasks.iter().enumerate() {
        let facility = task.facility.as_str();
        if let Some(key) = GroupKey::observe(facilities.get_mut(facility), task.end, index) {
            facilities.insert(facility, key);
        }
        let pair = (facility, task.aircraft.as_str());
        if let Some(key) = GroupKey::observe(aircraft.get_mut(&pair), task.end, index) {
            aircraft.insert(pair, key);
        }
    }

    let mut keyed: Vec<_> = tasks
        .iter()
        .map(|task| {
            let facility = facilities[task.facility.as_str()].rank();
            let asset = aircraft[&(task.facility.as_str(), task.aircraft.as_str())].rank();
            ((facility, asset, task.end), task)
        })
        .collect();

    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    keyed.into_iter().map(|(_, task)| task.clone()).collect()
}

/// Interleave separator rows into an already ordered task sequence.
///
/// A facility separator is emitted whenever the facility differs from the
/// previous task's; an aircraft separator whenever the facility or the
/// aircraft differs.
pub fn chart_rows(ordered: &[MaintenanceTask]) -> Vec<ChartRow<'_>> {
    let mut rows = Vec::with_capacity(ordered.len() * 2);
    let mut previous: Option<&MaintenanceTask> = None;

    for task in ordered {
        let new_facility = previous.map_or(true, |p| p.facility != task.facility);
        let new_aircraft = new_facility || previous.map_or(true, |p| p.aircraft != task.aircraft);

        if new_facility {
            rows.push(ChartRow::Facility {
                facility: &task.facility,
            });
        }
        if new_aircraft {
            rows.push(ChartRow::Aircraft {
                facility: &task.facility,
                aircraft: &task.aircraft,
            });
        }
        rows.push(ChartRow::Task(task));
        previous = Some(task);
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, month, day).unwrap()
    }

    fn task(component: &str, aircraft: &str, facility: &str, end: NaiveDate) -> MaintenanceTask {
        MaintenanceTask::new(component, aircraft, facility, date(1, 1), end)
    }

    fn components(tasks: &[MaintenanceTask]) -> Vec<&str> {
        tasks.iter().map(|t| t.component_group.as_str()).collect()
    }

    #[test]
    fn facilities_ranked_by_earliest_end() {
        let tasks = vec![
            task("a1", "N1", "Alpha", date(3, 1)),
            task("b1", "N2", "Bravo", date(2, 1)),
            task("a2", "N1", "Alpha", date(4, 1)),
        ];
        assert_eq!(components(&order_tasks(&tasks)), vec!["b1", "a1", "a2"]);
    }

    #[test]
    fn aircraft_ranked_within_facility() {
        let tasks = vec![
            task("late", "N100", "Alpha", date(1, 20)),
            task("early", "N200", "Alpha", date(1, 5)),
            task("mid", "N100", "Alpha", date(1, 10)),
        ];
        // N200 (min end 1/5) before N100 (min end 1/10)
        assert_eq!(components(&order_tasks(&tasks)), vec!["early", "mid", "late"]);
    }

    #[test]
    fn task_end_date_breaks_ties_within_aircraft() {
        let tasks = vec![
            task("second", "N1", "Alpha", date(1, 9)),
            task("first", "N1", "Alpha", date(1, 3)),
        ];
        assert_eq!(components(&order_tasks(&tasks)), vec!["first", "second"]);
    }

    #[test]
    fn equal_keys_preserve_input_order() {
        let tasks = vec![
            task("x", "N1", "Alpha", date(1, 9)),
            task("y", "N1", "Alpha", date(1, 9)),
            task("z", "N1", "Alpha", date(1, 9)),
        ];
        assert_eq!(components(&order_tasks(&tasks)), vec!["x", "y", "z"]);
    }

    #[test]
    fn tied_groups_stay_contiguous() {
        let tasks = vec![
            task("a1", "N1", "Alpha", date(1, 9)),
            task("b1", "N2", "Bravo", date(1, 9)),
            task("a2", "N1", "Alpha", date(1, 12)),
        ];
        assert_eq!(components(&order_tasks(&tasks)), vec!["a1", "a2", "b1"]);
    }

    #[test]
    fn same_aircraft_name_in_two_facilities_is_two_groups() {
        let tasks = vec![
            task("a", "N1", "Alpha", date(1, 20)),
            task("b", "N1", "Bravo", date(1, 2)),
        ];
        let ordered = order_tasks(&tasks);
        assert_eq!(components(&ordered), vec!["b", "a"]);
        let separators = chart_rows(&ordered)
            .iter()
            .filter(|row| matches!(row, ChartRow::Aircraft { .. }))
            .count();
        assert_eq!(separators, 2);
    }

    #[test]
    fn input_is_not_reordered() {
        let tasks = vec![
            task("late", "N1", "Alpha", date(2, 1)),
            task("early", "N1", "Alpha", date(1, 2)),
        ];
        let before = tasks.clone();
        let _ = order_tasks(&tasks);
        assert_eq!(tasks, before);
    }

    #[test]
    fn rows_interleave_separators() {
        let tasks = vec![
            task("wheel", "N100", "Alpha", date(1, 10)),
            task("brake", "N200", "Alpha", date(1, 4)),
            task("flap", "N300", "Bravo", date(1, 30)),
        ];
        let ordered = order_tasks(&tasks);
        let rows = chart_rows(&ordered);

        let shape: Vec<String> = rows
            .iter()
            .map(|row| match row {
                ChartRow::Facility { facility } => format!("F:{facility}"),
                ChartRow::Aircraft { aircraft, .. } => format!("A:{aircraft}"),
                ChartRow::Task(t) => format!("T:{}", t.component_group),
            })
            .collect();

        assert_eq!(
            shape,
            vec![
                "F:Alpha", "A:N200", "T:brake", "A:N100", "T:wheel", "F:Bravo", "A:N300",
                "T:flap"
            ]
        );
    }

    #[test]
    fn empty_input_yields_no_rows() {
        assert!(order_tasks(&[]).is_empty());
        assert!(chart_rows(&[]).is_empty());
    }
}
