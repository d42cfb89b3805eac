//! HTML Timeline Document Assembler
//!
//! Generates a standalone HTML document holding the maintenance timeline as a
//! table. Features:
//! - Two pinned label columns (component, warning/notes)
//! - Two-row date header: month bands and sampled day numbers
//! - Facility and aircraft separator rows
//! - Severity-coloured bars with a completion fill and centred label
//! - A today marker column

use chrono::{Datelike, Weekday};
use mxchart_core::{
    grid::DateGrid,
    order::{chart_rows, order_tasks, ChartRow},
    ChartRequest, RenderError, Renderer,
};

use crate::layout::{layout_task, RowCell, TaskLayout};

/// HTML timeline renderer configuration
#[derive(Clone, Debug)]
pub struct HtmlTimelineRenderer {
    /// Document title, shown above the chart
    pub title: String,
    /// Width of one day column in pixels
    pub column_width: u32,
    /// Width of the component label column in pixels
    pub component_width: u32,
    /// Width of the warning/notes label column in pixels
    pub warning_width: u32,
    /// Height per body row in pixels
    pub row_height: u32,
    /// Padding around the chart
    pub padding: u32,
    /// Theme (light or dark)
    pub theme: TimelineTheme,
    /// Show the colour legend under the chart
    pub show_legend: bool,
}

/// Color theme for the timeline
#[derive(Clone, Debug)]
pub struct TimelineTheme {
    pub background_color: String,
    pub text_color: String,
    pub grid_color: String,
    pub header_bg: String,
    pub weekend_bg: String,
    pub facility_bg: String,
    pub aircraft_bg: String,
    pub track_color: String,
    pub caution_color: String,
    pub critical_color: String,
    pub progress_color: String,
    pub complete_color: String,
    pub today_color: String,
}

impl Default for TimelineTheme {
    fn default() -> Self {
        Self::light()
    }
}

impl TimelineTheme {
    pub fn light() -> Self {
        Self {
            background_color: "#ffffff".into(),
            text_color: "#2c3e50".into(),
            grid_color: "#ecf0f1".into(),
            header_bg: "#f8f9fa".into(),
            weekend_bg: "#f4f6f7".into(),
            facility_bg: "#d5dbdb".into(),
            aircraft_bg: "#eaeded".into(),
            track_color: "#d6eaf8".into(),
            caution_color: "#f9e79f".into(),
            critical_color: "#f5b7b1".into(),
            progress_color: "#3498db".into(),
            complete_color: "#27ae60".into(),
            today_color: "#E53935".into(),
        }
    }

    pub fn dark() -> Self {
        Self {
            background_color: "#1a1a2e".into(),
            text_color: "#eaeaea".into(),
            grid_color: "#2d2d44".into(),
            header_bg: "#16213e".into(),
            weekend_bg: "#202040".into(),
            facility_bg: "#3a3a5c".into(),
            aircraft_bg: "#2a2a48".into(),
            track_color: "#2e4053".into(),
            caution_color: "#7d6608".into(),
            critical_color: "#922b21".into(),
            progress_color: "#3498db".into(),
            complete_color: "#27ae60".into(),
            today_color: "#E53935".into(),
        }
    }
}

/// An assembled document ready for rasterization
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChartDocument {
    pub html: String,
    /// Estimated rendered width in pixels
    pub width: u32,
    /// Estimated rendered height in pixels
    pub height: u32,
    /// Number of day columns
    pub columns: usize,
    /// Number of body rows (separators included)
    pub rows: usize,
}

impl Default for HtmlTimelineRenderer {
    fn default() -> Self {
        Self {
            title: "Maintenance Timeline".into(),
            column_width: 22,
            component_width: 180,
            warning_width: 140,
            row_height: 28,
            padding: 20,
            theme: TimelineTheme::default(),
            show_legend: true,
        }
    }
}

impl HtmlTimelineRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use dark theme
    pub fn dark_theme(mut self) -> Self {
        self.theme = TimelineTheme::dark();
        self
    }

    /// Set the document title
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Configure day column width
    pub fn column_width(mut self, width: u32) -> Self {
        self.column_width = width;
        self
    }

    /// Configure row height
    pub fn row_height(mut self, height: u32) -> Self {
        self.row_height = height;
        self
    }

    /// Hide the legend
    pub fn hide_legend(mut self) -> Self {
        self.show_legend = false;
        self
    }

    fn title_height(&self) -> u32 {
        40
    }

    fn legend_height(&self) -> u32 {
        if self.show_legend {
            36
        } else {
            0
        }
    }

    /// Estimated pixel extent of the rendered document
    fn document_size(&self, columns: usize, rows: usize) -> (u32, u32) {
        let width = self.padding * 2
            + self.component_width
            + self.warning_width
            + columns as u32 * self.column_width;
        let height = self.padding * 2
            + self.title_height()
            + self.row_height * 2
            + rows as u32 * self.row_height
            + self.legend_height();
        (width, height)
    }

    /// Assemble the document for an already built grid and ordered rows
    pub fn assemble(
        &self,
        grid: &DateGrid,
        rows: &[ChartRow<'_>],
    ) -> Result<ChartDocument, RenderError> {
        let mut body = String::new();
        for row in rows {
            match row {
                ChartRow::Facility { facility } => {
                    body.push_str(&self.render_group_row("facility-row", facility, grid.len()));
                }
                ChartRow::Aircraft { aircraft, .. } => {
                    body.push_str(&self.render_group_row("aircraft-row", aircraft, grid.len()));
                }
                ChartRow::Task(task) => {
                    let layout = layout_task(task, grid)?;
                    body.push_str(&self.render_task_row(&layout, grid));
                }
            }
        }

        let (width, height) = self.document_size(grid.len(), rows.len());
        let html = self.generate_html(grid, &body);

        Ok(ChartDocument {
            html,
            width,
            height,
            columns: grid.len(),
            rows: rows.len(),
        })
    }

    /// Generate the complete HTML document
    fn generate_html(&self, grid: &DateGrid, body: &str) -> String {
        let legend = if self.show_legend {
            self.render_legend()
        } else {
            String::new()
        };

        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>{title}</title>
    <style>
{css}
    </style>
</head>
<body>
    <div class="chart-root" id="chart-root">
        <h1 class="chart-title">{title}</h1>
        <div class="chart-scroll">
            <table class="timeline" id="timeline">
{colgroup}
                <thead>
{header}
                </thead>
                <tbody>
{body}
                </tbody>
            </table>
        </div>
{legend}
    </div>
</body>
</html>"#,
            title = html_escape(&self.title),
            css = self.generate_css(),
            colgroup = self.render_colgroup(grid.len()),
            header = self.render_header(grid),
            body = body,
            legend = legend,
        )
    }

    /// Column widths: two label columns then one per grid day
    fn render_colgroup(&self, columns: usize) -> String {
        let mut html = String::from("                <colgroup>\n");
        html.push_str(&format!(
            "                    <col class=\"col-component\" style=\"width:{}px\">\n",
            self.component_width
        ));
        html.push_str(&format!(
            "                    <col class=\"col-warning\" style=\"width:{}px\">\n",
            self.warning_width
        ));
        for _ in 0..columns {
            html.push_str(&format!(
                "                    <col class=\"col-day\" style=\"width:{}px\">\n",
                self.column_width
            ));
        }
        html.push_str("                </colgroup>");
        html
    }

    /// Month bands over day numbers
    fn render_header(&self, grid: &DateGrid) -> String {
        let mut html = String::new();

        html.push_str("                    <tr class=\"month-row\">\n");
        html.push_str(
            "                        <th class=\"sticky-col col-1 corner\" rowspan=\"2\">Component</th>\n",
        );
        html.push_str(
            "                        <th class=\"sticky-col col-2 corner\" rowspan=\"2\">Warning / Notes</th>\n",
        );
        for band in grid.month_bands() {
            html.push_str(&format!(
                "                        <th class=\"month\" colspan=\"{}\">{}</th>\n",
                band.span,
                html_escape(&band.label)
            ));
        }
        html.push_str("                    </tr>\n");

        html.push_str("                    <tr class=\"day-row\">\n");
        for (column, day) in grid.days().iter().enumerate() {
            let mut classes = vec!["day"];
            if matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
                classes.push("weekend");
            }
            if grid.today_column() == Some(column) {
                classes.push("today");
            }
            html.push_str(&format!(
                "                        <th class=\"{}\" title=\"{}\">{}</th>\n",
                classes.join(" "),
                day.format("%Y-%m-%d"),
                day.day()
            ));
        }
        html.push_str("                    </tr>");
        html
    }

    /// Facility or aircraft separator row
    fn render_group_row(&self, class: &str, label: &str, columns: usize) -> String {
        let label = if label.trim().is_empty() {
            "Unassigned".to_string()
        } else {
            html_escape(label.trim())
        };
        format!(
            "                    <tr class=\"group-row {class}\"><td class=\"sticky-col col-1 group-label\" colspan=\"2\">{label}</td><td class=\"group-fill\" colspan=\"{columns}\"></td></tr>\n",
        )
    }

    /// A task row: two label cells, empty day cells and one merged bar cell
    fn render_task_row(&self, layout: &TaskLayout<'_>, grid: &DateGrid) -> String {
        let task = layout.task;
        let severity = layout.severity().css_class().unwrap_or("sev-none");

        // ~7px per char at 12px font
        let max_chars = (self.component_width.saturating_sub(16) / 7) as usize;
        let mut html = format!(
            "                    <tr class=\"task-row {severity}\"><td class=\"sticky-col col-1 label component\" title=\"{full}\">{component}</td><td class=\"sticky-col col-2 label warning {severity}\">{warning}</td>",
            full = html_escape(&task.component_group),
            component = html_escape(&truncate(&task.component_group, max_chars.max(10))),
            warning = html_escape(task.display_warning()),
        );

        for cell in layout.cells() {
            match cell {
                RowCell::Empty { column, today } => {
                    let weekend = grid
                        .days()
                        .get(column)
                        .is_some_and(|d| matches!(d.weekday(), Weekday::Sat | Weekday::Sun));
                    let mut classes = vec!["day"];
                    if weekend {
                        classes.push("weekend");
                    }
                    if today {
                        classes.push("today");
                    }
                    html.push_str(&format!("<td class=\"{}\"></td>", classes.join(" ")));
                }
                RowCell::Bar { span, today } => {
                    html.push_str(&format!(
                        "<td class=\"bar-cell{today}\" colspan=\"{columns}\"><div class=\"bar-track {severity}\" title=\"{tip}\"><div class=\"bar-fill {completion}\" style=\"width: {fill:.1}%\"></div><span class=\"bar-label\">{label}</span></div></td>",
                        today = if today { " today" } else { "" },
                        columns = span.columns,
                        tip = html_escape(&format!(
                            "{}: {} to {}",
                            task.component_group, task.start, task.end
                        )),
                        completion = layout.completion.css_class(),
                        fill = layout.fill_percent,
                        label = layout.label,
                    ));
                }
            }
        }

        html.push_str("</tr>\n");
        html
    }

    fn render_legend(&self) -> String {
        r#"        <div class="legend">
            <span class="legend-item"><span class="legend-box sev-caution"></span>Caution</span>
            <span class="legend-item"><span class="legend-box sev-critical"></span>Work stoppage</span>
            <span class="legend-item"><span class="legend-box in-progress"></span>In progress</span>
            <span class="legend-item"><span class="legend-box complete"></span>Complete</span>
            <span class="legend-item"><span class="legend-box today-box"></span>Today</span>
        </div>"#
            .to_string()
    }

    /// Generate CSS styles
    fn generate_css(&self) -> String {
        format!(
            r#"        :root {{
            --bg-color: {bg};
            --text-color: {text};
            --grid-color: {grid};
            --header-bg: {header};
            --weekend-bg: {weekend};
            --facility-bg: {facility};
            --aircraft-bg: {aircraft};
            --track-color: {track};
            --caution-color: {caution};
            --critical-color: {critical};
            --progress-color: {progress};
            --complete-color: {complete};
            --today-color: {today};
            --row-height: {row_height}px;
        }}
        * {{ margin: 0; padding: 0; box-sizing: border-box; }}
        body {{
            font-family: system-ui, -apple-system, sans-serif;
            background: var(--bg-color);
            color: var(--text-color);
        }}
        .chart-root {{
            display: inline-block;
            padding: {padding}px;
            background: var(--bg-color);
        }}
        .chart-title {{
            font-size: 1.4rem;
            font-weight: 600;
            height: {title_height}px;
        }}
        .chart-scroll {{
            overflow-x: auto;
        }}
        table.timeline {{
            border-collapse: separate;
            border-spacing: 0;
            table-layout: fixed;
            font-size: 12px;
        }}
        .timeline th, .timeline td {{
            height: var(--row-height);
            border-right: 1px solid var(--grid-color);
            border-bottom: 1px solid var(--grid-color);
            white-space: nowrap;
            overflow: hidden;
        }}
        .timeline thead th {{
            position: sticky;
            top: 0;
            z-index: 2;
            background: var(--header-bg);
            font-weight: 600;
            text-align: center;
        }}
        .timeline thead tr.day-row th {{
            top: var(--row-height);
            font-weight: 400;
            font-size: 11px;
        }}
        .sticky-col {{
            position: sticky;
            z-index: 1;
            background: var(--bg-color);
            text-align: left;
            padding: 0 8px;
        }}
        .col-1 {{ left: 0; }}
        .col-2 {{ left: {component_width}px; }}
        .timeline thead th.corner {{
            z-index: 3;
            text-align: left;
            padding: 0 8px;
        }}
        .day.weekend {{ background: var(--weekend-bg); }}
        .timeline thead th.day.weekend {{ background: var(--weekend-bg); }}
        .day.today, .bar-cell.today {{
            box-shadow: inset 2px 0 0 var(--today-color);
        }}
        .timeline thead th.day.today {{
            color: #ffffff;
            background: var(--today-color);
        }}
        .group-row td {{ font-weight: 600; }}
        .facility-row td {{ background: var(--facility-bg); }}
        .aircraft-row td {{ background: var(--aircraft-bg); }}
        .aircraft-row .group-label {{ padding-left: 20px; }}
        .label.warning.sev-caution {{ color: #9a7d0a; }}
        .label.warning.sev-critical {{ color: #c0392b; font-weight: 600; }}
        .bar-cell {{ padding: 4px 1px; }}
        .bar-track {{
            position: relative;
            height: 100%;
            border-radius: 3px;
            background: var(--track-color);
            overflow: hidden;
        }}
        .bar-track.sev-caution {{ background: var(--caution-color); }}
        .bar-track.sev-critical {{ background: var(--critical-color); }}
        .bar-fill {{
            position: absolute;
            top: 0;
            left: 0;
            bottom: 0;
            max-width: 100%;
        }}
        .bar-fill.in-progress {{ background: var(--progress-color); opacity: 0.75; }}
        .bar-fill.complete {{ background: var(--complete-color); }}
        .bar-label {{
            position: absolute;
            inset: 0;
            display: flex;
            align-items: center;
            justify-content: center;
            font-size: 11px;
            font-weight: 600;
        }}
        .legend {{
            display: flex;
            gap: 24px;
            margin-top: 12px;
            font-size: 13px;
        }}
        .legend-item {{
            display: flex;
            align-items: center;
            gap: 6px;
        }}
        .legend-box {{
            width: 16px;
            height: 12px;
            border-radius: 2px;
        }}
        .legend-box.sev-caution {{ background: var(--caution-color); }}
        .legend-box.sev-critical {{ background: var(--critical-color); }}
        .legend-box.in-progress {{ background: var(--progress-color); }}
        .legend-box.complete {{ background: var(--complete-color); }}
        .legend-box.today-box {{ background: var(--today-color); }}"#,
            bg = self.theme.background_color,
            text = self.theme.text_color,
            grid = self.theme.grid_color,
            header = self.theme.header_bg,
            weekend = self.theme.weekend_bg,
            facility = self.theme.facility_bg,
            aircraft = self.theme.aircraft_bg,
            track = self.theme.track_color,
            caution = self.theme.caution_color,
            critical = self.theme.critical_color,
            progress = self.theme.progress_color,
            complete = self.theme.complete_color,
            today = self.theme.today_color,
            row_height = self.row_height,
            padding = self.padding,
            title_height = self.title_height(),
            component_width = self.component_width,
        )
    }
}

impl Renderer for HtmlTimelineRenderer {
    type Output = ChartDocument;

    fn render(&self, request: &ChartRequest) -> Result<ChartDocument, RenderError> {
        let grid = DateGrid::build(&request.tasks, request.today)?;
        let ordered = order_tasks(&request.tasks);
        let rows = chart_rows(&ordered);
        let document = self.assemble(&grid, &rows)?;
        tracing::debug!(
            lower = %grid.lower_bound(),
            upper = %grid.upper_bound(),
            columns = document.columns,
            rows = document.rows,
            "assembled timeline document"
        );
        Ok(document)
    }
}

/// HTML-escape a string
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Truncate a string with ellipsis
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        format!(
            "{}…",
            s.chars().take(max.saturating_sub(1)).collect::<String>()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use mxchart_core::{GridError, MaintenanceTask};

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn create_test_request() -> ChartRequest {
        ChartRequest::new(
            vec![
                MaintenanceTask::new("Wheel", "N100", "FacilityA", date(2025, 1, 1), date(2025, 1, 10))
                    .warning("N/A")
                    .percent_complete(0.5),
                MaintenanceTask::new("Brake", "N200", "FacilityA", date(2025, 1, 3), date(2025, 1, 6))
                    .warning("Caution")
                    .percent_complete(1.0),
                MaintenanceTask::new("Engine", "N300", "FacilityB", date(2025, 1, 2), date(2025, 1, 20))
                    .warning("WorkStoppage"),
            ],
            date(2025, 1, 5),
        )
    }

    #[test]
    fn html_timeline_renderer_creation() {
        let renderer = HtmlTimelineRenderer::new();
        assert_eq!(renderer.column_width, 22);
        assert_eq!(renderer.row_height, 28);
        assert!(renderer.show_legend);
    }

    #[test]
    fn html_timeline_with_dark_theme() {
        let renderer = HtmlTimelineRenderer::new().dark_theme();
        assert_eq!(renderer.theme.background_color, "#1a1a2e");
    }

    #[test]
    fn produces_valid_html() {
        let doc = HtmlTimelineRenderer::new()
            .title("Fleet <Check>")
            .render(&create_test_request())
            .unwrap();

        assert!(doc.html.starts_with("<!DOCTYPE html>"));
        assert!(doc.html.contains("</html>"));
        assert!(doc.html.contains("Fleet &lt;Check&gt;"));
        assert!(doc.html.contains("<table class=\"timeline\""));
        assert!(doc.html.contains(">Component</th>"));
        assert!(doc.html.contains(">Warning / Notes</th>"));
    }

    #[test]
    fn colgroup_has_one_column_per_day() {
        let doc = HtmlTimelineRenderer::new().render(&create_test_request()).unwrap();
        assert_eq!(doc.html.matches("class=\"col-day\"").count(), doc.columns);
        assert_eq!(doc.html.matches("class=\"col-component\"").count(), 1);
        assert_eq!(doc.html.matches("class=\"col-warning\"").count(), 1);
    }

    #[test]
    fn body_rows_include_separators() {
        let doc = HtmlTimelineRenderer::new().render(&create_test_request()).unwrap();
        // 2 facilities + 3 aircraft + 3 tasks
        assert_eq!(doc.rows, 8);
        assert_eq!(doc.html.matches("group-row facility-row").count(), 2);
        assert_eq!(doc.html.matches("group-row aircraft-row").count(), 3);
        assert_eq!(doc.html.matches("<tr class=\"task-row").count(), 3);
    }

    #[test]
    fn severity_and_completion_classes() {
        let doc = HtmlTimelineRenderer::new().render(&create_test_request()).unwrap();
        assert!(doc.html.contains("bar-track sev-none"));
        assert!(doc.html.contains("bar-track sev-caution"));
        assert!(doc.html.contains("bar-track sev-critical"));
        assert!(doc.html.contains("bar-fill complete\" style=\"width: 100.0%\""));
        assert!(doc.html.contains("bar-fill in-progress\" style=\"width: 50.0%\""));
        assert!(doc.html.contains(">50.0%</span>"));
    }

    #[test]
    fn today_header_is_marked() {
        let doc = HtmlTimelineRenderer::new().render(&create_test_request()).unwrap();
        assert!(doc.html.contains("title=\"2025-01-05\">5</th>"));
        assert_eq!(doc.html.matches("class=\"day today\" title=").count()
            + doc.html.matches("class=\"day weekend today\" title=").count(), 1);
    }

    #[test]
    fn legend_toggle() {
        let shown = HtmlTimelineRenderer::new().render(&create_test_request()).unwrap();
        let hidden = HtmlTimelineRenderer::new()
            .hide_legend()
            .render(&create_test_request())
            .unwrap();
        assert!(shown.html.contains("class=\"legend\""));
        assert!(!hidden.html.contains("class=\"legend\""));
        assert!(hidden.height < shown.height);
    }

    #[test]
    fn document_size_tracks_columns_and_rows() {
        let renderer = HtmlTimelineRenderer::new();
        let doc = renderer.render(&create_test_request()).unwrap();
        let expected_width = 40 + 180 + 140 + doc.columns as u32 * 22;
        assert_eq!(doc.width, expected_width);
        assert_eq!(doc.height, 40 + 40 + 56 + 8 * 28 + 36);
    }

    #[test]
    fn empty_request_fails() {
        let result = HtmlTimelineRenderer::new().render(&ChartRequest::new(vec![], date(2025, 1, 1)));
        assert!(matches!(result, Err(RenderError::Grid(GridError::NoTasks))));
    }

    #[test]
    fn blank_group_names_render_as_unassigned() {
        let request = ChartRequest::new(
            vec![MaintenanceTask::new("Wheel", "", "", date(2025, 1, 1), date(2025, 1, 2))],
            date(2025, 1, 1),
        );
        let doc = HtmlTimelineRenderer::new().render(&request).unwrap();
        assert_eq!(doc.html.matches(">Unassigned</td>").count(), 2);
    }

    #[test]
    fn html_escape_works() {
        assert_eq!(html_escape("<script>"), "&lt;script&gt;");
        assert_eq!(html_escape("a & b"), "a &amp; b");
    }

    #[test]
    fn truncate_works() {
        assert_eq!(truncate("Short", 20), "Short");
        assert_eq!(truncate("This is a very long name", 10), "This is a…");
    }
}
