//! # mxchart-render
//!
//! Rendering backends for mxchart maintenance timelines.
//!
//! This crate provides:
//! - Span layout of tasks onto the sampled date grid
//! - Standalone HTML timeline documents (pinned labels, two-row header,
//!   facility/aircraft separators, severity bars)
//! - PNG rasterization through headless Chrome
//!
//! ## Example
//!
//! ```rust,ignore
//! use mxchart_core::{ChartRequest, Renderer};
//! use mxchart_render::{ChromeRasterizer, Deadline, HtmlTimelineRenderer, Rasterizer};
//!
//! let document = HtmlTimelineRenderer::new().render(&request)?;
//! let deadline = Deadline::after(Duration::from_secs(30));
//! let png = ChromeRasterizer::new().no_sandbox().rasterize(&document, deadline)?;
//! std::fs::write("timeline.png", png)?;
//! ```

pub mod document;
pub mod layout;
pub mod raster;

pub use document::{ChartDocument, HtmlTimelineRenderer, TimelineTheme};
pub use layout::{layout_task, percent_label, BarSpan, Completion, RowCell, TaskLayout};
pub use raster::{ChromeRasterizer, Deadline, RasterError, Rasterizer};
