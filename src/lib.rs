//! Incremental layered layout for node-link diagrams.
//!
//! Diagram mutations go in, minimal layout actions come out: nodes keep
//! their relative order across edits, connectors are routed through the
//! layer structure, and only shapes that actually moved are reported.

pub mod absolute;
pub mod config;
pub mod dump;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod graph;
pub mod incremental;
pub mod relative;

pub use config::{LayoutConfig, SweepCombineMode, SweepDirection};
pub use dump::write_layout_dump;
pub use engine::{IncrementalLayoutEngine, LayoutActionSink, coalesce_actions};
pub use error::LayoutError;
pub use geometry::{Point, Rect, Route, Size};
pub use graph::{ConnectorId, NodeId};
pub use incremental::{DiagramMutation, IncrementalLayoutCalculator, LayoutAction};
