pub mod layered;
pub mod proper;
pub mod vertex;

pub use layered::LayeredGraph;
pub use proper::{Path, ProperLayoutGraph, TopologyChange};
pub use vertex::{ConnectorId, NodeId, PathId, Vertex, VertexId};
