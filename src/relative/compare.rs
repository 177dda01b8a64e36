use std::cmp::Ordering;

use crate::graph::proper::ProperLayoutGraph;
use crate::graph::vertex::{VertexId, VertexKind};

/// Total order over vertices sharing a layer. Originals compare by display
/// name, then layout priority; a dummy inherits the key of the original
/// child endpoint of the path it bridges, so it sorts where the connector
/// it stands in for would. The vertex id is the final tie-break, which
/// keeps the order total and reproducible across runs.
pub(crate) fn ordering_key(graph: &ProperLayoutGraph, id: VertexId) -> (String, i32, VertexId) {
    let vertex = graph.vertex(id);
    match &vertex.kind {
        VertexKind::Original { name, .. } => (name.clone(), vertex.priority, id),
        VertexKind::Dummy { path } => {
            let source = graph.path(*path).source;
            let origin = graph.vertex(source);
            (
                origin.name().unwrap_or_default().to_string(),
                origin.priority,
                id,
            )
        }
    }
}

pub(crate) fn cmp_in_layer(graph: &ProperLayoutGraph, a: VertexId, b: VertexId) -> Ordering {
    ordering_key(graph, a).cmp(&ordering_key(graph, b))
}
