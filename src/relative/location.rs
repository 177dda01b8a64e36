use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::graph::proper::ProperLayoutGraph;
use crate::graph::vertex::VertexId;

use super::compare::{cmp_in_layer, ordering_key};

/// Where a vertex should go: its layer index (owned by the layered graph's
/// ranking) and the index within that layer that keeps siblings contiguous
/// and parent/child edges from crossing pre-existing ones.
pub(crate) fn target_location(
    graph: &ProperLayoutGraph,
    layers: &[Vec<VertexId>],
    vertex: VertexId,
) -> (usize, usize) {
    let layer = graph.graph().layer_index(vertex);
    let occupants: &[VertexId] = layers.get(layer).map_or(&[], Vec::as_slice);

    // Chain neighbors one layer above, per vertex: for an original, the
    // first chain element of each outgoing path; for a dummy, the next
    // chain element of the path it bridges.
    let mut uppers_of: BTreeMap<VertexId, Vec<VertexId>> = BTreeMap::new();
    for (child, parent) in graph.proper_edges() {
        uppers_of.entry(child).or_default().push(parent);
    }
    let no_uppers = Vec::new();
    let uppers = uppers_of.get(&vertex).unwrap_or(&no_uppers);

    if uppers.is_empty() {
        // Parentless vertices append after whatever the layer already holds.
        return (layer, occupants.len());
    }

    let placed_siblings: Vec<usize> = occupants
        .iter()
        .enumerate()
        .filter(|&(_, &w)| {
            w != vertex
                && uppers_of
                    .get(&w)
                    .is_some_and(|ws| ws.iter().any(|n| uppers.contains(n)))
        })
        .map(|(i, _)| i)
        .collect();
    if !placed_siblings.is_empty() {
        // Stay contiguous with the siblings, in comparer order among them.
        for &i in &placed_siblings {
            if cmp_in_layer(graph, vertex, occupants[i]) == Ordering::Less {
                return (layer, i);
            }
        }
        return (layer, placed_siblings.last().unwrap() + 1);
    }

    // First child of its parents in this layer: slot in by the parents'
    // position so the new edge cannot cross an existing parent/child pair.
    let anchor = parent_anchor(graph, layers, uppers);
    let key = ordering_key(graph, vertex);
    let mut index = 0;
    for &w in occupants {
        let w_anchor =
            parent_anchor(graph, layers, uppers_of.get(&w).unwrap_or(&no_uppers));
        match w_anchor.cmp(&anchor) {
            Ordering::Less => index += 1,
            Ordering::Equal => {
                if ordering_key(graph, w) < key {
                    index += 1;
                }
            }
            Ordering::Greater => break,
        }
    }
    (layer, index)
}

/// The leftmost position among a vertex's upper neighbors, or `usize::MAX`
/// for parentless vertices so they sort after every connected one.
fn parent_anchor(
    graph: &ProperLayoutGraph,
    layers: &[Vec<VertexId>],
    uppers: &[VertexId],
) -> usize {
    uppers
        .iter()
        .filter_map(|&p| {
            let layer = graph.graph().layer_index(p);
            layers
                .get(layer)
                .and_then(|l| l.iter().position(|&w| w == p))
        })
        .min()
        .unwrap_or(usize::MAX)
}
