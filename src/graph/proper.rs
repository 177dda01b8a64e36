use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use super::layered::LayeredGraph;
use super::vertex::{ConnectorId, PathId, Vertex, VertexId};

/// One external connector, expressed as the chain
/// `source → interim… → target` where `source` is the child endpoint and
/// `target` the parent endpoint. Interim vertices are dummies ordered from
/// the source side; the chain spans exactly one layer per hop.
#[derive(Debug, Clone)]
pub struct Path {
    pub connector: ConnectorId,
    pub source: VertexId,
    pub target: VertexId,
    pub interim: Vec<VertexId>,
}

impl Path {
    /// Number of graph edges composing the path.
    pub fn len(&self) -> usize {
        self.interim.len() + 1
    }

    /// `[source, interim…, target]`.
    pub fn chain(&self) -> Vec<VertexId> {
        let mut chain = Vec::with_capacity(self.interim.len() + 2);
        chain.push(self.source);
        chain.extend_from_slice(&self.interim);
        chain.push(self.target);
        chain
    }
}

/// What a topology mutation did to the layer assignment, for the relative
/// layout to reconcile: `relocated` vertices need (re)placement, `removed`
/// dummies must be dropped from their layers.
#[derive(Debug, Default)]
pub struct TopologyChange {
    pub relocated: BTreeSet<VertexId>,
    pub removed: Vec<VertexId>,
}

impl TopologyChange {
    fn merge(&mut self, other: TopologyChange) {
        self.relocated.extend(other.relocated);
        self.removed.extend(other.removed);
    }
}

/// Wraps the layered graph and keeps every path quasi-proper: whenever a
/// path's endpoints end up more than one layer apart, the gap is bridged
/// with one dummy vertex per intermediate layer; when layers shift back,
/// the dummies are merged away again. Ranking only ever sees the direct
/// endpoint edges, so dummy surgery never feeds back into layer indices.
#[derive(Debug, Default)]
pub struct ProperLayoutGraph {
    graph: LayeredGraph,
    paths: BTreeMap<PathId, Path>,
    /// Parallel connectors share one ranking edge; refcounted so the edge
    /// disappears only with the last path using it.
    edge_refs: BTreeMap<(VertexId, VertexId), usize>,
    next_path: u32,
}

impl ProperLayoutGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn graph(&self) -> &LayeredGraph {
        &self.graph
    }

    pub fn add_vertex(&mut self, vertex: Vertex) -> VertexId {
        self.graph.add_vertex(vertex)
    }

    /// Removes an original vertex. All paths touching it must have been
    /// removed first (enforced by the calculator's contract checks).
    pub fn remove_vertex(&mut self, id: VertexId) -> Vertex {
        assert!(
            !self.paths.values().any(|p| p.source == id || p.target == id),
            "vertex removed while paths still reference it"
        );
        self.graph.remove_vertex(id)
    }

    pub fn vertex(&self, id: VertexId) -> &Vertex {
        self.graph.vertex(id)
    }

    pub fn vertex_mut(&mut self, id: VertexId) -> &mut Vertex {
        self.graph.vertex_mut(id)
    }

    pub fn path(&self, id: PathId) -> &Path {
        &self.paths[&id]
    }

    pub fn path_ids(&self) -> impl Iterator<Item = PathId> + '_ {
        self.paths.keys().copied()
    }

    pub fn paths(&self) -> impl Iterator<Item = (PathId, &Path)> {
        self.paths.iter().map(|(&id, p)| (id, p))
    }

    /// True when the vertex participates in at least one path.
    pub fn is_connected(&self, id: VertexId) -> bool {
        self.graph.vertex(id).is_dummy()
            || self
                .paths
                .values()
                .any(|p| p.source == id || p.target == id)
    }

    pub fn add_path(
        &mut self,
        connector: ConnectorId,
        source: VertexId,
        target: VertexId,
    ) -> (PathId, TopologyChange) {
        let id = PathId(self.next_path);
        self.next_path += 1;
        let mut relocated = BTreeSet::new();
        let refs = self.edge_refs.entry((source, target)).or_insert(0);
        *refs += 1;
        if *refs == 1 {
            relocated.extend(self.graph.add_edge(source, target));
        }
        self.paths.insert(
            id,
            Path {
                connector,
                source,
                target,
                interim: Vec::new(),
            },
        );
        let mut change = self.normalize(&relocated);
        // The new path itself always needs a pass, even when no layer moved.
        change.merge(self.normalize_path(id));
        change.relocated.extend(relocated);
        (id, change)
    }

    pub fn remove_path(&mut self, id: PathId) -> (Path, TopologyChange) {
        let mut path = self
            .paths
            .remove(&id)
            .unwrap_or_else(|| panic!("path {id:?} not present"));
        let mut change = TopologyChange::default();
        for dummy in path.interim.drain(..) {
            self.graph.remove_vertex(dummy);
            change.removed.push(dummy);
        }
        let refs = self.edge_refs.get_mut(&(path.source, path.target)).unwrap();
        *refs -= 1;
        let mut relocated = BTreeSet::new();
        if *refs == 0 {
            self.edge_refs.remove(&(path.source, path.target));
            relocated.extend(self.graph.remove_edge(path.source, path.target));
        }
        change.merge(self.normalize(&relocated));
        change.relocated.extend(relocated);
        (path, change)
    }

    /// Layer span of a path from child endpoint down to parent endpoint.
    /// 0 or negative for back-edge paths, which stay chainless.
    fn span(&self, path: &Path) -> isize {
        self.graph.layer_index(path.source) as isize - self.graph.layer_index(path.target) as isize
    }

    /// Re-establishes the one-layer-span shape for every path whose
    /// endpoint layers moved: splits where the span grew, merges where it
    /// shrank, and re-pins surviving dummy layers in between.
    fn normalize(&mut self, relocated: &BTreeSet<VertexId>) -> TopologyChange {
        let affected: Vec<PathId> = self
            .paths
            .iter()
            .filter(|(_, p)| relocated.contains(&p.source) || relocated.contains(&p.target))
            .map(|(&id, _)| id)
            .collect();
        let mut change = TopologyChange::default();
        for id in affected {
            change.merge(self.normalize_path(id));
        }
        change
    }

    fn normalize_path(&mut self, id: PathId) -> TopologyChange {
        let mut change = TopologyChange::default();
        let path = &self.paths[&id];
        let span = self.span(path);
        let wanted = (span - 1).max(0) as usize;
        let target_layer = self.graph.layer_index(path.target);

        let mut interim = path.interim.clone();
        if interim.len() != wanted {
            debug!(?id, have = interim.len(), want = wanted, "re-splitting path");
        }
        while interim.len() > wanted {
            let dummy = interim.pop().unwrap();
            self.graph.remove_vertex(dummy);
            change.removed.push(dummy);
        }
        while interim.len() < wanted {
            let dummy = self.graph.add_vertex(Vertex::dummy(id));
            interim.push(dummy);
        }
        // interim[i] sits i+1 layers above the source, i.e. at
        // target_layer + wanted - i; re-pin every survivor that drifted.
        for (i, &dummy) in interim.iter().enumerate() {
            let layer = target_layer + wanted - i;
            if self.graph.layer_index(dummy) != layer {
                self.graph.set_dummy_layer(dummy, layer);
                change.relocated.insert(dummy);
            }
        }
        self.paths.get_mut(&id).unwrap().interim = interim;
        self.assert_proper(id);
        change
    }

    /// Contiguous-chain invariant: consecutive chain vertices of a ranking
    /// path differ by exactly one layer.
    fn assert_proper(&self, id: PathId) {
        let path = &self.paths[&id];
        if self.span(path) < 1 {
            return; // back-edge path, exempt from the spanning invariant
        }
        let chain = path.chain();
        for pair in chain.windows(2) {
            let upper = self.graph.layer_index(pair[1]);
            let lower = self.graph.layer_index(pair[0]);
            assert!(
                lower == upper + 1,
                "path {id:?} is not quasi-proper: {:?} at {lower}, {:?} at {upper}",
                pair[0],
                pair[1],
            );
        }
    }

    /// Every one-layer hop of every ranking path, as (child, parent) pairs.
    /// This is the adjacency the alignment sweep runs on.
    pub fn proper_edges(&self) -> Vec<(VertexId, VertexId)> {
        let mut edges = Vec::new();
        for path in self.paths.values() {
            if self.span(path) < 1 {
                continue;
            }
            let chain = path.chain();
            for pair in chain.windows(2) {
                edges.push((pair[0], pair[1]));
            }
        }
        edges
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Size;
    use crate::graph::vertex::NodeId;

    struct Fixture {
        g: ProperLayoutGraph,
        next_node: u64,
        next_conn: u64,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                g: ProperLayoutGraph::new(),
                next_node: 0,
                next_conn: 0,
            }
        }

        fn vertex(&mut self, name: &str) -> VertexId {
            self.next_node += 1;
            self.g.add_vertex(Vertex::original(
                NodeId(self.next_node),
                name,
                Size::new(10.0, 10.0),
                0,
            ))
        }

        fn connect(&mut self, source: VertexId, target: VertexId) -> PathId {
            self.next_conn += 1;
            self.g.add_path(ConnectorId(self.next_conn), source, target).0
        }
    }

    #[test]
    fn direct_edge_stays_chainless() {
        let mut f = Fixture::new();
        let p = f.vertex("P");
        let c = f.vertex("C");
        let path = f.connect(c, p);
        assert_eq!(f.g.path(path).len(), 1);
        assert!(f.g.path(path).interim.is_empty());
    }

    #[test]
    fn multi_layer_span_gets_one_dummy_per_layer() {
        let mut f = Fixture::new();
        let a = f.vertex("A");
        let b = f.vertex("B");
        let c = f.vertex("C");
        let d = f.vertex("D");
        f.connect(b, a); // b at 1
        f.connect(c, b); // c at 2
        f.connect(d, c); // d at 3
        let long = f.connect(d, a); // spans 3 layers
        let path = f.g.path(long);
        assert_eq!(path.len(), 3);
        assert_eq!(path.interim.len(), 2);
        assert_eq!(f.g.graph().layer_index(path.interim[0]), 2);
        assert_eq!(f.g.graph().layer_index(path.interim[1]), 1);
    }

    #[test]
    fn split_then_merge_round_trip() {
        // Build P1<-C and P2<-I1<-I2<-C, then pull P1 down next to C.
        let mut f = Fixture::new();
        let p1 = f.vertex("P1");
        let p2 = f.vertex("P2");
        let i1 = f.vertex("I1");
        let i2 = f.vertex("I2");
        let c = f.vertex("C");
        f.connect(i1, p2);
        f.connect(i2, i1);
        f.connect(c, i2); // c at layer 3
        let long = f.connect(c, p1); // P1 at 0, so length 3 with 2 dummies
        assert_eq!(f.g.path(long).len(), 3);

        // I1<-P1: P1 re-ranks to layer 2, span collapses to 1.
        f.connect(p1, i1);
        assert_eq!(f.g.path(long).len(), 1);
        assert!(f.g.path(long).interim.is_empty());
    }

    #[test]
    fn merge_then_resplit_restores_length() {
        let mut f = Fixture::new();
        let a = f.vertex("A");
        let b = f.vertex("B");
        let c = f.vertex("C");
        f.connect(b, a);
        let cb = f.connect(c, b); // c at 2
        let ca = f.connect(c, a); // spans 2: one dummy
        assert_eq!(f.g.path(ca).len(), 2);
        let (_, _) = f.g.remove_path(cb); // c re-ranks to 1
        assert_eq!(f.g.path(ca).len(), 1);
        let cb2 = f.connect(c, b); // back to 2
        assert_eq!(f.g.path(cb2).len(), 1);
        assert_eq!(f.g.path(ca).len(), 2);
    }

    #[test]
    fn remove_path_drops_its_dummies() {
        let mut f = Fixture::new();
        let a = f.vertex("A");
        let b = f.vertex("B");
        let c = f.vertex("C");
        f.connect(b, a);
        f.connect(c, b);
        let long = f.connect(c, a);
        let dummies = f.g.path(long).interim.clone();
        assert_eq!(dummies.len(), 1);
        let (_, change) = f.g.remove_path(long);
        assert_eq!(change.removed, dummies);
        assert!(!f.g.graph().contains(dummies[0]));
    }

    #[test]
    fn parallel_connectors_share_the_ranking_edge() {
        let mut f = Fixture::new();
        let p = f.vertex("P");
        let c = f.vertex("C");
        let first = f.connect(c, p);
        let second = f.connect(c, p);
        assert_eq!(f.g.graph().layer_index(c), 1);
        f.g.remove_path(first);
        // Second connector still holds c below p.
        assert_eq!(f.g.graph().layer_index(c), 1);
        f.g.remove_path(second);
        assert_eq!(f.g.graph().layer_index(c), 0);
    }

    #[test]
    fn proper_edges_cover_every_hop() {
        let mut f = Fixture::new();
        let a = f.vertex("A");
        let b = f.vertex("B");
        let c = f.vertex("C");
        f.connect(b, a);
        f.connect(c, b);
        let long = f.connect(c, a);
        let dummy = f.g.path(long).interim[0];
        let edges = f.g.proper_edges();
        assert!(edges.contains(&(c, dummy)));
        assert!(edges.contains(&(dummy, a)));
        assert_eq!(edges.len(), 4);
    }
}
