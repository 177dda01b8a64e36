use std::collections::BTreeMap;

use crate::graph::vertex::VertexId;

/// Per-block placement state, keyed by block root. Blocks are the chains
/// produced by the alignment pass; classes of blocks that must move as one
/// share a sink, whose accumulated shift is applied at the end.
struct Placement<'a> {
    pos: &'a BTreeMap<VertexId, usize>,
    predecessor: BTreeMap<VertexId, VertexId>,
    root: &'a BTreeMap<VertexId, VertexId>,
    align: &'a BTreeMap<VertexId, VertexId>,
    widths: &'a BTreeMap<VertexId, f64>,
    gap: f64,
    sink: BTreeMap<VertexId, VertexId>,
    shift: BTreeMap<VertexId, f64>,
    x: BTreeMap<VertexId, f64>,
}

/// Horizontal compaction: packs every block as far left as its already-
/// placed predecessor blocks allow, with separation of half-widths plus
/// the gap. Returns a center x per vertex.
pub(super) fn compact_blocks(
    work: &[Vec<VertexId>],
    pos: &BTreeMap<VertexId, usize>,
    root: &BTreeMap<VertexId, VertexId>,
    align: &BTreeMap<VertexId, VertexId>,
    widths: &BTreeMap<VertexId, f64>,
    gap: f64,
) -> BTreeMap<VertexId, f64> {
    let mut predecessor = BTreeMap::new();
    for layer in work {
        for pair in layer.windows(2) {
            predecessor.insert(pair[1], pair[0]);
        }
    }
    let mut state = Placement {
        pos,
        predecessor,
        root,
        align,
        widths,
        gap,
        sink: BTreeMap::new(),
        shift: BTreeMap::new(),
        x: BTreeMap::new(),
    };
    for layer in work {
        for &v in layer {
            state.sink.insert(v, v);
            state.shift.insert(v, f64::INFINITY);
        }
    }

    for layer in work {
        for &v in layer {
            if root[&v] == v {
                state.place_block(v);
            }
        }
    }

    let mut result = BTreeMap::new();
    for layer in work {
        for &v in layer {
            let r = root[&v];
            let mut coord = state.x[&r];
            let shift = state.shift[&state.sink[&r]];
            if shift < f64::INFINITY {
                coord += shift;
            }
            result.insert(v, coord);
        }
    }
    result
}

impl Placement<'_> {
    fn place_block(&mut self, block: VertexId) {
        if self.x.contains_key(&block) {
            return;
        }
        self.x.insert(block, 0.0);
        let mut w = block;
        loop {
            if self.pos[&w] > 0 {
                let pred = self.predecessor[&w];
                let pred_block = self.root[&pred];
                self.place_block(pred_block);
                if self.sink[&block] == block {
                    let s = self.sink[&pred_block];
                    self.sink.insert(block, s);
                }
                let separation = (self.widths[&pred] + self.widths[&w]) / 2.0 + self.gap;
                if self.sink[&block] != self.sink[&pred_block] {
                    // Different classes: record how far the other class may
                    // still shift right without violating this separation.
                    let sink = self.sink[&pred_block];
                    let candidate = self.x[&block] - self.x[&pred_block] - separation;
                    let entry = self.shift.get_mut(&sink).unwrap();
                    *entry = entry.min(candidate);
                } else {
                    let candidate = self.x[&pred_block] + separation;
                    let entry = self.x.get_mut(&block).unwrap();
                    *entry = entry.max(candidate);
                }
            }
            w = self.align[&w];
            if w == block {
                break;
            }
        }
    }
}
