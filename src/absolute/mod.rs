mod align;
mod compact;
mod route;

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::debug;

use crate::config::{LayoutConfig, SweepCombineMode, SweepDirection};
use crate::geometry::{Point, Route};
use crate::graph::vertex::{PathId, VertexId};
use crate::relative::RelativeLayout;

use align::sweep_positions;
use route::route_path;

/// One complete absolute layout: a center per vertex (dummies included)
/// and a route per path. Produced fresh on every recalculation and diffed
/// against the previous snapshot by the incremental calculator.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LayoutSnapshot {
    pub centers: BTreeMap<VertexId, Point>,
    pub routes: BTreeMap<PathId, Route>,
}

/// Turns the ordered, layered topology into real coordinates: layer bands
/// vertically, four alignment/compaction sweeps horizontally, isolated
/// vertices packed round-robin afterward, then one route per path.
pub fn calculate(relative: &RelativeLayout, config: &LayoutConfig) -> LayoutSnapshot {
    let graph = relative.graph();

    // Isolated vertices sit out the sweeps and are packed back in later.
    let mut sweep_layers: Vec<Vec<VertexId>> = Vec::with_capacity(relative.layers().len());
    let mut isolated: Vec<VertexId> = Vec::new();
    for layer in relative.layers() {
        let mut kept = Vec::with_capacity(layer.len());
        for &v in layer {
            if graph.is_connected(v) {
                kept.push(v);
            } else {
                isolated.push(v);
            }
        }
        sweep_layers.push(kept);
    }
    isolated.sort_by_key(|&v| crate::relative::compare::ordering_key(graph, v));

    // Round-robin the isolated vertices over the existing layer bands.
    let mut occupancy = sweep_layers.clone();
    if occupancy.is_empty() && !isolated.is_empty() {
        occupancy.push(Vec::new());
    }
    let band_count = occupancy.len().max(1);
    let mut packed: Vec<(usize, VertexId)> = Vec::with_capacity(isolated.len());
    for (i, &v) in isolated.iter().enumerate() {
        let band = i % band_count;
        occupancy[band].push(v);
        packed.push((band, v));
    }

    // Stage A: layer heights and vertical centers.
    let mut y_of: BTreeMap<VertexId, f64> = BTreeMap::new();
    let mut top = 0.0f64;
    for layer in &occupancy {
        let height = layer
            .iter()
            .map(|&v| graph.vertex(v).size.height)
            .fold(0.0f64, f64::max);
        for &v in layer {
            y_of.insert(v, top + height / 2.0);
        }
        top += height + config.vertical_gap;
    }

    // Stages B-D: four sweeps over the connected vertices, combined.
    let hops = graph.proper_edges();
    let mut widths: BTreeMap<VertexId, f64> = BTreeMap::new();
    let mut dummies: BTreeSet<VertexId> = BTreeSet::new();
    for layer in &sweep_layers {
        for &v in layer {
            widths.insert(v, graph.vertex(v).size.width);
            if graph.vertex(v).is_dummy() {
                dummies.insert(v);
            }
        }
    }
    let sweeps: Vec<BTreeMap<VertexId, f64>> = SweepDirection::ALL
        .iter()
        .map(|&d| sweep_positions(&sweep_layers, &hops, &widths, &dummies, config.horizontal_gap, d))
        .collect();
    let x_of = combine_sweeps(&sweeps, &widths, config.combine_mode);

    let mut centers: BTreeMap<VertexId, Point> = BTreeMap::new();
    for (&v, &x) in &x_of {
        centers.insert(v, Point::new(x, y_of[&v]));
    }

    // Stage E: pack isolated vertices after the rightmost occupant of
    // their band, chained with a standard gap.
    let global_left = centers
        .iter()
        .map(|(v, p)| p.x - widths.get(v).copied().unwrap_or(0.0) / 2.0)
        .fold(f64::INFINITY, f64::min);
    let start = if global_left.is_finite() { global_left } else { 0.0 };
    let mut cursor: Vec<f64> = occupancy
        .iter()
        .map(|layer| {
            layer
                .iter()
                .filter_map(|v| {
                    let p = centers.get(v)?;
                    Some(p.x + widths.get(v).copied().unwrap_or(0.0) / 2.0)
                })
                .fold(start - config.horizontal_gap, f64::max)
        })
        .collect();
    for (band, v) in packed {
        let width = graph.vertex(v).size.width;
        let x = cursor[band] + config.horizontal_gap + width / 2.0;
        cursor[band] = x + width / 2.0;
        centers.insert(v, Point::new(x, y_of[&v]));
    }

    // Canonical frame: translate so the leftmost shape edge sits at x = 0.
    // Swept and isolated vertices then land on the same coordinates for
    // the same topology, so a vertex whose surroundings did not change
    // keeps its position when it crosses between the two groups.
    let min_left = centers
        .iter()
        .map(|(v, p)| p.x - graph.vertex(*v).size.width / 2.0)
        .fold(f64::INFINITY, f64::min);
    if min_left.is_finite() && min_left != 0.0 {
        for p in centers.values_mut() {
            p.x -= min_left;
        }
    }

    // Stage F: routes through dummy waypoints.
    let mut routes: BTreeMap<PathId, Route> = BTreeMap::new();
    for (id, path) in graph.paths() {
        routes.insert(id, route_path(graph, &centers, path));
    }

    debug!(
        vertices = centers.len(),
        paths = routes.len(),
        "absolute layout recalculated"
    );
    LayoutSnapshot { centers, routes }
}

/// Stage D: aligns the four sweep results on the narrowest one, then
/// averages them (or picks one, per config).
fn combine_sweeps(
    sweeps: &[BTreeMap<VertexId, f64>],
    widths: &BTreeMap<VertexId, f64>,
    mode: SweepCombineMode,
) -> BTreeMap<VertexId, f64> {
    if sweeps.iter().all(BTreeMap::is_empty) {
        return BTreeMap::new();
    }
    let extent = |m: &BTreeMap<VertexId, f64>| -> (f64, f64) {
        let lo = m
            .iter()
            .map(|(v, x)| x - widths[v] / 2.0)
            .fold(f64::INFINITY, f64::min);
        let hi = m
            .iter()
            .map(|(v, x)| x + widths[v] / 2.0)
            .fold(f64::NEG_INFINITY, f64::max);
        (lo, hi)
    };
    let extents: Vec<(f64, f64)> = sweeps.iter().map(extent).collect();
    let narrowest = extents
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| (a.1 - a.0).total_cmp(&(b.1 - b.0)))
        .map(|(i, _)| i)
        .unwrap_or(0);

    let mut aligned: Vec<BTreeMap<VertexId, f64>> = Vec::with_capacity(sweeps.len());
    for (i, sweep) in sweeps.iter().enumerate() {
        let shift = if SweepDirection::ALL[i].is_left() {
            extents[narrowest].0 - extents[i].0
        } else {
            extents[narrowest].1 - extents[i].1
        };
        aligned.push(sweep.iter().map(|(&v, &x)| (v, x + shift)).collect());
    }

    match mode {
        SweepCombineMode::Single(direction) => {
            let i = SweepDirection::ALL
                .iter()
                .position(|&d| d == direction)
                .unwrap();
            aligned[i].clone()
        }
        SweepCombineMode::Balanced => {
            let mut result = BTreeMap::new();
            for &v in aligned[0].keys() {
                let sum: f64 = aligned.iter().map(|m| m[&v]).sum();
                result.insert(v, sum / aligned.len() as f64);
            }
            result
        }
    }
}
