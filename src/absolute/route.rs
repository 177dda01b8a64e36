use std::collections::BTreeMap;

use crate::geometry::{Point, Rect, Route};
use crate::graph::proper::{Path, ProperLayoutGraph};
use crate::graph::vertex::VertexId;

/// Builds the polyline for one path: the attach point on the source shape,
/// every dummy-vertex center in chain order, and the attach point on the
/// target shape. Attach points sit where the segment from a shape's center
/// toward the next route point crosses the shape's rectangle; degenerate
/// segments yield undefined points, which the diff stage filters out.
pub(super) fn route_path(
    graph: &ProperLayoutGraph,
    centers: &BTreeMap<VertexId, Point>,
    path: &Path,
) -> Route {
    let undefined = Point::UNDEFINED;
    let source_center = centers.get(&path.source).copied().unwrap_or(undefined);
    let target_center = centers.get(&path.target).copied().unwrap_or(undefined);
    let waypoints: Vec<Point> = path
        .interim
        .iter()
        .map(|d| centers.get(d).copied().unwrap_or(undefined))
        .collect();

    let first_interior = waypoints.first().copied().unwrap_or(target_center);
    let last_interior = waypoints.last().copied().unwrap_or(source_center);

    let source_rect = Rect::new(source_center, graph.vertex(path.source).size);
    let target_rect = Rect::new(target_center, graph.vertex(path.target).size);

    let mut points = Vec::with_capacity(waypoints.len() + 2);
    points.push(source_rect.boundary_point_toward(first_interior));
    points.extend(waypoints);
    points.push(target_rect.boundary_point_toward(last_interior));
    Route::new(points)
}
