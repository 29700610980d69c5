//! Candidate polygonization (stage 2).
//!
//! Merges the selected split lines with the AOI boundary rings into a
//! node-consistent planar arrangement, then traces the bounded faces of that
//! arrangement. Every maximal enclosed face inside the AOI becomes one
//! candidate split polygon.
//!
//! Dangling segments that close no face are pruned and contribute no polygon;
//! this is intentional lossy behavior, not a defect. Because the AOI boundary
//! is itself part of the noded network, no face crosses it: faces are either
//! entirely inside the AOI (kept) or entirely outside (discarded), and the
//! union of kept faces equals the AOI exactly.
//!
//! Face ids are deterministic for identical input: faces are sorted by their
//! minimal snapped vertex (then snapped centroid) before ids are assigned.

use geo::algorithm::line_intersection::{line_intersection, LineIntersection};
use geo::{Area, Centroid, Contains, Coord, InteriorPoint, Line, LineString, MultiPolygon, Point, Polygon};
use rstar::{RTree, RTreeObject, AABB};
use std::collections::{BTreeMap, BTreeSet};

use crate::geo_utils::{dequantize, edge_key, quantize, ring_signed_area, EdgeKey, QuantKey};
use crate::{SplitLine, SplitPolygon};

/// Segment wrapper for R-tree candidate filtering during noding.
#[derive(Debug, Clone)]
struct SegmentRecord {
    index: usize,
    line: Line<f64>,
}

impl RTreeObject for SegmentRecord {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        let (a, b) = (self.line.start, self.line.end);
        AABB::from_corners(
            [a.x.min(b.x), a.y.min(b.y)],
            [a.x.max(b.x), a.y.max(b.y)],
        )
    }
}

/// Polygonize the AOI together with the split lines.
///
/// Returns candidate split polygons sorted by id. With zero split lines the
/// result is a single polygon: the AOI itself.
pub fn polygonize(aoi: &Polygon<f64>, lines: &[SplitLine]) -> Vec<SplitPolygon> {
    let segments = collect_segments(aoi, lines);
    let edges = node_segments(&segments);
    let graph = Graph::build(edges);
    let rings: Vec<Vec<Coord<f64>>> = graph
        .trace_rings()
        .iter()
        .map(|ring| graph.ring_coords(ring))
        .collect();
    let faces = assemble_faces(rings);
    let kept = faces
        .into_iter()
        .filter(|face| face_inside_aoi(face, aoi))
        .collect();
    assign_ids(kept)
}

/// Gather raw segments from the AOI rings and every split line.
fn collect_segments(aoi: &Polygon<f64>, lines: &[SplitLine]) -> Vec<Line<f64>> {
    let mut segments: Vec<Line<f64>> = Vec::new();
    segments.extend(aoi.exterior().lines());
    for interior in aoi.interiors() {
        segments.extend(interior.lines());
    }
    for line in lines {
        segments.extend(line.geometry.lines());
    }
    segments.retain(|s| quantize(s.start) != quantize(s.end));
    segments
}

/// Node the segment soup: split every segment at its intersections with
/// every other segment, snapping all endpoints to the quantization grid.
///
/// Returns the deduplicated set of undirected edges of the arrangement.
fn node_segments(segments: &[Line<f64>]) -> BTreeSet<EdgeKey> {
    let records: Vec<SegmentRecord> = segments
        .iter()
        .enumerate()
        .map(|(index, line)| SegmentRecord { index, line: *line })
        .collect();
    let tree = RTree::bulk_load(records.clone());

    // Cut points per segment, discovered pairwise. Each unordered pair is
    // evaluated once so both segments receive the identical intersection
    // coordinate.
    let mut cuts: Vec<Vec<Coord<f64>>> = vec![Vec::new(); segments.len()];
    for record in &records {
        for other in tree.locate_in_envelope_intersecting(&record.envelope()) {
            if other.index <= record.index {
                continue;
            }
            match line_intersection(record.line, other.line) {
                None => {}
                Some(LineIntersection::SinglePoint { intersection, .. }) => {
                    cuts[record.index].push(intersection);
                    cuts[other.index].push(intersection);
                }
                Some(LineIntersection::Collinear { intersection }) => {
                    for c in [intersection.start, intersection.end] {
                        cuts[record.index].push(c);
                        cuts[other.index].push(c);
                    }
                }
            }
        }
    }

    let mut edges: BTreeSet<EdgeKey> = BTreeSet::new();
    for (segment, segment_cuts) in segments.iter().zip(cuts.iter()) {
        for piece in split_segment(segment, segment_cuts) {
            edges.insert(piece);
        }
    }
    edges
}

/// Split one segment at the given cut coordinates, ordered by their position
/// along the segment. Zero-length pieces (cuts snapping onto each other or
/// onto an endpoint) are dropped.
fn split_segment(segment: &Line<f64>, cuts: &[Coord<f64>]) -> Vec<EdgeKey> {
    let dir = Coord {
        x: segment.end.x - segment.start.x,
        y: segment.end.y - segment.start.y,
    };
    let len_sq = dir.x * dir.x + dir.y * dir.y;

    let mut stations: Vec<(f64, QuantKey)> = Vec::with_capacity(cuts.len() + 2);
    stations.push((0.0, quantize(segment.start)));
    stations.push((1.0, quantize(segment.end)));
    for cut in cuts {
        let t = ((cut.x - segment.start.x) * dir.x + (cut.y - segment.start.y) * dir.y) / len_sq;
        stations.push((t.clamp(0.0, 1.0), quantize(*cut)));
    }
    stations.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

    let mut pieces = Vec::new();
    let mut prev = stations[0].1;
    for &(_, key) in &stations[1..] {
        if key != prev {
            pieces.push(if prev <= key { (prev, key) } else { (key, prev) });
            prev = key;
        }
    }
    pieces
}

/// Planar graph over snapped nodes.
struct Graph {
    coords: Vec<Coord<f64>>,
    /// Outgoing neighbors per node, sorted by angle (ascending atan2).
    neighbors: Vec<Vec<usize>>,
}

impl Graph {
    fn build(edges: BTreeSet<EdgeKey>) -> Self {
        let mut node_ids: BTreeMap<QuantKey, usize> = BTreeMap::new();
        let mut coords: Vec<Coord<f64>> = Vec::new();
        let mut intern = |key: QuantKey, coords: &mut Vec<Coord<f64>>| -> usize {
            *node_ids.entry(key).or_insert_with(|| {
                coords.push(dequantize(key));
                coords.len() - 1
            })
        };

        let mut adjacency: Vec<BTreeSet<usize>> = Vec::new();
        for (ka, kb) in edges {
            let a = intern(ka, &mut coords);
            let b = intern(kb, &mut coords);
            if adjacency.len() < coords.len() {
                adjacency.resize(coords.len(), BTreeSet::new());
            }
            adjacency[a].insert(b);
            adjacency[b].insert(a);
        }
        adjacency.resize(coords.len(), BTreeSet::new());

        prune_dangles(&mut adjacency);

        // Angular ordering around each node, counter-clockwise.
        let neighbors: Vec<Vec<usize>> = adjacency
            .iter()
            .enumerate()
            .map(|(node, adj)| {
                let mut sorted: Vec<usize> = adj.iter().copied().collect();
                sorted.sort_by(|&p, &q| {
                    let ap = angle(coords[node], coords[p]);
                    let aq = angle(coords[node], coords[q]);
                    ap.partial_cmp(&aq).unwrap_or(std::cmp::Ordering::Equal)
                });
                sorted
            })
            .collect();

        Graph { coords, neighbors }
    }

    /// Trace every face ring of the arrangement.
    ///
    /// From directed edge (u, v), the traversal continues with the neighbor
    /// of v that precedes u in counter-clockwise order around v (the
    /// clockwise-next turn), which keeps the face to the left of each
    /// directed edge. Bounded faces come out counter-clockwise (positive
    /// area); the unbounded face of each component comes out clockwise.
    fn trace_rings(&self) -> Vec<Vec<usize>> {
        let mut visited: BTreeSet<(usize, usize)> = BTreeSet::new();
        let mut rings = Vec::new();

        for u in 0..self.neighbors.len() {
            for &v in &self.neighbors[u] {
                if visited.contains(&(u, v)) {
                    continue;
                }
                let mut ring = Vec::new();
                let (mut from, mut to) = (u, v);
                loop {
                    visited.insert((from, to));
                    ring.push(from);
                    let order = &self.neighbors[to];
                    let back = order.iter().position(|&n| n == from).unwrap_or(0);
                    let next = order[(back + order.len() - 1) % order.len()];
                    from = to;
                    to = next;
                    if from == u && to == v {
                        break;
                    }
                }
                rings.push(ring);
            }
        }
        rings
    }

    fn ring_coords(&self, ring: &[usize]) -> Vec<Coord<f64>> {
        ring.iter().map(|&n| self.coords[n]).collect()
    }
}

/// Iteratively remove edges hanging off degree-1 nodes. Open line ends close
/// no face and would otherwise corrupt face tracing.
fn prune_dangles(adjacency: &mut [BTreeSet<usize>]) {
    let mut stack: Vec<usize> = (0..adjacency.len())
        .filter(|&n| adjacency[n].len() == 1)
        .collect();
    while let Some(node) = stack.pop() {
        if adjacency[node].len() != 1 {
            continue;
        }
        let neighbor = *adjacency[node].iter().next().unwrap();
        adjacency[node].clear();
        adjacency[neighbor].remove(&node);
        if adjacency[neighbor].len() == 1 {
            stack.push(neighbor);
        }
    }
}

fn angle(from: Coord<f64>, to: Coord<f64>) -> f64 {
    (to.y - from.y).atan2(to.x - from.x)
}

/// Turn traced rings into polygons with holes.
///
/// Rings are first decomposed at repeated vertices (bridges in the
/// arrangement are walked twice and pinch the traced ring), then classified
/// by orientation: counter-clockwise rings are face exteriors; clockwise
/// rings are either hole boundaries or component outer boundaries. A
/// clockwise ring becomes a hole of the smallest face that strictly contains
/// every one of its vertices and shares none of its edges; clockwise rings
/// contained by no such face bound the unbounded region and are dropped.
/// The vertex test matters: a component's outer-boundary ring *encloses*
/// every face of the component, but its vertices lie inside none of them,
/// so it can never be mistaken for a hole.
fn assemble_faces(rings: Vec<Vec<Coord<f64>>>) -> Vec<Polygon<f64>> {
    let mut exteriors: Vec<(Vec<Coord<f64>>, f64, BTreeSet<EdgeKey>)> = Vec::new();
    let mut negatives: Vec<(Vec<Coord<f64>>, BTreeSet<EdgeKey>)> = Vec::new();

    for ring in rings {
        for simple in decompose_ring(ring) {
            let area = ring_signed_area(&simple);
            if area.abs() < f64::EPSILON {
                continue;
            }
            let edges = ring_edges(&simple);
            if area > 0.0 {
                exteriors.push((simple, area, edges));
            } else {
                negatives.push((simple, edges));
            }
        }
    }

    // Sort candidate faces by ascending area so hole assignment finds the
    // smallest containing face first.
    exteriors.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

    let shells: Vec<Polygon<f64>> = exteriors
        .iter()
        .map(|(ring, _, _)| Polygon::new(LineString::new(ring.clone()), vec![]))
        .collect();

    let mut holes: Vec<Vec<LineString<f64>>> = vec![Vec::new(); exteriors.len()];
    for (ring, edges) in negatives {
        let target = exteriors.iter().enumerate().find(|(i, (_, _, face_edges))| {
            face_edges.is_disjoint(&edges)
                && ring.iter().all(|c| shells[*i].contains(&Point::from(*c)))
        });
        if let Some((i, _)) = target {
            holes[i].push(LineString::new(ring));
        }
    }

    exteriors
        .into_iter()
        .enumerate()
        .map(|(i, (ring, _, _))| {
            Polygon::new(LineString::new(ring), std::mem::take(&mut holes[i]))
        })
        .collect()
}

/// Split a traced ring at repeated vertices into simple sub-rings.
///
/// A bridge edge is traversed once in each direction by the face walk, so
/// the traced ring revisits the bridge's endpoints; each revisit pinches off
/// one simple cycle. Degenerate cycles (under 3 vertices) are dropped.
fn decompose_ring(ring: Vec<Coord<f64>>) -> Vec<Vec<Coord<f64>>> {
    let mut cycles = Vec::new();
    let mut path: Vec<(QuantKey, Coord<f64>)> = Vec::new();
    let mut position: BTreeMap<QuantKey, usize> = BTreeMap::new();

    for coord in ring {
        let key = quantize(coord);
        if let Some(&pos) = position.get(&key) {
            let cycle: Vec<Coord<f64>> = path[pos..].iter().map(|(_, c)| *c).collect();
            for (k, _) in path.drain(pos..) {
                position.remove(&k);
            }
            if cycle.len() >= 3 {
                cycles.push(cycle);
            }
        }
        position.insert(key, path.len());
        path.push((key, coord));
    }
    if path.len() >= 3 {
        cycles.push(path.into_iter().map(|(_, c)| c).collect());
    }
    cycles
}

fn ring_edges(ring: &[Coord<f64>]) -> BTreeSet<EdgeKey> {
    let mut edges = BTreeSet::new();
    for i in 0..ring.len() {
        edges.insert(edge_key(ring[i], ring[(i + 1) % ring.len()]));
    }
    edges
}

/// A face is kept iff its interior lies inside the AOI. Faces never straddle
/// the AOI boundary because the boundary is part of the noded arrangement.
fn face_inside_aoi(face: &Polygon<f64>, aoi: &Polygon<f64>) -> bool {
    let probe = face.interior_point().or_else(|| face.centroid());
    match probe {
        Some(point) => aoi.contains(&point),
        None => false,
    }
}

/// Deterministic id assignment: faces sorted by their minimal snapped vertex,
/// then by snapped centroid, then numbered from 1.
fn assign_ids(faces: Vec<Polygon<f64>>) -> Vec<SplitPolygon> {
    let mut keyed: Vec<(QuantKey, QuantKey, Polygon<f64>)> = faces
        .into_iter()
        .map(|face| {
            let min_vertex = face
                .exterior()
                .0
                .iter()
                .map(|c| quantize(*c))
                .min()
                .unwrap_or((0, 0));
            let centroid = face
                .centroid()
                .map(|p| quantize(p.into()))
                .unwrap_or((0, 0));
            (min_vertex, centroid, face)
        })
        .collect();
    keyed.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));

    keyed
        .into_iter()
        .enumerate()
        .map(|(i, (_, _, polygon))| {
            let geometry = MultiPolygon(vec![polygon]);
            let area = geometry.unsigned_area();
            SplitPolygon {
                id: (i + 1) as u64,
                geometry,
                area,
                feature_count: None,
                building_ids: Vec::new(),
            }
        })
        .collect()
}
