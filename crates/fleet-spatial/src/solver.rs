//! Route solver interface and the default network-backed implementation.
//!
//! # Pluggability
//!
//! The simulator only ever calls routing through [`RouteSolver`], a black
//! box that takes two points and returns a path with its length and
//! expected duration.  [`NetworkSolver`] runs Dijkstra over an in-memory
//! [`RoadNetwork`]; applications backed by a remote routing service
//! implement the trait themselves.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use log::debug;

use fleet_core::Position;

use crate::network::RoadNetwork;
use crate::{PathGeometry, SpatialError, SpatialResult};

// ── SolvedRoute ───────────────────────────────────────────────────────────────

/// The result of a solve: the path to follow plus the solver's totals.
#[derive(Debug, Clone)]
pub struct SolvedRoute {
    pub path: PathGeometry,
    /// Length reported by the solver, metres.
    pub total_length_m: f64,
    /// Expected traversal time reported by the solver, seconds.
    pub total_duration_secs: f64,
}

impl SolvedRoute {
    /// Average speed over the route, metres per second.
    ///
    /// `None` when the duration is zero or non-finite — such a route cannot
    /// be followed at a meaningful speed.
    pub fn speed_mps(&self) -> Option<f64> {
        let speed = self.total_length_m / self.total_duration_secs;
        (self.total_duration_secs > 0.0 && speed.is_finite() && speed > 0.0).then_some(speed)
    }
}

// ── RouteSolver trait ─────────────────────────────────────────────────────────

/// Pluggable routing engine.
///
/// # Thread safety
///
/// Implementations must be `Send + Sync`: the scheduler calls `solve` from
/// blocking worker threads, possibly for several in-flight requests at
/// once.  A failure is scoped to its request.
pub trait RouteSolver: Send + Sync {
    /// Compute a route from `start` to `end`.
    fn solve(&self, start: Position, end: Position) -> SpatialResult<SolvedRoute>;
}

impl<S: RouteSolver + ?Sized> RouteSolver for std::sync::Arc<S> {
    fn solve(&self, start: Position, end: Position) -> SpatialResult<SolvedRoute> {
        (**self).solve(start, end)
    }
}

// ── NetworkSolver ─────────────────────────────────────────────────────────────

/// Dijkstra on travel time over a [`RoadNetwork`].
///
/// Both endpoints are snapped to their nearest road node.  The returned path
/// runs node to node, so a return leg solved from a route's end point starts
/// exactly where the outbound leg stopped.
pub struct NetworkSolver {
    network: RoadNetwork,
}

impl NetworkSolver {
    pub fn new(network: RoadNetwork) -> Self {
        debug!(
            "[Solver] road network: {} nodes, {} edges",
            network.node_count(),
            network.edge_count(),
        );
        Self { network }
    }

    pub fn network(&self) -> &RoadNetwork {
        &self.network
    }
}

impl RouteSolver for NetworkSolver {
    fn solve(&self, start: Position, end: Position) -> SpatialResult<SolvedRoute> {
        let from = self.network.snap_to_node(start).ok_or(SpatialError::EmptyNetwork)?;
        let to   = self.network.snap_to_node(end).ok_or(SpatialError::EmptyNetwork)?;
        if from == to {
            return Err(SpatialError::DegenerateRoute { from: start, to: end });
        }

        let (edges, total_ms) = dijkstra(&self.network, from, to)
            .ok_or(SpatialError::NoRoute { from: start, to: end })?;

        let mut vertices = Vec::with_capacity(edges.len() + 1);
        vertices.push(self.network.node_pos[from as usize]);
        let mut total_length_m = 0.0;
        for &e in &edges {
            vertices.push(self.network.node_pos[self.network.edge_to[e] as usize]);
            total_length_m += self.network.edge_length_m[e];
        }

        Ok(SolvedRoute {
            path: PathGeometry::new(vertices)?,
            total_length_m,
            total_duration_secs: total_ms as f64 / 1000.0,
        })
    }
}

// ── Dijkstra internals ────────────────────────────────────────────────────────

/// Shortest path by travel time.  Returns the edge indices in travel order
/// and the total cost in milliseconds, or `None` if `to` is unreachable.
fn dijkstra(network: &RoadNetwork, from: u32, to: u32) -> Option<(Vec<usize>, u64)> {
    let n = network.node_count();
    let mut dist = vec![u64::MAX; n];
    let mut prev_edge: Vec<Option<usize>> = vec![None; n];

    dist[from as usize] = 0;

    // Reverse turns the max-heap into a min-heap; the node index breaks ties
    // deterministically.
    let mut heap: BinaryHeap<Reverse<(u64, u32)>> = BinaryHeap::new();
    heap.push(Reverse((0, from)));

    while let Some(Reverse((cost, node))) = heap.pop() {
        if node == to {
            return Some((reconstruct(network, &prev_edge, to), cost));
        }

        // Stale heap entry.
        if cost > dist[node as usize] {
            continue;
        }

        for edge in network.out_edges(node) {
            let neighbor = network.edge_to[edge];
            let new_cost = cost.saturating_add(network.edge_travel_ms[edge] as u64);

            if new_cost < dist[neighbor as usize] {
                dist[neighbor as usize] = new_cost;
                prev_edge[neighbor as usize] = Some(edge);
                heap.push(Reverse((new_cost, neighbor)));
            }
        }
    }

    None
}

fn reconstruct(network: &RoadNetwork, prev_edge: &[Option<usize>], to: u32) -> Vec<usize> {
    let mut edges = Vec::new();
    let mut cur = to;
    while let Some(e) = prev_edge[cur as usize] {
        edges.push(e);
        cur = network.edge_from[e];
    }
    edges.reverse();
    edges
}
