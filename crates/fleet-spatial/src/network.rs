//! Road network representation and builder.
//!
//! # Data layout
//!
//! The graph uses **Compressed Sparse Row (CSR)** format for outgoing edges.
//! Given a node index `n`, its outgoing edges occupy the edge indices
//! `node_out_start[n] .. node_out_start[n+1]`.
//!
//! All edge arrays (`edge_from`, `edge_to`, `edge_length_m`, `edge_travel_ms`)
//! are sorted by source node, so iterating a node's outgoing edges is a
//! contiguous memory scan in Dijkstra's inner loop.
//!
//! # Spatial index
//!
//! An R-tree (via `rstar`) maps `[lon, lat]` to the nearest node.  The
//! solver uses it to snap warehouse points and random destinations, which
//! are generally not on the network, to road nodes.

use rstar::{PointDistance, RTree, RTreeObject, AABB};

use fleet_core::Position;

// ── R-tree node entry ─────────────────────────────────────────────────────────

#[derive(Clone)]
struct NodeEntry {
    point: [f64; 2], // [lon, lat]
    index: u32,
}

impl RTreeObject for NodeEntry {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for NodeEntry {
    /// Squared Euclidean distance in lon/lat space.  Good enough for
    /// nearest-node snapping inside one metropolitan area.
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dlon = self.point[0] - point[0];
        let dlat = self.point[1] - point[1];
        dlon * dlon + dlat * dlat
    }
}

// ── RoadNetwork ───────────────────────────────────────────────────────────────

/// Directed road graph in CSR format plus a spatial index for node snapping.
///
/// Nodes and edges are addressed by plain `u32` indices.  Do not construct
/// directly; use [`RoadNetworkBuilder`].
pub struct RoadNetwork {
    /// Geographic position of each node.
    pub node_pos: Vec<Position>,

    /// CSR row pointer.  Length = `node_count + 1`.
    pub node_out_start: Vec<u32>,

    /// Source node of each edge (needed to walk `prev_edge` back to the source).
    pub edge_from: Vec<u32>,

    /// Destination node of each edge.
    pub edge_to: Vec<u32>,

    /// Length of each edge in metres.
    pub edge_length_m: Vec<f64>,

    /// Travel time in milliseconds.  Used as the Dijkstra edge cost.
    pub edge_travel_ms: Vec<u32>,

    spatial_idx: RTree<NodeEntry>,
}

impl RoadNetwork {
    /// A network with no nodes.  Every solve against it fails with
    /// [`SpatialError::EmptyNetwork`](crate::SpatialError::EmptyNetwork).
    pub fn empty() -> Self {
        RoadNetworkBuilder::new().build()
    }

    pub fn node_count(&self) -> usize {
        self.node_pos.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_to.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_pos.is_empty()
    }

    /// Edge indices of all outgoing edges from `node`.
    #[inline]
    pub fn out_edges(&self, node: u32) -> std::ops::Range<usize> {
        let start = self.node_out_start[node as usize] as usize;
        let end   = self.node_out_start[node as usize + 1] as usize;
        start..end
    }

    #[inline]
    pub fn out_degree(&self, node: u32) -> usize {
        self.out_edges(node).len()
    }

    /// Index of the nearest road node to `pos`, or `None` for an empty network.
    pub fn snap_to_node(&self, pos: Position) -> Option<u32> {
        self.spatial_idx
            .nearest_neighbor(&[pos.lon, pos.lat])
            .map(|e| e.index)
    }
}

// ── RoadNetworkBuilder ────────────────────────────────────────────────────────

/// Construct a [`RoadNetwork`] incrementally, then call [`build`](Self::build).
///
/// # Example
///
/// ```
/// use fleet_core::Position;
/// use fleet_spatial::RoadNetworkBuilder;
///
/// let mut b = RoadNetworkBuilder::new();
/// let a = b.add_node(Position::new(-117.16, 32.71));
/// let c = b.add_node(Position::new(-117.15, 32.71));
/// b.add_road(a, c, 940.0, 70_000);
/// let net = b.build();
/// assert_eq!(net.node_count(), 2);
/// assert_eq!(net.edge_count(), 2); // bidirectional
/// ```
pub struct RoadNetworkBuilder {
    nodes:     Vec<Position>,
    raw_edges: Vec<RawEdge>,
}

struct RawEdge {
    from:      u32,
    to:        u32,
    length_m:  f64,
    travel_ms: u32,
}

impl RoadNetworkBuilder {
    pub fn new() -> Self {
        Self { nodes: Vec::new(), raw_edges: Vec::new() }
    }

    pub fn with_capacity(nodes: usize, edges: usize) -> Self {
        Self {
            nodes:     Vec::with_capacity(nodes),
            raw_edges: Vec::with_capacity(edges),
        }
    }

    /// Add a road node and return its index (sequential from 0).
    pub fn add_node(&mut self, pos: Position) -> u32 {
        let id = self.nodes.len() as u32;
        self.nodes.push(pos);
        id
    }

    /// Add a **directed** edge.
    pub fn add_directed_edge(&mut self, from: u32, to: u32, length_m: f64, travel_ms: u32) {
        self.raw_edges.push(RawEdge { from, to, length_m, travel_ms });
    }

    /// Add edges in both directions for an undirected street segment.
    pub fn add_road(&mut self, a: u32, b: u32, length_m: f64, travel_ms: u32) {
        self.add_directed_edge(a, b, length_m, travel_ms);
        self.add_directed_edge(b, a, length_m, travel_ms);
    }

    /// Add a two-way street whose length is the haversine distance between
    /// its end nodes and whose travel time follows from `speed_mps`.
    pub fn add_street(&mut self, a: u32, b: u32, speed_mps: f64) {
        let length_m = self.nodes[a as usize].distance_m(self.nodes[b as usize]);
        let travel_ms = (length_m / speed_mps * 1000.0).round() as u32;
        self.add_road(a, b, length_m, travel_ms);
    }

    pub fn node_pos(&self, id: u32) -> Position {
        self.nodes[id as usize]
    }

    pub fn node_count(&self) -> usize { self.nodes.len() }
    pub fn edge_count(&self) -> usize { self.raw_edges.len() }

    /// Consume the builder and produce a [`RoadNetwork`].
    ///
    /// O(E log E) for the edge sort + O(N log N) for the R-tree bulk load.
    pub fn build(self) -> RoadNetwork {
        let node_count = self.nodes.len();
        let edge_count = self.raw_edges.len();

        let mut raw = self.raw_edges;
        raw.sort_unstable_by_key(|e| e.from);

        let edge_from:      Vec<u32> = raw.iter().map(|e| e.from).collect();
        let edge_to:        Vec<u32> = raw.iter().map(|e| e.to).collect();
        let edge_length_m:  Vec<f64> = raw.iter().map(|e| e.length_m).collect();
        let edge_travel_ms: Vec<u32> = raw.iter().map(|e| e.travel_ms).collect();

        let mut node_out_start = vec![0u32; node_count + 1];
        for e in &raw {
            node_out_start[e.from as usize + 1] += 1;
        }
        for i in 1..=node_count {
            node_out_start[i] += node_out_start[i - 1];
        }
        debug_assert_eq!(node_out_start[node_count] as usize, edge_count);

        let entries: Vec<NodeEntry> = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, pos)| NodeEntry { point: [pos.lon, pos.lat], index: i as u32 })
            .collect();
        let spatial_idx = RTree::bulk_load(entries);

        RoadNetwork {
            node_pos: self.nodes,
            node_out_start,
            edge_from,
            edge_to,
            edge_length_m,
            edge_travel_ms,
            spatial_idx,
        }
    }
}

impl Default for RoadNetworkBuilder {
    fn default() -> Self {
        Self::new()
    }
}
