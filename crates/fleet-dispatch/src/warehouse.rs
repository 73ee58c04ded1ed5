//! Warehouse origin points and the extent destinations are drawn from.

use fleet_core::{Position, SpatialReference, WarehouseId};
use fleet_spatial::Extent;

use crate::{DispatchError, DispatchResult};

/// One origin point trucks are dispatched from and return to.
#[derive(Debug, Clone, PartialEq)]
pub struct Warehouse {
    pub id:       WarehouseId,
    pub name:     String,
    pub position: Position,
}

// ── WarehouseSet ──────────────────────────────────────────────────────────────

/// The loaded, read-only warehouse set plus the destination extent.
///
/// Guaranteed non-empty; `WarehouseId(i)` indexes the `i`-th warehouse.
#[derive(Debug, Clone)]
pub struct WarehouseSet {
    warehouses: Vec<Warehouse>,
    extent:     Extent,
}

impl WarehouseSet {
    /// Build a set from named positions, assigning ids in input order.
    ///
    /// # Errors
    ///
    /// - `NoWarehouses` if `points` is empty.
    /// - `Parse` if a position is not a finite coordinate.
    pub fn new<I>(points: I, extent: Extent) -> DispatchResult<Self>
    where
        I: IntoIterator<Item = (String, Position)>,
    {
        let mut warehouses = Vec::new();
        for (i, (name, position)) in points.into_iter().enumerate() {
            if !position.is_finite() {
                return Err(DispatchError::Parse(format!(
                    "warehouse {name:?} has a non-finite position {position}"
                )));
            }
            let id = WarehouseId::try_from(i)
                .map_err(|_| DispatchError::Parse(format!("too many warehouses ({i})")))?;
            warehouses.push(Warehouse { id, name, position });
        }
        if warehouses.is_empty() {
            return Err(DispatchError::NoWarehouses);
        }
        Ok(Self { warehouses, extent })
    }

    /// Like [`new`](Self::new), with the extent given as raw
    /// `[min_x, min_y, max_x, max_y]` bounds in `reference`.
    ///
    /// # Errors
    ///
    /// `InvalidExtent` if the bounds are inverted or not finite, otherwise
    /// as for [`new`](Self::new).
    pub fn with_bounds<I>(points: I, bounds: [f64; 4], reference: SpatialReference) -> DispatchResult<Self>
    where
        I: IntoIterator<Item = (String, Position)>,
    {
        let [min_x, min_y, max_x, max_y] = bounds;
        let extent = Extent::new(min_x, min_y, max_x, max_y, reference)
            .map_err(|e| DispatchError::InvalidExtent(e.to_string()))?;
        Self::new(points, extent)
    }

    /// Unnamed positions; names default to `"warehouse-<i>"`.
    pub fn from_positions<I>(positions: I, extent: Extent) -> DispatchResult<Self>
    where
        I: IntoIterator<Item = Position>,
    {
        Self::new(
            positions.into_iter().enumerate().map(|(i, p)| (format!("warehouse-{i}"), p)),
            extent,
        )
    }

    #[inline]
    pub fn get(&self, id: WarehouseId) -> Option<&Warehouse> {
        self.warehouses.get(id.index())
    }

    #[inline]
    pub fn position(&self, id: WarehouseId) -> Option<Position> {
        self.get(id).map(|w| w.position)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Warehouse> {
        self.warehouses.iter()
    }

    pub fn len(&self) -> usize {
        self.warehouses.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.warehouses.is_empty()
    }

    pub fn extent(&self) -> &Extent {
        &self.extent
    }
}

// ── WarehouseSource ───────────────────────────────────────────────────────────

/// Loaded once at start-up.  A load failure is fatal to the simulation.
pub trait WarehouseSource: Send + Sync {
    fn load(&self) -> DispatchResult<WarehouseSet>;
}

/// Warehouses supplied directly by the application.
#[derive(Debug, Clone)]
pub struct InMemoryWarehouses {
    points: Vec<(String, Position)>,
    extent: Extent,
}

impl InMemoryWarehouses {
    pub fn new(positions: Vec<Position>, extent: Extent) -> Self {
        let points = positions
            .into_iter()
            .enumerate()
            .map(|(i, p)| (format!("warehouse-{i}"), p))
            .collect();
        Self { points, extent }
    }

    pub fn named(points: Vec<(String, Position)>, extent: Extent) -> Self {
        Self { points, extent }
    }
}

impl WarehouseSource for InMemoryWarehouses {
    fn load(&self) -> DispatchResult<WarehouseSet> {
        WarehouseSet::new(self.points.iter().cloned(), self.extent)
    }
}
