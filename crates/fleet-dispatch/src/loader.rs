//! CSV warehouse loader.
//!
//! # CSV format
//!
//! One row per warehouse.  Coordinates are in the source's declared
//! reference (WGS-84 lon/lat or Web Mercator metres) and are converted to
//! WGS-84 on load.
//!
//! ```csv
//! name,x,y
//! Otay,-13033020.5,3857270.1
//! Miramar,-13040910.0,3860115.8
//! ```
//!
//! Rows are assigned `WarehouseId`s in file order.

use std::io::Read;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use fleet_core::SpatialReference;
use fleet_spatial::Extent;

use crate::{DispatchError, DispatchResult, WarehouseSet, WarehouseSource};

// ── CSV record ────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct WarehouseRecord {
    name: String,
    x:    f64,
    y:    f64,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load warehouses from a CSV file.
pub fn load_warehouses_csv(
    path:      &Path,
    reference: SpatialReference,
    extent:    Extent,
) -> DispatchResult<WarehouseSet> {
    let file = std::fs::File::open(path)
        .map_err(DispatchError::Io)?;
    load_warehouses_reader(file, reference, extent)
}

/// Like [`load_warehouses_csv`] but accepts any `Read` source.
pub fn load_warehouses_reader<R: Read>(
    reader:    R,
    reference: SpatialReference,
    extent:    Extent,
) -> DispatchResult<WarehouseSet> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut points = Vec::new();

    for result in csv_reader.deserialize::<WarehouseRecord>() {
        let row = result.map_err(|e| DispatchError::Parse(e.to_string()))?;
        points.push((row.name, reference.to_wgs84(row.x, row.y)));
    }

    WarehouseSet::new(points, extent)
}

// ── CsvWarehouseSource ────────────────────────────────────────────────────────

/// A [`WarehouseSource`] backed by a CSV file on disk.
#[derive(Debug, Clone)]
pub struct CsvWarehouseSource {
    path:      PathBuf,
    reference: SpatialReference,
    extent:    Extent,
}

impl CsvWarehouseSource {
    pub fn new(path: impl Into<PathBuf>, reference: SpatialReference, extent: Extent) -> Self {
        Self { path: path.into(), reference, extent }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl WarehouseSource for CsvWarehouseSource {
    fn load(&self) -> DispatchResult<WarehouseSet> {
        load_warehouses_csv(&self.path, self.reference, self.extent)
    }
}
