//! Synthetic San Diego street grid.
//!
//! A regular grid of surface streets covering the simulation extent, with
//! one faster east–west arterial through the middle row.  Stands in for a
//! real street network so the demo runs without external data.

use fleet_core::Position;
use fleet_spatial::{RoadNetwork, RoadNetworkBuilder};

const WEST:  f64 = -117.255;
const EAST:  f64 = -117.052;
const SOUTH: f64 = 32.672;
const NORTH: f64 = 32.752;

const COLS: u32 = 12;
const ROWS: u32 = 8;

/// ~30 mph.
const STREET_SPEED_MPS:   f64 = 13.4;
/// ~65 mph.
const ARTERIAL_SPEED_MPS: f64 = 29.0;

/// Build the `COLS × ROWS` grid.  Node `r * COLS + c` sits at row `r`
/// (south to north), column `c` (west to east).
pub fn build_network() -> RoadNetwork {
    let mut b = RoadNetworkBuilder::with_capacity((COLS * ROWS) as usize, (4 * COLS * ROWS) as usize);

    let lon_step = (EAST - WEST) / f64::from(COLS - 1);
    let lat_step = (NORTH - SOUTH) / f64::from(ROWS - 1);

    for r in 0..ROWS {
        for c in 0..COLS {
            b.add_node(Position::new(
                WEST + f64::from(c) * lon_step,
                SOUTH + f64::from(r) * lat_step,
            ));
        }
    }

    let node = |r: u32, c: u32| r * COLS + c;
    let arterial_row = ROWS / 2;

    for r in 0..ROWS {
        for c in 0..COLS {
            if c + 1 < COLS {
                let speed = if r == arterial_row { ARTERIAL_SPEED_MPS } else { STREET_SPEED_MPS };
                b.add_street(node(r, c), node(r, c + 1), speed);
            }
            if r + 1 < ROWS {
                b.add_street(node(r, c), node(r + 1, c), STREET_SPEED_MPS);
            }
        }
    }

    b.build()
}
