//! Static map data and the order vocabulary.
//!
//! Everything here is either immutable program data (provinces, the
//! adjacency graph) or plain value types (units, orders) with no game
//! logic attached.

pub mod adjacency;
pub mod order;
pub mod province;
pub mod unit;

pub use adjacency::{coasts_into, neighbors, reachable, Edge, EdgeKind, Map, EDGES, EDGE_COUNT};
pub use order::{BuildAction, BuildOrder, Order, RetreatOrder, UnitRef};
pub use province::{
    Coast, Power, Province, ProvinceData, Terrain, ALL_POWERS, ALL_PROVINCES, HOME_CENTER_COUNT,
    PROVINCE_COUNT, PROVINCE_TABLE, SUPPLY_CENTER_COUNT,
};
pub use unit::{Unit, UnitKind};
