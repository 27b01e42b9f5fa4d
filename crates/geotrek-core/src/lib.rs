//! Geotrek Core - Topology-aware geometry composition and serialization
//!
//! This library places trail-network features (treks, POIs, outdoor sites, interventions,
//! zoning areas...) either on linear/point topologies over a path network or on raw
//! geometries, and turns them into the formats served by the public API.
//!
//! # Architecture
//!
//! - **[`Geometry`]**: SRID-tagged 3D-aware geometry with explicit reprojection and
//!   2D/3D length computation
//! - **[`Path`] / [`Topology`]**: the trail network and the ordered path-segment
//!   traversals resolved into concrete geometry on every read
//! - **[`FeatureStore`]**: in-memory spatial store with a quadtree envelope index,
//!   backing [`intersecting`] queries
//! - **[`Hierarchy`] / [`SiteTree`]**: ordered trek itineraries and the outdoor site tree
//! - **[`serialize`]**: record projection and the GeoJSON, tabular, GPX/KML and Cirkwi
//!   fan-out
//!
//! Nothing in this crate caches resolved geometry: each read goes back to the current
//! path geometry.

mod config;
mod feature;
mod geometry;
mod hierarchy;
mod intersecting;
mod network;
mod properties;
mod quadtree;
pub mod serialize;
mod store;
mod topology;
mod translation;
pub mod utils;

// Public API exports
pub use config::{Config, TrackFormat};
pub use feature::{Attachment, Feature, FeatureId, FeatureKind, Placement, Publication};
pub use geometry::{
    Bbox, Coord3, Geometry, Shape, Srid, length2d, length3d, simplify_bbox, simplify_coords,
    transform,
};
pub use hierarchy::{Hierarchy, OrderedChild, SiteTree};
pub use intersecting::{Intersecting, intersecting, intersecting_geometry};
pub use network::{Path, PathId};
pub use properties::{PropertyRegistry, PropertyValue};
pub use quadtree::Quadtree;
pub use store::{FeatureStore, SpatialStore, StoreInfo};
pub use topology::{PathSource, Topology, TopologySegment, locate_point, resolve};
pub use translation::{
    Language, TRANSLATED_FIELDS, Translations, get_translated, is_translated, translation_or_map,
};

/// Error types for the geometry core
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Unknown spatial reference system: EPSG:{0}")]
    InvalidSrid(u32),

    #[error("SRID mismatch: expected EPSG:{expected}, found EPSG:{found}")]
    SridMismatch { expected: u32, found: u32 },

    #[error("Topology resolves to no geometry")]
    EmptyTopology,

    #[error("Invalid topology: {0}")]
    InvalidTopology(String),

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Unknown path: {0}")]
    UnknownPath(PathId),

    #[error("Unknown feature: {0}")]
    UnknownFeature(FeatureId),

    #[error("Cyclic hierarchy: {child} cannot be attached under {parent}")]
    CyclicHierarchy { parent: FeatureId, child: FeatureId },

    #[error("Intersection query failed: {0}")]
    IntersectionQueryFailure(String),

    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),

    #[error("Media error: {0}")]
    Media(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("GPX error: {0}")]
    Gpx(#[from] gpx::errors::GpxError),

    #[error("XML error: {0}")]
    Xml(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
