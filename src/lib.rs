//! Spatial aggregation and layer lifecycle for geolocated game telemetry,
//! drawn on a Braille terminal canvas.
//!
//! [`orchestrator::Orchestrator::render`] is the single entry point: it
//! filters records, fits a viewport, aggregates by mode (markers, density or
//! grid) and replaces whatever the container showed before.

pub mod aggregate;
pub mod braille;
pub mod config;
pub mod data;
pub mod error;
pub mod filter;
pub mod geo;
pub mod icons;
pub mod legend;
pub mod map;
pub mod names;
pub mod orchestrator;
pub mod record;
pub mod sizing;
pub mod summary;
pub mod surface;
