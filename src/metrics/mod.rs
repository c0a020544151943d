//! Prometheus exposition
//!
//! Namespaced responses (`steam_`, `osrs_`) are rendered from a registry built
//! for that single request, so one user's labels never show up in another
//! user's scrape. The exporter's own counters live in a long-lived
//! [`ExporterMetrics`] registry.

pub mod exporter;
pub mod osrs;
pub mod steam;

pub use exporter::ExporterMetrics;
pub use osrs::{render_player, render_worlds};
pub use steam::render_steam;

use prometheus::{Encoder, Registry, TextEncoder};

/// `Content-Type` of the text exposition format
pub fn content_type() -> String {
    TextEncoder::new().format_type().to_string()
}

pub fn encode(registry: &Registry) -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&registry.gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}
