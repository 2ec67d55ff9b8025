// src/api/mod.rs
//! Remote feature-query service: request parameters, the `FeatureSource` trait
//! and the Wikimapia box API client.

pub mod client;
pub mod models;

pub use client::{BoxQuery, FeatureSource, WikimapiaClient};
pub use models::{parse_box_response, RawFeature, RawRecord};
