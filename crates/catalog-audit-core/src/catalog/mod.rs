pub mod client;
pub mod wire;

pub use client::{CatalogClient, HttpCatalogClient};
pub use wire::CollectionPayload;
