//! Results file
//!
//! The JSON file is both the output and the record of which products have
//! been seen. Every save rewrites it from scratch.

use crate::catalog::Catalog;
use crate::error::Result;
use serde::Serialize;
use std::path::Path;

pub async fn exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

pub async fn load(path: &Path) -> Result<Catalog> {
    let raw = tokio::fs::read(path).await?;
    let catalog = serde_json::from_slice(&raw)?;
    Ok(catalog)
}

pub async fn save(path: &Path, catalog: &Catalog) -> Result<()> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"  ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    catalog.serialize(&mut ser)?;

    tokio::fs::write(path, buf).await?;
    log::debug!("Wrote {} products to {}", catalog.len(), path.display());
    Ok(())
}
