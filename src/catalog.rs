//! Scraped data model
//!
//! The catalog maps a product's display name to everything scraped about it.
//! On disk it is a single flat JSON object:
//!
//! ```json
//! {
//!   "Biscuiti cu cacao 100g": {
//!     "link": "https://shop.example/p/123",
//!     "nutritional_info": { "Fibre": "2.1 g", "Sodiu": "N/A" },
//!     "Ingrediente": "faina, zahar",
//!     "Alergeni": "N/A"
//!   }
//! }
//! ```

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Placeholder stored for any field the product page does not carry.
pub const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    /// Absolute URL of the product detail page
    pub link: String,

    /// Nutrient name -> value, filled once the product page has been visited
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nutritional_info: Option<BTreeMap<String, String>>,

    /// Free-text sections such as ingredients and allergens
    #[serde(flatten)]
    pub details: BTreeMap<String, String>,
}

impl ProductRecord {
    pub fn new(link: impl Into<String>) -> Self {
        Self {
            link: link.into(),
            ..Default::default()
        }
    }

    /// Whether the product page has already been scraped.
    pub fn is_extracted(&self) -> bool {
        self.nutritional_info.is_some()
    }
}

/// Product name -> record. Names are assumed unique within a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    products: BTreeMap<String, ProductRecord>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from `(name, link)` pairs read off the listing page.
    ///
    /// A repeated name keeps the link seen last.
    pub fn from_listing<I, N, L>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (N, L)>,
        N: Into<String>,
        L: Into<String>,
    {
        let products = pairs
            .into_iter()
            .map(|(name, link)| (name.into(), ProductRecord::new(link)))
            .collect();
        Self { products }
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&ProductRecord> {
        self.products.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut ProductRecord> {
        self.products.get_mut(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, record: ProductRecord) {
        self.products.insert(name.into(), record);
    }

    /// `(name, link)` for every product, detached from the catalog so it can
    /// be mutated while iterating.
    pub fn links(&self) -> Vec<(String, String)> {
        self.products
            .iter()
            .map(|(name, record)| (name.clone(), record.link.clone()))
            .collect()
    }
}

/// Map a field lookup onto its stored value.
///
/// A missing element is expected on plenty of product pages and becomes
/// [`NOT_AVAILABLE`]; any other failure is real and propagates.
pub fn field_or_sentinel(lookup: Result<String>) -> Result<String> {
    match lookup {
        Ok(value) => Ok(value),
        Err(e) if e.is_not_found() => Ok(NOT_AVAILABLE.to_string()),
        Err(e) => Err(e),
    }
}
