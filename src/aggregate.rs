//! Per-category product counts derived from the live catalog

use std::collections::HashMap;

use crate::models::{CategorySummary, Product, ALL_CATEGORIES};
use crate::seed::CATEGORY_DESCRIPTORS;

/// Category name to product count, including the synthetic "All" entry.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CategoryCounts(HashMap<String, usize>);

impl CategoryCounts {
    /// Zero for names with no products.
    pub fn get(&self, category: &str) -> usize {
        self.0.get(category).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.get(ALL_CATEGORIES)
    }

    pub fn as_map(&self) -> &HashMap<String, usize> {
        &self.0
    }
}

pub fn category_counts(products: &[Product]) -> CategoryCounts {
    let mut counts = HashMap::new();
    counts.insert(ALL_CATEGORIES.to_string(), products.len());
    for product in products {
        *counts
            .entry(product.category.as_str().to_string())
            .or_insert(0) += 1;
    }
    CategoryCounts(counts)
}

/// Category pills in display order with freshly computed counts.
pub fn category_summaries(products: &[Product]) -> Vec<CategorySummary> {
    let counts = category_counts(products);
    CATEGORY_DESCRIPTORS
        .iter()
        .map(|d| CategorySummary {
            name: d.name.to_string(),
            id: d.id.to_string(),
            icon: d.icon.to_string(),
            count: counts.get(d.name),
        })
        .collect()
}
