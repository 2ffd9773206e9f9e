//! Category and free-text filtering of the catalog

use crate::models::{Product, ALL_CATEGORIES};

/// True when `product` belongs to `category`. Unknown labels match nothing.
pub fn matches_category(product: &Product, category: &str) -> bool {
    category == ALL_CATEGORIES || product.category.as_str() == category
}

/// Case-insensitive substring match on name or code. An empty query matches everything.
pub fn matches_query(product: &Product, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    let needle = query.to_lowercase();
    product.name.to_lowercase().contains(&needle) || product.code.to_lowercase().contains(&needle)
}

/// Visible subset for a category/query pair, in catalog order.
pub fn filter_products<'a>(products: &'a [Product], category: &str, query: &str) -> Vec<&'a Product> {
    products
        .iter()
        .filter(|p| matches_category(p, category) && matches_query(p, query))
        .collect()
}

/// Resolves a product's related ids against the catalog, skipping ids that no longer exist.
pub fn related_products<'a>(products: &'a [Product], product: &Product) -> Vec<&'a Product> {
    product
        .related_products
        .iter()
        .flatten()
        .filter_map(|id| products.iter().find(|p| &p.id == id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProductCategory;
    use crate::seed::seed_products;
    use pretty_assertions::assert_eq;

    fn ids<'a>(products: &[&'a Product]) -> Vec<&'a str> {
        products.iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn empty_query_on_all_returns_catalog_in_order() {
        let catalog = seed_products();
        let visible = filter_products(&catalog, "All", "");
        let expected: Vec<&str> = catalog.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids(&visible), expected);
    }

    #[test]
    fn category_and_query_combine() {
        let catalog = seed_products();
        let visible = filter_products(&catalog, "Routing", "ccr");
        assert_eq!(ids(&visible), vec!["ccr2004-12s"]);
        assert_eq!(visible[0].name, "MikroTik® CCR2004-1G-12S+2XS");
    }

    #[test]
    fn query_matches_code_case_insensitively() {
        let catalog = seed_products();
        let visible = filter_products(&catalog, "All", "CLOUD ROUTER");
        assert_eq!(ids(&visible), vec!["crs518", "crs326"]);
    }

    #[test]
    fn description_is_not_searched() {
        let catalog = seed_products();
        assert!(filter_products(&catalog, "All", "hotels").is_empty());
    }

    #[test]
    fn unknown_category_and_empty_catalog_yield_nothing() {
        let catalog = seed_products();
        assert!(filter_products(&catalog, "Servers", "").is_empty());
        assert!(filter_products(&[], "All", "").is_empty());
    }

    #[test]
    fn filter_is_exactly_the_predicate() {
        let catalog = seed_products();
        let categories = ["All", "Routing", "Switching", "Wireless", "5G/LTE", "IoT", "Accessories", "Nope"];
        let queries = ["", "mikrotik", "ax", "SFP", "zzz", "®"];
        for category in categories {
            for query in queries {
                let visible = filter_products(&catalog, category, query);
                let expected: Vec<&Product> = catalog
                    .iter()
                    .filter(|p| {
                        (category == "All" || p.category.as_str() == category)
                            && (p.name.to_lowercase().contains(&query.to_lowercase())
                                || p.code.to_lowercase().contains(&query.to_lowercase()))
                    })
                    .collect();
                assert_eq!(visible, expected, "{category}/{query}");
                assert_eq!(filter_products(&catalog, category, query), visible);
            }
        }
    }

    #[test]
    fn related_products_tolerate_dangling_ids() {
        let mut catalog = seed_products();
        catalog[0].related_products = Some(vec!["rb5009".into(), "gone".into(), "s-rj10".into()]);
        let product = catalog[0].clone();
        let related = related_products(&catalog, &product);
        assert_eq!(ids(&related), vec!["rb5009", "s-rj10"]);
        assert!(related.iter().all(|p| p.category != ProductCategory::IoT));
    }
}
