use std::collections::HashMap;

use polars::df;
use polars::prelude::*;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{PipelineError, Result};

#[derive(Debug, Deserialize)]
struct CartRecord {
    id: i64,
    #[serde(rename = "userId")]
    user_id: i64,
    date: String,
    products: Vec<CartEntry>,
}

#[derive(Debug, Deserialize)]
struct CartEntry {
    #[serde(rename = "productId")]
    product_id: i64,
    quantity: i64,
}

#[derive(Debug, Deserialize)]
struct ProductRecord {
    id: i64,
    category: String,
}

/// Explodes every cart into one row per nested product entry, copying the
/// cart's top-level fields onto each row, then inner-joins the product
/// catalog to attach a category. Rows whose productId has no catalog match
/// are dropped; a cart with an absent or malformed `products` list aborts
/// the transformation. Output rows keep the cart-row order.
pub fn normalize_and_join(carts: &[Value], products: &[Value]) -> Result<DataFrame> {
    let catalog = product_catalog(products)?;

    let mut cart_ids: Vec<i64> = Vec::new();
    let mut user_ids: Vec<i64> = Vec::new();
    let mut dates: Vec<String> = Vec::new();
    let mut product_ids: Vec<i64> = Vec::new();
    let mut quantities: Vec<i64> = Vec::new();
    let mut categories: Vec<String> = Vec::new();

    for (index, raw) in carts.iter().enumerate() {
        let cart: CartRecord = serde_json::from_value(raw.clone())
            .map_err(|source| PipelineError::MalformedCart { index, source })?;

        for entry in &cart.products {
            let Some(category) = catalog.get(&entry.product_id) else {
                continue;
            };
            cart_ids.push(cart.id);
            user_ids.push(cart.user_id);
            dates.push(cart.date.clone());
            product_ids.push(entry.product_id);
            quantities.push(entry.quantity);
            categories.push(category.clone());
        }
    }

    let joined = df![
        "id" => cart_ids,
        "userId" => user_ids,
        "date" => dates,
        "productId" => product_ids,
        "quantity" => quantities,
        "category" => categories,
    ]?;

    Ok(joined)
}

/// Projects the raw product records down to an id -> category lookup table.
fn product_catalog(products: &[Value]) -> Result<HashMap<i64, String>> {
    let mut catalog = HashMap::with_capacity(products.len());
    for (index, raw) in products.iter().enumerate() {
        let product: ProductRecord = serde_json::from_value(raw.clone())
            .map_err(|source| PipelineError::MalformedProduct { index, source })?;
        catalog.insert(product.id, product.category);
    }
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_products() -> Vec<Value> {
        vec![
            json!({"id": 1, "title": "Backpack", "price": 109.95, "category": "men's clothing"}),
            json!({"id": 2, "title": "Monitor", "price": 999.99, "category": "electronics"}),
        ]
    }

    #[test]
    fn explodes_carts_and_copies_parent_fields() {
        let carts = vec![json!({
            "id": 10,
            "userId": 3,
            "date": "2020-03-02T00:00:02.000Z",
            "products": [
                {"productId": 1, "quantity": 4},
                {"productId": 2, "quantity": 1},
            ],
        })];

        let df = normalize_and_join(&carts, &sample_products()).expect("join failed");

        assert_eq!(df.height(), 2);
        assert_eq!(
            df.get_column_names(),
            ["id", "userId", "date", "productId", "quantity", "category"]
        );

        let user_ids = df.column("userId").unwrap().as_materialized_series().i64().unwrap().clone();
        assert_eq!(user_ids.get(0), Some(3));
        assert_eq!(user_ids.get(1), Some(3));

        let dates = df.column("date").unwrap().as_materialized_series().str().unwrap().clone();
        assert_eq!(dates.get(1), Some("2020-03-02T00:00:02.000Z"));
    }

    #[test]
    fn join_recovers_the_product_category() {
        let carts = vec![json!({
            "id": 11,
            "userId": 1,
            "date": "2020-01-01T00:00:00.000Z",
            "products": [{"productId": 2, "quantity": 1}],
        })];

        let df = normalize_and_join(&carts, &sample_products()).expect("join failed");

        let categories = df.column("category").unwrap().as_materialized_series().str().unwrap().clone();
        assert_eq!(categories.get(0), Some("electronics"));
    }

    #[test]
    fn unresolved_product_ids_are_dropped() {
        let carts = vec![json!({
            "id": 12,
            "userId": 2,
            "date": "2020-01-01T00:00:00.000Z",
            "products": [
                {"productId": 1, "quantity": 2},
                {"productId": 999, "quantity": 7},
            ],
        })];

        let df = normalize_and_join(&carts, &sample_products()).expect("join failed");

        assert_eq!(df.height(), 1);
        let product_ids = df.column("productId").unwrap().as_materialized_series().i64().unwrap().clone();
        assert_eq!(product_ids.get(0), Some(1));
    }

    #[test]
    fn missing_products_list_is_fatal() {
        let carts = vec![json!({
            "id": 13,
            "userId": 2,
            "date": "2020-01-01T00:00:00.000Z",
        })];

        let err = normalize_and_join(&carts, &sample_products()).unwrap_err();
        assert!(matches!(err, PipelineError::MalformedCart { index: 0, .. }));
    }

    #[test]
    fn malformed_nested_entry_is_fatal() {
        let carts = vec![json!({
            "id": 14,
            "userId": 2,
            "date": "2020-01-01T00:00:00.000Z",
            "products": [{"productId": "not-a-number", "quantity": 1}],
        })];

        assert!(normalize_and_join(&carts, &sample_products()).is_err());
    }

    #[test]
    fn empty_carts_produce_an_empty_table() {
        let df = normalize_and_join(&[], &sample_products()).expect("join failed");
        assert_eq!(df.height(), 0);
        assert_eq!(
            df.get_column_names(),
            ["id", "userId", "date", "productId", "quantity", "category"]
        );
    }
}
