use std::collections::HashMap;

use polars::df;
use polars::prelude::*;

use crate::error::{PipelineError, Result};

struct JoinedRow {
    user_id: i64,
    category: String,
    date: String,
    quantity: i64,
}

/// Collapses the joined cart rows to one row per user, answering two
/// questions: the latest cart activity and the dominant product category.
///
/// Three group-by-and-reduce passes over the rows in their original order:
/// max of the normalized date per user, summed quantity per (user, category),
/// then an argmax over those sums to pick the category. A strict comparison
/// during the collapse keeps the first-encountered category when two sums
/// tie. Output rows are sorted by user id. The per-category sums are working
/// state and never appear in the output.
pub fn aggregate(df: &DataFrame) -> Result<DataFrame> {
    let rows = collect_rows(df)?;

    let mut last_dates: HashMap<i64, &str> = HashMap::new();
    for row in &rows {
        last_dates
            .entry(row.user_id)
            .and_modify(|current| {
                if row.date.as_str() > *current {
                    *current = row.date.as_str();
                }
            })
            .or_insert(row.date.as_str());
    }

    let mut category_totals: HashMap<(i64, &str), i64> = HashMap::new();
    for row in &rows {
        *category_totals
            .entry((row.user_id, row.category.as_str()))
            .or_insert(0) += row.quantity;
    }

    let mut dominant: HashMap<i64, (&str, i64)> = HashMap::new();
    let mut users: Vec<i64> = Vec::new();
    for row in &rows {
        let total = category_totals[&(row.user_id, row.category.as_str())];
        let best = dominant.get(&row.user_id).map(|&(_, best)| best);
        match best {
            None => {
                users.push(row.user_id);
                dominant.insert(row.user_id, (row.category.as_str(), total));
            }
            // strict comparison: an equal total never displaces the
            // first-encountered category
            Some(best) if total > best => {
                dominant.insert(row.user_id, (row.category.as_str(), total));
            }
            Some(_) => {}
        }
    }
    users.sort_unstable();

    let mut user_ids: Vec<i64> = Vec::with_capacity(users.len());
    let mut categories: Vec<String> = Vec::with_capacity(users.len());
    let mut dates: Vec<String> = Vec::with_capacity(users.len());
    for user in users {
        let (category, _) = dominant[&user];
        user_ids.push(user);
        categories.push(category.to_string());
        dates.push(last_dates[&user].to_string());
    }

    let summary = df![
        "userId" => user_ids,
        "category" => categories,
        "last_date_add_to_cart" => dates,
    ]?;

    Ok(summary)
}

fn collect_rows(df: &DataFrame) -> Result<Vec<JoinedRow>> {
    let user_ids = df.column("userId")?.as_materialized_series().i64()?.clone();
    let categories = df.column("category")?.as_materialized_series().str()?.clone();
    let dates = df.column("date")?.as_materialized_series().str()?.clone();
    let quantities = df.column("quantity")?.as_materialized_series().i64()?.clone();

    let mut rows = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        let (Some(user_id), Some(category), Some(date), Some(quantity)) = (
            user_ids.get(idx),
            categories.get(idx),
            dates.get(idx),
            quantities.get(idx),
        ) else {
            return Err(PipelineError::Processing(format!(
                "joined row {idx} holds a null field"
            )));
        };
        rows.push(JoinedRow {
            user_id,
            category: category.to_string(),
            date: date.to_string(),
            quantity,
        });
    }

    Ok(rows)
}
