//! Plain-text rendering of command results.

use foodshare_core::formatting::{format_count, percentage, render_table};
use foodshare_core::models::{FoodListing, TableCounts};
use foodshare_store::analytics::{Kpis, LabelCount};
use foodshare_store::listings::FilterOptions;
use foodshare_store::named_queries::InsightRun;
use foodshare_store::{QueryTable, RebuildReport};

fn headers(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

pub fn listings(rows: &[FoodListing]) -> String {
    if rows.is_empty() {
        return "No listings.\n".to_string();
    }
    let body: Vec<Vec<String>> = rows
        .iter()
        .map(|l| {
            vec![
                l.food_id.to_string(),
                l.food_name.clone(),
                l.quantity.map(|q| q.to_string()).unwrap_or_default(),
                l.expiry_date.map(|d| d.to_string()).unwrap_or_default(),
                l.location.clone(),
                l.provider_type.clone(),
                l.food_type.to_string(),
                l.meal_type.to_string(),
            ]
        })
        .collect();
    render_table(
        &headers(&[
            "Food_ID",
            "Food_Name",
            "Quantity",
            "Expiry_Date",
            "Location",
            "Provider_Type",
            "Food_Type",
            "Meal_Type",
        ]),
        &body,
    )
}

pub fn counts(counts: &TableCounts) -> String {
    let body: Vec<Vec<String>> = counts
        .as_pairs()
        .iter()
        .map(|(table, n)| vec![table.to_string(), format_count(*n as i64)])
        .collect();
    render_table(&headers(&["Table", "Rows"]), &body)
}

pub fn rebuild(report: &RebuildReport) -> String {
    let mut out = format!("Store rebuilt at {}\n\n", report.store_path.display());
    let body: Vec<Vec<String>> = report
        .counts
        .as_pairs()
        .iter()
        .zip(report.normalize.tables())
        .map(|((table, rows), (_, t))| {
            vec![
                table.to_string(),
                format_count(t.input_rows as i64),
                format_count(*rows as i64),
                format_count(t.rows_dropped() as i64),
                format_count(t.coerced_values as i64),
            ]
        })
        .collect();
    out.push_str(&render_table(
        &headers(&["Table", "Read", "Stored", "Dropped", "Coerced"]),
        &body,
    ));
    for path in &report.synthesized_sources {
        out.push_str(&format!("Synthesized fixture source: {}\n", path.display()));
    }
    out
}

pub fn kpis(kpis: &Kpis) -> String {
    let body = vec![
        vec!["Providers".to_string(), format_count(kpis.providers)],
        vec!["Receivers".to_string(), format_count(kpis.receivers)],
        vec!["Listings".to_string(), format_count(kpis.listings)],
        vec!["Total quantity".to_string(), format_count(kpis.total_quantity)],
    ];
    render_table(&headers(&["Metric", "Value"]), &body)
}

/// Grouped counts with each group's share of the total.
pub fn label_counts(label: &str, rows: &[LabelCount]) -> String {
    let total: i64 = rows.iter().map(|r| r.count).sum();
    let body: Vec<Vec<String>> = rows
        .iter()
        .map(|r| {
            vec![
                r.label.clone(),
                format_count(r.count),
                format!("{:.1}%", percentage(r.count as f64, total as f64, 1)),
            ]
        })
        .collect();
    render_table(&headers(&[label, "Count", "Share"]), &body)
}

pub fn filter_options(options: &FilterOptions) -> String {
    let mut out = String::new();
    for (title, values) in [
        ("Cities", &options.cities),
        ("Provider types", &options.provider_types),
        ("Food types", &options.food_types),
        ("Meal types", &options.meal_types),
    ] {
        out.push_str(&format!("{}: {}\n", title, values.join(", ")));
    }
    out
}

pub fn query_table(table: &QueryTable) -> String {
    if table.columns.is_empty() {
        return "(no columns)\n".to_string();
    }
    let mut out = render_table(&table.columns, &table.text_rows());
    out.push_str(&format!("({} rows)\n", table.len()));
    out
}

pub fn insights(run: &InsightRun) -> String {
    let mut out = format!(
        "Parameters: city = {}, days = {}, today = {}\n",
        run.params.city, run.params.days, run.params.today
    );
    for result in &run.results {
        out.push_str(&format!("\n── {} ──\n", result.name));
        match &result.outcome {
            Ok(table) => out.push_str(&query_table(table)),
            Err(e) => out.push_str(&format!("Error running query: {}\n", e)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use foodshare_core::models::{FoodType, MealType};
    use serde_json::json;

    #[test]
    fn test_listings_blank_optional_cells() {
        let rows = vec![FoodListing {
            food_id: 7,
            food_name: "Idli".to_string(),
            quantity: None,
            expiry_date: NaiveDate::from_ymd_opt(2025, 6, 2),
            provider_id: 1,
            provider_type: "Restaurant".to_string(),
            location: "Bengaluru".to_string(),
            food_type: FoodType::Vegetarian,
            meal_type: MealType::Breakfast,
        }];
        let out = listings(&rows);
        let line = out.lines().nth(2).unwrap();
        assert!(line.starts_with("7"));
        assert!(line.contains("2025-06-02"));
        assert!(line.ends_with("Breakfast"));
    }

    #[test]
    fn test_listings_empty() {
        assert_eq!(listings(&[]), "No listings.\n");
    }

    #[test]
    fn test_counts_table() {
        let out = counts(&TableCounts {
            providers: 1200,
            receivers: 2,
            food_listings: 3,
            claims: 4,
        });
        assert!(out.contains("providers      1,200"));
    }

    #[test]
    fn test_label_counts_share() {
        let rows = vec![
            LabelCount {
                label: "Pending".to_string(),
                count: 1,
            },
            LabelCount {
                label: "Completed".to_string(),
                count: 3,
            },
        ];
        let out = label_counts("Status", &rows);
        assert!(out.contains("25.0%"));
        assert!(out.contains("75.0%"));
    }

    #[test]
    fn test_query_table_row_count() {
        let table = QueryTable {
            columns: vec!["n".to_string()],
            rows: vec![vec![json!(1)], vec![json!(null)]],
        };
        let out = query_table(&table);
        assert!(out.ends_with("(2 rows)\n"));
    }
}
