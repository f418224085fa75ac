mod bootstrap;
mod render;

use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime};
use foodshare_core::settings::{Command, Settings};
use foodshare_core::time_utils::{now_in, resolve_timezone, today_in};
use foodshare_data::reader::{LoadOptions, SourcePaths};
use foodshare_store::listings::ListingFilter;
use foodshare_store::named_queries::{InsightParams, QueryLibrary};
use foodshare_store::schema::Schema;
use foodshare_store::{FoodStore, SqlValue, StoreError, StoreStatus};
use serde::Serialize;
use serde_json::json;

fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();

    bootstrap::ensure_directories()?;
    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_ref())?;

    tracing::info!("foodshare v{} starting", env!("CARGO_PKG_VERSION"));

    let tz = resolve_timezone(&settings.timezone);
    let store = FoodStore::new(&settings.db_path)
        .with_schema(Schema::resolve(settings.schema.as_deref())?);

    match run(&settings, &store, today_in(tz), now_in(tz)) {
        Err(e) if e.downcast_ref::<StoreError>().is_some_and(StoreError::is_not_built) => {
            eprintln!(
                "Store not yet built at {}. Run `foodshare rebuild` to create it from {}.",
                store.path().display(),
                settings.data_dir.display()
            );
            std::process::exit(2);
        }
        other => other,
    }
}

fn run(settings: &Settings, store: &FoodStore, today: NaiveDate, now: NaiveDateTime) -> Result<()> {
    let json = settings.json;

    match settings.subcommand() {
        Command::Rebuild => {
            let options = LoadOptions::new(!settings.no_fixture).with_reference(now);
            let report = store.rebuild(&SourcePaths::in_dir(&settings.data_dir), &options)?;
            emit(json, &report, || render::rebuild(&report))
        }

        Command::Status => {
            let status = store.status()?;
            emit(json, &status, || match &status {
                StoreStatus::Ready { path, counts } => {
                    format!("Store ready: {}\n\n{}", path.display(), render::counts(counts))
                }
                StoreStatus::NotBuilt { path } => format!(
                    "Store not yet built: {}\nRun `foodshare rebuild` to create it.\n",
                    path.display()
                ),
            })?;
            if !status.is_ready() {
                std::process::exit(2);
            }
            Ok(())
        }

        Command::Listings {
            city,
            provider_type,
            food_type,
            meal_type,
        } => {
            let filter = ListingFilter {
                locations: city,
                provider_types: provider_type,
                food_types: food_type,
                meal_types: meal_type,
            };
            let rows = store.filtered_listings(&filter)?;
            emit(json, &rows, || render::listings(&rows))
        }

        Command::Expiring { days } => {
            let rows = store.expiring_within(days, today)?;
            emit(json, &rows, || {
                format!(
                    "Listings expiring within {} days of {}\n\n{}",
                    days,
                    today,
                    render::listings(&rows)
                )
            })
        }

        Command::Stats => {
            let kpis = store.kpis()?;
            let per_location = store.listings_per_location()?;
            let per_status = store.claims_per_status()?;
            let per_meal = store.claims_per_meal_type()?;
            let value = json!({
                "kpis": kpis,
                "listings_per_location": per_location,
                "claims_per_status": per_status,
                "claims_per_meal_type": per_meal,
            });
            emit(json, &value, || {
                [
                    render::kpis(&kpis),
                    render::label_counts("Location", &per_location),
                    render::label_counts("Status", &per_status),
                    render::label_counts("Meal_Type", &per_meal),
                ]
                .join("\n")
            })
        }

        Command::Options => {
            let options = store.filter_options()?;
            emit(json, &options, || render::filter_options(&options))
        }

        Command::Insights { city, days } => {
            let library = QueryLibrary::resolve(settings.queries.as_deref())?;
            let params = InsightParams {
                city,
                days,
                today: Some(today),
            };
            let insights = library.run_all(store, &params)?;
            let value = json!({
                "params": insights.params,
                "results": insights.results.iter().map(|r| match &r.outcome {
                    Ok(table) => json!({"name": r.name, "sql": r.sql, "table": table}),
                    Err(e) => json!({"name": r.name, "sql": r.sql, "error": e.to_string()}),
                }).collect::<Vec<_>>(),
            });
            emit(json, &value, || render::insights(&insights))
        }

        Command::Query { sql, params } => {
            let params: Vec<SqlValue> = params.iter().map(|p| parse_param(p)).collect();
            let table = store.query(&sql, &params)?;
            emit(json, &table, || render::query_table(&table))
        }

        Command::Execute { sql, params } => {
            let params: Vec<SqlValue> = params.iter().map(|p| parse_param(p)).collect();
            let affected = store.execute(&sql, &params)?;
            emit(json, &json!({ "affected_rows": affected }), || {
                format!("{} row(s) affected\n", affected)
            })
        }
    }
}

/// Print `value` as JSON, or the text produced by `text`.
fn emit<T: Serialize>(json: bool, value: &T, text: impl FnOnce() -> String) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        print!("{}", text());
    }
    Ok(())
}

/// Interpret a command-line parameter: `NULL`, an integer, a real, or text.
fn parse_param(raw: &str) -> SqlValue {
    if raw.eq_ignore_ascii_case("null") {
        SqlValue::Null
    } else if let Ok(i) = raw.parse::<i64>() {
        SqlValue::Integer(i)
    } else if let Some(f) = raw.parse::<f64>().ok().filter(|f| f.is_finite()) {
        SqlValue::Real(f)
    } else {
        SqlValue::Text(raw.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_param() {
        assert_eq!(parse_param("NULL"), SqlValue::Null);
        assert_eq!(parse_param("101"), SqlValue::Integer(101));
        assert_eq!(parse_param("-3"), SqlValue::Integer(-3));
        assert_eq!(parse_param("2.5"), SqlValue::Real(2.5));
        assert_eq!(parse_param("inf"), SqlValue::Text("inf".to_string()));
        assert_eq!(parse_param("Chennai"), SqlValue::Text("Chennai".to_string()));
    }
}
