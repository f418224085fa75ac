//! Aggregate views over the store.

use rusqlite::Row;
use serde::Serialize;

use crate::access::FoodStore;
use crate::error::{Result, StatementContext};

/// Headline counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Kpis {
    pub providers: i64,
    pub receivers: i64,
    pub listings: i64,
    /// Sum of listing quantities, missing quantities counted as zero.
    pub total_quantity: i64,
}

/// One group of a `GROUP BY` count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelCount {
    pub label: String,
    pub count: i64,
}

impl FoodStore {
    pub fn kpis(&self) -> Result<Kpis> {
        const SQL: &str = "SELECT \
             (SELECT COUNT(*) FROM providers), \
             (SELECT COUNT(*) FROM receivers), \
             (SELECT COUNT(*) FROM food_listings), \
             (SELECT COALESCE(SUM(COALESCE(Quantity, 0)), 0) FROM food_listings)";
        self.connect()?
            .query_row(SQL, [], |row| {
                Ok(Kpis {
                    providers: row.get(0)?,
                    receivers: row.get(1)?,
                    listings: row.get(2)?,
                    total_quantity: row.get(3)?,
                })
            })
            .with_sql(SQL)
    }

    /// Listing count per location, largest first.
    pub fn listings_per_location(&self) -> Result<Vec<LabelCount>> {
        self.fetch(
            "SELECT Location, COUNT(*) AS Listing_Count FROM food_listings \
             GROUP BY Location ORDER BY Listing_Count DESC, Location",
            Vec::new(),
            label_count,
        )
    }

    /// Claim count per status.
    pub fn claims_per_status(&self) -> Result<Vec<LabelCount>> {
        self.fetch(
            "SELECT Status, COUNT(*) AS Claim_Count FROM claims \
             GROUP BY Status ORDER BY Claim_Count DESC, Status",
            Vec::new(),
            label_count,
        )
    }

    /// Claim count per meal type of the claimed listing, largest first.
    pub fn claims_per_meal_type(&self) -> Result<Vec<LabelCount>> {
        self.fetch(
            "SELECT fl.Meal_Type, COUNT(*) AS Claim_Count \
             FROM claims c JOIN food_listings fl ON fl.Food_ID = c.Food_ID \
             GROUP BY fl.Meal_Type ORDER BY Claim_Count DESC, fl.Meal_Type",
            Vec::new(),
            label_count,
        )
    }
}

fn label_count(row: &Row<'_>) -> rusqlite::Result<LabelCount> {
    Ok(LabelCount {
        label: row.get(0)?,
        count: row.get(1)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::built_store;
    use rusqlite::types::Value;

    fn pairs(rows: &[LabelCount]) -> Vec<(&str, i64)> {
        rows.iter().map(|r| (r.label.as_str(), r.count)).collect()
    }

    #[test]
    fn test_kpis_fixture() {
        let (_dir, store) = built_store();
        assert_eq!(
            store.kpis().unwrap(),
            Kpis {
                providers: 2,
                receivers: 2,
                listings: 2,
                total_quantity: 70
            }
        );
    }

    #[test]
    fn test_kpis_treat_null_quantity_as_zero() {
        let (_dir, store) = built_store();
        store
            .execute("UPDATE food_listings SET Quantity = NULL WHERE Food_ID = ?1", &[Value::Integer(102)])
            .unwrap();
        assert_eq!(store.kpis().unwrap().total_quantity, 20);

        store.execute("DELETE FROM food_listings", &[]).unwrap();
        assert_eq!(store.kpis().unwrap().total_quantity, 0);
    }

    #[test]
    fn test_listings_per_location() {
        let (_dir, store) = built_store();
        store
            .execute(
                "UPDATE food_listings SET Location = 'Chennai' WHERE Food_ID = 101",
                &[],
            )
            .unwrap();
        assert_eq!(pairs(&store.listings_per_location().unwrap()), vec![("Chennai", 2)]);
    }

    #[test]
    fn test_claims_per_status() {
        let (_dir, store) = built_store();
        assert_eq!(
            pairs(&store.claims_per_status().unwrap()),
            vec![("Cancelled", 1), ("Completed", 1), ("Pending", 1)]
        );
    }

    #[test]
    fn test_claims_per_meal_type() {
        let (_dir, store) = built_store();
        assert_eq!(
            pairs(&store.claims_per_meal_type().unwrap()),
            vec![("Lunch", 2), ("Breakfast", 1)]
        );
    }
}
