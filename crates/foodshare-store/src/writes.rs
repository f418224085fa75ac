//! Per-entity write operations.
//!
//! These are plain parameterized statements with no validation of their own;
//! the schema's key, reference and CHECK constraints are the only guard, and
//! a violation comes back as [`StoreError::Statement`](crate::error::StoreError)
//! carrying the statement text.

use chrono::NaiveDate;
use foodshare_core::models::{Claim, ClaimStatus, FoodListing, Provider, Receiver};
use rusqlite::params;
use tracing::debug;

use crate::access::FoodStore;
use crate::error::{Result, StatementContext};

// ── Statements ────────────────────────────────────────────────────────────────

pub(crate) const INSERT_PROVIDER: &str = "INSERT INTO providers \
     (Provider_ID, Name, Type, Address, City, Contact) VALUES (?1, ?2, ?3, ?4, ?5, ?6)";
pub(crate) const INSERT_RECEIVER: &str = "INSERT INTO receivers \
     (Receiver_ID, Name, Type, City, Contact) VALUES (?1, ?2, ?3, ?4, ?5)";
pub(crate) const INSERT_LISTING: &str = "INSERT INTO food_listings \
     (Food_ID, Food_Name, Quantity, Expiry_Date, Provider_ID, Provider_Type, Location, Food_Type, Meal_Type) \
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)";
pub(crate) const INSERT_CLAIM: &str = "INSERT INTO claims \
     (Claim_ID, Food_ID, Receiver_ID, Status, Timestamp) VALUES (?1, ?2, ?3, ?4, ?5)";

const UPDATE_PROVIDER: &str = "UPDATE providers \
     SET Name = ?2, Type = ?3, Address = ?4, City = ?5, Contact = ?6 WHERE Provider_ID = ?1";
const DELETE_PROVIDER: &str = "DELETE FROM providers WHERE Provider_ID = ?1";
const UPDATE_RECEIVER: &str = "UPDATE receivers \
     SET Name = ?2, Type = ?3, City = ?4, Contact = ?5 WHERE Receiver_ID = ?1";
const DELETE_RECEIVER: &str = "DELETE FROM receivers WHERE Receiver_ID = ?1";
const UPDATE_LISTING: &str =
    "UPDATE food_listings SET Quantity = ?2, Expiry_Date = ?3 WHERE Food_ID = ?1";
const DELETE_LISTING: &str = "DELETE FROM food_listings WHERE Food_ID = ?1";
const UPDATE_CLAIM_STATUS: &str = "UPDATE claims SET Status = ?2 WHERE Claim_ID = ?1";
const DELETE_CLAIM: &str = "DELETE FROM claims WHERE Claim_ID = ?1";

// ── Row binding ───────────────────────────────────────────────────────────────

pub(crate) fn insert_provider_row(conn: &rusqlite::Connection, p: &Provider) -> Result<usize> {
    conn.prepare_cached(INSERT_PROVIDER)
        .and_then(|mut stmt| {
            stmt.execute(params![
                p.provider_id,
                p.name,
                p.provider_type.as_str(),
                p.address,
                p.city,
                p.contact
            ])
        })
        .with_sql(INSERT_PROVIDER)
}

pub(crate) fn insert_receiver_row(conn: &rusqlite::Connection, r: &Receiver) -> Result<usize> {
    conn.prepare_cached(INSERT_RECEIVER)
        .and_then(|mut stmt| {
            stmt.execute(params![
                r.receiver_id,
                r.name,
                r.receiver_type.as_str(),
                r.city,
                r.contact
            ])
        })
        .with_sql(INSERT_RECEIVER)
}

pub(crate) fn insert_listing_row(conn: &rusqlite::Connection, l: &FoodListing) -> Result<usize> {
    conn.prepare_cached(INSERT_LISTING)
        .and_then(|mut stmt| {
            stmt.execute(params![
                l.food_id,
                l.food_name,
                l.quantity,
                l.expiry_date,
                l.provider_id,
                l.provider_type,
                l.location,
                l.food_type.as_str(),
                l.meal_type.as_str()
            ])
        })
        .with_sql(INSERT_LISTING)
}

pub(crate) fn insert_claim_row(conn: &rusqlite::Connection, c: &Claim) -> Result<usize> {
    conn.prepare_cached(INSERT_CLAIM)
        .and_then(|mut stmt| {
            stmt.execute(params![
                c.claim_id,
                c.food_id,
                c.receiver_id,
                c.status.as_str(),
                c.timestamp
            ])
        })
        .with_sql(INSERT_CLAIM)
}

// ── FoodStore write API ───────────────────────────────────────────────────────

/// Each operation opens its own connection and returns the number of rows
/// affected (0 when the key does not exist).
impl FoodStore {
    pub fn insert_provider(&self, provider: &Provider) -> Result<usize> {
        debug!(provider_id = provider.provider_id, "insert provider");
        insert_provider_row(&self.connect()?, provider)
    }

    pub fn update_provider(&self, provider: &Provider) -> Result<usize> {
        self.write(
            UPDATE_PROVIDER,
            params![
                provider.provider_id,
                provider.name,
                provider.provider_type.as_str(),
                provider.address,
                provider.city,
                provider.contact
            ],
        )
    }

    /// Deleting a provider also deletes its listings and their claims.
    pub fn delete_provider(&self, provider_id: i64) -> Result<usize> {
        self.write(DELETE_PROVIDER, params![provider_id])
    }

    pub fn insert_receiver(&self, receiver: &Receiver) -> Result<usize> {
        debug!(receiver_id = receiver.receiver_id, "insert receiver");
        insert_receiver_row(&self.connect()?, receiver)
    }

    pub fn update_receiver(&self, receiver: &Receiver) -> Result<usize> {
        self.write(
            UPDATE_RECEIVER,
            params![
                receiver.receiver_id,
                receiver.name,
                receiver.receiver_type.as_str(),
                receiver.city,
                receiver.contact
            ],
        )
    }

    /// Deleting a receiver also deletes its claims.
    pub fn delete_receiver(&self, receiver_id: i64) -> Result<usize> {
        self.write(DELETE_RECEIVER, params![receiver_id])
    }

    pub fn insert_listing(&self, listing: &FoodListing) -> Result<usize> {
        debug!(food_id = listing.food_id, "insert listing");
        insert_listing_row(&self.connect()?, listing)
    }

    /// Set a listing's quantity and expiry date.
    pub fn update_listing(
        &self,
        food_id: i64,
        quantity: Option<i64>,
        expiry_date: Option<NaiveDate>,
    ) -> Result<usize> {
        self.write(UPDATE_LISTING, params![food_id, quantity, expiry_date])
    }

    /// Deleting a listing also deletes its claims.
    pub fn delete_listing(&self, food_id: i64) -> Result<usize> {
        self.write(DELETE_LISTING, params![food_id])
    }

    pub fn insert_claim(&self, claim: &Claim) -> Result<usize> {
        debug!(claim_id = claim.claim_id, "insert claim");
        insert_claim_row(&self.connect()?, claim)
    }

    pub fn update_claim_status(&self, claim_id: i64, status: ClaimStatus) -> Result<usize> {
        self.write(UPDATE_CLAIM_STATUS, params![claim_id, status.as_str()])
    }

    pub fn delete_claim(&self, claim_id: i64) -> Result<usize> {
        self.write(DELETE_CLAIM, params![claim_id])
    }

    fn write(&self, sql: &str, params: impl rusqlite::Params) -> Result<usize> {
        let affected = self.connect()?.execute(sql, params).with_sql(sql)?;
        debug!(affected, "{}", sql);
        Ok(affected)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
