//! Turns loaded tables into constraint-satisfying ones.
//!
//! The passes run in a fixed order: key deduplication, key casting,
//! referential filtering (listings against providers, then claims against the
//! surviving listings and receivers) and finally categorical clamping. Nothing
//! here fails; every repair is counted in a [`NormalizeReport`].

use std::collections::HashSet;
use std::hash::Hash;

use foodshare_core::models::{
    Claim, ClaimStatus, FoodListing, FoodType, MealType, Provider, ProviderType, RawClaim,
    RawFoodListing, RawProvider, RawReceiver, Receiver, ReceiverType, TableCounts,
};
use serde::Serialize;
use tracing::{debug, info};

use crate::reader::RawTables;

// ── Public types ──────────────────────────────────────────────────────────────

/// The four tables after normalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanTables {
    pub providers: Vec<Provider>,
    pub receivers: Vec<Receiver>,
    pub listings: Vec<FoodListing>,
    pub claims: Vec<Claim>,
}

impl CleanTables {
    pub fn counts(&self) -> TableCounts {
        TableCounts {
            providers: self.providers.len(),
            receivers: self.receivers.len(),
            food_listings: self.listings.len(),
            claims: self.claims.len(),
        }
    }
}

/// What normalization did to one table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TableReport {
    pub input_rows: usize,
    /// Rows dropped because an earlier row had the same primary key.
    pub duplicate_keys: usize,
    /// Rows dropped because the primary key was missing or unparseable.
    pub null_keys: usize,
    /// Rows dropped because a foreign key did not resolve.
    pub orphaned: usize,
    /// Categorical cells replaced by their default.
    pub coerced_values: usize,
    pub output_rows: usize,
}

impl TableReport {
    fn new(input_rows: usize) -> Self {
        Self {
            input_rows,
            ..Self::default()
        }
    }

    /// Total rows removed from this table.
    pub fn rows_dropped(&self) -> usize {
        self.duplicate_keys + self.null_keys + self.orphaned
    }
}

/// Per-table summary of a normalization run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NormalizeReport {
    pub providers: TableReport,
    pub receivers: TableReport,
    pub food_listings: TableReport,
    pub claims: TableReport,
}

impl NormalizeReport {
    pub fn rows_dropped(&self) -> usize {
        self.tables().iter().map(|(_, t)| t.rows_dropped()).sum()
    }

    pub fn coerced_values(&self) -> usize {
        self.tables().iter().map(|(_, t)| t.coerced_values).sum()
    }

    /// `(table_name, report)` pairs in load order.
    pub fn tables(&self) -> [(&'static str, &TableReport); 4] {
        [
            ("providers", &self.providers),
            ("receivers", &self.receivers),
            ("food_listings", &self.food_listings),
            ("claims", &self.claims),
        ]
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Normalize the four raw tables.
///
/// The returned tables satisfy every key, reference and categorical
/// constraint of the store schema.
pub fn normalize(raw: RawTables) -> (CleanTables, NormalizeReport) {
    let mut report = NormalizeReport {
        providers: TableReport::new(raw.providers.len()),
        receivers: TableReport::new(raw.receivers.len()),
        food_listings: TableReport::new(raw.listings.len()),
        claims: TableReport::new(raw.claims.len()),
    };

    // ── Step 1: unique, non-null primary keys ─────────────────────────────────
    let providers = dedupe_by_key(raw.providers, |p| p.provider_id, &mut report.providers);
    let receivers = dedupe_by_key(raw.receivers, |r| r.receiver_id, &mut report.receivers);
    let listings = dedupe_by_key(raw.listings, |l| l.food_id, &mut report.food_listings);
    let claims = dedupe_by_key(raw.claims, |c| c.claim_id, &mut report.claims);

    // ── Step 2/3: referential filtering ───────────────────────────────────────
    let provider_ids: HashSet<i64> = providers.iter().map(|(id, _)| *id).collect();
    let listings: Vec<(i64, i64, RawFoodListing)> = listings
        .into_iter()
        .filter_map(|(food_id, listing)| match listing.provider_id {
            Some(provider_id) if provider_ids.contains(&provider_id) => {
                Some((food_id, provider_id, listing))
            }
            other => {
                debug!(food_id, provider_id = ?other, "dropping listing with unknown provider");
                report.food_listings.orphaned += 1;
                None
            }
        })
        .collect();

    // Claims resolve against the filtered listings, never the raw ones.
    let food_ids: HashSet<i64> = listings.iter().map(|(id, _, _)| *id).collect();
    let receiver_ids: HashSet<i64> = receivers.iter().map(|(id, _)| *id).collect();
    let claims: Vec<(i64, i64, i64, RawClaim)> = claims
        .into_iter()
        .filter_map(|(claim_id, claim)| match (claim.food_id, claim.receiver_id) {
            (Some(food_id), Some(receiver_id))
                if food_ids.contains(&food_id) && receiver_ids.contains(&receiver_id) =>
            {
                Some((claim_id, food_id, receiver_id, claim))
            }
            (food_id, receiver_id) => {
                debug!(claim_id, ?food_id, ?receiver_id, "dropping orphaned claim");
                report.claims.orphaned += 1;
                None
            }
        })
        .collect();

    // ── Step 4: categorical clamping ──────────────────────────────────────────
    let clean = CleanTables {
        providers: providers
            .into_iter()
            .map(|(id, p)| clean_provider(id, p, &mut report.providers))
            .collect(),
        receivers: receivers
            .into_iter()
            .map(|(id, r)| clean_receiver(id, r, &mut report.receivers))
            .collect(),
        listings: listings
            .into_iter()
            .map(|(id, provider_id, l)| clean_listing(id, provider_id, l, &mut report.food_listings))
            .collect(),
        claims: claims
            .into_iter()
            .map(|(id, food_id, receiver_id, c)| {
                clean_claim(id, food_id, receiver_id, c, &mut report.claims)
            })
            .collect(),
    };

    let counts = clean.counts();
    report.providers.output_rows = counts.providers;
    report.receivers.output_rows = counts.receivers;
    report.food_listings.output_rows = counts.food_listings;
    report.claims.output_rows = counts.claims;

    info!(
        providers = counts.providers,
        receivers = counts.receivers,
        food_listings = counts.food_listings,
        claims = counts.claims,
        dropped = report.rows_dropped(),
        coerced = report.coerced_values(),
        "normalized source tables"
    );

    (clean, report)
}

// ── Private helpers ───────────────────────────────────────────────────────────

/// Keep the first row for each non-null key, in source order.
fn dedupe_by_key<T, K, F>(rows: Vec<T>, key: F, report: &mut TableReport) -> Vec<(K, T)>
where
    K: Copy + Eq + Hash,
    F: Fn(&T) -> Option<K>,
{
    let mut seen = HashSet::with_capacity(rows.len());
    let mut kept = Vec::with_capacity(rows.len());
    for row in rows {
        match key(&row) {
            None => report.null_keys += 1,
            Some(k) if !seen.insert(k) => report.duplicate_keys += 1,
            Some(k) => kept.push((k, row)),
        }
    }
    kept
}

/// Clamp `raw` onto a categorical set, counting the replacement if any.
fn clamp<T: Copy>(
    raw: &str,
    parse: impl Fn(&str) -> T,
    allowed: impl Fn(&str) -> bool,
    field: &str,
    report: &mut TableReport,
) -> T {
    if !allowed(raw) {
        report.coerced_values += 1;
        debug!(field, value = raw, "coercing categorical value to default");
    }
    parse(raw)
}

fn clean_provider(id: i64, p: RawProvider, report: &mut TableReport) -> Provider {
    Provider {
        provider_id: id,
        provider_type: clamp(
            &p.provider_type,
            ProviderType::normalize,
            ProviderType::is_allowed,
            ProviderType::FIELD,
            report,
        ),
        name: p.name,
        address: p.address,
        city: p.city,
        contact: p.contact,
    }
}

fn clean_receiver(id: i64, r: RawReceiver, report: &mut TableReport) -> Receiver {
    Receiver {
        receiver_id: id,
        receiver_type: clamp(
            &r.receiver_type,
            ReceiverType::normalize,
            ReceiverType::is_allowed,
            ReceiverType::FIELD,
            report,
        ),
        name: r.name,
        city: r.city,
        contact: r.contact,
    }
}

fn clean_listing(
    id: i64,
    provider_id: i64,
    l: RawFoodListing,
    report: &mut TableReport,
) -> FoodListing {
    FoodListing {
        food_id: id,
        food_type: clamp(
            &l.food_type,
            FoodType::normalize,
            FoodType::is_allowed,
            FoodType::FIELD,
            report,
        ),
        meal_type: clamp(
            &l.meal_type,
            MealType::normalize,
            MealType::is_allowed,
            MealType::FIELD,
            report,
        ),
        food_name: l.food_name,
        quantity: l.quantity,
        expiry_date: l.expiry_date,
        provider_id,
        provider_type: l.provider_type,
        location: l.location,
    }
}

fn clean_claim(
    id: i64,
    food_id: i64,
    receiver_id: i64,
    c: RawClaim,
    report: &mut TableReport,
) -> Claim {
    Claim {
        claim_id: id,
        food_id,
        receiver_id,
        status: clamp(
            &c.status,
            ClaimStatus::normalize,
            ClaimStatus::is_allowed,
            ClaimStatus::FIELD,
            report,
        ),
        timestamp: c.timestamp,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
