use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::FoodError;

// ── Categorical fields ────────────────────────────────────────────────────────

/// Declare a closed set of allowed values for an enumerated column.
///
/// Each generated enum serialises to its display label, exposes the allowed
/// set as `ALL`, and offers two parsers: strict [`FromStr`] and lenient
/// `normalize`, which falls back to `DEFAULT` for anything outside the set.
macro_rules! categorical {
    (
        $(#[$meta:meta])*
        pub enum $name:ident : $field:literal, default = $default:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $label:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $label)] $variant ),+
        }

        impl $name {
            /// Column name this value set constrains.
            pub const FIELD: &'static str = $field;

            /// Every allowed value, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Fallback used for blank or unrecognised input.
            pub const DEFAULT: $name = $name::$default;

            /// The canonical label stored in the relational store.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $label ),+
                }
            }

            /// Map a raw value onto the allowed set.
            ///
            /// Surrounding whitespace is ignored; matching is exact otherwise.
            /// Anything not in the set becomes [`Self::DEFAULT`].
            pub fn normalize(raw: &str) -> Self {
                raw.trim().parse().unwrap_or(Self::DEFAULT)
            }

            /// `true` when `raw` (trimmed) is already a member of the set.
            pub fn is_allowed(raw: &str) -> bool {
                raw.trim().parse::<Self>().is_ok()
            }

            /// SQL `IN (...)` list used by the schema's CHECK constraint.
            pub fn sql_value_list() -> String {
                Self::ALL
                    .iter()
                    .map(|v| format!("'{}'", v.as_str()))
                    .collect::<Vec<_>>()
                    .join(",")
            }
        }

        impl FromStr for $name {
            type Err = FoodError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value {
                    $( $label => Ok($name::$variant), )+
                    other => Err(FoodError::InvalidCategory {
                        field: $field,
                        value: other.to_string(),
                    }),
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::DEFAULT
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

categorical! {
    /// Kind of business supplying surplus food.
    pub enum ProviderType: "Type", default = Other {
        Restaurant => "Restaurant",
        GroceryStore => "Grocery Store",
        Supermarket => "Supermarket",
        Bakery => "Bakery",
        Caterer => "Caterer",
        Other => "Other",
    }
}

categorical! {
    /// Kind of organisation or person claiming food.
    pub enum ReceiverType: "Type", default = Other {
        Ngo => "NGO",
        CommunityCenter => "Community Center",
        Individual => "Individual",
        Shelter => "Shelter",
        Other => "Other",
    }
}

categorical! {
    /// Dietary class of a listing.
    pub enum FoodType: "Food_Type", default = Other {
        Vegetarian => "Vegetarian",
        NonVegetarian => "Non-Vegetarian",
        Vegan => "Vegan",
        Other => "Other",
    }
}

categorical! {
    /// Meal slot a listing is intended for.
    pub enum MealType: "Meal_Type", default = Other {
        Breakfast => "Breakfast",
        Lunch => "Lunch",
        Dinner => "Dinner",
        Snacks => "Snacks",
        Other => "Other",
    }
}

categorical! {
    /// Lifecycle state of a claim.
    pub enum ClaimStatus: "Status", default = Pending {
        Pending => "Pending",
        Completed => "Completed",
        Cancelled => "Cancelled",
    }
}

// ── Table names ───────────────────────────────────────────────────────────────

pub const PROVIDERS_TABLE: &str = "providers";
pub const RECEIVERS_TABLE: &str = "receivers";
pub const FOOD_LISTINGS_TABLE: &str = "food_listings";
pub const CLAIMS_TABLE: &str = "claims";

/// All four tables in load (parent-before-child) order.
pub const ALL_TABLES: [&str; 4] = [
    PROVIDERS_TABLE,
    RECEIVERS_TABLE,
    FOOD_LISTINGS_TABLE,
    CLAIMS_TABLE,
];

// ── Raw rows (as loaded) ──────────────────────────────────────────────────────

/// A provider row as read from its source, before validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawProvider {
    pub provider_id: Option<i64>,
    pub name: String,
    pub provider_type: String,
    pub address: String,
    pub city: String,
    pub contact: String,
}

/// A receiver row as read from its source, before validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawReceiver {
    pub receiver_id: Option<i64>,
    pub name: String,
    pub receiver_type: String,
    pub city: String,
    pub contact: String,
}

/// A listing row as read from its source, before validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawFoodListing {
    pub food_id: Option<i64>,
    pub food_name: String,
    pub quantity: Option<i64>,
    pub expiry_date: Option<NaiveDate>,
    pub provider_id: Option<i64>,
    pub provider_type: String,
    pub location: String,
    pub food_type: String,
    pub meal_type: String,
}

/// A claim row as read from its source, before validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawClaim {
    pub claim_id: Option<i64>,
    pub food_id: Option<i64>,
    pub receiver_id: Option<i64>,
    pub status: String,
    pub timestamp: Option<NaiveDateTime>,
}

// ── Clean rows (constraint-satisfying) ────────────────────────────────────────

/// A validated provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provider {
    #[serde(rename = "Provider_ID")]
    pub provider_id: i64,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Type")]
    pub provider_type: ProviderType,
    #[serde(rename = "Address")]
    pub address: String,
    #[serde(rename = "City")]
    pub city: String,
    #[serde(rename = "Contact")]
    pub contact: String,
}

/// A validated receiver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receiver {
    #[serde(rename = "Receiver_ID")]
    pub receiver_id: i64,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Type")]
    pub receiver_type: ReceiverType,
    #[serde(rename = "City")]
    pub city: String,
    #[serde(rename = "Contact")]
    pub contact: String,
}

/// A validated food listing whose provider is known to exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoodListing {
    #[serde(rename = "Food_ID")]
    pub food_id: i64,
    #[serde(rename = "Food_Name")]
    pub food_name: String,
    /// `None` when the source value was missing, malformed or negative.
    #[serde(rename = "Quantity")]
    pub quantity: Option<i64>,
    #[serde(rename = "Expiry_Date")]
    pub expiry_date: Option<NaiveDate>,
    #[serde(rename = "Provider_ID")]
    pub provider_id: i64,
    /// Free text copied from the source; not constrained by the schema.
    #[serde(rename = "Provider_Type")]
    pub provider_type: String,
    #[serde(rename = "Location")]
    pub location: String,
    #[serde(rename = "Food_Type")]
    pub food_type: FoodType,
    #[serde(rename = "Meal_Type")]
    pub meal_type: MealType,
}

/// A validated claim whose listing and receiver are known to exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    #[serde(rename = "Claim_ID")]
    pub claim_id: i64,
    #[serde(rename = "Food_ID")]
    pub food_id: i64,
    #[serde(rename = "Receiver_ID")]
    pub receiver_id: i64,
    #[serde(rename = "Status")]
    pub status: ClaimStatus,
    #[serde(rename = "Timestamp")]
    pub timestamp: Option<NaiveDateTime>,
}

// ── Counts ────────────────────────────────────────────────────────────────────

/// Row counts for the four entity tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableCounts {
    pub providers: usize,
    pub receivers: usize,
    pub food_listings: usize,
    pub claims: usize,
}

impl TableCounts {
    /// Sum across all four tables.
    pub fn total(&self) -> usize {
        self.providers + self.receivers + self.food_listings + self.claims
    }

    /// `(table_name, count)` pairs in load order.
    pub fn as_pairs(&self) -> [(&'static str, usize); 4] {
        [
            (PROVIDERS_TABLE, self.providers),
            (RECEIVERS_TABLE, self.receivers),
            (FOOD_LISTINGS_TABLE, self.food_listings),
            (CLAIMS_TABLE, self.claims),
        ]
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
