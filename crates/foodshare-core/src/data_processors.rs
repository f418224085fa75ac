use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tracing::debug;

// ── IdProcessor ───────────────────────────────────────────────────────────────

/// Parses integer key and count columns from loosely formatted text.
pub struct IdProcessor;

impl IdProcessor {
    /// Parse a nullable integer.
    ///
    /// Accepts surrounding whitespace and integral float spellings such as
    /// `"12.0"` (spreadsheet exports often write IDs that way). Blank or
    /// malformed input yields `None`.
    pub fn parse(raw: &str) -> Option<i64> {
        let s = raw.trim();
        if s.is_empty() {
            return None;
        }
        if let Ok(v) = s.parse::<i64>() {
            return Some(v);
        }
        match s.parse::<f64>() {
            Ok(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                Some(f as i64)
            }
            _ => {
                debug!("IdProcessor: could not parse integer \"{}\"", s);
                None
            }
        }
    }

    /// Parse a non-negative quantity; negative values are treated as malformed.
    pub fn parse_quantity(raw: &str) -> Option<i64> {
        Self::parse(raw).filter(|q| *q >= 0)
    }
}

// ── TimestampProcessor ────────────────────────────────────────────────────────

/// Parses date-time columns from the variety of formats found in CSV exports.
pub struct TimestampProcessor;

impl TimestampProcessor {
    /// Naive date-time layouts tried in order. Month-first slash dates win
    /// over day-first ones when both would match.
    const FORMATS: &'static [&'static str] = &[
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
        "%Y/%m/%d %H:%M:%S",
        "%m/%d/%Y %H:%M:%S",
        "%m/%d/%Y %H:%M",
        "%d/%m/%Y %H:%M:%S",
        "%d/%m/%Y %H:%M",
    ];

    /// Parse a timestamp string into a naive date-time.
    ///
    /// Handles:
    /// * RFC 3339 (including `Z` suffix) – converted to UTC.
    /// * the naive layouts in [`Self::FORMATS`].
    /// * a bare date – interpreted as midnight.
    ///
    /// Returns `None` for blank or unrecognised input.
    pub fn parse(raw: &str) -> Option<NaiveDateTime> {
        let s = raw.trim();
        if s.is_empty() {
            return None;
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.with_timezone(&Utc).naive_utc());
        }

        for fmt in Self::FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
                return Some(naive);
            }
        }

        if let Some(date) = DateProcessor::parse_date_only(s) {
            return date.and_hms_opt(0, 0, 0);
        }

        debug!("TimestampProcessor: could not parse timestamp \"{}\"", s);
        None
    }
}

// ── DateProcessor ─────────────────────────────────────────────────────────────

/// Parses calendar-date columns.
pub struct DateProcessor;

impl DateProcessor {
    const FORMATS: &'static [&'static str] = &[
        "%Y-%m-%d",
        "%Y/%m/%d",
        "%m/%d/%Y",
        "%d/%m/%Y",
        "%d-%m-%Y",
    ];

    /// Parse a calendar date.
    ///
    /// Full timestamps are accepted too; only their date part is kept.
    pub fn parse(raw: &str) -> Option<NaiveDate> {
        let s = raw.trim();
        if s.is_empty() {
            return None;
        }
        Self::parse_date_only(s).or_else(|| TimestampProcessor::parse(s).map(|dt| dt.date()))
    }

    fn parse_date_only(s: &str) -> Option<NaiveDate> {
        Self::FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
