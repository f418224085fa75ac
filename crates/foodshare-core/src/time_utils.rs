use chrono::{NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use tracing::warn;

// ── System timezone detection ─────────────────────────────────────────────────

/// Detect the IANA timezone name of the running system.
///
/// Falls back to `"UTC"` if detection fails.
pub fn get_system_timezone() -> String {
    iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string())
}

// ── Timezone resolution ───────────────────────────────────────────────────────

/// Resolve a configured timezone name.
///
/// `"auto"` means the system timezone. Unrecognised names fall back to UTC
/// with a warning.
pub fn resolve_timezone(tz_name: &str) -> Tz {
    let name = if tz_name.eq_ignore_ascii_case("auto") {
        get_system_timezone()
    } else {
        tz_name.to_string()
    };
    name.parse::<Tz>().unwrap_or_else(|_| {
        warn!("unrecognised timezone \"{}\", falling back to UTC", name);
        Tz::UTC
    })
}

// ── Clock ─────────────────────────────────────────────────────────────────────

/// The current calendar date as seen in `tz`.
///
/// Expiry windows are computed against this date.
pub fn today_in(tz: Tz) -> NaiveDate {
    Utc::now().with_timezone(&tz).date_naive()
}

/// The current wall-clock time in `tz`, without offset.
pub fn now_in(tz: Tz) -> NaiveDateTime {
    Utc::now().with_timezone(&tz).naive_local()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_known_timezone() {
        assert_eq!(resolve_timezone("Asia/Kolkata"), chrono_tz::Asia::Kolkata);
    }

    #[test]
    fn test_resolve_unknown_timezone_falls_back_to_utc() {
        assert_eq!(resolve_timezone("Mars/Olympus"), Tz::UTC);
    }

    #[test]
    fn test_resolve_auto_returns_some_zone() {
        // Whatever the host reports, resolution must not panic.
        let _ = resolve_timezone("auto");
    }

    #[test]
    fn test_today_in_is_within_a_day_of_utc() {
        let utc_today = Utc::now().date_naive();
        let far_east = today_in(chrono_tz::Pacific::Kiritimati);
        let diff = (far_east - utc_today).num_days();
        assert!((0..=1).contains(&diff));
    }

    #[test]
    fn test_now_in_matches_today_in() {
        let tz = Tz::UTC;
        let now = now_in(tz);
        let today = today_in(tz);
        // Tolerate a midnight rollover between the two calls.
        assert!((now.date() - today).num_days().abs() <= 1);
    }
}
