//! Time helpers: the persisted fixed-offset format, upstream time parsing, countdowns.

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};

/// Persisted timestamp format, e.g. `2018-02-12T14:00:00+0000`.
pub const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

pub fn format_iso(dt: DateTime<Utc>) -> String {
    dt.format(ISO_FORMAT).to_string()
}

pub fn parse_iso(s: &str) -> Option<DateTime<Utc>> {
    DateTime::<FixedOffset>::parse_from_str(s, ISO_FORMAT)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Parse a scheduled time as published upstream.
///
/// Accepts RFC 3339, the persisted format, and the minute-precision UTC form
/// (`2018-02-12T14:00Z`) the launch feed uses.
pub fn parse_launch_time(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Some(dt) = parse_iso(s) {
        return Some(dt);
    }
    ["%Y-%m-%dT%H:%MZ", "%Y-%m-%dT%H:%M:%SZ", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|ndt| Utc.from_utc_datetime(&ndt))
}

/// Launch-relative countdown: `L-01:04:40` before launch, `L+00:01:05` after.
///
/// `seconds` is the time remaining until launch; zero counts as after.
pub fn countdown(seconds: i64) -> String {
    let sign = if seconds > 0 { '-' } else { '+' };
    let seconds = seconds.unsigned_abs();
    let hours = seconds / 3600;
    let minutes = seconds % 3600 / 60;
    let s = seconds % 60;
    format!("L{sign}{hours:02}:{minutes:02}:{s:02}")
}

/// Serde adapter for timestamps stored in [`ISO_FORMAT`].
pub mod iso_format {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_iso(*dt))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let s = String::deserialize(deserializer)?;
        super::parse_iso(&s).ok_or_else(|| D::Error::custom(format!("invalid timestamp '{s}'")))
    }

    /// Same as the parent module, for nullable fields.
    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer, Serializer, de::Error};

        pub fn serialize<S: Serializer>(
            dt: &Option<DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match dt {
                Some(dt) => serializer.serialize_str(&super::super::format_iso(*dt)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            match Option::<String>::deserialize(deserializer)? {
                Some(s) => super::super::parse_iso(&s)
                    .map(Some)
                    .ok_or_else(|| D::Error::custom(format!("invalid timestamp '{s}'"))),
                None => Ok(None),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iso_round_trip() {
        let dt = Utc.with_ymd_and_hms(2018, 2, 12, 14, 0, 0).unwrap();
        assert_eq!(format_iso(dt), "2018-02-12T14:00:00+0000");
        assert_eq!(parse_iso("2018-02-12T14:00:00+0000"), Some(dt));
        assert_eq!(parse_iso("2018-02-12T16:00:00+0200"), Some(dt));
        assert_eq!(parse_iso("not a time"), None);
    }

    #[test]
    fn launch_time_formats() {
        let dt = Utc.with_ymd_and_hms(2018, 2, 12, 14, 0, 0).unwrap();
        assert_eq!(parse_launch_time("2018-02-12T14:00Z"), Some(dt));
        assert_eq!(parse_launch_time("2018-02-12T14:00:00Z"), Some(dt));
        assert_eq!(parse_launch_time("2018-02-12T14:00:00+00:00"), Some(dt));
        assert_eq!(parse_launch_time("2018-02-12T14:00:00+0000"), Some(dt));
        assert_eq!(parse_launch_time(""), None);
        assert_eq!(parse_launch_time("NET March"), None);
    }

    #[test]
    fn countdown_strings() {
        assert_eq!(countdown(-1), "L+00:00:01");
        assert_eq!(countdown(0), "L+00:00:00");
        assert_eq!(countdown(1), "L-00:00:01");
        assert_eq!(countdown(60), "L-00:01:00");
        assert_eq!(countdown(61), "L-00:01:01");
        assert_eq!(countdown(3600), "L-01:00:00");
        assert_eq!(countdown(86400), "L-24:00:00");
        assert_eq!(countdown(3820), "L-01:04:40");
        assert_eq!(countdown(-65), "L+00:01:05");
    }

    #[test]
    fn countdown_extremes() {
        assert_eq!(countdown(i64::MIN), "L+2562047788015215:30:08");
        assert_eq!(countdown(i64::MAX), "L-2562047788015215:30:07");
    }
}
