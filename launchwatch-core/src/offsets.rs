//! Alert offset parsing: "24h, 12h, 6h, 3h, 1h, 15m" → sorted durations before launch.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::Duration;
use regex::Regex;

use crate::error::OffsetError;

/// Offsets applied when a subscriber has not configured their own.
pub const DEFAULT_ALERT_TIMES: &str = "24h, 12h, 6h, 3h, 1h, 15m";

/// Largest accepted offset: a single `99999w` token.
pub const MAX_OFFSET_SECONDS: i64 = 99_999 * 604_800;

const UNITS: [(char, i64); 5] = [
    ('w', 604_800),
    ('d', 86_400),
    ('h', 3_600),
    ('m', 60),
    ('s', 1),
];

#[allow(clippy::expect_used)]
static SPEC_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,5}[smhdw])+$").expect("constant regex pattern is valid"));

#[allow(clippy::expect_used)]
static TOKEN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<magnitude>\d{1,5})(?P<unit>[smhdw])").expect("constant regex pattern is valid")
});

fn seconds_per_unit(unit: &str) -> Option<i64> {
    let c = unit.chars().next()?;
    UNITS.iter().find(|(u, _)| *u == c).map(|(_, secs)| *secs)
}

/// True iff `spec` is one or more `<1-5 digits><unit>` tokens and nothing else.
pub fn is_valid_offset_spec(spec: &str) -> bool {
    SPEC_PATTERN.is_match(spec)
}

/// Parse a single spec like `1d3h2s` into its total duration.
///
/// Token order does not matter: `2s3h1d` and `1d3h2s` are the same offset.
pub fn parse_offset_spec(spec: &str) -> Result<Duration, OffsetError> {
    if !is_valid_offset_spec(spec) {
        return Err(OffsetError::InvalidOffsetFormat(spec.to_string()));
    }

    let invalid = || OffsetError::InvalidOffsetFormat(spec.to_string());
    let mut total: i64 = 0;
    for caps in TOKEN_PATTERN.captures_iter(spec) {
        let magnitude: i64 = caps["magnitude"].parse().map_err(|_| invalid())?;
        let unit = seconds_per_unit(&caps["unit"]).ok_or_else(invalid)?;
        total = magnitude
            .checked_mul(unit)
            .and_then(|secs| total.checked_add(secs))
            .ok_or_else(invalid)?;
        if total > MAX_OFFSET_SECONDS {
            return Err(OffsetError::OffsetTooLarge(spec.to_string()));
        }
    }

    Duration::try_seconds(total).ok_or_else(invalid)
}

/// Parse a comma separated list of specs. The first bad item fails the list.
pub fn parse_offset_list(csv: &str) -> Result<AlertOffsets, OffsetError> {
    let mut offsets = csv
        .split(',')
        .map(|item| parse_offset_spec(item.trim()))
        .collect::<Result<Vec<_>, _>>()?;
    offsets.sort();
    Ok(AlertOffsets(offsets))
}

/// Render a duration back into the compact unit form, largest units first.
pub fn format_offset(offset: Duration) -> String {
    let mut remaining = offset.num_seconds();
    if remaining == 0 {
        return "0s".to_string();
    }

    let mut out = String::new();
    for (unit, secs) in UNITS {
        let n = remaining / secs;
        if n > 0 {
            out.push_str(&format!("{n}{unit}"));
            remaining -= n * secs;
        }
    }
    out
}

/// Ascending set of durations before launch at which to alert. Duplicates are kept.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AlertOffsets(Vec<Duration>);

impl AlertOffsets {
    pub fn as_slice(&self) -> &[Duration] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl FromStr for AlertOffsets {
    type Err = OffsetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_offset_list(s)
    }
}

impl fmt::Display for AlertOffsets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().rev().map(|d| format_offset(*d)).collect();
        write!(f, "{}", parts.join(", "))
    }
}
