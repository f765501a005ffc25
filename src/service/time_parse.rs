use chrono::{DateTime, Utc};

use crate::error::TimeParseError;

/// Parses the timestamp shapes the upstream APIs emit into a UTC instant.
///
/// Accepted beyond strict RFC3339: missing seconds (`2025-03-01T02:00Z`),
/// hour only (`2025-03-01T02Z`), and offsets without a colon (`+0000`).
pub fn parse_instant(raw: &str) -> Result<DateTime<Utc>, TimeParseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(TimeParseError(raw.to_string()));
    }
    let normalized = normalize(trimmed).ok_or_else(|| TimeParseError(raw.to_string()))?;
    DateTime::parse_from_rfc3339(&normalized)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| TimeParseError(raw.to_string()))
}

/// Like [`parse_instant`] but treats blank input as absent.
pub fn parse_optional_instant(raw: &str) -> Option<DateTime<Utc>> {
    if raw.trim().is_empty() {
        return None;
    }
    parse_instant(raw).ok()
}

fn normalize(s: &str) -> Option<String> {
    let t_pos = s.find('T')?;
    let (clock, offset) = if let Some(stripped) = s.strip_suffix('Z').or_else(|| s.strip_suffix('z')) {
        (stripped, "+00:00".to_string())
    } else {
        let sign_pos = s[t_pos..].rfind(['+', '-'])? + t_pos;
        let raw_offset = &s[sign_pos..];
        if !raw_offset[1..].bytes().all(|b| b.is_ascii_digit() || b == b':') {
            return None;
        }
        let offset = match raw_offset.len() {
            // +hh:mm
            6 => raw_offset.to_string(),
            // +hhmm
            5 => format!("{}:{}", &raw_offset[..3], &raw_offset[3..]),
            // +hh
            3 => format!("{}:00", raw_offset),
            _ => return None,
        };
        (&s[..sign_pos], offset)
    };

    // date is 10 chars, then 'T'
    let clock = match clock.len() {
        13 => format!("{}:00:00", clock),
        16 => format!("{}:00", clock),
        n if n >= 19 => clock.to_string(),
        _ => return None,
    };
    Some(format!("{}{}", clock, offset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_upstream_variants() {
        let expected = Utc.with_ymd_and_hms(2025, 3, 1, 2, 0, 0).unwrap();
        for raw in [
            "2025-03-01T02:00:00Z",
            "2025-03-01T02:00Z",
            "2025-03-01T02Z",
            "2025-03-01T02:00:00.000Z",
            "2025-03-01T02:00:00+0000",
            "2025-02-28T21:00-05:00",
            "2025-03-01T11:00:00+09:00",
        ] {
            assert_eq!(parse_instant(raw), Ok(expected), "input {raw}");
        }
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_instant("").is_err());
        assert!(parse_instant("tomorrow").is_err());
        assert!(parse_instant("2025-03-01").is_err());
        assert!(parse_instant("2025-13-01T02:00Z").is_err());
        assert!(parse_instant("2025-03-01T02:00+0é0").is_err());
        assert!(parse_instant("2025-03-01T02:00+é").is_err());
        assert!(parse_instant("2025-03-01T02:00+ab:cd").is_err());
    }

    #[test]
    fn blank_optional_is_absent() {
        assert_eq!(parse_optional_instant("  "), None);
        assert!(parse_optional_instant("2025-03-01T05:00Z").is_some());
    }
}
