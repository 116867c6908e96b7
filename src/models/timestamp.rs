use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Accepts RFC 3339 timestamps and offset-less ones (read as UTC).
///
/// Timestamps are display-only, so anything unreadable becomes `None` instead
/// of failing the surrounding payload.
pub(crate) fn lenient<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(raw)) => parse(&raw),
        Some(Value::Null) | None => None,
        Some(other) => {
            tracing::debug!("Ignoring non-string timestamp: {}", other);
            None
        }
    })
}

fn parse(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(stamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(stamp.with_timezone(&Utc));
    }
    let naive = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok());
    if naive.is_none() {
        tracing::debug!("Ignoring unreadable timestamp {:?}", raw);
    }
    naive.map(|stamp| stamp.and_utc())
}
