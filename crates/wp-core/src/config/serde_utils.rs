//! Serde helpers for config fields

/// `Duration` stored as milliseconds.
///
/// Always written as an integer. On read, a bare integer is taken as
/// milliseconds; strings with an `ms` or `s` suffix (`"1500ms"`, `"8s"`) are
/// accepted too.
///
/// ```ignore
/// #[derive(Serialize, Deserialize)]
/// struct Timings {
///     #[serde(with = "wp_core::config::serde_utils::duration_millis")]
///     timeout: Duration,
/// }
/// ```
pub mod duration_millis {
    use std::time::Duration;

    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Millis(u64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(millis)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        match Raw::deserialize(deserializer)? {
            Raw::Millis(millis) => Ok(Duration::from_millis(millis)),
            Raw::Text(text) => parse(&text).map_err(D::Error::custom),
        }
    }

    pub(crate) fn parse(text: &str) -> Result<Duration, String> {
        let text = text.trim();
        let (digits, scale) = if let Some(digits) = text.strip_suffix("ms") {
            (digits, 1)
        } else if let Some(digits) = text.strip_suffix('s') {
            (digits, 1000)
        } else {
            (text, 1)
        };

        let value: u64 = digits
            .trim()
            .parse()
            .map_err(|_| format!("invalid duration '{}'", text))?;
        value
            .checked_mul(scale)
            .map(Duration::from_millis)
            .ok_or_else(|| format!("duration '{}' out of range", text))
    }
}
