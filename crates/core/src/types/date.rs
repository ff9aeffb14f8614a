//! Calendar-day handling for API dates.
//!
//! The API returns either bare `YYYY-MM-DD` dates or full ISO timestamps
//! (`2025-01-15T10:30:00.000Z`). The shop only ever reasons about the date
//! portion, so both forms collapse to a [`NaiveDate`].

use chrono::NaiveDate;

/// Parse the date portion of an ISO date or timestamp.
///
/// ```
/// use chrono::NaiveDate;
/// use sweetshop_core::types::date::parse_iso_day;
///
/// let day = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
/// assert_eq!(parse_iso_day("2025-01-15"), Some(day));
/// assert_eq!(parse_iso_day("2025-01-15T23:59:59.000Z"), Some(day));
/// assert_eq!(parse_iso_day("15/01/2025"), None);
/// ```
#[must_use]
pub fn parse_iso_day(value: &str) -> Option<NaiveDate> {
    let day = value.trim().get(..10)?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

/// Serde adapter for a required ISO day.
pub mod iso_day {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    use super::parse_iso_day;

    /// Serialize as `YYYY-MM-DD`.
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    pub fn serialize<S: Serializer>(day: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&day.format("%Y-%m-%d"))
    }

    /// Deserialize from a date or timestamp string.
    ///
    /// # Errors
    ///
    /// Fails when the value is not a string starting with `YYYY-MM-DD`.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_iso_day(&raw).ok_or_else(|| D::Error::custom(format!("invalid date: {raw}")))
    }
}

/// Serde adapter for an optional ISO day. Empty strings read as `None`.
pub mod iso_day_opt {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    use super::parse_iso_day;

    /// Serialize as `YYYY-MM-DD` or `null`.
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    #[allow(clippy::ref_option)] // signature fixed by `#[serde(with)]`
    pub fn serialize<S: Serializer>(
        day: &Option<NaiveDate>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match day {
            Some(day) => serializer.collect_str(&day.format("%Y-%m-%d")),
            None => serializer.serialize_none(),
        }
    }

    /// Deserialize from a date string, timestamp, empty string or `null`.
    ///
    /// # Errors
    ///
    /// Fails when a non-empty value is not a valid date.
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDate>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(None),
            Some(raw) if raw.trim().is_empty() => Ok(None),
            Some(raw) => parse_iso_day(&raw)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("invalid date: {raw}"))),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[derive(serde::Serialize, serde::Deserialize)]
    struct Dated {
        #[serde(with = "iso_day")]
        day: NaiveDate,
        #[serde(with = "iso_day_opt", default)]
        maybe: Option<NaiveDate>,
    }

    #[test]
    fn test_timestamp_collapses_to_day() {
        let parsed: Dated =
            serde_json::from_str(r#"{"day":"2025-03-10T18:45:00.000Z","maybe":""}"#).unwrap();
        assert_eq!(parsed.day, NaiveDate::from_ymd_opt(2025, 3, 10).unwrap());
        assert_eq!(parsed.maybe, None);
    }

    #[test]
    fn test_serializes_date_only() {
        let dated = Dated {
            day: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            maybe: NaiveDate::from_ymd_opt(2025, 3, 12),
        };
        let json = serde_json::to_string(&dated).unwrap();
        assert_eq!(json, r#"{"day":"2025-03-10","maybe":"2025-03-12"}"#);
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(serde_json::from_str::<Dated>(r#"{"day":"yesterday"}"#).is_err());
    }
}
