//! Static configuration loading: JSON file → validated [`DisplayConfig`].
//!
//! Malformed configuration fails fast at startup. Absent timing fields stay
//! `None` so the defaults resolve at evaluation time, in one place.

use std::collections::BTreeSet;
use std::path::Path;

use chrono::{NaiveTime, TimeDelta};
use serde::Deserialize;
use thiserror::Error;

use tabwheel_core::{Day, DisplayConfig, ScheduleWindow, TabEntry};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("tab {index}: url must not be empty")]
    EmptyUrl { index: usize },

    #[error("tab {index} ({url}): invalid {field} time {value:?}, expected HH:MM")]
    InvalidTime {
        index: usize,
        url: String,
        field: &'static str,
        value: String,
    },

    #[error("tab {index} ({url}): {field} of {value} seconds is out of range")]
    DurationOutOfRange {
        index: usize,
        url: String,
        field: &'static str,
        value: u64,
    },
}

// ─── Wire format ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    tabs: Vec<RawTab>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTab {
    url: String,
    #[serde(default)]
    rotate_secs: Option<u64>,
    #[serde(default)]
    refresh_secs: Option<u64>,
    #[serde(default)]
    schedule: Option<RawSchedule>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSchedule {
    #[serde(default)]
    days: Option<BTreeSet<Day>>,
    #[serde(default)]
    open: Option<String>,
    #[serde(default)]
    close: Option<String>,
}

// ─── Loading ──────────────────────────────────────────────────────

pub fn load(path: &Path) -> Result<DisplayConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let raw: RawConfig = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })?;

    let mut entries = Vec::with_capacity(raw.tabs.len());
    for (index, tab) in raw.tabs.into_iter().enumerate() {
        entries.push(validate_tab(index, tab)?);
    }
    Ok(DisplayConfig::new(entries))
}

fn validate_tab(index: usize, raw: RawTab) -> Result<TabEntry, ConfigError> {
    if raw.url.trim().is_empty() {
        return Err(ConfigError::EmptyUrl { index });
    }

    let schedule = match raw.schedule {
        None => None,
        Some(s) => Some(ScheduleWindow {
            days: s.days,
            open: parse_time(index, &raw.url, "open", s.open)?,
            close: parse_time(index, &raw.url, "close", s.close)?,
        }),
    };

    Ok(TabEntry {
        rotate_after: parse_secs(index, &raw.url, "rotate_secs", raw.rotate_secs)?,
        refresh_after: parse_secs(index, &raw.url, "refresh_secs", raw.refresh_secs)?,
        url: raw.url,
        schedule,
    })
}

fn parse_secs(
    index: usize,
    url: &str,
    field: &'static str,
    value: Option<u64>,
) -> Result<Option<TimeDelta>, ConfigError> {
    match value {
        None => Ok(None),
        Some(secs) => i64::try_from(secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .map(Some)
            .ok_or(ConfigError::DurationOutOfRange {
                index,
                url: url.to_string(),
                field,
                value: secs,
            }),
    }
}

fn parse_time(
    index: usize,
    url: &str,
    field: &'static str,
    value: Option<String>,
) -> Result<Option<NaiveTime>, ConfigError> {
    match value {
        None => Ok(None),
        Some(v) => NaiveTime::parse_from_str(&v, "%H:%M").map(Some).map_err(|_| {
            ConfigError::InvalidTime {
                index,
                url: url.to_string(),
                field,
                value: v,
            }
        }),
    }
}

// ─── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tabwheel_core::EntryId;

    fn write_config(json: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(json.as_bytes()).expect("write config");
        file
    }

    #[test]
    fn full_config_loads() {
        let file = write_config(
            r#"{
                "tabs": [
                    {"url": "https://a.example", "rotate_secs": 20, "refresh_secs": 3600,
                     "schedule": {"days": ["mon", "tue"], "open": "06:00", "close": "14:43"}},
                    {"url": "https://b.example"}
                ]
            }"#,
        );

        let config = load(file.path()).expect("loads");
        assert_eq!(config.len(), 2);

        let first = config.get(EntryId::new(0)).expect("entry 0");
        assert_eq!(first.url, "https://a.example");
        assert_eq!(first.rotate_after, Some(TimeDelta::seconds(20)));
        assert_eq!(first.refresh_after, Some(TimeDelta::seconds(3600)));
        let window = first.schedule.as_ref().expect("schedule");
        assert_eq!(
            window.days,
            Some(BTreeSet::from([Day::Mon, Day::Tue]))
        );
        assert_eq!(
            window.open,
            Some(NaiveTime::from_hms_opt(6, 0, 0).expect("time"))
        );

        let second = config.get(EntryId::new(1)).expect("entry 1");
        assert_eq!(second.rotate_after, None, "absent fields stay unset");
        assert!(second.schedule.is_none());
    }

    #[test]
    fn empty_tab_list_is_allowed() {
        let file = write_config(r#"{"tabs": []}"#);
        let config = load(file.path()).expect("loads");
        assert!(config.is_empty());
    }

    #[test]
    fn invalid_time_fails_fast() {
        let file = write_config(
            r#"{"tabs": [{"url": "https://a", "schedule": {"open": "6 o'clock"}}]}"#,
        );
        let err = load(file.path()).expect_err("must fail");
        assert!(matches!(err, ConfigError::InvalidTime { field: "open", .. }));
    }

    #[test]
    fn out_of_range_duration_fails_fast() {
        // 2^63 parses as u64 but has no i64 counterpart.
        let file = write_config(
            r#"{"tabs": [{"url": "https://a", "rotate_secs": 9223372036854775808}]}"#,
        );
        let err = load(file.path()).expect_err("must fail");
        assert!(matches!(
            err,
            ConfigError::DurationOutOfRange { field: "rotate_secs", .. }
        ));
    }

    #[test]
    fn empty_url_fails_fast() {
        let file = write_config(r#"{"tabs": [{"url": "  "}]}"#);
        let err = load(file.path()).expect_err("must fail");
        assert!(matches!(err, ConfigError::EmptyUrl { index: 0 }));
    }

    #[test]
    fn unknown_day_fails_fast() {
        let file = write_config(
            r#"{"tabs": [{"url": "https://a", "schedule": {"days": ["monday"]}}]}"#,
        );
        assert!(matches!(
            load(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn unknown_field_fails_fast() {
        let file = write_config(r#"{"tabs": [{"url": "https://a", "rotate": 5}]}"#);
        assert!(matches!(
            load(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load(Path::new("/nonexistent/tabwheel.json")).expect_err("must fail");
        assert!(err.to_string().contains("/nonexistent/tabwheel.json"));
    }
}
