use chrono::NaiveDate;
use regex::Regex;

use crate::error::ReconError;

/// Date format of run keys and snapshot file names (`08-03-2022`).
pub const RUN_KEY_DATE_FORMAT: &str = "%d-%m-%Y";

/// File names produced by the regulator export: `pharmacies-<key>.json`.
const SNAPSHOT_NAME_PATTERN: &str = r"^pharmacies-(?P<key>.+)\.json";

/// Key embedded in a snapshot file name, if the name follows the pattern.
pub fn key_from_file_name(file_name: &str) -> Option<String> {
    let re = Regex::new(SNAPSHOT_NAME_PATTERN).ok()?;
    re.captures(file_name)
        .and_then(|c| c.name("key"))
        .map(|m| m.as_str().to_string())
}

/// Snapshot date embedded in a file name, when the key is a `dd-mm-yyyy` date.
pub fn date_from_file_name(file_name: &str) -> Option<NaiveDate> {
    key_from_file_name(file_name)
        .and_then(|key| NaiveDate::parse_from_str(&key, RUN_KEY_DATE_FORMAT).ok())
}

/// How the run key of an aggregation is chosen.
#[derive(Debug, Clone)]
pub struct RunKeyPolicy {
    /// Key given explicitly by the caller; always wins.
    pub explicit: Option<String>,
    /// Fall back to `today` when neither explicit nor file-name key exists.
    pub date_fallback: bool,
}

impl RunKeyPolicy {
    /// Resolve the key for an input file name. `today` feeds the date fallback.
    pub fn resolve(&self, file_name: &str, today: NaiveDate) -> Result<String, ReconError> {
        if let Some(key) = self.explicit.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
            return Ok(key.to_string());
        }
        if let Some(key) = key_from_file_name(file_name) {
            return Ok(key);
        }
        if self.date_fallback {
            return Ok(today.format(RUN_KEY_DATE_FORMAT).to_string());
        }
        Err(ReconError::UnresolvableRunKey(format!(
            "'{file_name}' does not match pharmacies-<key>.json and the date fallback is disabled"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2022, 3, 8).unwrap()
    }

    fn policy(explicit: Option<&str>, date_fallback: bool) -> RunKeyPolicy {
        RunKeyPolicy {
            explicit: explicit.map(String::from),
            date_fallback,
        }
    }

    #[test]
    fn key_from_snapshot_name() {
        assert_eq!(key_from_file_name("pharmacies-01-02-2023.json").as_deref(), Some("01-02-2023"));
        assert_eq!(key_from_file_name("pharmacies-latest.json").as_deref(), Some("latest"));
        assert_eq!(key_from_file_name("last-pharmacies_afmps.json"), None);
        assert_eq!(key_from_file_name("pharmacies-.json"), None);
    }

    #[test]
    fn date_from_snapshot_name() {
        assert_eq!(
            date_from_file_name("pharmacies-01-02-2023.json"),
            NaiveDate::from_ymd_opt(2023, 2, 1)
        );
        assert_eq!(date_from_file_name("pharmacies-latest.json"), None);
    }

    #[test]
    fn explicit_key_wins() {
        let key = policy(Some("manual"), false)
            .resolve("pharmacies-01-02-2023.json", today())
            .unwrap();
        assert_eq!(key, "manual");
    }

    #[test]
    fn blank_explicit_key_is_ignored() {
        let key = policy(Some("  "), true)
            .resolve("pharmacies-01-02-2023.json", today())
            .unwrap();
        assert_eq!(key, "01-02-2023");
    }

    #[test]
    fn file_name_key_before_fallback() {
        let key = policy(None, true).resolve("pharmacies-01-02-2023.json", today()).unwrap();
        assert_eq!(key, "01-02-2023");
    }

    #[test]
    fn falls_back_to_today() {
        let key = policy(None, true).resolve("export.json", today()).unwrap();
        assert_eq!(key, "08-03-2022");
    }

    #[test]
    fn unresolvable_without_fallback() {
        let err = policy(None, false).resolve("export.json", today()).unwrap_err();
        assert!(matches!(err, ReconError::UnresolvableRunKey(_)));
    }
}
