//! INI file settings adapter.

use crate::domain::error::RollfolioError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, RollfolioError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config
            .load(path)
            .map_err(|reason| RollfolioError::ConfigParse {
                file: path.display().to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, String> {
        let mut config = Ini::new();
        config.read(content.to_string())?;
        Ok(Self { config })
    }

    /// No file: every key falls back to its default.
    pub fn empty() -> Self {
        Self { config: Ini::new() }
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key).filter(|v| !v.trim().is_empty())
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.config
            .getint(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::settings::Settings;
    use std::io::Write;
    use std::time::Duration;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn from_string_parses_config() {
        let content = r#"
[nasdaq]
base_url = https://mirror.test/api/v3

[fred]
series_id = SP500
"#;
        let adapter = FileConfigAdapter::from_string(content).unwrap();
        assert_eq!(
            adapter.get_string("nasdaq", "base_url"),
            Some("https://mirror.test/api/v3".to_string())
        );
        assert_eq!(
            adapter.get_string("fred", "series_id"),
            Some("SP500".to_string())
        );
    }

    #[test]
    fn get_string_returns_none_for_missing_key() {
        let adapter = FileConfigAdapter::from_string("[cache]\nttl_secs = 100\n").unwrap();
        assert_eq!(adapter.get_string("cache", "missing"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
    }

    #[test]
    fn blank_value_counts_as_missing() {
        let adapter = FileConfigAdapter::from_string("[credentials]\nprice_api_key =\n").unwrap();
        assert_eq!(adapter.get_string("credentials", "price_api_key"), None);
    }

    #[test]
    fn get_int_returns_value() {
        let adapter = FileConfigAdapter::from_string("[cache]\nttl_secs = 5\n").unwrap();
        assert_eq!(adapter.get_int("cache", "ttl_secs", 0), 5);
    }

    #[test]
    fn get_int_returns_default_for_missing() {
        let adapter = FileConfigAdapter::from_string("[cache]\n").unwrap();
        assert_eq!(adapter.get_int("cache", "missing", 42), 42);
    }

    #[test]
    fn get_int_returns_default_for_non_numeric() {
        let adapter = FileConfigAdapter::from_string("[cache]\nttl_secs = abc\n").unwrap();
        assert_eq!(adapter.get_int("cache", "ttl_secs", 42), 42);
    }

    #[test]
    fn durations_ignore_negative_values() {
        let adapter = FileConfigAdapter::from_string("[nasdaq]\nsymbol_delay_ms = -5\n").unwrap();
        assert_eq!(
            adapter.get_millis("nasdaq", "symbol_delay_ms", Duration::from_millis(200)),
            Duration::from_millis(200)
        );
    }

    #[test]
    fn empty_adapter_yields_default_settings() {
        let settings = Settings::from_config(&FileConfigAdapter::empty()).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn from_file_reads_settings() {
        let content = "[nasdaq]\npoll_interval_secs = 2\nexport_timeout_secs = 20\n\n[output]\ndir = out\n";
        let file = create_temp_config(content);
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        let settings = Settings::from_config(&adapter).unwrap();
        assert_eq!(settings.poll.interval, Duration::from_secs(2));
        assert_eq!(settings.poll.timeout, Duration::from_secs(20));
        assert_eq!(settings.output_dir, "out");
    }

    #[test]
    fn from_file_returns_error_for_missing_file() {
        let result = FileConfigAdapter::from_file("/nonexistent/path/settings.ini");
        assert!(matches!(result, Err(RollfolioError::ConfigParse { .. })));
    }
}
