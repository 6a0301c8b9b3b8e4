//! INI file configuration adapter.

use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let mut config = Ini::new();
        config.load(path).map_err(std::io::Error::other)?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, String> {
        let mut config = Ini::new();
        config.read(content.to_string())?;
        Ok(Self { config })
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.to_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Some(true),
            "false" | "no" | "off" | "0" => Some(false),
            _ => None,
        }
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.config
            .getint(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.config
            .getfloat(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.config
            .get(section, key)
            .as_ref()
            .and_then(|v| Self::parse_bool(v))
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"
[data]
series_path = data/series.csv
predictions_path = data/predictions.csv

[simulation]
initial_capital = 10000.0
min_holding_days = 3
observation_window = 30

[costs]
transaction_cost = 0.0003
slippage = 0.0007
timing = per_step

[reward]
mode = risk_adjusted
holding_coef = 0.05
"#;

    #[test]
    fn from_string_parses_sections() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        assert_eq!(
            adapter.get_string("data", "series_path"),
            Some("data/series.csv".to_string())
        );
        assert_eq!(
            adapter.get_string("reward", "mode"),
            Some("risk_adjusted".to_string())
        );
    }

    #[test]
    fn missing_keys_return_none_or_default() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        assert_eq!(adapter.get_string("data", "missing"), None);
        assert_eq!(adapter.get_string("nope", "series_path"), None);
        assert_eq!(adapter.get_int("simulation", "missing", 42), 42);
        assert_eq!(adapter.get_double("costs", "missing", 9.5), 9.5);
    }

    #[test]
    fn numeric_values_parse() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        assert_eq!(adapter.get_int("simulation", "min_holding_days", 1), 3);
        assert_eq!(
            adapter.get_double("costs", "transaction_cost", 0.0),
            0.0003
        );
        assert_eq!(
            adapter.get_double("simulation", "initial_capital", 0.0),
            10_000.0
        );
    }

    #[test]
    fn non_numeric_values_fall_back_to_default() {
        let adapter =
            FileConfigAdapter::from_string("[simulation]\nmin_holding_days = soon\n").unwrap();
        assert_eq!(adapter.get_int("simulation", "min_holding_days", 1), 1);
        assert_eq!(
            adapter.get_double("simulation", "min_holding_days", 2.5),
            2.5
        );
    }

    #[test]
    fn bool_values_parse_all_spellings() {
        let adapter = FileConfigAdapter::from_string(
            "[flags]\na = true\nb = yes\nc = on\nd = 1\ne = false\nf = no\ng = off\nh = 0\n",
        )
        .unwrap();
        for key in ["a", "b", "c", "d"] {
            assert!(adapter.get_bool("flags", key, false), "{key} should be true");
        }
        for key in ["e", "f", "g", "h"] {
            assert!(!adapter.get_bool("flags", key, true), "{key} should be false");
        }
    }

    #[test]
    fn bool_default_for_missing_or_garbage() {
        let adapter = FileConfigAdapter::from_string("[flags]\nx = maybe\n").unwrap();
        assert!(adapter.get_bool("flags", "x", true));
        assert!(adapter.get_bool("flags", "missing", true));
        assert!(!adapter.get_bool("flags", "missing", false));
    }

    #[test]
    fn from_file_reads_config() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "[data]\nseries_path = /tmp/series.csv\n").unwrap();
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(
            adapter.get_string("data", "series_path"),
            Some("/tmp/series.csv".to_string())
        );
    }

    #[test]
    fn from_file_errors_on_missing_file() {
        assert!(FileConfigAdapter::from_file("/nonexistent/alphasim.ini").is_err());
    }
}
