use serde::{Deserialize, Serialize};
use std::path::Path;

/// Matches `yyyy-MM-dd hh:mm:ss`, e.g. `2024-03-01 12:30:00`.
pub const DEFAULT_DATE_FORMAT: &str = "[year]-[month]-[day] [hour]:[minute]:[second]";

/// Settings for the record evaluator.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct EvalConfig {
    /// `time` format description used for ordering comparisons on dates.
    #[serde(default = "default_date_format")]
    pub date_format: String,
}

fn default_date_format() -> String {
    DEFAULT_DATE_FORMAT.to_string()
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            date_format: default_date_format(),
        }
    }
}

impl EvalConfig {
    /// Load from an optional file (any format the `config` crate knows),
    /// overridden by `FILTERSPEC_*` environment variables.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut builder = ::config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(::config::File::from(path));
        }
        let settings = builder
            .add_source(::config::Environment::with_prefix("FILTERSPEC"))
            .build()?;
        Ok(settings.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_without_file() {
        let config = EvalConfig::load(None).unwrap();
        assert_eq!(config.date_format, DEFAULT_DATE_FORMAT);
    }

    #[test]
    fn test_load_yaml() {
        let mut file = tempfile::NamedTempFile::with_suffix(".yaml").unwrap();
        writeln!(file, "date_format: \"[year]-[month]-[day]\"").unwrap();

        let config = EvalConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.date_format, "[year]-[month]-[day]");
    }
}
