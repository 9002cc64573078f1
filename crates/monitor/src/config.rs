use anyhow::{Context, Result};
use engine::{CodeRegistry, ExtractOptions};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::cli::Cli;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MonitorConfig {
    pub source: SourceConfig,
    #[serde(default)]
    pub extraction: ExtractOptions,
    #[serde(default)]
    pub registry: RegistryConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceConfig {
    pub log_file: PathBuf,
}

/// Course-code table. Empty means the built-in faculty table.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RegistryConfig {
    #[serde(default)]
    pub codes: Vec<CodeEntry>,
}

/// Codes are carried as values rather than map keys so their case survives
/// the config layering.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CodeEntry {
    pub code: String,
    pub category: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    /// Snapshot destination; stdout when unset
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub pretty: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
    pub output: LogOutput,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

/// Diagnostics never go to stdout, which carries the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    Stderr,
    File { path: String },
}

impl RegistryConfig {
    pub fn build(&self) -> CodeRegistry {
        if self.codes.is_empty() {
            CodeRegistry::default()
        } else {
            CodeRegistry::new(self.codes.iter().map(|e| (e.code.as_str(), e.category.as_str())))
        }
    }
}

impl MonitorConfig {
    /// Load configuration from monitor.toml and environment variables.
    /// An explicit path replaces the search paths and must exist.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        dotenvy::dotenv().ok();

        // Compile-time defaults fill any key missing from files/env
        let defaults = config::Config::try_from(&MonitorConfig::default())
            .context("Failed to serialize default configuration")?;

        let mut builder = config::Config::builder().add_source(defaults);

        match explicit {
            Some(path) => {
                builder = builder.add_source(config::File::from(path).required(true));
            }
            None => {
                // 1. /etc/enrolmon/monitor.toml (deployed)
                // 2. config/monitor.toml (local development)
                // 3. crates/monitor/config/monitor.toml (workspace root)
                let config_paths = [
                    "/etc/enrolmon/monitor",
                    "config/monitor",
                    "crates/monitor/config/monitor",
                ];
                for path in config_paths {
                    builder = builder.add_source(config::File::with_name(path).required(false));
                }
            }
        }

        // Nested keys use a double underscore: MONITOR_EXTRACTION__RECENT_LINES
        builder = builder.add_source(
            config::Environment::with_prefix("MONITOR")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Command-line flags win over every other layer.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(log_file) = &cli.log_file {
            self.source.log_file = log_file.clone();
        }
        if let Some(output) = &cli.output {
            self.output.path = Some(output.clone());
        }
        if cli.pretty {
            self.output.pretty = true;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.source.log_file.as_os_str().is_empty() {
            anyhow::bail!("source.log_file must not be empty");
        }

        let extraction = &self.extraction;
        if extraction.recent_lines == 0 {
            anyhow::bail!("extraction.recent_lines must be at least 1");
        }
        if extraction.detection_sample_lines == 0 {
            anyhow::bail!("extraction.detection_sample_lines must be at least 1");
        }
        if extraction.semester_marker.trim().is_empty() {
            anyhow::bail!("extraction.semester_marker must not be empty");
        }

        for (i, entry) in self.registry.codes.iter().enumerate() {
            if entry.code.trim().is_empty() {
                anyhow::bail!("registry.codes[{}] has an empty code", i);
            }
            if entry.category.trim().is_empty() {
                anyhow::bail!("registry.codes[{}] ({}) has an empty category", i, entry.code);
            }
        }

        if let LogOutput::File { path } = &self.logging.output {
            if path.trim().is_empty() {
                anyhow::bail!("logging.output.file.path must not be empty");
            }
        }

        Ok(())
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            source: SourceConfig {
                log_file: PathBuf::from("enrolment_sync.log"),
            },
            extraction: ExtractOptions::default(),
            registry: RegistryConfig::default(),
            output: OutputConfig {
                path: None,
                pretty: false,
            },
            logging: LoggingConfig {
                level: "info,monitor=debug".to_string(),
                format: LogFormat::Pretty,
                output: LogOutput::Stderr,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;
    use std::sync::Mutex;

    // Loading reads process-wide environment variables
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn write_toml(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    // ── defaults ──────────────────────────────────────────────

    #[test]
    fn test_default_is_valid() {
        let config = MonitorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.extraction.recent_lines, 30);
        assert_eq!(config.extraction.detection_sample_lines, 50);
        assert_eq!(config.extraction.semester_marker, "_SEM");
        assert_eq!(config.logging.output, LogOutput::Stderr);
    }

    #[test]
    fn test_empty_registry_uses_builtin_table() {
        let registry = RegistryConfig::default().build();
        assert_eq!(registry.len(), CodeRegistry::default().len());
        assert!(registry.lookup("ANLA").is_some());
    }

    #[test]
    fn test_custom_registry_replaces_builtin_table() {
        let registry = RegistryConfig {
            codes: vec![CodeEntry {
                code: "MATH".to_string(),
                category: "Science".to_string(),
            }],
        }
        .build();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.lookup("MATH"), Some("Science"));
        assert_eq!(registry.lookup("ANLA"), None);
    }

    // ── validation ────────────────────────────────────────────

    #[test]
    fn test_validate_rejects_zero_windows() {
        let mut config = MonitorConfig::default();
        config.extraction.recent_lines = 0;
        assert!(config.validate().is_err());

        let mut config = MonitorConfig::default();
        config.extraction.detection_sample_lines = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_blank_marker_and_path() {
        let mut config = MonitorConfig::default();
        config.extraction.semester_marker = "  ".to_string();
        assert!(config.validate().is_err());

        let mut config = MonitorConfig::default();
        config.source.log_file = PathBuf::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_incomplete_code_entry() {
        let mut config = MonitorConfig::default();
        config.registry.codes.push(CodeEntry {
            code: "MATH".to_string(),
            category: String::new(),
        });
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("MATH"));
    }

    // ── loading ───────────────────────────────────────────────

    #[test]
    fn test_load_explicit_file_overrides_defaults() {
        let _env = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let file = write_toml(
            r#"
[source]
log_file = "/var/log/enrolment_sync.log"

[extraction]
recent_lines = 10

[[registry.codes]]
code = "MATH"
category = "Faculty of Science"

[output]
path = "site/metrics.json"
pretty = true

[logging]
format = "json"
output = { file = { path = "monitor.log" } }
"#,
        );

        let config = MonitorConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.source.log_file, PathBuf::from("/var/log/enrolment_sync.log"));
        assert_eq!(config.extraction.recent_lines, 10);
        // Untouched keys keep their defaults
        assert_eq!(config.extraction.detection_sample_lines, 50);
        assert_eq!(config.extraction.semester_marker, "_SEM");
        assert_eq!(config.registry.codes.len(), 1);
        assert_eq!(config.registry.codes[0].code, "MATH");
        assert_eq!(config.output.path, Some(PathBuf::from("site/metrics.json")));
        assert!(config.output.pretty);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(
            config.logging.output,
            LogOutput::File {
                path: "monitor.log".to_string()
            }
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let _env = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("monitor.toml");
        assert!(MonitorConfig::load(Some(&missing)).is_err());
    }

    #[test]
    fn test_env_overrides_use_single_underscore_after_prefix() {
        let _env = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        std::env::set_var("MONITOR_SOURCE__LOG_FILE", "/tmp/from_env.log");
        std::env::set_var("MONITOR_EXTRACTION__RECENT_LINES", "12");

        let loaded = MonitorConfig::load(None);

        std::env::remove_var("MONITOR_SOURCE__LOG_FILE");
        std::env::remove_var("MONITOR_EXTRACTION__RECENT_LINES");

        let config = loaded.unwrap();
        assert_eq!(config.source.log_file, PathBuf::from("/tmp/from_env.log"));
        assert_eq!(config.extraction.recent_lines, 12);
    }

    // ── command line ──────────────────────────────────────────

    #[test]
    fn test_cli_flags_override_config() {
        let cli = Cli::try_parse_from(["monitor", "-l", "today.log", "-o", "out.json", "--pretty"]).unwrap();
        let mut config = MonitorConfig::default();
        config.apply_cli(&cli);

        assert_eq!(config.source.log_file, PathBuf::from("today.log"));
        assert_eq!(config.output.path, Some(PathBuf::from("out.json")));
        assert!(config.output.pretty);
    }

    #[test]
    fn test_absent_cli_flags_keep_config() {
        let cli = Cli::try_parse_from(["monitor"]).unwrap();
        let mut config = MonitorConfig::default();
        config.output.pretty = true;
        config.apply_cli(&cli);

        assert_eq!(config.source.log_file, PathBuf::from("enrolment_sync.log"));
        assert!(config.output.path.is_none());
        assert!(config.output.pretty);
    }
}
