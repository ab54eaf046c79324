//! Application configuration loading for CLI defaults.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use cookbooker_core::RunConfig;

/// File configuration for cookbooker defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileConfig {
    /// Default working directory (holds `tmp/` and `pdf/`).
    pub work_dir: Option<PathBuf>,
    /// Default concurrency (same range as CLI).
    pub concurrency: Option<u8>,
    /// Default attempt ceiling per page.
    pub max_attempts: Option<u32>,
    /// Backoff unit in milliseconds.
    pub backoff_unit_ms: Option<u64>,
    /// Optional HTTP connect timeout in seconds.
    pub connect_timeout_secs: Option<u64>,
    /// Optional HTTP read timeout in seconds.
    pub read_timeout_secs: Option<u64>,
}

impl FileConfig {
    /// Validates config values against runtime and CLI constraints.
    pub fn validate(&self) -> Result<()> {
        if let Some(concurrency) = self.concurrency
            && !(1..=100).contains(&concurrency)
        {
            bail!("Invalid config value for `concurrency`: {concurrency}. Expected range: 1..=100");
        }

        if let Some(max_attempts) = self.max_attempts
            && !(1..=50).contains(&max_attempts)
        {
            bail!(
                "Invalid config value for `max_attempts`: {max_attempts}. Expected range: 1..=50"
            );
        }

        if let Some(unit) = self.backoff_unit_ms
            && unit > 60_000
        {
            bail!("Invalid config value for `backoff_unit_ms`: {unit}. Expected range: 0..=60000");
        }

        validate_timeout_secs("connect_timeout_secs", self.connect_timeout_secs)?;
        validate_timeout_secs("read_timeout_secs", self.read_timeout_secs)?;
        Ok(())
    }

    /// Copies every value present in the file onto `config`.
    pub fn apply_to(&self, config: &mut RunConfig) {
        if let Some(dir) = &self.work_dir {
            config.set_work_dir(dir.clone());
        }
        if let Some(concurrency) = self.concurrency {
            config.set_concurrency(usize::from(concurrency));
        }
        if let Some(max_attempts) = self.max_attempts {
            config.set_max_attempts(max_attempts);
        }
        if let Some(unit) = self.backoff_unit_ms {
            config.set_backoff_unit(Duration::from_millis(unit));
        }
    }
}

fn validate_timeout_secs(field: &str, value: Option<u64>) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if !(1..=3600).contains(&value) {
        bail!("Invalid config value for `{field}`: {value}. Expected range: 1..=3600");
    }
    Ok(())
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/cookbooker/config.toml`
/// 2. `$HOME/.config/cookbooker/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("cookbooker")
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("cookbooker")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads config from the default path; a missing file yields defaults.
pub fn load_default_file_config() -> Result<FileConfig> {
    match resolve_default_config_path() {
        Some(path) if path.exists() => load_file_config(&path),
        _ => Ok(FileConfig::default()),
    }
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    let config = parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))?;
    config
        .validate()
        .with_context(|| format!("Invalid config file '{}'", path.display()))?;
    Ok(config)
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line_no = line_index + 1;
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!("Invalid config syntax on line {line_no}: expected key = value");
        };

        let key = raw_key.trim();
        let value = raw_value.trim();

        match key {
            "work_dir" => {
                let parsed = parse_string_literal(value)
                    .with_context(|| format!("Invalid `work_dir` value on line {line_no}"))?;
                cfg.work_dir = Some(PathBuf::from(parsed));
            }
            "concurrency" => {
                let parsed = parse_integer_u64(value)
                    .with_context(|| format!("Invalid `concurrency` value on line {line_no}"))?;
                cfg.concurrency = Some(
                    u8::try_from(parsed)
                        .map_err(|_| anyhow::anyhow!("concurrency out of range for u8"))?,
                );
            }
            "max_attempts" => {
                let parsed = parse_integer_u64(value)
                    .with_context(|| format!("Invalid `max_attempts` value on line {line_no}"))?;
                cfg.max_attempts = Some(
                    u32::try_from(parsed)
                        .map_err(|_| anyhow::anyhow!("max_attempts out of range for u32"))?,
                );
            }
            "backoff_unit_ms" => {
                let parsed = parse_integer_u64(value).with_context(|| {
                    format!("Invalid `backoff_unit_ms` value on line {line_no}")
                })?;
                cfg.backoff_unit_ms = Some(parsed);
            }
            "connect_timeout_secs" => {
                let parsed = parse_integer_u64(value).with_context(|| {
                    format!("Invalid `connect_timeout_secs` value on line {line_no}")
                })?;
                cfg.connect_timeout_secs = Some(parsed);
            }
            "read_timeout_secs" => {
                let parsed = parse_integer_u64(value).with_context(|| {
                    format!("Invalid `read_timeout_secs` value on line {line_no}")
                })?;
                cfg.read_timeout_secs = Some(parsed);
            }
            other => bail!("Unknown config key `{other}` on line {line_no}"),
        }
    }
    Ok(cfg)
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_string_literal(value: &str) -> Result<String> {
    let Some(inner) = value
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
    else {
        bail!("expected a double-quoted string");
    };
    Ok(inner.to_string())
}

fn parse_integer_u64(value: &str) -> Result<u64> {
    value
        .parse::<u64>()
        .with_context(|| format!("expected a non-negative integer, got '{value}'"))
}
