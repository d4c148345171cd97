//! Engine configuration (softcode.toml)
//!
//! Every section and field has a default, so an empty file is a valid
//! configuration. A handful of limits can also be overridden from the
//! environment with `SOFTCODE_<KEY>` variables.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

use crate::dbref::Dbref;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid value for {key}: {value}")]
    InvalidEnv { key: String, value: String },
    #[error("{0}: alias name and command must be non-empty")]
    EmptyAlias(String),
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub limits: Limits,
    pub parser: ParserConfig,
    pub dispatch: DispatchConfig,

    /// Command aliases replayed at startup: `{ name = "p", command = "@pemit" }`
    #[serde(rename = "alias")]
    pub aliases: Vec<AliasDirective>,

    /// Per-command (or `command/switch`) permission overrides
    pub access: HashMap<String, String>,

    /// Per-function permission overrides
    pub function_access: HashMap<String, String>,

    /// User-defined functions replayed at startup
    #[serde(rename = "function")]
    pub functions: Vec<FunctionDirective>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Limits {
    pub function_nesting: usize,
    pub function_invocations: usize,
    pub stack_nesting: usize,
    pub lock_nesting: usize,
    pub trace_lines: usize,
    /// Depth of the delimiter scanner's expected-closer stack
    pub parse_nesting: usize,
    pub parent_nesting: usize,
    /// Upper bound on text produced by amplifying functions like repeat()
    pub output_limit: usize,
    /// Per-command CPU budget; 0 disables the alarm deadline
    pub cpu_time_ms: u64,
    pub queue_batch: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            function_nesting: 50,
            function_invocations: 2500,
            stack_nesting: 300,
            lock_nesting: 20,
            trace_lines: 200,
            parse_nesting: 32,
            parent_nesting: 10,
            output_limit: 8000,
            cpu_time_ms: 0,
            queue_batch: 1000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    pub space_compress: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self { space_compress: true }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    pub pemit_any: bool,
    pub pemit_players: bool,
    pub match_mine: bool,
    pub match_mine_players: bool,
    pub have_zones: bool,
    pub master_room: Dbref,
    pub hook_object: Dbref,
    pub global_error_object: Dbref,
    pub building_allowed: bool,
    pub queueing_allowed: bool,
    /// Permission names required to use `home`; empty means anyone
    pub restrict_home: String,
    pub log_bad_commands: bool,
    pub addcmd_obey_uselocks: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            pemit_any: false,
            pemit_players: false,
            match_mine: true,
            match_mine_players: false,
            have_zones: true,
            master_room: Dbref::NOTHING,
            hook_object: Dbref::NOTHING,
            global_error_object: Dbref::NOTHING,
            building_allowed: true,
            queueing_allowed: true,
            restrict_home: String::new(),
            log_bad_commands: true,
            addcmd_obey_uselocks: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AliasDirective {
    pub name: String,
    /// Either a command name or `command/switch`
    pub command: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FunctionDirective {
    pub name: String,
    pub object: Dbref,
    pub attribute: String,
    #[serde(default)]
    pub privileged: bool,
    #[serde(default)]
    pub preserve: bool,
}

impl Config {
    /// Parse a TOML document
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        for alias in &config.aliases {
            if alias.name.trim().is_empty() || alias.command.trim().is_empty() {
                return Err(ConfigError::EmptyAlias(alias.name.clone()));
            }
        }
        Ok(config)
    }

    /// Load from a file, then apply environment overrides
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml(&content)?;
        config.apply_env()?;
        Ok(config)
    }

    /// Apply `SOFTCODE_*` overrides from the process environment
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    pub(crate) fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        fn parsed<T: std::str::FromStr>(key: &str, value: String) -> Result<T, ConfigError> {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidEnv { key: key.to_string(), value })
        }

        if let Some(v) = lookup("SOFTCODE_FUNCTION_NESTING") {
            self.limits.function_nesting = parsed("SOFTCODE_FUNCTION_NESTING", v)?;
        }
        if let Some(v) = lookup("SOFTCODE_FUNCTION_INVOCATIONS") {
            self.limits.function_invocations = parsed("SOFTCODE_FUNCTION_INVOCATIONS", v)?;
        }
        if let Some(v) = lookup("SOFTCODE_STACK_NESTING") {
            self.limits.stack_nesting = parsed("SOFTCODE_STACK_NESTING", v)?;
        }
        if let Some(v) = lookup("SOFTCODE_CPU_TIME_MS") {
            self.limits.cpu_time_ms = parsed("SOFTCODE_CPU_TIME_MS", v)?;
        }
        Ok(())
    }
}
