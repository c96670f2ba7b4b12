use anyhow::Result;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::{fs, path::Path};

use crate::linter::Level;
use crate::rules::ALL_RULES;

#[derive(Debug, PartialEq, Clone, Copy, Deserialize)]
pub enum RuleSeverity {
    #[serde(rename = "err")]
    Error,
    #[serde(rename = "warn")]
    Warning,
    #[serde(rename = "info")]
    Info,
    #[serde(rename = "off")]
    Off,
}

impl RuleSeverity {
    /// The result level this severity maps to; `Off` has none.
    pub fn level(self) -> Option<Level> {
        match self {
            Self::Error => Some(Level::Error),
            Self::Warning => Some(Level::Warning),
            Self::Info => Some(Level::Info),
            Self::Off => None,
        }
    }

    pub fn from_level(level: Level) -> Self {
        match level {
            Level::Error => Self::Error,
            Level::Warning => Self::Warning,
            Level::Info => Self::Info,
        }
    }
}

#[derive(Debug, PartialEq, Clone, Deserialize)]
pub struct NET003SnmpCommunityTable {
    /// Community strings that must never appear in a configuration.
    #[serde(default = "default_forbidden_communities")]
    pub forbidden: Vec<String>,
}

impl Default for NET003SnmpCommunityTable {
    fn default() -> Self {
        Self {
            forbidden: default_forbidden_communities(),
        }
    }
}

#[derive(Debug, PartialEq, Clone, Deserialize)]
pub struct NET004VtyTransportTable {
    /// Input transports a vty line is allowed to accept.
    #[serde(default = "default_allowed_transports")]
    pub allowed_transports: Vec<String>,
}

impl Default for NET004VtyTransportTable {
    fn default() -> Self {
        Self {
            allowed_transports: default_allowed_transports(),
        }
    }
}

#[derive(Debug, PartialEq, Clone, Deserialize)]
pub struct NET005InterfaceDescriptionTable {
    /// Interface name prefixes exempt from the description requirement.
    #[serde(default = "default_ignored_prefixes")]
    pub ignored_prefixes: Vec<String>,
}

impl Default for NET005InterfaceDescriptionTable {
    fn default() -> Self {
        Self {
            ignored_prefixes: default_ignored_prefixes(),
        }
    }
}

#[derive(Debug, PartialEq, Clone, Deserialize)]
pub struct NET007ExecTimeoutTable {
    /// Whether console lines are held to the same timeout requirement as
    /// vty lines.
    #[serde(default = "default_true")]
    pub require_console: bool,
}

impl Default for NET007ExecTimeoutTable {
    fn default() -> Self {
        Self {
            require_console: true,
        }
    }
}

#[derive(Debug, Default, PartialEq, Clone, Deserialize)]
pub struct LintersSettingsTable {
    #[serde(rename = "snmp-community")]
    #[serde(default)]
    pub snmp_community: NET003SnmpCommunityTable,
    #[serde(rename = "vty-transport-ssh")]
    #[serde(default)]
    pub vty_transport: NET004VtyTransportTable,
    #[serde(rename = "interface-description")]
    #[serde(default)]
    pub interface_description: NET005InterfaceDescriptionTable,
    #[serde(rename = "vty-exec-timeout")]
    #[serde(default)]
    pub exec_timeout: NET007ExecTimeoutTable,
}

#[derive(Debug, Default, PartialEq, Clone, Deserialize)]
pub struct LintersTable {
    #[serde(default)]
    pub severity: HashMap<String, RuleSeverity>,
    #[serde(default)]
    pub settings: LintersSettingsTable,
}

#[derive(Debug, Default, PartialEq, Clone, Deserialize)]
pub struct NetlintConfig {
    #[serde(default)]
    pub linters: LintersTable,
}

/// Drop severity entries for unknown rule aliases and fill missing aliases
/// with each rule's default level.
pub fn normalize_severities(severities: &mut HashMap<String, RuleSeverity>) {
    let rule_aliases: HashSet<&str> = ALL_RULES.iter().map(|r| r.alias).collect();
    severities.retain(|key, _| rule_aliases.contains(key.as_str()));
    for rule in ALL_RULES {
        severities
            .entry(rule.alias.to_string())
            .or_insert_with(|| RuleSeverity::from_level(rule.metadata.level));
    }
}

impl NetlintConfig {
    pub fn new(linters: LintersTable) -> Self {
        Self { linters }
    }

    pub fn default_with_normalized_severities() -> Self {
        let mut config = Self::default();
        normalize_severities(&mut config.linters.severity);
        config
    }

    /// Configured severity for a rule alias. A missing entry means the rule
    /// is not enabled.
    pub fn severity_for(&self, alias: &str) -> RuleSeverity {
        self.linters
            .severity
            .get(alias)
            .copied()
            .unwrap_or(RuleSeverity::Off)
    }
}

/// Default functions for TOML deserialization.
pub fn default_true() -> bool {
    true
}

pub fn default_forbidden_communities() -> Vec<String> {
    vec!["public".to_string(), "private".to_string()]
}

pub fn default_allowed_transports() -> Vec<String> {
    vec!["ssh".to_string()]
}

pub fn default_ignored_prefixes() -> Vec<String> {
    vec!["Loopback".to_string(), "Null".to_string()]
}

/// Parse a TOML configuration string into a NetlintConfig
pub fn parse_toml_config(config_str: &str) -> Result<NetlintConfig> {
    let mut config: NetlintConfig = toml::from_str(config_str)?;
    normalize_severities(&mut config.linters.severity);
    Ok(config)
}

/// Load configuration from the NETLINT_CONFIG environment variable, a path,
/// or the defaults.
pub fn config_from_env_path_or_default(path: &Path) -> Result<NetlintConfig> {
    if let Ok(env_config_path) = std::env::var("NETLINT_CONFIG") {
        let env_config_file = Path::new(&env_config_path);
        if env_config_file.is_file() {
            match fs::read_to_string(env_config_file) {
                Ok(config) => return parse_toml_config(&config),
                Err(e) => {
                    eprintln!(
                        "Error loading config from NETLINT_CONFIG path {env_config_path}: {e}. Default config will be used."
                    );
                    return Ok(NetlintConfig::default_with_normalized_severities());
                }
            }
        } else {
            eprintln!(
                "Config file was not found at NETLINT_CONFIG path {env_config_path}. Default config will be used."
            );
            return Ok(NetlintConfig::default_with_normalized_severities());
        }
    }

    config_in_path_or_default(path)
}

/// Load `netlint.toml` from a directory, or return the defaults.
pub fn config_in_path_or_default(path: &Path) -> Result<NetlintConfig> {
    let config_file = path.join("netlint.toml");
    if config_file.is_file() {
        let config = fs::read_to_string(config_file)?;
        return parse_toml_config(&config);
    }
    Ok(NetlintConfig::default_with_normalized_severities())
}

/// Walk upward from a file looking for the nearest `netlint.toml`. The
/// search is bounded at the containing repository root: a directory holding
/// `.git` is the last one examined, so a config outside the checkout never
/// leaks in.
pub fn discover_config_or_default(file_path: &Path) -> Result<NetlintConfig> {
    let start = if file_path.is_dir() {
        file_path
    } else {
        file_path.parent().unwrap_or(file_path)
    };
    for dir in start.ancestors() {
        let candidate = dir.join("netlint.toml");
        if candidate.is_file() {
            let config = fs::read_to_string(candidate)?;
            return parse_toml_config(&config);
        }
        if dir.join(".git").exists() {
            break;
        }
    }
    Ok(NetlintConfig::default_with_normalized_severities())
}

/// Walk upward from a file toward the nearest containing workspace root;
/// the search stops at the root instead of continuing to the filesystem
/// root. Used by the editor integration.
pub fn discover_config_with_workspace_or_default(
    file_path: &Path,
    workspace_roots: Vec<PathBuf>,
) -> Result<NetlintConfig> {
    let start = if file_path.is_dir() {
        file_path
    } else {
        file_path.parent().unwrap_or(file_path)
    };
    for dir in start.ancestors() {
        let candidate = dir.join("netlint.toml");
        if candidate.is_file() {
            let config = fs::read_to_string(candidate)?;
            return parse_toml_config(&config);
        }
        if workspace_roots.iter().any(|root| root == dir) {
            break;
        }
    }
    Ok(NetlintConfig::default_with_normalized_severities())
}
