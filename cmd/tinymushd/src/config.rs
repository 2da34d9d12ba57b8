//! Site masks, limits, and network settings loaded from a TOML config file
//! (spec.md §9 "configuration is file-based, not a database table").

use std::path::{Path, PathBuf};

use serde::Deserialize;

use tinymush_common::limits::{
    DEFAULT_CMD_QUOTA_INCR, DEFAULT_CMD_QUOTA_MAX, DEFAULT_CONN_TIMEOUT_SECS,
    DEFAULT_FUNC_INVK_LIM, DEFAULT_IDLE_TIMEOUT_SECS, DEFAULT_LOGIN_RETRIES,
    DEFAULT_MAX_ITER_NESTING, DEFAULT_NUMVARS_LIM, DEFAULT_PARENT_NEST_LIM, DEFAULT_STACK_LIM,
};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub mush_name: String,
    pub port: u16,
    pub datadir: PathBuf,
    pub dbdir: PathBuf,
    pub max_players: usize,
    pub limits: LimitsConfig,
    pub sites: SitesConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub func_invk_lim: u64,
    pub max_iter_nesting: usize,
    pub parent_nest_lim: usize,
    pub numvars_lim: usize,
    pub stack_lim: usize,
    pub cmd_quota_max: i32,
    pub cmd_quota_incr: i32,
    pub idle_timeout_secs: u64,
    pub conn_timeout_secs: u64,
    pub login_retries: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SitesConfig {
    /// CIDR-ish prefixes permitted to `create` new players.
    pub registration_allowed: Vec<String>,
    /// Prefixes forbidden to connect to guest characters (spec.md §8
    /// scenario 8, `H_GUEST`).
    pub guest_forbidden: Vec<String>,
}

impl Default for TomlConfig {
    fn default() -> Self {
        TomlConfig {
            mush_name: "TinyMUSH".to_string(),
            port: 6250,
            datadir: PathBuf::from("./data"),
            dbdir: PathBuf::from("./db"),
            max_players: 200,
            limits: LimitsConfig::default(),
            sites: SitesConfig::default(),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        LimitsConfig {
            func_invk_lim: DEFAULT_FUNC_INVK_LIM,
            max_iter_nesting: DEFAULT_MAX_ITER_NESTING,
            parent_nest_lim: DEFAULT_PARENT_NEST_LIM,
            numvars_lim: DEFAULT_NUMVARS_LIM,
            stack_lim: DEFAULT_STACK_LIM,
            cmd_quota_max: DEFAULT_CMD_QUOTA_MAX,
            cmd_quota_incr: DEFAULT_CMD_QUOTA_INCR,
            idle_timeout_secs: DEFAULT_IDLE_TIMEOUT_SECS,
            conn_timeout_secs: DEFAULT_CONN_TIMEOUT_SECS,
            login_retries: DEFAULT_LOGIN_RETRIES,
        }
    }
}

impl Default for SitesConfig {
    fn default() -> Self {
        SitesConfig {
            registration_allowed: Vec::new(),
            guest_forbidden: Vec::new(),
        }
    }
}

impl TomlConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            tracing::warn!(path = %path.display(), "config file not found, using defaults");
            return Ok(TomlConfig::default());
        }
        let text = std::fs::read_to_string(path)?;
        let config: TomlConfig = toml::from_str(&text)?;
        Ok(config)
    }

    /// True if `addr` matches one of `sites.guest_forbidden` by literal
    /// prefix (spec.md §8 scenario 8).
    pub fn guest_site_allowed(&self, addr: &str) -> bool {
        !self.sites.guest_forbidden.iter().any(|prefix| addr.starts_with(prefix.as_str()))
    }

    pub fn registration_allowed(&self, addr: &str) -> bool {
        self.sites.registration_allowed.is_empty()
            || self.sites.registration_allowed.iter().any(|prefix| addr.starts_with(prefix.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_parse_from_empty_toml() {
        let config: TomlConfig = toml::from_str("").unwrap();
        assert_eq!(config.port, 6250);
        assert_eq!(config.limits.cmd_quota_max, DEFAULT_CMD_QUOTA_MAX);
    }

    #[test]
    fn guest_forbidden_prefix_blocks_matching_address() {
        let mut config = TomlConfig::default();
        config.sites.guest_forbidden.push("10.0.0.".to_string());
        assert!(!config.guest_site_allowed("10.0.0.5"));
        assert!(config.guest_site_allowed("192.168.1.1"));
    }
}
