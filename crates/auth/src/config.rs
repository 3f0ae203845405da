//! Policy configuration.

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Tunables for the lifecycle state machines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Whether a `rejected` volunteer may later be approved.
    ///
    /// When `false`, rejection is terminal and a later approve returns
    /// `ALREADY_DECIDED`.
    pub allow_reapproval: bool,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            allow_reapproval: true,
        }
    }
}

impl PolicyConfig {
    pub const ALLOW_REAPPROVAL_VAR: &'static str = "CCVMS_ALLOW_REAPPROVAL";

    /// Load from the process environment, falling back to defaults for unset variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup (tests pass a closure over a map).
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(Self::ALLOW_REAPPROVAL_VAR) {
            config.allow_reapproval = parse_bool(&raw)
                .with_context(|| format!("invalid {}", Self::ALLOW_REAPPROVAL_VAR))?;
        }

        tracing::debug!(allow_reapproval = config.allow_reapproval, "policy config loaded");
        Ok(config)
    }
}

fn parse_bool(raw: &str) -> anyhow::Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("expected a boolean, got '{other}'"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_permit_reapproval() {
        let config = PolicyConfig::from_lookup(|_| None).unwrap();
        assert!(config.allow_reapproval);
    }

    #[test]
    fn reads_flag_from_lookup() {
        let config = PolicyConfig::from_lookup(|key| {
            (key == PolicyConfig::ALLOW_REAPPROVAL_VAR).then(|| "off".to_string())
        })
        .unwrap();
        assert!(!config.allow_reapproval);
    }

    #[test]
    fn rejects_garbage() {
        let err = PolicyConfig::from_lookup(|_| Some("maybe".to_string())).unwrap_err();
        assert!(format!("{err:#}").contains(PolicyConfig::ALLOW_REAPPROVAL_VAR));
    }

    #[test]
    fn deserializes_with_missing_fields() {
        let config: PolicyConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, PolicyConfig::default());
    }
}
