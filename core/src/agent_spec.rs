//! Agent-builder spec model.
//!
//! Mirrors the spec documents the backend stores and deploys: identity
//! ("soul"), tool policy, and the airlock rate limits edited through the
//! builder's rate-limit form.

use crate::errors::{SpecError, SpecResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSpec {
    pub id: String,
    #[serde(default = "default_version")]
    pub version: String,
    pub soul: AgentSoul,
    #[serde(default)]
    pub airlock: AirlockConfig,
}

fn default_version() -> String {
    "3.0.0".to_string()
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AgentSoul {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AirlockConfig {
    #[serde(default)]
    pub tool_policy: ToolPolicy,
    #[serde(default)]
    pub rate_limits: RateLimits,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolPolicy {
    #[serde(default = "default_policy_mode")]
    pub mode: String, // "all" | "allowlist"
    #[serde(default)]
    pub allow: Vec<String>,
    #[serde(default)]
    pub deny: Vec<String>,
}

fn default_policy_mode() -> String {
    "all".to_string()
}

impl Default for ToolPolicy {
    fn default() -> Self {
        Self {
            mode: default_policy_mode(),
            allow: Vec::new(),
            deny: Vec::new(),
        }
    }
}

/// Airlock rate limits; zero means unlimited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RateLimits {
    #[serde(default)]
    pub max_requests_per_minute: u32,
    #[serde(default)]
    pub max_tokens_per_day: u64,
}

impl AgentSpec {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version: default_version(),
            soul: AgentSoul {
                name: name.into(),
                description: String::new(),
            },
            airlock: AirlockConfig::default(),
        }
    }

    /// Check the spec before it is saved or deployed
    pub fn validate(&self) -> SpecResult<()> {
        if self.id.trim().is_empty() {
            return Err(SpecError::MissingId);
        }
        if self.soul.name.trim().is_empty() {
            return Err(SpecError::MissingName);
        }

        let policy = &self.airlock.tool_policy;
        match policy.mode.as_str() {
            "all" => {}
            "allowlist" => {
                if policy.allow.is_empty() {
                    return Err(SpecError::EmptyAllowlist);
                }
            }
            other => return Err(SpecError::UnknownPolicyMode(other.to_string())),
        }

        if let Some(tool) = policy.allow.iter().find(|t| policy.deny.contains(t)) {
            return Err(SpecError::ConflictingTool(tool.clone()));
        }

        Ok(())
    }
}

/// Raw text of the builder's rate-limit fields
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RateLimitForm {
    pub max_requests_per_minute: String,
    pub max_tokens_per_day: String,
}

impl RateLimitForm {
    /// Render limits back into form fields; unlimited renders empty
    pub fn from_limits(limits: &RateLimits) -> Self {
        fn field<T: PartialEq + Default + ToString>(value: T) -> String {
            if value == T::default() {
                String::new()
            } else {
                value.to_string()
            }
        }

        Self {
            max_requests_per_minute: field(limits.max_requests_per_minute),
            max_tokens_per_day: field(limits.max_tokens_per_day),
        }
    }

    pub fn parse(&self) -> SpecResult<RateLimits> {
        Ok(RateLimits {
            max_requests_per_minute: parse_field(
                "max_requests_per_minute",
                &self.max_requests_per_minute,
            )?,
            max_tokens_per_day: parse_field("max_tokens_per_day", &self.max_tokens_per_day)?,
        })
    }
}

fn parse_field<T: std::str::FromStr + Default>(field: &'static str, raw: &str) -> SpecResult<T> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(T::default());
    }
    trimmed.parse().map_err(|_| SpecError::InvalidRateLimit {
        field,
        value: raw.to_string(),
    })
}
