//! Match configuration file.
//!
//! Every section and field is optional; a missing file section falls back to
//! its default. `game_time` is the length of one half in seconds.

use crate::error::SupervisorError;
use crate::referee::MatchRules;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    pub game_time: f64,
    pub deadlock: bool,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            game_time: 300.0,
            deadlock: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    /// Restart the match with sides swapped when it ends.
    pub repeat: bool,
}

/// One participant process.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RoleConfig {
    pub name: String,
    pub executable: Option<PathBuf>,
    pub datapath: PathBuf,
}

impl RoleConfig {
    fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            executable: None,
            datapath: PathBuf::from("data"),
        }
    }
}

impl Default for RoleConfig {
    fn default() -> Self {
        Self::named("")
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SupervisorConfig {
    pub rule: RuleConfig,
    pub tool: ToolConfig,
    pub team_a: RoleConfig,
    pub team_b: RoleConfig,
    pub commentator: RoleConfig,
    pub reporter: RoleConfig,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            rule: RuleConfig::default(),
            tool: ToolConfig::default(),
            team_a: RoleConfig::named("team_a"),
            team_b: RoleConfig::named("team_b"),
            commentator: RoleConfig::named("commentator"),
            reporter: RoleConfig::named("reporter"),
        }
    }
}

impl SupervisorConfig {
    pub fn load(path: &Path) -> Result<Self, SupervisorError> {
        let text = std::fs::read_to_string(path).map_err(|e| SupervisorError::ConfigRead(path.to_path_buf(), e))?;
        serde_json::from_str(&text).map_err(|e| SupervisorError::ConfigParse(path.to_path_buf(), e))
    }

    pub fn match_rules(&self) -> MatchRules {
        MatchRules {
            game_time_ms: (self.rule.game_time.max(0.0) * 1000.0).round() as u64,
            deadlock: self.rule.deadlock,
        }
    }

    /// Role configurations in [`shared::Role::ALL`] order.
    pub fn roles(&self) -> [&RoleConfig; 4] {
        [&self.team_a, &self.team_b, &self.commentator, &self.reporter]
    }
}
