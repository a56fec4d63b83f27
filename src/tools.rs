//! Registry of AI tools resources can be installed into.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AimgrError, Result};
use crate::resource::ResourceType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    Claude,
    #[serde(rename = "opencode")]
    OpenCode,
    #[serde(alias = "vscode")]
    Copilot,
}

/// Project-relative directories a tool reads resources from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolInfo {
    pub display_name: &'static str,
    pub commands_dir: Option<&'static str>,
    pub skills_dir: Option<&'static str>,
    pub agents_dir: Option<&'static str>,
}

impl ToolInfo {
    #[must_use]
    pub const fn supports_commands(&self) -> bool {
        self.commands_dir.is_some()
    }

    #[must_use]
    pub const fn supports_skills(&self) -> bool {
        self.skills_dir.is_some()
    }

    #[must_use]
    pub const fn supports_agents(&self) -> bool {
        self.agents_dir.is_some()
    }

    /// Directory for `resource_type`, `None` when the tool lacks support.
    /// Packages are never installed directly.
    #[must_use]
    pub const fn dir_for(&self, resource_type: ResourceType) -> Option<&'static str> {
        match resource_type {
            ResourceType::Command => self.commands_dir,
            ResourceType::Skill => self.skills_dir,
            ResourceType::Agent => self.agents_dir,
            ResourceType::Package => None,
        }
    }
}

impl Tool {
    #[must_use]
    pub const fn all() -> [Self; 3] {
        [Self::Claude, Self::OpenCode, Self::Copilot]
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Claude => "claude",
            Self::OpenCode => "opencode",
            Self::Copilot => "copilot",
        }
    }

    #[must_use]
    pub const fn info(self) -> ToolInfo {
        match self {
            Self::Claude => ToolInfo {
                display_name: "Claude Code",
                commands_dir: Some(".claude/commands"),
                skills_dir: Some(".claude/skills"),
                agents_dir: Some(".claude/agents"),
            },
            Self::OpenCode => ToolInfo {
                display_name: "OpenCode",
                commands_dir: Some(".opencode/commands"),
                skills_dir: Some(".opencode/skills"),
                agents_dir: Some(".opencode/agents"),
            },
            Self::Copilot => ToolInfo {
                display_name: "GitHub Copilot / VSCode",
                commands_dir: None,
                skills_dir: Some(".github/skills"),
                agents_dir: None,
            },
        }
    }

    /// Marker directory whose presence means the project already uses the tool.
    /// Copilot is keyed on `.github/skills` since `.github` alone is common.
    const fn marker(self) -> &'static str {
        match self {
            Self::Claude => ".claude",
            Self::OpenCode => ".opencode",
            Self::Copilot => ".github/skills",
        }
    }

    /// Parse a list of tool names, dropping duplicates while keeping order.
    pub fn parse_list<S: AsRef<str>>(names: &[S]) -> Result<Vec<Self>> {
        let mut tools = Vec::new();
        for name in names {
            let tool = name.as_ref().parse::<Self>()?;
            if !tools.contains(&tool) {
                tools.push(tool);
            }
        }
        Ok(tools)
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tool {
    type Err = AimgrError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "claude" => Ok(Self::Claude),
            "opencode" => Ok(Self::OpenCode),
            "copilot" | "vscode" => Ok(Self::Copilot),
            other => Err(AimgrError::Validation(format!(
                "unknown tool: {other:?} (must be claude, opencode, copilot or vscode)"
            ))),
        }
    }
}

/// Tools whose configuration directories exist under `project`.
#[must_use]
pub fn detect_existing(project: &Path) -> Vec<Tool> {
    Tool::all()
        .into_iter()
        .filter(|tool| project.join(tool.marker()).is_dir())
        .collect()
}
