use chrono::{DateTime, Utc};
use console::style;
use serde::Serialize;

use crate::error::{AimgrError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Robot,
}

/// Envelope for everything printed on stdout in robot mode.
#[derive(Serialize)]
pub struct RobotResponse<T> {
    pub status: RobotStatus,
    pub timestamp: DateTime<Utc>,
    pub version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

#[derive(Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RobotStatus {
    Ok,
    Error { code: &'static str, message: String },
    Partial { completed: usize, failed: usize },
}

fn envelope<T>(status: RobotStatus, data: Option<T>) -> RobotResponse<T> {
    RobotResponse {
        status,
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION"),
        data,
    }
}

pub fn robot_ok<T: Serialize>(data: T) -> RobotResponse<T> {
    envelope(RobotStatus::Ok, Some(data))
}

/// `Ok` when nothing failed, `Partial` otherwise.
pub fn robot_counts<T: Serialize>(data: T, completed: usize, failed: usize) -> RobotResponse<T> {
    let status = if failed > 0 {
        RobotStatus::Partial { completed, failed }
    } else {
        RobotStatus::Ok
    };
    envelope(status, Some(data))
}

pub fn robot_error(err: &AimgrError) -> RobotResponse<()> {
    envelope(
        RobotStatus::Error {
            code: err.code(),
            message: err.to_string(),
        },
        None,
    )
}

/// Emit a batch report unless the batch failed.
///
/// A failed batch returns its error untouched so `main` prints the error
/// envelope; stdout never carries more than one JSON document.
pub fn emit_outcome<T: Serialize>(data: T, completed: usize, failed: usize, outcome: Result<()>) -> Result<()> {
    outcome?;
    emit_robot(&robot_counts(data, completed, failed))
}

pub fn emit_robot<T: Serialize>(response: &RobotResponse<T>) -> Result<()> {
    let payload = serde_json::to_string_pretty(response)
        .map_err(|err| AimgrError::Failed(format!("serialize output: {err}")))?;
    println!("{payload}");
    Ok(())
}

pub struct HumanLayout {
    lines: Vec<String>,
    key_width: usize,
}

impl Default for HumanLayout {
    fn default() -> Self {
        Self::new()
    }
}

impl HumanLayout {
    #[must_use]
    pub fn new() -> Self {
        Self {
            lines: Vec::new(),
            key_width: 14,
        }
    }

    pub fn title(&mut self, text: &str) -> &mut Self {
        self.lines.push(style(text).bold().to_string());
        self.lines.push(String::new());
        self
    }

    pub fn section(&mut self, text: &str) -> &mut Self {
        self.lines.push(style(text).bold().to_string());
        self.lines.push("-".repeat(text.len().max(3)));
        self
    }

    pub fn kv(&mut self, key: &str, value: &str) -> &mut Self {
        let padded = format!("{key:width$}", width = self.key_width);
        self.lines.push(format!("{} {value}", style(padded).dim()));
        self
    }

    pub fn bullet(&mut self, text: &str) -> &mut Self {
        self.lines.push(format!("- {text}"));
        self
    }

    pub fn blank(&mut self) -> &mut Self {
        self.lines.push(String::new());
        self
    }

    pub fn push_line(&mut self, line: impl Into<String>) -> &mut Self {
        self.lines.push(line.into());
        self
    }

    #[must_use]
    pub fn build(self) -> String {
        self.lines.join("\n")
    }
}

pub fn emit_human(layout: HumanLayout) {
    println!("{}", layout.build());
}
