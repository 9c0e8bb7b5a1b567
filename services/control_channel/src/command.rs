//! Command wire schema and static priority table (spec §4.8, §6 "Control
//! channel wire").

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommandType {
    Pause,
    Resume,
    ReloadSettings,
    SwitchMode,
    AddSymbol,
    RemoveSymbol,
    ForceBackfill,
    ClearCache,
}

impl CommandType {
    /// Static priority, lower processed first (spec §4.8 table).
    pub fn priority(self) -> i32 {
        match self {
            CommandType::Pause | CommandType::Resume => 1,
            CommandType::ReloadSettings | CommandType::SwitchMode => 10,
            CommandType::AddSymbol | CommandType::RemoveSymbol => 15,
            CommandType::ForceBackfill | CommandType::ClearCache => 20,
        }
    }
}

/// Inbound command envelope (spec §6).
#[derive(Debug, Clone, Deserialize)]
pub struct Command {
    #[serde(rename = "correlationId")]
    pub correlation_id: String,
    #[serde(rename = "type")]
    pub command_type: CommandType,
    #[serde(default)]
    pub payload: serde_json::Value,
    pub timestamp: i64,
    pub priority: Option<i32>,
}

impl Command {
    pub fn effective_priority(&self) -> i32 {
        self.priority.unwrap_or_else(|| self.command_type.priority())
    }

    /// `correlationId` must be non-empty (spec §4.8 "schema-validated").
    pub fn is_well_formed(&self) -> bool {
        !self.correlation_id.trim().is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Ack,
    Success,
    Error,
}

/// Outbound response envelope (spec §6).
#[derive(Debug, Clone, Serialize)]
pub struct Response {
    #[serde(rename = "correlationId")]
    pub correlation_id: String,
    pub status: ResponseStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub timestamp: i64,
}

impl Response {
    pub fn ack(correlation_id: &str, now_ms: i64) -> Self {
        Self {
            correlation_id: correlation_id.to_string(),
            status: ResponseStatus::Ack,
            data: None,
            message: None,
            timestamp: now_ms,
        }
    }

    pub fn success(correlation_id: &str, data: Option<serde_json::Value>, now_ms: i64) -> Self {
        Self {
            correlation_id: correlation_id.to_string(),
            status: ResponseStatus::Success,
            data,
            message: None,
            timestamp: now_ms,
        }
    }

    pub fn error(correlation_id: &str, message: impl Into<String>, now_ms: i64) -> Self {
        Self {
            correlation_id: correlation_id.to_string(),
            status: ResponseStatus::Error,
            data: None,
            message: Some(message.into()),
            timestamp: now_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priorities_match_spec_table() {
        assert_eq!(CommandType::Pause.priority(), 1);
        assert_eq!(CommandType::Resume.priority(), 1);
        assert_eq!(CommandType::ReloadSettings.priority(), 10);
        assert_eq!(CommandType::SwitchMode.priority(), 10);
        assert_eq!(CommandType::AddSymbol.priority(), 15);
        assert_eq!(CommandType::RemoveSymbol.priority(), 15);
        assert_eq!(CommandType::ForceBackfill.priority(), 20);
        assert_eq!(CommandType::ClearCache.priority(), 20);
    }

    #[test]
    fn rejects_blank_correlation_id() {
        let cmd = Command {
            correlation_id: "   ".to_string(),
            command_type: CommandType::Pause,
            payload: serde_json::Value::Null,
            timestamp: 0,
            priority: None,
        };
        assert!(!cmd.is_well_formed());
    }
}
