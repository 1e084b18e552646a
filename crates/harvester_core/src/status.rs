use std::fmt;

use serde::{Deserialize, Serialize};

/// Approval status inferred from a listing row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    Current,
    Historical,
    Revoked,
    Unknown,
}

impl Status {
    pub fn label(self) -> &'static str {
        match self {
            Status::Current => "current",
            Status::Historical => "historical",
            Status::Revoked => "revoked",
            Status::Unknown => "unknown",
        }
    }

    /// Only rows in force are worth opening.
    pub fn is_qualifying(self) -> bool {
        self == Status::Current
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Marker substrings used to classify a row's status text.
///
/// Matching is case-insensitive and precedence is fixed: current, then
/// historical, then revoked. Anything else is `Unknown`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusMarkers {
    pub current: Vec<String>,
    pub historical: Vec<String>,
    pub revoked: Vec<String>,
}

impl Default for StatusMarkers {
    fn default() -> Self {
        Self {
            current: strings(&["当前批件", "in force", "current"]),
            historical: strings(&["历史批件", "已过期", "过期", "historical", "expired"]),
            revoked: strings(&["已注销", "注销", "撤销", "revoked", "cancelled", "canceled"]),
        }
    }
}

impl StatusMarkers {
    pub fn classify(&self, text: &str) -> Status {
        let haystack = text.to_lowercase();
        let hit = |markers: &[String]| {
            markers
                .iter()
                .filter(|m| !m.trim().is_empty())
                .any(|m| haystack.contains(&m.to_lowercase()))
        };

        if hit(&self.current) {
            Status::Current
        } else if hit(&self.historical) {
            Status::Historical
        } else if hit(&self.revoked) {
            Status::Revoked
        } else {
            Status::Unknown
        }
    }
}

pub(crate) fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
