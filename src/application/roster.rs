//! Roster file codec
//!
//! JSON rosters are a bare array of member records (the shape a members
//! listing endpoint returns). TOML rosters hold a `[[members]]` array.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::Member;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosterFormat {
    Json,
    Toml,
}

impl RosterFormat {
    /// `.toml` selects TOML, anything else is JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => RosterFormat::Toml,
            _ => RosterFormat::Json,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct TomlRoster {
    #[serde(default)]
    members: Vec<Member>,
}

pub fn parse_roster(content: &str, path: &Path) -> ApplicationResult<Vec<Member>> {
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    let format_err = |message: String| ApplicationError::RosterFormat {
        path: path.to_path_buf(),
        message,
    };
    match RosterFormat::from_path(path) {
        RosterFormat::Json => serde_json::from_str(content).map_err(|e| format_err(e.to_string())),
        RosterFormat::Toml => toml::from_str::<TomlRoster>(content)
            .map(|r| r.members)
            .map_err(|e| format_err(e.to_string())),
    }
}

pub fn render_roster(members: &[Member], path: &Path) -> ApplicationResult<String> {
    let format_err = |message: String| ApplicationError::RosterFormat {
        path: path.to_path_buf(),
        message,
    };
    match RosterFormat::from_path(path) {
        RosterFormat::Json => serde_json::to_string_pretty(members)
            .map(|mut s| {
                s.push('\n');
                s
            })
            .map_err(|e| format_err(e.to_string())),
        RosterFormat::Toml => toml::to_string_pretty(&TomlRoster {
            members: members.to_vec(),
        })
        .map_err(|e| format_err(e.to_string())),
    }
}
