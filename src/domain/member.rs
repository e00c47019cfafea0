//! Genealogy records as stored in the roster.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier of a member record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberId(String);

impl MemberId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh random id for a newly created record.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for MemberId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for MemberId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for MemberId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// One person in the genealogy.
///
/// Only `id`, `parent_id`, `spouse_id` and `child_order` carry structure.
/// Everything else is payload that the tree builder copies through untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Member {
    pub id: MemberId,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub maiden_middle_name: Option<String>,
    pub nick_name: Option<String>,
    /// ISO date (`YYYY-MM-DD`), kept as written
    pub birthdate: Option<String>,
    pub deathdate: Option<String>,
    pub photo_url: Option<String>,
    /// At most one recorded parent
    pub parent_id: Option<MemberId>,
    /// Not guaranteed to be mirrored on the spouse's record
    pub spouse_id: Option<MemberId>,
    pub child_order: Option<i64>,
    pub gender: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl Member {
    pub fn new(id: impl Into<MemberId>, first_name: &str, last_name: &str) -> Self {
        Self {
            id: id.into(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            ..Self::default()
        }
    }

    pub fn with_parent(mut self, parent: impl Into<MemberId>) -> Self {
        self.parent_id = Some(parent.into());
        self
    }

    pub fn with_spouse(mut self, spouse: impl Into<MemberId>) -> Self {
        self.spouse_id = Some(spouse.into());
        self
    }

    pub fn with_order(mut self, order: i64) -> Self {
        self.child_order = Some(order);
        self
    }

    /// Sibling sort key; unset order sorts as 0.
    pub fn sort_key(&self) -> i64 {
        self.child_order.unwrap_or(0)
    }

    /// Nickname if present, otherwise the first name.
    pub fn display_name(&self) -> &str {
        self.nick_name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.first_name)
    }

    /// `First Middle Last`, skipping an empty middle name.
    pub fn full_name(&self) -> String {
        match self.middle_name.as_deref().filter(|m| !m.is_empty()) {
            Some(middle) => format!("{} {} {}", self.first_name, middle, self.last_name),
            None => format!("{} {}", self.first_name, self.last_name),
        }
    }
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.display_name(), self.last_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_missing_child_order_when_sorting_then_key_is_zero() {
        let member = Member::new("a", "Ada", "Lovelace");
        assert_eq!(member.sort_key(), 0);
        assert_eq!(member.with_order(3).sort_key(), 3);
    }

    #[test]
    fn given_nick_name_when_displaying_then_nick_wins() {
        let mut member = Member::new("a", "Robert", "Smith");
        assert_eq!(member.display_name(), "Robert");
        member.nick_name = Some("Bob".into());
        assert_eq!(member.display_name(), "Bob");
        assert_eq!(member.to_string(), "Bob Smith");
    }

    #[test]
    fn given_middle_name_when_full_name_then_includes_it() {
        let mut member = Member::new("a", "John", "Doe");
        assert_eq!(member.full_name(), "John Doe");
        member.middle_name = Some("Quincy".into());
        assert_eq!(member.full_name(), "John Quincy Doe");
    }

    #[test]
    fn given_json_with_nulls_when_deserializing_then_fields_are_none() {
        let json = r#"{"id":"x","first_name":"A","last_name":"B","parent_id":null,"spouse_id":"y","child_order":null}"#;
        let member: Member = serde_json::from_str(json).unwrap();
        assert_eq!(member.id, MemberId::new("x"));
        assert_eq!(member.parent_id, None);
        assert_eq!(member.spouse_id, Some(MemberId::new("y")));
        assert_eq!(member.child_order, None);
    }
}
