//! Roster integrity checks run before building.
//!
//! The builder tolerates malformed relations by degrading its output; this
//! module names the problems so callers can reject input up front.

use std::collections::{HashMap, HashSet};
use std::fmt;

use tracing::instrument;

use crate::domain::error::DomainError;
use crate::domain::member::{Member, MemberId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Issue {
    DuplicateId(MemberId),
    SelfSpouse(MemberId),
    SelfParent(MemberId),
    DanglingParent { member: MemberId, parent: MemberId },
    DanglingSpouse { member: MemberId, spouse: MemberId },
    /// `member` names `spouse`, but `spouse` does not name `member` back
    AsymmetricSpouse { member: MemberId, spouse: MemberId },
    /// Ids along the cycle, starting at the first one reached
    ParentCycle(Vec<MemberId>),
}

impl Issue {
    /// Issues the builder cannot represent faithfully.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Issue::DuplicateId(_) | Issue::SelfSpouse(_) | Issue::ParentCycle(_)
        )
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Issue::DuplicateId(id) => write!(f, "duplicate id {id}"),
            Issue::SelfSpouse(id) => write!(f, "{id} is recorded as their own spouse"),
            Issue::SelfParent(id) => write!(f, "{id} is recorded as their own parent"),
            Issue::DanglingParent { member, parent } => {
                write!(f, "{member} references missing parent {parent}")
            }
            Issue::DanglingSpouse { member, spouse } => {
                write!(f, "{member} references missing spouse {spouse}")
            }
            Issue::AsymmetricSpouse { member, spouse } => {
                write!(f, "{member} names {spouse} as spouse, but not vice versa")
            }
            Issue::ParentCycle(path) => {
                let ids: Vec<&str> = path.iter().map(MemberId::as_str).collect();
                write!(f, "parent cycle: {}", ids.join(" -> "))
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    issues: Vec<Issue>,
}

impl ValidationReport {
    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn fatal(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|i| i.is_fatal())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|i| !i.is_fatal())
    }

    /// Fail on issues the builder would silently paper over.
    pub fn ensure_buildable(&self) -> Result<(), DomainError> {
        let fatal: Vec<Issue> = self.fatal().cloned().collect();
        if fatal.is_empty() {
            Ok(())
        } else {
            Err(DomainError::InvalidRoster(fatal))
        }
    }
}

#[instrument(level = "debug", skip(members), fields(members = members.len()))]
pub fn validate(members: &[Member]) -> ValidationReport {
    let mut issues = Vec::new();
    let mut by_id: HashMap<&str, &Member> = HashMap::with_capacity(members.len());

    for member in members {
        if by_id.insert(member.id.as_str(), member).is_some() {
            issues.push(Issue::DuplicateId(member.id.clone()));
        }
    }

    for member in members {
        if let Some(parent) = &member.parent_id {
            if parent == &member.id {
                issues.push(Issue::SelfParent(member.id.clone()));
            } else if !by_id.contains_key(parent.as_str()) {
                issues.push(Issue::DanglingParent {
                    member: member.id.clone(),
                    parent: parent.clone(),
                });
            }
        }

        if let Some(spouse_id) = &member.spouse_id {
            if spouse_id == &member.id {
                issues.push(Issue::SelfSpouse(member.id.clone()));
            } else {
                match by_id.get(spouse_id.as_str()) {
                    None => issues.push(Issue::DanglingSpouse {
                        member: member.id.clone(),
                        spouse: spouse_id.clone(),
                    }),
                    Some(spouse) if spouse.spouse_id.as_ref() != Some(&member.id) => {
                        issues.push(Issue::AsymmetricSpouse {
                            member: member.id.clone(),
                            spouse: spouse_id.clone(),
                        })
                    }
                    Some(_) => {}
                }
            }
        }
    }

    issues.extend(parent_cycles(members, &by_id).into_iter().map(Issue::ParentCycle));
    ValidationReport { issues }
}

/// Walk each parent chain once, reporting every cycle a single time.
fn parent_cycles(members: &[Member], by_id: &HashMap<&str, &Member>) -> Vec<Vec<MemberId>> {
    let mut done: HashSet<&str> = HashSet::new();
    let mut cycles = Vec::new();

    for member in members {
        let mut path: Vec<&str> = Vec::new();
        let mut on_path: HashMap<&str, usize> = HashMap::new();
        let mut current = Some(member.id.as_str());

        while let Some(id) = current {
            if done.contains(id) {
                break;
            }
            if let Some(&start) = on_path.get(id) {
                cycles.push(path[start..].iter().map(|&s| MemberId::new(s)).collect());
                break;
            }
            on_path.insert(id, path.len());
            path.push(id);
            current = by_id
                .get(id)
                .and_then(|m| m.parent_id.as_ref())
                .map(MemberId::as_str)
                .filter(|p| *p != id && by_id.contains_key(p));
        }
        done.extend(path);
    }
    cycles
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_consistent_roster_when_validating_then_clean() {
        let members = vec![
            Member::new("a", "A", "X").with_spouse("b"),
            Member::new("b", "B", "X").with_spouse("a"),
            Member::new("c", "C", "X").with_parent("a"),
        ];
        let report = validate(&members);
        assert!(report.is_clean(), "{:?}", report.issues());
        assert!(report.ensure_buildable().is_ok());
    }

    #[test]
    fn given_parent_cycle_when_validating_then_reports_cycle_once() {
        let members = vec![
            Member::new("a", "A", "X").with_parent("c"),
            Member::new("b", "B", "X").with_parent("a"),
            Member::new("c", "C", "X").with_parent("b"),
            Member::new("d", "D", "X").with_parent("b"),
        ];
        let report = validate(&members);
        let cycles: Vec<_> = report
            .issues()
            .iter()
            .filter(|i| matches!(i, Issue::ParentCycle(_)))
            .collect();
        assert_eq!(cycles.len(), 1);
        assert_eq!(
            cycles[0],
            &Issue::ParentCycle(vec!["a".into(), "c".into(), "b".into()])
        );
        assert!(report.ensure_buildable().is_err());
    }

    #[test]
    fn given_one_sided_spouse_when_validating_then_warns_only() {
        let members = vec![
            Member::new("a", "A", "X").with_spouse("b"),
            Member::new("b", "B", "X"),
        ];
        let report = validate(&members);
        assert_eq!(
            report.issues(),
            &[Issue::AsymmetricSpouse {
                member: "a".into(),
                spouse: "b".into()
            }]
        );
        assert_eq!(report.warnings().count(), 1);
        assert!(report.ensure_buildable().is_ok());
    }
}
