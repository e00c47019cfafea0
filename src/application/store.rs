//! In-memory member store with spouse cascade rules
//!
//! Keeps the roster in insertion order and maintains the reciprocal
//! `spouse_id` links on create, update and delete.

use chrono::Utc;
use tracing::{debug, instrument};

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{Member, MemberId};

/// Editable fields of a member, as entered by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberDraft {
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub maiden_middle_name: Option<String>,
    pub nick_name: Option<String>,
    pub birthdate: Option<String>,
    pub deathdate: Option<String>,
    pub photo_url: Option<String>,
    pub parent_id: Option<MemberId>,
    pub spouse_id: Option<MemberId>,
    pub child_order: Option<i64>,
    pub gender: Option<String>,
}

impl MemberDraft {
    pub fn new(first_name: &str, last_name: &str) -> Self {
        Self {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            ..Self::default()
        }
    }

    /// Draft pre-filled from an existing record, for partial edits.
    pub fn from_member(member: &Member) -> Self {
        Self {
            first_name: member.first_name.clone(),
            middle_name: member.middle_name.clone(),
            last_name: member.last_name.clone(),
            maiden_middle_name: member.maiden_middle_name.clone(),
            nick_name: member.nick_name.clone(),
            birthdate: member.birthdate.clone(),
            deathdate: member.deathdate.clone(),
            photo_url: member.photo_url.clone(),
            parent_id: member.parent_id.clone(),
            spouse_id: member.spouse_id.clone(),
            child_order: member.child_order,
            gender: member.gender.clone(),
        }
    }

    fn apply_to(self, member: &mut Member) {
        member.first_name = self.first_name;
        member.middle_name = self.middle_name;
        member.last_name = self.last_name;
        member.maiden_middle_name = self.maiden_middle_name;
        member.nick_name = self.nick_name;
        member.birthdate = self.birthdate;
        member.deathdate = self.deathdate;
        member.photo_url = self.photo_url;
        member.parent_id = self.parent_id;
        member.spouse_id = self.spouse_id;
        member.child_order = Some(self.child_order.unwrap_or(0));
        member.gender = self.gender;
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemberStore {
    members: Vec<Member>,
}

impl MemberStore {
    pub fn new(members: Vec<Member>) -> Self {
        Self { members }
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn into_members(self) -> Vec<Member> {
        self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn get(&self, id: &MemberId) -> Option<&Member> {
        self.members.iter().find(|m| &m.id == id)
    }

    fn position(&self, id: &MemberId) -> ApplicationResult<usize> {
        self.members
            .iter()
            .position(|m| &m.id == id)
            .ok_or_else(|| ApplicationError::MemberNotFound(id.clone()))
    }

    /// Create a member; returns the generated id.
    #[instrument(level = "debug", skip(self, draft))]
    pub fn add(&mut self, draft: MemberDraft) -> ApplicationResult<MemberId> {
        self.check_references(None, &draft)?;

        let now = Utc::now().to_rfc3339();
        let mut member = Member {
            id: MemberId::generate(),
            created_at: Some(now.clone()),
            updated_at: Some(now),
            ..Member::default()
        };
        let spouse = draft.spouse_id.clone();
        draft.apply_to(&mut member);
        let id = member.id.clone();
        self.members.push(member);

        if let Some(spouse) = spouse {
            self.pair(&id, &spouse);
        }
        debug!("added member {}", id);
        Ok(id)
    }

    /// Replace the editable fields of a member.
    ///
    /// When the spouse changes, the old spouse's back-reference is cleared,
    /// the new spouse's previous partner is released, and the new spouse is
    /// pointed back at this member.
    #[instrument(level = "debug", skip(self, draft))]
    pub fn update(&mut self, id: &MemberId, draft: MemberDraft) -> ApplicationResult<()> {
        let pos = self.position(id)?;
        self.check_references(Some(id), &draft)?;

        let old_spouse = self.members[pos].spouse_id.clone();
        let new_spouse = draft.spouse_id.clone();

        let member = &mut self.members[pos];
        draft.apply_to(member);
        member.updated_at = Some(Utc::now().to_rfc3339());

        if let Some(old) = old_spouse.as_ref().filter(|old| Some(*old) != new_spouse.as_ref()) {
            self.release(old, id);
        }
        if let Some(new) = new_spouse.filter(|new| Some(new) != old_spouse.as_ref()) {
            self.pair(id, &new);
        }
        Ok(())
    }

    /// Remove a member and every reference to it.
    ///
    /// Spouse links naming the member are cleared and its children lose their
    /// parent, which makes them roots.
    #[instrument(level = "debug", skip(self))]
    pub fn delete(&mut self, id: &MemberId) -> ApplicationResult<Member> {
        let pos = self.position(id)?;
        let removed = self.members.remove(pos);

        for member in &mut self.members {
            if member.spouse_id.as_ref() == Some(id) {
                member.spouse_id = None;
            }
            if member.parent_id.as_ref() == Some(id) {
                debug!("{} loses parent {}", member.id, id);
                member.parent_id = None;
            }
        }
        Ok(removed)
    }

    /// Point `spouse` at `id`, releasing whoever `spouse` was paired with.
    fn pair(&mut self, id: &MemberId, spouse: &MemberId) {
        let previous = self.get(spouse).and_then(|s| s.spouse_id.clone());
        if let Some(previous) = previous.filter(|p| p != id) {
            self.release(&previous, spouse);
        }
        if let Some(member) = self.members.iter_mut().find(|m| &m.id == spouse) {
            member.spouse_id = Some(id.clone());
        }
    }

    /// Clear `id`'s spouse link if it still names `former`.
    fn release(&mut self, id: &MemberId, former: &MemberId) {
        if let Some(member) = self.members.iter_mut().find(|m| &m.id == id) {
            if member.spouse_id.as_ref() == Some(former) {
                debug!("releasing {} from {}", id, former);
                member.spouse_id = None;
            }
        }
    }

    fn check_references(&self, own: Option<&MemberId>, draft: &MemberDraft) -> ApplicationResult<()> {
        for (role, reference) in [("parent", &draft.parent_id), ("spouse", &draft.spouse_id)] {
            let Some(reference) = reference else { continue };
            if Some(reference) == own {
                return Err(ApplicationError::SelfReference(reference.clone(), role));
            }
            if self.get(reference).is_none() {
                return Err(ApplicationError::UnknownReference {
                    role,
                    id: reference.clone(),
                });
            }
        }

        // Re-parenting under one's own descendant would close a cycle
        if let (Some(own), Some(parent)) = (own, &draft.parent_id) {
            let mut current = Some(parent);
            let mut steps = 0;
            while let Some(ancestor) = current {
                if ancestor == own {
                    return Err(ApplicationError::ParentCycle {
                        member: own.clone(),
                        parent: parent.clone(),
                    });
                }
                steps += 1;
                if steps > self.members.len() {
                    break;
                }
                current = self.get(ancestor).and_then(|m| m.parent_id.as_ref());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(members: Vec<Member>) -> MemberStore {
        MemberStore::new(members)
    }

    #[test]
    fn given_new_member_with_spouse_when_adding_then_spouse_points_back() {
        let mut store = store_with(vec![Member::new("a", "Ann", "Doe")]);
        let mut draft = MemberDraft::new("Bob", "Doe");
        draft.spouse_id = Some("a".into());

        let id = store.add(draft).unwrap();

        assert_eq!(store.get(&"a".into()).unwrap().spouse_id, Some(id.clone()));
        let added = store.get(&id).unwrap();
        assert_eq!(added.child_order, Some(0));
        assert!(added.created_at.is_some());
    }

    #[test]
    fn given_unknown_parent_when_adding_then_errors() {
        let mut store = MemberStore::default();
        let mut draft = MemberDraft::new("Bob", "Doe");
        draft.parent_id = Some("ghost".into());

        let result = store.add(draft);

        assert!(matches!(
            result,
            Err(ApplicationError::UnknownReference { role: "parent", .. })
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn given_repairing_when_updating_then_old_links_are_cleared() {
        let mut store = store_with(vec![
            Member::new("a", "Ann", "Doe").with_spouse("b"),
            Member::new("b", "Bob", "Doe").with_spouse("a"),
            Member::new("c", "Cid", "Roe").with_spouse("d"),
            Member::new("d", "Dee", "Roe").with_spouse("c"),
        ]);
        let mut draft = MemberDraft::from_member(store.get(&"a".into()).unwrap());
        draft.spouse_id = Some("c".into());

        store.update(&"a".into(), draft).unwrap();

        assert_eq!(store.get(&"a".into()).unwrap().spouse_id, Some("c".into()));
        assert_eq!(store.get(&"c".into()).unwrap().spouse_id, Some("a".into()));
        assert_eq!(store.get(&"b".into()).unwrap().spouse_id, None);
        assert_eq!(store.get(&"d".into()).unwrap().spouse_id, None);
    }

    #[test]
    fn given_descendant_as_parent_when_updating_then_rejects_cycle() {
        let mut store = store_with(vec![
            Member::new("a", "Ann", "Doe"),
            Member::new("b", "Bob", "Doe").with_parent("a"),
        ]);
        let mut draft = MemberDraft::from_member(store.get(&"a".into()).unwrap());
        draft.parent_id = Some("b".into());

        let result = store.update(&"a".into(), draft);

        assert!(matches!(result, Err(ApplicationError::ParentCycle { .. })));
    }

    #[test]
    fn given_self_spouse_when_updating_then_rejects() {
        let mut store = store_with(vec![Member::new("a", "Ann", "Doe")]);
        let mut draft = MemberDraft::new("Ann", "Doe");
        draft.spouse_id = Some("a".into());

        let result = store.update(&"a".into(), draft);

        assert!(matches!(result, Err(ApplicationError::SelfReference(_, "spouse"))));
    }

    #[test]
    fn given_member_with_links_when_deleting_then_references_are_cleared() {
        let mut store = store_with(vec![
            Member::new("a", "Ann", "Doe").with_spouse("b"),
            Member::new("b", "Bob", "Doe").with_spouse("a"),
            Member::new("c", "Cid", "Doe").with_parent("a"),
        ]);

        let removed = store.delete(&"a".into()).unwrap();

        assert_eq!(removed.id, MemberId::new("a"));
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(&"b".into()).unwrap().spouse_id, None);
        assert_eq!(store.get(&"c".into()).unwrap().parent_id, None);
    }

    #[test]
    fn given_missing_member_when_deleting_then_not_found() {
        let mut store = MemberStore::default();
        assert!(matches!(
            store.delete(&"x".into()),
            Err(ApplicationError::MemberNotFound(_))
        ));
    }
}
