use std::collections::{HashMap, HashSet};
use std::fmt;

use generational_arena::{Arena, Index};
use tracing::instrument;

use crate::domain::member::{Member, MemberId};

/// Flattened spouse attached to a couple node.
///
/// Carries no children or spouse of its own; `partner` points back at the
/// couple node that owns it.
#[derive(Debug, Clone)]
pub struct SpouseRef {
    pub member: Member,
    pub partner: Index,
}

/// One couple in the arena-based family forest.
#[derive(Debug)]
pub struct FamilyNode {
    /// The member this node was built for
    pub member: Member,
    /// Partner rendered side by side with `member`
    pub spouse: Option<SpouseRef>,
    /// Index of the enclosing couple, None for roots
    pub parent: Option<Index>,
    /// Child couples, ordered by `child_order`
    pub children: Vec<Index>,
}

impl FamilyNode {
    pub fn id(&self) -> &MemberId {
        &self.member.id
    }

    pub fn spouse_member(&self) -> Option<&Member> {
        self.spouse.as_ref().map(|s| &s.member)
    }

    /// True when `id` is either side of the couple.
    pub fn contains(&self, id: &str) -> bool {
        self.member.id.as_str() == id
            || self
                .spouse
                .as_ref()
                .is_some_and(|s| s.member.id.as_str() == id)
    }
}

impl fmt::Display for FamilyNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.spouse_member() {
            Some(spouse) => write!(f, "{} & {}", self.member, spouse),
            None => write!(f, "{}", self.member),
        }
    }
}

/// Forest of couple nodes produced by one build.
///
/// Nodes live in a generational arena and reference each other by `Index`,
/// which keeps the spouse back-link and the parent link free of ownership
/// cycles.
#[derive(Debug)]
pub struct FamilyForest {
    arena: Arena<FamilyNode>,
    roots: Vec<Index>,
    /// Both sides of every couple, mapped to the couple node
    couples: HashMap<MemberId, Index>,
    unplaced: Vec<MemberId>,
}

impl Default for FamilyForest {
    fn default() -> Self {
        Self::new()
    }
}

impl FamilyForest {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            roots: Vec::new(),
            couples: HashMap::new(),
            unplaced: Vec::new(),
        }
    }

    /// Insert a finished couple whose children are already in the arena.
    ///
    /// The node goes in first, then the spouse back-link and the children's
    /// parent links are patched with the new index.
    #[instrument(level = "trace", skip(self, member, spouse), fields(id = %member.id))]
    pub fn insert_couple(
        &mut self,
        member: Member,
        spouse: Option<Member>,
        children: Vec<Index>,
    ) -> Index {
        let member_id = member.id.clone();
        let spouse_id = spouse.as_ref().map(|s| s.id.clone());

        let node_idx = self.arena.insert(FamilyNode {
            member,
            spouse: None,
            parent: None,
            children,
        });

        if let Some(node) = self.arena.get_mut(node_idx) {
            node.spouse = spouse.map(|member| SpouseRef {
                member,
                partner: node_idx,
            });
        }

        let children = self
            .arena
            .get(node_idx)
            .map(|n| n.children.clone())
            .unwrap_or_default();
        for child_idx in children {
            if let Some(child) = self.arena.get_mut(child_idx) {
                child.parent = Some(node_idx);
            }
        }

        self.couples.insert(member_id, node_idx);
        if let Some(spouse_id) = spouse_id {
            self.couples.insert(spouse_id, node_idx);
        }
        node_idx
    }

    /// Remove a subtree that did not make it into the final forest.
    #[instrument(level = "trace", skip(self))]
    pub fn prune(&mut self, idx: Index) {
        let mut stack = vec![idx];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.arena.remove(current) {
                if self.couples.get(&node.member.id) == Some(&current) {
                    self.couples.remove(&node.member.id);
                }
                if let Some(spouse) = &node.spouse {
                    if self.couples.get(&spouse.member.id) == Some(&current) {
                        self.couples.remove(&spouse.member.id);
                    }
                }
                stack.extend(node.children);
            }
        }
        self.roots.retain(|&r| r != idx);
    }

    pub(crate) fn set_roots(&mut self, roots: Vec<Index>) {
        self.roots = roots;
    }

    pub(crate) fn set_unplaced(&mut self, unplaced: Vec<MemberId>) {
        self.unplaced = unplaced;
    }

    pub fn roots(&self) -> &[Index] {
        &self.roots
    }

    pub fn get_node(&self, idx: Index) -> Option<&FamilyNode> {
        self.arena.get(idx)
    }

    /// Number of couple nodes.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Members that could not be placed anywhere in the forest.
    pub fn unplaced(&self) -> &[MemberId] {
        &self.unplaced
    }

    /// Pre-order, left-to-right traversal over all roots.
    #[instrument(level = "trace", skip(self))]
    pub fn iter(&self) -> ForestIterator<'_> {
        ForestIterator::new(self, &self.roots)
    }

    /// Depth-first search for the couple containing `id`.
    ///
    /// Matching the spouse returns the couple's node, so focusing on either
    /// partner shows the same family.
    #[instrument(level = "debug", skip(self))]
    pub fn find_node(&self, id: &str) -> Option<Index> {
        self.iter()
            .find(|(_, node)| node.contains(id))
            .map(|(idx, _)| idx)
    }

    /// Constant-time lookup of the couple containing `id`.
    pub fn couple_of(&self, id: &str) -> Option<Index> {
        self.couples.get(id).copied()
    }

    /// The spouse projection of a couple, if any.
    pub fn spouse_of(&self, idx: Index) -> Option<&SpouseRef> {
        self.get_node(idx).and_then(|n| n.spouse.as_ref())
    }

    /// Every id placed in the forest, primaries and spouses.
    pub fn member_ids(&self) -> Vec<&MemberId> {
        self.iter()
            .flat_map(|(_, node)| {
                std::iter::once(node.id()).chain(node.spouse_member().map(|s| &s.id))
            })
            .collect()
    }

    /// Ids attached as spouses anywhere below the given roots.
    pub fn spouse_ids(&self, roots: &[Index]) -> HashSet<MemberId> {
        ForestIterator::new(self, roots)
            .filter_map(|(_, node)| node.spouse_member().map(|s| s.id.clone()))
            .collect()
    }

    /// Heading for a focused family view.
    pub fn family_title(&self, idx: Index) -> Option<String> {
        let node = self.get_node(idx)?;
        Some(match node.spouse_member() {
            Some(spouse) => format!(
                "{} & {}'s Family",
                node.member.first_name, spouse.first_name
            ),
            None => format!("{}'s Family", node.member.first_name),
        })
    }

    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        self.roots
            .iter()
            .map(|&root| self.calculate_depth(root))
            .max()
            .unwrap_or(0)
    }

    fn calculate_depth(&self, node_idx: Index) -> usize {
        if let Some(node) = self.get_node(node_idx) {
            1 + node
                .children
                .iter()
                .map(|&child| self.calculate_depth(child))
                .max()
                .unwrap_or(0)
        } else {
            0
        }
    }
}

pub struct ForestIterator<'a> {
    forest: &'a FamilyForest,
    stack: Vec<Index>,
}

impl<'a> ForestIterator<'a> {
    fn new(forest: &'a FamilyForest, roots: &[Index]) -> Self {
        // Reversed so the first root is visited first
        let stack = roots.iter().rev().copied().collect();
        Self { forest, stack }
    }
}

impl<'a> Iterator for ForestIterator<'a> {
    type Item = (Index, &'a FamilyNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.forest.get_node(current_idx) {
                for &child in node.children.iter().rev() {
                    self.stack.push(child);
                }
                return Some((current_idx, node));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forest_with_couple() -> (FamilyForest, Index, Index) {
        let mut forest = FamilyForest::new();
        let child = forest.insert_couple(Member::new("c", "Cleo", "Doe"), None, vec![]);
        let root = forest.insert_couple(
            Member::new("a", "Adam", "Doe"),
            Some(Member::new("b", "Beth", "Doe")),
            vec![child],
        );
        forest.set_roots(vec![root]);
        (forest, root, child)
    }

    #[test]
    fn given_couple_when_inserted_then_spouse_links_back() {
        let (forest, root, child) = forest_with_couple();

        let spouse = forest.spouse_of(root).unwrap();
        assert_eq!(spouse.partner, root);
        assert_eq!(forest.get_node(spouse.partner).unwrap().id().as_str(), "a");
        assert_eq!(forest.get_node(child).unwrap().parent, Some(root));
        assert_eq!(forest.couple_of("b"), Some(root));
    }

    #[test]
    fn given_spouse_id_when_finding_then_returns_couple() {
        let (forest, root, child) = forest_with_couple();

        assert_eq!(forest.find_node("a"), Some(root));
        assert_eq!(forest.find_node("b"), Some(root));
        assert_eq!(forest.find_node("c"), Some(child));
        assert_eq!(forest.find_node("nobody"), None);
    }

    #[test]
    fn given_forest_when_pruning_root_then_subtree_is_gone() {
        let (mut forest, root, _) = forest_with_couple();

        forest.prune(root);

        assert!(forest.is_empty());
        assert!(forest.roots().is_empty());
        assert_eq!(forest.couple_of("c"), None);
    }

    #[test]
    fn given_forest_when_titling_then_names_both_partners() {
        let (forest, root, child) = forest_with_couple();

        assert_eq!(forest.family_title(root).unwrap(), "Adam & Beth's Family");
        assert_eq!(forest.family_title(child).unwrap(), "Cleo's Family");
        assert_eq!(forest.depth(), 2);
        assert_eq!(forest.member_ids().len(), 3);
    }
}
