//! Family tree builder: turns a flat member roster into a forest of couples.

use std::collections::{HashMap, HashSet};

use generational_arena::Index;
use itertools::Itertools;
use tracing::{debug, instrument, trace, warn};

use crate::domain::forest::FamilyForest;
use crate::domain::member::{Member, MemberId};

/// Ids already placed in the forest during one build.
///
/// A member is placed when its couple node starts building or when it is
/// attached as someone's spouse. Nothing placed is built again, which also
/// stops recursion on cyclic parent chains.
pub type Placed = HashSet<MemberId>;

/// Builds a [`FamilyForest`] from an immutable member snapshot.
///
/// Lookup tables are computed once in [`FamilyTreeBuilder::new`]; all per-build
/// state lives in the forest and the [`Placed`] set passed through each call.
pub struct FamilyTreeBuilder<'a> {
    members: &'a [Member],
    /// First record for each id
    by_id: HashMap<&'a str, usize>,
    /// Sibling groups keyed by resolved parent, sorted by `child_order`
    children_of: HashMap<&'a str, Vec<usize>>,
    /// Members without a resolvable parent, sorted like a sibling group
    parentless: Vec<usize>,
    /// Members naming the key as their spouse, in roster order
    claimed_by: HashMap<&'a str, Vec<usize>>,
    /// Whether each record's `parent_id` resolves
    has_parent: Vec<bool>,
}

impl<'a> FamilyTreeBuilder<'a> {
    #[instrument(level = "debug", skip(members), fields(members = members.len()))]
    pub fn new(members: &'a [Member]) -> Self {
        let mut by_id = HashMap::with_capacity(members.len());
        for (pos, member) in members.iter().enumerate() {
            by_id.entry(member.id.as_str()).or_insert(pos);
        }

        let mut children_of: HashMap<&'a str, Vec<usize>> = HashMap::new();
        let mut parentless = Vec::new();
        let mut claimed_by: HashMap<&'a str, Vec<usize>> = HashMap::new();
        let mut has_parent = Vec::with_capacity(members.len());
        for (pos, member) in members.iter().enumerate() {
            let parent = member
                .parent_id
                .as_ref()
                .map(MemberId::as_str)
                .filter(|p| *p != member.id.as_str() && by_id.contains_key(p));
            has_parent.push(parent.is_some());
            match parent {
                Some(parent) => children_of.entry(parent).or_default().push(pos),
                None => parentless.push(pos),
            }

            if let Some(spouse) = member.spouse_id.as_ref().map(MemberId::as_str) {
                if spouse != member.id.as_str() {
                    claimed_by.entry(spouse).or_default().push(pos);
                }
            }
        }
        // Stable: equal child_order keeps roster order
        for siblings in children_of.values_mut().chain(std::iter::once(&mut parentless)) {
            siblings.sort_by_key(|&pos| members[pos].sort_key());
        }

        Self {
            members,
            by_id,
            children_of,
            parentless,
            claimed_by,
            has_parent,
        }
    }

    /// Build the complete forest.
    #[instrument(level = "debug", skip(self))]
    pub fn build(&self) -> FamilyForest {
        let mut forest = FamilyForest::new();
        let mut placed = Placed::new();

        let roots = self.select_roots(&mut forest, &mut placed);
        forest.set_roots(roots);

        let unplaced: Vec<MemberId> = self
            .members
            .iter()
            .map(|m| &m.id)
            .filter(|id| !placed.contains(*id))
            .unique()
            .cloned()
            .collect();
        for id in &unplaced {
            warn!("member {} could not be placed in the tree", id);
        }
        forest.set_unplaced(unplaced);

        debug!(
            "built {} couples under {} roots",
            forest.len(),
            forest.roots().len()
        );
        forest
    }

    /// Expand parentless members into the root couples of the forest.
    ///
    /// A parentless member whose spouse has a parent is held back before
    /// expansion so the spouse's subtree can claim them; if it does not, they
    /// are appended as roots afterwards. Any root that ended up recorded as
    /// someone's spouse is dropped.
    ///
    /// Appending unclaimed held-back members is a deliberate exception to the
    /// spouse-with-parent root exclusion: it keeps every member in the forest.
    #[instrument(level = "debug", skip(self, forest, placed))]
    pub fn select_roots(&self, forest: &mut FamilyForest, placed: &mut Placed) -> Vec<Index> {
        let (held_back, candidates): (Vec<usize>, Vec<usize>) = self
            .siblings(None)
            .iter()
            .copied()
            .partition(|&pos| self.spouse_has_parent(pos));
        for &pos in &held_back {
            debug!(
                "{} has no parent but their spouse does, not a root",
                self.members[pos].id
            );
        }

        let mut built = self.build_level(&candidates, forest, placed);

        // Held back, but the spouse's subtree never claimed them
        let leftovers: Vec<usize> = held_back
            .into_iter()
            .filter(|&pos| !placed.contains(&self.members[pos].id))
            .collect();
        if !leftovers.is_empty() {
            debug!("{} held-back members become roots", leftovers.len());
            built.extend(self.build_level(&leftovers, forest, placed));
        }

        let spouse_ids = forest.spouse_ids(&built);

        let mut roots = Vec::with_capacity(built.len());
        for idx in built {
            let is_spouse = forest
                .get_node(idx)
                .is_some_and(|n| spouse_ids.contains(n.id()));
            if is_spouse {
                forest.prune(idx);
            } else {
                roots.push(idx);
            }
        }
        roots
    }

    /// Couple nodes for the members recorded under `parent_id`.
    ///
    /// `None` selects members without a (resolvable) parent.
    #[instrument(level = "trace", skip(self, forest, placed))]
    pub fn build_children_of(
        &self,
        parent_id: Option<&MemberId>,
        forest: &mut FamilyForest,
        placed: &mut Placed,
    ) -> Vec<Index> {
        let siblings = self.siblings(parent_id.map(MemberId::as_str));
        self.build_level(siblings, forest, placed)
    }

    fn siblings(&self, parent: Option<&str>) -> &[usize] {
        match parent {
            Some(parent) => self
                .children_of
                .get(parent)
                .map(Vec::as_slice)
                .unwrap_or_default(),
            None => &self.parentless,
        }
    }

    /// Build one sibling group in order.
    ///
    /// Siblings married to each other are paired on the earlier one: by the
    /// time the later sibling comes up it is already placed and skipped.
    fn build_level(
        &self,
        siblings: &[usize],
        forest: &mut FamilyForest,
        placed: &mut Placed,
    ) -> Vec<Index> {
        let mut level = Vec::with_capacity(siblings.len());
        for &pos in siblings {
            let member = &self.members[pos];
            if placed.contains(&member.id) {
                trace!("{} already placed", member.id);
                continue;
            }
            let spouse = self.partner_of(pos).filter(|&s| {
                let free = !placed.contains(&self.members[s].id);
                if free && siblings.contains(&s) {
                    trace!("{} married to sibling {}", member.id, self.members[s].id);
                }
                free
            });
            level.push(self.build_couple(pos, spouse, forest, placed));
        }
        level
    }

    fn build_couple(
        &self,
        pos: usize,
        spouse: Option<usize>,
        forest: &mut FamilyForest,
        placed: &mut Placed,
    ) -> Index {
        let member = &self.members[pos];
        let spouse = spouse.map(|s| &self.members[s]);
        placed.insert(member.id.clone());
        if let Some(spouse) = spouse {
            placed.insert(spouse.id.clone());
        }

        // A shared child may be recorded under either partner
        let mut children = self.build_children_of(Some(&member.id), forest, placed);
        if let Some(spouse) = spouse {
            children.extend(self.build_children_of(Some(&spouse.id), forest, placed));
        }

        let mut seen = HashSet::new();
        let mut kept = Vec::with_capacity(children.len());
        for idx in children {
            let keep = forest.get_node(idx).is_some_and(|child| {
                seen.insert(child.id().clone()) && spouse.map_or(true, |s| s.id != *child.id())
            });
            if keep {
                kept.push(idx);
            } else {
                forest.prune(idx);
            }
        }
        kept.sort_by_key(|&idx| forest.get_node(idx).map_or(0, |n| n.member.sort_key()));

        forest.insert_couple(member.clone(), spouse.cloned(), kept)
    }

    /// Resolve a member's spouse against the whole roster.
    ///
    /// Uses the member's own `spouse_id` when it resolves, otherwise the first
    /// member whose `spouse_id` names this one. Self-references never resolve.
    fn partner_of(&self, pos: usize) -> Option<usize> {
        let member = &self.members[pos];
        member
            .spouse_id
            .as_ref()
            .map(MemberId::as_str)
            .filter(|s| *s != member.id.as_str())
            .and_then(|s| self.by_id.get(s).copied())
            .or_else(|| {
                self.claimed_by
                    .get(member.id.as_str())
                    .and_then(|claims| claims.first().copied())
            })
    }

    fn spouse_has_parent(&self, pos: usize) -> bool {
        self.partner_of(pos).is_some_and(|s| self.has_parent[s])
    }
}

/// Build the family forest for a roster snapshot.
pub fn build_forest(members: &[Member]) -> FamilyForest {
    FamilyTreeBuilder::new(members).build()
}
