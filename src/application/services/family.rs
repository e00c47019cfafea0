//! Family roster service
//!
//! Loads the roster, applies record changes through the [`MemberStore`] and
//! builds the family forest for display.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use generational_arena::Index;
use tracing::{debug, instrument, warn};

use crate::application::roster::{parse_roster, render_roster};
use crate::application::{
    ApplicationError, ApplicationResult, IoResultExt, MemberDraft, MemberStore,
};
use crate::domain::{build_forest, validate, FamilyForest, Member, MemberId, ValidationReport};
use crate::infrastructure::traits::FileSystem;

/// A forest together with the couple chosen as the temporary root.
#[derive(Debug)]
pub struct FocusedFamily {
    pub forest: FamilyForest,
    pub root: Index,
}

impl FocusedFamily {
    pub fn title(&self) -> String {
        self.forest.family_title(self.root).unwrap_or_default()
    }
}

/// Service for reading, editing and displaying a family roster.
pub struct FamilyService {
    fs: Arc<dyn FileSystem>,
    roster_path: PathBuf,
    strict: bool,
}

impl FamilyService {
    /// Create a new family service.
    ///
    /// With `strict`, rosters with fatal validation issues are rejected
    /// before building; otherwise they are logged and built anyway.
    pub fn new(fs: Arc<dyn FileSystem>, roster_path: PathBuf, strict: bool) -> Self {
        Self {
            fs,
            roster_path,
            strict,
        }
    }

    pub fn roster_path(&self) -> &Path {
        &self.roster_path
    }

    /// Load the roster; a missing file is an empty roster.
    #[instrument(level = "debug", skip(self))]
    pub fn load(&self) -> ApplicationResult<MemberStore> {
        if !self.fs.exists(&self.roster_path) {
            debug!("no roster at {}, starting empty", self.roster_path.display());
            return Ok(MemberStore::default());
        }
        let content = self
            .fs
            .read_to_string(&self.roster_path)
            .with_path_context("read roster", &self.roster_path)?;
        let members = parse_roster(&content, &self.roster_path)?;
        debug!("loaded {} members", members.len());
        Ok(MemberStore::new(members))
    }

    /// Write the roster through a temporary file and rename it into place.
    #[instrument(level = "debug", skip(self, store))]
    pub fn save(&self, store: &MemberStore) -> ApplicationResult<()> {
        let content = render_roster(store.members(), &self.roster_path)?;
        let mut tmp = OsString::from(self.roster_path.as_os_str());
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        self.fs
            .ensure_parent(&self.roster_path)
            .with_path_context("create directory for", &self.roster_path)?;
        self.fs
            .write(&tmp, &content)
            .with_path_context("write roster", &tmp)?;
        self.fs
            .rename(&tmp, &self.roster_path)
            .with_path_context("replace roster", &self.roster_path)?;
        Ok(())
    }

    pub fn list(&self) -> ApplicationResult<Vec<Member>> {
        Ok(self.load()?.into_members())
    }

    pub fn check(&self) -> ApplicationResult<ValidationReport> {
        let store = self.load()?;
        Ok(validate(store.members()))
    }

    /// Build the full forest.
    #[instrument(level = "debug", skip(self))]
    pub fn forest(&self) -> ApplicationResult<FamilyForest> {
        let store = self.load()?;
        let report = validate(store.members());
        for issue in report.warnings() {
            warn!("{}", issue);
        }
        if self.strict {
            report.ensure_buildable()?;
        } else {
            for issue in report.fatal() {
                warn!("{}", issue);
            }
        }
        Ok(build_forest(store.members()))
    }

    /// Build the forest and locate the couple containing `id`.
    #[instrument(level = "debug", skip(self))]
    pub fn focus(&self, id: &MemberId) -> ApplicationResult<FocusedFamily> {
        let forest = self.forest()?;
        let root = forest
            .find_node(id.as_str())
            .ok_or_else(|| ApplicationError::MemberNotFound(id.clone()))?;
        Ok(FocusedFamily { forest, root })
    }

    #[instrument(level = "debug", skip(self, draft))]
    pub fn add(&self, draft: MemberDraft) -> ApplicationResult<MemberId> {
        let mut store = self.load()?;
        let id = store.add(draft)?;
        self.save(&store)?;
        Ok(id)
    }

    /// Edit a member starting from its current fields.
    #[instrument(level = "debug", skip(self, edit))]
    pub fn update(
        &self,
        id: &MemberId,
        edit: impl FnOnce(&mut MemberDraft),
    ) -> ApplicationResult<Member> {
        let mut store = self.load()?;
        let mut draft = store
            .get(id)
            .map(MemberDraft::from_member)
            .ok_or_else(|| ApplicationError::MemberNotFound(id.clone()))?;
        edit(&mut draft);
        store.update(id, draft)?;
        self.save(&store)?;
        store
            .get(id)
            .cloned()
            .ok_or_else(|| ApplicationError::MemberNotFound(id.clone()))
    }

    #[instrument(level = "debug", skip(self))]
    pub fn remove(&self, id: &MemberId) -> ApplicationResult<Member> {
        let mut store = self.load()?;
        let removed = store.delete(id)?;
        self.save(&store)?;
        Ok(removed)
    }
}
