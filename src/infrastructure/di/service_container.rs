//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::path::PathBuf;
use std::sync::Arc;

use crate::application::services::FamilyService;
use crate::config::Settings;
use crate::infrastructure::traits::{FileSystem, RealFileSystem};

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    /// Roster service bound to the configured (or overridden) roster file
    pub family: FamilyService,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings, roster_override: Option<PathBuf>) -> Self {
        Self::with_deps(settings, roster_override, Arc::new(RealFileSystem))
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(
        settings: Settings,
        roster_override: Option<PathBuf>,
        fs: Arc<dyn FileSystem>,
    ) -> Self {
        let roster = roster_override.unwrap_or_else(|| settings.members_file.clone());
        let family = FamilyService::new(Arc::clone(&fs), roster, settings.strict);
        let settings = Arc::new(settings);

        Self {
            settings,
            fs,
            family,
        }
    }
}
