//! On-disk layout: a single `matrix/` directory rooted under the host
//! assistant's config directory.
//!
//! ```text
//! <user home>/<assistant dir>/matrix/
//!   matrix.db
//!   sessions/session-<hex16>.json
//!   grammars/
//!   models/
//!   dreamer/logs/<task_id>.{out,err}.log
//!   .initialized
//! ```

use std::path::{Path, PathBuf};

use crate::error::Error;

/// Qualifier/organization/application triple handed to `directories`. Matches
/// the teacher's `ProjectDirs::from("", "", <name>)` convention.
const APP_NAME: &str = "matrix";

/// Root of the on-disk layout, or an explicit override (tests, `--data-dir`).
#[derive(Debug, Clone)]
pub struct Layout {
    root: PathBuf,
}

impl Layout {
    /// Resolve the layout from the host's standard config directory.
    ///
    /// # Errors
    /// Returns [`Error::Fatal`] if the platform has no resolvable home
    /// directory (e.g. a stripped-down container without `HOME`/`USERPROFILE`).
    pub fn discover() -> crate::Result<Self> {
        let dirs = directories::ProjectDirs::from("", "", APP_NAME).ok_or_else(|| {
            Error::Fatal("could not determine a home directory for this platform".to_string())
        })?;
        Ok(Self {
            root: dirs.config_dir().join(APP_NAME),
        })
    }

    /// Build a layout rooted at an explicit path (used by tests and
    /// `--data-dir` overrides).
    #[must_use]
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.root.join("matrix.db")
    }

    #[must_use]
    pub fn sessions_dir(&self) -> PathBuf {
        self.root.join("sessions")
    }

    #[must_use]
    pub fn grammars_dir(&self) -> PathBuf {
        self.root.join("grammars")
    }

    #[must_use]
    pub fn models_dir(&self) -> PathBuf {
        self.root.join("models")
    }

    #[must_use]
    pub fn dreamer_logs_dir(&self) -> PathBuf {
        self.root.join("dreamer").join("logs")
    }

    #[must_use]
    pub fn initialized_marker(&self) -> PathBuf {
        self.root.join(".initialized")
    }

    /// Create every directory in the layout that must exist before the store
    /// or scheduler can run. Idempotent.
    pub fn ensure(&self) -> crate::Result<()> {
        std::fs::create_dir_all(&self.root)?;
        std::fs::create_dir_all(self.sessions_dir())?;
        std::fs::create_dir_all(self.grammars_dir())?;
        std::fs::create_dir_all(self.models_dir())?;
        std::fs::create_dir_all(self.dreamer_logs_dir())?;
        Ok(())
    }
}
