use log::debug;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use crate::error::{Result, RunnerError};

/// Local defaults shared by every invocation on this machine.
///
/// Stored in `<config dir>/pipeline-runner/defaults.toml`. Concurrent
/// invocations serialize their read-modify-write cycles through an
/// exclusive lock on `defaults.toml.lock` next to it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Defaults {
    #[serde(default)]
    pub defaults: DefaultValues,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultValues {
    pub organization: Option<String>,
    pub project: Option<String>,
}

pub struct DefaultsStore {
    path: PathBuf,
}

/// Exclusive hold on the defaults lock file, released on drop.
struct LockGuard {
    file: File,
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        let _ = fs2::FileExt::unlock(&self.file);
    }
}

impl DefaultsStore {
    /// Store in the platform configuration directory.
    pub fn user() -> Result<Self> {
        let dir = dirs::config_dir()
            .ok_or_else(|| RunnerError::Config("No configuration directory found".into()))?
            .join("pipeline-runner");
        Ok(Self::at(dir.join("defaults.toml")))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".lock");
        self.path.with_file_name(name)
    }

    fn lock(&self) -> Result<LockGuard> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let lock_path = self.lock_path();
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)?;

        fs2::FileExt::lock_exclusive(&file).map_err(|source| RunnerError::Lock {
            path: lock_path,
            source,
        })?;

        Ok(LockGuard { file })
    }

    /// Reads the current defaults. A missing file yields empty defaults.
    pub fn load(&self) -> Result<Defaults> {
        if !self.path.exists() {
            return Ok(Defaults::default());
        }
        let contents = fs::read_to_string(&self.path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Applies `change` to the stored defaults while holding the lock.
    pub fn update<F>(&self, change: F) -> Result<Defaults>
    where
        F: FnOnce(&mut DefaultValues),
    {
        let _guard = self.lock()?;

        let mut current = self.load()?;
        change(&mut current.defaults);

        let contents = toml::to_string_pretty(&current)?;
        let staging = self.path.with_extension("toml.tmp");
        fs::write(&staging, contents)?;
        fs::rename(&staging, &self.path)?;

        debug!("Updated defaults in {}", self.path.display());
        Ok(current)
    }

    /// Records the organization and project the last run used.
    pub fn set_project(&self, organization: &str, project: &str) -> Result<Defaults> {
        self.update(|values| {
            values.organization = Some(organization.to_string());
            values.project = Some(project.to_string());
        })
    }
}
