use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::error::{Result, RunnerError};

/// The four positional inputs of an invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    pub prefix: String,
    pub pipeline: String,
    pub flavor: String,
    pub version: String,
}

impl RunRequest {
    pub fn new(
        prefix: impl Into<String>,
        pipeline: impl Into<String>,
        flavor: impl Into<String>,
        version: impl Into<String>,
    ) -> Result<Self> {
        let request = Self {
            prefix: prefix.into(),
            pipeline: pipeline.into(),
            flavor: flavor.into(),
            version: version.into(),
        };

        for (name, value) in [
            ("prefix", &request.prefix),
            ("pipeline", &request.pipeline),
            ("flavor", &request.flavor),
            ("version", &request.version),
        ] {
            if value.trim().is_empty() {
                return Err(RunnerError::Config(format!("{name} must not be empty")));
            }
        }

        Ok(request)
    }

    /// `<prefix>-<flavor>`, shared by the project and its service connection.
    pub fn project_name(&self) -> String {
        format!("{}-{}", self.prefix, self.flavor)
    }

    pub fn description(&self) -> String {
        format!("{} {} pipeline validation", self.prefix, self.flavor)
    }

    /// Finds `<root>/<dir>/<pipeline>.yaml`.
    ///
    /// `dir` may be absolute as long as it lies under `root`.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::PipelineFileMissing`] listing every pipeline
    /// available in `dir` when the file does not exist, and
    /// [`RunnerError::Config`] when `dir` escapes `root`.
    pub fn locate_definition(&self, root: &Path, dir: &Path) -> Result<DefinitionFile> {
        let file_name = format!("{}.yaml", self.pipeline);
        let path = root.join(dir).join(&file_name);
        if !path.is_file() {
            return Err(RunnerError::PipelineFileMissing {
                path: dir.join(&file_name),
                available: available_pipelines(&root.join(dir)),
            });
        }

        let mut segments = repository_segments(root, dir)?;
        segments.push(file_name);
        Ok(DefinitionFile {
            path,
            yaml_path: segments.join("/"),
        })
    }
}

fn repository_segments(root: &Path, dir: &Path) -> Result<Vec<String>> {
    let outside = || {
        RunnerError::Config(format!(
            "Pipeline directory {} is outside the working directory {}",
            dir.display(),
            root.display()
        ))
    };

    let relative = if dir.is_absolute() {
        dir.strip_prefix(root).map_err(|_| outside())?
    } else {
        dir
    };

    let mut segments = Vec::new();
    for component in relative.components() {
        match component {
            Component::CurDir => {}
            Component::Normal(part) => segments.push(part.to_string_lossy().into_owned()),
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(outside())
            }
        }
    }
    Ok(segments)
}

/// Pipeline definition present in the working tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinitionFile {
    path: PathBuf,
    yaml_path: String,
}

impl DefinitionFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Repository-relative path with forward slashes.
    pub fn yaml_path(&self) -> &str {
        &self.yaml_path
    }
}

/// Stems of the `*.yaml` files in `dir`, sorted.
pub fn available_pipelines(dir: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut names: Vec<String> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "yaml"))
        .filter_map(|path| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
        .collect();
    names.sort();
    names
}
