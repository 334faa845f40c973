// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Build Directory Stager
//!
//! Allocates fresh build directories under the configured build root and
//! copies mount source files into them. Every allocation is a new
//! `<build-root>/<uuid-v4>` directory; nothing is ever reused or cleaned up
//! here.
//!
//! **Copy rules per source:**
//! - root + path: `root/path` lands at `build/path` (directories recursively)
//! - root only: the whole tree under `root` lands directly in `build`
//! - path only: the file or directory lands at `build/<file name>`

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;
use walkdir::WalkDir;

use crate::domain::path_sanitizer::{self, PathSanitizerError};
use crate::domain::resolved::MountSourceFiles;

#[derive(Debug, Error)]
pub enum StagingError {
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Source {0} does not exist")]
    MissingSource(PathBuf),

    #[error("Source files have neither a root directory nor a path")]
    EmptySource,

    #[error("Source {source_dir} contains the build directory {destination}")]
    ContainsDestination {
        source_dir: PathBuf,
        destination: PathBuf,
    },

    #[error(transparent)]
    InvalidPath(#[from] PathSanitizerError),
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> StagingError + '_ {
    move |source| StagingError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[derive(Debug, Clone)]
pub struct BuildDirectoryStager {
    build_root: PathBuf,
}

impl BuildDirectoryStager {
    pub fn new(build_root: impl Into<PathBuf>) -> Self {
        Self {
            build_root: build_root.into(),
        }
    }

    pub fn build_root(&self) -> &Path {
        &self.build_root
    }

    /// Create a new, empty build directory.
    pub fn allocate(&self) -> Result<PathBuf, StagingError> {
        let directory = self.build_root.join(Uuid::new_v4().to_string());
        std::fs::create_dir_all(&directory).map_err(io_error(&directory))?;
        tracing::debug!("Allocated build directory {:?}", directory);
        Ok(directory)
    }

    /// Allocate a build directory and copy every source into it. Later
    /// sources overwrite earlier ones on name collisions.
    pub fn stage(&self, sources: &[MountSourceFiles]) -> Result<PathBuf, StagingError> {
        let directory = self.allocate()?;
        for source in sources {
            copy_source(source, &directory)?;
        }
        Ok(directory)
    }
}

fn copy_source(source: &MountSourceFiles, destination: &Path) -> Result<(), StagingError> {
    match (source.root_directory(), source.path()) {
        (Some(root), Some(path)) => {
            let relative = path_sanitizer::relative(path)?;
            copy_path(&Path::new(root).join(&relative), &destination.join(&relative))
        }
        (Some(root), None) => copy_tree(Path::new(root), destination),
        (None, Some(path)) => {
            let source = Path::new(path);
            let name = source
                .file_name()
                .ok_or_else(|| PathSanitizerError::InvalidPath(path.to_string()))?;
            copy_path(source, &destination.join(name))
        }
        (None, None) => Err(StagingError::EmptySource),
    }
}

fn copy_path(source: &Path, destination: &Path) -> Result<(), StagingError> {
    if source.is_dir() {
        return copy_tree(source, destination);
    }
    if !source.exists() {
        return Err(StagingError::MissingSource(source.to_path_buf()));
    }
    if let Some(parent) = destination.parent() {
        std::fs::create_dir_all(parent).map_err(io_error(parent))?;
    }
    std::fs::copy(source, destination).map_err(io_error(source))?;
    Ok(())
}

fn copy_tree(source: &Path, destination: &Path) -> Result<(), StagingError> {
    if !source.is_dir() {
        return Err(StagingError::MissingSource(source.to_path_buf()));
    }
    std::fs::create_dir_all(destination).map_err(io_error(destination))?;

    let canonical_source = source.canonicalize().map_err(io_error(source))?;
    let canonical_destination = destination.canonicalize().map_err(io_error(destination))?;
    if canonical_destination.starts_with(&canonical_source) {
        return Err(StagingError::ContainsDestination {
            source_dir: canonical_source,
            destination: canonical_destination,
        });
    }

    for entry in WalkDir::new(source).min_depth(1) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(source).to_path_buf();
            StagingError::Io {
                path,
                source: e.into(),
            }
        })?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|_| PathSanitizerError::InvalidPath(entry.path().display().to_string()))?;
        let target = destination.join(relative);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target).map_err(io_error(&target))?;
        } else {
            std::fs::copy(entry.path(), &target).map_err(io_error(entry.path()))?;
        }
    }
    Ok(())
}
