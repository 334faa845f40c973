// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Path Sanitizer Domain Service
//!
//! Relative source paths from mount files and the names used as keys into
//! file-backed stores come from command definitions and runtime values. They
//! must never escape the directory they are joined onto.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Reject traversal in relative paths and store keys

use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum PathSanitizerError {
    #[error("Path traversal attempt detected: {0}")]
    PathTraversal(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

/// Normalize a path that will be joined under a root. Rejects absolute
/// paths, `..` components and null bytes; drops `.` components.
pub fn relative(path: &str) -> Result<PathBuf, PathSanitizerError> {
    if path.contains('\0') {
        return Err(PathSanitizerError::InvalidPath(
            "Path contains null byte".to_string(),
        ));
    }

    let mut normalized = PathBuf::new();
    for component in Path::new(path).components() {
        match component {
            Component::Normal(part) => normalized.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                tracing::warn!("Path traversal attempt detected: {}", path);
                return Err(PathSanitizerError::PathTraversal(path.to_string()));
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(PathSanitizerError::InvalidPath(format!(
                    "{} must be relative",
                    path
                )));
            }
        }
    }

    if normalized.as_os_str().is_empty() {
        return Err(PathSanitizerError::InvalidPath(format!("{:?} is empty", path)));
    }
    Ok(normalized)
}

/// A single directory or file name: exactly one normal component.
pub fn segment(name: &str) -> Result<&str, PathSanitizerError> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) if !name.contains('\0') => Ok(name),
        (Some(Component::ParentDir), _) => Err(PathSanitizerError::PathTraversal(name.to_string())),
        _ => Err(PathSanitizerError::InvalidPath(format!(
            "{:?} is not a single path segment",
            name
        ))),
    }
}
