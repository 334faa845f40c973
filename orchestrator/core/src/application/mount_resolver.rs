// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Mount Resolver
//!
//! Derives the platform-host source of each input mount from the resolved
//! value of the input named by its `file-input`. Writable mounts without a
//! file input are output mounts and are left for preparation to back with an
//! empty build directory.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Per-mount host path and source file derivation

use serde_json::Value;
use tracing::debug;

use crate::domain::command::{CommandMount, InputType};
use crate::domain::entity::ResourceSnapshot;
use crate::domain::errors::ResolutionError;
use crate::domain::resolved::{MountSourceFiles, ResolvedInput, ResolvedMount};

pub fn resolve_mounts(
    mounts: &[CommandMount],
    inputs: &[ResolvedInput],
) -> Result<Vec<ResolvedMount>, ResolutionError> {
    mounts.iter().map(|m| resolve_mount(m, inputs)).collect()
}

pub fn resolve_mount(
    mount: &CommandMount,
    inputs: &[ResolvedInput],
) -> Result<ResolvedMount, ResolutionError> {
    let mut resolved = ResolvedMount {
        name: mount.name.clone(),
        remote_path: mount.path.clone(),
        writable: mount.writable,
        host_path: None,
        input_files: Vec::new(),
        container_host_path: None,
    };

    if !mount.is_input() {
        debug!("Mount {} is an output mount", mount.name);
        return Ok(resolved);
    }

    let file_input = mount.file_input().ok_or_else(|| {
        ResolutionError::mount(&mount.name, "I don't know how to resolve a mount without a parent.")
    })?;

    let source = inputs
        .iter()
        .find(|i| i.name() == file_input)
        .ok_or_else(|| {
            ResolutionError::mount(
                &mount.name,
                format!("Input \"{}\" has not been resolved", file_input),
            )
        })?;

    let files = match source.input_type() {
        InputType::Resource => {
            let resource: ResourceSnapshot = serde_json::from_str(source.value.as_deref().unwrap_or(""))
                .map_err(|e| {
                    ResolutionError::mount(
                        &mount.name,
                        format!("Could not get resource from parent {}: {}", source.name(), e),
                    )
                })?;
            vec![MountSourceFiles::directory(resource.directory)]
        }
        InputType::File => file_sources(source.value.as_deref().unwrap_or("")),
        entity_type if entity_type.has_resources() => {
            let directory = resource_directory(mount, source)?;
            vec![MountSourceFiles::directory(directory)]
        }
        other => {
            return Err(ResolutionError::mount(
                &mount.name,
                format!("I don't know how to resolve a mount from an input of type {}", other),
            ))
        }
    };

    let host_path = files
        .first()
        .and_then(|f| f.root_directory().or(f.path()))
        .map(str::to_string)
        .ok_or_else(|| {
            ResolutionError::mount(&mount.name, "Could not resolve command mount host path.")
        })?;

    debug!("Mount {} resolved to host path {}", mount.name, host_path);
    resolved.host_path = Some(host_path);
    resolved.input_files = files;
    Ok(resolved)
}

/// A file value is a single path, a JSON list of paths, or a file snapshot
/// carrying a `path`.
fn file_sources(value: &str) -> Vec<MountSourceFiles> {
    let paths = match serde_json::from_str::<Value>(value) {
        Ok(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        Ok(Value::Object(map)) => map
            .get("path")
            .and_then(Value::as_str)
            .map(|p| vec![p.to_string()])
            .unwrap_or_default(),
        _ => vec![value.to_string()],
    };

    paths
        .into_iter()
        .filter(|p| !p.trim().is_empty())
        .map(MountSourceFiles::file)
        .collect()
}

fn resource_directory(mount: &CommandMount, source: &ResolvedInput) -> Result<String, ResolutionError> {
    let value: Value = serde_json::from_str(source.value.as_deref().unwrap_or("")).map_err(|e| {
        ResolutionError::mount(
            &mount.name,
            format!("Could not read parent {}: {}", source.name(), e),
        )
    })?;

    let resources: Vec<ResourceSnapshot> = match value.get("resources") {
        Some(list) => serde_json::from_value(list.clone()).map_err(|e| {
            ResolutionError::mount(
                &mount.name,
                format!("Could not read resources of parent {}: {}", source.name(), e),
            )
        })?,
        None => Vec::new(),
    };

    let first = resources.first().ok_or_else(|| {
        ResolutionError::mount(
            &mount.name,
            format!("Could not find any resources for parent {}", source.name()),
        )
    })?;

    let selected = match mount.resource_selector() {
        Some(label) if resources.len() > 1 => resources
            .iter()
            .find(|r| r.label == label)
            .ok_or_else(|| {
                ResolutionError::mount(
                    &mount.name,
                    format!("Parent {} has no resource with name {}", source.name(), label),
                )
            })?,
        _ => first,
    };

    Ok(selected.directory.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::command::CommandInput;

    fn resolved(name: &str, input_type: InputType, value: &str) -> ResolvedInput {
        ResolvedInput {
            input: CommandInput::new(name, input_type),
            value: Some(value.to_string()),
            command_line_argument: Some(value.to_string()),
        }
    }

    fn mount(file_input: Option<&str>, resource: Option<&str>) -> CommandMount {
        CommandMount {
            name: "in".to_string(),
            path: "/input".to_string(),
            writable: false,
            file_input: file_input.map(str::to_string),
            resource: resource.map(str::to_string),
        }
    }

    const SCAN: &str = r#"{
        "id": "1",
        "resources": [
            {"id": 1, "label": "DICOM", "directory": "/data/scan1/DICOM"},
            {"id": 2, "label": "NIFTI", "directory": "/data/scan1/NIFTI"}
        ]
    }"#;

    #[test]
    fn test_selector_picks_labelled_resource() {
        let inputs = vec![resolved("scan", InputType::Scan, SCAN)];
        let result = resolve_mount(&mount(Some("scan"), Some("NIFTI")), &inputs).unwrap();
        assert_eq!(result.host_path.as_deref(), Some("/data/scan1/NIFTI"));
        assert_eq!(result.input_files, vec![MountSourceFiles::directory("/data/scan1/NIFTI")]);
    }

    #[test]
    fn test_no_selector_uses_first_resource() {
        let inputs = vec![resolved("scan", InputType::Scan, SCAN)];
        let result = resolve_mount(&mount(Some("scan"), None), &inputs).unwrap();
        assert_eq!(result.host_path.as_deref(), Some("/data/scan1/DICOM"));
    }

    #[test]
    fn test_unknown_selector_fails() {
        let inputs = vec![resolved("scan", InputType::Scan, SCAN)];
        let err = resolve_mount(&mount(Some("scan"), Some("SNAPSHOTS")), &inputs).unwrap_err();
        assert!(matches!(err, ResolutionError::MountResolution { .. }));
        assert!(err.to_string().contains("no resource with name SNAPSHOTS"));
    }

    #[test]
    fn test_single_resource_ignores_selector() {
        let scan = r#"{"id": "1", "resources": [{"label": "DICOM", "directory": "/d"}]}"#;
        let inputs = vec![resolved("scan", InputType::Scan, scan)];
        let result = resolve_mount(&mount(Some("scan"), Some("NIFTI")), &inputs).unwrap();
        assert_eq!(result.host_path.as_deref(), Some("/d"));
    }

    #[test]
    fn test_every_resource_bearing_type_resolves() {
        for input_type in [
            InputType::Project,
            InputType::Subject,
            InputType::Session,
            InputType::Assessor,
        ] {
            let inputs = vec![resolved("entity", input_type, SCAN)];
            let result = resolve_mount(&mount(Some("entity"), Some("NIFTI")), &inputs).unwrap();
            assert_eq!(result.host_path.as_deref(), Some("/data/scan1/NIFTI"));
        }
    }

    #[test]
    fn test_zero_resources_fails() {
        let inputs = vec![resolved("scan", InputType::Scan, r#"{"id": "1", "resources": []}"#)];
        let err = resolve_mount(&mount(Some("scan"), None), &inputs).unwrap_err();
        assert!(err.to_string().contains("Could not find any resources"));
    }

    #[test]
    fn test_resource_input_uses_directory() {
        let resource = r#"{"id": 3, "label": "OUT", "directory": "/data/res"}"#;
        let inputs = vec![resolved("res", InputType::Resource, resource)];
        let result = resolve_mount(&mount(Some("res"), None), &inputs).unwrap();
        assert_eq!(result.host_path.as_deref(), Some("/data/res"));
    }

    #[test]
    fn test_file_list_yields_one_source_per_path() {
        let inputs = vec![resolved("f", InputType::File, r#"["/a/1.dcm", "/a/2.dcm"]"#)];
        let result = resolve_mount(&mount(Some("f"), None), &inputs).unwrap();
        assert_eq!(result.host_path.as_deref(), Some("/a/1.dcm"));
        assert_eq!(result.input_files.len(), 2);
    }

    #[test]
    fn test_string_input_cannot_back_a_mount() {
        let inputs = vec![resolved("s", InputType::String, "/data")];
        let err = resolve_mount(&mount(Some("s"), None), &inputs).unwrap_err();
        assert!(err.to_string().contains("input of type string"));
    }

    #[test]
    fn test_read_only_mount_without_file_input_fails() {
        let err = resolve_mount(&mount(None, None), &[]).unwrap_err();
        assert!(err.to_string().contains("without a parent"));
    }

    #[test]
    fn test_output_mount_has_no_host_path() {
        let mut output = mount(None, None);
        output.writable = true;
        let result = resolve_mount(&output, &[]).unwrap();
        assert!(result.host_path.is_none());
        assert!(result.input_files.is_empty());
    }

    #[test]
    fn test_blank_file_value_fails() {
        let inputs = vec![resolved("f", InputType::File, " ")];
        let err = resolve_mount(&mount(Some("f"), None), &inputs).unwrap_err();
        assert!(err.to_string().contains("host path"));
    }
}
