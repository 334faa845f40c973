// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Input Resolver
//!
//! Folds over a command's declared inputs in order, turning runtime values
//! and defaults into typed, substitutable values. Each input may depend on
//! inputs declared before it (its `parent` and `prerequisites`); a reference
//! to a later or unknown input is a definition error, never a runtime one.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Dependency-ordered, type-dispatched input resolution
//! - **Collaborators:** `EntityLoader` for bare entity ids, `ConfigLookup`
//!   for `config` inputs

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::application::value_extractor::{extract_first, extract_from_parent};
use crate::domain::command::{CommandInput, InputType};
use crate::domain::config_store::{ConfigLookup, ConfigScope};
use crate::domain::entity::{EntityLoader, EntitySnapshot, EntityType};
use crate::domain::errors::ResolutionError;
use crate::domain::resolved::ResolvedInput;
use crate::domain::user::UserContext;
use crate::infrastructure::template_substitutor::Substitutions;

/// Accumulated result of the fold. Entries are only ever appended.
#[derive(Debug, Clone, Default)]
pub struct InputResolution {
    pub inputs: Vec<ResolvedInput>,

    /// Replacement key to raw value, for environment templates
    pub values: Substitutions,

    /// Replacement key to command-line rendering
    pub command_line_values: Substitutions,

    pub warnings: Vec<String>,
}

impl InputResolution {
    pub fn get(&self, name: &str) -> Option<&ResolvedInput> {
        self.inputs.iter().find(|i| i.name() == name)
    }

    fn push(&mut self, input: &CommandInput, value: Option<String>) {
        let command_line_argument = value.as_deref().map(|v| input.command_line_argument(v));

        if let Some(key) = input.replacement_key() {
            self.values
                .insert(key.to_string(), value.clone().unwrap_or_default());
            self.command_line_values.insert(
                key.to_string(),
                command_line_argument.clone().unwrap_or_default(),
            );
        }

        self.inputs.push(ResolvedInput {
            input: input.clone(),
            value,
            command_line_argument,
        });
    }

    fn warn(&mut self, message: String) {
        warn!("{}", message);
        self.warnings.push(message);
    }
}

pub struct InputResolver {
    entity_loader: Arc<dyn EntityLoader>,
    config_lookup: Arc<dyn ConfigLookup>,
}

impl InputResolver {
    pub fn new(entity_loader: Arc<dyn EntityLoader>, config_lookup: Arc<dyn ConfigLookup>) -> Self {
        Self {
            entity_loader,
            config_lookup,
        }
    }

    pub async fn resolve(
        &self,
        inputs: &[CommandInput],
        values: &HashMap<String, String>,
        user: &UserContext,
    ) -> Result<InputResolution, ResolutionError> {
        let mut resolution = InputResolution::default();

        for input in inputs {
            debug!("Resolving input {}", input.name);

            for dependency in input.dependencies() {
                if resolution.get(&dependency).is_none() {
                    return Err(ResolutionError::InputOrdering {
                        input: input.name.clone(),
                        dependency,
                    });
                }
            }
            let parent = input.parent_name().and_then(|p| resolution.get(p)).cloned();

            let candidate = values
                .get(&input.name)
                .cloned()
                .or_else(|| input.default_value.clone());

            let value = match input.input_type {
                InputType::Boolean => resolve_boolean(input, candidate),
                InputType::Number | InputType::String => candidate,
                InputType::File => resolve_file(input, parent.as_ref(), candidate)?,
                InputType::Session => {
                    self.resolve_entity(
                        input,
                        EntityType::Session,
                        "sessions",
                        parent.as_ref(),
                        candidate,
                        user,
                        &mut resolution,
                    )
                    .await?
                }
                InputType::Scan => {
                    self.resolve_entity(
                        input,
                        EntityType::Scan,
                        "scans",
                        parent.as_ref(),
                        candidate,
                        user,
                        &mut resolution,
                    )
                    .await?
                }
                InputType::Config => Some(self.resolve_config(input, parent.as_ref()).await?),
                InputType::Project
                | InputType::Subject
                | InputType::Assessor
                | InputType::Resource => candidate,
            };

            if value.is_none() && input.required {
                return Err(ResolutionError::input(
                    &input.name,
                    format!(
                        "Input \"{}\" has no provided or default value, but is required.",
                        input.name
                    ),
                ));
            }

            resolution.push(input, value);
        }

        Ok(resolution)
    }

    /// Session and scan inputs. With a parent the value is extracted from it;
    /// without one it is a snapshot, a list of snapshots, or a bare id.
    #[allow(clippy::too_many_arguments)]
    async fn resolve_entity(
        &self,
        input: &CommandInput,
        entity_type: EntityType,
        collection: &str,
        parent: Option<&ResolvedInput>,
        candidate: Option<String>,
        user: &UserContext,
        resolution: &mut InputResolution,
    ) -> Result<Option<String>, ResolutionError> {
        if let Some(parent) = parent {
            return extract_child(input, parent, collection, candidate).map(Some);
        }

        let Some(raw) = candidate else {
            return Ok(None);
        };

        let supplied = match serde_json::from_str::<Value>(&raw) {
            Ok(value @ Value::Object(_)) => {
                parse_snapshot(input, entity_type, &value)?;
                value
            }
            Ok(Value::Array(items)) => {
                let count = items.len();
                let first = items.into_iter().next().ok_or_else(|| {
                    ResolutionError::input(
                        &input.name,
                        format!("Could not instantiate {} from an empty list", entity_type),
                    )
                })?;
                let snapshot = parse_snapshot(input, entity_type, &first)?;
                if count > 1 {
                    resolution.warn(format!(
                        "Cannot implicitly loop over {} objects. Input \"{}\" uses the first ({}) of {}.",
                        entity_type,
                        input.name,
                        snapshot.id_text(),
                        count
                    ));
                }
                first
            }
            _ => {
                let snapshot = self
                    .entity_loader
                    .load_by_id(entity_type, raw.trim(), user)
                    .await
                    .map_err(|e| ResolutionError::input(&input.name, e.to_string()))?
                    .ok_or_else(|| {
                        ResolutionError::input(
                            &input.name,
                            format!("Could not instantiate {} from value {}", entity_type, raw),
                        )
                    })?;
                return snapshot
                    .to_json()
                    .map(Some)
                    .map_err(|e| ResolutionError::input(&input.name, e.to_string()));
            }
        };

        // Supplied snapshots pass through as given, unknown fields included
        Ok(Some(supplied.to_string()))
    }

    async fn resolve_config(
        &self,
        input: &CommandInput,
        parent: Option<&ResolvedInput>,
    ) -> Result<String, ResolutionError> {
        let (tool, file) = input.config_reference().ok_or_else(|| {
            ResolutionError::input(
                &input.name,
                "Config inputs must have a value that can be interpreted as a tool/file string.",
            )
        })?;

        let scope = match parent {
            None => ConfigScope::Site,
            Some(parent) => match parent.input_type() {
                InputType::Project => {
                    ConfigScope::Project(parent_lookup(input, parent, &["$.id"])?)
                }
                InputType::Subject | InputType::Session | InputType::Scan | InputType::Assessor => {
                    ConfigScope::Project(parent_lookup(
                        input,
                        parent,
                        &["$..projectId", "$..project-id"],
                    )?)
                }
                _ => ConfigScope::Site,
            },
        };

        debug!("Reading config {}/{} at {} scope", tool, file, scope);
        self.config_lookup
            .get_config(tool, file, &scope)
            .await
            .map_err(|e| ResolutionError::input(&input.name, e.to_string()))?
            .ok_or_else(|| {
                ResolutionError::input(&input.name, format!("Could not read config {}/{}", tool, file))
            })
    }
}

fn resolve_boolean(input: &CommandInput, candidate: Option<String>) -> Option<String> {
    let truthy = candidate
        .as_deref()
        .map(|c| c.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    let replacement = if truthy {
        input.true_value.clone()
    } else {
        input.false_value.clone()
    };
    Some(replacement.unwrap_or_else(|| truthy.to_string()))
}

fn resolve_file(
    input: &CommandInput,
    parent: Option<&ResolvedInput>,
    candidate: Option<String>,
) -> Result<Option<String>, ResolutionError> {
    let parent = parent.ok_or_else(|| {
        ResolutionError::input(
            &input.name,
            format!("Inputs of type {} must have a parent.", input.input_type),
        )
    })?;
    extract_child(input, parent, "files", candidate).map(Some)
}

fn extract_child(
    input: &CommandInput,
    parent: &ResolvedInput,
    collection: &str,
    candidate: Option<String>,
) -> Result<String, ResolutionError> {
    let parent_value = parent.value.as_deref().ok_or_else(|| {
        ResolutionError::input(
            &input.name,
            format!("Parent \"{}\" has no value", parent.name()),
        )
    })?;
    extract_from_parent(
        parent_value,
        input.parent_property.as_deref(),
        collection,
        candidate.as_deref(),
    )
    .map_err(|e| {
        ResolutionError::input(
            &input.name,
            format!("Could not get {} from parent \"{}\": {}", input.input_type, parent.name(), e),
        )
    })
}

fn parse_snapshot(
    input: &CommandInput,
    entity_type: EntityType,
    value: &Value,
) -> Result<EntitySnapshot, ResolutionError> {
    EntitySnapshot::deserialize(value).map_err(|e| {
        ResolutionError::input(
            &input.name,
            format!("Could not instantiate {} from value: {}", entity_type, e),
        )
    })
}

/// First non-blank match of any expression against the parent's value.
fn parent_lookup(
    input: &CommandInput,
    parent: &ResolvedInput,
    expressions: &[&str],
) -> Result<String, ResolutionError> {
    let parent_value = parent.value.as_deref().unwrap_or("{}");
    for expression in expressions {
        let found = extract_first(parent_value, expression)
            .map_err(|e| ResolutionError::input(&input.name, e.to_string()))?;
        if let Some(id) = found.filter(|id| !id.trim().is_empty()) {
            return Ok(id);
        }
    }
    Err(ResolutionError::input(
        &input.name,
        "Could not determine project when resolving config value.",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::config_store::InMemoryConfigStore;
    use crate::infrastructure::entity_store::InMemoryEntityStore;

    fn resolver() -> (InputResolver, Arc<InMemoryEntityStore>, Arc<InMemoryConfigStore>) {
        let entities = Arc::new(InMemoryEntityStore::new());
        let configs = Arc::new(InMemoryConfigStore::new());
        (
            InputResolver::new(entities.clone(), configs.clone()),
            entities,
            configs,
        )
    }

    fn user() -> UserContext {
        UserContext::new("admin")
    }

    fn values(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn boolean_input() -> CommandInput {
        let mut input = CommandInput::new("bias", InputType::Boolean);
        input.default_value = Some("true".to_string());
        input.true_value = Some("-b".to_string());
        input.false_value = Some(String::new());
        input.replacement_key = Some("#BIAS#".to_string());
        input
    }

    #[tokio::test]
    async fn test_boolean_maps_to_true_and_false_values() {
        let (resolver, _, _) = resolver();
        let inputs = vec![boolean_input()];

        let resolved = resolver.resolve(&inputs, &HashMap::new(), &user()).await.unwrap();
        assert_eq!(resolved.inputs[0].value.as_deref(), Some("-b"));

        let resolved = resolver
            .resolve(&inputs, &values(&[("bias", "FALSE")]), &user())
            .await
            .unwrap();
        assert_eq!(resolved.inputs[0].value.as_deref(), Some(""));
        assert_eq!(resolved.values.get("#BIAS#").map(String::as_str), Some(""));
    }

    #[tokio::test]
    async fn test_boolean_without_mapping_renders_parsed_value() {
        let (resolver, _, _) = resolver();
        let inputs = vec![CommandInput::new("flag", InputType::Boolean)];

        let resolved = resolver
            .resolve(&inputs, &values(&[("flag", "TRUE")]), &user())
            .await
            .unwrap();
        assert_eq!(resolved.inputs[0].value.as_deref(), Some("true"));

        let resolved = resolver
            .resolve(&inputs, &values(&[("flag", "yes")]), &user())
            .await
            .unwrap();
        assert_eq!(resolved.inputs[0].value.as_deref(), Some("false"));

        let resolved = resolver.resolve(&inputs, &HashMap::new(), &user()).await.unwrap();
        assert_eq!(resolved.inputs[0].value.as_deref(), Some("false"));
    }

    #[tokio::test]
    async fn test_runtime_value_overrides_default() {
        let (resolver, _, _) = resolver();
        let mut input = CommandInput::new("msg", InputType::String);
        input.default_value = Some("default".to_string());
        input.replacement_key = Some("#MSG#".to_string());
        input.command_line_flag = Some("--msg".to_string());
        input.command_line_separator = Some("=".to_string());

        let resolved = resolver
            .resolve(&[input], &values(&[("msg", "hello")]), &user())
            .await
            .unwrap();
        assert_eq!(resolved.values.get("#MSG#").map(String::as_str), Some("hello"));
        assert_eq!(
            resolved.command_line_values.get("#MSG#").map(String::as_str),
            Some("--msg=hello")
        );
    }

    #[tokio::test]
    async fn test_required_without_value_fails() {
        let (resolver, _, _) = resolver();
        let mut input = CommandInput::new("msg", InputType::String);
        input.required = true;

        let err = resolver.resolve(&[input], &HashMap::new(), &user()).await.unwrap_err();
        assert!(matches!(err, ResolutionError::InputResolution { .. }));
        assert!(err.to_string().contains("but is required"));
    }

    #[tokio::test]
    async fn test_absent_optional_renders_empty() {
        let (resolver, _, _) = resolver();
        let mut input = CommandInput::new("msg", InputType::String);
        input.replacement_key = Some("#MSG#".to_string());

        let resolved = resolver.resolve(&[input], &HashMap::new(), &user()).await.unwrap();
        assert_eq!(resolved.inputs[0].value, None);
        assert_eq!(resolved.command_line_values.get("#MSG#").map(String::as_str), Some(""));
    }

    #[tokio::test]
    async fn test_dependency_declared_later_fails() {
        let (resolver, _, _) = resolver();
        let mut scan = CommandInput::new("scan", InputType::Scan);
        scan.parent = Some("session".to_string());
        let inputs = vec![scan, CommandInput::new("session", InputType::Session)];

        let err = resolver.resolve(&inputs, &HashMap::new(), &user()).await.unwrap_err();
        match err {
            ResolutionError::InputOrdering { input, dependency } => {
                assert_eq!(input, "scan");
                assert_eq!(dependency, "session");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_prerequisite_declared_later_fails() {
        let (resolver, _, _) = resolver();
        let mut first = CommandInput::new("first", InputType::String);
        first.prerequisites = Some("other, second".to_string());
        let inputs = vec![
            CommandInput::new("other", InputType::String),
            first,
            CommandInput::new("second", InputType::String),
        ];

        let err = resolver.resolve(&inputs, &HashMap::new(), &user()).await.unwrap_err();
        match err {
            ResolutionError::InputOrdering { input, dependency } => {
                assert_eq!(input, "first");
                assert_eq!(dependency, "second");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_file_requires_parent() {
        let (resolver, _, _) = resolver();
        let inputs = vec![CommandInput::new("file", InputType::File)];
        let err = resolver
            .resolve(&inputs, &values(&[("file", "a")]), &user())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("must have a parent"));
    }

    #[tokio::test]
    async fn test_session_from_bare_id_uses_loader() {
        let (resolver, entities, _) = resolver();
        entities
            .insert(
                EntityType::Session,
                serde_json::from_str(r#"{"id": "E1", "label": "s1", "project-id": "p1"}"#).unwrap(),
            )
            .await;

        let inputs = vec![CommandInput::new("session", InputType::Session)];
        let resolved = resolver
            .resolve(&inputs, &values(&[("session", "E1")]), &user())
            .await
            .unwrap();

        let value: Value = serde_json::from_str(resolved.inputs[0].value.as_deref().unwrap()).unwrap();
        assert_eq!(value["label"], "s1");
    }

    #[tokio::test]
    async fn test_unknown_session_id_fails() {
        let (resolver, _, _) = resolver();
        let inputs = vec![CommandInput::new("session", InputType::Session)];
        let err = resolver
            .resolve(&inputs, &values(&[("session", "missing")]), &user())
            .await
            .unwrap_err();
        assert!(matches!(err, ResolutionError::InputResolution { .. }));
    }

    #[tokio::test]
    async fn test_session_list_picks_first_and_warns() {
        let (resolver, _, _) = resolver();
        let inputs = vec![CommandInput::new("session", InputType::Session)];
        let list = r#"[{"id": "E1"}, {"id": "E2"}]"#;

        let resolved = resolver
            .resolve(&inputs, &values(&[("session", list)]), &user())
            .await
            .unwrap();

        let value: Value = serde_json::from_str(resolved.inputs[0].value.as_deref().unwrap()).unwrap();
        assert_eq!(value["id"], "E1");
        assert_eq!(resolved.warnings.len(), 1);
    }

    #[tokio::test]
    async fn test_scan_with_numeric_id() {
        let (resolver, _, _) = resolver();
        let inputs = vec![CommandInput::new("scan", InputType::Scan)];

        let resolved = resolver
            .resolve(&inputs, &values(&[("scan", r#"{"id": 1, "resources": []}"#)]), &user())
            .await
            .unwrap();
        let value: Value = serde_json::from_str(resolved.inputs[0].value.as_deref().unwrap()).unwrap();
        assert_eq!(value["id"], 1);

        let list = r#"[{"id": 7}, {"id": 8}]"#;
        let resolved = resolver
            .resolve(&inputs, &values(&[("scan", list)]), &user())
            .await
            .unwrap();
        assert!(resolved.warnings[0].contains("first (7) of 2"));
    }

    #[tokio::test]
    async fn test_supplied_session_is_kept_verbatim() {
        let (resolver, _, _) = resolver();
        let inputs = vec![CommandInput::new("session", InputType::Session)];

        let resolved = resolver
            .resolve(
                &inputs,
                &values(&[("session", r#"{"id": "E1", "projectId": "p1"}"#)]),
                &user(),
            )
            .await
            .unwrap();
        assert_eq!(
            resolved.inputs[0].value.as_deref(),
            Some(r#"{"id":"E1","projectId":"p1"}"#)
        );
    }

    #[tokio::test]
    async fn test_malformed_session_object_fails() {
        let (resolver, _, _) = resolver();
        let inputs = vec![CommandInput::new("session", InputType::Session)];
        let err = resolver
            .resolve(&inputs, &values(&[("session", r#"{"label": "no id"}"#)]), &user())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Could not instantiate session"));
    }

    #[tokio::test]
    async fn test_scan_extracted_from_parent_session() {
        let (resolver, _, _) = resolver();
        let session = CommandInput::new("session", InputType::Session);
        let mut scan = CommandInput::new("scan", InputType::Scan);
        scan.parent = Some("session".to_string());

        let snapshot = r#"{"id": "E1", "scans": [{"id": "1", "type": "T1"}, {"id": "2", "type": "T2"}]}"#;
        let resolved = resolver
            .resolve(
                &[session, scan],
                &values(&[("session", snapshot), ("scan", "2")]),
                &user(),
            )
            .await
            .unwrap();

        let value: Value = serde_json::from_str(resolved.inputs[1].value.as_deref().unwrap()).unwrap();
        assert_eq!(value["type"], "T2");
    }

    #[tokio::test]
    async fn test_config_scoped_to_parent_project() {
        let (resolver, _, configs) = resolver();
        configs
            .insert("dcm2niix", "settings.json", ConfigScope::Project("p1".to_string()), "{\"a\":1}")
            .await;

        let session = CommandInput::new("session", InputType::Session);
        let mut config = CommandInput::new("settings", InputType::Config);
        config.parent = Some("session".to_string());
        config.value = Some("dcm2niix/settings.json".to_string());

        let resolved = resolver
            .resolve(
                &[session, config],
                &values(&[("session", r#"{"id": "E1", "projectId": "p1"}"#)]),
                &user(),
            )
            .await
            .unwrap();
        assert_eq!(resolved.inputs[1].value.as_deref(), Some("{\"a\":1}"));
    }

    #[tokio::test]
    async fn test_config_scoped_to_project_input_id() {
        let (resolver, _, configs) = resolver();
        configs
            .insert("tool", "cfg", ConfigScope::Project("p9".to_string()), "project")
            .await;
        configs.insert("tool", "cfg", ConfigScope::Site, "site").await;

        let project = CommandInput::new("project", InputType::Project);
        let mut config = CommandInput::new("settings", InputType::Config);
        config.parent = Some("project".to_string());
        config.value = Some("tool/cfg".to_string());

        let resolved = resolver
            .resolve(
                &[project, config],
                &values(&[("project", r#"{"id": "p9", "label": "Nine"}"#)]),
                &user(),
            )
            .await
            .unwrap();
        assert_eq!(resolved.inputs[1].value.as_deref(), Some("project"));
    }

    #[tokio::test]
    async fn test_config_with_non_entity_parent_uses_site_scope() {
        let (resolver, _, configs) = resolver();
        configs
            .insert("tool", "cfg", ConfigScope::Project("x".to_string()), "project")
            .await;
        configs.insert("tool", "cfg", ConfigScope::Site, "site").await;

        let mut name = CommandInput::new("name", InputType::String);
        name.default_value = Some("x".to_string());
        let mut config = CommandInput::new("settings", InputType::Config);
        config.parent = Some("name".to_string());
        config.value = Some("tool/cfg".to_string());

        let resolved = resolver
            .resolve(&[name, config], &HashMap::new(), &user())
            .await
            .unwrap();
        assert_eq!(resolved.inputs[1].value.as_deref(), Some("site"));
    }

    #[tokio::test]
    async fn test_config_without_project_fails() {
        let (resolver, _, _) = resolver();
        let session = CommandInput::new("session", InputType::Session);
        let mut config = CommandInput::new("settings", InputType::Config);
        config.parent = Some("session".to_string());
        config.value = Some("tool/file".to_string());

        let err = resolver
            .resolve(
                &[session, config],
                &values(&[("session", r#"{"id": "E1"}"#)]),
                &user(),
            )
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Could not determine project"));
    }

    #[tokio::test]
    async fn test_site_config_missing_fails() {
        let (resolver, _, _) = resolver();
        let mut config = CommandInput::new("settings", InputType::Config);
        config.value = Some("tool/file".to_string());

        let err = resolver.resolve(&[config], &HashMap::new(), &user()).await.unwrap_err();
        assert!(err.to_string().contains("Could not read config tool/file"));
    }
}
