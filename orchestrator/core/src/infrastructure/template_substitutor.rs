// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Template Substitutor
//!
//! Literal replacement of replacement keys (e.g. `#INPUT_FILE#`) in the
//! command line and the environment template map. Keys are plain text,
//! never patterns, so a key containing regex metacharacters is replaced
//! verbatim.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Turn command-line and environment templates into final strings

use std::collections::{BTreeMap, HashMap};

/// Replacement key to replacement text. Ordered so that substitution of
/// overlapping keys, which definitions should avoid, is at least repeatable.
pub type Substitutions = BTreeMap<String, String>;

/// Replace every occurrence of every key in `template`.
pub fn substitute(template: &str, values: &Substitutions) -> String {
    values
        .iter()
        .filter(|(key, _)| !key.is_empty())
        .fold(template.to_string(), |acc, (key, value)| {
            acc.replace(key.as_str(), value)
        })
}

/// Substitute into both keys and values of a template map.
pub fn substitute_map(
    templates: &HashMap<String, String>,
    values: &Substitutions,
) -> BTreeMap<String, String> {
    templates
        .iter()
        .map(|(key, value)| (substitute(key, values), substitute(value, values)))
        .collect()
}
