// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod command_parser;
pub mod config_store;
pub mod credentials;
pub mod entity_store;
pub mod json_path;
pub mod runtime;
pub mod staging;
pub mod template_substitutor;
pub mod transport;
