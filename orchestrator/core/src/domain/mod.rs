// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain
//!
//! Command definitions, resolved commands, entity snapshots and the ports
//! through which the engine reaches its collaborators.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Value objects, collaborator traits and domain errors

pub mod command;
pub mod config_store;
pub mod credentials;
pub mod entity;
pub mod errors;
pub mod launch_config;
pub mod path_sanitizer;
pub mod resolved;
pub mod runtime;
pub mod transport;
pub mod user;
