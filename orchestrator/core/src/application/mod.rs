// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Application
//!
//! Use cases built on the domain ports: resolving command definitions and
//! preparing resolved commands for launch.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Resolution and launch services

pub mod command_resolution;
pub mod input_resolver;
pub mod launch_preparation;
pub mod launch_service;
pub mod mount_resolver;
pub mod value_extractor;
