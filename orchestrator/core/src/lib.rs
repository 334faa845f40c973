// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Lib
//!
//! Resolves parameterized container command definitions into launch-ready
//! commands and prepares them for execution on a container host.
//!
//! # Architecture
//!
//! - **Layer:** Core System
//! - **Purpose:** Crate root; re-exports the domain layer

pub mod domain;
pub mod application;
pub mod infrastructure;

pub use domain::*;
