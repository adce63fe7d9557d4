// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain layer
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Value types, invariants and ports

pub mod deploy_config;
pub mod deployment;
pub mod events;
pub mod monitoring;
pub mod policy;
pub mod repository;
pub mod suppression;
