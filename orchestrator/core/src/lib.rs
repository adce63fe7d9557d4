// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Vigil core
//!
//! Monitoring deployment orchestration and suppression-list validation.
//!
//! # Architecture
//!
//! - **domain:** value types, validation rules and the ports generators and
//!   appliers implement
//! - **application:** use cases sequencing the domain ports
//! - **infrastructure:** file generators, the aws CLI applier, the event bus
//!   and in-memory persistence

pub mod domain;
pub mod application;
pub mod infrastructure;

pub use domain::*;
