// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod artifacts;
pub mod event_bus;
pub mod repositories;
pub mod stack_outputs;
pub mod template_applier;

pub use artifacts::{FileAlarmGenerator, FileDashboardGenerator, FileMetricGenerator};
pub use template_applier::{CloudFormationCliApplier, DryRunTemplateApplier};
