// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use std::sync::Arc;

use vigil_core::application::policy::{PolicyService, PolicyUpdateError, StandardPolicyService};
use vigil_core::domain::events::PolicyEvent;
use vigil_core::domain::policy::{PolicyId, PolicyUpdateRequest};
use vigil_core::domain::repository::PolicyRepository;
use vigil_core::domain::suppression::{ConstraintValidator, SuppressionLimits, ViolationKind};
use vigil_core::infrastructure::event_bus::{DomainEvent, EventBus};
use vigil_core::infrastructure::repositories::InMemoryPolicyRepository;

fn service() -> (StandardPolicyService, Arc<InMemoryPolicyRepository>, Arc<EventBus>) {
    let repository = Arc::new(InMemoryPolicyRepository::new());
    let event_bus = Arc::new(EventBus::with_default_capacity());
    let service = StandardPolicyService::new(ConstraintValidator::new(), repository.clone(), event_bus.clone());
    (service, repository, event_bus)
}

fn request(patterns: &[&str]) -> PolicyUpdateRequest {
    PolicyUpdateRequest {
        suppressions: patterns.iter().map(|p| p.to_string()).collect(),
        user_id: Some("user-42".to_string()),
    }
}

// ── Accepted updates ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_valid_update_creates_first_version() {
    let (service, _, event_bus) = service();
    let mut receiver = event_bus.subscribe();
    let id = PolicyId::new("AWS.S3.Bucket.Encryption");

    let policy = service
        .update_suppressions(id.clone(), request(&["arn:aws:s3:::logs", "arn:aws:s3:::tmp-*"]))
        .await
        .unwrap();

    assert_eq!(policy.version, 1);
    assert_eq!(policy.suppressions.len(), 2);
    assert_eq!(policy.updated_by.as_deref(), Some("user-42"));

    match receiver.try_recv().unwrap() {
        DomainEvent::Policy(PolicyEvent::SuppressionsUpdated { policy_id, version, suppression_count, .. }) => {
            assert_eq!(policy_id, id);
            assert_eq!(version, 1);
            assert_eq!(suppression_count, 2);
        }
        other => panic!("unexpected event: {:?}", other),
    }
}

#[tokio::test]
async fn test_successive_updates_append_versions() {
    let (service, repository, _) = service();
    let id = PolicyId::new("p");

    service.update_suppressions(id.clone(), request(&["a"])).await.unwrap();
    service.update_suppressions(id.clone(), request(&["a", "b"])).await.unwrap();
    let latest = service.update_suppressions(id.clone(), request(&[])).await.unwrap();

    assert_eq!(latest.version, 3);
    assert!(latest.suppressions.is_empty());

    let history = repository.history(&id).await.unwrap();
    assert_eq!(history.iter().map(|p| p.version).collect::<Vec<_>>(), vec![1, 2, 3]);
    assert_eq!(history[1].suppressions.as_slice(), &["a".to_string(), "b".to_string()]);
}

#[tokio::test]
async fn test_list_at_limits_is_accepted() {
    let (service, _, _) = service();
    let patterns: Vec<String> = (0..500).map(|i| format!("{:0>1000}", i)).collect();

    let policy = service
        .update_suppressions(
            PolicyId::new("p"),
            PolicyUpdateRequest {
                suppressions: patterns,
                user_id: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(policy.suppressions.len(), 500);
}

// ── Rejected updates ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_rejected_update_leaves_policy_untouched() {
    let (service, repository, event_bus) = service();
    let id = PolicyId::new("p");
    service.update_suppressions(id.clone(), request(&["keep"])).await.unwrap();

    let mut receiver = event_bus.subscribe();
    let err = service
        .update_suppressions(id.clone(), request(&["dup", "dup"]))
        .await
        .unwrap_err();

    match err {
        PolicyUpdateError::Rejected { policy_id, violations } => {
            assert_eq!(policy_id, id);
            assert_eq!(violations.len(), 1);
            assert_eq!(violations[0].kind, ViolationKind::DuplicateItem);
            assert_eq!(violations[0].index, Some(1));
        }
        other => panic!("unexpected error: {:?}", other),
    }

    let latest = service.get_policy(&id).await.unwrap().unwrap();
    assert_eq!(latest.version, 1);
    assert_eq!(latest.suppressions.as_slice(), &["keep".to_string()]);
    assert_eq!(repository.history(&id).await.unwrap().len(), 1);

    assert!(matches!(
        receiver.try_recv().unwrap(),
        DomainEvent::Policy(PolicyEvent::SuppressionsRejected { .. })
    ));
}

#[tokio::test]
async fn test_rejection_reports_every_violation() {
    let (service, _, _) = service();
    let mut patterns: Vec<String> = (0..501).map(|i| format!("pattern-{}", i)).collect();
    patterns[10] = "x".repeat(1001);
    patterns[20] = "pattern-0".to_string();

    let err = service
        .update_suppressions(
            PolicyId::new("p"),
            PolicyUpdateRequest {
                suppressions: patterns,
                user_id: None,
            },
        )
        .await
        .unwrap_err();

    let PolicyUpdateError::Rejected { violations, .. } = err else {
        panic!("expected rejection");
    };
    let kinds: Vec<ViolationKind> = violations.iter().map(|v| v.kind).collect();
    assert!(kinds.contains(&ViolationKind::TooManyItems));
    assert!(kinds.contains(&ViolationKind::DuplicateItem));
    assert!(kinds.contains(&ViolationKind::ItemTooLong));
    assert_eq!(violations.len(), 3);
}

#[tokio::test]
async fn test_custom_limits_apply() {
    let repository = Arc::new(InMemoryPolicyRepository::new());
    let validator = ConstraintValidator::with_limits(SuppressionLimits {
        max_items: 2,
        max_pattern_length: 8,
    });
    let service = StandardPolicyService::new(validator, repository, Arc::new(EventBus::with_default_capacity()));

    let err = service
        .update_suppressions(PolicyId::new("p"), request(&["a", "b", "c"]))
        .await
        .unwrap_err();
    assert!(matches!(err, PolicyUpdateError::Rejected { .. }));

    let ok = service
        .update_suppressions(PolicyId::new("p"), request(&["12345678"]))
        .await
        .unwrap();
    assert_eq!(ok.version, 1);
}

#[tokio::test]
async fn test_unknown_policy_has_no_version() {
    let (service, _, _) = service();
    assert!(service.get_policy(&PolicyId::new("missing")).await.unwrap().is_none());
}
