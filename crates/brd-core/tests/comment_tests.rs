use brd_comments::CommentFilter;
use brd_core::{BrdError, ErrorCategory, NotFoundKind, ValidationKind};
use brd_policy::DenyReason;
use brd_store::EntityStore;
use brd_test_utils::*;
use brd_types::{Caller, EntityKind, FieldType, GroupStatus, LifecycleState};
use pretty_assertions::assert_eq;
use serde_json::json;

async fn open(fx: &Fixture, caller: &Caller, key: &brd_types::CommentGroupKey) {
    fx.orchestrator
        .open_group(caller, key, GroupStatus::Pending)
        .await
        .unwrap();
}

#[tokio::test]
async fn oversight_is_excluded_from_discussion() {
    let fx = setup(LifecycleState::InProgress).await;
    let err = fx
        .orchestrator
        .open_group(&admin(), &summary_key(), GroupStatus::Pending)
        .await
        .unwrap_err();
    assert_eq!(err.deny_reason(), Some(DenyReason::OversightExcludedFromComments));

    let err = fx
        .orchestrator
        .list_comments(&admin(), &CommentFilter::for_document(DOC_ID))
        .await
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::AccessDenied);
    assert_eq!(fx.store.group_count(), 0);
}

#[tokio::test]
async fn denied_collaborators_leave_no_trace() {
    let fx = setup(LifecycleState::InProgress).await;
    let err = fx
        .orchestrator
        .open_group(&reviewer(), &summary_key(), GroupStatus::Pending)
        .await
        .unwrap_err();
    assert!(matches!(
        err.deny_reason(),
        Some(DenyReason::OutsideReviewWindow { .. })
    ));

    let err = fx
        .orchestrator
        .open_group(&other_pm(), &summary_key(), GroupStatus::Pending)
        .await
        .unwrap_err();
    assert!(matches!(err.deny_reason(), Some(DenyReason::NotAssigned { .. })));
    assert_eq!(fx.store.group_count(), 0);
}

#[tokio::test]
async fn creator_comments_in_any_state() {
    for state in LifecycleState::ALL {
        let fx = setup(state).await;
        open(&fx, &creator(), &summary_key()).await;
        fx.orchestrator
            .add_comment(&creator(), &summary_key(), "note", None)
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn reply_must_stay_in_group() {
    let fx = setup(LifecycleState::InProgress).await;
    open(&fx, &pm(), &summary_key()).await;
    open(&fx, &pm(), &budget_key()).await;
    let root = fx
        .orchestrator
        .add_comment(&pm(), &budget_key(), "root", None)
        .await
        .unwrap();

    let err = fx
        .orchestrator
        .add_comment(&pm(), &summary_key(), "reply", Some(root.id))
        .await
        .unwrap_err();
    assert!(matches!(err, BrdError::NotFound(NotFoundKind::ParentEntry(id)) if id == root.id));

    let reply = fx
        .orchestrator
        .add_comment(&creator(), &budget_key(), "reply", Some(root.id))
        .await
        .unwrap();
    assert_eq!(reply.parent, Some(root.id));
}

#[tokio::test]
async fn comment_on_missing_group() {
    let fx = setup(LifecycleState::InProgress).await;
    let err = fx
        .orchestrator
        .add_comment(&pm(), &summary_key(), "hello", None)
        .await
        .unwrap_err();
    assert!(matches!(err, BrdError::NotFound(NotFoundKind::Group(_))));
}

#[tokio::test]
async fn creator_promotes_staged_value() {
    let fx = setup(LifecycleState::InProgress).await;
    let key = budget_key();
    open(&fx, &pm(), &key).await;
    fx.orchestrator
        .stage_shadow_value(&pm(), &key, json!(1500), FieldType::Number)
        .await
        .unwrap();

    let promotion = fx
        .orchestrator
        .promote_shadow_value(&creator(), &key)
        .await
        .unwrap();
    assert_eq!(promotion.previous, Some(json!(1000)));
    assert_eq!(fx.store.read_field(&key.target()).await.unwrap(), Some(json!(1500)));

    let err = fx
        .orchestrator
        .promote_shadow_value(&creator(), &key)
        .await
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Conflict);
    assert!(err.is_retryable());
}

#[tokio::test]
async fn only_creator_promotes() {
    let fx = setup(LifecycleState::InProgress).await;
    let key = budget_key();
    open(&fx, &pm(), &key).await;
    fx.orchestrator
        .stage_shadow_value(&pm(), &key, json!(5), FieldType::Number)
        .await
        .unwrap();

    let err = fx.orchestrator.promote_shadow_value(&pm(), &key).await.unwrap_err();
    assert_eq!(err.deny_reason(), Some(DenyReason::CreatorOnly));

    let err = fx
        .orchestrator
        .promote_shadow_value(&other_ba(), &key)
        .await
        .unwrap_err();
    assert_eq!(err.deny_reason(), Some(DenyReason::NotDocumentCreator));
    assert_eq!(fx.store.read_field(&key.target()).await.unwrap(), Some(json!(1000)));
}

#[tokio::test]
async fn staged_value_validated_against_its_tag() {
    let fx = setup(LifecycleState::Draft).await;
    let key = site_date_key();
    open(&fx, &creator(), &key).await;
    let err = fx
        .orchestrator
        .stage_shadow_value(&creator(), &key, json!("soon"), FieldType::Date)
        .await
        .unwrap_err();
    assert_eq!(
        err.validation_kind(),
        Some(&ValidationKind::ValueTypeMismatch(FieldType::Date))
    );

    fx.orchestrator
        .stage_shadow_value(&creator(), &key, json!("2026-03-01"), FieldType::Date)
        .await
        .unwrap();
    fx.orchestrator
        .promote_shadow_value(&creator(), &key)
        .await
        .unwrap();
    assert_eq!(
        fx.store.read_field(&key.target()).await.unwrap(),
        Some(json!("2026-03-01"))
    );
}

#[tokio::test]
async fn read_receipts_and_unread_count() {
    let fx = setup(LifecycleState::InProgress).await;
    let key = summary_key();
    open(&fx, &creator(), &key).await;
    let entry = fx
        .orchestrator
        .add_comment(&creator(), &key, "look here", None)
        .await
        .unwrap();

    assert_eq!(fx.orchestrator.unread_count(&pm(), &fx.document_id()).await.unwrap(), 1);
    assert_eq!(fx.orchestrator.unread_count(&creator(), &fx.document_id()).await.unwrap(), 0);
    assert!(fx.orchestrator.mark_read(&pm(), &key, entry.id).await.unwrap());
    assert!(!fx.orchestrator.mark_read(&pm(), &key, entry.id).await.unwrap());
    assert_eq!(fx.orchestrator.unread_count(&pm(), &fx.document_id()).await.unwrap(), 0);
}

#[tokio::test]
async fn projections_and_status() {
    let fx = setup(LifecycleState::Draft).await;
    open(&fx, &creator(), &summary_key()).await;
    open(&fx, &creator(), &site_date_key()).await;
    fx.orchestrator
        .add_comment(&creator(), &site_date_key(), "slipping", None)
        .await
        .unwrap();
    fx.orchestrator
        .set_group_status(&creator(), &site_date_key(), GroupStatus::Resolved)
        .await
        .unwrap();

    let all = fx
        .orchestrator
        .list_comments(&creator(), &CommentFilter::for_document(DOC_ID))
        .await
        .unwrap();
    assert_eq!(all.len(), 2);

    let resolved = fx
        .orchestrator
        .list_comments(
            &creator(),
            &CommentFilter::for_document(DOC_ID).with_status(GroupStatus::Resolved),
        )
        .await
        .unwrap();
    assert_eq!(resolved.len(), 1);
    assert_eq!(resolved[0].key, site_date_key());

    let stats = fx
        .orchestrator
        .group_stats(&creator(), &fx.document_id(), GroupStatus::Resolved)
        .await
        .unwrap();
    assert_eq!((stats.group_count, stats.entry_count, stats.sub_entity_groups), (1, 1, 1));

    let documents = fx
        .orchestrator
        .groups_by_source(&creator(), &fx.document_id(), EntityKind::Document, None)
        .await
        .unwrap();
    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0].key, summary_key());
}

#[tokio::test]
async fn validation_failures_are_distinguishable() {
    let fx = setup(LifecycleState::InProgress).await;
    let key = summary_key();
    open(&fx, &pm(), &key).await;

    let err = fx
        .orchestrator
        .promote_shadow_value(&creator(), &key)
        .await
        .unwrap_err();
    assert_eq!(
        err.validation_kind(),
        Some(&ValidationKind::NoShadowValue(key.clone()))
    );

    let err = fx
        .orchestrator
        .add_comment(&pm(), &key, "   ", None)
        .await
        .unwrap_err();
    assert!(matches!(
        err.validation_kind(),
        Some(ValidationKind::InvalidText(_))
    ));

    for i in 0..5 {
        fx.orchestrator
            .add_comment(&pm(), &key, format!("pm {i}"), None)
            .await
            .unwrap();
    }
    let err = fx
        .orchestrator
        .add_comment(&pm(), &key, "sixth", None)
        .await
        .unwrap_err();
    assert_eq!(
        err.validation_kind(),
        Some(&ValidationKind::LimitExceeded {
            user_type: brd_types::UserType::Pm,
            limit: 5,
        })
    );
}
