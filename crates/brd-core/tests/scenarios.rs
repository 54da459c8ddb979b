use brd_assignment::{ItemFailure, ItemResult, ReassignItem, ReassignStatus};
use brd_core::{ErrorCategory, ValidationKind};
use brd_policy::DenyReason;
use brd_store::CommentStore;
use brd_test_utils::*;
use brd_types::{CollaboratorKind, Document, GroupStatus, LifecycleState, UserType};
use pretty_assertions::assert_eq;

#[tokio::test]
async fn scenario_a_assigned_reviewer_comments_in_internal_review() {
    let fx = setup(LifecycleState::InternalReview).await;
    let key = summary_key();
    fx.orchestrator
        .open_group(&creator(), &key, GroupStatus::Resolved)
        .await
        .unwrap();

    let entry = fx
        .orchestrator
        .add_comment(&reviewer(), &key, "please expand", None)
        .await
        .unwrap();
    assert_eq!(entry.user_type, UserType::Reviewer);

    let group = fx.orchestrator.get_group(&reviewer(), &key).await.unwrap();
    assert_eq!(group.status, GroupStatus::Resolved);
    assert_eq!(group.entries.len(), 1);
}

#[tokio::test]
async fn scenario_b_submitted_document_never_moves() {
    let fx = setup(LifecycleState::Submitted).await;
    for target in LifecycleState::ALL {
        let err = fx
            .orchestrator
            .transition(&creator(), &fx.document_id(), target)
            .await
            .unwrap_err();
        assert_eq!(err.deny_reason(), Some(DenyReason::AlreadySubmitted));
        assert!(err.to_string().contains("already submitted"));
    }
    assert_eq!(fx.state(), LifecycleState::Submitted);
}

#[tokio::test]
async fn scenario_c_bulk_reassign_reports_each_item() {
    let fx = setup(LifecycleState::InProgress).await;
    fx.store
        .insert_document(Document::new("doc1", LifecycleState::InProgress, CREATOR));
    fx.store
        .insert_document(Document::new("doc2", LifecycleState::InProgress, CREATOR));

    let response = fx
        .orchestrator
        .bulk_reassign(vec![
            ReassignItem::new("doc1", OTHER_PM),
            ReassignItem::new("doc2", OTHER_BA),
        ])
        .await;

    assert_eq!(response.status, ReassignStatus::Failure);
    assert_eq!(response.items[0].result, ItemResult::Success);
    assert_eq!(
        response.items[1].result,
        ItemResult::Failed(ItemFailure::RoleNotHeld {
            kind: CollaboratorKind::ProjectManager
        })
    );
    assert_eq!(response.items[1].result.to_string(), "FAILED(not a PM)");
}

#[tokio::test]
async fn scenario_d_sixth_ba_comment_rejected() {
    let fx = setup(LifecycleState::Draft).await;
    let key = summary_key();
    fx.orchestrator
        .open_group(&creator(), &key, GroupStatus::Pending)
        .await
        .unwrap();
    for i in 0..5 {
        fx.orchestrator
            .add_comment(&creator(), &key, format!("note {i}"), None)
            .await
            .unwrap();
    }

    let err = fx
        .orchestrator
        .add_comment(&creator(), &key, "one too many", None)
        .await
        .unwrap_err();
    assert_eq!(
        err.validation_kind(),
        Some(&ValidationKind::LimitExceeded {
            user_type: UserType::Ba,
            limit: 5,
        })
    );

    let group = fx.store.get_group(&key).await.unwrap().unwrap();
    assert_eq!(group.count_for(UserType::Ba), 5);
    assert_eq!(group.entries.len(), 5);
}

#[tokio::test]
async fn fifth_comment_succeeds_and_is_retrievable() {
    let fx = setup(LifecycleState::InProgress).await;
    let key = budget_key();
    fx.orchestrator
        .open_group(&pm(), &key, GroupStatus::Pending)
        .await
        .unwrap();
    let mut last = None;
    for i in 0..5 {
        last = Some(
            fx.orchestrator
                .add_comment(&pm(), &key, format!("pm note {i}"), None)
                .await
                .unwrap(),
        );
    }
    let last = last.unwrap();
    let group = fx.orchestrator.get_group(&pm(), &key).await.unwrap();
    assert_eq!(group.entry(last.id).map(|e| e.text.as_str()), Some("pm note 4"));
}

#[tokio::test]
async fn type_mismatch_leaves_entity_unchanged() {
    use brd_store::EntityStore;
    use brd_types::FieldType;
    use serde_json::json;

    let fx = setup(LifecycleState::InProgress).await;
    let key = budget_key();
    fx.orchestrator
        .open_group(&pm(), &key, GroupStatus::Pending)
        .await
        .unwrap();
    fx.orchestrator
        .stage_shadow_value(&pm(), &key, json!("about a million"), FieldType::Text)
        .await
        .unwrap();

    let err = fx
        .orchestrator
        .promote_shadow_value(&creator(), &key)
        .await
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Validation);
    assert_eq!(
        err.validation_kind(),
        Some(&ValidationKind::TypeMismatch {
            expected: FieldType::Number,
            staged: FieldType::Text,
        })
    );
    assert_eq!(
        fx.store.read_field(&key.target()).await.unwrap(),
        Some(json!(1000))
    );
}
