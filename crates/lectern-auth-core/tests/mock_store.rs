//! Behaviour of the in-memory store that the other suites rely on

mod common;

use chrono::{Duration, Utc};
use common::MockStore;
use lectern_db::{
    ClaimSeat, CourseGrantRepository, CreateRotationToken, DbError, RosterRepository,
    RosterUpsert, RotationTokenRepository, Store, UpsertRosterRecord,
};
use lectern_types::{BatchId, CourseId, Role};
use uuid::Uuid;

#[tokio::test]
async fn test_revoke_if_active_has_one_winner() {
    let store = MockStore::new();
    let user = store.add_user("a@uni.edu", None, Role::Student);
    let token = store
        .rotation_tokens()
        .create(CreateRotationToken {
            id: Uuid::new_v4(),
            user_id: user.id,
            token_hash: "hash".to_string(),
            expires_at: Utc::now() + Duration::days(1),
        })
        .await
        .unwrap();

    assert!(store.rotation_tokens().revoke_if_active(token.id).await.unwrap());
    assert!(!store.rotation_tokens().revoke_if_active(token.id).await.unwrap());
}

#[tokio::test]
async fn test_upsert_leaves_claimed_seat_alone() {
    let store = MockStore::new();
    let org = store.add_organization("Uni", "uni.edu");
    let user = store.add_user("a@uni.edu", None, Role::Student);
    let seat = store.add_roster_record(org, "a@uni.edu", "CODE-1", None);

    store
        .roster()
        .claim_seat(ClaimSeat {
            roster_record_id: seat,
            user_id: user.id,
            organization_id: org.0,
            batch_id: None,
        })
        .await
        .unwrap()
        .unwrap();

    let outcome = store
        .roster()
        .upsert_unclaimed(UpsertRosterRecord {
            id: Uuid::new_v4(),
            organization_id: org.0,
            email: "a@uni.edu".to_string(),
            full_name: "Renamed".to_string(),
            enrollment_code: "CODE-2".to_string(),
            batch_id: None,
        })
        .await
        .unwrap();

    assert_eq!(outcome, RosterUpsert::AlreadyClaimed);
    assert_eq!(store.roster_record(seat).enrollment_code, "CODE-1");
}

#[tokio::test]
async fn test_roster_batch_must_share_the_organization() {
    let store = MockStore::new();
    let org = store.add_organization("Uni", "uni.edu");
    let other = store.add_organization("College", "college.edu");
    let foreign = store.add_batch(other);

    let err = store
        .roster()
        .upsert_unclaimed(UpsertRosterRecord {
            id: Uuid::new_v4(),
            organization_id: org.0,
            email: "a@uni.edu".to_string(),
            full_name: "Ada".to_string(),
            enrollment_code: "CODE".to_string(),
            batch_id: Some(foreign.0),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, DbError::NotFound));
}

#[tokio::test]
async fn test_grants_reference_existing_rows() {
    let store = MockStore::new();
    let org = store.add_organization("Uni", "uni.edu");
    let batch = store.add_batch(org);
    let missing_course = CourseId::new();

    let err = store
        .grants()
        .grant_to_organization(org.0, missing_course.0)
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::NotFound));

    let course = store.add_course(true);
    let err = store
        .grants()
        .grant_to_batch(BatchId::new().0, course.0)
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::NotFound));

    assert!(store.grants().grant_to_batch(batch.0, course.0).await.unwrap());
}
