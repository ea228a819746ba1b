//! Enrollment fan-out integration tests

mod common;

use common::MockStore;
use lectern_auth_core::{AuthError, EnrollmentFanout, EntitlementResolver, FanoutScope};
use lectern_db::{EnrollmentRepository, Store};
use lectern_types::{AccessSource, BatchId, CourseId, OrgRole, Role};
use std::sync::Arc;

fn fanout(store: &MockStore) -> EnrollmentFanout<MockStore> {
    EnrollmentFanout::new(Arc::new(store.clone()))
}

#[tokio::test]
async fn test_fanout_is_idempotent_and_preserves_progress() {
    let store = MockStore::new();
    let org = store.add_organization("Uni", "uni.edu");
    let course = store.add_course(true);
    let members: Vec<_> = (0..3)
        .map(|i| {
            let user = store.add_user(&format!("m{i}@uni.edu"), None, Role::Student);
            store.add_membership(user.user_id(), org, None, OrgRole::Student, true, true);
            user
        })
        .collect();
    let fanout = fanout(&store);

    let first = fanout
        .fan_out(FanoutScope::Organization(org), Some(course))
        .await
        .unwrap();
    assert_eq!(first.created, 3);

    store.record_progress(members[0].user_id(), course, 4, 40);

    let second = fanout
        .fan_out(FanoutScope::Organization(org), Some(course))
        .await
        .unwrap();
    assert_eq!(second.targeted, 3);
    assert_eq!(second.created, 0);
    assert_eq!(store.enrollment_count(), 3);

    let kept = store.enrollment(members[0].user_id(), course).unwrap();
    assert_eq!(kept.completed_lessons, 4);
    assert_eq!(kept.progress_percent, 40);
    assert_eq!(kept.access_source().unwrap(), AccessSource::Institutional);
}

#[tokio::test]
async fn test_fanout_skips_unverified_and_inactive_members() {
    let store = MockStore::new();
    let org = store.add_organization("Uni", "uni.edu");
    let course = store.add_course(true);
    let verified = store.add_user("v@uni.edu", None, Role::Student);
    let pending = store.add_user("p@uni.edu", None, Role::Student);
    let departed = store.add_user("d@uni.edu", None, Role::Student);
    store.add_membership(verified.user_id(), org, None, OrgRole::Student, true, true);
    store.add_membership(pending.user_id(), org, None, OrgRole::Student, false, true);
    store.add_membership(departed.user_id(), org, None, OrgRole::Student, true, false);

    let report = fanout(&store)
        .fan_out(FanoutScope::Organization(org), Some(course))
        .await
        .unwrap();

    assert_eq!(report.created, 1);
    assert!(store.enrollment(verified.user_id(), course).is_some());
    assert!(store.enrollment(pending.user_id(), course).is_none());
    assert!(store.enrollment(departed.user_id(), course).is_none());
}

#[tokio::test]
async fn test_batch_grant_reaches_only_batch_members() {
    let store = MockStore::new();
    let org = store.add_organization("Uni", "uni.edu");
    let batch = store.add_batch(org);
    let course = store.add_course(true);
    let in_batch = store.add_user("in@uni.edu", None, Role::Student);
    let elsewhere = store.add_user("out@uni.edu", None, Role::Student);
    store.add_membership(in_batch.user_id(), org, Some(batch), OrgRole::Student, true, true);
    store.add_membership(elsewhere.user_id(), org, None, OrgRole::Student, true, true);

    let report = fanout(&store).grant_batch_course(batch, course).await.unwrap();

    assert_eq!(report.created, 1);
    assert!(store.enrollment(in_batch.user_id(), course).is_some());
    assert!(store.enrollment(elsewhere.user_id(), course).is_none());
}

#[tokio::test]
async fn test_scenario_c_revoking_grant_keeps_enrollments() {
    let store = MockStore::new();
    let org = store.add_organization("Uni", "uni.edu");
    let course = store.add_course(true);
    let member = store.add_user("kept@uni.edu", None, Role::Student);
    store.add_membership(member.user_id(), org, None, OrgRole::Student, true, true);
    let fanout = fanout(&store);

    fanout.grant_org_course(org, course).await.unwrap();
    assert!(fanout.revoke_org_course(org, course).await.unwrap());
    assert!(!fanout.revoke_org_course(org, course).await.unwrap());

    assert!(store.enrollment(member.user_id(), course).is_some());
    // Drop the membership path so only the materialized row can grant.
    store.add_membership(member.user_id(), org, None, OrgRole::Student, true, false);
    let decision = EntitlementResolver::new(Arc::new(store.clone()))
        .can_access_course(member.user_id(), course)
        .await
        .unwrap();
    assert!(decision.is_granted());
}

#[tokio::test]
async fn test_partial_failure_is_reported_and_retry_completes() {
    let store = MockStore::new();
    let org = store.add_organization("Uni", "uni.edu");
    let healthy = store.add_course(true);
    let flaky = store.add_course(true);
    store.grant_org_course(org, healthy);
    store.grant_org_course(org, flaky);
    for i in 0..2 {
        let user = store.add_user(&format!("p{i}@uni.edu"), None, Role::Student);
        store.add_membership(user.user_id(), org, None, OrgRole::Student, true, true);
    }
    let fanout = fanout(&store);

    store.fail_enrollments_for(flaky);
    let partial = fanout
        .fan_out(FanoutScope::Organization(org), None)
        .await
        .unwrap();
    assert_eq!(partial.targeted, 4);
    assert_eq!(partial.created, 2);
    assert_eq!(partial.failed, 2);
    assert!(!partial.is_complete());

    store.heal_enrollments_for(flaky);
    let retry = fanout
        .fan_out(FanoutScope::Organization(org), None)
        .await
        .unwrap();
    assert!(retry.is_complete());
    assert_eq!(retry.created, 2);
    assert_eq!(store.enrollment_count(), 4);
}

#[tokio::test]
async fn test_subscription_enrolls_published_catalog_individually() {
    let store = MockStore::new();
    let user = store.add_user("sub@uni.edu", None, Role::Student);
    let published = [store.add_course(true), store.add_course(true)];
    let draft = store.add_course(false);

    let report = fanout(&store)
        .activate_subscription(user.user_id())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(report.created, 2);
    assert!(store.user(user.user_id()).premium);
    for course in published {
        let row = store.enrollment(user.user_id(), course).unwrap();
        assert_eq!(row.access_source().unwrap(), AccessSource::Individual);
    }
    assert!(store.enrollment(user.user_id(), draft).is_none());
}

#[tokio::test]
async fn test_subscription_fanout_failure_keeps_premium() {
    let store = MockStore::new();
    let user = store.add_user("paid@uni.edu", None, Role::Student);
    let course = store.add_course(true);
    store.fail_enrollments_for(course);

    let report = fanout(&store)
        .activate_subscription(user.user_id())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(report.failed, 1);
    assert!(store.user(user.user_id()).premium);
}

#[tokio::test]
async fn test_existing_enrollment_keeps_its_source() {
    let store = MockStore::new();
    let org = store.add_organization("Uni", "uni.edu");
    let course = store.add_course(true);
    let buyer = store.add_user("buyer@uni.edu", None, Role::Student);
    store.add_membership(buyer.user_id(), org, None, OrgRole::Student, true, true);
    store
        .enrollments()
        .insert_if_absent(buyer.id, course.0, AccessSource::Individual.as_str())
        .await
        .unwrap();

    fanout(&store).grant_org_course(org, course).await.unwrap();

    let row = store.enrollment(buyer.user_id(), course).unwrap();
    assert_eq!(row.access_source().unwrap(), AccessSource::Individual);
}

#[tokio::test]
async fn test_batch_must_belong_to_organization() {
    let store = MockStore::new();
    let org = store.add_organization("Uni", "uni.edu");
    let other = store.add_organization("College", "college.edu");
    let batch = store.add_batch(org);
    let fanout = fanout(&store);

    assert_eq!(fanout.batch_in_organization(org, batch).await.unwrap(), batch);
    let err = fanout.batch_in_organization(other, batch).await.unwrap_err();
    assert!(matches!(err, AuthError::NotFound));
    let err = fanout
        .batch_in_organization(org, BatchId::new())
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::NotFound));
}

#[tokio::test]
async fn test_grant_naming_missing_rows_is_not_found() {
    let store = MockStore::new();
    let org = store.add_organization("Uni", "uni.edu");
    let member = store.add_user("member@uni.edu", None, Role::Student);
    store.add_membership(member.user_id(), org, None, OrgRole::Student, true, true);
    let course = store.add_course(true);
    let fanout = fanout(&store);

    let err = fanout
        .grant_org_course(org, CourseId::new())
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::NotFound));
    assert_eq!(err.status_code(), 404);

    let err = fanout
        .grant_batch_course(BatchId::new(), course)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::NotFound));
    assert_eq!(store.enrollment_count(), 0);
}
