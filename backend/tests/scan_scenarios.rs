//! End-to-end scan scenarios over the in-memory store.

use std::time::Duration;

use courier::domain::{Actor, AreaId, ErrorCode, PackageState, Role, ScanAction};
use courier::test_support::fixtures::{actor_with_role, package_between, package_in_state};
use rstest::{fixture, rstest};
use serde_json::json;
use tokio::runtime::Builder;
use tokio::time::timeout;

mod support;

use support::{ScanWorld, bulk, scan};

struct Route {
    a1: AreaId,
    a2: AreaId,
}

#[fixture]
fn route() -> Route {
    Route {
        a1: AreaId::random(),
        a2: AreaId::random(),
    }
}

#[rstest]
#[tokio::test]
async fn rider_in_origin_area_collects_a_submitted_package(route: Route) {
    let mut world = ScanWorld::new();
    let rider = world.enrol(actor_with_role(Role::Rider), [route.a1]);
    world.store.insert(package_between(
        "PKG-001",
        PackageState::Submitted,
        route.a1,
        route.a2,
    ));

    let outcome = world
        .service
        .scan(scan(&rider, "PKG-001", "collect"))
        .await
        .expect("collect succeeds");

    assert_eq!(outcome.from_state, PackageState::Submitted);
    assert_eq!(outcome.to_state, PackageState::InTransit);
    let events = world.store.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type.as_str(), "collected_by_rider");
    assert_eq!(events[0].actor_user_id, rider.id);
    let notified = timeout(Duration::from_secs(1), world.notifications.recv())
        .await
        .expect("notification arrives")
        .expect("channel open");
    assert_eq!(notified.id, outcome.event_id);
}

#[rstest]
#[tokio::test]
async fn agent_cannot_deliver(route: Route) {
    let world = ScanWorld::new();
    let agent = world.enrol(actor_with_role(Role::Agent), [route.a1, route.a2]);
    world.store.insert(package_between(
        "PKG-001",
        PackageState::InTransit,
        route.a1,
        route.a2,
    ));

    let err = world
        .service
        .scan(scan(&agent, "PKG-001", "deliver"))
        .await
        .expect_err("agents do not deliver");

    assert_eq!(err.code(), ErrorCode::Unauthorized);
    assert_eq!(
        world.store.package("PKG-001").map(|package| package.state),
        Some(PackageState::InTransit)
    );
}

#[rstest]
#[tokio::test]
async fn collecting_a_pending_package_reports_allowed_states(route: Route) {
    let world = ScanWorld::new();
    let rider = world.enrol(actor_with_role(Role::Rider), [route.a1]);
    world.store.insert(package_between(
        "PKG-002",
        PackageState::Pending,
        route.a1,
        route.a2,
    ));

    let err = world
        .service
        .scan(scan(&rider, "PKG-002", "collect"))
        .await
        .expect_err("pending packages cannot be collected");

    assert_eq!(err.code(), ErrorCode::InvalidStateTransition);
    let details = err.details().expect("details present");
    assert_eq!(details["allowedStates"], json!(["submitted"]));
    assert_eq!(details["currentState"], "pending");
    assert!(world.store.events().is_empty());
}

#[rstest]
#[tokio::test]
async fn owner_confirms_receipt_of_a_delivered_package() {
    let world = ScanWorld::new();
    let package = package_in_state("PKG-003", PackageState::Delivered);
    let owner = world.enrol(Actor::new(package.owner_user_id.clone(), Role::Client), []);
    world.store.insert(package);

    let outcome = world
        .service
        .scan(scan(&owner, "PKG-003", ScanAction::ConfirmReceipt.as_str()))
        .await
        .expect("owner may confirm");

    assert_eq!(outcome.to_state, PackageState::Collected);
    assert_eq!(outcome.event_type.as_str(), "confirmed_by_receiver");
    assert_eq!(
        world.store.package("PKG-003").map(|package| package.state),
        Some(PackageState::Collected)
    );
}

#[rstest]
#[tokio::test]
async fn bulk_collect_reports_each_code_in_order(route: Route) {
    let world = ScanWorld::new();
    let rider = world.enrol(actor_with_role(Role::Rider), [route.a1]);
    world.store.insert(package_between(
        "PKG-004",
        PackageState::Submitted,
        route.a1,
        route.a2,
    ));
    world.store.insert(package_between(
        "PKG-006",
        PackageState::Delivered,
        route.a1,
        route.a2,
    ));

    let response = world
        .service
        .scan_many(bulk(&rider, &["PKG-004", "PKG-005", "PKG-006"], "collect"))
        .await
        .expect("request is well formed");

    let codes: Vec<_> = response.results.iter().map(|item| item.code.as_str()).collect();
    assert_eq!(codes, ["PKG-004", "PKG-005", "PKG-006"]);
    assert!(response.results[0].success);
    assert_eq!(response.results[1].error_code, Some(ErrorCode::NotFound));
    assert_eq!(
        response.results[2].error_code,
        Some(ErrorCode::InvalidStateTransition)
    );
    assert_eq!(response.summary.total, 3);
    assert_eq!(response.summary.successful, 1);
}

#[rstest]
fn notifications_land_before_a_current_thread_runtime_is_dropped(route: Route) {
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("runtime builds");
    let mut world = ScanWorld::new();
    let rider = world.enrol(actor_with_role(Role::Rider), [route.a1]);
    world.store.insert(package_between(
        "PKG-007",
        PackageState::Submitted,
        route.a1,
        route.a2,
    ));

    let outcome = runtime.block_on(async {
        let outcome = world
            .service
            .scan(scan(&rider, "PKG-007", "collect"))
            .await
            .expect("collect succeeds");
        world.service.flush_notifications().await;
        outcome
    });
    drop(runtime);

    let notified = world
        .notifications
        .try_recv()
        .expect("committed transition was announced");
    assert_eq!(notified.id, outcome.event_id);
}
