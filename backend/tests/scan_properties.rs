//! Property checks for the scan service over the in-memory store.
//!
//! Each test sweeps a whole rule space (every action, state, or role) rather
//! than a single example, so a gap in the tables shows up as a failure here.

use std::sync::Arc;

use courier::domain::transitions::allowed_states;
use courier::domain::{AreaId, ErrorCode, PackageState, Role, ScanAction};
use courier::test_support::fixtures::{actor_with_role, package_between, package_in_state};
use rstest::rstest;
use tokio::sync::Barrier;

mod support;

use support::{ScanWorld, bulk, scan};

fn permitted(role: Role, action: ScanAction) -> bool {
    match action {
        ScanAction::Collect => matches!(role, Role::Agent | Role::Rider),
        ScanAction::Deliver => role == Role::Rider,
        ScanAction::Print => matches!(role, Role::Agent | Role::Rider | Role::Warehouse),
        ScanAction::Process => role == Role::Warehouse,
        ScanAction::ConfirmReceipt | ScanAction::Reject | ScanAction::Resubmit => false,
    }
}

#[rstest]
#[tokio::test]
async fn pairs_outside_the_table_leave_the_package_untouched() {
    let mut world = ScanWorld::new();
    let admin = world.enrol(actor_with_role(Role::Admin), []);

    for action in ScanAction::ALL {
        for state in PackageState::ALL {
            if allowed_states(action).contains(&state) {
                continue;
            }
            let code = format!("PKG-{action}-{state}");
            world.store.insert(package_in_state(&code, state));

            let err = world
                .service
                .scan(scan(&admin, &code, action.as_str()))
                .await
                .expect_err("pair outside the table");

            assert_eq!(err.code(), ErrorCode::InvalidStateTransition, "{action} from {state}");
            let stored = world.store.package(&code).expect("package stored");
            assert_eq!(stored.state, state);
            assert_eq!(stored.version, 1);
        }
    }

    assert!(world.store.events().is_empty());
    assert_eq!(world.store.apply_calls(), 0);
    assert!(world.notifications.try_recv().is_err());
}

#[rstest]
#[tokio::test]
async fn only_listed_role_action_pairs_are_allowed() {
    let world = ScanWorld::new();
    let (origin, destination) = (AreaId::random(), AreaId::random());

    for role in Role::ALL.into_iter().filter(|role| *role != Role::Admin) {
        let actor = world.enrol(actor_with_role(role), [origin, destination]);
        for action in ScanAction::ALL {
            let state = allowed_states(action)
                .first()
                .copied()
                .expect("every action has an entry state");
            let code = format!("PKG-{role}-{action}");
            world
                .store
                .insert(package_between(&code, state, origin, destination));

            let result = world.service.scan(scan(&actor, &code, action.as_str())).await;

            if permitted(role, action) {
                assert!(result.is_ok(), "{role} should be able to {action}: {result:?}");
            } else {
                let err = result.expect_err("pair is not in the rule list");
                assert_eq!(err.code(), ErrorCode::Unauthorized, "{role} / {action}");
            }
        }
    }
}

#[rstest]
#[case(ScanAction::Collect, PackageState::Submitted, PackageState::InTransit, 2)]
#[case(ScanAction::Print, PackageState::Submitted, PackageState::Submitted, 1)]
#[tokio::test]
async fn a_successful_scan_writes_once(
    #[case] action: ScanAction,
    #[case] from: PackageState,
    #[case] to: PackageState,
    #[case] version: u32,
) {
    let world = ScanWorld::new();
    let area = AreaId::random();
    let rider = world.enrol(actor_with_role(Role::Rider), [area]);
    world
        .store
        .insert(package_between("PKG-ONE", from, area, AreaId::random()));

    let outcome = world
        .service
        .scan(scan(&rider, "PKG-ONE", action.as_str()))
        .await
        .expect("scan succeeds");

    assert_eq!(outcome.version, version);
    let events = world.store.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].id, outcome.event_id);
    assert_eq!((events[0].from_state, events[0].to_state), (from, to));
    let stored = world.store.package("PKG-ONE").expect("package stored");
    assert_eq!((stored.state, stored.version), (to, version));
}

#[rstest]
#[tokio::test]
async fn repeating_an_applied_action_is_rejected_without_a_second_event() {
    let world = ScanWorld::new();
    let area = AreaId::random();
    let rider = world.enrol(actor_with_role(Role::Rider), [area]);
    world.store.insert(package_between(
        "PKG-TWICE",
        PackageState::Submitted,
        area,
        AreaId::random(),
    ));

    world
        .service
        .scan(scan(&rider, "PKG-TWICE", "collect"))
        .await
        .expect("first collect succeeds");
    let err = world
        .service
        .scan(scan(&rider, "PKG-TWICE", "collect"))
        .await
        .expect_err("second collect is stale");

    assert_eq!(err.code(), ErrorCode::InvalidStateTransition);
    assert_eq!(world.store.events().len(), 1);
    let stored = world.store.package("PKG-TWICE").expect("package stored");
    assert_eq!((stored.state, stored.version), (PackageState::InTransit, 2));
}

#[rstest]
#[tokio::test]
async fn bulk_failures_do_not_touch_sibling_items() {
    let world = ScanWorld::new();
    let area = AreaId::random();
    let rider = world.enrol(actor_with_role(Role::Rider), [area]);
    for code in ["PKG-B1", "PKG-B3", "PKG-B5"] {
        world.store.insert(package_between(
            code,
            PackageState::Submitted,
            area,
            AreaId::random(),
        ));
    }
    world.store.insert(package_between(
        "PKG-B4",
        PackageState::Pending,
        area,
        AreaId::random(),
    ));

    let response = world
        .service
        .scan_many(bulk(
            &rider,
            &["PKG-B1", "PKG-B2", "PKG-B3", "PKG-B4", "PKG-B5"],
            "collect",
        ))
        .await
        .expect("request is well formed");

    assert_eq!(response.summary.total, 5);
    assert_eq!(response.summary.failed, 2);
    assert_eq!(response.summary.successful, 3);
    assert!((response.summary.success_rate - 60.0).abs() < f64::EPSILON);
    let outcomes: Vec<_> = response
        .results
        .iter()
        .map(|item| (item.code.as_str(), item.success, item.error_code))
        .collect();
    assert_eq!(
        outcomes,
        vec![
            ("PKG-B1", true, None),
            ("PKG-B2", false, Some(ErrorCode::NotFound)),
            ("PKG-B3", true, None),
            ("PKG-B4", false, Some(ErrorCode::InvalidStateTransition)),
            ("PKG-B5", true, None),
        ]
    );
    for code in ["PKG-B1", "PKG-B3", "PKG-B5"] {
        let stored = world.store.package(code).expect("package stored");
        assert_eq!(stored.state, PackageState::InTransit);
    }
    assert_eq!(world.store.events().len(), 3);
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_scans_apply_exactly_one_transition() {
    let world = ScanWorld::new();
    let area = AreaId::random();
    let rider = world.enrol(actor_with_role(Role::Rider), [area]);
    let agent = world.enrol(actor_with_role(Role::Agent), [area]);
    world.store.insert(package_between(
        "PKG-RACE",
        PackageState::Submitted,
        area,
        AreaId::random(),
    ));
    world.store.gate_writes(Arc::new(Barrier::new(2)), 2);

    let (first, second) = tokio::join!(
        world.service.scan(scan(&rider, "PKG-RACE", "collect")),
        world.service.scan(scan(&agent, "PKG-RACE", "collect")),
    );

    let (winner, loser) = match (first, second) {
        (Ok(winner), Err(loser)) | (Err(loser), Ok(winner)) => (winner, loser),
        other => panic!("expected exactly one success, got {other:?}"),
    };
    assert_eq!(winner.to_state, PackageState::InTransit);
    assert!(
        matches!(
            loser.code(),
            ErrorCode::Conflict | ErrorCode::InvalidStateTransition
        ),
        "unexpected loser error {loser:?}"
    );
    assert_eq!(world.store.events().len(), 1);
    let stored = world.store.package("PKG-RACE").expect("package stored");
    assert_eq!((stored.state, stored.version), (PackageState::InTransit, 2));
}
