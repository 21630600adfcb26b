//! Composite account fetch: de-duplication, join and timeout fallback.

mod common;

use std::time::Duration;

use common::{remote_account, remote_settings, Harness};
use fluxstore::action::{AccountAction, AccountActionBuilder};
use fluxstore::network::{ClassifiedError, ErrorKind, NetworkResponse, RequestKind};
use fluxstore::store::{AccountEvent, FetchStatus, OnAccountChanged};

const LONG: Duration = Duration::from_secs(3600);

fn account_changes(events: &[AccountEvent]) -> Vec<&OnAccountChanged> {
    events
        .iter()
        .filter_map(|event| match event {
            AccountEvent::AccountChanged(change) => Some(change),
            _ => None,
        })
        .collect()
}

fn started(timeout: Duration) -> Harness {
    let harness = Harness::new(timeout);
    harness.take_events();
    harness
        .dispatcher
        .dispatch(AccountActionBuilder::new_fetch_account_action())
        .unwrap();
    harness
}

#[test]
fn test_fetch_while_pending_issues_no_new_calls() {
    let harness = started(LONG);
    for _ in 0..3 {
        harness
            .dispatcher
            .dispatch(AccountActionBuilder::new_fetch_account_action())
            .unwrap();
    }

    assert_eq!(harness.network.call_count(RequestKind::FetchAccount), 1);
    assert_eq!(harness.network.call_count(RequestKind::FetchSettings), 1);
    assert_eq!(harness.scheduler.scheduled_count(), 1);
    assert_eq!(
        harness.store.lock().fetch_status(),
        FetchStatus::Pending { remaining: 2 }
    );
}

#[test]
fn test_both_parts_join_into_one_update() {
    let harness = started(LONG);

    harness
        .network
        .respond(RequestKind::FetchSettings, Ok(NetworkResponse::Settings(remote_settings())));
    assert_eq!(
        harness.store.lock().fetch_status(),
        FetchStatus::Pending { remaining: 1 }
    );
    harness
        .network
        .respond(RequestKind::FetchAccount, Ok(NetworkResponse::Account(remote_account())));

    let events = harness.take_events();
    let changes = account_changes(&events);
    let causes: Vec<_> = changes.iter().map(|change| change.cause).collect();
    assert_eq!(
        causes,
        vec![
            Some(AccountAction::FetchedSettings),
            Some(AccountAction::FetchedAccount),
            Some(AccountAction::UpdateAccount),
        ]
    );

    let mut expected = remote_account();
    expected.copy_account_settings_attributes(&remote_settings());
    let update = changes[2];
    assert!(update.account_infos_changed);
    assert_eq!(update.account, expected);
    assert_eq!(harness.store.lock().account(), &expected);
    assert_eq!(harness.store.lock().fetch_status(), FetchStatus::Idle);

    // The deadline check left behind is stale now.
    harness.fire_scheduled();
    assert!(harness.take_events().is_empty());
}

#[test]
fn test_new_fetch_is_accepted_after_join() {
    let harness = started(LONG);
    harness
        .network
        .respond(RequestKind::FetchAccount, Ok(NetworkResponse::Account(remote_account())));
    harness
        .network
        .respond(RequestKind::FetchSettings, Ok(NetworkResponse::Settings(remote_settings())));

    harness
        .dispatcher
        .dispatch(AccountActionBuilder::new_fetch_account_action())
        .unwrap();
    assert_eq!(harness.network.call_count(RequestKind::FetchAccount), 2);
}

#[test]
fn test_sub_fetch_failure_keeps_fetch_pending() {
    let harness = started(LONG);
    harness.network.respond(
        RequestKind::FetchSettings,
        Err(ClassifiedError::new(ErrorKind::Server, "503")),
    );

    assert!(harness.take_events().is_empty());
    assert_eq!(
        harness.store.lock().fetch_status(),
        FetchStatus::Pending { remaining: 2 }
    );
}

#[test]
fn test_timeout_resets_to_idle_with_one_error() {
    let harness = started(Duration::ZERO);
    harness.network.respond(
        RequestKind::FetchSettings,
        Err(ClassifiedError::new(ErrorKind::Server, "503")),
    );

    harness.fire_scheduled();

    let events = harness.take_events();
    let changes = account_changes(&events);
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].cause, Some(AccountAction::FetchTimedOut));
    assert!(!changes[0].account_infos_changed);
    assert_eq!(
        changes[0].error.as_ref().map(|err| err.kind),
        Some(ErrorKind::Timeout)
    );
    assert_eq!(harness.store.lock().fetch_status(), FetchStatus::Idle);

    // A later request starts a fresh fetch.
    harness
        .dispatcher
        .dispatch(AccountActionBuilder::new_fetch_account_action())
        .unwrap();
    assert_eq!(harness.network.call_count(RequestKind::FetchAccount), 2);
}

#[test]
fn test_late_result_after_timeout_is_applied_without_join() {
    let harness = started(Duration::ZERO);
    harness.fire_scheduled();
    harness.take_events();

    harness
        .network
        .respond(RequestKind::FetchAccount, Ok(NetworkResponse::Account(remote_account())));

    let events = harness.take_events();
    let causes: Vec<_> = account_changes(&events)
        .iter()
        .map(|change| change.cause)
        .collect();
    assert_eq!(causes, vec![Some(AccountAction::FetchedAccount)]);
    assert_eq!(harness.store.lock().account().user_name, "alex");
    assert_eq!(harness.store.lock().fetch_status(), FetchStatus::Idle);
}

#[test]
fn test_early_deadline_check_is_rescheduled() {
    let harness = started(LONG);
    harness.fire_scheduled();

    assert!(harness.take_events().is_empty());
    let rescheduled = harness.scheduler.take_scheduled();
    assert_eq!(rescheduled.len(), 1);
    assert!(rescheduled[0].0 <= LONG);
    assert_eq!(rescheduled[0].1.name(), "account.fetch_timed_out");
}
