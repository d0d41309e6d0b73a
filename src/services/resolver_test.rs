use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;

use super::*;
use crate::provider::ProviderError;
use crate::services::session::Role;
use crate::state::test_helpers::{FakeProvider, claims_with_role, handle};

async fn next_view(rx: &mut watch::Receiver<SessionView>) -> SessionView {
    timeout(Duration::from_secs(1), rx.changed())
        .await
        .expect("timed out waiting for a view change")
        .expect("resolver dropped its sender");
    rx.borrow().clone()
}

// =============================================================================
// State machine ordering
// =============================================================================

#[tokio::test]
async fn starts_in_loading() {
    let provider = Arc::new(FakeProvider::new());
    let (rx, _handle) = spawn(provider);
    assert_eq!(*rx.borrow(), SessionView::Loading);
}

#[tokio::test]
async fn sign_in_then_sign_out_never_skips_loading() {
    let provider = Arc::new(FakeProvider::new());
    provider.script_claims(Ok(claims_with_role("facility_engineer")));

    let (mut rx, _handle) = spawn(provider.clone());
    assert_eq!(*rx.borrow(), SessionView::Loading);

    provider.emit(AuthChange::SignedIn(handle("u1", "engineer@test.com")));
    let view = next_view(&mut rx).await;
    let SessionView::Authenticated { user, role } = view else {
        panic!("expected authenticated view, got {view:?}");
    };
    assert_eq!(user.uid, "u1");
    assert_eq!(role, Some(Role::FacilityEngineer));

    provider.emit(AuthChange::SignedOut);
    assert_eq!(next_view(&mut rx).await, SessionView::Anonymous);
}

#[tokio::test]
async fn anonymous_to_authenticated_on_later_sign_in() {
    let provider = Arc::new(FakeProvider::new());
    provider.script_claims(Ok(claims_with_role("auditor")));

    let (mut rx, _handle) = spawn(provider.clone());
    provider.emit(AuthChange::SignedOut);
    assert_eq!(next_view(&mut rx).await, SessionView::Anonymous);

    provider.emit(AuthChange::SignedIn(handle("u2", "auditor@test.com")));
    assert!(next_view(&mut rx).await.is_authenticated());
}

#[tokio::test]
async fn unknown_role_claim_is_preserved_for_display() {
    let provider = Arc::new(FakeProvider::new());
    provider.script_claims(Ok(claims_with_role("admin")));

    let (mut rx, _handle) = spawn(provider.clone());
    provider.emit(AuthChange::SignedIn(handle("U", "a@b.com")));

    let SessionView::Authenticated { user, role } = next_view(&mut rx).await else {
        panic!("expected authenticated view");
    };
    assert_eq!(user.email.as_deref(), Some("a@b.com"));
    assert_eq!(role.unwrap().label(), "admin");
}

#[tokio::test]
async fn missing_role_claim_yields_no_role() {
    let provider = Arc::new(FakeProvider::new());

    let (mut rx, _handle) = spawn(provider.clone());
    provider.emit(AuthChange::SignedIn(handle("u3", "norole@test.com")));

    let SessionView::Authenticated { role, .. } = next_view(&mut rx).await else {
        panic!("expected authenticated view");
    };
    assert!(role.is_none());
}

// =============================================================================
// Claims fetch failure policy: resolve to Anonymous, never panic.
// =============================================================================

#[tokio::test]
async fn claims_failure_resolves_anonymous() {
    let provider = Arc::new(FakeProvider::new());
    provider.script_claims(Err(ProviderError::ApiRequest("connection reset".into())));

    let (mut rx, _handle) = spawn(provider.clone());
    provider.emit(AuthChange::SignedIn(handle("u1", "engineer@test.com")));
    assert_eq!(next_view(&mut rx).await, SessionView::Anonymous);
}

#[tokio::test]
async fn resolver_survives_claims_failure() {
    let provider = Arc::new(FakeProvider::new());
    provider.script_claims(Err(ProviderError::NoSession));
    provider.script_claims(Ok(claims_with_role("auditor")));

    let (mut rx, _handle) = spawn(provider.clone());
    provider.emit(AuthChange::SignedIn(handle("u1", "a@test.com")));
    assert_eq!(next_view(&mut rx).await, SessionView::Anonymous);

    // A later sign-in is still processed.
    provider.emit(AuthChange::SignedIn(handle("u1", "a@test.com")));
    assert!(next_view(&mut rx).await.is_authenticated());
}

// =============================================================================
// Silent provider: stay Loading forever (no timeout).
// =============================================================================

#[tokio::test]
async fn silent_provider_stays_loading() {
    let provider = Arc::new(FakeProvider::new());
    let (mut rx, _handle) = spawn(provider);

    let waited = timeout(Duration::from_millis(100), rx.changed()).await;
    assert!(waited.is_err(), "view changed without any notification");
    assert_eq!(*rx.borrow(), SessionView::Loading);
}

// =============================================================================
// Subscription lifecycle
// =============================================================================

#[tokio::test]
async fn spawn_takes_exactly_one_subscription() {
    let provider = Arc::new(FakeProvider::new());
    let (_rx, _handle) = spawn(provider.clone());
    assert_eq!(provider.subscriber_count(), 1);
}

#[tokio::test]
async fn dropping_handle_releases_subscription() {
    let provider = Arc::new(FakeProvider::new());
    let (_rx, resolver) = spawn(provider.clone());
    assert_eq!(provider.subscriber_count(), 1);

    drop(resolver);
    for _ in 0..50 {
        if provider.subscriber_count() == 0 {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("subscription still held after resolver drop");
}

// =============================================================================
// Serial processing: one notification at a time.
// =============================================================================

#[tokio::test]
async fn burst_of_notifications_resolves_claims_in_order() {
    let provider = Arc::new(FakeProvider::new());
    provider.script_claims(Ok(claims_with_role("facility_engineer")));
    provider.script_claims(Ok(claims_with_role("auditor")));

    let (mut rx, _handle) = spawn(provider.clone());
    provider.emit(AuthChange::SignedIn(handle("u1", "a@test.com")));
    provider.emit(AuthChange::SignedOut);
    provider.emit(AuthChange::SignedIn(handle("u2", "b@test.com")));

    // The watch channel conflates intermediate values, so assert on the
    // final state: the second sign-in must have consumed the second scripted
    // claims entry, which only happens if the fetches ran in notification
    // order.
    let view = timeout(Duration::from_secs(1), async {
        loop {
            rx.changed().await.expect("resolver dropped its sender");
            let view = rx.borrow().clone();
            if let SessionView::Authenticated { role: Some(Role::Auditor), .. } = &view {
                return view;
            }
        }
    })
    .await
    .expect("never reached the final authenticated state");

    let SessionView::Authenticated { user, .. } = view else { unreachable!() };
    assert_eq!(user.uid, "u2");
}
