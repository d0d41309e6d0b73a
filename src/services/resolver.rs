//! Session resolver: the one subscription that owns the session value.
//!
//! DESIGN
//! ======
//! A background task holds the provider subscription for its whole life and
//! is the sole writer of the published `SessionView`. Notifications are
//! processed strictly in order: the claims fetch for one sign-in completes
//! before the next notification is read. If no notification ever arrives the
//! published value stays `Loading`; there is no timeout.
//!
//! ERROR HANDLING
//! ==============
//! A failed claims fetch resolves the session to `Anonymous`, logged and not
//! retried. Every authenticated page is role-gated, so a session without
//! claims has nothing it could render.

use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::warn;

use super::session::SessionView;
use crate::provider::{AuthChange, IdentityProvider};

/// Owns the resolver task. Dropping the handle aborts the task, which drops
/// the provider subscription with it.
pub struct ResolverHandle {
    task: JoinHandle<()>,
}

impl Drop for ResolverHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Spawn the resolver. Returns the receiver the view layer reads and the
/// handle that scopes the subscription.
#[must_use]
pub fn spawn(provider: Arc<dyn IdentityProvider>) -> (watch::Receiver<SessionView>, ResolverHandle) {
    let (tx, rx) = watch::channel(SessionView::Loading);
    // Subscribe before the task is scheduled so no change can slip past.
    let events = provider.subscribe();
    let task = tokio::spawn(run(provider, events, tx));
    (rx, ResolverHandle { task })
}

async fn run(
    provider: Arc<dyn IdentityProvider>,
    mut events: broadcast::Receiver<AuthChange>,
    tx: watch::Sender<SessionView>,
) {
    loop {
        let change = match events.recv().await {
            Ok(change) => change,
            Err(broadcast::error::RecvError::Lagged(missed)) => {
                warn!(missed, "auth-state notifications lagged; waiting for the next change");
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => break,
        };

        let next = match change {
            AuthChange::SignedOut => SessionView::Anonymous,
            AuthChange::SignedIn(user) => match provider.token_claims(&user).await {
                Ok(claims) => SessionView::authenticated(user, &claims),
                Err(e) => {
                    warn!(
                        error = %e,
                        uid = %user.uid,
                        "token claims fetch failed; treating session as signed out"
                    );
                    SessionView::Anonymous
                }
            },
        };

        if tx.send(next).is_err() {
            break; // every receiver is gone; no view left to serve
        }
    }
}

#[cfg(test)]
#[path = "resolver_test.rs"]
mod tests;
