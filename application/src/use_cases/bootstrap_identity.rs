//! Identity bootstrap use case
//!
//! Produces the ready [`Session`] every other use case is gated on.

use crate::ports::activity_logger::{ActivityEvent, ActivityLogger, NoActivityLogger};
use crate::ports::identity_provider::IdentityProvider;
use pestwatch_domain::{IdentityId, IdentityOrigin, Session};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{info, warn};

/// Resolves the session identity exactly once.
///
/// The provider is asked for an anonymous identity; if it fails, returns
/// nothing, or returns an id in the reserved local namespace, a locally
/// unique identity is synthesized instead. Concurrent and repeated calls to
/// [`resolve`](Self::resolve) all observe the same session.
pub struct IdentityBootstrap<P: IdentityProvider + 'static> {
    provider: Arc<P>,
    activity: Arc<dyn ActivityLogger>,
    resolved: OnceCell<Session>,
}

impl<P: IdentityProvider + 'static> IdentityBootstrap<P> {
    pub fn new(provider: Arc<P>) -> Self {
        Self {
            provider,
            activity: Arc::new(NoActivityLogger),
            resolved: OnceCell::new(),
        }
    }

    pub fn with_activity_logger(mut self, activity: Arc<dyn ActivityLogger>) -> Self {
        self.activity = activity;
        self
    }

    /// Resolve the identity (first call) or return the resolved session.
    pub async fn resolve(&self) -> Session {
        self.resolved
            .get_or_init(|| self.resolve_once())
            .await
            .clone()
    }

    /// The session as of now: unresolved until [`resolve`](Self::resolve)
    /// has completed.
    pub fn current(&self) -> Session {
        self.resolved.get().cloned().unwrap_or_default()
    }

    async fn resolve_once(&self) -> Session {
        let (identity, origin) = match self.provider.sign_in_anonymously().await {
            Ok(Some(raw)) => match IdentityId::from_provider(raw) {
                Some(id) => (id, IdentityOrigin::Provider),
                None => {
                    warn!("Identity provider returned an unusable id; using a local identity");
                    (IdentityId::generate_local(), IdentityOrigin::LocalFallback)
                }
            },
            Ok(None) => {
                info!("No identity from provider; using a local identity");
                (IdentityId::generate_local(), IdentityOrigin::LocalFallback)
            }
            Err(e) => {
                warn!("Anonymous sign-in failed: {}; using a local identity", e);
                (IdentityId::generate_local(), IdentityOrigin::LocalFallback)
            }
        };

        info!("Identity resolved ({}): {}", origin.as_str(), identity);
        self.activity.log(ActivityEvent::new(
            "identity_resolved",
            json!({
                "identity": identity.as_str(),
                "origin": origin.as_str(),
            }),
        ));

        Session::resolved(identity, origin)
    }
}
