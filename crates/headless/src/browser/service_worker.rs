//! `navigator.serviceWorker` stand-in.
//!
//! `register` always resolves. Registering a second script for a scope
//! that already has one replaces the script and keeps the registration id.

use crate::result::{HeadlessError, HeadlessResult};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

/// Scope used when `register` is called without one
pub const DEFAULT_SCOPE: &str = "/";

/// A resolved `ServiceWorkerRegistration`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceWorkerRegistration {
    /// Registration id
    pub id: Uuid,
    /// Scope the worker controls
    pub scope: String,
    /// Script URL of the active worker
    pub script_url: String,
}

/// `navigator.serviceWorker`; clones share registrations
#[derive(Debug, Clone, Default)]
pub struct ServiceWorkerContainer {
    registrations: Arc<Mutex<Vec<ServiceWorkerRegistration>>>,
}

impl ServiceWorkerContainer {
    /// Create a container with no registrations
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn registrations_mut(&self) -> MutexGuard<'_, Vec<ServiceWorkerRegistration>> {
        self.registrations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// `register(scriptURL, { scope })`
    ///
    /// # Errors
    ///
    /// Returns [`HeadlessError::InvalidUrl`] for an empty script URL.
    pub async fn register(
        &self,
        script_url: &str,
        scope: Option<&str>,
    ) -> HeadlessResult<ServiceWorkerRegistration> {
        if script_url.trim().is_empty() {
            return Err(HeadlessError::InvalidUrl {
                url: script_url.to_string(),
                message: "service worker script URL is empty".to_string(),
            });
        }
        let scope = scope.unwrap_or(DEFAULT_SCOPE);

        let mut registrations = self.registrations_mut();
        if let Some(existing) = registrations.iter_mut().find(|r| r.scope == scope) {
            existing.script_url = script_url.to_string();
            return Ok(existing.clone());
        }

        let registration = ServiceWorkerRegistration {
            id: Uuid::new_v4(),
            scope: scope.to_string(),
            script_url: script_url.to_string(),
        };
        tracing::debug!(
            target: "jugar_headless::service_worker",
            scope,
            script_url,
            "service worker registered"
        );
        registrations.push(registration.clone());
        Ok(registration)
    }

    /// `getRegistration(scope)`
    #[must_use]
    pub fn registration(&self, scope: &str) -> Option<ServiceWorkerRegistration> {
        self.registrations_mut()
            .iter()
            .find(|r| r.scope == scope)
            .cloned()
    }

    /// `getRegistrations()`
    #[must_use]
    pub fn registrations(&self) -> Vec<ServiceWorkerRegistration> {
        self.registrations_mut().clone()
    }

    /// `registration.unregister()`; resolves to whether it existed
    pub async fn unregister(&self, id: Uuid) -> bool {
        let mut registrations = self.registrations_mut();
        let before = registrations.len();
        registrations.retain(|r| r.id != id);
        registrations.len() != before
    }

    /// `ready`: the first registration, if any
    pub async fn ready(&self) -> Option<ServiceWorkerRegistration> {
        self.registrations_mut().first().cloned()
    }

    /// Drop every registration
    pub fn reset(&self) {
        self.registrations_mut().clear();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_register_resolves() {
        let container = ServiceWorkerContainer::new();
        let registration = container.register("/sw.js", None).await.unwrap();
        assert_eq!(registration.scope, DEFAULT_SCOPE);
        assert_eq!(registration.script_url, "/sw.js");
        assert_eq!(container.ready().await, Some(registration));
    }

    #[tokio::test]
    async fn test_reregister_same_scope_keeps_id() {
        let container = ServiceWorkerContainer::new();
        let first = container.register("/sw-v1.js", Some("/app/")).await.unwrap();
        let second = container.register("/sw-v2.js", Some("/app/")).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.script_url, "/sw-v2.js");
        assert_eq!(container.registrations().len(), 1);
    }

    #[tokio::test]
    async fn test_unregister() {
        let container = ServiceWorkerContainer::new();
        let registration = container.register("/sw.js", Some("/")).await.unwrap();
        assert!(container.unregister(registration.id).await);
        assert!(!container.unregister(registration.id).await);
        assert!(container.registration("/").is_none());
        assert!(container.ready().await.is_none());
    }

    #[tokio::test]
    async fn test_empty_script_rejected() {
        let container = ServiceWorkerContainer::new();
        let err = container.register("  ", None).await.unwrap_err();
        assert!(matches!(err, HeadlessError::InvalidUrl { .. }));
    }
}
