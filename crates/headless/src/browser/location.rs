//! `window.location` stand-in backed by a parsed [`Url`].
//!
//! Navigation never leaves the page: `assign`, `replace` and `reload` only
//! update the URL and record what was asked for.

use crate::result::{HeadlessError, HeadlessResult};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use url::Url;

/// How a navigation was requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NavigationKind {
    /// `location.assign(url)` or setting `href`
    Assign,
    /// `location.replace(url)`
    Replace,
    /// `location.reload()`
    Reload,
}

/// A recorded navigation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Navigation {
    /// How it was requested
    pub kind: NavigationKind,
    /// Resolved target URL
    pub href: String,
}

#[derive(Debug)]
struct LocationState {
    url: Url,
    navigations: Vec<Navigation>,
}

/// `window.location`; clones share the current URL
#[derive(Debug, Clone)]
pub struct MockLocation {
    state: Arc<Mutex<LocationState>>,
}

fn parse(href: &str, base: Option<&Url>) -> HeadlessResult<Url> {
    let parsed = match base {
        Some(base) => base.join(href),
        None => Url::parse(href),
    };
    parsed.map_err(|e| HeadlessError::InvalidUrl {
        url: href.to_string(),
        message: e.to_string(),
    })
}

impl MockLocation {
    /// Create a location at `href`
    ///
    /// # Errors
    ///
    /// Returns [`HeadlessError::InvalidUrl`] if `href` is not an absolute URL.
    pub fn new(href: &str) -> HeadlessResult<Self> {
        Ok(Self {
            state: Arc::new(Mutex::new(LocationState {
                url: parse(href, None)?,
                navigations: Vec::new(),
            })),
        })
    }

    fn state(&self) -> MutexGuard<'_, LocationState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read<T>(&self, f: impl FnOnce(&Url) -> T) -> T {
        f(&self.state().url)
    }

    /// `location.href`
    #[must_use]
    pub fn href(&self) -> String {
        self.read(|url| url.as_str().to_string())
    }

    /// `location.origin`
    #[must_use]
    pub fn origin(&self) -> String {
        self.read(|url| url.origin().ascii_serialization())
    }

    /// `location.protocol`, including the trailing colon
    #[must_use]
    pub fn protocol(&self) -> String {
        self.read(|url| format!("{}:", url.scheme()))
    }

    /// `location.hostname`
    #[must_use]
    pub fn hostname(&self) -> String {
        self.read(|url| url.host_str().unwrap_or_default().to_string())
    }

    /// `location.port`; empty for the scheme's default port
    #[must_use]
    pub fn port(&self) -> String {
        self.read(|url| url.port().map(|p| p.to_string()).unwrap_or_default())
    }

    /// `location.host`: hostname plus non-default port
    #[must_use]
    pub fn host(&self) -> String {
        let (hostname, port) = (self.hostname(), self.port());
        if port.is_empty() {
            hostname
        } else {
            format!("{hostname}:{port}")
        }
    }

    /// `location.pathname`
    #[must_use]
    pub fn pathname(&self) -> String {
        self.read(|url| url.path().to_string())
    }

    /// `location.search`, including `?` when non-empty
    #[must_use]
    pub fn search(&self) -> String {
        self.read(|url| match url.query() {
            Some(q) if !q.is_empty() => format!("?{q}"),
            _ => String::new(),
        })
    }

    /// `location.hash`, including `#` when non-empty
    #[must_use]
    pub fn hash(&self) -> String {
        self.read(|url| match url.fragment() {
            Some(f) if !f.is_empty() => format!("#{f}"),
            _ => String::new(),
        })
    }

    fn navigate(&self, kind: NavigationKind, href: &str) -> HeadlessResult<()> {
        let mut state = self.state();
        let target = parse(href, Some(&state.url))?;
        tracing::debug!(
            target: "jugar_headless::location",
            kind = ?kind,
            href = target.as_str(),
            "navigation"
        );
        state.navigations.push(Navigation {
            kind,
            href: target.as_str().to_string(),
        });
        state.url = target;
        Ok(())
    }

    /// `location.assign(url)`; relative URLs resolve against the current one
    pub fn assign(&self, href: &str) -> HeadlessResult<()> {
        self.navigate(NavigationKind::Assign, href)
    }

    /// `location.replace(url)`
    pub fn replace(&self, href: &str) -> HeadlessResult<()> {
        self.navigate(NavigationKind::Replace, href)
    }

    /// `location.reload()`
    pub fn reload(&self) {
        let mut state = self.state();
        let href = state.url.as_str().to_string();
        state.navigations.push(Navigation {
            kind: NavigationKind::Reload,
            href,
        });
    }

    /// Every navigation requested so far
    #[must_use]
    pub fn navigations(&self) -> Vec<Navigation> {
        self.state().navigations.clone()
    }

    /// Move back to `href` and forget recorded navigations
    pub fn reset(&self, href: &str) -> HeadlessResult<()> {
        let url = parse(href, None)?;
        let mut state = self.state();
        state.url = url;
        state.navigations.clear();
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_components() {
        let location = MockLocation::new("https://app.test:8443/dash/home?tab=2#top").unwrap();
        assert_eq!(location.protocol(), "https:");
        assert_eq!(location.hostname(), "app.test");
        assert_eq!(location.port(), "8443");
        assert_eq!(location.host(), "app.test:8443");
        assert_eq!(location.origin(), "https://app.test:8443");
        assert_eq!(location.pathname(), "/dash/home");
        assert_eq!(location.search(), "?tab=2");
        assert_eq!(location.hash(), "#top");
    }

    #[test]
    fn test_default_port_is_empty() {
        let location = MockLocation::new("http://localhost/").unwrap();
        assert_eq!(location.port(), "");
        assert_eq!(location.host(), "localhost");
        assert_eq!(location.search(), "");
        assert_eq!(location.hash(), "");
    }

    #[test]
    fn test_invalid_href() {
        let err = MockLocation::new("not a url").unwrap_err();
        assert!(matches!(err, HeadlessError::InvalidUrl { .. }));
    }

    #[test]
    fn test_assign_resolves_relative() {
        let location = MockLocation::new("http://localhost/app/list").unwrap();
        location.assign("detail?id=3").unwrap();
        assert_eq!(location.href(), "http://localhost/app/detail?id=3");
        location.replace("/login").unwrap();
        location.reload();

        let kinds: Vec<NavigationKind> = location.navigations().iter().map(|n| n.kind).collect();
        assert_eq!(
            kinds,
            vec![
                NavigationKind::Assign,
                NavigationKind::Replace,
                NavigationKind::Reload
            ]
        );
        assert_eq!(location.navigations()[2].href, "http://localhost/login");
    }

    #[test]
    fn test_reset() {
        let location = MockLocation::new("http://localhost/").unwrap();
        location.assign("/elsewhere").unwrap();
        location.reset("http://localhost/").unwrap();
        assert_eq!(location.pathname(), "/");
        assert!(location.navigations().is_empty());
    }
}
