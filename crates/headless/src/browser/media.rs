//! `window.matchMedia` stand-in.
//!
//! Every query starts out not matching. Tests flip a query with
//! [`MatchMedia::set_matches`], which notifies the listeners registered on
//! every `MediaQueryList` for that query.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Listener handle returned by [`MediaQueryList::add_listener`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Payload delivered to media query listeners
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaQueryChange {
    /// The media query text
    pub media: String,
    /// New match state
    pub matches: bool,
}

type Listener = Arc<dyn Fn(&MediaQueryChange) + Send + Sync>;

#[derive(Default)]
struct QueryState {
    matches: bool,
    listeners: Vec<(ListenerId, Listener)>,
}

#[derive(Default)]
struct Registry {
    queries: HashMap<String, QueryState>,
    requested: Vec<String>,
    next_listener: u64,
}

/// `matchMedia` factory shared by all lists it hands out
#[derive(Clone, Default)]
pub struct MatchMedia {
    registry: Arc<Mutex<Registry>>,
}

impl std::fmt::Debug for MatchMedia {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registry = self.registry();
        f.debug_struct("MatchMedia")
            .field("queries", &registry.queries.len())
            .field("requested", &registry.requested.len())
            .finish()
    }
}

impl MatchMedia {
    /// Create a factory where no query matches
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// `matchMedia(query)`
    #[must_use]
    pub fn match_media(&self, query: &str) -> MediaQueryList {
        let mut registry = self.registry();
        registry.requested.push(query.to_string());
        let _ = registry.queries.entry(query.to_string()).or_default();
        MediaQueryList {
            media: query.to_string(),
            factory: self.clone(),
        }
    }

    /// Set whether `query` matches, notifying listeners when it changes.
    ///
    /// Returns the number of listeners notified.
    pub fn set_matches(&self, query: &str, matches: bool) -> usize {
        let listeners: Vec<Listener> = {
            let mut registry = self.registry();
            let state = registry.queries.entry(query.to_string()).or_default();
            if state.matches == matches {
                return 0;
            }
            state.matches = matches;
            state.listeners.iter().map(|(_, l)| Arc::clone(l)).collect()
        };

        tracing::debug!(
            target: "jugar_headless::media",
            query,
            matches,
            listeners = listeners.len(),
            "media query changed"
        );

        let change = MediaQueryChange {
            media: query.to_string(),
            matches,
        };
        for listener in &listeners {
            listener(&change);
        }
        listeners.len()
    }

    /// Every query passed to `matchMedia`, in call order
    #[must_use]
    pub fn requested_queries(&self) -> Vec<String> {
        self.registry().requested.clone()
    }

    /// Forget all queries, match states and listeners
    pub fn reset(&self) {
        let mut registry = self.registry();
        registry.queries.clear();
        registry.requested.clear();
    }
}

/// The object `matchMedia` returns
#[derive(Clone)]
pub struct MediaQueryList {
    media: String,
    factory: MatchMedia,
}

impl std::fmt::Debug for MediaQueryList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaQueryList")
            .field("media", &self.media)
            .field("matches", &self.matches())
            .finish()
    }
}

impl MediaQueryList {
    /// The query text
    #[must_use]
    pub fn media(&self) -> &str {
        &self.media
    }

    /// Current match state
    #[must_use]
    pub fn matches(&self) -> bool {
        self.factory
            .registry()
            .queries
            .get(&self.media)
            .is_some_and(|state| state.matches)
    }

    /// `addListener` / `addEventListener("change", ..)`
    pub fn add_listener<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&MediaQueryChange) + Send + Sync + 'static,
    {
        let mut registry = self.factory.registry();
        let id = ListenerId(registry.next_listener);
        registry.next_listener += 1;
        registry
            .queries
            .entry(self.media.clone())
            .or_default()
            .listeners
            .push((id, Arc::new(listener)));
        id
    }

    /// `removeListener`; returns whether the listener was registered
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut registry = self.factory.registry();
        let Some(state) = registry.queries.get_mut(&self.media) else {
            return false;
        };
        let before = state.listeners.len();
        state.listeners.retain(|(existing, _)| *existing != id);
        state.listeners.len() != before
    }

    /// Number of listeners registered for this query
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.factory
            .registry()
            .queries
            .get(&self.media)
            .map_or(0, |state| state.listeners.len())
    }
}
