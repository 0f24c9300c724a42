//! `IntersectionObserver`, `ResizeObserver` and `MutationObserver` stand-ins.
//!
//! Observers never fire on their own. Tests call [`MockObserver::trigger`]
//! to deliver entries for the targets currently observed.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

/// Which observer API a mock stands in for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObserverKind {
    /// `IntersectionObserver`
    Intersection,
    /// `ResizeObserver`
    Resize,
    /// `MutationObserver`
    Mutation,
}

impl ObserverKind {
    /// Get the constructor name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Intersection => "IntersectionObserver",
            Self::Resize => "ResizeObserver",
            Self::Mutation => "MutationObserver",
        }
    }
}

impl std::fmt::Display for ObserverKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An entry delivered to an observer callback
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObserverEntry {
    /// Target identifier (selector or element id)
    pub target: String,
    /// Whether the target intersects the viewport
    pub is_intersecting: bool,
    /// Content box width in CSS pixels
    pub width: f64,
    /// Content box height in CSS pixels
    pub height: f64,
}

impl ObserverEntry {
    /// A visible, zero-sized entry for `target`
    #[must_use]
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            is_intersecting: true,
            width: 0.0,
            height: 0.0,
        }
    }

    /// Set intersection state
    #[must_use]
    pub const fn intersecting(mut self, is_intersecting: bool) -> Self {
        self.is_intersecting = is_intersecting;
        self
    }

    /// Set content box size
    #[must_use]
    pub const fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = width;
        self.height = height;
        self
    }
}

type Callback = Arc<dyn Fn(&[ObserverEntry]) + Send + Sync>;

struct ObserverState {
    targets: Vec<String>,
    callback: Callback,
    deliveries: usize,
}

/// A single observer instance; clones share state
#[derive(Clone)]
pub struct MockObserver {
    id: Uuid,
    kind: ObserverKind,
    state: Arc<Mutex<ObserverState>>,
}

impl std::fmt::Debug for MockObserver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockObserver")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("targets", &self.observed())
            .finish_non_exhaustive()
    }
}

impl MockObserver {
    /// Construct an observer with its callback
    pub fn new<F>(kind: ObserverKind, callback: F) -> Self
    where
        F: Fn(&[ObserverEntry]) + Send + Sync + 'static,
    {
        Self {
            id: Uuid::new_v4(),
            kind,
            state: Arc::new(Mutex::new(ObserverState {
                targets: Vec::new(),
                callback: Arc::new(callback),
                deliveries: 0,
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, ObserverState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Unique id of this instance
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Which API this observer stands in for
    #[must_use]
    pub const fn kind(&self) -> ObserverKind {
        self.kind
    }

    /// `observe(target)`; observing twice is a no-op
    pub fn observe(&self, target: impl Into<String>) {
        let target = target.into();
        let mut state = self.state();
        if !state.targets.contains(&target) {
            state.targets.push(target);
        }
    }

    /// `unobserve(target)`; returns whether it was observed
    pub fn unobserve(&self, target: &str) -> bool {
        let mut state = self.state();
        let before = state.targets.len();
        state.targets.retain(|t| t != target);
        state.targets.len() != before
    }

    /// `disconnect()`
    pub fn disconnect(&self) {
        self.state().targets.clear();
    }

    /// `takeRecords()`; the mock never queues records
    #[must_use]
    pub fn take_records(&self) -> Vec<ObserverEntry> {
        Vec::new()
    }

    /// Targets currently observed
    #[must_use]
    pub fn observed(&self) -> Vec<String> {
        self.state().targets.clone()
    }

    /// Whether `target` is observed
    #[must_use]
    pub fn is_observing(&self, target: &str) -> bool {
        self.state().targets.iter().any(|t| t == target)
    }

    /// Number of times the callback has been invoked
    #[must_use]
    pub fn deliveries(&self) -> usize {
        self.state().deliveries
    }

    /// Deliver a default entry for every observed target.
    ///
    /// Returns the number of entries delivered.
    pub fn trigger(&self) -> usize {
        let entries = self.observed().into_iter().map(ObserverEntry::new).collect();
        self.trigger_with(entries)
    }

    /// Deliver `entries`, dropping those whose target is not observed.
    ///
    /// The callback is not invoked when nothing is left to deliver.
    pub fn trigger_with(&self, entries: Vec<ObserverEntry>) -> usize {
        let (callback, entries) = {
            let mut state = self.state();
            let entries: Vec<ObserverEntry> = entries
                .into_iter()
                .filter(|e| state.targets.contains(&e.target))
                .collect();
            if entries.is_empty() {
                return 0;
            }
            state.deliveries += 1;
            (Arc::clone(&state.callback), entries)
        };

        tracing::trace!(
            target: "jugar_headless::observer",
            kind = %self.kind,
            entries = entries.len(),
            "delivering observer entries"
        );
        callback(&entries);
        entries.len()
    }
}

/// Records every observer constructed through it
#[derive(Debug, Clone, Default)]
pub struct Observers {
    created: Arc<Mutex<Vec<MockObserver>>>,
}

impl Observers {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct and record an observer of `kind`
    pub fn create<F>(&self, kind: ObserverKind, callback: F) -> MockObserver
    where
        F: Fn(&[ObserverEntry]) + Send + Sync + 'static,
    {
        let observer = MockObserver::new(kind, callback);
        self.created
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(observer.clone());
        observer
    }

    /// `new IntersectionObserver(callback)`
    pub fn intersection<F>(&self, callback: F) -> MockObserver
    where
        F: Fn(&[ObserverEntry]) + Send + Sync + 'static,
    {
        self.create(ObserverKind::Intersection, callback)
    }

    /// `new ResizeObserver(callback)`
    pub fn resize<F>(&self, callback: F) -> MockObserver
    where
        F: Fn(&[ObserverEntry]) + Send + Sync + 'static,
    {
        self.create(ObserverKind::Resize, callback)
    }

    /// `new MutationObserver(callback)`
    pub fn mutation<F>(&self, callback: F) -> MockObserver
    where
        F: Fn(&[ObserverEntry]) + Send + Sync + 'static,
    {
        self.create(ObserverKind::Mutation, callback)
    }

    /// All observers created so far
    #[must_use]
    pub fn all(&self) -> Vec<MockObserver> {
        self.created
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Observers of one kind
    #[must_use]
    pub fn of_kind(&self, kind: ObserverKind) -> Vec<MockObserver> {
        self.all().into_iter().filter(|o| o.kind() == kind).collect()
    }

    /// Disconnect and forget every observer
    pub fn reset(&self) {
        let mut created = self.created.lock().unwrap_or_else(PoisonError::into_inner);
        for observer in created.iter() {
            observer.disconnect();
        }
        created.clear();
    }
}
