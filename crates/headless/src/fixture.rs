//! Fixture Management
//!
//! Per-test resources such as [`crate::BrowserEnv`] are registered with a
//! [`FixtureManager`], which keeps them ordered by priority. Higher priority
//! fixtures come up first and go down last. A fixture whose setup failed is
//! tried again by the next [`FixtureManager::setup_all`].

use crate::result::{HeadlessError, HeadlessResult};
use std::any::{Any, TypeId};

/// Lets the manager hand out fixtures by their concrete type.
pub trait AsAny: Any {
    /// Borrow as `Any`
    fn as_any(&self) -> &dyn Any;
    /// Mutably borrow as `Any`
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A resource with a setup/teardown lifecycle around each test.
pub trait Fixture: AsAny + Send + Sync {
    /// Bring the resource into a usable state.
    ///
    /// # Errors
    ///
    /// Returns an error if the resource cannot be prepared.
    fn setup(&mut self) -> HeadlessResult<()>;

    /// Release or reset the resource.
    ///
    /// # Errors
    ///
    /// Returns an error if the resource cannot be released.
    fn teardown(&mut self) -> HeadlessResult<()>;

    /// Name used in errors and log events
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Ordering key; larger values are set up earlier
    fn priority(&self) -> i32 {
        0
    }
}

/// Where a registered fixture is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureState {
    /// Registered, never set up
    Registered,
    /// Setup succeeded and no teardown has run since
    SetUp,
    /// Teardown succeeded
    TornDown,
    /// The last setup or teardown returned an error
    Failed,
}

struct Slot {
    type_id: TypeId,
    priority: i32,
    state: FixtureState,
    fixture: Box<dyn Fixture>,
}

impl Slot {
    fn teardown(&mut self) -> Option<String> {
        if self.state != FixtureState::SetUp {
            return None;
        }
        match self.fixture.teardown() {
            Ok(()) => {
                self.state = FixtureState::TornDown;
                tracing::debug!(target: "jugar_headless::fixture", fixture = self.fixture.name(), "torn down");
                None
            }
            Err(e) => {
                self.state = FixtureState::Failed;
                Some(format!("Fixture '{}' teardown failed: {e}", self.fixture.name()))
            }
        }
    }
}

/// Registry of fixtures, one per concrete type, kept in priority order.
#[derive(Default)]
pub struct FixtureManager {
    // Descending priority; equal priorities keep registration order.
    slots: Vec<Slot>,
}

impl std::fmt::Debug for FixtureManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.slots.iter().map(|s| (s.fixture.name(), s.state)))
            .finish()
    }
}

impl FixtureManager {
    /// Empty manager
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn slot<F: Fixture>(&self) -> Option<&Slot> {
        let wanted = TypeId::of::<F>();
        self.slots.iter().find(|s| s.type_id == wanted)
    }

    fn slot_mut<F: Fixture>(&mut self) -> Option<&mut Slot> {
        let wanted = TypeId::of::<F>();
        self.slots.iter_mut().find(|s| s.type_id == wanted)
    }

    /// Add `fixture`, replacing any fixture of the same type.
    pub fn register<F: Fixture>(&mut self, fixture: F) {
        let _ = self.unregister::<F>();
        let priority = fixture.priority();
        let at = self
            .slots
            .iter()
            .position(|s| s.priority < priority)
            .unwrap_or(self.slots.len());
        self.slots.insert(
            at,
            Slot {
                type_id: TypeId::of::<F>(),
                priority,
                state: FixtureState::Registered,
                fixture: Box::new(fixture),
            },
        );
    }

    /// Whether a fixture of type `F` is registered
    #[must_use]
    pub fn is_registered<F: Fixture>(&self) -> bool {
        self.slot::<F>().is_some()
    }

    /// Number of registered fixtures
    #[must_use]
    pub fn count(&self) -> usize {
        self.slots.len()
    }

    /// Lifecycle state of the fixture of type `F`
    #[must_use]
    pub fn state<F: Fixture>(&self) -> Option<FixtureState> {
        self.slot::<F>().map(|s| s.state)
    }

    /// Borrow the fixture of type `F`
    #[must_use]
    pub fn get<F: Fixture>(&self) -> Option<&F> {
        self.slot::<F>()
            .and_then(|s| s.fixture.as_ref().as_any().downcast_ref::<F>())
    }

    /// Mutably borrow the fixture of type `F`
    #[must_use]
    pub fn get_mut<F: Fixture>(&mut self) -> Option<&mut F> {
        self.slot_mut::<F>()
            .and_then(|s| s.fixture.as_mut().as_any_mut().downcast_mut::<F>())
    }

    /// Set up every fixture that is not already set up, highest priority
    /// first.
    ///
    /// # Errors
    ///
    /// On the first setup failure the fixtures set up before it are torn
    /// down again and [`HeadlessError::FixtureError`] names the failed
    /// setup. Teardown failures during that rollback are appended to the
    /// message.
    pub fn setup_all(&mut self) -> HeadlessResult<()> {
        for index in 0..self.slots.len() {
            let slot = &mut self.slots[index];
            if slot.state == FixtureState::SetUp {
                continue;
            }
            match slot.fixture.setup() {
                Ok(()) => {
                    slot.state = FixtureState::SetUp;
                    tracing::debug!(target: "jugar_headless::fixture", fixture = slot.fixture.name(), "set up");
                }
                Err(e) => {
                    slot.state = FixtureState::Failed;
                    let mut message =
                        format!("Fixture '{}' setup failed: {e}", slot.fixture.name());
                    let rollback: Vec<String> = self.slots[..index]
                        .iter_mut()
                        .rev()
                        .filter_map(Slot::teardown)
                        .collect();
                    if !rollback.is_empty() {
                        tracing::warn!(
                            target: "jugar_headless::fixture",
                            failures = rollback.len(),
                            "rollback after setup failure was incomplete"
                        );
                        message.push_str("; rollback: ");
                        message.push_str(&rollback.join("; "));
                    }
                    return Err(HeadlessError::FixtureError { message });
                }
            }
        }
        Ok(())
    }

    /// Tear down every set-up fixture, lowest priority first.
    ///
    /// # Errors
    ///
    /// All fixtures are visited even when one fails; the first failure is
    /// returned.
    pub fn teardown_all(&mut self) -> HeadlessResult<()> {
        let failures: Vec<String> = self
            .slots
            .iter_mut()
            .rev()
            .filter_map(Slot::teardown)
            .collect();
        match failures.into_iter().next() {
            Some(message) => Err(HeadlessError::FixtureError { message }),
            None => Ok(()),
        }
    }

    /// Remove the fixture of type `F` without tearing it down
    pub fn unregister<F: Fixture>(&mut self) -> bool {
        let wanted = TypeId::of::<F>();
        let before = self.slots.len();
        self.slots.retain(|s| s.type_id != wanted);
        self.slots.len() != before
    }

    /// Fixture names in setup order
    #[must_use]
    pub fn list(&self) -> Vec<&str> {
        self.slots.iter().map(|s| s.fixture.name()).collect()
    }
}

/// Owns a set-up [`FixtureManager`] and tears it down on drop.
#[derive(Debug)]
pub struct FixtureScope {
    manager: FixtureManager,
}

impl FixtureScope {
    /// Run `setup_all` and hold the fixtures for the rest of the test.
    ///
    /// # Errors
    ///
    /// Returns the setup error; nothing is left set up in that case.
    pub fn enter(mut manager: FixtureManager) -> HeadlessResult<Self> {
        manager.setup_all()?;
        Ok(Self { manager })
    }

    /// Borrow a fixture
    #[must_use]
    pub fn get<F: Fixture>(&self) -> Option<&F> {
        self.manager.get()
    }

    /// Mutably borrow a fixture
    #[must_use]
    pub fn get_mut<F: Fixture>(&mut self) -> Option<&mut F> {
        self.manager.get_mut()
    }
}

impl Drop for FixtureScope {
    fn drop(&mut self) {
        if let Err(e) = self.manager.teardown_all() {
            tracing::warn!(target: "jugar_headless::fixture", error = %e, "teardown on drop failed");
        }
    }
}
