//! `window.navigator` stand-in.

use super::service_worker::ServiceWorkerContainer;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// User agent reported when none is configured
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) jugar-headless";

/// `navigator.clipboard`
#[derive(Debug, Clone, Default)]
pub struct MockClipboard {
    text: Arc<Mutex<String>>,
}

impl MockClipboard {
    /// `writeText(text)`
    pub async fn write_text(&self, text: &str) {
        *self.text.lock().unwrap_or_else(PoisonError::into_inner) = text.to_string();
    }

    /// `readText()`
    pub async fn read_text(&self) -> String {
        self.text
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Empty the clipboard
    pub fn clear(&self) {
        self.text.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

/// Navigator properties visible to the code under test
#[derive(Debug, Clone)]
pub struct MockNavigator {
    /// `navigator.userAgent`
    pub user_agent: String,
    /// `navigator.language`
    pub language: String,
    /// `navigator.languages`
    pub languages: Vec<String>,
    /// `navigator.clipboard`
    pub clipboard: MockClipboard,
    /// `navigator.serviceWorker`
    pub service_worker: ServiceWorkerContainer,
    online: Arc<AtomicBool>,
}

impl Default for MockNavigator {
    fn default() -> Self {
        Self::new(DEFAULT_USER_AGENT, "en-US")
    }
}

impl MockNavigator {
    /// Create an online navigator
    #[must_use]
    pub fn new(user_agent: &str, language: &str) -> Self {
        Self {
            user_agent: user_agent.to_string(),
            language: language.to_string(),
            languages: vec![language.to_string()],
            clipboard: MockClipboard::default(),
            service_worker: ServiceWorkerContainer::new(),
            online: Arc::new(AtomicBool::new(true)),
        }
    }

    /// `navigator.onLine`
    #[must_use]
    pub fn on_line(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    /// Simulate going online or offline
    pub fn set_on_line(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    /// Restore online state and drop clipboard and worker state
    pub fn reset(&self) {
        self.set_on_line(true);
        self.clipboard.clear();
        self.service_worker.reset();
    }
}
