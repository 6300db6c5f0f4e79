//! Helpers shared by the integration tests

use erp_core::{
    ACCESS_KEY, CredentialStore, MemoryStore, REFRESH_KEY, SessionError, SessionResult,
};
use std::sync::atomic::{AtomicBool, Ordering};

/// In-memory store whose writes or removals can be switched to failing
#[derive(Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    failing_sets: AtomicBool,
    failing_removes: AtomicBool,
}

impl FlakyStore {
    /// Store holding access `tok-A` and refresh `ref-B`
    pub fn with_tokens() -> Self {
        let store = Self::default();
        store.inner.set(ACCESS_KEY, "tok-A").unwrap();
        store.inner.set(REFRESH_KEY, "ref-B").unwrap();
        store
    }

    #[allow(dead_code)]
    pub fn fail_sets(&self) {
        self.failing_sets.store(true, Ordering::SeqCst);
    }

    #[allow(dead_code)]
    pub fn fail_removes(&self) {
        self.failing_removes.store(true, Ordering::SeqCst);
    }
}

fn check(failing: &AtomicBool) -> SessionResult<()> {
    if failing.load(Ordering::SeqCst) {
        Err(SessionError::unavailable("disk full"))
    } else {
        Ok(())
    }
}

impl CredentialStore for FlakyStore {
    fn get(&self, key: &str) -> SessionResult<Option<String>> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> SessionResult<()> {
        check(&self.failing_sets)?;
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> SessionResult<()> {
        check(&self.failing_removes)?;
        self.inner.remove(key)
    }
}
