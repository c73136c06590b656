//! Advisory lock guard

use crate::error::DbResult;
use crate::session::Session;
use std::ops::{Deref, DerefMut};

/// Lock key shared by the migrator and the code package installer
pub const LOCK_KEY: i64 = 9628173550095224;

/// Holds the advisory lock for as long as it lives.
///
/// Call [`AdvisoryLock::release`] to unlock and observe failures. Dropping
/// the guard without releasing unlocks on a best effort basis. The server
/// also drops the lock when the session ends.
pub struct AdvisoryLock<'s> {
    session: &'s mut dyn Session,
    key: i64,
    held: bool,
}

impl<'s> AdvisoryLock<'s> {
    /// Acquire the shared migration lock, blocking until granted
    pub fn acquire(session: &'s mut dyn Session) -> DbResult<Self> {
        Self::acquire_key(session, LOCK_KEY)
    }

    /// Acquire an arbitrary advisory lock key
    pub fn acquire_key(session: &'s mut dyn Session, key: i64) -> DbResult<Self> {
        log::debug!("Acquiring advisory lock {}", key);
        session.advisory_lock(key)?;
        Ok(Self {
            session,
            key,
            held: true,
        })
    }

    /// Release the lock, reporting unlock failures
    pub fn release(mut self) -> DbResult<()> {
        self.held = false;
        log::debug!("Releasing advisory lock {}", self.key);
        self.session.advisory_unlock(self.key)
    }
}

impl<'s> Deref for AdvisoryLock<'s> {
    type Target = dyn Session + 's;

    fn deref(&self) -> &Self::Target {
        &*self.session
    }
}

impl<'s> DerefMut for AdvisoryLock<'s> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.session
    }
}

impl Drop for AdvisoryLock<'_> {
    fn drop(&mut self) {
        if self.held {
            if let Err(e) = self.session.advisory_unlock(self.key) {
                log::warn!("Failed to release advisory lock {}: {}", self.key, e);
            }
        }
    }
}

#[cfg(test)]
#[path = "lock_test.rs"]
mod tests;
