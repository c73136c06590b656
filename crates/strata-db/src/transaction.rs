//! Transaction guard

use crate::error::DbResult;
use crate::session::Session;
use std::ops::{Deref, DerefMut};

/// An open transaction that rolls back when dropped uncommitted
pub struct Transaction<'s> {
    session: &'s mut dyn Session,
    open: bool,
}

impl<'s> Transaction<'s> {
    /// Begin a transaction on `session`
    pub fn begin(session: &'s mut dyn Session) -> DbResult<Self> {
        session.begin()?;
        Ok(Self {
            session,
            open: true,
        })
    }

    /// Commit the transaction
    pub fn commit(mut self) -> DbResult<()> {
        self.open = false;
        self.session.commit()
    }

    /// Roll the transaction back explicitly
    pub fn rollback(mut self) -> DbResult<()> {
        self.open = false;
        self.session.rollback()
    }
}

impl<'s> Deref for Transaction<'s> {
    type Target = dyn Session + 's;

    fn deref(&self) -> &Self::Target {
        &*self.session
    }
}

impl<'s> DerefMut for Transaction<'s> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.session
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if self.open {
            log::debug!("Rolling back uncommitted transaction");
            if let Err(e) = self.session.rollback() {
                log::warn!("Rollback failed: {}", e);
            }
        }
    }
}

#[cfg(test)]
#[path = "transaction_test.rs"]
mod tests;
