//! Loan transitions for persisted copies.
//!
//! ```text
//!            acquire
//! Available ─────────▶ Loaned
//!     ▲                  │
//!     └──────────────────┘
//!            release
//! ```
//!
//! Each transition is one conditional `UPDATE` whose `WHERE` clause carries
//! the expected current state. The engine's affected-row count is the only
//! success signal: 1 means the transition happened, 0 means the copy does not
//! exist or was not in the expected state. Callers must not read the flag
//! first and write afterwards.

use tracing::{debug, warn};

use super::sql;
use super::sqlite::SqliteLibrary;
use super::{Result, StorageError};
use crate::domain::{LoanState, Uuid};

/// A loan state transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoanTransition {
    Acquire,
    Release,
}

impl LoanTransition {
    /// State the copy must be in for the transition to apply
    pub fn required(&self) -> LoanState {
        match self {
            Self::Acquire => LoanState::Available,
            Self::Release => LoanState::Loaned,
        }
    }

    /// State the copy is in afterwards
    pub fn resulting(&self) -> LoanState {
        match self {
            Self::Acquire => LoanState::Loaned,
            Self::Release => LoanState::Available,
        }
    }

    fn statement(&self) -> &'static str {
        match self {
            Self::Acquire => sql::ACQUIRE,
            Self::Release => sql::RELEASE,
        }
    }
}

impl SqliteLibrary {
    /// Check out the copy with `uuid`.
    ///
    /// Fails with [`StorageError::InvalidArgument`] if the copy does not exist
    /// or is already on loan. Of any number of concurrent callers for the same
    /// copy, exactly one succeeds.
    pub fn acquire(&self, uuid: &Uuid) -> Result<()> {
        self.transition(uuid, LoanTransition::Acquire)
    }

    /// Return the copy with `uuid`.
    ///
    /// Fails with [`StorageError::InvalidArgument`] if the copy does not exist
    /// or is not on loan.
    pub fn release(&self, uuid: &Uuid) -> Result<()> {
        self.transition(uuid, LoanTransition::Release)
    }

    fn transition(&self, uuid: &Uuid, transition: LoanTransition) -> Result<()> {
        let affected = self.execute(transition.statement(), [uuid.serialize().as_str()])?;

        match affected {
            1 => {
                debug!(
                    %uuid,
                    from = transition.required().as_str(),
                    to = transition.resulting().as_str(),
                    "Loan transition applied"
                );
                Ok(())
            }
            0 => {
                warn!(%uuid, ?transition, "Loan transition rejected");
                Err(StorageError::InvalidArgument(format!(
                    "record {} does not exist or is not {}",
                    uuid,
                    transition.required().as_str()
                )))
            }
            // uuid is the primary key
            n => Err(StorageError::Database(
                rusqlite::Error::StatementChangedRows(n),
            )),
        }
    }
}
