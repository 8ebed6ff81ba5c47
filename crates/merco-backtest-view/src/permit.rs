/*
[INPUT]:  Acquire / release requests from single-flight operations
[OUTPUT]: Fail-fast ownership of a single slot
[POS]:    Coordination primitive - re-entrancy guard for one logical thread
[UPDATE]: When guard semantics change
*/

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PermitError {
    #[error("operation already in flight")]
    Busy,
}

/// Single-slot permit. Acquiring never waits: a held permit answers `Busy`.
///
/// The owning state machine is driven from one task, so this is a plain flag
/// rather than a lock.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Permit {
    held: bool,
}

impl Permit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_acquire(&mut self) -> Result<(), PermitError> {
        if self.held {
            return Err(PermitError::Busy);
        }
        self.held = true;
        Ok(())
    }

    pub fn release(&mut self) {
        self.held = false;
    }

    pub fn is_held(&self) -> bool {
        self.held
    }
}
