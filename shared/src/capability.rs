use std::panic::{self, AssertUnwindSafe};

use log::warn;
use thiserror::Error as ThisError;

use crate::{AgentKey, AuthorityError, Candidate, Eligibility, HostType};

/// Error a user hook hands back to signal it could not do its job.
#[derive(Debug, Clone, ThisError, PartialEq, Eq)]
#[error("{0}")]
pub struct HookError(pub String);

impl From<&str> for HookError {
    fn from(message: &str) -> Self {
        HookError(message.to_string())
    }
}

impl From<String> for HookError {
    fn from(message: String) -> Self {
        HookError(message)
    }
}

pub type HookResult<T> = Result<T, HookError>;

/// Owner transition reported to a pawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OwnerChange {
    pub old: Option<AgentKey>,
    pub new: Option<AgentKey>,
}

/// Something an agent can own.
pub trait Ownable {
    /// Extra, pawn specific policy. Runs after the shared policy in
    /// [`crate::allow_ownership`] has already allowed the candidate, so it can
    /// only narrow who may own the pawn.
    fn allow_ownership(&self, _candidate: &Candidate) -> HookResult<Eligibility> {
        Ok(Eligibility::Allowed)
    }

    fn on_owner_changed(&mut self, _change: &OwnerChange) -> HookResult<()> {
        Ok(())
    }
}

/// Something that does work on the simulation tick.
pub trait Tickable {
    fn can_simulate(&self) -> bool {
        true
    }

    fn simulate(&mut self, _delta_seconds: f32) -> HookResult<()> {
        Ok(())
    }
}

pub trait NetworkAuthoritative {
    fn host_type(&self) -> HostType;

    fn is_authoritative(&self) -> bool {
        self.host_type().is_server()
    }
}

/// Runs a user hook, turning both an `Err` and a panic into
/// [`AuthorityError::CallbackFault`]. The caller picks the fallback.
pub fn run_hook<T>(
    hook: &'static str,
    f: impl FnOnce() -> HookResult<T>,
) -> Result<T, AuthorityError> {
    let fault = match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => return Ok(value),
        Ok(Err(error)) => error.0,
        Err(payload) => panic_message(payload.as_ref()),
    };

    warn!("hook '{}' faulted: {}", hook, fault);
    Err(AuthorityError::CallbackFault {
        hook,
        message: fault,
    })
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        return format!("panicked: {}", message);
    }
    if let Some(message) = payload.downcast_ref::<String>() {
        return format!("panicked: {}", message);
    }
    "panicked".to_string()
}
