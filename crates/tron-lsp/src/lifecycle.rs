//! Session phase state machine
//!
//! `Uninitialized -> Initializing -> Initialized -> ShuttingDown -> Exited`. Requests other
//! than the lifecycle ones are only legal in `Initialized`.
use parking_lot::Mutex;
use tower_lsp::jsonrpc::{Error, ErrorCode, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    Initializing,
    Initialized,
    ShuttingDown,
    Exited,
}

#[derive(Debug)]
pub struct Lifecycle {
    phase: Mutex<Phase>,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self {
            phase: Mutex::new(Phase::Uninitialized),
        }
    }
}

pub fn not_initialized() -> Error {
    Error {
        code: ErrorCode::ServerError(-32002),
        message: "server not initialized".into(),
        data: None,
    }
}

fn shutting_down() -> Error {
    Error {
        code: ErrorCode::InvalidRequest,
        message: "server is shutting down".into(),
        data: None,
    }
}

impl Lifecycle {
    pub fn phase(&self) -> Phase {
        *self.phase.lock()
    }

    /// `initialize` request.
    pub fn begin_initialize(&self) -> Result<()> {
        let mut phase = self.phase.lock();
        match *phase {
            Phase::Uninitialized => {
                *phase = Phase::Initializing;
                Ok(())
            }
            Phase::ShuttingDown | Phase::Exited => Err(shutting_down()),
            Phase::Initializing | Phase::Initialized => Err(Error::invalid_request()),
        }
    }

    /// `initialized` notification. Returns false when it arrives out of order.
    pub fn finish_initialize(&self) -> bool {
        let mut phase = self.phase.lock();
        if *phase == Phase::Initializing {
            *phase = Phase::Initialized;
            true
        } else {
            false
        }
    }

    /// `shutdown` request. Never terminates anything by itself.
    pub fn begin_shutdown(&self) -> Result<()> {
        let mut phase = self.phase.lock();
        match *phase {
            Phase::Initializing | Phase::Initialized => {
                *phase = Phase::ShuttingDown;
                Ok(())
            }
            Phase::Uninitialized => Err(not_initialized()),
            Phase::ShuttingDown | Phase::Exited => Err(shutting_down()),
        }
    }

    /// `exit` notification (or the connection closing). Returns the process exit code:
    /// 0 when a shutdown request came first, 1 otherwise.
    pub fn exit(&self) -> i32 {
        let mut phase = self.phase.lock();
        let code = if *phase == Phase::ShuttingDown { 0 } else { 1 };
        *phase = Phase::Exited;
        code
    }

    /// Gate for every non-lifecycle request.
    pub fn guard(&self) -> Result<()> {
        match self.phase() {
            Phase::Initialized => Ok(()),
            Phase::Uninitialized | Phase::Initializing => Err(not_initialized()),
            Phase::ShuttingDown | Phase::Exited => Err(shutting_down()),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.phase() == Phase::Initialized
    }
}
