// Content-context mirror of the activation state.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::info;

use crate::control::protocol::{ControlAction, ControlResponse, Status};

/// Shared on/off switch read by every detection path of one content context.
#[derive(Debug, Clone)]
pub struct ActivationFlag {
    active: Arc<AtomicBool>,
}

impl Default for ActivationFlag {
    fn default() -> Self {
        Self::new(crate::control::store::DEFAULT_ACTIVE)
    }
}

impl ActivationFlag {
    pub fn new(active: bool) -> Self {
        Self {
            active: Arc::new(AtomicBool::new(active)),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub fn set(&self, active: bool) {
        let previous = self.active.swap(active, Ordering::AcqRel);
        if previous != active {
            info!(active, "Content context activation changed");
        }
    }

    pub fn status(&self) -> Status {
        Status::from_active(self.is_active())
    }

    /// Apply a control action locally. Never fails.
    pub fn apply(&self, action: ControlAction) -> ControlResponse {
        match action {
            ControlAction::GetStatus => {}
            ControlAction::ToggleRules => {
                let previous = self.active.fetch_xor(true, Ordering::AcqRel);
                info!(active = !previous, "Content context activation toggled");
            }
            ControlAction::Enable => self.set(true),
            ControlAction::Disable => self.set(false),
        }
        ControlResponse::ok(self.status())
    }
}
