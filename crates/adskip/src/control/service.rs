// Background activation service: owns the persisted flag and the blackhole
// proxy, and answers control requests.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::control::protocol::{ControlAction, ControlResponse, Status};
use crate::control::proxy::BlackholeProxy;
use crate::control::store::ActivationStore;
use crate::error::Result;
use crate::pac::PacRules;

pub struct ControlService {
    store: Arc<dyn ActivationStore>,
    proxy: Arc<dyn BlackholeProxy>,
    pac_script: String,
}

impl ControlService {
    pub fn new(
        store: Arc<dyn ActivationStore>,
        proxy: Arc<dyn BlackholeProxy>,
        rules: &PacRules,
    ) -> Self {
        Self {
            store,
            proxy,
            pac_script: rules.render(),
        }
    }

    pub fn pac_script(&self) -> &str {
        &self.pac_script
    }

    /// Bring the proxy in line with the persisted flag.
    ///
    /// Failures are logged; the returned status is the persisted one.
    pub async fn init(&self) -> Status {
        let active = match self.store.load_or_default().await {
            Ok(active) => active,
            Err(e) => {
                warn!(error = %e, "Failed to read activation state, assuming default");
                crate::control::store::DEFAULT_ACTIVE
            }
        };

        if active {
            if let Err(e) = self.enable().await {
                warn!(error = %e, "Failed to enable blackhole proxy at startup");
            }
        } else if let Err(e) = self.disable().await {
            warn!(error = %e, "Failed to clear blackhole proxy at startup");
        }
        Status::from_active(active)
    }

    /// Install the proxy, then persist `true`.
    pub async fn enable(&self) -> Result<()> {
        self.proxy.enable(&self.pac_script).await?;
        self.store.save(true).await?;
        info!("Ad blocking enabled");
        Ok(())
    }

    /// Clear the proxy, then persist `false`.
    pub async fn disable(&self) -> Result<()> {
        self.proxy.clear().await?;
        self.store.save(false).await?;
        info!("Ad blocking disabled");
        Ok(())
    }

    pub async fn status(&self) -> Result<Status> {
        Ok(Status::from_active(self.store.load_or_default().await?))
    }

    /// Answer a raw control request.
    pub async fn handle(&self, request: &Value) -> ControlResponse {
        match ControlAction::decode(request) {
            Ok(action) => self.dispatch(action).await,
            Err(code) => {
                debug!(%request, code, "Rejected control request");
                ControlResponse::rejected(code)
            }
        }
    }

    pub async fn dispatch(&self, action: ControlAction) -> ControlResponse {
        debug!(%action, "Handling control request");
        match action {
            ControlAction::GetStatus => match self.status().await {
                Ok(status) => ControlResponse::ok(status),
                Err(e) => ControlResponse::rejected(&e.to_string()),
            },
            ControlAction::ToggleRules => match self.status().await {
                Ok(Status::Active) => self.switch(false).await,
                Ok(Status::Inactive) => self.switch(true).await,
                Err(e) => ControlResponse::rejected(&e.to_string()),
            },
            ControlAction::Enable => self.switch(true).await,
            ControlAction::Disable => self.switch(false).await,
        }
    }

    async fn switch(&self, active: bool) -> ControlResponse {
        let result = if active {
            self.enable().await
        } else {
            self.disable().await
        };
        match result {
            Ok(()) => ControlResponse::ok(Status::from_active(active)),
            Err(e) => {
                warn!(error = %e, active, "Failed to switch ad blocking");
                ControlResponse::failed(Status::from_active(!active), e.to_string())
            }
        }
    }
}
