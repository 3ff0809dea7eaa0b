// Periodic fallback scanner: catches overlays the mutation feed missed by
// querying a fixed selector list on a timer.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::control::local::ActivationFlag;
use crate::detection::MIN_TICK;
use crate::detection::overlay_scan::OverlayScanner;
use crate::dom::Document;
use crate::mitigation::overlay::OverlayMitigator;

pub struct PeriodicScanner {
    scanner: OverlayScanner,
    selectors: Vec<String>,
    period: Duration,
    mitigator: Arc<OverlayMitigator>,
    active: ActivationFlag,
}

impl PeriodicScanner {
    pub fn new(
        scanner: OverlayScanner,
        selectors: Vec<String>,
        period: Duration,
        mitigator: Arc<OverlayMitigator>,
        active: ActivationFlag,
    ) -> Self {
        Self {
            scanner,
            selectors,
            period: period.max(MIN_TICK),
            mitigator,
            active,
        }
    }

    /// Query each selector once. A hit only counts if the recursive check
    /// agrees with it.
    pub fn scan_once(&self, document: &dyn Document) -> bool {
        self.selectors.iter().any(|selector| {
            document
                .query_selector(selector)
                .is_some_and(|node| self.scanner.check_node(&node))
        })
    }

    /// Scan every period until `token` is cancelled.
    pub async fn run(&self, document: Arc<dyn Document>, token: CancellationToken) {
        let mut ticker = interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    debug!("Periodic overlay scan stopped");
                    return;
                }
                _ = ticker.tick() => {}
            }

            if !self.active.is_active() {
                continue;
            }
            if self.scan_once(document.as_ref()) {
                info!("Periodic scan found an ad overlay");
                self.mitigator.on_overlay_detected(document.as_ref()).await;
            }
        }
    }
}
