use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::derivation::{derive_view, DerivedView};
use crate::models::{CompanyMetricsResponse, MetricsSelector, RawMetrics};
use crate::source::{MetricsSource, SourceError};

#[derive(Debug, Clone, Copy, Default)]
pub struct ControllerConfig {
    /// Fail a fetch that has not settled within this long.
    pub fetch_timeout: Option<Duration>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub selector: MetricsSelector,
    /// Generation of the request this snapshot belongs to.
    pub request: u64,
    pub data: Option<CompanyMetricsResponse>,
    pub loading: bool,
    pub error: String,
    pub computed: DerivedView,
}

impl MetricsSnapshot {
    fn initial(selector: MetricsSelector) -> Self {
        Self {
            selector,
            request: 0,
            data: None,
            loading: true,
            error: String::new(),
            computed: derive_view(&RawMetrics::default()),
        }
    }

    pub fn has_error(&self) -> bool {
        !self.error.is_empty()
    }
}

struct Shared {
    state: watch::Sender<MetricsSnapshot>,
    alive: AtomicBool,
}

impl Shared {
    /// Starts a new generation for `selector` and returns its token.
    fn begin(&self, selector: MetricsSelector) -> u64 {
        let mut token = 0;
        self.state.send_modify(|snapshot| {
            snapshot.request += 1;
            snapshot.selector = selector;
            snapshot.loading = true;
            snapshot.error.clear();
            token = snapshot.request;
        });
        token
    }

    /// Applies a settled fetch. Returns false when the result was discarded.
    fn settle(&self, token: u64, outcome: Result<CompanyMetricsResponse, SourceError>) -> bool {
        self.state.send_if_modified(|snapshot| {
            if !self.alive.load(Ordering::Acquire) {
                debug!(request = token, "discarding result after teardown");
                return false;
            }
            if snapshot.request != token {
                debug!(
                    request = token,
                    current = snapshot.request,
                    "discarding stale metrics response"
                );
                return false;
            }

            match outcome {
                Ok(response) => {
                    debug!(request = token, company = %response.company_id, "applying metrics response");
                    snapshot.computed = derive_view(&response.metrics);
                    snapshot.data = Some(response);
                    snapshot.error.clear();
                }
                Err(err) => {
                    warn!(request = token, selector = ?snapshot.selector, error = %err, "metrics fetch failed");
                    snapshot.computed = derive_view(&RawMetrics::default());
                    snapshot.data = None;
                    snapshot.error = err.to_string();
                }
            }
            snapshot.loading = false;
            true
        })
    }
}

/// Owns the metrics request lifecycle for one dashboard view. Only the
/// latest request may change state; stale results are dropped.
///
/// Must be created inside a tokio runtime. Dropping the controller tears it
/// down.
pub struct MetricsController {
    source: Arc<dyn MetricsSource>,
    shared: Arc<Shared>,
    config: ControllerConfig,
}

impl MetricsController {
    pub fn new(
        source: Arc<dyn MetricsSource>,
        selector: MetricsSelector,
        config: ControllerConfig,
    ) -> Self {
        let (state, _) = watch::channel(MetricsSnapshot::initial(selector));
        let controller = Self {
            source,
            shared: Arc::new(Shared {
                state,
                alive: AtomicBool::new(true),
            }),
            config,
        };
        controller.issue(selector);
        controller
    }

    pub fn subscribe(&self) -> watch::Receiver<MetricsSnapshot> {
        self.shared.state.subscribe()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        self.shared.state.borrow().clone()
    }

    pub fn selector(&self) -> MetricsSelector {
        self.shared.state.borrow().selector
    }

    pub fn set_selector(&self, year: i32, month: u32) {
        self.issue(MetricsSelector::new(year, month));
    }

    /// Re-issues the current selector as a new request.
    pub fn reload(&self) {
        self.issue(self.selector());
    }

    pub fn is_alive(&self) -> bool {
        self.shared.alive.load(Ordering::Acquire)
    }

    /// Stops all further state changes. Pending fetches still run to
    /// completion but their results are dropped.
    pub fn teardown(&self) {
        // Flip under the channel lock so no settle can be mid-write.
        let mut was_alive = false;
        self.shared.state.send_if_modified(|_| {
            was_alive = self.shared.alive.swap(false, Ordering::AcqRel);
            false
        });
        if was_alive {
            debug!("metrics controller torn down");
        }
    }

    fn issue(&self, selector: MetricsSelector) {
        if !self.is_alive() {
            warn!(?selector, "ignoring request on torn down controller");
            return;
        }

        let token = self.shared.begin(selector);
        debug!(request = token, ?selector, "issuing metrics request");

        let source = Arc::clone(&self.source);
        let shared = Arc::clone(&self.shared);
        let timeout = self.config.fetch_timeout;
        tokio::spawn(async move {
            let outcome = fetch(source.as_ref(), selector, timeout).await;
            shared.settle(token, outcome);
        });
    }
}

impl Drop for MetricsController {
    fn drop(&mut self) {
        self.teardown();
    }
}

async fn fetch(
    source: &dyn MetricsSource,
    selector: MetricsSelector,
    timeout: Option<Duration>,
) -> Result<CompanyMetricsResponse, SourceError> {
    match timeout {
        Some(limit) => tokio::time::timeout(limit, source.fetch_company_metrics(selector))
            .await
            .unwrap_or(Err(SourceError::Timeout(limit))),
        None => source.fetch_company_metrics(selector).await,
    }
}
