use std::sync::Arc;

use crate::timer::{TimerDriver, TokioTimer};

use super::{config::HubConfig, hub::Hub};

/// Builder for constructing a Hub with non-default settings.
pub struct HubBuilder {
    cfg: HubConfig,
    timer: Option<Arc<dyn TimerDriver>>,
}

impl HubBuilder {
    /// Creates a new builder with the default configuration.
    pub fn new() -> Self {
        Self {
            cfg: HubConfig::default(),
            timer: None,
        }
    }

    /// Sets the hub configuration.
    pub fn with_config(mut self, cfg: HubConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Sets the timer driver used to arm delayed-firing timers.
    ///
    /// Defaults to [`TokioTimer`], which needs a running Tokio runtime by
    /// the time the first delay is granted. Embedders without a runtime, and
    /// tests that want full control over time, plug their own driver in
    /// here.
    pub fn with_timer(mut self, timer: Arc<dyn TimerDriver>) -> Self {
        self.timer = Some(timer);
        self
    }

    /// Builds and returns the Hub instance.
    ///
    /// This consumes the builder. The hub is allocated with
    /// `Arc::new_cyclic` so it can hand a weak self-reference to the timer
    /// callbacks it arms later; pending delays therefore never keep a
    /// dropped hub alive.
    pub fn build(self) -> Arc<Hub> {
        let timer = self
            .timer
            .unwrap_or_else(|| Arc::new(TokioTimer) as Arc<dyn TimerDriver>);
        Arc::new_cyclic(|weak| Hub::new_internal(self.cfg, timer, weak.clone()))
    }
}

impl Default for HubBuilder {
    fn default() -> Self {
        Self::new()
    }
}
