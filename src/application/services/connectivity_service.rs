use crate::application::ports::ReachabilityProbe;
use crate::domain::entities::sync::ConnectivityState;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Single authoritative reachability signal for the whole process.
///
/// A default state (offline, unknown link) is observable immediately;
/// the first probe corrects it asynchronously, so no caller ever blocks
/// waiting for an initial reading.
pub struct ConnectivityService {
    probe: Arc<dyn ReachabilityProbe>,
    state_tx: watch::Sender<ConnectivityState>,
}

impl ConnectivityService {
    pub fn new(probe: Arc<dyn ReachabilityProbe>) -> Self {
        let (state_tx, _) = watch::channel(ConnectivityState::unknown());
        Self { probe, state_tx }
    }

    pub fn current(&self) -> ConnectivityState {
        *self.state_tx.borrow()
    }

    pub fn is_online(&self) -> bool {
        self.state_tx.borrow().is_online
    }

    /// Watch channel for transition-driven consumers (drain-on-reconnect,
    /// the status indicator). Only actual state changes wake watchers.
    pub fn subscribe(&self) -> watch::Receiver<ConnectivityState> {
        self.state_tx.subscribe()
    }

    /// Run one probe now and publish the result.
    pub async fn refresh(&self) -> ConnectivityState {
        let next = self.probe.probe().await;
        self.publish(next);
        next
    }

    fn publish(&self, next: ConnectivityState) {
        self.state_tx.send_if_modified(|state| {
            if *state != next {
                tracing::info!(
                    is_online = next.is_online,
                    network_type = %next.network_type,
                    "connectivity changed"
                );
                *state = next;
                true
            } else {
                false
            }
        });
    }

    /// Probe once immediately, then keep re-probing on the given interval.
    /// Aborting the handle stops the monitor and releases the probe.
    pub fn spawn_monitor(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let service = Arc::clone(self);
        tokio::spawn(async move {
            service.refresh().await;
            let mut ticker = tokio::time::interval(interval);
            // the immediate first tick duplicates the probe above
            ticker.tick().await;
            loop {
                ticker.tick().await;
                service.refresh().await;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::NetworkType;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use tokio::sync::Mutex;

    struct ScriptedProbe {
        states: Mutex<VecDeque<ConnectivityState>>,
    }

    impl ScriptedProbe {
        fn new(states: Vec<ConnectivityState>) -> Self {
            Self {
                states: Mutex::new(states.into()),
            }
        }
    }

    #[async_trait]
    impl ReachabilityProbe for ScriptedProbe {
        async fn probe(&self) -> ConnectivityState {
            self.states
                .lock()
                .await
                .pop_front()
                .unwrap_or_else(ConnectivityState::offline)
        }
    }

    #[tokio::test]
    async fn default_state_is_available_before_first_probe() {
        let service = ConnectivityService::new(Arc::new(ScriptedProbe::new(vec![])));
        let state = service.current();
        assert!(!state.is_online);
        assert_eq!(state.network_type, NetworkType::Unknown);
    }

    #[tokio::test]
    async fn refresh_publishes_probe_result() {
        let service = ConnectivityService::new(Arc::new(ScriptedProbe::new(vec![
            ConnectivityState::online(NetworkType::Wifi),
        ])));

        let state = service.refresh().await;
        assert!(state.is_online);
        assert!(service.is_online());
        assert_eq!(service.current().network_type, NetworkType::Wifi);
    }

    #[tokio::test]
    async fn watchers_wake_only_on_transitions() {
        let service = ConnectivityService::new(Arc::new(ScriptedProbe::new(vec![
            ConnectivityState::online(NetworkType::Wifi),
            ConnectivityState::online(NetworkType::Wifi),
            ConnectivityState::offline(),
        ])));
        let mut rx = service.subscribe();
        rx.borrow_and_update();

        service.refresh().await;
        assert!(rx.has_changed().unwrap());
        rx.borrow_and_update();

        // identical reading: no wake-up
        service.refresh().await;
        assert!(!rx.has_changed().unwrap());

        service.refresh().await;
        assert!(rx.has_changed().unwrap());
        assert!(!rx.borrow_and_update().is_online);
    }
}
