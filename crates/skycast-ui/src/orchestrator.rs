//! Query orchestration: the single writer of [`AppState`].
//!
//! Every operation applies its synchronous transition before returning and
//! runs the rest on the current tokio runtime. Without a runtime nothing is
//! started and the state is left alone. Overlapping resolutions are not
//! fenced: whichever completes last decides the final state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use skycast_weather::{Geolocator, WeatherResolver};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error_mapping::{self, GEOLOCATION_UNSUPPORTED};
use crate::state::AppState;

#[derive(Clone)]
pub struct Orchestrator {
    inner: Arc<Inner>,
}

struct Inner {
    state: watch::Sender<AppState>,
    resolver: Arc<dyn WeatherResolver>,
    geolocator: Arc<dyn Geolocator>,
    started: AtomicBool,
}

impl Orchestrator {
    pub fn new(resolver: Arc<dyn WeatherResolver>, geolocator: Arc<dyn Geolocator>) -> Self {
        let (state, _) = watch::channel(AppState::default());
        Self {
            inner: Arc::new(Inner {
                state,
                resolver,
                geolocator,
                started: AtomicBool::new(false),
            }),
        }
    }

    /// Snapshot of the current state
    pub fn state(&self) -> AppState {
        self.inner.state.borrow().clone()
    }

    /// Receiver notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<AppState> {
        self.inner.state.subscribe()
    }

    /// Startup lookup from the current position. Runs at most once per orchestrator.
    pub fn start(&self) -> Option<JoinHandle<()>> {
        if self.inner.started.swap(true, Ordering::SeqCst) {
            tracing::debug!("Startup lookup already performed");
            return None;
        }
        tracing::info!("Starting with a lookup of the current position");
        self.use_current_location()
    }

    /// Resolve weather for `text`. Blank input is ignored and returns `None`.
    pub fn submit_query(&self, text: &str) -> Option<JoinHandle<()>> {
        let location = text.trim();
        if location.is_empty() {
            tracing::debug!("Ignoring empty query");
            return None;
        }

        let runtime = current_runtime()?;
        self.inner.state.send_modify(AppState::begin_resolution);

        let inner = Arc::clone(&self.inner);
        let location = location.to_string();
        Some(runtime.spawn(async move {
            inner.resolve(&location).await;
        }))
    }

    /// Resolve weather for wherever the geolocator says we are.
    ///
    /// Returns `None` when geolocation is unsupported; the error is set and
    /// nothing else happens. Also `None`, with the state untouched, when
    /// called outside a tokio runtime.
    pub fn use_current_location(&self) -> Option<JoinHandle<()>> {
        if !self.inner.geolocator.is_available() {
            tracing::warn!("Geolocation capability unavailable");
            self.inner
                .state
                .send_modify(|s| s.location_unsupported(GEOLOCATION_UNSUPPORTED));
            return None;
        }

        let runtime = current_runtime()?;
        self.inner.state.send_modify(AppState::begin_locating);

        let inner = Arc::clone(&self.inner);
        Some(runtime.spawn(async move {
            match inner.geolocator.current_position().await {
                Ok(position) => {
                    let query = position.query_string();
                    tracing::info!("Got location: {}", query);
                    inner.state.send_modify(AppState::begin_resolution);
                    inner.resolve(&query).await;
                }
                Err(e) => {
                    let message = error_mapping::location_message(&e);
                    inner.state.send_modify(|s| s.location_failed(message));
                }
            }
        }))
    }

    pub fn dismiss_error(&self) {
        self.inner.state.send_modify(AppState::dismiss_error);
    }
}

fn current_runtime() -> Option<Handle> {
    match Handle::try_current() {
        Ok(handle) => Some(handle),
        Err(e) => {
            tracing::error!("No tokio runtime to run the lookup on: {}", e);
            None
        }
    }
}

impl Inner {
    async fn resolve(&self, location: &str) {
        let outcome = self.resolver.resolve(location).await;
        self.state.send_modify(|s| match outcome {
            Ok(weather) => {
                tracing::info!("Weather resolved for {}", weather.city);
                s.resolved(weather);
            }
            Err(e) => {
                tracing::warn!("Failed to resolve weather for \"{}\": {}", location, e);
                s.failed(error_mapping::resolution_message(&e));
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::AtomicUsize;

    use async_trait::async_trait;
    use chrono::Utc;
    use parking_lot::Mutex;
    use skycast_weather::{Location, LocationError, ResolutionError, WeatherResult};
    use tokio::sync::oneshot;

    use crate::error_mapping::GEOLOCATION_FAILED;

    fn weather(city: &str) -> WeatherResult {
        WeatherResult {
            city: city.into(),
            temperature: "21°C".into(),
            condition: "Sunny".into(),
            humidity: "40%".into(),
            wind_speed: "8 km/h".into(),
            description: "Fine".into(),
            ai_advice: "Go outside".into(),
            sources: vec![],
            fetched_at: Utc::now(),
        }
    }

    /// Answers immediately; "Atlantis" is not found.
    #[derive(Default)]
    struct RecordingResolver {
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl WeatherResolver for RecordingResolver {
        async fn resolve(&self, location: &str) -> Result<WeatherResult, ResolutionError> {
            self.calls.lock().push(location.to_string());
            if location == "Atlantis" {
                Err(ResolutionError::NotFound(location.to_string()))
            } else {
                Ok(weather(location))
            }
        }
    }

    /// Each location waits until the test releases it.
    #[derive(Default)]
    struct GatedResolver {
        gates: Mutex<HashMap<String, oneshot::Receiver<Result<WeatherResult, ResolutionError>>>>,
    }

    impl GatedResolver {
        fn gate(&self, location: &str) -> oneshot::Sender<Result<WeatherResult, ResolutionError>> {
            let (tx, rx) = oneshot::channel();
            self.gates.lock().insert(location.to_string(), rx);
            tx
        }
    }

    #[async_trait]
    impl WeatherResolver for GatedResolver {
        async fn resolve(&self, location: &str) -> Result<WeatherResult, ResolutionError> {
            let gate = self.gates.lock().remove(location);
            match gate {
                Some(rx) => rx
                    .await
                    .unwrap_or_else(|_| Err(ResolutionError::Service("gate dropped".into()))),
                None => Err(ResolutionError::Service("no gate".into())),
            }
        }
    }

    struct FakeGeolocator {
        available: bool,
        result: Result<Location, LocationError>,
        calls: AtomicUsize,
    }

    impl FakeGeolocator {
        fn at(latitude: f64, longitude: f64) -> Self {
            Self {
                available: true,
                result: Ok(Location::new(latitude, longitude)),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing(error: LocationError) -> Self {
            Self {
                available: true,
                result: Err(error),
                calls: AtomicUsize::new(0),
            }
        }

        fn missing() -> Self {
            Self {
                available: false,
                result: Err(LocationError::ServiceUnavailable),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Geolocator for FakeGeolocator {
        fn is_available(&self) -> bool {
            self.available
        }

        async fn current_position(&self) -> Result<Location, LocationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone()
        }
    }

    fn orchestrator(
        resolver: Arc<dyn WeatherResolver>,
        geolocator: Arc<dyn Geolocator>,
    ) -> Orchestrator {
        Orchestrator::new(resolver, geolocator)
    }

    #[tokio::test]
    async fn submit_sets_loading_before_completion() {
        let resolver = Arc::new(RecordingResolver::default());
        let orch = orchestrator(resolver.clone(), Arc::new(FakeGeolocator::missing()));

        let handle = orch.submit_query("  Paris  ").unwrap();
        let pending = orch.state();
        assert!(pending.loading);
        assert!(pending.error.is_none());

        handle.await.unwrap();
        let done = orch.state();
        assert!(!done.loading);
        assert!(done.error.is_none());
        assert_eq!(done.weather.map(|w| w.city), Some("Paris".to_string()));
        assert_eq!(*resolver.calls.lock(), vec!["Paris".to_string()]);
    }

    #[tokio::test]
    async fn blank_query_changes_nothing() {
        let resolver = Arc::new(RecordingResolver::default());
        let orch = orchestrator(resolver.clone(), Arc::new(FakeGeolocator::missing()));
        let rx = orch.subscribe();

        assert!(orch.submit_query("").is_none());
        assert!(orch.submit_query("   \t\n").is_none());

        assert!(!rx.has_changed().unwrap());
        assert_eq!(orch.state(), AppState::default());
        assert!(resolver.calls.lock().is_empty());
    }

    #[test]
    fn without_runtime_nothing_starts() {
        let resolver = Arc::new(RecordingResolver::default());
        let geolocator = Arc::new(FakeGeolocator::at(48.8566, 2.3522));
        let orch = orchestrator(resolver.clone(), geolocator.clone());
        let rx = orch.subscribe();

        assert!(orch.submit_query("Paris").is_none());
        assert!(orch.use_current_location().is_none());

        assert!(!rx.has_changed().unwrap());
        assert_eq!(orch.state(), AppState::default());
        assert!(resolver.calls.lock().is_empty());
        assert_eq!(geolocator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_lookup_clears_previous_weather() {
        let orch = orchestrator(
            Arc::new(RecordingResolver::default()),
            Arc::new(FakeGeolocator::missing()),
        );

        orch.submit_query("Paris").unwrap().await.unwrap();
        assert!(orch.state().weather.is_some());

        let handle = orch.submit_query("Atlantis").unwrap();
        assert!(orch.state().weather.is_some(), "weather kept while loading");
        handle.await.unwrap();

        let state = orch.state();
        assert!(state.weather.is_none());
        assert!(!state.loading);
        let message = state.error.unwrap();
        assert_eq!(message, ResolutionError::NotFound("Atlantis".into()).to_string());
    }

    #[tokio::test]
    async fn success_after_failure_clears_error() {
        let orch = orchestrator(
            Arc::new(RecordingResolver::default()),
            Arc::new(FakeGeolocator::missing()),
        );

        orch.submit_query("Atlantis").unwrap().await.unwrap();
        assert!(orch.state().error.is_some());

        let handle = orch.submit_query("Lisbon").unwrap();
        assert!(orch.state().error.is_none());
        handle.await.unwrap();

        let state = orch.state();
        assert!(state.error.is_none());
        assert_eq!(state.weather.map(|w| w.city), Some("Lisbon".to_string()));
    }

    #[tokio::test]
    async fn dismiss_error_only_clears_error() {
        let orch = orchestrator(
            Arc::new(RecordingResolver::default()),
            Arc::new(FakeGeolocator::missing()),
        );

        orch.dismiss_error();
        assert_eq!(orch.state(), AppState::default());

        orch.submit_query("Atlantis").unwrap().await.unwrap();
        orch.dismiss_error();
        assert_eq!(orch.state(), AppState::default());

        orch.submit_query("Paris").unwrap().await.unwrap();
        let before = orch.state();
        orch.dismiss_error();
        assert_eq!(orch.state(), before);
    }

    #[tokio::test]
    async fn dismiss_error_while_loading_keeps_loading() {
        let resolver = Arc::new(GatedResolver::default());
        let orch = orchestrator(resolver.clone(), Arc::new(FakeGeolocator::missing()));

        assert!(orch.use_current_location().is_none());
        assert!(orch.state().error.is_some());

        let gate = resolver.gate("Rome");
        let handle = orch.submit_query("Rome").unwrap();
        orch.dismiss_error();
        assert!(orch.state().loading);

        gate.send(Ok(weather("Rome"))).unwrap();
        handle.await.unwrap();
        assert!(!orch.state().loading);
    }

    #[tokio::test]
    async fn missing_geolocation_sets_error_without_loading() {
        let resolver = Arc::new(RecordingResolver::default());
        let orch = orchestrator(resolver.clone(), Arc::new(FakeGeolocator::missing()));
        let mut rx = orch.subscribe();

        assert!(orch.use_current_location().is_none());

        let seen = rx.borrow_and_update().clone();
        assert!(!seen.loading);
        assert_eq!(seen.error.as_deref(), Some(GEOLOCATION_UNSUPPORTED));
        assert!(resolver.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn position_is_formatted_for_resolution() {
        let resolver = Arc::new(RecordingResolver::default());
        let orch = orchestrator(resolver.clone(), Arc::new(FakeGeolocator::at(40.7128, -74.006)));

        let handle = orch.use_current_location().unwrap();
        assert!(orch.state().loading);
        handle.await.unwrap();

        assert_eq!(*resolver.calls.lock(), vec!["40.7128, -74.006".to_string()]);
        let state = orch.state();
        assert!(!state.loading);
        assert!(state.weather.is_some());
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn denied_position_keeps_weather() {
        let resolver = Arc::new(RecordingResolver::default());
        let orch = orchestrator(
            resolver.clone(),
            Arc::new(FakeGeolocator::failing(LocationError::PermissionDenied)),
        );

        orch.submit_query("Oslo").unwrap().await.unwrap();

        let handle = orch.use_current_location().unwrap();
        assert!(orch.state().loading);
        handle.await.unwrap();

        let state = orch.state();
        assert!(!state.loading);
        assert_eq!(state.error.as_deref(), Some(GEOLOCATION_FAILED));
        assert_eq!(state.weather.map(|w| w.city), Some("Oslo".to_string()));
        assert_eq!(resolver.calls.lock().len(), 1);
    }

    #[tokio::test]
    async fn start_runs_location_lookup_once() {
        let geolocator = Arc::new(FakeGeolocator::at(51.5074, -0.1278));
        let resolver = Arc::new(RecordingResolver::default());
        let orch = orchestrator(resolver.clone(), geolocator.clone());

        let handle = orch.start().unwrap();
        assert!(orch.start().is_none());
        assert!(orch.clone().start().is_none());
        handle.await.unwrap();

        assert_eq!(geolocator.calls.load(Ordering::SeqCst), 1);
        assert_eq!(*resolver.calls.lock(), vec!["51.5074, -0.1278".to_string()]);
    }

    #[tokio::test]
    async fn last_completed_resolution_wins() {
        let resolver = Arc::new(GatedResolver::default());
        let orch = orchestrator(resolver.clone(), Arc::new(FakeGeolocator::missing()));

        let gate_a = resolver.gate("A");
        let gate_b = resolver.gate("B");
        let a = orch.submit_query("A").unwrap();
        let b = orch.submit_query("B").unwrap();

        gate_b.send(Ok(weather("B"))).unwrap();
        b.await.unwrap();
        assert_eq!(orch.state().weather.map(|w| w.city), Some("B".to_string()));

        gate_a.send(Ok(weather("A"))).unwrap();
        a.await.unwrap();

        let state = orch.state();
        assert_eq!(state.weather.map(|w| w.city), Some("A".to_string()));
        assert!(!state.loading);
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn subscribers_see_each_transition() {
        let resolver = Arc::new(GatedResolver::default());
        let orch = orchestrator(resolver.clone(), Arc::new(FakeGeolocator::missing()));
        let mut rx = orch.subscribe();

        let gate = resolver.gate("Kyoto");
        let handle = orch.submit_query("Kyoto").unwrap();
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().loading);

        gate.send(Ok(weather("Kyoto"))).unwrap();
        rx.changed().await.unwrap();
        let done = rx.borrow_and_update().clone();
        assert!(!done.loading);
        assert_eq!(done.weather.map(|w| w.city), Some("Kyoto".to_string()));
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn completion_without_subscribers_is_harmless() {
        let orch = orchestrator(
            Arc::new(RecordingResolver::default()),
            Arc::new(FakeGeolocator::missing()),
        );
        drop(orch.subscribe());
        orch.submit_query("Cairo").unwrap().await.unwrap();
        assert!(orch.state().weather.is_some());
    }
}
