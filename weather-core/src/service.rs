//! The weather lookup service.
//!
//! Each lookup issues exactly one provider call. Results are available three ways:
//! - [`WeatherService::lookup`] returns the per-call `Result`
//! - [`WeatherService::fetch_current_weather`] runs the lookup in the background and
//!   hands successes to every [`Subscription`] and to the [`WeatherService::latest`] observer
//! - [`WeatherService::lookup_or_log`] collapses failures to `None` after logging them

use std::{collections::HashMap, fmt, sync::Arc, sync::Weak};

use parking_lot::{Mutex, ReentrantMutex};
use tokio::{runtime::Handle, sync::watch, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::{
    config::{Config, CredentialSource},
    error::WeatherError,
    model::{CurrentWeather, WeatherRequest},
    provider::{WeatherProvider, provider_from_config},
};

type Callback = Arc<dyn Fn(&CurrentWeather) + Send + Sync>;

#[derive(Default)]
struct Subscribers {
    next_id: u64,
    callbacks: HashMap<u64, Callback>,
}

struct Shared {
    provider: Arc<dyn WeatherProvider>,
    subscribers: Mutex<Subscribers>,
    /// Held for a whole delivery so publishes do not interleave and a dropped
    /// `Subscription` waits for an in-progress delivery to finish.
    delivery: ReentrantMutex<()>,
    latest: watch::Sender<Option<CurrentWeather>>,
    cancel: CancellationToken,
}

/// Cheap to clone; clones share subscribers, the latest result and the shutdown token.
#[derive(Clone)]
pub struct WeatherService {
    shared: Arc<Shared>,
}

impl fmt::Debug for WeatherService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeatherService")
            .field("provider", &self.shared.provider)
            .field("subscribers", &self.shared.subscribers.lock().callbacks.len())
            .field("shut_down", &self.shared.cancel.is_cancelled())
            .finish()
    }
}

impl WeatherService {
    pub fn new(provider: Arc<dyn WeatherProvider>) -> Self {
        let (latest, _) = watch::channel(None);
        Self {
            shared: Arc::new(Shared {
                provider,
                subscribers: Mutex::new(Subscribers::default()),
                delivery: ReentrantMutex::new(()),
                latest,
                cancel: CancellationToken::new(),
            }),
        }
    }

    /// Build the OpenWeather-backed service; the environment key overrides the file key.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Self::from_config_with(config, &config.credentials())
    }

    pub fn from_config_with(
        config: &Config,
        credentials: &dyn CredentialSource,
    ) -> anyhow::Result<Self> {
        let provider = provider_from_config(config, credentials)?;
        Ok(Self::new(Arc::new(provider)))
    }

    /// Look up current weather and return this call's own outcome.
    pub async fn lookup(&self, request: &WeatherRequest) -> Result<CurrentWeather, WeatherError> {
        request.validate()?;
        self.shared.provider.current_weather(request).await
    }

    /// Like [`lookup`](Self::lookup), but failures are logged and dropped.
    pub async fn lookup_or_log(&self, request: &WeatherRequest) -> Option<CurrentWeather> {
        match self.lookup(request).await {
            Ok(weather) => Some(weather),
            Err(err) => {
                log_failure(request, &err);
                None
            }
        }
    }

    /// Start a background lookup whose success is delivered to subscribers.
    ///
    /// Returns `None` when nothing was started: the request is invalid, the service
    /// has been shut down, or there is no tokio runtime on this thread.
    pub fn fetch_current_weather(&self, request: WeatherRequest) -> Option<JoinHandle<()>> {
        if let Err(err) = request.validate() {
            log_failure(&request, &err);
            return None;
        }

        if self.is_shut_down() {
            tracing::debug!(?request, "Service shut down, request dropped");
            return None;
        }

        let handle = match Handle::try_current() {
            Ok(handle) => handle,
            Err(err) => {
                tracing::error!(%err, "No async runtime available for weather lookup");
                return None;
            }
        };

        let service = self.clone();
        Some(handle.spawn(async move {
            let cancel = service.shared.cancel.clone();
            let outcome = tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!(?request, "Weather lookup cancelled");
                    return;
                }
                outcome = service.lookup(&request) => outcome,
            };

            match outcome {
                Ok(weather) if !cancel.is_cancelled() => service.publish(weather),
                Ok(_) => tracing::debug!(?request, "Result discarded after shutdown"),
                Err(err) => log_failure(&request, &err),
            }
        }))
    }

    /// Register a callback for every successful background lookup.
    ///
    /// Callbacks run on a runtime worker thread, one delivery at a time. A callback
    /// may subscribe, drop a [`Subscription`] or format the service; a subscription
    /// dropped mid-delivery is skipped for the rest of that delivery.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&CurrentWeather) + Send + Sync + 'static,
    {
        let mut subs = self.shared.subscribers.lock();
        let id = subs.next_id;
        subs.next_id += 1;
        subs.callbacks.insert(id, Arc::new(callback));

        Subscription {
            shared: Arc::downgrade(&self.shared),
            id,
        }
    }

    /// Observer holding the most recent successful result, if any.
    pub fn latest(&self) -> watch::Receiver<Option<CurrentWeather>> {
        self.shared.latest.subscribe()
    }

    /// Cancel in-flight background lookups and refuse new ones.
    pub fn shutdown(&self) {
        self.shared.cancel.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.shared.cancel.is_cancelled()
    }

    fn publish(&self, weather: CurrentWeather) {
        tracing::info!(
            city = %weather.city_name,
            country = %weather.country,
            code = weather.condition_code,
            "Current weather delivered"
        );

        let _delivery = self.shared.delivery.lock();

        let snapshot: Vec<(u64, Callback)> = self
            .shared
            .subscribers
            .lock()
            .callbacks
            .iter()
            .map(|(id, callback)| (*id, Arc::clone(callback)))
            .collect();

        for (id, callback) in snapshot {
            let live = self.shared.subscribers.lock().callbacks.contains_key(&id);
            if live {
                callback(&weather);
            }
        }

        self.shared.latest.send_replace(Some(weather));
    }
}

/// Keeps a callback registered; dropping it unregisters the callback.
#[must_use = "dropping a Subscription unregisters its callback"]
#[derive(Debug)]
pub struct Subscription {
    shared: Weak<Shared>,
    id: u64,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.upgrade() {
            let _delivery = shared.delivery.lock();
            // Release the registry before the callback (and whatever it captured) drops.
            let removed = shared.subscribers.lock().callbacks.remove(&self.id);
            drop(removed);
        }
    }
}

fn log_failure(request: &WeatherRequest, err: &WeatherError) {
    tracing::warn!(?request, kind = ?err.kind(), %err, "Weather lookup failed");
}
