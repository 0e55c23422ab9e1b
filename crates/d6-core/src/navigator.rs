//! Navigation controller
//!
//! One `Navigator` per page session. It owns the view registry, the
//! resource cache, the fetch gateway and the authoritative load state, and
//! routes every intercepted interaction through them:
//!
//! ```text
//! interaction → decide → load ──→ cache absent   → fetch → resolve → waiters
//!                      │         cache pending  → join queue ────────↗
//!                      │         cache resolved → render now
//!                      └→ prefetch (absent only) → fetch → resolve
//! ```
//!
//! A waiter renders only if its load is still the current one. Everything
//! else is dropped without touching the page.

use parking_lot::{Mutex, ReentrantMutex, RwLock};
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;

use d6_cache::{Lookup, ResourceCache, Scheduler, TokioScheduler, Waiter};
use d6_fetch::{FetchGateway, HttpTransport, ResponsePayload, Transport};
use d6_navigation::{
    cache_key, canonical_url, remove_fragment, resolve_url, Decision, IgnoreReason, Interaction,
    Interceptor, LoadOptions, LoadState, LoadTicket, NavigationPhase,
};
use d6_render::{Page, RenderOutcome, Renderer, ScriptExecutor, View, ViewRegistry};

use crate::config::Config;
use crate::error::CoreError;
use crate::Result;

type SharedPayload = Arc<ResponsePayload>;

/// What `Navigator::handle` did with an interaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// A load started and is now authoritative
    Loading(LoadTicket),
    /// A speculative request was considered for this URL
    Prefetching(String),
    /// Left to the browser
    Ignored(IgnoreReason),
}

enum Route {
    Fetch(u64),
    Joined(usize),
    Cached(SharedPayload, Waiter<SharedPayload>),
}

pub struct Navigator {
    inner: Arc<Inner>,
}

struct Inner {
    config: Config,
    views: ViewRegistry,
    cache: ResourceCache<SharedPayload>,
    gateway: FetchGateway,
    renderer: Renderer,
    page: Arc<dyn Page>,
    interceptor: Interceptor,
    load_state: RwLock<LoadState>,
    /// Held across a cache lookup and the insert or enqueue that follows it
    dispatch: Mutex<()>,
    /// Orders starting a load against committing a response. Re-entrant so
    /// page scripts run during a commit may start a load themselves.
    commit: ReentrantMutex<()>,
    /// Target regions marked loading since the last authoritative result
    loading_targets: Mutex<BTreeSet<String>>,
}

impl Navigator {
    pub fn new(
        config: Config,
        page: Arc<dyn Page>,
        scripts: Arc<dyn ScriptExecutor>,
        transport: Arc<dyn Transport>,
        scheduler: Arc<dyn Scheduler>,
    ) -> Result<Self> {
        config.validate()?;

        let views = ViewRegistry::new();
        let renderer = Renderer::new(views.clone(), Arc::clone(&page), scripts, &config.error_view);

        tracing::info!(
            default_ttl_ms = config.default_ttl_ms,
            error_view = %config.error_view,
            "Navigator initialized"
        );

        Ok(Self {
            inner: Arc::new(Inner {
                cache: ResourceCache::with_default_ttl(scheduler, config.default_ttl()),
                gateway: FetchGateway::new(transport),
                interceptor: Interceptor::new(&config.no_prefetch_class),
                load_state: RwLock::new(LoadState::new()),
                dispatch: Mutex::new(()),
                commit: ReentrantMutex::new(()),
                loading_targets: Mutex::new(BTreeSet::new()),
                views,
                renderer,
                page,
                config,
            }),
        })
    }

    /// HTTP transport and tokio timers on the given runtime
    pub fn with_runtime(
        config: Config,
        page: Arc<dyn Page>,
        scripts: Arc<dyn ScriptExecutor>,
        runtime: tokio::runtime::Handle,
    ) -> Result<Self> {
        let transport = HttpTransport::new(runtime.clone(), &config.user_agent)?;
        let scheduler = TokioScheduler::new(runtime);
        Self::new(config, page, scripts, Arc::new(transport), Arc::new(scheduler))
    }

    /// Like `with_runtime`, on the runtime the caller is running on
    pub fn connect(
        config: Config,
        page: Arc<dyn Page>,
        scripts: Arc<dyn ScriptExecutor>,
    ) -> Result<Self> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| CoreError::NoRuntime(e.to_string()))?;
        Self::with_runtime(config, page, scripts, runtime)
    }

    // === Views ===

    pub fn views(&self) -> &ViewRegistry {
        &self.inner.views
    }

    pub fn register_view<F>(&self, name: &str, view: F)
    where
        F: Fn(&Value) -> String + Send + Sync + 'static,
    {
        self.inner.views.register(name, view);
    }

    /// Merge a batch of views, e.g. a server-provided bundle
    pub fn define_views<I>(&self, views: I) -> usize
    where
        I: IntoIterator<Item = (String, View)>,
    {
        self.inner.views.extend(views)
    }

    // === Interactions ===

    pub fn handle(&self, interaction: &Interaction) -> Result<Disposition> {
        let location = self.inner.page.location();

        match self.inner.interceptor.decide(interaction, &location)? {
            Decision::Load(request) => {
                let ticket = self
                    .inner
                    .load(&request.url, request.body, request.options)?;
                Ok(Disposition::Loading(ticket))
            }
            Decision::Prefetch(url) => {
                self.inner.prefetch(&url)?;
                Ok(Disposition::Prefetching(url))
            }
            Decision::Ignore(reason) => {
                tracing::debug!(?reason, location = %location, "Interaction left to the browser");
                Ok(Disposition::Ignored(reason))
            }
        }
    }

    /// Load `url` (relative to the page) into the page
    pub fn load(&self, url: &str, body: Option<String>, options: LoadOptions) -> Result<LoadTicket> {
        let url = self.absolute(url)?;
        self.inner.load(&url, body, options)
    }

    /// Start a speculative request for `url` unless it is already cached or
    /// in flight. Returns whether a request was sent.
    pub fn prefetch(&self, url: &str) -> Result<bool> {
        let url = self.absolute(url)?;
        self.inner.prefetch(&url)
    }

    fn absolute(&self, url: &str) -> Result<String> {
        let resolved = resolve_url(&self.inner.page.location(), url)?;
        Ok(remove_fragment(resolved.as_str()).to_string())
    }

    // === State ===

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn page(&self) -> &Arc<dyn Page> {
        &self.inner.page
    }

    pub fn cache(&self) -> &ResourceCache<SharedPayload> {
        &self.inner.cache
    }

    pub fn load_state(&self) -> LoadState {
        self.inner.load_state.read().clone()
    }

    pub fn phase(&self) -> NavigationPhase {
        self.inner.load_state.read().phase()
    }

    /// Data requests still waiting for a response
    pub fn in_flight(&self) -> usize {
        self.inner.gateway.in_flight()
    }
}

impl Clone for Navigator {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Inner {
    fn load(self: &Arc<Self>, url: &str, body: Option<String>, options: LoadOptions) -> Result<LoadTicket> {
        let key = cache_key(url);
        // Released before routing: a cached payload is delivered inline
        let ticket = {
            let _commit = self.commit.lock();
            let ticket = self.load_state.write().begin(&canonical_url(url));
            self.show_loading(options.target.as_deref());
            ticket
        };

        tracing::info!(url = %key, sequence = ticket.sequence, "Loading");

        let waiter = self.render_waiter(ticket.sequence, key.clone(), options);
        match self.route(&key, waiter)? {
            Route::Fetch(generation) => self.fetch(&key, body, generation),
            Route::Joined(waiting) => {
                tracing::debug!(url = %key, waiting, "Joined in-flight request");
            }
            Route::Cached(payload, waiter) => {
                tracing::debug!(url = %key, "Found precached response");
                waiter(&payload);
            }
        }

        Ok(ticket)
    }

    fn prefetch(self: &Arc<Self>, url: &str) -> Result<bool> {
        let key = cache_key(url);

        let generation = {
            let _guard = self.dispatch.lock();
            if !self.cache.get(&key).is_absent() {
                tracing::debug!(url = %key, "Already cached or in flight, not prefetching");
                return Ok(false);
            }

            let cached = key.clone();
            self.cache.begin_pending(
                &key,
                Box::new(move |_: &SharedPayload| {
                    tracing::debug!(url = %cached, "Caching contents for prefetched URL");
                }),
            )?
        };

        tracing::debug!(url = %key, "Prefetching");
        self.fetch(&key, None, generation);

        Ok(true)
    }

    fn route(&self, key: &str, waiter: Waiter<SharedPayload>) -> Result<Route> {
        let _guard = self.dispatch.lock();

        let route = match self.cache.get(key) {
            Lookup::Absent => Route::Fetch(self.cache.begin_pending(key, waiter)?),
            Lookup::Pending { .. } => Route::Joined(self.cache.enqueue(key, waiter)?),
            Lookup::Resolved(payload) => Route::Cached(payload, waiter),
        };

        Ok(route)
    }

    fn fetch(self: &Arc<Self>, key: &str, body: Option<String>, generation: u64) {
        let inner = Arc::downgrade(self);
        let url = key.to_string();

        self.gateway.fetch(key, body, move |payload| {
            if let Some(inner) = inner.upgrade() {
                inner.complete(&url, generation, payload);
            }
        });
    }

    fn complete(&self, key: &str, generation: u64, payload: ResponsePayload) {
        let payload = Arc::new(payload);

        let resolved = {
            let _guard = self.dispatch.lock();
            self.cache
                .resolve(key, generation, Arc::clone(&payload), payload.ttl())
        };

        match resolved {
            Ok(waiters) => {
                tracing::debug!(url = %key, count = waiters.len(), "Running callbacks");
                for waiter in waiters {
                    waiter(&payload);
                }
            }
            Err(e) => {
                tracing::debug!(url = %key, error = %e, "Discarding response for replaced entry");
            }
        }
    }

    fn render_waiter(
        self: &Arc<Self>,
        sequence: u64,
        key: String,
        options: LoadOptions,
    ) -> Waiter<SharedPayload> {
        let inner = Arc::downgrade(self);

        Box::new(move |payload: &SharedPayload| {
            if let Some(inner) = inner.upgrade() {
                inner.deliver(sequence, &key, payload, &options);
            }
        })
    }

    /// Completions may arrive on any thread. The current-load check and the
    /// commit that follows happen under `commit`, so a load begun meanwhile
    /// waits until this response has finished rendering.
    fn deliver(&self, sequence: u64, key: &str, payload: &ResponsePayload, options: &LoadOptions) {
        let _commit = self.commit.lock();
        if !self.load_state.read().is_current(sequence) {
            tracing::debug!(url = %key, sequence, "Dropping superseded response");
            return;
        }

        self.clear_loading();

        let outcome = self.renderer.render(payload, key, options);
        self.load_state.write().finish(sequence);

        match outcome {
            RenderOutcome::Rendered { .. } => {
                // The next visit fetches fresh data
                self.cache.evict(key);
            }
            RenderOutcome::HardNavigation { url, .. } => {
                tracing::info!(url = %url, sequence, "Fell back to browser navigation");
            }
        }
    }

    fn show_loading(&self, target: Option<&str>) {
        let config = &self.config;
        self.page
            .add_class(&config.spinner_selector, &config.loading_class);

        if let Some(target) = target {
            self.page.add_class(target, &config.target_class);
            self.page.add_class(target, &config.loading_class);
            self.loading_targets.lock().insert(target.to_string());
        }
    }

    fn clear_loading(&self) {
        let config = &self.config;
        self.page
            .remove_class(&config.spinner_selector, &config.loading_class);

        let targets = std::mem::take(&mut *self.loading_targets.lock());
        for target in targets {
            self.page.remove_class(&target, &config.loading_class);
        }
    }
}
