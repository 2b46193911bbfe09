//! Startup and shutdown hooks

use futures_util::future::{BoxFuture, FutureExt};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};

/// Boxed async zero-argument hook
pub type LifecycleHook = Box<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// Ordered startup and shutdown hooks, each list run at most once
#[derive(Default)]
pub struct Lifecycle {
    startup: Vec<LifecycleHook>,
    shutdown: Vec<LifecycleHook>,
    started: AtomicBool,
    stopped: AtomicBool,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a hook to run before serving
    pub fn on_startup<F, Fut>(&mut self, hook: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.startup.push(Box::new(move || hook().boxed()));
    }

    /// Register a hook to run after serving stops
    pub fn on_shutdown<F, Fut>(&mut self, hook: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.shutdown.push(Box::new(move || hook().boxed()));
    }

    /// Run the startup hooks in registration order
    ///
    /// Returns `false` without running anything if they already ran.
    pub async fn startup(&self) -> bool {
        if self.started.swap(true, Ordering::AcqRel) {
            return false;
        }
        tracing::debug!(hooks = self.startup.len(), "Running startup hooks");
        for hook in &self.startup {
            hook().await;
        }
        true
    }

    /// Run the shutdown hooks in registration order
    ///
    /// Returns `false` without running anything if they already ran.
    pub async fn shutdown(&self) -> bool {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return false;
        }
        tracing::debug!(hooks = self.shutdown.len(), "Running shutdown hooks");
        for hook in &self.shutdown {
            hook().await;
        }
        true
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lifecycle")
            .field("startup_hooks", &self.startup.len())
            .field("shutdown_hooks", &self.shutdown.len())
            .field("started", &self.is_started())
            .field("stopped", &self.is_stopped())
            .finish()
    }
}
