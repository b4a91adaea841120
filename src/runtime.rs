//! Runtime abstraction layer for async operations
//!
//! Tile loads are spawned through [`AsyncSpawner`] so the engine does not
//! depend on one executor. Tokio is the default; [`QueuedSpawner`] holds
//! spawned futures until the host drives them, which gives tests control over
//! completion order.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::Result;

/// A boxed, sendable unit of background work
pub type BoxedTask = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// A trait for spawning async tasks (object-safe version)
pub trait AsyncSpawner: Send + Sync + 'static {
    /// Spawn a future and return a handle to it
    fn spawn_boxed(&self, future: BoxedTask) -> Box<dyn AsyncHandle>;
}

/// Handle to a spawned async task
pub trait AsyncHandle: Send + Sync {
    /// Check if the task is finished
    fn is_finished(&self) -> bool;
}

/// Convenience wrapper that boxes `future` before spawning it
pub fn spawn_on<F>(spawner: &dyn AsyncSpawner, future: F) -> Box<dyn AsyncHandle>
where
    F: Future<Output = ()> + Send + 'static,
{
    spawner.spawn_boxed(Box::pin(future))
}

/// Spawner used when a map is built without one
pub fn default_spawner() -> Result<Arc<dyn AsyncSpawner>> {
    #[cfg(feature = "tokio-runtime")]
    {
        Ok(Arc::new(spawners::tokio_impl::TokioSpawner::current()?))
    }

    #[cfg(not(feature = "tokio-runtime"))]
    {
        Err(crate::MapError::Runtime(
            "no async runtime available; enable 'tokio-runtime' or supply a spawner".into(),
        ))
    }
}

/// Default spawner implementations
pub mod spawners {
    use super::*;

    #[cfg(feature = "tokio-runtime")]
    pub mod tokio_impl {
        use super::*;
        use ::tokio::runtime::Handle;
        use ::tokio::task::JoinHandle;

        /// Tokio-based async spawner bound to a runtime handle
        #[derive(Debug, Clone)]
        pub struct TokioSpawner {
            handle: Handle,
        }

        impl TokioSpawner {
            pub fn new(handle: Handle) -> Self {
                Self { handle }
            }

            /// Binds to the runtime the caller is running inside
            pub fn current() -> Result<Self> {
                Handle::try_current()
                    .map(Self::new)
                    .map_err(|e| crate::MapError::Runtime(e.to_string()))
            }
        }

        impl AsyncSpawner for TokioSpawner {
            fn spawn_boxed(&self, future: BoxedTask) -> Box<dyn AsyncHandle> {
                Box::new(TokioHandle(self.handle.spawn(future)))
            }
        }

        struct TokioHandle(JoinHandle<()>);

        impl AsyncHandle for TokioHandle {
            fn is_finished(&self) -> bool {
                self.0.is_finished()
            }
        }
    }

    /// Holds spawned futures until the host runs them
    #[derive(Default)]
    pub struct QueuedSpawner {
        queue: Mutex<Vec<(BoxedTask, Arc<AtomicBool>)>>,
    }

    impl QueuedSpawner {
        pub fn new() -> Self {
            Self::default()
        }

        /// Number of spawned futures not yet run
        pub fn pending(&self) -> usize {
            self.queue.lock().map(|queue| queue.len()).unwrap_or(0)
        }

        /// Runs the `index`-th queued future to completion. Returns false when
        /// no future sits at that position.
        pub fn run_one(&self, index: usize) -> bool {
            let task = match self.queue.lock() {
                Ok(mut queue) if index < queue.len() => queue.remove(index),
                _ => return false,
            };
            Self::run(task);
            true
        }

        /// Runs every queued future in spawn order, including any spawned
        /// while running. Returns how many ran.
        pub fn run_all(&self) -> usize {
            let mut ran = 0;
            while self.run_one(0) {
                ran += 1;
            }
            ran
        }

        fn run((future, finished): (BoxedTask, Arc<AtomicBool>)) {
            futures::executor::block_on(future);
            finished.store(true, Ordering::Release);
        }
    }

    impl std::fmt::Debug for QueuedSpawner {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("QueuedSpawner")
                .field("pending", &self.pending())
                .finish()
        }
    }

    impl AsyncSpawner for QueuedSpawner {
        fn spawn_boxed(&self, future: BoxedTask) -> Box<dyn AsyncHandle> {
            let finished = Arc::new(AtomicBool::new(false));
            match self.queue.lock() {
                Ok(mut queue) => queue.push((future, finished.clone())),
                Err(_) => log::warn!("queued spawner lock poisoned, dropping task"),
            }
            Box::new(QueuedHandle(finished))
        }
    }

    struct QueuedHandle(Arc<AtomicBool>);

    impl AsyncHandle for QueuedHandle {
        fn is_finished(&self) -> bool {
            self.0.load(Ordering::Acquire)
        }
    }
}

pub use spawners::QueuedSpawner;
#[cfg(feature = "tokio-runtime")]
pub use spawners::tokio_impl::TokioSpawner;
