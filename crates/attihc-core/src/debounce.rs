//! Coalescing rapid writes into one deferred write.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::debug;

/// Default quiet period before a scheduled value is written.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

type Sink<T> = Box<dyn Fn(T) + Send + Sync>;

struct Shared<T> {
    pending: Mutex<Option<T>>,
    timer: Mutex<Option<JoinHandle<()>>>,
    sink: Sink<T>,
}

fn lock<V>(mutex: &Mutex<V>) -> MutexGuard<'_, V> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

impl<T> Shared<T> {
    /// Hand the pending value, if any, to the sink. The pending lock is held
    /// while the sink runs so a concurrent flush waits for the write.
    fn fire(&self) -> bool {
        let mut pending = lock(&self.pending);
        match pending.take() {
            Some(value) => {
                (self.sink)(value);
                true
            }
            None => false,
        }
    }

    fn abort_timer(&self) {
        if let Some(handle) = lock(&self.timer).take() {
            handle.abort();
        }
    }
}

/// Holds the latest value and writes it once no new value has arrived for
/// `delay`.
///
/// Timers run on the tokio runtime that was current when the debouncer
/// was built. Without one, every scheduled value is written immediately.
/// Dropping the debouncer flushes whatever is still pending.
pub struct Debouncer<T: Send + 'static> {
    delay: Duration,
    runtime: Option<Handle>,
    shared: Arc<Shared<T>>,
}

impl<T: Send + 'static> Debouncer<T> {
    pub fn new(delay: Duration, sink: impl Fn(T) + Send + Sync + 'static) -> Self {
        let runtime = Handle::try_current().ok();
        if runtime.is_none() {
            debug!("No async runtime available, writes will not be debounced");
        }
        Self {
            delay,
            runtime,
            shared: Arc::new(Shared {
                pending: Mutex::new(None),
                timer: Mutex::new(None),
                sink: Box::new(sink),
            }),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Replace the pending value and restart the quiet period.
    pub fn schedule(&self, value: T) {
        let Some(runtime) = &self.runtime else {
            (self.shared.sink)(value);
            return;
        };

        *lock(&self.shared.pending) = Some(value);

        let shared = Arc::clone(&self.shared);
        let delay = self.delay;
        let handle = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            shared.fire();
        });

        if let Some(previous) = lock(&self.shared.timer).replace(handle) {
            previous.abort();
        }
    }

    /// Write the pending value now. Returns whether anything was written.
    pub fn flush(&self) -> bool {
        self.shared.abort_timer();
        self.shared.fire()
    }

    /// Drop the pending value without writing it.
    pub fn cancel(&self) {
        self.shared.abort_timer();
        lock(&self.shared.pending).take();
    }

    pub fn is_pending(&self) -> bool {
        lock(&self.shared.pending).is_some()
    }
}

impl<T: Send + 'static> Drop for Debouncer<T> {
    fn drop(&mut self) {
        if self.flush() {
            debug!("Flushed pending write on drop");
        }
    }
}
