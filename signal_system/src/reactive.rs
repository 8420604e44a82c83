//! Reactive values and effects
//!
//! A [`Reactive`] holds a value that consumers can observe. Writes are compared by
//! value: storing something equal to the current value does not notify anyone.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Observable value with value-equality change detection
pub struct Reactive<T> {
    sender: Arc<watch::Sender<T>>,
    version: Arc<AtomicU64>,
}

impl<T> Clone for Reactive<T> {
    fn clone(&self) -> Self {
        Self {
            sender: Arc::clone(&self.sender),
            version: Arc::clone(&self.version),
        }
    }
}

/// Read-only view of how many effective changes a [`Reactive`] has seen.
///
/// The counter moves together with the value: while a `watch::Ref` of the
/// value is held, [`ReactiveVersion::current`] matches the borrowed value.
#[derive(Debug, Clone)]
pub struct ReactiveVersion(Arc<AtomicU64>);

impl ReactiveVersion {
    pub fn current(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Reactive<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reactive")
            .field("value", &*self.sender.borrow())
            .field("observers", &self.sender.receiver_count())
            .finish()
    }
}

impl<T> Reactive<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    pub fn new(value: T) -> Self {
        let (sender, _) = watch::channel(value);
        Self {
            sender: Arc::new(sender),
            version: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Current value
    pub fn get(&self) -> T {
        self.sender.borrow().clone()
    }

    /// Store a new value; returns whether observers were notified
    pub fn set(&self, value: T) -> bool {
        self.sender.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                self.version.fetch_add(1, Ordering::SeqCst);
                true
            }
        })
    }

    /// Modify the value in place; observers are notified only if it actually changed
    pub fn update<F>(&self, f: F) -> bool
    where
        F: FnOnce(&mut T),
    {
        self.sender.send_if_modified(|current| {
            let before = current.clone();
            f(current);
            let changed = *current != before;
            if changed {
                self.version.fetch_add(1, Ordering::SeqCst);
            }
            changed
        })
    }

    /// Number of effective changes so far
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }

    /// Version counter that does not keep the value alive
    pub fn version_handle(&self) -> ReactiveVersion {
        ReactiveVersion(Arc::clone(&self.version))
    }

    /// Receiver that wakes on every effective change
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.sender.subscribe()
    }

    /// Run `f` with the current value now and again after every change.
    ///
    /// Must be called from within a tokio runtime. The effect stops when the
    /// returned handle is dropped.
    pub fn effect<F>(&self, mut f: F) -> Effect
    where
        F: FnMut(&T) + Send + 'static,
    {
        let mut receiver = self.subscribe();
        let handle = tokio::spawn(async move {
            loop {
                // Clone out so `f` may write back into the same reactive
                let value = receiver.borrow_and_update().clone();
                f(&value);
                if receiver.changed().await.is_err() {
                    break;
                }
            }
        });
        Effect { handle }
    }
}

/// Running effect; aborted on drop
#[derive(Debug)]
pub struct Effect {
    handle: JoinHandle<()>,
}

impl Effect {
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for Effect {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq)]
    struct Options {
        page: u32,
        order_by: Option<String>,
    }

    #[test]
    fn test_equal_value_does_not_notify() {
        let reactive = Reactive::new(Options {
            page: 0,
            order_by: None,
        });
        let receiver = reactive.subscribe();

        // A structurally equal value built separately is not a change
        assert!(!reactive.set(Options {
            page: 0,
            order_by: None,
        }));
        assert!(!receiver.has_changed().expect("sender alive"));

        assert!(reactive.set(Options {
            page: 1,
            order_by: None,
        }));
        assert!(receiver.has_changed().expect("sender alive"));
    }

    #[test]
    fn test_update_reports_effective_change() {
        let reactive = Reactive::new(5u32);
        let version = reactive.version_handle();
        assert!(!reactive.update(|v| *v = 5));
        assert_eq!(version.current(), 0);
        assert!(reactive.update(|v| *v += 1));
        assert!(!reactive.set(6));
        assert_eq!(reactive.get(), 6);
        assert_eq!(version.current(), 1);
        assert_eq!(reactive.version(), 1);
    }

    #[tokio::test]
    async fn test_effect_runs_on_changes() {
        let reactive = Reactive::new(0u32);
        let seen = Arc::new(Mutex::new(Vec::new()));

        let effect = {
            let seen = Arc::clone(&seen);
            reactive.effect(move |value| seen.lock().unwrap().push(*value))
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        reactive.set(1);
        tokio::time::sleep(Duration::from_millis(10)).await;
        reactive.set(1);
        reactive.set(2);
        tokio::time::sleep(Duration::from_millis(10)).await;

        drop(effect);
        reactive.set(3);
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2]);
    }
}
