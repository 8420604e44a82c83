//! Mutations
//!
//! A [`Mutation`] wraps a write operation. Each call is a new attempt; the
//! observable state always describes the most recent attempt while earlier
//! attempts still resolve for their own callers.

use crate::errors::QueryError;
use cache_system::FetchError;
use futures::FutureExt;
use futures::future::BoxFuture;
use std::error::Error as StdError;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;
use tokio::task::JoinHandle;

type MutateFn<I, O> = Arc<dyn Fn(I) -> BoxFuture<'static, Result<O, FetchError>> + Send + Sync>;
type SuccessHook<I, O> = Arc<dyn Fn(&O, &I) + Send + Sync>;
type ErrorHook<I> = Arc<dyn Fn(&QueryError, &I) + Send + Sync>;

/// Mutation lifecycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum MutationStatus {
    #[default]
    Idle,
    Pending,
    Success,
    Error,
}

/// State of the latest attempt
#[derive(Debug, Clone)]
pub struct MutationState<O> {
    pub status: MutationStatus,
    pub data: Option<O>,
    pub error: Option<QueryError>,
    /// Sequence number of the attempt this state belongs to
    pub attempt: u64,
}

impl<O> MutationState<O> {
    pub fn is_idle(&self) -> bool {
        self.status == MutationStatus::Idle
    }

    pub fn is_pending(&self) -> bool {
        self.status == MutationStatus::Pending
    }

    pub fn is_success(&self) -> bool {
        self.status == MutationStatus::Success
    }

    pub fn is_error(&self) -> bool {
        self.status == MutationStatus::Error
    }
}

impl<O> Default for MutationState<O> {
    fn default() -> Self {
        Self {
            status: MutationStatus::Idle,
            data: None,
            error: None,
            attempt: 0,
        }
    }
}

/// Marks the attempt cancelled if its future is dropped before resolving
struct PendingAttempt<'a, O> {
    state: &'a watch::Sender<MutationState<O>>,
    attempts: &'a AtomicU64,
    attempt: u64,
    resolved: bool,
}

impl<O> Drop for PendingAttempt<'_, O> {
    fn drop(&mut self) {
        if self.resolved || self.attempts.load(Ordering::SeqCst) != self.attempt {
            return;
        }
        tracing::debug!(attempt = self.attempt, "mutation cancelled");
        self.state.send_replace(MutationState {
            status: MutationStatus::Error,
            data: None,
            error: Some(QueryError::Cancelled),
            attempt: self.attempt,
        });
    }
}

pub struct Mutation<I, O> {
    mutate_fn: MutateFn<I, O>,
    on_success: Option<SuccessHook<I, O>>,
    on_error: Option<ErrorHook<I>>,
    state: Arc<watch::Sender<MutationState<O>>>,
    attempts: Arc<AtomicU64>,
}

impl<I, O> Clone for Mutation<I, O> {
    fn clone(&self) -> Self {
        Self {
            mutate_fn: Arc::clone(&self.mutate_fn),
            on_success: self.on_success.clone(),
            on_error: self.on_error.clone(),
            state: Arc::clone(&self.state),
            attempts: Arc::clone(&self.attempts),
        }
    }
}

impl<I, O: std::fmt::Debug> std::fmt::Debug for Mutation<I, O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mutation")
            .field("state", &*self.state.borrow())
            .field("has_on_success", &self.on_success.is_some())
            .field("has_on_error", &self.on_error.is_some())
            .finish()
    }
}

impl<I, O> Mutation<I, O>
where
    I: Clone + Send + Sync + 'static,
    O: Clone + Send + Sync + 'static,
{
    pub fn new<F, Fut, E>(mutate: F) -> Self
    where
        F: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<O, E>> + Send + 'static,
        E: Into<Box<dyn StdError + Send + Sync + 'static>>,
    {
        let (state, _) = watch::channel(MutationState::default());
        Self {
            mutate_fn: Arc::new(move |input: I| {
                let request = mutate(input);
                async move { request.await.map_err(FetchError::new) }.boxed()
            }),
            on_success: None,
            on_error: None,
            state: Arc::new(state),
            attempts: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Run after every successful attempt, with the result and the input
    pub fn on_success<F>(mut self, hook: F) -> Self
    where
        F: Fn(&O, &I) + Send + Sync + 'static,
    {
        self.on_success = Some(Arc::new(hook));
        self
    }

    pub fn on_error<F>(mut self, hook: F) -> Self
    where
        F: Fn(&QueryError, &I) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(hook));
        self
    }

    /// Run the mutation and wait for its outcome
    pub async fn mutate_async(&self, input: I) -> Result<O, QueryError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.send_replace(MutationState {
            status: MutationStatus::Pending,
            data: None,
            error: None,
            attempt,
        });

        let mut pending = PendingAttempt {
            state: &self.state,
            attempts: &self.attempts,
            attempt,
            resolved: false,
        };
        let result = (self.mutate_fn)(input.clone()).await.map_err(QueryError::Fetch);
        pending.resolved = true;
        drop(pending);

        let latest = self.attempts.load(Ordering::SeqCst) == attempt;

        match &result {
            Ok(data) => {
                if latest {
                    self.state.send_replace(MutationState {
                        status: MutationStatus::Success,
                        data: Some(data.clone()),
                        error: None,
                        attempt,
                    });
                }
                if let Some(hook) = &self.on_success {
                    hook(data, &input);
                }
            }
            Err(error) => {
                tracing::debug!(attempt, error = %error, "mutation failed");
                if latest {
                    self.state.send_replace(MutationState {
                        status: MutationStatus::Error,
                        data: None,
                        error: Some(error.clone()),
                        attempt,
                    });
                }
                if let Some(hook) = &self.on_error {
                    hook(error, &input);
                }
            }
        }
        result
    }

    /// Run the mutation in the background; the outcome lands in [`Mutation::state`]
    pub fn mutate(&self, input: I) -> JoinHandle<Result<O, QueryError>> {
        let mutation = self.clone();
        tokio::spawn(async move { mutation.mutate_async(input).await })
    }

    pub fn state(&self) -> MutationState<O> {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<MutationState<O>> {
        self.state.subscribe()
    }

    /// Back to idle; attempts still running no longer update the state
    pub fn reset(&self) {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        self.state.send_replace(MutationState::default());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Debug, thiserror::Error)]
    #[error("conflict on {0}")]
    struct Conflict(String);

    #[tokio::test]
    async fn test_success_updates_state_and_fires_hook() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mutation = {
            let seen = Arc::clone(&seen);
            Mutation::new(|name: String| async move { Ok::<_, Conflict>(name.len()) })
                .on_success(move |len, name| seen.lock().unwrap().push((*len, name.clone())))
        };

        assert!(mutation.state().is_idle());
        let len = mutation.mutate_async("alice".to_string()).await.expect("succeeds");

        assert_eq!(len, 5);
        let state = mutation.state();
        assert!(state.is_success());
        assert_eq!(state.data, Some(5));
        assert_eq!(*seen.lock().unwrap(), vec![(5, "alice".to_string())]);
    }

    #[tokio::test]
    async fn test_failure_keeps_original_error() {
        let successes = Arc::new(Mutex::new(0));
        let failures = Arc::new(Mutex::new(Vec::new()));
        let mutation = {
            let successes = Arc::clone(&successes);
            let failures = Arc::clone(&failures);
            Mutation::new(|id: String| async move { Err::<(), _>(Conflict(id)) })
                .on_success(move |_, _| *successes.lock().unwrap() += 1)
                .on_error(move |error, id| failures.lock().unwrap().push((error.to_string(), id.clone())))
        };

        let error = mutation.mutate_async("42".into()).await.unwrap_err();
        assert!(error.downcast_ref::<Conflict>().is_some());
        assert!(mutation.state().is_error());
        assert_eq!(*successes.lock().unwrap(), 0);
        assert_eq!(
            *failures.lock().unwrap(),
            vec![("conflict on 42".to_string(), "42".to_string())]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_state_reflects_latest_attempt_only() {
        let hooks = Arc::new(Mutex::new(Vec::new()));
        let mutation = {
            let hooks = Arc::clone(&hooks);
            Mutation::new(|delay_ms: u64| async move {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                Ok::<_, Conflict>(delay_ms)
            })
            .on_success(move |value, _| hooks.lock().unwrap().push(*value))
        };

        let slow = mutation.mutate(100);
        tokio::time::sleep(Duration::from_millis(1)).await;
        let fast = mutation.mutate(10);

        assert_eq!(fast.await.expect("joined").expect("succeeds"), 10);
        assert_eq!(mutation.state().data, Some(10));

        // The first attempt resolves for its caller without touching the state
        assert_eq!(slow.await.expect("joined").expect("succeeds"), 100);
        let state = mutation.state();
        assert_eq!(state.data, Some(10));
        assert_eq!(state.attempt, 2);
        assert_eq!(*hooks.lock().unwrap(), vec![10, 100]);

        mutation.reset();
        assert!(mutation.state().is_idle());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_attempt_is_reported_cancelled() {
        let successes = Arc::new(Mutex::new(0));
        let mutation = {
            let successes = Arc::clone(&successes);
            Mutation::new(|delay_ms: u64| async move {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                Ok::<_, Conflict>(delay_ms)
            })
            .on_success(move |_, _| *successes.lock().unwrap() += 1)
        };
        let mut states = mutation.subscribe();

        let timed_out = tokio::time::timeout(Duration::from_millis(5), mutation.mutate_async(100)).await;
        assert!(timed_out.is_err());

        let state = states.borrow_and_update().clone();
        assert!(state.is_error());
        assert!(matches!(state.error, Some(QueryError::Cancelled)));
        assert_eq!(state.attempt, 1);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(mutation.state().is_error());
        assert_eq!(*successes.lock().unwrap(), 0);

        // A superseded attempt leaves the newer state alone
        let fast = mutation.mutate(10);
        let slow = tokio::time::timeout(Duration::from_millis(1), mutation.mutate_async(100)).await;
        assert!(slow.is_err());
        assert_eq!(fast.await.expect("joined").expect("succeeds"), 10);
        assert_eq!(mutation.state().data, Some(10));
    }
}
