//! Deferred data handles.
//!
//! A [`Deferred`] is a value that is either already settled or still being
//! fetched by a spawned task. Every clone observes the same outcome. The
//! task is aborted when the last clone is dropped, so a result can never be
//! applied to a page that is no longer being streamed.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use tokio::task::AbortHandle;

/// Aborts the fetching task when the last handle goes away.
#[derive(Debug)]
struct AbortOnDrop(AbortHandle);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Settled outcome of a deferred fetch. `None` means the fetch failed or
/// produced nothing, and the consuming section renders as absent.
pub type Settled<T> = Option<Arc<T>>;

/// Handle over a value that is `Ready` or `Pending`.
pub struct Deferred<T> {
    shared: Shared<BoxFuture<'static, Settled<T>>>,
    task: Option<Arc<AbortOnDrop>>,
}

impl<T> Clone for Deferred<T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
            task: self.task.clone(),
        }
    }
}

impl<T> std::fmt::Debug for Deferred<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Deferred")
            .field("settled", &self.shared.peek().is_some())
            .finish_non_exhaustive()
    }
}

impl<T: Send + Sync + 'static> Deferred<T> {
    /// A handle that is already settled with `value`.
    #[must_use]
    pub fn ready(value: T) -> Self {
        Self::settled_with(Some(Arc::new(value)))
    }

    /// A handle that is already settled as absent.
    #[must_use]
    pub fn empty() -> Self {
        Self::settled_with(None)
    }

    fn settled_with(value: Settled<T>) -> Self {
        Self {
            shared: futures::future::ready(value).boxed().shared(),
            task: None,
        }
    }

    /// Start fetching on a new task.
    ///
    /// A failed fetch settles the handle as absent and logs at `warn`; the
    /// error never reaches the page.
    pub fn spawn<F, E>(label: &'static str, fetch: F) -> Self
    where
        F: Future<Output = Result<T, E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        let handle = tokio::spawn(fetch);
        let task = Arc::new(AbortOnDrop(handle.abort_handle()));

        let shared = async move {
            match handle.await {
                Ok(Ok(value)) => Some(Arc::new(value)),
                Ok(Err(error)) => {
                    tracing::warn!(section = label, error = %error, "Deferred query failed, section omitted");
                    None
                }
                Err(join) if join.is_cancelled() => None,
                Err(join) => {
                    tracing::error!(section = label, error = %join, "Deferred query task panicked");
                    None
                }
            }
        }
        .boxed()
        .shared();

        Self {
            shared,
            task: Some(task),
        }
    }

    /// The outcome if the handle has settled, without waiting.
    #[must_use]
    pub fn try_settled(&self) -> Option<Settled<T>> {
        self.shared.clone().now_or_never()
    }

    /// Wait for the handle to settle.
    pub async fn settled(&self) -> Settled<T> {
        self.shared.clone().await
    }

    /// Map the settled value through `f` on a new handle that shares this
    /// handle's task.
    #[must_use]
    pub fn map<U, F>(&self, f: F) -> Deferred<U>
    where
        U: Send + Sync + 'static,
        F: FnOnce(&T) -> Option<U> + Send + 'static,
    {
        let source = self.clone();
        let shared = async move {
            source
                .settled()
                .await
                .and_then(|v| f(v.as_ref()))
                .map(Arc::new)
        }
        .boxed()
        .shared();

        Deferred {
            shared,
            task: self.task.clone(),
        }
    }
}
