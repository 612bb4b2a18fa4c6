//! Blocking adapter
//!
//! The synchronous API surface is an adapter over the async engine, not a
//! separate code path: every blocking call drives the same future on a
//! lazily-created dedicated runtime, so retry counts and pagination
//! behavior match the async path by construction.

use std::future::Future;
use std::sync::OnceLock;
use tokio::runtime::Runtime;

fn runtime() -> &'static Runtime {
    static RUNTIME: OnceLock<Runtime> = OnceLock::new();
    RUNTIME.get_or_init(|| {
        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .thread_name("tessera-blocking")
            .build()
            .expect("failed to build blocking adapter runtime")
    })
}

/// Drive a future to completion on the adapter runtime.
///
/// Safe to call from inside another tokio runtime: the future is handed
/// to the dedicated runtime from a scoped thread rather than blocking a
/// runtime worker directly.
pub(crate) fn block_on<F>(future: F) -> F::Output
where
    F: Future + Send,
    F::Output: Send,
{
    if tokio::runtime::Handle::try_current().is_ok() {
        std::thread::scope(|scope| {
            scope
                .spawn(|| runtime().block_on(future))
                .join()
                .expect("blocking adapter thread panicked")
        })
    } else {
        runtime().block_on(future)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_on_outside_runtime() {
        let value = block_on(async { 21 * 2 });
        assert_eq!(value, 42);
    }

    #[test]
    fn test_block_on_drives_timers() {
        let value = block_on(async {
            tokio::time::sleep(std::time::Duration::from_millis(1)).await;
            "done"
        });
        assert_eq!(value, "done");
    }

    #[tokio::test]
    async fn test_block_on_inside_runtime_does_not_deadlock() {
        let value = tokio::task::spawn_blocking(|| block_on(async { 7 }))
            .await
            .unwrap();
        assert_eq!(value, 7);
    }
}
