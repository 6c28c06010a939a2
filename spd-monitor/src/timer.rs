//! Cancellable one-shot timers.

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Runs the most recently scheduled task once its delay passes quietly.
///
/// Scheduling again, calling [`Debouncer::cancel`] or dropping the
/// debouncer cancels a task still waiting out its delay. A task whose delay
/// has already elapsed runs to completion regardless.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Option<JoinHandle<()>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Must be called from within a `LocalSet`.
    pub fn schedule<F>(&mut self, task: F)
    where
        F: Future<Output = ()> + 'static,
    {
        self.cancel();
        let delay = self.delay;
        self.pending = Some(tokio::task::spawn_local(async move {
            tokio::time::sleep(delay).await;
            tokio::task::spawn_local(task);
        }));
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    /// True while a scheduled task is still waiting out its delay.
    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use tokio::task::LocalSet;
    use tokio::time::sleep;

    fn push(sink: &Rc<RefCell<Vec<u32>>>, n: u32) -> impl Future<Output = ()> {
        let sink = sink.clone();
        async move { sink.borrow_mut().push(n) }
    }

    #[tokio::test(start_paused = true)]
    async fn test_only_last_schedule_fires() {
        LocalSet::new()
            .run_until(async {
                let fired = Rc::new(RefCell::new(Vec::new()));
                let mut debouncer = Debouncer::new(Duration::from_millis(300));
                debouncer.schedule(push(&fired, 1));
                sleep(Duration::from_millis(100)).await;
                debouncer.schedule(push(&fired, 2));
                sleep(Duration::from_millis(200)).await;
                debouncer.schedule(push(&fired, 3));
                assert!(debouncer.is_pending());
                sleep(Duration::from_millis(400)).await;
                assert_eq!(*fired.borrow(), vec![3]);
                assert!(!debouncer.is_pending());
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_and_drop_suppress_the_task() {
        LocalSet::new()
            .run_until(async {
                let fired = Rc::new(RefCell::new(Vec::new()));
                let mut cancelled = Debouncer::new(Duration::from_millis(300));
                cancelled.schedule(push(&fired, 1));
                cancelled.cancel();

                let dropped = {
                    let mut d = Debouncer::new(Duration::from_millis(300));
                    d.schedule(push(&fired, 2));
                    d
                };
                drop(dropped);

                sleep(Duration::from_secs(1)).await;
                assert!(fired.borrow().is_empty());
            })
            .await;
    }
}
