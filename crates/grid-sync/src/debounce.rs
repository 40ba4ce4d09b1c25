use std::future::Future;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;

enum Msg<T> {
    Submit(T),
    Flush(oneshot::Sender<()>),
}

/// Debounced write funnel: coalesces rapid submissions into one call to the
/// sink with the **last** value.
///
/// The window resets on every submission, but the funnel still converges to
/// the last value entered even when the window is repeatedly reset, and a
/// `Flush` or channel close drains whatever is pending. Debouncing here is a
/// resource-usage control (bounding write amplification from drag-resize and
/// keystroke streams), not a correctness mechanism.
pub struct Debouncer<T> {
    tx: mpsc::UnboundedSender<Msg<T>>,
    worker: JoinHandle<()>,
}

impl<T: Send + 'static> Debouncer<T> {
    /// Spawn the debounce worker. `sink` performs the coalesced write.
    pub fn spawn<F, Fut>(delay: Duration, sink: F) -> Self
    where
        F: FnMut(T) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = tokio::spawn(run(rx, delay, sink));
        Self { tx, worker }
    }

    /// Queue a value. Replaces any value still waiting out its window.
    pub fn submit(&self, value: T) {
        // The worker only stops once the sender is dropped, so this cannot
        // fail while `self` is alive.
        let _ = self.tx.send(Msg::Submit(value));
    }

    /// Write any pending value immediately and wait for it to land.
    pub async fn flush(&self) {
        let (ack, done) = oneshot::channel();
        if self.tx.send(Msg::Flush(ack)).is_ok() {
            let _ = done.await;
        }
    }

    /// Drain pending work and stop the worker.
    pub async fn shutdown(self) {
        drop(self.tx);
        let _ = self.worker.await;
    }
}

async fn run<T, F, Fut>(mut rx: mpsc::UnboundedReceiver<Msg<T>>, delay: Duration, mut sink: F)
where
    F: FnMut(T) -> Fut,
    Fut: Future<Output = ()>,
{
    let mut pending: Option<T> = None;
    let mut deadline = Instant::now();
    loop {
        if pending.is_none() {
            // Nothing queued; park until the next message.
            match rx.recv().await {
                Some(Msg::Submit(value)) => {
                    pending = Some(value);
                    deadline = Instant::now() + delay;
                }
                Some(Msg::Flush(ack)) => {
                    let _ = ack.send(());
                }
                None => return,
            }
            continue;
        }

        tokio::select! {
            _ = tokio::time::sleep_until(deadline) => {
                if let Some(value) = pending.take() {
                    sink(value).await;
                }
            }
            msg = rx.recv() => match msg {
                Some(Msg::Submit(value)) => {
                    pending = Some(value);
                    deadline = Instant::now() + delay;
                }
                Some(Msg::Flush(ack)) => {
                    if let Some(value) = pending.take() {
                        sink(value).await;
                    }
                    let _ = ack.send(());
                }
                None => {
                    if let Some(value) = pending.take() {
                        sink(value).await;
                    }
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[tokio::test(flavor = "current_thread")]
    async fn coalesces_rapid_submissions_to_last_value() {
        let seen: Arc<Mutex<Vec<u32>>> = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = seen.clone();
        let debouncer = Debouncer::spawn(Duration::from_millis(20), move |v: u32| {
            let seen = sink_seen.clone();
            async move {
                seen.lock().expect("recorder mutex poisoned").push(v);
            }
        });

        for v in 1..=5 {
            debouncer.submit(v);
        }
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(*seen.lock().expect("recorder mutex poisoned"), vec![5]);
        debouncer.shutdown().await;
    }

    #[tokio::test(flavor = "current_thread")]
    async fn converges_under_repeated_window_resets() {
        let seen: Arc<Mutex<Vec<u32>>> = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = seen.clone();
        let debouncer = Debouncer::spawn(Duration::from_millis(30), move |v: u32| {
            let seen = sink_seen.clone();
            async move {
                seen.lock().expect("recorder mutex poisoned").push(v);
            }
        });

        // Keep resetting the window faster than the delay.
        for v in 0..10u32 {
            debouncer.submit(v);
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(*seen.lock().expect("recorder mutex poisoned"), vec![9]);
        debouncer.shutdown().await;
    }

    #[tokio::test(flavor = "current_thread")]
    async fn flush_writes_pending_value_immediately() {
        let seen: Arc<Mutex<Vec<u32>>> = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = seen.clone();
        let debouncer = Debouncer::spawn(Duration::from_secs(3600), move |v: u32| {
            let seen = sink_seen.clone();
            async move {
                seen.lock().expect("recorder mutex poisoned").push(v);
            }
        });

        debouncer.submit(7);
        debouncer.flush().await;
        assert_eq!(*seen.lock().expect("recorder mutex poisoned"), vec![7]);
        debouncer.shutdown().await;
    }
}
