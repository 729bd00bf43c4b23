//! Background sweep thread.
//!
//! A [`Sweeper`] runs a pass closure on a fixed cadence until it is
//! stopped, dropped, or the closure reports that its target is gone.

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, info, warn};

const THREAD_NAME: &str = "lapse-sweeper";

/// Stop flag shared between the owner and the sweep thread.
#[derive(Default)]
struct Shutdown {
    stopped: Mutex<bool>,
    wake: Condvar,
}

impl Shutdown {
    /// Blocks until `deadline` passes or a stop is requested.
    ///
    /// Returns `true` if the thread should exit.
    fn wait(&self, deadline: Option<Instant>) -> bool {
        let mut stopped = self.stopped.lock();
        while !*stopped {
            match deadline {
                Some(deadline) => {
                    if self.wake.wait_until(&mut stopped, deadline).timed_out() {
                        break;
                    }
                }
                None => self.wake.wait(&mut stopped),
            }
        }
        *stopped
    }

    fn trigger(&self) {
        *self.stopped.lock() = true;
        self.wake.notify_all();
    }
}

/// Handle to a running sweep thread. Dropping it stops and joins the thread.
pub(crate) struct Sweeper {
    shutdown: Arc<Shutdown>,
    handle: Option<JoinHandle<()>>,
}

impl Sweeper {
    /// Spawns a thread calling `pass` every `interval`.
    ///
    /// `pass` returns `None` once there is nothing left to sweep, which
    /// ends the thread. Missed ticks are skipped rather than replayed.
    pub(crate) fn spawn<F>(interval: Duration, mut pass: F) -> io::Result<Self>
    where
        F: FnMut() -> Option<usize> + Send + 'static,
    {
        let shutdown = Arc::new(Shutdown::default());
        let signal = Arc::clone(&shutdown);
        let interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);

        let handle = thread::Builder::new()
            .name(THREAD_NAME.to_string())
            .spawn(move || {
                let mut next = Instant::now().checked_add(interval);
                loop {
                    if signal.wait(next) {
                        break;
                    }
                    if pass().is_none() {
                        debug!("Sweep target dropped");
                        break;
                    }
                    let now = Instant::now();
                    next = next
                        .and_then(|tick| tick.checked_add(interval))
                        .and_then(|tick| {
                            if tick <= now {
                                now.checked_add(interval)
                            } else {
                                Some(tick)
                            }
                        });
                }
                info!(interval_ms, "Sweep thread stopped");
            })?;

        info!(interval_ms, "Sweep thread started");
        Ok(Self {
            shutdown,
            handle: Some(handle),
        })
    }

    /// Whether the sweep thread is still running.
    pub(crate) fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Signals the thread to stop and waits for it to exit.
    pub(crate) fn stop(&mut self) {
        self.shutdown.trigger();
        if let Some(handle) = self.handle.take() {
            // A pass that drops the last handle runs on the sweep thread itself.
            if handle.thread().id() != thread::current().id() && handle.join().is_err() {
                warn!("Sweep thread panicked");
            }
        }
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_sweeper_ticks() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let sweeper = Sweeper::spawn(Duration::from_millis(10), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Some(0)
        })
        .unwrap();

        thread::sleep(Duration::from_millis(100));
        drop(sweeper);
        assert!(count.load(Ordering::SeqCst) >= 2);
    }

    #[test]
    fn test_stop_is_prompt() {
        let mut sweeper = Sweeper::spawn(Duration::from_secs(3600), || Some(0)).unwrap();
        assert!(sweeper.is_running());

        let started = Instant::now();
        sweeper.stop();
        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(!sweeper.is_running());

        // Stopping twice is a no-op.
        sweeper.stop();
    }

    #[test]
    fn test_no_ticks_after_stop() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let mut sweeper = Sweeper::spawn(Duration::from_millis(5), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Some(0)
        })
        .unwrap();

        thread::sleep(Duration::from_millis(30));
        sweeper.stop();
        let after_stop = count.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(30));
        assert_eq!(count.load(Ordering::SeqCst), after_stop);
    }

    #[test]
    fn test_stop_survives_panicking_pass() {
        let mut sweeper = Sweeper::spawn(Duration::from_millis(5), || -> Option<usize> {
            panic!("drop failed during sweep");
        })
        .unwrap();

        thread::sleep(Duration::from_millis(50));
        assert!(!sweeper.is_running());
        sweeper.stop();
        assert!(!sweeper.is_running());
    }

    #[test]
    fn test_huge_interval_waits_for_stop() {
        let mut sweeper = Sweeper::spawn(Duration::MAX, || Some(0)).unwrap();
        assert!(sweeper.is_running());
        sweeper.stop();
        assert!(!sweeper.is_running());
    }

    #[test]
    fn test_exits_when_pass_returns_none() {
        let sweeper = Sweeper::spawn(Duration::from_millis(5), || None).unwrap();
        thread::sleep(Duration::from_millis(100));
        assert!(!sweeper.is_running());
    }
}
