//! Clock: dedicated thread publishing simulated time on the `clock` topic.
//!
//! The clock ticks at a fixed interval and publishes
//! [`Payload::Tick`] carrying the time elapsed since it started. A gate
//! decides whether a tick is published; while the menu is up the game
//! keeps the clock silent.

use crate::bus::{topic, Bus, Payload};
use crate::error::{Error, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::info;

/// Periodic ticker bound to a bus.
#[derive(Debug)]
pub struct Clock {
    /// Handle to the ticker thread.
    handle: Option<JoinHandle<()>>,
    /// Flag to signal shutdown.
    shutdown: Arc<AtomicBool>,
}

impl Clock {
    /// Spawn a clock publishing every `interval` while `gate` returns true.
    pub fn spawn<G>(bus: Bus, interval: Duration, gate: G) -> Result<Self>
    where
        G: Fn() -> bool + Send + 'static,
    {
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();

        let handle = thread::Builder::new()
            .name("teleport-clock".to_string())
            .spawn(move || {
                Self::run_loop(&bus, &shutdown_clone, interval, &gate);
            })
            .map_err(|source| Error::Spawn {
                name: "clock".to_string(),
                source,
            })?;
        info!(?interval, "clock started");

        Ok(Self {
            handle: Some(handle),
            shutdown,
        })
    }

    /// Signal the clock to stop.
    pub fn stop(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// Stop and wait for the clock thread to finish.
    pub fn join(&mut self) {
        self.stop();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    /// Main ticker loop.
    fn run_loop<G: Fn() -> bool>(bus: &Bus, shutdown: &AtomicBool, interval: Duration, gate: &G) {
        let start = Instant::now();
        let mut next_tick = start + interval;

        loop {
            if shutdown.load(Ordering::Relaxed) {
                break;
            }

            let now = Instant::now();
            if now >= next_tick {
                if gate() {
                    // Blocks while any subscriber's mailbox is full.
                    bus.publish(topic::CLOCK, Payload::Tick(now - start));
                }

                next_tick += interval;

                // Behind schedule: skip missed ticks instead of bursting.
                if next_tick < now {
                    next_tick = now + interval;
                }
            } else {
                let sleep_duration = next_tick - now;
                thread::sleep(sleep_duration.min(Duration::from_millis(1)));
            }
        }
        info!("clock stopped");
    }
}

impl Drop for Clock {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::Mailbox;

    #[test]
    fn test_clock_publishes_increasing_ticks() {
        let bus = Bus::new();
        let mailbox = Mailbox::new(4);
        bus.subscribe(topic::CLOCK, &mailbox);
        let mut clock = Clock::spawn(bus, Duration::from_millis(5), || true).unwrap();

        let first = mailbox.recv_timeout(Duration::from_millis(500)).expect("tick");
        let second = mailbox.recv_timeout(Duration::from_millis(500)).expect("tick");
        // Unblock a publish stuck on the full mailbox before joining.
        drop(mailbox);
        clock.join();

        match (&first.payload, &second.payload) {
            (Payload::Tick(a), Payload::Tick(b)) => assert!(b > a),
            other => panic!("unexpected payloads {other:?}"),
        }
    }

    #[test]
    fn test_closed_gate_publishes_nothing() {
        let bus = Bus::new();
        let mailbox = Mailbox::new(4);
        bus.subscribe(topic::CLOCK, &mailbox);
        let mut clock = Clock::spawn(bus, Duration::from_millis(2), || false).unwrap();
        thread::sleep(Duration::from_millis(30));
        clock.join();
        assert!(mailbox.is_empty());
    }
}
