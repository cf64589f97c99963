// Copyright (C) 2026 the midikey authors
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::{io, sync::Arc, time::Duration};

use tokio::sync::mpsc;
use tracing::{error, info, span, warn, Instrument, Level};

use crate::{cancel::CancelHandle, engine::Engine, midi::Device};

/// How often the watchdog wakes up to check liveness and cancellation.
const WATCHDOG_INTERVAL: Duration = Duration::from_millis(500);
/// Input silence beyond this is treated as a dead stream.
const SILENCE_TIMEOUT: Duration = Duration::from_secs(15);
/// How long to wait before reconnecting after a failure.
const RECONNECT_DELAY: Duration = Duration::from_secs(3);
/// Raw events buffered between the device callback and the event pump.
const EVENT_BUFFER: usize = 64;

/// Owns the MIDI input stream lifecycle. Connects, pumps raw events into the
/// engine, and restarts the connection when the stream errors out or goes
/// silent. Every (re)connect starts from a fully reset engine: overlap
/// counts and pedal state implied by the previous connection can no longer
/// be trusted.
pub struct Supervisor {
    device: Arc<dyn Device>,
    engine: Arc<Engine>,
    silence_timeout: Duration,
    reconnect_delay: Duration,
}

impl Supervisor {
    pub fn new(device: Arc<dyn Device>, engine: Arc<Engine>) -> Supervisor {
        Supervisor {
            device,
            engine,
            silence_timeout: SILENCE_TIMEOUT,
            reconnect_delay: RECONNECT_DELAY,
        }
    }

    #[cfg(test)]
    /// Overrides the watchdog timing so tests don't have to wait for the
    /// production silence window.
    pub fn with_timing(mut self, silence_timeout: Duration, reconnect_delay: Duration) -> Self {
        self.silence_timeout = silence_timeout;
        self.reconnect_delay = reconnect_delay;
        self
    }

    /// Runs the supervisor until cancelled. Stream errors and silence cause
    /// a reconnect; nothing here is fatal to the process.
    pub async fn run(&self, cancel: CancelHandle) -> Result<(), io::Error> {
        // Attach the span with Instrument rather than an entered guard: the
        // future suspends inside select! and may resume on another worker
        // thread, which would leave the guard's span stuck on the old one.
        self.supervise(cancel)
            .instrument(span!(Level::INFO, "connection supervisor"))
            .await
    }

    async fn supervise(&self, cancel: CancelHandle) -> Result<(), io::Error> {
        loop {
            self.engine.reset();

            let (events_tx, mut events_rx) = mpsc::channel::<Vec<u8>>(EVENT_BUFFER);
            // Scope the non-Send boxed error so it is gone before any await;
            // holding it across one would make the future unspawnable on the
            // multi-threaded runtime.
            let watch_failed = match self.device.watch_events(events_tx) {
                Ok(()) => false,
                Err(e) => {
                    error!(err = e.to_string(), "Error watching MIDI events.");
                    true
                }
            };
            if watch_failed {
                if self.wait_before_reconnect(&cancel).await {
                    return Ok(());
                }
                continue;
            }

            info!(device = self.device.name(), "Connected, listening for MIDI events.");
            // Start the silence clock at connect, not at the first event.
            self.engine.touch();

            let mut watchdog = tokio::time::interval(WATCHDOG_INTERVAL);
            let reconnect = loop {
                tokio::select! {
                    maybe_event = events_rx.recv() => match maybe_event {
                        Some(raw) => self.engine.handle_message(&raw),
                        None => {
                            warn!("MIDI stream closed.");
                            break true;
                        }
                    },
                    _ = watchdog.tick() => {
                        if cancel.is_cancelled() {
                            break false;
                        }
                        if self.engine.idle_for() > self.silence_timeout {
                            warn!(
                                idle = format!("{:?}", self.engine.idle_for()),
                                "MIDI input went silent, reconnecting."
                            );
                            break true;
                        }
                    }
                }
            };

            self.device.stop_watch_events();

            if !reconnect || self.wait_before_reconnect(&cancel).await {
                self.engine.reset();
                info!("Supervisor stopped.");
                return Ok(());
            }
        }
    }

    /// Sleeps out the reconnect delay, polling for cancellation. Returns
    /// true if a stop was requested.
    async fn wait_before_reconnect(&self, cancel: &CancelHandle) -> bool {
        let step = WATCHDOG_INTERVAL.min(self.reconnect_delay);
        let mut waited = Duration::ZERO;
        while waited < self.reconnect_delay {
            if cancel.is_cancelled() {
                return true;
            }
            tokio::time::sleep(step).await;
            waited += step;
        }
        cancel.is_cancelled()
    }
}

#[cfg(test)]
mod test {
    use std::{error::Error, sync::Arc, time::Duration};

    use crate::{
        cancel::CancelHandle,
        engine::{layout::Layout, Engine},
        midi,
        test::test::eventually,
    };

    use super::Supervisor;

    fn test_engine() -> Arc<Engine> {
        Arc::new(Engine::new(Layout::SplitWhiteBlack, 64, 64, true, true))
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn events_flow_into_the_engine() -> Result<(), Box<dyn Error>> {
        let binding = midi::get_device("mock-device")?;
        let device = binding.to_mock()?;
        let engine = test_engine();
        let cancel = CancelHandle::new();

        let supervisor = Supervisor::new(binding.clone(), engine.clone());
        let handle = {
            let cancel = cancel.clone();
            tokio::spawn(async move { supervisor.run(cancel).await })
        };

        {
            let device = device.clone();
            eventually(
                move || device.watch_count() == 1,
                "Supervisor never connected",
            );
        }

        device.mock_event(&[0x90, 60, 100]);
        {
            let engine = engine.clone();
            eventually(move || engine.is_slot_active(0), "Slot never became active");
        }

        device.mock_event(&[0x80, 60, 0]);
        {
            let engine = engine.clone();
            eventually(move || !engine.is_slot_active(0), "Slot never released");
        }

        cancel.cancel();
        handle.await??;
        Ok(())
    }

    #[tokio::test]
    async fn supervisor_span_stays_on_its_own_task() -> Result<(), Box<dyn Error>> {
        let _guard = tracing::subscriber::set_default(tracing_subscriber::registry());

        let binding = midi::get_device("mock-device")?;
        let engine = test_engine();
        let cancel = CancelHandle::new();

        let supervisor = Supervisor::new(binding.clone(), engine.clone());
        let handle = {
            let cancel = cancel.clone();
            tokio::spawn(async move { supervisor.run(cancel).await })
        };

        // On a single-threaded runtime the supervisor polls on this thread.
        // Its span must be exited while it is suspended, so this task never
        // sees it as the current span.
        for _ in 0..10 {
            tokio::task::yield_now().await;
            assert!(tracing::Span::current().is_none());
        }

        cancel.cancel();
        handle.await??;
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn silence_restarts_the_connection_with_a_reset_engine(
    ) -> Result<(), Box<dyn Error>> {
        let binding = midi::get_device("mock-device")?;
        let device = binding.to_mock()?;
        let engine = test_engine();
        let cancel = CancelHandle::new();

        let supervisor = Supervisor::new(binding.clone(), engine.clone())
            .with_timing(Duration::from_millis(100), Duration::from_millis(10));
        let handle = {
            let cancel = cancel.clone();
            tokio::spawn(async move { supervisor.run(cancel).await })
        };

        {
            let device = device.clone();
            eventually(
                move || device.watch_count() == 1,
                "Supervisor never connected",
            );
        }

        // Leave a note hanging, then let the stream go silent.
        device.mock_event(&[0x90, 60, 100]);
        {
            let engine = engine.clone();
            eventually(move || engine.is_slot_active(0), "Slot never became active");
        }

        {
            let device = device.clone();
            eventually(
                move || device.watch_count() >= 2,
                "Supervisor never reconnected after silence",
            );
        }

        // The reconnect reset the engine, dropping the stale overlap count.
        assert!(!engine.is_slot_active(0));

        cancel.cancel();
        handle.await??;
        Ok(())
    }
}
