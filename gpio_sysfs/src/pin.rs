//! Pin handle and lifecycle state machine.
//!
//! A [`PinHandle`] owns one exported pin: its immutable configuration, the
//! cached value, the subscriber list and (for inputs) the poller task.
//!
//! # Ordering
//!
//! Every value-changing operation on a pin (`set`, `reset`, the cache update
//! of a poll tick, `close`) runs under a per-pin FIFO queue
//! (`tokio::sync::Mutex`). Operation N has updated the cache and finished
//! dispatching before operation N+1 starts, so back-to-back `set`/`reset`
//! always produce two transitions in call order.
//!
//! # Write/poll races
//!
//! A poll tick samples the write generation before reading the value file.
//! If an explicit write lands while the read is in flight, the generation
//! moves and the sample is discarded instead of overwriting the fresher
//! value the program just wrote.

use gpio_common::consts::EXPORT_SETTLE_STEP;
use gpio_common::error::{GpioError, GpioResult};
use gpio_common::types::{ChangeEvent, ChangeSource, Direction, Level, Phase, PinConfig};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::dispatcher::{ChangeDispatcher, ListenerId};
use crate::fs::PinFs;
use crate::paths::PinPaths;
use crate::poller::Poller;
use crate::registry::PinReservation;

/// Mutable per-pin state.
#[derive(Debug)]
struct PinState {
    value: Level,
    phase: Phase,
    /// Incremented on every explicit write.
    generation: u64,
}

pub(crate) struct PinInner<F: PinFs> {
    config: PinConfig,
    paths: PinPaths,
    fs: Arc<F>,
    /// Per-pin operation queue.
    ops: tokio::sync::Mutex<()>,
    state: Mutex<PinState>,
    dispatcher: ChangeDispatcher,
    poller: Mutex<Option<Poller>>,
    reservation: Mutex<Option<PinReservation>>,
    listener_faults: AtomicU64,
}

/// Handle to an open pin.
///
/// Cloning yields another handle to the same pin. Call [`close`](Self::close)
/// to unexport; dropping the last clone only stops polling and frees the
/// registry slot.
pub struct PinHandle<F: PinFs> {
    inner: Arc<PinInner<F>>,
}

impl<F: PinFs> Clone for PinHandle<F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<F: PinFs> fmt::Debug for PinHandle<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("PinHandle")
            .field("pin", &self.inner.config.pin)
            .field("direction", &self.inner.config.direction)
            .field("value", &state.value)
            .field("phase", &state.phase)
            .finish()
    }
}

impl<F: PinFs> PinHandle<F> {
    /// Export and configure a pin whose id is already reserved.
    ///
    /// On failure after a successful export the pin is unexported again
    /// (best-effort) and the reservation is released.
    pub(crate) async fn establish(
        fs: Arc<F>,
        paths: PinPaths,
        config: PinConfig,
        reservation: PinReservation,
        export_settle: Duration,
    ) -> GpioResult<Self> {
        let inner = Arc::new(PinInner {
            config,
            paths,
            fs,
            ops: tokio::sync::Mutex::new(()),
            state: Mutex::new(PinState {
                value: Level::Low,
                phase: Phase::Unexported,
                generation: 0,
            }),
            dispatcher: ChangeDispatcher::new(),
            poller: Mutex::new(None),
            reservation: Mutex::new(Some(reservation)),
            listener_faults: AtomicU64::new(0),
        });

        inner.set_phase(Phase::Exporting);
        inner.export(export_settle).await?;

        let initial = match inner.configure().await {
            Ok(level) => level,
            Err(err) => {
                inner.unexport_after_failure().await;
                return Err(err);
            }
        };

        {
            let mut state = inner.state.lock();
            state.value = initial;
            state.phase = Phase::Ready;
        }

        if config.direction == Direction::In {
            let poller = Poller::spawn(Arc::downgrade(&inner), config.poll_interval);
            *inner.poller.lock() = Some(poller);
        }

        info!(
            "GPIO {} ready ({}, value {})",
            config.pin, config.direction, initial
        );
        Ok(Self { inner })
    }

    /// Drive the pin high.
    pub async fn set(&self) -> GpioResult<()> {
        self.write(Level::High).await
    }

    /// Drive the pin low.
    pub async fn reset(&self) -> GpioResult<()> {
        self.write(Level::Low).await
    }

    /// Write `level` to the value attribute and update the cache.
    ///
    /// Dispatches a change event only if the cached value changed. On an
    /// input pin the kernel rejects the write; that rejection is ignored and
    /// only the cache is updated.
    ///
    /// # Errors
    /// `ClosedHandle` after close, `Write` if an output write fails.
    pub async fn write(&self, level: Level) -> GpioResult<()> {
        let inner = &self.inner;
        let pin = inner.config.pin;

        let _op = inner.ops.lock().await;
        inner.ensure_ready()?;

        if let Err(source) = inner.fs.write(&inner.paths.value, level.as_sysfs()).await {
            if inner.config.direction == Direction::In {
                debug!(
                    "GPIO {} is an input, write of {} ignored by kernel ({}); cache only",
                    pin, level, source
                );
            } else {
                return Err(GpioError::Write { pin, source });
            }
        }

        inner.apply(level, ChangeSource::Write, None);
        Ok(())
    }

    /// Tear the pin down: stop polling, unexport, drop listeners, free the
    /// registry slot.
    ///
    /// Operations queued before `close` run to completion first (including
    /// their dispatch); operations queued after it fail with `ClosedHandle`.
    /// No listener fires after this returns. Calling it again is a no-op.
    ///
    /// # Errors
    /// `Unexport` if the unexport write failed; teardown still completes.
    pub async fn close(&self) -> GpioResult<()> {
        let inner = &self.inner;
        let pin = inner.config.pin;

        if inner.phase().is_terminal() {
            debug!("GPIO {} close ignored, already {:?}", pin, inner.phase());
            return Ok(());
        }

        let poller = inner.poller.lock().take();
        if let Some(poller) = poller {
            poller.cancel();
        }

        // Queued writes ahead of us still complete against a Ready pin.
        let _op = inner.ops.lock().await;
        {
            let mut state = inner.state.lock();
            if state.phase.is_terminal() {
                debug!("GPIO {} closed concurrently", pin);
                return Ok(());
            }
            state.phase = Phase::Closing;
        }

        let result = inner
            .fs
            .write(&inner.paths.unexport, &pin.to_string())
            .await
            .map_err(|source| GpioError::Unexport { pin, source });

        inner.dispatcher.clear();
        inner.set_phase(Phase::Closed);
        inner.reservation.lock().take();

        match &result {
            Ok(()) => info!("GPIO {} closed", pin),
            Err(err) => warn!("GPIO {} closed with error: {}", pin, err),
        }
        result
    }

    /// Register a change listener; listeners run in registration order.
    ///
    /// # Errors
    /// `ClosedHandle` after close.
    pub fn on<L>(&self, listener: L) -> GpioResult<ListenerId>
    where
        L: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        self.inner.ensure_ready()?;
        Ok(self.inner.dispatcher.subscribe(listener))
    }

    /// Remove a listener. Returns `false` if it was not registered.
    ///
    /// # Errors
    /// `ClosedHandle` after close.
    pub fn remove_listener(&self, id: ListenerId) -> GpioResult<bool> {
        self.inner.ensure_ready()?;
        Ok(self.inner.dispatcher.unsubscribe(id))
    }

    /// Cached value.
    pub fn value(&self) -> Level {
        self.inner.state.lock().value
    }

    /// Pin id.
    pub fn pin(&self) -> u32 {
        self.inner.config.pin
    }

    /// Configured direction.
    pub fn direction(&self) -> Direction {
        self.inner.config.direction
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.inner.phase()
    }

    /// Number of explicit writes applied so far.
    pub fn generation(&self) -> u64 {
        self.inner.state.lock().generation
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.inner.dispatcher.len()
    }

    /// Number of listener panics isolated so far.
    pub fn listener_faults(&self) -> u64 {
        self.inner.listener_faults.load(Ordering::Relaxed)
    }

    /// Whether a poller task is attached.
    pub fn is_polling(&self) -> bool {
        self.inner
            .poller
            .lock()
            .as_ref()
            .is_some_and(|p| !p.is_finished())
    }
}

impl<F: PinFs> PinInner<F> {
    pub(crate) fn pin(&self) -> u32 {
        self.config.pin
    }

    pub(crate) fn phase(&self) -> Phase {
        self.state.lock().phase
    }

    fn set_phase(&self, phase: Phase) {
        self.state.lock().phase = phase;
    }

    fn ensure_ready(&self) -> GpioResult<()> {
        match self.phase() {
            Phase::Ready => Ok(()),
            _ => Err(GpioError::ClosedHandle {
                pin: self.config.pin,
            }),
        }
    }

    async fn export(&self, settle: Duration) -> GpioResult<()> {
        let pin = self.config.pin;

        if let Err(source) = self.fs.write(&self.paths.export, &pin.to_string()).await {
            // Some boards export pins at boot.
            if self.fs.exists(&self.paths.dir).await {
                warn!("GPIO {} already exported ({}), reusing it", pin, source);
            } else {
                return Err(GpioError::Export { pin, source });
            }
        }

        // The kernel (and udev permission rules) may lag behind the export write.
        let deadline = Instant::now() + settle;
        while !self.fs.exists(&self.paths.direction).await {
            if Instant::now() >= deadline {
                warn!(
                    "GPIO {} direction attribute not present after {:?}",
                    pin, settle
                );
                break;
            }
            tokio::time::sleep(EXPORT_SETTLE_STEP).await;
        }
        Ok(())
    }

    /// Write the direction and establish the initial cached value.
    async fn configure(&self) -> GpioResult<Level> {
        let pin = self.config.pin;

        self.fs
            .write(&self.paths.direction, self.config.direction.as_sysfs())
            .await
            .map_err(|source| GpioError::Direction { pin, source })?;

        match self.config.direction {
            Direction::Out => {
                self.fs
                    .write(&self.paths.value, Level::Low.as_sysfs())
                    .await
                    .map_err(|source| GpioError::Write { pin, source })?;
                Ok(Level::Low)
            }
            Direction::In => {
                let raw = self
                    .fs
                    .read(&self.paths.value)
                    .await
                    .map_err(|source| GpioError::Read { pin, source })?;
                match Level::from_sysfs(&raw) {
                    Some(level) => Ok(level),
                    None => Err(GpioError::InvalidValue { pin, raw }),
                }
            }
        }
    }

    async fn unexport_after_failure(&self) {
        let pin = self.config.pin;
        if let Err(err) = self.fs.write(&self.paths.unexport, &pin.to_string()).await {
            warn!("GPIO {} cleanup unexport failed: {}", pin, err);
        }
        self.set_phase(Phase::Closed);
    }

    /// One poll tick: read the value file and feed it into the transition
    /// logic.
    ///
    /// # Errors
    /// `PollRead`/`InvalidValue`; the caller logs and retries next tick.
    pub(crate) async fn poll_tick(&self) -> GpioResult<Option<ChangeEvent>> {
        let pin = self.config.pin;

        let sampled_at = {
            let state = self.state.lock();
            if state.phase != Phase::Ready {
                return Ok(None);
            }
            state.generation
        };

        let raw = self
            .fs
            .read(&self.paths.value)
            .await
            .map_err(|source| GpioError::PollRead { pin, source })?;
        let level = match Level::from_sysfs(&raw) {
            Some(level) => level,
            None => return Err(GpioError::InvalidValue { pin, raw }),
        };

        let _op = self.ops.lock().await;
        Ok(self.apply(level, ChangeSource::Poll, Some(sampled_at)))
    }

    /// Transition detection shared by writes and polls.
    ///
    /// Must be called with the operation queue held.
    fn apply(
        &self,
        level: Level,
        source: ChangeSource,
        sampled_at: Option<u64>,
    ) -> Option<ChangeEvent> {
        let event = {
            let mut state = self.state.lock();
            if state.phase != Phase::Ready {
                return None;
            }

            match source {
                ChangeSource::Write => state.generation += 1,
                ChangeSource::Poll => {
                    if sampled_at != Some(state.generation) {
                        debug!(
                            "GPIO {} poll sample discarded, write landed during read",
                            self.config.pin
                        );
                        return None;
                    }
                }
            }

            if state.value == level {
                return None;
            }
            let previous = std::mem::replace(&mut state.value, level);
            ChangeEvent {
                pin: self.config.pin,
                previous,
                value: level,
                source,
                generation: state.generation,
            }
        };

        self.notify(&event);
        Some(event)
    }

    fn notify(&self, event: &ChangeEvent) {
        debug!(
            "GPIO {} {} -> {} ({:?})",
            event.pin, event.previous, event.value, event.source
        );
        let report = self.dispatcher.dispatch(event);
        for fault in &report.faults {
            self.listener_faults.fetch_add(1, Ordering::Relaxed);
            error!("GPIO {} {}", event.pin, fault);
        }
    }
}

impl<F: PinFs> Drop for PinInner<F> {
    fn drop(&mut self) {
        if self.state.get_mut().phase == Phase::Ready {
            warn!(
                "GPIO {} dropped without close, left exported",
                self.config.pin
            );
        }
    }
}
