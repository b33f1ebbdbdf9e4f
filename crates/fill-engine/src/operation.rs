//! Cancellable operations
//!
//! Runs a unit of work on its own thread while a watcher thread polls a
//! caller-supplied cancellation predicate.  When the predicate fires, the
//! watcher raises a `StopToken` that the work is expected to check between
//! steps.  The coordinator waits until the work has actually exited, stops
//! the watcher, and reports exactly one `OperationOutcome`.
//!
//! Cancellation is cooperative: nothing is ever killed.  There is no timeout
//! either, so a predicate that never fires combined with work that never
//! finishes blocks `OperationHandle::join` forever.
//!
//! ## Authors
//!
//! The fillgen Development Team.
//!
//! ## Licensing and copyright notice
//!
//! See the `LICENSE.md` file in the fillgen root directory for
//! information on licensing and copyright.

use crate::Options;
use log::{debug, info, warn};
use std::{
    any::Any,
    error::Error,
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::{channel, RecvTimeoutError},
        Arc,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

////////////////////////////////////////////////////////////////////////////////
// Stop signalling.
////////////////////////////////////////////////////////////////////////////////

/// One-way stop flag shared between the coordinator and the running work.
#[derive(Clone, Debug, Default)]
pub struct StopToken(Arc<AtomicBool>);

impl StopToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Asks the work to stop at its next check.  Idempotent.
    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[inline]
    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Implemented by error types that can tell a cooperative stop apart from a
/// genuine failure.
pub trait Cancellation {
    fn is_cancellation(&self) -> bool;
}

////////////////////////////////////////////////////////////////////////////////
// Outcomes.
////////////////////////////////////////////////////////////////////////////////

/// Why a run faulted.
#[derive(Debug)]
pub enum Fault<E> {
    /// The work returned an error that was not a cancellation.
    Error(E),
    /// The work panicked; the payload is rendered as a message.
    Panic(String),
}

impl<E> Fault<E> {
    /// The original error, if the work returned one.
    pub fn error(&self) -> Option<&E> {
        match self {
            Fault::Error(e) => Some(e),
            Fault::Panic(_) => None,
        }
    }

    pub fn into_error(self) -> Option<E> {
        match self {
            Fault::Error(e) => Some(e),
            Fault::Panic(_) => None,
        }
    }
}

impl<E: fmt::Display> fmt::Display for Fault<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fault::Error(e) => write!(f, "{}", e),
            Fault::Panic(message) => write!(f, "operation panicked: {}", message),
        }
    }
}

impl<E: Error + 'static> Error for Fault<E> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Fault::Error(e) => Some(e),
            Fault::Panic(_) => None,
        }
    }
}

/// The single terminal result of one run.
#[derive(Debug)]
pub enum OperationOutcome<T, E> {
    Completed(T),
    Cancelled,
    Faulted(Fault<E>),
}

impl<T, E> OperationOutcome<T, E> {
    #[inline]
    pub fn is_completed(&self) -> bool {
        matches!(self, OperationOutcome::Completed(_))
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, OperationOutcome::Cancelled)
    }

    #[inline]
    pub fn is_faulted(&self) -> bool {
        matches!(self, OperationOutcome::Faulted(_))
    }
}

/// Receives the outcome notification, then the unconditional `finished`
/// notification, once each per run.
pub trait OperationObserver<T, E> {
    fn outcome(&mut self, _outcome: &OperationOutcome<T, E>) {}

    fn finished(&mut self) {}
}

impl<T, E> OperationObserver<T, E> for () {}

////////////////////////////////////////////////////////////////////////////////
// Running operations.
////////////////////////////////////////////////////////////////////////////////

/// Marks a run as no longer active when the work's thread exits, including by
/// unwinding.
struct RunningGuard(Arc<AtomicBool>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// A run that has been started but not yet joined.
pub struct OperationHandle<T, E> {
    id: u64,
    stop: StopToken,
    action: JoinHandle<Result<T, E>>,
    watcher: JoinHandle<bool>,
}

impl<T, E: Cancellation> OperationHandle<T, E> {
    /// The token the work observes.  Raising it by hand has the same effect as
    /// the cancellation predicate firing.
    pub fn stop_token(&self) -> &StopToken {
        &self.stop
    }

    /// Waits for the work and the watcher to exit and returns the outcome.
    pub fn join(self) -> OperationOutcome<T, E> {
        self.join_with(&mut ())
    }

    /// As `join`, additionally notifying `observer` of the outcome and then
    /// of the end of the run.
    pub fn join_with<O>(self, observer: &mut O) -> OperationOutcome<T, E>
    where
        O: OperationObserver<T, E> + ?Sized,
    {
        let result = self.action.join();

        // The work has exited and dropped its end of the completion channel,
        // so the watcher returns promptly.
        let cancel_requested = match self.watcher.join() {
            Ok(requested) => requested,
            Err(panic) => {
                warn!(
                    "Operation {}: cancellation predicate panicked: {}.",
                    self.id,
                    panic_message(panic.as_ref())
                );
                false
            }
        };

        let outcome = match result {
            Ok(Ok(value)) => OperationOutcome::Completed(value),
            Ok(Err(e)) if e.is_cancellation() => OperationOutcome::Cancelled,
            Ok(Err(e)) => OperationOutcome::Faulted(Fault::Error(e)),
            Err(panic) => OperationOutcome::Faulted(Fault::Panic(panic_message(panic.as_ref()))),
        };

        info!(
            "Operation {} finished: {} (cancellation requested: {}).",
            self.id,
            outcome_name(&outcome),
            cancel_requested
        );

        observer.outcome(&outcome);
        observer.finished();
        outcome
    }
}

/// Coordinator for cancellable runs.  One coordinator may be re-armed any
/// number of times; starting a run while the previous one is still active
/// raises the previous run's stop token first.
pub struct CancellableOperation {
    poll_interval: Duration,
    runs: u64,
    active: Option<(StopToken, Arc<AtomicBool>)>,
}

impl Default for CancellableOperation {
    fn default() -> Self {
        Self::new(&Options::default())
    }
}

impl CancellableOperation {
    pub fn new(options: &Options) -> Self {
        Self {
            poll_interval: options.poll_interval,
            runs: 0,
            active: None,
        }
    }

    /// Whether the most recently started run's work is still executing.
    pub fn is_running(&self) -> bool {
        self.active
            .as_ref()
            .map_or(false, |(_, running)| running.load(Ordering::SeqCst))
    }

    /// Starts `action` on its own thread and `cancel` on a watcher thread.
    pub fn start<T, E, A, C>(&mut self, action: A, mut cancel: C) -> OperationHandle<T, E>
    where
        T: Send + 'static,
        E: Send + 'static,
        A: FnOnce(&StopToken) -> Result<T, E> + Send + 'static,
        C: FnMut() -> bool + Send + 'static,
    {
        if let Some((previous, running)) = self.active.take() {
            if running.load(Ordering::SeqCst) {
                info!("Operation {}: still running, requesting cancellation.", self.runs);
                previous.raise();
            }
        }

        self.runs += 1;
        let id = self.runs;
        let stop = StopToken::new();
        let running = Arc::new(AtomicBool::new(true));
        let (done_tx, done_rx) = channel::<()>();

        debug!("Operation {}: starting.", id);

        let action = thread::spawn({
            let stop = stop.clone();
            let running = running.clone();
            move || {
                let _guard = RunningGuard(running);
                let result = action(&stop);
                // Ignored: the watcher may already have returned after
                // requesting cancellation.
                let _ = done_tx.send(());
                result
            }
        });

        let poll_interval = self.poll_interval;
        let watcher = thread::spawn({
            let stop = stop.clone();
            move || loop {
                if cancel() {
                    debug!("Operation {}: cancellation predicate fired.", id);
                    stop.raise();
                    return true;
                }
                match done_rx.recv_timeout(poll_interval) {
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => return false,
                    Err(RecvTimeoutError::Timeout) => continue,
                }
            }
        });

        self.active = Some((stop.clone(), running));

        OperationHandle {
            id,
            stop,
            action,
            watcher,
        }
    }

    /// Starts a run and blocks until its outcome is known.
    pub fn run<T, E, A, C>(&mut self, action: A, cancel: C) -> OperationOutcome<T, E>
    where
        T: Send + 'static,
        E: Cancellation + Send + 'static,
        A: FnOnce(&StopToken) -> Result<T, E> + Send + 'static,
        C: FnMut() -> bool + Send + 'static,
    {
        self.start(action, cancel).join()
    }
}

fn outcome_name<T, E>(outcome: &OperationOutcome<T, E>) -> &'static str {
    match outcome {
        OperationOutcome::Completed(_) => "completed",
        OperationOutcome::Cancelled => "cancelled",
        OperationOutcome::Faulted(_) => "faulted",
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "(non-string panic payload)".to_string()
    }
}
