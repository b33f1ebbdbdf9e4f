//! Sized content-fill engine
//!
//! Generates a file of an exact size under one of three fill policies, while
//! staying responsive to cancellation and never corrupting a pre-existing
//! target.  The engine consists of:
//!
//! - `size`: resolution of `(magnitude, unit)` pairs into byte counts,
//! - `content`: generation of fill content for the `Null`, `Random` and
//!   `Fixed` policies,
//! - `fill_spec`: the validated, immutable fill request,
//! - `writer`: the chunked write loop and the staging-file swap,
//! - `operation`: a generic coordinator racing a unit of work against a
//!   polled cancellation predicate.
//!
//! ## Authors
//!
//! The fillgen Development Team.
//!
//! ## Licensing and copyright notice
//!
//! See the `LICENSE.md` file in the fillgen root directory for
//! information on licensing and copyright.

pub mod content;
pub mod error;
pub mod fill_spec;
pub mod operation;
pub mod size;
pub mod writer;

pub use crate::{
    content::{generate, ContentGenerator, FillPolicy},
    error::{FillError, ValidationError},
    fill_spec::{FillSpec, FillSpecBuilder},
    operation::{
        Cancellation, CancellableOperation, Fault, OperationHandle, OperationObserver,
        OperationOutcome, StopToken,
    },
    size::{resolve, SizeUnit},
    writer::SizedFileWriter,
};

use std::time::Duration;

////////////////////////////////////////////////////////////////////////////////
// Options.
////////////////////////////////////////////////////////////////////////////////

/// The largest chunk handed to the content generator in one step.
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 32767;
/// How often the watcher re-evaluates the cancellation predicate.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Tunables shared by the writer and the coordinator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Options {
    /// Upper bound on the size of one generated chunk, and therefore on the
    /// granularity of cancellation checks.
    pub max_chunk_size: usize,
    pub poll_interval: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Entry point.
////////////////////////////////////////////////////////////////////////////////

/// Starts filling `spec` under `operation`, with `cancel` polled as the
/// cancellation predicate and `progress` receiving the fraction written before
/// each chunk.  The outcome's `Completed` value is the number of bytes
/// generated.
pub fn start_fill<P, C>(
    operation: &mut CancellableOperation,
    spec: FillSpec,
    options: &Options,
    progress: P,
    cancel: C,
) -> OperationHandle<u64, FillError>
where
    P: FnMut(f64) + Send + 'static,
    C: FnMut() -> bool + Send + 'static,
{
    let writer = SizedFileWriter::new(spec, options);
    operation.start(move |stop: &StopToken| writer.run(stop, progress), cancel)
}
