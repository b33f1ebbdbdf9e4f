//! fillgen: generates a file of an exact size.
//!
//! ## About
//!
//! The target file, its size and the fill policy are passed with the
//! `--file`, `--size`/`--unit` and `--policy`/`--content` flags.  The file is
//! written to a staging file first and only replaces the target once the
//! whole fill has succeeded; pressing Ctrl-C cancels the fill and leaves any
//! existing target untouched.
//!
//! To see verbose output of what is happening, set `RUST_LOG=info` before
//! executing.  The chunk size and the cancellation poll interval can be tuned
//! with `FILLGEN_CHUNK_SIZE` and `FILLGEN_POLL_INTERVAL_MS`.
//!
//! ## Authors
//!
//! The fillgen Development Team.
//!
//! ## Copyright
//!
//! See the file `LICENSE.md` in the fillgen root directory for licensing
//! and copyright information.

use anyhow::{anyhow, Context};
use clap::{Arg, ArgAction};
use fill_engine::{
    start_fill, CancellableOperation, FillError, FillPolicy, FillSpec, FillSpecBuilder,
    OperationObserver, OperationOutcome, Options, SizeUnit,
};
use log::*;
use signal_hook::consts::SIGINT;
use std::{
    env,
    io::{self, Write},
    process,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

////////////////////////////////////////////////////////////////////////////////
// Constants.
////////////////////////////////////////////////////////////////////////////////

/// About fillgen.
const ABOUT: &str = "Generates a file of an exact size, filled with null bytes, random \
                     characters drawn from a template, or a template repeated cyclically.  \
                     Press Ctrl-C to cancel; an existing target is only replaced once the \
                     whole file has been written.";
/// The name of the application.
const APPLICATION_NAME: &str = "fillgen";
/// The authors list.
const AUTHORS: &str = "The fillgen Development Team.";
/// Application version number.
const VERSION: &str = "pre-alpha";

/// Exit code for a fill cancelled by the user (128 + SIGINT).
const EXIT_CANCELLED: i32 = 130;
/// Exit code for a fill that failed while running.
const EXIT_FAULTED: i32 = 1;
/// Exit code for a malformed request.
const EXIT_INVALID: i32 = 2;

////////////////////////////////////////////////////////////////////////////////
// Command line options and parsing.
////////////////////////////////////////////////////////////////////////////////

/// Parses the command line into a builder.  Malformed flags abort the program
/// through clap; semantic checks are left to `FillSpecBuilder::build`.
fn parse_command_line() -> anyhow::Result<FillSpecBuilder> {
    let matches = clap::Command::new(APPLICATION_NAME)
        .version(VERSION)
        .author(AUTHORS)
        .about(ABOUT)
        .arg(
            Arg::new("file")
                .short('f')
                .long("file")
                .value_name("PATH")
                .help("The file to generate.")
                .num_args(1)
                .required(true),
        )
        .arg(
            Arg::new("size")
                .short('s')
                .long("size")
                .value_name("NUMBER")
                .help("The size of the content to generate, in units of --unit.")
                .num_args(1)
                .value_parser(clap::value_parser!(u64))
                .required(true),
        )
        .arg(
            Arg::new("unit")
                .short('u')
                .long("unit")
                .value_name("b | kb | mb | gb")
                .help("The unit of --size.  Each unit is 1024 times the previous one.")
                .num_args(1)
                .default_value("b"),
        )
        .arg(
            Arg::new("policy")
                .short('p')
                .long("policy")
                .value_name("null | random | fixed")
                .help(
                    "Selects the fill policy: null bytes, random characters drawn from \
                     --content, or --content repeated.",
                )
                .num_args(1)
                .default_value("null"),
        )
        .arg(
            Arg::new("content")
                .short('c')
                .long("content")
                .value_name("TEMPLATE")
                .help("The ASCII content template used by the random and fixed policies.")
                .num_args(1)
                .default_value(""),
        )
        .arg(
            Arg::new("append")
                .short('a')
                .long("append")
                .help("Keep the existing content of the file and append after it.")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("seed")
                .short('e')
                .long("seed")
                .value_name("NUMBER")
                .help("Seed for the random policy, making its output reproducible.")
                .num_args(1)
                .value_parser(clap::value_parser!(u64)),
        )
        .get_matches();

    info!("Parsed command line.");

    let file = matches
        .get_one::<String>("file")
        .ok_or(anyhow!("No target file provided"))?;
    let size = *matches
        .get_one::<u64>("size")
        .ok_or(anyhow!("No size provided"))?;
    let unit = matches
        .get_one::<String>("unit")
        .map_or(Ok(SizeUnit::Byte), |u| u.parse())?;
    let policy = matches
        .get_one::<String>("policy")
        .map_or(Ok(FillPolicy::Null), |p| p.parse())?;
    let template = matches
        .get_one::<String>("content")
        .cloned()
        .unwrap_or_default();
    let append = matches.get_flag("append");
    let seed = matches.get_one::<u64>("seed").copied();

    Ok(FillSpecBuilder::new()
        .path(file)
        .size(size, unit)
        .policy(policy)
        .template(template)
        .append(append)
        .seed(seed))
}

/// Reads the engine options, applying any environment overrides.
fn read_options() -> anyhow::Result<Options> {
    let mut options = Options::default();

    if let Ok(chunk_size) = env::var("FILLGEN_CHUNK_SIZE") {
        options.max_chunk_size = chunk_size
            .parse()
            .with_context(|| format!("Couldn't parse FILLGEN_CHUNK_SIZE: {:?}", chunk_size))?;
    }
    if let Ok(interval) = env::var("FILLGEN_POLL_INTERVAL_MS") {
        let millis: u64 = interval
            .parse()
            .with_context(|| format!("Couldn't parse FILLGEN_POLL_INTERVAL_MS: {:?}", interval))?;
        options.poll_interval = Duration::from_millis(millis);
    }

    Ok(options)
}

////////////////////////////////////////////////////////////////////////////////
// Console reporting.
////////////////////////////////////////////////////////////////////////////////

/// Prints the outcome of the fill and terminates the progress line.
struct Console<'a> {
    spec: &'a FillSpec,
}

impl<'a> OperationObserver<u64, FillError> for Console<'a> {
    fn outcome(&mut self, outcome: &OperationOutcome<u64, FillError>) {
        match outcome {
            OperationOutcome::Completed(bytes) => eprint!(
                "\r{:?}: 100.0% ({} bytes written)",
                self.spec.path(),
                bytes
            ),
            OperationOutcome::Cancelled => {
                eprint!("\r{:?}: cancelled, file left unchanged", self.spec.path())
            }
            OperationOutcome::Faulted(fault) => {
                eprint!("\r{:?}: failed: {}", self.spec.path(), fault)
            }
        }
    }

    fn finished(&mut self) {
        eprintln!();
    }
}

/// Entry: parses the command line, validates the request, and runs the fill
/// until it completes, fails, or is cancelled with Ctrl-C.
fn main() -> anyhow::Result<()> {
    env_logger::init();

    let spec = match parse_command_line().and_then(|builder| Ok(builder.build()?)) {
        Ok(spec) => spec,
        Err(e) => {
            eprintln!("{}: {}", APPLICATION_NAME, e);
            process::exit(EXIT_INVALID);
        }
    };
    let options = read_options()?;

    info!(
        "Generating {:?}: {} {} ({} bytes) of {} content.",
        spec.path(),
        spec.magnitude(),
        spec.unit(),
        spec.total_bytes(),
        spec.policy()
    );
    if spec.policy().uses_template() {
        info!("Content template: {:?}.", spec.template());
    }
    if let Some(seed) = spec.seed() {
        info!("Random seed: {}.", seed);
    }

    let interrupted = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(SIGINT, interrupted.clone())?;

    let label = format!("{:?}", spec.path());
    let progress = move |fraction: f64| {
        eprint!("\r{}: {:5.1}%", label, fraction * 100.0);
        let _ = io::stderr().flush();
    };
    let cancel = move || interrupted.load(Ordering::SeqCst);

    let mut operation = CancellableOperation::new(&options);
    let mut console = Console { spec: &spec };
    let outcome = start_fill(&mut operation, spec.clone(), &options, progress, cancel)
        .join_with(&mut console);

    match outcome {
        OperationOutcome::Completed(bytes) => {
            info!("Wrote {} bytes to {:?}.", bytes, spec.path());
            Ok(())
        }
        OperationOutcome::Cancelled => {
            warn!("Fill of {:?} cancelled.", spec.path());
            process::exit(EXIT_CANCELLED);
        }
        OperationOutcome::Faulted(fault) => {
            error!("Fill of {:?} failed: {}.", spec.path(), fault);
            process::exit(EXIT_FAULTED);
        }
    }
}
