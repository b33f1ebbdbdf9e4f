//! Content generation
//!
//! Produces chunks of fill content for the three fill policies.  Content for
//! the `Fixed` policy is keyed by the absolute offset of the byte within the
//! newly generated content, so chunk boundaries never show in the output.
//!
//! ## Authors
//!
//! The fillgen Development Team.
//!
//! ## Licensing and copyright notice
//!
//! See the `LICENSE.md` file in the fillgen root directory for
//! information on licensing and copyright.

use crate::error::ValidationError;
use rand::{
    distributions::{Distribution, Uniform},
    rngs::StdRng,
    SeedableRng,
};
use std::{fmt, str::FromStr};

/// The byte written by the `Null` policy.
pub const NULL_BYTE: u8 = 0;

/// The strategy determining which bytes are written.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FillPolicy {
    /// Zero bytes; the template is ignored.
    Null,
    /// Bytes drawn independently and uniformly from the template.
    Random,
    /// The template repeated cyclically.
    Fixed,
}

impl FillPolicy {
    /// Whether this policy reads its content from the template.
    pub fn uses_template(self) -> bool {
        !matches!(self, FillPolicy::Null)
    }
}

impl Default for FillPolicy {
    fn default() -> Self {
        FillPolicy::Null
    }
}

impl fmt::Display for FillPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FillPolicy::Null => "null",
            FillPolicy::Random => "random",
            FillPolicy::Fixed => "fixed",
        };
        f.write_str(name)
    }
}

impl FromStr for FillPolicy {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "null" | "zero" => Ok(FillPolicy::Null),
            "random" => Ok(FillPolicy::Random),
            "fixed" => Ok(FillPolicy::Fixed),
            _ => Err(ValidationError::UnknownPolicy(s.to_string())),
        }
    }
}

/// Stateful content source used by the write loop.  Owns the random source so
/// that a seeded run produces the same bytes on every invocation.
pub struct ContentGenerator {
    policy: FillPolicy,
    template: Vec<u8>,
    rng: StdRng,
}

impl ContentGenerator {
    /// A generator drawing randomness from the operating system.
    pub fn new(policy: FillPolicy, template: &[u8]) -> Self {
        Self {
            policy,
            template: template.to_vec(),
            rng: StdRng::from_entropy(),
        }
    }

    /// A generator whose `Random` output is reproducible for a given seed.
    pub fn with_seed(policy: FillPolicy, template: &[u8], seed: u64) -> Self {
        Self {
            policy,
            template: template.to_vec(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Produces `length` bytes of content starting at `absolute_offset`.
    ///
    /// Callers must not pass an empty template with `Fixed` or `Random`;
    /// `FillSpecBuilder::build` rejects that combination.
    pub fn next_chunk(&mut self, absolute_offset: u64, length: usize) -> Vec<u8> {
        match self.policy {
            FillPolicy::Null => vec![NULL_BYTE; length],
            FillPolicy::Fixed => {
                let start = (absolute_offset % self.template.len() as u64) as usize;
                self.template
                    .iter()
                    .cycle()
                    .skip(start)
                    .take(length)
                    .copied()
                    .collect()
            }
            FillPolicy::Random => {
                let index = Uniform::from(0..self.template.len());
                let template = &self.template;
                index
                    .sample_iter(&mut self.rng)
                    .take(length)
                    .map(|i| template[i])
                    .collect()
            }
        }
    }
}

/// Produces `length` bytes of content for `policy` at `absolute_offset`,
/// using a fresh random source for the `Random` policy.
pub fn generate(
    policy: FillPolicy,
    template: &[u8],
    absolute_offset: u64,
    length: usize,
) -> Vec<u8> {
    ContentGenerator::new(policy, template).next_chunk(absolute_offset, length)
}
