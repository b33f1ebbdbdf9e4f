//! Fill requests
//!
//! A `FillSpec` is an immutable, validated description of one fill: where to
//! write, how much, and with what content.  It can only be obtained through
//! `FillSpecBuilder::build`, which performs every check that must happen
//! before any file I/O begins.
//!
//! ## Authors
//!
//! The fillgen Development Team.
//!
//! ## Licensing and copyright notice
//!
//! See the `LICENSE.md` file in the fillgen root directory for
//! information on licensing and copyright.

use crate::{
    content::{ContentGenerator, FillPolicy},
    error::ValidationError,
    size::{self, SizeUnit},
};
use std::path::{Path, PathBuf};

////////////////////////////////////////////////////////////////////////////////
// The validated request.
////////////////////////////////////////////////////////////////////////////////

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FillSpec {
    path: PathBuf,
    magnitude: u64,
    unit: SizeUnit,
    policy: FillPolicy,
    template: String,
    append: bool,
    seed: Option<u64>,
    /// `magnitude` resolved into bytes at build time.
    total_bytes: u64,
}

impl FillSpec {
    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[inline]
    pub fn magnitude(&self) -> u64 {
        self.magnitude
    }

    #[inline]
    pub fn unit(&self) -> SizeUnit {
        self.unit
    }

    #[inline]
    pub fn policy(&self) -> FillPolicy {
        self.policy
    }

    #[inline]
    pub fn template(&self) -> &str {
        &self.template
    }

    #[inline]
    pub fn append(&self) -> bool {
        self.append
    }

    #[inline]
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// The resolved size in bytes.  In append mode the number of bytes
    /// generated also depends on the target's existing length; see
    /// `writer::appended_length`.
    #[inline]
    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    /// A content generator configured for this request.
    pub fn content_generator(&self) -> ContentGenerator {
        match self.seed {
            Some(seed) => ContentGenerator::with_seed(self.policy, self.template.as_bytes(), seed),
            None => ContentGenerator::new(self.policy, self.template.as_bytes()),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Builder.
////////////////////////////////////////////////////////////////////////////////

/// Accumulates the pieces of a fill request.  Each setter consumes and
/// returns the builder; nothing is checked until `build`.
#[derive(Clone, Debug, Default)]
pub struct FillSpecBuilder {
    path: Option<PathBuf>,
    magnitude: u64,
    unit: SizeUnit,
    policy: FillPolicy,
    template: String,
    append: bool,
    seed: Option<u64>,
}

impl FillSpecBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn size(mut self, magnitude: u64, unit: SizeUnit) -> Self {
        self.magnitude = magnitude;
        self.unit = unit;
        self
    }

    pub fn policy(mut self, policy: FillPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn template<T: Into<String>>(mut self, template: T) -> Self {
        self.template = template.into();
        self
    }

    pub fn append(mut self, append: bool) -> Self {
        self.append = append;
        self
    }

    pub fn seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Validates the request and resolves its byte count.
    pub fn build(self) -> Result<FillSpec, ValidationError> {
        let path = match self.path {
            Some(path) if !path.as_os_str().is_empty() => path,
            _ => return Err(ValidationError::MissingPath),
        };

        if self.policy.uses_template() {
            if self.template.is_empty() {
                return Err(ValidationError::EmptyTemplate(self.policy));
            }
            if !self.template.is_ascii() {
                return Err(ValidationError::NonAsciiTemplate);
            }
        }

        let total_bytes = size::resolve(self.magnitude, self.unit)?;

        Ok(FillSpec {
            path,
            magnitude: self.magnitude,
            unit: self.unit,
            policy: self.policy,
            template: self.template,
            append: self.append,
            seed: self.seed,
            total_bytes,
        })
    }
}
