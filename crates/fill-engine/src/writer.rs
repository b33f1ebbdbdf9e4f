//! The sized file writer
//!
//! Writes a `FillSpec` to disk.  All content is accumulated in a staging file
//! next to the target, which replaces the target in a single rename only once
//! the whole fill has been written.  If the run is cancelled or fails, the
//! staging file is removed and the target is left exactly as it was.
//!
//! ## Authors
//!
//! The fillgen Development Team.
//!
//! ## Licensing and copyright notice
//!
//! See the `LICENSE.md` file in the fillgen root directory for
//! information on licensing and copyright.

use crate::{error::FillError, fill_spec::FillSpec, operation::StopToken, Options};
use log::{debug, info, trace};
use std::{
    cmp,
    fs::{self, File},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};
use tempfile::{Builder, NamedTempFile};

/// Staging files are named `<prefix><random><suffix>` in the target's
/// directory.
pub const STAGING_PREFIX: &str = ".fillgen-";
const STAGING_SUFFIX: &str = ".staging";

/// Mode requested for a brand-new target, before the umask applies.
#[cfg(unix)]
const NEW_FILE_MODE: u32 = 0o666;

/// Number of bytes to generate after `existing` bytes kept in append mode.
///
/// The file grows in whole blocks the size of its existing content until it
/// holds at least `requested` bytes.  A file that already holds `requested`
/// bytes or more is left as it is, and an empty or missing file simply gets
/// `requested` bytes.
pub fn appended_length(existing: u64, requested: u64) -> u64 {
    if existing == 0 {
        return requested;
    }
    if requested <= existing {
        return 0;
    }
    let blocks = (requested - 1) / existing;
    blocks * existing
}

pub struct SizedFileWriter {
    spec: FillSpec,
    max_chunk_size: usize,
}

impl SizedFileWriter {
    pub fn new(spec: FillSpec, options: &Options) -> Self {
        Self {
            spec,
            max_chunk_size: cmp::max(options.max_chunk_size, 1),
        }
    }

    /// Runs the fill, checking `stop` before every chunk and calling
    /// `progress` with the fraction written before each chunk.  Returns the
    /// number of newly generated bytes.
    pub fn run<P>(&self, stop: &StopToken, mut progress: P) -> Result<u64, FillError>
    where
        P: FnMut(f64),
    {
        let target = self.resolve_target()?;
        let (mut staging, existing) = self.create_staging(&target)?;
        let total = if self.spec.append() {
            appended_length(existing, self.spec.total_bytes())
        } else {
            self.spec.total_bytes()
        };

        info!(
            "Filling {:?} with {} bytes of {} content after {} existing bytes.",
            target,
            total,
            self.spec.policy(),
            existing
        );

        {
            let mut out = BufWriter::with_capacity(self.max_chunk_size, staging.as_file_mut());
            let mut generator = self.spec.content_generator();

            if total == 0 {
                progress(0.0);
            }

            let mut written: u64 = 0;
            while written < total {
                if stop.is_raised() {
                    info!(
                        "Fill of {:?} cancelled after {} of {} bytes.",
                        target, written, total
                    );
                    return Err(FillError::Cancelled);
                }

                let length = cmp::min(total - written, self.max_chunk_size as u64) as usize;
                let chunk = generator.next_chunk(written, length);
                out.write_all(&chunk)?;

                progress(written as f64 / total as f64);
                written += length as u64;
                trace!("Wrote chunk of {} bytes, {} of {} done.", length, written, total);
            }

            out.flush()?;
        }

        staging.as_file().sync_all()?;
        debug!("Replacing {:?} with staging file {:?}.", target, staging.path());
        staging
            .persist(&target)
            .map_err(|e| FillError::PersistError(e.error))?;

        info!("Fill of {:?} complete.", target);
        Ok(total)
    }

    /// The path the staging file replaces.  A symbolic link is followed so
    /// that the file it points at is filled and the link itself survives.
    fn resolve_target(&self) -> Result<PathBuf, FillError> {
        let path = self.spec.path();
        match fs::symlink_metadata(path) {
            Ok(metadata) if metadata.file_type().is_symlink() => {
                let resolved = fs::canonicalize(path)?;
                debug!("Following link {:?} to {:?}.", path, resolved);
                Ok(resolved)
            }
            _ => Ok(path.to_path_buf()),
        }
    }

    /// Creates the staging file, seeded with the target's current bytes when
    /// appending, and returns it with the number of bytes copied.  The file is
    /// removed when the returned value is dropped without being persisted.
    fn create_staging(&self, target: &Path) -> Result<(NamedTempFile, u64), FillError> {
        let dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut builder = Builder::new();
        builder.prefix(STAGING_PREFIX).suffix(STAGING_SUFFIX);
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            builder.permissions(fs::Permissions::from_mode(NEW_FILE_MODE));
        }
        let mut staging = builder.tempfile_in(dir)?;
        debug!("Created staging file {:?}.", staging.path());

        let mut existing = 0;
        match fs::metadata(target) {
            Ok(metadata) => {
                if self.spec.append() {
                    let mut current = File::open(target)?;
                    existing = io::copy(&mut current, staging.as_file_mut())?;
                    debug!("Copied {} existing bytes from {:?}.", existing, target);
                }
                // The target keeps its permissions across the swap.
                fs::set_permissions(staging.path(), metadata.permissions())?;
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => (),
            Err(e) => return Err(e.into()),
        }

        Ok((staging, existing))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_appended_length_without_existing_bytes() {
        assert_eq!(appended_length(0, 0), 0);
        assert_eq!(appended_length(0, 6), 6);
    }

    #[test]
    fn test_appended_length_grows_in_existing_blocks() {
        assert_eq!(appended_length(4, 6), 4);
        assert_eq!(appended_length(4, 8), 4);
        assert_eq!(appended_length(4, 9), 8);
        assert_eq!(appended_length(3, 7), 6);
        assert_eq!(appended_length(1, 5), 4);
    }

    #[test]
    fn test_appended_length_leaves_large_files_alone() {
        assert_eq!(appended_length(7, 0), 0);
        assert_eq!(appended_length(7, 7), 0);
        assert_eq!(appended_length(16, 10), 0);
    }
}
