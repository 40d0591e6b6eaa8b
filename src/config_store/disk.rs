use std::{
    fs::{self, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
    sync::Arc,
};

use tracing::{debug, instrument, trace, warn};

use crate::{ConfigError, Result, codec::Codec, config::Config};

use super::{fingerprint::Fingerprint, version};

#[cfg(unix)]
const CONFIG_FILE_MODE: u32 = 0o644;

/// Factory for empty configuration instances.
pub type EmptyConfigFn<C> = Arc<dyn Fn() -> C + Send + Sync>;

/// Authoritative configuration together with its on-disk twin.
///
/// Owned by exactly one task at a time: the builder while starting, then the
/// update loop for the rest of the manager's life.
pub(crate) struct DiskState<C: Config> {
    path: PathBuf,
    codec: Arc<dyn Codec<C>>,
    empty_config: EmptyConfigFn<C>,
    current: Option<C>,
    fingerprint: Option<Fingerprint>,
}

impl<C: Config> DiskState<C> {
    pub(crate) fn new(
        path: PathBuf,
        codec: Arc<dyn Codec<C>>,
        empty_config: EmptyConfigFn<C>,
    ) -> Self {
        Self {
            path,
            codec,
            empty_config,
            current: None,
            fingerprint: None,
        }
    }

    /// The authoritative configuration, if one has been established.
    pub(crate) fn current(&self) -> Option<&C> {
        self.current.as_ref()
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Establishes the first authoritative configuration.
    ///
    /// A file that is missing or unreadable is replaced by a defaulted
    /// config at version 1. A file that loads is re-saved through the normal
    /// save path so that newly introduced defaults get persisted.
    ///
    /// # Errors
    /// Returns `ConfigError::InitialSave` if the resulting config cannot be
    /// written.
    pub(crate) fn initialize(&mut self) -> Result<()> {
        let saved = match self.load() {
            Err(err) => {
                debug!(error = %err, "No usable config on disk, creating a default one");
                let mut fresh = (self.empty_config)();
                fresh.apply_defaults();
                self.save_and_update(fresh)
            }
            Ok(()) => {
                let copied = self.working_copy();
                self.save_and_update(copied)
            }
        };

        saved
            .map(|_| ())
            .map_err(|err| ConfigError::InitialSave(Box::new(err)))
    }

    /// Loads the file, discarding whether anything changed.
    ///
    /// # Errors
    /// See [`DiskState::reload`].
    pub(crate) fn load(&mut self) -> Result<()> {
        self.reload().map(|_| ())
    }

    /// Picks up external edits to the file.
    ///
    /// Returns `true` when the file's content became the new authoritative
    /// configuration.
    ///
    /// # Errors
    /// * `ConfigError::Stat`, `ConfigError::Read`, `ConfigError::Decode` - if
    ///   the file cannot be inspected or parsed
    /// * `ConfigError::VersionMismatch` - if the file carries a different
    ///   version than memory; the file has been overwritten with the
    ///   in-memory config by the time this is returned
    #[instrument(level = "trace", skip(self), fields(path = %self.path.display()))]
    pub(crate) fn reload(&mut self) -> Result<bool> {
        let metadata = fs::metadata(&self.path).map_err(|source| ConfigError::Stat {
            path: self.path.clone(),
            source,
        })?;
        let fingerprint = Fingerprint::from_metadata(&metadata);

        if self.fingerprint == Some(fingerprint) {
            trace!("Config unchanged on disk");
            return Ok(false);
        }

        let bytes = fs::read(&self.path).map_err(|source| ConfigError::Read {
            path: self.path.clone(),
            source,
        })?;
        let loaded = self
            .codec
            .decode(&bytes)
            .map_err(|source| ConfigError::Decode {
                path: self.path.clone(),
                source,
            })?;

        if let Err(err) = version::check_disk_version(self.current.as_ref(), &loaded) {
            warn!(error = %err, "Version mismatch on disk, overwriting with current config");
            if let Some(current) = &self.current {
                match self.write_to_disk(current) {
                    Ok(restored) => self.fingerprint = Some(restored),
                    Err(write_err) => {
                        warn!(error = %write_err, "Unable to restore config on disk");
                    }
                }
            }
            return Err(err);
        }

        self.fingerprint = Some(fingerprint);

        if self.current.as_ref() == Some(&loaded) {
            trace!("Config on disk is same as in memory, ignoring");
            return Ok(false);
        }

        debug!(version = loaded.version(), "Loaded changed config from disk");
        self.current = Some(loaded);

        Ok(true)
    }

    /// Persists `candidate` and makes it authoritative, unless its content
    /// matches the current config.
    ///
    /// Defaults are applied first. Returns `true` when a new version was
    /// written; a no-op save neither writes nor consumes a version number.
    ///
    /// # Errors
    /// * `ConfigError::Encode` - if the candidate cannot be encoded
    /// * `ConfigError::Write`, `ConfigError::Stat` - if the file cannot be
    ///   written; the authoritative config is left unchanged
    #[instrument(level = "trace", skip_all, fields(path = %self.path.display()))]
    pub(crate) fn save_and_update(&mut self, mut candidate: C) -> Result<bool> {
        candidate.apply_defaults();

        if let Some(current) = self.current.as_mut() {
            if version::same_content(current, &mut candidate) {
                trace!("Configuration unchanged, nothing to save");
                return Ok(false);
            }
        }

        candidate.set_version(version::next_version(self.current.as_ref()));

        let fingerprint = self.write_to_disk(&candidate)?;

        debug!(version = candidate.version(), "Saved updated config");
        self.current = Some(candidate);
        self.fingerprint = Some(fingerprint);

        Ok(true)
    }

    /// Independent copy of the authoritative config for a mutation attempt.
    ///
    /// Falls back to a defaulted empty config when nothing is authoritative yet.
    pub(crate) fn working_copy(&self) -> C {
        match &self.current {
            Some(current) => current.clone(),
            None => {
                let mut fresh = (self.empty_config)();
                fresh.apply_defaults();
                fresh
            }
        }
    }

    fn write_to_disk(&self, config: &C) -> Result<Fingerprint> {
        let bytes = self
            .codec
            .encode(config)
            .map_err(|source| ConfigError::Encode { source })?;

        write_file(&self.path, &bytes).map_err(|source| ConfigError::Write {
            path: self.path.clone(),
            source,
        })?;

        let fingerprint = Fingerprint::capture(&self.path).map_err(|source| ConfigError::Stat {
            path: self.path.clone(),
            source,
        })?;
        trace!(bytes = fingerprint.len(), "Wrote config to disk");

        Ok(fingerprint)
    }
}

fn write_file(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(CONFIG_FILE_MODE);
    }

    let mut file = options.open(path)?;
    file.write_all(bytes)?;

    // mode() only applies on creation
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(CONFIG_FILE_MODE))?;
    }

    Ok(())
}
