use std::{fs, io, path::Path, time::SystemTime};

/// Cheap snapshot of a file's metadata.
///
/// Two fingerprints of the same file are equal when neither its size nor its
/// modification time moved, which lets a poll tick skip reading the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fingerprint {
    len: u64,
    modified: Option<SystemTime>,
}

impl Fingerprint {
    /// Stats `path` and records its size and modification time.
    ///
    /// # Errors
    /// Returns the I/O error if the file cannot be stat'ed.
    pub fn capture(path: &Path) -> io::Result<Self> {
        let metadata = fs::metadata(path)?;

        Ok(Self::from_metadata(&metadata))
    }

    /// Builds a fingerprint from metadata that was already fetched.
    pub fn from_metadata(metadata: &fs::Metadata) -> Self {
        Self {
            len: metadata.len(),
            // Some platforms cannot report mtime; size alone still catches most edits.
            modified: metadata.modified().ok(),
        }
    }

    /// Whether the file at `path` differs from this snapshot.
    ///
    /// A file that can no longer be stat'ed is reported as unchanged; the
    /// next full load will surface the error.
    pub fn has_changed(&self, path: &Path) -> bool {
        match Self::capture(path) {
            Ok(current) => current != *self,
            Err(_) => false,
        }
    }

    /// Size of the file in bytes when the snapshot was taken.
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Whether the file was empty when the snapshot was taken.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
mod tests {
    use std::{thread, time::Duration};

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn unchanged_file_keeps_fingerprint() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "version = 1\n").unwrap();

        let fingerprint = Fingerprint::capture(&path).unwrap();

        assert!(!fingerprint.has_changed(&path));
        assert_eq!(fingerprint, Fingerprint::capture(&path).unwrap());
        assert_eq!(fingerprint.len(), 12);
    }

    #[test]
    fn size_change_is_detected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "version = 1\n").unwrap();
        let fingerprint = Fingerprint::capture(&path).unwrap();

        fs::write(&path, "version = 1\nname = \"x\"\n").unwrap();

        assert!(fingerprint.has_changed(&path));
    }

    #[test]
    fn same_size_rewrite_is_detected_by_mtime() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "version = 1\n").unwrap();
        let fingerprint = Fingerprint::capture(&path).unwrap();

        thread::sleep(Duration::from_millis(20));
        fs::write(&path, "version = 2\n").unwrap();

        assert!(fingerprint.has_changed(&path));
    }

    #[test]
    fn missing_file_reports_unchanged() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "").unwrap();
        let fingerprint = Fingerprint::capture(&path).unwrap();
        assert!(fingerprint.is_empty());

        fs::remove_file(&path).unwrap();

        assert!(!fingerprint.has_changed(&path));
        assert!(Fingerprint::capture(&path).is_err());
    }
}
