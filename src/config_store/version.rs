use crate::{ConfigError, Result, config::Config};

/// Checks a configuration freshly decoded from disk against the one held in
/// memory.
///
/// This process is the only writer of its file, so a differing version on
/// disk is treated as stale or tampered content, never as a newer revision.
///
/// # Errors
/// Returns `ConfigError::VersionMismatch` when both exist and their versions
/// differ.
pub fn check_disk_version<C: Config>(current: Option<&C>, on_disk: &C) -> Result<()> {
    match current {
        Some(current) if current.version() != on_disk.version() => {
            Err(ConfigError::VersionMismatch {
                expected: current.version(),
                found: on_disk.version(),
            })
        }
        _ => Ok(()),
    }
}

/// Compares two configurations while ignoring their versions.
///
/// Both versions are zeroed for the comparison and restored afterwards.
pub fn same_content<C: Config>(current: &mut C, candidate: &mut C) -> bool {
    let current_version = current.version();
    let candidate_version = candidate.version();

    current.set_version(0);
    candidate.set_version(0);
    let same = current == candidate;

    current.set_version(current_version);
    candidate.set_version(candidate_version);

    same
}

/// Version the next committed configuration receives.
pub fn next_version<C: Config>(current: Option<&C>) -> u64 {
    current.map_or(0, C::version) + 1
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
    struct Versioned {
        version: u64,
        value: String,
    }

    impl Config for Versioned {
        fn version(&self) -> u64 {
            self.version
        }

        fn set_version(&mut self, version: u64) {
            self.version = version;
        }

        fn apply_defaults(&mut self) {}
    }

    fn versioned(version: u64, value: &str) -> Versioned {
        Versioned {
            version,
            value: value.to_string(),
        }
    }

    #[test]
    fn first_load_is_always_accepted() {
        assert!(check_disk_version(None, &versioned(9, "a")).is_ok());
    }

    #[test]
    fn matching_version_is_accepted() {
        let current = versioned(3, "a");

        assert!(check_disk_version(Some(&current), &versioned(3, "b")).is_ok());
    }

    #[test]
    fn differing_version_is_rejected() {
        let current = versioned(3, "a");

        let err = check_disk_version(Some(&current), &versioned(5, "a")).unwrap_err();

        assert!(matches!(
            err,
            ConfigError::VersionMismatch {
                expected: 3,
                found: 5
            }
        ));
    }

    #[test]
    fn content_comparison_ignores_version_and_restores_it() {
        let mut current = versioned(4, "same");
        let mut candidate = versioned(0, "same");

        assert!(same_content(&mut current, &mut candidate));
        assert_eq!(current.version, 4);
        assert_eq!(candidate.version, 0);
    }

    #[test]
    fn content_comparison_detects_differences() {
        let mut current = versioned(4, "old");
        let mut candidate = versioned(4, "new");

        assert!(!same_content(&mut current, &mut candidate));
    }

    #[test]
    fn next_version_starts_at_one() {
        assert_eq!(next_version::<Versioned>(None), 1);
        assert_eq!(next_version(Some(&versioned(6, "a"))), 7);
    }
}
