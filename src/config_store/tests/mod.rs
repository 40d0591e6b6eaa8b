//! Unit tests for config_store internals.

#![allow(clippy::panic)]


use std::{fs, path::Path, sync::Arc, thread, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{
    codec::{Codec, TomlCodec},
    config::Config,
};

use super::disk::DiskState;

pub(super) const FIXED_I: i64 = 55;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub(super) struct TestConfig {
    pub version: u64,
    pub n: Option<Nested>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub(super) struct Nested {
    pub s: String,
    pub i: i64,
}

impl Config for TestConfig {
    fn version(&self) -> u64 {
        self.version
    }

    fn set_version(&mut self, version: u64) {
        self.version = version;
    }

    fn apply_defaults(&mut self) {
        let nested = self.n.get_or_insert_with(Nested::default);
        if nested.i == 0 {
            nested.i = FIXED_I;
        }
    }
}

pub(super) fn test_config(version: u64, s: &str, i: i64) -> TestConfig {
    TestConfig {
        version,
        n: Some(Nested {
            s: s.to_string(),
            i,
        }),
    }
}

pub(super) fn disk_state(path: &Path) -> DiskState<TestConfig> {
    DiskState::new(
        path.to_path_buf(),
        Arc::new(TomlCodec),
        Arc::new(TestConfig::default),
    )
}

pub(super) fn encoded(config: &TestConfig) -> Vec<u8> {
    TomlCodec.encode(config).unwrap()
}

pub(super) fn read_config(path: &Path) -> TestConfig {
    TomlCodec.decode(&fs::read(path).unwrap()).unwrap()
}

/// Writes the file the way another process would.
///
/// File timestamps are only as fine as the kernel clock tick, so wait a
/// little to make sure a same-sized rewrite still moves the mtime.
pub(super) fn write_externally(path: &Path, config: &TestConfig) {
    thread::sleep(Duration::from_millis(20));
    fs::write(path, encoded(config)).unwrap();
}

#[test]
fn apply_defaults_is_idempotent() {
    let mut once = TestConfig::default();
    once.apply_defaults();

    let mut twice = once.clone();
    twice.apply_defaults();

    assert_eq!(once, twice);
    assert_eq!(once, test_config(0, "", FIXED_I));
}

#[test]
fn apply_defaults_keeps_set_fields() {
    let mut config = test_config(2, "kept", 3);
    config.apply_defaults();

    assert_eq!(config, test_config(2, "kept", 3));
}

#[test]
fn test_config_round_trips_through_toml() {
    let config = test_config(9, "value", 12);

    let decoded: TestConfig = TomlCodec.decode(&encoded(&config)).unwrap();

    assert_eq!(decoded, config);
}
