//! Versioned synchronization of a configuration with its file on disk.
//!
//! A single task owns the authoritative configuration. It polls the file for
//! external edits, applies programmatic updates one at a time, and publishes
//! every accepted change. Conflicting versions on disk are overwritten with
//! the in-memory configuration.

mod builder;
mod disk;
mod fingerprint;
mod publication;
mod remote;
mod store;
mod update_loop;
mod version;

#[cfg(test)]
mod tests;

pub use builder::ManagerBuilder;
pub use disk::EmptyConfigFn;
pub use fingerprint::Fingerprint;
pub use store::ConfigManager;
pub use update_loop::DeltaFn;
