//! Device fingerprinting.
//!
//! A fingerprint is a SHA-256 digest over a canonical rendering of the
//! captured signals. It is stable while the environment and the signal set
//! stay the same; bumping [`SIGNAL_SET_VERSION`] deliberately re-keys every
//! device.

mod environment;

pub use environment::{Environment, UNKNOWN};

use crate::models::DeviceFingerprint;
use sha2::{Digest, Sha256};
use std::fmt::Write;

pub const SIGNAL_SET_VERSION: &str = "v1";

/// Derives the fingerprint of `environment`. Pure and infallible.
pub fn generate(environment: &Environment) -> DeviceFingerprint {
    let mut hasher = Sha256::new();
    hasher.update(SIGNAL_SET_VERSION.as_bytes());
    hasher.update(b"\n");
    // length-prefixed, values may contain any byte
    for (name, value) in environment.signals() {
        hasher.update((name.len() as u64).to_be_bytes());
        hasher.update(name.as_bytes());
        hasher.update((value.len() as u64).to_be_bytes());
        hasher.update(value.as_bytes());
    }
    let digest = hasher.finalize();
    let mut fingerprint_id = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = write!(fingerprint_id, "{byte:02x}");
    }
    DeviceFingerprint {
        signals: environment.signals().clone(),
        fingerprint_id,
    }
}
