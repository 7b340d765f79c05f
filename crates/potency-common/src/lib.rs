//! Potency Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared utilities for the potency workspace members.
//!
//! - **Logging**: `tracing` subscriber setup driven by environment or builder
//! - **Checksums**: SHA-256 digests used to fingerprint model artifacts
//!
//! # Example
//!
//! ```
//! use potency_common::checksum::sha256_bytes;
//!
//! let digest = sha256_bytes(b"hello world");
//! assert!(digest.starts_with("b94d27b9"));
//! ```

pub mod checksum;
pub mod logging;
