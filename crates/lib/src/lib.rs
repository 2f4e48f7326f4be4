//! stackpack-lib: deployment packaging for infrastructure stacks.
//!
//! This crate provides the pieces an infrastructure program needs around its
//! deployable artifacts:
//! - `package`: build a zip archive from a source tree inside a container
//! - `util::hash`: Terraform-compatible base64 SHA-256 digests for drift detection
//! - `storage`: download objects from Google Cloud Storage
//! - `config`: the typed stack configuration, resolved once at startup
//! - `naming`: stack-scoped resource names

pub mod config;
pub mod consts;
pub mod naming;
pub mod package;
pub mod storage;
pub mod util;

pub use config::{ConfigError, Settings, StackConfig};
pub use package::{BuildArtifact, PackageBuilder, PackageError};
pub use util::hash::{ContentDigest, DigestError, digest_file};
