//! Deployment package construction.
//!
//! A package is a zip archive built inside a container image and copied out
//! to `{source_dir}/package.zip`:
//! - `builder`: `PackageBuilder`, the build workflow
//! - `runtime`: the `ContainerRuntime` seam and its docker CLI implementation
//! - `archive`: post-build archive verification
//! - `lock`: per-directory mutual exclusion

pub mod archive;
pub mod builder;
pub mod lock;
pub mod runtime;
pub mod types;

pub use builder::PackageBuilder;
pub use lock::{BuildLock, BuildLockError};
pub use runtime::{ContainerRuntime, DockerCli};
pub use types::{BuildArtifact, PackageError};
