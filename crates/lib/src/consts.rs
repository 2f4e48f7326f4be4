//! Fixed names shared across the crate.

/// Default configuration file, resolved relative to the working directory.
pub const CONFIG_FILENAME: &str = "stackpack.toml";

/// Prefix for environment variable overrides of the stack configuration.
pub const ENV_PREFIX: &str = "STACKPACK_";

/// Chunk size used when streaming file contents into the digest.
pub const DIGEST_CHUNK_SIZE: usize = 128 * 1024;

/// Build descriptor path, relative to the source directory.
pub const DEFAULT_DOCKERFILE: &str = "Dockerfiles/Dockerfile.titiler";

/// Tag applied to the package build image. Reused across builds for layer caching.
pub const DEFAULT_IMAGE_TAG: &str = "titiler-lambda:latest";

/// Name of the artifact written into the source directory.
pub const ARTIFACT_FILENAME: &str = "package.zip";

/// Where the build image leaves the finished package.
pub const CONTAINER_ARTIFACT_PATH: &str = "/tmp/package.zip";

/// Mount point of the source directory inside the copy container.
pub const CONTAINER_MOUNT_POINT: &str = "/local/";

/// Default container runtime binary.
pub const DEFAULT_DOCKER_BINARY: &str = "docker";

/// Default Google Cloud Storage JSON API endpoint.
pub const DEFAULT_GCS_ENDPOINT: &str = "https://storage.googleapis.com";

/// Prefix of the per-source-directory build lock files in the temp directory.
pub const BUILD_LOCK_PREFIX: &str = "stackpack-build-";
