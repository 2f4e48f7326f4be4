mod build;
mod digest;
mod fetch;
mod name;

pub use build::cmd_build;
pub use digest::cmd_digest;
pub use fetch::cmd_fetch;
pub use name::cmd_name;
