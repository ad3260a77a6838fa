pub mod archive;
pub mod cleanup;
pub mod config;
pub mod download;
pub mod error;
pub mod http;
pub mod install;
pub mod pipeline;
pub mod platform;
pub mod release;
pub mod runtime;
pub mod verify;
pub mod workdir;

pub use error::InstallError;
