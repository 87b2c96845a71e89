// Infrastructure layer: logging setup and the gRPC server

pub mod logging;
#[cfg(feature = "server")]
pub mod server;

pub use logging::LoggingConfig;
#[cfg(feature = "server")]
pub use server::{start_server, ServerConfig};
