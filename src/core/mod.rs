pub mod channel;
pub mod clock;
pub mod command;
pub mod config;
pub mod engine;
pub mod loader;
pub mod media;
pub mod session;
pub mod status;
pub mod transport;

#[cfg(test)]
pub(crate) mod mock_engine;

pub use channel::*;
pub use clock::*;
pub use command::*;
pub use config::*;
pub use engine::*;
pub use loader::*;
pub use media::*;
pub use session::*;
pub use status::*;
pub use transport::*;
