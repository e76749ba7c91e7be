pub mod connection;
pub mod error;
pub mod ring;
pub mod shmem;

pub use connection::RendererConnection;
pub use error::TransportError;
pub use ring::Ring;
pub use shmem::ShmemCache;
