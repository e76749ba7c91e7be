#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("frame error: {0}")]
    Frame(#[from] venus_protocol::frame::FrameError),

    #[error("stream error: {0}")]
    Stream(#[from] venus_protocol::StreamError),

    #[error("handshake failed: {0}")]
    HandshakeFailed(String),

    #[error("renderer reported an error for seqno {0}")]
    RemoteError(u32),

    #[error("connection closed")]
    ConnectionClosed,

    #[error("write of {requested} bytes exceeds ring capacity {capacity}")]
    RingOverflow { requested: usize, capacity: usize },
}
