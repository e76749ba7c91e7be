//! Async connection to the renderer process.
//!
//! The first frame each side sends is its capability table; no Vulkan
//! command may be submitted before negotiation settles the extension mask.
//! After that, submissions are fire-and-forget unless the caller awaits a
//! reply, in which case the frame seqno pairs the reply to the submission.

use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::{debug, error, warn};

use venus_protocol::extensions::Capabilities;
use venus_protocol::frame::{self, FrameFlags, HEADER_SIZE};
use venus_protocol::{Decode, Decoder, Encode, Encoder};

use crate::error::TransportError;

type PendingMap = dashmap::DashMap<u32, oneshot::Sender<Result<Vec<u8>, TransportError>>>;

/// An established connection to a venus renderer.
pub struct RendererConnection {
    /// Sender half for outgoing frames
    tx: mpsc::Sender<Vec<u8>>,
    /// Receiver for renderer-initiated frames (consumed by the event loop)
    rx: Arc<Mutex<mpsc::Receiver<Vec<u8>>>>,
    /// Reply seqno counter; 0 is reserved for fire-and-forget frames
    next_seqno: AtomicU32,
    /// Pending replies: seqno -> oneshot sender
    pending: Arc<PendingMap>,
    /// Outcome of the capability handshake
    capabilities: Capabilities,
}

impl RendererConnection {
    /// Connect to the renderer socket and run the capability handshake.
    pub async fn connect(path: impl AsRef<Path>) -> Result<Self, TransportError> {
        let stream = UnixStream::connect(path).await?;
        Self::from_stream(stream).await
    }

    pub async fn from_stream(stream: UnixStream) -> Result<Self, TransportError> {
        let (read_half, write_half) = stream.into_split();
        Self::setup(read_half, write_half).await
    }

    async fn setup<R, W>(read_half: R, write_half: W) -> Result<Self, TransportError>
    where
        R: tokio::io::AsyncRead + Unpin + Send + 'static,
        W: tokio::io::AsyncWrite + Unpin + Send + 'static,
    {
        let pending: Arc<PendingMap> = Arc::new(dashmap::DashMap::new());

        // Channel for outgoing raw frames
        let (out_tx, mut out_rx) = mpsc::channel::<Vec<u8>>(256);
        // Channel for renderer-initiated frames
        let (in_tx, in_rx) = mpsc::channel::<Vec<u8>>(256);

        // Writer task: sends framed bytes to the socket
        let mut write_half = write_half;
        tokio::spawn(async move {
            while let Some(frame) = out_rx.recv().await {
                if let Err(e) = AsyncWriteExt::write_all(&mut write_half, &frame).await {
                    error!("write error: {}", e);
                    break;
                }
            }
        });

        // Reader task: reads frames from the socket and dispatches
        let pending_clone = pending.clone();
        let mut read_half = read_half;
        tokio::spawn(async move {
            let mut header_buf = [0u8; HEADER_SIZE];
            loop {
                match AsyncReadExt::read_exact(&mut read_half, &mut header_buf).await {
                    Ok(_) => {}
                    Err(e) => {
                        debug!("connection closed: {}", e);
                        break;
                    }
                }

                let (flags, seqno, payload_len) = match frame::decode_header(&header_buf) {
                    Ok(v) => v,
                    Err(e) => {
                        error!("invalid frame header: {}", e);
                        break;
                    }
                };

                let mut payload = vec![0u8; payload_len as usize];
                if let Err(e) = AsyncReadExt::read_exact(&mut read_half, &mut payload).await {
                    error!("payload read error: {}", e);
                    break;
                }

                let payload = match frame::decode_payload(&payload, flags) {
                    Ok(p) => p,
                    Err(e) => {
                        error!("payload decode error: {}", e);
                        break;
                    }
                };

                if flags.contains(FrameFlags::REPLY) {
                    match pending_clone.remove(&seqno) {
                        Some((_, sender)) => {
                            let outcome = if flags.contains(FrameFlags::ERROR) {
                                Err(TransportError::RemoteError(seqno))
                            } else {
                                Ok(payload)
                            };
                            let _ = sender.send(outcome);
                        }
                        None => warn!("dropping reply for unknown seqno {}", seqno),
                    }
                    continue;
                }

                if in_tx.send(payload).await.is_err() {
                    debug!("incoming channel closed");
                    break;
                }
            }

            // complete outstanding calls with ConnectionClosed
            pending_clone.clear();
        });

        let mut conn = Self {
            tx: out_tx,
            rx: Arc::new(Mutex::new(in_rx)),
            next_seqno: AtomicU32::new(1),
            pending,
            capabilities: Capabilities::local(),
        };
        conn.handshake().await?;
        Ok(conn)
    }

    async fn handshake(&mut self) -> Result<(), TransportError> {
        let local = Capabilities::local();
        let mut enc = Encoder::new();
        local.encode(&mut enc);

        let reply = self.call(&enc.to_bytes()).await?;
        let mut dec = Decoder::new(&reply);
        let remote = Capabilities::decode(&mut dec);
        dec.check()?;

        self.capabilities = local.negotiate(&remote).ok_or_else(|| {
            TransportError::HandshakeFailed(format!(
                "wire format {} vs {}",
                local.wire_format_version, remote.wire_format_version
            ))
        })?;
        debug!(
            extensions = self.capabilities.extensions.iter().count(),
            "capability handshake complete"
        );
        Ok(())
    }

    /// Negotiated capabilities; valid once `connect` returns.
    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    /// Fire-and-forget submission.
    pub async fn submit(&self, payload: &[u8]) -> Result<(), TransportError> {
        let frame = frame::encode_frame(payload, 0, FrameFlags::empty())?;
        self.tx
            .send(frame)
            .await
            .map_err(|_| TransportError::ConnectionClosed)
    }

    /// Submit and await the paired reply payload.
    pub async fn call(&self, payload: &[u8]) -> Result<Vec<u8>, TransportError> {
        let seqno = self.next_seqno.fetch_add(1, Ordering::Relaxed);

        let (tx, rx) = oneshot::channel();
        self.pending.insert(seqno, tx);

        let frame = frame::encode_frame(payload, seqno, FrameFlags::empty())?;
        if self.tx.send(frame).await.is_err() {
            self.pending.remove(&seqno);
            return Err(TransportError::ConnectionClosed);
        }

        rx.await.map_err(|_| TransportError::ConnectionClosed)?
    }

    /// Next renderer-initiated frame.
    pub async fn recv(&self) -> Result<Vec<u8>, TransportError> {
        self.rx
            .lock()
            .await
            .recv()
            .await
            .ok_or(TransportError::ConnectionClosed)
    }
}
