//! End-to-end exercise against an in-process fake renderer.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};

use venus_protocol::commands::{self, CommandType};
use venus_protocol::extensions::{Capabilities, Extension, ExtensionMask};
use venus_protocol::frame::{self, FrameFlags, HEADER_SIZE};
use venus_protocol::handles::{Buffer, Device};
use venus_protocol::buffer::BufferCreateInfo;
use venus_protocol::{Decode, Decoder, Encode, Encoder, VkResult, WIRE_FORMAT_VERSION};
use venus_transport::{RendererConnection, TransportError};

async fn read_frame(stream: &mut UnixStream) -> std::io::Result<(FrameFlags, u32, Vec<u8>)> {
    let mut header = [0u8; HEADER_SIZE];
    stream.read_exact(&mut header).await?;
    let (flags, seqno, len) = frame::decode_header(&header).expect("valid header");
    let mut payload = vec![0u8; len as usize];
    stream.read_exact(&mut payload).await?;
    let payload = frame::decode_payload(&payload, flags).expect("valid payload");
    Ok((flags, seqno, payload))
}

async fn write_reply(stream: &mut UnixStream, seqno: u32, payload: &[u8], error: bool) {
    let mut flags = FrameFlags::REPLY;
    if error {
        flags |= FrameFlags::ERROR;
    }
    let frame = frame::encode_frame(payload, seqno, flags).expect("encodable");
    stream.write_all(&frame).await.expect("write reply");
}

fn renderer_capabilities() -> Capabilities {
    let mut extensions = ExtensionMask::new();
    extensions.insert(Extension::KhrTimelineSemaphore);
    extensions.insert(Extension::KhrGetMemoryRequirements2);
    Capabilities {
        wire_format_version: WIRE_FORMAT_VERSION,
        extensions,
        ..Capabilities::local()
    }
}

/// Answers the handshake, then serves command frames until the peer hangs up.
async fn fake_renderer(mut stream: UnixStream) {
    // handshake: first frame carries the driver's capabilities
    let (_, seqno, payload) = read_frame(&mut stream).await.expect("handshake frame");
    let mut dec = Decoder::new(&payload);
    let _driver_caps = Capabilities::decode(&mut dec);
    dec.check().expect("well-formed capabilities");

    let mut enc = Encoder::new();
    renderer_capabilities().encode(&mut enc);
    write_reply(&mut stream, seqno, &enc.to_bytes(), false).await;

    while let Ok((_, seqno, payload)) = read_frame(&mut stream).await {
        let mut dec = Decoder::new(&payload);
        let Some((ty, _flags)) = commands::decode_header(&mut dec) else {
            write_reply(&mut stream, seqno, &[], true).await;
            continue;
        };
        match ty {
            CommandType::CreateBuffer => {
                let (_device, info, buffer) = commands::decode_create_buffer(&mut dec);
                let result = if dec.check().is_ok() && info.size > 0 {
                    VkResult::Success
                } else {
                    VkResult::ErrorOutOfDeviceMemory
                };
                let mut enc = Encoder::new();
                commands::encode_create_buffer_reply(&mut enc, result, buffer);
                write_reply(&mut stream, seqno, &enc.to_bytes(), false).await;
            }
            CommandType::DestroyBuffer => {
                // no reply for destroys
                let _ = commands::decode_destroy_buffer(&mut dec);
            }
            _ => write_reply(&mut stream, seqno, &[], true).await,
        }
    }
}

async fn start_renderer() -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("renderer.sock");
    let listener = UnixListener::bind(&path).expect("bind");
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(fake_renderer(stream));
        }
    });
    (dir, path)
}

#[tokio::test]
async fn handshake_negotiates_the_extension_intersection() {
    let (_dir, path) = start_renderer().await;
    let conn = RendererConnection::connect(&path).await.expect("connect");

    let caps = conn.capabilities();
    assert_eq!(caps.wire_format_version, WIRE_FORMAT_VERSION);
    assert!(caps.extensions.contains(Extension::KhrTimelineSemaphore));
    // the renderer did not offer this one
    assert!(!caps.extensions.contains(Extension::ExtDescriptorIndexing));
}

#[tokio::test]
async fn create_buffer_reply_is_paired_by_seqno() {
    let (_dir, path) = start_renderer().await;
    let conn = RendererConnection::connect(&path).await.expect("connect");

    let info = BufferCreateInfo {
        size: 4096,
        usage: 0x20,
        ..Default::default()
    };
    let mut enc = Encoder::new();
    commands::encode_create_buffer(&mut enc, Device(1), &info, Buffer(7));

    let reply = conn.call(&enc.to_bytes()).await.expect("reply");
    let mut dec = Decoder::new(&reply);
    let (result, buffer) = commands::decode_create_buffer_reply(&mut dec);
    dec.check().expect("well-formed reply");
    assert!(result.is_ok());
    assert_eq!(buffer, Buffer(7));
}

#[tokio::test]
async fn interleaved_calls_each_get_their_own_reply() {
    let (_dir, path) = start_renderer().await;
    let conn = RendererConnection::connect(&path).await.expect("connect");

    let mut handles = Vec::new();
    for i in 1..=8u64 {
        let info = BufferCreateInfo {
            size: 1024 * i,
            ..Default::default()
        };
        let mut enc = Encoder::new();
        commands::encode_create_buffer(&mut enc, Device(1), &info, Buffer(i));
        handles.push((i, enc.to_bytes()));
    }

    let replies = futures_join_all(&conn, handles).await;
    for (i, reply) in replies {
        let mut dec = Decoder::new(&reply);
        let (result, buffer) = commands::decode_create_buffer_reply(&mut dec);
        dec.check().expect("well-formed reply");
        assert!(result.is_ok());
        assert_eq!(buffer, Buffer(i));
    }
}

async fn futures_join_all(
    conn: &RendererConnection,
    payloads: Vec<(u64, Vec<u8>)>,
) -> Vec<(u64, Vec<u8>)> {
    let mut out = Vec::new();
    for (i, payload) in payloads {
        out.push((i, conn.call(&payload).await.expect("reply")));
    }
    out
}

#[tokio::test]
async fn unsupported_command_surfaces_as_a_remote_error() {
    let (_dir, path) = start_renderer().await;
    let conn = RendererConnection::connect(&path).await.expect("connect");

    let mut enc = Encoder::new();
    commands::encode_queue_submit(&mut enc, venus_protocol::handles::Queue(1), &[], Default::default());

    let err = conn.call(&enc.to_bytes()).await.expect_err("remote error");
    assert!(matches!(err, TransportError::RemoteError(_)));
}

#[tokio::test]
async fn hung_up_renderer_fails_pending_calls() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("renderer.sock");
    let listener = UnixListener::bind(&path).expect("bind");

    // renderer that handshakes and then disconnects
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.expect("accept");
        let (_, seqno, _) = read_frame(&mut stream).await.expect("handshake frame");
        let mut enc = Encoder::new();
        renderer_capabilities().encode(&mut enc);
        write_reply(&mut stream, seqno, &enc.to_bytes(), false).await;
        // read one more frame, then drop the socket without replying
        let _ = read_frame(&mut stream).await;
    });

    let conn = RendererConnection::connect(&path).await.expect("connect");
    let mut enc = Encoder::new();
    commands::encode_create_buffer(
        &mut enc,
        Device(1),
        &BufferCreateInfo::default(),
        Buffer(1),
    );

    let err = conn.call(&enc.to_bytes()).await.expect_err("closed");
    assert!(matches!(err, TransportError::ConnectionClosed));
}
