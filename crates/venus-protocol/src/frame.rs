//! Socket framing for encoded command streams.
//!
//! A frame wraps one encoded command stream (or one reply) with a small
//! header carrying the sequence number used to pair replies with their
//! submissions. Large payloads are LZ4-compressed when it pays off.

use std::borrow::Cow;

/// Wire protocol magic bytes: "VN"
pub const MAGIC: [u8; 2] = [0x56, 0x4e];

/// Maximum frame payload size: 64 MB
pub const MAX_FRAME_SIZE: u32 = 64 * 1024 * 1024;

/// Frame header size in bytes: magic(2) + flags(1) + seqno(4) + length(4) = 11
pub const HEADER_SIZE: usize = 11;

/// Minimum payload size to attempt LZ4 compression (bytes).
/// Payloads smaller than this are sent uncompressed to avoid overhead.
const COMPRESSION_THRESHOLD: usize = 512;

bitflags::bitflags! {
    /// Frame flags byte.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FrameFlags: u8 {
        const COMPRESSED = 0b0000_0001;
        const REPLY      = 0b0000_0010;
        const ERROR      = 0b0000_0100;
    }
}

/// Wrap an encoded payload into a frame, compressing when worthwhile.
pub fn encode_frame(payload: &[u8], seqno: u32, flags: FrameFlags) -> Result<Vec<u8>, FrameError> {
    if payload.len() > MAX_FRAME_SIZE as usize {
        return Err(FrameError::FrameTooLarge(payload.len() as u32));
    }

    let (final_payload, compression_flag) = if payload.len() > COMPRESSION_THRESHOLD {
        let compressed = lz4_flex::compress_prepend_size(payload);
        if compressed.len() < payload.len() {
            (Cow::Owned(compressed), FrameFlags::COMPRESSED)
        } else {
            // Compression didn't help, send uncompressed
            (Cow::Borrowed(payload), FrameFlags::empty())
        }
    } else {
        (Cow::Borrowed(payload), FrameFlags::empty())
    };

    let flags = flags | compression_flag;
    let payload_len = final_payload.len() as u32;

    let mut frame = Vec::with_capacity(HEADER_SIZE + final_payload.len());
    frame.extend_from_slice(&MAGIC);
    frame.push(flags.bits());
    frame.extend_from_slice(&seqno.to_le_bytes());
    frame.extend_from_slice(&payload_len.to_le_bytes());
    frame.extend_from_slice(&final_payload);

    Ok(frame)
}

/// Decode a frame header. Returns (flags, seqno, payload_length).
pub fn decode_header(header: &[u8; HEADER_SIZE]) -> Result<(FrameFlags, u32, u32), FrameError> {
    if header[0] != MAGIC[0] || header[1] != MAGIC[1] {
        return Err(FrameError::InvalidMagic);
    }

    let flags = FrameFlags::from_bits_truncate(header[2]);
    let seqno = u32::from_le_bytes([header[3], header[4], header[5], header[6]]);
    let length = u32::from_le_bytes([header[7], header[8], header[9], header[10]]);

    if length > MAX_FRAME_SIZE {
        return Err(FrameError::FrameTooLarge(length));
    }

    Ok((flags, seqno, length))
}

/// Recover the payload bytes, decompressing if the COMPRESSED flag is set.
pub fn decode_payload(payload: &[u8], flags: FrameFlags) -> Result<Vec<u8>, FrameError> {
    if flags.contains(FrameFlags::COMPRESSED) {
        lz4_flex::decompress_size_prepended(payload)
            .map_err(|e| FrameError::Decompression(e.to_string()))
    } else {
        Ok(payload.to_vec())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("invalid magic bytes")]
    InvalidMagic,
    #[error("frame too large: {0} bytes")]
    FrameTooLarge(u32),
    #[error("decompression error: {0}")]
    Decompression(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(frame: &[u8]) -> ([u8; HEADER_SIZE], &[u8]) {
        let header: [u8; HEADER_SIZE] = frame[..HEADER_SIZE].try_into().unwrap();
        (header, &frame[HEADER_SIZE..])
    }

    #[test]
    fn small_payload_stays_uncompressed() {
        let payload = vec![0xab; 64];
        let frame = encode_frame(&payload, 7, FrameFlags::empty()).unwrap();
        let (header, body) = split(&frame);

        let (flags, seqno, length) = decode_header(&header).unwrap();
        assert!(!flags.contains(FrameFlags::COMPRESSED));
        assert_eq!(seqno, 7);
        assert_eq!(length as usize, body.len());
        assert_eq!(decode_payload(body, flags).unwrap(), payload);
    }

    #[test]
    fn compressible_payload_round_trips() {
        // long zero run compresses well past the threshold
        let payload = vec![0u8; 4096];
        let frame = encode_frame(&payload, 1, FrameFlags::REPLY).unwrap();
        let (header, body) = split(&frame);

        let (flags, seqno, _) = decode_header(&header).unwrap();
        assert!(flags.contains(FrameFlags::COMPRESSED));
        assert!(flags.contains(FrameFlags::REPLY));
        assert_eq!(seqno, 1);
        assert!(body.len() < payload.len());
        assert_eq!(decode_payload(body, flags).unwrap(), payload);
    }

    #[test]
    fn incompressible_payload_falls_back() {
        let payload: Vec<u8> = (0..4096u32)
            .map(|i| (i.wrapping_mul(2654435761) >> 24) as u8)
            .collect();
        let frame = encode_frame(&payload, 2, FrameFlags::empty()).unwrap();
        let (header, body) = split(&frame);

        let (flags, _, _) = decode_header(&header).unwrap();
        assert_eq!(decode_payload(body, flags).unwrap(), payload);
    }

    #[test]
    fn bad_magic_is_rejected() {
        let mut header = [0u8; HEADER_SIZE];
        header[0] = b'X';
        header[1] = b'Y';
        assert!(matches!(
            decode_header(&header),
            Err(FrameError::InvalidMagic)
        ));
    }

    #[test]
    fn oversized_length_is_rejected() {
        let frame = encode_frame(&[1, 2, 3], 0, FrameFlags::empty()).unwrap();
        let mut header: [u8; HEADER_SIZE] = frame[..HEADER_SIZE].try_into().unwrap();
        header[7..11].copy_from_slice(&(MAX_FRAME_SIZE + 1).to_le_bytes());
        assert!(matches!(
            decode_header(&header),
            Err(FrameError::FrameTooLarge(_))
        ));
    }
}
