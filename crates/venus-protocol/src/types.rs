//! Primitive wire codecs.
//!
//! Every primitive occupies a multiple of 4 bytes on the wire: scalars
//! narrower than 4 bytes are padded, byte arrays and blobs are padded up
//! to the next 4-byte boundary, and array sizes travel as u64. Values are
//! host-endian, as the guest and renderer are co-located.

use crate::cs::{Decoder, Encoder};
use crate::error::StreamError;

/// Composite types that know their exact wire footprint.
pub trait Encode {
    fn wire_size(&self) -> usize;
    fn encode(&self, enc: &mut Encoder);
}

/// Composite types decodable from a stream. Failures are reported through
/// the decoder's sticky error, not the return value.
pub trait Decode: Sized {
    fn decode(dec: &mut Decoder<'_>) -> Self;
}

/// Partial variant for output structs: only the sType and the pNext chain
/// skeleton cross the wire; field payloads are skipped and filled in by
/// the renderer's reply.
pub trait EncodePartial {
    fn wire_size_partial(&self) -> usize;
    fn encode_partial(&self, enc: &mut Encoder);
}

impl Encoder {
    pub fn encode_u32(&mut self, val: u32) {
        self.write(4, &val.to_ne_bytes());
    }

    pub fn encode_i32(&mut self, val: i32) {
        self.write(4, &val.to_ne_bytes());
    }

    pub fn encode_f32(&mut self, val: f32) {
        self.write(4, &val.to_ne_bytes());
    }

    pub fn encode_u64(&mut self, val: u64) {
        self.write(8, &val.to_ne_bytes());
    }

    pub fn encode_i64(&mut self, val: i64) {
        self.write(8, &val.to_ne_bytes());
    }

    /// A lone byte still occupies a full 4-byte slot.
    pub fn encode_u8(&mut self, val: u8) {
        self.write(4, &[val]);
    }

    pub fn encode_usize(&mut self, val: usize) {
        self.encode_u64(val as u64);
    }

    pub fn encode_bool32(&mut self, val: bool) {
        self.encode_u32(val as u32);
    }

    pub fn encode_u32_array(&mut self, vals: &[u32]) {
        self.write(vals.len() * 4, bytemuck::cast_slice(vals));
    }

    pub fn encode_u64_array(&mut self, vals: &[u64]) {
        self.write(vals.len() * 8, bytemuck::cast_slice(vals));
    }

    pub fn encode_f32_array(&mut self, vals: &[f32]) {
        self.write(vals.len() * 4, bytemuck::cast_slice(vals));
    }

    /// Byte array, padded to the next 4-byte boundary.
    pub fn encode_u8_array(&mut self, vals: &[u8]) {
        self.write((vals.len() + 3) & !3, vals);
    }

    /// Opaque blob, padded to the next 4-byte boundary.
    pub fn encode_blob(&mut self, val: &[u8]) {
        self.write((val.len() + 3) & !3, val);
    }

    pub fn encode_array_size(&mut self, size: u64) {
        self.encode_u64(size);
    }

    /// Pointer presence flag, encoded as an array size of 0 or 1.
    pub fn encode_simple_pointer(&mut self, present: bool) -> bool {
        self.encode_array_size(present as u64);
        present
    }

    /// NUL-terminated string: byte length (including the NUL) then the
    /// padded bytes. The terminator comes from the blob padding.
    pub fn encode_string(&mut self, val: &str) {
        debug_assert!(!val.as_bytes().contains(&0));
        self.encode_array_size(val.len() as u64 + 1);
        self.write((val.len() + 1 + 3) & !3, val.as_bytes());
    }
}

impl Decoder<'_> {
    pub fn decode_u32(&mut self) -> u32 {
        let mut buf = [0u8; 4];
        self.read(4, &mut buf);
        u32::from_ne_bytes(buf)
    }

    pub fn decode_i32(&mut self) -> i32 {
        let mut buf = [0u8; 4];
        self.read(4, &mut buf);
        i32::from_ne_bytes(buf)
    }

    pub fn decode_f32(&mut self) -> f32 {
        let mut buf = [0u8; 4];
        self.read(4, &mut buf);
        f32::from_ne_bytes(buf)
    }

    pub fn decode_u64(&mut self) -> u64 {
        let mut buf = [0u8; 8];
        self.read(8, &mut buf);
        u64::from_ne_bytes(buf)
    }

    pub fn decode_i64(&mut self) -> i64 {
        let mut buf = [0u8; 8];
        self.read(8, &mut buf);
        i64::from_ne_bytes(buf)
    }

    pub fn decode_u8(&mut self) -> u8 {
        let mut buf = [0u8; 1];
        self.read(4, &mut buf);
        buf[0]
    }

    pub fn decode_usize(&mut self) -> usize {
        self.decode_u64() as usize
    }

    pub fn decode_bool32(&mut self) -> bool {
        self.decode_u32() != 0
    }

    pub fn decode_u32_array(&mut self, count: usize) -> Vec<u32> {
        let mut out = vec![0u32; count];
        self.read(count * 4, bytemuck::cast_slice_mut(&mut out));
        out
    }

    pub fn decode_u64_array(&mut self, count: usize) -> Vec<u64> {
        let mut out = vec![0u64; count];
        self.read(count * 8, bytemuck::cast_slice_mut(&mut out));
        out
    }

    pub fn decode_f32_array(&mut self, count: usize) -> Vec<f32> {
        let mut out = vec![0f32; count];
        self.read(count * 4, bytemuck::cast_slice_mut(&mut out));
        out
    }

    pub fn decode_u8_array(&mut self, count: usize) -> Vec<u8> {
        let mut out = vec![0u8; count];
        self.read((count + 3) & !3, &mut out);
        out
    }

    pub fn decode_blob(&mut self, len: usize) -> Vec<u8> {
        self.read_blob(len).to_vec()
    }

    /// Array size, validated against the caller's limit. An oversized
    /// value trips the stream error and decodes as 0 so that dependent
    /// loops fall through.
    pub fn decode_array_size(&mut self, max_size: u64) -> u64 {
        let size = self.decode_u64();
        if size > max_size {
            self.set_error(StreamError::ArraySize {
                got: size,
                max: max_size,
            });
            return 0;
        }
        size
    }

    /// Read the next array size without advancing.
    pub fn peek_array_size(&mut self) -> u64 {
        let mut buf = [0u8; 8];
        self.peek(&mut buf);
        u64::from_ne_bytes(buf)
    }

    pub fn decode_simple_pointer(&mut self) -> bool {
        self.decode_array_size(1) != 0
    }

    pub fn decode_string(&mut self, max_len: u64) -> String {
        let size = self.decode_array_size(max_len) as usize;
        let bytes = self.read_blob(size);
        let trimmed = bytes.strip_suffix(&[0]).unwrap_or(bytes);
        String::from_utf8_lossy(trimmed).into_owned()
    }
}

/// Wire sizes for the primitive building blocks, used by composite
/// `wire_size` implementations.
pub mod sizes {
    pub const fn scalar_4() -> usize {
        4
    }

    pub const fn scalar_8() -> usize {
        8
    }

    pub const fn array_size() -> usize {
        8
    }

    pub const fn simple_pointer() -> usize {
        8
    }

    pub const fn u32_array(count: usize) -> usize {
        count * 4
    }

    pub const fn u64_array(count: usize) -> usize {
        count * 8
    }

    pub const fn blob(len: usize) -> usize {
        (len + 3) & !3
    }

    pub const fn string(val: &str) -> usize {
        array_size() + blob(val.len() + 1)
    }
}

/// sType values, numerically identical to the Vulkan registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum StructureType {
    ApplicationInfo = 0,
    InstanceCreateInfo = 1,
    DeviceQueueCreateInfo = 2,
    DeviceCreateInfo = 3,
    SubmitInfo = 4,
    MemoryAllocateInfo = 5,
    FenceCreateInfo = 8,
    SemaphoreCreateInfo = 9,
    BufferCreateInfo = 12,
    DescriptorSetLayoutCreateInfo = 32,
    PhysicalDeviceVulkan11Features = 49,
    PhysicalDeviceFeatures2 = 1000059000,
    MemoryAllocateFlagsInfo = 1000060000,
    ExternalMemoryBufferCreateInfo = 1000072000,
    ExportMemoryAllocateInfo = 1000072002,
    AttachmentDescription2 = 1000109000,
    AttachmentReference2 = 1000109001,
    SubpassDescription2 = 1000109002,
    SubpassDependency2 = 1000109003,
    RenderPassCreateInfo2 = 1000109004,
    MemoryDedicatedRequirements = 1000127000,
    MemoryDedicatedAllocateInfo = 1000127001,
    BufferMemoryRequirementsInfo2 = 1000146000,
    MemoryRequirements2 = 1000146003,
    DescriptorSetLayoutBindingFlagsCreateInfo = 1000161000,
    PhysicalDeviceDescriptorIndexingFeatures = 1000161001,
    PhysicalDeviceTimelineSemaphoreFeatures = 1000207000,
    SemaphoreTypeCreateInfo = 1000207002,
    TimelineSemaphoreSubmitInfo = 1000207003,
}

impl StructureType {
    pub fn as_raw(&self) -> i32 {
        *self as i32
    }

    pub fn from_raw(raw: i32) -> Option<Self> {
        use StructureType::*;
        Some(match raw {
            0 => ApplicationInfo,
            1 => InstanceCreateInfo,
            2 => DeviceQueueCreateInfo,
            3 => DeviceCreateInfo,
            4 => SubmitInfo,
            5 => MemoryAllocateInfo,
            8 => FenceCreateInfo,
            9 => SemaphoreCreateInfo,
            12 => BufferCreateInfo,
            32 => DescriptorSetLayoutCreateInfo,
            49 => PhysicalDeviceVulkan11Features,
            1000059000 => PhysicalDeviceFeatures2,
            1000060000 => MemoryAllocateFlagsInfo,
            1000072000 => ExternalMemoryBufferCreateInfo,
            1000072002 => ExportMemoryAllocateInfo,
            1000109000 => AttachmentDescription2,
            1000109001 => AttachmentReference2,
            1000109002 => SubpassDescription2,
            1000109003 => SubpassDependency2,
            1000109004 => RenderPassCreateInfo2,
            1000127000 => MemoryDedicatedRequirements,
            1000127001 => MemoryDedicatedAllocateInfo,
            1000146000 => BufferMemoryRequirementsInfo2,
            1000146003 => MemoryRequirements2,
            1000161000 => DescriptorSetLayoutBindingFlagsCreateInfo,
            1000161001 => PhysicalDeviceDescriptorIndexingFeatures,
            1000207000 => PhysicalDeviceTimelineSemaphoreFeatures,
            1000207002 => SemaphoreTypeCreateInfo,
            1000207003 => TimelineSemaphoreSubmitInfo,
            _ => return None,
        })
    }
}

impl Encoder {
    pub fn encode_stype(&mut self, stype: StructureType) {
        self.encode_i32(stype.as_raw());
    }

    /// Null pNext pointer ending a chain.
    pub fn encode_chain_terminator(&mut self) {
        self.encode_simple_pointer(false);
    }
}

impl Decoder<'_> {
    /// Read an sType and verify it matches the struct being decoded.
    pub fn expect_stype(&mut self, expected: StructureType) {
        let raw = self.decode_i32();
        if self.has_error() {
            return;
        }
        if raw != expected.as_raw() {
            self.set_error(StreamError::UnexpectedStructureType(raw));
        }
    }
}

/// Three-dimensional extent, transcribed field-for-field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Extent3D {
    pub width: u32,
    pub height: u32,
    pub depth: u32,
}

impl Encode for Extent3D {
    fn wire_size(&self) -> usize {
        3 * sizes::scalar_4()
    }

    fn encode(&self, enc: &mut Encoder) {
        enc.encode_u32(self.width);
        enc.encode_u32(self.height);
        enc.encode_u32(self.depth);
    }
}

impl Decode for Extent3D {
    fn decode(dec: &mut Decoder<'_>) -> Self {
        Self {
            width: dec.decode_u32(),
            height: dec.decode_u32(),
            depth: dec.decode_u32(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn u8_scalar_occupies_a_full_slot() {
        let mut enc = Encoder::new();
        enc.encode_u8(0x7f);
        enc.encode_u32(1);
        assert_eq!(enc.total_len(), 8);

        let bytes = enc.to_bytes();
        let mut dec = Decoder::new(&bytes);
        assert_eq!(dec.decode_u8(), 0x7f);
        assert_eq!(dec.decode_u32(), 1);
        assert!(dec.check().is_ok());
    }

    #[test]
    fn byte_arrays_pad_to_dword() {
        let mut enc = Encoder::new();
        enc.encode_u8_array(&[1, 2, 3, 4, 5]);
        assert_eq!(enc.total_len(), 8);

        let bytes = enc.to_bytes();
        let mut dec = Decoder::new(&bytes);
        assert_eq!(dec.decode_u8_array(5), vec![1, 2, 3, 4, 5]);
        assert_eq!(dec.remaining(), 0);
    }

    #[test]
    fn array_size_over_limit_decodes_as_zero() {
        let mut enc = Encoder::new();
        enc.encode_array_size(100);

        let bytes = enc.to_bytes();
        let mut dec = Decoder::new(&bytes);
        assert_eq!(dec.decode_array_size(16), 0);
        assert!(matches!(
            dec.check(),
            Err(StreamError::ArraySize { got: 100, max: 16 })
        ));
    }

    #[test]
    fn peek_array_size_leaves_cursor_alone() {
        let mut enc = Encoder::new();
        enc.encode_array_size(3);
        enc.encode_u32_array(&[7, 8, 9]);

        let bytes = enc.to_bytes();
        let mut dec = Decoder::new(&bytes);
        assert_eq!(dec.peek_array_size(), 3);
        let count = dec.decode_array_size(8) as usize;
        assert_eq!(dec.decode_u32_array(count), vec![7, 8, 9]);
    }

    #[test]
    fn strings_carry_their_nul() {
        let mut enc = Encoder::new();
        enc.encode_string("venus");
        // size(8) + "venus\0" padded to 8
        assert_eq!(enc.total_len(), 16);
        assert_eq!(sizes::string("venus"), 16);

        let bytes = enc.to_bytes();
        assert_eq!(&bytes[8..14], b"venus\0");
        let mut dec = Decoder::new(&bytes);
        assert_eq!(dec.decode_string(256), "venus");
    }

    #[test]
    fn simple_pointer_is_a_u64_flag() {
        let mut enc = Encoder::new();
        assert!(enc.encode_simple_pointer(true));
        assert!(!enc.encode_simple_pointer(false));
        assert_eq!(enc.total_len(), 16);

        let bytes = enc.to_bytes();
        let mut dec = Decoder::new(&bytes);
        assert!(dec.decode_simple_pointer());
        assert!(!dec.decode_simple_pointer());
    }

    #[test]
    fn unknown_stype_is_rejected() {
        let mut enc = Encoder::new();
        enc.encode_i32(0x7eadbeef_u32 as i32);
        let bytes = enc.to_bytes();
        let mut dec = Decoder::new(&bytes);
        dec.expect_stype(StructureType::MemoryAllocateInfo);
        assert!(matches!(
            dec.check(),
            Err(StreamError::UnexpectedStructureType(_))
        ));
    }
}
