//! Buffer creation structs.

use crate::chain::{self, pnext_chain};
use crate::cs::{Decoder, Encoder};
use crate::types::{sizes, Decode, Encode, StructureType};

pub const SHARING_MODE_EXCLUSIVE: i32 = 0;
pub const SHARING_MODE_CONCURRENT: i32 = 1;

/// VkExternalMemoryBufferCreateInfo.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ExternalMemoryBufferCreateInfo {
    pub handle_types: u32,
}

impl Encode for ExternalMemoryBufferCreateInfo {
    fn wire_size(&self) -> usize {
        sizes::scalar_4()
    }

    fn encode(&self, enc: &mut Encoder) {
        enc.encode_u32(self.handle_types);
    }
}

impl Decode for ExternalMemoryBufferCreateInfo {
    fn decode(dec: &mut Decoder<'_>) -> Self {
        Self {
            handle_types: dec.decode_u32(),
        }
    }
}

pnext_chain! {
    pub enum BufferCreateInfoExt {
        ExternalMemoryBufferCreateInfo => ExternalMemory(ExternalMemoryBufferCreateInfo),
    }
}

/// VkBufferCreateInfo. The queue family array is only meaningful for
/// concurrent sharing, matching the Vulkan rules.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BufferCreateInfo {
    pub flags: u32,
    pub size: u64,
    pub usage: u32,
    pub sharing_mode: i32,
    pub queue_family_indices: Vec<u32>,
    pub chain: Vec<BufferCreateInfoExt>,
}

impl Encode for BufferCreateInfo {
    fn wire_size(&self) -> usize {
        sizes::scalar_4()
            + chain::wire_size(&self.chain)
            + sizes::scalar_4()                 // flags
            + sizes::scalar_8()                 // size
            + sizes::scalar_4()                 // usage
            + sizes::scalar_4()                 // sharing_mode
            + sizes::scalar_4()                 // queue_family_index_count
            + sizes::array_size()
            + sizes::u32_array(self.queue_family_indices.len())
    }

    fn encode(&self, enc: &mut Encoder) {
        enc.encode_stype(StructureType::BufferCreateInfo);
        chain::encode(enc, &self.chain);
        enc.encode_u32(self.flags);
        enc.encode_u64(self.size);
        enc.encode_u32(self.usage);
        enc.encode_i32(self.sharing_mode);
        enc.encode_u32(self.queue_family_indices.len() as u32);
        // a null array encodes as size 0
        enc.encode_array_size(self.queue_family_indices.len() as u64);
        enc.encode_u32_array(&self.queue_family_indices);
    }
}

impl Decode for BufferCreateInfo {
    fn decode(dec: &mut Decoder<'_>) -> Self {
        dec.expect_stype(StructureType::BufferCreateInfo);
        let chain = chain::decode(dec);
        let flags = dec.decode_u32();
        let size = dec.decode_u64();
        let usage = dec.decode_u32();
        let sharing_mode = dec.decode_i32();
        let queue_family_index_count = dec.decode_u32();
        // the count field bounds the array
        let len = dec.decode_array_size(queue_family_index_count as u64) as usize;
        let queue_family_indices = dec.decode_u32_array(len);
        Self {
            flags,
            size,
            usage,
            sharing_mode,
            queue_family_indices,
            chain,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exclusive_buffer_skips_the_queue_family_array() {
        let info = BufferCreateInfo {
            size: 4096,
            usage: 0x20,
            sharing_mode: SHARING_MODE_EXCLUSIVE,
            ..Default::default()
        };

        let mut enc = Encoder::new();
        info.encode(&mut enc);
        assert_eq!(enc.total_len(), info.wire_size());

        let bytes = enc.to_bytes();
        let mut dec = Decoder::new(&bytes);
        let back = BufferCreateInfo::decode(&mut dec);
        assert!(dec.check().is_ok());
        assert_eq!(back, info);
    }

    #[test]
    fn concurrent_buffer_carries_queue_families_and_chain() {
        let info = BufferCreateInfo {
            size: 1 << 16,
            usage: 0x3,
            sharing_mode: SHARING_MODE_CONCURRENT,
            queue_family_indices: vec![0, 2],
            chain: vec![BufferCreateInfoExt::ExternalMemory(
                ExternalMemoryBufferCreateInfo { handle_types: 0x8 },
            )],
            ..Default::default()
        };

        let mut enc = Encoder::new();
        info.encode(&mut enc);
        assert_eq!(enc.total_len(), info.wire_size());

        let bytes = enc.to_bytes();
        let mut dec = Decoder::new(&bytes);
        let back = BufferCreateInfo::decode(&mut dec);
        assert!(dec.check().is_ok());
        assert_eq!(back, info);
    }

    #[test]
    fn array_larger_than_count_field_is_rejected() {
        let mut enc = Encoder::new();
        enc.encode_stype(StructureType::BufferCreateInfo);
        enc.encode_chain_terminator();
        enc.encode_u32(0); // flags
        enc.encode_u64(16); // size
        enc.encode_u32(0); // usage
        enc.encode_i32(SHARING_MODE_CONCURRENT);
        enc.encode_u32(2); // count claims 2
        enc.encode_array_size(3); // array claims 3
        enc.encode_u32_array(&[0, 1, 2]);

        let bytes = enc.to_bytes();
        let mut dec = Decoder::new(&bytes);
        let _ = BufferCreateInfo::decode(&mut dec);
        assert!(dec.check().is_err());
    }
}
