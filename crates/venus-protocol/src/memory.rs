//! Memory allocation and requirement structs.

use crate::chain::{self, pnext_chain};
use crate::cs::{Decoder, Encoder};
use crate::handles::{Buffer, Image};
use crate::types::{sizes, Decode, Encode, EncodePartial, StructureType};

/// VkMemoryDedicatedAllocateInfo. At most one of `image`/`buffer` is
/// non-null.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MemoryDedicatedAllocateInfo {
    pub image: Image,
    pub buffer: Buffer,
}

impl Encode for MemoryDedicatedAllocateInfo {
    fn wire_size(&self) -> usize {
        self.image.wire_size() + self.buffer.wire_size()
    }

    fn encode(&self, enc: &mut Encoder) {
        self.image.encode(enc);
        self.buffer.encode(enc);
    }
}

impl Decode for MemoryDedicatedAllocateInfo {
    fn decode(dec: &mut Decoder<'_>) -> Self {
        Self {
            image: Image::decode(dec),
            buffer: Buffer::decode(dec),
        }
    }
}

/// VkExportMemoryAllocateInfo.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ExportMemoryAllocateInfo {
    pub handle_types: u32,
}

impl Encode for ExportMemoryAllocateInfo {
    fn wire_size(&self) -> usize {
        sizes::scalar_4()
    }

    fn encode(&self, enc: &mut Encoder) {
        enc.encode_u32(self.handle_types);
    }
}

impl Decode for ExportMemoryAllocateInfo {
    fn decode(dec: &mut Decoder<'_>) -> Self {
        Self {
            handle_types: dec.decode_u32(),
        }
    }
}

/// VkMemoryAllocateFlagsInfo.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MemoryAllocateFlagsInfo {
    pub flags: u32,
    pub device_mask: u32,
}

impl Encode for MemoryAllocateFlagsInfo {
    fn wire_size(&self) -> usize {
        2 * sizes::scalar_4()
    }

    fn encode(&self, enc: &mut Encoder) {
        enc.encode_u32(self.flags);
        enc.encode_u32(self.device_mask);
    }
}

impl Decode for MemoryAllocateFlagsInfo {
    fn decode(dec: &mut Decoder<'_>) -> Self {
        Self {
            flags: dec.decode_u32(),
            device_mask: dec.decode_u32(),
        }
    }
}

pnext_chain! {
    pub enum MemoryAllocateInfoExt {
        MemoryDedicatedAllocateInfo => Dedicated(MemoryDedicatedAllocateInfo),
        ExportMemoryAllocateInfo => Export(ExportMemoryAllocateInfo),
        MemoryAllocateFlagsInfo => Flags(MemoryAllocateFlagsInfo),
    }
}

/// VkMemoryAllocateInfo.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryAllocateInfo {
    pub allocation_size: u64,
    pub memory_type_index: u32,
    pub chain: Vec<MemoryAllocateInfoExt>,
}

impl Encode for MemoryAllocateInfo {
    fn wire_size(&self) -> usize {
        sizes::scalar_4()
            + chain::wire_size(&self.chain)
            + sizes::scalar_8()
            + sizes::scalar_4()
    }

    fn encode(&self, enc: &mut Encoder) {
        enc.encode_stype(StructureType::MemoryAllocateInfo);
        chain::encode(enc, &self.chain);
        enc.encode_u64(self.allocation_size);
        enc.encode_u32(self.memory_type_index);
    }
}

impl Decode for MemoryAllocateInfo {
    fn decode(dec: &mut Decoder<'_>) -> Self {
        dec.expect_stype(StructureType::MemoryAllocateInfo);
        let chain = chain::decode(dec);
        Self {
            allocation_size: dec.decode_u64(),
            memory_type_index: dec.decode_u32(),
            chain,
        }
    }
}

/// VkMemoryRequirements.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MemoryRequirements {
    pub size: u64,
    pub alignment: u64,
    pub memory_type_bits: u32,
}

impl Encode for MemoryRequirements {
    fn wire_size(&self) -> usize {
        2 * sizes::scalar_8() + sizes::scalar_4()
    }

    fn encode(&self, enc: &mut Encoder) {
        enc.encode_u64(self.size);
        enc.encode_u64(self.alignment);
        enc.encode_u32(self.memory_type_bits);
    }
}

impl Decode for MemoryRequirements {
    fn decode(dec: &mut Decoder<'_>) -> Self {
        Self {
            size: dec.decode_u64(),
            alignment: dec.decode_u64(),
            memory_type_bits: dec.decode_u32(),
        }
    }
}

/// VkMemoryDedicatedRequirements (output struct).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MemoryDedicatedRequirements {
    pub prefers_dedicated_allocation: bool,
    pub requires_dedicated_allocation: bool,
}

impl Encode for MemoryDedicatedRequirements {
    fn wire_size(&self) -> usize {
        2 * sizes::scalar_4()
    }

    fn encode(&self, enc: &mut Encoder) {
        enc.encode_bool32(self.prefers_dedicated_allocation);
        enc.encode_bool32(self.requires_dedicated_allocation);
    }
}

impl Decode for MemoryDedicatedRequirements {
    fn decode(dec: &mut Decoder<'_>) -> Self {
        Self {
            prefers_dedicated_allocation: dec.decode_bool32(),
            requires_dedicated_allocation: dec.decode_bool32(),
        }
    }
}

pnext_chain! {
    pub enum MemoryRequirements2Ext {
        MemoryDedicatedRequirements => Dedicated(MemoryDedicatedRequirements),
    }
}

/// VkMemoryRequirements2: requested partially, returned fully.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryRequirements2 {
    pub memory_requirements: MemoryRequirements,
    pub chain: Vec<MemoryRequirements2Ext>,
}

impl MemoryRequirements2 {
    pub fn query(dedicated: bool) -> Self {
        let chain = if dedicated {
            vec![MemoryRequirements2Ext::Dedicated(Default::default())]
        } else {
            Vec::new()
        };
        Self {
            memory_requirements: Default::default(),
            chain,
        }
    }

    pub fn decode_query(dec: &mut Decoder<'_>) -> Vec<StructureType> {
        dec.expect_stype(StructureType::MemoryRequirements2);
        chain::decode_partial::<MemoryRequirements2Ext>(dec)
    }
}

impl Encode for MemoryRequirements2 {
    fn wire_size(&self) -> usize {
        sizes::scalar_4() + chain::wire_size(&self.chain) + self.memory_requirements.wire_size()
    }

    fn encode(&self, enc: &mut Encoder) {
        enc.encode_stype(StructureType::MemoryRequirements2);
        chain::encode(enc, &self.chain);
        self.memory_requirements.encode(enc);
    }
}

impl EncodePartial for MemoryRequirements2 {
    fn wire_size_partial(&self) -> usize {
        sizes::scalar_4() + chain::wire_size_partial(&self.chain)
    }

    fn encode_partial(&self, enc: &mut Encoder) {
        enc.encode_stype(StructureType::MemoryRequirements2);
        chain::encode_partial(enc, &self.chain);
    }
}

impl Decode for MemoryRequirements2 {
    fn decode(dec: &mut Decoder<'_>) -> Self {
        dec.expect_stype(StructureType::MemoryRequirements2);
        let chain = chain::decode(dec);
        let memory_requirements = MemoryRequirements::decode(dec);
        Self {
            memory_requirements,
            chain,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_info_chain_preserves_order_and_values() {
        let info = MemoryAllocateInfo {
            allocation_size: 1 << 20,
            memory_type_index: 3,
            chain: vec![
                MemoryAllocateInfoExt::Dedicated(MemoryDedicatedAllocateInfo {
                    image: Image::NULL,
                    buffer: Buffer(42),
                }),
                MemoryAllocateInfoExt::Flags(MemoryAllocateFlagsInfo {
                    flags: 0x2,
                    device_mask: 0x1,
                }),
            ],
        };

        let mut enc = Encoder::new();
        info.encode(&mut enc);
        assert_eq!(enc.total_len(), info.wire_size());

        let bytes = enc.to_bytes();
        let mut dec = Decoder::new(&bytes);
        let back = MemoryAllocateInfo::decode(&mut dec);
        assert!(dec.check().is_ok());
        assert_eq!(back, info);
    }

    #[test]
    fn requirements2_query_round_trips_as_reply() {
        // driver encodes the request skeleton
        let query = MemoryRequirements2::query(true);
        let mut req = Encoder::new();
        query.encode_partial(&mut req);

        // renderer reads which structs to fill
        let req_bytes = req.to_bytes();
        let mut req_dec = Decoder::new(&req_bytes);
        let wanted = MemoryRequirements2::decode_query(&mut req_dec);
        assert_eq!(wanted, vec![StructureType::MemoryDedicatedRequirements]);

        // renderer replies with the filled struct
        let reply = MemoryRequirements2 {
            memory_requirements: MemoryRequirements {
                size: 4096,
                alignment: 256,
                memory_type_bits: 0b101,
            },
            chain: vec![MemoryRequirements2Ext::Dedicated(
                MemoryDedicatedRequirements {
                    prefers_dedicated_allocation: true,
                    requires_dedicated_allocation: false,
                },
            )],
        };
        let mut enc = Encoder::new();
        reply.encode(&mut enc);

        let bytes = enc.to_bytes();
        let mut dec = Decoder::new(&bytes);
        let back = MemoryRequirements2::decode(&mut dec);
        assert!(dec.check().is_ok());
        assert_eq!(back.memory_requirements.size, 4096);
        assert_eq!(back.chain, reply.chain);
    }
}
