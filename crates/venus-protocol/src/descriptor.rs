//! Descriptor set layout structs.

use crate::chain::{self, pnext_chain};
use crate::cs::{Decoder, Encoder};
use crate::handles::Sampler;
use crate::types::{sizes, Decode, Encode, StructureType};

/// Binding arrays beyond this are stream corruption.
const MAX_LAYOUT_BINDINGS: u64 = 4096;

/// VkDescriptorSetLayoutBinding. The immutable-sampler array is optional
/// and, when present, holds `descriptor_count` handles.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DescriptorSetLayoutBinding {
    pub binding: u32,
    pub descriptor_type: i32,
    pub descriptor_count: u32,
    pub stage_flags: u32,
    pub immutable_samplers: Option<Vec<Sampler>>,
}

impl Encode for DescriptorSetLayoutBinding {
    fn wire_size(&self) -> usize {
        4 * sizes::scalar_4()
            + sizes::array_size()
            + self
                .immutable_samplers
                .as_ref()
                .map_or(0, |samplers| samplers.len() * sizes::scalar_8())
    }

    fn encode(&self, enc: &mut Encoder) {
        enc.encode_u32(self.binding);
        enc.encode_i32(self.descriptor_type);
        enc.encode_u32(self.descriptor_count);
        enc.encode_u32(self.stage_flags);
        match &self.immutable_samplers {
            None => {
                enc.encode_array_size(0);
            }
            Some(samplers) => {
                debug_assert_eq!(samplers.len(), self.descriptor_count as usize);
                enc.encode_array_size(samplers.len() as u64);
                for sampler in samplers {
                    sampler.encode(enc);
                }
            }
        }
    }
}

impl Decode for DescriptorSetLayoutBinding {
    fn decode(dec: &mut Decoder<'_>) -> Self {
        let binding = dec.decode_u32();
        let descriptor_type = dec.decode_i32();
        let descriptor_count = dec.decode_u32();
        let stage_flags = dec.decode_u32();
        // a null array and an empty one both travel as size 0
        let len = dec.decode_array_size(descriptor_count as u64) as usize;
        let immutable_samplers = if len == 0 {
            None
        } else {
            Some((0..len).map(|_| Sampler::decode(dec)).collect())
        };
        Self {
            binding,
            descriptor_type,
            descriptor_count,
            stage_flags,
            immutable_samplers,
        }
    }
}

/// VkDescriptorSetLayoutBindingFlagsCreateInfo.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DescriptorSetLayoutBindingFlagsCreateInfo {
    pub binding_flags: Vec<u32>,
}

impl Encode for DescriptorSetLayoutBindingFlagsCreateInfo {
    fn wire_size(&self) -> usize {
        sizes::scalar_4() + sizes::array_size() + sizes::u32_array(self.binding_flags.len())
    }

    fn encode(&self, enc: &mut Encoder) {
        enc.encode_u32(self.binding_flags.len() as u32);
        enc.encode_array_size(self.binding_flags.len() as u64);
        enc.encode_u32_array(&self.binding_flags);
    }
}

impl Decode for DescriptorSetLayoutBindingFlagsCreateInfo {
    fn decode(dec: &mut Decoder<'_>) -> Self {
        let count = (dec.decode_u32() as u64).min(MAX_LAYOUT_BINDINGS);
        let len = dec.decode_array_size(count) as usize;
        Self {
            binding_flags: dec.decode_u32_array(len),
        }
    }
}

pnext_chain! {
    pub enum DescriptorSetLayoutCreateInfoExt {
        DescriptorSetLayoutBindingFlagsCreateInfo =>
            BindingFlags(DescriptorSetLayoutBindingFlagsCreateInfo),
    }
}

/// VkDescriptorSetLayoutCreateInfo.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DescriptorSetLayoutCreateInfo {
    pub flags: u32,
    pub bindings: Vec<DescriptorSetLayoutBinding>,
    pub chain: Vec<DescriptorSetLayoutCreateInfoExt>,
}

impl Encode for DescriptorSetLayoutCreateInfo {
    fn wire_size(&self) -> usize {
        sizes::scalar_4()
            + chain::wire_size(&self.chain)
            + sizes::scalar_4()
            + sizes::scalar_4()
            + sizes::array_size()
            + self.bindings.iter().map(Encode::wire_size).sum::<usize>()
    }

    fn encode(&self, enc: &mut Encoder) {
        enc.encode_stype(StructureType::DescriptorSetLayoutCreateInfo);
        chain::encode(enc, &self.chain);
        enc.encode_u32(self.flags);
        enc.encode_u32(self.bindings.len() as u32);
        enc.encode_array_size(self.bindings.len() as u64);
        for binding in &self.bindings {
            binding.encode(enc);
        }
    }
}

impl Decode for DescriptorSetLayoutCreateInfo {
    fn decode(dec: &mut Decoder<'_>) -> Self {
        dec.expect_stype(StructureType::DescriptorSetLayoutCreateInfo);
        let chain = chain::decode(dec);
        let flags = dec.decode_u32();
        let count = (dec.decode_u32() as u64).min(MAX_LAYOUT_BINDINGS);
        let len = dec.decode_array_size(count) as usize;
        let bindings = (0..len)
            .map(|_| DescriptorSetLayoutBinding::decode(dec))
            .collect();
        Self {
            flags,
            bindings,
            chain,
        }
    }
}
