//! Fence, semaphore, and queue submission structs.

use crate::chain::{self, pnext_chain};
use crate::cs::{Decoder, Encoder};
use crate::handles::{CommandBuffer, Semaphore};
use crate::types::{sizes, Decode, Encode, StructureType};

pub const SEMAPHORE_TYPE_BINARY: i32 = 0;
pub const SEMAPHORE_TYPE_TIMELINE: i32 = 1;

/// Submission arrays beyond this are stream corruption.
const MAX_SUBMIT_ENTRIES: u64 = 4096;

/// VkFenceCreateInfo. No extension structs are accepted in its chain.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FenceCreateInfo {
    pub flags: u32,
}

impl Encode for FenceCreateInfo {
    fn wire_size(&self) -> usize {
        sizes::scalar_4() + sizes::simple_pointer() + sizes::scalar_4()
    }

    fn encode(&self, enc: &mut Encoder) {
        enc.encode_stype(StructureType::FenceCreateInfo);
        enc.encode_chain_terminator();
        enc.encode_u32(self.flags);
    }
}

impl Decode for FenceCreateInfo {
    fn decode(dec: &mut Decoder<'_>) -> Self {
        dec.expect_stype(StructureType::FenceCreateInfo);
        if dec.decode_simple_pointer() {
            let raw = dec.decode_i32();
            dec.set_error(crate::error::StreamError::UnexpectedStructureType(raw));
            return Self::default();
        }
        Self {
            flags: dec.decode_u32(),
        }
    }
}

/// VkSemaphoreTypeCreateInfo.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SemaphoreTypeCreateInfo {
    pub semaphore_type: i32,
    pub initial_value: u64,
}

impl Encode for SemaphoreTypeCreateInfo {
    fn wire_size(&self) -> usize {
        sizes::scalar_4() + sizes::scalar_8()
    }

    fn encode(&self, enc: &mut Encoder) {
        enc.encode_i32(self.semaphore_type);
        enc.encode_u64(self.initial_value);
    }
}

impl Decode for SemaphoreTypeCreateInfo {
    fn decode(dec: &mut Decoder<'_>) -> Self {
        Self {
            semaphore_type: dec.decode_i32(),
            initial_value: dec.decode_u64(),
        }
    }
}

pnext_chain! {
    pub enum SemaphoreCreateInfoExt {
        SemaphoreTypeCreateInfo => SemaphoreType(SemaphoreTypeCreateInfo),
    }
}

/// VkSemaphoreCreateInfo.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SemaphoreCreateInfo {
    pub flags: u32,
    pub chain: Vec<SemaphoreCreateInfoExt>,
}

impl Encode for SemaphoreCreateInfo {
    fn wire_size(&self) -> usize {
        sizes::scalar_4() + chain::wire_size(&self.chain) + sizes::scalar_4()
    }

    fn encode(&self, enc: &mut Encoder) {
        enc.encode_stype(StructureType::SemaphoreCreateInfo);
        chain::encode(enc, &self.chain);
        enc.encode_u32(self.flags);
    }
}

impl Decode for SemaphoreCreateInfo {
    fn decode(dec: &mut Decoder<'_>) -> Self {
        dec.expect_stype(StructureType::SemaphoreCreateInfo);
        let chain = chain::decode(dec);
        Self {
            flags: dec.decode_u32(),
            chain,
        }
    }
}

/// VkTimelineSemaphoreSubmitInfo.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimelineSemaphoreSubmitInfo {
    pub wait_semaphore_values: Vec<u64>,
    pub signal_semaphore_values: Vec<u64>,
}

impl Encode for TimelineSemaphoreSubmitInfo {
    fn wire_size(&self) -> usize {
        2 * (sizes::scalar_4() + sizes::array_size())
            + sizes::u64_array(self.wait_semaphore_values.len())
            + sizes::u64_array(self.signal_semaphore_values.len())
    }

    fn encode(&self, enc: &mut Encoder) {
        enc.encode_u32(self.wait_semaphore_values.len() as u32);
        enc.encode_array_size(self.wait_semaphore_values.len() as u64);
        enc.encode_u64_array(&self.wait_semaphore_values);
        enc.encode_u32(self.signal_semaphore_values.len() as u32);
        enc.encode_array_size(self.signal_semaphore_values.len() as u64);
        enc.encode_u64_array(&self.signal_semaphore_values);
    }
}

impl Decode for TimelineSemaphoreSubmitInfo {
    fn decode(dec: &mut Decoder<'_>) -> Self {
        let wait_count = dec.decode_u32() as u64;
        let len = dec.decode_array_size(wait_count.min(MAX_SUBMIT_ENTRIES)) as usize;
        let wait_semaphore_values = dec.decode_u64_array(len);
        let signal_count = dec.decode_u32() as u64;
        let len = dec.decode_array_size(signal_count.min(MAX_SUBMIT_ENTRIES)) as usize;
        let signal_semaphore_values = dec.decode_u64_array(len);
        Self {
            wait_semaphore_values,
            signal_semaphore_values,
        }
    }
}

pnext_chain! {
    pub enum SubmitInfoExt {
        TimelineSemaphoreSubmitInfo => Timeline(TimelineSemaphoreSubmitInfo),
    }
}

/// VkSubmitInfo. `wait_dst_stage_mask` is indexed alongside
/// `wait_semaphores`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubmitInfo {
    pub wait_semaphores: Vec<Semaphore>,
    pub wait_dst_stage_mask: Vec<u32>,
    pub command_buffers: Vec<CommandBuffer>,
    pub signal_semaphores: Vec<Semaphore>,
    pub chain: Vec<SubmitInfoExt>,
}

fn handle_array_size(count: usize) -> usize {
    sizes::array_size() + count * sizes::scalar_8()
}

impl Encode for SubmitInfo {
    fn wire_size(&self) -> usize {
        sizes::scalar_4()
            + chain::wire_size(&self.chain)
            + sizes::scalar_4()
            + handle_array_size(self.wait_semaphores.len())
            + sizes::array_size()
            + sizes::u32_array(self.wait_dst_stage_mask.len())
            + sizes::scalar_4()
            + handle_array_size(self.command_buffers.len())
            + sizes::scalar_4()
            + handle_array_size(self.signal_semaphores.len())
    }

    fn encode(&self, enc: &mut Encoder) {
        debug_assert_eq!(self.wait_semaphores.len(), self.wait_dst_stage_mask.len());

        enc.encode_stype(StructureType::SubmitInfo);
        chain::encode(enc, &self.chain);

        enc.encode_u32(self.wait_semaphores.len() as u32);
        enc.encode_array_size(self.wait_semaphores.len() as u64);
        for sem in &self.wait_semaphores {
            sem.encode(enc);
        }
        enc.encode_array_size(self.wait_dst_stage_mask.len() as u64);
        enc.encode_u32_array(&self.wait_dst_stage_mask);

        enc.encode_u32(self.command_buffers.len() as u32);
        enc.encode_array_size(self.command_buffers.len() as u64);
        for cb in &self.command_buffers {
            cb.encode(enc);
        }

        enc.encode_u32(self.signal_semaphores.len() as u32);
        enc.encode_array_size(self.signal_semaphores.len() as u64);
        for sem in &self.signal_semaphores {
            sem.encode(enc);
        }
    }
}

impl Decode for SubmitInfo {
    fn decode(dec: &mut Decoder<'_>) -> Self {
        dec.expect_stype(StructureType::SubmitInfo);
        let chain = chain::decode(dec);

        let wait_count = (dec.decode_u32() as u64).min(MAX_SUBMIT_ENTRIES);
        let len = dec.decode_array_size(wait_count) as usize;
        let wait_semaphores = (0..len).map(|_| Semaphore::decode(dec)).collect();
        let len = dec.decode_array_size(wait_count) as usize;
        let wait_dst_stage_mask = dec.decode_u32_array(len);

        let cb_count = (dec.decode_u32() as u64).min(MAX_SUBMIT_ENTRIES);
        let len = dec.decode_array_size(cb_count) as usize;
        let command_buffers = (0..len).map(|_| CommandBuffer::decode(dec)).collect();

        let signal_count = (dec.decode_u32() as u64).min(MAX_SUBMIT_ENTRIES);
        let len = dec.decode_array_size(signal_count) as usize;
        let signal_semaphores = (0..len).map(|_| Semaphore::decode(dec)).collect();

        Self {
            wait_semaphores,
            wait_dst_stage_mask,
            command_buffers,
            signal_semaphores,
            chain,
        }
    }
}
