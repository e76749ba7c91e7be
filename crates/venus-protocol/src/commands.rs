//! Command stream codecs.
//!
//! Every command opens with a type and a flags dword. A reply, when the
//! GENERATE_REPLY flag asked for one, opens by echoing the command type so
//! a desynchronized stream is caught at the first reply rather than by
//! misinterpreted payload bytes.

use crate::buffer::BufferCreateInfo;
use crate::chain;
use crate::cs::{Decoder, Encoder};
use crate::descriptor::DescriptorSetLayoutCreateInfo;
use crate::device::{DeviceCreateInfo, InstanceCreateInfo};
use crate::error::{StreamError, VkResult};
use crate::features::PhysicalDeviceFeatures2;
use crate::handles::{
    Buffer, DescriptorSetLayout, Device, DeviceMemory, Fence, Instance, PhysicalDevice, Queue,
    RenderPass, Semaphore,
};
use crate::memory::{MemoryAllocateInfo, MemoryRequirements2, MemoryRequirements2Ext};
use crate::render_pass::RenderPassCreateInfo2;
use crate::sync::{FenceCreateInfo, SemaphoreCreateInfo, SubmitInfo};
use crate::types::{sizes, Decode, Encode, EncodePartial, StructureType};

/// vkEnumeratePhysicalDevices never returns more than this.
pub const MAX_PHYSICAL_DEVICES: u64 = 16;

const MAX_SUBMITS: u64 = 1024;

/// Command identifiers. Values are wire ABI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum CommandType {
    CreateInstance = 0,
    DestroyInstance = 1,
    EnumeratePhysicalDevices = 2,
    GetPhysicalDeviceFeatures2 = 3,
    CreateDevice = 4,
    DestroyDevice = 5,
    AllocateMemory = 6,
    FreeMemory = 7,
    CreateBuffer = 8,
    DestroyBuffer = 9,
    GetBufferMemoryRequirements2 = 10,
    CreateFence = 11,
    DestroyFence = 12,
    CreateSemaphore = 13,
    DestroySemaphore = 14,
    QueueSubmit = 15,
    CreateRenderPass2 = 16,
    DestroyRenderPass = 17,
    CreateDescriptorSetLayout = 18,
    DestroyDescriptorSetLayout = 19,
}

impl CommandType {
    pub fn as_raw(&self) -> u32 {
        *self as u32
    }

    pub fn from_raw(raw: u32) -> Option<Self> {
        use CommandType::*;
        Some(match raw {
            0 => CreateInstance,
            1 => DestroyInstance,
            2 => EnumeratePhysicalDevices,
            3 => GetPhysicalDeviceFeatures2,
            4 => CreateDevice,
            5 => DestroyDevice,
            6 => AllocateMemory,
            7 => FreeMemory,
            8 => CreateBuffer,
            9 => DestroyBuffer,
            10 => GetBufferMemoryRequirements2,
            11 => CreateFence,
            12 => DestroyFence,
            13 => CreateSemaphore,
            14 => DestroySemaphore,
            15 => QueueSubmit,
            16 => CreateRenderPass2,
            17 => DestroyRenderPass,
            18 => CreateDescriptorSetLayout,
            19 => DestroyDescriptorSetLayout,
            _ => return None,
        })
    }
}

bitflags::bitflags! {
    /// Per-command flags dword.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CommandFlags: u32 {
        /// The caller blocks on a reply to this command.
        const GENERATE_REPLY = 0b0000_0001;
    }
}

pub const HEADER_SIZE: usize = 2 * sizes::scalar_4();

pub fn encode_header(enc: &mut Encoder, ty: CommandType, flags: CommandFlags) {
    enc.encode_u32(ty.as_raw());
    enc.encode_u32(flags.bits());
}

pub fn decode_header(dec: &mut Decoder<'_>) -> Option<(CommandType, CommandFlags)> {
    let raw = dec.decode_u32();
    let flags = CommandFlags::from_bits_truncate(dec.decode_u32());
    match CommandType::from_raw(raw) {
        Some(ty) => Some((ty, flags)),
        None => {
            dec.set_error(StreamError::UnknownCommand(raw));
            None
        }
    }
}

/// Reply headers echo the command type.
pub fn encode_reply_header(enc: &mut Encoder, ty: CommandType) {
    enc.encode_u32(ty.as_raw());
}

pub fn expect_reply(dec: &mut Decoder<'_>, expected: CommandType) {
    let raw = dec.decode_u32();
    if dec.has_error() {
        return;
    }
    if raw != expected.as_raw() {
        dec.set_error(StreamError::CommandMismatch {
            expected: expected.as_raw(),
            got: raw,
        });
    }
}

/// Create commands share a shape: the info struct, then the id the driver
/// pre-allocated for the new object. The reply echoes the result and the
/// handle. Destroy commands take the owning parent and the handle and
/// never generate a reply.
macro_rules! create_command {
    ($cmd:ident, $parent:ty, $info:ty, $handle:ty,
     $encode:ident, $decode:ident, $encode_reply:ident, $decode_reply:ident) => {
        pub fn $encode(enc: &mut Encoder, parent: $parent, info: &$info, handle: $handle) {
            encode_header(enc, CommandType::$cmd, CommandFlags::GENERATE_REPLY);
            parent.encode(enc);
            info.encode(enc);
            handle.encode(enc);
        }

        pub fn $decode(dec: &mut Decoder<'_>) -> ($parent, $info, $handle) {
            let parent = <$parent>::decode(dec);
            let info = <$info>::decode(dec);
            let handle = <$handle>::decode(dec);
            (parent, info, handle)
        }

        pub fn $encode_reply(enc: &mut Encoder, result: VkResult, handle: $handle) {
            encode_reply_header(enc, CommandType::$cmd);
            enc.encode_i32(result.as_raw());
            handle.encode(enc);
        }

        pub fn $decode_reply(dec: &mut Decoder<'_>) -> (VkResult, $handle) {
            expect_reply(dec, CommandType::$cmd);
            let result = VkResult::from_raw(dec.decode_i32());
            let handle = <$handle>::decode(dec);
            (result, handle)
        }
    };
}

macro_rules! destroy_command {
    ($cmd:ident, $parent:ty, $handle:ty, $encode:ident, $decode:ident) => {
        pub fn $encode(enc: &mut Encoder, parent: $parent, handle: $handle) {
            encode_header(enc, CommandType::$cmd, CommandFlags::empty());
            parent.encode(enc);
            handle.encode(enc);
        }

        pub fn $decode(dec: &mut Decoder<'_>) -> ($parent, $handle) {
            (<$parent>::decode(dec), <$handle>::decode(dec))
        }
    };
}

// vkCreateInstance has no parent; the instance id doubles as both.
pub fn encode_create_instance(enc: &mut Encoder, info: &InstanceCreateInfo, instance: Instance) {
    encode_header(enc, CommandType::CreateInstance, CommandFlags::GENERATE_REPLY);
    info.encode(enc);
    instance.encode(enc);
}

pub fn decode_create_instance(dec: &mut Decoder<'_>) -> (InstanceCreateInfo, Instance) {
    let info = InstanceCreateInfo::decode(dec);
    let instance = Instance::decode(dec);
    (info, instance)
}

pub fn encode_create_instance_reply(enc: &mut Encoder, result: VkResult, instance: Instance) {
    encode_reply_header(enc, CommandType::CreateInstance);
    enc.encode_i32(result.as_raw());
    instance.encode(enc);
}

pub fn decode_create_instance_reply(dec: &mut Decoder<'_>) -> (VkResult, Instance) {
    expect_reply(dec, CommandType::CreateInstance);
    let result = VkResult::from_raw(dec.decode_i32());
    let instance = Instance::decode(dec);
    (result, instance)
}

pub fn encode_destroy_instance(enc: &mut Encoder, instance: Instance) {
    encode_header(enc, CommandType::DestroyInstance, CommandFlags::empty());
    instance.encode(enc);
}

pub fn decode_destroy_instance(dec: &mut Decoder<'_>) -> Instance {
    Instance::decode(dec)
}

create_command!(
    CreateDevice, PhysicalDevice, DeviceCreateInfo, Device,
    encode_create_device, decode_create_device,
    encode_create_device_reply, decode_create_device_reply
);

pub fn encode_destroy_device(enc: &mut Encoder, device: Device) {
    encode_header(enc, CommandType::DestroyDevice, CommandFlags::empty());
    device.encode(enc);
}

pub fn decode_destroy_device(dec: &mut Decoder<'_>) -> Device {
    Device::decode(dec)
}

create_command!(
    AllocateMemory, Device, MemoryAllocateInfo, DeviceMemory,
    encode_allocate_memory, decode_allocate_memory,
    encode_allocate_memory_reply, decode_allocate_memory_reply
);

destroy_command!(
    FreeMemory, Device, DeviceMemory,
    encode_free_memory, decode_free_memory
);

create_command!(
    CreateBuffer, Device, BufferCreateInfo, Buffer,
    encode_create_buffer, decode_create_buffer,
    encode_create_buffer_reply, decode_create_buffer_reply
);

destroy_command!(
    DestroyBuffer, Device, Buffer,
    encode_destroy_buffer, decode_destroy_buffer
);

create_command!(
    CreateFence, Device, FenceCreateInfo, Fence,
    encode_create_fence, decode_create_fence,
    encode_create_fence_reply, decode_create_fence_reply
);

destroy_command!(
    DestroyFence, Device, Fence,
    encode_destroy_fence, decode_destroy_fence
);

create_command!(
    CreateSemaphore, Device, SemaphoreCreateInfo, Semaphore,
    encode_create_semaphore, decode_create_semaphore,
    encode_create_semaphore_reply, decode_create_semaphore_reply
);

destroy_command!(
    DestroySemaphore, Device, Semaphore,
    encode_destroy_semaphore, decode_destroy_semaphore
);

create_command!(
    CreateRenderPass2, Device, RenderPassCreateInfo2, RenderPass,
    encode_create_render_pass2, decode_create_render_pass2,
    encode_create_render_pass2_reply, decode_create_render_pass2_reply
);

destroy_command!(
    DestroyRenderPass, Device, RenderPass,
    encode_destroy_render_pass, decode_destroy_render_pass
);

create_command!(
    CreateDescriptorSetLayout, Device, DescriptorSetLayoutCreateInfo, DescriptorSetLayout,
    encode_create_descriptor_set_layout, decode_create_descriptor_set_layout,
    encode_create_descriptor_set_layout_reply, decode_create_descriptor_set_layout_reply
);

destroy_command!(
    DestroyDescriptorSetLayout, Device, DescriptorSetLayout,
    encode_destroy_descriptor_set_layout, decode_destroy_descriptor_set_layout
);

/// vkEnumeratePhysicalDevices. The driver sends the ids it pre-allocated
/// for the slots; the reply reports how many are real.
pub fn encode_enumerate_physical_devices(
    enc: &mut Encoder,
    instance: Instance,
    slots: &[PhysicalDevice],
) {
    encode_header(
        enc,
        CommandType::EnumeratePhysicalDevices,
        CommandFlags::GENERATE_REPLY,
    );
    instance.encode(enc);
    enc.encode_u32(slots.len() as u32);
    enc.encode_array_size(slots.len() as u64);
    for slot in slots {
        slot.encode(enc);
    }
}

pub fn decode_enumerate_physical_devices(
    dec: &mut Decoder<'_>,
) -> (Instance, Vec<PhysicalDevice>) {
    let instance = Instance::decode(dec);
    let count = (dec.decode_u32() as u64).min(MAX_PHYSICAL_DEVICES);
    let len = dec.decode_array_size(count) as usize;
    let slots = (0..len).map(|_| PhysicalDevice::decode(dec)).collect();
    (instance, slots)
}

pub fn encode_enumerate_physical_devices_reply(
    enc: &mut Encoder,
    result: VkResult,
    devices: &[PhysicalDevice],
) {
    encode_reply_header(enc, CommandType::EnumeratePhysicalDevices);
    enc.encode_i32(result.as_raw());
    enc.encode_u32(devices.len() as u32);
    enc.encode_array_size(devices.len() as u64);
    for dev in devices {
        dev.encode(enc);
    }
}

pub fn decode_enumerate_physical_devices_reply(
    dec: &mut Decoder<'_>,
) -> (VkResult, Vec<PhysicalDevice>) {
    expect_reply(dec, CommandType::EnumeratePhysicalDevices);
    let result = VkResult::from_raw(dec.decode_i32());
    let count = (dec.decode_u32() as u64).min(MAX_PHYSICAL_DEVICES);
    let len = dec.decode_array_size(count) as usize;
    let devices = (0..len).map(|_| PhysicalDevice::decode(dec)).collect();
    (result, devices)
}

/// vkGetPhysicalDeviceFeatures2. The request carries only the chain
/// skeleton; the renderer fills the structs it names.
pub fn encode_get_physical_device_features2(
    enc: &mut Encoder,
    physical_device: PhysicalDevice,
    query: &PhysicalDeviceFeatures2,
) {
    encode_header(
        enc,
        CommandType::GetPhysicalDeviceFeatures2,
        CommandFlags::GENERATE_REPLY,
    );
    physical_device.encode(enc);
    query.encode_partial(enc);
}

pub fn decode_get_physical_device_features2(
    dec: &mut Decoder<'_>,
) -> (PhysicalDevice, Vec<StructureType>) {
    let physical_device = PhysicalDevice::decode(dec);
    let requested = PhysicalDeviceFeatures2::decode_query(dec);
    (physical_device, requested)
}

pub fn encode_get_physical_device_features2_reply(
    enc: &mut Encoder,
    features: &PhysicalDeviceFeatures2,
) {
    encode_reply_header(enc, CommandType::GetPhysicalDeviceFeatures2);
    features.encode(enc);
}

pub fn decode_get_physical_device_features2_reply(
    dec: &mut Decoder<'_>,
) -> PhysicalDeviceFeatures2 {
    expect_reply(dec, CommandType::GetPhysicalDeviceFeatures2);
    PhysicalDeviceFeatures2::decode(dec)
}

/// vkGetBufferMemoryRequirements2.
pub fn encode_get_buffer_memory_requirements2(
    enc: &mut Encoder,
    device: Device,
    buffer: Buffer,
    query: &MemoryRequirements2,
) {
    encode_header(
        enc,
        CommandType::GetBufferMemoryRequirements2,
        CommandFlags::GENERATE_REPLY,
    );
    device.encode(enc);
    // VkBufferMemoryRequirementsInfo2 collapses to its buffer member
    enc.encode_stype(StructureType::BufferMemoryRequirementsInfo2);
    enc.encode_chain_terminator();
    buffer.encode(enc);
    query.encode_partial(enc);
}

pub fn decode_get_buffer_memory_requirements2(
    dec: &mut Decoder<'_>,
) -> (Device, Buffer, Vec<StructureType>) {
    let device = Device::decode(dec);
    dec.expect_stype(StructureType::BufferMemoryRequirementsInfo2);
    if dec.decode_simple_pointer() {
        let raw = dec.decode_i32();
        dec.set_error(StreamError::UnexpectedStructureType(raw));
    }
    let buffer = Buffer::decode(dec);
    let requested = MemoryRequirements2::decode_query(dec);
    (device, buffer, requested)
}

pub fn encode_get_buffer_memory_requirements2_reply(
    enc: &mut Encoder,
    requirements: &MemoryRequirements2,
) {
    encode_reply_header(enc, CommandType::GetBufferMemoryRequirements2);
    requirements.encode(enc);
}

pub fn decode_get_buffer_memory_requirements2_reply(
    dec: &mut Decoder<'_>,
) -> MemoryRequirements2 {
    expect_reply(dec, CommandType::GetBufferMemoryRequirements2);
    MemoryRequirements2::decode(dec)
}

/// vkQueueSubmit.
pub fn encode_queue_submit(
    enc: &mut Encoder,
    queue: Queue,
    submits: &[SubmitInfo],
    fence: Fence,
) {
    encode_header(enc, CommandType::QueueSubmit, CommandFlags::GENERATE_REPLY);
    queue.encode(enc);
    enc.encode_u32(submits.len() as u32);
    enc.encode_array_size(submits.len() as u64);
    for submit in submits {
        submit.encode(enc);
    }
    fence.encode(enc);
}

pub fn decode_queue_submit(dec: &mut Decoder<'_>) -> (Queue, Vec<SubmitInfo>, Fence) {
    let queue = Queue::decode(dec);
    let count = (dec.decode_u32() as u64).min(MAX_SUBMITS);
    let len = dec.decode_array_size(count) as usize;
    let submits = (0..len).map(|_| SubmitInfo::decode(dec)).collect();
    let fence = Fence::decode(dec);
    (queue, submits, fence)
}

pub fn encode_queue_submit_reply(enc: &mut Encoder, result: VkResult) {
    encode_reply_header(enc, CommandType::QueueSubmit);
    enc.encode_i32(result.as_raw());
}

pub fn decode_queue_submit_reply(dec: &mut Decoder<'_>) -> VkResult {
    expect_reply(dec, CommandType::QueueSubmit);
    VkResult::from_raw(dec.decode_i32())
}

/// Upper bound for a buffer requirements query reply, used to size reply
/// shmem before the renderer answers.
pub fn buffer_requirements_reply_size(chain: &[MemoryRequirements2Ext]) -> usize {
    sizes::scalar_4()
        + sizes::scalar_4()
        + chain::wire_size(chain)
        + MemoryRequirements2::default().memory_requirements.wire_size()
}
