//! Renderer-visible object identities and typed handle codecs.
//!
//! Every guest-visible Vulkan object is paired with a 64-bit id the driver
//! allocates before the create command is encoded; only the id crosses the
//! wire. Dispatchable and non-dispatchable handles share the format.

use crate::cs::{Decoder, Encoder};
use crate::types::{sizes, Decode, Encode};

/// Renderer-side identity of a driver object. Id 0 is the null object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u64);

impl ObjectId {
    pub const NULL: ObjectId = ObjectId(0);

    pub fn is_null(&self) -> bool {
        self.0 == 0
    }
}

impl Encode for ObjectId {
    fn wire_size(&self) -> usize {
        sizes::scalar_8()
    }

    fn encode(&self, enc: &mut Encoder) {
        enc.encode_u64(self.0);
    }
}

impl Decode for ObjectId {
    fn decode(dec: &mut Decoder<'_>) -> Self {
        ObjectId(dec.decode_u64())
    }
}

/// Object class tag, used for lifetime validation rather than the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    Instance,
    PhysicalDevice,
    Device,
    Queue,
    DeviceMemory,
    Buffer,
    Image,
    Fence,
    Semaphore,
    RenderPass,
    DescriptorSetLayout,
    Sampler,
    CommandBuffer,
}

macro_rules! define_handles {
    ($($(#[$attr:meta])* $name:ident => $obj:ident,)+) => {
        $(
            $(#[$attr])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
            pub struct $name(pub u64);

            impl $name {
                pub const NULL: $name = $name(0);

                pub fn new(id: ObjectId) -> Self {
                    $name(id.0)
                }

                pub fn id(&self) -> ObjectId {
                    ObjectId(self.0)
                }

                pub fn is_null(&self) -> bool {
                    self.0 == 0
                }

                pub const OBJECT_TYPE: ObjectType = ObjectType::$obj;
            }

            impl Encode for $name {
                fn wire_size(&self) -> usize {
                    sizes::scalar_8()
                }

                fn encode(&self, enc: &mut Encoder) {
                    enc.encode_u64(self.0);
                }
            }

            impl Decode for $name {
                fn decode(dec: &mut Decoder<'_>) -> Self {
                    $name(dec.decode_u64())
                }
            }
        )+
    };
}

define_handles! {
    /// Dispatchable root handle.
    Instance => Instance,
    PhysicalDevice => PhysicalDevice,
    Device => Device,
    Queue => Queue,
    CommandBuffer => CommandBuffer,
    DeviceMemory => DeviceMemory,
    Buffer => Buffer,
    Image => Image,
    Fence => Fence,
    Semaphore => Semaphore,
    RenderPass => RenderPass,
    DescriptorSetLayout => DescriptorSetLayout,
    Sampler => Sampler,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_encode_as_bare_ids() {
        let mut enc = Encoder::new();
        Buffer(0x1234).encode(&mut enc);
        Fence::NULL.encode(&mut enc);
        assert_eq!(enc.total_len(), 16);

        let bytes = enc.to_bytes();
        let mut dec = Decoder::new(&bytes);
        assert_eq!(Buffer::decode(&mut dec), Buffer(0x1234));
        assert!(Fence::decode(&mut dec).is_null());
    }

    #[test]
    fn handle_object_types_are_distinct() {
        assert_eq!(Buffer::OBJECT_TYPE, ObjectType::Buffer);
        assert_ne!(Buffer::OBJECT_TYPE, Image::OBJECT_TYPE);
    }
}
