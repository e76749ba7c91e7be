pub mod buffer;
pub mod chain;
pub mod commands;
pub mod cs;
pub mod descriptor;
pub mod device;
pub mod error;
pub mod extensions;
pub mod features;
pub mod frame;
pub mod handles;
pub mod memory;
pub mod render_pass;
pub mod sync;
pub mod types;

pub use cs::{Decoder, Encoder};
pub use error::{StreamError, VkResult};
pub use handles::{ObjectId, ObjectType};
pub use types::{Decode, Encode, EncodePartial, StructureType};

/// Venus wire format version spoken by this crate.
pub const WIRE_FORMAT_VERSION: u32 = 1;

/// Version of the Vulkan XML registry the struct codecs were written against.
pub const VK_XML_VERSION: u32 = make_api_version(1, 2, 131);

/// VK_MAKE_API_VERSION without the variant bits.
pub const fn make_api_version(major: u32, minor: u32, patch: u32) -> u32 {
    (major << 22) | (minor << 12) | patch
}
