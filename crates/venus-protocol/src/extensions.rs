//! Extension table and renderer capability negotiation.
//!
//! The renderer advertises the extensions its decoder was generated with
//! as a fixed-index bitmask. The driver intersects that mask with its own
//! table and only ever serializes structs belonging to the agreed set.

use crate::cs::{Decoder, Encoder};
use crate::types::{sizes, Decode, Encode, StructureType};
use crate::{VK_XML_VERSION, WIRE_FORMAT_VERSION};

/// Spec version of VK_EXT_command_serialization this codec implements.
pub const COMMAND_SERIALIZATION_SPEC_VERSION: u32 = 4;

/// Extensions the serializer knows how to encode. Indices are wire ABI:
/// they identify bits in [`ExtensionMask`] and never change once assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Extension {
    KhrTimelineSemaphore = 0,
    ExtDescriptorIndexing = 1,
    KhrCreateRenderpass2 = 2,
    KhrDedicatedAllocation = 3,
    KhrExternalMemory = 4,
    KhrGetMemoryRequirements2 = 5,
    KhrGetPhysicalDeviceProperties2 = 6,
    KhrDeviceGroup = 7,
}

impl Extension {
    pub const COUNT: usize = 8;

    pub fn name(&self) -> &'static str {
        match self {
            Self::KhrTimelineSemaphore => "VK_KHR_timeline_semaphore",
            Self::ExtDescriptorIndexing => "VK_EXT_descriptor_indexing",
            Self::KhrCreateRenderpass2 => "VK_KHR_create_renderpass2",
            Self::KhrDedicatedAllocation => "VK_KHR_dedicated_allocation",
            Self::KhrExternalMemory => "VK_KHR_external_memory",
            Self::KhrGetMemoryRequirements2 => "VK_KHR_get_memory_requirements2",
            Self::KhrGetPhysicalDeviceProperties2 => "VK_KHR_get_physical_device_properties2",
            Self::KhrDeviceGroup => "VK_KHR_device_group",
        }
    }

    /// Core version the extension was promoted to, if any.
    pub fn promoted_to(&self) -> Option<u32> {
        match self {
            Self::KhrTimelineSemaphore
            | Self::ExtDescriptorIndexing
            | Self::KhrCreateRenderpass2 => Some(crate::make_api_version(1, 2, 0)),
            Self::KhrDedicatedAllocation
            | Self::KhrExternalMemory
            | Self::KhrGetMemoryRequirements2
            | Self::KhrGetPhysicalDeviceProperties2
            | Self::KhrDeviceGroup => Some(crate::make_api_version(1, 1, 0)),
        }
    }

    pub fn all() -> impl Iterator<Item = Extension> {
        [
            Self::KhrTimelineSemaphore,
            Self::ExtDescriptorIndexing,
            Self::KhrCreateRenderpass2,
            Self::KhrDedicatedAllocation,
            Self::KhrExternalMemory,
            Self::KhrGetMemoryRequirements2,
            Self::KhrGetPhysicalDeviceProperties2,
            Self::KhrDeviceGroup,
        ]
        .into_iter()
    }

    pub fn from_name(name: &str) -> Option<Extension> {
        Self::all().find(|ext| ext.name() == name)
    }

    /// Feature struct this extension contributes to a features2 chain,
    /// for the extensions that define one.
    pub fn feature_struct(&self) -> Option<StructureType> {
        match self {
            Self::KhrTimelineSemaphore => {
                Some(StructureType::PhysicalDeviceTimelineSemaphoreFeatures)
            }
            Self::ExtDescriptorIndexing => {
                Some(StructureType::PhysicalDeviceDescriptorIndexingFeatures)
            }
            _ => None,
        }
    }
}

/// Fixed-index extension bitmask. Sized for growth; the wire carries all
/// words whether or not the tail bits are assigned yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtensionMask {
    words: [u32; Self::WORDS],
}

impl ExtensionMask {
    const WORDS: usize = 4;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn all_known() -> Self {
        let mut mask = Self::new();
        for ext in Extension::all() {
            mask.insert(ext);
        }
        mask
    }

    pub fn insert(&mut self, ext: Extension) {
        let bit = ext as u32;
        self.words[bit as usize / 32] |= 1 << (bit % 32);
    }

    pub fn contains(&self, ext: Extension) -> bool {
        let bit = ext as u32;
        self.words[bit as usize / 32] & (1 << (bit % 32)) != 0
    }

    pub fn intersection(&self, other: &Self) -> Self {
        let mut words = [0u32; Self::WORDS];
        for (out, (a, b)) in words
            .iter_mut()
            .zip(self.words.iter().zip(other.words.iter()))
        {
            *out = a & b;
        }
        Self { words }
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|w| *w == 0)
    }

    pub fn iter(&self) -> impl Iterator<Item = Extension> + '_ {
        Extension::all().filter(|ext| self.contains(*ext))
    }
}

impl Encode for ExtensionMask {
    fn wire_size(&self) -> usize {
        sizes::u32_array(Self::WORDS)
    }

    fn encode(&self, enc: &mut Encoder) {
        enc.encode_u32_array(&self.words);
    }
}

impl Decode for ExtensionMask {
    fn decode(dec: &mut Decoder<'_>) -> Self {
        let mut words = [0u32; Self::WORDS];
        dec.read(Self::WORDS * 4, bytemuck::cast_slice_mut(&mut words));
        Self { words }
    }
}

/// Renderer capabilities, exchanged once at connection setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub wire_format_version: u32,
    pub vk_xml_version: u32,
    pub vk_ext_command_serialization_spec_version: u32,
    pub extensions: ExtensionMask,
}

impl Capabilities {
    pub fn local() -> Self {
        Self {
            wire_format_version: WIRE_FORMAT_VERSION,
            vk_xml_version: VK_XML_VERSION,
            vk_ext_command_serialization_spec_version: COMMAND_SERIALIZATION_SPEC_VERSION,
            extensions: ExtensionMask::all_known(),
        }
    }

    /// Intersect with the remote side. Versions settle on the lower of the
    /// two; only the wire format has to match exactly.
    pub fn negotiate(&self, remote: &Capabilities) -> Option<Capabilities> {
        if self.wire_format_version != remote.wire_format_version {
            return None;
        }
        Some(Capabilities {
            wire_format_version: self.wire_format_version,
            vk_xml_version: self.vk_xml_version.min(remote.vk_xml_version),
            vk_ext_command_serialization_spec_version: self
                .vk_ext_command_serialization_spec_version
                .min(remote.vk_ext_command_serialization_spec_version),
            extensions: self.extensions.intersection(&remote.extensions),
        })
    }

    /// Feature structs a features2 query may chain under these
    /// capabilities: the Vulkan 1.1 core struct when the agreed vk.xml
    /// version reaches it, plus the struct of every extension that was
    /// either negotiated or promoted into the agreed core version.
    pub fn feature_query_stypes(&self) -> Vec<StructureType> {
        let mut out = Vec::new();
        if self.vk_xml_version >= crate::make_api_version(1, 1, 0) {
            out.push(StructureType::PhysicalDeviceVulkan11Features);
        }
        for ext in Extension::all() {
            let Some(stype) = ext.feature_struct() else {
                continue;
            };
            let in_core = ext
                .promoted_to()
                .is_some_and(|version| self.vk_xml_version >= version);
            if in_core || self.extensions.contains(ext) {
                out.push(stype);
            }
        }
        out
    }
}

impl Encode for Capabilities {
    fn wire_size(&self) -> usize {
        3 * sizes::scalar_4() + self.extensions.wire_size()
    }

    fn encode(&self, enc: &mut Encoder) {
        enc.encode_u32(self.wire_format_version);
        enc.encode_u32(self.vk_xml_version);
        enc.encode_u32(self.vk_ext_command_serialization_spec_version);
        self.extensions.encode(enc);
    }
}

impl Decode for Capabilities {
    fn decode(dec: &mut Decoder<'_>) -> Self {
        Self {
            wire_format_version: dec.decode_u32(),
            vk_xml_version: dec.decode_u32(),
            vk_ext_command_serialization_spec_version: dec.decode_u32(),
            extensions: ExtensionMask::decode(dec),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_bit_positions_are_stable() {
        let mut mask = ExtensionMask::new();
        mask.insert(Extension::KhrTimelineSemaphore);
        mask.insert(Extension::KhrGetMemoryRequirements2);
        assert!(mask.contains(Extension::KhrTimelineSemaphore));
        assert!(!mask.contains(Extension::ExtDescriptorIndexing));
        assert_eq!(
            mask.iter().collect::<Vec<_>>(),
            vec![
                Extension::KhrTimelineSemaphore,
                Extension::KhrGetMemoryRequirements2,
            ]
        );
    }

    #[test]
    fn negotiation_intersects_extensions_and_floors_versions() {
        let local = Capabilities::local();
        let mut remote_exts = ExtensionMask::new();
        remote_exts.insert(Extension::KhrTimelineSemaphore);
        remote_exts.insert(Extension::KhrDeviceGroup);
        let remote = Capabilities {
            wire_format_version: WIRE_FORMAT_VERSION,
            vk_xml_version: crate::make_api_version(1, 1, 100),
            vk_ext_command_serialization_spec_version: 3,
            extensions: remote_exts,
        };

        let agreed = local.negotiate(&remote).unwrap();
        assert_eq!(agreed.vk_xml_version, crate::make_api_version(1, 1, 100));
        assert_eq!(agreed.vk_ext_command_serialization_spec_version, 3);
        assert!(agreed.extensions.contains(Extension::KhrTimelineSemaphore));
        assert!(!agreed.extensions.contains(Extension::ExtDescriptorIndexing));
    }

    #[test]
    fn wire_format_mismatch_fails_negotiation() {
        let local = Capabilities::local();
        let remote = Capabilities {
            wire_format_version: WIRE_FORMAT_VERSION + 1,
            ..local
        };
        assert!(local.negotiate(&remote).is_none());
    }

    #[test]
    fn capabilities_cross_the_wire() {
        let caps = Capabilities::local();
        let mut enc = Encoder::new();
        caps.encode(&mut enc);
        assert_eq!(enc.total_len(), caps.wire_size());

        let bytes = enc.to_bytes();
        let mut dec = Decoder::new(&bytes);
        let back = Capabilities::decode(&mut dec);
        assert!(dec.check().is_ok());
        assert_eq!(back, caps);
    }

    #[test]
    fn feature_queries_are_gated_by_negotiation() {
        // a 1.0 renderer offering only timeline semaphores
        let mut remote_exts = ExtensionMask::new();
        remote_exts.insert(Extension::KhrTimelineSemaphore);
        let remote = Capabilities {
            wire_format_version: WIRE_FORMAT_VERSION,
            vk_xml_version: crate::make_api_version(1, 0, 0),
            vk_ext_command_serialization_spec_version: COMMAND_SERIALIZATION_SPEC_VERSION,
            extensions: remote_exts,
        };
        let agreed = Capabilities::local().negotiate(&remote).unwrap();

        let stypes = agreed.feature_query_stypes();
        assert!(stypes.contains(&StructureType::PhysicalDeviceTimelineSemaphoreFeatures));
        assert!(!stypes.contains(&StructureType::PhysicalDeviceDescriptorIndexingFeatures));
        assert!(!stypes.contains(&StructureType::PhysicalDeviceVulkan11Features));
    }

    #[test]
    fn promoted_feature_structs_ride_on_the_core_version() {
        // no extension bits, but a 1.2 core covers the promoted structs
        let caps = Capabilities {
            wire_format_version: WIRE_FORMAT_VERSION,
            vk_xml_version: crate::make_api_version(1, 2, 0),
            vk_ext_command_serialization_spec_version: COMMAND_SERIALIZATION_SPEC_VERSION,
            extensions: ExtensionMask::new(),
        };
        let stypes = caps.feature_query_stypes();
        assert!(stypes.contains(&StructureType::PhysicalDeviceVulkan11Features));
        assert!(stypes.contains(&StructureType::PhysicalDeviceTimelineSemaphoreFeatures));
        assert!(stypes.contains(&StructureType::PhysicalDeviceDescriptorIndexingFeatures));
    }

    #[test]
    fn names_round_trip_through_lookup() {
        for ext in Extension::all() {
            assert_eq!(Extension::from_name(ext.name()), Some(ext));
        }
        assert_eq!(Extension::from_name("VK_KHR_swapchain"), None);
    }
}
