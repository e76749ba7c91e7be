//! Instance and device creation structs.

use crate::chain::{self, pnext_chain};
use crate::cs::{Decoder, Encoder};
use crate::error::StreamError;
use crate::features::PhysicalDeviceFeatures;
use crate::types::{sizes, Decode, Encode, StructureType};

/// VK_MAX_EXTENSION_NAME_SIZE; also bounds layer and application names.
const MAX_NAME_LEN: u64 = 256;

/// Queue and extension arrays beyond this are stream corruption.
const MAX_CREATE_ENTRIES: u64 = 256;

fn optional_string_size(val: &Option<String>) -> usize {
    sizes::simple_pointer() + val.as_ref().map_or(0, |s| sizes::string(s))
}

fn encode_optional_string(enc: &mut Encoder, val: &Option<String>) {
    if enc.encode_simple_pointer(val.is_some()) {
        if let Some(s) = val {
            enc.encode_string(s);
        }
    }
}

fn decode_optional_string(dec: &mut Decoder<'_>) -> Option<String> {
    if dec.decode_simple_pointer() {
        Some(dec.decode_string(MAX_NAME_LEN))
    } else {
        None
    }
}

fn string_array_size(vals: &[String]) -> usize {
    sizes::scalar_4()
        + sizes::array_size()
        + vals.iter().map(|s| sizes::string(s)).sum::<usize>()
}

fn encode_string_array(enc: &mut Encoder, vals: &[String]) {
    enc.encode_u32(vals.len() as u32);
    enc.encode_array_size(vals.len() as u64);
    for s in vals {
        enc.encode_string(s);
    }
}

fn decode_string_array(dec: &mut Decoder<'_>) -> Vec<String> {
    let count = (dec.decode_u32() as u64).min(MAX_CREATE_ENTRIES);
    let len = dec.decode_array_size(count) as usize;
    (0..len).map(|_| dec.decode_string(MAX_NAME_LEN)).collect()
}

/// VkApplicationInfo. No extension structs are accepted in its chain.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplicationInfo {
    pub application_name: Option<String>,
    pub application_version: u32,
    pub engine_name: Option<String>,
    pub engine_version: u32,
    pub api_version: u32,
}

impl Encode for ApplicationInfo {
    fn wire_size(&self) -> usize {
        sizes::scalar_4()
            + sizes::simple_pointer()
            + optional_string_size(&self.application_name)
            + sizes::scalar_4()
            + optional_string_size(&self.engine_name)
            + sizes::scalar_4()
            + sizes::scalar_4()
    }

    fn encode(&self, enc: &mut Encoder) {
        enc.encode_stype(StructureType::ApplicationInfo);
        enc.encode_chain_terminator();
        encode_optional_string(enc, &self.application_name);
        enc.encode_u32(self.application_version);
        encode_optional_string(enc, &self.engine_name);
        enc.encode_u32(self.engine_version);
        enc.encode_u32(self.api_version);
    }
}

impl Decode for ApplicationInfo {
    fn decode(dec: &mut Decoder<'_>) -> Self {
        dec.expect_stype(StructureType::ApplicationInfo);
        if dec.decode_simple_pointer() {
            let raw = dec.decode_i32();
            dec.set_error(StreamError::UnexpectedStructureType(raw));
            return Self::default();
        }
        Self {
            application_name: decode_optional_string(dec),
            application_version: dec.decode_u32(),
            engine_name: decode_optional_string(dec),
            engine_version: dec.decode_u32(),
            api_version: dec.decode_u32(),
        }
    }
}

/// VkInstanceCreateInfo. No extension structs are accepted in its chain.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstanceCreateInfo {
    pub flags: u32,
    pub application_info: Option<ApplicationInfo>,
    pub enabled_layer_names: Vec<String>,
    pub enabled_extension_names: Vec<String>,
}

impl Encode for InstanceCreateInfo {
    fn wire_size(&self) -> usize {
        sizes::scalar_4()
            + sizes::simple_pointer()
            + sizes::scalar_4()
            + sizes::simple_pointer()
            + self
                .application_info
                .as_ref()
                .map_or(0, Encode::wire_size)
            + string_array_size(&self.enabled_layer_names)
            + string_array_size(&self.enabled_extension_names)
    }

    fn encode(&self, enc: &mut Encoder) {
        enc.encode_stype(StructureType::InstanceCreateInfo);
        enc.encode_chain_terminator();
        enc.encode_u32(self.flags);
        if enc.encode_simple_pointer(self.application_info.is_some()) {
            if let Some(info) = &self.application_info {
                info.encode(enc);
            }
        }
        encode_string_array(enc, &self.enabled_layer_names);
        encode_string_array(enc, &self.enabled_extension_names);
    }
}

impl Decode for InstanceCreateInfo {
    fn decode(dec: &mut Decoder<'_>) -> Self {
        dec.expect_stype(StructureType::InstanceCreateInfo);
        if dec.decode_simple_pointer() {
            let raw = dec.decode_i32();
            dec.set_error(StreamError::UnexpectedStructureType(raw));
            return Self::default();
        }
        let flags = dec.decode_u32();
        let application_info = if dec.decode_simple_pointer() {
            Some(ApplicationInfo::decode(dec))
        } else {
            None
        };
        Self {
            flags,
            application_info,
            enabled_layer_names: decode_string_array(dec),
            enabled_extension_names: decode_string_array(dec),
        }
    }
}

/// VkDeviceQueueCreateInfo. No extension structs are accepted in its chain.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceQueueCreateInfo {
    pub flags: u32,
    pub queue_family_index: u32,
    pub queue_priorities: Vec<f32>,
}

impl Encode for DeviceQueueCreateInfo {
    fn wire_size(&self) -> usize {
        sizes::scalar_4()
            + sizes::simple_pointer()
            + 3 * sizes::scalar_4()
            + sizes::array_size()
            + sizes::u32_array(self.queue_priorities.len())
    }

    fn encode(&self, enc: &mut Encoder) {
        enc.encode_stype(StructureType::DeviceQueueCreateInfo);
        enc.encode_chain_terminator();
        enc.encode_u32(self.flags);
        enc.encode_u32(self.queue_family_index);
        enc.encode_u32(self.queue_priorities.len() as u32);
        enc.encode_array_size(self.queue_priorities.len() as u64);
        enc.encode_f32_array(&self.queue_priorities);
    }
}

impl Decode for DeviceQueueCreateInfo {
    fn decode(dec: &mut Decoder<'_>) -> Self {
        dec.expect_stype(StructureType::DeviceQueueCreateInfo);
        if dec.decode_simple_pointer() {
            let raw = dec.decode_i32();
            dec.set_error(StreamError::UnexpectedStructureType(raw));
            return Self::default();
        }
        let flags = dec.decode_u32();
        let queue_family_index = dec.decode_u32();
        let count = (dec.decode_u32() as u64).min(MAX_CREATE_ENTRIES);
        let len = dec.decode_array_size(count) as usize;
        Self {
            flags,
            queue_family_index,
            queue_priorities: dec.decode_f32_array(len),
        }
    }
}

pnext_chain! {
    /// Extension structs accepted in a VkDeviceCreateInfo chain. Feature
    /// structs chained here mirror a features2 query result.
    pub enum DeviceCreateInfoExt {
        PhysicalDeviceVulkan11Features =>
            Vulkan11Features(crate::features::PhysicalDeviceVulkan11Features),
        PhysicalDeviceTimelineSemaphoreFeatures =>
            TimelineSemaphoreFeatures(crate::features::PhysicalDeviceTimelineSemaphoreFeatures),
        PhysicalDeviceDescriptorIndexingFeatures =>
            DescriptorIndexingFeatures(crate::features::PhysicalDeviceDescriptorIndexingFeatures),
    }
}

/// VkDeviceCreateInfo. Layer names are deprecated and not carried.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceCreateInfo {
    pub flags: u32,
    pub queue_create_infos: Vec<DeviceQueueCreateInfo>,
    pub enabled_extension_names: Vec<String>,
    pub enabled_features: Option<PhysicalDeviceFeatures>,
    pub chain: Vec<DeviceCreateInfoExt>,
}

impl Encode for DeviceCreateInfo {
    fn wire_size(&self) -> usize {
        sizes::scalar_4()
            + chain::wire_size(&self.chain)
            + sizes::scalar_4()
            + sizes::scalar_4()
            + sizes::array_size()
            + self
                .queue_create_infos
                .iter()
                .map(Encode::wire_size)
                .sum::<usize>()
            + string_array_size(&self.enabled_extension_names)
            + sizes::simple_pointer()
            + self.enabled_features.as_ref().map_or(0, Encode::wire_size)
    }

    fn encode(&self, enc: &mut Encoder) {
        enc.encode_stype(StructureType::DeviceCreateInfo);
        chain::encode(enc, &self.chain);
        enc.encode_u32(self.flags);
        enc.encode_u32(self.queue_create_infos.len() as u32);
        enc.encode_array_size(self.queue_create_infos.len() as u64);
        for info in &self.queue_create_infos {
            info.encode(enc);
        }
        encode_string_array(enc, &self.enabled_extension_names);
        if enc.encode_simple_pointer(self.enabled_features.is_some()) {
            if let Some(features) = &self.enabled_features {
                features.encode(enc);
            }
        }
    }
}

impl Decode for DeviceCreateInfo {
    fn decode(dec: &mut Decoder<'_>) -> Self {
        dec.expect_stype(StructureType::DeviceCreateInfo);
        let chain = chain::decode(dec);
        let flags = dec.decode_u32();
        let count = (dec.decode_u32() as u64).min(MAX_CREATE_ENTRIES);
        let len = dec.decode_array_size(count) as usize;
        let queue_create_infos = (0..len)
            .map(|_| DeviceQueueCreateInfo::decode(dec))
            .collect();
        let enabled_extension_names = decode_string_array(dec);
        let enabled_features = if dec.decode_simple_pointer() {
            Some(PhysicalDeviceFeatures::decode(dec))
        } else {
            None
        };
        Self {
            flags,
            queue_create_infos,
            enabled_extension_names,
            enabled_features,
            chain,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::PhysicalDeviceTimelineSemaphoreFeatures;

    #[test]
    fn instance_create_info_with_names_round_trips() {
        let info = InstanceCreateInfo {
            flags: 0,
            application_info: Some(ApplicationInfo {
                application_name: Some("triangle".into()),
                application_version: 1,
                engine_name: None,
                engine_version: 0,
                api_version: crate::make_api_version(1, 2, 0),
            }),
            enabled_layer_names: vec!["VK_LAYER_KHRONOS_validation".into()],
            enabled_extension_names: vec![
                "VK_KHR_get_physical_device_properties2".into(),
            ],
        };

        let mut enc = Encoder::new();
        info.encode(&mut enc);
        assert_eq!(enc.total_len(), info.wire_size());

        let bytes = enc.to_bytes();
        let mut dec = Decoder::new(&bytes);
        let back = InstanceCreateInfo::decode(&mut dec);
        assert!(dec.check().is_ok());
        assert_eq!(back, info);
    }

    #[test]
    fn device_create_info_carries_queues_features_and_chain() {
        let mut features = PhysicalDeviceFeatures::default();
        features.sampler_anisotropy = true;

        let info = DeviceCreateInfo {
            flags: 0,
            queue_create_infos: vec![DeviceQueueCreateInfo {
                flags: 0,
                queue_family_index: 0,
                queue_priorities: vec![1.0, 0.5],
            }],
            enabled_extension_names: vec!["VK_KHR_timeline_semaphore".into()],
            enabled_features: Some(features),
            chain: vec![DeviceCreateInfoExt::TimelineSemaphoreFeatures(
                PhysicalDeviceTimelineSemaphoreFeatures {
                    timeline_semaphore: true,
                },
            )],
        };

        let mut enc = Encoder::new();
        info.encode(&mut enc);
        assert_eq!(enc.total_len(), info.wire_size());

        let bytes = enc.to_bytes();
        let mut dec = Decoder::new(&bytes);
        let back = DeviceCreateInfo::decode(&mut dec);
        assert!(dec.check().is_ok());
        assert_eq!(back, info);
    }

    #[test]
    fn application_info_rejects_a_chain() {
        let mut enc = Encoder::new();
        enc.encode_stype(StructureType::ApplicationInfo);
        enc.encode_simple_pointer(true);
        enc.encode_stype(StructureType::SemaphoreTypeCreateInfo);

        let bytes = enc.to_bytes();
        let mut dec = Decoder::new(&bytes);
        let _ = ApplicationInfo::decode(&mut dec);
        assert!(dec.check().is_err());
    }
}
