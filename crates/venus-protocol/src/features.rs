//! Physical-device feature structs.
//!
//! These are pure output structs: the driver queries them with a partial
//! encode (sType plus chain skeleton) and decodes the renderer's full
//! reply. The field lists are transcribed from the Vulkan registry
//! verbatim; every member is a Bool32 occupying 4 wire bytes.

use crate::chain::{self, pnext_chain};
use crate::cs::{Decoder, Encoder};
use crate::extensions::Capabilities;
use crate::types::{sizes, Decode, Encode, EncodePartial, StructureType};

/// All-Bool32 struct transcription: field order is wire order.
macro_rules! bool32_struct {
    ($(#[$attr:meta])* $vis:vis struct $name:ident {
        $($field:ident,)+
    }) => {
        $(#[$attr])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
        $vis struct $name {
            $(pub $field: bool,)+
        }

        impl Encode for $name {
            fn wire_size(&self) -> usize {
                [$(stringify!($field),)+].len() * sizes::scalar_4()
            }

            fn encode(&self, enc: &mut Encoder) {
                $(enc.encode_bool32(self.$field);)+
            }
        }

        impl Decode for $name {
            fn decode(dec: &mut Decoder<'_>) -> Self {
                Self {
                    $($field: dec.decode_bool32(),)+
                }
            }
        }
    };
}

bool32_struct! {
    /// VkPhysicalDeviceFeatures, all 55 members.
    pub struct PhysicalDeviceFeatures {
        robust_buffer_access,
        full_draw_index_uint32,
        image_cube_array,
        independent_blend,
        geometry_shader,
        tessellation_shader,
        sample_rate_shading,
        dual_src_blend,
        logic_op,
        multi_draw_indirect,
        draw_indirect_first_instance,
        depth_clamp,
        depth_bias_clamp,
        fill_mode_non_solid,
        depth_bounds,
        wide_lines,
        large_points,
        alpha_to_one,
        multi_viewport,
        sampler_anisotropy,
        texture_compression_etc2,
        texture_compression_astc_ldr,
        texture_compression_bc,
        occlusion_query_precise,
        pipeline_statistics_query,
        vertex_pipeline_stores_and_atomics,
        fragment_stores_and_atomics,
        shader_tessellation_and_geometry_point_size,
        shader_image_gather_extended,
        shader_storage_image_extended_formats,
        shader_storage_image_multisample,
        shader_storage_image_read_without_format,
        shader_storage_image_write_without_format,
        shader_uniform_buffer_array_dynamic_indexing,
        shader_sampled_image_array_dynamic_indexing,
        shader_storage_buffer_array_dynamic_indexing,
        shader_storage_image_array_dynamic_indexing,
        shader_clip_distance,
        shader_cull_distance,
        shader_float64,
        shader_int64,
        shader_int16,
        shader_resource_residency,
        shader_resource_min_lod,
        sparse_binding,
        sparse_residency_buffer,
        sparse_residency_image2d,
        sparse_residency_image3d,
        sparse_residency2_samples,
        sparse_residency4_samples,
        sparse_residency8_samples,
        sparse_residency16_samples,
        sparse_residency_aliased,
        variable_multisample_rate,
        inherited_queries,
    }
}

bool32_struct! {
    /// VkPhysicalDeviceVulkan11Features.
    pub struct PhysicalDeviceVulkan11Features {
        storage_buffer_16bit_access,
        uniform_and_storage_buffer_16bit_access,
        storage_push_constant16,
        storage_input_output16,
        multiview,
        multiview_geometry_shader,
        multiview_tessellation_shader,
        variable_pointers_storage_buffer,
        variable_pointers,
        protected_memory,
        sampler_ycbcr_conversion,
        shader_draw_parameters,
    }
}

bool32_struct! {
    /// VkPhysicalDeviceTimelineSemaphoreFeatures.
    pub struct PhysicalDeviceTimelineSemaphoreFeatures {
        timeline_semaphore,
    }
}

bool32_struct! {
    /// VkPhysicalDeviceDescriptorIndexingFeatures.
    pub struct PhysicalDeviceDescriptorIndexingFeatures {
        shader_input_attachment_array_dynamic_indexing,
        shader_uniform_texel_buffer_array_dynamic_indexing,
        shader_storage_texel_buffer_array_dynamic_indexing,
        shader_uniform_buffer_array_non_uniform_indexing,
        shader_sampled_image_array_non_uniform_indexing,
        shader_storage_buffer_array_non_uniform_indexing,
        shader_storage_image_array_non_uniform_indexing,
        shader_input_attachment_array_non_uniform_indexing,
        shader_uniform_texel_buffer_array_non_uniform_indexing,
        shader_storage_texel_buffer_array_non_uniform_indexing,
        descriptor_binding_uniform_buffer_update_after_bind,
        descriptor_binding_sampled_image_update_after_bind,
        descriptor_binding_storage_image_update_after_bind,
        descriptor_binding_storage_buffer_update_after_bind,
        descriptor_binding_uniform_texel_buffer_update_after_bind,
        descriptor_binding_storage_texel_buffer_update_after_bind,
        descriptor_binding_update_unused_while_pending,
        descriptor_binding_partially_bound,
        descriptor_binding_variable_descriptor_count,
        runtime_descriptor_array,
    }
}

pnext_chain! {
    /// Extension structs accepted in a VkPhysicalDeviceFeatures2 chain.
    pub enum PhysicalDeviceFeatures2Ext {
        PhysicalDeviceVulkan11Features => Vulkan11(PhysicalDeviceVulkan11Features),
        PhysicalDeviceTimelineSemaphoreFeatures =>
            TimelineSemaphore(PhysicalDeviceTimelineSemaphoreFeatures),
        PhysicalDeviceDescriptorIndexingFeatures =>
            DescriptorIndexing(PhysicalDeviceDescriptorIndexingFeatures),
    }
}

/// VkPhysicalDeviceFeatures2.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhysicalDeviceFeatures2 {
    pub features: PhysicalDeviceFeatures,
    pub chain: Vec<PhysicalDeviceFeatures2Ext>,
}

impl PhysicalDeviceFeatures2 {
    /// Build the query template for a features2 request: chain one
    /// default-initialized extension struct per requested sType.
    pub fn query(requested: &[StructureType]) -> Self {
        let chain = requested
            .iter()
            .filter_map(|stype| match stype {
                StructureType::PhysicalDeviceVulkan11Features => Some(
                    PhysicalDeviceFeatures2Ext::Vulkan11(Default::default()),
                ),
                StructureType::PhysicalDeviceTimelineSemaphoreFeatures => Some(
                    PhysicalDeviceFeatures2Ext::TimelineSemaphore(Default::default()),
                ),
                StructureType::PhysicalDeviceDescriptorIndexingFeatures => Some(
                    PhysicalDeviceFeatures2Ext::DescriptorIndexing(Default::default()),
                ),
                _ => None,
            })
            .collect();
        Self {
            features: Default::default(),
            chain,
        }
    }

    /// Query template gated by negotiated capabilities: only feature
    /// structs the renderer agreed to serialize get chained.
    pub fn query_negotiated(caps: &Capabilities) -> Self {
        Self::query(&caps.feature_query_stypes())
    }

    /// Renderer side of a features2 query: the sTypes the driver asked
    /// to be filled.
    pub fn decode_query(dec: &mut Decoder<'_>) -> Vec<StructureType> {
        dec.expect_stype(StructureType::PhysicalDeviceFeatures2);
        chain::decode_partial::<PhysicalDeviceFeatures2Ext>(dec)
    }
}

impl Encode for PhysicalDeviceFeatures2 {
    fn wire_size(&self) -> usize {
        sizes::scalar_4() + chain::wire_size(&self.chain) + self.features.wire_size()
    }

    fn encode(&self, enc: &mut Encoder) {
        enc.encode_stype(StructureType::PhysicalDeviceFeatures2);
        chain::encode(enc, &self.chain);
        self.features.encode(enc);
    }
}

impl EncodePartial for PhysicalDeviceFeatures2 {
    fn wire_size_partial(&self) -> usize {
        sizes::scalar_4() + chain::wire_size_partial(&self.chain)
    }

    fn encode_partial(&self, enc: &mut Encoder) {
        enc.encode_stype(StructureType::PhysicalDeviceFeatures2);
        chain::encode_partial(enc, &self.chain);
    }
}

impl Decode for PhysicalDeviceFeatures2 {
    fn decode(dec: &mut Decoder<'_>) -> Self {
        dec.expect_stype(StructureType::PhysicalDeviceFeatures2);
        let chain = chain::decode(dec);
        let features = PhysicalDeviceFeatures::decode(dec);
        Self { features, chain }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn features_occupy_55_dwords() {
        let features = PhysicalDeviceFeatures::default();
        assert_eq!(features.wire_size(), 55 * 4);
    }

    #[test]
    fn features2_survives_the_wire_with_a_full_chain() {
        let mut features = PhysicalDeviceFeatures::default();
        features.geometry_shader = true;
        features.inherited_queries = true;

        let full = PhysicalDeviceFeatures2 {
            features,
            chain: vec![
                PhysicalDeviceFeatures2Ext::Vulkan11(PhysicalDeviceVulkan11Features {
                    multiview: true,
                    ..Default::default()
                }),
                PhysicalDeviceFeatures2Ext::TimelineSemaphore(
                    PhysicalDeviceTimelineSemaphoreFeatures {
                        timeline_semaphore: true,
                    },
                ),
            ],
        };

        let mut enc = Encoder::new();
        full.encode(&mut enc);
        assert_eq!(enc.total_len(), full.wire_size());

        let bytes = enc.to_bytes();
        let mut dec = Decoder::new(&bytes);
        let back = PhysicalDeviceFeatures2::decode(&mut dec);
        assert!(dec.check().is_ok());
        assert_eq!(back, full);
    }

    #[test]
    fn query_encodes_skeleton_only() {
        let query = PhysicalDeviceFeatures2::query(&[
            StructureType::PhysicalDeviceVulkan11Features,
            StructureType::PhysicalDeviceDescriptorIndexingFeatures,
        ]);
        assert_eq!(query.chain.len(), 2);

        let mut enc = Encoder::new();
        query.encode_partial(&mut enc);
        assert_eq!(enc.total_len(), query.wire_size_partial());
        // no feature payload crosses the wire in the request
        assert!(query.wire_size_partial() < query.wire_size());

        let bytes = enc.to_bytes();
        let mut dec = Decoder::new(&bytes);
        let requested = PhysicalDeviceFeatures2::decode_query(&mut dec);
        assert!(dec.check().is_ok());
        assert_eq!(
            requested,
            vec![
                StructureType::PhysicalDeviceVulkan11Features,
                StructureType::PhysicalDeviceDescriptorIndexingFeatures,
            ]
        );
    }

    #[test]
    fn query_skips_stypes_that_are_not_feature_structs() {
        let query = PhysicalDeviceFeatures2::query(&[
            StructureType::MemoryDedicatedRequirements,
            StructureType::PhysicalDeviceVulkan11Features,
        ]);
        assert_eq!(query.chain.len(), 1);
    }

    #[test]
    fn negotiated_query_drops_unagreed_feature_structs() {
        use crate::extensions::{Extension, ExtensionMask};

        // renderer stuck on 1.0 with descriptor indexing only
        let mut remote_exts = ExtensionMask::new();
        remote_exts.insert(Extension::ExtDescriptorIndexing);
        let remote = Capabilities {
            vk_xml_version: crate::make_api_version(1, 0, 0),
            extensions: remote_exts,
            ..Capabilities::local()
        };
        let agreed = Capabilities::local().negotiate(&remote).unwrap();

        let query = PhysicalDeviceFeatures2::query_negotiated(&agreed);
        assert_eq!(query.chain.len(), 1);
        assert!(matches!(
            query.chain[0],
            PhysicalDeviceFeatures2Ext::DescriptorIndexing(_)
        ));
    }
}
