//! Render pass 2 structs.
//!
//! Every constituent of VkRenderPassCreateInfo2 carries its own sType and
//! chain position, so each is a full chained struct even when no extension
//! is defined for it in the covered set.

use crate::cs::{Decoder, Encoder};
use crate::error::StreamError;
use crate::types::{sizes, Decode, Encode, StructureType};

/// Attachment/subpass/dependency arrays beyond this are stream corruption.
const MAX_RENDER_PASS_ENTRIES: u64 = 1024;

pub const ATTACHMENT_UNUSED: u32 = u32::MAX;

fn encode_empty_chain(enc: &mut Encoder, stype: StructureType) {
    enc.encode_stype(stype);
    enc.encode_chain_terminator();
}

fn decode_empty_chain(dec: &mut Decoder<'_>, stype: StructureType) {
    dec.expect_stype(stype);
    if dec.decode_simple_pointer() {
        let raw = dec.decode_i32();
        dec.set_error(StreamError::UnexpectedStructureType(raw));
    }
}

const EMPTY_CHAIN_SIZE: usize = 4 + 8; // sType + null pNext

/// VkAttachmentDescription2.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AttachmentDescription2 {
    pub flags: u32,
    pub format: i32,
    pub samples: i32,
    pub load_op: i32,
    pub store_op: i32,
    pub stencil_load_op: i32,
    pub stencil_store_op: i32,
    pub initial_layout: i32,
    pub final_layout: i32,
}

impl Encode for AttachmentDescription2 {
    fn wire_size(&self) -> usize {
        EMPTY_CHAIN_SIZE + 9 * sizes::scalar_4()
    }

    fn encode(&self, enc: &mut Encoder) {
        encode_empty_chain(enc, StructureType::AttachmentDescription2);
        enc.encode_u32(self.flags);
        enc.encode_i32(self.format);
        enc.encode_i32(self.samples);
        enc.encode_i32(self.load_op);
        enc.encode_i32(self.store_op);
        enc.encode_i32(self.stencil_load_op);
        enc.encode_i32(self.stencil_store_op);
        enc.encode_i32(self.initial_layout);
        enc.encode_i32(self.final_layout);
    }
}

impl Decode for AttachmentDescription2 {
    fn decode(dec: &mut Decoder<'_>) -> Self {
        decode_empty_chain(dec, StructureType::AttachmentDescription2);
        Self {
            flags: dec.decode_u32(),
            format: dec.decode_i32(),
            samples: dec.decode_i32(),
            load_op: dec.decode_i32(),
            store_op: dec.decode_i32(),
            stencil_load_op: dec.decode_i32(),
            stencil_store_op: dec.decode_i32(),
            initial_layout: dec.decode_i32(),
            final_layout: dec.decode_i32(),
        }
    }
}

/// VkAttachmentReference2.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttachmentReference2 {
    pub attachment: u32,
    pub layout: i32,
    pub aspect_mask: u32,
}

impl Default for AttachmentReference2 {
    fn default() -> Self {
        Self {
            attachment: ATTACHMENT_UNUSED,
            layout: 0,
            aspect_mask: 0,
        }
    }
}

impl Encode for AttachmentReference2 {
    fn wire_size(&self) -> usize {
        EMPTY_CHAIN_SIZE + 3 * sizes::scalar_4()
    }

    fn encode(&self, enc: &mut Encoder) {
        encode_empty_chain(enc, StructureType::AttachmentReference2);
        enc.encode_u32(self.attachment);
        enc.encode_i32(self.layout);
        enc.encode_u32(self.aspect_mask);
    }
}

impl Decode for AttachmentReference2 {
    fn decode(dec: &mut Decoder<'_>) -> Self {
        decode_empty_chain(dec, StructureType::AttachmentReference2);
        Self {
            attachment: dec.decode_u32(),
            layout: dec.decode_i32(),
            aspect_mask: dec.decode_u32(),
        }
    }
}

fn encode_reference_array(enc: &mut Encoder, refs: &[AttachmentReference2]) {
    enc.encode_array_size(refs.len() as u64);
    for r in refs {
        r.encode(enc);
    }
}

fn decode_reference_array(dec: &mut Decoder<'_>, max: u64) -> Vec<AttachmentReference2> {
    let len = dec.decode_array_size(max) as usize;
    (0..len).map(|_| AttachmentReference2::decode(dec)).collect()
}

fn reference_array_size(refs: &[AttachmentReference2]) -> usize {
    sizes::array_size() + refs.iter().map(Encode::wire_size).sum::<usize>()
}

/// VkSubpassDescription2. The resolve and depth-stencil attachments are
/// optional single structs, encoded behind simple pointers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubpassDescription2 {
    pub flags: u32,
    pub pipeline_bind_point: i32,
    pub view_mask: u32,
    pub input_attachments: Vec<AttachmentReference2>,
    pub color_attachments: Vec<AttachmentReference2>,
    pub resolve_attachments: Vec<AttachmentReference2>,
    pub depth_stencil_attachment: Option<AttachmentReference2>,
    pub preserve_attachments: Vec<u32>,
}

impl Encode for SubpassDescription2 {
    fn wire_size(&self) -> usize {
        EMPTY_CHAIN_SIZE
            + 3 * sizes::scalar_4()
            + sizes::scalar_4()
            + reference_array_size(&self.input_attachments)
            + sizes::scalar_4()
            + reference_array_size(&self.color_attachments)
            + reference_array_size(&self.resolve_attachments)
            + sizes::simple_pointer()
            + self
                .depth_stencil_attachment
                .as_ref()
                .map_or(0, Encode::wire_size)
            + sizes::scalar_4()
            + sizes::array_size()
            + sizes::u32_array(self.preserve_attachments.len())
    }

    fn encode(&self, enc: &mut Encoder) {
        encode_empty_chain(enc, StructureType::SubpassDescription2);
        enc.encode_u32(self.flags);
        enc.encode_i32(self.pipeline_bind_point);
        enc.encode_u32(self.view_mask);

        enc.encode_u32(self.input_attachments.len() as u32);
        encode_reference_array(enc, &self.input_attachments);

        enc.encode_u32(self.color_attachments.len() as u32);
        encode_reference_array(enc, &self.color_attachments);
        // the resolve array, when present, matches colorAttachmentCount
        encode_reference_array(enc, &self.resolve_attachments);

        if enc.encode_simple_pointer(self.depth_stencil_attachment.is_some()) {
            if let Some(ds) = &self.depth_stencil_attachment {
                ds.encode(enc);
            }
        }

        enc.encode_u32(self.preserve_attachments.len() as u32);
        enc.encode_array_size(self.preserve_attachments.len() as u64);
        enc.encode_u32_array(&self.preserve_attachments);
    }
}

impl Decode for SubpassDescription2 {
    fn decode(dec: &mut Decoder<'_>) -> Self {
        decode_empty_chain(dec, StructureType::SubpassDescription2);
        let flags = dec.decode_u32();
        let pipeline_bind_point = dec.decode_i32();
        let view_mask = dec.decode_u32();

        let input_count = (dec.decode_u32() as u64).min(MAX_RENDER_PASS_ENTRIES);
        let input_attachments = decode_reference_array(dec, input_count);

        let color_count = (dec.decode_u32() as u64).min(MAX_RENDER_PASS_ENTRIES);
        let color_attachments = decode_reference_array(dec, color_count);
        let resolve_attachments = decode_reference_array(dec, color_count);

        let depth_stencil_attachment = if dec.decode_simple_pointer() {
            Some(AttachmentReference2::decode(dec))
        } else {
            None
        };

        let preserve_count = (dec.decode_u32() as u64).min(MAX_RENDER_PASS_ENTRIES);
        let len = dec.decode_array_size(preserve_count) as usize;
        let preserve_attachments = dec.decode_u32_array(len);

        Self {
            flags,
            pipeline_bind_point,
            view_mask,
            input_attachments,
            color_attachments,
            resolve_attachments,
            depth_stencil_attachment,
            preserve_attachments,
        }
    }
}

/// VkSubpassDependency2.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SubpassDependency2 {
    pub src_subpass: u32,
    pub dst_subpass: u32,
    pub src_stage_mask: u32,
    pub dst_stage_mask: u32,
    pub src_access_mask: u32,
    pub dst_access_mask: u32,
    pub dependency_flags: u32,
    pub view_offset: i32,
}

impl Encode for SubpassDependency2 {
    fn wire_size(&self) -> usize {
        EMPTY_CHAIN_SIZE + 8 * sizes::scalar_4()
    }

    fn encode(&self, enc: &mut Encoder) {
        encode_empty_chain(enc, StructureType::SubpassDependency2);
        enc.encode_u32(self.src_subpass);
        enc.encode_u32(self.dst_subpass);
        enc.encode_u32(self.src_stage_mask);
        enc.encode_u32(self.dst_stage_mask);
        enc.encode_u32(self.src_access_mask);
        enc.encode_u32(self.dst_access_mask);
        enc.encode_u32(self.dependency_flags);
        enc.encode_i32(self.view_offset);
    }
}

impl Decode for SubpassDependency2 {
    fn decode(dec: &mut Decoder<'_>) -> Self {
        decode_empty_chain(dec, StructureType::SubpassDependency2);
        Self {
            src_subpass: dec.decode_u32(),
            dst_subpass: dec.decode_u32(),
            src_stage_mask: dec.decode_u32(),
            dst_stage_mask: dec.decode_u32(),
            src_access_mask: dec.decode_u32(),
            dst_access_mask: dec.decode_u32(),
            dependency_flags: dec.decode_u32(),
            view_offset: dec.decode_i32(),
        }
    }
}

/// VkRenderPassCreateInfo2.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderPassCreateInfo2 {
    pub flags: u32,
    pub attachments: Vec<AttachmentDescription2>,
    pub subpasses: Vec<SubpassDescription2>,
    pub dependencies: Vec<SubpassDependency2>,
    pub correlated_view_masks: Vec<u32>,
}

impl Encode for RenderPassCreateInfo2 {
    fn wire_size(&self) -> usize {
        EMPTY_CHAIN_SIZE
            + sizes::scalar_4()
            + sizes::scalar_4()
            + sizes::array_size()
            + self.attachments.iter().map(Encode::wire_size).sum::<usize>()
            + sizes::scalar_4()
            + sizes::array_size()
            + self.subpasses.iter().map(Encode::wire_size).sum::<usize>()
            + sizes::scalar_4()
            + sizes::array_size()
            + self.dependencies.iter().map(Encode::wire_size).sum::<usize>()
            + sizes::scalar_4()
            + sizes::array_size()
            + sizes::u32_array(self.correlated_view_masks.len())
    }

    fn encode(&self, enc: &mut Encoder) {
        encode_empty_chain(enc, StructureType::RenderPassCreateInfo2);
        enc.encode_u32(self.flags);

        enc.encode_u32(self.attachments.len() as u32);
        enc.encode_array_size(self.attachments.len() as u64);
        for att in &self.attachments {
            att.encode(enc);
        }

        enc.encode_u32(self.subpasses.len() as u32);
        enc.encode_array_size(self.subpasses.len() as u64);
        for subpass in &self.subpasses {
            subpass.encode(enc);
        }

        enc.encode_u32(self.dependencies.len() as u32);
        enc.encode_array_size(self.dependencies.len() as u64);
        for dep in &self.dependencies {
            dep.encode(enc);
        }

        enc.encode_u32(self.correlated_view_masks.len() as u32);
        enc.encode_array_size(self.correlated_view_masks.len() as u64);
        enc.encode_u32_array(&self.correlated_view_masks);
    }
}

impl Decode for RenderPassCreateInfo2 {
    fn decode(dec: &mut Decoder<'_>) -> Self {
        decode_empty_chain(dec, StructureType::RenderPassCreateInfo2);
        let flags = dec.decode_u32();

        let count = (dec.decode_u32() as u64).min(MAX_RENDER_PASS_ENTRIES);
        let len = dec.decode_array_size(count) as usize;
        let attachments = (0..len)
            .map(|_| AttachmentDescription2::decode(dec))
            .collect();

        let count = (dec.decode_u32() as u64).min(MAX_RENDER_PASS_ENTRIES);
        let len = dec.decode_array_size(count) as usize;
        let subpasses = (0..len).map(|_| SubpassDescription2::decode(dec)).collect();

        let count = (dec.decode_u32() as u64).min(MAX_RENDER_PASS_ENTRIES);
        let len = dec.decode_array_size(count) as usize;
        let dependencies = (0..len).map(|_| SubpassDependency2::decode(dec)).collect();

        let count = (dec.decode_u32() as u64).min(MAX_RENDER_PASS_ENTRIES);
        let len = dec.decode_array_size(count) as usize;
        let correlated_view_masks = dec.decode_u32_array(len);

        Self {
            flags,
            attachments,
            subpasses,
            dependencies,
            correlated_view_masks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn color_pass() -> RenderPassCreateInfo2 {
        RenderPassCreateInfo2 {
            flags: 0,
            attachments: vec![AttachmentDescription2 {
                format: 44, // B8G8R8A8_UNORM
                samples: 1,
                load_op: 1,
                store_op: 0,
                final_layout: 2,
                ..Default::default()
            }],
            subpasses: vec![SubpassDescription2 {
                pipeline_bind_point: 0,
                color_attachments: vec![AttachmentReference2 {
                    attachment: 0,
                    layout: 2,
                    aspect_mask: 0x1,
                }],
                ..Default::default()
            }],
            dependencies: vec![SubpassDependency2 {
                src_subpass: ATTACHMENT_UNUSED,
                dst_subpass: 0,
                src_stage_mask: 0x400,
                dst_stage_mask: 0x400,
                dst_access_mask: 0x100,
                ..Default::default()
            }],
            correlated_view_masks: Vec::new(),
        }
    }

    #[test]
    fn render_pass2_wire_size_matches_emission() {
        let info = color_pass();
        let mut enc = Encoder::new();
        info.encode(&mut enc);
        assert_eq!(enc.total_len(), info.wire_size());
    }

    #[test]
    fn render_pass2_decodes_nested_stypes() {
        let info = color_pass();
        let mut enc = Encoder::new();
        info.encode(&mut enc);

        let bytes = enc.to_bytes();
        let mut dec = Decoder::new(&bytes);
        let back = RenderPassCreateInfo2::decode(&mut dec);
        assert!(dec.check().is_ok());
        assert_eq!(back, info);
    }

    #[test]
    fn subpass_without_depth_stencil_encodes_null_pointer() {
        let subpass = SubpassDescription2::default();
        let mut enc = Encoder::new();
        subpass.encode(&mut enc);
        assert_eq!(enc.total_len(), subpass.wire_size());

        let bytes = enc.to_bytes();
        let mut dec = Decoder::new(&bytes);
        let back = SubpassDescription2::decode(&mut dec);
        assert!(dec.check().is_ok());
        assert!(back.depth_stencil_attachment.is_none());
    }

    #[test]
    fn mislabeled_constituent_poisons_the_stream() {
        // an AttachmentReference2 where a description belongs
        let mut enc = Encoder::new();
        encode_empty_chain(&mut enc, StructureType::RenderPassCreateInfo2);
        enc.encode_u32(0); // flags
        enc.encode_u32(1);
        enc.encode_array_size(1);
        AttachmentReference2::default().encode(&mut enc);

        let bytes = enc.to_bytes();
        let mut dec = Decoder::new(&bytes);
        let _ = RenderPassCreateInfo2::decode(&mut dec);
        assert!(matches!(
            dec.check(),
            Err(StreamError::UnexpectedStructureType(_))
        ));
    }
}
