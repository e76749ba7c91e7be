//! pNext extension-chain traversal.
//!
//! A chain is encoded head-first and nested: pointer flag, sType, the rest
//! of the chain, then the struct body. On the wire that puts every header
//! before the first body and the bodies in reverse chain order:
//!
//!   ptr sType1 ptr sType2 ... ptr(0) bodyN ... body2 body1
//!
//! The partial ("skeleton") form carries headers only; it is what query
//! commands send so the renderer knows which extension structs to fill.

use crate::cs::{Decoder, Encoder};
use crate::error::StreamError;
use crate::types::{sizes, StructureType};

/// Deeper chains than this are treated as stream corruption.
pub const MAX_CHAIN_DEPTH: usize = 16;

/// One extension struct usable in a particular parent's pNext chain.
/// Implemented by the per-parent chain enums via `pnext_chain!`.
pub trait ChainExt: Sized {
    fn s_type(&self) -> StructureType;
    fn body_size(&self) -> usize;
    fn encode_body(&self, enc: &mut Encoder);
    fn decode_body(stype: StructureType, dec: &mut Decoder<'_>) -> Option<Self>;
    /// Whether `stype` names an extension struct of this chain.
    fn accepts(stype: StructureType) -> bool;
}

pub fn wire_size<T: ChainExt>(chain: &[T]) -> usize {
    chain
        .iter()
        .map(|ext| sizes::simple_pointer() + sizes::scalar_4() + ext.body_size())
        .sum::<usize>()
        + sizes::simple_pointer()
}

pub fn wire_size_partial<T: ChainExt>(chain: &[T]) -> usize {
    chain.len() * (sizes::simple_pointer() + sizes::scalar_4()) + sizes::simple_pointer()
}

pub fn encode<T: ChainExt>(enc: &mut Encoder, chain: &[T]) {
    match chain.split_first() {
        None => enc.encode_chain_terminator(),
        Some((head, rest)) => {
            enc.encode_simple_pointer(true);
            enc.encode_stype(head.s_type());
            encode(enc, rest);
            head.encode_body(enc);
        }
    }
}

/// Headers only; the renderer fills the bodies in its reply.
pub fn encode_partial<T: ChainExt>(enc: &mut Encoder, chain: &[T]) {
    for ext in chain {
        enc.encode_simple_pointer(true);
        enc.encode_stype(ext.s_type());
    }
    enc.encode_chain_terminator();
}

pub fn decode<T: ChainExt>(dec: &mut Decoder<'_>) -> Vec<T> {
    let mut out = Vec::new();
    decode_rec(dec, &mut out, 0);
    // bodies arrive deepest-first
    out.reverse();
    out
}

fn decode_rec<T: ChainExt>(dec: &mut Decoder<'_>, out: &mut Vec<T>, depth: usize) {
    if !dec.decode_simple_pointer() {
        return;
    }
    // the terminator of a full-depth chain arrives at MAX_CHAIN_DEPTH, so
    // the cap applies to headers, checked after the pointer flag
    if depth >= MAX_CHAIN_DEPTH {
        dec.set_error(StreamError::OutOfBounds);
        return;
    }

    let raw = dec.decode_i32();
    if dec.has_error() {
        return;
    }
    let stype = match StructureType::from_raw(raw) {
        Some(stype) => stype,
        None => {
            dec.set_error(StreamError::UnexpectedStructureType(raw));
            return;
        }
    };

    decode_rec(dec, out, depth + 1);
    if dec.has_error() {
        return;
    }

    match T::decode_body(stype, dec) {
        Some(ext) => out.push(ext),
        None => dec.set_error(StreamError::UnexpectedStructureType(raw)),
    }
}

/// Decode a skeleton chain: the list of sTypes a query asks to be filled,
/// in chain order.
pub fn decode_partial<T: ChainExt>(dec: &mut Decoder<'_>) -> Vec<StructureType> {
    let mut out = Vec::new();
    for depth in 0.. {
        if !dec.decode_simple_pointer() {
            break;
        }
        if depth >= MAX_CHAIN_DEPTH {
            dec.set_error(StreamError::OutOfBounds);
            break;
        }
        let raw = dec.decode_i32();
        if dec.has_error() {
            break;
        }
        match StructureType::from_raw(raw).filter(|stype| T::accepts(*stype)) {
            Some(stype) => out.push(stype),
            None => {
                dec.set_error(StreamError::UnexpectedStructureType(raw));
                break;
            }
        }
    }
    out
}

/// Define the chain enum for one parent struct: each variant pairs an
/// extension struct with its sType.
macro_rules! pnext_chain {
    ($(#[$attr:meta])* $vis:vis enum $name:ident {
        $($stype:ident => $variant:ident($ty:ty),)+
    }) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq)]
        $vis enum $name {
            $($variant($ty),)+
        }

        impl $crate::chain::ChainExt for $name {
            fn s_type(&self) -> $crate::types::StructureType {
                match self {
                    $(Self::$variant(_) => $crate::types::StructureType::$stype,)+
                }
            }

            fn body_size(&self) -> usize {
                match self {
                    $(Self::$variant(val) => $crate::types::Encode::wire_size(val),)+
                }
            }

            fn encode_body(&self, enc: &mut $crate::cs::Encoder) {
                match self {
                    $(Self::$variant(val) => $crate::types::Encode::encode(val, enc),)+
                }
            }

            fn decode_body(
                stype: $crate::types::StructureType,
                dec: &mut $crate::cs::Decoder<'_>,
            ) -> Option<Self> {
                match stype {
                    $($crate::types::StructureType::$stype => Some(Self::$variant(
                        <$ty as $crate::types::Decode>::decode(dec),
                    )),)+
                    _ => None,
                }
            }

            fn accepts(stype: $crate::types::StructureType) -> bool {
                matches!(stype, $($crate::types::StructureType::$stype)|+)
            }
        }
    };
}

pub(crate) use pnext_chain;
