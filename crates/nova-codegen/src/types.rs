//! Type-token resolution
//!
//! Maps the AST's type-token vocabulary onto abstract target types. The
//! machine-word tokens (`isize`, `isize*`) size to the host's native word
//! width, taken from the native ISA, so output for these tokens differs
//! between 32- and 64-bit hosts.

use std::fmt;

use cranelift_codegen::ir::{self, types};

use crate::error::CodegenError;

/// Abstract target type produced by [`resolve_type`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    /// Machine-word-width signed integer (`isize`)
    MachineInt,
    /// Pointer to a machine-word-width integer (`isize*`)
    MachineIntPtr,
    /// 64-bit integer (`int64`)
    Int64,
    /// IEEE half-precision float (`f16`)
    Float16,
    /// IEEE single-precision float (`f32`)
    Float32,
    /// IEEE double-precision float (`f64`)
    Float64,
    /// No value (`void`)
    Void,
}

impl TypeTag {
    /// The token this tag resolves from.
    pub fn token(self) -> &'static str {
        match self {
            TypeTag::MachineInt => "isize",
            TypeTag::MachineIntPtr => "isize*",
            TypeTag::Int64 => "int64",
            TypeTag::Float16 => "f16",
            TypeTag::Float32 => "f32",
            TypeTag::Float64 => "f64",
            TypeTag::Void => "void",
        }
    }

    /// The Cranelift type this tag lowers to, given the host pointer type.
    ///
    /// `Void` has no value type. Memory addresses are integers in Cranelift
    /// IR, so `isize*` lowers to the pointer-width integer type as well.
    pub fn clif(self, pointer: ir::Type) -> Option<ir::Type> {
        match self {
            TypeTag::MachineInt | TypeTag::MachineIntPtr => Some(pointer),
            TypeTag::Int64 => Some(types::I64),
            TypeTag::Float16 => Some(types::F16),
            TypeTag::Float32 => Some(types::F32),
            TypeTag::Float64 => Some(types::F64),
            TypeTag::Void => None,
        }
    }

    /// Whether this is the void tag.
    pub fn is_void(self) -> bool {
        matches!(self, TypeTag::Void)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Resolve a type token to its [`TypeTag`].
///
/// Tokens outside the fixed vocabulary fail with
/// [`CodegenError::UnknownType`].
pub fn resolve_type(token: &str) -> Result<TypeTag, CodegenError> {
    match token {
        "isize" => Ok(TypeTag::MachineInt),
        "isize*" => Ok(TypeTag::MachineIntPtr),
        "int64" => Ok(TypeTag::Int64),
        "f16" => Ok(TypeTag::Float16),
        "f32" => Ok(TypeTag::Float32),
        "f64" => Ok(TypeTag::Float64),
        "void" => Ok(TypeTag::Void),
        _ => Err(CodegenError::UnknownType(token.to_string())),
    }
}

/// Narrow an `f32` to IEEE half-precision bits, round-to-nearest-even.
///
/// Cranelift's `Ieee16` immediate is bit-level only and the Rust `f16`
/// primitive is not yet stable, so the narrowing is done by hand.
pub(crate) fn half_bits(value: f32) -> u16 {
    let bits = value.to_bits();
    let sign = ((bits >> 16) & 0x8000) as u16;
    let exp = ((bits >> 23) & 0xff) as i32;
    let mant = bits & 0x007f_ffff;

    if exp == 0xff {
        // Inf / NaN; NaN payloads are truncated but kept quiet
        let payload = if mant != 0 { 0x0200 | ((mant >> 13) as u16 & 0x03ff) } else { 0 };
        return sign | 0x7c00 | payload;
    }

    let unbiased = exp - 127;
    if unbiased >= 16 {
        return sign | 0x7c00;
    }
    if unbiased < -25 {
        return sign;
    }

    // Normal results keep 10 of the 23 mantissa bits; subnormal results
    // also shift out the now-explicit leading 1.
    let (significand, shift) = if unbiased >= -14 {
        (mant, 13u32)
    } else {
        (mant | 0x0080_0000, (-1 - unbiased) as u32)
    };
    let base = if unbiased >= -14 {
        sign as u32 | (((unbiased + 15) as u32) << 10)
    } else {
        sign as u32
    };

    let m = significand >> shift;
    let rem = significand & ((1 << shift) - 1);
    let halfway = 1u32 << (shift - 1);
    let mut out = base | m;
    if rem > halfway || (rem == halfway && (m & 1) != 0) {
        out += 1; // may carry into the exponent, up to infinity
    }
    out as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_full_vocabulary() {
        assert_eq!(resolve_type("isize").unwrap(), TypeTag::MachineInt);
        assert_eq!(resolve_type("isize*").unwrap(), TypeTag::MachineIntPtr);
        assert_eq!(resolve_type("int64").unwrap(), TypeTag::Int64);
        assert_eq!(resolve_type("f16").unwrap(), TypeTag::Float16);
        assert_eq!(resolve_type("f32").unwrap(), TypeTag::Float32);
        assert_eq!(resolve_type("f64").unwrap(), TypeTag::Float64);
        assert_eq!(resolve_type("void").unwrap(), TypeTag::Void);
    }

    #[test]
    fn rejects_unknown_tokens() {
        assert!(matches!(
            resolve_type("int32"),
            Err(CodegenError::UnknownType(token)) if token == "int32"
        ));
        assert!(matches!(resolve_type(""), Err(CodegenError::UnknownType(_))));
    }

    #[test]
    fn machine_tags_follow_pointer_width() {
        assert_eq!(TypeTag::MachineInt.clif(types::I64), Some(types::I64));
        assert_eq!(TypeTag::MachineInt.clif(types::I32), Some(types::I32));
        assert_eq!(TypeTag::MachineIntPtr.clif(types::I64), Some(types::I64));
        assert_eq!(TypeTag::Int64.clif(types::I32), Some(types::I64));
        assert_eq!(TypeTag::Float16.clif(types::I64), Some(types::F16));
        assert_eq!(TypeTag::Void.clif(types::I64), None);
    }

    #[test]
    fn half_bits_round_trips_simple_values() {
        assert_eq!(half_bits(0.0), 0x0000);
        assert_eq!(half_bits(-0.0), 0x8000);
        assert_eq!(half_bits(1.0), 0x3c00);
        assert_eq!(half_bits(0.5), 0x3800);
        assert_eq!(half_bits(-2.0), 0xc000);
        assert_eq!(half_bits(65504.0), 0x7bff); // largest finite f16
    }

    #[test]
    fn half_bits_handles_edges() {
        // Above the largest finite f16, rounds to infinity
        assert_eq!(half_bits(65520.0), 0x7c00);
        assert_eq!(half_bits(f32::INFINITY), 0x7c00);
        assert_eq!(half_bits(f32::NEG_INFINITY), 0xfc00);
        // Smallest subnormal: 2^-24
        assert_eq!(half_bits(5.9604645e-8), 0x0001);
        // Underflow to zero
        assert_eq!(half_bits(1.0e-10), 0x0000);
        // NaN stays NaN and quiet
        let nan = half_bits(f32::NAN);
        assert_eq!(nan & 0x7c00, 0x7c00);
        assert_ne!(nan & 0x03ff, 0);
    }
}
