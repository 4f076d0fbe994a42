//! Intrinsic operation table
//!
//! Primitive operations lower directly to backend instructions rather than
//! through calls. The opcode space is a data table: adding an opcode is a
//! new row, not a new dispatch arm. Rows without an emitter are declared
//! but unimplemented and fail with `UnsupportedOpcode` when used.

use cranelift_codegen::ir::{self, InstBuilder};
use cranelift_frontend::FunctionBuilder;

use crate::ast::INTRINSIC_PREFIX;
use crate::error::CodegenError;

/// Emits one binary intrinsic from its resolved operands.
type EmitBinary = fn(&mut FunctionBuilder<'_>, ir::Value, ir::Value) -> ir::Value;

/// One row of the intrinsic opcode table.
pub struct IntrinsicDef {
    /// Opcode name with the `intrinsic_` prefix stripped
    pub name: &'static str,
    /// Operand count the opcode expects
    pub arity: usize,
    emit: Option<EmitBinary>,
}

/// The declared opcode space. `add` is implemented; `sub`, `mul`, and
/// `div` are reserved.
pub static INTRINSICS: &[IntrinsicDef] = &[
    IntrinsicDef { name: "add", arity: 2, emit: Some(emit_add) },
    IntrinsicDef { name: "sub", arity: 2, emit: None },
    IntrinsicDef { name: "mul", arity: 2, emit: None },
    IntrinsicDef { name: "div", arity: 2, emit: None },
];

/// Look up an opcode (prefix already stripped) in the table.
pub fn lookup(opcode: &str) -> Option<&'static IntrinsicDef> {
    INTRINSICS.iter().find(|def| def.name == opcode)
}

impl IntrinsicDef {
    /// Emit this intrinsic.
    ///
    /// Reserved rows fail with [`CodegenError::UnsupportedOpcode`].
    pub fn emit(
        &self,
        builder: &mut FunctionBuilder<'_>,
        lhs: ir::Value,
        rhs: ir::Value,
    ) -> Result<ir::Value, CodegenError> {
        match self.emit {
            Some(emit) => Ok(emit(builder, lhs, rhs)),
            None => Err(CodegenError::UnsupportedOpcode(format!(
                "{INTRINSIC_PREFIX}{}",
                self.name
            ))),
        }
    }
}

/// Integer or float addition, picked from the left operand's IR type.
fn emit_add(builder: &mut FunctionBuilder<'_>, lhs: ir::Value, rhs: ir::Value) -> ir::Value {
    if builder.func.dfg.value_type(lhs).is_float() {
        builder.ins().fadd(lhs, rhs)
    } else {
        builder.ins().iadd(lhs, rhs)
    }
}
