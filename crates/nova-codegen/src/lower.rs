//! Per-function lowering
//!
//! Walks a function body statement by statement, resolving operands against
//! the parameter list and symbol table and emitting instructions through
//! the Cranelift `FunctionBuilder`. The first error aborts the function;
//! no invalid value handle ever flows into a later instruction.

use cranelift_codegen::ir::immediates::Ieee16;
use cranelift_codegen::ir::{self, InstBuilder};
use cranelift_frontend::FunctionBuilder;
use cranelift_module::FuncId;
use rustc_hash::FxHashMap;

use crate::ast::{Operand, Stmt, INTRINSIC_PREFIX};
use crate::error::CodegenError;
use crate::intrinsics;
use crate::module::FunctionRegistry;
use crate::symbols::SymbolTable;
use crate::types::{half_bits, TypeTag};

/// Lowering state for a single function body.
pub(crate) struct FunctionLowering<'a> {
    /// Function name, for diagnostics
    name: &'a str,
    /// Entry-block values of the function's parameters, in order
    params: Vec<ir::Value>,
    /// Declared return type
    ret: TypeTag,
    /// Host pointer type (the width of `isize`)
    pointer: ir::Type,
    /// Per-function result bindings
    symbols: SymbolTable,
    /// Imported `FuncRef`s, one per callee this function uses
    func_refs: FxHashMap<FuncId, ir::FuncRef>,
    /// Set once the return statement has been lowered
    terminated: bool,
}

impl<'a> FunctionLowering<'a> {
    pub(crate) fn new(
        name: &'a str,
        params: Vec<ir::Value>,
        ret: TypeTag,
        pointer: ir::Type,
    ) -> Self {
        FunctionLowering {
            name,
            params,
            ret,
            pointer,
            symbols: SymbolTable::new(),
            func_refs: FxHashMap::default(),
            terminated: false,
        }
    }

    /// Whether the body's return has been emitted.
    pub(crate) fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Dispatch one classified statement.
    pub(crate) fn lower_statement(
        &mut self,
        builder: &mut FunctionBuilder<'_>,
        registry: &FunctionRegistry,
        stmt: &Stmt,
    ) -> Result<(), CodegenError> {
        if self.terminated {
            return Err(CodegenError::UnreachableStatement(stmt.kind_name()));
        }
        match stmt {
            Stmt::Discard(operand) => {
                // Standalone value expression: evaluated, result discarded.
                self.resolve_operand(builder, operand)?;
            }
            Stmt::Intrinsic { opcode, reference, arguments } => {
                self.lower_intrinsic(builder, opcode, reference.as_deref(), arguments)?;
            }
            Stmt::Call { callee, reference, arguments } => {
                self.lower_call(builder, registry, callee, reference.as_deref(), arguments)?;
            }
            Stmt::Return { expression } => {
                self.lower_return(builder, expression.as_ref())?;
            }
        }
        Ok(())
    }

    // ---- operand resolution ----

    /// Resolve an operand to the IR value it denotes.
    pub(crate) fn resolve_operand(
        &mut self,
        builder: &mut FunctionBuilder<'_>,
        operand: &Operand,
    ) -> Result<ir::Value, CodegenError> {
        match operand {
            Operand::Argument(index) => self.params.get(*index).copied().ok_or(
                CodegenError::UnresolvedArgument { index: *index, arity: self.params.len() },
            ),
            Operand::Variable(name) => self
                .symbols
                .lookup(name)
                .ok_or_else(|| CodegenError::UnresolvedVariable(name.clone())),
            Operand::Immediate { ty, literal } => self.emit_immediate(builder, *ty, literal),
        }
    }

    /// Materialize a typed literal constant.
    fn emit_immediate(
        &self,
        builder: &mut FunctionBuilder<'_>,
        ty: TypeTag,
        literal: &str,
    ) -> Result<ir::Value, CodegenError> {
        let malformed = || CodegenError::MalformedLiteral { literal: literal.to_string(), ty };
        match ty {
            TypeTag::MachineInt | TypeTag::MachineIntPtr => {
                let width = if self.pointer == ir::types::I32 { 32 } else { 64 };
                let value = parse_int(literal, width).ok_or_else(malformed)?;
                Ok(builder.ins().iconst(self.pointer, value))
            }
            TypeTag::Int64 => {
                let value = parse_int(literal, 64).ok_or_else(malformed)?;
                Ok(builder.ins().iconst(ir::types::I64, value))
            }
            TypeTag::Float16 => {
                let value: f32 = literal.parse().map_err(|_| malformed())?;
                Ok(builder.ins().f16const(Ieee16::with_bits(half_bits(value))))
            }
            TypeTag::Float32 => {
                let value: f32 = literal.parse().map_err(|_| malformed())?;
                Ok(builder.ins().f32const(value))
            }
            TypeTag::Float64 => {
                let value: f64 = literal.parse().map_err(|_| malformed())?;
                Ok(builder.ins().f64const(value))
            }
            TypeTag::Void => Err(malformed()),
        }
    }

    // ---- intrinsic lowering ----

    /// Lower an `intrinsic_*` statement; returns the produced value.
    fn lower_intrinsic(
        &mut self,
        builder: &mut FunctionBuilder<'_>,
        opcode: &str,
        reference: Option<&str>,
        arguments: &[Operand],
    ) -> Result<ir::Value, CodegenError> {
        let def = intrinsics::lookup(opcode).ok_or_else(|| {
            CodegenError::UnsupportedOpcode(format!("{INTRINSIC_PREFIX}{opcode}"))
        })?;
        if arguments.len() != def.arity {
            return Err(CodegenError::MalformedAst(format!(
                "{INTRINSIC_PREFIX}{opcode} expects {} operand(s), got {}",
                def.arity,
                arguments.len()
            )));
        }
        let lhs = self.resolve_operand(builder, &arguments[0])?;
        let rhs = self.resolve_operand(builder, &arguments[1])?;
        let value = def.emit(builder, lhs, rhs)?;
        self.bind(reference, value)?;
        Ok(value)
    }

    // ---- call lowering ----

    /// Lower a `call` statement; returns the call's value for non-void
    /// callees.
    fn lower_call(
        &mut self,
        builder: &mut FunctionBuilder<'_>,
        registry: &FunctionRegistry,
        callee: &str,
        reference: Option<&str>,
        arguments: &[Operand],
    ) -> Result<Option<ir::Value>, CodegenError> {
        let func_id = registry
            .lookup(callee)
            .ok_or_else(|| CodegenError::UnknownCallee(callee.to_string()))?;
        let signature = registry.signature(func_id).clone();

        if arguments.len() != signature.params.len() {
            return Err(CodegenError::ArgumentCountMismatch {
                callee: callee.to_string(),
                expected: signature.params.len(),
                actual: arguments.len(),
            });
        }
        if let Some(name) = reference {
            if signature.returns.is_empty() {
                return Err(CodegenError::VoidBinding {
                    callee: callee.to_string(),
                    name: name.to_string(),
                });
            }
        }

        let mut args = Vec::with_capacity(arguments.len());
        for (index, operand) in arguments.iter().enumerate() {
            let value = self.resolve_operand(builder, operand)?;
            let actual = builder.func.dfg.value_type(value);
            let expected = signature.params[index].value_type;
            if actual != expected {
                return Err(CodegenError::ArgumentTypeMismatch {
                    callee: callee.to_string(),
                    index,
                    expected: expected.to_string(),
                    actual: actual.to_string(),
                });
            }
            args.push(value);
        }

        let func_ref = self.func_ref(builder, registry, func_id);
        let call = builder.ins().call(func_ref, &args);
        let result = builder.inst_results(call).first().copied();

        if let Some(value) = result {
            self.bind(reference, value)?;
        }
        Ok(result)
    }

    /// Import (once per function) a `FuncRef` for a registered callee.
    fn func_ref(
        &mut self,
        builder: &mut FunctionBuilder<'_>,
        registry: &FunctionRegistry,
        func_id: FuncId,
    ) -> ir::FuncRef {
        if let Some(&func_ref) = self.func_refs.get(&func_id) {
            return func_ref;
        }
        let func_ref = registry.import_into(builder.func, func_id);
        self.func_refs.insert(func_id, func_ref);
        func_ref
    }

    // ---- return lowering ----

    /// Lower the function's `return` statement.
    ///
    /// A bare return is legal only for a void function; type agreement
    /// between a returned value and the signature is left to verification.
    fn lower_return(
        &mut self,
        builder: &mut FunctionBuilder<'_>,
        expression: Option<&Operand>,
    ) -> Result<(), CodegenError> {
        match expression {
            Some(operand) => {
                let value = self.resolve_operand(builder, operand)?;
                builder.ins().return_(&[value]);
            }
            None => {
                if !self.ret.is_void() {
                    return Err(CodegenError::MalformedAst(format!(
                        "function '{}' returns {} but its return has no expression",
                        self.name, self.ret
                    )));
                }
                builder.ins().return_(&[]);
            }
        }
        self.terminated = true;
        Ok(())
    }

    /// Bind a statement's result when a reference name is present.
    fn bind(&mut self, reference: Option<&str>, value: ir::Value) -> Result<(), CodegenError> {
        if let Some(name) = reference {
            self.symbols.bind(name, value)?;
        }
        Ok(())
    }
}

/// Parse a base-10 integer literal checked against the target width.
fn parse_int(literal: &str, width: u32) -> Option<i64> {
    let value: i64 = literal.parse().ok()?;
    if width >= 64 {
        return Some(value);
    }
    let min = -(1i64 << (width - 1));
    let max = (1i64 << (width - 1)) - 1;
    (min..=max).contains(&value).then_some(value)
}
