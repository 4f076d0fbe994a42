//! Module assembly
//!
//! Owns the function registry, drives per-function lowering, verifies each
//! generated function, and renders the finished module. The registry is
//! populated in a first pass over every top-level declaration, so calls may
//! reference functions declared later in the program.

use std::fmt;
use std::sync::Arc;

use cranelift_codegen::ir::{self, UserExternalName, UserFuncName};
use cranelift_codegen::isa::TargetIsa;
use cranelift_codegen::settings::{self, Configurable};
use cranelift_codegen::verify_function;
use cranelift_frontend::{FunctionBuilder, FunctionBuilderContext};
use cranelift_module::{FuncId, FuncOrDataId, Linkage, ModuleDeclarations};
use serde_json::Value;
use target_lexicon::Triple;

use crate::ast::{self, FunctionDecl, Stmt};
use crate::error::{CodegenError, LowerFailure};
use crate::lower::FunctionLowering;

/// Assembly-time options.
#[derive(Debug, Clone)]
pub struct CodegenConfig {
    /// Name the module artifact is rendered under
    pub module_name: String,
    /// Linkage given to every generated function
    pub linkage: Linkage,
}

impl Default for CodegenConfig {
    fn default() -> Self {
        CodegenConfig {
            module_name: "nova".to_string(),
            linkage: Linkage::Export,
        }
    }
}

/// Name-indexed registry of declared functions.
///
/// Wraps `ModuleDeclarations` so call lowering can resolve a callee to its
/// id and declared signature and import it into the calling function.
pub(crate) struct FunctionRegistry {
    declarations: ModuleDeclarations,
}

impl FunctionRegistry {
    fn new() -> Self {
        FunctionRegistry { declarations: ModuleDeclarations::default() }
    }

    /// Declare a function shell. A name may be declared once.
    fn declare(
        &mut self,
        name: &str,
        linkage: Linkage,
        signature: &ir::Signature,
    ) -> Result<FuncId, CodegenError> {
        if self.declarations.get_name(name).is_some() {
            return Err(CodegenError::DuplicateFunction(name.to_string()));
        }
        let (func_id, _) = self
            .declarations
            .declare_function(name, linkage, signature)
            .map_err(|e| CodegenError::Backend(e.to_string()))?;
        Ok(func_id)
    }

    /// Resolve a callee name to its function id.
    pub(crate) fn lookup(&self, name: &str) -> Option<FuncId> {
        match self.declarations.get_name(name) {
            Some(FuncOrDataId::Func(func_id)) => Some(func_id),
            _ => None,
        }
    }

    /// Declared signature of a registered function.
    pub(crate) fn signature(&self, func_id: FuncId) -> &ir::Signature {
        &self.declarations.get_function_decl(func_id).signature
    }

    /// Import a registered function into `func`, yielding a `FuncRef`
    /// usable at call sites.
    pub(crate) fn import_into(&self, func: &mut ir::Function, func_id: FuncId) -> ir::FuncRef {
        let decl = self.declarations.get_function_decl(func_id);
        let name_ref = func.declare_imported_user_function(UserExternalName {
            namespace: 0,
            index: func_id.as_u32(),
        });
        let signature = func.import_signature(decl.signature.clone());
        func.import_function(ir::ExtFuncData {
            name: ir::ExternalName::user(name_ref),
            signature,
            colocated: decl.linkage.is_final(),
            patchable: false,
        })
    }
}

/// One generated function and the name it was registered under.
pub struct LoweredFunction {
    /// Function name
    pub name: String,
    /// The generated Cranelift function
    pub func: ir::Function,
}

/// The assembled output artifact: generated functions in program order,
/// plus the registry used to resolve call targets.
pub struct LoweredModule {
    name: String,
    triple: Triple,
    registry: FunctionRegistry,
    functions: Vec<LoweredFunction>,
}

impl LoweredModule {
    /// Number of generated functions.
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Whether the module holds no functions.
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// The generated functions, in program order.
    pub fn functions(&self) -> &[LoweredFunction] {
        &self.functions
    }

    /// Find a generated function by name.
    pub fn function(&self, name: &str) -> Option<&ir::Function> {
        self.functions
            .iter()
            .find(|function| function.name == name)
            .map(|function| &function.func)
    }
}

impl fmt::Display for LoweredModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "; module {} ({})", self.name, self.triple)?;
        for function in &self.functions {
            writeln!(f)?;
            writeln!(f, "; fn {}", function.name)?;
            write!(f, "{}", function.func.display())?;
        }
        Ok(())
    }
}

/// The program assembler: lowers a whole AST document into a module.
pub struct Codegen {
    isa: Arc<dyn TargetIsa>,
    config: CodegenConfig,
}

impl Codegen {
    /// Create an assembler targeting the host machine.
    pub fn new(config: CodegenConfig) -> Result<Self, CodegenError> {
        let mut flag_builder = settings::builder();
        flag_builder
            .set("is_pic", "true")
            .map_err(|e| CodegenError::Backend(format!("failed to set is_pic: {e}")))?;
        let flags = settings::Flags::new(flag_builder);

        let isa = cranelift_native::builder()
            .map_err(|e| CodegenError::Backend(format!("failed to create native ISA builder: {e}")))?
            .finish(flags)
            .map_err(|e| CodegenError::Backend(format!("failed to finish ISA: {e}")))?;

        Ok(Codegen { isa, config })
    }

    /// Create an assembler with default options.
    pub fn host() -> Result<Self, CodegenError> {
        Codegen::new(CodegenConfig::default())
    }

    /// Lower a whole program document.
    ///
    /// Returns the assembled module together with every failure recorded
    /// along the way, in program order; the caller decides whether any of
    /// them is fatal. A document with no `program` field is an empty
    /// program, not an error.
    pub fn lower_program(&self, document: &Value) -> (LoweredModule, Vec<LowerFailure>) {
        let mut module = LoweredModule {
            name: self.config.module_name.clone(),
            triple: self.isa.triple().clone(),
            registry: FunctionRegistry::new(),
            functions: Vec::new(),
        };
        let mut failures = Vec::new();

        let program = match document.pointer("/program") {
            None => return (module, failures),
            Some(Value::Array(declarations)) => declarations,
            Some(_) => {
                failures.push(LowerFailure {
                    function: "program".to_string(),
                    error: CodegenError::MalformedAst("'program' is not a list".to_string()),
                });
                return (module, failures);
            }
        };

        // Pass one: register every function signature so calls may
        // reference functions declared later in the program.
        let mut pending = Vec::new();
        for declaration in program {
            let kind = match ast::node_kind(declaration) {
                Ok(kind) => kind,
                Err(error) => {
                    failures.push(LowerFailure { function: decl_label(declaration), error });
                    continue;
                }
            };
            if kind != "function" {
                // Other top-level kinds are not lowered.
                continue;
            }
            let decl = match FunctionDecl::classify(declaration) {
                Ok(decl) => decl,
                Err(error) => {
                    failures.push(LowerFailure { function: decl_label(declaration), error });
                    continue;
                }
            };
            let signature = match self.build_signature(&decl) {
                Ok(signature) => signature,
                Err(error) => {
                    failures.push(LowerFailure { function: decl.name.clone(), error });
                    continue;
                }
            };
            match module.registry.declare(&decl.name, self.config.linkage, &signature) {
                Ok(func_id) => pending.push((decl, func_id, signature)),
                Err(error) => failures.push(LowerFailure { function: decl.name.clone(), error }),
            }
        }

        // Pass two: lower bodies in program order.
        for (decl, func_id, signature) in pending {
            match self.lower_function(&module.registry, &decl, func_id, signature) {
                Ok((func, verification)) => {
                    if let Some(error) = verification {
                        failures.push(LowerFailure { function: decl.name.clone(), error });
                    }
                    module.functions.push(LoweredFunction { name: decl.name, func });
                }
                Err(error) => {
                    failures.push(LowerFailure { function: decl.name.clone(), error });
                }
            }
        }

        (module, failures)
    }

    /// Build the Cranelift signature for a declaration.
    ///
    /// `void` is the absence of a return value, never a parameter type.
    fn build_signature(&self, decl: &FunctionDecl<'_>) -> Result<ir::Signature, CodegenError> {
        let pointer = self.isa.pointer_type();
        let mut signature = ir::Signature::new(self.isa.default_call_conv());
        for param in &decl.params {
            let ty = param.clif(pointer).ok_or_else(|| {
                CodegenError::MalformedAst(format!(
                    "function '{}' declares a void parameter",
                    decl.name
                ))
            })?;
            signature.params.push(ir::AbiParam::new(ty));
        }
        if let Some(ret) = decl.ret.clif(pointer) {
            signature.returns.push(ir::AbiParam::new(ret));
        }
        Ok(signature)
    }

    /// Generate one function: entry block, statement dispatch, verification.
    ///
    /// Verification failure is non-fatal: the function is still placed in
    /// the module and the failure reported alongside it.
    fn lower_function(
        &self,
        registry: &FunctionRegistry,
        decl: &FunctionDecl<'_>,
        func_id: FuncId,
        signature: ir::Signature,
    ) -> Result<(ir::Function, Option<CodegenError>), CodegenError> {
        let mut func =
            ir::Function::with_name_signature(UserFuncName::user(0, func_id.as_u32()), signature);
        let mut builder_ctx = FunctionBuilderContext::new();
        let mut builder = FunctionBuilder::new(&mut func, &mut builder_ctx);

        let entry = builder.create_block();
        builder.append_block_params_for_function_params(entry);
        builder.switch_to_block(entry);
        builder.seal_block(entry);
        let params = builder.block_params(entry).to_vec();

        let mut lowering =
            FunctionLowering::new(&decl.name, params, decl.ret, self.isa.pointer_type());
        for statement in decl.body {
            let stmt = Stmt::classify(statement)?;
            lowering.lower_statement(&mut builder, registry, &stmt)?;
        }
        if !lowering.is_terminated() {
            return Err(CodegenError::MissingReturn(decl.name.clone()));
        }
        builder.finalize();

        let verification = verify_function(&func, self.isa.flags())
            .err()
            .map(|errors| CodegenError::VerificationFailure(errors.to_string()));
        Ok((func, verification))
    }
}

fn decl_label(node: &Value) -> String {
    node.get("name")
        .and_then(Value::as_str)
        .unwrap_or("<unnamed>")
        .to_string()
}
