//! Nova backend lowering
//!
//! Translates a lowered, JSON-encoded Nova AST into Cranelift IR, producing
//! a ready-to-verify module:
//! - **Types**: type-token resolution (`types` module)
//! - **AST**: one-shot classification of JSON nodes into closed variants
//!   (`ast` module)
//! - **Symbols**: per-function result bindings (`symbols` module)
//! - **Intrinsics**: the primitive-operation table (`intrinsics` module)
//! - **Module**: registry, per-function generation, verification, and
//!   rendering (`module` module)
//!
//! # Example
//!
//! ```rust,ignore
//! use nova_codegen::{Codegen, CodegenConfig};
//!
//! let document: serde_json::Value = serde_json::from_str(source)?;
//! let codegen = Codegen::new(CodegenConfig::default())?;
//! let (module, failures) = codegen.lower_program(&document);
//! print!("{module}");
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

/// Typed views over the JSON AST
pub mod ast;
/// Error taxonomy for the lowering stage
pub mod error;
/// Intrinsic opcode table
pub mod intrinsics;
mod lower;
/// Module assembly and the program-level entry point
pub mod module;
/// Per-function symbol table
pub mod symbols;
/// Type-token resolution
pub mod types;

pub use ast::{Operand, Stmt};
pub use error::{CodegenError, LowerFailure};
pub use module::{Codegen, CodegenConfig, LoweredFunction, LoweredModule};
pub use symbols::SymbolTable;
pub use types::{resolve_type, TypeTag};

// Re-exported so embedders can set a linkage policy without depending on
// cranelift-module directly.
pub use cranelift_module::Linkage;
