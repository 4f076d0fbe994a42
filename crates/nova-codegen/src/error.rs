//! Error types for backend lowering
//!
//! Every resolver returns `Result` with one of these variants. A failure
//! aborts lowering of the current function only; the assembler records it
//! as a [`LowerFailure`] and moves on to the next declaration, so no
//! invalid value handle ever flows into a later instruction.

use thiserror::Error;

use crate::types::TypeTag;

/// Errors that can occur while lowering a program to backend IR.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CodegenError {
    /// A required field or node shape is missing or of the wrong shape
    #[error("malformed AST: {0}")]
    MalformedAst(String),

    /// A type token outside the fixed vocabulary
    #[error("unknown type token '{0}'")]
    UnknownType(String),

    /// A variable operand names a binding the symbol table does not hold
    #[error("unresolved variable '{0}'")]
    UnresolvedVariable(String),

    /// An argument operand indexes past the function's parameter list
    #[error("argument index {index} out of bounds for {arity} parameter(s)")]
    UnresolvedArgument {
        /// Index requested by the operand
        index: usize,
        /// Parameter count of the enclosing function
        arity: usize,
    },

    /// An immediate literal failed to parse for its declared type
    #[error("cannot parse '{literal}' as a {ty} literal")]
    MalformedLiteral {
        /// Literal text from the AST
        literal: String,
        /// Type the literal was declared with
        ty: TypeTag,
    },

    /// An operand node of a kind the resolver does not recognize
    #[error("unsupported operand kind '{0}'")]
    UnsupportedOperandKind(String),

    /// A declared-but-unimplemented or unknown intrinsic opcode
    #[error("unsupported intrinsic opcode '{0}'")]
    UnsupportedOpcode(String),

    /// A body statement of a kind the dispatcher does not recognize
    #[error("unsupported statement kind '{0}'")]
    UnsupportedStatementKind(String),

    /// A call names a function absent from the module registry
    #[error("unknown callee '{0}'")]
    UnknownCallee(String),

    /// A call passes the wrong number of arguments
    #[error("call to '{callee}' passes {actual} argument(s), expected {expected}")]
    ArgumentCountMismatch {
        /// Callee name
        callee: String,
        /// Parameter count of the declared signature
        expected: usize,
        /// Argument count at the call site
        actual: usize,
    },

    /// A call argument's IR type disagrees with the declared parameter type
    #[error("call to '{callee}': argument {index} has type {actual}, expected {expected}")]
    ArgumentTypeMismatch {
        /// Callee name
        callee: String,
        /// Position of the offending argument
        index: usize,
        /// Declared parameter type
        expected: String,
        /// Type of the value actually passed
        actual: String,
    },

    /// A result name is bound twice within one function
    #[error("duplicate binding '{0}'")]
    DuplicateBinding(String),

    /// Two top-level function declarations share a name
    #[error("duplicate function '{0}'")]
    DuplicateFunction(String),

    /// A statement appears after the function's return
    #[error("unreachable statement of kind '{0}' after return")]
    UnreachableStatement(String),

    /// A function body ends without a return
    #[error("function '{0}' has no return statement")]
    MissingReturn(String),

    /// A void call result was given a binding name
    #[error("cannot bind void result of '{callee}' to '{name}'")]
    VoidBinding {
        /// Callee with the void return type
        callee: String,
        /// Binding name the statement requested
        name: String,
    },

    /// The generated function failed structural verification
    #[error("verification failed: {0}")]
    VerificationFailure(String),

    /// The backend IR collaborator reported a failure
    #[error("backend error: {0}")]
    Backend(String),
}

/// A lowering failure recorded against one function.
///
/// The assembler collects these in program order and hands them to the
/// caller together with the (possibly partial) module.
#[derive(Debug, Clone)]
pub struct LowerFailure {
    /// Function (or `"program"`) the failure was recorded against
    pub function: String,
    /// What went wrong
    pub error: CodegenError,
}
