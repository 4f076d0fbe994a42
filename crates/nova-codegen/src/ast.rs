//! Typed views over the JSON AST
//!
//! The document arrives as `serde_json::Value`. Each compiler-relevant node
//! is classified exactly once at the lowering boundary into a closed variant
//! ([`Stmt`], [`Operand`]); everything downstream dispatches on those
//! variants instead of re-comparing `kind` strings.

use serde_json::Value;

use crate::error::CodegenError;
use crate::types::{resolve_type, TypeTag};

/// Suffix convention marking an immediate value node (`"f32_value"`).
pub const VALUE_SUFFIX: &str = "_value";

/// Prefix convention marking an intrinsic operation (`"intrinsic_add"`).
pub const INTRINSIC_PREFIX: &str = "intrinsic_";

/// An operand reference, constructed fresh for each AST node visited.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// Reference to the enclosing function's parameter by position
    Argument(usize),
    /// Reference to a bound statement result by name
    Variable(String),
    /// Typed literal constant
    Immediate {
        /// Declared type of the literal
        ty: TypeTag,
        /// Literal text, parsed during lowering
        literal: String,
    },
}

/// A classified body statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// A standalone value expression; lowered, then discarded
    Discard(Operand),
    /// An intrinsic operation (`intrinsic_*`)
    Intrinsic {
        /// Opcode name with the `intrinsic_` prefix stripped
        opcode: String,
        /// Result binding; `None` when the result is anonymous
        reference: Option<String>,
        /// Operand list, in AST order
        arguments: Vec<Operand>,
    },
    /// A call to a module-level function
    Call {
        /// Callee name, resolved against the module registry
        callee: String,
        /// Result binding; `None` when the result is anonymous
        reference: Option<String>,
        /// Argument operands, in AST order
        arguments: Vec<Operand>,
    },
    /// Function exit
    Return {
        /// Returned operand; `None` for a bare (void) return
        expression: Option<Operand>,
    },
}

/// A function declaration's name, signature, and body, read out of a
/// top-level `"function"` node. Body statements stay unclassified until
/// lowering visits them.
#[derive(Debug)]
pub struct FunctionDecl<'a> {
    /// Function name
    pub name: String,
    /// Parameter types, in order
    pub params: Vec<TypeTag>,
    /// Return type (the trailing entry of `argumenttypes`)
    pub ret: TypeTag,
    /// Unclassified body statements
    pub body: &'a [Value],
}

// ---- field access ----

pub(crate) fn node_kind(node: &Value) -> Result<&str, CodegenError> {
    field_str(node, "kind")
}

pub(crate) fn field_str<'a>(node: &'a Value, field: &str) -> Result<&'a str, CodegenError> {
    node.get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| CodegenError::MalformedAst(format!("missing string field '{field}'")))
}

pub(crate) fn field_array<'a>(node: &'a Value, field: &str) -> Result<&'a [Value], CodegenError> {
    node.get(field)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .ok_or_else(|| CodegenError::MalformedAst(format!("missing list field '{field}'")))
}

/// Read an index field. The frontend encodes indices as strings of digits;
/// plain JSON integers are accepted too.
fn field_index(node: &Value, field: &str) -> Result<usize, CodegenError> {
    let value = node
        .get(field)
        .ok_or_else(|| CodegenError::MalformedAst(format!("missing index field '{field}'")))?;
    match value {
        Value::Number(n) => n
            .as_u64()
            .map(|n| n as usize)
            .ok_or_else(|| CodegenError::MalformedAst(format!("negative index in '{field}'"))),
        Value::String(s) => s.parse::<usize>().map_err(|_| {
            CodegenError::MalformedAst(format!("non-numeric index '{s}' in '{field}'"))
        }),
        _ => Err(CodegenError::MalformedAst(format!(
            "index field '{field}' is not a number"
        ))),
    }
}

/// Read the optional `reference` binding; absent or empty means anonymous.
fn field_reference(node: &Value) -> Option<String> {
    match node.get("reference").and_then(Value::as_str) {
        Some("") | None => None,
        Some(name) => Some(name.to_string()),
    }
}

fn classify_operands(nodes: &[Value]) -> Result<Vec<Operand>, CodegenError> {
    nodes.iter().map(Operand::classify).collect()
}

fn token_str(value: &Value) -> Result<&str, CodegenError> {
    value
        .as_str()
        .ok_or_else(|| CodegenError::MalformedAst("type token is not a string".to_string()))
}

impl Operand {
    /// Classify an operand node by its `kind` discriminant.
    pub fn classify(node: &Value) -> Result<Operand, CodegenError> {
        let kind = node_kind(node)?;
        if kind == "argument" {
            return Ok(Operand::Argument(field_index(node, "index")?));
        }
        if kind == "variable" {
            return Ok(Operand::Variable(field_str(node, "name")?.to_string()));
        }
        if let Some(token) = kind.strip_suffix(VALUE_SUFFIX) {
            return Ok(Operand::Immediate {
                ty: resolve_type(token)?,
                literal: field_str(node, "value")?.to_string(),
            });
        }
        Err(CodegenError::UnsupportedOperandKind(kind.to_string()))
    }
}

impl Stmt {
    /// Classify a body statement by its `kind` discriminant.
    pub fn classify(node: &Value) -> Result<Stmt, CodegenError> {
        let kind = node_kind(node)?;
        if kind.ends_with(VALUE_SUFFIX) {
            return Ok(Stmt::Discard(Operand::classify(node)?));
        }
        if let Some(opcode) = kind.strip_prefix(INTRINSIC_PREFIX) {
            return Ok(Stmt::Intrinsic {
                opcode: opcode.to_string(),
                reference: field_reference(node),
                arguments: classify_operands(field_array(node, "arguments")?)?,
            });
        }
        match kind {
            "call" => Ok(Stmt::Call {
                callee: field_str(node, "name")?.to_string(),
                reference: field_reference(node),
                arguments: classify_operands(field_array(node, "arguments")?)?,
            }),
            "return" => Ok(Stmt::Return {
                expression: match node.get("expression") {
                    Some(expression) => Some(Operand::classify(expression)?),
                    None => None,
                },
            }),
            _ => Err(CodegenError::UnsupportedStatementKind(kind.to_string())),
        }
    }

    /// The `kind` string this statement was classified from, for diagnostics.
    pub fn kind_name(&self) -> String {
        match self {
            Stmt::Discard(Operand::Immediate { ty, .. }) => format!("{ty}{VALUE_SUFFIX}"),
            Stmt::Discard(_) => "value".to_string(),
            Stmt::Intrinsic { opcode, .. } => format!("{INTRINSIC_PREFIX}{opcode}"),
            Stmt::Call { .. } => "call".to_string(),
            Stmt::Return { .. } => "return".to_string(),
        }
    }
}

impl<'a> FunctionDecl<'a> {
    /// Read a top-level `"function"` declaration.
    ///
    /// The `argumenttypes` list follows the trailing-return-type convention:
    /// the last entry is the return type, everything before it a parameter.
    /// An empty list is malformed.
    pub fn classify(node: &'a Value) -> Result<FunctionDecl<'a>, CodegenError> {
        let name = field_str(node, "name")?.to_string();
        let tokens = field_array(node, "argumenttypes")?;
        let (ret_token, param_tokens) = tokens.split_last().ok_or_else(|| {
            CodegenError::MalformedAst(format!("function '{name}': empty 'argumenttypes' list"))
        })?;
        let params = param_tokens
            .iter()
            .map(|token| token_str(token).and_then(resolve_type))
            .collect::<Result<Vec<_>, _>>()?;
        let ret = token_str(ret_token).and_then(resolve_type)?;
        Ok(FunctionDecl {
            name,
            params,
            ret,
            body: field_array(node, "body")?,
        })
    }
}
