pub mod codec;
pub mod error;
pub mod expr;
mod expr_parse;
pub mod graph;
pub mod types;
pub mod value;

pub use codec::{StateCodec, DIALOGUE_STATE_SCHEMA_V1};
pub use error::{DialogueError, Diagnostic};
pub use expr::{BinaryOp, ExprNode, Expression, UnaryOp};
pub use expr_parse::parse_expression;
pub use graph::{
    extract_param_names, fill_placeholders, Edge, EdgeDef, EdgeRef, GraphDef, Node, NodeDef, NodeIndex, NodeKind,
    ScriptGraph,
};
pub use types::*;
pub use value::*;
