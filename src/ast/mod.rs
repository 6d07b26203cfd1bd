/// AST (Abstract Syntax Tree) module
/// Contains the name-bound program representation the checker annotates
///
/// Submodules:
/// - ast: The compilation context, ids, modules and source files
/// - declarations: Declaration records and their kinds
/// - expressions: Definitions for the expressions the driver inspects
/// - known_protocols: The compiler-known protocol registry
/// - types: Resolved types and written type representations
pub mod ast;
pub mod declarations;
pub mod expressions;
pub mod known_protocols;
pub mod types;
