//! The flat API representation and its bidirectional AST converter.
//!
//! [`from_api_formatted_to_ast`] and [`from_ast_to_api_formatted`] are
//! inverses modulo normalization: converting entities to a tree and back
//! reproduces the text exactly and the entity multiset up to emission order.

pub(crate) mod entity;
pub(crate) mod from_api;
pub(crate) mod to_api;

pub use entity::{ApiFormattedText, ApiMessageEntity, ApiMessageEntityType};
pub use from_api::from_api_formatted_to_ast;
pub use to_api::from_ast_to_api_formatted;
