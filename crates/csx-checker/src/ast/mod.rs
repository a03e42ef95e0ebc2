pub mod nodes;
pub mod types;

pub use nodes::*;
pub use types::{TypeAnnotation, TypeKind};
