//! Domain logic - pure semantic version rules independent of git operations

pub mod version;

pub use version::{Identifier, SemanticVersion};
