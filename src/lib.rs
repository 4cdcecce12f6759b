//! Sigil Engine — table-driven random text generation.
//!
//! Templates mix literal prose with bracketed references (`[weapon]`) into
//! YAML-defined tables, `{...}` expressions for alternatives, conjunctions
//! and number ranges, and `{a}` article placeholders. Selected table
//! entries are themselves templates, resolved recursively up to a
//! configurable depth.

pub mod core;
pub mod schema;

pub use crate::core::engine::{EngineError, SigilEngine, SigilEngineBuilder};
pub use crate::core::tokens::{TablePath, TemplateIssue, TokenDescriptor, ValidationReport};
pub use crate::schema::config::EngineConfig;
pub use crate::schema::table::{TableStore, TableValue};
