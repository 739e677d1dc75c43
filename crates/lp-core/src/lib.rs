pub mod config;
pub mod cursor;
pub mod emitter;
pub mod error;
pub mod lint;
pub mod model;
pub mod parser;

pub use config::ParseOptions;
pub use cursor::Cursor;
pub use emitter::emit_document;
pub use error::PlanError;
pub use lint::{LintDiagnostic, LintSeverity, lint_plan};
pub use model::*;
pub use parser::{parse_document, parse_document_with, parse_line, parse_plan};
