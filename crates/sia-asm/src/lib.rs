pub mod encode;
pub mod listing;
pub mod parse;

// Re-export the entry points used by the CLI and tests
pub use encode::{assemble, assemble_line, Assembly, Diagnostic, Encoded, LineError};
pub use listing::listing;
pub use parse::AsmError;
