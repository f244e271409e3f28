//! Tree-sitter powered import discovery for batch ordering.
//!
//! Files created together in one batch are ordered so that each file follows
//! the files it imports. This crate supplies the raw import targets for that
//! ordering by parsing each file with its Tree-sitter grammar and collecting
//! the module specifiers it references.
//!
//! # Supported Languages
//!
//! - Rust (`.rs`): `use` declarations and out-of-line `mod` items
//! - Python (`.py`, `.pyi`): `import` and `from ... import` statements
//! - TypeScript (`.ts`, `.tsx`, `.mts`, `.cts`): static imports, re-exports
//!   and `require` calls
//! - JavaScript (`.js`, `.jsx`, `.mjs`, `.cjs`): as TypeScript
//!
//! # Example
//!
//! ```
//! use quill_syntax::{SupportedLanguage, extract_imports};
//!
//! let imports = extract_imports(SupportedLanguage::TypeScript, "import { x } from './utils';")?;
//! assert_eq!(imports, ["./utils"]);
//! # Ok::<(), quill_syntax::SyntaxError>(())
//! ```
//!
//! Targets are returned verbatim apart from quoting and separator
//! normalisation. Resolving them against concrete paths is left to the
//! caller.

mod error;
mod imports;
mod language;
mod parser;

pub use error::SyntaxError;
pub use imports::{extract_imports, extract_imports_for_path};
pub use language::{LanguageParseError, SupportedLanguage};
pub use parser::{ParseResult, Parser};

#[cfg(test)]
mod tests;
