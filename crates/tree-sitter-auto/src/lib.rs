//! Auto Lang grammar for tree-sitter style runtimes.
//!
//! The compiled grammar descriptor is generated from `grammar.js` and bundled
//! as [`GRAMMAR_JSON`]. [`LANGUAGE`] is the binding's entry point; hand it to
//! [`Language::new`] (or call [`language`]) to obtain a loaded handle.
//!
//! ```
//! let language = tree_sitter_auto::language().expect("Error loading Auto Lang grammar");
//! assert_eq!(language.name(), "auto");
//! ```
#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(clippy::multiple_crate_versions)]

use auto_sitter::{Language, LanguageError, LanguageFn, RawGrammar};

/// Smoke check that the bundled grammar loads.
pub mod probe;

pub use probe::{probe, probe_json, probe_with, ProbeFailure, GRAMMAR_LOAD_DIAGNOSTIC};

/// The compiled grammar descriptor, as produced by `tree-sitter generate`.
pub const GRAMMAR_JSON: &str = include_str!("grammar.json");

/// The ABI version [`GRAMMAR_JSON`] was generated for.
pub const ABI_VERSION: u32 = 14;

/// The syntax highlighting query for Auto Lang.
pub const HIGHLIGHTS_QUERY: &str = include_str!("../queries/highlights.scm");

fn tree_sitter_auto() -> RawGrammar {
    RawGrammar::new(GRAMMAR_JSON, ABI_VERSION)
}

/// The descriptor accessor for Auto Lang.
pub const LANGUAGE: LanguageFn = LanguageFn::from_raw(tree_sitter_auto);

/// Loads the Auto Lang grammar.
///
/// # Errors
///
/// Returns the runtime's [`LanguageError`] if the bundled descriptor cannot be
/// loaded.
pub fn language() -> Result<Language, LanguageError> {
    Language::new(LANGUAGE)
}
