//! A Rust-native loader for compiled tree-sitter grammars.
#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(clippy::multiple_crate_versions)]

/// Core structures and parsing logic for Tree-sitter grammar descriptors.
///
/// This module defines how a compiled grammar is represented once read from
/// its JSON form. Everything else in the crate builds upon these types.
pub mod grammar;

/// Grammar validation and consistency checking utilities.
///
/// Validation protects the language constructor from malformed grammars. It
/// enforces Tree-sitter's invariants so that what is loaded is also
/// semantically meaningful.
pub mod validate;

/// Language handles built from grammar descriptors.
pub mod language;

pub use grammar::{parse_grammar, Grammar, GrammarError, Rule, RuleType};
pub use language::{
    Language, LanguageError, LanguageFn, RawGrammar, SymbolMetadata, LANGUAGE_VERSION,
    MAX_SYMBOLS, MIN_COMPATIBLE_LANGUAGE_VERSION,
};
pub use validate::{validate, ValidationError};
