//! Grammar-load probe.
//!
//! [`probe`] hands the bundled descriptor to the runtime's language
//! constructor and reports whether a valid handle came back. The check is
//! single-shot: a failure is reported with [`GRAMMAR_LOAD_DIAGNOSTIC`] and the
//! runtime error as its source, never retried.

use auto_sitter::{Language, LanguageError, LanguageFn};

use crate::LANGUAGE;

/// Diagnostic reported when the grammar does not load.
pub const GRAMMAR_LOAD_DIAGNOSTIC: &str = "Error loading Auto Lang grammar";

/// Failure of a grammar-load probe.
#[derive(Debug, thiserror::Error)]
pub enum ProbeFailure {
    /// The runtime refused the descriptor.
    #[error("{}", GRAMMAR_LOAD_DIAGNOSTIC)]
    GrammarLoadFailure(#[source] LanguageError),
}

/// Checks that the bundled Auto Lang grammar loads.
///
/// # Errors
///
/// Returns [`ProbeFailure::GrammarLoadFailure`] if the runtime does not yield a
/// valid language handle.
pub fn probe() -> Result<(), ProbeFailure> {
    probe_with(LANGUAGE)
}

/// Checks that the descriptor returned by `language_fn` loads.
///
/// # Errors
///
/// Returns [`ProbeFailure::GrammarLoadFailure`] if the runtime does not yield a
/// valid language handle.
#[tracing::instrument(level = "debug", skip_all)]
pub fn probe_with(language_fn: LanguageFn) -> Result<(), ProbeFailure> {
    let language = Language::new(language_fn).map_err(failure)?;
    tracing::debug!(name = language.name(), "grammar loads");
    Ok(())
}

/// Checks that descriptor text loads, returning the handle on success.
///
/// Used for descriptors that are not bundled, such as a freshly generated
/// `grammar.json` on disk.
///
/// # Errors
///
/// Returns [`ProbeFailure::GrammarLoadFailure`] if the runtime does not yield a
/// valid language handle.
#[tracing::instrument(level = "debug", skip(json))]
pub fn probe_json(json: &str, abi_version: u32) -> Result<Language, ProbeFailure> {
    Language::from_json(json, abi_version).map_err(failure)
}

fn failure(err: LanguageError) -> ProbeFailure {
    tracing::error!(error = %err, "{GRAMMAR_LOAD_DIAGNOSTIC}");
    ProbeFailure::GrammarLoadFailure(err)
}
