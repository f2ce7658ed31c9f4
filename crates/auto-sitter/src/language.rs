//! Loading grammar descriptors into [`Language`] handles.
//!
//! A grammar binding exposes its compiled descriptor through a zero-argument
//! [`LanguageFn`]. [`Language::new`] checks the descriptor's ABI version, parses
//! it, validates it and builds the symbol and field tables a parser needs. A
//! [`Language`] only exists for descriptors that pass all of these steps.

use crate::grammar::{parse_grammar, Grammar, GrammarError, Rule};
use crate::validate::{validate, ValidationError};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

/// The latest descriptor ABI version this runtime can load.
pub const LANGUAGE_VERSION: u32 = 15;

/// The earliest descriptor ABI version this runtime can load.
pub const MIN_COMPATIBLE_LANGUAGE_VERSION: u32 = 13;

/// Kind name of the reserved symbol with id 0.
const END_SYMBOL: &str = "end";

/// Symbol ids are `u16`, so at most this many symbols fit in a table.
pub const MAX_SYMBOLS: usize = u16::MAX as usize + 1;

/// An opaque grammar descriptor as handed out by a language binding.
///
/// This is either the null descriptor or a reference to static descriptor
/// text together with the ABI version it was generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawGrammar {
    source: Option<&'static str>,
    abi_version: u32,
}

impl RawGrammar {
    /// The null descriptor. Loading it always fails.
    pub const NULL: Self = Self {
        source: None,
        abi_version: 0,
    };

    /// Wraps static descriptor text generated for `abi_version`.
    #[must_use]
    pub const fn new(source: &'static str, abi_version: u32) -> Self {
        Self {
            source: Some(source),
            abi_version,
        }
    }

    /// Returns `true` for the null descriptor.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        self.source.is_none()
    }

    /// The ABI version recorded in the descriptor.
    #[must_use]
    pub const fn abi_version(&self) -> u32 {
        self.abi_version
    }

    /// The descriptor text, unless this is the null descriptor.
    #[must_use]
    pub const fn source(&self) -> Option<&'static str> {
        self.source
    }
}

/// A binding's entry point: a function returning its grammar descriptor.
#[derive(Clone, Copy)]
pub struct LanguageFn(fn() -> RawGrammar);

impl LanguageFn {
    /// Wraps a descriptor accessor.
    #[must_use]
    pub const fn from_raw(f: fn() -> RawGrammar) -> Self {
        Self(f)
    }

    /// Returns the wrapped accessor.
    #[must_use]
    pub const fn into_raw(self) -> fn() -> RawGrammar {
        self.0
    }

    /// Calls the accessor.
    #[must_use]
    pub fn descriptor(self) -> RawGrammar {
        (self.0)()
    }
}

impl fmt::Debug for LanguageFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("LanguageFn").finish_non_exhaustive()
    }
}

/// Why a descriptor could not be turned into a [`Language`].
#[derive(Debug, thiserror::Error)]
pub enum LanguageError {
    /// The accessor returned [`RawGrammar::NULL`].
    #[error("grammar descriptor is null")]
    NullDescriptor,

    /// The descriptor was generated for an ABI this runtime cannot load.
    #[error("incompatible language version {version}, expected {min}..={max}")]
    IncompatibleVersion {
        /// The descriptor's ABI version.
        version: u32,
        /// [`MIN_COMPATIBLE_LANGUAGE_VERSION`].
        min: u32,
        /// [`LANGUAGE_VERSION`].
        max: u32,
    },

    /// The descriptor text could not be parsed.
    #[error("malformed grammar descriptor")]
    Malformed(#[from] GrammarError),

    /// The descriptor parsed but is not a consistent grammar.
    #[error("invalid grammar")]
    Invalid(#[from] ValidationError),

    /// The grammar has more node kinds than symbol ids can address.
    #[error("grammar needs more than {max} symbols")]
    TooManySymbols {
        /// The number of addressable symbols.
        max: usize,
    },
}

/// Per-symbol flags, mirroring Tree-sitter's symbol metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SymbolMetadata {
    /// Nodes of this kind appear in syntax trees.
    pub visible: bool,
    /// The kind is a named node rather than a literal token.
    pub named: bool,
    /// The kind is a supertype grouping other kinds.
    pub supertype: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Symbol {
    kind: String,
    metadata: SymbolMetadata,
}

/// A loaded, validated grammar.
///
/// Cloning is cheap; clones share the same tables.
#[derive(Debug, Clone)]
pub struct Language(Arc<LanguageInner>);

#[derive(Debug)]
struct LanguageInner {
    grammar: Grammar,
    abi_version: u32,
    symbols: Vec<Symbol>,
    symbol_ids: HashMap<(String, bool), u16>,
    fields: Vec<String>,
}

impl Language {
    /// Loads the descriptor returned by a binding's accessor.
    ///
    /// # Errors
    ///
    /// See [`Language::from_raw`].
    pub fn new(language_fn: LanguageFn) -> Result<Self, LanguageError> {
        Self::from_raw(language_fn.descriptor())
    }

    /// Loads a raw descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`LanguageError::NullDescriptor`] for [`RawGrammar::NULL`], and
    /// otherwise any error of [`Language::from_json`].
    pub fn from_raw(raw: RawGrammar) -> Result<Self, LanguageError> {
        let Some(source) = raw.source() else {
            tracing::debug!("refusing null grammar descriptor");
            return Err(LanguageError::NullDescriptor);
        };
        Self::from_json(source, raw.abi_version())
    }

    /// Loads descriptor text generated for `abi_version`.
    ///
    /// # Errors
    ///
    /// Returns [`LanguageError::IncompatibleVersion`] when `abi_version` is outside
    /// the supported range, [`LanguageError::Malformed`] when the text does not
    /// parse, [`LanguageError::Invalid`] when the grammar fails validation, and
    /// [`LanguageError::TooManySymbols`] when its node kinds overflow the symbol table.
    #[tracing::instrument(level = "debug", skip(json), fields(len = json.len()))]
    pub fn from_json(json: &str, abi_version: u32) -> Result<Self, LanguageError> {
        if !(MIN_COMPATIBLE_LANGUAGE_VERSION..=LANGUAGE_VERSION).contains(&abi_version) {
            return Err(LanguageError::IncompatibleVersion {
                version: abi_version,
                min: MIN_COMPATIBLE_LANGUAGE_VERSION,
                max: LANGUAGE_VERSION,
            });
        }

        let grammar = parse_grammar(json)?;
        validate(&grammar)?;
        let language = Self::build(grammar, abi_version)?;

        tracing::debug!(
            name = language.name(),
            node_kinds = language.node_kind_count(),
            fields = language.field_count(),
            "loaded language"
        );
        Ok(language)
    }

    fn build(grammar: Grammar, abi_version: u32) -> Result<Self, LanguageError> {
        let mut symbols = SymbolTable::default();
        symbols.push(END_SYMBOL, SymbolMetadata::default())?;

        // Anonymous tokens first, in order of appearance
        let mut literals = Vec::new();
        for (_, rule) in grammar.rules.iter() {
            collect_literals(rule, false, &mut literals);
        }
        for extra in grammar.extras() {
            collect_literals(extra, false, &mut literals);
        }
        for literal in literals {
            symbols.push(
                literal,
                SymbolMetadata {
                    visible: true,
                    named: false,
                    supertype: false,
                },
            )?;
        }

        for name in grammar.rules.names() {
            let supertype = grammar.is_supertype(name);
            symbols.push(
                name,
                SymbolMetadata {
                    visible: !supertype && !Grammar::is_hidden(name),
                    named: true,
                    supertype,
                },
            )?;
        }

        // External tokens not already defined as rules or literals
        for external in grammar.externals.iter().flatten() {
            if let Some(name) = external.symbol_name() {
                symbols.push(
                    name,
                    SymbolMetadata {
                        visible: !Grammar::is_hidden(name),
                        named: true,
                        supertype: false,
                    },
                )?;
            } else if let Some(literal) = external.string_value() {
                symbols.push(
                    literal,
                    SymbolMetadata {
                        visible: true,
                        named: false,
                        supertype: false,
                    },
                )?;
            }
        }

        // Named aliases that do not share a rule's name
        let mut aliases = Vec::new();
        for (_, rule) in grammar.rules.iter() {
            collect_named_aliases(rule, &mut aliases);
        }
        for alias in aliases {
            symbols.push(
                alias,
                SymbolMetadata {
                    visible: true,
                    named: true,
                    supertype: false,
                },
            )?;
        }

        let mut fields = BTreeSet::new();
        for (_, rule) in grammar.rules.iter() {
            collect_fields(rule, &mut fields);
        }
        let fields: Vec<String> = fields.into_iter().map(str::to_string).collect();

        let SymbolTable { symbols, ids } = symbols;
        Ok(Self(Arc::new(LanguageInner {
            grammar,
            abi_version,
            symbols,
            symbol_ids: ids,
            fields,
        })))
    }

    /// The grammar's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0.grammar.name
    }

    /// The ABI version the descriptor was generated for.
    #[must_use]
    pub fn abi_version(&self) -> u32 {
        self.0.abi_version
    }

    /// The parsed grammar backing this language.
    #[must_use]
    pub fn grammar(&self) -> &Grammar {
        &self.0.grammar
    }

    /// Number of distinct node kinds, including the reserved `end` symbol.
    #[must_use]
    pub fn node_kind_count(&self) -> usize {
        self.0.symbols.len()
    }

    /// The kind name for a symbol id.
    #[must_use]
    pub fn node_kind_for_id(&self, id: u16) -> Option<&str> {
        self.symbol(id).map(|s| s.kind.as_str())
    }

    /// The symbol id of a node kind. Named and anonymous kinds are distinct.
    #[must_use]
    pub fn id_for_node_kind(&self, kind: &str, named: bool) -> Option<u16> {
        self.0.symbol_ids.get(&(kind.to_string(), named)).copied()
    }

    /// Metadata for a symbol id.
    #[must_use]
    pub fn symbol_metadata(&self, id: u16) -> Option<SymbolMetadata> {
        self.symbol(id).map(|s| s.metadata)
    }

    /// Returns `true` if the symbol is a named node kind.
    #[must_use]
    pub fn node_kind_is_named(&self, id: u16) -> bool {
        self.symbol_metadata(id).is_some_and(|m| m.named)
    }

    /// Returns `true` if nodes of this kind appear in syntax trees.
    #[must_use]
    pub fn node_kind_is_visible(&self, id: u16) -> bool {
        self.symbol_metadata(id).is_some_and(|m| m.visible)
    }

    /// Returns `true` if the symbol is a supertype.
    #[must_use]
    pub fn node_kind_is_supertype(&self, id: u16) -> bool {
        self.symbol_metadata(id).is_some_and(|m| m.supertype)
    }

    /// Number of distinct field names.
    #[must_use]
    pub fn field_count(&self) -> usize {
        self.0.fields.len()
    }

    /// The field name for a field id. Ids start at 1.
    #[must_use]
    pub fn field_name_for_id(&self, id: u16) -> Option<&str> {
        let index = usize::from(id).checked_sub(1)?;
        self.0.fields.get(index).map(String::as_str)
    }

    /// The field id for a field name.
    #[must_use]
    pub fn field_id_for_name(&self, name: &str) -> Option<u16> {
        let index = self.0.fields.binary_search_by(|f| f.as_str().cmp(name)).ok()?;
        u16::try_from(index + 1).ok()
    }

    /// Supertype rule names, in declaration order.
    pub fn supertypes(&self) -> impl Iterator<Item = &str> {
        self.0.grammar.supertypes.iter().flatten().map(String::as_str)
    }

    /// The keyword-extraction word token, if the grammar declares one.
    #[must_use]
    pub fn word(&self) -> Option<&str> {
        self.0.grammar.word.as_deref()
    }

    /// Declared conflict groups.
    #[must_use]
    pub fn conflicts(&self) -> &[Vec<String>] {
        self.0.grammar.conflicts.as_deref().unwrap_or_default()
    }

    fn symbol(&self, id: u16) -> Option<&Symbol> {
        self.0.symbols.get(usize::from(id))
    }
}

impl PartialEq for Language {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
            || (self.0.grammar.name == other.0.grammar.name
                && self.0.abi_version == other.0.abi_version
                && self.0.symbols == other.0.symbols
                && self.0.fields == other.0.fields)
    }
}

impl Eq for Language {}

#[derive(Default)]
struct SymbolTable {
    symbols: Vec<Symbol>,
    ids: HashMap<(String, bool), u16>,
}

impl SymbolTable {
    /// Adds a kind unless one with the same name and namedness exists.
    fn push(&mut self, kind: &str, metadata: SymbolMetadata) -> Result<(), LanguageError> {
        let key = (kind.to_string(), metadata.named);
        if self.ids.contains_key(&key) {
            return Ok(());
        }
        let id = u16::try_from(self.symbols.len())
            .map_err(|_| LanguageError::TooManySymbols { max: MAX_SYMBOLS })?;
        if kind != END_SYMBOL || id != 0 {
            self.ids.insert(key, id);
        }
        self.symbols.push(Symbol {
            kind: kind.to_string(),
            metadata,
        });
        Ok(())
    }
}

fn collect_literals<'g>(rule: &'g Rule, in_token: bool, out: &mut Vec<&'g str>) {
    if !in_token {
        let literal = rule
            .string_value()
            .or_else(|| rule.alias_value().and_then(|(v, named)| (!named).then_some(v)));
        out.extend(literal);
    }
    let in_token = in_token || rule.is_token();
    for child in rule.children() {
        collect_literals(child, in_token, out);
    }
}

fn collect_named_aliases<'g>(rule: &'g Rule, out: &mut Vec<&'g str>) {
    if let Some((alias, true)) = rule.alias_value() {
        out.push(alias);
    }
    for child in rule.children() {
        collect_named_aliases(child, out);
    }
}

fn collect_fields<'g>(rule: &'g Rule, out: &mut BTreeSet<&'g str>) {
    if let Some(field) = rule.field_name() {
        out.insert(field);
    }
    for child in rule.children() {
        collect_fields(child, out);
    }
}
