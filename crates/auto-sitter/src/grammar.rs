//! Core structures and parsing logic for Tree-sitter grammar descriptors.
//!
//! This module defines the internal representation of a grammar as produced by
//! `tree-sitter generate` in its JSON form. It uses [`serde_json`] for
//! deserialization and provides ergonomic accessors for inspecting rules.

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use std::fmt;

mod rules;

pub use rules::{Rule, RuleType, RuleValue};

/// Represents a full Tree-sitter grammar definition.
///
/// This structure directly mirrors the serialized JSON format. It captures the
/// complete rule set along with auxiliary metadata such as precedences,
/// conflicts, and supertypes.
///
/// See <https://tree-sitter.github.io/tree-sitter/assets/schemas/grammar.schema.json>
#[derive(Debug, Clone, Deserialize)]
pub struct Grammar {
    /// Optional `$schema` field from the JSON, typically used for schema
    /// validation or editor integration.
    #[serde(rename = "$schema")]
    pub schema: Option<String>,

    /// The short name of the grammar (e.g. `"auto"`).
    pub name: String,

    /// Optional name of a base grammar that this one inherits from.
    pub inherits: Option<String>,

    /// All rule definitions, in declaration order.
    pub rules: Rules,

    /// “Extras” that may appear between other tokens, such as whitespace or comments.
    pub extras: Option<Vec<Rule>>,

    /// Rules implemented externally via a scanner.
    pub externals: Option<Vec<Rule>>,

    /// Names of rules that should be inlined into other rules.
    pub inline: Option<Vec<String>>,

    /// Precedence declarations that control operator binding order.
    pub precedences: Option<Vec<Vec<Precedence>>>,

    /// Explicit conflict groups expected during parsing.
    pub conflicts: Option<Vec<Vec<String>>>,

    /// Context-specific reserved word definitions.
    pub reserved: Option<HashMap<String, Vec<Rule>>>,

    /// The special rule name used to identify word tokens (keywords, identifiers, etc.).
    pub word: Option<String>,

    /// A list of node supertypes, grouping related syntactic forms.
    pub supertypes: Option<Vec<String>>,
}

/// A single precedence entry, either a named symbol or a literal string value.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type")]
pub enum Precedence {
    /// A literal precedence string.
    #[serde(rename = "STRING")]
    String {
        /// The precedence name.
        value: String,
    },

    /// A symbolic precedence name.
    #[serde(rename = "SYMBOL")]
    Symbol {
        /// The identifier of the referenced symbol.
        name: String,
    },
}

/// The rule table of a [`Grammar`], keeping declaration order.
///
/// Tree-sitter treats the first declared rule as the start symbol, so the
/// order of the JSON object matters and a plain hash map would lose it.
#[derive(Debug, Clone, Default)]
pub struct Rules {
    entries: Vec<(String, Rule)>,
    index: HashMap<String, usize>,
}

impl Rules {
    /// Looks up a rule by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Rule> {
        self.index.get(name).map(|&i| &self.entries[i].1)
    }

    /// Returns `true` if a rule with this name is defined.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Iterates over `(name, rule)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Rule)> {
        self.entries.iter().map(|(name, rule)| (name.as_str(), rule))
    }

    /// Iterates over rule names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// The first declared rule, which is the grammar's entry point.
    #[must_use]
    pub fn first(&self) -> Option<(&str, &Rule)> {
        self.entries.first().map(|(name, rule)| (name.as_str(), rule))
    }

    /// Number of defined rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no rules are defined.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Inserts a rule. A redefinition replaces the earlier rule in place.
    pub fn insert(&mut self, name: String, rule: Rule) {
        if let Some(&i) = self.index.get(&name) {
            self.entries[i].1 = rule;
        } else {
            self.index.insert(name.clone(), self.entries.len());
            self.entries.push((name, rule));
        }
    }
}

impl FromIterator<(String, Rule)> for Rules {
    fn from_iter<I: IntoIterator<Item = (String, Rule)>>(iter: I) -> Self {
        let mut rules = Rules::default();
        for (name, rule) in iter {
            rules.insert(name, rule);
        }
        rules
    }
}

impl<'de> Deserialize<'de> for Rules {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RulesVisitor;

        impl<'de> Visitor<'de> for RulesVisitor {
            type Value = Rules;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of rule names to rules")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Rules, A::Error> {
                let mut rules = Rules::default();
                while let Some((name, rule)) = map.next_entry::<String, Rule>()? {
                    rules.insert(name, rule);
                }
                Ok(rules)
            }
        }

        deserializer.deserialize_map(RulesVisitor)
    }
}

/// Parse a JSON grammar definition into a strongly typed [`Grammar`] structure.
///
/// # Errors
///
/// Returns [`GrammarError::JsonParse`] if the provided string is not valid JSON
/// or fails schema deserialization.
pub fn parse_grammar(json: &str) -> Result<Grammar, GrammarError> {
    Ok(serde_json::from_str(json)?)
}

/// Errors raised while reading a grammar descriptor.
#[derive(Debug, thiserror::Error)]
pub enum GrammarError {
    /// The input JSON was syntactically invalid or structurally mismatched.
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl Grammar {
    /// Looks up a rule by name.
    #[must_use]
    pub fn rule(&self, name: &str) -> Option<&Rule> {
        self.rules.get(name)
    }

    /// The name of the start rule, if the grammar has any rules.
    #[must_use]
    pub fn entry_rule(&self) -> Option<&str> {
        self.rules.first().map(|(name, _)| name)
    }

    /// Returns `true` if `name` is a supertype of this grammar.
    #[must_use]
    pub fn is_supertype(&self, name: &str) -> bool {
        self.supertypes
            .as_ref()
            .is_some_and(|s| s.iter().any(|t| t == name))
    }

    /// Hidden rules start with an underscore and never appear as nodes.
    #[must_use]
    pub fn is_hidden(name: &str) -> bool {
        name.starts_with('_')
    }

    /// Extras, or an empty slice when none are declared.
    #[must_use]
    pub fn extras(&self) -> &[Rule] {
        self.extras.as_deref().unwrap_or_default()
    }
}
