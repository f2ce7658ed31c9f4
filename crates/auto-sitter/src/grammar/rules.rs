//! Core types for representing Tree-sitter grammar rules.
//!
//! This module contains the types used to model grammar rules and their
//! structure according to the Tree-sitter JSON schema.

use serde::Deserialize;

/// Represents a grammar rule in the Tree-sitter format.
///
/// Each rule corresponds to a node in the grammar's rule graph, identified by a
/// [`RuleType`] and containing type-specific fields such as `members` or
/// `content`.
///
/// A `Rule` can be atomic (like a literal or regex) or composite
/// (like a sequence, choice, or precedence group).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Rule {
    /// The discriminant identifying what kind of rule this is.
    #[serde(rename = "type")]
    pub rule_type: RuleType,

    /// Optional literal or numeric value, depending on rule kind.
    #[serde(default)]
    pub value: Option<RuleValue>,

    /// Optional name used by `SYMBOL` or `FIELD` rules.
    #[serde(default)]
    pub name: Option<String>,

    /// Optional nested rule for unary constructs such as `REPEAT` or `PREC`.
    #[serde(default)]
    pub content: Option<Box<Rule>>,

    /// List of child rules for compound constructs (`SEQ`, `CHOICE`).
    #[serde(default)]
    pub members: Vec<Rule>,

    /// Whether the node produced by an `ALIAS` rule is named.
    #[serde(default)]
    pub named: Option<bool>,

    /// Regex flags attached to a `PATTERN` rule.
    #[serde(default)]
    pub flags: Option<String>,

    /// Optional context label used for reserved-word handling.
    #[serde(default)]
    pub context_name: Option<String>,
}

/// A literal or numeric value attached to a rule node.
///
/// Precedence wrappers carry either an integer level or the name of a
/// declared precedence; literal and pattern rules carry their source text.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RuleValue {
    /// An integer numeric value (used by precedence modifiers).
    Integer(i32),

    /// A string value (e.g. `"+"`, `"if"`, or a named precedence).
    String(String),
}

/// The enumeration of all recognized Tree-sitter rule types.
///
/// Each variant corresponds to one of the `type` strings found in the JSON
/// grammar format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum RuleType {
    /// An empty (ε) production.
    #[serde(rename = "BLANK")]
    Blank,
    /// A literal string token.
    #[serde(rename = "STRING")]
    String,
    /// A regular-expression pattern token.
    #[serde(rename = "PATTERN")]
    Pattern,
    /// A reference to another named rule.
    #[serde(rename = "SYMBOL")]
    Symbol,
    /// A rule that matches one of several alternatives.
    #[serde(rename = "CHOICE")]
    Choice,
    /// A sequential composition of member rules.
    #[serde(rename = "SEQ")]
    Seq,
    /// A zero-or-more repetition of a rule.
    #[serde(rename = "REPEAT")]
    Repeat,
    /// A one-or-more repetition of a rule.
    #[serde(rename = "REPEAT1")]
    Repeat1,
    /// A generic precedence wrapper.
    #[serde(rename = "PREC")]
    Prec,
    /// A left-associative precedence wrapper.
    #[serde(rename = "PREC_LEFT")]
    PrecLeft,
    /// A right-associative precedence wrapper.
    #[serde(rename = "PREC_RIGHT")]
    PrecRight,
    /// A dynamic (runtime) precedence wrapper.
    #[serde(rename = "PREC_DYNAMIC")]
    PrecDynamic,
    /// A named field applied to a subrule.
    #[serde(rename = "FIELD")]
    Field,
    /// An alias providing an alternate node name.
    #[serde(rename = "ALIAS")]
    Alias,
    /// A tokenization wrapper.
    #[serde(rename = "TOKEN")]
    Token,
    /// A token that must appear immediately without leading trivia.
    #[serde(rename = "IMMEDIATE_TOKEN")]
    ImmediateToken,
    /// A reserved-word context wrapper.
    #[serde(rename = "RESERVED")]
    Reserved,
}

impl Rule {
    /// Returns the canonical string name of this rule type.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self.rule_type {
            RuleType::Blank => "BLANK",
            RuleType::String => "STRING",
            RuleType::Pattern => "PATTERN",
            RuleType::Symbol => "SYMBOL",
            RuleType::Choice => "CHOICE",
            RuleType::Seq => "SEQ",
            RuleType::Repeat => "REPEAT",
            RuleType::Repeat1 => "REPEAT1",
            RuleType::Prec => "PREC",
            RuleType::PrecLeft => "PREC_LEFT",
            RuleType::PrecRight => "PREC_RIGHT",
            RuleType::PrecDynamic => "PREC_DYNAMIC",
            RuleType::Field => "FIELD",
            RuleType::Alias => "ALIAS",
            RuleType::Token => "TOKEN",
            RuleType::ImmediateToken => "IMMEDIATE_TOKEN",
            RuleType::Reserved => "RESERVED",
        }
    }

    /// Returns `true` if this rule represents a terminal (lexical) token.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self.rule_type, RuleType::String | RuleType::Pattern)
    }

    /// Returns `true` if this rule collapses its content into a single token.
    #[must_use]
    pub fn is_token(&self) -> bool {
        matches!(self.rule_type, RuleType::Token | RuleType::ImmediateToken)
    }

    /// Returns `true` if this rule is a symbol reference.
    #[must_use]
    pub fn is_symbol(&self) -> bool {
        matches!(self.rule_type, RuleType::Symbol)
    }

    /// Returns the referenced symbol name, if applicable.
    #[must_use]
    pub fn symbol_name(&self) -> Option<&str> {
        if self.is_symbol() {
            self.name.as_deref()
        } else {
            None
        }
    }

    /// Returns the field name if this rule is a `FIELD` wrapper.
    #[must_use]
    pub fn field_name(&self) -> Option<&str> {
        if matches!(self.rule_type, RuleType::Field) {
            self.name.as_deref()
        } else {
            None
        }
    }

    /// Returns the alias name and whether it is named, if this is an `ALIAS` rule.
    #[must_use]
    pub fn alias_value(&self) -> Option<(&str, bool)> {
        if matches!(self.rule_type, RuleType::Alias) {
            self.text_value()
                .map(|value| (value, self.named.unwrap_or(false)))
        } else {
            None
        }
    }

    /// Returns the numeric precedence value if this rule is a precedence wrapper.
    ///
    /// Named precedences (string values) yield `None`.
    #[must_use]
    pub fn precedence(&self) -> Option<i32> {
        match self.rule_type {
            RuleType::Prec | RuleType::PrecLeft | RuleType::PrecRight | RuleType::PrecDynamic => {
                self.value.as_ref().and_then(|v| match v {
                    RuleValue::Integer(i) => Some(*i),
                    RuleValue::String(_) => None,
                })
            }
            _ => None,
        }
    }

    /// Returns the literal string value if this is a `STRING` rule.
    #[must_use]
    pub fn string_value(&self) -> Option<&str> {
        if matches!(self.rule_type, RuleType::String) {
            self.text_value()
        } else {
            None
        }
    }

    /// Returns the pattern source if this is a `PATTERN` rule.
    #[must_use]
    pub fn pattern_value(&self) -> Option<&str> {
        if matches!(self.rule_type, RuleType::Pattern) {
            self.text_value()
        } else {
            None
        }
    }

    /// Iterates over the direct sub-rules: `content` first, then `members`.
    pub fn children(&self) -> impl Iterator<Item = &Rule> {
        self.content.as_deref().into_iter().chain(&self.members)
    }

    fn text_value(&self) -> Option<&str> {
        self.value.as_ref().and_then(|v| match v {
            RuleValue::String(s) => Some(s.as_str()),
            RuleValue::Integer(_) => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_choice_rule() {
        let json = r#"{
            "type": "CHOICE",
            "members": [
                {
                    "type": "STRING",
                    "value": "hello"
                },
                {
                    "type": "PATTERN",
                    "value": "[0-9]+"
                }
            ]
        }"#;

        let rule: Rule = serde_json::from_str(json).unwrap();
        assert_eq!(rule.type_name(), "CHOICE");
        assert_eq!(rule.members.len(), 2);
        assert_eq!(rule.members[0].string_value(), Some("hello"));
        assert_eq!(rule.members[1].pattern_value(), Some("[0-9]+"));
        assert!(rule.members.iter().all(Rule::is_terminal));
    }

    #[test]
    fn test_parse_precedence() {
        let json = r#"{
            "type": "PREC_LEFT",
            "value": 1,
            "content": {
                "type": "SEQ",
                "members": [
                    {"type": "SYMBOL", "name": "expr"},
                    {"type": "STRING", "value": "+"},
                    {"type": "SYMBOL", "name": "expr"}
                ]
            }
        }"#;

        let rule: Rule = serde_json::from_str(json).unwrap();
        assert_eq!(rule.precedence(), Some(1));
        assert!(matches!(rule.rule_type, RuleType::PrecLeft));
        assert_eq!(rule.children().count(), 1);
    }

    #[test]
    fn test_named_precedence_has_no_level() {
        let json = r#"{
            "type": "PREC",
            "value": "call",
            "content": {"type": "BLANK"}
        }"#;

        let rule: Rule = serde_json::from_str(json).unwrap();
        assert_eq!(rule.precedence(), None);
        assert_eq!(rule.value, Some(RuleValue::String("call".into())));
    }

    #[test]
    fn test_alias_and_field_accessors() {
        let json = r#"{
            "type": "FIELD",
            "name": "then",
            "content": {
                "type": "ALIAS",
                "content": {"type": "SYMBOL", "name": "body"},
                "named": true,
                "value": "then"
            }
        }"#;

        let rule: Rule = serde_json::from_str(json).unwrap();
        assert_eq!(rule.field_name(), Some("then"));
        let alias = rule.content.as_deref().unwrap();
        assert_eq!(alias.alias_value(), Some(("then", true)));
        assert_eq!(alias.content.as_deref().unwrap().symbol_name(), Some("body"));
    }

    #[test]
    fn test_reserved_rule_uses_context_name() {
        let json = r#"{
            "type": "RESERVED",
            "context_name": "properties",
            "content": {"type": "SYMBOL", "name": "ident"}
        }"#;

        let rule: Rule = serde_json::from_str(json).unwrap();
        assert_eq!(rule.type_name(), "RESERVED");
        assert_eq!(rule.name, None);
        assert_eq!(rule.context_name.as_deref(), Some("properties"));
        assert_eq!(rule.children().next().unwrap().symbol_name(), Some("ident"));
    }

    #[test]
    fn test_unknown_rule_type_is_rejected() {
        let json = r#"{"type": "LOOKAHEAD"}"#;
        assert!(serde_json::from_str::<Rule>(json).is_err());
    }
}
