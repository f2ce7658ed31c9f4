//! Validation routines for Tree-sitter grammar descriptors.
//!
//! This module performs structural checks over parsed [`Grammar`](crate::grammar::Grammar)
//! definitions, such as verifying symbol references, ensuring all rules are reachable,
//! detecting left recursion, and confirming precedence consistency. A descriptor
//! must pass these checks before a [`Language`](crate::Language) is built from it.

use crate::grammar::{Grammar, Rule, RuleType};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Represents a validation failure encountered when checking a grammar.
///
/// Validation errors indicate issues such as undefined symbols or metadata
/// that names rules the grammar never defines.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// The grammar defines no rules, so there is no entry point.
    #[error("grammar has no rules")]
    Empty,

    /// A `SYMBOL` rule references a rule that is not defined.
    #[error("undefined symbol '{name}' referenced in rule '{context}'")]
    UndefinedSymbol {
        /// The missing rule name.
        name: String,
        /// The rule (or `extras`) containing the reference.
        context: String,
    },

    /// Grammar metadata (`word`, `supertypes`, `inline`, `conflicts`) names an undefined rule.
    #[error("{section} references undefined rule '{name}'")]
    UndefinedReference {
        /// The missing rule name.
        name: String,
        /// The metadata section containing the reference.
        section: &'static str,
    },
}

/// Performs semantic validation of a parsed [`Grammar`](crate::grammar::Grammar).
///
/// This function runs several consistency passes over the grammar:
///
/// - Checks that all referenced symbols are defined.
/// - Checks that metadata only names defined rules.
/// - Warns about unreachable rules.
/// - Reports immediate left recursion.
/// - Reports rules mixing precedence levels.
///
/// # Errors
///
/// Returns a [`ValidationError`] if any structural rule violation is detected.
#[tracing::instrument(
    level = "debug",
    skip_all,
    fields(grammar = %grammar.name, rules = grammar.rules.len())
)]
pub fn validate(grammar: &Grammar) -> Result<(), ValidationError> {
    if grammar.rules.is_empty() {
        return Err(ValidationError::Empty);
    }

    // Check for undefined symbol references
    check_undefined_symbols(grammar)?;

    // Check that metadata points at real rules
    check_metadata_references(grammar)?;

    // Check for unreachable rules
    check_unreachable_rules(grammar);

    // Detect immediate left recursion
    check_left_recursion(grammar);

    // Validate precedence usage
    check_precedence(grammar);

    Ok(())
}

fn check_undefined_symbols(grammar: &Grammar) -> Result<(), ValidationError> {
    for (rule_name, rule) in grammar.rules.iter() {
        check_rule_symbols(rule, grammar, rule_name)?;
    }

    for extra in grammar.extras() {
        check_rule_symbols(extra, grammar, "extras")?;
    }

    Ok(())
}

fn check_rule_symbols(
    rule: &Rule,
    grammar: &Grammar,
    context: &str,
) -> Result<(), ValidationError> {
    match rule.rule_type {
        RuleType::Symbol => {
            if let Some(name) = &rule.name {
                if !grammar.rules.contains(name) && !is_external(grammar, name) {
                    return Err(ValidationError::UndefinedSymbol {
                        name: name.clone(),
                        context: context.to_string(),
                    });
                }
            }
        }

        RuleType::Choice | RuleType::Seq => {
            for member in &rule.members {
                check_rule_symbols(member, grammar, context)?;
            }
        }

        RuleType::Repeat
        | RuleType::Repeat1
        | RuleType::Prec
        | RuleType::PrecLeft
        | RuleType::PrecRight
        | RuleType::PrecDynamic
        | RuleType::Field
        | RuleType::Alias
        | RuleType::Reserved => {
            if let Some(content) = &rule.content {
                check_rule_symbols(content, grammar, context)?;
            }
        }

        RuleType::Blank
        | RuleType::String
        | RuleType::Pattern
        | RuleType::Token
        | RuleType::ImmediateToken => {
            // terminals: nothing to traverse
        }
    }
    Ok(())
}

fn is_external(grammar: &Grammar, name: &str) -> bool {
    grammar
        .externals
        .as_ref()
        .is_some_and(|ext| ext.iter().any(|r| r.symbol_name() == Some(name)))
}

fn check_metadata_references(grammar: &Grammar) -> Result<(), ValidationError> {
    let require = |name: &String, section: &'static str| {
        if grammar.rules.contains(name) {
            Ok(())
        } else {
            Err(ValidationError::UndefinedReference {
                name: name.clone(),
                section,
            })
        }
    };

    if let Some(word) = &grammar.word {
        require(word, "word")?;
    }
    for name in grammar.supertypes.iter().flatten() {
        require(name, "supertypes")?;
    }
    for name in grammar.inline.iter().flatten() {
        require(name, "inline")?;
    }
    for name in grammar.conflicts.iter().flatten().flatten() {
        require(name, "conflicts")?;
    }

    Ok(())
}

fn check_unreachable_rules(grammar: &Grammar) {
    let mut to_visit: Vec<String> = Vec::new();

    // Roots: the entry point, anything that may appear as an extra, and the word token
    if let Some(entry_point) = grammar.entry_rule() {
        to_visit.push(entry_point.to_string());
    }
    for extra in grammar.extras() {
        collect_referenced_symbols(extra, &mut to_visit);
    }
    if let Some(word) = &grammar.word {
        to_visit.push(word.clone());
    }

    let mut reachable = HashSet::new();
    while let Some(rule_name) = to_visit.pop() {
        if let Some(rule) = grammar.rule(&rule_name) {
            if reachable.insert(rule_name) {
                collect_referenced_symbols(rule, &mut to_visit);
            }
        }
    }

    for rule_name in grammar.rules.names() {
        let inline_contains = grammar
            .inline
            .as_ref()
            .is_some_and(|v| v.iter().any(|n| n == rule_name));

        if !reachable.contains(rule_name) && !inline_contains {
            tracing::warn!(rule = rule_name, "unreachable rule");
        }
    }
}

fn collect_referenced_symbols(rule: &Rule, symbols: &mut Vec<String>) {
    if let Some(name) = rule.symbol_name() {
        symbols.push(name.to_string());
    }
    for child in rule.children() {
        collect_referenced_symbols(child, symbols);
    }
}

fn check_left_recursion(grammar: &Grammar) {
    // Left recursion is fine for a GLR table; record it for grammar authors.
    for (rule_name, rule) in grammar.rules.iter() {
        if has_immediate_left_recursion(rule, rule_name) {
            tracing::debug!(rule = rule_name, "rule is immediately left-recursive");
        }
    }
}

fn has_immediate_left_recursion(rule: &Rule, target: &str) -> bool {
    match rule.rule_type {
        RuleType::Symbol => rule.name.as_deref() == Some(target),

        RuleType::Seq => rule
            .members
            .first()
            .is_some_and(|first| has_immediate_left_recursion(first, target)),

        RuleType::Choice => rule
            .members
            .iter()
            .any(|member| has_immediate_left_recursion(member, target)),

        RuleType::Prec
        | RuleType::PrecLeft
        | RuleType::PrecRight
        | RuleType::PrecDynamic
        | RuleType::Field
        | RuleType::Alias => rule
            .content
            .as_deref()
            .is_some_and(|content| has_immediate_left_recursion(content, target)),

        _ => false,
    }
}

fn check_precedence(grammar: &Grammar) {
    let mut prec_levels: BTreeMap<&str, BTreeSet<i32>> = BTreeMap::new();

    for (rule_name, rule) in grammar.rules.iter() {
        collect_precedence_levels(rule, &mut prec_levels, rule_name);
    }

    for (rule, levels) in &prec_levels {
        if levels.len() > 1 {
            tracing::debug!(rule, ?levels, "rule uses multiple precedence levels");
        }
    }
}

fn collect_precedence_levels<'g>(
    rule: &Rule,
    levels: &mut BTreeMap<&'g str, BTreeSet<i32>>,
    context: &'g str,
) {
    if let Some(p) = rule.precedence() {
        levels.entry(context).or_default().insert(p);
    }
    for child in rule.children() {
        collect_precedence_levels(child, levels, context);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::parse_grammar;

    fn grammar(json: &str) -> Grammar {
        parse_grammar(json).unwrap()
    }

    #[test]
    fn test_valid_grammar_passes() {
        let g = grammar(
            r##"{
                "name": "calc",
                "word": "ident",
                "extras": [{"type": "SYMBOL", "name": "comment"}, {"type": "PATTERN", "value": "\\s"}],
                "supertypes": ["expr"],
                "rules": {
                    "program": {"type": "REPEAT", "content": {"type": "SYMBOL", "name": "expr"}},
                    "expr": {"type": "CHOICE", "members": [
                        {"type": "SYMBOL", "name": "ident"},
                        {"type": "SYMBOL", "name": "sum"}
                    ]},
                    "sum": {"type": "PREC_LEFT", "value": 1, "content": {"type": "SEQ", "members": [
                        {"type": "SYMBOL", "name": "expr"},
                        {"type": "STRING", "value": "+"},
                        {"type": "SYMBOL", "name": "expr"}
                    ]}},
                    "ident": {"type": "PATTERN", "value": "[a-z]+"},
                    "comment": {"type": "TOKEN", "content": {"type": "PATTERN", "value": "#.*"}}
                }
            }"##,
        );

        assert_eq!(validate(&g), Ok(()));
    }

    #[test]
    fn test_empty_grammar_is_rejected() {
        let g = grammar(r#"{"name": "empty", "rules": {}}"#);
        assert_eq!(validate(&g), Err(ValidationError::Empty));
    }

    #[test]
    fn test_undefined_symbol_is_reported_with_context() {
        let g = grammar(
            r#"{
                "name": "broken",
                "rules": {
                    "program": {"type": "FIELD", "name": "body", "content": {"type": "SYMBOL", "name": "missing"}}
                }
            }"#,
        );

        let err = validate(&g).unwrap_err();
        assert_eq!(
            err,
            ValidationError::UndefinedSymbol {
                name: "missing".into(),
                context: "program".into(),
            }
        );
        assert_eq!(
            err.to_string(),
            "undefined symbol 'missing' referenced in rule 'program'"
        );
    }

    #[test]
    fn test_undefined_symbol_in_extras() {
        let g = grammar(
            r#"{
                "name": "broken",
                "extras": [{"type": "SYMBOL", "name": "comment"}],
                "rules": {"program": {"type": "BLANK"}}
            }"#,
        );

        assert!(matches!(
            validate(&g),
            Err(ValidationError::UndefinedSymbol { context, .. }) if context == "extras"
        ));
    }

    #[test]
    fn test_external_symbols_count_as_defined() {
        let g = grammar(
            r#"{
                "name": "ext",
                "externals": [{"type": "SYMBOL", "name": "heredoc"}],
                "rules": {"program": {"type": "SYMBOL", "name": "heredoc"}}
            }"#,
        );

        assert_eq!(validate(&g), Ok(()));
    }

    #[test]
    fn test_metadata_must_name_defined_rules() {
        let cases = [
            (r#""word": "ident""#, "word"),
            (r#""supertypes": ["expr"]"#, "supertypes"),
            (r#""inline": ["helper"]"#, "inline"),
            (r#""conflicts": [["program", "other"]]"#, "conflicts"),
        ];

        for (fragment, expected) in cases {
            let g = grammar(&format!(
                r#"{{"name": "meta", {fragment}, "rules": {{"program": {{"type": "BLANK"}}}}}}"#
            ));
            match validate(&g) {
                Err(ValidationError::UndefinedReference { section, .. }) => {
                    assert_eq!(section, expected);
                }
                other => panic!("expected undefined reference in {expected}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_left_recursion_detection() {
        let g = grammar(
            r#"{
                "name": "lr",
                "rules": {
                    "list": {"type": "CHOICE", "members": [
                        {"type": "PREC_LEFT", "value": 0, "content": {"type": "SEQ", "members": [
                            {"type": "SYMBOL", "name": "list"},
                            {"type": "STRING", "value": ","}
                        ]}},
                        {"type": "STRING", "value": "x"}
                    ]}
                }
            }"#,
        );

        let list = g.rule("list").unwrap();
        assert!(has_immediate_left_recursion(list, "list"));
        assert!(!has_immediate_left_recursion(list, "other"));
        assert_eq!(validate(&g), Ok(()));
    }

    #[test]
    fn test_unreachable_rules_only_warn() {
        let g = grammar(
            r#"{
                "name": "orphan",
                "rules": {
                    "program": {"type": "STRING", "value": "a"},
                    "orphan": {"type": "STRING", "value": "b"}
                }
            }"#,
        );

        assert_eq!(validate(&g), Ok(()));
    }

    #[test]
    fn test_precedence_levels_are_collected_per_rule() {
        let g = grammar(
            r#"{
                "name": "prec",
                "rules": {
                    "bin": {"type": "CHOICE", "members": [
                        {"type": "PREC_LEFT", "value": 1, "content": {"type": "STRING", "value": "+"}},
                        {"type": "PREC_LEFT", "value": 2, "content": {"type": "STRING", "value": "*"}},
                        {"type": "PREC_LEFT", "value": 2, "content": {"type": "STRING", "value": "/"}}
                    ]}
                }
            }"#,
        );

        let mut levels = BTreeMap::new();
        for (name, rule) in g.rules.iter() {
            collect_precedence_levels(rule, &mut levels, name);
        }
        assert_eq!(levels["bin"], BTreeSet::from([1, 2]));
    }
}
