//! The highlight query only names node kinds and fields the grammar defines.

use tree_sitter_auto::HIGHLIGHTS_QUERY;

#[derive(Debug, Default)]
struct QueryNames {
    named: Vec<String>,
    anonymous: Vec<String>,
    fields: Vec<String>,
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.'
}

fn scan(query: &str) -> QueryNames {
    let mut names = QueryNames::default();
    let mut chars = query.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            ';' => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        break;
                    }
                }
            }
            '"' => {
                let mut literal = String::new();
                while let Some(c) = chars.next() {
                    match c {
                        '\\' => literal.extend(chars.next()),
                        '"' => break,
                        c => literal.push(c),
                    }
                }
                names.anonymous.push(literal);
            }
            '(' => {
                let mut kind = String::new();
                while let Some(&c) = chars.peek().filter(|c| is_word_char(**c)) {
                    kind.push(c);
                    chars.next();
                }
                if !kind.is_empty() && kind != "_" {
                    names.named.push(kind);
                }
            }
            '@' => {
                while chars.peek().is_some_and(|c| is_word_char(*c)) {
                    chars.next();
                }
            }
            c if c.is_ascii_alphabetic() => {
                let mut word = String::from(c);
                while let Some(&c) = chars.peek().filter(|c| is_word_char(**c)) {
                    word.push(c);
                    chars.next();
                }
                if chars.peek() == Some(&':') {
                    names.fields.push(word);
                }
            }
            _ => {}
        }
    }

    names
}

#[test]
fn test_scan_query_names() {
    let names = scan(
        r#"; comment with (ignored) "text"
        (fn name: (name) @function)
        ["if" "\""] @keyword"#,
    );
    assert_eq!(names.named, ["fn", "name"]);
    assert_eq!(names.anonymous, ["if", "\""]);
    assert_eq!(names.fields, ["name"]);
}

#[test]
fn test_highlight_query_matches_grammar() {
    let language = tree_sitter_auto::language().unwrap();
    let names = scan(HIGHLIGHTS_QUERY);

    assert!(!names.named.is_empty());
    for kind in &names.named {
        let id = language.id_for_node_kind(kind, true);
        assert!(id.is_some(), "unknown node kind ({kind})");
        assert!(
            id.is_some_and(|id| language.node_kind_is_visible(id)),
            "hidden node kind ({kind})"
        );
    }
    for literal in &names.anonymous {
        assert!(
            language.id_for_node_kind(literal, false).is_some(),
            "unknown token {literal:?}"
        );
    }
    for field in &names.fields {
        assert!(
            language.field_id_for_name(field).is_some(),
            "unknown field {field}:"
        );
    }
}
