//! Pretty-printing (`spec.md` §4.5): a structural `repr` for debugging and a
//! surface-syntax printer that reproduces the grammar form, consulting the
//! precedence table from §4.1 to decide when a child needs `{...}` grouping.

use crate::types::{CharSet, MetaAst};

/// Precedence level matching `spec.md` §4.1's table (1 = tightest-binding
/// atoms, 9 = loosest-binding alternation).
fn precedence_level(ast: &MetaAst) -> u8 {
    match ast {
        MetaAst::Eps
        | MetaAst::Str(_)
        | MetaAst::Caseless(_)
        | MetaAst::Ident(_)
        | MetaAst::Charset(_)
        | MetaAst::Capture(_) => 1,
        MetaAst::Star(_) | MetaAst::Plus(_) | MetaAst::Option(_) => 2,
        MetaAst::Compliment(_) => 3,
        MetaAst::Cat(_) => 4,
        MetaAst::Intersect(_, _) => 5,
        MetaAst::Reject(_, _) => 6,
        MetaAst::GreaterThan(_, _) | MetaAst::LessThan(_, _) => 7,
        MetaAst::NoFollow(_, _) => 8,
        MetaAst::Or(_, _) => 9,
    }
}

/// True when `child`, printed as an operand of a node at `parent_level`,
/// needs `{...}` grouping to round-trip: either it binds looser than the
/// parent (higher level number), or it binds at the same level but sits on
/// the right of a left-associative operator — every level here is
/// left-associative (see parser/mod.rs), so the right operand is always the
/// non-associative side.
fn needs_braces(parent_level: u8, is_right_operand: bool, child: &MetaAst) -> bool {
    let child_level = precedence_level(child);
    child_level > parent_level || (child_level == parent_level && is_right_operand)
}

fn print_child(ast: &MetaAst, parent_level: u8, is_right_operand: bool) -> String {
    let rendered = print_surface(ast);
    if needs_braces(parent_level, is_right_operand, ast) {
        format!("{{{rendered}}}")
    } else {
        rendered
    }
}

fn escape_literal(s: &str, quote: char) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c == quote || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn print_charset(cs: &CharSet) -> String {
    if *cs == CharSet::universal() {
        return "\\U".to_string();
    }
    let mut body = String::new();
    for &(lo, hi) in cs.ranges() {
        if hi >= crate::types::charset::AUGMENT {
            continue;
        }
        match char::from_u32(lo) {
            Some(lo_c) if lo == hi => push_charset_char(&mut body, lo_c),
            Some(lo_c) => {
                push_charset_char(&mut body, lo_c);
                body.push('-');
                if let Some(hi_c) = char::from_u32(hi) {
                    push_charset_char(&mut body, hi_c);
                }
            }
            None => {}
        }
    }
    format!("[{body}]")
}

fn push_charset_char(out: &mut String, c: char) {
    if c == ']' || c == '\\' || c == '-' {
        out.push('\\');
    }
    out.push(c);
}

/// Reproduces the surface grammar form for `ast` (`spec.md` §4.5).
pub fn print_surface(ast: &MetaAst) -> String {
    match ast {
        MetaAst::Eps => "\\e".to_string(),
        MetaAst::Str(s) => format!("\"{}\"", escape_literal(s, '"')),
        MetaAst::Caseless(inner) => match inner.as_ref() {
            MetaAst::Str(s) => format!("'{}'", escape_literal(s, '\'')),
            other => print_surface(other),
        },
        MetaAst::Ident(name) => name.clone(),
        MetaAst::Charset(cs) => print_charset(cs),
        MetaAst::Compliment(inner) => format!("~{}", print_child(inner, 3, false)),
        MetaAst::Star(inner) => format!("{}*", print_child(inner, 2, false)),
        MetaAst::Plus(inner) => format!("{}+", print_child(inner, 2, false)),
        MetaAst::Option(inner) => format!("{}?", print_child(inner, 2, false)),
        MetaAst::Capture(inner) => format!("({})", print_surface(inner)),
        MetaAst::Cat(children) => children
            .iter()
            .map(|c| {
                // A `Cat` child of a `Cat` always needs `{...}` grouping: unlike the
                // binary operators, concatenation is n-ary, so an equal-precedence
                // child would otherwise flatten into its parent's child list on
                // reparse (`{a b} c` must not print as the indistinguishable `a b c`).
                if matches!(c, MetaAst::Cat(_)) {
                    format!("{{{}}}", print_surface(c))
                } else {
                    print_child(c, 4, false)
                }
            })
            .collect::<Vec<_>>()
            .join(" "),
        MetaAst::Intersect(l, r) => {
            format!("{} & {}", print_child(l, 5, false), print_child(r, 5, true))
        }
        MetaAst::Reject(l, r) => {
            format!("{} - {}", print_child(l, 6, false), print_child(r, 6, true))
        }
        MetaAst::GreaterThan(l, r) => {
            format!("{} > {}", print_child(l, 7, false), print_child(r, 7, true))
        }
        MetaAst::LessThan(l, r) => {
            format!("{} < {}", print_child(l, 7, false), print_child(r, 7, true))
        }
        MetaAst::NoFollow(l, r) => {
            format!("{} # {}", print_child(l, 8, false), print_child(r, 8, true))
        }
        MetaAst::Or(l, r) => {
            format!("{} | {}", print_child(l, 9, false), print_child(r, 9, true))
        }
    }
}

/// A structural dump of `ast`, one node per line, children indented two
/// spaces deeper than their parent — for debugging, not round-tripping.
pub fn print_repr(ast: &MetaAst) -> String {
    let mut out = String::new();
    write_repr(ast, 0, &mut out);
    out
}

fn write_repr(ast: &MetaAst, indent: usize, out: &mut String) {
    let pad = "  ".repeat(indent);
    match ast {
        MetaAst::Eps => out.push_str(&format!("{pad}eps\n")),
        MetaAst::Str(s) => out.push_str(&format!("{pad}string {s:?}\n")),
        MetaAst::Ident(name) => out.push_str(&format!("{pad}identifier {name}\n")),
        MetaAst::Charset(cs) => out.push_str(&format!("{pad}charset {:?}\n", cs.ranges())),
        MetaAst::Caseless(inner) => {
            out.push_str(&format!("{pad}caseless\n"));
            write_repr(inner, indent + 1, out);
        }
        MetaAst::Compliment(inner) => {
            out.push_str(&format!("{pad}compliment\n"));
            write_repr(inner, indent + 1, out);
        }
        MetaAst::Star(inner) => {
            out.push_str(&format!("{pad}star\n"));
            write_repr(inner, indent + 1, out);
        }
        MetaAst::Plus(inner) => {
            out.push_str(&format!("{pad}plus\n"));
            write_repr(inner, indent + 1, out);
        }
        MetaAst::Option(inner) => {
            out.push_str(&format!("{pad}option\n"));
            write_repr(inner, indent + 1, out);
        }
        MetaAst::Capture(inner) => {
            out.push_str(&format!("{pad}capture\n"));
            write_repr(inner, indent + 1, out);
        }
        MetaAst::Cat(children) => {
            out.push_str(&format!("{pad}cat\n"));
            for child in children {
                write_repr(child, indent + 1, out);
            }
        }
        MetaAst::Intersect(l, r) => write_binary_repr("intersect", l, r, indent, out),
        MetaAst::Or(l, r) => write_binary_repr("or", l, r, indent, out),
        MetaAst::GreaterThan(l, r) => write_binary_repr("greaterthan", l, r, indent, out),
        MetaAst::LessThan(l, r) => write_binary_repr("lessthan", l, r, indent, out),
        MetaAst::Reject(l, r) => write_binary_repr("reject", l, r, indent, out),
        MetaAst::NoFollow(l, r) => write_binary_repr("nofollow", l, r, indent, out),
    }
}

fn write_binary_repr(tag: &str, l: &MetaAst, r: &MetaAst, indent: usize, out: &mut String) {
    let pad = "  ".repeat(indent);
    out.push_str(&format!("{pad}{tag}\n"));
    write_repr(l, indent + 1, out);
    write_repr(r, indent + 1, out);
}

impl std::fmt::Display for MetaAst {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&print_surface(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::parser::parse;
    use crate::types::MetaParserConfig;

    fn roundtrip(src: &str) -> MetaAst {
        let (tokens, _) = tokenize(src.as_bytes()).unwrap();
        let ast = parse(&tokens, &MetaParserConfig::default()).unwrap();
        let printed = print_surface(&ast);
        let (tokens2, _) = tokenize(printed.as_bytes()).unwrap();
        parse(&tokens2, &MetaParserConfig::default()).unwrap()
    }

    #[test]
    fn precedence_soundness_concat_binds_tighter_than_alternation() {
        let ast = roundtrip("A|B C");
        assert_eq!(print_surface(&ast), "A | B C");
    }

    #[test]
    fn round_trip_preserves_structure_for_mixed_operators() {
        let src = r#""foo" | "bar" - [a-z]"#;
        let (tokens, _) = tokenize(src.as_bytes()).unwrap();
        let original = parse(&tokens, &MetaParserConfig::default()).unwrap();
        let rebuilt = roundtrip(src);
        assert!(original.structurally_equivalent(&rebuilt));
    }

    #[test]
    fn right_nested_same_precedence_operator_gets_braces() {
        let ast = MetaAst::Reject(
            Box::new(MetaAst::Ident("x".into())),
            Box::new(MetaAst::Reject(
                Box::new(MetaAst::Ident("y".into())),
                Box::new(MetaAst::Ident("z".into())),
            )),
        );
        assert_eq!(print_surface(&ast), "x - {y - z}");
    }

    #[test]
    fn repr_indents_children() {
        let ast = MetaAst::Star(Box::new(MetaAst::Ident("x".into())));
        assert_eq!(print_repr(&ast), "star\n  identifier x\n");
    }

    /// A `cat` nested directly inside another `cat` (reachable via `{a b} c`)
    /// must round-trip: without explicit `{...}` grouping the printer would
    /// flatten it into a single 3-child `cat`, a different tree.
    #[test]
    fn nested_cat_child_is_grouped_to_preserve_structure() {
        let ast = MetaAst::Cat(vec![
            MetaAst::Cat(vec![MetaAst::Ident("a".into()), MetaAst::Ident("b".into())]),
            MetaAst::Ident("c".into()),
        ]);
        let printed = print_surface(&ast);
        assert_eq!(printed, "{a b} c");
        let (tokens, _) = tokenize(printed.as_bytes()).unwrap();
        let reparsed = parse(&tokens, &MetaParserConfig::default()).unwrap();
        assert_eq!(ast, reparsed);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::parser::parse;
    use crate::test_support::arb_meta_ast;
    use crate::types::MetaParserConfig;
    use proptest::prelude::*;

    proptest! {
        /// `spec.md` §8 invariant 1: `parse(print(a)) ≡ a` under structural
        /// equivalence, checked against the folded form (invariant 1 is
        /// stated "for any folded AST a").
        #[test]
        fn round_trip_holds_for_arbitrary_folded_ast(mut ast in arb_meta_ast()) {
            crate::fold::fold_to_fixed_point(&mut ast);
            let printed = print_surface(&ast);
            let (tokens, _) = tokenize(printed.as_bytes()).unwrap();
            let reparsed = parse(&tokens, &MetaParserConfig::default()).unwrap();
            prop_assert!(ast.structurally_equivalent(&reparsed));
        }
    }
}
