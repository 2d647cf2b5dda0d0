//! The meta-parser: a Pratt-style precedence parser over a token window
//! (`spec.md` §4.1).
//!
//! Each call scans the current window for the lowest-precedence top-level
//! operator (skipping balanced bracket spans) and splits the window there;
//! the recursive calls on the split halves terminate because each half is
//! strictly shorter than its parent. Binds tightest to loosest exactly as
//! `spec.md` §4.1 orders them, with one resolved ambiguity: the spec's
//! tie-breaking paragraph describes alternation as right-associative in one
//! sentence and "equal-precedence operators are left-associative by
//! default (`|` included)" in the next. Since no operator in the precedence
//! table is ever actually declared right-associative, every level here
//! splits at the rightmost top-level occurrence. See DESIGN.md.

use crate::lexer::{MetaTok, MetaTokKind};
use crate::types::charset::MAX_CODEPOINT;
use crate::types::{CharSet, MetaAst, MetaError, MetaParserConfig};

const SURROGATE_RANGE: std::ops::RangeInclusive<u32> = 0xD800..=0xDFFF;

struct Ctx<'a> {
    config: &'a MetaParserConfig,
}

/// Parses a full meta-token sequence into a meta-AST rooted at one node.
pub fn parse(tokens: &[MetaTok], config: &MetaParserConfig) -> Result<MetaAst, MetaError> {
    let ctx = Ctx { config };
    parse_expr(&ctx, tokens, 0)
}

/// A binary operator level: the token kinds that belong to it, and how a
/// match builds its AST node. Levels 9 down to 5 in `spec.md` §4.1's table;
/// concatenation (4), prefix `~` (3), postfix repetition (2), and atoms (1)
/// are handled outside this table since they aren't single-token infix
/// operators.
struct BinaryLevel {
    kinds: &'static [MetaTokKind],
    /// Whether an empty side is tolerated as `eps` (true only for
    /// alternation — the glossary's "empty alternative" case) or is a
    /// fatal missing-operand error (every other binary level).
    allow_empty_side: bool,
    build: fn(MetaTokKind, MetaAst, MetaAst) -> MetaAst,
}

const BINARY_LEVELS: &[BinaryLevel] = &[
    BinaryLevel {
        kinds: &[MetaTokKind::Pipe],
        allow_empty_side: true,
        build: |_, l, r| MetaAst::Or(Box::new(l), Box::new(r)),
    },
    BinaryLevel {
        kinds: &[MetaTokKind::Hashtag],
        allow_empty_side: false,
        build: |_, l, r| MetaAst::NoFollow(Box::new(l), Box::new(r)),
    },
    BinaryLevel {
        kinds: &[MetaTokKind::Gt, MetaTokKind::Lt],
        allow_empty_side: false,
        build: |k, l, r| match k {
            MetaTokKind::Gt => MetaAst::GreaterThan(Box::new(l), Box::new(r)),
            _ => MetaAst::LessThan(Box::new(l), Box::new(r)),
        },
    },
    BinaryLevel {
        kinds: &[MetaTokKind::Minus, MetaTokKind::Slash],
        allow_empty_side: false,
        build: |_, l, r| MetaAst::Reject(Box::new(l), Box::new(r)),
    },
    BinaryLevel {
        kinds: &[MetaTokKind::Ampersand],
        allow_empty_side: false,
        build: |_, l, r| MetaAst::Intersect(Box::new(l), Box::new(r)),
    },
];

fn parse_expr(ctx: &Ctx, tokens: &[MetaTok], depth: usize) -> Result<MetaAst, MetaError> {
    if tokens.is_empty() {
        return Ok(MetaAst::Eps);
    }
    for level in BINARY_LEVELS {
        if let Some(idx) = find_top_level_rightmost(tokens, level.kinds) {
            let (left_toks, right_toks) = (&tokens[..idx], &tokens[idx + 1..]);
            if !level.allow_empty_side && (left_toks.is_empty() || right_toks.is_empty()) {
                return Err(MetaError::MissingOperand { offset: tokens[idx].offset });
            }
            let left = parse_expr(ctx, left_toks, depth)?;
            let right = parse_expr(ctx, right_toks, depth)?;
            return Ok((level.build)(tokens[idx].kind, left, right));
        }
    }

    let units = split_into_units(tokens)?;
    if units.len() > 1 {
        let children = units
            .into_iter()
            .map(|u| parse_unary(ctx, u, depth))
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(MetaAst::cat(children));
    }
    parse_unary(ctx, units[0], depth)
}

/// Scans left to right for the rightmost top-level occurrence of one of
/// `kinds`, treating any `(...)`/`{...}` span as opaque.
fn find_top_level_rightmost(tokens: &[MetaTok], kinds: &[MetaTokKind]) -> Option<usize> {
    let mut depth = 0i32;
    let mut found = None;
    for (i, tok) in tokens.iter().enumerate() {
        match tok.kind {
            MetaTokKind::LParen | MetaTokKind::LBrace => depth += 1,
            MetaTokKind::RParen | MetaTokKind::RBrace => depth -= 1,
            k if depth == 0 && kinds.contains(&k) => found = Some(i),
            _ => {}
        }
    }
    found
}

/// Finds the index of the bracket token matching `tokens[open_idx]`,
/// tracking only same-family depth — nested spans of the *other* bracket
/// family are simply not counted, which still locates the correct match
/// since brackets are required to be well-nested.
fn find_matching_pair(tokens: &[MetaTok], open_idx: usize) -> Result<usize, MetaError> {
    let (open_kind, close_kind) = match tokens[open_idx].kind {
        MetaTokKind::LParen => (MetaTokKind::LParen, MetaTokKind::RParen),
        MetaTokKind::LBrace => (MetaTokKind::LBrace, MetaTokKind::RBrace),
        _ => unreachable!("find_matching_pair called on a non-bracket token"),
    };
    let mut depth = 0i32;
    for i in open_idx..tokens.len() {
        let k = tokens[i].kind;
        if k == open_kind {
            depth += 1;
        } else if k == close_kind {
            depth -= 1;
            if depth == 0 {
                return Ok(i);
            }
        }
    }
    Err(MetaError::UnbalancedBracket { offset: tokens[open_idx].offset })
}

/// Splits a token window containing no top-level binary operator into
/// maximal "single unit" spans (`spec.md` §4.1, "single-unit detection"):
/// an optional leading `~` chain, one atom (a bracket atom consumes its
/// whole balanced span), and an optional trailing postfix chain.
fn split_into_units(tokens: &[MetaTok]) -> Result<Vec<&[MetaTok]>, MetaError> {
    let mut units = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        let start = i;
        while i < tokens.len() && tokens[i].kind == MetaTokKind::Tilde {
            i += 1;
        }
        if i >= tokens.len() {
            return Err(MetaError::MissingOperand { offset: tokens[start].offset });
        }
        i = match tokens[i].kind {
            MetaTokKind::LParen | MetaTokKind::LBrace => find_matching_pair(tokens, i)? + 1,
            _ => i + 1,
        };
        while i < tokens.len()
            && matches!(
                tokens[i].kind,
                MetaTokKind::Star | MetaTokKind::Plus | MetaTokKind::Question | MetaTokKind::Integer
            )
        {
            i += 1;
        }
        units.push(&tokens[start..i]);
    }
    Ok(units)
}

/// Parses one "single unit" span: prefix `~`, postfix repetition, then atom.
fn parse_unary(ctx: &Ctx, tokens: &[MetaTok], depth: usize) -> Result<MetaAst, MetaError> {
    if tokens.is_empty() {
        return Err(MetaError::MissingOperand { offset: 0 });
    }
    if tokens[0].kind == MetaTokKind::Tilde {
        let inner = parse_unary(ctx, &tokens[1..], depth)?;
        return Ok(MetaAst::Compliment(Box::new(inner)));
    }
    if let Some(last) = tokens.last() {
        match last.kind {
            MetaTokKind::Star => {
                let inner = parse_unary(ctx, &tokens[..tokens.len() - 1], depth)?;
                return Ok(MetaAst::Star(Box::new(inner)));
            }
            MetaTokKind::Plus => {
                let inner = parse_unary(ctx, &tokens[..tokens.len() - 1], depth)?;
                return Ok(MetaAst::Plus(Box::new(inner)));
            }
            MetaTokKind::Question => {
                let inner = parse_unary(ctx, &tokens[..tokens.len() - 1], depth)?;
                return Ok(MetaAst::Option(Box::new(inner)));
            }
            MetaTokKind::Integer => {
                let n: u32 = last.text.parse().map_err(|_| MetaError::InvalidCount {
                    offset: last.offset,
                    reason: format!("'{}' is not a valid repetition count", last.text),
                })?;
                if n == 0 {
                    return Err(MetaError::InvalidCount {
                        offset: last.offset,
                        reason: "repetition count must be nonzero".to_string(),
                    });
                }
                let inner = parse_unary(ctx, &tokens[..tokens.len() - 1], depth)?;
                return Ok(MetaAst::counted(n, inner));
            }
            _ => {}
        }
    }
    parse_atom(ctx, tokens, depth)
}

fn parse_atom(ctx: &Ctx, tokens: &[MetaTok], depth: usize) -> Result<MetaAst, MetaError> {
    if tokens.len() == 1 {
        let tok = &tokens[0];
        return match tok.kind {
            MetaTokKind::Epsilon => Ok(MetaAst::Eps),
            MetaTokKind::Str => Ok(MetaAst::Str(unescape_text(&tok.text))),
            MetaTokKind::Caseless => {
                Ok(MetaAst::Caseless(Box::new(MetaAst::Str(unescape_text(&tok.text)))))
            }
            MetaTokKind::Charset => Ok(MetaAst::Charset(parse_charset_body(&tok.text))),
            MetaTokKind::Hex => {
                let cp = parse_hex_escape(&tok.text, tok.offset)?;
                Ok(MetaAst::Charset(CharSet::single(cp)))
            }
            MetaTokKind::Anyset => Ok(MetaAst::Charset(CharSet::universal())),
            MetaTokKind::Identifier => Ok(MetaAst::Ident(tok.text.clone())),
            _ => Err(MetaError::UnrecognizedToken { offset: tok.offset }),
        };
    }

    match tokens.first().map(|t| t.kind) {
        Some(MetaTokKind::LParen) => {
            if depth + 1 > ctx.config.max_nesting_depth {
                return Err(MetaError::UnbalancedBracket { offset: tokens[0].offset });
            }
            let close = find_matching_pair(tokens, 0)?;
            let inner = parse_expr(ctx, &tokens[1..close], depth + 1)?;
            Ok(MetaAst::Capture(Box::new(inner)))
        }
        Some(MetaTokKind::LBrace) => {
            if depth + 1 > ctx.config.max_nesting_depth {
                return Err(MetaError::UnbalancedBracket { offset: tokens[0].offset });
            }
            let close = find_matching_pair(tokens, 0)?;
            parse_expr(ctx, &tokens[1..close], depth + 1)
        }
        Some(_) => Err(MetaError::UnrecognizedToken { offset: tokens[0].offset }),
        None => Err(MetaError::MissingOperand { offset: 0 }),
    }
}

/// Decodes `\xHH`, `\XHHHH`, `\uHHHH`, or `\UHHHHHHHH` into its codepoint,
/// rejecting anything outside the valid Unicode scalar range (`spec.md` §3's
/// charset invariant excludes the surrogate range and anything past
/// `MAX_CODEPOINT`).
fn parse_hex_escape(text: &str, offset: usize) -> Result<u32, MetaError> {
    let digits = &text[2..];
    let value = u32::from_str_radix(digits, 16).map_err(|_| MetaError::InvalidCount {
        offset,
        reason: format!("'{text}' is not a valid hex escape"),
    })?;
    if value > MAX_CODEPOINT || SURROGATE_RANGE.contains(&value) {
        return Err(MetaError::InvalidCount {
            offset,
            reason: format!("'{text}' is not a valid Unicode scalar value"),
        });
    }
    Ok(value)
}

/// Unescapes a string/caseless literal body: `\\`, `\"`, `\'`, `\n`, `\t`,
/// `\r` are recognized; any other escaped character passes through literally.
fn unescape_text(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('r') => out.push('\r'),
                Some(other) => out.push(other),
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Parses a `charset` literal's bracket-interior text into a normalized
/// [`CharSet`], recognizing `a-z`-style ranges and the same escapes as
/// [`unescape_text`].
fn parse_charset_body(body: &str) -> CharSet {
    let chars: Vec<char> = body.chars().collect();
    let mut ranges = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let lo = read_charset_char(&chars, &mut i);
        if i + 1 < chars.len() && chars[i] == '-' {
            i += 1;
            let hi = read_charset_char(&chars, &mut i);
            ranges.push((lo as u32, hi as u32));
        } else {
            ranges.push((lo as u32, lo as u32));
        }
    }
    CharSet::from_ranges(ranges)
}

fn read_charset_char(chars: &[char], i: &mut usize) -> char {
    let c = chars[*i];
    if c == '\\' && *i + 1 < chars.len() {
        let esc = chars[*i + 1];
        *i += 2;
        match esc {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            other => other,
        }
    } else {
        *i += 1;
        c
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn parse_src(src: &str) -> MetaAst {
        let (tokens, _) = tokenize(src.as_bytes()).unwrap();
        parse(&tokens, &MetaParserConfig::default()).unwrap()
    }

    #[test]
    fn concatenation_binds_tighter_than_alternation() {
        let ast = parse_src(r#"A|B C"#);
        match ast {
            MetaAst::Or(l, r) => {
                assert_eq!(*l, MetaAst::Ident("A".to_string()));
                assert_eq!(*r, MetaAst::Cat(vec![
                    MetaAst::Ident("B".to_string()),
                    MetaAst::Ident("C".to_string()),
                ]));
            }
            other => panic!("expected Or at the root, got {other:?}"),
        }
    }

    #[test]
    fn counted_repetition_desugars_to_concatenation() {
        let ast = parse_src(r#""ab"3"#);
        assert_eq!(
            ast,
            MetaAst::Cat(vec![
                MetaAst::Str("ab".to_string()),
                MetaAst::Str("ab".to_string()),
                MetaAst::Str("ab".to_string()),
            ])
        );
    }

    #[test]
    fn complement_wraps_the_next_unit() {
        let ast = parse_src(r#"~[a-z]"#);
        match ast {
            MetaAst::Compliment(inner) => assert!(matches!(*inner, MetaAst::Charset(_))),
            other => panic!("expected Compliment, got {other:?}"),
        }
    }

    #[test]
    fn capture_group_parses_inner_expression() {
        let ast = parse_src(r#"(A|B)"#);
        match ast {
            MetaAst::Capture(inner) => assert!(matches!(*inner, MetaAst::Or(_, _))),
            other => panic!("expected Capture, got {other:?}"),
        }
    }

    #[test]
    fn zero_count_is_a_fatal_error() {
        let (tokens, _) = tokenize(r#""ab"0"#.as_bytes()).unwrap();
        let err = parse(&tokens, &MetaParserConfig::default()).unwrap_err();
        assert!(matches!(err, MetaError::InvalidCount { .. }));
    }

    #[test]
    fn unbalanced_bracket_is_a_fatal_error() {
        let (tokens, _) = tokenize(r#"(A|B"#.as_bytes()).unwrap();
        let err = parse(&tokens, &MetaParserConfig::default()).unwrap_err();
        assert!(matches!(err, MetaError::UnbalancedBracket { .. }));
    }

    #[test]
    fn hex_escape_within_range_parses_to_a_charset() {
        let ast = parse_src(r#"\U0001F600"#);
        match ast {
            MetaAst::Charset(cs) => {
                assert_eq!(cs.ranges(), &[(0x1F600, 0x1F600)]);
            }
            other => panic!("expected Charset, got {other:?}"),
        }
    }

    #[test]
    fn hex_escape_past_max_codepoint_is_a_fatal_error() {
        let (tokens, _) = tokenize(r#"\UFFFFFFFF"#.as_bytes()).unwrap();
        let err = parse(&tokens, &MetaParserConfig::default()).unwrap_err();
        assert!(matches!(err, MetaError::InvalidCount { .. }));
    }

    #[test]
    fn hex_escape_in_surrogate_range_is_a_fatal_error() {
        let (tokens, _) = tokenize(r#"\uD800"#.as_bytes()).unwrap();
        let err = parse(&tokens, &MetaParserConfig::default()).unwrap_err();
        assert!(matches!(err, MetaError::InvalidCount { .. }));
    }
}
