//! Meta-grammar pipeline for the Dewy compiler front-end.
//!
//! A unidirectional chain of transformations over a shared [`SymbolStore`]:
//! raw source bytes → meta-tokens ([`lexer`]) → meta-AST ([`parser`]) →
//! folded meta-AST ([`fold`]) → CFG productions ([`lower`]), plus the
//! RNGLR reduction-action primitive ([`types::reduction`]) consumed by a
//! generalized-parsing table builder that lives outside this crate.
//!
//! This crate has no shared mutable state beyond the [`SymbolStore`] a
//! caller constructs and threads explicitly through one compilation; it
//! never installs a logging backend, only emits through the `log` facade.

pub mod fold;
pub mod lexer;
pub mod lower;
pub mod parser;
pub mod print;
pub mod types;

pub use fold::{fold, fold_to_fixed_point};
pub use lower::lower_production;
pub use print::{print_repr, print_surface};
pub use types::{
    CharSet, MetaAst, MetaError, MetaParserConfig, Production, Reduction, ReductionSet, SymbolId,
    SymbolKind, SymbolStore, UtfDiagnostic,
};

/// Runs the full pipeline for one named rule: tokenizes `source`, parses it
/// into a meta-AST, folds it to a fixed point, and lowers it into CFG
/// productions under `head_name`, interning into `store`.
///
/// This ties together `lexer::tokenize`, `parser::parse`, `fold::fold_to_fixed_point`,
/// and `lower::lower_production` for the common case; callers needing finer
/// control (e.g. inspecting the unfolded AST, or reusing tokens across
/// multiple rules) call those stages directly.
pub fn compile_rule(
    store: &mut SymbolStore,
    config: &MetaParserConfig,
    head_name: &str,
    source: &[u8],
    emit: &mut impl FnMut(Production),
) -> Result<SymbolId, MetaError> {
    let (tokens, diagnostics) = lexer::tokenize(source)?;
    for diag in &diagnostics {
        log::warn!("invalid UTF-8 at byte offset {}, substituted codepoint 0", diag.byte_offset);
    }
    let mut ast = parser::parse(&tokens, config)?;
    fold::fold_to_fixed_point(&mut ast);
    log::debug!("rule '{head_name}' folded to {}", print::print_repr(&ast).trim());
    lower::lower_production(store, config, &ast, head_name, emit)
}

/// Generators for property-based tests (`spec.md` §8's invariants), shared
/// across `fold.rs`, `print.rs`, and `types/reduction.rs` so every invariant
/// is exercised against the same notion of "an arbitrary meta-AST" rather
/// than each module inventing its own.
#[cfg(test)]
pub(crate) mod test_support {
    use crate::types::{CharSet, MetaAst};
    use proptest::prelude::*;

    /// A handful of small, round-trip-safe charsets — enough to exercise
    /// `fold_charsets` and the surface printer without wading into the
    /// escaping edge cases `types::charset`'s own unit tests already cover.
    pub fn arb_charset() -> impl Strategy<Value = CharSet> {
        prop_oneof![
            Just(CharSet::from_ranges(vec![(b'a' as u32, b'f' as u32)])),
            Just(CharSet::from_ranges(vec![(b'd' as u32, b'z' as u32)])),
            Just(CharSet::from_ranges(vec![(b'0' as u32, b'9' as u32)])),
            Just(CharSet::from_ranges(vec![(b'A' as u32, b'F' as u32)])),
        ]
    }

    /// Plain ASCII alphanumeric text: safe as both a `string` literal body
    /// (no quote/backslash escaping to round-trip) and an `identifier`.
    fn arb_word() -> impl Strategy<Value = String> {
        "[a-z]{1,6}"
    }

    /// An arbitrary meta-AST, bounded in depth and branching so generated
    /// cases stay small enough to be readable on a `proptest` failure
    /// shrink. Covers every recursive tag in `spec.md` §3 except `count`
    /// (desugared away at construction, per `types::ast`) and `nofollow`
    /// (no surface spelling disagreement risk worth adding here — covered
    /// directly by `parser::tests`).
    pub fn arb_meta_ast() -> impl Strategy<Value = MetaAst> {
        let leaf = prop_oneof![
            Just(MetaAst::Eps),
            arb_word().prop_map(MetaAst::Str),
            arb_word().prop_map(MetaAst::Ident),
            arb_charset().prop_map(MetaAst::Charset),
        ];
        leaf.prop_recursive(4, 32, 3, |inner| {
            prop_oneof![
                inner.clone().prop_map(|a| MetaAst::Star(Box::new(a))),
                inner.clone().prop_map(|a| MetaAst::Plus(Box::new(a))),
                inner.clone().prop_map(|a| MetaAst::Option(Box::new(a))),
                inner.clone().prop_map(|a| MetaAst::Capture(Box::new(a))),
                inner.clone().prop_map(|a| MetaAst::Compliment(Box::new(a))),
                (inner.clone(), inner.clone())
                    .prop_map(|(a, b)| MetaAst::Or(Box::new(a), Box::new(b))),
                (inner.clone(), inner.clone())
                    .prop_map(|(a, b)| MetaAst::Intersect(Box::new(a), Box::new(b))),
                (inner.clone(), inner.clone())
                    .prop_map(|(a, b)| MetaAst::Reject(Box::new(a), Box::new(b))),
                prop::collection::vec(inner, 2..4).prop_map(MetaAst::cat),
            ]
        })
    }
}
