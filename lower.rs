//! CFG lowering: turns a folded meta-AST into a flat set of productions
//! (`spec.md` §2 "CFG Lowerer", §6 "iteration over the folded AST in
//! post-order, yielding CFG productions to a consumer callback").
//!
//! `spec.md` scopes the lowerer as a collaborator interface rather than
//! part of the core's line budget; this implementation keeps the post-order
//! walk and production emission inside the crate (see SPEC_FULL.md §4) so
//! the pipeline is runnable end to end, with the RNGLR table itself left to
//! a caller.

use crate::types::{MetaAst, MetaError, MetaParserConfig, Production, SymbolId, SymbolStore};

/// Canonicalizes a `caseless` literal's text into the dedup key its symbol
/// is interned under, so that two differently-cased spellings of the same
/// literal collide to one symbol. `config.ascii_only_caseless` (the only
/// case-folding policy in scope — `spec.md` §1 excludes locale-aware
/// folding beyond ASCII as a Non-goal) picks between ASCII-only and full
/// Unicode lowercasing.
fn caseless_key(text: &str, config: &MetaParserConfig) -> String {
    if config.ascii_only_caseless {
        text.to_ascii_lowercase()
    } else {
        text.to_lowercase()
    }
}

/// Lowers a named rule's folded body into zero or more [`Production`]s,
/// interning `head_name` as the production head and invoking `emit` once
/// per production in post-order (a sub-expression's productions are always
/// emitted before the production that references its synthesized symbol).
///
/// Returns the interned head symbol. Fails with
/// [`MetaError::MalformedSetOperation`] if a set operator survives folding
/// over non-set-valued children (`spec.md` §7.3).
pub fn lower_production(
    store: &mut SymbolStore,
    config: &MetaParserConfig,
    ast: &MetaAst,
    head_name: &str,
    emit: &mut impl FnMut(Production),
) -> Result<SymbolId, MetaError> {
    let head = store.intern_identifier(head_name);
    lower_into(store, config, ast, head, emit)?;
    Ok(head)
}

/// Emits the production(s) deriving `head` from `ast`.
fn lower_into(
    store: &mut SymbolStore,
    config: &MetaParserConfig,
    ast: &MetaAst,
    head: SymbolId,
    emit: &mut impl FnMut(Production),
) -> Result<(), MetaError> {
    match ast {
        MetaAst::Eps => emit(Production::new(head, vec![])),

        MetaAst::Str(s) => {
            let sym = store.intern_string(s);
            emit(Production::new(head, vec![sym]));
        }

        MetaAst::Caseless(inner) => match inner.as_ref() {
            MetaAst::Str(s) => {
                let sym = store.intern_caseless(&caseless_key(s, config));
                emit(Production::new(head, vec![sym]));
            }
            other => {
                return Err(MetaError::MalformedSetOperation {
                    offset: 0,
                    reason: format!("caseless wraps non-string node {other:?}"),
                })
            }
        },

        MetaAst::Ident(name) => {
            let sym = store.intern_identifier(name);
            emit(Production::new(head, vec![sym]));
        }

        MetaAst::Charset(cs) => {
            let sym = store.intern_charset(cs.clone());
            emit(Production::new(head, vec![sym]));
        }

        MetaAst::Capture(inner) => lower_into(store, config, inner, head, emit)?,

        MetaAst::Cat(children) => {
            let mut rhs = Vec::with_capacity(children.len());
            for child in children {
                if let Some(sym) = lower_operand(store, config, child, emit)? {
                    rhs.push(sym);
                }
            }
            emit(Production::new(head, rhs));
        }

        MetaAst::Or(l, r) => {
            lower_into(store, config, l, head, emit)?;
            lower_into(store, config, r, head, emit)?;
        }

        // Preference is disambiguation metadata for a full GLR driver, which
        // is explicitly out of scope here (`spec.md` §1 Non-goals); both
        // branches are still valid CFG derivations, so lower them as
        // alternatives the same way `or` does. See DESIGN.md.
        MetaAst::GreaterThan(l, r) | MetaAst::LessThan(l, r) => {
            lower_into(store, config, l, head, emit)?;
            lower_into(store, config, r, head, emit)?;
        }

        MetaAst::Star(inner) => {
            emit(Production::new(head, vec![]));
            if let Some(sym) = lower_operand(store, config, inner, emit)? {
                emit(Production::new(head, vec![head, sym]));
            }
        }

        MetaAst::Plus(inner) => {
            if let Some(sym) = lower_operand(store, config, inner, emit)? {
                emit(Production::new(head, vec![sym]));
                emit(Production::new(head, vec![head, sym]));
            } else {
                emit(Production::new(head, vec![]));
            }
        }

        MetaAst::Option(inner) => {
            emit(Production::new(head, vec![]));
            if let Some(sym) = lower_operand(store, config, inner, emit)? {
                emit(Production::new(head, vec![sym]));
            }
        }

        // A set operator surviving to lowering means folding never reduced
        // it to a charset leaf, which only happens when one of its children
        // wasn't set-valued — a grammar-author error (`spec.md` §7.3).
        MetaAst::Compliment(_) | MetaAst::Intersect(_, _) | MetaAst::Reject(_, _) => {
            return Err(MetaError::MalformedSetOperation {
                offset: 0,
                reason: "set operator applied to non-set operand(s) after folding".to_string(),
            })
        }

        // No-follow is a lookahead constraint, not part of the CFG shape
        // itself (the RNGLR driver that would enforce it is out of scope);
        // only the left operand contributes productions.
        MetaAst::NoFollow(l, _) => lower_into(store, config, l, head, emit)?,
    }
    Ok(())
}

/// Lowers `ast` to a single symbol usable as one RHS slot. Simple leaves
/// intern directly; compound sub-expressions get a fresh anonymous
/// non-terminal whose own productions are emitted first (post-order).
/// An `eps` operand contributes nothing to its enclosing concatenation and
/// is dropped rather than given a symbol.
fn lower_operand(
    store: &mut SymbolStore,
    config: &MetaParserConfig,
    ast: &MetaAst,
    emit: &mut impl FnMut(Production),
) -> Result<Option<SymbolId>, MetaError> {
    match ast {
        MetaAst::Eps => Ok(None),
        MetaAst::Str(s) => Ok(Some(store.intern_string(s))),
        MetaAst::Ident(name) => Ok(Some(store.intern_identifier(name))),
        MetaAst::Charset(cs) => Ok(Some(store.intern_charset(cs.clone()))),
        MetaAst::Caseless(inner) => match inner.as_ref() {
            MetaAst::Str(s) => Ok(Some(store.intern_caseless(&caseless_key(s, config)))),
            other => Err(MetaError::MalformedSetOperation {
                offset: 0,
                reason: format!("caseless wraps non-string node {other:?}"),
            }),
        },
        MetaAst::Capture(inner) => lower_operand(store, config, inner, emit),
        compound => {
            let anon = store.new_anonymous();
            lower_into(store, config, compound, anon, emit)?;
            Ok(Some(anon))
        }
    }
}
