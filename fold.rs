//! Constant folding over the meta-AST (`spec.md` §4.2): two orthogonal
//! rewrite passes, `fold_charsets` and `fold_strings`, run together bottom-up
//! and iterated by the caller to a fixed point.

use crate::types::{CharSet, MetaAst};

/// Runs one bottom-up pass of both rewrite rules over `ast`, mutating it in
/// place, and reports whether anything changed. Callers iterate this to a
/// fixed point (see [`fold_to_fixed_point`]) — `spec.md` §4.2 specifies the
/// single-pass primitive and leaves the driving loop to the caller.
pub fn fold(ast: &mut MetaAst) -> bool {
    let mut changed = fold_children(ast);
    if try_fold_charset_op(ast) {
        changed = true;
    }
    if try_fold_string_cat(ast) {
        changed = true;
    }
    changed
}

/// Convenience driver that repeats [`fold`] until a full pass makes no
/// further change.
pub fn fold_to_fixed_point(ast: &mut MetaAst) {
    let mut passes = 0u32;
    while fold(ast) {
        passes += 1;
    }
    log::trace!("folding reached a fixed point after {passes} pass(es)");
}

/// Recurses into every child slot, folding it first — folding is bottom-up
/// so that a parent's set-operator or concatenation check sees already-
/// canonical children.
fn fold_children(ast: &mut MetaAst) -> bool {
    match ast {
        MetaAst::Eps | MetaAst::Str(_) | MetaAst::Ident(_) | MetaAst::Charset(_) => false,
        MetaAst::Caseless(inner)
        | MetaAst::Compliment(inner)
        | MetaAst::Star(inner)
        | MetaAst::Plus(inner)
        | MetaAst::Option(inner)
        | MetaAst::Capture(inner) => fold(inner),
        MetaAst::Intersect(l, r)
        | MetaAst::Or(l, r)
        | MetaAst::GreaterThan(l, r)
        | MetaAst::LessThan(l, r)
        | MetaAst::Reject(l, r)
        | MetaAst::NoFollow(l, r) => {
            let a = fold(l);
            let b = fold(r);
            a || b
        }
        MetaAst::Cat(children) => {
            let mut changed = false;
            for child in children.iter_mut() {
                if fold(child) {
                    changed = true;
                }
            }
            changed
        }
    }
}

/// A length-1 string is treated as a charset only "when required by a
/// surrounding set operator" (`spec.md` §4.2) — i.e. only as a child of
/// `compliment`/`intersect`/`or`/`reject`, never standalone.
fn as_charset(node: &MetaAst) -> Option<CharSet> {
    match node {
        MetaAst::Charset(cs) => Some(cs.clone()),
        MetaAst::Str(s) if s.chars().count() == 1 => {
            Some(CharSet::single(s.chars().next().unwrap() as u32))
        }
        _ => None,
    }
}

/// `fold_charsets`: if `ast` is a set operator whose children are all
/// (possibly length-1-string-promoted) charsets, replace `ast` with the
/// computed charset leaf.
fn try_fold_charset_op(ast: &mut MetaAst) -> bool {
    let replacement = match ast {
        MetaAst::Compliment(inner) => as_charset(inner).map(|cs| cs.complement()),
        MetaAst::Intersect(l, r) => {
            as_charset(l).zip(as_charset(r)).map(|(a, b)| a.intersect(&b))
        }
        MetaAst::Or(l, r) => as_charset(l).zip(as_charset(r)).map(|(a, b)| a.union(&b)),
        MetaAst::Reject(l, r) => as_charset(l).zip(as_charset(r)).map(|(a, b)| a.diff(&b)),
        _ => None,
    };
    match replacement {
        Some(cs) => {
            *ast = MetaAst::Charset(cs);
            true
        }
        None => false,
    }
}

/// `fold_strings`: a `cat` whose children are uniformly bare strings, or
/// uniformly `caseless`-wrapped strings, collapses into a single string (or
/// a single `caseless`-wrapped string, respectively). A `cat` mixing the two
/// never folds across that boundary — the Design Note in `spec.md` §9 treats
/// `caseless` as a semantic marker that must not silently disappear.
fn try_fold_string_cat(ast: &mut MetaAst) -> bool {
    let MetaAst::Cat(children) = ast else { return false };

    if let Some(joined) = all_bare_strings(children) {
        *ast = MetaAst::Str(joined);
        return true;
    }
    if let Some(joined) = all_caseless_strings(children) {
        *ast = MetaAst::Caseless(Box::new(MetaAst::Str(joined)));
        return true;
    }
    false
}

fn all_bare_strings(children: &[MetaAst]) -> Option<String> {
    let mut out = String::new();
    for child in children {
        match child {
            MetaAst::Str(s) => out.push_str(s),
            _ => return None,
        }
    }
    Some(out)
}

fn all_caseless_strings(children: &[MetaAst]) -> Option<String> {
    let mut out = String::new();
    for child in children {
        match child {
            MetaAst::Caseless(inner) => match inner.as_ref() {
                MetaAst::Str(s) => out.push_str(s),
                _ => return None,
            },
            _ => return None,
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn charset_fold_scenario() {
        let mut ast = MetaAst::Or(
            Box::new(MetaAst::Charset(CharSet::from_ranges(vec![(b'a' as u32, b'f' as u32)]))),
            Box::new(MetaAst::Charset(CharSet::from_ranges(vec![(b'd' as u32, b'z' as u32)]))),
        );
        fold_to_fixed_point(&mut ast);
        assert_eq!(
            ast,
            MetaAst::Charset(CharSet::from_ranges(vec![(b'a' as u32, b'z' as u32)]))
        );
    }

    #[test]
    fn string_fold_scenario() {
        let mut ast = MetaAst::cat(vec![MetaAst::Str("foo".into()), MetaAst::Str("bar".into())]);
        fold_to_fixed_point(&mut ast);
        assert_eq!(ast, MetaAst::Str("foobar".into()));
    }

    #[test]
    fn mixed_preservation_scenario() {
        let mut ast = MetaAst::Or(
            Box::new(MetaAst::Str("foo".into())),
            Box::new(MetaAst::Str("bar".into())),
        );
        let before = ast.clone();
        fold_to_fixed_point(&mut ast);
        assert_eq!(ast, before);
    }

    #[test]
    fn complement_scenario_excludes_augment() {
        let mut ast =
            MetaAst::Compliment(Box::new(MetaAst::Charset(CharSet::from_ranges(vec![(
                b'a' as u32,
                b'z' as u32,
            )]))));
        fold_to_fixed_point(&mut ast);
        match ast {
            MetaAst::Charset(cs) => {
                assert!(cs.contains(0x10));
                assert!(cs.contains(0x7B));
                assert!(!cs.contains(b'm' as u32));
                assert!(!cs.contains(crate::types::charset::AUGMENT));
            }
            other => panic!("expected Charset, got {other:?}"),
        }
    }

    #[test]
    fn caseless_boundary_is_not_fused() {
        let mut ast = MetaAst::cat(vec![
            MetaAst::Caseless(Box::new(MetaAst::Str("foo".into()))),
            MetaAst::Str("bar".into()),
        ]);
        let before = ast.clone();
        fold_to_fixed_point(&mut ast);
        assert_eq!(ast, before);
    }

    #[test]
    fn idempotence_of_folding() {
        let mut ast = MetaAst::cat(vec![MetaAst::Str("a".into()), MetaAst::Str("b".into())]);
        fold_to_fixed_point(&mut ast);
        let once = ast.clone();
        fold_to_fixed_point(&mut ast);
        assert_eq!(ast, once);
    }
}
