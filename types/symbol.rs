//! The symbol store: a process-lifetime, append-only interning table
//! (`spec.md` §4.3).
//!
//! Re-architected per `spec.md` §9 ("Global symbol store") as an explicit
//! value threaded through the pipeline rather than a process-wide global —
//! every compilation owns one, and every test constructs a fresh one.

use indexmap::IndexMap;

use super::charset::CharSet;

/// A stable, dense index into a [`SymbolStore`]. Indices are never recycled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SymbolId(pub u32);

/// The value a [`SymbolId`] resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolKind {
    StringLiteral(String),
    /// A `caseless` string literal. Kept distinct from [`SymbolKind::StringLiteral`]
    /// even when the text matches one byte-for-byte: `spec.md` §9's open
    /// question on `caseless` semantics resolves to "propagated to CFG
    /// lowering and not fused across a case-sensitivity boundary", which
    /// requires the two to never collide to the same symbol.
    CaselessLiteral(String),
    Identifier(String),
    Charset(CharSet),
    /// A synthesized non-terminal with no author-visible name, created
    /// during CFG lowering for anonymous groups. Carries a sequence number
    /// unique within the store, used only for a debug-friendly name.
    Anonymous(u32),
}

/// An append-only table mapping every distinct terminal/non-terminal/
/// charset value seen during a compilation to a stable dense index.
///
/// Equal values always collide to the same index (`intern` is idempotent);
/// anonymous symbols are the one exception — each call allocates a fresh
/// entry, since two anonymous groups are never meant to be identified with
/// each other just because they're both nameless.
#[derive(Debug, Default)]
pub struct SymbolStore {
    dense: Vec<SymbolKind>,
    by_identifier: IndexMap<String, SymbolId>,
    by_string: IndexMap<String, SymbolId>,
    by_caseless_string: IndexMap<String, SymbolId>,
    by_charset: IndexMap<CharSet, SymbolId>,
    anon_count: u32,
}

impl SymbolStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, kind: SymbolKind) -> SymbolId {
        let id = SymbolId(self.dense.len() as u32);
        self.dense.push(kind);
        id
    }

    pub fn intern_identifier(&mut self, name: &str) -> SymbolId {
        if let Some(id) = self.by_identifier.get(name) {
            return *id;
        }
        let id = self.push(SymbolKind::Identifier(name.to_string()));
        self.by_identifier.insert(name.to_string(), id);
        id
    }

    pub fn intern_string(&mut self, text: &str) -> SymbolId {
        if let Some(id) = self.by_string.get(text) {
            return *id;
        }
        let id = self.push(SymbolKind::StringLiteral(text.to_string()));
        self.by_string.insert(text.to_string(), id);
        id
    }

    pub fn intern_caseless(&mut self, text: &str) -> SymbolId {
        if let Some(id) = self.by_caseless_string.get(text) {
            return *id;
        }
        let id = self.push(SymbolKind::CaselessLiteral(text.to_string()));
        self.by_caseless_string.insert(text.to_string(), id);
        id
    }

    pub fn intern_charset(&mut self, set: CharSet) -> SymbolId {
        if let Some(id) = self.by_charset.get(&set) {
            return *id;
        }
        let id = self.push(SymbolKind::Charset(set.clone()));
        self.by_charset.insert(set, id);
        id
    }

    /// Allocates a fresh anonymous non-terminal. Never deduplicated.
    pub fn new_anonymous(&mut self) -> SymbolId {
        let n = self.anon_count;
        self.anon_count += 1;
        self.push(SymbolKind::Anonymous(n))
    }

    /// Constant-time reverse lookup.
    pub fn get(&self, id: SymbolId) -> Option<&SymbolKind> {
        self.dense.get(id.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.dense.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }
}
