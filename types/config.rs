//! Pipeline configuration, grounded on the teacher's
//! `crates/radlr-core/types/parser_config.rs` builder shape.

/// Tunables threaded explicitly through the meta-parse/fold/lower pipeline.
/// No global: every compilation constructs and owns its own value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaParserConfig {
    /// Upper bound on bracket/group nesting depth before a meta-parse is
    /// rejected, guarding against pathological or adversarial input.
    pub max_nesting_depth: usize,
    /// When `true`, `caseless` only folds ASCII letters; non-ASCII
    /// codepoints pass through unchanged (`spec.md` Non-goals: "locale-aware
    /// case folding beyond ASCII" is never attempted either way, so this
    /// toggles nothing but the ASCII-only half that's in scope).
    pub ascii_only_caseless: bool,
}

impl Default for MetaParserConfig {
    fn default() -> Self {
        Self { max_nesting_depth: 256, ascii_only_caseless: true }
    }
}

impl MetaParserConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth;
        self
    }

    pub fn with_ascii_only_caseless(mut self, ascii_only: bool) -> Self {
        self.ascii_only_caseless = ascii_only;
        self
    }
}
