//! Identifier and string-literal interning.
//!
//! The lexer interns every identifier and string-literal text once; the
//! rest of the compiler passes around [`Symbol`] handles. Scope lookup,
//! struct member search and function resolution all compare integers
//! instead of strings.
//!
//! ## Storage
//!
//! Interned text lives in one growing buffer and is addressed by byte
//! range, so each unique name is stored exactly once and resolving a
//! symbol is a slice into that buffer — there is no per-entry `String`
//! allocation. Deduplication goes through a hash index mapping a 64-bit
//! hash of the text to the symbols sharing it; a full text comparison
//! against those candidates decides whether a name was seen before.
//!
//! ```
//! use mica_base::Interner;
//!
//! let mut interner = Interner::new();
//! let a = interner.intern("main");
//! let b = interner.intern("main");
//! assert_eq!(a, b);
//! assert!(interner.matches(a, "main"));
//! ```

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

/// A lightweight handle to an interned string.
///
/// Symbols are `Copy` and compare in O(1) time regardless of text
/// length. Use [`Interner::resolve`] to retrieve the original text, or
/// [`Interner::matches`] to compare against a known spelling.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Symbol(u32);

impl Symbol {
    /// The empty string, always at index 0.
    pub const EMPTY: Symbol = Symbol(0);

    /// The internal index of this symbol, for dense side tables.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl Default for Symbol {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Deduplicating string storage handing out [`Symbol`] handles.
///
/// Interning the same text twice returns the same symbol, so symbol
/// equality is string equality.
#[derive(Debug)]
pub struct Interner {
    /// Every unique string, concatenated back to back.
    text: String,
    /// Symbol index → byte range into `text`.
    spans: Vec<(u32, u32)>,
    /// Hash of the text → symbols whose text has that hash.
    buckets: HashMap<u64, Vec<Symbol>>,
}

impl Interner {
    /// Creates an interner with only the empty string pre-interned.
    pub fn new() -> Self {
        let mut interner = Interner {
            text: String::new(),
            spans: vec![(0, 0)],
            buckets: HashMap::new(),
        };
        interner.buckets.insert(hash_of(""), vec![Symbol::EMPTY]);
        interner
    }

    /// Interns a string, returning its symbol.
    pub fn intern(&mut self, s: &str) -> Symbol {
        let hash = hash_of(s);
        if let Some(candidates) = self.buckets.get(&hash) {
            for &sym in candidates {
                if self.span_text(sym) == s {
                    return sym;
                }
            }
        }

        let start = self.text.len() as u32;
        self.text.push_str(s);
        let end = self.text.len() as u32;

        let sym = Symbol(self.spans.len() as u32);
        self.spans.push((start, end));
        self.buckets.entry(hash).or_default().push(sym);
        sym
    }

    /// Returns the text for the given symbol.
    ///
    /// # Panics
    ///
    /// Panics if `sym` was not created by this interner.
    pub fn resolve(&self, sym: Symbol) -> &str {
        self.span_text(sym)
    }

    /// `true` if `sym` spells exactly `text`.
    ///
    /// This is how the compiler checks a name against a known spelling
    /// (`"main"`, `"cast"`, the primitive type names) without interning
    /// the probe first.
    pub fn matches(&self, sym: Symbol, text: &str) -> bool {
        self.span_text(sym) == text
    }

    /// Looks up an already interned string without inserting it.
    pub fn lookup(&self, s: &str) -> Option<Symbol> {
        let candidates = self.buckets.get(&hash_of(s))?;
        candidates.iter().copied().find(|&sym| self.span_text(sym) == s)
    }

    /// Number of interned strings, including the empty string.
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    /// `true` if nothing beyond the empty string has been interned.
    pub fn is_empty(&self) -> bool {
        self.spans.len() <= 1
    }

    fn span_text(&self, sym: Symbol) -> &str {
        let (start, end) = self.spans[sym.0 as usize];
        &self.text[start as usize..end as usize]
    }
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}

fn hash_of(s: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    s.hash(&mut hasher);
    hasher.finish()
}
