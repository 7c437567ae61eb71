//! Transliteration mapping table.
//!
//! An immutable `sequence → glyph` table loaded from a two-column delimited
//! text source. The substitution engine probes it on every keystroke, so the
//! table keeps its keys sorted: every sequence sharing a prefix sits in one
//! contiguous run right after that prefix.

mod source;
mod table;

use std::collections::{BTreeMap, HashSet};
use std::ops::Bound;

pub use source::{ensure_source, parse_rows, LoadOutcome, MappingError};
pub use table::DEFAULT_MAPPING_CSV;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe {
    None,
    Prefix,
    Exact(String),
    ExactAndPrefix(String),
}

impl Probe {
    pub fn glyph(&self) -> Option<&str> {
        match self {
            Self::Exact(g) | Self::ExactAndPrefix(g) => Some(g),
            Self::None | Self::Prefix => None,
        }
    }

    /// True when the probed string is a (possibly complete) prefix of a stored sequence.
    pub fn is_viable(&self) -> bool {
        !matches!(self, Self::None)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MappingTable {
    entries: BTreeMap<String, String>,
    glyphs: HashSet<String>,
}

impl MappingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(sequence, glyph)` pairs. Later duplicates overwrite earlier ones;
    /// pairs with an empty side are dropped.
    pub fn from_entries<I, S, G>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, G)>,
        S: Into<String>,
        G: Into<String>,
    {
        let mut map = BTreeMap::new();
        for (seq, glyph) in entries {
            let (seq, glyph) = (seq.into(), glyph.into());
            if seq.is_empty() || glyph.is_empty() {
                continue;
            }
            map.insert(seq, glyph);
        }
        let glyphs = map.values().cloned().collect();
        Self {
            entries: map,
            glyphs,
        }
    }

    /// Parse an in-memory delimited source (see [`parse_rows`]).
    pub fn from_csv_str(content: &str) -> Self {
        Self::from_entries(parse_rows(content))
    }

    /// The fixed built-in table used to bootstrap a missing user file.
    pub fn builtin() -> Self {
        Self::from_csv_str(DEFAULT_MAPPING_CSV)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn lookup(&self, sequence: &str) -> Option<&str> {
        self.entries.get(sequence).map(String::as_str)
    }

    /// Classify `candidate` against the table in a single ordered-map walk.
    pub fn probe(&self, candidate: &str) -> Probe {
        if candidate.is_empty() {
            return if self.is_empty() {
                Probe::None
            } else {
                Probe::Prefix
            };
        }
        let extends = self
            .entries
            .range::<str, _>((Bound::Excluded(candidate), Bound::Unbounded))
            .next()
            .is_some_and(|(k, _)| k.starts_with(candidate));
        match (self.entries.get(candidate), extends) {
            (None, false) => Probe::None,
            (None, true) => Probe::Prefix,
            (Some(g), false) => Probe::Exact(g.clone()),
            (Some(g), true) => Probe::ExactAndPrefix(g.clone()),
        }
    }

    /// Every stored sequence starting with `prefix`, longest first, ties broken
    /// lexicographically.
    pub fn longest_match_candidates(&self, prefix: &str) -> Vec<&str> {
        let mut out: Vec<&str> = self
            .entries
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .map(|(k, _)| k.as_str())
            .take_while(|k| k.starts_with(prefix))
            .collect();
        out.sort_by(|a, b| {
            b.chars()
                .count()
                .cmp(&a.chars().count())
                .then_with(|| a.cmp(b))
        });
        out
    }

    pub fn output_glyphs(&self) -> &HashSet<String> {
        &self.glyphs
    }

    pub fn is_output_glyph(&self, text: &str) -> bool {
        self.glyphs.contains(text)
    }

    /// Entries in sequence order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Render back to the delimited format, quoting fields that need it.
    pub fn to_csv_string(&self) -> String {
        let mut out = String::new();
        for (seq, glyph) in self.iter() {
            out.push_str(&source::quote_field(seq));
            out.push(',');
            out.push_str(&source::quote_field(glyph));
            out.push('\n');
        }
        out
    }
}
