//! Built-in Ethiopic syllabary rows, written out when no user mapping exists.

pub const DEFAULT_MAPPING_CSV: &str = include_str!("default_mapping.csv");
