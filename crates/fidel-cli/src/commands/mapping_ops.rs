use std::process;
use std::sync::Arc;

use fidel_core::mapping::{MappingError, MappingTable, Probe, DEFAULT_MAPPING_CSV};

pub fn mapping_export() {
    print!("{DEFAULT_MAPPING_CSV}");
}

/// Load a mapping file for a command. A missing file is fatal here; an
/// empty one is reported and used as is.
pub fn load_table(file: &str) -> MappingTable {
    let outcome = die!(MappingTable::load(file), "Error: {}");
    match &outcome.warning {
        Some(err @ MappingError::NotFound(_)) => {
            eprintln!("Error: {err}");
            process::exit(1);
        }
        Some(warning) => eprintln!("Warning: {warning}"),
        None => {}
    }
    outcome.table
}

/// `--mapping` if given, otherwise the built-in table.
pub fn table_or_builtin(file: Option<&str>) -> Arc<MappingTable> {
    Arc::new(match file {
        Some(file) => load_table(file),
        None => MappingTable::builtin(),
    })
}

pub fn mapping_validate(file: &str) {
    let table = load_table(file);
    println!(
        "OK: {} mappings, {} glyphs",
        table.len(),
        table.output_glyphs().len()
    );
}

pub fn mapping_probe(sequence: &str, file: Option<&str>) {
    let table = table_or_builtin(file);
    let probe = table.probe(sequence);
    println!("{sequence}: {}", verdict(&probe));
    if !probe.is_viable() {
        return;
    }
    for candidate in table.longest_match_candidates(sequence) {
        if let Some(glyph) = table.lookup(candidate) {
            println!("  {candidate}\t{glyph}");
        }
    }
}

fn verdict(probe: &Probe) -> String {
    match (probe, probe.glyph()) {
        (Probe::ExactAndPrefix(_), Some(glyph)) => format!("exact {glyph} (and prefix)"),
        (_, Some(glyph)) => format!("exact {glyph}"),
        (_, None) if probe.is_viable() => "prefix".to_string(),
        (_, None) => "none".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verdict_names_each_match_kind() {
        let t = MappingTable::from_entries([("h", "ሀ"), ("hu", "ሁ"), ("T[u", "ፁ")]);
        assert_eq!(verdict(&t.probe("h")), "exact ሀ (and prefix)");
        assert_eq!(verdict(&t.probe("hu")), "exact ሁ");
        assert_eq!(verdict(&t.probe("T[")), "prefix");
        assert_eq!(verdict(&t.probe("x")), "none");
    }
}
