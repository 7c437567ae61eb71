use serde::Serialize;

use fidel_engine::replay::{replay, ReplayReport};

use super::mapping_ops::table_or_builtin;

#[derive(Debug, Serialize)]
struct CorrectionJson {
    delete_count: usize,
    insert: String,
}

#[derive(Debug, Serialize)]
struct ReplayJson {
    input: String,
    text: String,
    corrections: Vec<CorrectionJson>,
    buffer: String,
    pending_echo_backspaces: usize,
}

impl ReplayJson {
    fn new(input: &str, report: ReplayReport) -> Self {
        Self {
            input: input.to_string(),
            text: report.text,
            corrections: report
                .corrections
                .into_iter()
                .map(|c| CorrectionJson {
                    delete_count: c.delete_count,
                    insert: c.insert,
                })
                .collect(),
            buffer: report.buffer,
            pending_echo_backspaces: report.pending_echo_backspaces,
        }
    }
}

pub fn replay_cmd(text: &str, mapping: Option<&str>, json: bool) {
    let table = table_or_builtin(mapping);
    let report = replay(table, text);

    if json {
        let out = ReplayJson::new(text, report);
        println!("{}", die!(serde_json::to_string_pretty(&out), "Error: {}"));
        return;
    }

    for c in &report.corrections {
        println!("  -{} +{}", c.delete_count, c.insert);
    }
    println!("{text} => {}", report.text);
    if !report.buffer.is_empty() {
        println!("open sequence: {}", report.buffer);
    }
}
