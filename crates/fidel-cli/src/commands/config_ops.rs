use std::fs;

pub fn settings_export() {
    print!("{}", fidel_core::settings::default_toml());
}

pub fn settings_validate(file: &str) {
    let content = die!(fs::read_to_string(file), "Error reading {file}: {}");
    let s = die!(
        fidel_core::settings::parse_settings_toml(&content),
        "Error: {}"
    );
    println!(
        "OK: engine.start_active={}, engine.toggle_key={}, mapping.path={}, mapping.watch={}, mapping.poll_interval_ms={}",
        s.engine.start_active,
        s.engine.toggle_key(),
        s.mapping.path.display(),
        s.mapping.watch,
        s.mapping.poll_interval_ms
    );
}
