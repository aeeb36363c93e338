//! Version script for the cdylib, derived from the enabled features.

/// Symbols gated by a cargo feature of the same name, with their companions.
pub const FEATURE_SYMBOLS: [(&str, &[&str]); 3] = [
    ("strlcpy", &["strlcpy"]),
    ("gettimeofday", &["gettimeofday"]),
    ("getaddrinfo", &["getaddrinfo", "freeaddrinfo", "gai_strerror"]),
];

/// Symbols exported whatever the feature set.
pub const ALWAYS_EXPORTED: [&str; 1] = ["socket_set_blocking"];

/// Exported symbols given a predicate telling which features are on.
pub fn exported_symbols(feature_enabled: impl Fn(&str) -> bool) -> Vec<&'static str> {
    let mut symbols: Vec<&'static str> = FEATURE_SYMBOLS
        .iter()
        .filter(|(feature, _)| feature_enabled(feature))
        .flat_map(|(_, symbols)| symbols.iter().copied())
        .collect();
    symbols.extend(ALWAYS_EXPORTED);
    symbols
}

/// Render a linker version script exporting exactly `symbols`.
pub fn render(symbols: &[&str]) -> String {
    let mut out = String::from("PORTSHIM_0.1 {\n  global:\n");
    for symbol in symbols {
        out.push_str("    ");
        out.push_str(symbol);
        out.push_str(";\n");
    }
    out.push_str("  local:\n    *;\n};\n");
    out
}
