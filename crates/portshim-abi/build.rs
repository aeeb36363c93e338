#[path = "build/version_map.rs"]
mod version_map;

fn main() {
    println!("cargo:rerun-if-changed=build/version_map.rs");

    let target_os = std::env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    // Debug builds keep Rust symbol names, so there is nothing to export.
    let unmangled = std::env::var_os("CARGO_CFG_DEBUG_ASSERTIONS").is_none();
    if target_os != "linux" || !unmangled {
        return;
    }

    let symbols = version_map::exported_symbols(|feature| {
        let var = format!("CARGO_FEATURE_{}", feature.to_ascii_uppercase());
        std::env::var_os(var).is_some()
    });
    let Some(out_dir) = std::env::var_os("OUT_DIR") else {
        return;
    };
    let script = std::path::Path::new(&out_dir).join("portshim.map");
    if std::fs::write(&script, version_map::render(&symbols)).is_ok() {
        println!(
            "cargo:rustc-cdylib-link-arg=-Wl,--version-script={}",
            script.display()
        );
    }
}
