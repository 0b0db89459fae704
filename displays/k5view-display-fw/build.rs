//! Build script for k5view-display-fw
//!
//! - Sets up linker search paths for memory.x
//! - Validates mirror.toml and embeds it as a postcard blob

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use k5view_core::MirrorConfig;

fn main() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR is set by cargo"));
    setup_linker(&out_dir);
    embed_config(&out_dir);
}

/// Set up linker search paths for memory.x
fn setup_linker(out_dir: &Path) {
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).expect("create memory.x");
    f.write_all(memory_x).expect("write memory.x");

    println!("cargo:rustc-link-search={}", out_dir.display());
    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tlink-rp.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");

    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Parse and validate mirror.toml, then write it as postcard binary
fn embed_config(out_dir: &Path) {
    println!("cargo:rerun-if-changed=mirror.toml");

    let content = match fs::read_to_string("mirror.toml") {
        Ok(content) => content,
        Err(e) => fail("Failed to read mirror.toml", &e.to_string()),
    };

    let config: MirrorConfig = match toml::from_str(&content) {
        Ok(config) => config,
        Err(e) => fail("Invalid mirror.toml", &e.to_string()),
    };

    if let Err(e) = config.validate() {
        fail("Invalid value in mirror.toml", &format!("{:?}", e));
    }

    let blob = match postcard::to_allocvec(&config) {
        Ok(blob) => blob,
        Err(e) => fail("Failed to serialize configuration", &e.to_string()),
    };
    fs::write(out_dir.join("mirror.bin"), blob).expect("write mirror.bin");

    println!(
        "cargo:warning=mirror.toml validated: {} baud, read timeout {} ms",
        config.uart.baudrate, config.uart.read_timeout_ms
    );
}

/// Abort the build with a boxed error message
fn fail(title: &str, detail: &str) -> ! {
    let lines = detail
        .lines()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n");

    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: {:<58} ║\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        {}\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        title, lines
    );
}
