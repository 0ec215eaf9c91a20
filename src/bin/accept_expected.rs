//! Binary to generate/update .expected.go and .expected.err files
//!
//! Usage:
//!   cargo run --bin accept_expected            # Update all
//!   cargo run --bin accept_expected -- basic   # Update only tests matching "basic"

use gox_transpiler::transpile;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

fn main() {
    let filter: Option<String> = std::env::args().nth(1);
    let test_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests");

    let mut updated = 0;
    let mut skipped = 0;

    for entry in WalkDir::new(&test_dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().is_some_and(|s| s == "gox"))
    {
        let path = entry.path();
        let path_str = path.to_string_lossy();

        // Apply filter if provided
        if let Some(ref f) = filter {
            if !path_str.contains(f.as_str()) {
                skipped += 1;
                continue;
            }
        }

        process_file(path);
        updated += 1;
    }

    println!("Updated {} files, skipped {}", updated, skipped);
}

fn process_file(path: &Path) {
    let source = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to read {:?}: {}", path, e);
            return;
        }
    };

    let is_error_test = path.to_string_lossy().contains("/errors/");

    match transpile(&source) {
        Ok(result) => {
            if is_error_test {
                eprintln!("ERROR: {:?} compiled but is in errors/", path);
                return;
            }
            write(&path.with_extension("expected.go"), &result.code);
        }
        Err(e) => {
            if is_error_test {
                let filename = path.file_name().and_then(|s| s.to_str()).unwrap_or("unknown");
                write(&path.with_extension("expected.err"), &e.render(&source, filename));
            } else {
                eprintln!("ERROR: {:?} failed to compile but is not in errors/: {}", path, e);
            }
        }
    }
}

fn write(path: &Path, contents: &str) {
    if let Err(e) = fs::write(path, contents) {
        eprintln!("Failed to write {:?}: {}", path, e);
    } else {
        println!("  wrote {}", path.display());
    }
}
