//! Build script for the storefront crate.
//!
//! Generates content-based hashes for static assets (CSS and JS) so the
//! templates can reference immutable, cache-busted filenames.

use std::env;
use std::fs;
use std::path::Path;

use sha2::{Digest, Sha256};

/// Assets to fingerprint: (path under `static/`, extension, env var name).
const ASSETS: &[(&str, &str, &str)] = &[
    ("css/main", "css", "CSS_HASH"),
    ("js/shop", "js", "SHOP_JS_HASH"),
    ("js/dashboard", "js", "DASHBOARD_JS_HASH"),
];

fn main() {
    let manifest_dir =
        env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR must be set by Cargo");
    let static_dir = Path::new(&manifest_dir).join("static");

    for (stem, ext, env_name) in ASSETS {
        hash_asset(&static_dir, stem, ext, env_name);
    }
}

/// Hash one asset and copy it to `derived/` with the hash in its filename.
///
/// Sets `env_name` for use with `env!()`; empty when the asset is missing.
fn hash_asset(static_dir: &Path, stem: &str, ext: &str, env_name: &str) {
    let source = static_dir.join(format!("{stem}.{ext}"));

    println!("cargo:rerun-if-changed={}", source.display());

    let content = match fs::read(&source) {
        Ok(content) => content,
        Err(e) => {
            println!("cargo:warning=Could not read {}: {e}", source.display());
            println!("cargo:rustc-env={env_name}=");
            return;
        }
    };

    // First 8 hex chars of SHA256
    let hash = format!("{:x}", Sha256::digest(&content));
    let short_hash = &hash[..8];

    println!("cargo:rustc-env={env_name}={short_hash}");

    let (dir, name) = stem.rsplit_once('/').unwrap_or(("", stem));
    let derived_dir = static_dir.join(dir).join("derived");
    fs::create_dir_all(&derived_dir).expect("Failed to create derived asset directory");

    let derived_path = derived_dir.join(format!("{name}.{short_hash}.{ext}"));
    fs::copy(&source, &derived_path).expect("Failed to copy asset to derived directory");
}
