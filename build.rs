use anyhow::*;
use fs_extra::copy_items;
use fs_extra::dir::CopyOptions;
use std::env;
use std::path::PathBuf;

fn main() -> Result<()> {
    // This tells Cargo to rerun this script if something in /assets/ changes.
    println!("cargo:rerun-if-changed=assets");

    // The web build fetches assets over HTTP; nothing to copy.
    if env::var("CARGO_CFG_TARGET_ARCH").as_deref() == std::result::Result::Ok("wasm32") {
        return Ok(());
    }

    let out_dir = PathBuf::from(env::var("OUT_DIR")?);
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let assets_src = manifest_dir.join("assets");
    if assets_src.exists() {
        let mut copy_options = CopyOptions::new();
        copy_options.overwrite = true;
        copy_items(&[&assets_src], &out_dir, &copy_options)?;
        println!(
            "cargo:rustc-env=SHADE_NGIN_ASSETS={}",
            out_dir.join("assets").display()
        );
    }

    Ok(())
}
