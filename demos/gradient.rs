//! Opens a window showing `assets/gradient.png` through the distortion effect.
//!
//! `cargo run --example gradient [path-to-image] [width/height ratio]`

use shade_ngin::EngineConfig;

fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let src = args.next().unwrap_or_else(|| "gradient.png".to_string());
    let ratio = match args.next() {
        Some(ratio) => ratio.parse()?,
        None => 1.5,
    };
    shade_ngin::run(EngineConfig::new(src).with_image_ratio(ratio))
}
