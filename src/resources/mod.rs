//! Asset loading.
//!
//! Natively an image source is a file path: tried as given, then under
//! `./assets/`, then in the copy of `assets/` the build script leaves in
//! `OUT_DIR`. On the web it is a URL resolved against the page's location
//! and fetched with `reqwest`.

use anyhow::{Context as _, anyhow};
use image::DynamicImage;

#[cfg(not(target_arch = "wasm32"))]
use std::path::{Path, PathBuf};

#[cfg(target_arch = "wasm32")]
fn format_url(src: &str) -> anyhow::Result<reqwest::Url> {
    let window = web_sys::window().ok_or_else(|| anyhow!("no browser window"))?;
    let href = window
        .location()
        .href()
        .map_err(|e| anyhow!("cannot read page location: {e:?}"))?;
    let base = reqwest::Url::parse(&href)?;
    Ok(base.join(src)?)
}

/// Candidate locations for a native asset, most specific first.
#[cfg(not(target_arch = "wasm32"))]
pub fn asset_candidates(src: &str) -> Vec<PathBuf> {
    let trimmed = src.trim_start_matches('/');
    let mut candidates = vec![PathBuf::from(src), Path::new("./assets").join(trimmed)];
    if let Some(out_dir) = option_env!("SHADE_NGIN_ASSETS") {
        candidates.push(Path::new(out_dir).join(trimmed));
    }
    candidates
}

pub async fn load_binary(src: &str) -> anyhow::Result<Vec<u8>> {
    #[cfg(target_arch = "wasm32")]
    let data = {
        let url = format_url(src)?;
        log::debug!("fetching {url}");
        reqwest::get(url.clone())
            .await?
            .error_for_status()
            .with_context(|| format!("fetching {url}"))?
            .bytes()
            .await?
            .to_vec()
    };
    #[cfg(not(target_arch = "wasm32"))]
    let data = {
        let candidates = asset_candidates(src);
        let path = candidates
            .iter()
            .find(|p| p.is_file())
            .ok_or_else(|| anyhow!("asset `{src}` not found (looked in {candidates:?})"))?;
        log::debug!("reading {}", path.display());
        tokio::fs::read(path)
            .await
            .with_context(|| format!("reading {}", path.display()))?
    };

    Ok(data)
}

/// Fetches and decodes an image.
pub async fn load_image(src: &str) -> anyhow::Result<DynamicImage> {
    let data = load_binary(src).await?;
    image::load_from_memory(&data).with_context(|| format!("decoding `{src}`"))
}
