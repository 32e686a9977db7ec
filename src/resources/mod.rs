//! Asset loading and geometry generation.
//!
//! Datasets are read from the `assets/` directory next to the binary (or the
//! copy `build.rs` places in `OUT_DIR`) natively, and fetched from the page's
//! `/assets/` path on the web.

pub mod mesh;

#[cfg(target_arch = "wasm32")]
fn format_url(file_name: &str) -> anyhow::Result<reqwest::Url> {
    let window = web_sys::window().ok_or_else(|| anyhow::anyhow!("no browser window"))?;
    let origin = window
        .location()
        .origin()
        .map_err(|_| anyhow::anyhow!("page origin is not readable"))?;
    let base = reqwest::Url::parse(&format!("{}/assets/", origin))?;
    Ok(base.join(file_name)?)
}

pub async fn load_string(file_name: &str) -> anyhow::Result<String> {
    #[cfg(target_arch = "wasm32")]
    let txt = {
        let url = format_url(file_name)?;
        reqwest::get(url).await?.error_for_status()?.text().await?
    };
    #[cfg(not(target_arch = "wasm32"))]
    let txt = {
        let local = std::path::Path::new("./").join("assets").join(file_name);
        let path = if local.exists() {
            local
        } else {
            std::path::Path::new(env!("OUT_DIR"))
                .join("assets")
                .join(file_name)
        };
        log::debug!("Reading {}", path.display());
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| anyhow::anyhow!("cannot read {}: {}", path.display(), e))?
    };

    Ok(txt)
}
