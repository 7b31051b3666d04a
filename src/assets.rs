//! Embedded web assets for the calculator page.

use std::borrow::Cow;

use rust_embed::RustEmbed;

#[derive(RustEmbed)]
#[folder = "static/"]
struct StaticAssets;

/// An embedded file together with its content type.
pub struct Asset {
    pub data: Cow<'static, [u8]>,
    pub content_type: &'static str,
}

/// Look up an embedded asset by its path relative to `static/`.
pub fn get(path: &str) -> Option<Asset> {
    let file = StaticAssets::get(path)?;
    Some(Asset {
        data: file.data,
        content_type: content_type(path),
    })
}

fn content_type(path: &str) -> &'static str {
    match path.rsplit_once('.').map(|(_, ext)| ext) {
        Some("html") => "text/html; charset=utf-8",
        Some("js") => "text/javascript; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("ico") => "image/x-icon",
        _ => "application/octet-stream",
    }
}
