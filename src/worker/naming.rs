//! Output naming and file-type inference

use reqwest::Url;

/// Raster formats recognised in URL suffixes and content types
pub const KNOWN_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "gif", "webp", "bmp"];

pub const DEFAULT_EXTENSION: &str = "jpg";

/// Replaces path-unsafe characters (space, `/`, `\`, control characters)
/// with `_`. A name made only of dots becomes underscores, so the result is
/// always a single ordinary path component.
pub fn sanitize_query(text: &str) -> String {
    let sanitized: String = text
        .chars()
        .map(|c| match c {
            ' ' | '/' | '\\' => '_',
            c if c.is_control() => '_',
            other => other,
        })
        .collect();

    if sanitized.chars().all(|c| c == '.') {
        return "_".repeat(sanitized.len());
    }
    sanitized
}

/// `{sanitized}_{index:02}.{extension}`, index is 1-based provider position
pub fn entry_name(sanitized: &str, index: usize, extension: &str) -> String {
    format!("{}_{:02}.{}", sanitized, index, extension)
}

pub fn archive_name(sanitized: &str) -> String {
    format!("{}_images.zip", sanitized)
}

/// URL suffix first, then the content type, then `jpg`
pub fn infer_extension(url: &str, content_type: Option<&str>) -> &'static str {
    extension_from_url(url)
        .or_else(|| content_type.and_then(extension_from_content_type))
        .unwrap_or(DEFAULT_EXTENSION)
}

fn extension_from_url(url: &str) -> Option<&'static str> {
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url.split(['?', '#']).next().unwrap_or_default().to_string(),
    };

    let file_name = path.rsplit('/').next()?;
    let (_, suffix) = file_name.rsplit_once('.')?;
    let suffix = suffix.to_ascii_lowercase();

    KNOWN_EXTENSIONS.iter().copied().find(|known| *known == suffix)
}

fn extension_from_content_type(content_type: &str) -> Option<&'static str> {
    let content_type = content_type.to_ascii_lowercase();

    if content_type.contains("jpeg") || content_type.contains("jpg") {
        Some("jpg")
    } else {
        KNOWN_EXTENSIONS[2..]
            .iter()
            .copied()
            .find(|known| content_type.contains(known))
    }
}
