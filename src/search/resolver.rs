use super::models::ImageResult;

/// Picks the URL to download for a result: the full-resolution link when it
/// is non-blank, otherwise the thumbnail, otherwise nothing.
pub fn resolve(result: &ImageResult) -> Option<&str> {
    [&result.direct_url, &result.thumbnail_url]
        .into_iter()
        .filter_map(|candidate| candidate.as_deref())
        .find(|url| !url.trim().is_empty())
}
