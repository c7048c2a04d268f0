//! Cross-origin source rewriting used by older releases before attaching a
//! graph. Off unless `EngineConfig::legacy_cross_origin_rewrite` is set.

use tracing::debug;
use url::Url;
use volboost_core::{MediaElement, MediaElementHandle, PlatformError};

const CROSS_ORIGIN_ANONYMOUS: &str = "anonymous";

/// Marks a cross-origin element `anonymous` and reassigns its source (upgraded
/// to https), resuming playback if it was playing. Returns whether anything changed.
pub(crate) fn prepare_cross_origin(
    element: &MediaElementHandle,
    src: &str,
    document_url: Option<&Url>,
) -> Result<bool, PlatformError> {
    if element.cross_origin().is_some() {
        return Ok(false);
    }
    let Ok(source) = Url::parse(src) else {
        return Ok(false);
    };
    if !matches!(source.scheme(), "http" | "https") {
        return Ok(false);
    }
    if document_url.is_some_and(|doc| doc.origin() == source.origin()) {
        return Ok(false);
    }

    let was_playing = !element.is_paused();
    let mut rewritten = source;
    if rewritten.scheme() == "http" && rewritten.set_scheme("https").is_err() {
        return Ok(false);
    }
    element.set_cross_origin(CROSS_ORIGIN_ANONYMOUS)?;
    element.set_src(rewritten.as_str())?;
    if was_playing {
        element.play()?;
    }
    debug!(element = %element.id(), src = %rewritten, was_playing, "rewrote media source for cors");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use volboost_core::MediaKind;
    use volboost_headless::HeadlessDocument;

    use super::*;

    #[test]
    fn rewrites_cross_origin_http_source_and_resumes_playback() {
        let document = HeadlessDocument::new(Some("https://page.test/watch"));
        let element = document.create_element(MediaKind::Video, Some("http://cdn.test/a.mp4"));
        document.append_media(&element);
        document.start_playing(element.id());

        let handle: MediaElementHandle = element.clone();
        let page = Url::parse("https://page.test/watch").expect("valid url");
        let changed = prepare_cross_origin(&handle, "http://cdn.test/a.mp4", Some(&page))
            .expect("rewrite failed");

        assert!(changed);
        assert_eq!(element.cross_origin().as_deref(), Some("anonymous"));
        assert_eq!(element.current_src().as_deref(), Some("https://cdn.test/a.mp4"));
        assert_eq!(element.play_calls(), 1);
    }

    #[test]
    fn leaves_same_origin_and_already_marked_sources_alone() {
        let document = HeadlessDocument::new(Some("https://page.test/watch"));
        let page = Url::parse("https://page.test/watch").expect("valid url");

        let same = document.create_element(MediaKind::Audio, Some("https://page.test/a.mp3"));
        let same: MediaElementHandle = same;
        assert_eq!(
            prepare_cross_origin(&same, "https://page.test/a.mp3", Some(&page)),
            Ok(false)
        );

        let marked = document.create_element(MediaKind::Audio, Some("https://cdn.test/a.mp3"));
        marked
            .set_cross_origin("use-credentials")
            .expect("set cross origin");
        let marked: MediaElementHandle = Arc::clone(&marked) as MediaElementHandle;
        assert_eq!(
            prepare_cross_origin(&marked, "https://cdn.test/a.mp3", Some(&page)),
            Ok(false)
        );
        assert_eq!(marked.current_src().as_deref(), Some("https://cdn.test/a.mp3"));
    }
}
