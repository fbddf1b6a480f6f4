//! DOM hooks on the ads library results page.

use std::sync::LazyLock;

pub const RESULT_MARKER: &str = r#"[data-testid="ad-archive-result"]"#;
const HEADLINE: &str = r#"[data-testid="ad-creative-title"]"#;
const BODY: &str = r#"[data-testid="ad-creative-body"]"#;
const IMAGE: &str = r#"img[data-testid="ad-image"]"#;
const VIDEO: &str = "video";
const LINK: &str = r#"[data-testid="ad-link"]"#;
const CALL_TO_ACTION: &str = r#"[data-testid="ad-cta"]"#;
const PAGE_NAME: &str = r#"[data-testid="page-name"]"#;
const START_DATE: &str = r#"[data-testid="ad-start-date"]"#;
const CAROUSEL_INDICATOR: &str = r#"[data-testid="carousel-indicator"]"#;
pub const NEXT_PAGE: &str = r#"[data-testid="next-page-button"]"#;

/// In-page script returning one JSON object per ad card, shaped like
/// [`crate::RawAd`].
pub static EXTRACT_ADS_SCRIPT: LazyLock<String> = LazyLock::new(|| {
    format!(
        r#"(() => {{
  const text = (root, sel) => {{
    const el = root.querySelector(sel);
    return el ? (el.textContent || '').trim() : '';
  }};
  const attr = (root, sel, name) => {{
    const el = root.querySelector(sel);
    return el ? (el.getAttribute(name) || '') : '';
  }};
  return Array.from(document.querySelectorAll('{RESULT_MARKER}')).map((card) => ({{
    headline: text(card, '{HEADLINE}'),
    description: text(card, '{BODY}'),
    thumbnailUrl: attr(card, '{IMAGE}', 'src'),
    videoUrl: attr(card, '{VIDEO}', 'src'),
    destinationUrl: attr(card, '{LINK}', 'href'),
    callToAction: text(card, '{CALL_TO_ACTION}'),
    pageName: text(card, '{PAGE_NAME}'),
    startDateText: text(card, '{START_DATE}'),
    hasCarousel: card.querySelector('{CAROUSEL_INDICATOR}') !== null,
  }}));
}})()"#
    )
});
