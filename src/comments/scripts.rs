//! In-page scripts and selectors for the comment panel

/// Number of rendered comment items; the cheap convergence signal
pub const COUNT_COMMENTS: &str = include_str!("js/count_comments.js");

/// Click every "view more replies" / "show more" button; yields the click count
pub const EXPAND_REPLIES: &str = include_str!("js/expand_replies.js");

/// Scroll the comment list to its end, or the viewport by two screens; yields `container` or `viewport`
pub const SCROLL_COMMENTS: &str = include_str!("js/scroll_comments.js");

/// Click consent/close buttons covering the page; yields the click count
pub const DISMISS_OVERLAYS: &str = include_str!("js/dismiss_overlays.js");

/// Raw comment items from the rendered DOM, as a JSON string
pub const EXTRACT_COMMENTS: &str = include_str!("js/extract_comments.js");

/// Present once the comment panel is open
pub const COMMENT_LIST: &str = r#"[data-e2e="comment-list"]"#;

/// Any comment-related region; used when waiting for the panel to render
pub const COMMENT_REGION: &str = r#"[data-e2e="comment-list"], [data-e2e*="comment"]"#;

/// Buttons that open a collapsed comment panel, most specific first
pub const COMMENT_ICONS: &[&str] = &[
    r#"[data-e2e="browse-comment-icon"]"#,
    r#"[data-e2e="comment-icon"]"#,
    r#"button[aria-label*="comment" i]"#,
    r#"svg[aria-label*="comment" i]"#,
];
