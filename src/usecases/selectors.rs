//! CSS contract with the host webmail DOM.
//!
//! The host UI is uncontrolled and renders asynchronously; these selectors
//! and text markers are the whole of what the drivers assume about its
//! shape. Grouped here so a host-side markup change is a one-file fix.

/// A row in the search result list.
pub const RESULT_ROW: &str = "tr.zA";

/// Containers that carry the explicit empty-result indicator.
pub const EMPTY_STATE: &str = ".TC, .ae4";

/// Substrings identifying the empty-result indicator text, either UI
/// language.
pub const EMPTY_STATE_MARKERS: &[&str] = &["一致する", "No messages matched"];

/// Rendered message bodies inside an opened conversation. The shapes
/// overlap (the first nests inside the second in current markup), which is
/// one of the reasons extraction output is deduplicated per item.
pub const MESSAGE_BODIES: &[&str] = &["div.a3s", "div.ii.gt"];

/// Collapsed-indicator shapes inside an open conversation. Not mutually
/// exclusive; each vanishes or flips `aria-expanded` once its message
/// renders, so re-clicking cannot collapse an expanded message.
pub const COLLAPSED_INDICATORS: &[&str] = &[
    // Collapsed-stack count badge ("N older messages").
    "span.adx",
    // Unloaded placeholder row.
    "div.kQ",
    // Collapsed message header row.
    "div.kv",
    // Inline expand affordance.
    "div[role=\"button\"][aria-expanded=\"false\"]",
];

/// Explicit back-to-list affordances, in preference order.
pub const BACK_TO_LIST: &[&str] = &[
    "[aria-label=\"リストに戻る\"]",
    "[aria-label=\"Back to list\"]",
    "[data-tooltip=\"リストに戻る\"]",
    "[data-tooltip=\"Back to list\"]",
    ".ak.T-I-J3.J-J5-Ji",
];

/// Native back-to-list keyboard shortcut of the host UI.
pub const BACK_SHORTCUT: char = 'u';
