//! Badge payload parsing and format recognition
//!
//! Printed badges encode either a bare badge ID, a personal QR handle, or a
//! profile URL whose last path segment is the handle. Keyboard-wedge
//! scanners deliver whichever one the badge carries as plain text.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// General event badge, e.g. `AIS2025-7G2KX9QD`.
    static ref GENERAL_BADGE: Regex = Regex::new(r"^AIS\d{4}-[A-Z0-9]{8}$").unwrap();
    /// Workshop-only badge, e.g. `WS-12-3-AB12CD34E`.
    static ref WORKSHOP_BADGE: Regex = Regex::new(r"^WS-\d+-\d+-[A-Z0-9]{9}$").unwrap();
}

/// What kind of identifier a payload looks like.
///
/// This only drives display hints; the membership API is authoritative for
/// whether a code resolves to anyone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeKind {
    /// General event badge ID.
    General,
    /// Workshop-only badge ID.
    Workshop,
    /// Anything else is treated as a personal QR handle.
    Handle,
}

impl BadgeKind {
    pub fn label(&self) -> &'static str {
        match self {
            BadgeKind::General => "event badge",
            BadgeKind::Workshop => "workshop badge",
            BadgeKind::Handle => "QR handle",
        }
    }
}

/// Extract the scannable handle from a raw payload.
///
/// Trims whitespace; if the payload is a URL (contains `/`), the handle is
/// its last path segment. Returns `None` for empty input or a URL with an
/// empty final segment (trailing slash).
pub fn extract_handle(raw: &str) -> Option<&str> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let handle = match raw.rsplit_once('/') {
        Some((_, tail)) => tail.trim(),
        None => raw,
    };

    if handle.is_empty() {
        None
    } else {
        Some(handle)
    }
}

/// Classify a (already extracted) handle by its shape.
pub fn kind_of(handle: &str) -> BadgeKind {
    if GENERAL_BADGE.is_match(handle) {
        BadgeKind::General
    } else if WORKSHOP_BADGE.is_match(handle) {
        BadgeKind::Workshop
    } else {
        BadgeKind::Handle
    }
}

/// Whether a handle matches a known badge ID format.
///
/// Used by offline mode, where there is no API to ask.
pub fn is_known_format(handle: &str) -> bool {
    kind_of(handle) != BadgeKind::Handle
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_bare_codes() {
        assert_eq!(extract_handle("AIS2025-7G2KX9QD"), Some("AIS2025-7G2KX9QD"));
        assert_eq!(extract_handle("  jane-doe  "), Some("jane-doe"));
    }

    #[test]
    fn extracts_last_url_segment() {
        assert_eq!(
            extract_handle("https://example.org/members/jane-doe"),
            Some("jane-doe")
        );
        assert_eq!(extract_handle("example.org/@handle"), Some("@handle"));
    }

    #[test]
    fn rejects_empty_payloads() {
        assert_eq!(extract_handle(""), None);
        assert_eq!(extract_handle("   "), None);
        assert_eq!(extract_handle("https://example.org/members/"), None);
    }

    #[test]
    fn recognizes_general_badges() {
        assert_eq!(kind_of("AIS2025-7G2KX9QD"), BadgeKind::General);
        assert_eq!(kind_of("AIS2026-ABCD1234"), BadgeKind::General);
        // Lowercase and wrong length fall through to handle.
        assert_eq!(kind_of("ais2025-7g2kx9qd"), BadgeKind::Handle);
        assert_eq!(kind_of("AIS2025-SHORT"), BadgeKind::Handle);
    }

    #[test]
    fn recognizes_workshop_badges() {
        assert_eq!(kind_of("WS-12-3-AB12CD34E"), BadgeKind::Workshop);
        assert_eq!(kind_of("WS-1-1-123456789"), BadgeKind::Workshop);
        assert_eq!(kind_of("WS-12-AB12CD34E"), BadgeKind::Handle);
    }

    #[test]
    fn everything_else_is_a_handle() {
        assert_eq!(kind_of("jane-doe"), BadgeKind::Handle);
        assert!(!is_known_format("jane-doe"));
        assert!(is_known_format("WS-12-3-AB12CD34E"));
    }
}
