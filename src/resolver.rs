//! Badge resolution against the membership API
//!
//! The station never decides by itself who a code belongs to: every would-be
//! new scan is resolved first, and anything the resolver rejects never
//! reaches the session counters.

use serde::Deserialize;
use thiserror::Error;

use crate::badge;

const USER_AGENT: &str = concat!("doorscan/", env!("CARGO_PKG_VERSION"));

/// Identity a scanned code resolved to.
#[derive(Debug, Clone, Deserialize)]
pub struct ResolvedBadge {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default, rename = "participantType")]
    pub participant_type: Option<String>,
    #[serde(default = "default_active", rename = "isActive")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// Why a code could not be resolved.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("no badge or member matches this code")]
    NotFound,
    #[error("badge has been deactivated")]
    Deactivated,
    #[error("membership API request failed: {0}")]
    Http(String),
    #[error("membership API returned an unreadable response: {0}")]
    BadResponse(String),
}

/// Lookup seam between the station and the membership service.
pub trait BadgeResolver {
    fn resolve(&self, code: &str) -> Result<ResolvedBadge, ResolveError>;
}

impl<T: BadgeResolver + ?Sized> BadgeResolver for Box<T> {
    fn resolve(&self, code: &str) -> Result<ResolvedBadge, ResolveError> {
        (**self).resolve(code)
    }
}

/// Resolver backed by the association's membership API.
pub struct HttpBadgeResolver {
    base_url: String,
}

impl HttpBadgeResolver {
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { base_url }
    }
}

impl BadgeResolver for HttpBadgeResolver {
    fn resolve(&self, code: &str) -> Result<ResolvedBadge, ResolveError> {
        let url = format!("{}/api/user-by-qr/{}", self.base_url, code);

        let response = ureq::get(&url)
            .set("User-Agent", USER_AGENT)
            .call()
            .map_err(|err| match err {
                ureq::Error::Status(404, _) => ResolveError::NotFound,
                ureq::Error::Status(code, _) => {
                    ResolveError::Http(format!("unexpected status {code}"))
                }
                ureq::Error::Transport(transport) => ResolveError::Http(transport.to_string()),
            })?;

        let badge: ResolvedBadge = response
            .into_json()
            .map_err(|err| ResolveError::BadResponse(err.to_string()))?;

        if !badge.active {
            return Err(ResolveError::Deactivated);
        }

        Ok(badge)
    }
}

/// Format-only resolver for venues without connectivity.
///
/// Accepts codes that match a known badge ID format and nothing else; the
/// attendance log then carries the badge ID as the attendee identity, to be
/// reconciled against the member list after the event.
pub struct OfflineResolver;

impl BadgeResolver for OfflineResolver {
    fn resolve(&self, code: &str) -> Result<ResolvedBadge, ResolveError> {
        if !badge::is_known_format(code) {
            return Err(ResolveError::NotFound);
        }

        Ok(ResolvedBadge {
            id: code.to_string(),
            name: format!("Unverified {}", badge::kind_of(code).label()),
            company: None,
            participant_type: None,
            active: true,
        })
    }
}
