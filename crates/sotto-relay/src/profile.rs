//! Profile metadata and search results
//!
//! Everything in here is derived from untrusted remote metadata records;
//! nothing is validated beyond shape, and malformed content degrades to an
//! empty profile rather than an error.

use serde::Deserialize;

use sotto_core::codec::{npub_encode, shorten_npub};
use sotto_core::event::{SignedEvent, KIND_PROFILE_METADATA};

/// Parsed content of a profile metadata record
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ProfileMetadata {
    /// Preferred handle
    #[serde(default)]
    pub name: Option<String>,
    /// Display name, primary spelling
    #[serde(default)]
    pub display_name: Option<String>,
    /// Display name, alternate spelling some clients emit
    #[serde(default, rename = "displayName")]
    pub display_name_alt: Option<String>,
    /// Avatar reference
    #[serde(default)]
    pub picture: Option<String>,
    /// Domain-verification string
    #[serde(default)]
    pub nip05: Option<String>,
    /// Bio text
    #[serde(default)]
    pub about: Option<String>,
}

impl ProfileMetadata {
    /// Parse record content; malformed content becomes an empty profile
    pub fn parse(content: &str) -> Self {
        serde_json::from_str(content).unwrap_or_default()
    }

    /// Resolve the display name through the fallback chain
    ///
    /// `name` → `display_name` → `displayName` → shortened identity.
    pub fn resolved_name(&self, npub: &str) -> String {
        self.name
            .clone()
            .filter(|name| !name.is_empty())
            .or_else(|| self.display_name.clone().filter(|name| !name.is_empty()))
            .or_else(|| self.display_name_alt.clone().filter(|name| !name.is_empty()))
            .unwrap_or_else(|| shorten_npub(npub))
    }
}

/// One identity summary produced by a search
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchResult {
    /// Identity string (`npub`)
    pub npub: String,
    /// Resolved display name
    pub name: String,
    /// Avatar reference, if the profile carries one
    pub picture: Option<String>,
    /// Domain-verification string, if any
    pub nip05: Option<String>,
    /// Bio text, if any
    pub about: Option<String>,
}

impl SearchResult {
    /// Build a summary from a profile metadata record
    ///
    /// Returns `None` for records of the wrong kind or with an author key
    /// that does not encode.
    pub(crate) fn from_event(event: &SignedEvent) -> Option<Self> {
        if event.kind != KIND_PROFILE_METADATA {
            return None;
        }
        let author = hex::decode(&event.pubkey).ok()?;
        let author: [u8; 32] = author.try_into().ok()?;
        let npub = npub_encode(&author).ok()?;

        let metadata = ProfileMetadata::parse(&event.content);
        Some(Self {
            name: metadata.resolved_name(&npub),
            npub,
            picture: metadata.picture,
            nip05: metadata.nip05,
            about: metadata.about,
        })
    }
}
