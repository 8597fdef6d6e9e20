//! Engine configuration

use crate::error::{MappingError, MappingResult};
use morphic_reflect::{MemberFilter, Visibility};
use serde::{Deserialize, Serialize};

/// Engine-wide settings
///
/// Loadable from TOML or JSON; missing keys take their defaults.
///
/// ```rust
/// use morphic_core::EngineConfig;
///
/// let config = EngineConfig::from_toml_str("max_depth = 8").unwrap();
/// assert_eq!(config.max_depth, 8);
/// assert!(config.identity_tracking);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Least visible member considered by member lookup and auto-matching
    pub member_visibility: Visibility,
    /// Maximum nesting of mapping calls within one top-level call
    pub max_depth: usize,
    /// Track already-mapped reference sources within one call
    pub identity_tracking: bool,
    /// Remember unsupported pairs in the caching store
    pub cache_negative_lookups: bool,
}

impl EngineConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With member visibility threshold
    #[inline]
    #[must_use]
    pub fn with_member_visibility(mut self, visibility: Visibility) -> Self {
        self.member_visibility = visibility;
        self
    }

    /// With maximum nesting depth
    #[inline]
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// With identity tracking on or off
    #[inline]
    #[must_use]
    pub fn with_identity_tracking(mut self, enabled: bool) -> Self {
        self.identity_tracking = enabled;
        self
    }

    /// With negative lookup caching on or off
    #[inline]
    #[must_use]
    pub fn with_negative_caching(mut self, enabled: bool) -> Self {
        self.cache_negative_lookups = enabled;
        self
    }

    /// Filter for readable source members
    #[inline]
    #[must_use]
    pub fn readable_members(&self) -> MemberFilter {
        MemberFilter::readable().with_visibility(self.member_visibility)
    }

    /// Filter for writable target members
    #[inline]
    #[must_use]
    pub fn writable_members(&self) -> MemberFilter {
        MemberFilter::writable().with_visibility(self.member_visibility)
    }

    /// Parse from TOML
    ///
    /// # Errors
    /// Returns [`MappingError::Config`] on malformed input
    pub fn from_toml_str(input: &str) -> MappingResult<Self> {
        toml::from_str(input).map_err(|e| MappingError::Config(e.to_string()))
    }

    /// Parse from JSON
    ///
    /// # Errors
    /// Returns [`MappingError::Config`] on malformed input
    pub fn from_json_str(input: &str) -> MappingResult<Self> {
        serde_json::from_str(input).map_err(|e| MappingError::Config(e.to_string()))
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            member_visibility: Visibility::Public,
            max_depth: 64,
            identity_tracking: true,
            cache_negative_lookups: false,
        }
    }
}
