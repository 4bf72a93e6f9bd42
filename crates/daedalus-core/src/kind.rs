//! The closed set of middleware kinds.

use crate::error::DaedalusError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A middleware kind.
///
/// The set is closed: adding a kind means adding a variant here and
/// registering a handler for it. The serialized names match the pipeline
/// document format (`"CORS"`, `"HTTPS"`, `"MinimalAPIEndpoint"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MiddlewareKind {
    /// Route matching.
    Routing,
    /// Credential checks (JWT bearer, OpenID Connect, cookies).
    Authentication,
    /// Policy checks against the caller's claims.
    Authorization,
    /// Cross-origin resource sharing.
    #[serde(rename = "CORS")]
    Cors,
    /// Static file serving.
    StaticFiles,
    /// Exception handler registration.
    ExceptionHandling,
    /// Response compression.
    Compression,
    /// Named rate-limiter policies.
    RateLimiting,
    /// HTTPS redirection and HSTS.
    #[serde(rename = "HTTPS")]
    Https,
    /// User-defined middleware class.
    Custom,
    /// A `Map*` endpoint registration.
    #[serde(rename = "MinimalAPIEndpoint")]
    MinimalApiEndpoint,
}

/// Coarse grouping of middleware kinds, used for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KindCategory {
    /// Identity, policies, transport security.
    Security,
    /// Request routing.
    Routing,
    /// Response content shaping.
    Content,
    /// Error handling and throttling.
    Resilience,
    /// Terminal endpoints.
    Endpoint,
    /// User extensions.
    Extension,
}

impl MiddlewareKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 11] = [
        Self::Routing,
        Self::Authentication,
        Self::Authorization,
        Self::Cors,
        Self::StaticFiles,
        Self::ExceptionHandling,
        Self::Compression,
        Self::RateLimiting,
        Self::Https,
        Self::Custom,
        Self::MinimalApiEndpoint,
    ];

    /// Returns the document name of this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Routing => "Routing",
            Self::Authentication => "Authentication",
            Self::Authorization => "Authorization",
            Self::Cors => "CORS",
            Self::StaticFiles => "StaticFiles",
            Self::ExceptionHandling => "ExceptionHandling",
            Self::Compression => "Compression",
            Self::RateLimiting => "RateLimiting",
            Self::Https => "HTTPS",
            Self::Custom => "Custom",
            Self::MinimalApiEndpoint => "MinimalAPIEndpoint",
        }
    }

    /// Returns the display category of this kind.
    #[must_use]
    pub const fn category(self) -> KindCategory {
        match self {
            Self::Authentication | Self::Authorization | Self::Cors | Self::Https => {
                KindCategory::Security
            }
            Self::Routing => KindCategory::Routing,
            Self::StaticFiles | Self::Compression => KindCategory::Content,
            Self::ExceptionHandling | Self::RateLimiting => KindCategory::Resilience,
            Self::MinimalApiEndpoint => KindCategory::Endpoint,
            Self::Custom => KindCategory::Extension,
        }
    }

    /// Returns true for endpoint registrations.
    #[must_use]
    pub const fn is_endpoint(self) -> bool {
        matches!(self, Self::MinimalApiEndpoint)
    }
}

impl fmt::Display for MiddlewareKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for KindCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Security => "security",
            Self::Routing => "routing",
            Self::Content => "content",
            Self::Resilience => "resilience",
            Self::Endpoint => "endpoint",
            Self::Extension => "extension",
        };
        f.write_str(name)
    }
}

impl FromStr for MiddlewareKind {
    type Err = DaedalusError;

    /// Parses a kind by its document name, ignoring ASCII case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DaedalusError::unknown_kind(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_names_match_as_str() {
        for kind in MiddlewareKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }

    #[test]
    fn test_from_str_is_case_insensitive() {
        assert_eq!("cors".parse::<MiddlewareKind>().unwrap(), MiddlewareKind::Cors);
        assert_eq!(
            "minimalapiendpoint".parse::<MiddlewareKind>().unwrap(),
            MiddlewareKind::MinimalApiEndpoint
        );
        assert!("Tracing".parse::<MiddlewareKind>().is_err());
    }

    #[test]
    fn test_unknown_kind_fails_to_deserialize() {
        let result = serde_json::from_str::<MiddlewareKind>("\"Tracing\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_categories() {
        assert_eq!(MiddlewareKind::Cors.category(), KindCategory::Security);
        assert_eq!(MiddlewareKind::RateLimiting.category(), KindCategory::Resilience);
        assert_eq!(MiddlewareKind::MinimalApiEndpoint.category(), KindCategory::Endpoint);
        assert!(MiddlewareKind::MinimalApiEndpoint.is_endpoint());
        assert!(!MiddlewareKind::Routing.is_endpoint());
        assert_eq!(KindCategory::Resilience.to_string(), "resilience");
    }
}
