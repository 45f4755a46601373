//! Hostname normalization and classification.
//!
//! Every inbound request carries an opaque `Host`. Before anything else the
//! edge normalizes it and sorts it into one of three classes: the platform's
//! own dashboard, a managed `{slug}.{platform-domain}` subdomain, or a
//! custom domain pointed at the platform by a tenant.

use std::fmt;

/// Error type for hostname normalization failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    #[error("empty host")]
    Empty,

    #[error("invalid host: {0}")]
    Invalid(String),
}

/// A normalized DNS hostname: lowercase, no port, no trailing dot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Hostname(String);

impl Hostname {
    /// Normalize a raw `Host` header value.
    ///
    /// Normalization steps:
    /// 1. Trim leading/trailing whitespace
    /// 2. Strip the `:port` suffix
    /// 3. Strip a single trailing dot
    /// 4. Lowercase
    /// 5. Reject empty labels and characters outside `[a-z0-9-]`
    pub fn parse(raw: &str) -> Result<Self, HostError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(HostError::Empty);
        }

        let without_port = match trimmed.rsplit_once(':') {
            Some((host, port)) if !port.is_empty() && port.chars().all(|c| c.is_ascii_digit()) => host,
            Some(_) => return Err(HostError::Invalid(trimmed.to_string())),
            None => trimmed,
        };

        let host = without_port.strip_suffix('.').unwrap_or(without_port).to_ascii_lowercase();
        if host.is_empty() {
            return Err(HostError::Empty);
        }

        let valid = host.split('.').all(|label| {
            !label.is_empty()
                && label.len() <= 63
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        });
        if !valid || host.len() > 253 {
            return Err(HostError::Invalid(trimmed.to_string()));
        }

        Ok(Self(host))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Hostname {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which lookup space a hostname belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostClass {
    /// The builder's own dashboard.
    Platform,
    /// `{slug}.{platform-domain}`, issued by the platform.
    ManagedSubdomain { slug: String },
    /// Any third-party name pointed at the platform.
    CustomDomain,
}

/// The platform's own domains, used to classify inbound hostnames.
#[derive(Debug, Clone)]
pub struct PlatformDomains {
    domain: String,
    dashboard_hosts: Vec<String>,
}

impl PlatformDomains {
    /// Aliases of the platform domain that also serve the dashboard.
    pub const DASHBOARD_ALIASES: &'static [&'static str] = &["www", "app"];

    pub fn new(domain: &str, dashboard_hosts: &[String]) -> Self {
        let normalize = |h: &str| h.trim().trim_end_matches('.').to_ascii_lowercase();
        Self {
            domain: normalize(domain),
            dashboard_hosts: dashboard_hosts.iter().map(|h| normalize(h)).collect(),
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Classify a normalized hostname.
    pub fn classify(&self, host: &Hostname) -> HostClass {
        let host = host.as_str();

        if host == self.domain || self.dashboard_hosts.iter().any(|h| h == host) {
            return HostClass::Platform;
        }

        if let Some(prefix) = host.strip_suffix(self.domain.as_str())
            && let Some(slug) = prefix.strip_suffix('.')
            && !slug.is_empty()
            && !slug.contains('.')
        {
            if Self::DASHBOARD_ALIASES.contains(&slug) {
                return HostClass::Platform;
            }
            return HostClass::ManagedSubdomain { slug: slug.to_string() };
        }

        HostClass::CustomDomain
    }
}
