//! DNS lookup queries.
//!
//! Answers are treated as durable for the session: cached indefinitely,
//! with a short staleness window gating background re-resolution. Inputs
//! are validated client-side before any request -- an invalid domain or
//! IP short-circuits to a disabled, non-error subscription instead of a
//! doomed lookup.

use std::net::IpAddr;
use std::sync::Arc;

use url::Url;

use super::keys;
use crate::cache::{QueryHandle, QueryOptions};
use crate::engine::SyncEngine;
use crate::error::CoreError;

/// TXT records published at `domain`.
pub fn txt(engine: &SyncEngine, domain: &str) -> QueryHandle<Vec<String>> {
    let resolver = engine.resolver();
    let name = domain.to_owned();
    let enabled = !name.is_empty() && is_fqdn(&name);
    engine.cache().subscribe(
        keys::dns_txt(&name),
        move || {
            let resolver = Arc::clone(&resolver);
            let name = name.clone();
            async move { resolver.resolve_txt(&name).await.map_err(CoreError::from) }
        },
        QueryOptions::default()
            .stale_after(engine.config().dns_stale)
            .enabled(enabled),
    )
}

/// PTR names for `ip` (given as a string; syntactically invalid input
/// disables the subscription).
pub fn reverse(engine: &SyncEngine, ip: &str) -> QueryHandle<Vec<String>> {
    let resolver = engine.resolver();
    let parsed: Option<IpAddr> = ip.parse().ok();
    let input = ip.to_owned();
    engine.cache().subscribe(
        keys::dns_reverse(ip),
        move || {
            let resolver = Arc::clone(&resolver);
            let input = input.clone();
            async move {
                let Some(addr) = parsed else {
                    return Err(CoreError::ValidationFailed {
                        message: format!("'{input}' is not a valid IP address"),
                    });
                };
                resolver
                    .resolve_reverse(addr)
                    .await
                    .map_err(CoreError::from)
            }
        },
        QueryOptions::default()
            .stale_after(engine.config().dns_stale)
            .enabled(parsed.is_some()),
    )
}

// ── Client-side input validation ─────────────────────────────────────

/// Syntactic FQDN check: dot-separated labels of alphanumerics and
/// hyphens, an alphabetic TLD of at least two characters, and a trailing
/// dot allowed.
pub fn is_fqdn(name: &str) -> bool {
    let name = name.strip_suffix('.').unwrap_or(name);
    if name.is_empty() || name.len() > 253 {
        return false;
    }

    let labels: Vec<&str> = name.split('.').collect();
    if labels.len() < 2 {
        return false;
    }

    let valid_label = |label: &&str| {
        !label.is_empty()
            && label.len() <= 63
            && label
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-')
            && !label.starts_with('-')
            && !label.ends_with('-')
    };
    if !labels.iter().all(valid_label) {
        return false;
    }

    labels
        .last()
        .is_some_and(|tld| tld.len() >= 2 && tld.bytes().all(|b| b.is_ascii_alphabetic()))
}

/// Normalize a user-supplied identifier to a hostname: URL-hostname
/// extraction first, falling back to the raw (trimmed) string when the
/// input is not a well-formed URL.
pub fn hostname_from_identifier(identifier: &str) -> String {
    let trimmed = identifier.trim();
    match Url::parse(trimmed) {
        Ok(url) => url
            .host_str()
            .map_or_else(|| trimmed.to_owned(), str::to_owned),
        Err(_) => trimmed.to_owned(),
    }
}

/// Whether an identifier plausibly names a domain (after normalization).
pub fn has_domain_name(identifier: &str) -> bool {
    is_fqdn(&hostname_from_identifier(identifier))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_ordinary_fqdns() {
        assert!(is_fqdn("example.com"));
        assert!(is_fqdn("prakashlab.dedyn.io"));
        assert!(is_fqdn("a-b.example.co.uk"));
        assert!(is_fqdn("example.com."));
    }

    #[test]
    fn rejects_non_fqdns() {
        assert!(!is_fqdn(""));
        assert!(!is_fqdn("localhost"));
        assert!(!is_fqdn("example"));
        assert!(!is_fqdn("example..com"));
        assert!(!is_fqdn("-bad.example.com"));
        assert!(!is_fqdn("bad-.example.com"));
        assert!(!is_fqdn("example.c"));
        assert!(!is_fqdn("example.123"));
        assert!(!is_fqdn("exa mple.com"));
        assert!(!is_fqdn("example.com:9993"));
    }

    #[test]
    fn rejects_overlong_names() {
        let label = "a".repeat(64);
        assert!(!is_fqdn(&format!("{label}.com")));
        let long = format!("{}.com", "a.".repeat(130));
        assert!(!is_fqdn(&long));
    }

    #[test]
    fn hostname_extraction_prefers_url_host() {
        assert_eq!(
            hostname_from_identifier("https://example.com/network"),
            "example.com"
        );
        assert_eq!(
            hostname_from_identifier("http://example.com:8080"),
            "example.com"
        );
    }

    #[test]
    fn hostname_extraction_falls_back_to_raw_input() {
        assert_eq!(hostname_from_identifier("example.com"), "example.com");
        assert_eq!(
            hostname_from_identifier("  prakashlab.dedyn.io  "),
            "prakashlab.dedyn.io"
        );
    }

    #[test]
    fn domain_name_detection_normalizes_first() {
        assert!(has_domain_name("https://example.com/x"));
        assert!(has_domain_name("example.com"));
        assert!(!has_domain_name("1c33c1ced015c144"));
        assert!(!has_domain_name(""));
    }
}
