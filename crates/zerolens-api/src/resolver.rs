//! DNS resolution seam.
//!
//! The core's TXT/reverse queries depend on this trait so tests can
//! inject a canned resolver; `SystemResolver` is the production
//! implementation on top of hickory. "No records found" is a successful
//! lookup with an empty record set -- only transport-level resolution
//! problems surface as errors.

use std::net::IpAddr;

use futures_util::future::BoxFuture;
use hickory_resolver::TokioAsyncResolver;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::error::ResolveErrorKind;
use tracing::debug;

use crate::error::Error;

/// Asynchronous DNS lookups, dyn-safe for injection.
pub trait DnsResolver: Send + Sync {
    /// Look up all TXT records published at `domain`.
    fn resolve_txt(&self, domain: &str) -> BoxFuture<'static, Result<Vec<String>, Error>>;

    /// Reverse-resolve `ip` to its PTR names.
    fn resolve_reverse(&self, ip: IpAddr) -> BoxFuture<'static, Result<Vec<String>, Error>>;
}

/// System-configured resolver.
#[derive(Clone)]
pub struct SystemResolver {
    inner: TokioAsyncResolver,
}

impl SystemResolver {
    /// Build a resolver with default upstream configuration.
    pub fn new() -> Self {
        Self {
            inner: TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default()),
        }
    }
}

impl Default for SystemResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl DnsResolver for SystemResolver {
    fn resolve_txt(&self, domain: &str) -> BoxFuture<'static, Result<Vec<String>, Error>> {
        let resolver = self.inner.clone();
        let domain = domain.to_owned();
        Box::pin(async move {
            debug!("TXT lookup for {domain}");
            match resolver.txt_lookup(domain.clone()).await {
                Ok(lookup) => Ok(lookup.iter().map(ToString::to_string).collect()),
                Err(e) if matches!(e.kind(), ResolveErrorKind::NoRecordsFound { .. }) => {
                    Ok(Vec::new())
                }
                Err(e) => Err(Error::Dns {
                    name: domain,
                    message: e.to_string(),
                }),
            }
        })
    }

    fn resolve_reverse(&self, ip: IpAddr) -> BoxFuture<'static, Result<Vec<String>, Error>> {
        let resolver = self.inner.clone();
        Box::pin(async move {
            debug!("reverse lookup for {ip}");
            match resolver.reverse_lookup(ip).await {
                Ok(lookup) => Ok(lookup.iter().map(ToString::to_string).collect()),
                Err(e) if matches!(e.kind(), ResolveErrorKind::NoRecordsFound { .. }) => {
                    Ok(Vec::new())
                }
                Err(e) => Err(Error::Dns {
                    name: ip.to_string(),
                    message: e.to_string(),
                }),
            }
        })
    }
}
