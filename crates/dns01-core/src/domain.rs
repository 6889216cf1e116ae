//! Splitting a resolved zone/FQDN pair into a root domain and record name
//!
//! The root domain is always the last two labels of the zone. There is no
//! public suffix awareness: `example.co.uk` splits into root `co.uk` with
//! `example` pushed into the record name.

use crate::error::{Error, Result};

/// Where a challenge record lives at the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainSplit {
    /// Registrable domain the provider manages (e.g. "example.com")
    pub root: String,
    /// Record name relative to `root` (e.g. "_acme-challenge.foo")
    pub subdomain: String,
}

/// Derive the relative entry and the bare domain from a resolved pair
///
/// `entry` is the FQDN with the zone suffix removed and then one trailing
/// dot removed. `domain` is the zone with one trailing dot removed. An FQDN
/// that does not end with the zone is kept whole.
pub fn entry_and_domain(resolved_fqdn: &str, resolved_zone: &str) -> (String, String) {
    let entry = resolved_fqdn
        .strip_suffix(resolved_zone)
        .unwrap_or(resolved_fqdn);
    let entry = entry.strip_suffix('.').unwrap_or(entry);
    let domain = resolved_zone.strip_suffix('.').unwrap_or(resolved_zone);

    (entry.to_string(), domain.to_string())
}

/// Split `domain` into its root and the record name for `entry`
///
/// The record name is `entry` (outer dots trimmed) followed by every label
/// of `domain` in front of the root, in their original order.
pub fn split_root_and_subdomain(domain: &str, entry: &str) -> Result<DomainSplit> {
    let parts: Vec<&str> = domain.trim_matches('.').split('.').collect();
    if parts.len() < 2 {
        return Err(Error::invalid_domain(format!(
            "domain {:?} has fewer than two labels",
            domain
        )));
    }

    let (prefix, root) = parts.split_at(parts.len() - 2);

    let mut labels = Vec::with_capacity(prefix.len() + 1);
    labels.push(entry.trim_matches('.'));
    labels.extend_from_slice(prefix);

    Ok(DomainSplit {
        root: root.join("."),
        subdomain: labels.join("."),
    })
}

/// Resolve the record location for a challenge's FQDN and zone
pub fn resolve(resolved_fqdn: &str, resolved_zone: &str) -> Result<DomainSplit> {
    let (entry, domain) = entry_and_domain(resolved_fqdn, resolved_zone);
    split_root_and_subdomain(&domain, &entry)
}
