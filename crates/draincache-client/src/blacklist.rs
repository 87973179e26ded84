//! Drain host blacklist.

use std::collections::HashSet;
use std::net::IpAddr;

use ipnet::IpNet;
use url::Url;

/// Hosts an agent refuses to forward to, given as hostnames, bare IPs or
/// CIDR networks.
#[derive(Debug, Clone, Default)]
pub struct Blacklist {
    hosts: HashSet<String>,
    networks: Vec<IpNet>,
}

impl Blacklist {
    /// Each entry is tried as a CIDR network, then as a bare IP (matched as
    /// a host network), then kept as an exact hostname.
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut hosts = HashSet::new();
        let mut networks = Vec::new();
        for entry in entries {
            let entry = entry.as_ref().trim();
            if entry.is_empty() {
                continue;
            }
            if let Ok(net) = entry.parse::<IpNet>() {
                networks.push(net);
            } else if let Ok(ip) = entry.parse::<IpAddr>() {
                networks.push(IpNet::from(ip));
            } else {
                hosts.insert(entry.to_ascii_lowercase());
            }
        }
        Self { hosts, networks }
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty() && self.networks.is_empty()
    }

    /// Whether the URL's host is blacklisted.
    pub fn excludes(&self, url: &Url) -> bool {
        let Some(host) = url.host_str() else {
            return false;
        };
        // Url keeps IPv6 hosts bracketed.
        let bare_host = host.strip_prefix('[').and_then(|h| h.strip_suffix(']')).unwrap_or(host);

        if self.hosts.contains(bare_host) {
            return true;
        }
        if let Ok(ip) = bare_host.parse::<IpAddr>() {
            return self.networks.iter().any(|net| net.contains(&ip));
        }
        false
    }
}
