//! Merging the two provider streams into one snapshot.

use draincache_types::{Binding, BindingsMap};

/// Merge the non-mTLS and mTLS binding maps into a snapshot.
///
/// The result is the union on app id. For an application present in both
/// inputs, the merged binding lists the mTLS drains first so that consumers
/// capping drains-per-app preferentially keep credentialed drains, and the
/// hostname is taken from the mTLS entry. Drains appearing in both inputs
/// for the same application are kept twice; this function does not dedupe.
///
/// Pure function of its two arguments; the store calls it under its write
/// lock so the inputs cannot change mid-merge.
pub fn merge_bindings(non_mtls: &BindingsMap, mtls: &BindingsMap) -> Vec<Binding> {
    let mut merged: BindingsMap = non_mtls.clone();

    for (app_id, mtls_binding) in mtls {
        match non_mtls.get(app_id) {
            Some(non_mtls_binding) => {
                let mut drains = mtls_binding.drains.clone();
                drains.extend(non_mtls_binding.drains.iter().cloned());
                merged.insert(
                    app_id.clone(),
                    Binding {
                        app_id: app_id.clone(),
                        hostname: mtls_binding.hostname.clone(),
                        drains,
                    },
                );
            },
            None => {
                merged.insert(app_id.clone(), mtls_binding.clone());
            },
        }
    }

    merged.into_values().collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "test assertions")]
mod tests {
    use std::collections::HashSet;

    use draincache_types::{Drain, TlsCredential};

    use super::*;

    fn plain_binding(app_id: &str, hostname: &str, urls: &[&str]) -> Binding {
        Binding {
            app_id: app_id.to_string(),
            hostname: hostname.to_string(),
            drains: urls.iter().map(|u| Drain::plain(*u)).collect(),
        }
    }

    fn mtls_binding(app_id: &str, hostname: &str, drains: &[(&str, &str, &str)]) -> Binding {
        Binding {
            app_id: app_id.to_string(),
            hostname: hostname.to_string(),
            drains: drains
                .iter()
                .map(|(url, cert, key)| Drain {
                    url: (*url).to_string(),
                    tls_credential: TlsCredential {
                        cert: (*cert).to_string(),
                        key: (*key).to_string(),
                    },
                })
                .collect(),
        }
    }

    #[test]
    fn test_merge_is_union_on_app_ids() {
        let non_mtls = BindingsMap::from([
            ("app1".to_string(), plain_binding("app1", "h1", &["syslog://a"])),
            ("app2".to_string(), plain_binding("app2", "h2", &["syslog://b"])),
        ]);
        let mtls = BindingsMap::from([
            ("app2".to_string(), mtls_binding("app2", "h2", &[("mtls://b", "c", "k")])),
            ("app3".to_string(), mtls_binding("app3", "h3", &[("mtls://c", "c", "k")])),
        ]);

        let merged = merge_bindings(&non_mtls, &mtls);
        let keys: HashSet<&str> = merged.iter().map(|b| b.app_id.as_str()).collect();
        assert_eq!(keys, HashSet::from(["app1", "app2", "app3"]));
    }

    #[test]
    fn test_overlap_lists_mtls_drains_first() {
        let non_mtls = BindingsMap::from([(
            "app1".to_string(),
            plain_binding("app1", "plain-host", &["syslog://a", "syslog://b"]),
        )]);
        let mtls = BindingsMap::from([(
            "app1".to_string(),
            mtls_binding("app1", "mtls-host", &[("mtls://a", "cert-a", "key-a")]),
        )]);

        let merged = merge_bindings(&non_mtls, &mtls);
        assert_eq!(merged.len(), 1);

        let binding = &merged[0];
        assert_eq!(binding.hostname, "mtls-host");
        let urls: Vec<&str> = binding.drains.iter().map(|d| d.url.as_str()).collect();
        assert_eq!(urls, vec!["mtls://a", "syslog://a", "syslog://b"]);
        assert_eq!(binding.drains[0].tls_credential.cert, "cert-a");
        assert!(binding.drains[1].tls_credential.is_empty());
    }

    #[test]
    fn test_merge_with_overlap_scenario() {
        let non_mtls = BindingsMap::from([
            ("app1".to_string(), plain_binding("app1", "h", &["syslog://a"])),
            ("app2".to_string(), plain_binding("app2", "h", &["syslog://b"])),
        ]);
        let mtls = BindingsMap::from([
            ("app1".to_string(), mtls_binding("app1", "h", &[("mtls://a", "c", "k")])),
            ("app3".to_string(), mtls_binding("app3", "h", &[("mtls://c", "c2", "k2")])),
        ]);

        let merged = merge_bindings(&non_mtls, &mtls);
        assert_eq!(merged.len(), 3);

        let by_app = |id: &str| merged.iter().find(|b| b.app_id == id).unwrap();

        let app1_urls: Vec<&str> = by_app("app1").drains.iter().map(|d| d.url.as_str()).collect();
        assert_eq!(app1_urls, vec!["mtls://a", "syslog://a"]);

        let app2_urls: Vec<&str> = by_app("app2").drains.iter().map(|d| d.url.as_str()).collect();
        assert_eq!(app2_urls, vec!["syslog://b"]);

        let app3 = by_app("app3");
        assert_eq!(app3.drains[0].url, "mtls://c");
        assert_eq!(app3.drains[0].tls_credential.cert, "c2");
        assert_eq!(app3.drains[0].tls_credential.key, "k2");
    }

    #[test]
    fn test_duplicate_urls_are_not_deduped() {
        let non_mtls = BindingsMap::from([(
            "app1".to_string(),
            plain_binding("app1", "h", &["syslog://same"]),
        )]);
        let mtls = BindingsMap::from([(
            "app1".to_string(),
            mtls_binding("app1", "h", &[("syslog://same", "c", "k")]),
        )]);

        let merged = merge_bindings(&non_mtls, &mtls);
        assert_eq!(merged[0].drains.len(), 2);
    }

    #[test]
    fn test_empty_inputs_produce_empty_snapshot() {
        let merged = merge_bindings(&BindingsMap::new(), &BindingsMap::new());
        assert!(merged.is_empty());
    }
}
