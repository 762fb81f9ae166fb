//! Link cache capability.
//!
//! Addons query link state many times per run; the cache keeps the last
//! kernel dump keyed by interface name so those lookups are cheap.

use std::collections::HashMap;

/// Kernel view of one link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkInfo {
    pub ifindex: u32,
    pub name: String,
    pub mtu: Option<u32>,
    /// Administrative state (IFF_UP).
    pub up: bool,
    /// Hardware address, formatted `aa:bb:cc:dd:ee:ff`.
    pub address: Option<String>,
}

impl LinkInfo {
    pub fn new(ifindex: u32, name: impl Into<String>) -> Self {
        Self {
            ifindex,
            name: name.into(),
            mtu: None,
            up: false,
            address: None,
        }
    }
}

/// Result cache for link lookups.
#[derive(Debug, Default)]
pub struct Cache {
    links: HashMap<String, LinkInfo>,
}

impl Cache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the cache content with a fresh dump.
    pub fn update(&mut self, links: impl IntoIterator<Item = LinkInfo>) {
        self.links.clear();
        self.extend(links);
    }

    /// Adds or refreshes individual links.
    pub fn extend(&mut self, links: impl IntoIterator<Item = LinkInfo>) {
        for link in links {
            self.links.insert(link.name.clone(), link);
        }
    }

    pub fn get(&self, ifname: &str) -> Option<&LinkInfo> {
        self.links.get(ifname)
    }

    pub fn link_exists(&self, ifname: &str) -> bool {
        self.links.contains_key(ifname)
    }

    pub fn get_ifindex(&self, ifname: &str) -> Option<u32> {
        self.links.get(ifname).map(|l| l.ifindex)
    }

    pub fn get_mtu(&self, ifname: &str) -> Option<u32> {
        self.links.get(ifname).and_then(|l| l.mtu)
    }

    pub fn link_is_up(&self, ifname: &str) -> bool {
        self.links.get(ifname).is_some_and(|l| l.up)
    }

    /// Records an MTU change we applied ourselves, so the cache does not
    /// need a new dump. Returns false if the link is not cached.
    pub fn override_mtu(&mut self, ifname: &str, mtu: u32) -> bool {
        match self.links.get_mut(ifname) {
            Some(link) => {
                link.mtu = Some(mtu);
                true
            }
            None => false,
        }
    }

    /// Records an admin state change we applied ourselves.
    pub fn override_admin_state(&mut self, ifname: &str, up: bool) -> bool {
        match self.links.get_mut(ifname) {
            Some(link) => {
                link.up = up;
                true
            }
            None => false,
        }
    }

    pub fn remove_link(&mut self, ifname: &str) -> Option<LinkInfo> {
        self.links.remove(ifname)
    }

    pub fn clear(&mut self) {
        self.links.clear();
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eth0() -> LinkInfo {
        LinkInfo {
            ifindex: 2,
            name: "eth0".to_string(),
            mtu: Some(1500),
            up: true,
            address: Some("00:11:22:33:44:55".to_string()),
        }
    }

    #[test]
    fn test_lookups() {
        let mut cache = Cache::new();
        cache.update(vec![eth0(), LinkInfo::new(3, "eth1")]);

        assert_eq!(cache.len(), 2);
        assert!(cache.link_exists("eth0"));
        assert_eq!(cache.get_ifindex("eth0"), Some(2));
        assert_eq!(cache.get_mtu("eth0"), Some(1500));
        assert_eq!(cache.get_mtu("eth1"), None);
        assert!(cache.link_is_up("eth0"));
        assert!(!cache.link_is_up("eth1"));
        assert!(!cache.link_is_up("eth9"));
    }

    #[test]
    fn test_update_replaces_content() {
        let mut cache = Cache::new();
        cache.update(vec![eth0()]);
        cache.update(vec![LinkInfo::new(3, "eth1")]);

        assert!(!cache.link_exists("eth0"));
        assert!(cache.link_exists("eth1"));
    }

    #[test]
    fn test_overrides() {
        let mut cache = Cache::new();
        cache.extend(vec![eth0()]);

        assert!(cache.override_mtu("eth0", 9000));
        assert_eq!(cache.get_mtu("eth0"), Some(9000));
        assert!(!cache.override_mtu("eth9", 9000));

        assert!(cache.override_admin_state("eth0", false));
        assert!(!cache.link_is_up("eth0"));
    }

    #[test]
    fn test_remove_and_clear() {
        let mut cache = Cache::new();
        cache.extend(vec![eth0(), LinkInfo::new(3, "eth1")]);

        assert_eq!(cache.remove_link("eth0").map(|l| l.ifindex), Some(2));
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }
}
