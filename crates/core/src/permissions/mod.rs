//! Permission resolution
//!
//! Every permission holder (player or group) declares a map of
//! `node -> bool`. Its effective map is computed from the declared map plus
//! the effective maps of its groups, in order:
//!
//! ```text
//!  declared ──┐
//!             ├─► effective = declared
//!  group 1 ───┤     for each (node, value) of group 1:
//!             │       overwrite unless effective[node] == true
//!  group 2 ───┤     for each (node, value) of group 2:
//!   ...       │       overwrite unless effective[node] == true
//!             ▼
//! ```
//!
//! A `true` is never demoted by a later source; a `false` is promoted by any
//! later `true`. Lookups are default-deny.
//!
//! # Example
//!
//! ```ignore
//! use warden_core::permissions::{resolve, PermissionMap};
//!
//! let declared = PermissionMap::from([("chat.color".to_string(), false)]);
//! let vip = PermissionMap::from([("chat.color".to_string(), true)]);
//!
//! let effective = resolve(&declared, [&vip]);
//! assert_eq!(effective.get("chat.color"), Some(&true));
//! ```

mod storage;

use std::collections::HashMap;

pub(crate) use storage::{read_permissions, write_permissions};

/// Permission node -> granted
pub type PermissionMap = HashMap<String, bool>;

/// Merge `inherited` into `effective`, never overwriting a `true`
pub fn merge_into(effective: &mut PermissionMap, inherited: &PermissionMap) {
    for (node, value) in inherited {
        if effective.get(node) != Some(&true) {
            effective.insert(node.clone(), *value);
        }
    }
}

/// Compute an effective map from declared grants and ordered group maps.
///
/// The caller decides which groups apply (including the default-group
/// fallback); this function only merges.
pub fn resolve<'a, I>(declared: &PermissionMap, groups: I) -> PermissionMap
where
    I: IntoIterator<Item = &'a PermissionMap>,
{
    let mut effective = declared.clone();
    for group in groups {
        merge_into(&mut effective, group);
    }
    effective
}

/// Default-deny lookup: only a present `true` grants
pub fn is_granted(map: &PermissionMap, node: &str) -> bool {
    map.get(node).copied().unwrap_or(false)
}

/// Something that declares permissions and has a resolved effective map
pub trait Permissible {
    /// Permissions granted or denied directly on this holder
    fn declared_permissions(&self) -> PermissionMap;

    /// Result of the last resolution
    fn effective_permissions(&self) -> PermissionMap;

    /// Check a single node against the effective map
    fn has_permission(&self, node: &str) -> bool {
        is_granted(&self.effective_permissions(), node)
    }

    /// Check if any of the nodes is granted
    fn has_any_permission(&self, nodes: &[&str]) -> bool {
        let effective = self.effective_permissions();
        nodes.iter().any(|node| is_granted(&effective, node))
    }

    /// Check if every node is granted
    fn has_all_permissions(&self, nodes: &[&str]) -> bool {
        let effective = self.effective_permissions();
        nodes.iter().all(|node| is_granted(&effective, node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: &[(&str, bool)]) -> PermissionMap {
        entries
            .iter()
            .map(|(node, value)| ((*node).to_string(), *value))
            .collect()
    }

    #[test]
    fn test_declared_true_wins_over_group_false() {
        let declared = map(&[("a", true)]);
        let g1 = map(&[("a", false)]);

        let effective = resolve(&declared, [&g1]);
        assert_eq!(effective.get("a"), Some(&true));
    }

    #[test]
    fn test_later_group_promotes_false() {
        let declared = map(&[("a", false)]);
        let g1 = map(&[("a", false)]);
        let g2 = map(&[("a", true)]);

        let effective = resolve(&declared, [&g1, &g2]);
        assert_eq!(effective.get("a"), Some(&true));
    }

    #[test]
    fn test_earlier_group_true_is_never_demoted() {
        let g1 = map(&[("fly", true)]);
        let g2 = map(&[("fly", false), ("build", false)]);

        let effective = resolve(&PermissionMap::new(), [&g1, &g2]);
        assert_eq!(effective.get("fly"), Some(&true));
        assert_eq!(effective.get("build"), Some(&false));
    }

    #[test]
    fn test_no_groups_copies_declared() {
        let declared = map(&[("a", true), ("b", false)]);
        assert_eq!(resolve(&declared, Vec::<&PermissionMap>::new()), declared);
    }

    #[test]
    fn test_default_deny() {
        let effective = resolve(&PermissionMap::new(), [&PermissionMap::new()]);
        assert!(!is_granted(&effective, "x"));
        assert!(!is_granted(&map(&[("x", false)]), "x"));
        assert!(is_granted(&map(&[("x", true)]), "x"));
    }

    struct Holder(PermissionMap);

    impl Permissible for Holder {
        fn declared_permissions(&self) -> PermissionMap {
            self.0.clone()
        }

        fn effective_permissions(&self) -> PermissionMap {
            self.0.clone()
        }
    }

    #[test]
    fn test_permissible_helpers() {
        let holder = Holder(map(&[("kick", true), ("ban", false)]));

        assert!(holder.has_permission("kick"));
        assert!(!holder.has_permission("ban"));
        assert!(holder.has_any_permission(&["ban", "kick"]));
        assert!(!holder.has_all_permissions(&["ban", "kick"]));
        assert!(holder.has_all_permissions(&[]));
    }
}
