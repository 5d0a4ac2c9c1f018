//! Permission groups
//!
//! A [`Group`] is the persisted record; a [`ResolvedGroup`] pairs it with
//! the effective permissions obtained by resolving its parents. The
//! [`GroupManager`] owns the store and publishes resolved groups through a
//! [`GroupDirectory`].

mod directory;
mod group;
mod manager;

pub use directory::{GroupDirectory, ResolvedGroup};
pub use group::{Group, GroupSerializer};
pub use manager::GroupManager;
