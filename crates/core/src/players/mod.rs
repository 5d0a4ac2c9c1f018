//! Players
//!
//! A [`Player`] is the live, shareable aggregate: permissions, chat style,
//! profile history, settings and owned assets. [`PlayerRecord`] is its
//! stored form. The [`PlayerManager`] converts between the two, resolving
//! group references and rebuilding assets on the way in.
//!
//! # Connection lifecycle
//!
//! ```text
//! connect(uuid, name, addr)
//!   ├─ load record (or start fresh)
//!   ├─ record name + address, stamp first/last seen
//!   ├─ recompute permissions, save
//!   └─ register online
//!
//! disconnect(uuid)
//!   ├─ unregister
//!   ├─ add session length to online time, stamp last seen
//!   └─ save
//! ```

mod asset;
mod manager;
mod player;
mod record;

pub use asset::{Asset, AssetFactory, AssetOwner, AssetRegistry};
pub use manager::PlayerManager;
pub use player::{Player, Profile};
pub use record::{PlayerRecord, PlayerSerializer};
