//! Load diagnostics
//!
//! Non-fatal problems found while loading groups and players are handed to
//! a [`Reporter`] supplied by the caller instead of being swallowed.

use warden_document::ObjectId;
use warden_store::ReloadReport;

use crate::error::{AssetReconstructionError, UnresolvedGroupReference};

/// A non-fatal problem found during a load
#[derive(Debug, Clone, PartialEq)]
pub enum LoadIssue {
    /// A stored document could not be deserialized and was dropped
    SkippedDocument {
        collection: String,
        id: Option<ObjectId>,
        reason: String,
    },

    /// A group membership or parent edge points at a missing group
    UnresolvedGroup(UnresolvedGroupReference),

    /// A parent edge that would close an inheritance cycle
    GroupCycle { group: String, parent: ObjectId },

    /// A player asset could not be rebuilt
    Asset(AssetReconstructionError),
}

/// Receiver for [`LoadIssue`]s
pub trait Reporter: Send + Sync {
    fn report(&self, issue: LoadIssue);
}

/// Reporter that logs every issue at WARN level
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&self, issue: LoadIssue) {
        match issue {
            LoadIssue::SkippedDocument {
                collection,
                id,
                reason,
            } => {
                tracing::warn!("Dropped document {:?} from {}: {}", id, collection, reason);
            }
            LoadIssue::UnresolvedGroup(e) => tracing::warn!("{}", e),
            LoadIssue::GroupCycle { group, parent } => {
                tracing::warn!("Ignoring parent {} of group {}: inheritance cycle", parent, group);
            }
            LoadIssue::Asset(e) => tracing::warn!("{}", e),
        }
    }
}

/// Forward every document a reload dropped
pub(crate) fn report_skipped(reporter: &dyn Reporter, collection: &str, report: ReloadReport) {
    for skipped in report.skipped {
        reporter.report(LoadIssue::SkippedDocument {
            collection: collection.to_string(),
            id: skipped.id,
            reason: skipped.error.to_string(),
        });
    }
}
