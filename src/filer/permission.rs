//! Write permission checks against the parent directory.

use crate::meta::entry::{Attr, Entry};

pub trait WritePolicy: Send + Sync {
    /// May a writer with `requester`'s uid/gid create entries in `parent`?
    fn can_write(&self, parent: &Entry, requester: &Attr) -> bool;
}

/// No enforcement.
pub struct AllowAll;

impl WritePolicy for AllowAll {
    fn can_write(&self, _parent: &Entry, _requester: &Attr) -> bool {
        true
    }
}

/// Owner, group, then other `w` bits of the parent's mode.
pub struct UnixWritePolicy;

impl WritePolicy for UnixWritePolicy {
    fn can_write(&self, parent: &Entry, requester: &Attr) -> bool {
        let mode = parent.attr.permissions();
        (parent.attr.uid == requester.uid && mode & 0o200 != 0)
            || (parent.attr.gid == requester.gid && mode & 0o020 != 0)
            || mode & 0o002 != 0
    }
}
