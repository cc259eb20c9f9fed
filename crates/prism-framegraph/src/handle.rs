//! Frame Graph Handles
//!
//! Plain indices into the engine's per-frame arenas. They are stable for the
//! duration of one frame and invalidated wholesale by `reset`.

use std::fmt;
use std::marker::PhantomData;

use serde::Serialize;

/// Identifies one versioned resource node for the current frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct FrameGraphHandle {
    pub index: usize,
}

impl FrameGraphHandle {
    pub(crate) fn new(index: usize) -> Self {
        Self { index }
    }
}

impl fmt::Display for FrameGraphHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.index)
    }
}

/// Identifies a pass node by its declaration index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PassId(pub(crate) u32);

impl PassId {
    /// Declaration index of the pass within the frame
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Identifies a resource entry, shared by every version of one named resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct EntryId(pub(crate) u32);

impl EntryId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Typed reference to a pass returned by `add_pass`
///
/// Carries the pass data type so the data can be read back without naming it again.
pub struct PassRef<T> {
    id: PassId,
    _data: PhantomData<fn() -> T>,
}

impl<T> PassRef<T> {
    pub(crate) fn new(id: PassId) -> Self {
        Self {
            id,
            _data: PhantomData,
        }
    }

    pub fn id(&self) -> PassId {
        self.id
    }
}

impl<T> Clone for PassRef<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for PassRef<T> {}

impl<T> fmt::Debug for PassRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PassRef").field(&self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_display() {
        assert_eq!(FrameGraphHandle::new(4).to_string(), "#4");
    }

    #[test]
    fn test_pass_ref_is_copy() {
        let r: PassRef<String> = PassRef::new(PassId(2));
        let copy = r;
        assert_eq!(r.id(), copy.id());
        assert_eq!(copy.id().index(), 2);
    }
}
