use crate::types::ByteSize;
use derive_more::Display;
use enum_iterator::Sequence;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display, Sequence)]
pub enum MemoryArea {
    #[display(fmt = "heap")]
    Heap,
    #[display(fmt = "metaspace")]
    Metaspace,
}

/// Capacity and usage of one memory area before and after a cycle.
/// Fields the log did not report are `None`.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct MemoryItem {
    pub area: MemoryArea,
    pub pre_capacity: Option<ByteSize>,
    pub post_capacity: Option<ByteSize>,
    pub pre_used: Option<ByteSize>,
    pub post_used: Option<ByteSize>,
}

impl MemoryItem {
    pub fn new(area: MemoryArea) -> Self {
        Self {
            area,
            pre_capacity: None,
            post_capacity: None,
            pre_used: None,
            post_used: None,
        }
    }

    /// An item that only knows the state at the end of the cycle
    pub fn post(area: MemoryArea, used: ByteSize, capacity: ByteSize) -> Self {
        Self {
            post_used: used.into(),
            post_capacity: capacity.into(),
            ..Self::new(area)
        }
    }

    /// Used memory freed by the cycle, if both ends are known
    pub fn reclaimed(&self) -> Option<ByteSize> {
        match (self.pre_used, self.post_used) {
            (Some(pre), Some(post)) => Some(ByteSize(pre.0.saturating_sub(post.0))),
            _ => None,
        }
    }
}
