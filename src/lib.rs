//! # Sector ECS
//!
//! Grouped, fixed-stride component storage with skip-dead views.
//!
//! Components that are consumed together are registered together and share
//! one **sector** per entity: an eight byte header (owning entity id plus a
//! liveness bitmask) followed by the member payloads inline. A view over a
//! group walks one contiguous allocation in index order, prefetching ahead
//! and skipping dead sectors with a single masked compare, so the memory
//! system sees a plain strided stream.
//!
//! ## Design Goals
//! - One cache pull per entity for grouped components
//! - Stable sector addresses while capacity holds; slots recycle in place
//! - Views as construction-time snapshots with no per-step bookkeeping
//! - Locking confined to [`SharedRegistry`], never held across iteration

#![forbid(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]
#![allow(clippy::module_inception)]
#![deny(dead_code)]

pub mod engine;

// ─────────────────────────────────────────────────────────────────────────────
// Re-exports (Public API)
// ─────────────────────────────────────────────────────────────────────────────

// Core storage types

pub use engine::registry::Registry;
pub use engine::shared::SharedRegistry;

pub use engine::entity::{
    EntityAllocator,
    EntityId,
};

pub use engine::array::SectorArray;

pub use engine::layout::{
    ComponentInfo,
    LayoutEntry,
    LayoutSlot,
    SectorLayout,
};

pub use engine::sector::{
    SectorHeader,
    SectorRef,
};

pub use engine::group::{
    CloneGroup,
    ComponentGroup,
};

pub use engine::view::{
    SectorIter,
    SectorView,
};

pub use engine::grouped::{
    GroupedIter,
    GroupedIterMut,
    GroupedView,
    GroupedViewMut,
};

pub use engine::join::Join;

pub use engine::error::{
    GroupError,
    RegistryError,
};

pub use engine::types::{
    AliveBits,
    ByteOffset,
    SectorIndex,
    GROUP_CAP,
    HEADER_SIZE,
    SECTOR_ALIGN,
};

// ─────────────────────────────────────────────────────────────────────────────
// Prelude (Optional but recommended)
// ─────────────────────────────────────────────────────────────────────────────

/// Commonly used storage types.
///
/// Import with:
/// ```rust
/// use sector_ecs::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        ComponentGroup,
        EntityId,
        GroupedView,
        GroupedViewMut,
        Registry,
        SectorArray,
        SectorView,
        SharedRegistry,
    };
}
