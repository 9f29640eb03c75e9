//! Core Aliases and Layout Constants
//!
//! This module defines the **numeric aliases and compile-time layout
//! constants** shared by every storage module: liveness words, sector
//! indices, payload offsets, and the alignment rules that make sector
//! arithmetic valid.
//!
//! ## Invariants
//!
//! - `SECTOR_ALIGN` is a power of two, and every sector stride is a
//!   multiple of it, so sector `N + 1` starts at a correctly aligned
//!   address whenever sector `N` does.
//! - The first `HEADER_SIZE` bytes of each sector are reserved for the
//!   owning entity id and the liveness word; payload offsets start at
//!   or after that boundary.
//! - A group never holds more than `GROUP_CAP` component types, so each
//!   member owns a distinct bit of the liveness word.

/// Per-sector liveness word. Bit `i` records whether the `i`-th member
/// of the group layout holds a live value in that sector.
pub type AliveBits = u32;

/// Index of a sector within its array.
pub type SectorIndex = u32;

/// Byte offset of a component payload from the start of its sector.
pub type ByteOffset = u16;

/// Maximum number of component types in one group, bounded by the width
/// of the liveness word.
pub const GROUP_CAP: usize = AliveBits::BITS as usize;

/// Alignment of every sector, and the upper bound on member alignment.
pub const SECTOR_ALIGN: usize = 8;

/// Bytes reserved at the start of each sector for the header.
pub const HEADER_SIZE: usize = 8;

/// Exclusive upper bound on a sector stride, bounded by the offset width.
pub const STRIDE_CAP: usize = ByteOffset::MAX as usize + 1;

pub(crate) const fn align_up(value: usize, align: usize) -> usize {
    (value + align - 1) & !(align - 1)
}

const _: [(); 1] = [(); SECTOR_ALIGN.is_power_of_two() as usize];
const _: [(); 1] = [(); (HEADER_SIZE % SECTOR_ALIGN == 0) as usize];
const _: [(); 1] = [(); (HEADER_SIZE <= STRIDE_CAP) as usize];
const _: [(); 1] = [(); (align_up(3, 8) == 8) as usize];
const _: [(); 1] = [(); (align_up(8, 8) == 8) as usize];
