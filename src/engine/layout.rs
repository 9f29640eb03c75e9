//! Component descriptors and sector layout construction.
//!
//! A [`SectorLayout`] is the compiled shape of one component group: the
//! fixed stride of each sector, the byte offset of every member payload,
//! and the liveness bit each member owns. Layouts are built once at group
//! registration and shared read-only by every view over the array.
//!
//! ## Packing
//!
//! Members are packed in declaration order after the sector header. Each
//! payload is aligned to its own requirement, and the final stride is
//! rounded up to the sector alignment so that consecutive sectors keep
//! every payload aligned.

use std::any::{type_name, TypeId};
use std::mem::{align_of, needs_drop, size_of};
use std::ptr;

use crate::engine::error::GroupError;
use crate::engine::types::{
    align_up, AliveBits, ByteOffset, GROUP_CAP, HEADER_SIZE, SECTOR_ALIGN, STRIDE_CAP,
};

unsafe fn drop_value<T>(payload: *mut u8) {
    unsafe { ptr::drop_in_place(payload.cast::<T>()) }
}

/// Runtime description of one component type.
#[derive(Clone, Copy, Debug)]
pub struct ComponentInfo {
    /// Human-readable type name, for logs and errors.
    pub name: &'static str,
    /// Runtime type identifier.
    pub type_id: TypeId,
    /// Payload size in bytes.
    pub size: usize,
    /// Payload alignment in bytes.
    pub align: usize,
    /// Type-erased destructor, present only when the type needs one.
    pub drop_fn: Option<unsafe fn(*mut u8)>,
}

impl ComponentInfo {
    /// Describes the component type `T`.
    pub fn of<T: 'static>() -> Self {
        Self {
            name: type_name::<T>(),
            type_id: TypeId::of::<T>(),
            size: size_of::<T>(),
            align: align_of::<T>(),
            drop_fn: if needs_drop::<T>() {
                Some(drop_value::<T> as unsafe fn(*mut u8))
            } else {
                None
            },
        }
    }

    /// Returns `true` if this descriptor describes `T`.
    #[inline]
    pub fn matches_type<T: 'static>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }
}

/// Where one member lives inside a sector: its payload offset and the
/// liveness bit it owns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayoutEntry {
    /// Byte offset of the payload from the start of the sector.
    pub offset: ByteOffset,
    /// Liveness word bit owned by this member.
    pub mask: AliveBits,
}

/// One member of a layout: its type descriptor and its placement.
#[derive(Clone, Copy, Debug)]
pub struct LayoutSlot {
    /// Component type stored in this slot.
    pub info: ComponentInfo,
    /// Placement of the payload within each sector.
    pub entry: LayoutEntry,
}

/// Compiled shape of a component group.
///
/// ## Invariants
/// * `stride` is a multiple of the sector alignment and covers the header
///   plus every member payload.
/// * Member offsets start at or after the header, satisfy each member's
///   alignment, and never overlap.
/// * Each member owns a distinct bit of the liveness word.
#[derive(Debug)]
pub struct SectorLayout {
    stride: usize,
    combined: AliveBits,
    slots: Vec<LayoutSlot>,
}

impl SectorLayout {
    /// Packs `members` into a sector layout.
    ///
    /// ## Behavior
    /// Payloads are placed in the order given, each aligned to its own
    /// requirement, starting after the sector header. Member `i` owns bit
    /// `i` of the liveness word.
    ///
    /// ## Errors
    /// Fails when the group is empty, holds more members than the liveness
    /// word has bits, repeats a type, contains a type whose alignment
    /// exceeds the sector alignment, or packs to a stride beyond the
    /// addressable range.
    pub fn build(members: Vec<ComponentInfo>) -> Result<Self, GroupError> {
        if members.is_empty() {
            return Err(GroupError::EmptyGroup);
        }
        if members.len() > GROUP_CAP {
            return Err(GroupError::TooManyComponents {
                requested: members.len(),
                capacity: GROUP_CAP,
            });
        }

        let mut cursor = HEADER_SIZE;
        let mut placed: Vec<(ComponentInfo, usize)> = Vec::with_capacity(members.len());

        for info in members {
            if placed.iter().any(|(prev, _)| prev.type_id == info.type_id) {
                return Err(GroupError::DuplicateComponent { name: info.name });
            }
            if info.align > SECTOR_ALIGN {
                return Err(GroupError::UnsupportedAlignment {
                    name: info.name,
                    align: info.align,
                    max: SECTOR_ALIGN,
                });
            }
            cursor = align_up(cursor, info.align.max(1));
            placed.push((info, cursor));
            cursor += info.size;
        }

        let stride = align_up(cursor, SECTOR_ALIGN);
        if stride > STRIDE_CAP {
            return Err(GroupError::StrideOverflow {
                required: stride,
                capacity: STRIDE_CAP,
            });
        }

        let slots: Vec<LayoutSlot> = placed
            .into_iter()
            .enumerate()
            .map(|(position, (info, offset))| LayoutSlot {
                info,
                entry: LayoutEntry {
                    offset: offset as ByteOffset,
                    mask: 1 << position,
                },
            })
            .collect();

        let combined = slots.iter().fold(0, |bits, slot| bits | slot.entry.mask);

        Ok(Self { stride, combined, slots })
    }

    /// Bytes from the start of one sector to the start of the next.
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Number of member types in the group.
    #[inline]
    pub fn component_count(&self) -> usize {
        self.slots.len()
    }

    /// Liveness mask with every member's bit set.
    #[inline]
    pub fn combined_mask(&self) -> AliveBits {
        self.combined
    }

    /// All members, in packing order.
    #[inline]
    pub fn slots(&self) -> &[LayoutSlot] {
        &self.slots
    }

    /// Placement of the member storing `type_id`, if any.
    pub fn slot_of(&self, type_id: TypeId) -> Option<&LayoutSlot> {
        self.slots.iter().find(|slot| slot.info.type_id == type_id)
    }

    /// Placement of the member storing `T`, if any.
    #[inline]
    pub fn entry_of<T: 'static>(&self) -> Option<&LayoutEntry> {
        self.slot_of(TypeId::of::<T>()).map(|slot| &slot.entry)
    }

    /// Returns `true` if the group stores `T`.
    #[inline]
    pub fn contains<T: 'static>(&self) -> bool {
        self.entry_of::<T>().is_some()
    }
}
