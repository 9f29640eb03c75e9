//! Sector header and raw sector references.
//!
//! A sector is one fixed-stride record of a component group: an eight byte
//! header followed by the member payloads at the offsets recorded in the
//! group's [`SectorLayout`](crate::engine::layout::SectorLayout). The
//! header carries the owning entity id and the liveness word that views
//! test while skipping dead sectors.

use std::fmt;
use std::marker::PhantomData;
use std::mem::{align_of, size_of};

use crate::engine::entity::EntityId;
use crate::engine::layout::LayoutEntry;
use crate::engine::types::{AliveBits, HEADER_SIZE, SECTOR_ALIGN};

/// First bytes of every sector: the owning entity and the liveness word.
#[repr(C, align(8))]
#[derive(Clone, Copy, Debug)]
pub struct SectorHeader {
    /// Entity whose components live in this sector.
    pub id: EntityId,
    /// Bit `i` set means member `i` of the group holds a live value.
    pub alive_bits: AliveBits,
}

const _: [(); 1] = [(); (size_of::<SectorHeader>() == HEADER_SIZE) as usize];
const _: [(); 1] = [(); (align_of::<SectorHeader>() == SECTOR_ALIGN) as usize];

impl SectorHeader {
    /// `true` when every bit of `mask` is set in the liveness word.
    #[inline]
    pub fn is_alive(&self, mask: AliveBits) -> bool {
        self.alive_bits & mask == mask
    }

    /// Sets the bits of `mask` in the liveness word.
    #[inline]
    pub fn set_alive(&mut self, mask: AliveBits) {
        self.alive_bits |= mask;
    }

    /// Clears the bits of `mask` in the liveness word.
    #[inline]
    pub fn clear_alive(&mut self, mask: AliveBits) {
        self.alive_bits &= !mask;
    }
}

/// ## Safety
/// `ptr` must point at a sector header that stays valid and unwritten for
/// the duration of `'a`.
#[inline]
pub(crate) unsafe fn header_at<'a>(ptr: *const u8) -> &'a SectorHeader {
    unsafe { &*ptr.cast::<SectorHeader>() }
}

/// ## Safety
/// `ptr` must point at a sector header reachable through a live mutable
/// borrow of the owning array.
#[inline]
pub(crate) unsafe fn header_at_mut<'a>(ptr: *mut u8) -> &'a mut SectorHeader {
    unsafe { &mut *ptr.cast::<SectorHeader>() }
}

/// Borrowed handle to one sector.
///
/// Payload access goes through [`SectorRef::component`], which checks the
/// member's liveness bit before dereferencing, so a reference to a dead or
/// never-written payload cannot escape.
#[derive(Clone, Copy)]
pub struct SectorRef<'a> {
    ptr: *const u8,
    _marker: PhantomData<&'a [u8]>,
}

impl<'a> SectorRef<'a> {
    /// ## Safety
    /// `ptr` must point at the start of a sector that stays valid and free
    /// of conflicting writes for the duration of `'a`.
    #[inline]
    pub(crate) unsafe fn from_raw(ptr: *const u8) -> Self {
        Self { ptr, _marker: PhantomData }
    }

    /// The sector header.
    #[inline]
    pub fn header(&self) -> &'a SectorHeader {
        unsafe { header_at(self.ptr) }
    }

    /// Entity that owns this sector.
    #[inline]
    pub fn id(&self) -> EntityId {
        self.header().id
    }

    /// The sector's liveness word.
    #[inline]
    pub fn alive_bits(&self) -> AliveBits {
        self.header().alive_bits
    }

    /// `true` when every bit of `mask` is live in this sector.
    #[inline]
    pub fn has_all(&self, mask: AliveBits) -> bool {
        self.header().is_alive(mask)
    }

    /// Reads the payload placed at `entry`, or `None` if its liveness bit
    /// is clear.
    ///
    /// `entry` must come from the layout of the array that produced this
    /// sector; entries from other layouts address arbitrary payload bytes.
    #[inline]
    pub fn component<T: 'static>(&self, entry: &LayoutEntry) -> Option<&'a T> {
        if !self.has_all(entry.mask) {
            return None;
        }
        let payload = unsafe { self.ptr.add(entry.offset as usize) };
        debug_assert!(
            payload as usize % align_of::<T>() == 0,
            "payload entry does not match this sector's layout"
        );
        Some(unsafe { &*payload.cast::<T>() })
    }

    /// Address of the sector, for layout inspection.
    #[inline]
    pub fn as_ptr(&self) -> *const u8 {
        self.ptr
    }
}

impl fmt::Debug for SectorRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SectorRef")
            .field("id", &self.id())
            .field("alive_bits", &format_args!("{:#b}", self.alive_bits()))
            .finish()
    }
}
