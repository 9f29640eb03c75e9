//! Fixed-stride sector storage for one component group.
//!
//! This module implements [`SectorArray`], a contiguous container that
//! stores every member of a component group inline, one sector per entity.
//! The design targets grouped component storage where the members are
//! consumed together: one cache line pull brings the header and the
//! payloads of a whole sector.
//!
//! # Storage model
//!
//! An array owns a single allocation of `u64` words, carved into sectors
//! of the layout's stride:
//!
//! ```text
//! sector 0                     sector 1
//! [ id | bits | A | B | pad ]  [ id | bits | A | B | pad ]  ...
//! ```
//!
//! Sectors are appended in insertion order and never move while the
//! capacity holds. Destroying an entity's components clears the sector's
//! liveness word and recycles the slot through a free list; the bytes stay
//! in place and iteration skips them by testing the header.
//!
//! # Invariants
//!
//! - The backing buffer always spans exactly `capacity * stride` bytes,
//!   zero-filled on growth, so every slot below `len` has a readable
//!   header even before its first claim.
//! - `index_of` maps each owning entity to its sector; a sector is either
//!   mapped or on the free list with a zero liveness word, never both.
//! - Growth reallocates the buffer and moves sectors. Raw views
//!   constructed before a reallocation are invalidated by it; reserve
//!   capacity up front when views must outlive concurrent appends.
//!
//! # Safety notes
//!
//! Payload bytes are written with raw pointer stores and dropped through
//! the layout's type-erased destructors. Soundness relies on the liveness
//! word: a payload is written before its bit is set and dropped exactly
//! when its bit is cleared, so no path reads an unwritten payload.

use std::{
    collections::HashMap,
    mem::size_of,
    ptr,
    sync::Arc,
};

use tracing::debug;

use crate::engine::entity::EntityId;
use crate::engine::layout::SectorLayout;
use crate::engine::sector::{header_at, header_at_mut, SectorHeader, SectorRef};
use crate::engine::types::SectorIndex;

const WORD: usize = size_of::<u64>();

/// Sector storage for one component group.
pub struct SectorArray {
    data: Vec<u64>,
    len: usize,
    layout: Arc<SectorLayout>,
    index_of: HashMap<EntityId, SectorIndex>,
    free: Vec<SectorIndex>,
}

impl SectorArray {
    /// Creates an empty array over `layout`.
    pub fn new(layout: Arc<SectorLayout>) -> Self {
        Self::with_capacity(layout, 0)
    }

    /// Creates an array with room for `sectors` before the first growth.
    pub fn with_capacity(layout: Arc<SectorLayout>, sectors: usize) -> Self {
        debug_assert!(layout.stride() % WORD == 0);
        let words = sectors * layout.stride() / WORD;
        Self {
            data: vec![0; words],
            len: 0,
            layout,
            index_of: HashMap::new(),
            free: Vec::new(),
        }
    }

    /// Number of sectors in the array, live and dead alike.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// `true` when the array holds no sectors.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of sectors currently owned by an entity.
    #[inline]
    pub fn occupied(&self) -> usize {
        self.index_of.len()
    }

    /// Sectors the buffer can hold before reallocating.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.data.len() * WORD / self.layout.stride()
    }

    /// Bytes from one sector to the next.
    #[inline]
    pub fn stride(&self) -> usize {
        self.layout.stride()
    }

    /// The group layout this array stores.
    #[inline]
    pub fn layout(&self) -> &SectorLayout {
        &self.layout
    }

    /// Grows the buffer to hold at least `additional` more sectors.
    ///
    /// Growth moves every sector; raw views constructed before the call
    /// must not be used afterwards.
    pub fn reserve(&mut self, additional: usize) {
        let target = self.len + additional;
        if target > self.capacity() {
            let words = target * self.layout.stride() / WORD;
            self.data.resize(words, 0);
            debug!(sectors = target, words, "grew sector array");
        }
    }

    #[inline]
    pub(crate) fn base(&self) -> *const u8 {
        self.data.as_ptr().cast::<u8>()
    }

    #[inline]
    pub(crate) fn base_mut(&mut self) -> *mut u8 {
        self.data.as_mut_ptr().cast::<u8>()
    }

    /// The sector at `index`, live or dead, or `None` past the end.
    pub fn sector(&self, index: usize) -> Option<SectorRef<'_>> {
        if index >= self.len {
            return None;
        }
        Some(unsafe { SectorRef::from_raw(self.base().add(index * self.layout.stride())) })
    }

    /// Index of the sector owned by `id`, if any.
    #[inline]
    pub fn index_of(&self, id: EntityId) -> Option<SectorIndex> {
        self.index_of.get(&id).copied()
    }

    /// `true` when `id` owns a sector in this array.
    #[inline]
    pub fn contains(&self, id: EntityId) -> bool {
        self.index_of.contains_key(&id)
    }

    /// Maps `id` to a sector, reusing its existing one, then a free slot,
    /// then a fresh append with amortized doubling.
    fn claim_slot(&mut self, id: EntityId) -> SectorIndex {
        if let Some(&index) = self.index_of.get(&id) {
            return index;
        }
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                if self.len == self.capacity() {
                    self.reserve(self.len.max(4));
                }
                let index = self.len as SectorIndex;
                self.len += 1;
                index
            }
        };
        let stride = self.layout.stride();
        let sector = unsafe { self.base_mut().add(index as usize * stride) };
        let header = unsafe { header_at_mut(sector) };
        *header = SectorHeader { id, alive_bits: 0 };
        self.index_of.insert(id, index);
        index
    }

    /// Writes `value` into `id`'s sector and marks it live.
    ///
    /// Claims a sector for `id` if it has none. A live previous value of
    /// the same member is dropped in place first.
    ///
    /// # Panics
    /// Panics if `T` is not a member of this array's group.
    pub fn emplace<T: 'static + Send + Sync>(&mut self, id: EntityId, value: T) -> &mut T {
        let entry = *self
            .layout
            .entry_of::<T>()
            .expect("component type is not a member of this array's group");
        let index = self.claim_slot(id);
        let stride = self.layout.stride();
        let sector = unsafe { self.base_mut().add(index as usize * stride) };
        let header = unsafe { header_at_mut(sector) };
        let payload = unsafe { sector.add(entry.offset as usize) };
        if header.is_alive(entry.mask) {
            unsafe { ptr::drop_in_place(payload.cast::<T>()) };
        }
        unsafe { ptr::write(payload.cast::<T>(), value) };
        header.set_alive(entry.mask);
        unsafe { &mut *payload.cast::<T>() }
    }

    /// Drops `id`'s `T` payload and clears its liveness bit.
    ///
    /// Returns `false` if `T` is not a member of the group, `id` owns no
    /// sector, or the member was already dead. A sector whose last live
    /// member is removed goes back on the free list.
    pub fn remove<T: 'static>(&mut self, id: EntityId) -> bool {
        let Some(entry) = self.layout.entry_of::<T>().copied() else {
            return false;
        };
        let Some(&index) = self.index_of.get(&id) else {
            return false;
        };
        let stride = self.layout.stride();
        let sector = unsafe { self.base_mut().add(index as usize * stride) };
        let header = unsafe { header_at_mut(sector) };
        if !header.is_alive(entry.mask) {
            return false;
        }
        unsafe { ptr::drop_in_place(sector.add(entry.offset as usize).cast::<T>()) };
        header.clear_alive(entry.mask);
        if header.alive_bits == 0 {
            self.index_of.remove(&id);
            self.free.push(index);
        }
        true
    }

    /// Drops every live payload in `id`'s sector and recycles the slot.
    ///
    /// Returns `false` if `id` owns no sector here.
    pub fn destroy(&mut self, id: EntityId) -> bool {
        let Some(index) = self.index_of.remove(&id) else {
            return false;
        };
        let stride = self.layout.stride();
        let sector = unsafe { self.base_mut().add(index as usize * stride) };
        let header = unsafe { header_at_mut(sector) };
        for slot in self.layout.slots() {
            if header.is_alive(slot.entry.mask) {
                if let Some(drop_fn) = slot.info.drop_fn {
                    unsafe { drop_fn(sector.add(slot.entry.offset as usize)) };
                }
            }
        }
        header.alive_bits = 0;
        self.free.push(index);
        true
    }

    /// Reads `id`'s `T` payload, or `None` if it is absent or dead.
    pub fn get<T: 'static>(&self, id: EntityId) -> Option<&T> {
        let entry = self.layout.entry_of::<T>()?;
        let &index = self.index_of.get(&id)?;
        let sector = unsafe { self.base().add(index as usize * self.layout.stride()) };
        let header = unsafe { header_at(sector) };
        if !header.is_alive(entry.mask) {
            return None;
        }
        Some(unsafe { &*sector.add(entry.offset as usize).cast::<T>() })
    }

    /// Mutable access to `id`'s `T` payload, or `None` if absent or dead.
    pub fn get_mut<T: 'static>(&mut self, id: EntityId) -> Option<&mut T> {
        let entry = self.layout.entry_of::<T>().copied()?;
        let &index = self.index_of.get(&id)?;
        let stride = self.layout.stride();
        let sector = unsafe { self.base_mut().add(index as usize * stride) };
        let header = unsafe { header_at(sector) };
        if !header.is_alive(entry.mask) {
            return None;
        }
        Some(unsafe { &mut *sector.add(entry.offset as usize).cast::<T>() })
    }

    /// `true` when `id` has a live `T` payload here.
    pub fn has<T: 'static>(&self, id: EntityId) -> bool {
        self.get::<T>(id).is_some()
    }

    /// Drops every live payload and empties the array, keeping the buffer.
    pub fn clear(&mut self) {
        self.drop_live_payloads();
        self.len = 0;
        self.index_of.clear();
        self.free.clear();
    }

    fn drop_live_payloads(&mut self) {
        let stride = self.layout.stride();
        let base = self.base_mut();
        for index in 0..self.len {
            let sector = unsafe { base.add(index * stride) };
            let header = unsafe { header_at_mut(sector) };
            if header.alive_bits == 0 {
                continue;
            }
            for slot in self.layout.slots() {
                if header.is_alive(slot.entry.mask) {
                    if let Some(drop_fn) = slot.info.drop_fn {
                        unsafe { drop_fn(sector.add(slot.entry.offset as usize)) };
                    }
                }
            }
            header.alive_bits = 0;
        }
    }
}

impl Drop for SectorArray {
    fn drop(&mut self) {
        self.drop_live_payloads();
    }
}
