//! Typed views over grouped component arrays.
//!
//! A [`GroupedView`] resolves a tuple group against an array once, at
//! construction, and then yields the owning entity id plus typed member
//! references for every sector where the whole group is live. Like the
//! raw [`SectorView`](crate::engine::view::SectorView) it is a snapshot:
//! sectors added after construction are not visited, and a buffer
//! reallocation invalidates it.
//!
//! [`GroupedViewMut`] is the exclusive flavor. It is not copyable, hands
//! out mutable member references, and splits by value so disjoint ranges
//! can be worked in parallel.

use std::iter::FusedIterator;
use std::marker::PhantomData;
use std::ops::Range;
use std::ptr::NonNull;

use rayon::prelude::*;

use crate::engine::array::SectorArray;
use crate::engine::entity::EntityId;
use crate::engine::group::{CloneGroup, ComponentGroup};
use crate::engine::sector::header_at;
use crate::engine::types::AliveBits;
use crate::engine::view::RawCursor;

/// Shared view over the sectors of one array where every member of `G`
/// is live.
pub struct GroupedView<'a, G: ComponentGroup> {
    base: *const u8,
    stride: usize,
    len: usize,
    mask: AliveBits,
    offsets: G::Offsets,
    _marker: PhantomData<&'a SectorArray>,
}

impl<G: ComponentGroup> Clone for GroupedView<'_, G> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<G: ComponentGroup> Copy for GroupedView<'_, G> {}

// Group members are `Send + Sync` by construction of `ComponentGroup`, so
// the references a view yields may cross threads; the shared flavor only
// reads, and the exclusive flavor splits into disjoint ranges.
unsafe impl<G: ComponentGroup> Send for GroupedView<'_, G> {}
unsafe impl<G: ComponentGroup> Sync for GroupedView<'_, G> {}
unsafe impl<G: ComponentGroup> Send for GroupedViewMut<'_, G> {}
unsafe impl<G: ComponentGroup> Sync for GroupedViewMut<'_, G> {}

impl<'a, G: ComponentGroup> GroupedView<'a, G> {
    /// Snapshots `array`, resolving `G`'s offsets against its layout.
    ///
    /// If the array does not store every member of `G`, or `G` names the
    /// same member twice, the view yields nothing; in debug builds that
    /// asserts instead.
    pub fn over(array: &'a SectorArray) -> Self {
        match G::resolve(array.layout()) {
            Some((offsets, mask)) => Self {
                base: array.base(),
                stride: array.stride(),
                len: array.len(),
                mask,
                offsets,
                _marker: PhantomData,
            },
            None => {
                debug_assert!(
                    false,
                    "view requested over component types the array does not group together"
                );
                Self::empty()
            }
        }
    }

    pub(crate) fn empty() -> Self {
        Self {
            base: NonNull::<u8>::dangling().as_ptr(),
            stride: 0,
            len: 0,
            mask: 0,
            offsets: G::ZERO_OFFSETS,
            _marker: PhantomData,
        }
    }

    pub(crate) fn into_raw_parts(self) -> (*const u8, usize, usize, AliveBits, G::Offsets) {
        (self.base, self.stride, self.len, self.mask, self.offsets)
    }

    /// ## Safety
    /// The parts must describe a sector buffer that stays valid, unmoved,
    /// and free of conflicting writes to the visited sectors for `'a`.
    pub(crate) unsafe fn from_raw_parts(
        base: *const u8,
        stride: usize,
        len: usize,
        mask: AliveBits,
        offsets: G::Offsets,
    ) -> Self {
        Self { base, stride, len, mask, offsets, _marker: PhantomData }
    }

    /// Sectors covered by the view, live and dead alike.
    #[inline]
    pub fn sector_count(&self) -> usize {
        self.len
    }

    /// `true` when the view covers no sectors at all.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterates `(entity, members)` for every fully live sector.
    #[inline]
    pub fn iter(&self) -> GroupedIter<'a, G> {
        GroupedIter {
            raw: RawCursor::new(self.base, self.stride, self.len, self.mask),
            offsets: self.offsets,
            _marker: PhantomData,
        }
    }

    /// A subview over the sectors of `range`, clamped to the view.
    pub fn range(&self, range: Range<usize>) -> GroupedView<'a, G> {
        let start = range.start.min(self.len);
        let end = range.end.min(self.len).max(start);
        Self {
            base: unsafe { self.base.add(start * self.stride) },
            stride: self.stride,
            len: end - start,
            mask: self.mask,
            offsets: self.offsets,
            _marker: PhantomData,
        }
    }

    /// Splits the view into two subviews at sector `mid`, clamped.
    pub fn split_at(&self, mid: usize) -> (GroupedView<'a, G>, GroupedView<'a, G>) {
        let mid = mid.min(self.len);
        (self.range(0..mid), self.range(mid..self.len))
    }

    /// Runs `f` over every live sector from the rayon pool, splitting the
    /// view into a few ranges per worker.
    pub fn par_for_each<F>(&self, f: F)
    where
        F: Fn(EntityId, G::Refs<'_>) + Send + Sync,
    {
        self.split_into(rayon::current_num_threads().saturating_mul(4))
            .into_par_iter()
            .for_each(|piece| {
                for (id, refs) in piece {
                    f(id, refs);
                }
            });
    }

    /// Copies every live sector out as `(entity, owned members)`.
    pub fn collect_owned(&self) -> Vec<(EntityId, G::Owned)>
    where
        G: CloneGroup,
    {
        self.iter().map(|(id, refs)| (id, G::to_owned(&refs))).collect()
    }

    fn split_into(&self, pieces: usize) -> Vec<GroupedView<'a, G>> {
        let pieces = pieces.max(1);
        let chunk = (self.len + pieces - 1) / pieces;
        let mut out = Vec::new();
        let mut start = 0;
        while start < self.len {
            let end = (start + chunk).min(self.len);
            out.push(self.range(start..end));
            start = end;
        }
        out
    }
}

impl<'a, G: ComponentGroup> IntoIterator for GroupedView<'a, G> {
    type Item = (EntityId, G::Refs<'a>);
    type IntoIter = GroupedIter<'a, G>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, G: ComponentGroup> IntoIterator for &GroupedView<'a, G> {
    type Item = (EntityId, G::Refs<'a>);
    type IntoIter = GroupedIter<'a, G>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the fully live sectors of a [`GroupedView`].
pub struct GroupedIter<'a, G: ComponentGroup> {
    raw: RawCursor,
    offsets: G::Offsets,
    _marker: PhantomData<&'a SectorArray>,
}

impl<'a, G: ComponentGroup> Iterator for GroupedIter<'a, G> {
    type Item = (EntityId, G::Refs<'a>);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.raw.is_done() {
            return None;
        }
        let sector = self.raw.position();
        let id = unsafe { header_at(sector) }.id;
        let refs = unsafe { G::refs(sector, &self.offsets) };
        self.raw.advance();
        Some((id, refs))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.raw.remaining()))
    }
}

impl<G: ComponentGroup> FusedIterator for GroupedIter<'_, G> {}

/// Two iterators are equal when they rest on the same byte position.
impl<G: ComponentGroup> PartialEq for GroupedIter<'_, G> {
    fn eq(&self, other: &Self) -> bool {
        self.raw.position() == other.raw.position()
    }
}

impl<G: ComponentGroup> Eq for GroupedIter<'_, G> {}

/// Exclusive view over one array, yielding mutable member references.
///
/// Not copyable; ranges split by value so two pieces can never alias.
pub struct GroupedViewMut<'a, G: ComponentGroup> {
    base: *mut u8,
    stride: usize,
    len: usize,
    mask: AliveBits,
    offsets: G::Offsets,
    _marker: PhantomData<&'a mut SectorArray>,
}

impl<'a, G: ComponentGroup> GroupedViewMut<'a, G> {
    /// Snapshots `array` exclusively. Same resolution rules as
    /// [`GroupedView::over`].
    pub fn over(array: &'a mut SectorArray) -> Self {
        match G::resolve(array.layout()) {
            Some((offsets, mask)) => Self {
                base: array.base_mut(),
                stride: array.stride(),
                len: array.len(),
                mask,
                offsets,
                _marker: PhantomData,
            },
            None => {
                debug_assert!(
                    false,
                    "view requested over component types the array does not group together"
                );
                Self::empty()
            }
        }
    }

    pub(crate) fn empty() -> Self {
        Self {
            base: NonNull::<u8>::dangling().as_ptr(),
            stride: 0,
            len: 0,
            mask: 0,
            offsets: G::ZERO_OFFSETS,
            _marker: PhantomData,
        }
    }

    /// Sectors covered by the view, live and dead alike.
    #[inline]
    pub fn sector_count(&self) -> usize {
        self.len
    }

    /// `true` when the view covers no sectors at all.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterates mutably while keeping the view borrowed, so it can be
    /// walked again afterwards.
    #[inline]
    pub fn iter_mut(&mut self) -> GroupedIterMut<'_, G> {
        GroupedIterMut {
            raw: RawCursor::new(self.base, self.stride, self.len, self.mask),
            offsets: self.offsets,
            _marker: PhantomData,
        }
    }

    /// Narrows the view to the sectors of `range`, clamped.
    pub fn range(self, range: Range<usize>) -> GroupedViewMut<'a, G> {
        let start = range.start.min(self.len);
        let end = range.end.min(self.len).max(start);
        Self {
            base: unsafe { self.base.add(start * self.stride) },
            stride: self.stride,
            len: end - start,
            mask: self.mask,
            offsets: self.offsets,
            _marker: PhantomData,
        }
    }

    /// Splits the view into two disjoint halves at sector `mid`, clamped.
    pub fn split_at(self, mid: usize) -> (GroupedViewMut<'a, G>, GroupedViewMut<'a, G>) {
        let mid = mid.min(self.len);
        let tail = Self {
            base: unsafe { self.base.add(mid * self.stride) },
            stride: self.stride,
            len: self.len - mid,
            mask: self.mask,
            offsets: self.offsets,
            _marker: PhantomData,
        };
        let head = Self { len: mid, ..self };
        (head, tail)
    }

    /// Runs `f` over every live sector from the rayon pool. Consumes the
    /// view; the pieces handed to workers are disjoint sector ranges.
    pub fn par_for_each<F>(self, f: F)
    where
        F: Fn(EntityId, G::RefsMut<'_>) + Send + Sync,
    {
        self.split_into(rayon::current_num_threads().saturating_mul(4))
            .into_par_iter()
            .for_each(|piece| {
                for (id, refs) in piece {
                    f(id, refs);
                }
            });
    }

    fn split_into(self, pieces: usize) -> Vec<GroupedViewMut<'a, G>> {
        let pieces = pieces.max(1);
        let chunk = (self.len + pieces - 1) / pieces;
        let mut out = Vec::new();
        let mut start = 0;
        while start < self.len {
            let end = (start + chunk).min(self.len);
            out.push(Self {
                base: unsafe { self.base.add(start * self.stride) },
                stride: self.stride,
                len: end - start,
                mask: self.mask,
                offsets: self.offsets,
                _marker: PhantomData,
            });
            start = end;
        }
        out
    }
}

impl<'a, G: ComponentGroup> IntoIterator for GroupedViewMut<'a, G> {
    type Item = (EntityId, G::RefsMut<'a>);
    type IntoIter = GroupedIterMut<'a, G>;

    fn into_iter(self) -> Self::IntoIter {
        GroupedIterMut {
            raw: RawCursor::new(self.base, self.stride, self.len, self.mask),
            offsets: self.offsets,
            _marker: PhantomData,
        }
    }
}

/// Iterator over the fully live sectors of a [`GroupedViewMut`].
pub struct GroupedIterMut<'a, G: ComponentGroup> {
    raw: RawCursor,
    offsets: G::Offsets,
    _marker: PhantomData<&'a mut SectorArray>,
}

impl<'a, G: ComponentGroup> Iterator for GroupedIterMut<'a, G> {
    type Item = (EntityId, G::RefsMut<'a>);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.raw.is_done() {
            return None;
        }
        let sector = self.raw.position() as *mut u8;
        let id = unsafe { header_at(sector) }.id;
        let refs = unsafe { G::refs_mut(sector, &self.offsets) };
        self.raw.advance();
        Some((id, refs))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.raw.remaining()))
    }
}

impl<G: ComponentGroup> FusedIterator for GroupedIterMut<'_, G> {}
