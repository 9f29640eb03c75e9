//! Raw sector views and the dead-sector skip loop.
//!
//! A [`SectorView`] is a construction-time snapshot of one array: base
//! address, stride, sector count, and the liveness mask to match. It
//! never re-reads the array afterwards, so structural changes to the
//! array are invisible to an existing view, and a reallocation of the
//! array's buffer invalidates it. Restart by constructing a new view.
//!
//! Iteration walks sectors in index order and skips any sector whose
//! liveness word does not cover the view's mask. While skipping, the
//! cursor prefetches the next sector so the header test and the line pull
//! overlap; runs of dead sectors cost a masked compare per stride.

use std::iter::FusedIterator;
use std::marker::PhantomData;
use std::ops::Range;
use std::ptr::NonNull;

use crate::engine::array::SectorArray;
use crate::engine::group::ComponentGroup;
use crate::engine::hint;
use crate::engine::sector::{header_at, SectorRef};
use crate::engine::types::AliveBits;

/// Shared walk state for every sector iterator: current position, sectors
/// left, and the liveness mask to match.
pub(crate) struct RawCursor {
    cursor: *const u8,
    stride: usize,
    remaining: usize,
    mask: AliveBits,
}

impl RawCursor {
    /// Positions the cursor on the first live sector at or after `base`.
    #[inline]
    pub(crate) fn new(base: *const u8, stride: usize, len: usize, mask: AliveBits) -> Self {
        let mut raw = Self { cursor: base, stride, remaining: len, mask };
        raw.skip_dead();
        raw
    }

    /// Address of the sector under the cursor. After exhaustion this is
    /// one stride past the last sector, so equal positions mean equal
    /// progress through the same view.
    #[inline]
    pub(crate) fn position(&self) -> *const u8 {
        self.cursor
    }

    #[inline]
    pub(crate) fn remaining(&self) -> usize {
        self.remaining
    }

    #[inline]
    pub(crate) fn is_done(&self) -> bool {
        self.remaining == 0
    }

    /// Steps off the current sector and runs to the next live one.
    #[inline]
    pub(crate) fn advance(&mut self) {
        self.cursor = unsafe { self.cursor.add(self.stride) };
        self.remaining -= 1;
        self.skip_dead();
    }

    /// Runs the cursor forward until it rests on a live sector or the end.
    /// The next sector is prefetched before the current header is tested,
    /// so the pull overlaps the compare on dead runs.
    #[inline]
    fn skip_dead(&mut self) {
        while self.remaining > 0 {
            if self.remaining > 1 {
                hint::prefetch_read(unsafe { self.cursor.add(self.stride) });
            }
            let header = unsafe { header_at(self.cursor) };
            if header.is_alive(self.mask) {
                return;
            }
            self.cursor = unsafe { self.cursor.add(self.stride) };
            self.remaining -= 1;
        }
    }
}

/// Untyped snapshot view over an array's sectors.
///
/// Yields [`SectorRef`]s for every sector whose liveness word covers the
/// view's mask; payload access goes through the layout entries the caller
/// already holds. For typed iteration prefer
/// [`GroupedView`](crate::engine::grouped::GroupedView).
#[derive(Clone, Copy)]
pub struct SectorView<'a> {
    base: *const u8,
    stride: usize,
    len: usize,
    mask: AliveBits,
    _marker: PhantomData<&'a SectorArray>,
}

// Sector payloads only enter storage through `SectorArray::emplace`, whose
// `Send + Sync` bound covers everything a view can hand out, and the view
// itself only reads.
unsafe impl Send for SectorView<'_> {}
unsafe impl Sync for SectorView<'_> {}

impl<'a> SectorView<'a> {
    /// Snapshots `array`, matching sectors whose liveness word covers
    /// `mask`. `mask` must be nonzero or every freed sector matches too.
    pub fn over(array: &'a SectorArray, mask: AliveBits) -> Self {
        debug_assert!(mask != 0, "a sector view needs at least one liveness bit");
        Self {
            base: array.base(),
            stride: array.stride(),
            len: array.len(),
            mask,
            _marker: PhantomData,
        }
    }

    /// Snapshots `array`, matching sectors where every member of `G` is
    /// live. Yields nothing if the array does not store all of `G` or if
    /// `G` repeats a member; in debug builds that asserts instead.
    pub fn of<G: ComponentGroup>(array: &'a SectorArray) -> Self {
        match G::resolve(array.layout()) {
            Some((_, mask)) => Self::over(array, mask),
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
            _marker: PhantomData,
        }
    }

    /// Sectors covered by the view, live and dead alike.
    #[inline]
    pub fn sector_count(&self) -> usize {
        self.len
    }

    /// The liveness mask a sector must cover to be yielded.
    #[inline]
    pub fn mask(&self) -> AliveBits {
        self.mask
    }

    /// A subview over the sectors of `range`, clamped to the view.
    pub fn range(&self, range: Range<usize>) -> SectorView<'a> {
        let start = range.start.min(self.len);
        let end = range.end.min(self.len).max(start);
        Self {
            base: unsafe { self.base.add(start * self.stride) },
            stride: self.stride,
            len: end - start,
            mask: self.mask,
            _marker: PhantomData,
        }
    }

    /// Iterates the live sectors of the view.
    #[inline]
    pub fn iter(&self) -> SectorIter<'a> {
        SectorIter {
            raw: RawCursor::new(self.base, self.stride, self.len, self.mask),
            _marker: PhantomData,
        }
    }
}

impl<'a> IntoIterator for SectorView<'a> {
    type Item = SectorRef<'a>;
    type IntoIter = SectorIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a> IntoIterator for &SectorView<'a> {
    type Item = SectorRef<'a>;
    type IntoIter = SectorIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the live sectors of a [`SectorView`].
pub struct SectorIter<'a> {
    raw: RawCursor,
    _marker: PhantomData<&'a [u8]>,
}

impl<'a> Iterator for SectorIter<'a> {
    type Item = SectorRef<'a>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.raw.is_done() {
            return None;
        }
        let sector = unsafe { SectorRef::from_raw(self.raw.position()) };
        self.raw.advance();
        Some(sector)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.raw.remaining()))
    }
}

impl FusedIterator for SectorIter<'_> {}

/// Two iterators are equal when they rest on the same byte position, so
/// an exhausted iterator equals any other exhausted iterator of the view.
impl PartialEq for SectorIter<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.raw.position() == other.raw.position()
    }
}

impl Eq for SectorIter<'_> {}
