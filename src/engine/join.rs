//! Intersection iteration across separately stored components.
//!
//! [`Join`] walks the sectors of one array and, for each live `A`, looks
//! up the same entity's `B` by id in a second array. This is the escape
//! hatch for component types that were registered in different groups;
//! each match costs a hash lookup plus a liveness test, where a grouped
//! view would cost neither. Group components together when the pair is
//! hot.

use std::iter::FusedIterator;
use std::marker::PhantomData;

use crate::engine::array::SectorArray;
use crate::engine::entity::EntityId;
use crate::engine::grouped::{GroupedIter, GroupedView};
use crate::engine::layout::LayoutEntry;

/// Iterator over entities that hold a live `A` in one array and a live
/// `B` in another.
pub struct Join<'a, A, B>
where
    A: 'static + Send + Sync,
    B: 'static + Send + Sync,
{
    primary: GroupedIter<'a, (A,)>,
    secondary: Option<(&'a SectorArray, LayoutEntry)>,
    _marker: PhantomData<fn() -> B>,
}

impl<'a, A, B> Join<'a, A, B>
where
    A: 'static + Send + Sync,
    B: 'static + Send + Sync,
{
    /// Joins the live `A` sectors of `primary` with the `B` payloads of
    /// `secondary`.
    ///
    /// Yields nothing if either array does not store its type; in debug
    /// builds that asserts instead.
    pub fn new(primary: &'a SectorArray, secondary: &'a SectorArray) -> Self {
        let entry = secondary.layout().entry_of::<B>().copied();
        debug_assert!(
            entry.is_some(),
            "join requested over a component type the secondary array does not store"
        );
        Self {
            primary: GroupedView::<(A,)>::over(primary).iter(),
            secondary: entry.map(|entry| (secondary, entry)),
            _marker: PhantomData,
        }
    }

    pub(crate) fn empty() -> Self {
        Self {
            primary: GroupedView::<(A,)>::empty().iter(),
            secondary: None,
            _marker: PhantomData,
        }
    }
}

impl<'a, A, B> Iterator for Join<'a, A, B>
where
    A: 'static + Send + Sync,
    B: 'static + Send + Sync,
{
    type Item = (EntityId, &'a A, &'a B);

    fn next(&mut self) -> Option<Self::Item> {
        let (array, entry) = self.secondary?;
        loop {
            let (id, (a,)) = self.primary.next()?;
            let Some(index) = array.index_of(id) else {
                continue;
            };
            let Some(sector) = array.sector(index as usize) else {
                continue;
            };
            if let Some(b) = sector.component::<B>(&entry) {
                return Some((id, a, b));
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.primary.size_hint().1)
    }
}

impl<A, B> FusedIterator for Join<'_, A, B>
where
    A: 'static + Send + Sync,
    B: 'static + Send + Sync,
{
}
