//! Entity registry and component group bookkeeping.
//!
//! The [`Registry`] owns the entity id allocator and one [`SectorArray`]
//! per registered component group, indexed by every member type of the
//! group. Components of types that were never grouped get a lazy
//! single-type group the first time one is added, so `add_component`
//! always has somewhere to put the value.
//!
//! ## Grouping
//!
//! Register hot component combinations up front with
//! [`Registry::register_group`]; a type can belong to exactly one group.
//! Grouped members share a sector, so a [`GroupedView`] over them walks
//! one allocation with zero lookups per entity. Types left ungrouped can
//! still be iterated together through [`Registry::join`], at a hash
//! lookup per candidate.
//!
//! ## Views and structural changes
//!
//! Views snapshot an array at construction. Adding components can grow
//! the backing buffer and move every sector, which invalidates live raw
//! views; register with capacity or call
//! [`SectorArray::reserve`] before building views that must survive
//! appends.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::engine::array::SectorArray;
use crate::engine::entity::{EntityAllocator, EntityId};
use crate::engine::error::RegistryError;
use crate::engine::group::{CloneGroup, ComponentGroup};
use crate::engine::grouped::{GroupedView, GroupedViewMut};
use crate::engine::join::Join;
use crate::engine::layout::SectorLayout;
use crate::engine::view::SectorView;

/// Owner of entities and their grouped component storage.
#[derive(Default)]
pub struct Registry {
    entities: EntityAllocator,
    arrays: Vec<SectorArray>,
    by_type: HashMap<TypeId, usize>,
}

impl Registry {
    /// Creates an empty registry with no groups registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes a fresh entity id, reusing destroyed ids before growing.
    pub fn take_entity(&mut self) -> EntityId {
        self.entities.take()
    }

    /// `true` while `id` has been taken and not destroyed.
    #[inline]
    pub fn is_alive(&self, id: EntityId) -> bool {
        self.entities.is_alive(id)
    }

    /// Number of live entities.
    #[inline]
    pub fn entity_count(&self) -> usize {
        self.entities.live_count()
    }

    /// Registers the component group `G` with an empty backing array.
    ///
    /// Members of `G` share one sector per entity from now on. Each
    /// component type can belong to exactly one group, and grouping must
    /// happen before the first `add_component` of any member, which would
    /// otherwise claim the type for a lazy single-type group.
    pub fn register_group<G: ComponentGroup>(&mut self) -> Result<(), RegistryError> {
        self.register_group_with_capacity::<G>(0)
    }

    /// Registers `G` with room for `sectors` entities before the first
    /// growth. Views stay valid across appends that fit the reserved
    /// capacity, since nothing moves.
    pub fn register_group_with_capacity<G: ComponentGroup>(
        &mut self,
        sectors: usize,
    ) -> Result<(), RegistryError> {
        let infos = G::infos();
        for info in &infos {
            if self.by_type.contains_key(&info.type_id) {
                return Err(RegistryError::AlreadyGrouped { name: info.name });
            }
        }
        let layout = Arc::new(SectorLayout::build(infos)?);
        debug!(
            components = G::LEN,
            stride = layout.stride(),
            reserved = sectors,
            "registered component group"
        );
        let index = self.arrays.len();
        for slot in layout.slots() {
            self.by_type.insert(slot.info.type_id, index);
        }
        self.arrays.push(SectorArray::with_capacity(layout, sectors));
        Ok(())
    }

    fn array_of(&self, key: TypeId) -> Option<&SectorArray> {
        self.arrays.get(*self.by_type.get(&key)?)
    }

    /// Index of `T`'s array, registering a lazy single-type group on
    /// first use.
    fn array_index_for<T: 'static + Send + Sync>(&mut self) -> usize {
        if let Some(&index) = self.by_type.get(&TypeId::of::<T>()) {
            return index;
        }
        self.register_group_with_capacity::<(T,)>(0)
            .expect("component payload exceeds the sector stride limit");
        self.by_type[&TypeId::of::<T>()]
    }

    /// Grows `T`'s array to hold `additional` more sectors without
    /// moving anything afterwards until the room is used up. A hint; does
    /// nothing when `T` was never registered.
    pub fn reserve<T: 'static>(&mut self, additional: usize) {
        if let Some(&index) = self.by_type.get(&TypeId::of::<T>()) {
            self.arrays[index].reserve(additional);
        }
    }

    /// Stores `value` as `id`'s `T`, dropping a previous live value.
    ///
    /// Routes to the group `T` was registered in, or claims a lazy
    /// single-type group. The reference stays valid until the next
    /// structural change to that group's array.
    ///
    /// # Panics
    /// Panics if `T` has no group yet and its payload exceeds the sector
    /// stride limit.
    pub fn add_component<T: 'static + Send + Sync>(&mut self, id: EntityId, value: T) -> &mut T {
        debug_assert!(
            self.entities.is_alive(id),
            "component added to an entity that was never taken or was destroyed"
        );
        let index = self.array_index_for::<T>();
        self.arrays[index].emplace(id, value)
    }

    /// Drops `id`'s `T` and clears its liveness bit. Returns `false` if
    /// the entity had no live `T`. Other members of `T`'s group are
    /// untouched.
    pub fn remove_component<T: 'static>(&mut self, id: EntityId) -> bool {
        match self.by_type.get(&TypeId::of::<T>()) {
            Some(&index) => self.arrays[index].remove::<T>(id),
            None => false,
        }
    }

    /// Destroys every component of each entity and releases the ids for
    /// reuse. Ids that are already dead are skipped.
    pub fn destroy_entities<I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = EntityId>,
    {
        let mut released = 0usize;
        for id in ids {
            for array in &mut self.arrays {
                array.destroy(id);
            }
            if self.entities.release(id) {
                released += 1;
            }
        }
        trace!(released, "destroyed entities");
    }

    /// `true` when `id` has a live `T`.
    pub fn has_component<T: 'static>(&self, id: EntityId) -> bool {
        self.container::<T>().is_some_and(|array| array.has::<T>(id))
    }

    /// Reads `id`'s `T`, or `None` if it is absent or dead.
    pub fn get<T: 'static>(&self, id: EntityId) -> Option<&T> {
        self.container::<T>()?.get(id)
    }

    /// Mutable access to `id`'s `T`, or `None` if absent or dead.
    pub fn get_mut<T: 'static>(&mut self, id: EntityId) -> Option<&mut T> {
        let &index = self.by_type.get(&TypeId::of::<T>())?;
        self.arrays[index].get_mut(id)
    }

    /// The array storing `T`'s group, or `None` if `T` was never
    /// registered or added.
    pub fn container<T: 'static>(&self) -> Option<&SectorArray> {
        self.array_of(TypeId::of::<T>())
    }

    /// Shared view over the sectors where every member of `G` is live.
    ///
    /// `G`'s members must have been registered together. A view over
    /// types that were never grouped yields nothing; in debug builds it
    /// asserts instead.
    pub fn view<G: ComponentGroup>(&self) -> GroupedView<'_, G> {
        match self.array_of(G::key()) {
            Some(array) => GroupedView::over(array),
            None => {
                debug_assert!(false, "view requested before its component group was registered");
                GroupedView::empty()
            }
        }
    }

    /// Exclusive view over `G`'s sectors, for in-place mutation.
    pub fn view_mut<G: ComponentGroup>(&mut self) -> GroupedViewMut<'_, G> {
        let index = match self.by_type.get(&G::key()) {
            Some(&index) => index,
            None => {
                debug_assert!(false, "view requested before its component group was registered");
                return GroupedViewMut::empty();
            }
        };
        GroupedViewMut::over(&mut self.arrays[index])
    }

    /// Untyped view over `G`'s sectors, yielding raw sector handles.
    pub fn raw_view<G: ComponentGroup>(&self) -> SectorView<'_> {
        match self.array_of(G::key()) {
            Some(array) => SectorView::of::<G>(array),
            None => {
                debug_assert!(false, "view requested before its component group was registered");
                SectorView::empty()
            }
        }
    }

    /// Iterates entities holding a live `A` and a live `B`, whether or
    /// not the two types share a group.
    pub fn join<A, B>(&self) -> Join<'_, A, B>
    where
        A: 'static + Send + Sync,
        B: 'static + Send + Sync,
    {
        let (Some(primary), Some(secondary)) =
            (self.array_of(TypeId::of::<A>()), self.array_of(TypeId::of::<B>()))
        else {
            debug_assert!(false, "join requested before both component types were registered");
            return Join::empty();
        };
        Join::new(primary, secondary)
    }

    /// Copies every fully live `G` sector out as owned values.
    pub fn snapshot<G: CloneGroup>(&self) -> Vec<(EntityId, G::Owned)> {
        self.view::<G>().collect_owned()
    }

    /// Destroys all entities and components, keeping group registrations
    /// and their buffers.
    pub fn clear(&mut self) {
        for array in &mut self.arrays {
            array.clear();
        }
        self.entities = EntityAllocator::new();
    }
}
