//! Shared-registry wrapper for concurrent use.
//!
//! [`SharedRegistry`] puts a [`Registry`] behind an [`RwLock`]: structural
//! changes take the write lock, reads take the read lock. Three ways to
//! iterate, from safest to fastest:
//!
//! * **Guard-scoped views.** `shared.read().view::<G>()` borrows from the
//!   guard, so the lock is held for as long as the view is used. Safe,
//!   and writers wait.
//! * **Snapshots.** [`SharedRegistry::snapshot`] copies the live sectors
//!   out under the read lock and releases it; iteration happens on the
//!   copy while writers proceed.
//! * **Detached views.** [`SharedRegistry::view`] takes the read lock
//!   only while capturing the view and releases it before iteration.
//!   Nothing then stops a writer from racing the iteration, which is why
//!   the method is `unsafe`; the contract is spelled out on the method.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::engine::entity::EntityId;
use crate::engine::error::RegistryError;
use crate::engine::group::{CloneGroup, ComponentGroup};
use crate::engine::grouped::GroupedView;
use crate::engine::registry::Registry;

/// A [`Registry`] shared between threads behind an [`RwLock`].
#[derive(Default)]
pub struct SharedRegistry {
    inner: RwLock<Registry>,
}

impl SharedRegistry {
    /// Wraps `registry` for shared use.
    pub fn new(registry: Registry) -> Self {
        Self { inner: RwLock::new(registry) }
    }

    /// Unwraps the registry again.
    pub fn into_inner(self) -> Registry {
        self.inner.into_inner().unwrap()
    }

    /// Acquires the read lock. Views built from the guard stay safe for
    /// the guard's lifetime.
    pub fn read(&self) -> RwLockReadGuard<'_, Registry> {
        self.inner.read().unwrap()
    }

    /// Acquires the write lock for a batch of structural changes.
    pub fn write(&self) -> RwLockWriteGuard<'_, Registry> {
        self.inner.write().unwrap()
    }

    /// Takes a fresh entity id under the write lock.
    pub fn take_entity(&self) -> EntityId {
        self.write().take_entity()
    }

    /// `true` while `id` has been taken and not destroyed.
    pub fn is_alive(&self, id: EntityId) -> bool {
        self.read().is_alive(id)
    }

    /// Number of live entities.
    pub fn entity_count(&self) -> usize {
        self.read().entity_count()
    }

    /// Registers the component group `G`. See
    /// [`Registry::register_group`].
    pub fn register_group<G: ComponentGroup>(&self) -> Result<(), RegistryError> {
        self.write().register_group::<G>()
    }

    /// Registers `G` with reserved capacity. Reserving enough sectors up
    /// front is what keeps detached views valid across appends; see
    /// [`SharedRegistry::view`].
    pub fn register_group_with_capacity<G: ComponentGroup>(
        &self,
        sectors: usize,
    ) -> Result<(), RegistryError> {
        self.write().register_group_with_capacity::<G>(sectors)
    }

    /// Grows `T`'s array under the write lock to hold `additional` more
    /// sectors. Detached views built before the growth are invalidated.
    pub fn reserve<T: 'static>(&self, additional: usize) {
        self.write().reserve::<T>(additional);
    }

    /// Stores `value` as `id`'s `T` under the write lock.
    pub fn add_component<T: 'static + Send + Sync>(&self, id: EntityId, value: T) {
        self.write().add_component(id, value);
    }

    /// Drops `id`'s `T` under the write lock.
    pub fn remove_component<T: 'static>(&self, id: EntityId) -> bool {
        self.write().remove_component::<T>(id)
    }

    /// Destroys entities and releases their ids under the write lock.
    pub fn destroy_entities<I>(&self, ids: I)
    where
        I: IntoIterator<Item = EntityId>,
    {
        self.write().destroy_entities(ids);
    }

    /// `true` when `id` has a live `T`.
    pub fn has_component<T: 'static>(&self, id: EntityId) -> bool {
        self.read().has_component::<T>(id)
    }

    /// Clones `id`'s `T` out under the read lock.
    pub fn get_cloned<T: 'static + Clone>(&self, id: EntityId) -> Option<T> {
        self.read().get::<T>(id).cloned()
    }

    /// Copies every fully live `G` sector out under the read lock. The
    /// lock is held for the duration of the copy and released before the
    /// result is returned.
    pub fn snapshot<G: CloneGroup>(&self) -> Vec<(EntityId, G::Owned)> {
        self.read().snapshot::<G>()
    }

    /// Captures a view of `G`'s sectors under a read lock that is
    /// released before this returns, so iteration runs without blocking
    /// writers.
    ///
    /// ## Safety
    /// The view reads the array's buffer without synchronization, so for
    /// as long as it is used the caller must ensure that
    ///
    /// * no operation grows `G`'s array beyond its reserved capacity; a
    ///   reallocation moves the buffer and leaves the view dangling,
    /// * no thread writes the sectors the view visits: appends of new
    ///   entities into reserved capacity touch only sectors past the
    ///   view's end and are fine, while `remove_component`,
    ///   `destroy_entities`, and mutation of visited payloads race the
    ///   iteration.
    ///
    /// Sectors appended after capture are not visited; capture a new view
    /// to observe them. When these obligations cannot be met, iterate
    /// through a guard from [`SharedRegistry::read`] or copy with
    /// [`SharedRegistry::snapshot`] instead.
    pub unsafe fn view<G: ComponentGroup>(&self) -> GroupedView<'_, G> {
        let guard = self.inner.read().unwrap();
        let (base, stride, len, mask, offsets) = guard.view::<G>().into_raw_parts();
        drop(guard);
        unsafe { GroupedView::from_raw_parts(base, stride, len, mask, offsets) }
    }
}
