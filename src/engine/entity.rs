//! Entity ids and their allocator.

/// Handle to an entity. Plain index, recycled on destruction.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct EntityId(pub u32);

impl EntityId {
    /// Reserved id that never refers to a live entity.
    pub const INVALID: EntityId = EntityId(u32::MAX);

    /// The id as a dense array index.
    #[inline] pub fn index(self) -> usize { self.0 as usize }
    /// `false` for [`EntityId::INVALID`].
    #[inline] pub fn is_valid(self) -> bool { self.0 != u32::MAX }
}

/// Hands out dense entity ids and recycles released ones.
#[derive(Default)]
pub struct EntityAllocator {
    alive: Vec<bool>,
    free_store: Vec<u32>,
}

impl EntityAllocator {
    /// Creates an empty allocator.
    pub fn new() -> Self { Self::default() }

    /// Takes the next free id, reusing released ids before growing.
    pub fn take(&mut self) -> EntityId {
        if let Some(index) = self.free_store.pop() {
            self.alive[index as usize] = true;
            return EntityId(index);
        }
        let index = self.alive.len();
        assert!(index < u32::MAX as usize, "entity id space exhausted");
        self.alive.push(true);
        EntityId(index as u32)
    }

    /// Releases `entity` for reuse. Returns `false` if it was not alive.
    pub fn release(&mut self, entity: EntityId) -> bool {
        match self.alive.get_mut(entity.index()) {
            Some(live) if *live => {
                *live = false;
                self.free_store.push(entity.0);
                true
            }
            _ => false,
        }
    }

    /// `true` while `entity` has been taken and not yet released.
    pub fn is_alive(&self, entity: EntityId) -> bool {
        entity.is_valid() && self.alive.get(entity.index()).copied().unwrap_or(false)
    }

    /// Number of ids currently taken.
    pub fn live_count(&self) -> usize {
        self.alive.len() - self.free_store.len()
    }
}
