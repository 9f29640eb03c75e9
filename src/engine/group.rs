//! Component groups expressed as tuples.
//!
//! A group is declared as a tuple of component types, `(Position,
//! Velocity)`, and drives both registration and typed iteration. At
//! registration the tuple describes the members to pack into one sector
//! layout; at view construction it resolves its member offsets against an
//! array's layout, refusing arrays that miss a member and tuples that
//! name the same member twice.
//!
//! Implementations are generated for tuples of one through eight member
//! types. Members must be `Send + Sync` so arrays and views built over
//! them stay safe to hand across threads.

use std::any::TypeId;
use std::fmt::Debug;
use std::mem::align_of;

use crate::engine::layout::{ComponentInfo, SectorLayout};
use crate::engine::types::{AliveBits, ByteOffset, SECTOR_ALIGN};

/// A tuple of component types stored together in one sector layout.
///
/// ## Safety
/// Typed iterators turn the resolver's output straight into member
/// references. An implementation must only resolve offsets that locate
/// one properly typed payload per member inside every sector of the
/// layout, on pairwise distinct slots, with the returned mask covering
/// exactly those slots' liveness bits.
pub unsafe trait ComponentGroup: 'static {
    /// Number of member types in the group.
    const LEN: usize;

    #[doc(hidden)]
    const ALIGN_OK: ();

    /// Member payload offsets resolved against one layout.
    type Offsets: Copy + Debug + Send + Sync;

    /// Offsets for a view over nothing; never dereferenced.
    const ZERO_OFFSETS: Self::Offsets;

    /// Shared references to every member of one sector.
    type Refs<'a>;

    /// Mutable references to every member of one sector.
    type RefsMut<'a>;

    /// Descriptors of the member types, in tuple order.
    fn infos() -> Vec<ComponentInfo>;

    /// Type of the first member; arrays are looked up by it.
    fn key() -> TypeId;

    /// Offsets and combined liveness mask of the members within `layout`,
    /// or `None` unless the layout stores every member on a distinct
    /// slot. A tuple that repeats a member type never resolves.
    fn resolve(layout: &SectorLayout) -> Option<(Self::Offsets, AliveBits)>;

    /// ## Safety
    /// `sector` must point at a live sector of a layout that produced
    /// `offsets`, with every member's liveness bit set, valid for reads
    /// for `'a` with no conflicting writes.
    unsafe fn refs<'a>(sector: *const u8, offsets: &Self::Offsets) -> Self::Refs<'a>;

    /// ## Safety
    /// As [`ComponentGroup::refs`], and additionally the sector must be
    /// reachable only through this pointer for `'a`.
    unsafe fn refs_mut<'a>(sector: *mut u8, offsets: &Self::Offsets) -> Self::RefsMut<'a>;
}

/// A group whose members can be copied out into owned values.
pub trait CloneGroup: ComponentGroup {
    /// Owned tuple of member values.
    type Owned;

    /// Clones the referenced members into owned values.
    fn to_owned(refs: &Self::Refs<'_>) -> Self::Owned;
}

macro_rules! impl_component_group {
    ($len:expr; $head:ident => $head_idx:tt $(, $tail:ident => $tail_idx:tt)*) => {
        // Offsets come straight from the layout's entries, and `resolve`
        // refuses overlapping slots, so the resolver contract holds.
        unsafe impl<$head: 'static + Send + Sync, $($tail: 'static + Send + Sync),*> ComponentGroup
            for ($head, $($tail,)*)
        {
            const LEN: usize = $len;

            const ALIGN_OK: () = {
                assert!(align_of::<$head>() <= SECTOR_ALIGN);
                $(assert!(align_of::<$tail>() <= SECTOR_ALIGN);)*
            };

            type Offsets = [ByteOffset; $len];

            const ZERO_OFFSETS: Self::Offsets = [0; $len];

            type Refs<'a> = (&'a $head, $(&'a $tail,)*);
            type RefsMut<'a> = (&'a mut $head, $(&'a mut $tail,)*);

            fn infos() -> Vec<ComponentInfo> {
                let _: () = Self::ALIGN_OK;
                vec![
                    ComponentInfo::of::<$head>(),
                    $(ComponentInfo::of::<$tail>(),)*
                ]
            }

            fn key() -> TypeId {
                TypeId::of::<$head>()
            }

            fn resolve(layout: &SectorLayout) -> Option<(Self::Offsets, AliveBits)> {
                let _: () = Self::ALIGN_OK;
                let mut offsets = [0; $len];
                let mut mask: AliveBits = 0;
                let entry = layout.entry_of::<$head>()?;
                offsets[$head_idx] = entry.offset;
                mask |= entry.mask;
                $(
                    let entry = layout.entry_of::<$tail>()?;
                    // A repeated member type lands on a slot already
                    // claimed; every member must map to its own payload.
                    if mask & entry.mask != 0 {
                        return None;
                    }
                    offsets[$tail_idx] = entry.offset;
                    mask |= entry.mask;
                )*
                Some((offsets, mask))
            }

            unsafe fn refs<'a>(sector: *const u8, offsets: &Self::Offsets) -> Self::Refs<'a> {
                unsafe {
                    (
                        &*sector.add(offsets[$head_idx] as usize).cast::<$head>(),
                        $(&*sector.add(offsets[$tail_idx] as usize).cast::<$tail>(),)*
                    )
                }
            }

            unsafe fn refs_mut<'a>(sector: *mut u8, offsets: &Self::Offsets) -> Self::RefsMut<'a> {
                unsafe {
                    (
                        &mut *sector.add(offsets[$head_idx] as usize).cast::<$head>(),
                        $(&mut *sector.add(offsets[$tail_idx] as usize).cast::<$tail>(),)*
                    )
                }
            }
        }

        impl<$head: 'static + Send + Sync + Clone, $($tail: 'static + Send + Sync + Clone),*>
            CloneGroup for ($head, $($tail,)*)
        {
            type Owned = ($head, $($tail,)*);

            fn to_owned(refs: &Self::Refs<'_>) -> Self::Owned {
                (
                    (*refs.$head_idx).clone(),
                    $((*refs.$tail_idx).clone(),)*
                )
            }
        }
    };
}

impl_component_group!(1; A => 0);
impl_component_group!(2; A => 0, B => 1);
impl_component_group!(3; A => 0, B => 1, C => 2);
impl_component_group!(4; A => 0, B => 1, C => 2, D => 3);
impl_component_group!(5; A => 0, B => 1, C => 2, D => 3, E => 4);
impl_component_group!(6; A => 0, B => 1, C => 2, D => 3, E => 4, F => 5);
impl_component_group!(7; A => 0, B => 1, C => 2, D => 3, E => 4, F => 5, G => 6);
impl_component_group!(8; A => 0, B => 1, C => 2, D => 3, E => 4, F => 5, G => 6, H => 7);
