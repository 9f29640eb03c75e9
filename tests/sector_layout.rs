use std::mem::{align_of, size_of};

use sector_ecs::engine::layout::{ComponentInfo, SectorLayout};
use sector_ecs::engine::types::{GROUP_CAP, HEADER_SIZE, SECTOR_ALIGN};
use sector_ecs::{EntityId, GroupError, Registry, SectorHeader};

#[derive(Clone, Copy, Debug, PartialEq)]
struct Position {
    x: f32,
    y: f32,
    z: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Velocity {
    dx: f32,
    dy: f32,
    dz: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Tag(u8);

#[derive(Clone, Copy, Debug, PartialEq)]
struct Mass(f64);

#[test]
fn header_is_one_word() {
    assert_eq!(size_of::<SectorHeader>(), HEADER_SIZE);
    assert_eq!(align_of::<SectorHeader>(), SECTOR_ALIGN);
}

#[test]
fn members_pack_after_header_in_declaration_order() {
    let layout = SectorLayout::build(vec![
        ComponentInfo::of::<Position>(),
        ComponentInfo::of::<Velocity>(),
        ComponentInfo::of::<Tag>(),
        ComponentInfo::of::<Mass>(),
    ])
    .expect("four small members must pack");

    // header (8) | Position (12) | Velocity (12) | Tag (1) | pad | Mass (8)
    assert_eq!(layout.entry_of::<Position>().unwrap().offset, 8);
    assert_eq!(layout.entry_of::<Velocity>().unwrap().offset, 20);
    assert_eq!(layout.entry_of::<Tag>().unwrap().offset, 32);
    assert_eq!(layout.entry_of::<Mass>().unwrap().offset, 40);
    assert_eq!(layout.stride(), 48);
    assert_eq!(layout.stride() % SECTOR_ALIGN, 0);

    // each payload is self-aligned and starts past the header
    for slot in layout.slots() {
        let offset = slot.entry.offset as usize;
        assert!(offset >= HEADER_SIZE, "payload {} overlaps the header", slot.info.name);
        assert_eq!(offset % slot.info.align.max(1), 0, "payload {} is misaligned", slot.info.name);
        assert!(offset + slot.info.size <= layout.stride());
    }

    // payloads never overlap
    let mut spans: Vec<(usize, usize)> = layout
        .slots()
        .iter()
        .map(|slot| (slot.entry.offset as usize, slot.info.size))
        .collect();
    spans.sort();
    for pair in spans.windows(2) {
        assert!(pair[0].0 + pair[0].1 <= pair[1].0, "payloads overlap: {:?}", pair);
    }

    // member i owns liveness bit i, and the combined mask covers exactly the group
    for (position, slot) in layout.slots().iter().enumerate() {
        assert_eq!(slot.entry.mask, 1 << position);
    }
    assert_eq!(layout.combined_mask().count_ones() as usize, layout.component_count());
}

#[test]
fn sectors_sit_at_stride_multiples() {
    let mut registry = Registry::new();
    registry
        .register_group::<(Position, Velocity)>()
        .expect("group registration failed");

    for i in 0..16u32 {
        let id = registry.take_entity();
        registry.add_component(id, Position { x: i as f32, y: 0.0, z: 0.0 });
        registry.add_component(id, Velocity { dx: 1.0, dy: 0.0, dz: 0.0 });
    }

    let array = registry.container::<Position>().expect("positions live somewhere");
    assert_eq!(array.stride(), 32); // 8 header + 12 + 12, already 8-aligned
    assert_eq!(array.len(), 16);

    let base = array.sector(0).unwrap().as_ptr() as usize;
    assert_eq!(base % SECTOR_ALIGN, 0, "sector storage must start aligned");

    for i in 0..16usize {
        let sector = array.sector(i).unwrap();
        let p = sector.as_ptr() as usize;
        assert_eq!(p, base + i * array.stride(), "sector {i} is off its stride slot");
        assert_eq!(sector.id(), EntityId(i as u32), "sector {i} belongs to the wrong entity");
    }

    // payload reads through the recorded entry land on the written values
    let entry = array.layout().entry_of::<Position>().copied().unwrap();
    for i in 0..16usize {
        let sector = array.sector(i).unwrap();
        let position = sector.component::<Position>(&entry).unwrap();
        assert_eq!(position.x, i as f32);
        assert_eq!((position as *const Position as usize) % align_of::<Position>(), 0);
    }
}

#[test]
fn single_type_arrays_appear_on_first_insert() {
    let mut registry = Registry::new();
    let id = registry.take_entity();
    registry.add_component(id, Mass(9.81));

    let array = registry.container::<Mass>().expect("lazy registration on first add");
    assert_eq!(array.stride(), 16); // 8 header + 8 payload
    assert_eq!(array.layout().entry_of::<Mass>().unwrap().offset, 8);
    assert_eq!(registry.get::<Mass>(id), Some(&Mass(9.81)));
}

#[test]
fn empty_groups_are_rejected() {
    let err = SectorLayout::build(Vec::new()).unwrap_err();
    assert_eq!(err, GroupError::EmptyGroup);
}

#[test]
fn oversized_groups_are_rejected() {
    let members: Vec<ComponentInfo> = (0..=GROUP_CAP).map(|_| ComponentInfo::of::<u8>()).collect();
    let err = SectorLayout::build(members).unwrap_err();
    assert_eq!(
        err,
        GroupError::TooManyComponents { requested: GROUP_CAP + 1, capacity: GROUP_CAP }
    );
}

#[test]
fn repeated_member_types_are_rejected() {
    let err = SectorLayout::build(vec![
        ComponentInfo::of::<Position>(),
        ComponentInfo::of::<Position>(),
    ])
    .unwrap_err();
    assert!(matches!(err, GroupError::DuplicateComponent { .. }));
}

#[test]
fn overaligned_members_are_rejected() {
    #[repr(align(16))]
    struct Wide(#[allow(dead_code)] u8);

    let err = SectorLayout::build(vec![ComponentInfo::of::<Wide>()]).unwrap_err();
    assert!(matches!(
        err,
        GroupError::UnsupportedAlignment { align: 16, max: 8, .. }
    ));
}

#[test]
fn oversized_strides_are_rejected() {
    struct Huge(#[allow(dead_code)] [u8; 70_000]);

    let err = SectorLayout::build(vec![ComponentInfo::of::<Huge>()]).unwrap_err();
    assert_eq!(err, GroupError::StrideOverflow { required: 70_008, capacity: 65_536 });
}
