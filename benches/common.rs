#![allow(dead_code)]

use sector_ecs::Registry;

pub const AGENTS_SMALL: usize = 10_000;
pub const AGENTS_MED: usize = 100_000;
pub const AGENTS_LARGE: usize = 1_000_000;

#[derive(Clone, Copy)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

#[derive(Clone, Copy)]
pub struct Velocity {
    pub dx: f32,
    pub dy: f32,
    pub dz: f32,
}

#[derive(Clone, Copy)]
pub struct Wealth {
    pub value: f32,
}

/// Positions and velocities grouped into one sector array, every sector
/// fully live.
pub fn grouped_world(agent_count: usize) -> Registry {
    let mut registry = Registry::new();
    registry
        .register_group_with_capacity::<(Position, Velocity)>(agent_count)
        .expect("group registration failed in benchmark");

    for i in 0..agent_count {
        let id = registry.take_entity();
        registry.add_component(id, Position { x: i as f32, y: 0.0, z: 0.0 });
        registry.add_component(id, Velocity { dx: 1.0, dy: 0.5, dz: 0.25 });
    }

    registry
}

/// Same layout, but only one agent in fifty carries a velocity, so the
/// walk spends its time skipping dead sectors.
pub fn sparse_world(agent_count: usize) -> Registry {
    let mut registry = Registry::new();
    registry
        .register_group_with_capacity::<(Position, Velocity)>(agent_count)
        .expect("group registration failed in benchmark");

    for i in 0..agent_count {
        let id = registry.take_entity();
        registry.add_component(id, Position { x: i as f32, y: 0.0, z: 0.0 });
        if i % 50 == 0 {
            registry.add_component(id, Velocity { dx: 1.0, dy: 0.5, dz: 0.25 });
        }
    }

    registry
}

/// Positions and wealth in separate single-type arrays, so reading both
/// must pair sectors through the entity id.
pub fn split_world(agent_count: usize) -> Registry {
    let mut registry = Registry::new();

    for i in 0..agent_count {
        let id = registry.take_entity();
        registry.add_component(id, Position { x: i as f32, y: 0.0, z: 0.0 });
        registry.add_component(id, Wealth { value: 100.0 });
    }

    registry
}

/// Split arrays again, but wealth on only one agent in fifty.
pub fn sparse_split_world(agent_count: usize) -> Registry {
    let mut registry = Registry::new();

    for i in 0..agent_count {
        let id = registry.take_entity();
        registry.add_component(id, Position { x: i as f32, y: 0.0, z: 0.0 });
        if i % 50 == 0 {
            registry.add_component(id, Wealth { value: 100.0 });
        }
    }

    registry
}
