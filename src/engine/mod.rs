//! # Engine Module
//!
//! Internal sector storage implementation.
//!
//! This module contains all core building blocks such as:
//! - Entity management
//! - Group layout construction
//! - Sector arrays and headers
//! - Skip-dead views and joins
//! - Shared-registry locking
//!
//! Public API exposure is controlled by `lib.rs`.

pub mod types;
pub mod error;
pub mod entity;
pub mod layout;
pub mod sector;
pub mod hint;
pub mod array;
pub mod group;
pub mod view;
pub mod grouped;
pub mod join;
pub mod registry;
pub mod shared;
