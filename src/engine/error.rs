//! Error types for group registration and layout construction.
//!
//! This module declares the focused error types returned when a component
//! group cannot be laid out as sectors or cannot be registered with a
//! registry. Each error carries enough context to make failures actionable
//! while remaining small and cheap to pass around.
//!
//! ## Goals
//! * **Specificity:** Each variant models a single failure mode (too many
//!   members, duplicate member, oversized alignment, oversized stride).
//! * **Ergonomics:** All errors implement [`std::error::Error`] and
//!   [`fmt::Display`], and provide `From<T>` conversions into aggregate
//!   errors.
//! * **Actionability:** Structured fields (requested vs. supported counts,
//!   offending type names) make logs useful without reproducing the issue.
//!
//! ## Typical flow
//! Layout construction returns [`GroupError`]; registration wraps it into
//! [`RegistryError`] via `?` and adds the failure modes only a registry can
//! detect, such as a component type that already belongs to another group.
//!
//! ## Display vs. Debug
//! * [`fmt::Display`] is optimized for operator logs (short, imperative
//!   phrasing).
//! * [`fmt::Debug`] (derived) retains full structure for diagnostics.

use std::fmt;

/// Returned when a component group cannot be laid out as fixed-stride
/// sectors.
///
/// ### Fields
/// Variants carry the offending type name and the violated limit, so a log
/// line is enough to identify the group member that needs attention.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupError {
    /// The group contains no component types.
    EmptyGroup,

    /// The group holds more member types than the liveness word has bits.
    TooManyComponents {
        /// Number of member types in the group.
        requested: usize,
        /// Maximum number of members a group supports.
        capacity: usize,
    },

    /// The same component type appears twice in the group.
    DuplicateComponent {
        /// Name of the repeated component type.
        name: &'static str,
    },

    /// A member type requires stricter alignment than sectors guarantee.
    UnsupportedAlignment {
        /// Name of the offending component type.
        name: &'static str,
        /// Alignment the type requires.
        align: usize,
        /// Maximum alignment a sector member may require.
        max: usize,
    },

    /// The combined payloads exceed the addressable sector stride.
    StrideOverflow {
        /// Stride the group would need.
        required: usize,
        /// Maximum stride a sector supports.
        capacity: usize,
    },
}

impl fmt::Display for GroupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupError::EmptyGroup => f.write_str("component group is empty"),

            GroupError::TooManyComponents { requested, capacity } => write!(
                f,
                "group holds {} component types; the liveness word supports {}",
                requested, capacity
            ),

            GroupError::DuplicateComponent { name } => {
                write!(f, "component type {} appears twice in the group", name)
            }

            GroupError::UnsupportedAlignment { name, align, max } => write!(
                f,
                "component type {} requires alignment {} (sector members support up to {})",
                name, align, max
            ),

            GroupError::StrideOverflow { required, capacity } => write!(
                f,
                "group payload needs a stride of {} bytes (sectors support up to {})",
                required, capacity
            ),
        }
    }
}

impl std::error::Error for GroupError {}

/// Returned when a component group cannot be registered with a registry.
///
/// Aggregates [`GroupError`] with the failure modes only a registry can
/// detect. `From<GroupError>` allows layout construction to bubble up with
/// `?`.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryError {
    /// A member type already belongs to a previously registered group.
    AlreadyGrouped {
        /// Name of the component type that is already stored elsewhere.
        name: &'static str,
    },

    /// The group itself could not be laid out as sectors.
    Group(GroupError),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::AlreadyGrouped { name } => write!(
                f,
                "component type {} already belongs to a registered group",
                name
            ),
            RegistryError::Group(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for RegistryError {}

impl From<GroupError> for RegistryError {
    fn from(e: GroupError) -> Self {
        RegistryError::Group(e)
    }
}
