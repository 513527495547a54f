//! Convenient re-exports of commonly used types.
//!
//! The prelude can be imported with:
//! ```
//! use lite_ecs::prelude::*;
//! ```

pub use crate::command::CommandBuffer;
pub use crate::component::{Component, ComponentTypeId};
pub use crate::config::WorldConfig;
pub use crate::debug::WorldInspector;
pub use crate::entity::Entity;
pub use crate::error::{EcsError, Result};
pub use crate::mask::ComponentMask;
pub use crate::query::ComponentSet;
pub use crate::world::{ComponentsMut, World};
