// Copyright 2024 Saptak Santra
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Error types

use std::fmt;

use crate::entity::Entity;

/// ECS error type
///
/// Every variant describes ordinary, recoverable misuse. None of them leave
/// the world in a partially mutated state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EcsError {
    /// Handle is not live (never created, removed, or from an older generation)
    InvalidEntity(Entity),

    /// Entity does not carry the requested component
    ComponentNotFound {
        entity: Entity,
        component: &'static str,
    },

    /// Entity already carries the component being attached
    DuplicateComponent {
        entity: Entity,
        component: &'static str,
    },

    /// Entity table has no free index left
    CapacityExhausted { capacity: usize },

    /// More distinct component types than the world was configured for
    ComponentTypeOverflow {
        capacity: usize,
        component: &'static str,
    },

    /// The dense buffer for a component type could not be allocated
    StoreAllocation {
        component: &'static str,
        capacity: usize,
    },

    /// Configuration rejected by validation
    InvalidConfig(String),

    /// IO error (tracing file output)
    Io(String),
}

impl fmt::Display for EcsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EcsError::InvalidEntity(entity) => write!(f, "Entity {entity} is not alive"),
            EcsError::ComponentNotFound { entity, component } => {
                write!(f, "Entity {entity} has no component {component}")
            }
            EcsError::DuplicateComponent { entity, component } => {
                write!(f, "Entity {entity} already has component {component}")
            }
            EcsError::CapacityExhausted { capacity } => {
                write!(f, "Entity capacity exhausted: max is {capacity}")
            }
            EcsError::ComponentTypeOverflow {
                capacity,
                component,
            } => write!(
                f,
                "Cannot register component {component}: max is {capacity} component types"
            ),
            EcsError::StoreAllocation {
                component,
                capacity,
            } => write!(
                f,
                "Cannot allocate store for {component} with {capacity} slots"
            ),
            EcsError::InvalidConfig(msg) => write!(f, "Invalid config: {msg}"),
            EcsError::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for EcsError {}

impl From<std::io::Error> for EcsError {
    fn from(err: std::io::Error) -> Self {
        EcsError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for EcsError {
    fn from(err: serde_json::Error) -> Self {
        EcsError::InvalidConfig(err.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, EcsError>;
