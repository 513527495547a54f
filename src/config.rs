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

//! World capacities
//!
//! Both limits are fixed when a [`World`](crate::World) is built. Nothing
//! grows past them afterwards.

use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::error::{EcsError, Result};

/// Default maximum number of simultaneously allocated entity indices
pub const DEFAULT_MAX_ENTITIES: usize = 5000;

/// Default maximum number of distinct component types
pub const DEFAULT_MAX_COMPONENTS: usize = 32;

/// Largest accepted `max_components`. Every entity mask and the store slot
/// array are sized by it up front.
pub const MAX_COMPONENT_TYPES: usize = 1024;

/// Capacity configuration for a world
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Upper bound on entity indices ever allocated (free indices included)
    pub max_entities: usize,
    /// Upper bound on distinct component types
    pub max_components: usize,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            max_entities: DEFAULT_MAX_ENTITIES,
            max_components: DEFAULT_MAX_COMPONENTS,
        }
    }
}

impl WorldConfig {
    pub fn with_max_entities(mut self, max_entities: usize) -> Self {
        self.max_entities = max_entities;
        self
    }

    pub fn with_max_components(mut self, max_components: usize) -> Self {
        self.max_components = max_components;
        self
    }

    /// Parse a JSON document such as `{"max_entities": 10000}`.
    /// Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: WorldConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the limits are representable
    pub fn validate(&self) -> Result<()> {
        if self.max_entities == 0 {
            return Err(EcsError::InvalidConfig(
                "max_entities must be at least 1".to_string(),
            ));
        }
        // The top index value is the invalid sentinel
        if self.max_entities > Entity::INVALID_INDEX as usize {
            return Err(EcsError::InvalidConfig(format!(
                "max_entities {} exceeds {}",
                self.max_entities,
                Entity::INVALID_INDEX
            )));
        }
        if self.max_components == 0 {
            return Err(EcsError::InvalidConfig(
                "max_components must be at least 1".to_string(),
            ));
        }
        if self.max_components > MAX_COMPONENT_TYPES {
            return Err(EcsError::InvalidConfig(format!(
                "max_components {} exceeds {}",
                self.max_components, MAX_COMPONENT_TYPES
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WorldConfig::default();
        assert_eq!(config.max_entities, 5000);
        assert_eq!(config.max_components, 32);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_json_partial() {
        let config = WorldConfig::from_json_str(r#"{ "max_entities": 64 }"#).unwrap();
        assert_eq!(config.max_entities, 64);
        assert_eq!(config.max_components, DEFAULT_MAX_COMPONENTS);
    }

    #[test]
    fn test_json_rejects_zero() {
        let err = WorldConfig::from_json_str(r#"{ "max_components": 0 }"#).unwrap_err();
        assert!(matches!(err, EcsError::InvalidConfig(_)));
    }

    #[test]
    fn test_json_rejects_garbage() {
        assert!(matches!(
            WorldConfig::from_json_str("not json"),
            Err(EcsError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_max_entities_stops_below_sentinel() {
        // Indices run 0..max_entities, so the sentinel itself is never handed out
        let config = WorldConfig::default().with_max_entities(u32::MAX as usize);
        assert!(config.validate().is_ok());

        let config = WorldConfig::default().with_max_entities(u32::MAX as usize + 1);
        assert!(matches!(config.validate(), Err(EcsError::InvalidConfig(_))));
    }

    #[test]
    fn test_max_components_is_bounded() {
        let config = WorldConfig::default().with_max_components(MAX_COMPONENT_TYPES);
        assert!(config.validate().is_ok());

        let config = WorldConfig::default().with_max_components(MAX_COMPONENT_TYPES + 1);
        assert!(matches!(config.validate(), Err(EcsError::InvalidConfig(_))));

        let config = WorldConfig::default().with_max_components(u32::MAX as usize);
        assert!(config.validate().is_err());
    }
}
