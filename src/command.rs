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

//! Command buffer for structural changes recorded during iteration

use crate::component::Component;
use crate::entity::Entity;
use crate::error::Result;
use crate::world::World;

/// Type alias for world mutation closures
pub type CommandClosure = Box<dyn FnOnce(&mut World) -> Result<()>>;

/// Deferred command for world mutations
pub enum Command {
    /// Remove entity; skipped if it is already gone
    RemoveEntity(Entity),

    /// Custom world mutation
    Custom(CommandClosure),
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::RemoveEntity(e) => f.debug_tuple("RemoveEntity").field(e).finish(),
            Command::Custom(_) => write!(f, "Custom(...)"),
        }
    }
}

/// Command buffer for deferred operations
#[derive(Default, Debug)]
pub struct CommandBuffer {
    commands: Vec<Command>,
}

impl CommandBuffer {
    /// Create new command buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            commands: Vec::with_capacity(capacity),
        }
    }

    /// Queue entity removal
    pub fn remove_entity(&mut self, entity: Entity) {
        self.commands.push(Command::RemoveEntity(entity));
    }

    /// Queue a custom world mutation
    pub fn add<F>(&mut self, f: F)
    where
        F: FnOnce(&mut World) -> Result<()> + 'static,
    {
        self.commands.push(Command::Custom(Box::new(f)));
    }

    /// Queue a default-constructed component attach
    pub fn add_component<T: Component + Default>(&mut self, entity: Entity) {
        self.add(move |world| world.add_component::<T>(entity));
    }

    /// Queue a component attach
    pub fn insert_component<T: Component>(&mut self, entity: Entity, component: T) {
        self.add(move |world| world.insert_component(entity, component));
    }

    /// Queue a component detach; the detached value is dropped
    pub fn remove_component<T: Component>(&mut self, entity: Entity) {
        self.add(move |world| world.remove_component::<T>(entity).map(|_| ()));
    }

    /// Apply all commands to the world in recorded order and clear the buffer.
    ///
    /// Stops at the first failing command; the commands after it are
    /// discarded.
    pub fn apply(&mut self, world: &mut World) -> Result<()> {
        #[cfg(feature = "profiling")]
        let _span = tracing::debug_span!("command_buffer.apply", commands = self.commands.len())
            .entered();

        for command in self.commands.drain(..) {
            match command {
                Command::RemoveEntity(entity) => {
                    // Several systems may queue the same removal
                    if world.is_alive(entity) {
                        world.remove_entity(entity)?;
                    }
                }
                Command::Custom(f) => {
                    f(world)?;
                }
            }
        }
        Ok(())
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Get length
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Clear buffer
    pub fn clear(&mut self) {
        self.commands.clear();
    }
}
