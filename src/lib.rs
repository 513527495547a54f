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

//! Lite ECS - sparse-set Entity Component System
//!
//! Entities are generational handles into a fixed-capacity table. Each
//! component type lives in its own densely packed store with O(1) attach,
//! detach and lookup, and queries filter live entities by component mask.

pub mod command;
pub mod component;
pub mod config;
pub mod debug;
pub mod entity;
pub mod entity_table;
pub mod error;
pub mod mask;
pub mod prelude;
pub mod profiling;
pub mod query;
pub mod storage;
pub mod world;


pub use command::*;
pub use component::*;
pub use config::*;
pub use debug::*;
pub use entity::*;
pub use entity_table::*;
pub use error::*;
pub use mask::*;
pub use query::*;
pub use storage::*;
pub use world::*;
