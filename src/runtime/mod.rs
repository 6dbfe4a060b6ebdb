/*
 * Copyright 2019-2021 Wren Powell
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

//! The interface to the precompiled game binary.
//!
//! The binary may only start once every [`RunDependency`] has been cleared. It is configured
//! through a [`ModuleConfig`] and reports its loading progress as status lines handled by a
//! [`StatusReporter`].

pub use self::gate::{RunDependencies, RunDependency};
pub use self::module::{
    ModuleConfig, ModuleConfigBuilder, Runtime, DATA_VAR, DEFAULT_DATA_ROOT, DEFAULT_HOME,
    HOME_VAR,
};
pub use self::status::{parse_progress, StatusReporter};

mod gate;
mod module;
mod status;
