// Copyright 2025 eraflo
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

use anyhow::{Context, Result};
use lida_infra::CacheBudgets;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Byte budgets of the four resource caches, as written in a config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetConfig {
    /// Render pass cache budget.
    pub render_pass: usize,
    /// Shader cache budget.
    pub shader: usize,
    /// Descriptor-set layout cache budget.
    pub descriptor_set_layout: usize,
    /// Pipeline layout cache budget.
    pub pipeline_layout: usize,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        CacheBudgets::default().into()
    }
}

impl From<CacheBudgets> for BudgetConfig {
    fn from(budgets: CacheBudgets) -> Self {
        Self {
            render_pass: budgets.render_pass,
            shader: budgets.shader,
            descriptor_set_layout: budgets.descriptor_set_layout,
            pipeline_layout: budgets.pipeline_layout,
        }
    }
}

impl From<BudgetConfig> for CacheBudgets {
    fn from(config: BudgetConfig) -> Self {
        Self {
            render_pass: config.render_pass,
            shader: config.shader,
            descriptor_set_layout: config.descriptor_set_layout,
            pipeline_layout: config.pipeline_layout,
        }
    }
}

/// Start-up parameters of a [`Gfx`](crate::Gfx).
///
/// Missing fields take their default values when read from RON:
///
/// ```ron
/// (
///     app_name: "viewer",
///     arena_bytes: 131072,
///     budgets: (shader: 8192),
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GfxConfig {
    /// Name reported to the driver.
    pub app_name: String,
    /// Version reported to the driver.
    pub app_version: u32,
    /// Whether the driver's validation layers are requested.
    pub enable_debug_layers: bool,
    /// Index of the physical device to use.
    pub gpu_index: u32,
    /// Size of the arena backing the cache budgets and scratch memory.
    pub arena_bytes: usize,
    /// Byte budget of each cache.
    pub budgets: BudgetConfig,
}

impl Default for GfxConfig {
    fn default() -> Self {
        Self {
            app_name: "lida".to_string(),
            app_version: 1,
            enable_debug_layers: cfg!(debug_assertions),
            gpu_index: 0,
            arena_bytes: 64 * 1024,
            budgets: BudgetConfig::default(),
        }
    }
}

impl GfxConfig {
    /// Parses a config from RON text.
    pub fn from_ron_str(text: &str) -> Result<Self> {
        ron::from_str(text).context("Failed to parse graphics config")
    }

    /// Reads a RON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config '{}'", path.display()))?;
        Self::from_ron_str(&text).with_context(|| format!("In config '{}'", path.display()))
    }

    /// The config as pretty-printed RON.
    pub fn to_ron_string(&self) -> Result<String> {
        let pretty = ron::ser::PrettyConfig::default().indentor("  ".to_string());
        ron::ser::to_string_pretty(self, pretty).context("Failed to serialize graphics config")
    }

    /// Checks that the budgets fit in the arena with room left for scratch.
    pub fn validate(&self) -> Result<()> {
        let total = CacheBudgets::from(self.budgets).total();
        anyhow::ensure!(
            total < self.arena_bytes,
            "Cache budgets total {total} bytes but the arena holds only {}",
            self.arena_bytes
        );
        Ok(())
    }
}
