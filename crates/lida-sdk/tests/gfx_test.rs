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

use anyhow::Result;
use lida_core::renderer::ResourceKind;
use lida_data::spirv::assembler::ModuleBuilder;
use lida_data::spirv::opcodes::execution_model;
use lida_sdk::prelude::*;
use std::sync::Arc;
use tempfile::tempdir;

fn compute_shader() -> Vec<u8> {
    let mut m = ModuleBuilder::new();
    let entry = m.entry_point(execution_model::GL_COMPUTE, "main");
    m.local_size(entry, [64, 1, 1]);
    let float = m.type_float(32);
    let vec4 = m.type_vector(float, 4);
    m.uniform_block(&[vec4], 0, 0);
    m.push_constant_block(&[vec4]);
    m.build_bytes()
}

#[test]
fn test_gfx_from_config_file_and_shader_directory() -> Result<()> {
    let dir = tempdir()?;
    let config_path = dir.path().join("gfx.ron");
    std::fs::write(
        &config_path,
        r#"(
            app_name: "integration",
            arena_bytes: 32768,
            budgets: (shader: 2048),
        )"#,
    )?;
    std::fs::create_dir(dir.path().join("shaders"))?;
    std::fs::write(dir.path().join("shaders/cull.comp.spv"), compute_shader())?;

    let config = GfxConfig::load(&config_path)?;
    assert_eq!(config.app_name, "integration");

    let device = HeadlessDevice::new();
    let mut gfx = Gfx::init(
        config,
        Arc::new(device.clone()),
        FsShaderLoader::new(dir.path().join("shaders")),
    )?;

    let entry = gfx.shader("cull.comp")?;
    let reflection = entry.reflection.expect("compute shader is reflected");
    assert_eq!(reflection.stages, ShaderStageFlags::COMPUTE);
    assert_eq!(reflection.local_size, [64, 1, 1]);

    let layout = gfx.pipeline_layout_for_shaders(&["cull.comp"])?;
    assert_eq!(gfx.pipeline_layout_for_shaders(&["cull.comp"])?, layout);
    assert!(gfx.shader("missing.comp").is_err());

    let stats = gfx.stats().expect("running");
    assert_eq!(stats.shaders.misses, 2);
    assert!(stats.shaders.hits >= 2);
    assert_eq!(stats.pipeline_layouts.live, 1);

    gfx.shutdown();
    assert_eq!(device.live_count(), 0);
    for kind in ResourceKind::ALL {
        assert_eq!(device.created(kind), device.destroyed(kind));
    }
    Ok(())
}

#[test]
fn test_missing_config_file_is_an_error() {
    let dir = tempdir().unwrap();
    assert!(GfxConfig::load(dir.path().join("absent.ron")).is_err());
}
