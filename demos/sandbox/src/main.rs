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

// Lida Sandbox
// Boots the facade on the headless device and walks through every cache.

use anyhow::Result;
use lida_core::renderer::ResourceKind;
use lida_data::spirv::assembler::ModuleBuilder;
use lida_data::spirv::opcodes::{execution_model, storage_class};
use lida_sdk::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;

fn vertex_module() -> Vec<u8> {
    let mut m = ModuleBuilder::new();
    m.entry_point(execution_model::VERTEX, "main");
    let float = m.type_float(32);
    let vec4 = m.type_vector(float, 4);
    let mat4 = m.type_matrix(vec4, 4);
    // Camera matrices.
    m.uniform_block(&[mat4, mat4], 0, 0);
    // Model matrix.
    m.push_constant_block(&[mat4]);
    m.build_bytes()
}

fn fragment_module() -> Vec<u8> {
    let mut m = ModuleBuilder::new();
    m.entry_point(execution_model::FRAGMENT, "main");
    let float = m.type_float(32);
    let vec4 = m.type_vector(float, 4);
    let mat4 = m.type_matrix(vec4, 4);
    m.uniform_block(&[mat4, mat4], 0, 0);
    let image = m.type_image(float);
    let sampled = m.type_sampled_image(image);
    let pointer = m.type_pointer(storage_class::UNIFORM_CONSTANT, sampled);
    let albedo = m.variable(pointer, storage_class::UNIFORM_CONSTANT);
    m.bind(albedo, 1, 0);
    m.push_constant_block(&[mat4, vec4]);
    m.build_bytes()
}

/// Serves the demo's shaders from memory.
fn shader_library() -> impl ShaderLoader {
    let modules: HashMap<&'static str, Vec<u8>> = [
        ("mesh.vert", vertex_module()),
        ("mesh.frag", fragment_module()),
        // Not SPIR-V: the driver still gets it, reflection is skipped.
        ("legacy.bin", vec![0xDE, 0xAD, 0xBE, 0xEF, 0, 0, 0, 0]),
    ]
    .into_iter()
    .collect();

    move |tag: &str| -> Result<Vec<u8>, ShaderError> {
        modules
            .get(tag)
            .cloned()
            .ok_or_else(|| ShaderError::NotFound {
                tag: tag.to_string(),
            })
    }
}

fn load_config() -> Result<GfxConfig> {
    match std::env::args().nth(1) {
        Some(path) => {
            log::info!("Loading config from '{path}'");
            GfxConfig::load(path)
        }
        None => Ok(GfxConfig {
            app_name: "sandbox".to_string(),
            ..GfxConfig::default()
        }),
    }
}

fn run(gfx: &mut Gfx) -> Result<()> {
    let attachments = [
        AttachmentInfo::present(Format::Bgra8Srgb),
        AttachmentInfo::transient_depth(Format::D32Sfloat),
    ];
    let main_pass = gfx.render_pass(&attachments)?;
    let again = gfx.render_pass(&attachments)?;
    log::info!("Main pass: {main_pass:?} (second request: {again:?})");

    for tag in ["mesh.vert", "mesh.frag", "legacy.bin"] {
        let entry = gfx.shader(tag)?;
        match entry.reflection {
            Some(reflection) => log::info!(
                "Shader '{tag}': {:?}, {} set(s), push constants {:?}",
                reflection.stages,
                reflection.set_count,
                reflection.push_constants.map(|range| range.size)
            ),
            None => log::info!("Shader '{tag}': {:?}, not reflected", entry.module),
        }
    }

    let layout = gfx.pipeline_layout_for_shaders(&["mesh.vert", "mesh.frag"])?;
    log::info!("Mesh pipeline layout: {layout:?}");

    let shadow_set = gfx.descriptor_set_layout(&[DescriptorBinding::new(
        0,
        DescriptorType::UniformBuffer,
        ShaderStageFlags::VERTEX,
    )])?;
    let shadow_layout = gfx.pipeline_layout(&[shadow_set], None)?;
    log::info!("Shadow pipeline layout: {shadow_layout:?}");

    if let Err(e) = gfx.shader("missing.frag") {
        log::warn!("Expected failure: {e}");
    }

    if let Some(stats) = gfx.stats() {
        log::info!(
            "Arena: {} bytes free, shader hit ratio {:.0}%",
            stats.arena.free_bytes(),
            stats.shaders.hit_ratio() * 100.0
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("debug")).init();

    let config = load_config()?;
    let device = HeadlessDevice::new();
    let mut gfx = Gfx::init(config, Arc::new(device.clone()), shader_library())?;

    let result = run(&mut gfx);
    gfx.shutdown();

    for kind in ResourceKind::ALL {
        log::info!(
            "{kind}: {} created, {} destroyed",
            device.created(kind),
            device.destroyed(kind)
        );
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assembled_library_reflects_and_tears_down() -> Result<()> {
        let device = HeadlessDevice::new();
        let mut gfx = Gfx::init(
            GfxConfig::default(),
            Arc::new(device.clone()),
            shader_library(),
        )?;

        let vert = gfx.shader("mesh.vert")?;
        let frag = gfx.shader("mesh.frag")?;
        assert_eq!(vert.stages(), ShaderStageFlags::VERTEX);
        assert_eq!(frag.stages(), ShaderStageFlags::FRAGMENT);
        assert!(gfx.shader("legacy.bin")?.reflection.is_none());

        run(&mut gfx)?;
        gfx.shutdown();

        assert_eq!(device.created(ResourceKind::ShaderModule), 3);
        for kind in ResourceKind::ALL {
            assert_eq!(device.created(kind), device.destroyed(kind), "{kind}");
        }
        Ok(())
    }
}
