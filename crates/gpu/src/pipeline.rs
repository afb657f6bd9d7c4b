use std::borrow::Cow;

use tracing::info;

use crate::error::{GpuError, ShaderStage};
use crate::shaders::{self, ShaderSource};
use crate::textures::DEPTH_FORMAT;

/// Runs `build` inside a validation error scope so a broken shader or
/// pipeline becomes a `GpuError` instead of an uncaptured device error.
fn validated<T>(
    device: &wgpu::Device,
    stage: ShaderStage,
    label: &str,
    build: impl FnOnce() -> T,
) -> Result<T, GpuError> {
    let scope = device.push_error_scope(wgpu::ErrorFilter::Validation);
    let value = build();
    match pollster::block_on(scope.pop()) {
        None => Ok(value),
        Some(err) => Err(GpuError::ShaderCompile {
            stage,
            module: label.to_string(),
            message: err.to_string(),
        }),
    }
}

pub fn compile_module(
    device: &wgpu::Device,
    source: &ShaderSource,
) -> Result<wgpu::ShaderModule, GpuError> {
    validated(device, source.stage, source.label, || {
        device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(source.label),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(source.wgsl.as_str())),
        })
    })
}

fn storage_entry(
    binding: u32,
    visibility: wgpu::ShaderStages,
    read_only: bool,
) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn texture_entry(
    binding: u32,
    visibility: wgpu::ShaderStages,
    filterable: bool,
) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

/// Compute pipelines for tessellation control and the render pipeline for
/// evaluation plus shading.
#[derive(Debug)]
pub struct TerrainPipelines {
    pub compute_layout: wgpu::BindGroupLayout,
    pub render_layout: wgpu::BindGroupLayout,
    pub control: wgpu::ComputePipeline,
    pub finalize: wgpu::ComputePipeline,
    pub render: wgpu::RenderPipeline,
}

impl TerrainPipelines {
    pub fn new(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
    ) -> Result<Self, GpuError> {
        let control_module = compile_module(device, &shaders::tess_control())?;
        let evaluation_module = compile_module(device, &shaders::tess_evaluation())?;
        let fragment_module = compile_module(device, &shaders::fragment())?;

        let compute = wgpu::ShaderStages::COMPUTE;
        let compute_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("terrain-control-bgl"),
            entries: &[
                uniform_entry(0, compute),
                texture_entry(1, compute, false),
                storage_entry(2, compute, true),
                storage_entry(3, compute, false),
                storage_entry(4, compute, false),
                storage_entry(5, compute, false),
                storage_entry(6, compute, false),
            ],
        });

        let vertex = wgpu::ShaderStages::VERTEX;
        let fragment = wgpu::ShaderStages::FRAGMENT;
        let render_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("terrain-render-bgl"),
            entries: &[
                uniform_entry(0, wgpu::ShaderStages::VERTEX_FRAGMENT),
                texture_entry(1, vertex, false),
                storage_entry(2, vertex, true),
                storage_entry(3, vertex, true),
                storage_entry(4, vertex, true),
                wgpu::BindGroupLayoutEntry {
                    binding: 5,
                    visibility: fragment,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                texture_entry(6, fragment, true),
                texture_entry(7, fragment, true),
                texture_entry(8, fragment, true),
            ],
        });

        let compute_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("terrain-control-pipeline-layout"),
                bind_group_layouts: &[&compute_layout],
                immediate_size: 0,
            });
        let render_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("terrain-render-pipeline-layout"),
                bind_group_layouts: &[&render_layout],
                immediate_size: 0,
            });

        let compute_pipeline = |label: &str, entry_point: &str| {
            validated(device, ShaderStage::TessControl, label, || {
                device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                    label: Some(label),
                    layout: Some(&compute_pipeline_layout),
                    module: &control_module,
                    entry_point: Some(entry_point),
                    compilation_options: Default::default(),
                    cache: None,
                })
            })
        };
        let control = compute_pipeline("terrain-tess-control", "tess_control")?;
        let finalize = compute_pipeline("terrain-finalize-draw", "finalize_draw")?;

        let render_label = "terrain-render-pipeline";
        let render = validated(device, ShaderStage::TessEvaluation, render_label, || {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(render_label),
                layout: Some(&render_pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &evaluation_module,
                    entry_point: Some("vs_main"),
                    compilation_options: Default::default(),
                    buffers: &[],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &fragment_module,
                    entry_point: Some("fs_main"),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: color_format,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    // Negative scales mirror the terrain, which flips winding.
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            })
        })?;

        info!(?color_format, "terrain pipelines built");
        Ok(Self {
            compute_layout,
            render_layout,
            control,
            finalize,
            render,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{TerrainPipelines, compile_module};
    use crate::error::{GpuError, ShaderStage};
    use crate::shaders::{self, ShaderSource};

    fn device() -> wgpu::Device {
        let (device, _queue) = wgpu::Device::noop(&wgpu::DeviceDescriptor::default());
        device
    }

    #[test]
    fn broken_wgsl_reports_stage_and_module() {
        let device = device();
        let source = ShaderSource {
            stage: ShaderStage::Fragment,
            label: "broken-fragment",
            wgsl: "@fragment fn fs_main() -> @location(0) vec4<f32> { return undefined_value; }"
                .to_string(),
        };

        match compile_module(&device, &source) {
            Err(GpuError::ShaderCompile { stage, module, message }) => {
                assert_eq!(stage, ShaderStage::Fragment);
                assert_eq!(module, "broken-fragment");
                assert!(!message.is_empty());
            }
            other => panic!("expected a shader compile error, got {other:?}"),
        }
    }

    #[test]
    fn terrain_sources_compile() {
        let device = device();
        for source in [
            shaders::tess_control(),
            shaders::tess_evaluation(),
            shaders::fragment(),
        ] {
            if let Err(err) = compile_module(&device, &source) {
                panic!("{}: {err}", source.label);
            }
        }
    }

    #[test]
    fn pipelines_build_against_their_layouts() {
        let device = device();
        TerrainPipelines::new(&device, wgpu::TextureFormat::Bgra8UnormSrgb)
            .expect("terrain pipelines");
    }
}
