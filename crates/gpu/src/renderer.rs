use std::sync::mpsc;

use glam::UVec2;
use terrain::{FrameUniforms, HeightMap, MaterialLayers, PatchGrid};
use tracing::{debug, warn};

use crate::buffers::{CellCounter, Globals, TerrainBuffers};
use crate::error::GpuError;
use crate::pipeline::TerrainPipelines;
use crate::shaders::control_workgroups;
use crate::textures::{MaterialTextures, create_depth_view, upload_height_map};

type MapResult = Result<(), wgpu::BufferAsyncError>;

/// Counter readback that never stalls the frame: a copy is only issued when
/// the previous one has been consumed.
#[derive(Debug)]
struct CounterReadback {
    sender: mpsc::Sender<MapResult>,
    receiver: mpsc::Receiver<MapResult>,
    in_flight: bool,
    last: Option<CellCounter>,
}

impl CounterReadback {
    fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            sender,
            receiver,
            in_flight: false,
            last: None,
        }
    }

    fn collect(&mut self, buffer: &wgpu::Buffer) {
        if !self.in_flight {
            return;
        }
        match self.receiver.try_recv() {
            Ok(Ok(())) => {
                let counter = {
                    let bytes = buffer.slice(..).get_mapped_range();
                    *bytemuck::from_bytes::<CellCounter>(&bytes)
                };
                buffer.unmap();
                self.in_flight = false;
                if counter.overflowed_patches > 0 {
                    warn!(
                        cells = counter.cells,
                        overflowed_patches = counter.overflowed_patches,
                        "cell buffer full; some patches were dropped"
                    );
                }
                self.last = Some(counter);
            }
            Ok(Err(err)) => {
                warn!(error = %err, "cell counter readback failed");
                self.in_flight = false;
            }
            Err(mpsc::TryRecvError::Empty) => {}
            Err(mpsc::TryRecvError::Disconnected) => self.in_flight = false,
        }
    }

    fn request(&mut self, buffer: &wgpu::Buffer) {
        let sender = self.sender.clone();
        buffer
            .slice(..)
            .map_async(wgpu::MapMode::Read, move |result| {
                let _ = sender.send(result);
            });
        self.in_flight = true;
    }
}

/// CPU-side terrain data uploaded when the renderer is built.
#[derive(Debug, Copy, Clone)]
pub struct TerrainResources<'a> {
    pub height_map: &'a HeightMap,
    pub layers: &'a MaterialLayers,
    pub grid: &'a PatchGrid,
}

/// Bind groups for the control and render passes. Both reference the patch,
/// level and cell buffers, so they are rebuilt whenever those are replaced.
#[derive(Debug)]
struct BindGroups {
    compute: wgpu::BindGroup,
    render: wgpu::BindGroup,
}

impl BindGroups {
    fn new(
        device: &wgpu::Device,
        pipelines: &TerrainPipelines,
        buffers: &TerrainBuffers,
        height_view: &wgpu::TextureView,
        materials: &MaterialTextures,
    ) -> Self {
        let compute = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("terrain-control-bg"),
            layout: &pipelines.compute_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffers.globals.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(height_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: buffers.patches.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: buffers.levels.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: buffers.cells.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 5,
                    resource: buffers.counter.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 6,
                    resource: buffers.draw_args.as_entire_binding(),
                },
            ],
        });

        let render = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("terrain-render-bg"),
            layout: &pipelines.render_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffers.globals.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(height_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: buffers.patches.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: buffers.levels.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: buffers.cells.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 5,
                    resource: wgpu::BindingResource::Sampler(&materials.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 6,
                    resource: wgpu::BindingResource::TextureView(&materials.grass),
                },
                wgpu::BindGroupEntry {
                    binding: 7,
                    resource: wgpu::BindingResource::TextureView(&materials.rock),
                },
                wgpu::BindGroupEntry {
                    binding: 8,
                    resource: wgpu::BindingResource::TextureView(&materials.snow),
                },
            ],
        });

        Self { compute, render }
    }
}

/// GPU resources and per-frame submission for one terrain.
#[derive(Debug)]
pub struct TerrainRenderer {
    pipelines: TerrainPipelines,
    buffers: TerrainBuffers,
    height_view: wgpu::TextureView,
    materials: MaterialTextures,
    bind_groups: BindGroups,
    depth_view: wgpu::TextureView,
    depth_size: UVec2,
    map_size: UVec2,
    readback: CounterReadback,
}

impl TerrainRenderer {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        color_format: wgpu::TextureFormat,
        target_size: UVec2,
        resources: TerrainResources<'_>,
        cell_capacity: u32,
    ) -> Result<Self, GpuError> {
        let pipelines = TerrainPipelines::new(device, color_format)?;
        let buffers = TerrainBuffers::new(device, resources.grid, cell_capacity);
        let height_map = resources.height_map;
        let height_view = upload_height_map(device, queue, height_map);
        let materials = MaterialTextures::upload(device, queue, resources.layers);
        let bind_groups = BindGroups::new(device, &pipelines, &buffers, &height_view, &materials);

        debug!(
            patches = buffers.patch_count,
            cell_capacity = buffers.cell_capacity,
            "terrain renderer ready"
        );

        Ok(Self {
            pipelines,
            buffers,
            height_view,
            materials,
            bind_groups,
            depth_view: create_depth_view(device, target_size.x, target_size.y),
            depth_size: target_size.max(UVec2::ONE),
            map_size: UVec2::new(height_map.width(), height_map.height()),
            readback: CounterReadback::new(),
        })
    }

    /// Replaces the patch buffer with `grid`. The grid must have been built
    /// for the same height map; textures and pipelines are kept.
    pub fn rebuild_patches(&mut self, device: &wgpu::Device, grid: &PatchGrid) {
        self.buffers.replace_patches(device, grid);
        self.bind_groups = BindGroups::new(
            device,
            &self.pipelines,
            &self.buffers,
            &self.height_view,
            &self.materials,
        );
        debug!(
            patches = self.buffers.patch_count,
            cells_per_patch = grid.cells_per_patch(),
            "terrain patches rebuilt"
        );
    }

    pub fn patch_count(&self) -> u32 {
        self.buffers.patch_count
    }

    pub fn cell_capacity(&self) -> u32 {
        self.buffers.cell_capacity
    }

    /// Most recent counter values read back from the control stage. Lags the
    /// submitted frame by at least one frame.
    pub fn last_counter(&self) -> Option<CellCounter> {
        self.readback.last
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        let size = UVec2::new(width, height).max(UVec2::ONE);
        if size != self.depth_size {
            self.depth_view = create_depth_view(device, size.x, size.y);
            self.depth_size = size;
        }
    }

    /// Encodes and submits one frame: tessellation control, draw-argument
    /// finalisation, then the evaluation and fragment stages into `target`.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        target: &wgpu::TextureView,
        frame: &FrameUniforms,
    ) {
        self.readback.collect(&self.buffers.readback);

        let globals = Globals::from_frame(
            frame,
            self.map_size,
            self.buffers.patch_count,
            self.buffers.cell_capacity,
        );
        queue.write_buffer(&self.buffers.globals, 0, bytemuck::bytes_of(&globals));

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("terrain-frame-encoder"),
        });
        encoder.clear_buffer(&self.buffers.counter, 0, None);

        {
            let mut cpass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("terrain-tess-control"),
                timestamp_writes: None,
            });
            cpass.set_bind_group(0, &self.bind_groups.compute, &[]);
            cpass.set_pipeline(&self.pipelines.control);
            cpass.dispatch_workgroups(control_workgroups(self.buffers.patch_count), 1, 1);
            cpass.set_pipeline(&self.pipelines.finalize);
            cpass.dispatch_workgroups(1, 1, 1);
        }

        let fog = frame.shading.fog_color;
        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("terrain-render-pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: fog[0] as f64,
                            g: fog[1] as f64,
                            b: fog[2] as f64,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
                multiview_mask: None,
            });
            rpass.set_pipeline(&self.pipelines.render);
            rpass.set_bind_group(0, &self.bind_groups.render, &[]);
            rpass.draw_indirect(&self.buffers.draw_args, 0);
        }

        let request_counter = !self.readback.in_flight;
        if request_counter {
            encoder.copy_buffer_to_buffer(
                &self.buffers.counter,
                0,
                &self.buffers.readback,
                0,
                std::mem::size_of::<CellCounter>() as u64,
            );
        }

        queue.submit(Some(encoder.finish()));

        if request_counter {
            self.readback.request(&self.buffers.readback);
        }
    }
}
