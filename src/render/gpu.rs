use crate::foundation::error::{SeqError, SeqResult};
use crate::render::backend::{
    FrameBackend, FrameRGBA, PaintRequest, RenderSettings, premul_clear, surface_dims,
};

const PARAMS_SIZE: u64 = 48;

const SHADER: &str = r#"
struct Params {
  // x, y, w, h of the placed image in surface pixels
  dest: vec4<f32>,
  // x0, y0, x1, y1 of the inset clip in surface pixels
  clip: vec4<f32>,
  // radius, surface width, surface height, clip enabled
  misc: vec4<f32>,
};

struct VsOut {
  @builtin(position) pos: vec4<f32>,
  @location(0) uv: vec2<f32>,
};

@group(0) @binding(0) var t_src: texture_2d<f32>;
@group(0) @binding(1) var s_src: sampler;
@group(0) @binding(2) var<uniform> params: Params;

@vertex
fn vs(@builtin(vertex_index) vi: u32) -> VsOut {
  var corners = array<vec2<f32>, 6>(
    vec2<f32>(0.0, 0.0),
    vec2<f32>(1.0, 0.0),
    vec2<f32>(0.0, 1.0),
    vec2<f32>(0.0, 1.0),
    vec2<f32>(1.0, 0.0),
    vec2<f32>(1.0, 1.0),
  );
  let c = corners[vi];
  let px = params.dest.xy + c * params.dest.zw;
  let ndc = vec2<f32>(
    px.x / params.misc.y * 2.0 - 1.0,
    1.0 - px.y / params.misc.z * 2.0,
  );
  var o: VsOut;
  o.pos = vec4<f32>(ndc, 0.0, 1.0);
  o.uv = c;
  return o;
}

fn rounded_box_sdf(p: vec2<f32>, half: vec2<f32>, r: f32) -> f32 {
  let q = abs(p) - half + vec2<f32>(r, r);
  return length(max(q, vec2<f32>(0.0, 0.0))) + min(max(q.x, q.y), 0.0) - r;
}

@fragment
fn fs(in: VsOut) -> @location(0) vec4<f32> {
  let c = textureSample(t_src, s_src, in.uv);
  if (params.misc.w > 0.5) {
    let lo = params.clip.xy;
    let hi = params.clip.zw;
    let d = rounded_box_sdf(in.pos.xy - (lo + hi) * 0.5, (hi - lo) * 0.5, params.misc.x);
    if (d > 0.0) {
      discard;
    }
  }
  return c;
}
"#;

struct Pipeline {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    params: wgpu::Buffer,
}

struct Target {
    width: u32,
    height: u32,
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    readback: wgpu::Buffer,
    readback_bytes_per_row: u32,
}

/// Hardware surface. Each paint uploads the frame into a fresh texture that is destroyed as soon
/// as the draw is submitted.
pub struct GpuBackend {
    settings: RenderSettings,
    device: wgpu::Device,
    queue: wgpu::Queue,
    pipeline: Pipeline,
    target: Target,
    live_textures: usize,
}

impl GpuBackend {
    pub fn new(settings: RenderSettings, width: u32, height: u32) -> SeqResult<Self> {
        surface_dims(width, height)?;

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .map_err(|e| match e {
            wgpu::RequestAdapterError::NotFound { .. } => {
                SeqError::backend("no gpu adapter available")
            }
            other => SeqError::backend(format!("wgpu request_adapter failed: {other:?}")),
        })?;

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("framescrub_device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            experimental_features: wgpu::ExperimentalFeatures::default(),
            memory_hints: wgpu::MemoryHints::Performance,
            trace: wgpu::Trace::Off,
        }))
        .map_err(|e| SeqError::backend(format!("wgpu request_device failed: {e:?}")))?;

        let pipeline = create_pipeline(&device);
        let target = create_target(&device, width, height)?;
        tracing::debug!(width, height, "gpu backend ready");

        let mut backend = Self {
            settings,
            device,
            queue,
            pipeline,
            target,
            live_textures: 0,
        };
        backend.clear()?;
        Ok(backend)
    }

    fn clear_color(&self) -> wgpu::Color {
        let [r, g, b, a] = premul_clear(&self.settings);
        wgpu::Color {
            r: f64::from(r) / 255.0,
            g: f64::from(g) / 255.0,
            b: f64::from(b) / 255.0,
            a: f64::from(a) / 255.0,
        }
    }

    fn upload(&mut self, rgba8_premul: &[u8], width: u32, height: u32) -> SeqResult<wgpu::Texture> {
        if rgba8_premul.len() != width as usize * height as usize * 4 {
            return Err(SeqError::backend("decoded frame byte length mismatch"));
        }
        check_texture_size(
            "frame",
            width,
            height,
            self.device.limits().max_texture_dimension_2d,
        )?;
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("framescrub_frame"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        self.live_textures += 1;
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            rgba8_premul,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width * 4),
                rows_per_image: Some(height),
            },
            size,
        );
        Ok(texture)
    }

    fn release(&mut self, texture: wgpu::Texture) {
        texture.destroy();
        self.live_textures = self.live_textures.saturating_sub(1);
    }
}

impl FrameBackend for GpuBackend {
    fn size(&self) -> (u32, u32) {
        (self.target.width, self.target.height)
    }

    fn resize(&mut self, width: u32, height: u32) -> SeqResult<()> {
        surface_dims(width, height)?;
        if (width, height) != (self.target.width, self.target.height) {
            self.target.texture.destroy();
            self.target = create_target(&self.device, width, height)?;
        }
        self.clear()
    }

    fn paint(&mut self, req: PaintRequest<'_>) -> SeqResult<()> {
        let frame = req.frame;
        let texture = self.upload(frame.data(), frame.width, frame.height)?;
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let dest = req.placement.dest_rect();
        let (clip_rect, radius, clip_on) = match req.clip {
            Some(rr) => (rr.rect(), rr.radii().top_left, 1.0f32),
            None => (dest, 0.0, 0.0),
        };
        let values: [f32; 12] = [
            dest.x0 as f32,
            dest.y0 as f32,
            dest.width() as f32,
            dest.height() as f32,
            clip_rect.x0 as f32,
            clip_rect.y0 as f32,
            clip_rect.x1 as f32,
            clip_rect.y1 as f32,
            radius as f32,
            self.target.width as f32,
            self.target.height as f32,
            clip_on,
        ];
        let mut params = [0u8; PARAMS_SIZE as usize];
        for (chunk, v) in params.chunks_exact_mut(4).zip(values) {
            chunk.copy_from_slice(&v.to_le_bytes());
        }
        self.queue.write_buffer(&self.pipeline.params, 0, &params);

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("framescrub_frame_bg"),
            layout: &self.pipeline.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.pipeline.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: self.pipeline.params.as_entire_binding(),
                },
            ],
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("framescrub_paint_encoder"),
            });
        {
            let mut rp = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("framescrub_paint_rp"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.target.view,
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color()),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            if let Some((x, y, w, h)) = scissor(clip_rect, self.target.width, self.target.height) {
                rp.set_scissor_rect(x, y, w, h);
                rp.set_pipeline(&self.pipeline.pipeline);
                rp.set_bind_group(0, &bind_group, &[]);
                rp.draw(0..6, 0..1);
            }
        }
        self.queue.submit(Some(encoder.finish()));

        drop(bind_group);
        drop(view);
        self.release(texture);
        Ok(())
    }

    fn clear(&mut self) -> SeqResult<()> {
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("framescrub_clear_encoder"),
            });
        {
            let _rp = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("framescrub_clear_rp"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.target.view,
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color()),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
        }
        self.queue.submit(Some(encoder.finish()));
        Ok(())
    }

    fn snapshot(&mut self) -> SeqResult<FrameRGBA> {
        let target = &self.target;
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("framescrub_readback_encoder"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &target.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &target.readback,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(target.readback_bytes_per_row),
                    rows_per_image: Some(target.height),
                },
            },
            wgpu::Extent3d {
                width: target.width,
                height: target.height,
                depth_or_array_layers: 1,
            },
        );
        self.queue.submit(Some(encoder.finish()));

        let buffer_slice = target.readback.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |res| {
            let _ = tx.send(res);
        });
        self.device
            .poll(wgpu::PollType::wait_indefinitely())
            .map_err(|e| SeqError::backend(format!("wgpu poll failed: {e:?}")))?;
        rx.recv()
            .map_err(|_| SeqError::backend("readback channel closed"))?
            .map_err(|e| SeqError::backend(format!("readback map failed: {e:?}")))?;

        let mapped = buffer_slice.get_mapped_range();
        let row_bytes = target.width as usize * 4;
        let padded_row_bytes = target.readback_bytes_per_row as usize;
        let mut out = Vec::with_capacity(row_bytes * target.height as usize);
        for row in 0..target.height as usize {
            let start = row * padded_row_bytes;
            out.extend_from_slice(&mapped[start..start + row_bytes]);
        }
        drop(mapped);
        target.readback.unmap();

        Ok(FrameRGBA {
            width: target.width,
            height: target.height,
            data: out,
            premultiplied: true,
        })
    }

    fn live_textures(&self) -> usize {
        self.live_textures
    }
}

fn create_pipeline(device: &wgpu::Device) -> Pipeline {
    let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("framescrub_frame_sampler"),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Nearest,
        ..Default::default()
    });

    let params = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("framescrub_frame_params"),
        size: PARAMS_SIZE,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("framescrub_frame_bgl"),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(PARAMS_SIZE),
                },
                count: None,
            },
        ],
    });

    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("framescrub_frame_shader"),
        source: wgpu::ShaderSource::Wgsl(SHADER.into()),
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("framescrub_frame_pl"),
        bind_group_layouts: &[&bind_group_layout],
        push_constant_ranges: &[],
    });

    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("framescrub_frame_pipeline"),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            buffers: &[],
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: wgpu::TextureFormat::Rgba8Unorm,
                blend: Some(wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState::default(),
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    });

    Pipeline {
        pipeline,
        bind_group_layout,
        sampler,
        params,
    }
}

fn create_target(device: &wgpu::Device, width: u32, height: u32) -> SeqResult<Target> {
    check_texture_size(
        "render target",
        width,
        height,
        device.limits().max_texture_dimension_2d,
    )?;
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("framescrub_surface"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8Unorm,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

    let bytes_per_row_unpadded = width
        .checked_mul(4)
        .ok_or_else(|| SeqError::backend("render target width overflow"))?;
    let readback_bytes_per_row = align_to(bytes_per_row_unpadded, wgpu::COPY_BYTES_PER_ROW_ALIGNMENT);
    let buffer_size = u64::from(readback_bytes_per_row)
        .checked_mul(u64::from(height))
        .ok_or_else(|| SeqError::backend("readback buffer size overflow"))?;
    let readback = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("framescrub_readback"),
        size: buffer_size,
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    Ok(Target {
        width,
        height,
        texture,
        view,
        readback,
        readback_bytes_per_row,
    })
}

/// wgpu panics on textures past the device limit, so reject them up front.
fn check_texture_size(what: &str, width: u32, height: u32, max_dim: u32) -> SeqResult<()> {
    if width == 0 || height == 0 || width > max_dim || height > max_dim {
        return Err(SeqError::backend(format!(
            "{what} size {width}x{height} outside device texture limit {max_dim}"
        )));
    }
    Ok(())
}

/// Clamp the clip rect to the surface. `None` when nothing would be visible.
fn scissor(rect: kurbo::Rect, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
    let x0 = rect.x0.floor().clamp(0.0, f64::from(width)) as u32;
    let y0 = rect.y0.floor().clamp(0.0, f64::from(height)) as u32;
    let x1 = rect.x1.ceil().clamp(0.0, f64::from(width)) as u32;
    let y1 = rect.y1.ceil().clamp(0.0, f64::from(height)) as u32;
    (x1 > x0 && y1 > y0).then(|| (x0, y0, x1 - x0, y1 - y0))
}

fn align_to(value: u32, alignment: u32) -> u32 {
    let mask = alignment - 1;
    (value + mask) & !mask
}
