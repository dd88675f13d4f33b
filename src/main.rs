// First-person museum walkthrough
// Window + GPU shell around engine::Walkthrough: feeds it input snapshots,
// uploads the FrameUniforms it publishes, and forwards its events to audio

mod engine;
mod scene;

use std::path::PathBuf;
use std::time::Instant;

use winit::{
    event::{Event as WinitEvent, WindowEvent, ElementState, KeyEvent},
    event_loop::EventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::Window,
};
use wgpu::util::DeviceExt;

use engine::hud::{DebugStats, Hud, PaintingCard};
use engine::mesh::{card_quad, unit_box, GpuVertex, RenderMesh};
use engine::uniforms::{CardUniforms, EntityUniforms};
use engine::walkthrough::FrameOutput;
use engine::{
    dispatch_events, load_scene, AudioSink, FrameClock, InputState, LoggingAudio, RodioAudio,
    UniformSink, UniformTarget, Viewport, Walkthrough,
};
use scene::SceneConfig;

const DEFAULT_SCENE: &str = "assets/museum.ron";
const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

// ============================================================================
// GPU RESOURCES
// ============================================================================

struct MeshBuffers {
    vertex: wgpu::Buffer,
    index: wgpu::Buffer,
    index_count: u32,
}

impl MeshBuffers {
    fn upload(device: &wgpu::Device, mesh: &RenderMesh, label: &str) -> Self {
        let vertex = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Vertex Buffer", label)),
            contents: mesh.vertex_bytes(),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Index Buffer", label)),
            contents: mesh.index_bytes(),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self { vertex, index, index_count: mesh.index_count() as u32 }
    }
}

/// One uniform buffer plus the bind group that exposes it at binding 0.
struct UniformSlot {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl UniformSlot {
    fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, size: usize, label: &str) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: size as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some(label),
        });
        Self { buffer, bind_group }
    }
}

/// Renderer side of the uniform boundary: writes straight into the queue.
struct QueueUploader<'a> {
    queue: &'a wgpu::Queue,
    drawables: &'a [UniformSlot],
    card: &'a UniformSlot,
}

impl UniformSink for QueueUploader<'_> {
    fn upload(&mut self, target: UniformTarget, bytes: &[u8]) {
        let slot = match target {
            UniformTarget::Drawable(i) => match self.drawables.get(i) {
                Some(slot) => slot,
                None => return,
            },
            UniformTarget::Card => self.card,
        };
        self.queue.write_buffer(&slot.buffer, 0, bytes);
    }
}

fn uniform_layout(device: &wgpu::Device, visibility: wgpu::ShaderStages, label: &str) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
        label: Some(label),
    })
}

struct PipelineSpec<'a> {
    label: &'a str,
    shader: &'a wgpu::ShaderModule,
    layout: &'a wgpu::BindGroupLayout,
    blend: wgpu::BlendState,
    cull_mode: Option<wgpu::Face>,
    depth_write: bool,
    depth_compare: wgpu::CompareFunction,
}

fn create_pipeline(device: &wgpu::Device, format: wgpu::TextureFormat, spec: &PipelineSpec<'_>) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(spec.label),
        bind_group_layouts: &[spec.layout],
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(spec.label),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: spec.shader,
            entry_point: Some("vs_main"),
            buffers: &[GpuVertex::desc()],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: spec.shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(spec.blend),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: spec.cull_mode,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: spec.depth_write,
            depth_compare: spec.depth_compare,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview: None,
        cache: None,
    })
}

fn create_depth_view(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

// ============================================================================
// APPLICATION STATE
// ============================================================================

struct State {
    window: std::sync::Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    size: winit::dpi::PhysicalSize<u32>,
    /// Last reported size, possibly degenerate while minimised.
    viewport: Viewport,
    depth_view: wgpu::TextureView,

    scene_pipeline: wgpu::RenderPipeline,
    card_pipeline: wgpu::RenderPipeline,
    box_mesh: MeshBuffers,
    card_mesh: MeshBuffers,
    drawable_slots: Vec<UniformSlot>,
    card_slot: UniformSlot,
    hud: Hud,

    // Simulation
    scene: SceneConfig,
    walkthrough: Walkthrough,
    input: InputState,
    clock: FrameClock,
    audio: Box<dyn AudioSink>,
    last_frame_ms: f32,
}

impl State {
    async fn new(window: std::sync::Arc<Window>, scene: SceneConfig, walkthrough: Walkthrough) -> Self {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .expect("failed to create surface");

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .expect("no compatible GPU adapter");

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: None,
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::default(),
                },
                None,
            )
            .await
            .expect("failed to open GPU device");

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps.present_modes[0],
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        surface.configure(&device, &config);
        let depth_view = create_depth_view(&device, config.width, config.height);

        let scene_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Scene Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("scene.wgsl").into()),
        });
        let card_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Card Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("card.wgsl").into()),
        });

        let scene_layout = uniform_layout(&device, wgpu::ShaderStages::VERTEX, "scene_bind_group_layout");
        let card_layout = uniform_layout(
            &device,
            wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            "card_bind_group_layout",
        );

        let scene_pipeline = create_pipeline(&device, config.format, &PipelineSpec {
            label: "Scene Pipeline",
            shader: &scene_shader,
            layout: &scene_layout,
            blend: wgpu::BlendState::REPLACE,
            cull_mode: Some(wgpu::Face::Back),
            depth_write: true,
            depth_compare: wgpu::CompareFunction::Less,
        });
        // Card draws over everything and never writes depth.
        let card_pipeline = create_pipeline(&device, config.format, &PipelineSpec {
            label: "Card Pipeline",
            shader: &card_shader,
            layout: &card_layout,
            blend: wgpu::BlendState::ALPHA_BLENDING,
            cull_mode: None,
            depth_write: false,
            depth_compare: wgpu::CompareFunction::Always,
        });

        let box_mesh = MeshBuffers::upload(&device, &unit_box(), "Box");
        let card_mesh = MeshBuffers::upload(&device, &card_quad(), "Card");

        let drawable_slots = (0..walkthrough.drawable_count())
            .map(|i| {
                UniformSlot::new(
                    &device,
                    &scene_layout,
                    std::mem::size_of::<EntityUniforms>(),
                    &format!("drawable_uniforms_{}", i),
                )
            })
            .collect();
        let card_slot = UniformSlot::new(
            &device,
            &card_layout,
            std::mem::size_of::<CardUniforms>(),
            "card_uniforms",
        );

        let hud = Hud::new(&window, &device, config.format);

        let mut audio: Box<dyn AudioSink> = match RodioAudio::new(&scene.audio) {
            Ok(audio) => Box::new(audio),
            Err(e) => {
                log::warn!("Couldn't open audio device: {}", e);
                Box::new(LoggingAudio::new(&scene.audio))
            }
        };
        audio.play_music(0);

        Self {
            window,
            surface,
            device,
            queue,
            config,
            size,
            viewport: Viewport::new(size.width, size.height),
            depth_view,
            scene_pipeline,
            card_pipeline,
            box_mesh,
            card_mesh,
            drawable_slots,
            card_slot,
            hud,
            scene,
            walkthrough,
            input: InputState::new(),
            clock: FrameClock::new(),
            audio,
            last_frame_ms: 0.0,
        }
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        self.viewport = Viewport::new(new_size.width, new_size.height);
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.depth_view = create_depth_view(&self.device, new_size.width, new_size.height);
            log::info!("Resized to {}x{}", new_size.width, new_size.height);
        }
    }

    fn update(&mut self) -> FrameOutput {
        let dt = self.clock.tick(Instant::now());
        self.last_frame_ms = dt * 1000.0;

        let snapshot = self.input.snapshot();
        let output = self.walkthrough.step(&snapshot, self.viewport, dt);
        dispatch_events(&output.events, self.audio.as_mut(), &self.scene.audio);
        output
    }

    fn render(&mut self, frame: &FrameOutput, fps: u32) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        // Write all uniforms BEFORE creating the render pass
        frame.uniforms.upload_to(&mut QueueUploader {
            queue: &self.queue,
            drawables: &self.drawable_slots,
            card: &self.card_slot,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.0,
                            g: 0.0,
                            b: 0.0,
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
            });

            render_pass.set_pipeline(&self.scene_pipeline);
            render_pass.set_vertex_buffer(0, self.box_mesh.vertex.slice(..));
            render_pass.set_index_buffer(self.box_mesh.index.slice(..), wgpu::IndexFormat::Uint32);
            for slot in &self.drawable_slots {
                render_pass.set_bind_group(0, &slot.bind_group, &[]);
                render_pass.draw_indexed(0..self.box_mesh.index_count, 0, 0..1);
            }

            render_pass.set_pipeline(&self.card_pipeline);
            render_pass.set_bind_group(0, &self.card_slot.bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.card_mesh.vertex.slice(..));
            render_pass.set_index_buffer(self.card_mesh.index.slice(..), wgpu::IndexFormat::Uint32);
            render_pass.draw_indexed(0..self.card_mesh.index_count, 0, 0..1);
        }

        let camera = *self.walkthrough.camera();
        let stats = self.hud.stats_visible.then(|| DebugStats {
            fps,
            frame_time_avg_ms: self.last_frame_ms,
            resolution: (self.size.width, self.size.height),
            camera_position: camera.position.into(),
            camera_angles: (camera.yaw().to_degrees(), camera.pitch().to_degrees()),
            map_value: self.walkthrough.sample_under_camera(),
            content_index: frame.overlay.content_index,
            drawables: self.walkthrough.drawable_count(),
        });

        let painting = if frame.overlay.visible {
            let found = self.scene.paintings.get(frame.overlay.content_index);
            if found.is_none() {
                log::warn!("no painting for content index {}", frame.overlay.content_index);
            }
            found
        } else {
            None
        };
        let card = painting.map(|painting| PaintingCard { painting });

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: self.window.scale_factor() as f32,
        };
        self.hud.render(
            &self.device,
            &self.queue,
            &mut encoder,
            &self.window,
            &view,
            &screen_descriptor,
            stats.as_ref(),
            card.as_ref(),
        );

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

// ============================================================================
// MAIN
// ============================================================================

fn main() {
    env_logger::init();

    let scene_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SCENE));

    // Without navigation bounds there is nothing to walk through.
    let (scene, walkthrough) = match load_scene(&scene_path) {
        Ok(loaded) => loaded,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    };

    let event_loop = EventLoop::new().expect("failed to create event loop");

    let window_attributes = Window::default_attributes()
        .with_title("Museum Walkthrough")
        .with_inner_size(winit::dpi::PhysicalSize::new(1700, 1200));

    let window = std::sync::Arc::new(
        event_loop
            .create_window(window_attributes)
            .expect("failed to create window"),
    );

    let mut state = pollster::block_on(State::new(window.clone(), scene, walkthrough));
    let mut frame_count = 0;
    let mut fps = 0;
    let mut last_fps_update = Instant::now();

    let result = event_loop.run(move |event, control_flow| {
        match event {
            WinitEvent::WindowEvent {
                ref event,
                window_id,
            } if window_id == window.id() => {
                let _ = state.hud.handle_window_event(&window, event);
                state.input.process_event(event);

                match event {
                    WindowEvent::CloseRequested
                    | WindowEvent::KeyboardInput {
                        event:
                            KeyEvent {
                                state: ElementState::Pressed,
                                physical_key: PhysicalKey::Code(KeyCode::Escape),
                                ..
                            },
                        ..
                    } => control_flow.exit(),
                    WindowEvent::KeyboardInput {
                        event:
                            KeyEvent {
                                state: ElementState::Pressed,
                                physical_key: PhysicalKey::Code(KeyCode::F3),
                                repeat: false,
                                ..
                            },
                        ..
                    } => state.hud.toggle_stats(),
                    WindowEvent::Resized(physical_size) => {
                        state.resize(*physical_size);
                    }
                    WindowEvent::RedrawRequested => {
                        let frame = state.update();
                        match state.render(&frame, fps) {
                            Ok(_) => {}
                            Err(wgpu::SurfaceError::Lost) => state.resize(state.size),
                            Err(wgpu::SurfaceError::OutOfMemory) => control_flow.exit(),
                            Err(e) => log::warn!("{:?}", e),
                        }

                        frame_count += 1;
                        let now = Instant::now();
                        if (now - last_fps_update).as_secs_f32() >= 1.0 {
                            fps = frame_count;
                            log::debug!("FPS: {}", fps);
                            frame_count = 0;
                            last_fps_update = now;
                        }
                    }
                    _ => {}
                }
            }
            WinitEvent::AboutToWait => {
                window.request_redraw();
            }
            _ => {}
        }
    });

    if let Err(e) = result {
        log::error!("event loop error: {}", e);
        std::process::exit(1);
    }
}
