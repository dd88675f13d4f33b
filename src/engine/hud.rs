// On-screen text: painting card contents and the F3 stats panel

use egui::epaint::Shadow;

use crate::scene::Painting;

pub struct DebugStats {
    pub fps: u32,
    pub frame_time_avg_ms: f32,
    pub resolution: (u32, u32),
    pub camera_position: (f32, f32, f32),
    /// (yaw, pitch) in degrees
    pub camera_angles: (f32, f32),
    /// Raster value under the camera
    pub map_value: u8,
    pub content_index: usize,
    pub drawables: usize,
}

/// Text for the painting card. The GPU card quad is the backdrop;
/// this fills it in while it is on screen.
pub struct PaintingCard<'a> {
    pub painting: &'a Painting,
}

pub struct Hud {
    pub stats_visible: bool,
    egui_ctx: egui::Context,
    egui_state: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl Hud {
    pub fn new(
        window: &winit::window::Window,
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
    ) -> Self {
        let egui_ctx = egui::Context::default();

        // Style: dark, semi-transparent, small monospace white font
        let mut visuals = egui::Visuals::dark();
        visuals.window_fill = egui::Color32::from_rgba_premultiplied(0, 0, 0, 180);
        visuals.window_stroke = egui::Stroke::NONE;
        visuals.window_shadow = Shadow::NONE;
        visuals.override_text_color = Some(egui::Color32::WHITE);
        egui_ctx.set_visuals(visuals);

        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );

        let egui_renderer = egui_wgpu::Renderer::new(
            device,
            surface_format,
            None,  // no depth
            1,     // msaa samples
            false, // no dithering
        );

        Self {
            stats_visible: false,
            egui_ctx,
            egui_state,
            egui_renderer,
        }
    }

    pub fn toggle_stats(&mut self) {
        self.stats_visible = !self.stats_visible;
    }

    pub fn handle_window_event(
        &mut self,
        window: &winit::window::Window,
        event: &winit::event::WindowEvent,
    ) -> egui_winit::EventResponse {
        self.egui_state.on_window_event(window, event)
    }

    /// Render one egui frame:
    ///
    /// - `card`  — painting text, centred over the card quad (`None` = hidden).
    /// - `stats` — F3 stats panel (`None` = hidden).
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        window: &winit::window::Window,
        view: &wgpu::TextureView,
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
        stats: Option<&DebugStats>,
        card: Option<&PaintingCard<'_>>,
    ) {
        let raw_input = self.egui_state.take_egui_input(window);

        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            if let Some(card) = card {
                egui::Area::new(egui::Id::new("painting_card"))
                    .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
                    .show(ctx, |ui| {
                        ui.set_max_width(ctx.screen_rect().width() * 0.6);
                        ui.vertical_centered(|ui| {
                            ui.label(
                                egui::RichText::new(&card.painting.title)
                                    .size(28.0)
                                    .strong(),
                            );
                            ui.label(
                                egui::RichText::new(format!(
                                    "{}, {}",
                                    card.painting.artist, card.painting.year
                                ))
                                .size(18.0)
                                .italics(),
                            );
                            ui.add_space(12.0);
                            ui.label(egui::RichText::new(&card.painting.description).size(16.0));
                        });
                    });
            }

            // ── F3: stats panel ──────────────────────────────────────────────
            if let Some(stats) = stats {
                egui::Area::new(egui::Id::new("debug_overlay"))
                    .fixed_pos(egui::pos2(10.0, 10.0))
                    .show(ctx, |ui| {
                        egui::Frame::none()
                            .fill(egui::Color32::from_rgba_premultiplied(0, 0, 0, 180))
                            .inner_margin(egui::Margin::same(8.0))
                            .rounding(4.0)
                            .show(ui, |ui: &mut egui::Ui| {
                                ui.style_mut().override_font_id = Some(egui::FontId::monospace(13.0));
                                ui.label(format!("FPS: {}", stats.fps));
                                ui.label(format!("Frame: {:.2} ms", stats.frame_time_avg_ms));
                                ui.label(format!(
                                    "Resolution: {} x {}",
                                    stats.resolution.0, stats.resolution.1
                                ));
                                ui.label(format!(
                                    "Camera: ({:.2}, {:.2}, {:.2})  yaw {:.0}  pitch {:.0}",
                                    stats.camera_position.0,
                                    stats.camera_position.1,
                                    stats.camera_position.2,
                                    stats.camera_angles.0,
                                    stats.camera_angles.1,
                                ));
                                ui.label(format!(
                                    "Map value: {}  Content: {}",
                                    stats.map_value, stats.content_index
                                ));
                                ui.label(format!("Drawables: {}", stats.drawables));
                            });
                    });
            }
        });

        self.egui_state
            .handle_platform_output(window, full_output.platform_output);

        let tris = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui_renderer
                .update_texture(device, queue, *id, image_delta);
        }

        self.egui_renderer
            .update_buffers(device, queue, encoder, &tris, screen_descriptor);

        {
            let render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("egui Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            self.egui_renderer
                .render(&mut render_pass.forget_lifetime(), &tris, screen_descriptor);
        }

        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }
}
