use eframe::egui::{self, ColorImage, TextureHandle, TextureOptions};

use crate::config::PlasmaConfig;
use crate::worker::RenderWorker;

// Logical surface size; the physical buffer is scaled by the pixel ratio.
const SURFACE_WIDTH: f32 = 480.0;
const SURFACE_HEIGHT: f32 = 270.0;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Preset {
    Classic,
    Monochrome,
    Custom,
}

pub struct PlasmaApp {
    worker: Option<RenderWorker>,
    worker_error: Option<String>,
    preset: Preset,
    custom: Option<PlasmaConfig>,
    texture: Option<TextureHandle>,
    frame: Vec<u8>,
}

impl PlasmaApp {
    pub fn new(cc: &eframe::CreationContext<'_>, custom: Option<PlasmaConfig>) -> Self {
        let mut app = Self {
            worker: None,
            worker_error: None,
            preset: if custom.is_some() {
                Preset::Custom
            } else {
                Preset::Classic
            },
            custom,
            texture: None,
            frame: Vec::new(),
        };
        app.start_session(cc.egui_ctx.pixels_per_point());
        app
    }

    fn active_config(&self) -> PlasmaConfig {
        match self.preset {
            Preset::Classic => PlasmaConfig::classic(),
            Preset::Monochrome => PlasmaConfig::monochrome(),
            Preset::Custom => self.custom.unwrap_or_else(PlasmaConfig::classic),
        }
    }

    fn start_session(&mut self, pixels_per_point: f32) {
        let dpr = if pixels_per_point.is_finite() && pixels_per_point > 0.0 {
            pixels_per_point
        } else {
            1.0
        };
        let width = (SURFACE_WIDTH * dpr) as u32;
        let height = (SURFACE_HEIGHT * dpr) as u32;

        // Tear down the previous session before starting the next one.
        self.worker = None;
        self.texture = None;

        match RenderWorker::start(self.active_config(), width, height, dpr) {
            Ok(worker) => {
                self.worker = Some(worker);
                self.worker_error = None;
            }
            Err(err) => {
                self.worker_error = Some(err.to_string());
            }
        }
    }

    fn update_texture(&mut self, ctx: &egui::Context) {
        let Some(worker) = &mut self.worker else {
            return;
        };
        if !worker.view.latest(&mut self.frame) {
            return;
        }

        let image = ColorImage::from_rgba_unmultiplied(
            [worker.width as usize, worker.height as usize],
            &self.frame,
        );

        if let Some(texture) = &mut self.texture {
            texture.set(image, TextureOptions::LINEAR);
        } else {
            self.texture = Some(ctx.load_texture("plasma", image, TextureOptions::LINEAR));
        }
    }

    fn draw_controls(&mut self, ui: &mut egui::Ui) {
        ui.heading("Plasma");

        let mut restart = false;
        restart |= ui
            .selectable_value(&mut self.preset, Preset::Classic, "Classic HSV")
            .clicked();
        restart |= ui
            .selectable_value(&mut self.preset, Preset::Monochrome, "Monochrome")
            .clicked();
        if self.custom.is_some() {
            restart |= ui
                .selectable_value(&mut self.preset, Preset::Custom, "Custom preset")
                .clicked();
        }

        ui.separator();
        if ui.button("Restart session").clicked() {
            restart = true;
        }
        if restart {
            let ppp = ui.ctx().pixels_per_point();
            self.start_session(ppp);
        }

        ui.separator();
        if let Some(worker) = &self.worker {
            ui.label(format!("Surface: {}x{}", worker.width, worker.height));
            ui.label(format!("Frames presented: {}", worker.view.presented()));
        } else if let Some(err) = &self.worker_error {
            ui.colored_label(
                egui::Color32::from_rgb(230, 100, 100),
                format!("Renderer offline: {err}"),
            );
        }
    }

    fn draw_visuals(&mut self, ui: &mut egui::Ui) {
        if let Some(texture) = &self.texture {
            let image_size = texture.size_vec2();
            let available = ui.available_size();
            let scale = (available.x / image_size.x)
                .min(available.y / image_size.y)
                .max(0.1);
            ui.centered_and_justified(|ui| {
                ui.image((texture.id(), image_size * scale));
            });
        }
    }
}

impl eframe::App for PlasmaApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.update_texture(ctx);

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(240.0)
            .show(ctx, |ui| {
                self.draw_controls(ui);
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.draw_visuals(ui);
        });

        ctx.request_repaint();
    }
}
