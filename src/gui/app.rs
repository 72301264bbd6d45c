use std::time::{Duration, Instant};
use eframe::egui;
use egui::load::SizedTexture;
use crate::backend::build_engines;
use crate::core::{
    AppConfig, CommandOutcome, CommandReceiver, DualEngineTransport, EngineState, FfprobeParser,
    MediaLoader, MediaSelection, PlayerWindow, RenderSurface, Session, TickReport, TickTimer,
};
use crate::gui::surface::surface_of;
use crate::hotkeys::HotkeyManager;
use crate::video::{FrameSlot, FrameUpdate};

/// The player window as the loader sees it while the app is being created.
struct CreationWindow<'a, 'b> {
    cc: &'a eframe::CreationContext<'b>,
}

impl PlayerWindow for CreationWindow<'_, '_> {
    fn set_title(&mut self, title: &str) {
        self.cc
            .egui_ctx
            .send_viewport_cmd(egui::ViewportCommand::Title(title.to_string()));
    }

    fn render_surface(&self) -> Option<RenderSurface> {
        surface_of(self.cc)
    }
}

fn state_label(state: EngineState) -> &'static str {
    match state {
        EngineState::Idle => "Idle",
        EngineState::Stopped => "Stopped",
        EngineState::Playing => "Playing",
        EngineState::Paused => "Paused",
        EngineState::Ended => "Ended",
        EngineState::Error => "Error",
    }
}

/// Right hand side of the status bar: engine states and the shared rate.
pub fn transport_summary(transport: &DualEngineTransport) -> String {
    let video = transport.video().state();
    let audio = transport.audio().state();
    let state = if video == audio {
        state_label(video).to_string()
    } else {
        format!("video {} / audio {}", state_label(video), state_label(audio))
    };
    format!("{}  {:.3}x", state, transport.rate())
}

pub struct SyncPlayerApp {
    pub session: Session,
    pub frames: FrameSlot,
    pub timer: TickTimer,
    pub last_report: Option<TickReport>,
    pub texture: Option<egui::TextureHandle>,
    pub hotkeys: Option<HotkeyManager>,
}

impl SyncPlayerApp {
    /// Build the engines, load the selected media into them and start the
    /// session. Loading happens here so the window title and native surface
    /// are available.
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        config: &AppConfig,
        selection: MediaSelection,
        commands: CommandReceiver,
        hotkeys: Option<HotkeyManager>,
    ) -> anyhow::Result<Self> {
        cc.egui_ctx.set_visuals(egui::Visuals::dark());

        let frames = FrameSlot::new();
        let (video, audio) = build_engines(config, frames.clone())?;
        let parser = FfprobeParser::new(config.ffprobe_command());
        let mut window = CreationWindow { cc };

        let loaded = MediaLoader::new(&parser).load(selection, video, audio, &mut window)?;
        let session = Session::start(loaded, commands);

        Ok(Self::with_session(session, frames, config.tick_interval(), hotkeys))
    }

    pub fn with_session(
        session: Session,
        frames: FrameSlot,
        tick_interval: Duration,
        hotkeys: Option<HotkeyManager>,
    ) -> Self {
        Self {
            session,
            frames,
            timer: TickTimer::new(tick_interval, Instant::now()),
            last_report: None,
            texture: None,
            hotkeys,
        }
    }

    /// Run the sync loop once if its period has elapsed.
    pub fn tick_if_due(&mut self, now: Instant) -> Option<&TickReport> {
        if !self.timer.poll(now) {
            return None;
        }
        let report = self.session.tick();
        if let CommandOutcome::Dropped(e) = &report.outcome {
            log::debug!("Tick dropped a command: {}", e);
        }
        self.last_report = Some(report);
        self.last_report.as_ref()
    }

    fn present_frame(&mut self, ctx: &egui::Context) {
        match self.frames.poll() {
            FrameUpdate::Show(frame) => {
                if !frame.is_valid() {
                    log::warn!(
                        "Invalid frame data size: expected {}, got {}",
                        frame.width as usize * frame.height as usize * 4,
                        frame.rgba.len()
                    );
                    return;
                }
                let image = egui::ColorImage::from_rgba_unmultiplied(
                    [frame.width as usize, frame.height as usize],
                    &frame.rgba,
                );
                match &mut self.texture {
                    Some(texture) => texture.set(image, egui::TextureOptions::LINEAR),
                    None => {
                        self.texture =
                            Some(ctx.load_texture("video_frame", image, egui::TextureOptions::LINEAR));
                    }
                }
            }
            FrameUpdate::Clear => self.texture = None,
            FrameUpdate::Unchanged => {}
        }
    }
}

impl eframe::App for SyncPlayerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if ctx.input(|i| i.viewport().close_requested()) {
            self.session.shutdown();
            return;
        }

        let now = Instant::now();
        self.tick_if_due(now);
        self.present_frame(ctx);

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.monospace(self.session.status());
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(transport_summary(self.session.transport()));
                });
            });
        });

        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(egui::Color32::BLACK))
            .show(ctx, |ui| {
                if let Some(texture) = &self.texture {
                    ui.centered_and_justified(|ui| {
                        ui.add(
                            egui::Image::from_texture(SizedTexture::from_handle(texture))
                                .shrink_to_fit(),
                        );
                    });
                }
            });

        ctx.request_repaint_after(self.timer.until_next(Instant::now()));
    }
}
