use anyhow::{Context, Result};
use inputlab_analysis::{
    ClickRateTest, DisplayCheck, DisplayTest, IntervalClass, KeyRateTest, LabConfig, PointerEvent,
    PointerReceiver, PointerSender, RateEvent, RecordStore, RepeatDetector, TrackingSession,
    TrajectoryAnalyzer, pointer_channel,
};
use inputlab_core::{Button, Metrics, TestRecord, key_display_name};
use inputlab_render::{Scene, TrajectoryRenderer};
use inputlab_timing::{HighPrecisionTimer, Timer};
use pixels::{Pixels, SurfaceTexture};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, error, info, warn};
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalSize},
    event::{ElementState, KeyEvent, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Fullscreen, Window, WindowId},
};

/// Live figures refresh at the rate the diagnostic pages used.
const TICK_MS: u64 = 100;

pub struct App {
    window: Option<Arc<Window>>,
    pixels: Option<Pixels<'static>>,
    renderer: Option<TrajectoryRenderer>,
    timer: HighPrecisionTimer,
    config: LabConfig,

    session: TrackingSession<HighPrecisionTimer>,
    pointer_tx: PointerSender,
    pointer_rx: PointerReceiver,
    recorded_run: usize,

    clicks: ClickRateTest,
    keys: KeyRateTest,
    button_repeats: RepeatDetector<Button>,
    key_repeats: RepeatDetector<String>,
    last_status: Option<IntervalClass>,
    display: DisplayTest,
    history: RecordStore,

    last_tick_ms: u64,
    current_size: Option<PhysicalSize<u32>>,
    scale_factor: f64,
    should_exit: bool,
}

impl App {
    pub fn new(config: LabConfig) -> Result<Self> {
        let timer = HighPrecisionTimer::new();
        let session = TrackingSession::new(TrajectoryAnalyzer::new(config.analyzer), timer.clone());
        let (pointer_tx, pointer_rx) = pointer_channel();
        let history = match RecordStore::load(&config.history.path, config.history.capacity) {
            Ok(store) => store,
            Err(e) => {
                warn!(error = %e, "record history unreadable, starting empty");
                RecordStore::new(config.history.capacity)
            }
        };

        Ok(Self {
            window: None,
            pixels: None,
            renderer: None,
            timer,
            session,
            pointer_tx,
            pointer_rx,
            recorded_run: 0,
            clicks: ClickRateTest::new(config.click_rate.clone()),
            keys: KeyRateTest::new(),
            button_repeats: RepeatDetector::new(config.repeat.clone()),
            key_repeats: RepeatDetector::new(config.repeat.clone()),
            last_status: None,
            display: DisplayTest::new(config.display.clone()),
            history,
            config,
            last_tick_ms: 0,
            current_size: None,
            scale_factor: 1.0,
            should_exit: false,
        })
    }

    pub fn run(mut self) -> Result<()> {
        let event_loop = EventLoop::new()?;
        info!(
            platform = std::env::consts::OS,
            arch = std::env::consts::ARCH,
            "inputlab starting"
        );
        info!("SPACE starts/stops movement tracking, ENTER starts/stops the key test");
        info!("click anywhere to start the click test, BACKSPACE resets it, ESC exits");
        info!("+/- adjust the double-press threshold, F1-F4 run the display checks");

        event_loop.run_app(&mut self)?;
        Ok(())
    }

    fn now_ms(&self) -> u64 {
        self.timer.now() / 1_000_000
    }

    fn create_window_and_surface(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let window_attributes = Window::default_attributes()
            .with_title("inputlab")
            .with_inner_size(LogicalSize::new(1024.0, 640.0));

        let window = Arc::new(event_loop.create_window(window_attributes)?);
        let physical_size = window.inner_size();
        self.current_size = Some(physical_size);
        self.scale_factor = window.scale_factor();

        info!(
            width = physical_size.width,
            height = physical_size.height,
            scale_factor = self.scale_factor,
            "window created"
        );

        let surface_texture =
            SurfaceTexture::new(physical_size.width, physical_size.height, window.clone());
        self.pixels = Some(Pixels::new(
            physical_size.width,
            physical_size.height,
            surface_texture,
        )?);
        self.renderer = Some(TrajectoryRenderer::new(
            physical_size.width.max(1),
            physical_size.height.max(1),
        )?);

        window.request_redraw();
        self.window = Some(window);
        Ok(())
    }

    fn render(&mut self) -> Result<()> {
        let now_ms = self.now_ms();
        let remaining = self.clicks.phase().allows_input().then(|| {
            self.clicks.remaining_ms(now_ms) as f32 / self.clicks.duration_ms() as f32
        });
        let (Some(pix), Some(renderer)) = (self.pixels.as_mut(), self.renderer.as_mut()) else {
            return Ok(());
        };
        let scene = Scene {
            samples: self.session.trajectory().samples(),
            status: self.last_status,
            remaining,
            display: self.display.pattern(now_ms),
        };
        let mut timer = self.timer.clone();
        let stats = renderer.render_frame(&scene, pix.frame_mut(), &mut timer)?;
        pix.render().context("presenting frame")?;

        debug!(
            clear_ms = stats.clear.as_secs_f64() * 1e3,
            draw_ms = stats.draw.as_secs_f64() * 1e3,
            copy_ms = stats.copy.as_secs_f64() * 1e3,
            segments = stats.segments,
            "frame"
        );
        Ok(())
    }

    fn update(&mut self) {
        self.session.drain(&self.pointer_rx);
        if self.session.phase().is_finished() && self.session.runs() != self.recorded_run {
            self.recorded_run = self.session.runs();
            self.log_run_details();
            if let Some(record) = self.session.record(unix_ms()) {
                self.history.push(TestRecord::Trajectory(record));
            }
        }

        let now_ms = self.now_ms();
        if now_ms.saturating_sub(self.last_tick_ms) < TICK_MS {
            return;
        }
        self.last_tick_ms = now_ms;

        if let Some(RateEvent::Finished { .. }) = self.clicks.tick(now_ms) {
            self.save_click_record();
        }
        self.keys.tick(now_ms);
        self.refresh_title(now_ms);
    }

    fn log_run_details(&self) {
        let analysis = self.session.analysis();
        let rate = self.session.sample_rate();
        info!(
            samples = analysis.sample_count,
            path_efficiency = analysis.path_efficiency,
            deviation_consistency = analysis.deviation_consistency,
            pointer_hz = rate.effective_hz,
            jitter_ms = rate.jitter_ns / 1e6,
            "run details"
        );
    }

    fn refresh_title(&self, now_ms: u64) {
        let Some(window) = &self.window else {
            return;
        };
        let title = match self.display.active() {
            Some(check) => display_title(check, &self.display, now_ms),
            None => status_title(
                self.session.metrics(),
                self.session.is_tracking(),
                &self.clicks,
                now_ms,
                &self.keys,
                self.button_repeats.total_repeats() + self.key_repeats.total_repeats(),
                self.button_repeats.threshold_ms(),
            ),
        };
        window.set_title(&title);
    }

    fn toggle_display(&mut self, check: DisplayCheck) {
        let now_ms = self.now_ms();
        let running = self.display.toggle(check, now_ms);
        self.set_fullscreen(running.is_some());
    }

    fn leave_display(&mut self) {
        self.display.stop();
        self.set_fullscreen(false);
    }

    fn set_fullscreen(&self, on: bool) {
        if let Some(window) = &self.window {
            window.set_fullscreen(on.then_some(Fullscreen::Borderless(None)));
        }
    }

    fn adjust_threshold(&mut self, raise: bool) {
        let threshold_ms = if raise {
            self.key_repeats.raise_threshold();
            self.button_repeats.raise_threshold()
        } else {
            self.key_repeats.lower_threshold();
            self.button_repeats.lower_threshold()
        };
        info!(threshold_ms, "double-press threshold changed");
    }

    fn save_click_record(&mut self) {
        if let Some(record) = self.clicks.record(unix_ms()) {
            self.history.push(TestRecord::ClickRate(record));
        }
    }

    fn send_pointer(&self, event: PointerEvent) {
        if let Err(e) = self.pointer_tx.send(event) {
            warn!(error = %e, "pointer channel closed");
        }
    }

    fn handle_key(&mut self, event: &KeyEvent, event_loop: &ActiveEventLoop) {
        let PhysicalKey::Code(code) = event.physical_key else {
            return;
        };
        let label = format!("{code:?}");

        if event.state == ElementState::Released {
            self.keys.key_up(&label);
            return;
        }
        if event.repeat {
            return;
        }

        match code {
            KeyCode::Escape if self.display.active().is_some() => self.leave_display(),
            KeyCode::Escape => self.cleanup_and_exit(event_loop),
            KeyCode::Space => self.send_pointer(PointerEvent::Toggle),
            KeyCode::F1 => self.toggle_display(DisplayCheck::ColorBlocks),
            KeyCode::F2 => self.toggle_display(DisplayCheck::Gradients),
            KeyCode::F3 => self.toggle_display(DisplayCheck::DeadPixels),
            KeyCode::F4 => self.toggle_display(DisplayCheck::Response),
            KeyCode::Equal | KeyCode::NumpadAdd => self.adjust_threshold(true),
            KeyCode::Minus | KeyCode::NumpadSubtract => self.adjust_threshold(false),
            KeyCode::Enter => {
                if self.keys.phase().allows_input() {
                    self.keys.stop();
                    if let Some(record) = self.keys.record(unix_ms()) {
                        self.history.push(TestRecord::KeyRate(record));
                    }
                } else {
                    let now_ms = self.now_ms();
                    self.keys.start(now_ms);
                }
            }
            KeyCode::Backspace => {
                self.save_repeat_records();
                self.clicks.reset();
                self.button_repeats.reset();
                self.key_repeats.reset();
                self.last_status = None;
                info!("click and repeat tests reset");
            }
            _ => {
                let now_ms = self.now_ms();
                self.keys.key_down(&label);
                let outcome = self.key_repeats.press(label.clone(), now_ms);
                self.last_status = Some(outcome.class);
                if outcome.is_repeat() {
                    info!(
                        key = key_display_name(&label),
                        interval_ms = ?outcome.interval_ms,
                        "double press"
                    );
                }
            }
        }
    }

    fn handle_mouse_button(&mut self, button: MouseButton) {
        let now_ms = self.now_ms();
        let button = button_from(button);
        if let Some(RateEvent::Finished { .. }) = self.clicks.click(now_ms) {
            self.save_click_record();
        }
        let outcome = self.button_repeats.press(button, now_ms);
        self.last_status = Some(outcome.class);
        if outcome.is_repeat() {
            info!(%button, interval_ms = ?outcome.interval_ms, "double click");
        }
    }

    fn save_repeat_records(&mut self) {
        let stamp = unix_ms();
        for detector in [
            self.button_repeats.record(stamp),
            self.key_repeats.record(stamp),
        ] {
            if detector.total_presses > 0 {
                self.history.push(TestRecord::RepeatPress(detector));
            }
        }
    }

    fn handle_resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.current_size = Some(new_size);
        if let Some(pixels) = &mut self.pixels {
            if let Err(e) = pixels.resize_surface(new_size.width, new_size.height) {
                error!(error = %e, "failed to resize surface");
            }
            if let Err(e) = pixels.resize_buffer(new_size.width, new_size.height) {
                error!(error = %e, "failed to resize buffer");
            }
        }
        if let Some(renderer) = &mut self.renderer {
            if let Err(e) = renderer.resize(new_size.width, new_size.height) {
                error!(error = %e, "failed to resize canvas");
            }
        }
        info!(
            width = new_size.width,
            height = new_size.height,
            "display resized"
        );
    }

    fn cleanup_and_exit(&mut self, event_loop: &ActiveEventLoop) {
        self.session.drain(&self.pointer_rx);
        if self.session.is_tracking() {
            self.session.stop();
        }
        if self.session.runs() != self.recorded_run {
            self.recorded_run = self.session.runs();
            if let Some(record) = self.session.record(unix_ms()) {
                self.history.push(TestRecord::Trajectory(record));
            }
        }
        if self.keys.phase().allows_input() {
            self.keys.stop();
            if let Some(record) = self.keys.record(unix_ms()) {
                self.history.push(TestRecord::KeyRate(record));
            }
        }
        self.save_repeat_records();

        if let Err(e) = self.history.save(&self.config.history.path) {
            error!(error = %e, "could not save record history");
        }

        let top: Vec<String> = self
            .keys
            .top_keys(5)
            .into_iter()
            .map(|(k, n)| format!("{}×{n}", key_display_name(&k)))
            .collect();
        let doubles: Vec<String> = self
            .button_repeats
            .by_count()
            .into_iter()
            .filter(|(_, s)| s.repeats > 0)
            .map(|(b, s)| format!("{b}:{}/{}", s.repeats, s.count))
            .collect();
        info!(
            trajectory = ?self.session.metrics(),
            clicks = self.clicks.clicks(),
            max_cps = self.clicks.max_rate(),
            key_presses = self.keys.presses(),
            top_keys = %top.join(" "),
            double_clicks = %doubles.join(" "),
            "session finished"
        );
        if let Some(renderer) = &self.renderer {
            for (stage, ms) in renderer.stage_averages_ms() {
                debug!(stage, avg_ms = ms, "frame stage");
            }
        }

        self.should_exit = true;
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.create_window_and_surface(event_loop) {
                error!(error = %e, "failed to create window and surface");
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => self.cleanup_and_exit(event_loop),
            WindowEvent::RedrawRequested => {
                self.update();
                if let Err(e) = self.render() {
                    error!(error = %e, "render failed");
                    self.cleanup_and_exit(event_loop);
                    return;
                }
                if let Some(win) = &self.window {
                    win.request_redraw();
                }
            }
            // the session drops moves that arrive while it is not tracking
            WindowEvent::CursorMoved { position, .. } => self.send_pointer(PointerEvent::Move {
                x: position.x,
                y: position.y,
            }),
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button,
                ..
            } => self.handle_mouse_button(button),
            WindowEvent::KeyboardInput { event, .. } => self.handle_key(&event, event_loop),
            WindowEvent::Resized(sz) => self.handle_resize(sz),
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                self.scale_factor = scale_factor;
                if let Some(window) = &self.window {
                    self.handle_resize(window.inner_size());
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.should_exit {
            event_loop.exit();
        }
    }
}

fn button_from(button: MouseButton) -> Button {
    match button {
        MouseButton::Left => Button::Left,
        MouseButton::Right => Button::Right,
        MouseButton::Middle => Button::Middle,
        MouseButton::Back => Button::Other(3),
        MouseButton::Forward => Button::Other(4),
        MouseButton::Other(n) => Button::Other(n),
    }
}

fn unix_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

fn display_title(check: DisplayCheck, display: &DisplayTest, now_ms: u64) -> String {
    match (display.color_name(now_ms), display.countdown_secs(now_ms)) {
        (Some(name), Some(secs)) => {
            format!("inputlab display: {} | {name} ({secs}s) | ESC leaves", check.label())
        }
        _ => format!("inputlab display: {} | ESC leaves", check.label()),
    }
}

fn status_title(
    metrics: Metrics,
    tracking: bool,
    clicks: &ClickRateTest,
    now_ms: u64,
    keys: &KeyRateTest,
    repeats: u64,
    threshold_ms: u64,
) -> String {
    let last_key = keys
        .last_key()
        .map(|k| format!(" last {}", key_display_name(k)))
        .unwrap_or_default();
    format!(
        "inputlab{} | {} px  {} px/s  smooth {}%  acc {}% | CPS {:.1} (max {:.1}) {}s | KPS {:.1} (max {:.1}){} | doubles {} (<= {} ms)",
        if tracking { " [tracking]" } else { "" },
        metrics.distance,
        metrics.speed,
        metrics.smoothness,
        metrics.accuracy,
        clicks.rate(),
        clicks.max_rate(),
        clicks.time_left_secs(now_ms),
        keys.rate(),
        keys.max_rate(),
        last_key,
        repeats,
        threshold_ms,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extra_buttons_keep_their_index() {
        assert_eq!(button_from(MouseButton::Left), Button::Left);
        assert_eq!(button_from(MouseButton::Back), Button::Other(3));
        assert_eq!(button_from(MouseButton::Other(9)), Button::Other(9));
    }

    #[test]
    fn title_shows_live_figures() {
        let metrics = Metrics {
            distance: 120,
            speed: 300,
            smoothness: 88,
            accuracy: 91,
        };
        let title = status_title(
            metrics,
            true,
            &ClickRateTest::default(),
            0,
            &KeyRateTest::new(),
            2,
            80,
        );
        assert!(title.starts_with("inputlab [tracking] | 120 px  300 px/s"));
        assert!(title.contains("smooth 88%  acc 91%"));
        assert!(title.contains("10s"));
        assert!(!title.contains("last"));
        assert!(title.ends_with("doubles 2 (<= 80 ms)"));
    }

    #[test]
    fn dead_pixel_title_names_the_colour() {
        let mut display = DisplayTest::default();
        display.toggle(DisplayCheck::DeadPixels, 0);
        assert_eq!(
            display_title(DisplayCheck::DeadPixels, &display, 5_500),
            "inputlab display: dead pixels | Black (5s) | ESC leaves"
        );
        display.toggle(DisplayCheck::Gradients, 0);
        assert_eq!(
            display_title(DisplayCheck::Gradients, &display, 0),
            "inputlab display: gradients | ESC leaves"
        );
    }

    #[test]
    fn space_pressed_twice_in_one_frame_starts_and_stops() {
        let mut app = App::new(LabConfig::default()).unwrap();
        app.send_pointer(PointerEvent::Toggle);
        app.send_pointer(PointerEvent::Move { x: 1.0, y: 1.0 });
        app.send_pointer(PointerEvent::Move { x: 4.0, y: 5.0 });
        app.send_pointer(PointerEvent::Toggle);
        app.update();
        assert!(app.session.phase().is_finished());
        assert_eq!(app.session.trajectory().len(), 2);
        assert_eq!(app.session.metrics().distance, 5);
        assert_eq!(app.recorded_run, 1);
    }

    #[test]
    fn moves_before_a_start_are_ignored() {
        let mut app = App::new(LabConfig::default()).unwrap();
        app.send_pointer(PointerEvent::Move { x: 1.0, y: 1.0 });
        app.send_pointer(PointerEvent::Toggle);
        app.send_pointer(PointerEvent::Move { x: 2.0, y: 2.0 });
        app.update();
        assert!(app.session.is_tracking());
        assert_eq!(app.session.trajectory().len(), 1);
    }

    #[test]
    fn threshold_keys_move_both_detectors() {
        let mut app = App::new(LabConfig::default()).unwrap();
        app.adjust_threshold(true);
        assert_eq!(app.button_repeats.threshold_ms(), 90);
        assert_eq!(app.key_repeats.threshold_ms(), 90);
        app.adjust_threshold(false);
        app.adjust_threshold(false);
        assert_eq!(app.button_repeats.threshold_ms(), 70);
    }
}
