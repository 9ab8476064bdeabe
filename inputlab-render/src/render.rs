use anyhow::{Context, Result, bail};
use bytemuck::cast_slice;
use inputlab_analysis::{COLOR_BLOCKS, DisplayPattern, GRAY_STEPS, IntervalClass};
use inputlab_core::Sample;
use inputlab_timing::{HighPrecisionTimer, Timer};
use std::cell::RefCell;
use std::collections::HashMap;
use std::time::Duration;
use tiny_skia::{
    Color, FillRule, GradientStop, LineCap, LineJoin, LinearGradient, Paint, PathBuilder, Pixmap,
    Point, Rect, SpreadMode, Stroke, Transform,
};

const BACKGROUND: [u8; 4] = [17, 24, 39, 255];
const PATH_BLUE: [u8; 4] = [59, 130, 246, 255];
const START_GREEN: [u8; 4] = [16, 185, 129, 255];
const END_RED: [u8; 4] = [239, 68, 68, 255];
const PROGRESS_GREY: [u8; 4] = [148, 163, 184, 255];

const PULSE_BACKGROUND: [u8; 4] = [255, 255, 255, 255];

const PATH_WIDTH: f32 = 2.0;
const ENDPOINT_RADIUS: f32 = 5.0;
const STRIP_HEIGHT: f32 = 8.0;
const PULSE_RADIUS: f32 = 64.0;

fn color(rgba: [u8; 4]) -> Color {
    Color::from_rgba8(rgba[0], rgba[1], rgba[2], rgba[3])
}

/// Colour stops of the four horizontal gradient bands, top to bottom.
fn gradient_bands() -> [Vec<GradientStop>; 4] {
    let stop = |pos: f32, rgb: [u8; 3]| GradientStop::new(pos, color([rgb[0], rgb[1], rgb[2], 255]));
    let last = (GRAY_STEPS - 1) as f32;
    [
        vec![stop(0.0, [0, 0, 0]), stop(1.0, [255, 255, 255])],
        vec![
            stop(0.0, [255, 0, 0]),
            stop(0.33, [0, 128, 0]),
            stop(0.66, [0, 0, 255]),
            stop(1.0, [255, 0, 0]),
        ],
        vec![
            stop(0.0, [255, 0, 0]),
            stop(0.17, [255, 165, 0]),
            stop(0.33, [255, 255, 0]),
            stop(0.5, [0, 128, 0]),
            stop(0.67, [0, 0, 255]),
            stop(0.83, [75, 0, 130]),
            stop(1.0, [238, 130, 238]),
        ],
        (0..GRAY_STEPS)
            .map(|i| {
                let grey = (i * 255 / (GRAY_STEPS - 1)) as u8;
                stop(i as f32 / last, [grey, grey, grey])
            })
            .collect(),
    ]
}

fn paint(rgba: [u8; 4], anti_alias: bool) -> Paint<'static> {
    let mut p = Paint::default();
    p.set_color_rgba8(rgba[0], rgba[1], rgba[2], rgba[3]);
    p.anti_alias = anti_alias;
    p
}

fn status_color(class: IntervalClass) -> Option<[u8; 4]> {
    match class {
        IntervalClass::First => None,
        IntervalClass::Repeat => Some([185, 28, 28, 255]),
        IntervalClass::Borderline => Some([180, 83, 9, 255]),
        IntervalClass::Clean => Some([22, 101, 52, 255]),
    }
}

/// Replays a trajectory as a polyline with a start and end marker.
/// Returns the number of segments drawn; fewer than two samples draw nothing.
pub fn draw_trajectory(pixmap: &mut Pixmap, samples: &[Sample]) -> usize {
    if samples.len() < 2 {
        return 0;
    }

    let mut pb = PathBuilder::new();
    pb.move_to(samples[0].x as f32, samples[0].y as f32);
    for s in &samples[1..] {
        pb.line_to(s.x as f32, s.y as f32);
    }
    // all samples on one spot give an empty path
    if let Some(path) = pb.finish() {
        let stroke = Stroke {
            width: PATH_WIDTH,
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            ..Stroke::default()
        };
        pixmap.stroke_path(
            &path,
            &paint(PATH_BLUE, true),
            &stroke,
            Transform::identity(),
            None,
        );
    }

    let first = &samples[0];
    let last = &samples[samples.len() - 1];
    for (s, color) in [(first, START_GREEN), (last, END_RED)] {
        if let Some(dot) = PathBuilder::from_circle(s.x as f32, s.y as f32, ENDPOINT_RADIUS) {
            pixmap.fill_path(
                &dot,
                &paint(color, true),
                FillRule::Winding,
                Transform::identity(),
                None,
            );
        }
    }

    samples.len() - 1
}

/// Everything one frame shows.
#[derive(Debug, Clone, Copy, Default)]
pub struct Scene<'a> {
    pub samples: &'a [Sample],
    /// Last repeat-press verdict, drawn as a strip along the top edge.
    pub status: Option<IntervalClass>,
    /// Fraction of a timed test still remaining, drawn along the bottom edge.
    pub remaining: Option<f32>,
    /// A display check covers the whole canvas and hides everything else.
    pub display: Option<DisplayPattern>,
}

#[derive(Debug, Clone)]
pub struct FrameStats {
    pub clear: Duration,
    pub draw: Duration,
    pub copy: Duration,
    pub total: Duration,
    pub segments: usize,
}

pub struct TrajectoryRenderer {
    width: u32,
    height: u32,
    canvas: Pixmap,
    component_timers: HashMap<&'static str, RefCell<HighPrecisionTimer>>,
}

impl TrajectoryRenderer {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let mut canvas = Pixmap::new(width, height)
            .with_context(|| format!("cannot allocate a {width}x{height} canvas"))?;
        canvas.fill(Self::background());
        Ok(Self {
            width,
            height,
            canvas,
            component_timers: ["clear", "draw", "copy"]
                .iter()
                .map(|&k| (k, RefCell::new(HighPrecisionTimer::new())))
                .collect(),
        })
    }

    fn background() -> Color {
        color(BACKGROUND)
    }

    pub fn resize(&mut self, new_width: u32, new_height: u32) -> Result<()> {
        let mut canvas = Pixmap::new(new_width, new_height)
            .with_context(|| format!("cannot allocate a {new_width}x{new_height} canvas"))?;
        canvas.fill(Self::background());
        self.canvas = canvas;
        self.width = new_width;
        self.height = new_height;
        Ok(())
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn canvas(&self) -> &Pixmap {
        &self.canvas
    }

    /// Straight RGBA of one canvas pixel, `None` outside the canvas.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let pixels: &[[u8; 4]] = cast_slice(self.canvas.data());
        pixels.get((y * self.width + x) as usize).copied()
    }

    fn draw_status(&mut self, class: IntervalClass) {
        let Some(color) = status_color(class) else {
            return;
        };
        if let Some(r) = Rect::from_xywh(0.0, 0.0, self.width as f32, STRIP_HEIGHT) {
            self.canvas
                .fill_rect(r, &paint(color, false), Transform::identity(), None);
        }
    }

    fn draw_remaining(&mut self, fraction: f32) {
        let w = self.width as f32 * fraction.clamp(0.0, 1.0);
        let y = self.height as f32 - STRIP_HEIGHT;
        if let Some(r) = Rect::from_xywh(0.0, y, w, STRIP_HEIGHT) {
            self.canvas
                .fill_rect(r, &paint(PROGRESS_GREY, false), Transform::identity(), None);
        }
    }

    fn draw_pattern(&mut self, pattern: DisplayPattern) {
        let (w, h) = (self.width as f32, self.height as f32);
        match pattern {
            DisplayPattern::Solid(rgba) => self.canvas.fill(color(rgba)),
            DisplayPattern::ColorBlocks => {
                let (bw, bh) = (w / 5.0, h / 2.0);
                for (i, &rgba) in COLOR_BLOCKS.iter().enumerate() {
                    let (col, row) = ((i % 5) as f32, (i / 5) as f32);
                    if let Some(r) = Rect::from_xywh(col * bw, row * bh, bw, bh) {
                        self.canvas
                            .fill_rect(r, &paint(rgba, false), Transform::identity(), None);
                    }
                }
            }
            DisplayPattern::Gradients => {
                let band = h / 4.0;
                for (i, stops) in gradient_bands().into_iter().enumerate() {
                    let Some(shader) = LinearGradient::new(
                        Point::from_xy(0.0, 0.0),
                        Point::from_xy(w, 0.0),
                        stops,
                        SpreadMode::Pad,
                        Transform::identity(),
                    ) else {
                        continue;
                    };
                    let mut p = Paint::default();
                    p.shader = shader;
                    if let Some(r) = Rect::from_xywh(0.0, i as f32 * band, w, band) {
                        self.canvas.fill_rect(r, &p, Transform::identity(), None);
                    }
                }
            }
            DisplayPattern::Pulse(progress) => {
                let progress = progress.clamp(0.0, 1.0);
                self.canvas.fill(color(PULSE_BACKGROUND));
                let (cx, cy) = (w / 2.0, h / 2.0);
                let fade = ((1.0 - progress) * 0.75 * 255.0) as u8;
                let ring = [PATH_BLUE[0], PATH_BLUE[1], PATH_BLUE[2], fade];
                let rings = [
                    (PULSE_RADIUS * (1.0 + progress), ring),
                    (PULSE_RADIUS, PATH_BLUE),
                ];
                for (radius, rgba) in rings {
                    if let Some(dot) = PathBuilder::from_circle(cx, cy, radius) {
                        self.canvas.fill_path(
                            &dot,
                            &paint(rgba, true),
                            FillRule::Winding,
                            Transform::identity(),
                            None,
                        );
                    }
                }
            }
        }
    }

    /// Redraws the scene and copies it into an RGBA frame buffer of the same size.
    pub fn render_frame<T>(
        &mut self,
        scene: &Scene<'_>,
        frame_buffer: &mut [u8],
        timer: &mut T,
    ) -> Result<FrameStats>
    where
        T: Timer<Timestamp = u64>,
    {
        let expected = self.canvas.data().len();
        if frame_buffer.len() != expected {
            bail!(
                "frame buffer holds {} bytes, canvas needs {}",
                frame_buffer.len(),
                expected
            );
        }

        let t_clear = {
            let t = timer.now();
            self.canvas.fill(Self::background());
            timer.elapsed(t)
        };

        let (t_draw, segments) = {
            let t = timer.now();
            let segments = match scene.display {
                Some(pattern) => {
                    self.draw_pattern(pattern);
                    0
                }
                None => {
                    let segments = draw_trajectory(&mut self.canvas, scene.samples);
                    if let Some(class) = scene.status {
                        self.draw_status(class);
                    }
                    if let Some(fraction) = scene.remaining {
                        self.draw_remaining(fraction);
                    }
                    segments
                }
            };
            (timer.elapsed(t), segments)
        };

        let t_copy = {
            let t = timer.now();
            frame_buffer.copy_from_slice(self.canvas.data());
            timer.elapsed(t)
        };

        let total = t_clear + t_draw + t_copy;
        self.component_timers["clear"]
            .borrow_mut()
            .record_interval(t_clear);
        self.component_timers["draw"]
            .borrow_mut()
            .record_interval(t_draw);
        self.component_timers["copy"]
            .borrow_mut()
            .record_interval(t_copy);
        timer.record_interval(total);

        Ok(FrameStats {
            clear: t_clear,
            draw: t_draw,
            copy: t_copy,
            total,
            segments,
        })
    }

    /// Mean time per stage over the recent frames, in milliseconds.
    pub fn stage_averages_ms(&self) -> Vec<(&'static str, f64)> {
        let mut rows: Vec<(&'static str, f64)> = self
            .component_timers
            .iter()
            .map(|(k, t)| (*k, t.borrow().interval_stats().average_interval_ns / 1e6))
            .collect();
        rows.sort_by(|a, b| a.0.cmp(b.0));
        rows
    }
}
