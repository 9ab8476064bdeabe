pub mod render;

pub use render::{FrameStats, Scene, TrajectoryRenderer, draw_trajectory};
