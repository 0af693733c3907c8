pub mod presenter;
pub mod text;

use std::{
    path::Path,
    thread,
    time::{Duration, Instant},
};

use thiserror::Error;
use tracing::{debug, warn};

use crate::constants::{BLACK, MAX_WINDOW_DIMENSION};
pub use crate::picture::Picture;
pub use presenter::{HeadlessPresenter, InputState, Presenter, WindowPresenter};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_array(&self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("window is not initialized")]
    NotInitialized,
    #[error("window is already open")]
    AlreadyOpen,
    #[error("begin_drawing called twice without end_drawing")]
    FrameAlreadyStarted,
    #[error("end_drawing called without begin_drawing")]
    FrameNotStarted,
    #[error("window error: {0}")]
    Window(String),
    #[error("window size {width}x{height} is too large, at most {MAX_WINDOW_DIMENSION} pixels per side")]
    TooLarge { width: u32, height: u32 },
    #[error("cannot allocate a {width}x{height} frame buffer")]
    FrameBuffer { width: u32, height: u32 },
    #[error("failed to save screenshot: {0}")]
    Screenshot(#[from] image::ImageError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FrameState {
    Idle,
    Drawing,
}

pub struct CanvasOptions {
    pub pace_frames: bool,
    pub max_frames: Option<u64>,
}

// state shared by every script binding: one window, one frame buffer, one frame in flight
pub struct Canvas {
    picture: Option<Picture>,
    presenter: Box<dyn Presenter>,
    frame: FrameState,
    frames_presented: u64,
    target_frame_time: Option<Duration>,
    last_frame: Option<Instant>,
    input: InputState,
    options: CanvasOptions,
}

impl Canvas {
    pub fn new(presenter: Box<dyn Presenter>, options: CanvasOptions) -> Self {
        Self {
            picture: None,
            presenter,
            frame: FrameState::Idle,
            frames_presented: 0,
            target_frame_time: None,
            last_frame: None,
            input: InputState::default(),
            options,
        }
    }

    pub fn is_open(&self) -> bool {
        self.picture.is_some()
    }

    pub fn init_window(&mut self, width: i32, height: i32, title: &str) -> Result<(), RenderError> {
        if self.is_open() {
            return Err(RenderError::AlreadyOpen);
        }

        if width <= 0 || height <= 0 {
            warn!(width, height, "non-positive window size, clamping frame buffer to 1 pixel");
        }
        let width = width.max(1) as u32;
        let height = height.max(1) as u32;
        if width > MAX_WINDOW_DIMENSION || height > MAX_WINDOW_DIMENSION {
            return Err(RenderError::TooLarge { width, height });
        }

        let picture = Picture::try_new(width as usize, height as usize, &BLACK)
            .ok_or(RenderError::FrameBuffer { width, height })?;
        self.presenter.open(width, height, title)?;
        self.picture = Some(picture);
        self.frame = FrameState::Idle;
        self.frames_presented = 0;
        self.last_frame = None;
        self.input = InputState::default();

        debug!(width, height, title, "window opened");
        Ok(())
    }

    pub fn close_window(&mut self) {
        if self.picture.take().is_none() {
            warn!("close_window called without an open window");
            return;
        }

        self.presenter.close();
        self.frame = FrameState::Idle;
        debug!(frames = self.frames_presented, "window closed");
    }

    pub fn set_target_fps(&mut self, fps: i32) {
        self.target_frame_time = if fps > 0 {
            Some(Duration::from_secs_f64(1.0 / fps as f64))
        } else {
            None
        };
    }

    pub fn window_should_close(&mut self) -> bool {
        if !self.is_open() {
            return true;
        }

        if let Some(max_frames) = self.options.max_frames && self.frames_presented >= max_frames {
            return true;
        }

        self.input.close_requested || self.presenter.close_requested()
    }

    pub fn begin_drawing(&mut self) -> Result<(), RenderError> {
        self.picture_mut()?;

        if self.frame == FrameState::Drawing {
            return Err(RenderError::FrameAlreadyStarted);
        }

        self.frame = FrameState::Drawing;
        Ok(())
    }

    pub fn end_drawing(&mut self) -> Result<(), RenderError> {
        let picture = self.picture.as_ref().ok_or(RenderError::NotInitialized)?;

        if self.frame == FrameState::Idle {
            return Err(RenderError::FrameNotStarted);
        }
        self.frame = FrameState::Idle;

        self.presenter.present(picture)?;
        self.frames_presented += 1;
        self.input = self.presenter.poll_input();
        self.wait_for_next_frame();

        Ok(())
    }

    fn wait_for_next_frame(&mut self) {
        let now = Instant::now();

        if self.options.pace_frames
            && let Some(target) = self.target_frame_time
            && let Some(last) = self.last_frame
        {
            let elapsed = now.duration_since(last);
            if elapsed < target {
                thread::sleep(target - elapsed);
            }
        }

        self.last_frame = Some(Instant::now());
    }

    pub fn clear_background(&mut self, color: &Color) -> Result<(), RenderError> {
        self.picture_mut()?.clear(color);
        Ok(())
    }

    pub fn draw_rectangle(&mut self, x: i32, y: i32, width: i32, height: i32, color: &Color) -> Result<(), RenderError> {
        self.picture_mut()?.fill_rect(x as isize, y as isize, width as isize, height as isize, color);
        Ok(())
    }

    pub fn draw_rectangle_lines(&mut self, x: i32, y: i32, width: i32, height: i32, color: &Color) -> Result<(), RenderError> {
        self.picture_mut()?.stroke_rect(x as isize, y as isize, width as isize, height as isize, 1, color);
        Ok(())
    }

    pub fn draw_text(&mut self, text: &str, x: i32, y: i32, font_size: i32, color: &Color) -> Result<(), RenderError> {
        text::draw_text(self.picture_mut()?, text, x, y, font_size, color);
        Ok(())
    }

    pub fn take_screenshot<P: AsRef<Path>>(&self, path: P) -> Result<(), RenderError> {
        let picture = self.picture.as_ref().ok_or(RenderError::NotInitialized)?;
        picture.save_as_file(path)?;
        Ok(())
    }

    pub fn screen_width(&self) -> i32 {
        self.picture.as_ref().map_or(0, |picture| picture.xres as i32)
    }

    pub fn screen_height(&self) -> i32 {
        self.picture.as_ref().map_or(0, |picture| picture.yres as i32)
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    pub fn picture(&self) -> Option<&Picture> {
        self.picture.as_ref()
    }

    fn picture_mut(&mut self) -> Result<&mut Picture, RenderError> {
        self.picture.as_mut().ok_or(RenderError::NotInitialized)
    }
}

impl Drop for Canvas {
    fn drop(&mut self) {
        if self.is_open() {
            self.close_window();
        }
    }
}
