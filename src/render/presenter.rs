use std::{
    cell::{Ref, RefCell},
    collections::VecDeque,
    rc::Rc,
    sync::mpsc::{Receiver, TryRecvError},
};

use image::RgbaImage;
use show_image::{
    BoxImage, ImageInfo, WindowOptions, WindowProxy,
    event::{ElementState, MouseButton, VirtualKeyCode, WindowEvent},
};
use tracing::{debug, trace};

use super::{Picture, RenderError};
use crate::constants::CANVAS_IMAGE_NAME;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct InputState {
    pub mouse_x: i32,
    pub mouse_y: i32,
    pub mouse_down: bool,
    // true only for the frame right after the press
    pub mouse_pressed: bool,
    pub close_requested: bool,
}

// where finished frames go and where input comes from
pub trait Presenter {
    fn open(&mut self, width: u32, height: u32, title: &str) -> Result<(), RenderError>;
    fn present(&mut self, picture: &Picture) -> Result<(), RenderError>;
    // drains pending events, edge triggered fields reset on every call
    fn poll_input(&mut self) -> InputState;
    fn close_requested(&mut self) -> bool;
    fn close(&mut self);
}

/* SHOW-IMAGE WINDOW */

pub struct WindowPresenter {
    window: Option<WindowProxy>,
    events: Option<Receiver<WindowEvent>>,
    state: InputState,
}

impl WindowPresenter {
    pub fn new() -> Self {
        Self {
            window: None,
            events: None,
            state: InputState::default(),
        }
    }

    fn drain_events(&mut self) {
        let Some(events) = &self.events else {
            return;
        };

        loop {
            match events.try_recv() {
                Ok(event) => apply_event(&mut self.state, event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    // the event loop dropped the window on us
                    self.state.close_requested = true;
                    break;
                }
            }
        }
    }
}

impl Default for WindowPresenter {
    fn default() -> Self {
        Self::new()
    }
}

fn apply_event(state: &mut InputState, event: WindowEvent) {
    match event {
        WindowEvent::CloseRequested(_) | WindowEvent::Destroyed(_) => {
            state.close_requested = true;
        }
        WindowEvent::KeyboardInput(event) => {
            if event.input.key_code == Some(VirtualKeyCode::Escape) && event.input.state == ElementState::Pressed {
                state.close_requested = true;
            }
        }
        WindowEvent::MouseMove(event) => {
            state.mouse_x = event.position.x as i32;
            state.mouse_y = event.position.y as i32;
        }
        WindowEvent::MouseButton(event) => {
            if event.button != MouseButton::Left {
                return;
            }

            state.mouse_x = event.position.x as i32;
            state.mouse_y = event.position.y as i32;

            let pressed = event.state == ElementState::Pressed;
            if pressed && !state.mouse_down {
                state.mouse_pressed = true;
            }
            state.mouse_down = pressed;
        }
        _ => {}
    }
}

impl Presenter for WindowPresenter {
    fn open(&mut self, width: u32, height: u32, title: &str) -> Result<(), RenderError> {
        let options = WindowOptions::new().set_size([width, height]);
        let window = show_image::create_window(title, options)
            .map_err(|e| RenderError::Window(e.to_string()))?;
        let events = window.event_channel().map_err(|e| RenderError::Window(e.to_string()))?;

        self.window = Some(window);
        self.events = Some(events);
        self.state = InputState::default();
        debug!(width, height, title, "show-image window created");
        Ok(())
    }

    fn present(&mut self, picture: &Picture) -> Result<(), RenderError> {
        let window = self.window.as_ref().ok_or(RenderError::NotInitialized)?;
        let image = BoxImage::new(
            ImageInfo::rgba8(picture.xres as u32, picture.yres as u32),
            picture.data.clone().into_boxed_slice(),
        );

        window
            .set_image(CANVAS_IMAGE_NAME, image)
            .map_err(|e| RenderError::Window(e.to_string()))
    }

    fn poll_input(&mut self) -> InputState {
        self.drain_events();
        let snapshot = self.state;
        self.state.mouse_pressed = false;
        snapshot
    }

    fn close_requested(&mut self) -> bool {
        self.drain_events();
        self.state.close_requested
    }

    fn close(&mut self) {
        self.events = None;
        if let Some(window) = self.window.take() {
            // fails only when the window is already gone
            let _ = window.run_function(|handle| {
                handle.destroy();
            });
        }
    }
}

/* HEADLESS */

#[derive(Debug, Default)]
pub struct HeadlessState {
    pub title: Option<String>,
    pub size: Option<(u32, u32)>,
    pub opened: usize,
    pub closed: usize,
    pub presented: usize,
    pub last_frame: Option<RgbaImage>,
    // handed out one per poll, after that input stays idle
    pub scripted_input: VecDeque<InputState>,
    pub close_after: Option<usize>,
}

// keeps frames in memory; clones share state so callers can inspect what a script drew
#[derive(Clone, Default)]
pub struct HeadlessPresenter {
    state: Rc<RefCell<HeadlessState>>,
}

impl HeadlessPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn close_after(self, frames: usize) -> Self {
        self.state.borrow_mut().close_after = Some(frames);
        self
    }

    pub fn push_input(&self, input: InputState) {
        self.state.borrow_mut().scripted_input.push_back(input);
    }

    pub fn state(&self) -> Ref<'_, HeadlessState> {
        self.state.borrow()
    }
}

impl Presenter for HeadlessPresenter {
    fn open(&mut self, width: u32, height: u32, title: &str) -> Result<(), RenderError> {
        let mut state = self.state.borrow_mut();
        state.title = Some(title.to_string());
        state.size = Some((width, height));
        state.opened += 1;
        state.presented = 0;
        Ok(())
    }

    fn present(&mut self, picture: &Picture) -> Result<(), RenderError> {
        let mut state = self.state.borrow_mut();
        state.presented += 1;
        state.last_frame = Some(picture.to_image());
        trace!(frame = state.presented, "headless frame presented");
        Ok(())
    }

    fn poll_input(&mut self) -> InputState {
        self.state.borrow_mut().scripted_input.pop_front().unwrap_or_default()
    }

    fn close_requested(&mut self) -> bool {
        let state = self.state.borrow();
        state.close_after.is_some_and(|frames| state.presented >= frames)
    }

    fn close(&mut self) {
        self.state.borrow_mut().closed += 1;
    }
}
