use std::{cell::RefCell, rc::Rc};

use mlua::{FromLua, Lua, Table, Value};

use super::bindings::bind;
use crate::{
    constants::{
        GUI_ACCENT_COLOR, GUI_BASE_COLOR, GUI_BORDER_COLOR, GUI_CHECK_BOX_PADDING, GUI_HOVER_COLOR,
        GUI_PANEL_COLOR, GUI_TEXT_COLOR, GUI_TEXT_SIZE, GUI_TITLE_BAR_HEIGHT,
    },
    render::{Canvas, Color, RenderError, text::measure_text},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    // bounds come straight from scripts, so all geometry saturates
    fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x
            && y >= self.y
            && x < self.x.saturating_add(self.width)
            && y < self.y.saturating_add(self.height)
    }

    fn shrink(&self, by: i32) -> Rect {
        let twice = by.saturating_mul(2);
        Rect {
            x: self.x.saturating_add(by),
            y: self.y.saturating_add(by),
            width: self.width.saturating_sub(twice),
            height: self.height.saturating_sub(twice),
        }
    }

    // offset that centers `inner` along a side of length `outer`
    fn center(start: i32, outer: i32, inner: i32) -> i32 {
        start.saturating_add(outer.saturating_sub(inner) / 2)
    }
}

impl FromLua for Rect {
    fn from_lua(value: Value, _: &Lua) -> mlua::Result<Self> {
        let table = match value {
            Value::Table(table) => table,
            other => {
                return Err(mlua::Error::runtime(format!(
                    "expected bounds {{x, y, width, height}}, got {}",
                    other.type_name()
                )));
            }
        };

        Ok(Rect {
            x: field(&table, 1, "x")?,
            y: field(&table, 2, "y")?,
            width: field(&table, 3, "width")?,
            height: field(&table, 4, "height")?,
        })
    }
}

fn field(table: &Table, index: i64, key: &str) -> mlua::Result<i32> {
    let value = match table.get::<Option<f64>>(index)? {
        Some(value) => value,
        None => table.get::<Option<f64>>(key)?.unwrap_or(0.0),
    };
    Ok(value as i32)
}

fn fill(canvas: &mut Canvas, bounds: &Rect, color: &Color) -> Result<(), RenderError> {
    canvas.draw_rectangle(bounds.x, bounds.y, bounds.width, bounds.height, color)
}

fn outline(canvas: &mut Canvas, bounds: &Rect) -> Result<(), RenderError> {
    canvas.draw_rectangle_lines(bounds.x, bounds.y, bounds.width, bounds.height, &GUI_BORDER_COLOR)
}

fn centered_text(canvas: &mut Canvas, bounds: &Rect, text: &str) -> Result<(), RenderError> {
    let (width, height) = measure_text(text, GUI_TEXT_SIZE);
    let x = Rect::center(bounds.x, bounds.width, width);
    let y = Rect::center(bounds.y, bounds.height, height);
    canvas.draw_text(text, x, y, GUI_TEXT_SIZE, &GUI_TEXT_COLOR)
}

pub fn label(canvas: &mut Canvas, bounds: &Rect, text: &str) -> Result<(), RenderError> {
    let (_, height) = measure_text(text, GUI_TEXT_SIZE);
    let y = Rect::center(bounds.y, bounds.height, height);
    canvas.draw_text(text, bounds.x, y, GUI_TEXT_SIZE, &GUI_TEXT_COLOR)
}

pub fn button(canvas: &mut Canvas, bounds: &Rect, text: &str) -> Result<bool, RenderError> {
    let input = *canvas.input();
    let hovered = bounds.contains(input.mouse_x, input.mouse_y);

    fill(canvas, bounds, if hovered { &GUI_HOVER_COLOR } else { &GUI_BASE_COLOR })?;
    outline(canvas, bounds)?;
    centered_text(canvas, bounds, text)?;

    Ok(hovered && input.mouse_pressed)
}

pub fn check_box(canvas: &mut Canvas, bounds: &Rect, text: &str, checked: bool) -> Result<bool, RenderError> {
    let input = *canvas.input();
    let checked = if input.mouse_pressed && bounds.contains(input.mouse_x, input.mouse_y) {
        !checked
    } else {
        checked
    };

    outline(canvas, bounds)?;
    if checked {
        fill(canvas, &bounds.shrink(GUI_CHECK_BOX_PADDING), &GUI_ACCENT_COLOR)?;
    }

    let text_bounds = Rect {
        x: bounds.x.saturating_add(bounds.width).saturating_add(GUI_CHECK_BOX_PADDING),
        ..*bounds
    };
    label(canvas, &text_bounds, text)?;

    Ok(checked)
}

pub fn panel(canvas: &mut Canvas, bounds: &Rect, title: Option<&str>) -> Result<(), RenderError> {
    fill(canvas, bounds, &GUI_PANEL_COLOR)?;
    outline(canvas, bounds)?;

    if let Some(title) = title {
        let bar = Rect {
            height: GUI_TITLE_BAR_HEIGHT.min(bounds.height),
            ..*bounds
        };
        fill(canvas, &bar, &GUI_BASE_COLOR)?;
        outline(canvas, &bar)?;

        let text_bounds = Rect {
            x: bar.x.saturating_add(GUI_CHECK_BOX_PADDING * 2),
            ..bar
        };
        label(canvas, &text_bounds, title)?;
    }

    Ok(())
}

pub fn progress_bar(canvas: &mut Canvas, bounds: &Rect, value: f64, min: f64, max: f64) -> Result<f64, RenderError> {
    let value = if max > min { value.clamp(min, max) } else { min };
    let fraction = if max > min { (value - min) / (max - min) } else { 0.0 };

    outline(canvas, bounds)?;
    let inner = bounds.shrink(2);
    let filled = Rect {
        width: (inner.width as f64 * fraction).round() as i32,
        ..inner
    };
    fill(canvas, &filled, &GUI_ACCENT_COLOR)?;

    Ok(value)
}

pub fn register(lua: &Lua, canvas: &Rc<RefCell<Canvas>>) -> mlua::Result<()> {
    bind(lua, canvas, "gui_label", |canvas, (bounds, text): (Rect, String)| {
        label(canvas, &bounds, &text)
    })?;
    bind(lua, canvas, "gui_button", |canvas, (bounds, text): (Rect, String)| {
        button(canvas, &bounds, &text)
    })?;
    bind(
        lua,
        canvas,
        "gui_check_box",
        |canvas, (bounds, text, checked): (Rect, String, Option<bool>)| {
            check_box(canvas, &bounds, &text, checked.unwrap_or(false))
        },
    )?;
    bind(lua, canvas, "gui_panel", |canvas, (bounds, title): (Rect, Option<String>)| {
        panel(canvas, &bounds, title.as_deref())
    })?;
    bind(
        lua,
        canvas,
        "gui_progress_bar",
        |canvas, (bounds, value, min, max): (Rect, f64, Option<f64>, Option<f64>)| {
            progress_bar(canvas, &bounds, value, min.unwrap_or(0.0), max.unwrap_or(1.0))
        },
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{CanvasOptions, HeadlessPresenter, InputState};

    const BOUNDS: Rect = Rect { x: 10, y: 10, width: 40, height: 20 };

    fn open_canvas(input: Option<InputState>) -> Canvas {
        let presenter = HeadlessPresenter::new();
        if let Some(input) = input {
            presenter.push_input(input);
        }

        let mut canvas = Canvas::new(Box::new(presenter), CanvasOptions { pace_frames: false, max_frames: None });
        canvas.init_window(100, 100, "gui").unwrap();
        // one frame so the scripted input becomes current
        canvas.begin_drawing().unwrap();
        canvas.end_drawing().unwrap();
        canvas
    }

    fn click_at(x: i32, y: i32) -> InputState {
        InputState { mouse_x: x, mouse_y: y, mouse_down: true, mouse_pressed: true, close_requested: false }
    }

    #[test]
    fn button_reports_press_inside_bounds() {
        let mut canvas = open_canvas(Some(click_at(20, 15)));
        assert!(button(&mut canvas, &BOUNDS, "ok").unwrap());

        let mut canvas = open_canvas(Some(click_at(5, 5)));
        assert!(!button(&mut canvas, &BOUNDS, "ok").unwrap());

        let mut canvas = open_canvas(None);
        assert!(!button(&mut canvas, &BOUNDS, "ok").unwrap());
    }

    #[test]
    fn hovered_button_is_highlighted() {
        let hover = InputState { mouse_x: 11, mouse_y: 11, ..InputState::default() };
        let mut canvas = open_canvas(Some(hover));
        assert!(!button(&mut canvas, &BOUNDS, "").unwrap());

        let pixel = canvas.picture().unwrap().get(12, 12).unwrap();
        assert_eq!(pixel, GUI_HOVER_COLOR);
    }

    #[test]
    fn check_box_toggles_on_press() {
        let mut canvas = open_canvas(Some(click_at(12, 12)));
        assert!(check_box(&mut canvas, &BOUNDS, "sound", false).unwrap());
        assert!(!check_box(&mut canvas, &BOUNDS, "sound", true).unwrap());

        let mut canvas = open_canvas(None);
        assert!(check_box(&mut canvas, &BOUNDS, "sound", true).unwrap());
    }

    #[test]
    fn progress_bar_clamps_value() {
        let mut canvas = open_canvas(None);
        assert_eq!(progress_bar(&mut canvas, &BOUNDS, 5.0, 0.0, 1.0).unwrap(), 1.0);
        assert_eq!(progress_bar(&mut canvas, &BOUNDS, -1.0, 0.0, 1.0).unwrap(), 0.0);
        assert_eq!(progress_bar(&mut canvas, &BOUNDS, 0.5, 1.0, 1.0).unwrap(), 1.0);
    }

    #[test]
    fn panel_draws_title_bar() {
        let mut canvas = open_canvas(None);
        panel(&mut canvas, &Rect { x: 0, y: 0, width: 80, height: 60 }, Some("")).unwrap();

        let picture = canvas.picture().unwrap();
        assert_eq!(picture.get(40, 10), Some(GUI_BASE_COLOR));
        assert_eq!(picture.get(40, 40), Some(GUI_PANEL_COLOR));
    }

    #[test]
    fn widgets_need_a_window() {
        let mut canvas = Canvas::new(
            Box::new(HeadlessPresenter::new()),
            CanvasOptions { pace_frames: false, max_frames: None },
        );
        assert!(matches!(button(&mut canvas, &BOUNDS, "ok"), Err(RenderError::NotInitialized)));
    }

    #[test]
    fn extreme_bounds_do_not_overflow() {
        let mut canvas = open_canvas(Some(click_at(i32::MAX, i32::MIN)));
        let corners = [
            Rect { x: i32::MAX, y: 0, width: 10, height: 10 },
            Rect { x: i32::MIN, y: i32::MIN, width: i32::MAX, height: i32::MAX },
            Rect { x: 0, y: i32::MAX, width: i32::MIN, height: i32::MIN },
            Rect { x: i32::MAX, y: i32::MAX, width: i32::MAX, height: i32::MAX },
        ];

        for bounds in &corners {
            label(&mut canvas, bounds, "edge").unwrap();
            button(&mut canvas, bounds, "edge").unwrap();
            check_box(&mut canvas, bounds, "edge", false).unwrap();
            panel(&mut canvas, bounds, Some("edge")).unwrap();
            progress_bar(&mut canvas, bounds, 0.5, 0.0, 1.0).unwrap();
        }
    }

    #[test]
    fn bounds_accept_keyed_and_array_tables() {
        let lua = Lua::new();
        let array: Rect = lua.load("{1, 2, 3, 4}").eval().unwrap();
        let keyed: Rect = lua.load("{x = 1.9, y = 2, width = 3, height = 4}").eval().unwrap();

        assert_eq!(array, Rect { x: 1, y: 2, width: 3, height: 4 });
        assert_eq!(keyed, array);
    }
}
