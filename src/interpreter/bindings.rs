use std::{cell::RefCell, rc::Rc};

use mlua::{FromLua, FromLuaMulti, IntoLuaMulti, Lua, Table, Value};
use rand::Rng;

use crate::{
    constants::{DEFAULT_FONT_SIZE, DEFAULT_WINDOW_TITLE, NAMED_COLORS},
    render::{Canvas, Color, RenderError},
};

impl FromLua for Color {
    fn from_lua(value: Value, _: &Lua) -> mlua::Result<Self> {
        let table = match value {
            Value::Table(table) => table,
            other => {
                return Err(mlua::Error::runtime(format!(
                    "expected a color table {{r, g, b[, a]}}, got {}",
                    other.type_name()
                )));
            }
        };

        Ok(Color::new(
            channel(&table, 1, "r")?.unwrap_or(0),
            channel(&table, 2, "g")?.unwrap_or(0),
            channel(&table, 3, "b")?.unwrap_or(0),
            channel(&table, 4, "a")?.unwrap_or(255),
        ))
    }
}

// accepts both {255, 0, 0} and {r = 255, g = 0, b = 0}
fn channel(table: &Table, index: i64, key: &str) -> mlua::Result<Option<u8>> {
    match table.get::<Option<u8>>(index)? {
        Some(value) => Ok(Some(value)),
        None => table.get::<Option<u8>>(key),
    }
}

pub fn color_table(lua: &Lua, color: &Color) -> mlua::Result<Table> {
    let table = lua.create_table()?;
    table.set("r", color.r)?;
    table.set("g", color.g)?;
    table.set("b", color.b)?;
    table.set("a", color.a)?;
    Ok(table)
}

/// Registers `name` as a global that runs `f` against the shared canvas.
/// Render errors surface as catchable lua errors.
pub fn bind<A, R, F>(lua: &Lua, canvas: &Rc<RefCell<Canvas>>, name: &str, f: F) -> mlua::Result<()>
where
    A: FromLuaMulti,
    R: IntoLuaMulti,
    F: Fn(&mut Canvas, A) -> Result<R, RenderError> + 'static,
{
    let canvas = Rc::clone(canvas);
    let function = lua.create_function(move |_, args: A| {
        let mut canvas = canvas.try_borrow_mut().map_err(mlua::Error::external)?;
        f(&mut canvas, args).map_err(mlua::Error::external)
    })?;

    lua.globals().set(name, function)
}

pub fn register(lua: &Lua, canvas: &Rc<RefCell<Canvas>>) -> mlua::Result<()> {
    /* WINDOW */
    bind(lua, canvas, "init_window", |canvas, (width, height, title): (i32, i32, Option<String>)| {
        canvas.init_window(width, height, title.as_deref().unwrap_or(DEFAULT_WINDOW_TITLE))
    })?;
    bind(lua, canvas, "close_window", |canvas, ()| {
        canvas.close_window();
        Ok(())
    })?;
    bind(lua, canvas, "set_target_fps", |canvas, fps: i32| {
        canvas.set_target_fps(fps);
        Ok(())
    })?;
    bind(lua, canvas, "window_should_close", |canvas, ()| Ok(canvas.window_should_close()))?;
    bind(lua, canvas, "get_screen_width", |canvas, ()| Ok(canvas.screen_width()))?;
    bind(lua, canvas, "get_screen_height", |canvas, ()| Ok(canvas.screen_height()))?;

    /* FRAMES */
    bind(lua, canvas, "begin_drawing", |canvas, ()| canvas.begin_drawing())?;
    bind(lua, canvas, "end_drawing", |canvas, ()| canvas.end_drawing())?;
    bind(lua, canvas, "take_screenshot", |canvas, path: String| canvas.take_screenshot(path))?;

    /* DRAWING */
    bind(lua, canvas, "clear_background", |canvas, color: Color| canvas.clear_background(&color))?;
    bind(
        lua,
        canvas,
        "draw_text",
        |canvas, (text, x, y, font_size, color): (String, i32, i32, Option<i32>, Color)| {
            canvas.draw_text(&text, x, y, font_size.unwrap_or(DEFAULT_FONT_SIZE), &color)
        },
    )?;
    bind(
        lua,
        canvas,
        "draw_rectangle",
        |canvas, (x, y, width, height, color): (i32, i32, i32, i32, Color)| {
            canvas.draw_rectangle(x, y, width, height, &color)
        },
    )?;
    bind(
        lua,
        canvas,
        "draw_rectangle_lines",
        |canvas, (x, y, width, height, color): (i32, i32, i32, i32, Color)| {
            canvas.draw_rectangle_lines(x, y, width, height, &color)
        },
    )?;

    /* INPUT */
    bind(lua, canvas, "get_mouse_x", |canvas, ()| Ok(canvas.input().mouse_x))?;
    bind(lua, canvas, "get_mouse_y", |canvas, ()| Ok(canvas.input().mouse_y))?;
    bind(lua, canvas, "is_mouse_button_pressed", |canvas, ()| Ok(canvas.input().mouse_pressed))?;
    bind(lua, canvas, "is_mouse_button_down", |canvas, ()| Ok(canvas.input().mouse_down))?;

    /* MISC */
    lua.globals().set(
        "get_random_value",
        lua.create_function(|_, (min, max): (i64, i64)| {
            let (low, high) = if min <= max { (min, max) } else { (max, min) };
            Ok(rand::rng().random_range(low..=high))
        })?,
    )?;

    let globals = lua.globals();
    for (name, color) in NAMED_COLORS.iter() {
        globals.set(*name, color_table(lua, color)?)?;
    }

    Ok(())
}
