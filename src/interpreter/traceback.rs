use mlua::{Function, Lua, Table, Value};

use super::callback_message;
use crate::constants::TRACEBACK_LEVEL;

/// Message handler for `xpcall`: rewrites the error value into
/// `debug.traceback(err, 2)`. When `debug.traceback` is gone the handler fails
/// too and that secondary error replaces the original one.
pub fn create_handler(lua: &Lua) -> mlua::Result<Function> {
    lua.create_function(|lua, error: Value| {
        // binding errors arrive as mlua userdata, which traceback would pass through untouched
        let error = match error {
            Value::Error(error) => Value::String(lua.create_string(callback_message(&error))?),
            other => other,
        };

        let debug: Table = lua.globals().get("debug")?;
        let traceback: Function = debug.get("traceback")?;
        traceback.call::<Value>((error, TRACEBACK_LEVEL))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mlua::{LuaOptions, StdLib};

    fn lua() -> Lua {
        unsafe { Lua::unsafe_new_with(StdLib::ALL, LuaOptions::new()) }
    }

    fn run_traced(lua: &Lua, source: &str) -> (bool, Value) {
        let chunk = lua.load(source).set_name("=traced").into_function().unwrap();
        let xpcall: Function = lua.globals().get("xpcall").unwrap();
        xpcall.call((chunk, create_handler(lua).unwrap())).unwrap()
    }

    #[test]
    fn handler_appends_a_stack_traceback() {
        let lua = lua();
        let (ok, message) = run_traced(
            &lua,
            "local function inner() error('deep failure') end\nlocal function outer() inner() end\nouter()",
        );

        assert!(!ok);
        let message = match message {
            Value::String(text) => text.to_string_lossy().to_string(),
            other => panic!("expected a string, got {}", other.type_name()),
        };
        assert!(message.starts_with("traced:1: deep failure"), "{message}");
        assert!(message.contains("stack traceback:"), "{message}");
        assert!(message.lines().count() > 2, "{message}");
    }

    #[test]
    fn non_string_errors_pass_through() {
        let lua = lua();
        let (ok, message) = run_traced(&lua, "error({ code = 7 })");

        assert!(!ok);
        let table = message.as_table().unwrap();
        assert_eq!(table.get::<i64>("code").unwrap(), 7);
    }

    #[test]
    fn rust_callback_errors_are_traced_as_text() {
        let lua = lua();
        let fail = lua
            .create_function(|_, ()| Err::<(), _>(mlua::Error::external("window is not initialized")))
            .unwrap();
        lua.globals().set("fail", fail).unwrap();

        let (ok, message) = run_traced(&lua, "fail()");
        assert!(!ok);
        let message = match message {
            Value::String(text) => text.to_string_lossy().to_string(),
            other => panic!("expected a string, got {}", other.type_name()),
        };
        assert!(message.starts_with("window is not initialized\nstack traceback:"), "{message}");
        assert_eq!(message.matches("stack traceback:").count(), 1, "{message}");
    }

    #[test]
    fn missing_debug_library_masks_the_error() {
        let lua = lua();
        lua.globals().set("debug", Value::Nil).unwrap();
        let (ok, message) = run_traced(&lua, "error('original')");

        assert!(!ok);
        let text = lua.globals().get::<Function>("tostring").unwrap().call::<String>(message).unwrap();
        assert!(!text.starts_with("traced:1: original"), "{text}");
    }
}
