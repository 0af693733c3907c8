mod bindings;
mod gui;
mod traceback;

use std::{
    cell::RefCell,
    fs,
    io::Write,
    path::Path,
    rc::Rc,
};

use mlua::{Function, Lua, LuaOptions, StdLib, Value};
use tracing::{debug, error, info};

use crate::{
    config::HostConfig,
    constants::{EXIT_FAILURE, EXIT_SUCCESS},
    error::HostError,
    render::{Canvas, CanvasOptions, Presenter},
};

const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Success,
    Failed(String),
}

impl RunOutcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            RunOutcome::Success => EXIT_SUCCESS,
            RunOutcome::Failed(_) => EXIT_FAILURE,
        }
    }
}

// START -> InterpreterReady -> ScriptLoaded | LoadFailed -> Executed | ExecFailed
#[derive(Debug, Clone, Copy)]
enum Stage {
    InterpreterReady,
    ScriptLoaded,
    LoadFailed,
    Executed,
    ExecFailed,
}

/// One interpreter plus the canvas its bindings draw into. Dropping the host
/// closes the interpreter and any window the script left open.
pub struct ScriptHost {
    lua: Lua,
    canvas: Rc<RefCell<Canvas>>,
    trace_handler: bool,
}

impl ScriptHost {
    pub fn new(config: &HostConfig, presenter: Box<dyn Presenter>) -> Result<Self, HostError> {
        // SAFETY: the safe set plus `debug`, which debug.traceback lives in. Outside safe
        // mode `require` and `package.loadlib` can load C modules, as in the stock interpreter.
        let lua = unsafe { Lua::unsafe_new_with(StdLib::ALL_SAFE | StdLib::DEBUG, LuaOptions::new()) };

        let canvas = Rc::new(RefCell::new(Canvas::new(
            presenter,
            CanvasOptions {
                pace_frames: config.window.pace_frames,
                max_frames: config.window.max_frames,
            },
        )));

        if config.host.render_bindings {
            bindings::register(&lua, &canvas)?;
        }
        if config.host.gui_bindings {
            gui::register(&lua, &canvas)?;
        }

        debug!(
            stage = ?Stage::InterpreterReady,
            render = config.host.render_bindings,
            gui = config.host.gui_bindings,
            trace = config.host.trace_handler,
            "interpreter ready"
        );

        Ok(Self {
            lua,
            canvas,
            trace_handler: config.host.trace_handler,
        })
    }

    pub fn lua(&self) -> &Lua {
        &self.lua
    }

    /// Loads `path` and runs it from the top under a protected call.
    pub fn run_script<P: AsRef<Path>>(&self, path: P) -> RunOutcome {
        let path = path.as_ref();

        let outcome = match self.load(path) {
            Err(message) => {
                debug!(stage = ?Stage::LoadFailed, script = %path.display(), "load failed");
                RunOutcome::Failed(message)
            }
            Ok(chunk) => {
                debug!(stage = ?Stage::ScriptLoaded, script = %path.display(), "script loaded");
                match self.execute(chunk) {
                    Ok(()) => {
                        debug!(stage = ?Stage::Executed, "script finished cleanly");
                        RunOutcome::Success
                    }
                    Err(message) => {
                        debug!(stage = ?Stage::ExecFailed, "script raised an error");
                        RunOutcome::Failed(message)
                    }
                }
            }
        };

        // scripts that return or fail mid loop leave the window open
        if let Ok(mut canvas) = self.canvas.try_borrow_mut()
            && canvas.is_open()
        {
            canvas.close_window();
        }

        outcome
    }

    fn load(&self, path: &Path) -> Result<Function, String> {
        let mut source = fs::read(path).map_err(|e| format!("cannot open {}: {}", path.display(), e))?;
        skip_prefix(&mut source);

        self.lua
            .load(source)
            .set_name(format!("@{}", path.display()))
            .into_function()
            .map_err(|e| match e {
                mlua::Error::SyntaxError { message, .. } => message,
                other => other.to_string(),
            })
    }

    fn execute(&self, chunk: Function) -> Result<(), String> {
        let globals = self.lua.globals();

        let result: mlua::Result<(bool, Value)> = if self.trace_handler {
            traceback::create_handler(&self.lua).and_then(|handler| {
                let xpcall: Function = globals.get("xpcall")?;
                xpcall.call((chunk, handler))
            })
        } else {
            globals
                .get::<Function>("pcall")
                .and_then(|pcall| pcall.call(chunk))
        };

        match result {
            Ok((true, _)) => Ok(()),
            Ok((false, error)) => Err(self.describe(error)),
            Err(error) => Err(error.to_string()),
        }
    }

    // same text the stock lua interpreter prints for an error value
    fn describe(&self, error: Value) -> String {
        if let Value::Error(error) = &error {
            return callback_message(error);
        }

        let type_name = error.type_name();

        self.lua
            .globals()
            .get::<Function>("tostring")
            .and_then(|tostring| tostring.call::<String>(error))
            .unwrap_or_else(|_| format!("(error object is a {type_name} value)"))
    }
}

/// Message of an error raised by a rust binding. mlua wraps those in
/// `CallbackError` and its display carries mlua's own traceback, so only the
/// innermost cause is kept.
pub(crate) fn callback_message(error: &mlua::Error) -> String {
    match error {
        mlua::Error::CallbackError { cause, .. } => callback_message(cause),
        other => other.to_string(),
    }
}

// drops a utf-8 bom and blanks a leading '#' line, keeping line numbers intact
fn skip_prefix(source: &mut Vec<u8>) {
    if source.starts_with(&UTF8_BOM) {
        source.drain(..UTF8_BOM.len());
    }

    if source.first() == Some(&b'#') {
        let end = source.iter().position(|&byte| byte == b'\n').unwrap_or(source.len());
        source.drain(..end);
    }
}

/// Runs the configured script and prints the error line to `out` on failure.
/// Returns the process exit code.
pub fn run(config: &HostConfig, presenter: Box<dyn Presenter>, out: &mut dyn Write) -> Result<i32, HostError> {
    let host = ScriptHost::new(config, presenter)?;
    let outcome = host.run_script(&config.host.script);
    drop(host);

    if let RunOutcome::Failed(message) = &outcome {
        writeln!(out, "{message}")?;
        out.flush()?;
    }

    info!(script = %config.host.script.display(), code = outcome.exit_code(), "script finished");
    Ok(outcome.exit_code())
}

/// Like [`run`], but host failures are logged and reported on `out` too, so
/// the result is always an exit code.
pub fn run_to_exit_code(config: &HostConfig, presenter: Box<dyn Presenter>, out: &mut dyn Write) -> i32 {
    match run(config, presenter, out) {
        Ok(code) => code,
        Err(e) => {
            error!("{e}");
            if let Err(write_error) = writeln!(out, "{e}") {
                error!(%write_error, "failed to report host error");
            }
            EXIT_FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::render::HeadlessPresenter;

    fn host(trace_handler: bool) -> ScriptHost {
        let mut config = HostConfig::default();
        config.host.trace_handler = trace_handler;
        config.window.pace_frames = false;
        ScriptHost::new(&config, Box::new(HeadlessPresenter::new())).unwrap()
    }

    fn script(source: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.lua");
        fs::write(&path, source).unwrap();
        (dir, path)
    }

    #[test]
    fn skip_prefix_blanks_shebang_line() {
        let mut source = b"#!/usr/bin/env lua\nprint(1)".to_vec();
        skip_prefix(&mut source);
        assert_eq!(source, b"\nprint(1)".to_vec());

        let mut source = [&UTF8_BOM[..], b"x = 1"].concat();
        skip_prefix(&mut source);
        assert_eq!(source, b"x = 1".to_vec());
    }

    #[test]
    fn shebang_keeps_line_numbers() {
        let (_dir, path) = script("#!/usr/bin/env script-canvas\n\nerror('third line')\n");
        match host(false).run_script(&path) {
            RunOutcome::Failed(message) => assert!(message.ends_with(":3: third line"), "{message}"),
            RunOutcome::Success => panic!("script should fail"),
        }
    }

    #[test]
    fn return_values_are_ignored() {
        let (_dir, path) = script("return 1, 2, 3");
        assert_eq!(host(true).run_script(&path), RunOutcome::Success);
    }

    #[test]
    fn table_errors_use_tostring() {
        let (_dir, path) = script("error(setmetatable({}, { __tostring = function() return 'custom' end }))");
        assert_eq!(host(false).run_script(&path), RunOutcome::Failed("custom".to_string()));
    }

    #[test]
    fn unprintable_errors_fall_back_to_type_name() {
        let (_dir, path) = script(
            "error(setmetatable({}, { __tostring = function() error('nope') end }))",
        );
        assert_eq!(
            host(false).run_script(&path),
            RunOutcome::Failed("(error object is a table value)".to_string())
        );
    }

    #[test]
    fn standard_library_is_loaded() {
        let (_dir, path) = script(
            "assert(string.format('%d', 4) == '4')\nassert(math.floor(2.5) == 2)\nassert(type(debug.traceback) == 'function')",
        );
        assert_eq!(host(true).run_script(&path), RunOutcome::Success);
    }

    #[test]
    fn binding_errors_print_only_their_message() {
        let (_dir, path) = script("end_drawing()");
        assert_eq!(
            host(false).run_script(&path),
            RunOutcome::Failed("window is not initialized".to_string())
        );
    }

    #[test]
    fn nested_callback_errors_unwrap_to_the_cause() {
        let cause = mlua::Error::runtime("frame buffer gone");
        let wrapped = mlua::Error::CallbackError {
            traceback: "stack traceback:\n\t[C]: in ?".to_string(),
            cause: std::sync::Arc::new(mlua::Error::CallbackError {
                traceback: String::new(),
                cause: std::sync::Arc::new(cause),
            }),
        };
        assert_eq!(callback_message(&wrapped), "frame buffer gone");
    }

    // a writer that refuses everything
    struct Closed;

    impl Write for Closed {
        fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn unwritable_output_still_fails_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = HostConfig::default();
        config.window.pace_frames = false;
        config.host.script = dir.path().join("missing.lua");

        let code = run_to_exit_code(&config, Box::new(HeadlessPresenter::new()), &mut Closed);
        assert_eq!(code, EXIT_FAILURE);
    }

    #[test]
    fn run_closes_a_window_left_open() {
        let presenter = HeadlessPresenter::new();
        let mut config = HostConfig::default();
        config.window.pace_frames = false;
        let (_dir, path) = script("init_window(10, 10, 'left open')\nbegin_drawing()");
        config.host.script = path;

        let mut out = Vec::new();
        let code = run(&config, Box::new(presenter.clone()), &mut out).unwrap();
        assert_eq!(code, 0);
        assert!(out.is_empty());
        assert_eq!(presenter.state().closed, 1);
    }
}
