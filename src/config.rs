//! Host configuration.
//!
//! Values are layered: built-in defaults, then `script-canvas.toml` (or the
//! file named by `--config`), then `SCRIPT_CANVAS_*` environment variables,
//! then command line arguments.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
    constants::{DEFAULT_CONFIG_FILE, DEFAULT_SCRIPT, ENV_PREFIX},
    error::ConfigError,
};

pub const USAGE: &str = "\
usage: script-canvas [OPTIONS] [SCRIPT]

options:
    --config <FILE>     read configuration from FILE instead of script-canvas.toml
    --headless          draw into memory instead of opening a window
    --gui               register the immediate-mode gui functions
    --no-render         do not register the drawing functions
    --no-trace          report raw error values without a stack traceback
    --max-frames <N>    report window_should_close() after N presented frames
    -h, --help          print this message";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct HostConfig {
    pub host: HostSection,
    pub window: WindowSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostSection {
    /// Script executed from the top, relative to the working directory.
    pub script: PathBuf,
    /// Expose `init_window`, `draw_text` and the other drawing functions.
    pub render_bindings: bool,
    /// Expose the `gui_*` widget functions.
    pub gui_bindings: bool,
    /// Run the script under `xpcall` with a `debug.traceback` handler.
    pub trace_handler: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSection {
    pub headless: bool,
    pub max_frames: Option<u64>,
    pub pace_frames: bool,
}

impl Default for HostSection {
    fn default() -> Self {
        Self {
            script: PathBuf::from(DEFAULT_SCRIPT),
            render_bindings: true,
            gui_bindings: false,
            trace_handler: true,
        }
    }
}

impl Default for WindowSection {
    fn default() -> Self {
        Self {
            headless: false,
            max_frames: None,
            pace_frames: true,
        }
    }
}

impl HostConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads the default config file if there is one. A file that exists but
    /// does not parse is still an error.
    pub fn load_or_default() -> Result<Self, ConfigError> {
        let path = Path::new(DEFAULT_CONFIG_FILE);
        if path.exists() {
            Self::load_from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn merge_with_env(&mut self) -> Result<(), ConfigError> {
        self.merge_with(|key| std::env::var(key).ok())
    }

    pub fn merge_with<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            let key = format!("{ENV_PREFIX}{name}");
            lookup(&key).map(|value| (key, value))
        };

        if let Some((_, script)) = var("SCRIPT") {
            self.host.script = PathBuf::from(script);
        }
        if let Some((key, value)) = var("HEADLESS") {
            self.window.headless = parse_flag(&key, &value)?;
        }
        if let Some((key, value)) = var("GUI") {
            self.host.gui_bindings = parse_flag(&key, &value)?;
        }
        if let Some((key, value)) = var("TRACE") {
            self.host.trace_handler = parse_flag(&key, &value)?;
        }
        if let Some((key, value)) = var("MAX_FRAMES") {
            self.window.max_frames = Some(parse_number(&key, &value)?);
        }

        Ok(())
    }

    pub fn apply_args(&mut self, args: &CliArgs) {
        if let Some(script) = &args.script {
            self.host.script = script.clone();
        }
        if args.headless {
            self.window.headless = true;
        }
        if args.gui {
            self.host.gui_bindings = true;
        }
        if args.no_render {
            self.host.render_bindings = false;
        }
        if args.no_trace {
            self.host.trace_handler = false;
        }
        if let Some(max_frames) = args.max_frames {
            self.window.max_frames = Some(max_frames);
        }
    }
}

fn parse_flag(name: &str, value: &str) -> Result<bool, ConfigError> {
    match value {
        "1" => Ok(true),
        "0" => Ok(false),
        value if value.eq_ignore_ascii_case("true") => Ok(true),
        value if value.eq_ignore_ascii_case("false") => Ok(false),
        _ => Err(ConfigError::InvalidValue { name: name.to_string(), value: value.to_string() }),
    }
}

fn parse_number(name: &str, value: &str) -> Result<u64, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::InvalidValue { name: name.to_string(), value: value.to_string() })
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliArgs {
    pub config: Option<PathBuf>,
    pub script: Option<PathBuf>,
    pub headless: bool,
    pub gui: bool,
    pub no_render: bool,
    pub no_trace: bool,
    pub max_frames: Option<u64>,
    pub help: bool,
}

impl CliArgs {
    pub fn parse<I>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut parsed = Self::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-h" | "--help" => parsed.help = true,
                "--headless" => parsed.headless = true,
                "--gui" => parsed.gui = true,
                "--no-render" => parsed.no_render = true,
                "--no-trace" => parsed.no_trace = true,
                "--config" => {
                    let value = args
                        .next()
                        .ok_or_else(|| ConfigError::Usage("--config needs a file path".to_string()))?;
                    parsed.config = Some(PathBuf::from(value));
                }
                "--max-frames" => {
                    let value = args
                        .next()
                        .ok_or_else(|| ConfigError::Usage("--max-frames needs a number".to_string()))?;
                    parsed.max_frames = Some(parse_number("--max-frames", &value)?);
                }
                flag if flag.starts_with('-') => {
                    return Err(ConfigError::Usage(format!("unknown option '{flag}'")));
                }
                path => {
                    if parsed.script.is_some() {
                        return Err(ConfigError::Usage(format!("unexpected argument '{path}'")));
                    }
                    parsed.script = Some(PathBuf::from(path));
                }
            }
        }

        Ok(parsed)
    }
}

/// Resolves the full configuration for one run.
pub fn load(args: &CliArgs) -> Result<HostConfig, ConfigError> {
    let mut config = match &args.config {
        Some(path) => HostConfig::load_from_file(path)?,
        None => HostConfig::load_or_default()?,
    };

    config.merge_with_env()?;
    config.apply_args(args);
    Ok(config)
}
