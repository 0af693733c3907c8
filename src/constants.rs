use crate::render::Color;

/* CONFIG */
pub const DEFAULT_SCRIPT: &str = "src/main.lua";
pub const DEFAULT_CONFIG_FILE: &str = "script-canvas.toml";
pub const DEFAULT_WINDOW_TITLE: &str = "script-canvas";
pub const DEFAULT_FONT_SIZE: i32 = 10;
// glyphs past this many pixels per font pixel cover any frame buffer we allow
pub const MAX_TEXT_SCALE: i32 = 64;
// per side, keeps the rgba frame buffer at or under 1 GiB
pub const MAX_WINDOW_DIMENSION: u32 = 16384;
pub const CANVAS_IMAGE_NAME: &str = "canvas";
// how many stack levels of the handler's own machinery debug.traceback skips
pub const TRACEBACK_LEVEL: i32 = 2;
pub const ENV_PREFIX: &str = "SCRIPT_CANVAS_";

/* EXIT CODES */
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
pub const EXIT_USAGE: i32 = 2;

/* COLORS */
pub const LIGHTGRAY: Color = Color::new(200, 200, 200, 255);
pub const GRAY: Color = Color::new(130, 130, 130, 255);
pub const DARKGRAY: Color = Color::new(80, 80, 80, 255);
pub const YELLOW: Color = Color::new(253, 249, 0, 255);
pub const GOLD: Color = Color::new(255, 203, 0, 255);
pub const ORANGE: Color = Color::new(255, 161, 0, 255);
pub const PINK: Color = Color::new(255, 109, 194, 255);
pub const RED: Color = Color::new(230, 41, 55, 255);
pub const MAROON: Color = Color::new(190, 33, 55, 255);
pub const GREEN: Color = Color::new(0, 228, 48, 255);
pub const LIME: Color = Color::new(0, 158, 47, 255);
pub const DARKGREEN: Color = Color::new(0, 117, 44, 255);
pub const SKYBLUE: Color = Color::new(102, 191, 255, 255);
pub const BLUE: Color = Color::new(0, 121, 241, 255);
pub const DARKBLUE: Color = Color::new(0, 82, 172, 255);
pub const PURPLE: Color = Color::new(200, 122, 255, 255);
pub const VIOLET: Color = Color::new(135, 60, 190, 255);
pub const BEIGE: Color = Color::new(211, 176, 131, 255);
pub const BROWN: Color = Color::new(127, 106, 79, 255);
pub const WHITE: Color = Color::new(255, 255, 255, 255);
pub const BLACK: Color = Color::new(0, 0, 0, 255);
pub const BLANK: Color = Color::new(0, 0, 0, 0);
pub const MAGENTA: Color = Color::new(255, 0, 255, 255);
pub const RAYWHITE: Color = Color::new(245, 245, 245, 255);

pub const NAMED_COLORS: [(&str, Color); 24] = [
    ("LIGHTGRAY", LIGHTGRAY),
    ("GRAY", GRAY),
    ("DARKGRAY", DARKGRAY),
    ("YELLOW", YELLOW),
    ("GOLD", GOLD),
    ("ORANGE", ORANGE),
    ("PINK", PINK),
    ("RED", RED),
    ("MAROON", MAROON),
    ("GREEN", GREEN),
    ("LIME", LIME),
    ("DARKGREEN", DARKGREEN),
    ("SKYBLUE", SKYBLUE),
    ("BLUE", BLUE),
    ("DARKBLUE", DARKBLUE),
    ("PURPLE", PURPLE),
    ("VIOLET", VIOLET),
    ("BEIGE", BEIGE),
    ("BROWN", BROWN),
    ("WHITE", WHITE),
    ("BLACK", BLACK),
    ("BLANK", BLANK),
    ("MAGENTA", MAGENTA),
    ("RAYWHITE", RAYWHITE),
];

/* GUI STYLE */
pub const GUI_BASE_COLOR: Color = Color::new(201, 201, 201, 255);
pub const GUI_HOVER_COLOR: Color = Color::new(201, 239, 254, 255);
pub const GUI_BORDER_COLOR: Color = Color::new(131, 131, 131, 255);
pub const GUI_TEXT_COLOR: Color = Color::new(104, 104, 104, 255);
pub const GUI_PANEL_COLOR: Color = Color::new(245, 245, 245, 255);
pub const GUI_ACCENT_COLOR: Color = Color::new(151, 232, 255, 255);
pub const GUI_TEXT_SIZE: i32 = 10;
pub const GUI_TITLE_BAR_HEIGHT: i32 = 24;
pub const GUI_CHECK_BOX_PADDING: i32 = 4;
