use std::convert::Infallible;

use embedded_graphics::{
    mono_font::{
        MonoFont, MonoTextStyle,
        ascii::{FONT_6X10, FONT_8X13, FONT_9X15, FONT_10X20},
    },
    pixelcolor::Rgb888,
    prelude::*,
    text::{Baseline, Text},
};

use super::{Color, Picture};
use crate::constants::MAX_TEXT_SCALE;

// maps font coordinates onto the picture, each font pixel becomes a scale x scale block
struct TextTarget<'a> {
    picture: &'a mut Picture,
    origin: (isize, isize),
    scale: isize,
    alpha: u8,
}

impl OriginDimensions for TextTarget<'_> {
    fn size(&self) -> Size {
        Size::new(self.picture.xres as u32, self.picture.yres as u32)
    }
}

impl DrawTarget for TextTarget<'_> {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            let color = Color::new(color.r(), color.g(), color.b(), self.alpha);
            let x = self.origin.0.saturating_add((point.x as isize).saturating_mul(self.scale));
            let y = self.origin.1.saturating_add((point.y as isize).saturating_mul(self.scale));
            self.picture.fill_rect(x, y, self.scale, self.scale, &color);
        }

        Ok(())
    }
}

// closest bitmap font for a requested pixel height, scaled up past the largest one
fn select_font(font_size: i32) -> (&'static MonoFont<'static>, isize) {
    match font_size.max(1) {
        ..=10 => (&FONT_6X10, 1),
        11..=13 => (&FONT_8X13, 1),
        14..=15 => (&FONT_9X15, 1),
        16..=29 => (&FONT_10X20, 1),
        size => (&FONT_10X20, (size.saturating_add(10) / 20).min(MAX_TEXT_SCALE) as isize),
    }
}

pub fn draw_text(picture: &mut Picture, text: &str, x: i32, y: i32, font_size: i32, color: &Color) {
    if text.is_empty() || color.a == 0 {
        return;
    }

    let (font, scale) = select_font(font_size);
    let style = MonoTextStyle::new(font, Rgb888::new(color.r, color.g, color.b));
    let mut target = TextTarget {
        picture,
        origin: (x as isize, y as isize),
        scale,
        alpha: color.a,
    };

    let _ = Text::with_baseline(text, Point::zero(), style, Baseline::Top).draw(&mut target);
}

pub fn measure_text(text: &str, font_size: i32) -> (i32, i32) {
    let (font, scale) = select_font(font_size);
    let advance = (font.character_size.width + font.character_spacing) as i32;
    let line_height = font.character_size.height as i32;

    let lines = text.split('\n');
    let mut widest: i32 = 0;
    let mut count: i32 = 0;
    for line in lines {
        widest = widest.max(line.chars().count() as i32);
        count += 1;
    }

    let scale = scale as i32;
    let width = widest
        .saturating_mul(advance)
        .saturating_sub(font.character_spacing as i32)
        .max(0);
    (width.saturating_mul(scale), count.saturating_mul(line_height).saturating_mul(scale))
}
