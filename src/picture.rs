use std::path::Path;

use image::{ImageError, RgbaImage};

use crate::render::Color;

// rgba8 frame buffer, row major, origin at the top left
pub struct Picture {
    pub xres: usize,
    pub yres: usize,
    pub data: Vec<u8>,
}

impl Picture {
    pub fn new(xres: usize, yres: usize, background: &Color) -> Self {
        let mut picture = Self {
            xres,
            yres,
            data: vec![0; xres * yres * 4],
        };
        picture.clear(background);
        picture
    }

    /// Like [`Picture::new`], but `None` when the buffer size overflows or the
    /// allocation is refused.
    pub fn try_new(xres: usize, yres: usize, background: &Color) -> Option<Self> {
        let len = xres.checked_mul(yres)?.checked_mul(4)?;
        let mut data = Vec::new();
        data.try_reserve_exact(len).ok()?;
        data.resize(len, 0);

        let mut picture = Self { xres, yres, data };
        picture.clear(background);
        Some(picture)
    }

    pub fn clear(&mut self, color: &Color) {
        for pixel in self.data.chunks_exact_mut(4) {
            pixel.copy_from_slice(&color.to_array());
        }
    }

    pub fn get(&self, x: usize, y: usize) -> Option<Color> {
        if x >= self.xres || y >= self.yres {
            return None;
        }

        let i = (y * self.xres + x) * 4;
        Some(Color::new(self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]))
    }

    // source-over blend, anything off screen is dropped
    pub fn plot(&mut self, x: isize, y: isize, color: &Color) {
        if x < 0 || y < 0 || x as usize >= self.xres || y as usize >= self.yres || color.a == 0 {
            return;
        }

        let i = (y as usize * self.xres + x as usize) * 4;

        if color.a == 255 {
            self.data[i..i + 4].copy_from_slice(&color.to_array());
            return;
        }

        let alpha = color.a as u32;
        let inverse = 255 - alpha;
        let src = [color.r, color.g, color.b];
        for channel in 0..3 {
            let dst = self.data[i + channel] as u32;
            self.data[i + channel] = ((src[channel] as u32 * alpha + dst * inverse) / 255) as u8;
        }
        let dst_alpha = self.data[i + 3] as u32;
        self.data[i + 3] = (alpha + dst_alpha * inverse / 255).min(255) as u8;
    }

    pub fn fill_rect(&mut self, x: isize, y: isize, width: isize, height: isize, color: &Color) {
        if width <= 0 || height <= 0 {
            return;
        }

        // clip first so huge rectangles don't iterate off screen
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = x.saturating_add(width).min(self.xres as isize);
        let y1 = y.saturating_add(height).min(self.yres as isize);

        for py in y0..y1 {
            for px in x0..x1 {
                self.plot(px, py, color);
            }
        }
    }

    pub fn stroke_rect(&mut self, x: isize, y: isize, width: isize, height: isize, thickness: isize, color: &Color) {
        if width <= 0 || height <= 0 || thickness <= 0 {
            return;
        }

        let t = thickness.min(width).min(height);
        self.fill_rect(x, y, width, t, color);
        self.fill_rect(x, y + height - t, width, t, color);
        self.fill_rect(x, y + t, t, height - 2 * t, color);
        self.fill_rect(x + width - t, y + t, t, height - 2 * t, color);
    }

    pub fn to_image(&self) -> RgbaImage {
        // data length always matches xres * yres * 4
        RgbaImage::from_raw(self.xres as u32, self.yres as u32, self.data.clone())
            .unwrap_or_else(|| RgbaImage::new(self.xres as u32, self.yres as u32))
    }

    pub fn save_as_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ImageError> {
        self.to_image().save(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{BLACK, BLANK, RED, WHITE};

    #[test]
    fn new_picture_is_filled_with_background() {
        let picture = Picture::new(3, 2, &WHITE);
        assert_eq!(picture.data.len(), 3 * 2 * 4);
        assert!(picture.data.iter().all(|&byte| byte == 255));
    }

    #[test]
    fn try_new_refuses_overflowing_sizes() {
        assert!(Picture::try_new(usize::MAX, 2, &WHITE).is_none());
        assert!(Picture::try_new(usize::MAX / 4 + 1, 1, &WHITE).is_none());

        let picture = Picture::try_new(2, 3, &RED).unwrap();
        assert_eq!(picture.get(1, 2), Some(RED));
    }

    #[test]
    fn plot_ignores_out_of_bounds() {
        let mut picture = Picture::new(2, 2, &WHITE);
        picture.plot(-1, 0, &BLACK);
        picture.plot(0, 5, &BLACK);
        picture.plot(2, 1, &BLACK);
        assert!(picture.data.iter().all(|&byte| byte == 255));
    }

    #[test]
    fn plot_blends_translucent_colors() {
        let mut picture = Picture::new(1, 1, &BLACK);
        picture.plot(0, 0, &Color::new(255, 255, 255, 128));
        let pixel = picture.get(0, 0).unwrap();
        assert_eq!(pixel.r, 128);
        assert_eq!(pixel.a, 255);

        picture.plot(0, 0, &BLANK);
        assert_eq!(picture.get(0, 0).unwrap().r, 128);
    }

    #[test]
    fn fill_rect_clips_to_picture() {
        let mut picture = Picture::new(4, 4, &WHITE);
        picture.fill_rect(-10, 2, 100, 100, &RED);
        assert_eq!(picture.get(0, 1), Some(WHITE));
        assert_eq!(picture.get(0, 2), Some(RED));
        assert_eq!(picture.get(3, 3), Some(RED));
    }

    #[test]
    fn stroke_rect_leaves_the_inside_alone() {
        let mut picture = Picture::new(5, 5, &WHITE);
        picture.stroke_rect(0, 0, 5, 5, 1, &BLACK);
        assert_eq!(picture.get(0, 0), Some(BLACK));
        assert_eq!(picture.get(4, 2), Some(BLACK));
        assert_eq!(picture.get(2, 2), Some(WHITE));
    }

    #[test]
    fn save_as_file_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        Picture::new(2, 2, &RED).save_as_file(&path).unwrap();

        let image = image::open(&path).unwrap().to_rgba8();
        assert_eq!(image.dimensions(), (2, 2));
        assert_eq!(image.get_pixel(1, 1).0, RED.to_array());
    }
}
