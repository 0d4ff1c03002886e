use std::fs;
use std::path::Path;

use crate::color::Color;
use crate::error::Result;

// Longest line a PPM writer should emit
const PPM_LINE_WIDTH: usize = 70;

/// A canvas for drawing pixels.
///
/// The canvas stores the resultant colors for each camera ray. Once rendering
/// finishes, the `Canvas` can be written out as a plain (P3) PPM image.
#[derive(Clone, Default, Debug, PartialEq)]
pub struct Canvas {
    /// The width of the canvas, in pixels.
    pub width: usize,

    /// The height of the canvas, in pixels.
    pub height: usize,

    /// The pixels of the canvas, stored row by row.
    pixels: Vec<Color>,
}

/// Scales a color component to 0-255.
fn to_byte(c: f64) -> u8 {
    (c * 255.0).round().clamp(0.0, 255.0) as u8
}

impl Canvas {
    /// Creates a new black canvas with specified width and height.
    pub fn new(width: usize, height: usize) -> Canvas {
        Canvas {
            width,
            height,
            pixels: vec![Color::black(); width * height]
        }
    }

    /// Builds a canvas from rows of pixels, top row first.
    ///
    /// Rows shorter than `width` leave the rest of the row black.
    pub fn from_rows(width: usize, rows: Vec<Vec<Color>>) -> Canvas {
        let mut canvas = Canvas::new(width, rows.len());

        for (y, row) in rows.into_iter().enumerate() {
            for (x, color) in row.into_iter().enumerate() {
                canvas.write_pixel(x, y, &color);
            }
        }

        canvas
    }

    /// Writes a color to a location on the `Canvas`.
    ///
    /// Out-of-bounds pixels are ignored. `y` is the row of the pixel and `x`
    /// is the column, both zero-indexed.
    ///
    /// # Examples
    ///
    /// ```
    /// # use whitted::color::Color;
    /// # use whitted::canvas::Canvas;
    /// let purple = Color::rgb(1.0, 0.0, 1.0);
    /// let mut canvas = Canvas::new(8, 8);
    /// canvas.write_pixel(4, 2, &purple);
    /// assert_eq!(canvas.read_pixel(4, 2).unwrap(), purple);
    /// ```
    pub fn write_pixel(&mut self, x: usize, y: usize, pixel: &Color) {
        if x >= self.width || y >= self.height {
            return;
        }

        self.pixels[(y * self.width) + x] = *pixel;
    }

    /// Reads a color from a location on the `Canvas`.
    ///
    /// Returns `None` if the location is out-of-bounds.
    pub fn read_pixel(&self, x: usize, y: usize) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None
        }

        Some(self.pixels[(y * self.width) + x])
    }

    /// Renders the canvas as a plain PPM image.
    ///
    /// Components are clamped to 0-255. Every row starts on a new line, and
    /// lines are wrapped so none exceeds 70 columns.
    pub fn to_ppm(&self) -> String {
        let mut out = format!("P3\n{} {}\n255\n", self.width, self.height);

        if self.width == 0 {
            return out;
        }

        for row in self.pixels.chunks(self.width) {
            let mut line = String::new();

            for pixel in row {
                for &c in [pixel.r, pixel.g, pixel.b].iter() {
                    let value = to_byte(c).to_string();

                    if !line.is_empty()
                        && line.len() + 1 + value.len() > PPM_LINE_WIDTH {
                        out.push_str(&line);
                        out.push('\n');
                        line.clear();
                    }

                    if !line.is_empty() {
                        line.push(' ');
                    }
                    line.push_str(&value);
                }
            }

            out.push_str(&line);
            out.push('\n');
        }

        out
    }

    /// Saves a canvas to a PPM file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.to_ppm())?;
        Ok(())
    }
}

#[test]
fn new_canvas_is_black() {
    let c = Canvas::new(10, 20);

    assert_eq!(c.width, 10);
    assert_eq!(c.height, 20);
    assert_eq!(c.read_pixel(9, 19), Some(Color::black()));
    assert_eq!(c.read_pixel(10, 0), None);
}

#[test]
fn ppm_header_and_pixels() {
    let mut c = Canvas::new(5, 3);
    c.write_pixel(0, 0, &Color::rgb(1.5, 0.0, 0.0));
    c.write_pixel(2, 1, &Color::rgb(0.0, 0.5, 0.0));
    c.write_pixel(4, 2, &Color::rgb(-0.5, 0.0, 1.0));

    let ppm = c.to_ppm();
    let lines: Vec<&str> = ppm.lines().collect();

    assert_eq!(&lines[0..3], &["P3", "5 3", "255"]);
    assert_eq!(lines[3], "255 0 0 0 0 0 0 0 0 0 0 0 0 0 0");
    assert_eq!(lines[4], "0 0 0 0 0 0 0 128 0 0 0 0 0 0 0");
    assert_eq!(lines[5], "0 0 0 0 0 0 0 0 0 0 0 0 0 0 255");
}

#[test]
fn ppm_wraps_long_lines() {
    let mut c = Canvas::new(10, 2);
    for y in 0..2 {
        for x in 0..10 {
            c.write_pixel(x, y, &Color::rgb(1.0, 0.8, 0.6));
        }
    }

    let ppm = c.to_ppm();
    let lines: Vec<&str> = ppm.lines().collect();

    assert_eq!(lines[3],
        "255 204 153 255 204 153 255 204 153 255 204 153 255 204 153 255 204");
    assert_eq!(lines[4],
        "153 255 204 153 255 204 153 255 204 153 255 204 153");
    assert_eq!(lines[5], lines[3]);
    assert_eq!(lines[6], lines[4]);
    assert!(ppm.ends_with('\n'));
}

#[test]
fn canvas_from_rows() {
    let red = Color::rgb(1.0, 0.0, 0.0);
    let c = Canvas::from_rows(2, vec![vec![red, red], vec![Color::white()]]);

    assert_eq!(c.height, 2);
    assert_eq!(c.read_pixel(1, 0), Some(red));
    assert_eq!(c.read_pixel(0, 1), Some(Color::white()));
    assert_eq!(c.read_pixel(1, 1), Some(Color::black()));
}
