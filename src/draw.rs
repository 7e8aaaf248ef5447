//! Pixel buffer with half-block rendering, plus the bitmap font.
//!
//! Two vertically stacked "pixels" share one terminal cell via the upper
//! half-block character, which is what gives the game its resolution.

use crossterm::{cursor, queue, style, style::Color as CColor};
use std::io::{self, Write};

use crate::config;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl From<Rgb> for CColor {
    fn from(c: Rgb) -> Self {
        CColor::Rgb {
            r: c.0,
            g: c.1,
            b: c.2,
        }
    }
}

// The paper palette.
pub const BACKGROUND: Rgb = Rgb(247, 247, 247);
pub const INK: Rgb = Rgb(83, 83, 83);
pub const FADED: Rgb = Rgb(172, 172, 172);
pub const CLOUD: Rgb = Rgb(219, 219, 219);

// ── Dimensions ──────────────────────────────────────────────────────────────

/// Logical canvas size plus the device scale mapping logical units to
/// terminal pixels. The terminal analog of canvas + devicePixelRatio.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
    pub scale: f64,
}

impl Dimensions {
    /// Compute dimensions from a terminal size. Degenerate measurements
    /// yield `None` and the caller keeps its previous dimensions.
    pub fn from_terminal(cols: u16, rows: u16) -> Option<Self> {
        if cols < 4 || rows < 4 {
            return None;
        }
        let device_height = rows as f64 * 2.0;
        let scale = device_height / config::HEIGHT;
        Some(Self {
            width: cols as f64 / scale,
            height: config::HEIGHT,
            scale,
        })
    }

    pub fn device_width(&self) -> usize {
        (self.width * self.scale).round() as usize
    }

    pub fn device_height(&self) -> usize {
        (self.height * self.scale).round() as usize
    }

    /// Glyph pixel size for the bitmap font at this scale.
    pub fn glyph_px(&self) -> i32 {
        ((self.scale * 2.0).round() as i32).max(1)
    }
}

// ── Pixel buffer ────────────────────────────────────────────────────────────

pub struct PixelBuf {
    pub w: usize,
    pub h: usize, // pixel height = terminal rows * 2
    px: Vec<Rgb>,
}

impl PixelBuf {
    pub fn new(w: usize, h: usize) -> Self {
        Self {
            w,
            h,
            px: vec![BACKGROUND; w * h],
        }
    }

    pub fn resize(&mut self, w: usize, h: usize) {
        self.w = w;
        self.h = h;
        self.px = vec![BACKGROUND; w * h];
    }

    pub fn clear(&mut self) {
        self.px.fill(BACKGROUND);
    }

    pub fn set(&mut self, x: i32, y: i32, c: Rgb) {
        if x >= 0 && y >= 0 && (x as usize) < self.w && (y as usize) < self.h {
            self.px[y as usize * self.w + x as usize] = c;
        }
    }

    pub fn get(&self, x: usize, y: usize) -> Rgb {
        self.px[y * self.w + x]
    }

    pub fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, c: Rgb) {
        for dy in 0..h {
            for dx in 0..w {
                self.set(x + dx, y + dy, c);
            }
        }
    }

    /// Flush the buffer to the terminal, minimising color escape sequences
    /// by tracking the previously emitted foreground/background.
    pub fn render(&self, out: &mut impl Write) -> io::Result<()> {
        queue!(out, cursor::MoveTo(0, 0))?;
        let rows = self.h / 2;
        let mut fg: Option<Rgb> = None;
        let mut bg: Option<Rgb> = None;

        for row in 0..rows {
            for col in 0..self.w {
                let top = self.get(col, row * 2);
                let bot = self.get(col, row * 2 + 1);

                if top == bot {
                    if bg != Some(top) {
                        queue!(out, style::SetBackgroundColor(top.into()))?;
                        bg = Some(top);
                    }
                    queue!(out, style::Print(' '))?;
                } else {
                    if fg != Some(top) {
                        queue!(out, style::SetForegroundColor(top.into()))?;
                        fg = Some(top);
                    }
                    if bg != Some(bot) {
                        queue!(out, style::SetBackgroundColor(bot.into()))?;
                        bg = Some(bot);
                    }
                    queue!(out, style::Print('\u{2580}'))?; // ▀
                }
            }
            if row < rows - 1 {
                queue!(out, style::ResetColor, style::Print("\r\n"))?;
                fg = None;
                bg = None;
            }
        }
        queue!(out, style::ResetColor)?;
        out.flush()
    }
}

// ── Logical-unit canvas ─────────────────────────────────────────────────────

/// Draws in logical canvas units onto a `PixelBuf` through the device scale.
pub struct Canvas<'a> {
    pub buf: &'a mut PixelBuf,
    pub scale: f64,
}

impl<'a> Canvas<'a> {
    pub fn new(buf: &'a mut PixelBuf, scale: f64) -> Self {
        Self { buf, scale }
    }

    /// Fill a rectangle given in logical units. Rectangles at least one
    /// logical unit wide never vanish, even below 1:1 scale.
    pub fn rect(&mut self, x: f64, y: f64, w: f64, h: f64, c: Rgb) {
        let x0 = (x * self.scale).round() as i32;
        let y0 = (y * self.scale).round() as i32;
        let x1 = ((x + w) * self.scale).round() as i32;
        let y1 = ((y + h) * self.scale).round() as i32;
        self.buf
            .fill_rect(x0, y0, (x1 - x0).max(1), (y1 - y0).max(1), c);
    }
}

// ── 3x5 bitmap font ─────────────────────────────────────────────────────────

#[rustfmt::skip]
const DIGITS: [[u8; 15]; 10] = [
    [1,1,1, 1,0,1, 1,0,1, 1,0,1, 1,1,1], // 0
    [0,1,0, 1,1,0, 0,1,0, 0,1,0, 1,1,1], // 1
    [1,1,1, 0,0,1, 1,1,1, 1,0,0, 1,1,1], // 2
    [1,1,1, 0,0,1, 0,1,1, 0,0,1, 1,1,1], // 3
    [1,0,1, 1,0,1, 1,1,1, 0,0,1, 0,0,1], // 4
    [1,1,1, 1,0,0, 1,1,1, 0,0,1, 1,1,1], // 5
    [1,1,1, 1,0,0, 1,1,1, 1,0,1, 1,1,1], // 6
    [1,1,1, 0,0,1, 0,1,0, 0,1,0, 0,1,0], // 7
    [1,1,1, 1,0,1, 1,1,1, 1,0,1, 1,1,1], // 8
    [1,1,1, 1,0,1, 1,1,1, 0,0,1, 1,1,1], // 9
];

#[rustfmt::skip]
const LETTERS: [[u8; 15]; 26] = [
    [0,1,0, 1,0,1, 1,1,1, 1,0,1, 1,0,1], // A
    [1,1,0, 1,0,1, 1,1,0, 1,0,1, 1,1,0], // B
    [1,1,1, 1,0,0, 1,0,0, 1,0,0, 1,1,1], // C
    [1,1,0, 1,0,1, 1,0,1, 1,0,1, 1,1,0], // D
    [1,1,1, 1,0,0, 1,1,0, 1,0,0, 1,1,1], // E
    [1,1,1, 1,0,0, 1,1,0, 1,0,0, 1,0,0], // F
    [1,1,1, 1,0,0, 1,0,1, 1,0,1, 1,1,1], // G
    [1,0,1, 1,0,1, 1,1,1, 1,0,1, 1,0,1], // H
    [1,1,1, 0,1,0, 0,1,0, 0,1,0, 1,1,1], // I
    [0,0,1, 0,0,1, 0,0,1, 1,0,1, 1,1,1], // J
    [1,0,1, 1,0,1, 1,1,0, 1,0,1, 1,0,1], // K
    [1,0,0, 1,0,0, 1,0,0, 1,0,0, 1,1,1], // L
    [1,0,1, 1,1,1, 1,0,1, 1,0,1, 1,0,1], // M
    [1,0,1, 1,1,1, 1,1,1, 1,0,1, 1,0,1], // N
    [1,1,1, 1,0,1, 1,0,1, 1,0,1, 1,1,1], // O
    [1,1,1, 1,0,1, 1,1,1, 1,0,0, 1,0,0], // P
    [1,1,1, 1,0,1, 1,0,1, 1,1,1, 0,0,1], // Q
    [1,1,0, 1,0,1, 1,1,0, 1,0,1, 1,0,1], // R
    [1,1,1, 1,0,0, 1,1,1, 0,0,1, 1,1,1], // S
    [1,1,1, 0,1,0, 0,1,0, 0,1,0, 0,1,0], // T
    [1,0,1, 1,0,1, 1,0,1, 1,0,1, 1,1,1], // U
    [1,0,1, 1,0,1, 1,0,1, 1,0,1, 0,1,0], // V
    [1,0,1, 1,0,1, 1,0,1, 1,1,1, 1,0,1], // W
    [1,0,1, 1,0,1, 0,1,0, 1,0,1, 1,0,1], // X
    [1,0,1, 1,0,1, 0,1,0, 0,1,0, 0,1,0], // Y
    [1,1,1, 0,0,1, 0,1,0, 1,0,0, 1,1,1], // Z
];

pub fn glyph(ch: char) -> Option<&'static [u8; 15]> {
    match ch {
        '0'..='9' => Some(&DIGITS[ch as usize - '0' as usize]),
        'A'..='Z' => Some(&LETTERS[ch as usize - 'A' as usize]),
        _ => None,
    }
}

fn draw_glyph(buf: &mut PixelBuf, x: i32, y: i32, bits: &[u8; 15], px: i32, fg: Rgb) {
    for row in 0..5 {
        for col in 0..3 {
            if bits[(row * 3 + col) as usize] == 1 {
                buf.fill_rect(x + col * px, y + row * px, px, px, fg);
            }
        }
    }
}

/// Glyph advance in device pixels: 3 columns plus 1 of spacing.
pub fn text_advance(px: i32) -> i32 {
    4 * px
}

/// Draw uppercase text / digits left-aligned at device coordinates.
/// Characters outside the font (and spaces) just advance.
pub fn draw_text(buf: &mut PixelBuf, x: i32, y: i32, text: &str, px: i32, fg: Rgb) {
    for (i, ch) in text.chars().enumerate() {
        if let Some(bits) = glyph(ch) {
            draw_glyph(buf, x + i as i32 * text_advance(px), y, bits, px, fg);
        }
    }
}

pub fn draw_text_centered(buf: &mut PixelBuf, cx: i32, y: i32, text: &str, px: i32, fg: Rgb) {
    let total_w = text.chars().count() as i32 * text_advance(px) - px;
    draw_text(buf, cx - total_w / 2, y, text, px, fg);
}
