//! Game-over and share overlays.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::{ImageBuffer, Rgb as ImageRgb};
use tracing::debug;

use crate::draw::{Dimensions, INK, PixelBuf, draw_text_centered};

const GAME_OVER_Y: f64 = 45.0;

#[rustfmt::skip]
const RESTART_GLYPH: [u8; 63] = [
    0,1,1,1,1,1,0,0,0,
    1,1,0,0,0,1,1,1,0,
    1,1,0,0,0,1,1,1,1,
    1,1,0,0,0,0,1,1,0,
    1,1,0,0,0,0,0,0,0,
    1,1,0,0,0,0,1,1,0,
    0,1,1,1,1,1,1,0,0,
];

pub struct GameOverPanel {
    width: f64,
}

impl GameOverPanel {
    pub fn new(width: f64) -> Self {
        Self { width }
    }

    pub fn update_dimensions(&mut self, width: f64) {
        self.width = width;
    }

    pub fn draw(&self, buf: &mut PixelBuf, dims: &Dimensions) {
        let px = dims.glyph_px();
        let cx = ((self.width / 2.0) * dims.scale).round() as i32;
        let y = (GAME_OVER_Y * dims.scale).round() as i32;
        draw_text_centered(buf, cx, y, "GAME OVER", px, INK);

        let gy = y + 8 * px;
        for row in 0..7 {
            for col in 0..9 {
                if RESTART_GLYPH[(row * 9 + col) as usize] == 1 {
                    buf.fill_rect(cx + (col - 4) * px, gy + row * px, px, px, INK);
                }
            }
        }
    }
}

/// Share affordance shown while crashed; `s` saves a frame snapshot.
pub struct SharePanel;

impl SharePanel {
    pub fn new() -> Self {
        Self
    }

    pub fn draw(&self, buf: &mut PixelBuf, width: f64, dims: &Dimensions) {
        let px = dims.glyph_px();
        let cx = ((width / 2.0) * dims.scale).round() as i32;
        let y = ((GAME_OVER_Y + 35.0) * dims.scale).round() as i32;
        draw_text_centered(buf, cx, y, "PRESS S TO SHARE", px, INK);
    }

    pub fn remove(self) {
        debug!("share panel removed");
    }
}

/// Name a snapshot after the displayed score.
pub fn snapshot_path(score: u32) -> PathBuf {
    PathBuf::from(format!("dino-run-{score:05}.png"))
}

/// Capture the current frame as a PNG.
pub fn save_snapshot(buf: &PixelBuf, path: &Path) -> Result<()> {
    let image = ImageBuffer::from_fn(buf.w as u32, buf.h as u32, |x, y| {
        let c = buf.get(x as usize, y as usize);
        ImageRgb([c.0, c.1, c.2])
    });
    image
        .save(path)
        .with_context(|| format!("saving snapshot to {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw::BACKGROUND;

    #[test]
    fn game_over_panel_marks_the_frame() {
        let dims = Dimensions::from_terminal(80, 30).unwrap();
        let mut buf = PixelBuf::new(dims.device_width(), dims.device_height());
        GameOverPanel::new(dims.width).draw(&mut buf, &dims);
        let inked = (0..buf.h)
            .flat_map(|y| (0..buf.w).map(move |x| (x, y)))
            .filter(|&(x, y)| buf.get(x, y) != BACKGROUND)
            .count();
        assert!(inked > 0, "panel drew nothing");
    }

    #[test]
    fn snapshot_writes_a_png() {
        let mut buf = PixelBuf::new(8, 8);
        buf.set(1, 1, INK);
        let path = std::env::temp_dir().join(snapshot_path(42));
        save_snapshot(&buf, &path).unwrap();
        assert!(path.exists());
        std::fs::remove_file(&path).unwrap();
    }
}
