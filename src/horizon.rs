//! Scrolling horizon: ground line, clouds and the obstacle stream.

use std::collections::VecDeque;

use crate::config::RunnerConfig;
use crate::draw::{CLOUD, Canvas, INK};
use crate::trex::{self, Trex};

/// Top of the ground line in logical units.
pub const GROUND_Y: f64 = 140.0;

const CLOUD_WIDTH: f64 = 46.0;
const CLOUD_HEIGHT: f64 = 14.0;
/// Minimum horizontal distance kept from the previous cloud.
const CLOUD_MIN_GAP: f64 = 100.0;
const CLOUD_MAX_GAP: f64 = 400.0;
const CLOUD_MIN_Y: f64 = 30.0;
const CLOUD_MAX_Y: f64 = 70.0;

/// Baseline obstacle gap before speed scaling.
const OBSTACLE_MIN_GAP: f64 = 120.0;
const MAX_GAP_COEFFICIENT: f64 = 1.5;
/// Obstacle groups longer than one need at least this speed.
const MULTIPLE_SPEED: f64 = 4.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObstacleKind {
    CactusSmall,
    CactusLarge,
}

impl ObstacleKind {
    fn unit_width(self) -> f64 {
        match self {
            ObstacleKind::CactusSmall => 17.0,
            ObstacleKind::CactusLarge => 25.0,
        }
    }

    fn height(self) -> f64 {
        match self {
            ObstacleKind::CactusSmall => 35.0,
            ObstacleKind::CactusLarge => 50.0,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Obstacle {
    pub kind: ObstacleKind,
    pub x_pos: f64,
    pub y_pos: f64,
    pub width: f64,
    pub height: f64,
    pub size: u32,
    /// Distance to keep clear behind this obstacle before the next spawns.
    pub gap: f64,
}

impl Obstacle {
    pub(crate) fn new(kind: ObstacleKind, size: u32, x_pos: f64, speed: f64, gap_coefficient: f64, roll: f64) -> Self {
        let width = kind.unit_width() * size as f64;
        let min_gap = (width * speed + OBSTACLE_MIN_GAP * gap_coefficient).round();
        let max_gap = (min_gap * MAX_GAP_COEFFICIENT).round();
        Self {
            kind,
            x_pos,
            y_pos: GROUND_Y - kind.height(),
            width,
            height: kind.height(),
            size,
            gap: min_gap + (max_gap - min_gap) * roll,
        }
    }

    fn is_visible(&self) -> bool {
        self.x_pos + self.width > 0.0
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Cloud {
    pub x_pos: f64,
    pub y_pos: f64,
    gap: f64,
}

pub struct Horizon {
    pub obstacles: VecDeque<Obstacle>,
    pub clouds: Vec<Cloud>,
    width: f64,
    ground_x: f64,
    gap_coefficient: f64,
    bg_cloud_speed: f64,
    cloud_frequency: f64,
    max_clouds: usize,
    max_obstacle_length: u32,
    ms_per_frame: f64,
    seed: u64,
}

impl Horizon {
    pub fn new(width: f64, config: &RunnerConfig) -> Self {
        let mut horizon = Self {
            obstacles: VecDeque::new(),
            clouds: Vec::new(),
            width,
            ground_x: 0.0,
            gap_coefficient: config.gap_coefficient,
            bg_cloud_speed: config.bg_cloud_speed,
            cloud_frequency: config.cloud_frequency,
            max_clouds: config.max_clouds,
            max_obstacle_length: config.max_obstacle_length,
            ms_per_frame: config.ms_per_frame(),
            seed: 0x9e3779b97f4a7c15,
        };
        horizon.add_cloud();
        horizon
    }

    /// Resize propagation; spawn positions depend on the visible width.
    pub fn set_width(&mut self, width: f64) {
        self.width = width;
    }

    /// Advance the horizon. Obstacles only move and spawn once the runner
    /// allows them (`has_obstacles`); clouds and the ground always scroll.
    pub fn update(&mut self, delta: f64, speed: f64, has_obstacles: bool) {
        let frames = delta / self.ms_per_frame;
        self.ground_x += speed * frames;
        self.update_clouds(delta, speed);
        if has_obstacles {
            self.update_obstacles(frames, speed);
        }
    }

    fn update_clouds(&mut self, delta: f64, speed: f64) {
        let dx = self.bg_cloud_speed / 1000.0 * delta * speed;
        for cloud in &mut self.clouds {
            cloud.x_pos -= dx;
        }
        self.clouds.retain(|c| c.x_pos + CLOUD_WIDTH > 0.0);
        let wants_more = match self.clouds.last() {
            Some(last) => self.width - last.x_pos > last.gap,
            None => true,
        };
        if wants_more && self.clouds.len() < self.max_clouds && self.roll() < self.cloud_frequency
        {
            self.add_cloud();
        }
    }

    fn add_cloud(&mut self) {
        let y = CLOUD_MIN_Y + (CLOUD_MAX_Y - CLOUD_MIN_Y) * self.roll();
        let gap = CLOUD_MIN_GAP + (CLOUD_MAX_GAP - CLOUD_MIN_GAP) * self.roll();
        self.clouds.push(Cloud {
            x_pos: self.width,
            y_pos: y,
            gap,
        });
    }

    fn update_obstacles(&mut self, frames: f64, speed: f64) {
        for obstacle in &mut self.obstacles {
            obstacle.x_pos -= speed * frames;
        }
        while self.obstacles.front().is_some_and(|o| !o.is_visible()) {
            self.obstacles.pop_front();
        }
        let wants_more = match self.obstacles.back() {
            Some(last) => last.x_pos + last.width + last.gap < self.width,
            None => true,
        };
        if wants_more {
            self.add_obstacle(speed);
        }
    }

    fn add_obstacle(&mut self, speed: f64) {
        let kind = if self.roll() < 0.5 {
            ObstacleKind::CactusSmall
        } else {
            ObstacleKind::CactusLarge
        };
        let max_size = if speed > MULTIPLE_SPEED {
            self.max_obstacle_length
        } else {
            1
        };
        let size = 1 + (self.roll() * max_size as f64) as u32;
        let size = size.min(self.max_obstacle_length);
        let roll = self.roll();
        self.obstacles.push_back(Obstacle::new(
            kind,
            size,
            self.width,
            speed,
            self.gap_coefficient,
            roll,
        ));
    }

    /// Obstacles clear out on restart; clouds drift on.
    pub fn reset(&mut self) {
        self.obstacles.clear();
        self.ground_x = 0.0;
    }

    fn roll(&mut self) -> f64 {
        self.seed = self.seed.wrapping_add(1);
        pseudo_rand(self.seed)
    }

    pub fn draw(&self, canvas: &mut Canvas) {
        // Ground line with scrolling surface notches.
        canvas.rect(0.0, GROUND_Y, self.width, 1.5, INK);
        let mut notch = 29.0 - self.ground_x % 67.0;
        while notch < self.width {
            if notch + 4.0 > 0.0 {
                canvas.rect(notch, GROUND_Y + 4.0, 4.0, 1.5, INK);
            }
            notch += 67.0;
        }

        for cloud in &self.clouds {
            let (x, y) = (cloud.x_pos, cloud.y_pos);
            canvas.rect(x, y + 8.0, CLOUD_WIDTH, 6.0, CLOUD);
            canvas.rect(x + 8.0, y + 4.0, 26.0, 4.0, CLOUD);
            canvas.rect(x + 14.0, y, 12.0, 4.0, CLOUD);
        }

        for obstacle in &self.obstacles {
            draw_cactus(canvas, obstacle);
        }
    }
}

fn draw_cactus(canvas: &mut Canvas, obstacle: &Obstacle) {
    let unit = obstacle.kind.unit_width();
    let h = obstacle.height;
    for i in 0..obstacle.size {
        let x = obstacle.x_pos + unit * i as f64;
        let y = obstacle.y_pos;
        // Trunk with two offset arms.
        canvas.rect(x + unit * 0.38, y, unit * 0.26, h, INK);
        canvas.rect(x, y + h * 0.2, unit * 0.2, h * 0.35, INK);
        canvas.rect(x + unit * 0.14, y + h * 0.45, unit * 0.3, h * 0.1, INK);
        canvas.rect(x + unit * 0.78, y + h * 0.14, unit * 0.2, h * 0.4, INK);
        canvas.rect(x + unit * 0.58, y + h * 0.44, unit * 0.26, h * 0.1, INK);
    }
}

/// Collision between the actor and one obstacle: axis-aligned boxes with a
/// small forgiveness inset on both sides.
pub fn check_for_collision(obstacle: &Obstacle, trex: &Trex) -> bool {
    const INSET: f64 = 2.0;
    let tx = trex.x_pos + INSET;
    let ty = trex.y_pos + INSET;
    let tw = trex::WIDTH - 2.0 * INSET;
    let th = trex::HEIGHT - 2.0 * INSET;
    let ox = obstacle.x_pos + INSET;
    let oy = obstacle.y_pos + INSET;
    let ow = obstacle.width - 2.0 * INSET;
    let oh = obstacle.height - 2.0 * INSET;

    tx < ox + ow && tx + tw > ox && ty < oy + oh && ty + th > oy
}

fn pseudo_rand(seed: u64) -> f64 {
    let x = seed
        .wrapping_mul(6364136223846793005)
        .wrapping_add(1442695040888963407);
    let bits = (x >> 33) ^ x;
    (bits % 1000) as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunnerConfig;

    fn horizon() -> Horizon {
        Horizon::new(600.0, &RunnerConfig::default())
    }

    #[test]
    fn obstacles_gated_until_allowed() {
        let mut h = horizon();
        for _ in 0..100 {
            h.update(16.0, 6.0, false);
        }
        assert!(h.obstacles.is_empty());
        h.update(16.0, 6.0, true);
        assert!(!h.obstacles.is_empty());
    }

    #[test]
    fn obstacles_scroll_left_and_expire() {
        let mut h = horizon();
        h.update(16.0, 6.0, true);
        let first_x = h.obstacles[0].x_pos;
        h.update(16.0, 6.0, true);
        assert!(h.obstacles[0].x_pos < first_x);

        for _ in 0..100_000 {
            h.update(16.0, 6.0, true);
        }
        assert!(h.obstacles.iter().all(|o| o.is_visible()));
        // Nearest first.
        for pair in h.obstacles.iter().collect::<Vec<_>>().windows(2) {
            assert!(pair[0].x_pos <= pair[1].x_pos);
        }
    }

    #[test]
    fn spawn_gap_scales_with_speed_and_width() {
        let mut h = horizon();
        h.update(16.0, 6.0, true);
        let o = h.obstacles[0];
        let min_gap = (o.width * 6.0 + OBSTACLE_MIN_GAP * 0.6).round();
        assert!(o.gap >= min_gap);
        assert!(o.gap <= (min_gap * MAX_GAP_COEFFICIENT).round());
    }

    #[test]
    fn low_speed_spawns_single_cacti() {
        let mut h = horizon();
        for _ in 0..500 {
            h.update(16.0, 3.0, true);
        }
        assert!(h.obstacles.iter().all(|o| o.size == 1));
    }

    #[test]
    fn reset_clears_obstacles_keeps_clouds() {
        let mut h = horizon();
        for _ in 0..50 {
            h.update(16.0, 6.0, true);
        }
        let clouds = h.clouds.len();
        h.reset();
        assert!(h.obstacles.is_empty());
        assert_eq!(h.clouds.len(), clouds);
    }

    #[test]
    fn collision_is_pure_aabb_with_inset() {
        let trex = Trex::new(&RunnerConfig::default());
        let mut obstacle = Obstacle::new(ObstacleKind::CactusSmall, 1, trex.x_pos, 6.0, 0.6, 0.0);
        assert!(check_for_collision(&obstacle, &trex));

        obstacle.x_pos = trex.x_pos + trex::WIDTH + 10.0;
        assert!(!check_for_collision(&obstacle, &trex));

        // Grazing within the forgiveness inset does not collide.
        obstacle.x_pos = trex.x_pos + trex::WIDTH - 1.0;
        assert!(!check_for_collision(&obstacle, &trex));
    }
}
