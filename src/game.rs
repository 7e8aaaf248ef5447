//! The runner itself: per-tick orchestration and lifecycle transitions.
//!
//! All game state lives here and is only mutated inside a tick or an
//! input/lifecycle handler; the event loop interleaves those on a single
//! thread, so every handler leaves the state consistent before returning.

use tracing::{debug, info};

use crate::config::{self, RunnerConfig};
use crate::draw::{BACKGROUND, Canvas, Dimensions, PixelBuf};
use crate::horizon::{Horizon, check_for_collision};
use crate::input::{InputAction, Source};
use crate::meter::DistanceMeter;
use crate::panel::{GameOverPanel, SharePanel};
use crate::sched::FrameScheduler;
use crate::sound::{Cue, SoundPlayer};
use crate::trex::{self, Status, Trex};

pub struct Runner {
    pub config: RunnerConfig,
    pub dimensions: Dimensions,
    pub scheduler: FrameScheduler,
    pub sounds: SoundPlayer,

    pub trex: Trex,
    pub horizon: Horizon,
    pub meter: DistanceMeter,
    pub game_over_panel: Option<GameOverPanel>,
    pub share_panel: Option<SharePanel>,

    pub distance_ran: f64,
    pub highest_score: u32,
    pub current_speed: f64,
    pub running_time: f64,
    time: f64,
    pub play_count: u32,

    pub started: bool,
    pub activated: bool,
    pub crashed: bool,
    pub paused: bool,
    pub playing_intro: bool,
    intro_started_at: f64,
    bell_pending: bool,
}

impl Runner {
    /// Entry point for the embedding terminal app: attach to a measured
    /// terminal area with an optional config override.
    pub fn attach(dimensions: Dimensions, config: Option<RunnerConfig>) -> Self {
        Self::new(dimensions, config.unwrap_or_default(), SoundPlayer::new())
    }

    pub fn new(dimensions: Dimensions, config: RunnerConfig, sounds: SoundPlayer) -> Self {
        let mut runner = Self {
            trex: Trex::new(&config),
            horizon: Horizon::new(dimensions.width, &config),
            meter: DistanceMeter::new(dimensions.width),
            game_over_panel: None,
            share_panel: None,
            scheduler: FrameScheduler::new(),
            sounds,
            distance_ran: 0.0,
            highest_score: 0,
            current_speed: config.speed,
            running_time: 0.0,
            time: 0.0,
            play_count: 0,
            started: false,
            activated: false,
            crashed: false,
            paused: false,
            playing_intro: false,
            intro_started_at: 0.0,
            bell_pending: false,
            config,
            dimensions,
        };
        runner.set_speed(None);
        runner.scheduler.schedule();
        runner
    }

    // ── Tick ────────────────────────────────────────────────────────────

    /// One simulation step. Strict order: delta, actor physics, horizon,
    /// collision, distance/speed, score, animation, reschedule.
    pub fn update(&mut self, now: f64, buf: &mut PixelBuf) {
        self.scheduler.cancel();
        let mut delta = if self.time == 0.0 {
            0.0
        } else {
            (now - self.time).max(0.0)
        };
        self.time = now;

        if self.activated {
            if self.trex.jumping {
                self.trex.update_jump(delta, self.config.ms_per_frame());
            }
            self.running_time += delta;
            let has_obstacles = self.running_time > self.config.clear_time;

            // First jump triggers the intro.
            if self.trex.jump_count == 1 && !self.playing_intro {
                self.play_intro();
            }
            if self.playing_intro && now - self.intro_started_at >= config::INTRO_DURATION {
                self.start_game();
            }

            // The horizon doesn't scroll until the intro is over.
            if self.playing_intro {
                self.horizon.update(0.0, self.current_speed, has_obstacles);
            } else {
                if !self.started {
                    delta = 0.0;
                }
                self.horizon.update(delta, self.current_speed, has_obstacles);
            }

            let collision = has_obstacles
                && self
                    .horizon
                    .obstacles
                    .front()
                    .is_some_and(|nearest| check_for_collision(nearest, &self.trex));

            if !collision {
                self.distance_ran += self.current_speed * delta / self.config.ms_per_frame();
                if self.current_speed < self.config.max_speed {
                    self.current_speed =
                        (self.current_speed + self.config.acceleration).min(self.config.max_speed);
                }
            } else {
                self.game_over(now);
            }

            if self.meter.get_actual_distance(self.distance_ran) > self.meter.max_score {
                self.distance_ran = 0.0;
            }
            if self.meter.update(delta, self.distance_ran.ceil() as u32) {
                self.sounds.play(Cue::Score);
            }
        }

        if !self.crashed {
            self.trex.update(delta, None);
            self.scheduler.schedule();
        }
        self.draw(buf);
    }

    // ── Lifecycle transitions ───────────────────────────────────────────

    fn play_intro(&mut self) {
        if !self.started && !self.crashed {
            self.playing_intro = true;
            self.intro_started_at = self.time;
            self.activated = true;
            self.started = true;
            debug!("intro started");
        } else if self.crashed {
            self.restart(self.time);
        }
    }

    fn start_game(&mut self) {
        self.running_time = 0.0;
        self.playing_intro = false;
        self.play_count += 1;
        info!(play_count = self.play_count, "game started");
    }

    fn game_over(&mut self, now: f64) {
        info!(score = self.display_score(), "game over");
        self.sounds.play(Cue::Hit);
        self.bell_pending = true;
        self.stop();
        self.crashed = true;
        self.meter.cancel_flash();
        self.trex.update(100.0, Some(Status::Crashed));

        match &mut self.game_over_panel {
            Some(panel) => panel.update_dimensions(self.dimensions.width),
            None => self.game_over_panel = Some(GameOverPanel::new(self.dimensions.width)),
        }
        if self.distance_ran > self.highest_score as f64 {
            self.highest_score = self.distance_ran.ceil() as u32;
            self.meter.set_high_score(self.highest_score);
        }
        // Restart cooldown measures from here.
        self.time = now;
        self.share_panel = Some(SharePanel::new());
    }

    pub fn stop(&mut self) {
        self.activated = false;
        self.paused = true;
        self.scheduler.cancel();
    }

    pub fn play(&mut self, now: f64) {
        if !self.crashed {
            self.activated = true;
            self.paused = false;
            self.trex.update(0.0, Some(Status::Running));
            self.time = now;
            self.scheduler.schedule();
        }
    }

    /// Restart from the crashed state. Only proceeds while no frame is
    /// pending, which rules out duplicate restarts.
    pub fn restart(&mut self, now: f64) {
        if !self.scheduler.is_scheduled() {
            info!(play_count = self.play_count + 1, "restart");
            self.play_count += 1;
            self.running_time = 0.0;
            self.activated = true;
            self.paused = false;
            self.crashed = false;
            self.distance_ran = 0.0;
            self.set_speed(Some(self.config.speed));
            self.time = now;
            self.meter.reset();
            self.horizon.reset();
            self.trex.reset();
            if let Some(panel) = self.share_panel.take() {
                panel.remove();
            }
            self.sounds.play(Cue::ButtonPress);
            self.scheduler.schedule();
        }
    }

    /// Pause on loss of terminal focus, resume on regain. Wired up only
    /// once a game has started.
    pub fn on_visibility_change(&mut self, visible: bool, now: f64) {
        if !self.started {
            return;
        }
        if visible {
            self.play(now);
        } else {
            debug!("focus lost, pausing");
            self.stop();
        }
    }

    // ── Input dispatch ──────────────────────────────────────────────────

    pub fn on_input(&mut self, action: InputAction, now: f64) {
        match action {
            InputAction::JumpStart(source) => self.on_jump_start(source, now),
            InputAction::JumpEnd(_) => self.on_jump_end(now),
            InputAction::DuckStart => {
                // Duck only affects an airborne actor.
                if !self.crashed && self.trex.jumping {
                    self.trex.set_speed_drop();
                }
            }
            InputAction::DuckEnd => self.trex.speed_drop = false,
            InputAction::Restart => {
                if self.crashed && self.restart_cooldown_elapsed(now) {
                    self.restart(now);
                }
            }
        }
    }

    fn on_jump_start(&mut self, source: Source, now: f64) {
        if !self.crashed {
            if !self.activated {
                // First interaction: kick off the async sound decode.
                self.sounds.load();
                self.activated = true;
            }
            if !self.trex.jumping {
                self.sounds.play(Cue::ButtonPress);
                self.trex.start_jump();
            }
        } else if source == Source::Pointer {
            // A tap on the crashed game restarts right away.
            self.restart(now);
        }
    }

    fn on_jump_end(&mut self, now: f64) {
        if self.is_running() {
            self.trex.end_jump();
        } else if self.crashed {
            if self.restart_cooldown_elapsed(now) {
                self.restart(now);
            }
        } else if self.paused {
            self.play(now);
        }
    }

    /// `time` is re-baselined on crash, so this measures since the crash.
    fn restart_cooldown_elapsed(&self, now: f64) -> bool {
        now - self.time >= self.config.gameover_clear_time
    }

    fn is_running(&self) -> bool {
        self.scheduler.is_scheduled()
    }

    // ── Speed, config, resize ───────────────────────────────────────────

    /// Set the scroll speed, scaled down on canvases narrower than the
    /// reference width but never up.
    pub fn set_speed(&mut self, opt_speed: Option<f64>) {
        let speed = opt_speed.unwrap_or(self.current_speed);
        if self.dimensions.width < config::DEFAULT_WIDTH {
            let mobile_speed = speed * self.dimensions.width / config::DEFAULT_WIDTH
                * self.config.mobile_speed_coefficient;
            self.current_speed = mobile_speed.min(speed);
        } else if let Some(speed) = opt_speed {
            self.current_speed = speed;
        }
    }

    /// Debug override for a single named setting; unknown names are
    /// ignored. Changed values propagate to dependent collaborators.
    pub fn update_config_setting(&mut self, name: &str, value: f64) {
        let Some(new_config) = self.config.with_setting(name, value) else {
            return;
        };
        debug!(name, value, "config override");
        self.config = new_config;
        match name {
            "GRAVITY" => self.trex.config.gravity = value,
            "MIN_JUMP_HEIGHT" => self.trex.config.min_jump_height = value,
            "SPEED_DROP_COEFFICIENT" => self.trex.config.speed_drop_coefficient = value,
            "INITIAL_JUMP_VELOCITY" => self.trex.set_jump_velocity(value),
            "SPEED" => self.set_speed(Some(value)),
            _ => {}
        }
    }

    /// Apply a settled resize: new scale, repositioned meter, redraw, and
    /// a pause if the game was mid-flight.
    pub fn adjust_dimensions(&mut self, dimensions: Dimensions, buf: &mut PixelBuf) {
        debug!(
            width = dimensions.width,
            scale = dimensions.scale,
            "adjust dimensions"
        );
        self.dimensions = dimensions;
        buf.resize(dimensions.device_width(), dimensions.device_height());
        self.meter.calc_x_pos(dimensions.width);
        self.horizon.set_width(dimensions.width);
        if self.activated || self.crashed {
            self.meter.update(0.0, self.distance_ran.ceil() as u32);
            self.stop();
        }
        if self.crashed {
            if let Some(panel) = &mut self.game_over_panel {
                panel.update_dimensions(dimensions.width);
            }
        }
        self.draw(buf);
    }

    // ── Rendering ───────────────────────────────────────────────────────

    pub fn draw(&self, buf: &mut PixelBuf) {
        buf.clear();
        let dims = self.dimensions;
        {
            let mut canvas = Canvas::new(buf, dims.scale);
            self.horizon.draw(&mut canvas);
            self.trex.draw(&mut canvas);
        }
        if self.playing_intro {
            // The visible game area expands out from the actor.
            let progress =
                ((self.time - self.intro_started_at) / config::INTRO_DURATION).clamp(0.0, 1.0);
            let start = trex::X_POS + trex::WIDTH;
            let visible = start + (dims.width - start) * progress;
            let x0 = (visible * dims.scale).round() as i32;
            buf.fill_rect(x0, 0, buf.w as i32 - x0, buf.h as i32, BACKGROUND);
        }
        self.meter.draw(buf, &dims);
        if self.crashed {
            if let Some(panel) = &self.game_over_panel {
                panel.draw(buf, &dims);
            }
            if let Some(panel) = &self.share_panel {
                panel.draw(buf, dims.width, &dims);
            }
        }
    }

    pub fn display_score(&self) -> u32 {
        self.meter.get_actual_distance(self.distance_ran)
    }

    /// Haptic pulse flag, drained by the event loop (terminal bell).
    pub fn take_bell(&mut self) -> bool {
        std::mem::take(&mut self.bell_pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::horizon::{Obstacle, ObstacleKind};
    use crate::input::{InputAction, Source};

    fn runner_with_width(width: f64) -> Runner {
        let dims = Dimensions {
            width,
            height: config::HEIGHT,
            scale: 0.4,
        };
        Runner::new(dims, RunnerConfig::default(), SoundPlayer::disabled())
    }

    fn runner() -> Runner {
        runner_with_width(600.0)
    }

    fn buf() -> PixelBuf {
        PixelBuf::new(240, 60)
    }

    /// Put the runner straight into the running state, past the intro.
    fn start_running(r: &mut Runner) {
        r.activated = true;
        r.started = true;
        r.time = 1000.0;
    }

    fn blocking_obstacle(r: &Runner) -> Obstacle {
        Obstacle::new(
            ObstacleKind::CactusSmall,
            1,
            r.trex.x_pos,
            r.current_speed,
            r.config.gap_coefficient,
            0.0,
        )
    }

    #[test]
    fn tick_accumulates_distance_and_accelerates() {
        let mut r = runner();
        let mut b = buf();
        start_running(&mut r);
        r.update(1016.0, &mut b);
        let expected = 6.0 * 16.0 / r.config.ms_per_frame();
        assert!((r.distance_ran - expected).abs() < 1e-9);
        assert!((r.current_speed - 6.001).abs() < 1e-9);
    }

    #[test]
    fn speed_never_exceeds_max() {
        let mut r = runner();
        let mut b = buf();
        start_running(&mut r);
        r.current_speed = r.config.max_speed - 0.0005;
        let mut now = r.time;
        for _ in 0..100 {
            now += 16.0;
            r.update(now, &mut b);
            assert!(r.current_speed <= r.config.max_speed);
        }
    }

    #[test]
    fn first_tick_has_zero_delta() {
        let mut r = runner();
        let mut b = buf();
        r.activated = true;
        r.started = true;
        // time == 0 means no baseline yet.
        r.update(5000.0, &mut b);
        assert_eq!(r.distance_ran, 0.0);
        assert_eq!(r.running_time, 0.0);
    }

    #[test]
    fn obstacles_allowed_once_clear_time_crossed() {
        let mut r = runner();
        let mut b = buf();
        start_running(&mut r);
        r.running_time = 2995.0;
        r.update(1002.0, &mut b); // running_time 2997
        assert!(r.horizon.obstacles.is_empty());
        r.update(1004.0, &mut b); // 2999
        assert!(r.horizon.obstacles.is_empty());
        r.update(1006.0, &mut b); // 3001 > CLEAR_TIME
        assert!(!r.horizon.obstacles.is_empty());
    }

    #[test]
    fn first_jump_plays_intro_then_starts_game() {
        let mut r = runner();
        let mut b = buf();
        r.on_input(InputAction::JumpStart(Source::Key), 0.0);
        assert!(r.activated);
        assert!(r.trex.jumping);
        assert_eq!(r.trex.jump_count, 1);

        r.update(16.0, &mut b);
        assert!(r.playing_intro);
        assert!(r.started);
        assert_eq!(r.play_count, 0);

        r.update(450.0, &mut b);
        assert!(!r.playing_intro);
        assert_eq!(r.play_count, 1);
        assert_eq!(r.running_time, 0.0);
    }

    #[test]
    fn collision_crashes_exactly_once() {
        let mut r = runner();
        let mut b = buf();
        start_running(&mut r);
        r.running_time = 4000.0;
        r.distance_ran = 150.4;
        r.horizon.obstacles.push_back(blocking_obstacle(&r));

        r.update(1016.0, &mut b);
        assert!(r.crashed);
        assert!(!r.activated);
        assert!(!r.scheduler.is_scheduled());
        assert!(r.take_bell());
        assert!(r.share_panel.is_some());
        assert!(r.game_over_panel.is_some());
        assert_eq!(r.highest_score, 151, "high score is the ceiling");

        // Further ticks while crashed never re-run the crash sequence.
        let speed = r.current_speed;
        r.update(1032.0, &mut b);
        r.update(1048.0, &mut b);
        assert!(r.crashed);
        assert!(!r.take_bell());
        assert_eq!(r.highest_score, 151);
        assert_eq!(r.current_speed, speed);
    }

    #[test]
    fn restart_resets_run_state() {
        let mut r = runner();
        let mut b = buf();
        start_running(&mut r);
        r.running_time = 4000.0;
        r.distance_ran = 500.3;
        r.current_speed = 9.0;
        r.horizon.obstacles.push_back(blocking_obstacle(&r));
        r.update(1016.0, &mut b);
        assert!(r.crashed);

        r.restart(2000.0);
        assert!(!r.crashed);
        assert_eq!(r.distance_ran, 0.0);
        assert_eq!(r.running_time, 0.0);
        assert_eq!(r.current_speed, r.config.speed);
        assert_eq!(r.play_count, 1);
        assert!(r.share_panel.is_none());
        assert!(r.scheduler.is_scheduled());
        assert_eq!(r.highest_score, 501, "high score survives restart");
    }

    #[test]
    fn restart_blocked_while_frame_pending() {
        let mut r = runner();
        start_running(&mut r);
        r.scheduler.schedule();
        r.crashed = true;
        r.restart(2000.0);
        assert!(r.crashed, "restart must not run while a frame is pending");
    }

    #[test]
    fn jump_release_restart_honors_cooldown() {
        let mut r = runner();
        let mut b = buf();
        start_running(&mut r);
        r.running_time = 4000.0;
        r.horizon.obstacles.push_back(blocking_obstacle(&r));
        r.update(1016.0, &mut b); // crash at time 1016
        assert!(r.crashed);

        r.on_input(InputAction::JumpEnd(Source::Key), 1016.0 + 500.0);
        assert!(r.crashed, "before cooldown the release is a no-op");

        r.on_input(InputAction::JumpEnd(Source::Key), 1016.0 + 750.0);
        assert!(!r.crashed, "cooldown elapsed, restart");
    }

    #[test]
    fn pointer_restarts_immediately_when_crashed() {
        let mut r = runner();
        let mut b = buf();
        start_running(&mut r);
        r.running_time = 4000.0;
        r.horizon.obstacles.push_back(blocking_obstacle(&r));
        r.update(1016.0, &mut b);
        assert!(r.crashed);

        // Mouse-up still honors the cooldown; only a fresh press is instant.
        r.on_input(InputAction::JumpEnd(Source::Pointer), 1018.0);
        assert!(r.crashed);
        r.on_input(InputAction::JumpStart(Source::Pointer), 1020.0);
        assert!(!r.crashed);
    }

    #[test]
    fn restart_key_needs_crash_and_cooldown() {
        let mut r = runner();
        let mut b = buf();
        start_running(&mut r);
        r.update(1016.0, &mut b);
        r.on_input(InputAction::Restart, 1032.0);
        assert!(!r.crashed);
        assert_eq!(r.play_count, 0, "restart outside crash is ignored");

        r.running_time = 4000.0;
        r.horizon.obstacles.push_back(blocking_obstacle(&r));
        r.update(1032.0, &mut b); // crash at time 1032
        assert!(r.crashed);
        r.on_input(InputAction::Restart, 1100.0);
        assert!(r.crashed, "restart key before cooldown is a no-op");
        r.on_input(InputAction::Restart, 1032.0 + 750.0);
        assert!(!r.crashed);
    }

    #[test]
    fn duck_only_affects_airborne_actor() {
        let mut r = runner();
        start_running(&mut r);
        r.on_input(InputAction::DuckStart, 1000.0);
        assert!(!r.trex.speed_drop, "grounded duck is a no-op");

        r.trex.start_jump();
        r.on_input(InputAction::DuckStart, 1000.0);
        assert!(r.trex.speed_drop);
        r.on_input(InputAction::DuckEnd, 1000.0);
        assert!(!r.trex.speed_drop);
    }

    #[test]
    fn focus_loss_pauses_and_release_resumes() {
        let mut r = runner();
        let mut b = buf();
        start_running(&mut r);
        r.update(1016.0, &mut b);

        r.on_visibility_change(false, 1020.0);
        assert!(r.paused);
        assert!(!r.activated);
        assert!(!r.scheduler.is_scheduled());

        r.on_input(InputAction::JumpEnd(Source::Key), 1100.0);
        assert!(!r.paused);
        assert!(r.activated);
        assert!(r.scheduler.is_scheduled());
    }

    #[test]
    fn focus_changes_before_start_are_ignored() {
        let mut r = runner();
        r.on_visibility_change(false, 10.0);
        assert!(!r.paused);
        r.on_visibility_change(true, 20.0);
        assert!(!r.activated);
    }

    #[test]
    fn mobile_width_scales_speed_down_never_up() {
        let mut r = runner_with_width(300.0);
        // 6 * 300/600 * 1.2 = 3.6
        assert!((r.current_speed - 3.6).abs() < 1e-9);
        r.set_speed(Some(2.0));
        assert!((r.current_speed - 1.2).abs() < 1e-9);
        // The scaled speed never exceeds the requested one.
        r.dimensions.width = 590.0;
        r.set_speed(Some(6.0));
        assert!(r.current_speed <= 6.0);
    }

    #[test]
    fn restart_reapplies_mobile_scaling() {
        let mut r = runner_with_width(300.0);
        let mut b = buf();
        start_running(&mut r);
        r.running_time = 4000.0;
        r.current_speed = 3.0;
        r.horizon.obstacles.push_back(blocking_obstacle(&r));
        r.update(1016.0, &mut b);
        assert!(r.crashed);
        r.restart(2000.0);
        assert!((r.current_speed - 3.6).abs() < 1e-9);
    }

    #[test]
    fn distance_resets_at_meter_max() {
        let mut r = runner();
        let mut b = buf();
        start_running(&mut r);
        r.distance_ran = (r.meter.max_score as f64 + 2.0) / 0.025;
        r.update(1016.0, &mut b);
        assert_eq!(r.distance_ran, 0.0);
    }

    #[test]
    fn config_override_propagates_and_ignores_unknown() {
        let mut r = runner();
        r.update_config_setting("GRAVITY", 0.9);
        assert_eq!(r.config.gravity, 0.9);
        assert_eq!(r.trex.config.gravity, 0.9);

        r.update_config_setting("SPEED", 8.0);
        assert_eq!(r.current_speed, 8.0);

        let before = r.config;
        r.update_config_setting("NOT_A_SETTING", 1.0);
        assert_eq!(r.config, before);
    }

    #[test]
    fn resize_pauses_active_game_and_keeps_state() {
        let mut r = runner();
        let mut b = buf();
        start_running(&mut r);
        r.distance_ran = 123.0;
        r.update(1016.0, &mut b);

        let dims = Dimensions::from_terminal(100, 30).unwrap();
        r.adjust_dimensions(dims, &mut b);
        assert!(r.paused);
        assert!(!r.scheduler.is_scheduled());
        assert!(r.distance_ran > 0.0);
        assert_eq!(b.w, dims.device_width());
        assert_eq!(b.h, dims.device_height());
    }

    #[test]
    fn idle_resize_does_not_pause() {
        let mut r = runner();
        let mut b = buf();
        let dims = Dimensions::from_terminal(100, 30).unwrap();
        r.adjust_dimensions(dims, &mut b);
        assert!(!r.paused);
    }
}
