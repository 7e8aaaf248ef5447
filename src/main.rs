//! Terminal entry point: raw-mode setup, the event/frame loop, and teardown.

mod config;
mod draw;
mod game;
mod horizon;
mod input;
mod logging;
mod meter;
mod panel;
mod sched;
mod sound;
mod trex;

use std::io::{self, Write, stdout};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::{
    cursor,
    event::{
        self, DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture,
        Event, KeyCode, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute, terminal,
};
use tracing::{info, warn};

use crate::draw::{Dimensions, PixelBuf};
use crate::game::Runner;
use crate::input::InputRouter;
use crate::sched::ResizeDebouncer;

const FRAME_DUR: Duration = Duration::from_millis(16); // ~60 fps

fn main() -> Result<()> {
    let _log_guard = logging::init();

    terminal::enable_raw_mode().context("enabling raw mode")?;
    let mut out = stdout();
    execute!(
        out,
        terminal::EnterAlternateScreen,
        cursor::Hide,
        terminal::DisableLineWrap,
        EnableMouseCapture,
        EnableFocusChange,
    )?;

    // Release events give us variable jump height; without them the router
    // falls back to press-only bindings.
    let key_release = terminal::supports_keyboard_enhancement().unwrap_or(false);
    if key_release {
        execute!(
            out,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        )?;
    }

    let result = run(&mut out, key_release);
    let _ = restore(&mut out, key_release);
    result
}

fn restore(out: &mut io::Stdout, key_release: bool) -> io::Result<()> {
    if key_release {
        execute!(out, PopKeyboardEnhancementFlags)?;
    }
    execute!(
        out,
        DisableFocusChange,
        DisableMouseCapture,
        terminal::LeaveAlternateScreen,
        cursor::Show,
        terminal::EnableLineWrap,
    )?;
    terminal::disable_raw_mode()
}

fn run(out: &mut io::Stdout, key_release: bool) -> Result<()> {
    let (cols, rows) = terminal::size()?;
    let dims = Dimensions::from_terminal(cols, rows).context("terminal too small")?;
    info!(cols, rows, key_release, "starting");

    let mut buf = PixelBuf::new(dims.device_width(), dims.device_height());
    let mut runner = Runner::attach(dims, None);
    let router = InputRouter::new(key_release);
    let mut resize = ResizeDebouncer::new();
    let epoch = Instant::now();

    loop {
        let frame_start = Instant::now();

        while event::poll(Duration::ZERO)? {
            let ev = event::read()?;
            let now = clock_ms(epoch);
            match ev {
                Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        return Ok(());
                    }
                    KeyCode::Char('s') if runner.crashed => {
                        share_snapshot(&mut runner, &mut buf, out)?;
                    }
                    // Tuning: a/z = gravity, f/v = jump velocity, d/c = speed
                    KeyCode::Char('a') => {
                        runner.update_config_setting("GRAVITY", runner.config.gravity + 0.05);
                    }
                    KeyCode::Char('z') => {
                        let value = (runner.config.gravity - 0.05).max(0.05);
                        runner.update_config_setting("GRAVITY", value);
                    }
                    KeyCode::Char('f') => {
                        let value = runner.config.initial_jump_velocity + 0.5;
                        runner.update_config_setting("INITIAL_JUMP_VELOCITY", value);
                    }
                    KeyCode::Char('v') => {
                        let value = (runner.config.initial_jump_velocity - 0.5).max(1.0);
                        runner.update_config_setting("INITIAL_JUMP_VELOCITY", value);
                    }
                    KeyCode::Char('d') => {
                        runner.update_config_setting("SPEED", runner.config.speed + 0.5);
                    }
                    KeyCode::Char('c') => {
                        let value = (runner.config.speed - 0.5).max(1.0);
                        runner.update_config_setting("SPEED", value);
                    }
                    _ => {
                        if let Some(action) = router.map(&Event::Key(key)) {
                            runner.on_input(action, now);
                        }
                    }
                },
                Event::FocusLost => runner.on_visibility_change(false, now),
                Event::FocusGained => runner.on_visibility_change(true, now),
                Event::Resize(c, r) => resize.signal(now, c, r),
                other => {
                    if let Some(action) = router.map(&other) {
                        runner.on_input(action, now);
                    }
                }
            }
        }

        let now = clock_ms(epoch);
        if let Some((c, r)) = resize.poll(now) {
            if let Some(dims) = Dimensions::from_terminal(c, r) {
                execute!(out, terminal::Clear(terminal::ClearType::All))?;
                runner.adjust_dimensions(dims, &mut buf);
                buf.render(out)?;
            }
        }

        if runner.scheduler.take() {
            runner.update(now, &mut buf);
            buf.render(out)?;
        }

        // Terminal bell as the crash pulse.
        if runner.take_bell() {
            out.write_all(b"\x07")?;
            out.flush()?;
        }

        let elapsed = frame_start.elapsed();
        if elapsed < FRAME_DUR {
            std::thread::sleep(FRAME_DUR - elapsed);
        }
    }
}

fn clock_ms(epoch: Instant) -> f64 {
    epoch.elapsed().as_secs_f64() * 1000.0
}

/// Save the crashed frame as a PNG named after the score and retire the
/// share affordance.
fn share_snapshot(runner: &mut Runner, buf: &mut PixelBuf, out: &mut io::Stdout) -> Result<()> {
    let path = panel::snapshot_path(runner.display_score());
    match panel::save_snapshot(buf, &path) {
        Ok(()) => {
            info!(path = %path.display(), "snapshot saved");
            if let Some(share) = runner.share_panel.take() {
                share.remove();
            }
            runner.draw(buf);
            buf.render(out)?;
        }
        Err(err) => warn!(%err, "snapshot failed"),
    }
    Ok(())
}
