/// Terminal front end: drives the scene with crossterm input and an ASCII rasterizer
use anyhow::{Context, Result};
use crossterm::{
    cursor,
    event::{
        self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self, ClearType},
};
use scene3d_core::{Scene, SceneConfig};
use std::io::{stdout, Write};
use std::time::{Duration, Instant};

pub mod input;
pub mod renderer;

pub use input::{KeyAction, KeyTracker};
pub use renderer::AsciiRenderer;

/// Main application struct for terminal 3D rendering
pub struct TerminalApp {
    scene: Scene,
    renderer: AsciiRenderer,
    keys: KeyTracker,
    running: bool,
    target_frame_time: Duration,
    last_tick: Instant,
    fps_window_start: Instant,
    frame_count: u32,
    fps: f32,
}

impl TerminalApp {
    pub fn new(config: &SceneConfig, target_fps: u32) -> Result<Self> {
        let (width, height) = terminal::size().context("querying terminal size")?;
        // Bottom row is kept for the status line
        let mut renderer = AsciiRenderer::new(
            width as usize,
            height.saturating_sub(1) as usize,
            config.projection.clone(),
            config.light.direction,
        );
        let scene = Scene::new(config, &mut renderer).context("building scene")?;
        let reports_release = terminal::supports_keyboard_enhancement().unwrap_or(false);
        if !reports_release {
            tracing::warn!("terminal does not report key releases; held keys expire on a timeout");
        }

        let now = Instant::now();
        Ok(Self {
            scene,
            renderer,
            keys: KeyTracker::new(reports_release, input::DEFAULT_HOLD_TIMEOUT),
            running: true,
            target_frame_time: Duration::from_secs_f64(1.0 / target_fps.max(1) as f64),
            last_tick: now,
            fps_window_start: now,
            frame_count: 0,
            fps: 0.0,
        })
    }

    pub fn run(&mut self) -> Result<()> {
        terminal::enable_raw_mode()?;
        execute!(stdout(), terminal::EnterAlternateScreen, cursor::Hide)?;
        if self.keys.reports_release() {
            execute!(
                stdout(),
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
        }

        let result = self.main_loop();

        // Cleanup: every step runs even if an earlier one failed
        let pop = if self.keys.reports_release() {
            execute!(stdout(), PopKeyboardEnhancementFlags)
        } else {
            Ok(())
        };
        let raw = terminal::disable_raw_mode();
        let leave = execute!(stdout(), terminal::LeaveAlternateScreen, cursor::Show);

        first_error(result, [pop, raw, leave])
    }

    fn main_loop(&mut self) -> Result<()> {
        while self.running {
            let frame_start = Instant::now();

            // Handle input
            while event::poll(Duration::from_millis(0))? {
                self.handle_event(event::read()?, Instant::now());
            }
            for key in self.keys.expire(Instant::now()) {
                self.scene.state_mut().key_up(key);
            }

            // Render
            let now = Instant::now();
            let dt = now.duration_since(self.last_tick).as_secs_f32();
            self.last_tick = now;
            self.render(dt)?;

            // Frame timing
            self.frame_count += 1;
            let elapsed = frame_start.elapsed();
            if elapsed < self.target_frame_time {
                std::thread::sleep(self.target_frame_time - elapsed);
            }

            // Update FPS counter
            let now = Instant::now();
            if (now - self.fps_window_start).as_secs() >= 1 {
                self.fps = self.frame_count as f32 / (now - self.fps_window_start).as_secs_f32();
                self.frame_count = 0;
                self.fps_window_start = now;
            }
        }

        Ok(())
    }

    fn handle_event(&mut self, event: Event, now: Instant) {
        match event {
            Event::Key(key_event) => self.handle_key(key_event, now),
            Event::Resize(width, height) => {
                self.renderer
                    .resize(width as usize, height.saturating_sub(1) as usize);
            }
            _ => {}
        }
    }

    fn handle_key(&mut self, key_event: KeyEvent, now: Instant) {
        if key_event.kind != KeyEventKind::Release {
            let quit = matches!(key_event.code, KeyCode::Char('q') | KeyCode::Esc)
                || (key_event.code == KeyCode::Char('c')
                    && key_event.modifiers.contains(KeyModifiers::CONTROL));
            if quit {
                self.running = false;
                return;
            }
        }

        match self.keys.on_event(&key_event, now) {
            Some(KeyAction::Down(key)) => self.scene.state_mut().key_down(key),
            Some(KeyAction::Up(key)) => self.scene.state_mut().key_up(key),
            None => {}
        }
    }

    fn render(&mut self, dt: f32) -> Result<()> {
        // Clear renderer
        self.renderer.clear();

        // A failed frame is shown as far as it got; the next one starts fresh
        if let Err(err) = self.scene.render_frame(dt, &mut self.renderer) {
            tracing::warn!(%err, "frame dropped");
        }

        // Output to terminal
        let mut stdout = stdout();
        queue!(stdout, cursor::MoveTo(0, 0))?;

        self.renderer.present(&mut stdout)?;

        // Draw status line
        let state = self.scene.state();
        let position = state.camera().position();
        let jump = if state.animation().is_jumping() {
            format!("jump {:.2}", state.animation().jump_height())
        } else {
            "grounded".to_string()
        };
        queue!(
            stdout,
            cursor::MoveTo(0, self.renderer.height() as u16),
            terminal::Clear(ClearType::CurrentLine),
            SetForegroundColor(Color::Yellow),
            Print(format!(
                "Scene3D | FPS: {:.1} | pos ({:.1}, {:.1}) | {} | Arrows=Nudge WASD=Move Space=Jump Q=Quit",
                self.fps, position.x, position.z, jump
            )),
            ResetColor
        )?;

        stdout.flush()?;
        Ok(())
    }
}

/// Keep the loop's own error if it has one, else the first failed cleanup step
fn first_error(result: Result<()>, cleanup: [std::io::Result<()>; 3]) -> Result<()> {
    cleanup
        .into_iter()
        .fold(result, |acc, step| acc.and(step.context("restoring terminal")))
}
