use std::io::Stdout;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Context;
use chip8_engine::keypad::NUM_KEYS;
use chip8_engine::{
    Chip8State, CompatibilityMode, DISPLAY_HEIGHT, DISPLAY_WIDTH, Key, MachineStatus, StepOutcome,
};
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyboardEnhancementFlags,
    PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph},
};
use tracing::{error, info, warn};

pub const DEFAULT_FRAME_RATE: u64 = 60;
pub const DEFAULT_INSTRUCTIONS_PER_SECOND: u64 = 700;

/// Frames a key stays held when the terminal cannot report releases.
const KEY_HOLD_FRAMES: u64 = 6;

pub struct Settings {
    pub frame_rate: u64,
    pub ips: u64,
    pub rom: PathBuf,
    pub mode: CompatibilityMode,
}

impl Settings {
    pub fn new(frame_rate: u64, ips: u64, rom: PathBuf, mode: CompatibilityMode) -> Self {
        Settings {
            frame_rate,
            ips,
            rom,
            mode,
        }
    }
}

pub struct Emulator {
    state: Chip8State,
    settings: Settings,
    /// Frame number of the last press seen for each key.
    last_pressed: [Option<u64>; NUM_KEYS],
    release_events: bool,
    frame: u64,
    fault: Option<String>,
}

/// The usual QWERTY layout of the hexadecimal keypad.
fn map_key(code: KeyCode) -> Option<Key> {
    let KeyCode::Char(c) = code else {
        return None;
    };
    let key = match c.to_ascii_lowercase() {
        '1' => Key::Key1,
        '2' => Key::Key2,
        '3' => Key::Key3,
        '4' => Key::KeyC,
        'q' => Key::Key4,
        'w' => Key::Key5,
        'e' => Key::Key6,
        'r' => Key::KeyD,
        'a' => Key::Key7,
        's' => Key::Key8,
        'd' => Key::Key9,
        'f' => Key::KeyE,
        'z' => Key::KeyA,
        'x' => Key::Key0,
        'c' => Key::KeyB,
        'v' => Key::KeyF,
        _ => return None,
    };
    Some(key)
}

impl Emulator {
    pub fn new(settings: Settings) -> Self {
        Emulator {
            state: Chip8State::new(),
            settings,
            last_pressed: [None; NUM_KEYS],
            release_events: false,
            frame: 0,
            fault: None,
        }
    }

    fn draw(&self, frame: &mut ratatui::Frame, rom_name: &str) {
        let game_width = (DISPLAY_WIDTH as u16) + 2; // +2 for left and right borders
        let game_height = (DISPLAY_HEIGHT as u16) + 2; // +2 for top and bottom borders

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(game_height),
                Constraint::Length(3), // Status line plus borders
                Constraint::Length(7), // Key mapping area
                Constraint::Min(0),
            ])
            .split(frame.area());

        // Center the game horizontally when the terminal is wider than the display.
        let game_area = if chunks[0].width > game_width {
            let columns = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([
                    Constraint::Min(0),
                    Constraint::Length(game_width),
                    Constraint::Min(0),
                ])
                .split(chunks[0]);
            columns[1]
        } else {
            chunks[0]
        };

        let mut screen = String::with_capacity(DISPLAY_WIDTH * DISPLAY_HEIGHT + DISPLAY_HEIGHT);
        for y in 0..DISPLAY_HEIGHT {
            for x in 0..DISPLAY_WIDTH {
                screen.push(if self.state.pixel(x, y) { '█' } else { ' ' });
            }
            screen.push('\n');
        }
        let game_paragraph = Paragraph::new(screen)
            .block(Block::default().borders(Borders::ALL).title(rom_name))
            .style(Style::default().fg(Color::White));
        frame.render_widget(game_paragraph, game_area);

        let status = match (&self.fault, self.state.status()) {
            (Some(fault), _) => format!("FAULT: {fault}"),
            (None, MachineStatus::Ready) => "running".to_string(),
            (None, MachineStatus::AwaitingInput) => "waiting for key".to_string(),
            (None, MachineStatus::Halted) => "halted".to_string(),
        };
        let status_line = format!(
            "PC {:#05X}  I {:#05X}  DT {:3}  ST {:3}  {:?}  {}",
            self.state.pc(),
            self.state.index(),
            self.state.delay_timer(),
            self.state.sound_timer(),
            self.state.compatibility_mode(),
            status,
        );
        let status_color = if self.fault.is_some() {
            Color::Red
        } else if self.state.sound_active() {
            Color::Magenta
        } else {
            Color::Green
        };
        let status_paragraph = Paragraph::new(status_line)
            .block(Block::default().borders(Borders::ALL).title("Machine"))
            .style(Style::default().fg(status_color));
        frame.render_widget(status_paragraph, chunks[1]);

        let key_mapping = "Key Mapping:\n\
    1 2 3 4    →    1 2 3 C\n\
    Q W E R    →    4 5 6 D\n\
    A S D F    →    7 8 9 E\n\
    Z X C V    →    A 0 B F";
        let key_paragraph = Paragraph::new(key_mapping)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title("Keypad (Esc quits)"))
            .style(Style::default().fg(Color::Yellow));
        frame.render_widget(key_paragraph, chunks[2]);
    }

    /// Forwards a terminal key event. Returns `false` when the user asked to quit.
    fn handle_key(&mut self, event: KeyEvent) -> bool {
        if event.code == KeyCode::Esc {
            return false;
        }
        let Some(key) = map_key(event.code) else {
            return true;
        };

        match event.kind {
            KeyEventKind::Press | KeyEventKind::Repeat => {
                if !self.state.is_key_pressed(key) {
                    self.state.trigger_key_down(key);
                }
                self.last_pressed[usize::from(key.index())] = Some(self.frame);
            }
            KeyEventKind::Release => {
                self.state.trigger_key_up(key);
                self.last_pressed[usize::from(key.index())] = None;
            }
        }
        true
    }

    /// Without release events, a key counts as held until the terminal's
    /// auto-repeat stops refreshing it.
    fn expire_held_keys(&mut self) {
        if self.release_events {
            return;
        }
        for key in Key::ALL {
            let slot = &mut self.last_pressed[usize::from(key.index())];
            if slot.is_some_and(|pressed| self.frame.saturating_sub(pressed) > KEY_HOLD_FRAMES) {
                *slot = None;
                self.state.trigger_key_up(key);
            }
        }
    }

    fn run_frame(&mut self, instructions_per_frame: u64) {
        if self.fault.is_some() {
            return;
        }
        for _ in 0..instructions_per_frame {
            match self.state.step() {
                Ok(StepOutcome::Halted) | Ok(StepOutcome::AwaitingKey(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    error!(error = %e, pc = self.state.pc(), "execution stopped");
                    self.fault = Some(e.to_string());
                    break;
                }
            }
        }
        self.state.clock_timers();
    }

    fn main_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stdout>>,
        rom_name: &str,
    ) -> anyhow::Result<()> {
        let frame_duration = Duration::from_secs_f64(1.0 / self.settings.frame_rate as f64);
        let instructions_per_frame = (self.settings.ips / self.settings.frame_rate).max(1);

        loop {
            let frame_start = Instant::now();

            while event::poll(Duration::ZERO)? {
                if let Event::Key(key) = event::read()? {
                    if !self.handle_key(key) {
                        return Ok(());
                    }
                }
            }
            self.expire_held_keys();

            self.run_frame(instructions_per_frame);
            terminal.draw(|frame| self.draw(frame, rom_name))?;
            self.frame += 1;

            let elapsed = frame_start.elapsed();
            if elapsed < frame_duration {
                std::thread::sleep(frame_duration - elapsed);
            }
        }
    }

    pub fn run(&mut self) -> anyhow::Result<()> {
        let loaded = self
            .state
            .load_program_file(&self.settings.rom)
            .with_context(|| format!("could not start {}", self.settings.rom.display()))?;
        self.state.set_compatibility_mode(self.settings.mode);
        info!(rom = %self.settings.rom.display(), loaded, mode = ?self.settings.mode, "starting");

        let rom_name: String = self
            .settings
            .rom
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Unknown ROM".to_string());

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        self.release_events = supports_keyboard_enhancement().unwrap_or(false);
        if self.release_events {
            execute!(
                stdout,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
        } else {
            warn!("terminal does not report key releases, emulating held keys");
        }

        let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        terminal.clear()?;

        let result = self.main_loop(&mut terminal, &rom_name);

        if self.release_events {
            execute!(std::io::stdout(), PopKeyboardEnhancementFlags)?;
        }
        terminal.clear()?;
        disable_raw_mode()?;

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn emulator() -> Emulator {
        Emulator::new(Settings::new(
            DEFAULT_FRAME_RATE,
            DEFAULT_INSTRUCTIONS_PER_SECOND,
            PathBuf::from("test.ch8"),
            CompatibilityMode::SuperChip,
        ))
    }

    #[test]
    fn keyboard_layout_covers_every_key() {
        let layout = "1234qwerasdfzxcv";
        let mut seen: Vec<u8> = layout
            .chars()
            .map(|c| map_key(KeyCode::Char(c)).unwrap().index())
            .collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..16).collect::<Vec<u8>>());
        assert_eq!(map_key(KeyCode::Char('Q')), Some(Key::Key4));
        assert_eq!(map_key(KeyCode::Enter), None);
    }

    #[test]
    fn escape_quits() {
        let mut emulator = emulator();
        assert!(!emulator.handle_key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE)));
    }

    #[test]
    fn held_keys_expire_without_release_events() {
        let mut emulator = emulator();
        assert!(emulator.handle_key(KeyEvent::new(KeyCode::Char('x'), KeyModifiers::NONE)));
        assert!(emulator.state.is_key_pressed(Key::Key0));

        emulator.frame += KEY_HOLD_FRAMES;
        emulator.expire_held_keys();
        assert!(emulator.state.is_key_pressed(Key::Key0));

        emulator.frame += 1;
        emulator.expire_held_keys();
        assert!(!emulator.state.is_key_pressed(Key::Key0));
    }

    #[test]
    fn fault_stops_execution() {
        let mut emulator = emulator();
        emulator.state.load_program(&[0x00, 0xEE]);
        emulator.run_frame(10);
        assert!(emulator.fault.is_some());
        assert_eq!(emulator.state.pc(), 0x200);
    }
}
