use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use rand::rngs::StdRng;
use std::time::Instant;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::config::AppConfig;
use crate::schedule::{Scheduler, Token, Wakeup};
use crate::widgets::countdown::{Countdown, Field, Tick};
use crate::widgets::lottery::Lottery;

/// Seconds a status message stays in the info line
const STATUS_SECONDS: u64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Timer,
    Lottery,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Popup {
    None,
    Help,
}

/// Which lottery input box is active
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Single,
    Bulk,
}

pub struct App {
    pub section: Section,
    pub popup: Popup,

    // Countdown (top box)
    pub countdown: Countdown,
    pub selected_field: Field,

    // Lottery (bottom box)
    pub lottery: Lottery<StdRng>,
    pub input_mode: InputMode,
    pub name_input: String,
    pub bulk_input: String,
    pub selected_name: usize,

    // Status message (shown in info line, auto-clears after timeout)
    pub status_message: Option<String>,
    pub status_message_time: Option<Instant>,

    notify_on_finish: bool,
    scheduler: Box<dyn Scheduler>,
    wakeups: UnboundedReceiver<Wakeup>,
}

impl App {
    pub fn new(
        config: &AppConfig,
        picker: StdRng,
        scheduler: Box<dyn Scheduler>,
        wakeups: UnboundedReceiver<Wakeup>,
    ) -> Self {
        let mut countdown = Countdown::new();
        countdown.set_hours(config.timer.hours);
        countdown.set_minutes(config.timer.minutes);
        countdown.set_seconds(config.timer.seconds);

        let mut lottery = Lottery::new(picker).with_draw_delay(config.lottery.draw_delay());
        for name in &config.lottery.names {
            lottery.add_single(name);
        }

        Self {
            section: Section::Timer,
            popup: Popup::None,

            countdown,
            selected_field: Field::Minutes,

            lottery,
            input_mode: InputMode::Single,
            name_input: String::new(),
            bulk_input: String::new(),
            selected_name: 0,

            status_message: None,
            status_message_time: None,

            notify_on_finish: config.timer.notify,
            scheduler,
            wakeups,
        }
    }

    /// Set a status message (auto-clears after a few seconds)
    fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some(msg.into());
        self.status_message_time = Some(Instant::now());
    }

    /// Whether plain character keys are text input rather than commands
    pub fn captures_text(&self) -> bool {
        self.popup == Popup::None && self.section == Section::Lottery
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if self.popup != Popup::None {
            self.handle_popup_key(key);
            return;
        }

        match key.code {
            KeyCode::Tab | KeyCode::BackTab => {
                // Only two sections, so both directions toggle
                self.section = match self.section {
                    Section::Timer => Section::Lottery,
                    Section::Lottery => Section::Timer,
                };
            }
            KeyCode::F(1) => self.popup = Popup::Help,
            _ => match self.section {
                Section::Timer => self.handle_timer_key(key),
                Section::Lottery => self.handle_lottery_key(key),
            },
        }
    }

    fn handle_popup_key(&mut self, key: KeyEvent) {
        if matches!(
            key.code,
            KeyCode::Esc | KeyCode::Char('?') | KeyCode::F(1) | KeyCode::Enter | KeyCode::Char('q')
        ) {
            self.popup = Popup::None;
        }
    }

    fn handle_timer_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Left => self.selected_field = self.selected_field.prev(),
            KeyCode::Right => self.selected_field = self.selected_field.next(),

            KeyCode::Char(c) if c.is_ascii_digit() => {
                if self.ensure_editable() {
                    // Typing appends to the field like a numeric input box
                    let text = format!("{}{}", self.countdown.field(self.selected_field), c);
                    self.countdown.set_field_input(self.selected_field, &text);
                }
            }
            KeyCode::Backspace => {
                if self.ensure_editable() {
                    let value = self.countdown.field(self.selected_field) / 10;
                    self.countdown.set_field(self.selected_field, value);
                }
            }
            KeyCode::Up => {
                if self.ensure_editable() {
                    let value = self.countdown.field(self.selected_field).saturating_add(1);
                    self.countdown.set_field(self.selected_field, value);
                }
            }
            KeyCode::Down => {
                if self.ensure_editable() {
                    let value = self.countdown.field(self.selected_field).saturating_sub(1);
                    self.countdown.set_field(self.selected_field, value);
                }
            }

            KeyCode::Char(' ') | KeyCode::Enter => {
                let was_running = self.countdown.is_running();
                self.countdown.toggle(self.scheduler.as_ref());
                if !was_running && !self.countdown.is_running() {
                    self.set_status("Set a duration first");
                }
            }
            KeyCode::Char('r') => self.countdown.reset(),
            KeyCode::Char('?') => self.popup = Popup::Help,
            _ => {}
        }
    }

    fn ensure_editable(&mut self) -> bool {
        if self.countdown.is_editable() {
            return true;
        }
        self.set_status("Reset (r) to change the duration");
        false
    }

    fn handle_lottery_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::Char('b') if ctrl => {
                self.input_mode = match self.input_mode {
                    InputMode::Single => InputMode::Bulk,
                    InputMode::Bulk => InputMode::Single,
                };
            }
            KeyCode::Char('d') if ctrl => self.draw(),
            KeyCode::Char('x') if ctrl => {
                self.lottery.clear_all();
                self.selected_name = 0;
                self.set_status("Pool cleared");
            }
            KeyCode::Char('r') if ctrl => {
                if self.lottery.reset_to_original() {
                    self.set_status("New round with the same group");
                }
            }

            KeyCode::Enter => match self.input_mode {
                InputMode::Single => self.add_single(),
                InputMode::Bulk => self.bulk_input.push('\n'),
            },
            KeyCode::F(2) if self.input_mode == InputMode::Bulk => self.add_bulk(),
            KeyCode::Backspace => {
                self.active_input().pop();
            }
            KeyCode::Char(c) if !ctrl => self.active_input().push(c),

            KeyCode::Down => {
                let len = self.lottery.pool().len();
                if len > 0 {
                    self.selected_name = (self.selected_name + 1) % len;
                }
            }
            KeyCode::Up => {
                let len = self.lottery.pool().len();
                if len > 0 {
                    self.selected_name = self.selected_name.checked_sub(1).unwrap_or(len - 1);
                }
            }
            KeyCode::Delete => self.remove_selected(),
            _ => {}
        }
    }

    fn active_input(&mut self) -> &mut String {
        match self.input_mode {
            InputMode::Single => &mut self.name_input,
            InputMode::Bulk => &mut self.bulk_input,
        }
    }

    fn add_single(&mut self) {
        // Input is kept on a duplicate so it can be corrected
        if self.lottery.add_single(&self.name_input) {
            self.name_input.clear();
        }
    }

    fn add_bulk(&mut self) {
        if self.bulk_input.trim().is_empty() {
            return;
        }
        let added = self.lottery.add_bulk(&self.bulk_input);
        self.bulk_input.clear();
        self.set_status(format!("Added {} name{}", added, if added == 1 { "" } else { "s" }));
    }

    fn remove_selected(&mut self) {
        if let Some(name) = self.lottery.pool().get(self.selected_name).cloned() {
            self.lottery.remove(&name);
            self.clamp_selection();
        }
    }

    fn draw(&mut self) {
        if self.lottery.is_drawing() {
            return;
        }
        if !self.lottery.draw(self.scheduler.as_ref()) {
            self.set_status("No names to draw");
        }
    }

    fn clamp_selection(&mut self) {
        let len = self.lottery.pool().len();
        if self.selected_name >= len {
            self.selected_name = len.saturating_sub(1);
        }
    }

    /// Route a scheduler wakeup to the widget that owns it
    fn dispatch(&mut self, token: Token) {
        if self.countdown.owns(token) {
            if self.countdown.on_wakeup(token) == Some(Tick::Finished) {
                self.set_status("Time's up!");
                if self.notify_on_finish {
                    notify_finished(self.countdown.total_seconds());
                }
            }
        } else if self.lottery.owns(token) {
            if let Some(name) = self.lottery.on_wakeup(token) {
                let msg = format!("Winner: {}", name);
                self.set_status(msg);
            }
            self.clamp_selection();
        } else {
            tracing::debug!(?token, "ignoring stale wakeup");
        }
    }

    pub fn tick(&mut self) {
        while let Ok(wakeup) = self.wakeups.try_recv() {
            self.dispatch(wakeup.token);
        }

        // Clear status message after timeout
        if let Some(time) = self.status_message_time {
            if time.elapsed().as_secs() >= STATUS_SECONDS {
                self.status_message = None;
                self.status_message_time = None;
            }
        }
    }
}

fn notify_finished(total_seconds: u64) {
    let body = format!(
        "{} countdown finished",
        crate::widgets::countdown::format_hms(total_seconds)
    );
    if let Err(e) = notify_rust::Notification::new()
        .summary("Time's up!")
        .body(&body)
        .icon("alarm-clock")
        .show()
    {
        tracing::warn!("Could not show notification: {}", e);
    }
}
