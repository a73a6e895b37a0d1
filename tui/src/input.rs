//! Input handling for the hwdiag TUI.

use anyhow::{Result, anyhow};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};
use tokio::sync::mpsc;
use tracing::debug;

use hwdiag_engine::{App, DraftMut};

const INPUT_POLL_TIMEOUT: Duration = Duration::from_millis(25); // shutdown responsiveness
const INPUT_CHANNEL_CAPACITY: usize = 1024; // bounded: no OOM
const MAX_EVENTS_PER_FRAME: usize = 64; // never starve rendering

enum InputMsg {
    Event(Event),
    Error(String),
}

/// Reads terminal events on a blocking thread and hands them to the frame loop.
pub struct InputPump {
    rx: mpsc::Receiver<InputMsg>,
    stop: Arc<AtomicBool>,
    join: Option<tokio::task::JoinHandle<()>>,
}

impl InputPump {
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel(INPUT_CHANNEL_CAPACITY);
        let stop = Arc::new(AtomicBool::new(false));
        let stop2 = stop.clone();

        let join = tokio::task::spawn_blocking(move || input_loop(stop2, tx));
        Self {
            rx,
            stop,
            join: Some(join),
        }
    }

    pub async fn shutdown(&mut self) {
        // Unblock the reader if it is waiting on channel capacity.
        self.rx.close();

        self.stop.store(true, Ordering::Release);
        if let Some(join) = self.join.take() {
            let _ = tokio::time::timeout(Duration::from_secs(2), join).await;
        }
    }
}

impl Default for InputPump {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for InputPump {
    fn drop(&mut self) {
        // Best-effort stop; do not block in Drop.
        self.rx.close();
        self.stop.store(true, Ordering::Release);
    }
}

fn input_loop(stop: Arc<AtomicBool>, tx: mpsc::Sender<InputMsg>) {
    while !stop.load(Ordering::Acquire) {
        match event::poll(INPUT_POLL_TIMEOUT) {
            Ok(true) => match event::read() {
                Ok(ev) => {
                    // Backpressure instead of dropping events.
                    if tx.blocking_send(InputMsg::Event(ev)).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    let _ = tx.blocking_send(InputMsg::Error(e.to_string()));
                    break;
                }
            },
            Ok(false) => {}
            Err(e) => {
                let _ = tx.blocking_send(InputMsg::Error(e.to_string()));
                break;
            }
        }
    }
}

/// Drain pending input for this frame. Returns `true` when the app should quit.
pub fn handle_events(app: &mut App, input: &mut InputPump) -> Result<bool> {
    let mut processed = 0;
    while processed < MAX_EVENTS_PER_FRAME {
        let ev = match input.rx.try_recv() {
            Ok(InputMsg::Event(ev)) => ev,
            Ok(InputMsg::Error(msg)) => return Err(anyhow!("input error: {msg}")),
            Err(mpsc::error::TryRecvError::Empty) => break,
            Err(mpsc::error::TryRecvError::Disconnected) => {
                return Err(anyhow!("input pump disconnected"));
            }
        };
        processed += 1;

        apply_event(app, ev);
        if app.should_quit() {
            return Ok(true);
        }
    }
    Ok(app.should_quit())
}

/// Apply one terminal event to the app.
pub fn apply_event(app: &mut App, event: Event) {
    match event {
        Event::Key(key) if key.kind != KeyEventKind::Release => apply_key(app, key),
        Event::Paste(text) => {
            if let DraftMut::Active(draft) = app.draft_mut() {
                draft.enter_text(&text);
            }
        }
        _ => {}
    }
}

fn apply_key(app: &mut App, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('c') if ctrl => app.request_quit(),
        KeyCode::Esc => {
            app.dismiss_error();
        }
        KeyCode::Enter if !key.modifiers.contains(KeyModifiers::SHIFT) => {
            let outcome = app.submit_input();
            debug!(?outcome, "Submit key");
        }
        _ => edit_draft(app, key, ctrl),
    }
}

fn edit_draft(app: &mut App, key: KeyEvent, ctrl: bool) {
    let DraftMut::Active(draft) = app.draft_mut() else {
        return;
    };
    match key.code {
        KeyCode::Enter => draft.enter_char('\n'),
        KeyCode::Char('u') if ctrl => draft.clear(),
        KeyCode::Char('w') if ctrl => draft.delete_word_backwards(),
        KeyCode::Char('a') if ctrl => draft.move_cursor_home(),
        KeyCode::Char('e') if ctrl => draft.move_cursor_end(),
        KeyCode::Char(c) if !ctrl => draft.enter_char(c),
        KeyCode::Backspace => draft.delete_char(),
        KeyCode::Delete => draft.delete_char_forward(),
        KeyCode::Left => draft.move_cursor_left(),
        KeyCode::Right => draft.move_cursor_right(),
        KeyCode::Home => draft.move_cursor_home(),
        KeyCode::End => draft.move_cursor_end(),
        _ => {}
    }
}
