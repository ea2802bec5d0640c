use std::io::{self, Write};
use std::time::Duration;

use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute, queue,
    style::Print,
    terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};

use spectrum_visualiser_core::{
    ControlEvent, HorizontalScale, InputSource, Renderer, Result as CoreResult,
};

/// Raw-mode/alternate-screen guard. The terminal is restored on drop, also
/// on the error paths out of the main loop.
pub struct TerminalUi;

impl TerminalUi {
    pub fn setup() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen, cursor::Hide)?;
        Ok(Self)
    }
}

impl Drop for TerminalUi {
    fn drop(&mut self) {
        let _ = execute!(io::stdout(), cursor::Show, LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

/// Draws the magnitude array as vertical bars, one frame per call.
///
/// Bin-to-column mapping is recomputed every frame from the current
/// terminal size and magnitude count, so runtime transform resizes and
/// terminal resizes need no special handling.
pub struct TerminalRenderer {
    stdout: io::Stdout,
    frame: String,
    last_size: (u16, u16),
}

impl TerminalRenderer {
    pub fn new() -> Self {
        Self {
            stdout: io::stdout(),
            frame: String::new(),
            last_size: (0, 0),
        }
    }
}

impl Default for TerminalRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for TerminalRenderer {
    fn render(&mut self, magnitudes: &[f32], mode: HorizontalScale) -> CoreResult<()> {
        let size = terminal::size()?;
        let (width, height) = size;
        let columns = width.max(1) as usize;
        let rows = usize::from(height.saturating_sub(2)).max(1);

        let levels = column_levels(magnitudes, columns, mode);

        self.frame.clear();
        let header = format!(
            "{:?} axis | {} bins | [l] axis  [up/down] gain  [left/right] resolution  [q] quit",
            mode,
            magnitudes.len()
        );
        self.frame.extend(header.chars().take(columns));
        self.frame.push_str("\r\n\r\n");

        for row in 0..rows {
            let threshold = (rows - row) as f32 / rows as f32;
            for &level in &levels {
                self.frame.push(if level >= threshold { '█' } else { ' ' });
            }
            if row + 1 < rows {
                self.frame.push_str("\r\n");
            }
        }

        if size != self.last_size {
            self.last_size = size;
            queue!(self.stdout, Clear(ClearType::All))?;
        }
        queue!(self.stdout, cursor::MoveTo(0, 0), Print(&self.frame))?;
        self.stdout.flush()?;
        Ok(())
    }
}

/// Folds the magnitude bins into one level per terminal column, either
/// spread evenly or along a base-10 logarithmic axis, the same horizontal
/// mapping the bins would get on a graphical plot.
fn column_levels(magnitudes: &[f32], columns: usize, mode: HorizontalScale) -> Vec<f32> {
    let bins = magnitudes.len();
    let mut levels = vec![0.0; columns];
    if bins == 0 || columns == 0 {
        return levels;
    }

    for (column, level) in levels.iter_mut().enumerate() {
        let (lo, hi) = match mode {
            HorizontalScale::Linear => {
                (column * bins / columns, ((column + 1) * bins / columns).max(1))
            }
            HorizontalScale::Logarithmic => {
                let n = bins as f32;
                let lo = (n.powf(column as f32 / columns as f32) - 1.0) as usize;
                let hi = (n.powf((column + 1) as f32 / columns as f32) - 1.0).ceil() as usize;
                (lo, hi)
            }
        };
        let lo = lo.min(bins - 1);
        let hi = hi.clamp(lo + 1, bins);

        let peak = magnitudes[lo..hi].iter().fold(0.0_f32, |acc, &m| acc.max(m));
        // Full scale spans two clip-space units on the original plot.
        *level = (peak * 0.5).clamp(0.0, 1.0);
    }

    levels
}

/// Polls the keyboard without blocking and maps keys onto control events.
pub struct TerminalInput;

impl InputSource for TerminalInput {
    fn poll(&mut self) -> CoreResult<Vec<ControlEvent>> {
        let mut events = Vec::new();
        while event::poll(Duration::ZERO)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if let Some(event) = map_key(key) {
                        events.push(event);
                    }
                }
            }
        }
        Ok(events)
    }
}

fn map_key(key: KeyEvent) -> Option<ControlEvent> {
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(ControlEvent::Close)
        }
        KeyCode::Char('q') | KeyCode::Esc => Some(ControlEvent::Close),
        KeyCode::Char('l') => Some(ControlEvent::CycleHorizontal),
        KeyCode::Up => Some(ControlEvent::IncreaseScale),
        KeyCode::Down => Some(ControlEvent::DecreaseScale),
        KeyCode::Right => Some(ControlEvent::DoubleFftSize),
        KeyCode::Left => Some(ControlEvent::HalveFftSize),
        _ => None,
    }
}
