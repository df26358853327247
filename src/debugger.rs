//! Interactive single-step debugger.
//!
//! Shows the clean code with the instruction pointer, a window of the tape
//! with the data pointer, and the output cache. The debugger only drives
//! [`Engine::step`]; it never changes how an instruction behaves.

use std::collections::VecDeque;
use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame, Terminal,
};

use crate::config::{Colors, Settings};
use crate::engine::Engine;
use crate::instruction::Instruction;
use crate::io::Discard;
use crate::loader::Program;
use crate::tape::Tape;
use crate::trace::escape_output;

/// Instructions executed per frame while continuing, so keys stay responsive.
const STEPS_PER_FRAME: u64 = 50_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Paused,
    Running,
    /// Stopped on a trace marker while continuing.
    Marker,
    Halted,
    Failed(String),
}

/// Debugger state: one engine plus what the user has seen of it.
pub struct Debugger<'p> {
    program: &'p Program,
    settings: Settings,
    input: Vec<u8>,
    engine: Engine<'p>,
    last: Option<Instruction>,
    status: Status,
}

impl<'p> Debugger<'p> {
    /// `input` feeds `,`; once it runs out, `,` stores 0.
    pub fn new(program: &'p Program, settings: Settings, input: Vec<u8>) -> Self {
        let engine = fresh_engine(program, &settings, &input);
        let status = if engine.is_halted() { Status::Halted } else { Status::Paused };
        Self { program, settings, input, engine, last: None, status }
    }

    pub fn engine(&self) -> &Engine<'p> {
        &self.engine
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == Status::Running
    }

    /// Execute one instruction.
    pub fn step(&mut self) {
        if matches!(self.status, Status::Halted | Status::Failed(_)) {
            return;
        }
        match self.engine.step() {
            Ok(snapshot) => {
                self.last = snapshot.executed;
                self.status = if snapshot.halted { Status::Halted } else { Status::Paused };
            }
            Err(err) => self.status = Status::Failed(err.to_string()),
        }
    }

    /// Start continuing; [`Debugger::advance`] does the work.
    pub fn resume(&mut self) {
        if matches!(self.status, Status::Paused | Status::Marker) {
            self.status = Status::Running;
        }
    }

    /// Run up to `budget` instructions, stopping early on halt, error or a trace marker.
    pub fn advance(&mut self, budget: u64) {
        for _ in 0..budget {
            if self.status != Status::Running {
                return;
            }
            match self.engine.step() {
                Ok(snapshot) => {
                    self.last = snapshot.executed;
                    if snapshot.halted {
                        self.status = Status::Halted;
                    } else if self.engine.at_marker() {
                        self.status = Status::Marker;
                    }
                }
                Err(err) => self.status = Status::Failed(err.to_string()),
            }
        }
    }

    /// Throw the engine away and start over on a fresh tape.
    pub fn restart(&mut self) {
        self.engine = fresh_engine(self.program, &self.settings, &self.input);
        self.last = None;
        self.status = if self.engine.is_halted() { Status::Halted } else { Status::Paused };
    }

    /// Returns true when the user asked to quit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return true;
        }
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Char('s') => {
                if self.is_running() {
                    self.status = Status::Paused;
                } else {
                    self.step();
                }
            }
            KeyCode::Char('c') => {
                if self.is_running() {
                    self.status = Status::Paused;
                } else {
                    self.resume();
                }
            }
            KeyCode::Char('r') => self.restart(),
            _ => {}
        }
        false
    }
}

fn fresh_engine<'p>(program: &'p Program, settings: &Settings, input: &[u8]) -> Engine<'p> {
    let mut engine = Engine::with_tape(program, Tape::with_policy(settings.tape_len, settings.bounds));
    engine.set_input_source(input.iter().copied().collect::<VecDeque<u8>>());
    engine.set_output_sink(Discard);
    engine.set_window_size(settings.tape_window);
    engine
}

/// Take over the terminal and run the debugger until the user quits.
pub fn run(program: &Program, settings: Settings, input: Vec<u8>) -> io::Result<()> {
    // terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let mut debugger = Debugger::new(program, settings, input);
    let res = run_app(&mut terminal, &mut debugger);

    // restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, debugger: &mut Debugger<'_>) -> io::Result<()> {
    loop {
        terminal.draw(|f| draw(f, debugger))?;

        let timeout = if debugger.is_running() {
            Duration::ZERO
        } else {
            Duration::from_millis(250)
        };
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && debugger.handle_key(key) {
                    return Ok(());
                }
            }
        }

        if debugger.is_running() {
            debugger.advance(STEPS_PER_FRAME);
        }
    }
}

/// Render the whole debugger into `f`.
pub fn draw(f: &mut Frame, debugger: &Debugger<'_>) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),
            Constraint::Length(5),
            Constraint::Length(5),
            Constraint::Length(2),
        ])
        .split(f.area());

    draw_code(f, rows[0], debugger);
    draw_tape(f, rows[1], debugger);
    draw_output(f, rows[2], debugger);
    draw_status(f, rows[3], debugger);
}

fn titled<'a>(title: String, colors: &Colors, focused: bool) -> Block<'a> {
    let color = if focused { colors.title_focused } else { colors.title_unfocused };
    Block::default()
        .title(Span::styled(title, Style::default().fg(color)))
        .borders(Borders::ALL)
}

fn draw_code(f: &mut Frame, area: Rect, debugger: &Debugger<'_>) {
    let colors = &debugger.settings.colors;
    let engine = debugger.engine();
    let ip = engine.ip();
    let code = debugger.program.code();

    let block = titled(format!("Code ({} instructions)", code.len()), colors, true);
    let inner = block.inner(area);
    f.render_widget(block, area);

    if code.is_empty() {
        f.render_widget(Paragraph::new("<no instructions>"), inner);
        return;
    }

    let width = (inner.width as usize).max(1);
    let mut lines: Vec<Line> = Vec::new();
    for (row, chunk) in code.chunks(width).enumerate() {
        let spans: Vec<Span> = chunk
            .iter()
            .enumerate()
            .map(|(col, instr)| {
                let pos = row * width + col;
                let mut style = Style::default();
                if debugger.program.is_marker(pos) {
                    style = style.fg(colors.code_marker).add_modifier(Modifier::UNDERLINED);
                }
                if pos == ip {
                    style = style.bg(colors.code_ip).fg(ratatui::style::Color::Black);
                }
                Span::styled(instr.as_char().to_string(), style)
            })
            .collect();
        lines.push(Line::from(spans));
    }

    // Keep the instruction pointer's row visible.
    let ip_row = ip.min(code.len() - 1) / width;
    let height = (inner.height as usize).max(1);
    let scroll = ip_row.saturating_sub(height - 1);
    let paragraph = Paragraph::new(lines).scroll((scroll as u16, 0));
    f.render_widget(paragraph, inner);
}

fn draw_tape(f: &mut Frame, area: Rect, debugger: &Debugger<'_>) {
    let colors = &debugger.settings.colors;
    let window = debugger.engine().window();
    let end = window.base + window.cells.len();

    let block = titled(format!("Tape (cells {}..{})", window.base, end), colors, false);

    let spans: Vec<Span> = window
        .cells
        .iter()
        .enumerate()
        .map(|(i, byte)| {
            let style = if Some(i) == window.pointer_offset() {
                Style::default().fg(colors.tape_cell_pointer).add_modifier(Modifier::BOLD)
            } else if *byte == 0 {
                Style::default().fg(colors.tape_cell_empty)
            } else {
                Style::default().fg(colors.tape_cell_nonzero)
            };
            let text = if Some(i) == window.pointer_offset() {
                format!("[{byte:>3}]")
            } else {
                format!(" {byte:>3} ")
            };
            Span::styled(text, style)
        })
        .collect();

    let paragraph = Paragraph::new(Line::from(spans))
        .wrap(Wrap { trim: false })
        .block(block);
    f.render_widget(paragraph, area);
}

fn draw_output(f: &mut Frame, area: Rect, debugger: &Debugger<'_>) {
    let colors = &debugger.settings.colors;
    let output = debugger.engine().output();
    let block = titled(format!("Output ({} bytes)", output.len()), colors, false);

    let paragraph = if output.is_empty() {
        Paragraph::new("<no output yet>")
    } else {
        Paragraph::new(escape_output(output))
    };
    f.render_widget(paragraph.wrap(Wrap { trim: false }).block(block), area);
}

fn draw_status(f: &mut Frame, area: Rect, debugger: &Debugger<'_>) {
    let colors = &debugger.settings.colors;
    let engine = debugger.engine();

    let (state, color) = match debugger.status() {
        Status::Paused => ("Paused".to_string(), colors.status_text),
        Status::Running => ("Running".to_string(), colors.status_text),
        Status::Marker => ("Stopped at marker".to_string(), colors.status_text),
        Status::Halted => ("Halted".to_string(), colors.status_text),
        Status::Failed(msg) => (format!("Error: {msg}"), colors.status_error),
    };
    let last = debugger
        .last
        .map(|i| format!(" | Last: {} {}", i.as_char(), i.name()))
        .unwrap_or_default();

    let status = format!(
        " IP: {}/{} | DP: {} | Cell: {} | Steps: {}{} | {}",
        engine.ip(),
        debugger.program.len(),
        engine.dp(),
        engine.current_cell(),
        engine.steps(),
        last,
        state
    );
    let help = " Enter/Space: step  c: continue/pause  r: restart  q: quit";

    let lines = vec![
        Line::from(Span::styled(status, Style::default().fg(color))),
        Line::from(Span::styled(help, Style::default().fg(colors.title_unfocused))),
    ];
    f.render_widget(Paragraph::new(lines), area);
}
