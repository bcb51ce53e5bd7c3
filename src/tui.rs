use crate::config::Options;
use crate::engine::{Display, Engine, EngineStatus};
use crate::launch::ShellLauncher;
use crate::models::AlarmList;
use crate::sched::LoopScheduler;
use anyhow::Result;
use chrono::Local;
use crossterm::{
    event::{self, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, Paragraph},
    Frame, Terminal,
};
use std::cell::RefCell;
use std::io;
use std::rc::Rc;
use std::time::{Duration as StdDuration, Instant};

/// What the engine has asked the panel to show. The engine writes through
/// the `Display` trait; `draw` reads.
#[derive(Default)]
struct PanelModel {
    remaining_text: String,
    progress: f64,
    tooltip_enabled: bool,
    alert: Option<String>,
}

#[derive(Clone, Default)]
struct PanelDisplay {
    model: Rc<RefCell<PanelModel>>,
}

impl Display for PanelDisplay {
    fn set_remaining_text(&mut self, text: &str) {
        self.model.borrow_mut().remaining_text = text.to_string();
    }

    fn set_progress_fraction(&mut self, fraction: f64) {
        self.model.borrow_mut().progress = fraction.clamp(0.0, 1.0);
    }

    fn show_attention_dialog(&mut self, message: &str) {
        self.model.borrow_mut().alert = Some(message.to_string());
    }

    fn set_tooltip_enabled(&mut self, enabled: bool) {
        let mut model = self.model.borrow_mut();
        model.tooltip_enabled = enabled;
        if !enabled {
            model.remaining_text.clear();
        }
    }
}

pub fn run_panel(list: &mut AlarmList, options: Options) -> Result<()> {
    // setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_loop(&mut terminal, list, options);

    // restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    list: &mut AlarmList,
    options: Options,
) -> Result<()> {
    let display = PanelDisplay::default();
    let model = display.model.clone();
    let scheduler = LoopScheduler::new();
    let mut engine = Engine::new(
        Box::new(display),
        Box::new(ShellLauncher),
        Box::new(scheduler.clone()),
        options,
    );

    loop {
        terminal.draw(|f| draw(f, list, &engine, &model.borrow()))?;

        if event::poll(StdDuration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if model.borrow().alert.is_some() {
                    // Any key acknowledges the alert.
                    model.borrow_mut().alert = None;
                    continue;
                }
                match key.code {
                    KeyCode::Char('q') => return Ok(()),
                    KeyCode::Up | KeyCode::Char('k') => list.select_prev(),
                    KeyCode::Down | KeyCode::Char('j') => list.select_next(),
                    KeyCode::Enter | KeyCode::Char('s') => match engine.status() {
                        EngineStatus::Idle => {
                            // Arming with an empty list is a no-op.
                            if let Some(alarm) = list.selected() {
                                engine.arm(alarm, Local::now().time(), Instant::now())?;
                            }
                        }
                        EngineStatus::Running | EngineStatus::Paused => engine.stop()?,
                        EngineStatus::Repeating => {}
                    },
                    KeyCode::Char('p') => match engine.status() {
                        EngineStatus::Running if engine.can_pause() => {
                            engine.pause(Instant::now())?
                        }
                        EngineStatus::Paused => engine.resume(Instant::now())?,
                        _ => {}
                    },
                    KeyCode::Char('x') => engine.stop_repeating(),
                    KeyCode::Char('K') => {
                        if let Some(id) = list.selected().map(|a| a.id) {
                            list.move_up(id);
                        }
                    }
                    KeyCode::Char('J') => {
                        if let Some(id) = list.selected().map(|a| a.id) {
                            list.move_down(id);
                        }
                    }
                    _ => {}
                }
            }
        }

        let now = Instant::now();
        for handle in scheduler.due(now) {
            if engine.tick_handle() == Some(handle) {
                engine.tick(now);
            } else if engine.repeat_handle() == Some(handle) {
                engine.repeat_fire();
            }
        }
    }
}

fn draw(frame: &mut Frame, list: &AlarmList, engine: &Engine, model: &PanelModel) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Length(3), // Progress
            Constraint::Min(0),    // Alarm list
            Constraint::Length(3), // Footer
        ])
        .split(frame.size());

    draw_header(frame, chunks[0], engine);
    draw_progress(frame, chunks[1], model);
    draw_alarms(frame, chunks[2], list);
    draw_footer(frame, chunks[3], engine);

    if let Some(message) = &model.alert {
        draw_alert(frame, message);
    }
}

fn draw_header(frame: &mut Frame, area: Rect, engine: &Engine) {
    let status = match engine.status() {
        EngineStatus::Idle => Span::styled("IDLE", Style::default().fg(Color::DarkGray)),
        EngineStatus::Running => Span::styled(
            "RUNNING",
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        ),
        EngineStatus::Paused => Span::styled(
            "PAUSED",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
        EngineStatus::Repeating => Span::styled(
            "REPEATING",
            Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
        ),
    };

    let header = Line::from(vec![
        Span::styled(
            " Belfry ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" | "),
        status,
        Span::raw(" | "),
        Span::raw(Local::now().format("%Y-%m-%d %H:%M:%S").to_string()),
    ]);

    let para = Paragraph::new(header).block(Block::default().borders(Borders::ALL));
    frame.render_widget(para, area);
}

fn draw_progress(frame: &mut Frame, area: Rect, model: &PanelModel) {
    let label = if model.tooltip_enabled && !model.remaining_text.is_empty() {
        model.remaining_text.clone()
    } else {
        "no timer running".to_string()
    };
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL))
        .gauge_style(Style::default().fg(Color::Green).bg(Color::Black))
        .ratio(model.progress)
        .label(label);
    frame.render_widget(gauge, area);
}

fn draw_alarms(frame: &mut Frame, area: Rect, list: &AlarmList) {
    let mut lines = Vec::new();
    if list.is_empty() {
        lines.push(Line::raw(
            "  No alarms yet. Add one with `belfry add`.",
        ));
    }
    let selected_index = list.selected_index();
    for (i, alarm) in list.iter().enumerate() {
        let marker = if Some(i) == selected_index { "> " } else { "  " };
        let style = if Some(i) == selected_index {
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        let mut spans = vec![Span::styled(
            format!("{}{}", marker, alarm.info_text()),
            style,
        )];
        if !alarm.command.is_empty() {
            spans.push(Span::styled(
                format!("  $ {}", alarm.command),
                Style::default().fg(Color::DarkGray),
            ));
        }
        lines.push(Line::from(spans));
    }

    let block = Block::default().title(" Alarms ").borders(Borders::ALL);
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_footer(frame: &mut Frame, area: Rect, engine: &Engine) {
    let help = match engine.status() {
        EngineStatus::Repeating => "x: stop the alarm | q: quit",
        EngineStatus::Paused => "enter: stop | p: resume | q: quit",
        EngineStatus::Running if engine.can_pause() => {
            "enter: stop | p: pause | up/down: select | q: quit"
        }
        EngineStatus::Running => "enter: stop | up/down: select | q: quit",
        EngineStatus::Idle => "enter: start | up/down: select | J/K: move | q: quit",
    };
    let para = Paragraph::new(help)
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Center);
    frame.render_widget(para, area);
}

fn draw_alert(frame: &mut Frame, message: &str) {
    let area = centered_rect(40, 5, frame.size());
    let para = Paragraph::new(vec![
        Line::raw(""),
        Line::styled(
            message.to_string(),
            Style::default()
                .fg(Color::Red)
                .add_modifier(Modifier::BOLD),
        ),
        Line::raw("press any key"),
    ])
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(Clear, area);
    frame.render_widget(para, area);
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}
