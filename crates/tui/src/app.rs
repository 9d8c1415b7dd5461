use std::{io, sync::Arc, thread, time::Duration};

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use station_quiz_core::{
    config::{self, AppConfig},
    CatalogLoader, MapLauncher, QuizSession, Station, StationCatalog,
};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

const TICK_RATE: Duration = Duration::from_millis(250);
const STATUS_TTL_TICKS: u32 = 24;
const READY_STATUS: &str = "Ready";

#[derive(Debug, Clone)]
struct Theme {
    primary_fg: Color,
    accent: Color,
    muted: Color,
    selection_bg: Color,
    warning: Color,
    danger: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_fg: Color::White,
            accent: Color::Cyan,
            muted: Color::DarkGray,
            selection_bg: Color::DarkGray,
            warning: Color::Yellow,
            danger: Color::Red,
        }
    }
}

enum AppEvent {
    Input(Event),
    Tick,
}

/// Terminal front-end for a quiz session.
pub struct QuizApp {
    loader: CatalogLoader,
    config: AppConfig,
    launcher: Box<dyn MapLauncher + Send>,
    session: Option<QuizSession<ChaCha8Rng>>,
    load_error: Option<String>,
    picker: Option<StationPicker>,
    state: UiState,
    theme: Theme,
}

impl QuizApp {
    pub fn new(
        loader: CatalogLoader,
        config: AppConfig,
        launcher: Box<dyn MapLauncher + Send>,
    ) -> Self {
        let mut app = Self {
            loader,
            config,
            launcher,
            session: None,
            load_error: None,
            picker: None,
            state: UiState::default(),
            theme: Theme::default(),
        };
        let catalog = app.loader.catalog();
        app.start_session(catalog);
        app
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let result = self.event_loop(&mut terminal).await;
        restore_terminal(&mut terminal)?;
        result
    }

    async fn event_loop<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(128);
        spawn_input_thread(event_tx);

        loop {
            terminal.draw(|frame| self.draw(frame))?;
            if self.state.should_quit {
                break;
            }
            match event_rx.recv().await {
                Some(AppEvent::Input(event)) => self.handle_input(event),
                Some(AppEvent::Tick) => self.handle_tick(),
                None => break,
            }
            if self.state.should_quit {
                break;
            }
        }
        Ok(())
    }

    fn start_session(&mut self, catalog: Arc<StationCatalog>) {
        let rng = match self.config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        self.picker = None;
        match QuizSession::with_history_limit(catalog, rng, self.config.history_limit) {
            Ok(session) => {
                info!(stations = session.catalog().len(), "Quiz ready");
                self.session = Some(session);
                self.load_error = None;
            }
            Err(err) => {
                warn!(%err, "Quiz unavailable");
                self.session = None;
                self.load_error = Some(err.to_string());
            }
        }
    }

    fn reload_catalog(&mut self) {
        let catalog = self.loader.reload();
        let total = catalog.len();
        self.start_session(catalog);
        if self.session.is_some() {
            self.state
                .set_status(format!("Reloaded {total} stations; new quiz started"));
        } else {
            self.state
                .set_status("Reload finished but no quiz can be built".to_string());
        }
    }

    fn handle_tick(&mut self) {
        self.state.tick();
    }

    fn handle_input(&mut self, event: Event) {
        if let Event::Key(key) = event {
            if key.kind == KeyEventKind::Press {
                self.handle_key(key);
            }
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if self.picker.is_some() {
            self.handle_picker_key(key);
            return;
        }

        match key.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => {
                self.state.should_quit = true;
                return;
            }
            KeyCode::Char('r') => {
                self.reload_catalog();
                return;
            }
            _ => {}
        }

        let Some(session) = self.session.as_mut() else {
            self.state
                .set_status("No quiz available; press [r] to reload".to_string());
            return;
        };

        match key.code {
            KeyCode::Char('n') | KeyCode::Enter => match session.advance() {
                Ok(question) => {
                    let message = format!(
                        "Next: {} → {}",
                        question.origin().name,
                        question.destination().name
                    );
                    self.state.set_status(message);
                }
                Err(err) => {
                    error!(%err, "Failed to generate question");
                    self.state.set_status(format!("Error: {err}"));
                }
            },
            KeyCode::Char('b') | KeyCode::Left => {
                if session.can_go_back() {
                    session.go_back();
                    let (position, total) = session.position();
                    self.state
                        .set_status(format!("Back to question {position}/{total}"));
                } else {
                    self.state
                        .set_status("Already at the first question".to_string());
                }
            }
            KeyCode::Right => {
                if session.can_go_forward() {
                    session.go_forward();
                    let (position, total) = session.position();
                    self.state
                        .set_status(format!("Forward to question {position}/{total}"));
                } else {
                    self.state.set_status(
                        "Already at the newest question; press [n] for a new one".to_string(),
                    );
                }
            }
            KeyCode::Char('p') => {
                let enabled = !session.is_fixed_origin();
                match session.toggle_fixed_origin(enabled) {
                    Ok(question) => {
                        let message = if enabled {
                            format!("Origin pinned to {}", question.origin().name)
                        } else {
                            "Origin released; both stations are random".to_string()
                        };
                        self.state.set_status(message);
                    }
                    Err(err) => self.state.set_status(format!("Error: {err}")),
                }
            }
            KeyCode::Char('s') => {
                if session.is_fixed_origin() {
                    let origin = session.current_question().origin().name.clone();
                    let cursor = session.catalog().position(&origin).unwrap_or(0);
                    self.picker = Some(StationPicker::new(cursor));
                    self.state
                        .set_status("Type to filter, Enter to pin, Esc to cancel".to_string());
                } else {
                    self.state.set_status(
                        "Pin the origin with [p] before choosing a station".to_string(),
                    );
                }
            }
            KeyCode::Char('1') => {
                let expanded = session.toggle_origin_hint();
                self.state.set_status(hint_status("Origin", expanded));
            }
            KeyCode::Char('2') => {
                let expanded = session.toggle_destination_hint();
                self.state.set_status(hint_status("Destination", expanded));
            }
            KeyCode::Char('m') => {
                let route = session.open_route();
                match self.launcher.launch(&route) {
                    Ok(()) => self.state.set_status(format!(
                        "Opened map: {} → {}",
                        route.origin, route.destination
                    )),
                    Err(err) => {
                        error!(?err, "Map launch failed");
                        self.state.set_status(format!("Failed to open map: {err}"));
                    }
                }
            }
            _ => {}
        }
    }

    fn handle_picker_key(&mut self, key: KeyEvent) {
        if self.session.is_none() {
            self.picker = None;
            return;
        }
        let (Some(picker), Some(session)) = (self.picker.as_mut(), self.session.as_mut()) else {
            return;
        };
        let total = session.catalog().matching(&picker.query).len();

        match key.code {
            KeyCode::Esc => {
                self.picker = None;
                self.state.set_status("Station selection cancelled".to_string());
            }
            KeyCode::Down => picker.move_cursor(1, total),
            KeyCode::Up => picker.move_cursor(-1, total),
            KeyCode::PageDown => picker.move_cursor(picker.page() as isize, total),
            KeyCode::PageUp => picker.move_cursor(-(picker.page() as isize), total),
            KeyCode::Home => picker.move_cursor(isize::MIN / 2, total),
            KeyCode::End => picker.move_cursor(isize::MAX / 2, total),
            KeyCode::Backspace => {
                picker.query.pop();
                picker.reset_cursor();
            }
            KeyCode::Char(ch) => {
                picker.query.push(ch);
                picker.reset_cursor();
            }
            KeyCode::Enter => {
                let choice: Option<Station> = session
                    .catalog()
                    .matching(&picker.query)
                    .get(picker.cursor)
                    .map(|station| (*station).clone());
                let Some(station) = choice else {
                    self.state
                        .set_status("No station matches the filter".to_string());
                    return;
                };
                match session.select_origin(&station) {
                    Ok(_) => {
                        self.picker = None;
                        self.state
                            .set_status(format!("Origin pinned to {}", station.name));
                    }
                    Err(err) => self.state.set_status(format!("Error: {err}")),
                }
            }
            _ => {}
        }
    }

    fn draw(&mut self, frame: &mut Frame) {
        if self.session.is_some() {
            self.draw_quiz(frame);
        } else {
            self.draw_unavailable(frame);
        }
        if self.picker.is_some() {
            self.render_picker(frame);
        }
    }

    fn draw_quiz(&self, frame: &mut Frame) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let area = frame.size();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Min(8),
                Constraint::Length(4),
                Constraint::Length(4),
            ])
            .split(area);

        self.render_title(frame, chunks[0]);
        self.render_mode(frame, chunks[1], session);

        let cards = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(chunks[2]);
        let question = session.current_question();
        self.render_station_card(
            frame,
            cards[0],
            "出発駅 [1]",
            question.origin(),
            question.origin_hint_expanded(),
        );
        self.render_station_card(
            frame,
            cards[1],
            "到着駅 [2]",
            question.destination(),
            question.destination_hint_expanded(),
        );

        self.render_help(frame, chunks[3], session);
        self.render_status(frame, chunks[4], session);
    }

    fn draw_unavailable(&self, frame: &mut Frame) {
        let area = frame.size();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(5)])
            .split(area);
        self.render_title(frame, chunks[0]);

        let reason = self
            .load_error
            .clone()
            .unwrap_or_else(|| "station data not loaded".to_string());
        let source = self
            .loader
            .path()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "bundled dataset".to_string());
        let lines = vec![
            Line::from(Span::styled(
                "No quiz available",
                Style::default()
                    .fg(self.theme.danger)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(reason),
            Line::from(format!("Station data: {source}")),
            Line::from(format!(
                "Check stations_path in {}",
                config::config_path().display()
            )),
            Line::from(""),
            Line::from(Span::styled(
                "[r] reload  [q] quit",
                Style::default().fg(self.theme.muted),
            )),
        ];
        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Error"))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, chunks[1]);
    }

    fn render_title(&self, frame: &mut Frame, area: Rect) {
        let title = Paragraph::new(Line::from(Span::styled(
            "東京路線クイズ",
            Style::default()
                .fg(self.theme.accent)
                .add_modifier(Modifier::BOLD),
        )))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
        frame.render_widget(title, area);
    }

    fn render_mode(&self, frame: &mut Frame, area: Rect, session: &QuizSession<ChaCha8Rng>) {
        let (label, style) = if session.is_fixed_origin() {
            (
                "ON ",
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            )
        } else {
            ("OFF", Style::default().fg(self.theme.muted))
        };
        let mut spans = vec![
            Span::raw("出発駅を固定する: "),
            Span::styled(label, style),
            Span::styled("  [p]", Style::default().fg(self.theme.muted)),
        ];
        if session.is_fixed_origin() {
            spans.push(Span::raw("    出発駅: "));
            spans.push(Span::styled(
                session.current_question().origin().name.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            ));
            spans.push(Span::styled(
                "  [s] choose",
                Style::default().fg(self.theme.muted),
            ));
        }
        let paragraph = Paragraph::new(Line::from(spans))
            .block(Block::default().borders(Borders::ALL).title("Mode"));
        frame.render_widget(paragraph, area);
    }

    fn render_station_card(
        &self,
        frame: &mut Frame,
        area: Rect,
        title: &str,
        station: &Station,
        expanded: bool,
    ) {
        let mut lines = vec![
            Line::from(""),
            Line::from(Span::styled(
                station.name.clone(),
                Style::default()
                    .fg(self.theme.primary_fg)
                    .add_modifier(Modifier::BOLD),
            ))
            .alignment(Alignment::Center),
            Line::from(""),
        ];
        let marker = if expanded { "▾ ヒント" } else { "▸ ヒント" };
        lines.push(Line::from(Span::styled(
            marker,
            Style::default().fg(self.theme.warning),
        )));
        if expanded {
            lines.push(Line::from(format!("  区: {}", station.ward)));
            lines.push(Line::from(format!("  路線: {}", station.lines_label())));
        }
        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title(title.to_string()))
            .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, area);
    }

    fn render_help(&self, frame: &mut Frame, area: Rect, session: &QuizSession<ChaCha8Rng>) {
        let key = |label: &'static str, enabled: bool| {
            let style = if enabled {
                Style::default().fg(self.theme.primary_fg)
            } else {
                Style::default().fg(self.theme.muted)
            };
            Span::styled(label, style)
        };
        let spans = vec![
            key("[n] next", true),
            Span::raw("  "),
            key("[b/←] back", session.can_go_back()),
            Span::raw("  "),
            key("[→] forward", session.can_go_forward()),
            Span::raw("  "),
            key("[p] pin origin", true),
            Span::raw("  "),
            key("[s] pick origin", session.is_fixed_origin()),
            Span::raw("  "),
            key("[1/2] hints", true),
            Span::raw("  "),
            key("[m] map", true),
            Span::raw("  "),
            key("[r] reload", true),
            Span::raw("  "),
            key("[q] quit", true),
        ];
        let paragraph = Paragraph::new(Line::from(spans))
            .block(Block::default().borders(Borders::ALL).title("Keys"))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect, session: &QuizSession<ChaCha8Rng>) {
        let block = Block::default().borders(Borders::ALL).title("Status");
        let (position, total) = session.position();
        let secondary = format!(
            "Question {position}/{total}  ·  {} stations",
            session.catalog().len()
        );
        let paragraph = Paragraph::new(vec![
            Line::from(self.state.status.clone()),
            Line::from(Span::styled(secondary, Style::default().fg(self.theme.muted))),
        ])
        .block(block)
        .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn render_picker(&mut self, frame: &mut Frame) {
        let (Some(picker), Some(session)) = (self.picker.as_mut(), self.session.as_ref()) else {
            return;
        };
        let area = frame.size();
        let width = 48.min(area.width.max(1));
        let height = area.height.saturating_sub(4).max(6);
        let popup = centered_rect(width, height, area);
        frame.render_widget(Clear, popup);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(3)])
            .split(popup);

        let filter = Paragraph::new(format!("{}_", picker.query))
            .block(Block::default().borders(Borders::ALL).title("Filter"));
        frame.render_widget(filter, chunks[0]);

        let matches = session.catalog().matching(&picker.query);
        picker.height = chunks[1].height.saturating_sub(2).max(1) as usize;
        picker.clamp(matches.len());

        let items: Vec<ListItem> = matches
            .iter()
            .skip(picker.offset)
            .take(picker.height)
            .map(|station| {
                ListItem::new(Line::from(vec![
                    Span::styled(
                        station.name.clone(),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(
                        format!("  {}", station.ward),
                        Style::default().fg(self.theme.muted),
                    ),
                ]))
            })
            .collect();
        let mut list_state = ListState::default();
        if !matches.is_empty() {
            list_state.select(Some(picker.cursor - picker.offset));
        }
        let title = format!("出発駅 ({} matches)", matches.len());
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(title))
            .highlight_style(Style::default().bg(self.theme.selection_bg))
            .highlight_symbol("▶ ");
        frame.render_stateful_widget(list, chunks[1], &mut list_state);
    }
}

fn hint_status(which: &str, expanded: bool) -> String {
    if expanded {
        format!("{which} hint shown")
    } else {
        format!("{which} hint hidden")
    }
}

struct UiState {
    status: String,
    status_age: u32,
    should_quit: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            status: READY_STATUS.to_string(),
            status_age: 0,
            should_quit: false,
        }
    }
}

impl UiState {
    fn set_status(&mut self, message: String) {
        self.status = message;
        self.status_age = 0;
    }

    fn tick(&mut self) {
        if self.status == READY_STATUS {
            return;
        }
        self.status_age += 1;
        if self.status_age >= STATUS_TTL_TICKS {
            self.set_status(READY_STATUS.to_string());
        }
    }
}

/// Scrollable, filterable list used to pin an origin station.
struct StationPicker {
    query: String,
    cursor: usize,
    offset: usize,
    height: usize,
}

impl StationPicker {
    fn new(cursor: usize) -> Self {
        Self {
            query: String::new(),
            cursor,
            offset: 0,
            height: 10,
        }
    }

    fn page(&self) -> usize {
        self.height.max(1)
    }

    fn reset_cursor(&mut self) {
        self.cursor = 0;
        self.offset = 0;
    }

    fn move_cursor(&mut self, delta: isize, total: usize) {
        if total == 0 {
            self.reset_cursor();
            return;
        }
        let max = total as isize - 1;
        self.cursor = (self.cursor as isize).saturating_add(delta).clamp(0, max) as usize;
        self.clamp(total);
    }

    fn clamp(&mut self, total: usize) {
        if total == 0 {
            self.reset_cursor();
            return;
        }
        self.cursor = self.cursor.min(total - 1);
        let height = self.height.max(1);
        if self.cursor < self.offset {
            self.offset = self.cursor;
        } else if self.cursor >= self.offset + height {
            self.offset = self.cursor + 1 - height;
        }
    }
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor()?;
    Ok(())
}

fn spawn_input_thread(sender: mpsc::Sender<AppEvent>) {
    thread::spawn(move || loop {
        match event::poll(TICK_RATE) {
            Ok(true) => match event::read() {
                Ok(evt) => {
                    if sender.blocking_send(AppEvent::Input(evt)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            },
            Ok(false) => {
                if sender.blocking_send(AppEvent::Tick).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    });
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}
