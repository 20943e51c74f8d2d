use crate::api::types::{GlobalMetrics, Listing, Quote};
use crate::api::ApiClient;
use crate::config::Config;
use crate::engine::alerts::{AlertKind, AlertRule, Tone, TriggeredAlert};
use crate::engine::monitor::AlertMonitor;
use crate::engine::notice::{Notice, NOTICE_TEXT};
use crate::engine::rankings::{build_rankings, volatility_alerts, Ranking, Volatility, TOP_RANKINGS};
use crate::engine::sound::{self, SoundPlayer};
use crate::engine::toast::{FlashSet, Toast, ToastStack};
use crate::feed::{self, Update};
use crate::format::{format_change, format_opt_usd, format_pct, format_timestamp, format_usd};
use crate::ui::form::{AlertForm, FormField};
use chrono::Local;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::{debug, info};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Wrap},
    Frame, Terminal,
};
use std::error::Error;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tokio::sync::mpsc::{Receiver, Sender};

type DynError = Box<dyn Error + Send + Sync>;

const TOAST_WIDTH: u16 = 52;
const TOAST_HEIGHT: u16 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardView {
    Rankings,
    Triggered,
    Rules,
    Quote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Form,
    Quote,
}

pub struct DashboardState {
    pub view: DashboardView,
    pub input: InputMode,
    pub running: bool,

    pub listings: Vec<Listing>,
    pub rankings: Vec<Ranking>,
    pub listings_error: Option<String>,
    pub listings_updated: Option<String>,

    pub global: Option<GlobalMetrics>,
    pub global_error: Option<String>,

    pub triggered: Vec<TriggeredAlert>,
    pub alerts_error: Option<String>,

    pub rules: Vec<AlertRule>,
    pub rules_error: Option<String>,
    pub selected_rule: usize,
    pub form: AlertForm,
    pub busy: bool,

    pub quote_input: String,
    pub quote: Option<Quote>,
    pub quote_error: Option<String>,

    pub monitor: AlertMonitor,
    pub toasts: ToastStack,
    pub flashes: FlashSet,
    pub sound_on: bool,
    pub needs_audio_unlock: bool,
    pub notice: Notice,
}

impl DashboardState {
    pub fn new(monitor: AlertMonitor, notice: Notice, sound_on: bool) -> Self {
        Self {
            view: DashboardView::Rankings,
            input: InputMode::Normal,
            running: true,
            listings: Vec::new(),
            rankings: Vec::new(),
            listings_error: None,
            listings_updated: None,
            global: None,
            global_error: None,
            triggered: Vec::new(),
            alerts_error: None,
            rules: Vec::new(),
            rules_error: None,
            selected_rule: 0,
            form: AlertForm::default(),
            busy: false,
            quote_input: String::new(),
            quote: None,
            quote_error: None,
            monitor,
            toasts: ToastStack::new(),
            flashes: FlashSet::new(),
            sound_on,
            needs_audio_unlock: true,
            notice,
        }
    }

    pub fn top_rankings(&self) -> &[Ranking] {
        let n = self.rankings.len().min(TOP_RANKINGS);
        &self.rankings[..n]
    }
}

#[derive(Clone)]
pub struct Dashboard {
    pub state: Arc<Mutex<DashboardState>>,
    client: ApiClient,
    tx: Sender<Update>,
    player: Arc<dyn SoundPlayer>,
    listings_limit: usize,
}

impl Dashboard {
    pub fn new(
        config: &Config,
        client: ApiClient,
        tx: Sender<Update>,
        player: Arc<dyn SoundPlayer>,
        notice: Notice,
    ) -> Self {
        let mut state = DashboardState::new(AlertMonitor::new(config.cooldown), notice, config.sound);
        state.needs_audio_unlock = player.unlock().is_err();
        Self {
            state: Arc::new(Mutex::new(state)),
            client,
            tx,
            player,
            listings_limit: config.listings_limit,
        }
    }

    fn lock(&self) -> MutexGuard<'_, DashboardState> {
        // A panic while holding the lock leaves plain data behind; keep drawing.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn is_running(&self) -> bool {
        self.lock().running
    }

    pub async fn run(&self, mut receiver: Receiver<Update>) -> Result<(), DynError> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;

        let result = self.event_loop(&mut terminal, &mut receiver).await;

        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;
        result
    }

    async fn event_loop<B: Backend>(
        &self,
        terminal: &mut Terminal<B>,
        receiver: &mut Receiver<Update>,
    ) -> Result<(), DynError> {
        while self.is_running() {
            if event::poll(Duration::from_millis(100))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key_input(key);
                    }
                }
            }

            while let Ok(update) = receiver.try_recv() {
                self.apply(update, Instant::now());
            }

            terminal.draw(|f| self.draw(f))?;
        }
        info!("Dashboard closed");
        Ok(())
    }

    /// Applies a backend result to the dashboard state.
    pub fn apply(&self, update: Update, now: Instant) {
        let mut state = self.lock();
        match update {
            Update::Global(Ok(global)) => {
                state.global = Some(global);
                state.global_error = None;
            }
            Update::Global(Err(e)) => state.global_error = Some(e),

            Update::Listings(Ok(listings)) => {
                state.rankings = build_rankings(&listings);
                state.listings = listings;
                state.listings_error = None;
                state.listings_updated = Some(Local::now().format("%H:%M").to_string());
            }
            Update::Listings(Err(e)) => state.listings_error = Some(e),

            Update::AlertCheck(Ok(check)) => {
                state.alerts_error = None;
                let fresh = state.monitor.admit(&check.triggered, now);
                if !fresh.is_empty() {
                    info!("{} alert(s) triggered", fresh.len());
                    for alert in &fresh {
                        state.toasts.push(alert, now);
                        state.flashes.flash(alert.stable_id(), now);
                    }
                    if state.sound_on {
                        match self.player.unlock() {
                            Ok(()) => {
                                state.needs_audio_unlock = false;
                                sound::schedule(self.player.clone(), &fresh);
                            }
                            Err(e) => {
                                debug!("Sound unavailable: {}", e);
                                state.needs_audio_unlock = true;
                            }
                        }
                    }
                }
                state.triggered = check.triggered;
            }
            Update::AlertCheck(Err(e)) => {
                state.alerts_error = Some(e);
                state.triggered.clear();
            }

            Update::Rules(Ok(rules)) => {
                state.rules = rules;
                state.rules_error = None;
                state.selected_rule = state.selected_rule.min(state.rules.len().saturating_sub(1));
            }
            Update::Rules(Err(e)) => state.rules_error = Some(e),

            Update::RuleCreated(result) => {
                state.busy = false;
                match result {
                    Ok(rule) => {
                        state.rules.insert(0, rule);
                        state.selected_rule = 0;
                        state.rules_error = None;
                        state.form = AlertForm::default();
                        state.input = InputMode::Normal;
                        feed::check_now(self.client.clone(), self.tx.clone());
                    }
                    Err(e) => state.rules_error = Some(e),
                }
            }

            Update::RuleDeleted { id, result } => {
                state.busy = false;
                match result {
                    Ok(()) => {
                        state.rules.retain(|r| r.id != id);
                        state.selected_rule = state.selected_rule.min(state.rules.len().saturating_sub(1));
                        state.monitor.forget(&id);
                        state.rules_error = None;
                        feed::check_now(self.client.clone(), self.tx.clone());
                    }
                    Err(e) => state.rules_error = Some(e),
                }
            }

            Update::Quote { symbol, result } => match result {
                Ok(Some(quote)) => {
                    state.quote = Some(quote);
                    state.quote_error = None;
                }
                Ok(None) => {
                    state.quote = None;
                    state.quote_error = Some(format!("No quote found for {}", symbol));
                }
                Err(e) => {
                    state.quote = None;
                    state.quote_error = Some(e);
                }
            },
        }
    }

    pub fn handle_key_input(&self, key: KeyEvent) {
        let input = self.lock().input;
        match input {
            InputMode::Normal => self.handle_normal_key(key),
            InputMode::Form => self.handle_form_key(key),
            InputMode::Quote => self.handle_quote_key(key),
        }
    }

    fn handle_normal_key(&self, key: KeyEvent) {
        let mut state = self.lock();
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => state.running = false,
            KeyCode::Char('r') => state.view = DashboardView::Rankings,
            KeyCode::Char('t') => state.view = DashboardView::Triggered,
            KeyCode::Char('a') => state.view = DashboardView::Rules,
            KeyCode::Char('s') => {
                state.view = DashboardView::Quote;
                state.input = InputMode::Quote;
            }
            KeyCode::Char('m') => {
                // toggling also retries the audio output
                state.needs_audio_unlock = self.player.unlock().is_err();
                state.sound_on = !state.sound_on;
                info!("Alert sounds {}", if state.sound_on { "on" } else { "off" });
            }
            KeyCode::Char('g') => {
                if state.notice.is_visible() {
                    state.notice.dismiss();
                }
            }
            KeyCode::Char('u') => {
                feed::refresh_listings(self.client.clone(), self.listings_limit, self.tx.clone());
                feed::check_now(self.client.clone(), self.tx.clone());
            }
            KeyCode::Char('c') if state.view != DashboardView::Rankings => {
                feed::check_now(self.client.clone(), self.tx.clone());
            }
            KeyCode::Char('n') if state.view == DashboardView::Rules => {
                state.input = InputMode::Form;
                state.form.field = FormField::Symbol;
            }
            KeyCode::Char('d') if state.view == DashboardView::Rules && !state.busy => {
                if let Some(rule) = state.rules.get(state.selected_rule) {
                    let id = rule.id.clone();
                    state.busy = true;
                    state.rules_error = None;
                    feed::delete_rule(self.client.clone(), id, self.tx.clone());
                }
            }
            KeyCode::Up if state.view == DashboardView::Rules => {
                state.selected_rule = state.selected_rule.saturating_sub(1);
            }
            KeyCode::Down if state.view == DashboardView::Rules => {
                let last = state.rules.len().saturating_sub(1);
                state.selected_rule = (state.selected_rule + 1).min(last);
            }
            _ => {}
        }
    }

    fn handle_form_key(&self, key: KeyEvent) {
        let mut state = self.lock();
        match key.code {
            KeyCode::Esc => state.input = InputMode::Normal,
            KeyCode::Tab => state.form.field = state.form.field.next(),
            KeyCode::BackTab => state.form.field = state.form.field.prev(),
            KeyCode::Left | KeyCode::Right => state.form.cycle(),
            KeyCode::Backspace => state.form.backspace(),
            KeyCode::Char(c) => state.form.type_char(c),
            KeyCode::Enter if !state.busy => match state.form.to_new_alert() {
                Ok(alert) => {
                    state.busy = true;
                    state.rules_error = None;
                    feed::create_rule(self.client.clone(), alert, self.tx.clone());
                }
                Err(e) => state.rules_error = Some(e.to_string()),
            },
            _ => {}
        }
    }

    fn handle_quote_key(&self, key: KeyEvent) {
        let mut state = self.lock();
        match key.code {
            KeyCode::Esc => state.input = InputMode::Normal,
            KeyCode::Backspace => {
                state.quote_input.pop();
            }
            KeyCode::Char(c) if c.is_ascii_alphanumeric() => {
                state.quote_input.push(c.to_ascii_uppercase());
            }
            KeyCode::Enter => {
                state.quote = None;
                state.quote_error = None;
                let symbol = state.quote_input.trim().to_string();
                if !symbol.is_empty() {
                    feed::lookup_quote(self.client.clone(), symbol, self.tx.clone());
                }
            }
            _ => {}
        }
    }

    pub fn draw<B: Backend>(&self, f: &mut Frame<B>) {
        let now = Instant::now();
        let mut state = self.lock();
        state.flashes.prune(now);
        let toasts = state.toasts.visible(now);

        let mut constraints = Vec::new();
        if state.notice.is_visible() {
            constraints.push(Constraint::Length(3));
        }
        constraints.push(Constraint::Length(4));
        if state.sound_on && state.needs_audio_unlock {
            constraints.push(Constraint::Length(1));
        }
        constraints.push(Constraint::Min(5));
        constraints.push(Constraint::Length(footer_height(&state)));

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(f.size());

        let mut idx = 0;
        if state.notice.is_visible() {
            self.render_notice(f, chunks[idx]);
            idx += 1;
        }
        self.render_header(f, chunks[idx], &state);
        idx += 1;
        if state.sound_on && state.needs_audio_unlock {
            let hint = Paragraph::new(
                "Sound output is unavailable. Press m twice to retry once a terminal is attached.",
            )
            .style(Style::default().fg(Color::Yellow));
            f.render_widget(hint, chunks[idx]);
            idx += 1;
        }
        match state.view {
            DashboardView::Rankings => self.render_rankings_view(f, chunks[idx], &state),
            DashboardView::Triggered => self.render_triggered_view(f, chunks[idx], &state, now),
            DashboardView::Rules => self.render_rules_view(f, chunks[idx], &state, now),
            DashboardView::Quote => self.render_quote_view(f, chunks[idx], &state),
        }
        idx += 1;
        self.render_footer(f, chunks[idx], &state);

        self.render_toasts(f, &toasts);
    }

    fn render_notice<B: Backend>(&self, f: &mut Frame<B>, area: Rect) {
        let notice = Paragraph::new(Line::from(vec![
            Span::styled("Note: ", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(NOTICE_TEXT),
            Span::styled("  [g] Got it", Style::default().fg(Color::Cyan)),
        ]))
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::BOTTOM));
        f.render_widget(notice, area);
    }

    fn render_header<B: Backend>(&self, f: &mut Frame<B>, area: Rect, state: &DashboardState) {
        let sound = if state.sound_on {
            Span::styled("Sounds: On", Style::default().fg(Color::Green))
        } else {
            Span::styled("Sounds: Off", Style::default().fg(Color::DarkGray))
        };

        let metrics = match (&state.global, &state.global_error) {
            (_, Some(e)) => Line::from(Span::styled(
                format!("Global metrics error: {}", e),
                Style::default().fg(Color::Red),
            )),
            (Some(g), None) => Line::from(vec![
                Span::raw("BTC dom "),
                Span::styled(format_pct(g.btc_dominance), Style::default().fg(Color::LightYellow)),
                Span::raw("  ETH dom "),
                Span::styled(format_pct(g.eth_dominance), Style::default().fg(Color::LightBlue)),
                Span::raw("  Mkt cap "),
                Span::raw(format_opt_usd(g.total_market_cap, 0)),
                Span::raw("  24h vol "),
                Span::raw(format_opt_usd(g.total_volume_24h, 0)),
                Span::styled(
                    format!("  Updated {}", format_timestamp(g.last_updated.as_deref())),
                    Style::default().fg(Color::Gray),
                ),
            ]),
            (None, None) => Line::from(Span::styled(
                "Loading global metrics…",
                Style::default().fg(Color::Gray),
            )),
        };

        let header = Paragraph::new(Text::from(vec![
            Line::from(vec![
                Span::styled(
                    "EASYSTONKS ",
                    Style::default()
                        .fg(Color::LightCyan)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    format!(
                        "Market signals dashboard · Updated: {}  ",
                        Local::now().format("%b %-d, %Y %H:%M")
                    ),
                    Style::default().fg(Color::Gray),
                ),
                sound,
            ]),
            metrics,
        ]))
        .block(Block::default().borders(Borders::BOTTOM));

        f.render_widget(header, area);
    }

    fn render_rankings_view<B: Backend>(&self, f: &mut Frame<B>, area: Rect, state: &DashboardState) {
        let title = match &state.listings_updated {
            Some(at) => format!("Top Rankings (score) · {}", at),
            None => "Top Rankings (score)".to_string(),
        };
        let block = Block::default().borders(Borders::ALL).title(title);

        if state.listings.is_empty() && state.listings_error.is_none() {
            f.render_widget(Paragraph::new("Loading listings…").block(block), area);
            return;
        }

        let rows = state.top_rankings().iter().map(|r| {
            let change_color = if r.change_24h >= 0.0 { Color::Green } else { Color::Red };
            let volatility_color = match r.volatility {
                Volatility::High => Color::Yellow,
                _ => Color::Blue,
            };
            Row::new(vec![
                Cell::from(r.symbol.clone()),
                Cell::from(r.score.to_string()).style(Style::default().add_modifier(Modifier::BOLD)),
                Cell::from(Span::styled(r.volatility.as_str(), Style::default().fg(volatility_color))),
                Cell::from(Span::styled(format_change(r.change_24h), Style::default().fg(change_color))),
                Cell::from(r.reason),
            ])
        });

        let table = Table::new(rows)
            .header(
                Row::new(vec!["Symbol", "Score", "Volatility", "24h", "Reason"])
                    .style(Style::default().add_modifier(Modifier::BOLD)),
            )
            .block(block)
            .widths(&[
                Constraint::Length(10),
                Constraint::Length(7),
                Constraint::Length(11),
                Constraint::Length(10),
                Constraint::Min(16),
            ]);

        f.render_widget(table, area);
    }

    fn triggered_table<'a>(
        alerts: &'a [TriggeredAlert],
        flashes: &FlashSet,
        now: Instant,
        title: &'a str,
    ) -> Table<'a> {
        let rows = alerts.iter().map(|a| {
            let style = if flashes.is_flashing(&a.stable_id(), now) {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            let kind_color = match a.kind {
                AlertKind::Price => Color::Blue,
                AlertKind::Pct24 => Color::Yellow,
                AlertKind::Volatility => Color::Magenta,
            };
            Row::new(vec![
                Cell::from(a.time.clone()),
                Cell::from(a.symbol.clone()),
                Cell::from(Span::styled(a.kind.label(), Style::default().fg(kind_color))),
                Cell::from(a.message.clone()),
            ])
            .style(style)
        });

        Table::new(rows)
            .header(
                Row::new(vec!["Time", "Symbol", "Type", "Message"])
                    .style(Style::default().add_modifier(Modifier::BOLD)),
            )
            .block(Block::default().borders(Borders::ALL).title(title))
            .widths(&[
                Constraint::Length(6),
                Constraint::Length(8),
                Constraint::Length(11),
                Constraint::Min(20),
            ])
    }

    fn render_triggered_view<B: Backend>(
        &self,
        f: &mut Frame<B>,
        area: Rect,
        state: &DashboardState,
        now: Instant,
    ) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(5), Constraint::Length(6)])
            .split(area);

        if state.triggered.is_empty() {
            let empty = Paragraph::new("No alerts triggered right now.")
                .block(Block::default().borders(Borders::ALL).title("Triggered Alerts (live)"));
            f.render_widget(empty, chunks[0]);
        } else {
            let title = format!("Triggered Alerts (live) · {}", state.triggered.len());
            let table = Self::triggered_table(&state.triggered, &state.flashes, now, &title);
            f.render_widget(table, chunks[0]);
        }

        let time = state.listings_updated.clone().unwrap_or_default();
        let movers = volatility_alerts(&state.rankings, &time);
        let table = Self::triggered_table(&movers, &state.flashes, now, "Volatility watch");
        f.render_widget(table, chunks[1]);
    }

    fn render_rules_view<B: Backend>(
        &self,
        f: &mut Frame<B>,
        area: Rect,
        state: &DashboardState,
        now: Instant,
    ) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(5)])
            .split(area);
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(rows[1]);

        self.render_form(f, rows[0], state);

        let rule_rows = state.rules.iter().enumerate().map(|(i, r)| {
            let tone = tone_color(r.tone());
            let style = if i == state.selected_rule {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            Row::new(vec![
                Cell::from(r.symbol.clone()),
                Cell::from(r.kind.label()),
                Cell::from(Span::styled(r.op.label(), Style::default().fg(tone))),
                Cell::from(r.threshold()),
            ])
            .style(style)
        });
        let title = if state.busy { "Rules (working…)" } else { "Rules" };
        let rules = Table::new(rule_rows)
            .header(
                Row::new(vec!["Symbol", "Type", "Dir", "Threshold"])
                    .style(Style::default().add_modifier(Modifier::BOLD)),
            )
            .block(Block::default().borders(Borders::ALL).title(title))
            .widths(&[
                Constraint::Length(8),
                Constraint::Length(7),
                Constraint::Length(6),
                Constraint::Min(12),
            ]);
        if state.rules.is_empty() {
            let empty = Paragraph::new("No alert rules yet. Press n to add one.")
                .block(Block::default().borders(Borders::ALL).title(title));
            f.render_widget(empty, columns[0]);
        } else {
            f.render_widget(rules, columns[0]);
        }

        let triggered = Self::triggered_table(&state.triggered, &state.flashes, now, "Triggered");
        f.render_widget(triggered, columns[1]);
    }

    fn render_form<B: Backend>(&self, f: &mut Frame<B>, area: Rect, state: &DashboardState) {
        let editing = state.input == InputMode::Form;
        let field_style = |field: FormField| {
            if editing && state.form.field == field {
                Style::default().fg(Color::Black).bg(Color::Cyan)
            } else {
                Style::default().fg(Color::White)
            }
        };
        let form = &state.form;
        let placeholder = match form.kind {
            AlertKind::Price => "2500 (USD)",
            _ => "5 (%)",
        };
        let value = if form.value.is_empty() { placeholder.to_string() } else { form.value.clone() };

        let line = Line::from(vec![
            Span::raw("Symbol "),
            Span::styled(format!(" {:<6}", form.symbol), field_style(FormField::Symbol)),
            Span::raw("  Type "),
            Span::styled(
                format!(" {} ", if form.kind == AlertKind::Price { "Price (USD)" } else { "24h % change" }),
                field_style(FormField::Kind),
            ),
            Span::raw("  Direction "),
            Span::styled(format!(" {} ", form.op.label()), field_style(FormField::Op)),
            Span::raw("  Threshold "),
            Span::styled(format!(" {:<10}", value), field_style(FormField::Value)),
        ]);
        let help = if editing {
            "Tab next field · ←/→ change · Enter add alert · Esc cancel"
        } else {
            "Example: ETH Price Below $2500 · n new alert"
        };
        let form_widget = Paragraph::new(Text::from(vec![
            line,
            Line::from(Span::styled(help, Style::default().fg(Color::Gray))),
        ]))
        .block(Block::default().borders(Borders::ALL).title("Create alert"));
        f.render_widget(form_widget, area);
    }

    fn render_quote_view<B: Backend>(&self, f: &mut Frame<B>, area: Rect, state: &DashboardState) {
        let mut lines = vec![
            Line::from(vec![
                Span::raw("Symbol: "),
                Span::styled(
                    format!(" {:<10}", if state.quote_input.is_empty() { "BTC" } else { state.quote_input.as_str() }),
                    if state.input == InputMode::Quote {
                        Style::default().fg(Color::Black).bg(Color::Cyan)
                    } else {
                        Style::default()
                    },
                ),
                Span::styled("  Enter to search", Style::default().fg(Color::Gray)),
            ]),
            Line::from(""),
        ];

        if let Some(e) = &state.quote_error {
            lines.push(Line::from(Span::styled(e.clone(), Style::default().fg(Color::Red))));
        }
        if let Some(q) = &state.quote {
            let change = q.percent_change_24h.unwrap_or(0.0);
            lines.push(Line::from(Span::styled(
                format!("{} ({})", q.name.as_deref().unwrap_or("—"), q.symbol),
                Style::default().add_modifier(Modifier::BOLD),
            )));
            lines.push(Line::from(format!(
                "Price: {}",
                q.price.map_or_else(|| "—".to_string(), |p| format_usd(p, 2))
            )));
            lines.push(Line::from(vec![
                Span::raw("24h: "),
                Span::styled(
                    format_pct(q.percent_change_24h),
                    Style::default().fg(if change >= 0.0 { Color::Green } else { Color::Red }),
                ),
            ]));
            lines.push(Line::from(format!("Market Cap: {}", format_opt_usd(q.market_cap, 0))));
        }

        let quote = Paragraph::new(Text::from(lines))
            .block(Block::default().borders(Borders::ALL).title("Quote Lookup"));
        f.render_widget(quote, area);
    }

    fn render_footer<B: Backend>(&self, f: &mut Frame<B>, area: Rect, state: &DashboardState) {
        let mut lines = Vec::new();
        if let Some(e) = &state.listings_error {
            lines.push(error_line("Listings error: ", e, Color::Red));
        }
        if let Some(e) = &state.alerts_error {
            lines.push(error_line("Alerts check error: ", e, Color::Yellow));
        }
        if let Some(e) = &state.rules_error {
            lines.push(error_line("Alerts: ", e, Color::Red));
        }

        let key = |k: &'static str| Span::styled(k, Style::default().add_modifier(Modifier::BOLD));
        let controls = match (state.input, state.view) {
            (InputMode::Form, _) | (InputMode::Quote, _) => vec![
                Span::raw("Editing: "),
                key("Enter"),
                Span::raw(" Submit  "),
                key("Esc"),
                Span::raw(" Cancel"),
            ],
            (InputMode::Normal, DashboardView::Rules) => vec![
                Span::raw("Controls: "),
                key("↑/↓"),
                Span::raw(" Select  "),
                key("n"),
                Span::raw(" New  "),
                key("d"),
                Span::raw(" Delete  "),
                key("c"),
                Span::raw(" Check now  "),
                key("r"),
                Span::raw(" Rankings  "),
                key("q"),
                Span::raw(" Quit"),
            ],
            (InputMode::Normal, _) => vec![
                Span::raw("Controls: "),
                key("r"),
                Span::raw(" Rankings  "),
                key("t"),
                Span::raw(" Triggered  "),
                key("a"),
                Span::raw(" Alerts  "),
                key("s"),
                Span::raw(" Quote  "),
                key("u"),
                Span::raw(" Refresh  "),
                key("m"),
                Span::raw(" Sound  "),
                key("q"),
                Span::raw(" Quit"),
            ],
        };
        lines.push(Line::from(controls));

        let footer = Paragraph::new(Text::from(lines))
            .style(Style::default().fg(Color::Gray))
            .block(Block::default().borders(Borders::TOP));
        f.render_widget(footer, area);
    }

    fn render_toasts<B: Backend>(&self, f: &mut Frame<B>, toasts: &[Toast]) {
        let screen = f.size();
        if screen.width < TOAST_WIDTH + 2 {
            return;
        }
        for (i, toast) in toasts.iter().enumerate() {
            let y = 1 + i as u16 * TOAST_HEIGHT;
            if y + TOAST_HEIGHT > screen.height {
                break;
            }
            let area = Rect::new(screen.width - TOAST_WIDTH - 1, y, TOAST_WIDTH, TOAST_HEIGHT);
            let color = tone_color(toast.tone);
            let body = Paragraph::new(Text::from(vec![
                Line::from(Span::styled(toast.text.clone(), Style::default().fg(Color::White))),
            ]))
            .wrap(Wrap { trim: true })
            .alignment(Alignment::Left)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(color))
                    .title(Span::styled(
                        format!("{} · {}", toast.title, toast.time),
                        Style::default().fg(color).add_modifier(Modifier::BOLD),
                    )),
            );
            f.render_widget(Clear, area);
            f.render_widget(body, area);
        }
    }
}

fn footer_height(state: &DashboardState) -> u16 {
    let errors = [&state.listings_error, &state.alerts_error, &state.rules_error]
        .iter()
        .filter(|e| e.is_some())
        .count() as u16;
    2 + errors
}

fn error_line<'a>(label: &'a str, message: &str, color: Color) -> Line<'a> {
    Line::from(vec![
        Span::styled(label, Style::default().fg(color).add_modifier(Modifier::BOLD)),
        Span::styled(message.to_string(), Style::default().fg(color)),
    ])
}

fn tone_color(tone: Tone) -> Color {
    match tone {
        Tone::Green => Color::Green,
        Tone::Red => Color::Red,
        Tone::Blue => Color::Blue,
    }
}
