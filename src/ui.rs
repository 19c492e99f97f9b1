use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use hbnb::models::{base::format_timestamp, Model, ModelKind};
use hbnb::storage::Objects;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame, Terminal,
};
use std::io;

const PAGE_STEP: usize = 20;

pub struct App {
    objects: Vec<Model>,
    pub rows: Vec<Model>,
    pub state: TableState,
    pub current_kind: ModelKind,
    pub show_detail: bool,
}

impl App {
    pub fn new(objects: Objects) -> Self {
        let mut app = Self {
            objects: objects.into_values().collect(),
            rows: Vec::new(),
            state: TableState::default(),
            current_kind: ModelKind::ALL[0],
            show_detail: false,
        };
        app.select_kind(app.current_kind);
        app
    }

    fn select_kind(&mut self, kind: ModelKind) {
        self.current_kind = kind;
        self.rows = self
            .objects
            .iter()
            .filter(|model| model.kind() == kind)
            .cloned()
            .collect();
        self.rows.sort_by(|a, b| a.label().cmp(b.label()));
        self.state.select(if self.rows.is_empty() { None } else { Some(0) });
    }

    pub fn count_of(&self, kind: ModelKind) -> usize {
        self.objects.iter().filter(|model| model.kind() == kind).count()
    }

    pub fn next_page(&mut self) {
        let i = ModelKind::ALL
            .iter()
            .position(|k| *k == self.current_kind)
            .unwrap_or(0);
        self.select_kind(ModelKind::ALL[(i + 1) % ModelKind::ALL.len()]);
    }

    pub fn previous_page(&mut self) {
        let len = ModelKind::ALL.len();
        let i = ModelKind::ALL
            .iter()
            .position(|k| *k == self.current_kind)
            .unwrap_or(0);
        self.select_kind(ModelKind::ALL[(i + len - 1) % len]);
    }

    pub fn toggle_detail(&mut self) {
        self.show_detail = !self.show_detail;
    }

    pub fn selected(&self) -> Option<&Model> {
        self.state.selected().and_then(|i| self.rows.get(i))
    }

    pub fn next(&mut self) {
        let len = self.rows.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.rows.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    pub fn page_down(&mut self) {
        let len = self.rows.len();
        if len == 0 {
            return;
        }
        let i = self
            .state
            .selected()
            .map_or(0, |i| (i + PAGE_STEP).min(len - 1));
        self.state.select(Some(i));
    }

    pub fn page_up(&mut self) {
        if self.rows.is_empty() {
            return;
        }
        let i = self.state.selected().map_or(0, |i| i.saturating_sub(PAGE_STEP));
        self.state.select(Some(i));
    }

    pub fn first(&mut self) {
        if !self.rows.is_empty() {
            self.state.select(Some(0));
        }
    }

    pub fn last(&mut self) {
        if !self.rows.is_empty() {
            self.state.select(Some(self.rows.len() - 1));
        }
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res.map_err(Into::into)
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Enter => app.toggle_detail(),
                KeyCode::BackTab => app.previous_page(),
                KeyCode::Tab => {
                    if key.modifiers.contains(KeyModifiers::SHIFT) {
                        app.previous_page();
                    } else {
                        app.next_page();
                    }
                }
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                KeyCode::PageDown => app.page_down(),
                KeyCode::PageUp => app.page_up(),
                KeyCode::Home => app.first(),
                KeyCode::End => app.last(),
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Tabs
            Constraint::Min(0),    // Table
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    if app.show_detail {
        let content_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(chunks[1]);

        render_table(f, content_chunks[0], app);
        render_detail_panel(f, content_chunks[1], app);
    } else {
        render_table(f, chunks[1], app);
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let mut tab_spans = vec![];
    for (i, kind) in ModelKind::ALL.iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }

        let style = if *kind == app.current_kind {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        tab_spans.push(Span::styled(
            format!("{} ({})", kind, app.count_of(*kind)),
            style,
        ));
    }

    let header = Paragraph::new(vec![Line::from(tab_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    f.render_widget(header, area);
}

fn render_table(f: &mut Frame, area: Rect, app: &mut App) {
    let header_cells = ["Id", "Name", "Updated"].iter().map(|h| {
        Cell::from(*h).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = app.rows.iter().map(|model| {
        Row::new(vec![
            Cell::from(model.id().to_string()),
            Cell::from(truncate(&display_name(model), 30)),
            Cell::from(format_timestamp(&model.base().updated_at))
                .style(Style::default().fg(Color::Cyan)),
        ])
        .height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(38),
            Constraint::Length(32),
            Constraint::Length(28),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(format!(" {} ", app.current_kind)),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let selected = app.state.selected().map(|i| i + 1).unwrap_or(0);

    let status_spans = vec![
        Span::styled(
            format!(" Row: {}/{} ", selected, app.rows.len()),
            Style::default().fg(Color::Cyan),
        ),
        Span::raw(" | "),
        Span::styled("Enter", Style::default().fg(Color::Yellow)),
        Span::raw(" Details | "),
        Span::styled("Tab", Style::default().fg(Color::Yellow)),
        Span::raw(" Class | "),
        Span::styled("↑/↓", Style::default().fg(Color::Yellow)),
        Span::raw(" Nav | "),
        Span::styled("PgUp/PgDn", Style::default().fg(Color::Yellow)),
        Span::raw(" Fast | "),
        Span::styled("q", Style::default().fg(Color::Red)),
        Span::raw(" Quit"),
    ];

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

/// Users show their full name when they have one
fn display_name(model: &Model) -> String {
    match model {
        Model::User(user) if !user.full_name().is_empty() => {
            format!("{} <{}>", user.full_name(), user.email)
        }
        _ => model.label().to_string(),
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}

fn render_detail_panel(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Details ");

    let Some(model) = app.selected() else {
        f.render_widget(Paragraph::new("Nothing selected").block(block), area);
        return;
    };

    let mut content = vec![Line::from("")];
    for (field, value) in model.to_dict() {
        let value = match value {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        };
        content.push(Line::from(vec![
            Span::styled(
                format!("  {}: ", field),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::raw(value),
        ]));
    }
    content.push(Line::from(""));
    content.push(Line::from(Span::styled(
        "  Press Enter to close",
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC),
    )));

    let detail_panel = Paragraph::new(content)
        .block(block)
        .wrap(Wrap { trim: false });

    f.render_widget(detail_panel, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use hbnb::models::{City, State, User};

    fn objects() -> Objects {
        let mut objects = Objects::new();
        for name in ["Texas", "Alaska", "Ohio"] {
            let model: Model = State::new(name).into();
            objects.insert(model.key(), model);
        }
        let city: Model = City::new("s", "Austin").into();
        objects.insert(city.key(), city);
        objects
    }

    #[test]
    fn test_app_starts_on_first_kind_sorted_by_label() {
        let app = App::new(objects());

        assert_eq!(app.current_kind, ModelKind::State);
        let labels: Vec<&str> = app.rows.iter().map(|m| m.label()).collect();
        assert_eq!(labels, vec!["Alaska", "Ohio", "Texas"]);
        assert_eq!(app.state.selected(), Some(0));
    }

    #[test]
    fn test_navigation_wraps() {
        let mut app = App::new(objects());

        app.previous();
        assert_eq!(app.selected().unwrap().label(), "Texas");
        app.next();
        assert_eq!(app.selected().unwrap().label(), "Alaska");
        app.page_down();
        assert_eq!(app.state.selected(), Some(2));
        app.page_up();
        assert_eq!(app.state.selected(), Some(0));
    }

    #[test]
    fn test_tabs_cycle_through_kinds() {
        let mut app = App::new(objects());

        app.next_page();
        assert_eq!(app.current_kind, ModelKind::City);
        assert_eq!(app.rows.len(), 1);

        app.next_page();
        assert_eq!(app.current_kind, ModelKind::User);
        assert!(app.selected().is_none());

        app.previous_page();
        app.previous_page();
        app.previous_page();
        assert_eq!(app.current_kind, ModelKind::Review);
    }

    #[test]
    fn test_display_name_prefers_full_name() {
        let mut user = User::new("betty@hbnb.io", "pwd");
        assert_eq!(display_name(&user.clone().into()), "betty@hbnb.io");

        user.first_name = "Betty".to_string();
        user.last_name = "Holberton".to_string();
        assert_eq!(
            display_name(&user.into()),
            "Betty Holberton <betty@hbnb.io>"
        );
        assert_eq!(display_name(&State::new("Ohio").into()), "Ohio");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a very long name", 8), "a ver...");
    }
}
