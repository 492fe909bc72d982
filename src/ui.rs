use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;
use std::path::PathBuf;

use crate::catalog::{Catalog, SourceSummary};
use crate::parser::Entry;
use crate::report::ReportExporter;
use crate::search::search;

const PAGE_STEP: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Entries,
    Sources,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Entries => Page::Sources,
            Page::Sources => Page::Entries,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Entries => "Позиции",
            Page::Sources => "Файлы",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

pub struct App<'a> {
    catalog: &'a Catalog,
    pub filtered: Vec<&'a Entry>,
    pub sources: Vec<SourceSummary>,
    pub state: TableState,
    pub sources_state: TableState,
    pub current_page: Page,
    pub input_mode: InputMode,
    pub query: String,
    pub show_detail: bool,
    pub status: Option<String>,
    exporter: ReportExporter<'a>,
    output_path: PathBuf,
}

impl<'a> App<'a> {
    pub fn new(catalog: &'a Catalog, output_path: PathBuf) -> Self {
        let mut sources_state = TableState::default();
        sources_state.select(Some(0));

        let mut app = Self {
            catalog,
            filtered: Vec::new(),
            sources: catalog.source_summary(),
            state: TableState::default(),
            sources_state,
            current_page: Page::Entries,
            input_mode: InputMode::Normal,
            query: String::new(),
            show_detail: false,
            status: None,
            exporter: ReportExporter::new(catalog),
            output_path,
        };
        app.apply_filter();
        app
    }

    /// Re-run the current query against the catalog
    pub fn apply_filter(&mut self) {
        self.filtered = search(self.catalog, &self.query);

        if self.filtered.is_empty() {
            self.state.select(None);
        } else {
            self.state.select(Some(0));
        }
    }

    pub fn clear_filter(&mut self) {
        self.query.clear();
        self.apply_filter();
    }

    pub fn selected_entry(&self) -> Option<&'a Entry> {
        self.state.selected().and_then(|i| self.filtered.get(i).copied())
    }

    pub fn export(&mut self) {
        self.status = Some(match self.exporter.export_to(&self.output_path) {
            Ok(path) => format!("Файл {} создан.", path.display()),
            Err(err) => format!("Ошибка: {}", err),
        });
    }

    fn rows_on_page(&self) -> usize {
        match self.current_page {
            Page::Entries => self.filtered.len(),
            Page::Sources => self.sources.len(),
        }
    }

    fn page_state(&mut self) -> &mut TableState {
        match self.current_page {
            Page::Entries => &mut self.state,
            Page::Sources => &mut self.sources_state,
        }
    }

    fn move_selection(&mut self, delta: isize, wrap: bool) {
        let len = self.rows_on_page();
        if len == 0 {
            return;
        }
        let current = self.page_state().selected().unwrap_or(0) as isize;
        let last = len as isize - 1;

        let next = current + delta;
        let next = if wrap {
            next.rem_euclid(len as isize)
        } else {
            next.clamp(0, last)
        };
        self.page_state().select(Some(next as usize));
    }

    pub fn next(&mut self) {
        self.move_selection(1, true);
    }

    pub fn previous(&mut self) {
        self.move_selection(-1, true);
    }

    pub fn page_down(&mut self) {
        self.move_selection(PAGE_STEP as isize, false);
    }

    pub fn page_up(&mut self) {
        self.move_selection(-(PAGE_STEP as isize), false);
    }

    /// Apply one key press; returns true when the app should quit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if self.input_mode == InputMode::Editing {
            match key.code {
                KeyCode::Enter => self.input_mode = InputMode::Normal,
                KeyCode::Esc => {
                    self.input_mode = InputMode::Normal;
                    self.clear_filter();
                }
                KeyCode::Backspace => {
                    self.query.pop();
                    self.apply_filter();
                }
                KeyCode::Char(c) => {
                    self.query.push(c);
                    self.apply_filter();
                }
                _ => {}
            }
            return false;
        }

        match key.code {
            KeyCode::Char('q') => return true,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return true,
            KeyCode::Esc => self.clear_filter(),
            KeyCode::Char('/') => {
                self.current_page = Page::Entries;
                self.input_mode = InputMode::Editing;
            }
            KeyCode::Char('1') => self.export(),
            KeyCode::Enter => self.show_detail = !self.show_detail,
            KeyCode::Tab | KeyCode::BackTab => self.current_page = self.current_page.next(),
            KeyCode::Down | KeyCode::Char('j') => self.next(),
            KeyCode::Up | KeyCode::Char('k') => self.previous(),
            KeyCode::PageDown => self.page_down(),
            KeyCode::PageUp => self.page_up(),
            KeyCode::Home => self.page_state().select(Some(0)),
            KeyCode::End => {
                let len = self.rows_on_page();
                if len > 0 {
                    self.page_state().select(Some(len - 1));
                }
            }
            _ => {}
        }
        false
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

    res?;
    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press && app.handle_key(key) {
                return Ok(());
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Tabs + search box
            Constraint::Min(0),    // Content
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    match app.current_page {
        Page::Entries if app.show_detail => {
            let content = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
                .split(chunks[1]);

            render_entries(f, content[0], app);
            render_detail_panel(f, content[1], app);
        }
        Page::Entries => render_entries(f, chunks[1], app),
        Page::Sources => render_sources(f, chunks[1], app),
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let mut spans = vec![];
    for (i, page) in [Page::Entries, Page::Sources].iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw(" │ "));
        }
        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled(page.title().to_string(), style));
    }

    spans.push(Span::raw("  |  "));
    spans.push(Span::styled(
        format!("Всего: {}", app.catalog.len()),
        Style::default().fg(Color::White),
    ));
    spans.push(Span::raw("  |  Поиск: "));

    let query_style = match app.input_mode {
        InputMode::Editing => Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        InputMode::Normal => Style::default().fg(Color::Green),
    };
    spans.push(Span::styled(app.query.clone(), query_style));
    if app.input_mode == InputMode::Editing {
        spans.push(Span::styled("█", Style::default().fg(Color::Yellow)));
    }

    let header = Paragraph::new(vec![Line::from(spans)])
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));

    f.render_widget(header, area);
}

fn header_row(labels: &[&'static str]) -> Row<'static> {
    let cells = labels.iter().map(|h| {
        Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    });
    Row::new(cells).style(Style::default().bg(Color::DarkGray)).height(1)
}

fn render_entries(f: &mut Frame, area: Rect, app: &mut App) {
    let header = header_row(&["№", "Наименование", "Цена", "Вес", "Файл", "Цена за кг."]);

    let rows = app.filtered.iter().enumerate().map(|(idx, entry)| {
        Row::new(vec![
            Cell::from((idx + 1).to_string()),
            Cell::from(truncate(entry.name(), 40)),
            Cell::from(entry.price().to_string()),
            Cell::from(entry.weight().to_string()),
            Cell::from(truncate(entry.source_file(), 24)),
            Cell::from(format!("{:.2}", entry.unit_price())).style(Style::default().fg(Color::Green)),
        ])
        .height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(6),
            Constraint::Length(42),
            Constraint::Length(10),
            Constraint::Length(6),
            Constraint::Length(26),
            Constraint::Length(12),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(format!(" Позиции ({}) ", app.filtered.len())),
    )
    .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_sources(f: &mut Frame, area: Rect, app: &mut App) {
    let header = header_row(&["Файл", "Позиций", "Мин. цена за кг.", "Макс. цена за кг."]);

    let rows = app.sources.iter().map(|s| {
        Row::new(vec![
            Cell::from(truncate(&s.source_file, 30)),
            Cell::from(s.entries.to_string()),
            Cell::from(format!("{:.2}", s.min_unit_price)).style(Style::default().fg(Color::Green)),
            Cell::from(format!("{:.2}", s.max_unit_price)).style(Style::default().fg(Color::Red)),
        ])
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(32),
            Constraint::Length(10),
            Constraint::Length(18),
            Constraint::Length(18),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Файлы "),
    )
    .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.sources_state);
}

fn render_detail_panel(f: &mut Frame, area: Rect, app: &App) {
    let label = Style::default().fg(Color::Cyan);

    let lines = match app.selected_entry() {
        Some(entry) => vec![
            Line::from(vec![Span::styled("Наименование: ", label), Span::raw(entry.name().to_string())]),
            Line::from(vec![Span::styled("Цена: ", label), Span::raw(entry.price().to_string())]),
            Line::from(vec![Span::styled("Вес: ", label), Span::raw(entry.weight().to_string())]),
            Line::from(vec![
                Span::styled("Цена за кг.: ", label),
                Span::styled(format!("{:.2}", entry.unit_price()), Style::default().fg(Color::Green)),
            ]),
            Line::from(""),
            Line::from(vec![Span::styled("Файл: ", label), Span::raw(entry.source_file().to_string())]),
            Line::from(vec![Span::styled("Строка: ", label), Span::raw(entry.line_number().to_string())]),
        ],
        None => vec![Line::from("Ничего не выбрано")],
    };

    let panel = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Подробно "),
    );

    f.render_widget(panel, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let selected = app.state.selected().map(|i| i + 1).unwrap_or(0);
    let key = Style::default().fg(Color::Yellow);

    let mut spans = vec![Span::styled(
        format!(" {}/{} ", selected, app.filtered.len()),
        Style::default().fg(Color::Cyan),
    )];

    if let Some(status) = &app.status {
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(status.clone(), Style::default().fg(Color::Green)));
    }

    spans.push(Span::raw(" | "));
    spans.push(Span::styled("/", key));
    spans.push(Span::raw(" Поиск | "));
    spans.push(Span::styled("Esc", key));
    spans.push(Span::raw(" Сброс | "));
    spans.push(Span::styled("Enter", key));
    spans.push(Span::raw(" Подробно | "));
    spans.push(Span::styled("Tab", key));
    spans.push(Span::raw(" Страница | "));
    spans.push(Span::styled("1", key));
    spans.push(Span::raw(" Выгрузить | "));
    spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    spans.push(Span::raw(" Выход"));

    let status_bar = Paragraph::new(vec![Line::from(spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
