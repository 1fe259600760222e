use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::executor::block_on;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Gauge, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::collections::BTreeSet;
use std::io;
use upgrade_planner::{
    category_progress, enumerate_targets, progress_percent, Category, CostSource, Hero,
    PlanBuilder, TargetCosts, UpgradePlan, UpgradeTarget,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Targets,
    Materials,
    Overview,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Targets => Page::Materials,
            Page::Materials => Page::Overview,
            Page::Overview => Page::Targets,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::Targets => Page::Overview,
            Page::Materials => Page::Targets,
            Page::Overview => Page::Materials,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Targets => "Targets",
            Page::Materials => "Materials",
            Page::Overview => "Overview",
        }
    }
}

pub struct App<'a> {
    pub hero: Hero,
    pub targets: Vec<UpgradeTarget>,
    /// Indices into `targets` included in the plan
    pub selected: BTreeSet<usize>,
    pub plan: Option<UpgradePlan>,
    pub state: TableState,
    pub materials_state: TableState,
    pub current_page: Page,
    pub message: Option<String>,
    source: &'a dyn CostSource,
}

impl<'a> App<'a> {
    /// Starts with every target selected and the full plan computed
    pub fn new(hero: Hero, source: &'a dyn CostSource) -> Self {
        let targets = enumerate_targets(&hero);
        let selected = (0..targets.len()).collect();

        let mut state = TableState::default();
        if !targets.is_empty() {
            state.select(Some(0));
        }

        let mut materials_state = TableState::default();
        materials_state.select(Some(0));

        let mut app = Self {
            hero,
            targets,
            selected,
            plan: None,
            state,
            materials_state,
            current_page: Page::Targets,
            message: None,
            source,
        };
        app.recompute_plan();
        app
    }

    pub fn next_page(&mut self) {
        self.current_page = self.current_page.next();
    }

    pub fn previous_page(&mut self) {
        self.current_page = self.current_page.previous();
    }

    pub fn highlighted_target(&self) -> Option<&UpgradeTarget> {
        self.state.selected().and_then(|i| self.targets.get(i))
    }

    /// Flip the highlighted target in or out of the plan and replan
    pub fn toggle_selected(&mut self) {
        if let Some(i) = self.state.selected() {
            if !self.selected.remove(&i) {
                self.selected.insert(i);
            }
            self.recompute_plan();
        }
    }

    /// Select everything, or nothing if everything already is
    pub fn toggle_all(&mut self) {
        if self.selected.len() == self.targets.len() {
            self.selected.clear();
        } else {
            self.selected = (0..self.targets.len()).collect();
        }
        self.recompute_plan();
    }

    /// Plan entry for target row `i`, matched by target rather than position
    pub fn costs_for(&self, i: usize) -> Option<&TargetCosts> {
        let target = self.targets.get(i)?;
        let plan = self.plan.as_ref()?;
        let pos = plan.targets.iter().position(|t| t == target)?;
        plan.target_costs.get(pos)
    }

    pub fn selected_targets(&self) -> Vec<UpgradeTarget> {
        self.selected
            .iter()
            .filter_map(|&i| self.targets.get(i).cloned())
            .collect()
    }

    pub fn recompute_plan(&mut self) {
        let builder = PlanBuilder::new(self.source);
        match block_on(builder.build(self.selected_targets())) {
            Ok(plan) => {
                self.message = Some(plan.summary());
                self.plan = Some(plan);
            }
            Err(e) => {
                self.plan = None;
                self.message = Some(e.to_string());
            }
        }
    }

    /// Cost of the next level of the highlighted target, as a status line
    pub fn preview_next_level(&mut self) {
        let Some(target) = self.highlighted_target().cloned() else {
            return;
        };
        let next = target.next_level();
        let builder = PlanBuilder::new(self.source);

        self.message = Some(
            match block_on(builder.preview(next.path, next.current_level, next.target_level)) {
                Ok(preview) if preview.materials.is_empty() => format!(
                    "{} {} → {}: no costs listed",
                    target.item_name, preview.from_level, preview.to_level
                ),
                Ok(preview) => {
                    let bill: Vec<String> = preview
                        .materials
                        .sorted_by_amount()
                        .into_iter()
                        .map(|(material, amount)| format!("{} {}", amount, material))
                        .collect();
                    format!(
                        "{} {} → {}: {}",
                        target.item_name,
                        preview.from_level,
                        preview.to_level,
                        bill.join(", ")
                    )
                }
                Err(e) => e.to_string(),
            },
        );
    }

    fn list_len(&self) -> usize {
        match self.current_page {
            Page::Targets => self.targets.len(),
            Page::Materials => self.plan.as_ref().map(|p| p.material_summary.len()).unwrap_or(0),
            Page::Overview => 0,
        }
    }

    fn active_state(&mut self) -> &mut TableState {
        match self.current_page {
            Page::Materials => &mut self.materials_state,
            _ => &mut self.state,
        }
    }

    pub fn next(&mut self) {
        let len = self.list_len();
        if len == 0 {
            return;
        }
        let state = self.active_state();
        let i = match state.selected() {
            Some(i) if i >= len - 1 => 0,
            Some(i) => i + 1,
            None => 0,
        };
        state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.list_len();
        if len == 0 {
            return;
        }
        let state = self.active_state();
        let i = match state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        state.select(Some(i));
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Tab => app.next_page(),
                KeyCode::BackTab => app.previous_page(),
                KeyCode::Char(' ') if app.current_page == Page::Targets => app.toggle_selected(),
                KeyCode::Char('a') if app.current_page == Page::Targets => app.toggle_all(),
                KeyCode::Char('n') if app.current_page == Page::Targets => {
                    app.preview_next_level()
                }
                KeyCode::Char('p') => app.recompute_plan(),
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    return Ok(())
                }
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                KeyCode::Home => app.active_state().select(Some(0)),
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    match app.current_page {
        Page::Targets => render_targets(f, chunks[1], app),
        Page::Materials => render_materials(f, chunks[1], app),
        Page::Overview => render_overview(f, chunks[1], app),
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let pages = [Page::Targets, Page::Materials, Page::Overview];

    let mut tab_spans = vec![];
    for (i, page) in pages.iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }

        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        tab_spans.push(Span::styled(page.title().to_string(), style));
    }

    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("{} ({})", app.hero.name, app.hero.rarity.as_str()),
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
    ));
    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Selected: {}/{}", app.selected.len(), app.targets.len()),
        Style::default().fg(Color::Green),
    ));

    let header = Paragraph::new(vec![Line::from(tab_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    f.render_widget(header, area);
}

fn render_targets(f: &mut Frame, area: Rect, app: &mut App) {
    let header_cells = ["", "Category", "Item", "Track", "Level", "Left", "Materials"]
        .iter()
        .map(|h| {
            Cell::from(*h).style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
        });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = app.targets.iter().enumerate().map(|(i, target)| {
        let is_selected = app.selected.contains(&i);
        let color = category_color(target.category);

        let materials = app
            .costs_for(i)
            .map(|c| {
                if c.is_failed() {
                    "lookup failed".to_string()
                } else {
                    format!("{} units", c.materials.total_units())
                }
            })
            .unwrap_or_default();

        let cells = vec![
            Cell::from(if is_selected { "[x]" } else { "[ ]" }),
            Cell::from(target.category.title()).style(Style::default().fg(color)),
            Cell::from(truncate(&target.item_name, 32)),
            Cell::from(target.subcategory.clone()),
            Cell::from(format!("{} → {}", target.current_level, target.target_level)),
            Cell::from(target.levels_remaining().to_string()),
            Cell::from(materials),
        ];

        let style = if is_selected {
            Style::default()
        } else {
            Style::default().fg(Color::DarkGray)
        };
        Row::new(cells).style(style).height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(4),
            Constraint::Length(10),
            Constraint::Length(34),
            Constraint::Length(16),
            Constraint::Length(10),
            Constraint::Length(6),
            Constraint::Min(12),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Upgrade Targets "),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_materials(f: &mut Frame, area: Rect, app: &mut App) {
    let header = Row::new(["Material", "Amount"].iter().map(|h| {
        Cell::from(*h).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    }))
    .style(Style::default().bg(Color::DarkGray))
    .height(1);

    let sorted = app
        .plan
        .as_ref()
        .map(|p| p.material_summary.sorted_by_amount())
        .unwrap_or_default();
    let total: i64 = sorted.iter().map(|(_, amount)| amount).sum();

    let rows = sorted.into_iter().map(|(material, amount)| {
        Row::new(vec![
            Cell::from(material),
            Cell::from(format!("{:>10}", amount)).style(Style::default().fg(Color::Cyan)),
        ])
        .height(1)
    });

    let table = Table::new(rows, [Constraint::Length(32), Constraint::Length(12)])
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(format!(" Materials Needed ({} units) ", total)),
        )
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.materials_state);
}

fn render_overview(f: &mut Frame, area: Rect, app: &App) {
    let progress = category_progress(&app.targets);
    let categories = [Category::Relic, Category::Weapon, Category::Artifact];

    let mut constraints = vec![Constraint::Length(3)];
    constraints.extend(categories.iter().map(|_| Constraint::Length(3)));
    constraints.push(Constraint::Min(0));

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    let overall = progress_percent(&app.targets);
    f.render_widget(progress_gauge("Overall", overall, Color::Green), chunks[0]);

    for (i, category) in categories.iter().enumerate() {
        // Categories with nothing left to upgrade are complete
        let percent = progress.get(category).copied().unwrap_or(100.0);
        f.render_widget(
            progress_gauge(category.title(), percent, category_color(*category)),
            chunks[i + 1],
        );
    }

    let mut lines = vec![
        Line::from(""),
        Line::from(vec![Span::styled(
            "  Plan",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )]),
    ];

    match &app.plan {
        Some(plan) => {
            lines.push(Line::from(format!("  {}", plan.summary())));
            lines.push(Line::from(format!(
                "  Computed at {}",
                plan.computed_at.format("%Y-%m-%d %H:%M:%S UTC")
            )));
            for (target, reason) in plan.failures() {
                lines.push(Line::from(Span::styled(
                    format!("  ✗ {}: {}", target.item_name, reason),
                    Style::default().fg(Color::Red),
                )));
            }
        }
        None => lines.push(Line::from(Span::styled(
            "  No plan (cost data unavailable)",
            Style::default().fg(Color::Red),
        ))),
    }

    let summary = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Summary "),
    );
    f.render_widget(summary, chunks[categories.len() + 1]);
}

fn progress_gauge(title: &str, percent: f64, color: Color) -> Gauge<'static> {
    Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} ", title)),
        )
        .gauge_style(Style::default().fg(color))
        .ratio((percent / 100.0).clamp(0.0, 1.0))
        .label(format!("{:.1}%", percent))
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let mut status_spans = vec![];

    if let Some(message) = &app.message {
        status_spans.push(Span::styled(
            format!(" {} ", truncate(message, 80)),
            Style::default().fg(Color::Cyan),
        ));
        status_spans.push(Span::raw(" | "));
    }

    status_spans.push(Span::styled("Tab", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Page | "));
    status_spans.push(Span::styled("↑/↓", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Nav | "));
    status_spans.push(Span::styled("Space", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Select | "));
    status_spans.push(Span::styled("a", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" All | "));
    status_spans.push(Span::styled("n", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Next level | "));
    status_spans.push(Span::styled("p", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Plan | "));
    status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    status_spans.push(Span::raw(" Quit"));

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn category_color(category: Category) -> Color {
    match category {
        Category::Relic => Color::Magenta,
        Category::Weapon => Color::Yellow,
        Category::Artifact => Color::Cyan,
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
