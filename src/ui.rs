use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
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
use relief_intake::{
    DashboardFilters, DuplicateAuditEngine, DuplicateGroup, HouseholdRecord, PersonRole,
};
use std::collections::HashSet;
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Households,
    DuplicateAudit,
    QuickFilters,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Households => Page::DuplicateAudit,
            Page::DuplicateAudit => Page::QuickFilters,
            Page::QuickFilters => Page::Households,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::Households => Page::QuickFilters,
            Page::DuplicateAudit => Page::Households,
            Page::QuickFilters => Page::DuplicateAudit,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Households => "Households",
            Page::DuplicateAudit => "Duplicate Audit",
            Page::QuickFilters => "Quick Filters",
        }
    }
}

/// Preset filters reachable from the Quick Filters page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuickFilter {
    All,
    TotalLoss,
    HabitableWithDamage,
    UninhabitableTemporary,
    UnemployedHead,
    LargeHousehold,
}

impl QuickFilter {
    fn to_filters(self) -> DashboardFilters {
        match self {
            QuickFilter::All => DashboardFilters::default(),
            QuickFilter::TotalLoss => DashboardFilters {
                housing_damage: Some("Total loss".to_string()),
                ..Default::default()
            },
            QuickFilter::HabitableWithDamage => DashboardFilters {
                housing_damage: Some("Habitable with damage".to_string()),
                ..Default::default()
            },
            QuickFilter::UninhabitableTemporary => DashboardFilters {
                housing_damage: Some("Uninhabitable (temporary)".to_string()),
                ..Default::default()
            },
            QuickFilter::UnemployedHead => DashboardFilters {
                employment_status: Some("Unemployed".to_string()),
                ..Default::default()
            },
            QuickFilter::LargeHousehold => DashboardFilters {
                min_household_size: Some(5),
                ..Default::default()
            },
        }
    }

    fn label(self) -> &'static str {
        match self {
            QuickFilter::All => "All households",
            QuickFilter::TotalLoss => "Total loss",
            QuickFilter::HabitableWithDamage => "Habitable with damage",
            QuickFilter::UninhabitableTemporary => "Uninhabitable (temporary)",
            QuickFilter::UnemployedHead => "Unemployed head",
            QuickFilter::LargeHousehold => "5+ person households",
        }
    }
}

pub struct App {
    pub households: Vec<HouseholdRecord>,
    pub visible: Vec<HouseholdRecord>,
    pub filters: DashboardFilters,
    pub active_quick_filter: QuickFilter,
    pub state: TableState,
    pub served: HashSet<String>,
    pub audit_groups: Vec<DuplicateGroup>,
    pub audit_scroll: u16,
    pub current_page: Page,
    pub show_detail: bool,
}

impl App {
    pub fn new(households: Vec<HouseholdRecord>, served: Vec<String>) -> Self {
        let mut state = TableState::default();
        if !households.is_empty() {
            state.select(Some(0));
        }

        // The audit runs once over the full snapshot at load time.
        let audit_groups = DuplicateAuditEngine::new().detect_duplicates(&households);

        let visible = households.clone();

        Self {
            households,
            visible,
            filters: DashboardFilters::default(),
            active_quick_filter: QuickFilter::All,
            state,
            served: served.into_iter().collect(),
            audit_groups,
            audit_scroll: 0,
            current_page: Page::Households,
            show_detail: false,
        }
    }

    pub fn toggle_detail(&mut self) {
        self.show_detail = !self.show_detail;
    }

    pub fn selected_household(&self) -> Option<&HouseholdRecord> {
        self.state.selected().and_then(|i| self.visible.get(i))
    }

    pub fn is_served(&self, household: &HouseholdRecord) -> bool {
        self.served.contains(&household.id)
    }

    pub fn apply_quick_filter(&mut self, quick: QuickFilter) {
        self.active_quick_filter = quick;
        self.filters = quick.to_filters();
        self.refresh_visible();
    }

    pub fn clear_filter(&mut self) {
        self.apply_quick_filter(QuickFilter::All);
    }

    /// Recompute the visible subset and reset the selection.
    fn refresh_visible(&mut self) {
        self.visible = self.filters.apply(&self.households);
        if self.visible.is_empty() {
            self.state.select(None);
        } else {
            self.state.select(Some(0));
        }
    }

    pub fn next_page(&mut self) {
        self.current_page = self.current_page.next();
    }

    pub fn previous_page(&mut self) {
        self.current_page = self.current_page.previous();
    }

    pub fn next(&mut self) {
        let len = self.visible.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => {
                if i >= len - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.visible.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => {
                if i == 0 {
                    len - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn page_down(&mut self) {
        let len = self.visible.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => (i + 20).min(len - 1),
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn page_up(&mut self) {
        let i = match self.state.selected() {
            Some(i) => i.saturating_sub(20),
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn scroll_audit_down(&mut self) {
        self.audit_scroll = self.audit_scroll.saturating_add(1);
    }

    pub fn scroll_audit_up(&mut self) {
        self.audit_scroll = self.audit_scroll.saturating_sub(1);
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
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Enter => app.toggle_detail(),
                KeyCode::Tab => {
                    if key.modifiers.contains(KeyModifiers::SHIFT) {
                        app.previous_page();
                    } else {
                        app.next_page();
                    }
                }
                KeyCode::Char('c') => {
                    app.clear_filter();
                    app.current_page = Page::Households;
                }
                KeyCode::Char('1') if app.current_page == Page::QuickFilters => {
                    app.apply_quick_filter(QuickFilter::All);
                    app.current_page = Page::Households;
                }
                KeyCode::Char('2') if app.current_page == Page::QuickFilters => {
                    app.apply_quick_filter(QuickFilter::TotalLoss);
                    app.current_page = Page::Households;
                }
                KeyCode::Char('3') if app.current_page == Page::QuickFilters => {
                    app.apply_quick_filter(QuickFilter::HabitableWithDamage);
                    app.current_page = Page::Households;
                }
                KeyCode::Char('4') if app.current_page == Page::QuickFilters => {
                    app.apply_quick_filter(QuickFilter::UninhabitableTemporary);
                    app.current_page = Page::Households;
                }
                KeyCode::Char('5') if app.current_page == Page::QuickFilters => {
                    app.apply_quick_filter(QuickFilter::UnemployedHead);
                    app.current_page = Page::Households;
                }
                KeyCode::Char('6') if app.current_page == Page::QuickFilters => {
                    app.apply_quick_filter(QuickFilter::LargeHousehold);
                    app.current_page = Page::Households;
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    if app.current_page == Page::DuplicateAudit {
                        app.scroll_audit_down();
                    } else {
                        app.next();
                    }
                }
                KeyCode::Up | KeyCode::Char('k') => {
                    if app.current_page == Page::DuplicateAudit {
                        app.scroll_audit_up();
                    } else {
                        app.previous();
                    }
                }
                KeyCode::PageDown => app.page_down(),
                KeyCode::PageUp => app.page_up(),
                KeyCode::Home => app.state.select(Some(0)),
                KeyCode::End => {
                    if !app.visible.is_empty() {
                        app.state.select(Some(app.visible.len() - 1));
                    }
                }
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

    // Content area with optional split for detail panel
    if app.show_detail && app.current_page == Page::Households {
        let content_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(55), // Household list
                Constraint::Percentage(45), // Detail panel
            ])
            .split(chunks[1]);

        render_table(f, content_chunks[0], app);
        render_detail_panel(f, content_chunks[1], app);
    } else {
        match app.current_page {
            Page::Households => render_table(f, chunks[1], app),
            Page::DuplicateAudit => render_audit(f, chunks[1], app),
            Page::QuickFilters => render_quick_filters(f, chunks[1], app),
        }
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let pages = [Page::Households, Page::DuplicateAudit, Page::QuickFilters];

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

        tab_spans.push(Span::styled(page.title(), style));
    }

    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Families: {}", app.households.len()),
        Style::default().fg(Color::White),
    ));
    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Served: {}", app.served.len()),
        Style::default().fg(Color::Green),
    ));
    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Suspect groups: {}", app.audit_groups.len()),
        Style::default().fg(if app.audit_groups.is_empty() {
            Color::DarkGray
        } else {
            Color::Red
        }),
    ));

    let header = Paragraph::new(vec![Line::from(tab_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    f.render_widget(header, area);
}

fn render_table(f: &mut Frame, area: Rect, app: &mut App) {
    let header_cells = ["Responsible", "National ID", "Address", "Damage", "Size", "Served"]
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

    let served = app.served.clone();
    let rows = app.visible.iter().map(|h| {
        let damage_color = match h.housing_damage.as_str() {
            "Total loss" => Color::Red,
            "Uninhabitable (temporary)" => Color::Yellow,
            "Habitable with damage" => Color::Cyan,
            _ => Color::White,
        };

        let served_cell = if served.contains(&h.id) {
            Cell::from("✓").style(Style::default().fg(Color::Green))
        } else {
            Cell::from("-").style(Style::default().fg(Color::DarkGray))
        };

        let cells = vec![
            Cell::from(truncate(&h.head_name, 24)),
            Cell::from(h.national_id.clone()),
            Cell::from(truncate(&h.address, 28)),
            Cell::from(h.housing_damage.clone()).style(Style::default().fg(damage_color)),
            Cell::from(format!("{}", h.household_size())),
            served_cell,
        ];

        Row::new(cells).height(1)
    });

    let title = if app.filters.is_active() {
        format!(" Households ({} of {}) ", app.visible.len(), app.households.len())
    } else {
        format!(" Households ({}) ", app.households.len())
    };

    let table = Table::new(
        rows,
        [
            Constraint::Length(26),
            Constraint::Length(16),
            Constraint::Length(30),
            Constraint::Length(26),
            Constraint::Length(6),
            Constraint::Length(8),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(title),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_detail_panel(f: &mut Frame, area: Rect, app: &App) {
    let household = match app.selected_household() {
        Some(h) => h,
        None => {
            let no_selection = Paragraph::new("No household selected").block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Yellow))
                    .title(" Household Details "),
            );
            f.render_widget(no_selection, area);
            return;
        }
    };

    let label = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);

    let mut content = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled("  Responsible: ", label),
            Span::raw(&household.head_name),
        ]),
        Line::from(vec![
            Span::styled("  National ID: ", label),
            Span::raw(&household.national_id),
        ]),
        Line::from(vec![
            Span::styled("  Birth date: ", label),
            Span::raw(household.head_birth_date.as_deref().unwrap_or("not recorded")),
        ]),
        Line::from(vec![
            Span::styled("  Phone: ", label),
            Span::raw(&household.phone_primary),
        ]),
        Line::from(vec![
            Span::styled("  Address: ", label),
            Span::raw(&household.address),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Housing: ", label),
            Span::raw(format!(
                "{} — {}",
                household.housing_tenure, household.housing_damage
            )),
        ]),
        Line::from(vec![
            Span::styled("  Employment: ", label),
            Span::raw(&household.employment_status),
            Span::raw(if household.workplace_affected {
                " (workplace affected)"
            } else {
                ""
            }),
        ]),
        Line::from(vec![
            Span::styled("  Household: ", label),
            Span::raw(format!(
                "{} adult(s), {} child(ren)",
                household.adults, household.children
            )),
        ]),
    ];

    if household.has_disabled_member || household.has_pregnant_member {
        let mut flags = Vec::new();
        if household.has_disabled_member {
            flags.push("disabled member");
        }
        if household.has_pregnant_member {
            flags.push("pregnant member");
        }
        content.push(Line::from(vec![
            Span::styled("  Priority: ", label),
            Span::styled(flags.join(", "), Style::default().fg(Color::Magenta)),
        ]));
    }

    content.push(Line::from(""));
    content.push(Line::from(vec![Span::styled(
        "  FAMILY MEMBERS",
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
    )]));
    if household.members.is_empty() {
        content.push(Line::from(Span::styled(
            "  none listed",
            Style::default().fg(Color::DarkGray),
        )));
    }
    for member in &household.members {
        content.push(Line::from(vec![
            Span::raw("  • "),
            Span::raw(member.name.clone()),
            Span::styled(
                format!(
                    " ({})",
                    member.birth_date.as_deref().unwrap_or("birth date not recorded")
                ),
                Style::default().fg(Color::DarkGray),
            ),
        ]));
    }

    content.push(Line::from(""));
    content.push(Line::from(vec![Span::styled(
        "  NEEDS",
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
    )]));
    content.push(Line::from(vec![
        Span::raw("  "),
        Span::raw(if household.needs.is_empty() {
            "none recorded".to_string()
        } else {
            household.needs.join(", ")
        }),
    ]));
    if let Some(urgent) = &household.urgent_needs {
        content.push(Line::from(vec![
            Span::styled("  Urgent: ", label),
            Span::styled(urgent.clone(), Style::default().fg(Color::Red)),
        ]));
    }

    content.push(Line::from(""));
    content.push(Line::from(vec![
        Span::styled("  Served: ", label),
        if app.is_served(household) {
            Span::styled("yes", Style::default().fg(Color::Green))
        } else {
            Span::styled("not yet", Style::default().fg(Color::DarkGray))
        },
    ]));

    content.push(Line::from(""));
    content.push(Line::from(Span::styled(
        "  Press Enter to close",
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC),
    )));

    let detail_panel = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(" Household Details "),
    );

    f.render_widget(detail_panel, area);
}

fn render_audit(f: &mut Frame, area: Rect, app: &App) {
    if app.audit_groups.is_empty() {
        let content = vec![
            Line::from(""),
            Line::from(Span::styled(
                "  No suspected duplicates found.",
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(Span::styled(
                "  All registrations look unique.",
                Style::default().fg(Color::DarkGray),
            )),
        ];
        let paragraph = Paragraph::new(content).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(" Duplicate Audit "),
        );
        f.render_widget(paragraph, area);
        return;
    }

    let mut content = vec![Line::from("")];

    for group in &app.audit_groups {
        let birth = group.birth_date.as_deref().unwrap_or("not recorded");
        content.push(Line::from(vec![
            Span::styled(
                format!("  ⚠ {} ", group.name),
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!(
                    "appears in {} place(s), born {}",
                    group.occurrences.len(),
                    birth
                ),
                Style::default().fg(Color::White),
            ),
        ]));

        if group.is_same_household() {
            content.push(Line::from(Span::styled(
                "    all inside the same registration",
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            )));
        }

        for entry in &group.occurrences {
            let role_color = match entry.role {
                PersonRole::HeadOfHousehold => Color::Red,
                PersonRole::FamilyMember => Color::Cyan,
            };
            content.push(Line::from(vec![
                Span::raw("    • "),
                Span::styled(entry.role.label(), Style::default().fg(role_color)),
                Span::raw(" — registered by "),
                Span::styled(
                    entry.registered_by.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    format!("  [{}]", truncate(&entry.household_id, 8)),
                    Style::default().fg(Color::DarkGray),
                ),
            ]));
        }
        content.push(Line::from(""));
    }

    let paragraph = Paragraph::new(content)
        .scroll((app.audit_scroll, 0))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(format!(
                    " Duplicate Audit ({} suspect groups) ",
                    app.audit_groups.len()
                )),
        );

    f.render_widget(paragraph, area);
}

fn render_quick_filters(f: &mut Frame, area: Rect, app: &App) {
    let options = [
        ('1', QuickFilter::All),
        ('2', QuickFilter::TotalLoss),
        ('3', QuickFilter::HabitableWithDamage),
        ('4', QuickFilter::UninhabitableTemporary),
        ('5', QuickFilter::UnemployedHead),
        ('6', QuickFilter::LargeHousehold),
    ];

    let mut content = vec![
        Line::from(""),
        Line::from(Span::styled(
            "  Quick Filters",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];

    for (key, quick) in options {
        let marker = if app.active_quick_filter == quick {
            Span::styled("→", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD))
        } else {
            Span::raw(" ")
        };

        let count = quick.to_filters().apply(&app.households).len();

        content.push(Line::from(vec![
            Span::raw("  "),
            marker,
            Span::styled(format!(" {}", key), Style::default().fg(Color::Yellow)),
            Span::raw(format!(". {:<28}", quick.label())),
            Span::styled(
                format!("{:>5} families", count),
                Style::default().fg(Color::White),
            ),
        ]));
    }

    content.push(Line::from(""));
    content.push(Line::from(vec![
        Span::styled(
            "  Hint: ",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::ITALIC),
        ),
        Span::styled(
            "press 1-6 to filter, c to clear",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        ),
    ]));

    let paragraph = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Quick Filters "),
    );

    f.render_widget(paragraph, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let selected = app.state.selected().map(|i| i + 1).unwrap_or(0);
    let total = app.visible.len();

    let mut status_spans = vec![Span::styled(
        format!(" Row: {}/{} ", selected, total),
        Style::default().fg(Color::Cyan),
    )];

    if app.filters.is_active() {
        status_spans.push(Span::raw(" | "));
        status_spans.push(Span::styled(
            format!("Filter: {}", app.active_quick_filter.label()),
            Style::default().fg(Color::Green),
        ));
        status_spans.push(Span::raw(" ("));
        status_spans.push(Span::styled("c", Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(" clear)"));
    }

    status_spans.push(Span::raw(" | "));
    status_spans.push(Span::styled("Enter", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Details | "));
    status_spans.push(Span::styled("Tab", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Page | "));
    status_spans.push(Span::styled("↑/↓", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Nav | "));
    status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    status_spans.push(Span::raw(" Quit"));

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
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
        let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}
