use anyhow::Result;
use chrono::NaiveDate;
use crossterm::event::{self, Event, KeyCode};
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use projement::dashboard::{sort_for_dashboard, PageLink, Pager};
use projement::db::Database;
use projement::models::hours::format_hours;
use projement::models::{ProjectWithCompany, TagColor};

// Represents the state of the project dashboard
pub struct DashboardState {
    projects: Vec<ProjectWithCompany>,
    pager: Pager,
    table_state: TableState,
    today: NaiveDate,
    status: Option<String>,
}

impl DashboardState {
    pub fn new(mut projects: Vec<ProjectWithCompany>, page_size: usize, today: NaiveDate) -> Self {
        sort_for_dashboard(&mut projects, today);
        let pager = Pager::new(projects.len(), page_size);

        let mut state = Self {
            projects,
            pager,
            table_state: TableState::default(),
            today,
            status: None,
        };
        state.select_first_row();
        state
    }

    fn visible(&self) -> &[ProjectWithCompany] {
        self.pager.slice(&self.projects)
    }

    fn select_first_row(&mut self) {
        let selected = if self.visible().is_empty() { None } else { Some(0) };
        self.table_state.select(selected);
    }

    pub fn next(&mut self) {
        let rows = self.visible().len();
        if rows == 0 {
            return;
        }

        let i = match self.table_state.selected() {
            Some(i) if i + 1 < rows => i + 1,
            _ => 0,
        };
        self.table_state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let rows = self.visible().len();
        if rows == 0 {
            return;
        }

        let i = match self.table_state.selected() {
            Some(0) | None => rows - 1,
            Some(i) => i - 1,
        };
        self.table_state.select(Some(i));
    }

    pub fn next_page(&mut self) {
        if self.pager.has_next() {
            self.pager.next();
            self.select_first_row();
        }
    }

    pub fn previous_page(&mut self) {
        if self.pager.has_previous() {
            self.pager.previous();
            self.select_first_row();
        }
    }

    pub fn page(&self) -> usize {
        self.pager.page
    }

    /// Keep the current page after a reload, as far as it still exists.
    pub fn restore_page(&mut self, page: usize) {
        self.pager.go_to(page);
        self.select_first_row();
    }

    pub fn selected_project(&self) -> Option<&ProjectWithCompany> {
        self.table_state
            .selected()
            .and_then(|i| self.visible().get(i))
    }

    pub fn selected_project_id(&self) -> Option<i32> {
        self.selected_project().map(|p| p.project.id)
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = Some(status.into());
    }
}

pub enum DashboardAction {
    Exit,
    Reload,
    LogHours(i32), // Contains project_id
}

// DB operations for the dashboard
pub async fn load_projects(db: &Database) -> Result<Vec<ProjectWithCompany>> {
    Ok(db.fetch_projects().await?)
}

pub fn render_dashboard<B: Backend>(frame: &mut Frame<B>, state: &mut DashboardState) {
    let size = frame.size();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(3),
        ].as_ref())
        .split(size);

    if state.projects.is_empty() {
        let empty = Paragraph::new("No projects yet.")
            .block(Block::default().title("Projects").borders(Borders::ALL));
        frame.render_widget(empty, chunks[0]);
    } else {
        render_table(frame, state, chunks[0]);
    }

    frame.render_widget(Paragraph::new(page_strip(&state.pager)), chunks[1]);

    let mut help = String::from("<Up/Down> Select | <Left/Right> Page | <Enter> Log hours | <R> Reload | <Esc> Quit");
    if let Some(status) = &state.status {
        help = format!("{}  --  {}", status, help);
    }
    let buttons = Paragraph::new(help)
        .block(Block::default().borders(Borders::TOP))
        .style(Style::default().fg(Color::White));
    frame.render_widget(buttons, chunks[2]);
}

fn render_table<B: Backend>(frame: &mut Frame<B>, state: &mut DashboardState, area: Rect) {
    let today = state.today;
    let rows: Vec<Row> = state
        .visible()
        .iter()
        .map(|listed| project_row(listed, today))
        .collect();

    let header = Row::new(vec!["Project", "Tags", "Company", "Estimated", "Actual"])
        .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));

    let title = format!("Projects ({})", state.projects.len());
    let table = Table::new(rows)
        .header(header)
        .block(Block::default().title(title).borders(Borders::ALL))
        .widths(&[
            Constraint::Percentage(35),
            Constraint::Percentage(25),
            Constraint::Percentage(20),
            Constraint::Percentage(10),
            Constraint::Percentage(10),
        ])
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        );

    frame.render_stateful_widget(table, area, &mut state.table_state);
}

fn project_row(listed: &ProjectWithCompany, today: NaiveDate) -> Row<'static> {
    let project = &listed.project;

    let title_style = if project.has_ended_on(today) {
        Style::default().add_modifier(Modifier::CROSSED_OUT)
    } else {
        Style::default()
    };
    let mut title = vec![Span::styled(project.title.clone(), title_style)];
    if project.is_over_budget() {
        title.push(Span::raw(" "));
        title.push(Span::styled(
            "[over budget]",
            Style::default().fg(Color::White).bg(Color::Red),
        ));
    }

    let mut tags = Vec::new();
    for tag in &listed.company.tags {
        tags.push(Span::styled(tag.name.clone(), Style::default().fg(badge_color(tag.color))));
        tags.push(Span::raw(" "));
    }

    Row::new(vec![
        Cell::from(Spans::from(title)),
        Cell::from(Spans::from(tags)),
        Cell::from(listed.company.name.clone()),
        Cell::from(project.total_estimated_hours().to_string()),
        Cell::from(format_hours(&project.total_actual_hours())),
    ])
}

fn badge_color(color: TagColor) -> Color {
    match color {
        TagColor::Primary => Color::Blue,
        TagColor::Secondary => Color::Gray,
        TagColor::Success => Color::Green,
        TagColor::Danger => Color::Red,
        TagColor::Warning => Color::Yellow,
        TagColor::Info => Color::Cyan,
        TagColor::Light => Color::White,
        TagColor::Dark => Color::DarkGray,
    }
}

fn page_strip(pager: &Pager) -> Spans<'static> {
    let mut spans = Vec::new();
    let muted = Style::default().fg(Color::DarkGray);

    spans.push(Span::styled("< ", if pager.has_previous() { Style::default() } else { muted }));
    for link in pager.links() {
        match link {
            PageLink::Page { number, active: true } => spans.push(Span::styled(
                format!("[{}] ", number),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            PageLink::Page { number, active: false } => spans.push(Span::raw(format!("{} ", number))),
            PageLink::Break => spans.push(Span::styled("... ", muted)),
        }
    }
    spans.push(Span::styled(">", if pager.has_next() { Style::default() } else { muted }));

    Spans::from(spans)
}

pub fn handle_key(state: &mut DashboardState, key: KeyCode) -> Option<DashboardAction> {
    match key {
        KeyCode::Char('q') | KeyCode::Esc => return Some(DashboardAction::Exit),
        KeyCode::Char('r') => return Some(DashboardAction::Reload),
        KeyCode::Down => state.next(),
        KeyCode::Up => state.previous(),
        KeyCode::Right | KeyCode::Char('n') => state.next_page(),
        KeyCode::Left | KeyCode::Char('p') => state.previous_page(),
        KeyCode::Enter | KeyCode::Char('l') => {
            if let Some(id) = state.selected_project_id() {
                return Some(DashboardAction::LogHours(id));
            }
        }
        _ => {}
    }
    None
}

pub fn handle_input(state: &mut DashboardState) -> Result<Option<DashboardAction>> {
    if let Event::Key(key) = event::read()? {
        return Ok(handle_key(state, key.code));
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use projement::models::{Company, Project};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn projects(count: i32) -> Vec<ProjectWithCompany> {
        (1..=count)
            .map(|id| {
                let mut project = Project::new(1, format!("Project {}", id), 1, 1, 1);
                project.id = id;
                ProjectWithCompany {
                    project,
                    company: Company::new("Acme"),
                }
            })
            .collect()
    }

    #[test]
    fn selects_first_row_of_first_page() {
        let state = DashboardState::new(projects(3), 10, date(2024, 1, 1));
        assert_eq!(state.selected_project_id(), Some(1));
    }

    #[test]
    fn empty_dashboard_has_no_selection() {
        let mut state = DashboardState::new(Vec::new(), 10, date(2024, 1, 1));
        assert_eq!(state.selected_project_id(), None);
        assert!(handle_key(&mut state, KeyCode::Enter).is_none());
    }

    #[test]
    fn paging_moves_to_the_next_ten() {
        let mut state = DashboardState::new(projects(25), 10, date(2024, 1, 1));
        handle_key(&mut state, KeyCode::Right);
        assert_eq!(state.page(), 2);
        assert_eq!(state.selected_project_id(), Some(11));

        handle_key(&mut state, KeyCode::Right);
        handle_key(&mut state, KeyCode::Right);
        assert_eq!(state.page(), 3);
        assert_eq!(state.visible().len(), 5);

        handle_key(&mut state, KeyCode::Left);
        assert_eq!(state.page(), 2);
    }

    #[test]
    fn row_selection_wraps_within_the_page() {
        let mut state = DashboardState::new(projects(3), 10, date(2024, 1, 1));
        handle_key(&mut state, KeyCode::Up);
        assert_eq!(state.selected_project_id(), Some(3));
        handle_key(&mut state, KeyCode::Down);
        assert_eq!(state.selected_project_id(), Some(1));
    }

    #[test]
    fn enter_logs_hours_for_the_selected_project() {
        let mut state = DashboardState::new(projects(3), 10, date(2024, 1, 1));
        handle_key(&mut state, KeyCode::Down);
        match handle_key(&mut state, KeyCode::Enter) {
            Some(DashboardAction::LogHours(id)) => assert_eq!(id, 2),
            _ => panic!("expected a log hours action"),
        }
    }

    #[test]
    fn restore_page_clamps_after_reload() {
        let mut state = DashboardState::new(projects(12), 10, date(2024, 1, 1));
        state.restore_page(5);
        assert_eq!(state.page(), 2);
        assert_eq!(state.selected_project_id(), Some(11));
    }
}
