use anyhow::Result;
use crossterm::event::{self, Event, KeyCode};
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use projement::models::hours::{format_hours, parse_hours, zero_hours};
use projement::models::{LoggedHours, ProjectWithCompany};

use crate::ui::centered_rect;

pub enum LogHoursAction {
    Cancel,
    Save(i32, LoggedHours), // Contains project_id
}

#[derive(Clone, PartialEq, Copy)]
pub enum PhaseField {
    Design,
    Development,
    Testing,
}

impl PhaseField {
    fn label(&self) -> &'static str {
        match self {
            PhaseField::Design => "Design",
            PhaseField::Development => "Development",
            PhaseField::Testing => "Testing",
        }
    }
}

const FIELDS: [PhaseField; 3] = [PhaseField::Design, PhaseField::Development, PhaseField::Testing];

pub struct LogHoursState {
    pub listed: ProjectWithCompany,
    pub design: String,
    pub development: String,
    pub testing: String,
    pub current_field: PhaseField,
    pub editing: bool,
    pub error: Option<String>,
}

impl LogHoursState {
    pub fn new(listed: ProjectWithCompany) -> Self {
        Self {
            listed,
            design: String::new(),
            development: String::new(),
            testing: String::new(),
            current_field: PhaseField::Design,
            editing: false,
            error: None,
        }
    }

    pub fn project_id(&self) -> i32 {
        self.listed.project.id
    }

    pub fn toggle_editing(&mut self) {
        self.editing = !self.editing;
    }

    pub fn next_field(&mut self) {
        self.current_field = match self.current_field {
            PhaseField::Design => PhaseField::Development,
            PhaseField::Development => PhaseField::Testing,
            PhaseField::Testing => PhaseField::Design,
        };
    }

    pub fn previous_field(&mut self) {
        self.current_field = match self.current_field {
            PhaseField::Design => PhaseField::Testing,
            PhaseField::Development => PhaseField::Design,
            PhaseField::Testing => PhaseField::Development,
        };
    }

    fn input(&self, field: PhaseField) -> &str {
        match field {
            PhaseField::Design => &self.design,
            PhaseField::Development => &self.development,
            PhaseField::Testing => &self.testing,
        }
    }

    fn input_mut(&mut self, field: PhaseField) -> &mut String {
        match field {
            PhaseField::Design => &mut self.design,
            PhaseField::Development => &mut self.development,
            PhaseField::Testing => &mut self.testing,
        }
    }

    pub fn edit_current_field(&mut self, key: KeyCode) {
        if !self.editing {
            return;
        }

        let field = self.current_field;
        let input = self.input_mut(field);
        match key {
            KeyCode::Char(c) if c.is_ascii_digit() || (c == '.' && !input.contains('.')) => {
                input.push(c);
            }
            KeyCode::Backspace => {
                input.pop();
            }
            _ => {}
        }
    }

    /// Parse the three inputs; blank means nothing logged for that phase.
    pub fn to_logged_hours(&self) -> std::result::Result<LoggedHours, String> {
        let parse = |field: PhaseField| {
            let raw = self.input(field);
            if raw.trim().is_empty() {
                return Ok(zero_hours());
            }
            parse_hours(raw).ok_or_else(|| format!("{}: enter a number of hours, e.g. 2.5", field.label()))
        };

        let hours = LoggedHours {
            design: parse(PhaseField::Design)?,
            development: parse(PhaseField::Development)?,
            testing: parse(PhaseField::Testing)?,
        };
        hours.validate().map_err(|errors| errors.to_string())?;

        // Check the totals up front so the form can show the problem
        let mut preview = self.listed.project.clone();
        preview.log_hours(&hours).map_err(|errors| errors.to_string())?;

        Ok(hours)
    }

    pub fn set_error(&mut self, error: impl Into<String>) {
        self.error = Some(error.into());
    }
}

pub fn render_log_hours<B: Backend>(f: &mut Frame<B>, state: &mut LogHoursState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Length(7),
                Constraint::Min(5),
                Constraint::Length(3),
            ]
            .as_ref(),
        )
        .split(f.size());

    let project = &state.listed.project;
    let title = Paragraph::new(format!("Log hours: {} ({})", project.title, state.listed.company.name))
        .style(Style::default().fg(Color::Cyan))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(title, chunks[0]);

    render_summary(f, state, chunks[1]);
    render_form(f, state, chunks[2]);

    let help_text = if state.editing {
        "Enter - Save field | Esc - Cancel editing"
    } else {
        "Enter - Edit field | Up/Down - Navigate fields | S - Save hours | Esc - Cancel"
    };

    let help = Paragraph::new(help_text)
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(help, chunks[3]);

    if let Some(error) = &state.error {
        let size = f.size();
        render_error(f, size, error);
    }
}

fn render_summary<B: Backend>(f: &mut Frame<B>, state: &LogHoursState, area: Rect) {
    let project = &state.listed.project;
    let phases = [
        ("Design", project.estimated_design, &project.actual_design),
        ("Development", project.estimated_development, &project.actual_development),
        ("Testing", project.estimated_testing, &project.actual_testing),
    ];

    let mut lines: Vec<Spans> = phases
        .iter()
        .map(|(name, estimated, actual)| {
            Spans::from(format!("{:<12} estimated {:>5}   actual {:>8}", name, estimated, format_hours(actual)))
        })
        .collect();

    let total_style = if project.is_over_budget() {
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    lines.push(Spans::from(Span::styled(
        format!(
            "{:<12} estimated {:>5}   actual {:>8}",
            "Total",
            project.total_estimated_hours(),
            format_hours(&project.total_actual_hours())
        ),
        total_style,
    )));

    let summary = Paragraph::new(lines).block(Block::default().title("Hours so far").borders(Borders::ALL));
    f.render_widget(summary, area);
}

fn render_form<B: Backend>(f: &mut Frame<B>, state: &LogHoursState, area: Rect) {
    let items: Vec<ListItem> = FIELDS
        .iter()
        .map(|field| {
            let selected = *field == state.current_field;
            let value = state.input(*field);
            let label_style = if selected {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default()
            };

            let content = if selected && state.editing {
                Spans::from(vec![
                    Span::styled(format!("{}: ", field.label()), label_style),
                    Span::styled(format!("{}|", value), Style::default().add_modifier(Modifier::BOLD)),
                ])
            } else {
                Spans::from(vec![
                    Span::styled(format!("{}: ", field.label()), label_style),
                    Span::raw(if value.is_empty() { "0".to_string() } else { value.to_string() }),
                ])
            };

            ListItem::new(content)
        })
        .collect();

    let form_list = List::new(items).block(Block::default().borders(Borders::ALL).title("Hours worked"));
    f.render_widget(form_list, area);
}

fn render_error<B: Backend>(f: &mut Frame<B>, size: Rect, error: &str) {
    let popup_area = centered_rect(60, 20, size);

    let popup = Paragraph::new(vec![
        Spans::from(""),
        Spans::from(error.to_string()),
        Spans::from(""),
        Spans::from("Press any key to continue"),
    ])
    .block(Block::default().title("Error").borders(Borders::ALL))
    .style(Style::default().fg(Color::White).bg(Color::Red));

    f.render_widget(popup, popup_area);
}

pub fn handle_key(state: &mut LogHoursState, key: KeyCode) -> Option<LogHoursAction> {
    if state.error.is_some() {
        state.error = None;
        return None;
    }

    match key {
        KeyCode::Esc => {
            if state.editing {
                state.toggle_editing();
            } else {
                return Some(LogHoursAction::Cancel);
            }
        }
        KeyCode::Enter => state.toggle_editing(),
        KeyCode::Up if !state.editing => state.previous_field(),
        KeyCode::Down if !state.editing => state.next_field(),
        KeyCode::Char('s') if !state.editing => match state.to_logged_hours() {
            Ok(hours) => return Some(LogHoursAction::Save(state.project_id(), hours)),
            Err(error) => state.set_error(error),
        },
        _ if state.editing => state.edit_current_field(key),
        _ => {}
    }

    None
}

pub fn handle_input(state: &mut LogHoursState) -> Result<Option<LogHoursAction>> {
    if let Event::Key(key) = event::read()? {
        return Ok(handle_key(state, key.code));
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use bigdecimal::BigDecimal;

    use super::*;
    use projement::models::{Company, Project};

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn state_for(actual_design: &str) -> LogHoursState {
        let mut project = Project::new(1, "Website", 10, 10, 10);
        project.id = 9;
        project.actual_design = dec(actual_design);
        LogHoursState::new(ProjectWithCompany {
            project,
            company: Company::new("Acme"),
        })
    }

    fn type_text(state: &mut LogHoursState, text: &str) {
        handle_key(state, KeyCode::Enter);
        for c in text.chars() {
            handle_key(state, KeyCode::Char(c));
        }
        handle_key(state, KeyCode::Enter);
    }

    #[test]
    fn saves_typed_hours() {
        let mut state = state_for("0");
        type_text(&mut state, "1.5");
        handle_key(&mut state, KeyCode::Down);
        handle_key(&mut state, KeyCode::Down);
        type_text(&mut state, "2");

        match handle_key(&mut state, KeyCode::Char('s')) {
            Some(LogHoursAction::Save(id, hours)) => {
                assert_eq!(id, 9);
                assert_eq!(hours.design, dec("1.5"));
                assert_eq!(hours.development, dec("0"));
                assert_eq!(hours.testing, dec("2"));
            }
            _ => panic!("expected a save action"),
        }
    }

    #[test]
    fn ignores_letters_and_second_decimal_point() {
        let mut state = state_for("0");
        type_text(&mut state, "1a.2.5");
        assert_eq!(state.design, "1.25");
    }

    #[test]
    fn refuses_to_save_past_the_bound() {
        let mut state = state_for("9999.50");
        type_text(&mut state, "1");

        assert!(handle_key(&mut state, KeyCode::Char('s')).is_none());
        let error = state.error.clone().unwrap();
        assert!(error.contains("9999.99"), "{}", error);

        // any key dismisses the error
        handle_key(&mut state, KeyCode::Char('x'));
        assert!(state.error.is_none());
    }

    #[test]
    fn refuses_three_decimal_places() {
        let mut state = state_for("0");
        type_text(&mut state, "0.125");
        assert!(handle_key(&mut state, KeyCode::Char('s')).is_none());
        assert!(state.error.as_deref().unwrap().contains("decimal places"));
    }

    #[test]
    fn escape_cancels_when_not_editing() {
        let mut state = state_for("0");
        assert!(matches!(handle_key(&mut state, KeyCode::Esc), Some(LogHoursAction::Cancel)));
    }
}
