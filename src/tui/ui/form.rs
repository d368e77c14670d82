//! Patient record entry form.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use serde_json::{Map, Value};

use crate::application::PredictionService;
use crate::domain::{Attribute, EncodingTable, PipelineError, Prediction, RawRecord};
use crate::ports::{Model, Scaler};
use crate::tui::styles::MedicalTheme;

/// Editable content of one field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldInput {
    /// Free text, restricted to characters that can form a number.
    Numeric(String),
    /// One of the encoding table's labels for the attribute.
    Choice {
        options: Vec<String>,
        selected: usize,
    },
}

#[derive(Debug, Clone)]
pub struct FormField {
    pub attribute: Attribute,
    pub hint: &'static str,
    pub input: FieldInput,
}

impl FormField {
    fn display_value(&self) -> Option<&str> {
        match &self.input {
            FieldInput::Numeric(text) if text.is_empty() => None,
            FieldInput::Numeric(text) => Some(text.as_str()),
            FieldInput::Choice { options, selected } => options.get(*selected).map(String::as_str),
        }
    }
}

/// Result of the last submit.
#[derive(Debug, Clone, PartialEq)]
pub enum FormOutcome {
    Prediction(Prediction),
    Error(String),
}

fn hint_for(attribute: Attribute) -> &'static str {
    match attribute {
        Attribute::Age => "years",
        Attribute::SaltIntake => "g/day",
        Attribute::StressScore => "score 0-10",
        Attribute::SleepDuration => "hours/night",
        Attribute::Bmi => "kg/m²",
        _ => "←/→ to choose",
    }
}

const SAMPLE: [(Attribute, &str); 10] = [
    (Attribute::Age, "45"),
    (Attribute::SaltIntake, "8.0"),
    (Attribute::StressScore, "5"),
    (Attribute::BpHistory, "Normal"),
    (Attribute::SleepDuration, "7.0"),
    (Attribute::Bmi, "25.0"),
    (Attribute::Medication, "No"),
    (Attribute::FamilyHistory, "No"),
    (Attribute::ExerciseLevel, "Moderate"),
    (Attribute::SmokingStatus, "Non-Smoker"),
];

pub struct FormState {
    pub fields: Vec<FormField>,
    pub selected_field: usize,
    pub outcome: Option<FormOutcome>,
}

impl FormState {
    /// Build one field per attribute; choices come from `table`.
    #[must_use]
    pub fn new(table: &EncodingTable) -> Self {
        let fields = Attribute::ALL
            .into_iter()
            .map(|attribute| {
                let input = if attribute.is_categorical() {
                    FieldInput::Choice {
                        options: table.categories(attribute).to_vec(),
                        selected: 0,
                    }
                } else {
                    FieldInput::Numeric(String::new())
                };
                FormField {
                    attribute,
                    hint: hint_for(attribute),
                    input,
                }
            })
            .collect();

        Self {
            fields,
            selected_field: 0,
            outcome: None,
        }
    }

    pub fn next_field(&mut self) {
        self.selected_field = (self.selected_field + 1) % self.fields.len();
    }

    pub fn prev_field(&mut self) {
        if self.selected_field == 0 {
            self.selected_field = self.fields.len() - 1;
        } else {
            self.selected_field -= 1;
        }
    }

    fn current(&mut self) -> &mut FieldInput {
        &mut self.fields[self.selected_field].input
    }

    /// Append a character to the current numeric field.
    pub fn input_char(&mut self, c: char) {
        if !(c.is_ascii_digit() || c == '.' || c == '-') {
            return;
        }
        if let FieldInput::Numeric(text) = self.current() {
            text.push(c);
        }
    }

    pub fn delete_char(&mut self) {
        if let FieldInput::Numeric(text) = self.current() {
            text.pop();
        }
    }

    pub fn clear_field(&mut self) {
        if let FieldInput::Numeric(text) = self.current() {
            text.clear();
        }
    }

    /// Step the current choice field forward (`forward`) or back, wrapping.
    pub fn cycle_choice(&mut self, forward: bool) {
        if let FieldInput::Choice { options, selected } = self.current() {
            let len = options.len();
            if len == 0 {
                return;
            }
            *selected = if forward {
                (*selected + 1) % len
            } else {
                (*selected + len - 1) % len
            };
        }
    }

    /// Fill every field with a typical record.
    pub fn load_sample_data(&mut self) {
        for (attribute, value) in SAMPLE {
            let Some(field) = self.fields.iter_mut().find(|f| f.attribute == attribute) else {
                continue;
            };
            match &mut field.input {
                FieldInput::Numeric(text) => *text = value.to_string(),
                FieldInput::Choice { options, selected } => {
                    if let Some(pos) = options.iter().position(|o| o == value) {
                        *selected = pos;
                    }
                }
            }
        }
    }

    /// Assemble the current inputs into a record.
    ///
    /// # Errors
    /// Returns `PipelineError::Validation` naming the first numeric field that
    /// is empty or not a number.
    pub fn to_raw_record(&self) -> Result<RawRecord, PipelineError> {
        let mut object = Map::with_capacity(self.fields.len());

        for field in &self.fields {
            let name = field.attribute.name();
            let value = match &field.input {
                FieldInput::Numeric(text) => {
                    let text = text.trim();
                    if text.is_empty() {
                        return Err(PipelineError::validation(format!(
                            "{name}: a value is required"
                        )));
                    }
                    let number: f64 = text.parse().map_err(|_| {
                        PipelineError::validation(format!("{name}: {text:?} is not a number"))
                    })?;
                    Value::from(number)
                }
                FieldInput::Choice { options, selected } => {
                    let label = options.get(*selected).ok_or_else(|| {
                        PipelineError::validation(format!("{name}: no value selected"))
                    })?;
                    Value::from(label.as_str())
                }
            };
            object.insert(name.to_string(), value);
        }

        RawRecord::from_value(Value::Object(object))
    }

    /// Run the current inputs through `service` and store the outcome.
    pub fn submit<M, S>(&mut self, service: &PredictionService<M, S>)
    where
        M: Model,
        S: Scaler,
    {
        let result = self
            .to_raw_record()
            .and_then(|record| service.predict(&record));

        self.outcome = Some(match result {
            Ok(prediction) => {
                tracing::info!(encoded = prediction.encoded, "Form prediction complete");
                FormOutcome::Prediction(prediction)
            }
            Err(e) => {
                tracing::warn!(kind = %e.kind(), "Form submission rejected: {e}");
                FormOutcome::Error(e.to_string())
            }
        });
    }
}

/// Render the form, its result panel and the key hints.
pub fn render_form(f: &mut Frame, area: Rect, state: &FormState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Fields
            Constraint::Length(4), // Result
            Constraint::Length(2), // Key hints
        ])
        .split(area);

    render_form_header(f, chunks[0]);
    render_form_fields(f, chunks[1], state);
    render_result(f, chunks[2], state);
    render_key_hints(f, chunks[3]);
}

fn render_form_header(f: &mut Frame, area: Rect) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(" ", MedicalTheme::text()),
        Span::styled("Hypertension Risk", MedicalTheme::title()),
        Span::styled(" │ Patient Record", MedicalTheme::text_secondary()),
    ]))
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(header, area);
}

fn render_form_fields(f: &mut Frame, area: Rect, state: &FormState) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .margin(1)
        .split(area);

    let mid = state.fields.len().div_ceil(2);

    render_field_column(f, columns[0], &state.fields[..mid], 0, state.selected_field);
    render_field_column(
        f,
        columns[1],
        &state.fields[mid..],
        mid,
        state.selected_field,
    );
}

fn render_field_column(
    f: &mut Frame,
    area: Rect,
    fields: &[FormField],
    offset: usize,
    selected: usize,
) {
    let constraints: Vec<Constraint> = fields
        .iter()
        .map(|_| Constraint::Length(3))
        .chain(std::iter::once(Constraint::Min(0)))
        .collect();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    for (i, field) in fields.iter().enumerate() {
        let is_selected = offset + i == selected;
        let (border_style, title_style) = if is_selected {
            (MedicalTheme::border_focused(), MedicalTheme::focused())
        } else {
            (MedicalTheme::border(), MedicalTheme::text_secondary())
        };

        let block = Block::default()
            .title(Span::styled(format!(" {} ", field.attribute), title_style))
            .borders(Borders::ALL)
            .border_style(border_style);

        let mut spans = vec![Span::raw(" ")];
        match (&field.input, field.display_value()) {
            (FieldInput::Choice { .. }, Some(label)) => {
                spans.push(Span::styled(format!("‹ {label} ›"), MedicalTheme::text()));
            }
            (_, Some(value)) => spans.push(Span::styled(value, MedicalTheme::text())),
            (_, None) => spans.push(Span::styled(field.hint, MedicalTheme::text_muted())),
        }
        if is_selected && matches!(field.input, FieldInput::Numeric(_)) {
            spans.push(Span::styled("▌", MedicalTheme::cursor()));
        }

        f.render_widget(Paragraph::new(Line::from(spans)).block(block), chunks[i]);
    }
}

fn render_result(f: &mut Frame, area: Rect, state: &FormState) {
    let content = match &state.outcome {
        Some(FormOutcome::Prediction(prediction)) => Line::from(vec![
            Span::styled(" Prediction: ", MedicalTheme::text_secondary()),
            Span::styled(
                prediction.label.clone(),
                MedicalTheme::outcome(prediction.encoded),
            ),
            Span::styled(
                format!("  (class {})", prediction.encoded),
                MedicalTheme::text_muted(),
            ),
        ]),
        Some(FormOutcome::Error(message)) => Line::from(vec![
            Span::styled(" ! ", MedicalTheme::danger()),
            Span::styled(message.clone(), MedicalTheme::danger()),
        ]),
        None => Line::from(Span::styled(
            " Fill in the record and press Enter",
            MedicalTheme::text_muted(),
        )),
    };

    let panel = Paragraph::new(content)
        .block(
            Block::default()
                .title(Span::styled(" Result ", MedicalTheme::text_secondary()))
                .borders(Borders::ALL)
                .border_style(MedicalTheme::border()),
        )
        .wrap(Wrap { trim: true });

    f.render_widget(panel, area);
}

fn render_key_hints(f: &mut Frame, area: Rect) {
    let hints = Line::from(vec![
        Span::styled("[↑↓] ", MedicalTheme::key_hint()),
        Span::styled("Navigate ", MedicalTheme::key_desc()),
        Span::styled("[←→] ", MedicalTheme::key_hint()),
        Span::styled("Choose ", MedicalTheme::key_desc()),
        Span::styled("[Enter] ", MedicalTheme::key_hint()),
        Span::styled("Predict ", MedicalTheme::key_desc()),
        Span::styled("[S] ", MedicalTheme::key_hint()),
        Span::styled("Sample ", MedicalTheme::key_desc()),
        Span::styled("[Del] ", MedicalTheme::key_hint()),
        Span::styled("Clear ", MedicalTheme::key_desc()),
        Span::styled("[Esc] ", MedicalTheme::key_hint()),
        Span::styled("Quit", MedicalTheme::key_desc()),
    ]);

    let footer = Paragraph::new(hints).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(footer, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::pipeline::tests::stub_service;
    use crate::domain::encoding::tests::scenario_table;
    use crate::domain::ErrorKind;
    use ratatui::{backend::TestBackend, Terminal};

    fn field_mut(state: &mut FormState, attribute: Attribute) -> &mut FormField {
        state
            .fields
            .iter_mut()
            .find(|f| f.attribute == attribute)
            .expect("field exists")
    }

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_fields_follow_schema_and_table() {
        let state = FormState::new(&scenario_table());
        assert_eq!(state.fields.len(), 10);
        assert_eq!(state.fields[3].attribute, Attribute::BpHistory);
        assert_eq!(
            state.fields[3].input,
            FieldInput::Choice {
                options: vec!["Normal".into(), "Borderline".into(), "High".into()],
                selected: 0,
            }
        );
        assert_eq!(state.fields[5].input, FieldInput::Numeric(String::new()));
    }

    #[test]
    fn test_input_filtering_and_navigation() {
        let mut state = FormState::new(&scenario_table());
        for c in "4a5.x".chars() {
            state.input_char(c);
        }
        assert_eq!(state.fields[0].display_value(), Some("45."));
        state.delete_char();
        assert_eq!(state.fields[0].display_value(), Some("45"));

        state.prev_field();
        assert_eq!(state.selected_field, 9);
        state.cycle_choice(false);
        assert_eq!(state.fields[9].display_value(), Some("Smoker"));
        state.cycle_choice(true);
        assert_eq!(state.fields[9].display_value(), Some("Non-Smoker"));

        // Typing into a choice field changes nothing.
        state.input_char('1');
        assert_eq!(state.fields[9].display_value(), Some("Non-Smoker"));
    }

    #[test]
    fn test_sample_data_builds_scenario_record() {
        let mut state = FormState::new(&scenario_table());
        state.load_sample_data();
        let record = state.to_raw_record().expect("complete record");
        assert_eq!(record.bmi, 25.0);
        assert_eq!(record.exercise_level, "Moderate");
    }

    #[test]
    fn test_missing_bmi_shows_error_without_prediction() {
        let service = stub_service(1);
        let mut state = FormState::new(service.table());
        state.load_sample_data();
        field_mut(&mut state, Attribute::Bmi).input = FieldInput::Numeric(String::new());

        let err = state.to_raw_record().expect_err("BMI missing");
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.to_string().contains("BMI"));

        state.submit(&service);
        match &state.outcome {
            Some(FormOutcome::Error(message)) => assert!(message.contains("BMI")),
            other => panic!("expected inline error, got {other:?}"),
        }
        assert!(service.model().seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_unparsable_number_is_rejected() {
        let mut state = FormState::new(&scenario_table());
        state.load_sample_data();
        field_mut(&mut state, Attribute::Age).input = FieldInput::Numeric("4-5".into());
        let err = state.to_raw_record().expect_err("not a number");
        assert!(err.to_string().contains("Age"));
    }

    #[test]
    fn test_submit_stores_prediction() {
        let service = stub_service(1);
        let mut state = FormState::new(service.table());
        state.load_sample_data();
        state.submit(&service);
        assert_eq!(
            state.outcome,
            Some(FormOutcome::Prediction(Prediction::new("Yes", 1)))
        );
    }

    #[test]
    fn test_render_shows_prediction() {
        let service = stub_service(1);
        let mut state = FormState::new(service.table());
        state.load_sample_data();
        state.submit(&service);

        let mut terminal = Terminal::new(TestBackend::new(100, 30)).expect("terminal");
        terminal
            .draw(|f| render_form(f, f.area(), &state))
            .expect("draw");

        let text = screen_text(&terminal);
        assert!(text.contains("Prediction: Yes"));
        assert!(text.contains("(class 1)"));
        assert!(text.contains("Smoking_Status"));
    }

    #[test]
    fn test_render_shows_inline_error() {
        let service = stub_service(0);
        let mut state = FormState::new(service.table());
        state.submit(&service);

        let mut terminal = Terminal::new(TestBackend::new(100, 30)).expect("terminal");
        terminal
            .draw(|f| render_form(f, f.area(), &state))
            .expect("draw");

        let text = screen_text(&terminal);
        assert!(text.contains("Age: a value is required"));
        assert!(!text.contains("Prediction:"));
    }
}
