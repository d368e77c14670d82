//! TUI module: interactive patient record form built on Ratatui.

mod app;
mod styles;
mod ui;

pub use app::App;
pub use styles::MedicalTheme;
pub use ui::form::{FieldInput, FormOutcome, FormState};
