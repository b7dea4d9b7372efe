//! Widgets composing the chat screen.

mod feedback_modal;
mod help;
mod input_bar;
mod status_bar;
mod text_input;
mod transcript;

pub use feedback_modal::FeedbackOverlay;
pub use help::HelpOverlay;
pub use input_bar::{input_height, InputBar};
pub use status_bar::{KeyHint, StatusBar};
pub use text_input::TextInputState;
pub use transcript::{Transcript, TranscriptState};
