//! Colors for each kind of terminal text.

use colored::{ColoredString, Colorize};

/// Banner and status headings.
pub fn heading(text: &str) -> ColoredString {
    text.cyan().bold()
}

/// Title of a story that was just written.
pub fn story_title(text: &str) -> ColoredString {
    text.cyan().underline()
}

/// Title of the story in the progress header.
pub fn header_title(text: &str) -> ColoredString {
    text.blue().bold()
}

/// Work in progress, such as waiting on the model.
pub fn status(text: &str) -> ColoredString {
    text.blue().italic()
}

/// The German sentence to translate.
pub fn german(text: &str) -> ColoredString {
    text.cyan().bold()
}

/// A completed sentence in the progress list.
pub fn done(text: &str) -> ColoredString {
    text.cyan()
}

/// A sentence that needed more than one try.
pub fn mistake(text: &str) -> ColoredString {
    text.red()
}

/// The revealed English translation.
pub fn translation(text: &str) -> ColoredString {
    text.yellow().italic()
}

/// A nudge that is not a verdict.
pub fn hint(text: &str) -> ColoredString {
    text.yellow()
}

/// Accepted answers and finished stories.
pub fn success(text: &str) -> ColoredString {
    text.green().bold()
}

/// Rejected answers.
pub fn failure(text: &str) -> ColoredString {
    text.red().bold()
}

/// Grading advice.
pub fn feedback(text: &str) -> ColoredString {
    text.magenta().italic()
}
