//! The interactive learner: renders session events and reads answers.

use std::io::Write;

use async_trait::async_trait;
use kumpel_core::{Learner, LengthVerdict, Phase, Result, SessionContext, SessionEvent};
use tokio::io::AsyncBufRead;

use crate::prompt::Console;
use crate::style;

/// A learner at the terminal.
pub struct TerminalLearner<'c, R, W> {
    console: &'c mut Console<R, W>,
}

impl<'c, R, W> TerminalLearner<'c, R, W> {
    /// Wraps a console.
    pub fn new(console: &'c mut Console<R, W>) -> Self {
        Self { console }
    }
}

/// Progress header shown at the start of each sentence phase.
pub fn render_header(context: &SessionContext, index: usize, phase: Phase) -> String {
    let mut lines = vec![
        format!(
            "{} | {} mode | sentence {}/{} ({phase})",
            style::header_title(&context.story_name),
            context.mode,
            index + 1,
            context.total
        ),
        String::new(),
        format!("Done     ({}/{}):", context.completed.len(), context.total),
    ];
    lines.extend(
        context
            .completed
            .iter()
            .map(|german| format!("  {}", style::done(german))),
    );
    lines.push(String::new());
    lines.push(format!(
        "Mistakes ({}/{}):",
        context.mistakes.len(),
        context.total
    ));
    lines.extend(
        context
            .mistakes
            .iter()
            .map(|german| format!("  {}", style::mistake(german))),
    );
    lines.push(String::new());
    lines.join("\n")
}

/// Formats a duration as minutes and seconds.
pub fn format_elapsed(elapsed: chrono::Duration) -> String {
    let seconds = elapsed.num_seconds().max(0);
    format!("{}m {:02}s", seconds / 60, seconds % 60)
}

fn length_hint(verdict: LengthVerdict) -> Option<String> {
    match verdict {
        LengthVerdict::Plausible => None,
        LengthVerdict::TooShort { actual, expected } => Some(format!(
            "That answer looks too short ({actual} words, the translation has {expected}). Try again."
        )),
        LengthVerdict::TooLong { actual, expected } => Some(format!(
            "That answer looks too long ({actual} words, the translation has {expected}). Try again."
        )),
    }
}

#[async_trait]
impl<R, W> Learner for TerminalLearner<'_, R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: Write + Send,
{
    async fn notify(&mut self, event: SessionEvent<'_>) -> Result<()> {
        match event {
            SessionEvent::Header {
                context,
                index,
                phase,
            } => {
                self.console.clear()?;
                self.console.say(render_header(context, index, phase))?;
            }
            SessionEvent::Sentence { german } => {
                self.console.say(format!("{}\n", style::german(german)))?;
            }
            SessionEvent::Pause(duration) => {
                if !duration.is_zero() {
                    tokio::time::sleep(duration).await;
                }
            }
            SessionEvent::Reveal { english } => {
                self.console
                    .say(format!("{}\n", style::translation(english)))?;
            }
            SessionEvent::LengthRejected(verdict) => {
                if let Some(hint) = length_hint(verdict) {
                    self.console.say(style::hint(&hint))?;
                }
            }
            SessionEvent::Correct => {
                self.console.say(style::success("Correct!"))?;
                self.console.pause("\nHit Enter to continue.").await?;
            }
            SessionEvent::Incorrect { feedback } => {
                self.console.say(style::failure("Incorrect."))?;
                if let Some(feedback) = feedback {
                    self.console.say(style::feedback(feedback))?;
                }
                self.console.say("")?;
            }
            SessionEvent::Finished { context } => {
                self.console.clear()?;
                self.console.say(style::success(&format!(
                    "Congratulations! You completed \"{}\".",
                    context.story_name
                )))?;
                if !context.mistakes.is_empty() {
                    self.console.say(format!(
                        "\nSentences to review ({}):",
                        context.mistakes.len()
                    ))?;
                    for german in &context.mistakes {
                        self.console.say(format!("  {}", style::mistake(german)))?;
                    }
                }
                self.console.say(format!(
                    "\nLearning time: {}.\n",
                    format_elapsed(context.elapsed())
                ))?;
            }
        }
        Ok(())
    }

    async fn answer(&mut self, phase: Phase) -> Result<String> {
        let prompt = match phase {
            Phase::Preview => "Type the translation: ",
            Phase::Recall => "Your answer: ",
        };
        self.console.read_line(prompt).await
    }
}
