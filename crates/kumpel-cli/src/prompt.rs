//! Line-based terminal prompts.

use std::io::Write;

use console::Term;
use kumpel_core::{KumpelError, Result};
use regex::Regex;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};

/// A question whose answer must match a pattern.
#[derive(Debug, Clone)]
pub struct Menu {
    message: String,
    pattern: Regex,
    invalid_message: String,
}

impl Menu {
    /// Creates a menu. `pattern` must match the whole answer.
    pub fn new(
        message: impl Into<String>,
        pattern: &str,
        invalid_message: impl Into<String>,
    ) -> std::result::Result<Self, regex::Error> {
        Ok(Self {
            message: message.into(),
            pattern: Regex::new(pattern)?,
            invalid_message: invalid_message.into(),
        })
    }

    /// A numbered list of `options`, answered with the option's number.
    pub fn numbered<S: AsRef<str>>(
        title: &str,
        options: &[S],
    ) -> std::result::Result<Self, regex::Error> {
        let mut message = format!("{title}\n");
        for (i, option) in options.iter().enumerate() {
            message.push_str(&format!("\n{}. {}", i + 1, option.as_ref()));
        }
        message.push_str("\n\nRespond with the number for your selection.");

        let numbers: Vec<String> = (1..=options.len()).map(|n| n.to_string()).collect();
        let pattern = format!("^(?:{})$", numbers.join("|"));
        let invalid = format!("Answer must be a number from 1 to {}.", options.len());
        Self::new(message, &pattern, invalid)
    }

    /// A yes/no question.
    pub fn yes_no(question: &str) -> std::result::Result<Self, regex::Error> {
        Self::new(
            format!("{question} (y/n)"),
            "^(?i:y|n|yes|no)$",
            "Respond with y for yes or n for no.",
        )
    }

    /// Returns `true` if `answer` is acceptable.
    pub fn accepts(&self, answer: &str) -> bool {
        self.pattern.is_match(answer)
    }
}

/// Terminal input and output.
pub struct Console<R, W> {
    lines: Lines<R>,
    out: W,
    /// Set when `out` is the real terminal; screen control goes through it.
    term: Option<Term>,
}

/// Console over the process's standard streams.
pub type StdConsole = Console<BufReader<Stdin>, std::io::Stdout>;

impl StdConsole {
    /// Console reading stdin and writing stdout.
    pub fn stdio() -> Self {
        let mut console = Self::new(BufReader::new(tokio::io::stdin()), std::io::stdout());
        console.term = Some(Term::stdout());
        console
    }
}

impl<R, W> Console<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: Write + Send,
{
    /// Creates a console from a reader and a writer.
    pub fn new(reader: R, out: W) -> Self {
        Self {
            lines: reader.lines(),
            out,
            term: None,
        }
    }

    /// Prints a line.
    pub fn say(&mut self, text: impl std::fmt::Display) -> Result<()> {
        writeln!(self.out, "{text}")?;
        self.out.flush()?;
        Ok(())
    }

    /// Clears the screen. Does nothing unless writing to a terminal.
    pub fn clear(&mut self) -> Result<()> {
        self.out.flush()?;
        if let Some(term) = &self.term {
            term.clear_screen()?;
        }
        Ok(())
    }

    /// Shows `prompt` and reads one line without its line ending.
    ///
    /// Returns `KumpelError::InputClosed` at end of input.
    pub async fn read_line(&mut self, prompt: &str) -> Result<String> {
        write!(self.out, "{prompt}")?;
        self.out.flush()?;
        self.lines
            .next_line()
            .await?
            .ok_or(KumpelError::InputClosed)
    }

    /// Asks `menu` until the answer is accepted, and returns it trimmed.
    pub async fn choose(&mut self, menu: &Menu) -> Result<String> {
        self.say(format!("{}\n", menu.message))?;
        loop {
            let answer = self.read_line("Your answer: ").await?;
            let answer = answer.trim();
            if menu.accepts(answer) {
                return Ok(answer.to_string());
            }
            self.say(&menu.invalid_message)?;
        }
    }

    /// Asks a numbered menu and returns the zero-based index chosen.
    pub async fn choose_index(&mut self, menu: &Menu) -> Result<usize> {
        let answer = self.choose(menu).await?;
        answer
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .ok_or_else(|| KumpelError::invalid_preference(format!("'{answer}' is not a menu number")))
    }

    /// Asks a yes/no question.
    pub async fn confirm(&mut self, menu: &Menu) -> Result<bool> {
        let answer = self.choose(menu).await?;
        Ok(answer.to_ascii_lowercase().starts_with('y'))
    }

    /// Waits for Enter.
    pub async fn pause(&mut self, prompt: &str) -> Result<()> {
        self.read_line(prompt).await.map(|_| ())
    }

    /// The underlying writer.
    #[cfg(test)]
    pub fn output(&self) -> &W {
        &self.out
    }
}
