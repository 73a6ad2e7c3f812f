//! The interactive flow: pick or generate a story, pick a mode, practice.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use kumpel_core::{
    AnswerChecker, CheckMode, Config, LearnerPreferences, Level, LlmBackend, Mode, ModelChoice,
    RetryController, Session, SessionOptions, Story, StoryGenerator, StructuredClient,
    MAX_FREE_TEXT_CHARS,
};
use kumpel_store::{StoryStore, StorySummary};
use tokio::io::AsyncBufRead;

use crate::prompt::{Console, Menu};
use crate::style;
use crate::terminal::TerminalLearner;

/// One interactive run of Kumpel.
pub struct App<'c, R, W> {
    controller: RetryController,
    generator: StoryGenerator,
    store: StoryStore,
    check_mode: CheckMode,
    preview_pause: Duration,
    console: &'c mut Console<R, W>,
}

/// Menu label for a level.
fn level_label(level: Level) -> String {
    match level {
        Level::BelowA1 => "Complete beginner (below A1)".to_string(),
        other => other.to_string(),
    }
}

/// Menu label for a saved story.
fn summary_label(summary: &StorySummary) -> String {
    let mut label = format!("{} ({}", summary.name, summary.level);
    if let Some(topic) = &summary.topic {
        label.push_str(", topic: ");
        label.push_str(topic);
    }
    if let Some(style) = &summary.style {
        label.push_str(", style: ");
        label.push_str(style);
    }
    label.push(')');
    label
}

impl<'c, R, W> App<'c, R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: Write + Send,
{
    /// Wires the app to a backend, a story library and a console.
    pub fn new(
        config: &Config,
        backend: Arc<dyn LlmBackend>,
        store: StoryStore,
        console: &'c mut Console<R, W>,
    ) -> Self {
        let controller = RetryController::new(StructuredClient::new(backend), config.retry_policy());
        Self {
            generator: StoryGenerator::new(controller.clone()),
            controller,
            store,
            check_mode: config.check_mode,
            preview_pause: config.preview_pause(),
            console,
        }
    }

    /// Runs sessions until the learner stops.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        self.console.clear()?;
        self.console.say(style::heading("Welcome to Kumpel!\n"))?;

        loop {
            let (story, model) = self.pick_story().await?;
            let mode = self.pick_mode().await?;
            self.console.pause("\nHit Enter to start.").await?;

            let checker = AnswerChecker::new(self.controller.clone(), model, self.check_mode);
            let mut learner = TerminalLearner::new(&mut *self.console);
            let options = SessionOptions::new(mode, self.preview_pause);
            Session::new(&story, &checker, &mut learner, options)
                .run()
                .await?;

            let again = Menu::yes_no("Do you want to practice another story?")?;
            if !self.console.confirm(&again).await? {
                break;
            }
            self.console.clear()?;
        }

        self.console.say("Goodbye!")?;
        Ok(())
    }

    async fn pick_story(&mut self) -> anyhow::Result<(Story, ModelChoice)> {
        let summaries = self.store.load_all_story_summaries().await?;
        if !summaries.is_empty() {
            let menu = Menu::numbered(
                "What would you like to do?",
                &["Generate a new story", "Practice a saved story"],
            )?;
            if self.console.choose_index(&menu).await? == 1 {
                self.console.clear()?;
                return self.pick_saved(&summaries).await;
            }
            self.console.clear()?;
        }
        self.new_story().await
    }

    async fn pick_saved(&mut self, summaries: &[StorySummary]) -> anyhow::Result<(Story, ModelChoice)> {
        let labels: Vec<String> = summaries.iter().map(summary_label).collect();
        let menu = Menu::numbered("Which story would you like to practice?", &labels)?;
        let index = self.console.choose_index(&menu).await?;
        let summary = summaries
            .get(index)
            .ok_or_else(|| anyhow!("no saved story number {}", index + 1))?;

        let story = self.store.load_story(summary.id).await?;
        let model = summary
            .model
            .as_deref()
            .and_then(|m| m.parse::<ModelChoice>().ok())
            .unwrap_or_default();
        tracing::debug!(id = summary.id, %model, "Loaded saved story");
        Ok((story, model))
    }

    async fn new_story(&mut self) -> anyhow::Result<(Story, ModelChoice)> {
        let preferences = self.ask_preferences().await?;

        self.console.clear()?;
        self.console.say(style::status("Writing your story..."))?;
        let story = self.generator.generate(&preferences).await?;
        self.console.say(format!(
            "Your story: {} ({} sentences)\n",
            style::story_title(&story.story_name),
            story.len()
        ))?;

        let save = Menu::yes_no("Do you want to save this story?")?;
        if self.console.confirm(&save).await? {
            let id = self.store.save_story(&story, &preferences).await?;
            self.console.say(format!("Saved as story #{id}."))?;
        }
        Ok((story, preferences.model))
    }

    async fn ask_preferences(&mut self) -> anyhow::Result<LearnerPreferences> {
        let labels: Vec<String> = Level::ALL.into_iter().map(level_label).collect();
        let index = self
            .console
            .choose_index(&Menu::numbered("What is your level of German?", &labels)?)
            .await?;
        let level = Level::ALL
            .get(index)
            .copied()
            .ok_or_else(|| anyhow!("no level number {}", index + 1))?;
        self.console.clear()?;

        let topic = self
            .ask_optional_text(
                "Are there any particular topics or themes you would like to focus on?",
                "Topic: ",
            )
            .await?;
        self.console.clear()?;

        let style = self
            .ask_optional_text(
                "Would you like the story written in a particular style?",
                "Style: ",
            )
            .await?;
        self.console.clear()?;

        let labels: Vec<String> = ModelChoice::ALL
            .into_iter()
            .map(|m| format!("{m} ({})", m.model_id()))
            .collect();
        let index = self
            .console
            .choose_index(&Menu::numbered("Which model should write the story?", &labels)?)
            .await?;
        let model = ModelChoice::ALL
            .get(index)
            .copied()
            .ok_or_else(|| anyhow!("no model number {}", index + 1))?;

        Ok(LearnerPreferences::new(level, topic, style, model)?)
    }

    /// Asks a yes/no question and, on yes, reads free text.
    async fn ask_optional_text(&mut self, question: &str, prompt: &str) -> anyhow::Result<Option<String>> {
        if !self.console.confirm(&Menu::yes_no(question)?).await? {
            return Ok(None);
        }
        loop {
            let text = self.console.read_line(prompt).await?;
            let text = text.trim();
            if text.is_empty() {
                self.console.say("Please type something.")?;
            } else if text.chars().count() > MAX_FREE_TEXT_CHARS {
                self.console.say(format!(
                    "Please keep it to {MAX_FREE_TEXT_CHARS} characters or fewer."
                ))?;
            } else {
                return Ok(Some(text.to_string()));
            }
        }
    }

    async fn pick_mode(&mut self) -> anyhow::Result<Mode> {
        self.console.clear()?;
        let labels: Vec<String> = Mode::ALL
            .into_iter()
            .map(|m| format!("{m}: {}", m.description()))
            .collect();
        let index = self
            .console
            .choose_index(&Menu::numbered("Choose a mode.", &labels)?)
            .await?;
        Mode::ALL
            .get(index)
            .copied()
            .ok_or_else(|| anyhow!("no mode number {}", index + 1))
    }
}
