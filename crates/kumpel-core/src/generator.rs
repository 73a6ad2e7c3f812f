//! Story generation from learner preferences.

use crate::error::Result;
use crate::llm::StructuredClient;
use crate::preferences::LearnerPreferences;
use crate::retry::RetryController;
use crate::story::Story;

const GENERATION_INSTRUCTION: &str = "You write short stories in German for people learning the \
language. Give the story a short German title in story_name. Split the story into sentences, in \
order. For every sentence give the German text and a natural, faithful English translation. \
Use vocabulary and grammar that suit the learner's level, and keep the story between six and \
twelve sentences long.";

/// Builds the generation prompt for the given preferences.
///
/// The topic and style clauses are only present when the learner supplied
/// them, and then contain the text verbatim.
///
/// # Examples
///
/// ```
/// use kumpel_core::{generation_prompt, LearnerPreferences, Level, ModelChoice};
///
/// let prefs = LearnerPreferences::new(Level::B1, Some("trains".into()), None, ModelChoice::Flash)
///     .unwrap();
/// let prompt = generation_prompt(&prefs);
/// assert!(prompt.contains("level B1"));
/// assert!(prompt.contains("trains"));
/// assert!(!prompt.contains("style"));
/// ```
pub fn generation_prompt(preferences: &LearnerPreferences) -> String {
    let mut prompt = format!(
        "Write a short story in German for a learner at CEFR level {}.",
        preferences.level.description()
    );
    if let Some(topic) = &preferences.topic {
        prompt.push_str(" The story should be about the following topic: ");
        prompt.push_str(topic);
    }
    if let Some(style) = &preferences.style {
        prompt.push_str(" Write the story in the following style: ");
        prompt.push_str(style);
    }
    prompt
}

/// Generates stories through the retry controller.
#[derive(Debug, Clone)]
pub struct StoryGenerator {
    controller: RetryController,
}

impl StoryGenerator {
    /// Creates a generator using the given controller.
    #[must_use]
    pub const fn new(controller: RetryController) -> Self {
        Self { controller }
    }

    /// Generates a validated story for the learner.
    pub async fn generate(&self, preferences: &LearnerPreferences) -> Result<Story> {
        let request = StructuredClient::request_for::<Story>(
            preferences.model.model_id(),
            GENERATION_INSTRUCTION,
            generation_prompt(preferences),
        );

        tracing::info!(
            level = %preferences.level,
            model = %preferences.model,
            "Generating story"
        );
        let story: Story = self.controller.request(&request).await?;
        tracing::info!(
            name = %story.story_name,
            sentences = story.len(),
            "Story generated"
        );

        Ok(story)
    }
}
