/// Line-oriented user input.
pub trait Prompt {
    /// Shows `question` and returns the raw answer line, or `None` when input
    /// is closed or unreadable.
    fn ask(&mut self, question: &str) -> Option<String>;
}

/// Scripted answers, consumed front to back. Runs out into `None`, the same
/// as a closed stdin.
#[derive(Debug, Clone, Default)]
pub struct ScriptedPrompt {
    answers: std::collections::VecDeque<String>,
    pub asked: Vec<String>,
}

impl ScriptedPrompt {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            asked: Vec::new(),
        }
    }
}

impl Prompt for ScriptedPrompt {
    fn ask(&mut self, question: &str) -> Option<String> {
        self.asked.push(question.to_string());
        self.answers.pop_front()
    }
}
