//! Instruction prompts per caption language.

/// Prompts used to summarize a transcript in one language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptSet {
    pub language: &'static str,
    /// Map instruction for a full summary
    pub summary: &'static str,
    /// Reduce instruction that merges and renumbers partial summaries
    pub renumber: &'static str,
    /// Map instruction for a targeted question, `{topic}` is substituted
    clarify_template: &'static str,
    /// Cost annotation line, `{cost}` is substituted
    cost_template: &'static str,
}

impl PromptSet {
    pub const RUSSIAN: PromptSet = PromptSet {
        language: "ru",
        summary: "Это расшифровка видео в формате SRT. Выпиши основные тезисы текста и укажи для каждого временную метку, где он начинается.",
        renumber: "Пронумеруй все тезисы заново по порядку.",
        clarify_template: "Это расшифровка видео в формате SRT. Найди, что в нём говорится про \"{topic}\", и перескажи это с временными метками. Если об этом ничего нет, напиши 'NOT_FOUND'.",
        cost_template: "С вас {cost} руб.",
    };

    pub const ENGLISH: PromptSet = PromptSet {
        language: "en",
        summary: "This is a video transcript in SRT format. List the main points of the text and give the timestamp where each point starts.",
        renumber: "Number all points again in order.",
        clarify_template: "This is a video transcript in SRT format. Show the timestamps where it talks about \"{topic}\". If the video says nothing about it, write 'NOT_FOUND'.",
        cost_template: "Cost: {cost} RUB",
    };

    /// Prompts for `language`, English for anything unknown.
    pub fn for_language(language: &str) -> &'static PromptSet {
        match language {
            "ru" => &Self::RUSSIAN,
            _ => &Self::ENGLISH,
        }
    }

    pub fn clarify(&self, topic: &str) -> String {
        self.clarify_template.replace("{topic}", topic.trim())
    }

    pub fn cost_line(&self, cost: u64) -> String {
        self.cost_template.replace("{cost}", &cost.to_string())
    }
}
