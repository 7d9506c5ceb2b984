use recap_core::RecapError;

/// What the user is told for each failure.
pub fn describe(err: &RecapError) -> String {
    match err {
        RecapError::Encoding(detail) => format!("Could not decode the text: {detail}"),
        RecapError::InvalidBudget {
            max_tokens,
            prompt_tokens,
        } => format!(
            "The {prompt_tokens}-token prompt leaves no room for content in a {max_tokens}-token budget"
        ),
        RecapError::BudgetExceeded { cost, limit } => {
            format!("Too expensive: {cost} RUB is above the {limit} RUB limit")
        }
        RecapError::UnknownModel(model) => format!("No price is configured for model {model}"),
        RecapError::Backend(detail) => format!("The model backend failed: {detail}"),
        RecapError::ConversationTooLong { tokens, .. } => format!(
            "The conversation is too long ({tokens} tokens). Start a new thread with /new"
        ),
        RecapError::AlreadyProcessed { .. } => {
            "This video was already summarized in this chat. Ask about it with --clarify".to_string()
        }
        RecapError::NoContent(detail) => format!("Nothing to summarize: {detail}"),
        RecapError::InvalidSource(detail) => format!("Not a YouTube link: {detail}"),
        RecapError::AccessDenied { .. } => "You are not allowed to use this bot".to_string(),
    }
}
