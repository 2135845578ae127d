//! System prompts and message builders for the LLM-backed collaborators

use crate::domain::ResponderId;

pub(crate) const CLASSIFIER_PROMPT: &str = "\
You sort user questions into exactly one category.
Categories: weather, sports, news, stocks, health.
Reply with the single category word and nothing else. \
If no category fits, reply with: news";

pub(crate) const JUDGE_PROMPT: &str = "\
You check whether an expert's answer fully covers a user's question.
If it does, reply with the single word: complete
If a different expert is needed for a part that is still missing, reply with that expert's id only.
Expert ids: weather, sports, news, stocks, health.
Never suggest an expert that was already consulted. Do not explain your reply.";

pub(crate) const SYNTHESIS_PROMPT: &str = "\
You merge answers from several experts into one reply to the user's question.
Where experts contradict each other, say so and state which answer is better supported.
Do not repeat the same fact twice. Write in one voice, without naming the experts.";

/// System prompt for one domain responder
pub(crate) fn responder_prompt(id: ResponderId) -> &'static str {
    match id {
        ResponderId::Weather => "\
You answer questions about weather conditions and forecasts.
Be precise about place and time, and explain weather terms in plain language.",
        ResponderId::Sports => "\
You answer questions about sports: teams, athletes, fixtures, results and statistics.
Separate recent results from historical background.",
        ResponderId::News => "\
You answer questions about current events.
Keep to facts, give context, and present contested stories from more than one side.",
        ResponderId::Stocks => "\
You answer questions about stock markets, prices and companies.
Be exact with numbers and dates.
End every answer with a short note that it is not investment advice.",
        ResponderId::Health => "\
You answer questions about health and wellness with evidence-based information.
End every answer with a short note that it is not medical advice and that a healthcare professional should be consulted for personal concerns.",
    }
}

pub(crate) fn judge_message(
    query: &str,
    current: ResponderId,
    answer: &str,
    consulted: &[ResponderId],
) -> String {
    let consulted = consulted
        .iter()
        .map(ResponderId::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "Question: {query}\n\nAnswer from the {current} expert:\n{answer}\n\nAlready consulted: {consulted}"
    )
}

pub(crate) fn synthesis_message(query: &str, answers: &[(ResponderId, String)]) -> String {
    let mut text = format!("Question: {query}\n");
    for (id, answer) in answers {
        text.push_str(&format!("\n[{} expert]\n{}\n", id.label(), answer));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disclaimer_instructions() {
        assert!(responder_prompt(ResponderId::Health).contains("not medical advice"));
        assert!(responder_prompt(ResponderId::Stocks).contains("not investment advice"));
        assert!(!responder_prompt(ResponderId::Weather).contains("advice"));
    }

    #[test]
    fn test_synthesis_message_keeps_order() {
        let text = synthesis_message(
            "q",
            &[
                (ResponderId::Weather, "rain".to_string()),
                (ResponderId::Sports, "postponed".to_string()),
            ],
        );
        let weather = text.find("[Weather expert]").unwrap();
        let sports = text.find("[Sports expert]").unwrap();
        assert!(weather < sports);
    }
}
