//! Prompt construction for the strategist persona.

use dealcraft_core::domain::chat::ChatMessage;
use dealcraft_core::domain::counter_offer::ClientCounterOffer;
use dealcraft_core::domain::project::ProjectDescription;
use dealcraft_core::domain::quote::Quote;
use dealcraft_core::messages::Locale;
use serde::Serialize;

use crate::llm::{LlmPrompt, PromptTurn};

const PERSONA: &str = "You are a senior pricing and negotiation strategist for freelancers and \
small agencies. You price work from its scope, deliverables and risk, and you coach the user \
through client negotiations with concrete, commercially sound advice.";

const OPENING_TURN: &str = "I just received this quote. Help me negotiate it.";

const QUOTE_SCHEMA: &str = r#"{
  "line_items": [{ "description": string, "hours": number | null, "amount": number }],
  "total": number,
  "currency": string,
  "estimated_timeline": string | null,
  "payment_terms": string | null,
  "narrative": string
}"#;

const ANALYSIS_SCHEMA: &str = r#"{
  "recommendation": "accept" | "counter" | "decline",
  "suggested_price": number | null,
  "rationale": string,
  "risks": [string],
  "talking_points": [string]
}"#;

fn language_rule(locale: Locale) -> String {
    format!("Write every human-readable text field in {}.", locale.language_name())
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}

pub fn quote_prompt(description: &ProjectDescription, locale: Locale) -> LlmPrompt {
    let system = format!(
        "{PERSONA}\n\nProduce a priced quote for the project brief you receive. Respond with a \
         single JSON object and nothing else, matching this shape:\n{QUOTE_SCHEMA}\n\
         Amounts are non-negative and expressed in the brief's currency. The total equals the \
         sum of the line items. {}",
        language_rule(locale)
    );
    LlmPrompt::new(system)
        .with_turn(PromptTurn::user(format!("Project brief:\n{}", to_json(description))))
        .expecting_json()
}

pub fn counter_offer_prompt(
    description: &ProjectDescription,
    quote: &Quote,
    offer: &ClientCounterOffer,
    locale: Locale,
) -> LlmPrompt {
    let system = format!(
        "{PERSONA}\n\nThe client answered the quote with a counter-offer. Assess it against the \
         quoted scope and price. Respond with a single JSON object and nothing else, matching \
         this shape:\n{ANALYSIS_SCHEMA}\n{}",
        language_rule(locale)
    );
    LlmPrompt::new(system)
        .with_turn(PromptTurn::user(format!(
            "Project brief:\n{}\n\nQuote:\n{}\n\nClient counter-offer:\n{}",
            to_json(description),
            to_json(quote),
            to_json(offer)
        )))
        .expecting_json()
}

/// Builds a free-text chat prompt. The transcript is replayed turn by turn so
/// the latest user message is always the final turn. Some providers reject a
/// conversation that opens with an assistant turn, so an opening user turn
/// precedes the greeting.
pub fn chat_prompt(
    description: &ProjectDescription,
    quote: &Quote,
    transcript: &[ChatMessage],
    locale: Locale,
) -> LlmPrompt {
    let system = format!(
        "{PERSONA}\n\nYou are advising on this project and quote. Answer conversationally and \
         concisely in plain text. {}\n\nProject brief:\n{}\n\nQuote:\n{}",
        language_rule(locale),
        to_json(description),
        to_json(quote)
    );
    let opening = LlmPrompt::new(system).with_turn(PromptTurn::user(OPENING_TURN));
    transcript.iter().fold(opening, |prompt, message| {
        let turn = match message {
            ChatMessage::User { text } => PromptTurn::user(text.clone()),
            ChatMessage::Assistant { text } => PromptTurn::assistant(text.clone()),
        };
        prompt.with_turn(turn)
    })
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use dealcraft_core::domain::chat::ChatMessage;
    use dealcraft_core::domain::counter_offer::ClientCounterOffer;
    use dealcraft_core::domain::project::ProjectDescription;
    use dealcraft_core::domain::quote::{Quote, QuoteId, QuoteLineItem};
    use dealcraft_core::messages::Locale;
    use rust_decimal::Decimal;

    use super::{chat_prompt, counter_offer_prompt, quote_prompt};
    use crate::llm::PromptRole;

    fn quote() -> Quote {
        Quote {
            id: QuoteId("Q-test".to_string()),
            line_items: vec![QuoteLineItem {
                description: "Build".to_string(),
                hours: None,
                amount: Decimal::new(1_000, 0),
            }],
            total: Decimal::new(1_000, 0),
            currency: "USD".to_string(),
            estimated_timeline: None,
            payment_terms: None,
            narrative: "Single build phase.".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn quote_prompt_carries_brief_and_requests_json() {
        let prompt = quote_prompt(&ProjectDescription::new("landing page"), Locale::English);

        assert!(prompt.expect_json);
        assert!(prompt.system.contains("\"line_items\""));
        assert_eq!(prompt.turns.len(), 1);
        assert!(prompt.turns[0].content.contains("landing page"));
    }

    #[test]
    fn prompts_follow_locale() {
        let prompt = counter_offer_prompt(
            &ProjectDescription::new("site"),
            &quote(),
            &ClientCounterOffer::new(Decimal::new(700, 0)),
            Locale::BrazilianPortuguese,
        );

        assert!(prompt.system.contains("Brazilian Portuguese"));
        assert!(prompt.turns[0].content.contains("700"));
    }

    #[test]
    fn chat_prompt_replays_transcript_in_order() {
        let transcript = vec![
            ChatMessage::assistant("Quote generated."),
            ChatMessage::user("Is the price firm?"),
        ];

        let prompt =
            chat_prompt(&ProjectDescription::new("site"), &quote(), &transcript, Locale::English);

        assert!(!prompt.expect_json);
        assert!(prompt.system.contains("Single build phase."));
        let roles: Vec<PromptRole> = prompt.turns.iter().map(|turn| turn.role).collect();
        assert_eq!(roles, vec![PromptRole::User, PromptRole::Assistant, PromptRole::User]);
        assert_eq!(prompt.turns[2].content, "Is the price firm?");
    }
}
