use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Locale {
    #[default]
    #[serde(rename = "en")]
    English,
    #[serde(rename = "pt-BR")]
    BrazilianPortuguese,
}

impl Locale {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::English => "en",
            Self::BrazilianPortuguese => "pt-BR",
        }
    }

    /// Language name used when instructing the strategist.
    pub fn language_name(&self) -> &'static str {
        match self {
            Self::English => "English",
            Self::BrazilianPortuguese => "Brazilian Portuguese",
        }
    }
}

impl std::str::FromStr for Locale {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "en" | "en-us" | "english" => Ok(Self::English),
            "pt" | "pt-br" | "pt_br" => Ok(Self::BrazilianPortuguese),
            other => Err(format!("unsupported locale `{other}` (expected en|pt-BR)")),
        }
    }
}

/// Fixed user-facing strings. Collaborator error detail never reaches these.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionMessages {
    pub quote_greeting: String,
    pub quote_failed: String,
    pub analysis_failed: String,
    pub chat_apology: String,
}

impl SessionMessages {
    pub fn for_locale(locale: Locale) -> Self {
        match locale {
            Locale::English => Self {
                quote_greeting: "Quote generated. I'm ready to discuss your negotiation strategy. Ask me anything."
                    .to_string(),
                quote_failed: "An error occurred while generating the quote. Please try again."
                    .to_string(),
                analysis_failed:
                    "An error occurred while analyzing the counter-offer. Please try again."
                        .to_string(),
                chat_apology: "Sorry, I couldn't process your question. Please try again."
                    .to_string(),
            },
            Locale::BrazilianPortuguese => Self {
                quote_greeting: "Orçamento gerado. Estou à disposição para discutir a estratégia de negociação. Faça sua pergunta."
                    .to_string(),
                quote_failed:
                    "Ocorreu um erro ao gerar o orçamento. Por favor, tente novamente."
                        .to_string(),
                analysis_failed:
                    "Ocorreu um erro ao analisar a contraproposta. Por favor, tente novamente."
                        .to_string(),
                chat_apology:
                    "Desculpe, não consegui processar sua pergunta. Tente novamente.".to_string(),
            },
        }
    }
}

impl Default for SessionMessages {
    fn default() -> Self {
        Self::for_locale(Locale::default())
    }
}
