//! Assistant persona: system instruction, greeting, and fallback reply

/// Default Gemini model identifier
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Persona and domain restriction sent with every generation request
pub const SYSTEM_INSTRUCTION: &str = "You are a friendly, expert voice assistant for Revolt Motors, an electric motorcycle company.
Your goal is to provide helpful, concise, and accurate information to users in a conversational manner.
Only talk about Revolt Motors products, services, and support.
Do not discuss any other topics. If a user asks about something unrelated, politely steer the conversation back to Revolt Motors.
Keep your responses conversational and relatively short, as if you are speaking to the user.
Available models are the RV400 and RV400 BRZ.
Key features include: MyRevolt App connectivity, different riding modes (Eco, Normal, Sport), and a removable battery.
Users can book a test ride, find showrooms, or ask about financing options through the official website.
If you don't know an answer, say \"I'm not sure about that, but you can find more information on the official Revolt Motors website.\"
";

/// First assistant message of every session
pub const GREETING: &str = "Hello! I'm the Revolt Motors voice assistant. How can I help you today? You can ask me about our bikes, booking a test ride, or anything else.";

/// Spoken in place of a reply when generation fails or comes back empty
pub const FALLBACK_REPLY: &str =
    "I'm having trouble connecting to my brain right now. Please try again in a moment.";

/// Identity of the assistant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Persona {
    /// Display name shown in the header
    pub name: String,

    /// System instruction for the language model
    pub system_instruction: String,

    /// Opening assistant message
    pub greeting: String,
}

impl Default for Persona {
    fn default() -> Self {
        Self {
            name: "Revolt Motors AI".to_string(),
            system_instruction: SYSTEM_INSTRUCTION.to_string(),
            greeting: GREETING.to_string(),
        }
    }
}

impl Persona {
    /// Apply optional overrides, ignoring blank values
    #[must_use]
    pub fn with_overrides(
        mut self,
        system_instruction: Option<String>,
        greeting: Option<String>,
    ) -> Self {
        if let Some(instruction) = system_instruction.filter(|s| !s.trim().is_empty()) {
            self.system_instruction = instruction;
        }
        if let Some(greeting) = greeting.filter(|s| !s.trim().is_empty()) {
            self.greeting = greeting;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_persona() {
        let persona = Persona::default();
        assert!(persona.system_instruction.contains("Revolt Motors"));
        assert!(persona.system_instruction.contains("RV400 BRZ"));
        assert_eq!(persona.greeting, GREETING);
    }

    #[test]
    fn test_blank_overrides_ignored() {
        let persona = Persona::default().with_overrides(Some("   ".to_string()), None);
        assert_eq!(persona, Persona::default());
    }

    #[test]
    fn test_overrides_applied() {
        let persona = Persona::default()
            .with_overrides(Some("Be terse.".to_string()), Some("Hi.".to_string()));
        assert_eq!(persona.system_instruction, "Be terse.");
        assert_eq!(persona.greeting, "Hi.");
    }
}
