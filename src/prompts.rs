/// Persona attached to every document request.
pub const DOCUMENT_PERSONA: &str = include_str!("../data/prompts/document_persona.txt");
/// Export/import and customs advisor persona used by the chat endpoint.
pub const TRADE_ADVISOR: &str = include_str!("../data/prompts/trade_advisor.txt");
