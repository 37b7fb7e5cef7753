//! Canned answers for the help chat.

pub const SYMPTOMS_REPLY: &str = "Common symptoms include chest pain and shortness of breath.";
pub const PRECAUTIONS_REPLY: &str = "To lower risk: eat a balanced diet and exercise regularly.";
pub const FALLBACK_REPLY: &str = "Sorry, I can only answer about 'symptoms' or 'precautions'.";

/// Keyword match on the lowercased message; symptoms take priority.
pub fn bot_response(message: &str) -> &'static str {
    let message = message.to_lowercase();
    if message.contains("symptom") {
        SYMPTOMS_REPLY
    } else if message.contains("precaution") {
        PRECAUTIONS_REPLY
    } else {
        FALLBACK_REPLY
    }
}
