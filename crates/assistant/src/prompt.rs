//! System-instruction construction.
//!
//! The persona and constraint preamble lives in `system_prompt.txt`; the
//! financial snapshot is appended verbatim between fences. The instruction is
//! attached once per conversation context, not resent per turn.

const FIRST_TURN_NOTE: &str =
    "Begin the first conversation by introducing yourself and asking how you can help.";

/// Build the context-seeding system instruction around a financial snapshot.
///
/// The summary is opaque to the session: it is embedded as-is, never parsed
/// or validated.
pub fn build_system_instruction(financial_data_summary: &str) -> String {
    format!(
        "{}\n\nHere is the user's complete financial data:\n---\n{}\n---\n\n{}",
        include_str!("system_prompt.txt").trim(),
        financial_data_summary,
        FIRST_TURN_NOTE,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instruction_embeds_summary_verbatim() {
        let instruction = build_system_instruction(r#"{"netWorth": 4567890}"#);
        assert!(instruction.contains("---\n{\"netWorth\": 4567890}\n---"));
    }

    #[test]
    fn test_instruction_fixes_persona_and_conventions() {
        let instruction = build_system_instruction("{}");
        assert!(instruction.contains("Fi Agent"));
        assert!(instruction.contains("ONLY on the structured JSON data"));
        assert!(instruction.contains("Indian Rupees (₹)"));
        assert!(instruction.contains("introducing yourself"));
    }
}
