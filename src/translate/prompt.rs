/// Build the translation prompt sent upstream.
///
/// Fixed rules first, then the optional custom instruction, then the
/// source text between `---` markers. Same inputs always give the same
/// prompt.
pub fn build_prompt(text: &str, target_language: &str, custom_instruction: Option<&str>) -> String {
    let custom_part = match custom_instruction.map(str::trim) {
        Some(instruction) if !instruction.is_empty() => {
            format!("\n\nAdditional Instructions:\n{}", instruction)
        }
        _ => String::new(),
    };

    format!(
        "You are a professional translator.\n\
         Translate the following text into {target_language}.\n\n\
         Rules:\n\
         1. Maintain the original meaning and nuance\n\
         2. Preserve formatting (line breaks, paragraphs, etc.)\n\
         3. Keep any special symbols, numbers, or codes as they are\n\
         4. Return ONLY the translated text without any explanations{custom_part}\n\n\
         Text to translate:\n---\n{text}\n---"
    )
}
