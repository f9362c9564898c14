//! Plain-text helpers shared by the repurposing steps.

use crate::yt::TranscriptEntry;

/// Words that end in a period without ending the sentence
const ABBREVIATIONS: &[&str] = &[
    "mr", "mrs", "ms", "dr", "prof", "sr", "jr", "st", "vs", "etc", "e.g", "i.e", "inc", "ltd",
    "approx", "u.s", "u.k",
];

/// Abbreviations that are also common lowercase words, matched as written
const CAPITALISED_ABBREVIATIONS: &[&str] = &["No", "Co"];

/// Splits prose at `.`, `!` or `?` followed by whitespace
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        current.push(c);

        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        let at_boundary = chars.peek().map_or(true, |next| next.is_whitespace());
        if !at_boundary || (c == '.' && ends_with_abbreviation(&current)) {
            continue;
        }

        let sentence = current.trim();
        if !sentence.is_empty() {
            sentences.push(sentence.to_string());
        }
        current.clear();
    }

    let rest = current.trim();
    if !rest.is_empty() {
        sentences.push(rest.to_string());
    }
    sentences
}

fn ends_with_abbreviation(current: &str) -> bool {
    let word = current
        .trim_end_matches('.')
        .rsplit(char::is_whitespace)
        .next()
        .unwrap_or_default()
        .trim_start_matches(|c: char| !c.is_alphanumeric());

    // single initials such as "J." in "J. R. R. Tolkien"
    let is_initial = word.chars().count() == 1 && word.chars().all(char::is_alphabetic);
    is_initial
        || CAPITALISED_ABBREVIATIONS.contains(&word)
        || ABBREVIATIONS.contains(&word.to_lowercase().as_str())
}

pub fn transcript_text(transcript: &[TranscriptEntry]) -> String {
    transcript
        .iter()
        .map(|entry| entry.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// `MM:SS`, minutes not wrapped at the hour
pub fn format_timestamp(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}

/// First `max_chars` characters, with `...` appended when cut
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(max_chars).collect();
    truncated.push_str("...");
    truncated
}
