//! Text-to-speech excerpts.

/// Replies shorter than this many characters are spoken in full.
pub const SPEAK_IN_FULL_BELOW: usize = 200;

/// Sentences kept from a long reply.
const EXCERPT_SENTENCES: usize = 2;

/// The part of a chat reply worth reading aloud.
///
/// Short replies are returned as is. Longer ones are cut to their first two
/// `". "`-separated sentences, closed with a period.
pub fn speech_excerpt(reply: &str) -> String {
    if reply.chars().count() < SPEAK_IN_FULL_BELOW {
        return reply.to_string();
    }

    let head = reply
        .split(". ")
        .take(EXCERPT_SENTENCES)
        .collect::<Vec<_>>()
        .join(". ");
    format!("{head}.")
}
