use std::sync::OnceLock;

use regex::Regex;

// Lines longer than this are assumed to be noise, not a command.
const MAX_COMMAND_LEN: usize = 2000;

fn reasoning_block_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<think>.*?</think>").expect("valid reasoning pattern"))
}

fn fenced_block_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Triple-backtick fence with an optional language tag on the opening line.
    RE.get_or_init(|| Regex::new(r"(?s)```[^\n]*\n(.*?)```").expect("valid fence pattern"))
}

fn commentary_word_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(user|want|shouldn't|should|think|explain|error|note)\b")
            .expect("valid commentary pattern")
    })
}

/// Reduce a raw model response to a single command line. Best effort: models
/// asked for "command only" still wrap answers in reasoning tags, markdown
/// fences, or trailing commentary. Never fails; returns an empty string when
/// no usable candidate exists.
pub fn sanitize(raw: &str) -> String {
    if raw.trim().is_empty() {
        return String::new();
    }

    let without_reasoning = reasoning_block_pattern().replace_all(raw, "");

    // Models sometimes show a draft block then a final one; the last fenced
    // block wins. Without any fence, stray backticks are inline-code noise.
    let captures: Vec<_> = fenced_block_pattern()
        .captures_iter(&without_reasoning)
        .collect();
    let text = match captures.last() {
        Some(caps) => caps[1].to_string(),
        None => without_reasoning.replace('`', ""),
    };

    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    if lines.is_empty() {
        return String::new();
    }

    // The command is usually at the end, but a trailing caveat sentence
    // ("Note: this assumes bash.") may follow it; scan backward past prose.
    for line in lines.iter().rev() {
        if !is_prose_line(line) && line.len() <= MAX_COMMAND_LEN {
            return line.to_string();
        }
    }

    lines.last().map(|line| line.to_string()).unwrap_or_default()
}

/// Heuristic check for natural-language lines: a capitalized sentence with
/// terminal punctuation, or a line containing a commentary word.
pub fn is_prose_line(line: &str) -> bool {
    let capitalized_sentence = match (line.chars().next(), line.chars().last()) {
        (Some(first), Some(last)) => {
            first.is_uppercase() && matches!(last, '.' | '?' | '!')
        }
        _ => false,
    };

    capitalized_sentence || commentary_word_pattern().is_match(line)
}
