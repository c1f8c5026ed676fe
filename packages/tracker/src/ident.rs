//! Deterministic event identifiers.
//!
//! Ids are a pure function of the normalized title, the event date,
//! and (for ticket phases) the requirement/priority dimensions.
//! Re-extracting identical source data always reproduces the same id,
//! which is what makes the store upsert idempotent.

use chrono::NaiveDateTime;

use crate::types::EventKind;

/// Reserved base when title normalization yields nothing.
///
/// Keeps ids well-formed (`untitled-2026-07-18`) instead of starting
/// with the date separator.
pub const FALLBACK_ID_BASE: &str = "untitled";

/// Ticket-phase wording stripped from the end of titles, ordered
/// most-specific-first so compound terms win over their fragments.
///
/// Stripping makes a standalone event and its dependent phases
/// normalize to the same base string: "MyGO!!!!! 9th LIVE 最速先行抽選"
/// and "MyGO!!!!! 9th LIVE" both become `mygo-9th-live`.
const PHASE_VOCABULARY: &[&str] = &[
    "最速先行抽選",
    "最速先行",
    "最速抽選",
    "1次先行",
    "2次先行",
    "3次先行",
    "1次抽選",
    "2次抽選",
    "3次抽選",
    "先行抽選",
    "先行販売",
    "先行受付",
    "一般発売",
    "一般販売",
    "チケット先行",
    "先行",
    "抽選",
];

const BRACKETS: &[char] = &[
    '「', '」', '『', '』', '【', '】', '（', '）', '(', ')', '[', ']', '{', '}', '〈', '〉', '《',
    '》',
];

/// Generate the deterministic id for an event.
///
/// For ticket-phase kinds the id gains a
/// `-{kind}-{requirement|other}-{priority|other}` suffix; callers
/// resolving a phase against its parent pass the parent's title and
/// date here so the child's identity anchors to the parent.
pub fn generate_event_id(
    title: &str,
    date: NaiveDateTime,
    kind: Option<EventKind>,
    requirement: Option<&str>,
    priority: Option<&str>,
) -> String {
    let mut id = format!("{}-{}", normalize_title(title), date.format("%Y-%m-%d"));

    if let Some(kind) = kind {
        if kind.is_ticket_phase() {
            id.push('-');
            id.push_str(kind.as_str());
            id.push('-');
            id.push_str(requirement.unwrap_or("other"));
            id.push('-');
            id.push_str(priority.unwrap_or("other"));
        }
    }

    id
}

/// Normalize a title into an id base string.
///
/// Lowercase, strip trailing phase vocabulary, map brackets to the
/// separator, drop everything that is not a word character or
/// whitespace, and collapse runs into single `-`.
pub fn normalize_title(title: &str) -> String {
    let lowered = title.to_lowercase();
    let stripped = strip_phase_vocabulary(&lowered);

    let mut base = String::with_capacity(stripped.len());
    let mut pending_sep = false;
    for c in stripped.chars() {
        let is_sep = BRACKETS.contains(&c) || c.is_whitespace() || c == '-';
        if is_sep {
            pending_sep = true;
        } else if c.is_alphanumeric() || c == '_' {
            if pending_sep && !base.is_empty() {
                base.push('-');
            }
            base.push(c);
            pending_sep = false;
        }
        // Anything else (punctuation like "!!!!!") is dropped without
        // introducing a separator.
    }

    if base.is_empty() {
        FALLBACK_ID_BASE.to_string()
    } else {
        base
    }
}

/// Strip trailing ticket-phase terms, repeatedly, so stacked wording
/// ("... チケット先行 抽選") also reduces to the bare title.
fn strip_phase_vocabulary(title: &str) -> String {
    let mut current = title.trim_end().to_string();
    loop {
        let mut next = None;
        for term in PHASE_VOCABULARY {
            if let Some(rest) = current.strip_suffix(term) {
                next = Some(rest.trim_end().to_string());
                break;
            }
        }
        match next {
            Some(rest) => current = rest,
            None => return current,
        }
    }
}
