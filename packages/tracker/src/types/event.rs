//! Event types - extracted drafts and reconciled store records.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Kind of a tracked event.
///
/// `Lottery` and `Sale` are ticket phases: dependent children of a
/// standalone event (usually a `Live`). Everything else stands alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// Concert, live performance
    Live,
    /// CD, album, single release
    Release,
    /// Ticket lottery period
    Lottery,
    /// Ticket general sale
    Sale,
    /// TV, streaming, radio
    Broadcast,
    /// Online streaming of a live
    Streaming,
    /// Movie theater screening
    Screening,
    Other,
}

impl EventKind {
    /// Parse a kind string leniently; unknown values degrade to `Other`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "live" => Self::Live,
            "release" => Self::Release,
            "lottery" => Self::Lottery,
            "sale" => Self::Sale,
            "broadcast" => Self::Broadcast,
            "streaming" => Self::Streaming,
            "screening" => Self::Screening,
            _ => Self::Other,
        }
    }

    /// Lowercase identifier segment for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Release => "release",
            Self::Lottery => "lottery",
            Self::Sale => "sale",
            Self::Broadcast => "broadcast",
            Self::Streaming => "streaming",
            Self::Screening => "screening",
            Self::Other => "other",
        }
    }

    /// True for dependent ticket-phase kinds (lottery/sale).
    pub fn is_ticket_phase(&self) -> bool {
        matches!(self, Self::Lottery | Self::Sale)
    }
}

/// What a participant needs to enter a ticket phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketRequirement {
    /// Serial code from a CD / Blu-ray purchase
    Cd,
    /// Fan club membership
    Fc,
    /// Ticket vendor pre-sale
    Playguide,
    /// No prerequisite (general sale)
    None,
    Other,
}

impl TicketRequirement {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "cd" => Self::Cd,
            "fc" => Self::Fc,
            "playguide" => Self::Playguide,
            "none" => Self::None,
            _ => Self::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cd => "cd",
            Self::Fc => "fc",
            Self::Playguide => "playguide",
            Self::None => "none",
            Self::Other => "other",
        }
    }
}

/// Which round a ticket phase occupies in the sale sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketPriority {
    Fastest,
    Secondary,
    Tertiary,
    General,
    Other,
}

impl TicketPriority {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "fastest" => Self::Fastest,
            "secondary" => Self::Secondary,
            "tertiary" => Self::Tertiary,
            "general" => Self::General,
            _ => Self::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fastest => "fastest",
            Self::Secondary => "secondary",
            Self::Tertiary => "tertiary",
            Self::General => "general",
            Self::Other => "other",
        }
    }
}

/// A raw event proposal from the semantic extractor.
///
/// Dates arrive as strings and enums as free text; conversion into an
/// [`Event`] is lenient where it can be (unknown kinds and dimensions
/// degrade to `other`) and drops the record only when the title or
/// date is missing entirely.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventDraft {
    #[serde(default)]
    pub event_type: String,
    #[serde(default)]
    pub title: String,
    pub date: Option<String>,
    pub end_date: Option<String>,
    pub venue: Option<String>,
    pub location: Option<String>,
    #[serde(default)]
    pub action_required: bool,
    pub action_deadline: Option<String>,
    pub action_description: Option<String>,
    pub event_url: Option<String>,
    pub ticket_url: Option<String>,
    /// Exact title of the parent event, for ticket phases
    pub parent_title: Option<String>,
    pub ticket_requirement: Option<String>,
    pub ticket_priority: Option<String>,
    /// Specific product carrying the serial code, for CD requirements
    pub ticket_requirement_detail: Option<String>,
}

/// A reconciled event record in the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Deterministic identifier; globally unique within the store
    pub id: String,

    /// Id of the standalone parent, for resolved ticket phases
    pub parent_id: Option<String>,

    /// Artist or band name
    pub artist: String,

    pub kind: EventKind,
    pub title: String,

    /// Event date or period start
    pub date: NaiveDateTime,

    /// End of a multi-day event or application period
    pub end_date: Option<NaiveDateTime>,

    pub venue: Option<String>,
    pub location: Option<String>,

    pub action_required: bool,
    pub action_deadline: Option<NaiveDateTime>,
    pub action_description: Option<String>,

    pub event_url: Option<String>,
    pub ticket_url: Option<String>,

    /// Source-supplied reference to the intended parent's title
    pub parent_title: Option<String>,
    pub requirement: Option<TicketRequirement>,
    pub priority: Option<TicketPriority>,
    pub requirement_detail: Option<String>,

    /// Detail page this record was extracted from
    pub source_url: String,

    /// First time this id entered the store; preserved across upserts
    pub first_seen: DateTime<Utc>,

    /// Most recent run that produced this record
    pub last_seen: DateTime<Utc>,

    /// Derived from the effective stop date; recomputed every
    /// reconciliation, never set by a producer
    #[serde(default)]
    pub ended: bool,
}

impl Event {
    /// Convert an extractor draft into an event record.
    ///
    /// The id is left empty here; identifier assignment and parent
    /// resolution happen over the whole batch (see `resolver`).
    pub fn from_draft(
        draft: EventDraft,
        artist: &str,
        source_url: &str,
        now: DateTime<Utc>,
    ) -> std::result::Result<Self, ValidationError> {
        let title = draft.title.trim().to_string();
        if title.is_empty() {
            return Err(ValidationError::MissingTitle);
        }

        let date = draft
            .date
            .as_deref()
            .and_then(parse_event_date)
            .ok_or_else(|| ValidationError::MissingDate {
                title: title.clone(),
            })?;

        Ok(Self {
            id: String::new(),
            parent_id: None,
            artist: artist.to_string(),
            kind: EventKind::parse(&draft.event_type),
            title,
            date,
            end_date: draft.end_date.as_deref().and_then(parse_event_date),
            venue: draft.venue,
            location: draft.location,
            action_required: draft.action_required,
            action_deadline: draft.action_deadline.as_deref().and_then(parse_event_date),
            action_description: draft.action_description,
            event_url: draft.event_url,
            ticket_url: draft.ticket_url,
            parent_title: draft.parent_title,
            requirement: draft
                .ticket_requirement
                .as_deref()
                .map(TicketRequirement::parse),
            priority: draft.ticket_priority.as_deref().map(TicketPriority::parse),
            requirement_detail: draft.ticket_requirement_detail,
            source_url: source_url.to_string(),
            first_seen: now,
            last_seen: now,
            ended: false,
        })
    }

    /// The date the event stops being actionable: end date if
    /// present, else the start date.
    pub fn effective_stop_date(&self) -> NaiveDateTime {
        self.end_date.unwrap_or(self.date)
    }

    /// True for lottery/sale records.
    pub fn is_ticket_phase(&self) -> bool {
        self.kind.is_ticket_phase()
    }
}

/// Parse the date formats the extractor is known to emit.
pub fn parse_event_date(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d.and_hms_opt(0, 0, 0).expect("midnight is valid"));
        }
    }
    None
}
