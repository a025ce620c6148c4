// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::ids::*;

pub const DEFAULT_PAGE_SIZE: u32 = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    Applied,
    Test,
    Interview,
    OfferAwarded,
    Rejected,
    Withdrawn,
}

impl Status {
    pub const ALL: [Self; 6] = [
        Self::Applied,
        Self::Test,
        Self::Interview,
        Self::OfferAwarded,
        Self::Rejected,
        Self::Withdrawn,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Applied => "Applied",
            Self::Test => "Test",
            Self::Interview => "Interview",
            Self::OfferAwarded => "OfferAwarded",
            Self::Rejected => "Rejected",
            Self::Withdrawn => "Withdrawn",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Applied" => Some(Self::Applied),
            "Test" => Some(Self::Test),
            "Interview" => Some(Self::Interview),
            "OfferAwarded" => Some(Self::OfferAwarded),
            "Rejected" => Some(Self::Rejected),
            "Withdrawn" => Some(Self::Withdrawn),
            _ => None,
        }
    }

    // Pipeline ends at an offer, a rejection, or a withdrawal. Transitions
    // out of a terminal status are not hard-blocked anywhere; this only
    // drives presentation.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::OfferAwarded | Self::Rejected | Self::Withdrawn)
    }

    pub const fn progress_percent(self) -> u8 {
        match self {
            Self::Applied => 25,
            Self::Test => 35,
            Self::Interview => 50,
            Self::OfferAwarded => 100,
            Self::Rejected => 100,
            Self::Withdrawn => 100,
        }
    }

    pub const fn tone(self) -> StatusTone {
        match self {
            Self::Applied => StatusTone::Blue,
            Self::Test => StatusTone::Amber,
            Self::Interview => StatusTone::Purple,
            Self::OfferAwarded => StatusTone::Green,
            Self::Rejected => StatusTone::Red,
            Self::Withdrawn => StatusTone::Yellow,
        }
    }

    pub const fn glyph(self) -> &'static str {
        match self {
            Self::Applied => ">",
            Self::Test => "#",
            Self::Interview => "*",
            Self::OfferAwarded => "+",
            Self::Rejected => "x",
            Self::Withdrawn => "-",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTone {
    Blue,
    Amber,
    Purple,
    Green,
    Red,
    Yellow,
}

impl StatusTone {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Blue => "blue",
            Self::Amber => "amber",
            Self::Purple => "purple",
            Self::Green => "green",
            Self::Red => "red",
            Self::Yellow => "yellow",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusFilter {
    All,
    Only(Status),
}

impl StatusFilter {
    // Value for the remote query; `All` is omitted entirely, never sent as
    // a literal "all".
    pub const fn as_query_value(self) -> Option<&'static str> {
        match self {
            Self::All => None,
            Self::Only(status) => Some(status.as_str()),
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Only(status) => status.as_str(),
        }
    }

    pub fn next(self) -> Self {
        match self {
            Self::All => Self::Only(Status::ALL[0]),
            Self::Only(status) => {
                let index = Status::ALL
                    .iter()
                    .position(|candidate| *candidate == status)
                    .unwrap_or(0);
                match Status::ALL.get(index + 1) {
                    Some(next) => Self::Only(*next),
                    None => Self::All,
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusHistoryEntry {
    pub id: StatusHistoryEntryId,
    pub application_id: ApplicationId,
    pub created_by: UserId,
    pub status: Status,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interview_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: ApplicationId,
    pub company: String,
    pub position: String,
    pub status: Status,
    pub status_history: Vec<StatusHistoryEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_type: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub created_by: UserId,
}

impl Application {
    // The invariant every mutation must restore: status mirrors the tail of
    // the history, and the history is sorted by (created_at, id) ascending.
    pub fn invariant_holds(&self) -> bool {
        let sorted = self
            .status_history
            .windows(2)
            .all(|pair| (pair[0].created_at, pair[0].id) <= (pair[1].created_at, pair[1].id));
        match self.status_history.last() {
            Some(last) => sorted && last.status == self.status,
            None => sorted,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterState {
    pub search_term: String,
    pub status_filter: StatusFilter,
    pub page: u32,
    pub page_size: u32,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            search_term: String::new(),
            status_filter: StatusFilter::All,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl FilterState {
    // Trimmed search term for the remote query; blank means "no filter".
    pub fn search_query(&self) -> Option<&str> {
        let trimmed = self.search_term.trim();
        if trimmed.is_empty() { None } else { Some(trimmed) }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub total: u64,
    pub total_pages: u32,
    pub page: u32,
    pub size: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedApplications {
    pub applications: Vec<Application>,
    pub pagination: PaginationMeta,
}
