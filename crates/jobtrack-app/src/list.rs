// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::BTreeMap;

use crate::flow::{StatusUpdate, TransitionPolicy, apply_confirmed_entry, request_transition};
use crate::ids::ApplicationId;
use crate::model::{
    Application, FilterState, PaginatedApplications, PaginationMeta, Status, StatusFilter,
    StatusHistoryEntry,
};
use crate::store::StoreError;

// A fetch the runtime still has to execute. The controller never performs
// I/O itself; it hands out tickets and later judges the resolutions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub request_id: u64,
    pub filter: FilterState,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListPhase {
    Idle,
    Loading,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitState {
    Idle,
    Pending,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchResolution {
    // Snapshot replaced; carries a follow-up ticket when the authoritative
    // page count forced the requested page down.
    Applied(Option<FetchTicket>),
    Failed,
    // Superseded or post-close result, dropped without touching state.
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitRefusal {
    UnknownApplication,
    AlreadyPending,
    DuplicateStatus,
    SessionClosed,
}

impl CommitRefusal {
    pub const fn message(self) -> &'static str {
        match self {
            Self::UnknownApplication => "application is not on this page",
            Self::AlreadyPending => "a status update is already in flight",
            Self::DuplicateStatus => "application already has that status",
            Self::SessionClosed => "list session is closed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitResolution {
    Applied,
    // Confirmed by the server but the row paginated away; the next fetch
    // reflects the authoritative state.
    NotOnPage,
    Failed,
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListController {
    applications: Vec<Application>,
    filter: FilterState,
    pagination: Option<PaginationMeta>,
    phase: ListPhase,
    policy: TransitionPolicy,
    commits: BTreeMap<ApplicationId, CommitState>,
    in_flight: Option<u64>,
    next_request_id: u64,
    closed: bool,
}

impl Default for ListController {
    fn default() -> Self {
        Self::new(TransitionPolicy::default())
    }
}

impl ListController {
    pub fn new(policy: TransitionPolicy) -> Self {
        Self {
            applications: Vec::new(),
            filter: FilterState::default(),
            pagination: None,
            phase: ListPhase::Idle,
            policy,
            commits: BTreeMap::new(),
            in_flight: None,
            next_request_id: 0,
            closed: false,
        }
    }

    pub fn with_page_size(policy: TransitionPolicy, page_size: u32) -> Self {
        let mut controller = Self::new(policy);
        controller.filter.page_size = page_size.max(1);
        controller
    }

    pub fn applications(&self) -> &[Application] {
        &self.applications
    }

    pub fn application(&self, id: ApplicationId) -> Option<&Application> {
        self.applications
            .iter()
            .find(|application| application.id == id)
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn pagination(&self) -> Option<&PaginationMeta> {
        self.pagination.as_ref()
    }

    pub fn phase(&self) -> &ListPhase {
        &self.phase
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn commit_state(&self, id: ApplicationId) -> CommitState {
        self.commits.get(&id).cloned().unwrap_or(CommitState::Idle)
    }

    pub fn has_pending_commit(&self, id: ApplicationId) -> bool {
        self.commit_state(id) == CommitState::Pending
    }

    pub fn set_search_term(&mut self, term: &str) -> Option<FetchTicket> {
        if self.closed || term == self.filter.search_term {
            return None;
        }
        self.filter.search_term = term.to_owned();
        self.filter.page = 1;
        Some(self.issue_fetch())
    }

    pub fn set_status_filter(&mut self, status_filter: StatusFilter) -> Option<FetchTicket> {
        if self.closed || status_filter == self.filter.status_filter {
            return None;
        }
        self.filter.status_filter = status_filter;
        self.filter.page = 1;
        Some(self.issue_fetch())
    }

    // Out-of-bounds pages (including 0) are silent no-ops, not errors.
    pub fn set_page(&mut self, page: u32) -> Option<FetchTicket> {
        if self.closed {
            return None;
        }
        let total_pages = self.pagination.as_ref()?.total_pages;
        if page < 1 || page > total_pages || page == self.filter.page {
            return None;
        }
        self.filter.page = page;
        Some(self.issue_fetch())
    }

    pub fn refetch(&mut self) -> Option<FetchTicket> {
        if self.closed {
            return None;
        }
        Some(self.issue_fetch())
    }

    pub fn resolve_fetch(
        &mut self,
        request_id: u64,
        outcome: Result<PaginatedApplications, StoreError>,
    ) -> FetchResolution {
        if self.closed || self.in_flight != Some(request_id) {
            return FetchResolution::Stale;
        }
        self.in_flight = None;

        match outcome {
            Ok(page) => {
                // Whole-snapshot replacement; the remote pagination metadata
                // is authoritative over anything computed locally.
                self.applications = page.applications;
                self.pagination = Some(page.pagination);
                self.phase = ListPhase::Idle;

                let total_pages = page.pagination.total_pages;
                let followup = if total_pages == 0 {
                    self.filter.page = 1;
                    None
                } else if self.filter.page > total_pages {
                    self.filter.page = total_pages;
                    Some(self.issue_fetch())
                } else {
                    None
                };
                FetchResolution::Applied(followup)
            }
            Err(error) => {
                // Last good snapshot stays on screen.
                self.phase = ListPhase::Failed(error.to_string());
                FetchResolution::Failed
            }
        }
    }

    pub fn begin_commit(
        &mut self,
        application_id: ApplicationId,
        target_status: Status,
        note: Option<String>,
    ) -> Result<StatusUpdate, CommitRefusal> {
        if self.closed {
            return Err(CommitRefusal::SessionClosed);
        }
        if self.has_pending_commit(application_id) {
            return Err(CommitRefusal::AlreadyPending);
        }
        let draft = request_transition(&self.applications, application_id, target_status)
            .ok_or(CommitRefusal::UnknownApplication)?;
        if !self.policy.allow_consecutive_duplicate_status
            && self
                .application(application_id)
                .is_some_and(|application| application.status == target_status)
        {
            return Err(CommitRefusal::DuplicateStatus);
        }

        self.commits.insert(application_id, CommitState::Pending);
        Ok(draft.into_update(note))
    }

    pub fn resolve_commit(
        &mut self,
        application_id: ApplicationId,
        outcome: Result<StatusHistoryEntry, StoreError>,
    ) -> CommitResolution {
        if self.closed || !self.has_pending_commit(application_id) {
            return CommitResolution::Ignored;
        }

        match outcome {
            Ok(entry) => {
                self.commits.remove(&application_id);
                let index = self
                    .applications
                    .iter()
                    .position(|application| application.id == application_id);
                match index {
                    Some(index) => {
                        self.applications[index] =
                            apply_confirmed_entry(&self.applications[index], entry);
                        CommitResolution::Applied
                    }
                    None => CommitResolution::NotOnPage,
                }
            }
            Err(error) => {
                // A failed status update is not a failed list fetch: the
                // list phase and the snapshot stay exactly as they were.
                self.commits
                    .insert(application_id, CommitState::Failed(error.to_string()));
                CommitResolution::Failed
            }
        }
    }

    pub fn acknowledge_commit_failure(&mut self, application_id: ApplicationId) {
        if matches!(self.commits.get(&application_id), Some(CommitState::Failed(_))) {
            self.commits.remove(&application_id);
        }
    }

    // Unmount. Anything still in flight resolves into the void afterwards.
    pub fn close_session(&mut self) {
        self.closed = true;
        self.in_flight = None;
        self.commits.clear();
        self.phase = ListPhase::Idle;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn issue_fetch(&mut self) -> FetchTicket {
        self.next_request_id = self.next_request_id.saturating_add(1);
        if self.next_request_id == 0 {
            self.next_request_id = 1;
        }
        self.in_flight = Some(self.next_request_id);
        self.phase = ListPhase::Loading;
        FetchTicket {
            request_id: self.next_request_id,
            filter: self.filter.clone(),
        }
    }
}
