// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use jobtrack_app::{
    Application, ApplicationId, FilterState, PaginatedApplications, PaginationMeta, Status,
    StatusFilter, StatusHistoryEntry, StatusHistoryEntryId, StatusUpdate, StoreError, UserId,
    apply_confirmed_entry,
};
use time::OffsetDateTime;
use time::macros::datetime;

pub const DEMO_USER: UserId = UserId::new(1);

// Clock base for entries minted by the in-memory store. Later than every
// demo fixture timestamp so appended history stays in order.
const STORE_CLOCK_BASE: OffsetDateTime = datetime!(2025-05-01 12:00:00 UTC);

// Deterministic stand-in for the remote service: filters, paginates, and
// assigns server-side fields the way the real backend would, with call
// counters and one-shot failure injection for tests.
#[derive(Debug, Clone)]
pub struct InMemoryStore {
    applications: Vec<Application>,
    next_entry_id: i64,
    minted_entries: i64,
    pub fetch_calls: usize,
    pub update_calls: usize,
    pub fail_next_fetch: Option<StoreError>,
    pub fail_next_update: Option<StoreError>,
}

impl InMemoryStore {
    pub fn new(applications: Vec<Application>) -> Self {
        let next_entry_id = applications
            .iter()
            .flat_map(|application| &application.status_history)
            .map(|entry| entry.id.get())
            .max()
            .unwrap_or(0)
            + 1;
        Self {
            applications,
            next_entry_id,
            minted_entries: 0,
            fetch_calls: 0,
            update_calls: 0,
            fail_next_fetch: None,
            fail_next_update: None,
        }
    }

    pub fn demo() -> Self {
        Self::new(demo_applications())
    }

    pub fn applications(&self) -> &[Application] {
        &self.applications
    }

    pub fn fetch_page(
        &mut self,
        filter: &FilterState,
    ) -> Result<PaginatedApplications, StoreError> {
        self.fetch_calls += 1;
        if let Some(error) = self.fail_next_fetch.take() {
            return Err(error);
        }

        let matching: Vec<&Application> = self
            .applications
            .iter()
            .filter(|application| matches_filter(application, filter))
            .collect();

        let total = matching.len() as u64;
        let size = filter.page_size.max(1);
        let total_pages = (total as u32).div_ceil(size);
        let start = (filter.page.saturating_sub(1) * size) as usize;
        let applications: Vec<Application> = matching
            .into_iter()
            .skip(start)
            .take(size as usize)
            .cloned()
            .collect();

        Ok(PaginatedApplications {
            applications,
            pagination: PaginationMeta {
                total,
                total_pages,
                page: filter.page,
                size,
            },
        })
    }

    pub fn update_status(
        &mut self,
        update: &StatusUpdate,
    ) -> Result<StatusHistoryEntry, StoreError> {
        self.update_calls += 1;
        if let Some(error) = self.fail_next_update.take() {
            return Err(error);
        }
        update
            .validate()
            .map_err(|error| StoreError::ValidationFailed(error.to_string()))?;

        let index = self
            .applications
            .iter()
            .position(|application| application.id == update.application_id)
            .ok_or_else(|| StoreError::ValidationFailed("resource not found".to_owned()))?;

        let entry = StatusHistoryEntry {
            id: StatusHistoryEntryId::new(self.next_entry_id),
            application_id: update.application_id,
            created_by: DEMO_USER,
            status: update.status,
            created_at: STORE_CLOCK_BASE + time::Duration::seconds(self.minted_entries * 60),
            notes: update.notes.clone(),
            test_type: update.test_type.clone(),
            interview_type: update.interview_type.clone(),
        };
        self.next_entry_id += 1;
        self.minted_entries += 1;

        self.applications[index] = apply_confirmed_entry(&self.applications[index], entry.clone());
        Ok(entry)
    }
}

fn matches_filter(application: &Application, filter: &FilterState) -> bool {
    let matches_search = match filter.search_query() {
        Some(term) => {
            let term = term.to_lowercase();
            application.company.to_lowercase().contains(&term)
                || application.position.to_lowercase().contains(&term)
        }
        None => true,
    };
    let matches_status = match filter.status_filter {
        StatusFilter::All => true,
        StatusFilter::Only(status) => application.status == status,
    };
    matches_search && matches_status
}

pub fn application(
    id: i64,
    company: &str,
    position: &str,
    website: Option<&str>,
    history: Vec<StatusHistoryEntry>,
) -> Application {
    let status = history
        .last()
        .map(|entry| entry.status)
        .unwrap_or(Status::Applied);
    let created_at = history
        .first()
        .map(|entry| entry.created_at)
        .unwrap_or(STORE_CLOCK_BASE);
    Application {
        id: ApplicationId::new(id),
        company: company.to_owned(),
        position: position.to_owned(),
        status,
        status_history: history,
        website: website.map(str::to_owned),
        application_type: None,
        created_at,
        created_by: DEMO_USER,
    }
}

pub fn history_entry(
    id: i64,
    application_id: i64,
    status: Status,
    created_at: OffsetDateTime,
    notes: Option<&str>,
) -> StatusHistoryEntry {
    StatusHistoryEntry {
        id: StatusHistoryEntryId::new(id),
        application_id: ApplicationId::new(application_id),
        created_by: DEMO_USER,
        status,
        created_at,
        notes: notes.map(str::to_owned),
        test_type: None,
        interview_type: None,
    }
}

pub fn demo_applications() -> Vec<Application> {
    vec![
        application(
            1,
            "TechCorp",
            "Software Engineer",
            Some("https://techcorp.example.com"),
            vec![
                history_entry(
                    1,
                    1,
                    Status::Applied,
                    datetime!(2025-04-10 10:00:00 UTC),
                    Some("Submitted resume and portfolio"),
                ),
                history_entry(
                    2,
                    1,
                    Status::Interview,
                    datetime!(2025-04-15 14:30:00 UTC),
                    Some("Technical screen scheduled with team lead"),
                ),
            ],
        ),
        application(
            2,
            "Innovate Solutions",
            "Frontend Developer",
            Some("https://innovatesolutions.example.com"),
            vec![history_entry(
                3,
                2,
                Status::Applied,
                datetime!(2025-04-10 09:00:00 UTC),
                Some("Applied via company website"),
            )],
        ),
        application(
            3,
            "Business Inc.",
            "Project Manager",
            Some("https://business-inc.example.com"),
            vec![
                history_entry(4, 3, Status::Applied, datetime!(2025-03-25 11:00:00 UTC), None),
                history_entry(
                    5,
                    3,
                    Status::Interview,
                    datetime!(2025-03-30 16:00:00 UTC),
                    Some("First round with HR"),
                ),
                history_entry(
                    6,
                    3,
                    Status::Rejected,
                    datetime!(2025-04-01 10:00:00 UTC),
                    Some("Position filled internally"),
                ),
            ],
        ),
        application(
            4,
            "Data Dynamics",
            "Data Scientist",
            Some("https://datadynamics.example.com"),
            vec![
                history_entry(7, 4, Status::Applied, datetime!(2025-03-15 08:00:00 UTC), None),
                history_entry(
                    8,
                    4,
                    Status::Interview,
                    datetime!(2025-03-20 13:00:00 UTC),
                    Some("Technical assessment and team interview"),
                ),
                history_entry(
                    9,
                    4,
                    Status::OfferAwarded,
                    datetime!(2025-03-28 17:00:00 UTC),
                    Some("$95K annual, remote with quarterly on-site"),
                ),
            ],
        ),
        application(
            5,
            "Web Weavers",
            "UI/UX Designer",
            None,
            vec![history_entry(
                10,
                5,
                Status::Applied,
                datetime!(2025-04-18 12:00:00 UTC),
                Some("Submitted portfolio and case studies"),
            )],
        ),
        application(
            6,
            "TechCorp",
            "Senior Software Engineer",
            Some("https://techcorp.example.com"),
            vec![
                history_entry(11, 6, Status::Applied, datetime!(2025-02-20 09:00:00 UTC), None),
                history_entry(
                    12,
                    6,
                    Status::Interview,
                    datetime!(2025-03-01 11:00:00 UTC),
                    Some("Good conversation, but position requires relocation"),
                ),
                history_entry(
                    13,
                    6,
                    Status::Withdrawn,
                    datetime!(2025-03-05 15:00:00 UTC),
                    Some("Not interested in relocation at this time"),
                ),
            ],
        ),
        application(
            7,
            "Innovate Solutions",
            "Backend Developer",
            Some("https://innovatesolutions.example.com"),
            vec![
                history_entry(14, 7, Status::Applied, datetime!(2025-04-19 10:00:00 UTC), None),
                history_entry(
                    15,
                    7,
                    Status::Interview,
                    datetime!(2025-04-20 14:30:00 UTC),
                    Some("Initial screen scheduled"),
                ),
            ],
        ),
        application(
            8,
            "Creative Hub",
            "Graphic Designer",
            None,
            vec![history_entry(
                16,
                8,
                Status::Applied,
                datetime!(2025-04-21 09:00:00 UTC),
                None,
            )],
        ),
        application(
            9,
            "Cloud Services Ltd.",
            "DevOps Engineer",
            Some("https://cloudsvc.example.com"),
            vec![
                history_entry(17, 9, Status::Applied, datetime!(2025-04-12 11:00:00 UTC), None),
                history_entry(
                    18,
                    9,
                    Status::Test,
                    datetime!(2025-04-18 10:30:00 UTC),
                    Some("Technical challenge received"),
                ),
            ],
        ),
        application(
            10,
            "Marketing Masters",
            "Social Media Manager",
            None,
            vec![
                history_entry(19, 10, Status::Applied, datetime!(2025-04-05 15:00:00 UTC), None),
                history_entry(
                    20,
                    10,
                    Status::Rejected,
                    datetime!(2025-04-10 09:00:00 UTC),
                    Some("Went with another candidate"),
                ),
            ],
        ),
        application(
            11,
            "Finance Solutions",
            "Financial Analyst",
            None,
            vec![history_entry(
                21,
                11,
                Status::Applied,
                datetime!(2025-04-20 16:00:00 UTC),
                None,
            )],
        ),
        application(
            12,
            "TechCorp",
            "QA Tester",
            Some("https://techcorp.example.com"),
            vec![history_entry(
                22,
                12,
                Status::Applied,
                datetime!(2025-04-21 11:30:00 UTC),
                None,
            )],
        ),
    ]
}
