// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use jobtrack_api::Client;
use jobtrack_app::{
    FetchTicket, FilterState, PaginatedApplications, StatusHistoryEntry, StatusUpdate, StoreError,
};
use jobtrack_testkit::InMemoryStore;
use jobtrack_tui::{AppRuntime, InternalEvent};
use std::sync::mpsc::Sender;
use std::thread;

// Store seam backed by the remote HTTP service. Fetches and commits run on
// worker threads so the event loop never blocks on the network; superseded
// responses are discarded by the controller when they eventually land.
pub struct ApiRuntime {
    client: Client,
}

impl ApiRuntime {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl AppRuntime for ApiRuntime {
    fn fetch_applications(
        &mut self,
        filter: &FilterState,
    ) -> Result<PaginatedApplications, StoreError> {
        self.client.fetch_applications(filter)
    }

    fn update_status(&mut self, update: &StatusUpdate) -> Result<StatusHistoryEntry, StoreError> {
        self.client.update_status(update)
    }

    fn spawn_fetch(&mut self, ticket: &FetchTicket, tx: Sender<InternalEvent>) -> Result<()> {
        let client = self.client.clone();
        let ticket = ticket.clone();
        thread::spawn(move || {
            let outcome = client.fetch_applications(&ticket.filter);
            let _ = tx.send(InternalEvent::FetchResolved {
                request_id: ticket.request_id,
                outcome,
            });
        });
        Ok(())
    }

    fn spawn_status_update(
        &mut self,
        update: &StatusUpdate,
        tx: Sender<InternalEvent>,
    ) -> Result<()> {
        let client = self.client.clone();
        let update = update.clone();
        thread::spawn(move || {
            let outcome = client.update_status(&update);
            let _ = tx.send(InternalEvent::CommitResolved {
                application_id: update.application_id,
                outcome,
            });
        });
        Ok(())
    }
}

// Offline store for `--demo`: everything resolves inline against the seeded
// in-memory dataset.
pub struct DemoRuntime {
    store: InMemoryStore,
}

impl DemoRuntime {
    pub fn new(store: InMemoryStore) -> Self {
        Self { store }
    }
}

impl AppRuntime for DemoRuntime {
    fn fetch_applications(
        &mut self,
        filter: &FilterState,
    ) -> Result<PaginatedApplications, StoreError> {
        self.store.fetch_page(filter)
    }

    fn update_status(&mut self, update: &StatusUpdate) -> Result<StatusHistoryEntry, StoreError> {
        self.store.update_status(update)
    }
}
