// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

use crate::ids::ApplicationId;
use crate::model::{Application, Status, StatusHistoryEntry};

// Editable confirmation-dialog state for a requested status change. Nothing
// is mutated until the server acknowledges the commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionDraft {
    pub application_id: ApplicationId,
    pub target_status: Status,
    pub company: String,
    pub position: String,
}

impl TransitionDraft {
    pub fn into_update(self, note: Option<String>) -> StatusUpdate {
        StatusUpdate {
            application_id: self.application_id,
            status: self.target_status,
            notes: note.and_then(normalize_note),
            test_type: None,
            interview_type: None,
        }
    }
}

// Commit payload for the remote store. The server assigns id, created_at,
// and created_by on the resulting history entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    pub application_id: ApplicationId,
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interview_type: Option<String>,
}

impl StatusUpdate {
    pub fn validate(&self) -> Result<()> {
        if self.test_type.is_some() && self.status != Status::Test {
            bail!(
                "testType only applies to the Test status, not {}",
                self.status.as_str()
            );
        }
        if self.interview_type.is_some() && self.status != Status::Interview {
            bail!(
                "interviewType only applies to the Interview status, not {}",
                self.status.as_str()
            );
        }
        if let Some(notes) = &self.notes
            && notes.trim().is_empty()
        {
            bail!("notes must not be blank; omit the field instead");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionPolicy {
    pub allow_consecutive_duplicate_status: bool,
}

impl Default for TransitionPolicy {
    fn default() -> Self {
        Self {
            allow_consecutive_duplicate_status: true,
        }
    }
}

// Opens a draft for the confirmation UI. Unknown ids resolve to None; the
// caller guards before showing anything.
pub fn request_transition(
    applications: &[Application],
    application_id: ApplicationId,
    target_status: Status,
) -> Option<TransitionDraft> {
    let application = applications
        .iter()
        .find(|application| application.id == application_id)?;
    Some(TransitionDraft {
        application_id,
        target_status,
        company: application.company.clone(),
        position: application.position.clone(),
    })
}

// Merges a server-confirmed entry into an application. History stays sorted
// by (created_at, id) even when the server hands back an entry stamped
// earlier than the current tail, and the headline status always mirrors the
// post-sort tail.
pub fn apply_confirmed_entry(
    application: &Application,
    entry: StatusHistoryEntry,
) -> Application {
    let mut updated = application.clone();
    updated.status_history.push(entry);
    updated
        .status_history
        .sort_by_key(|entry| (entry.created_at, entry.id));
    if let Some(last) = updated.status_history.last() {
        updated.status = last.status;
    }
    updated
}

fn normalize_note(note: String) -> Option<String> {
    let trimmed = note.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::{StatusUpdate, TransitionDraft, apply_confirmed_entry, request_transition};
    use crate::ids::{ApplicationId, StatusHistoryEntryId, UserId};
    use crate::model::{Application, Status, StatusHistoryEntry};
    use time::OffsetDateTime;

    fn entry(id: i64, status: Status, at_seconds: i64) -> StatusHistoryEntry {
        StatusHistoryEntry {
            id: StatusHistoryEntryId::new(id),
            application_id: ApplicationId::new(7),
            created_by: UserId::new(1),
            status,
            created_at: OffsetDateTime::from_unix_timestamp(at_seconds)
                .expect("valid timestamp"),
            notes: None,
            test_type: None,
            interview_type: None,
        }
    }

    fn application(status: Status, history: Vec<StatusHistoryEntry>) -> Application {
        Application {
            id: ApplicationId::new(7),
            company: "TechCorp".to_owned(),
            position: "Software Engineer".to_owned(),
            status,
            status_history: history,
            website: None,
            application_type: None,
            created_at: OffsetDateTime::from_unix_timestamp(1_000).expect("valid timestamp"),
            created_by: UserId::new(1),
        }
    }

    #[test]
    fn request_transition_captures_display_fields() {
        let applications = vec![application(
            Status::Applied,
            vec![entry(1, Status::Applied, 1_000)],
        )];

        let draft =
            request_transition(&applications, ApplicationId::new(7), Status::Interview)
                .expect("known application");
        assert_eq!(draft.application_id, ApplicationId::new(7));
        assert_eq!(draft.target_status, Status::Interview);
        assert_eq!(draft.company, "TechCorp");
        assert_eq!(draft.position, "Software Engineer");
    }

    #[test]
    fn request_transition_for_unknown_application_is_none() {
        let applications = vec![application(
            Status::Applied,
            vec![entry(1, Status::Applied, 1_000)],
        )];
        assert!(
            request_transition(&applications, ApplicationId::new(99), Status::Interview)
                .is_none()
        );
    }

    #[test]
    fn apply_confirmed_entry_appends_and_updates_status() {
        let application = application(Status::Applied, vec![entry(1, Status::Applied, 1_000)]);

        let updated =
            apply_confirmed_entry(&application, entry(501, Status::Interview, 2_000));
        assert_eq!(updated.status, Status::Interview);
        assert_eq!(updated.status_history.len(), 2);
        assert_eq!(
            updated.status_history.last().map(|entry| entry.id),
            Some(StatusHistoryEntryId::new(501))
        );
        assert!(updated.invariant_holds());
        // Source value untouched.
        assert_eq!(application.status_history.len(), 1);
    }

    #[test]
    fn out_of_order_entry_is_resorted_and_status_follows_the_tail() {
        let application = application(
            Status::Interview,
            vec![entry(1, Status::Applied, 1_000), entry(2, Status::Interview, 3_000)],
        );

        // Server clock skew: the confirmed entry is stamped before the tail.
        let updated = apply_confirmed_entry(&application, entry(503, Status::Test, 2_000));
        let ids: Vec<i64> = updated
            .status_history
            .iter()
            .map(|entry| entry.id.get())
            .collect();
        assert_eq!(ids, vec![1, 503, 2]);
        assert_eq!(updated.status, Status::Interview);
        assert!(updated.invariant_holds());
    }

    #[test]
    fn equal_timestamps_tie_break_by_entry_id() {
        let application = application(Status::Applied, vec![entry(5, Status::Applied, 1_000)]);

        let updated = apply_confirmed_entry(&application, entry(3, Status::Test, 1_000));
        let ids: Vec<i64> = updated
            .status_history
            .iter()
            .map(|entry| entry.id.get())
            .collect();
        assert_eq!(ids, vec![3, 5]);
        assert_eq!(updated.status, Status::Applied);
    }

    #[test]
    fn draft_into_update_trims_the_note() {
        let draft = TransitionDraft {
            application_id: ApplicationId::new(7),
            target_status: Status::Interview,
            company: "TechCorp".to_owned(),
            position: "Software Engineer".to_owned(),
        };

        let update = draft.clone().into_update(Some("  Phone screen scheduled  ".to_owned()));
        assert_eq!(update.notes.as_deref(), Some("Phone screen scheduled"));

        let blank = draft.into_update(Some("   ".to_owned()));
        assert_eq!(blank.notes, None);
    }

    #[test]
    fn update_validation_rejects_mismatched_stage_fields() {
        let update = StatusUpdate {
            application_id: ApplicationId::new(7),
            status: Status::Interview,
            notes: None,
            test_type: Some("take-home".to_owned()),
            interview_type: None,
        };
        let error = update.validate().expect_err("testType requires Test");
        assert!(error.to_string().contains("testType"));

        let update = StatusUpdate {
            application_id: ApplicationId::new(7),
            status: Status::Test,
            notes: None,
            test_type: Some("take-home".to_owned()),
            interview_type: None,
        };
        update.validate().expect("matching stage field is accepted");
    }

    #[test]
    fn update_serializes_with_camel_case_fields() {
        let update = StatusUpdate {
            application_id: ApplicationId::new(7),
            status: Status::Interview,
            notes: Some("Phone screen scheduled".to_owned()),
            test_type: None,
            interview_type: None,
        };
        let encoded = serde_json::to_string(&update).expect("encode update");
        assert!(encoded.contains("\"applicationId\":7"));
        assert!(encoded.contains("\"status\":\"Interview\""));
        assert!(!encoded.contains("testType"));
    }
}
