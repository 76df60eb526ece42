use super::common::*;
use std::sync::Arc;

use crate::credentials::CredentialRequest;
use crate::domain::AdminId;
use crate::error::ApiError;

fn request(ids: &[&str]) -> CredentialRequest {
    CredentialRequest {
        voter_ids: Some(ids.iter().map(|id| id.to_string()).collect()),
    }
}

#[test]
fn prepare_walks_the_validation_ladder() {
    let service = build_service(Arc::new(RecordingTransport::default()));
    let admin = AdminId(ADMIN_ID.to_string());
    let stranger = AdminId("nobody".to_string());

    assert_eq!(
        service.prepare(None, &request(&["v1"]), now()).unwrap_err(),
        ApiError::Unauthorized
    );
    assert_eq!(
        service
            .prepare(Some(&stranger), &request(&["v1"]), now())
            .unwrap_err(),
        ApiError::NotFound("Admin not found".to_string())
    );
    assert_eq!(
        service
            .prepare(Some(&admin), &CredentialRequest::default(), now())
            .unwrap_err(),
        ApiError::Validation("Voter IDs are required".to_string())
    );
    assert_eq!(
        service.prepare(Some(&admin), &request(&[]), now()).unwrap_err(),
        ApiError::Validation("Voter IDs are required".to_string())
    );
    assert_eq!(
        service
            .prepare(Some(&admin), &request(&["outsider", "ghost"]), now())
            .unwrap_err(),
        ApiError::NotFound("No voters found".to_string())
    );
}

#[test]
fn prepare_keeps_only_the_callers_voters() {
    let service = build_service(Arc::new(RecordingTransport::default()));
    let admin = AdminId(ADMIN_ID.to_string());

    let job = service
        .prepare(Some(&admin), &request(&["v3", "outsider", "v1"]), now())
        .expect("job prepared");

    let ids: Vec<&str> = job.voters.iter().map(|v| v.id.0.as_str()).collect();
    assert_eq!(ids, vec!["v3", "v1"]);
    assert_eq!(
        job.association.map(|a| a.name),
        Some("Computer Science Association".to_string())
    );
    assert!(job.election_start.is_some());
    assert_eq!(job.year, 2025);
}

#[tokio::test]
async fn send_batch_reports_counts_and_masked_usage() {
    let transport = Arc::new(RecordingTransport::default());
    let service = build_service(transport.clone());
    let admin = AdminId(ADMIN_ID.to_string());

    let response = service
        .send_batch(Some(&admin), &request(&["v1", "v2", "v3"]), now())
        .await
        .expect("batch succeeds");

    assert_eq!(response.total, 3);
    assert_eq!(response.successful, 3);
    assert_eq!(response.failed, 0);
    assert_eq!(response.key_usage_stats.len(), 2);
    assert!(response
        .key_usage_stats
        .iter()
        .all(|stat| stat.key.ends_with("...") && stat.key.len() == 13));

    let (_, first) = transport.sent().into_iter().next().expect("sent");
    assert_eq!(
        first.subject,
        "Voting Credentials - Computer Science Association"
    );
    assert!(first.text.contains("Starts: Fri, Mar 14, 9:05 AM"));
}

#[tokio::test]
async fn send_batch_fails_when_an_identity_is_revoked() {
    let transport = Arc::new(RecordingTransport::revoking(&["xkeysib-backup-111"]));
    let service = build_service(transport.clone());
    let admin = AdminId(ADMIN_ID.to_string());

    let err = service
        .send_batch(Some(&admin), &request(&["v1", "v2", "v3"]), now())
        .await
        .unwrap_err();

    assert_eq!(
        err,
        ApiError::Unexpected("Failed to send credentials".to_string())
    );
    // v1 went out on the primary key before the backup key was refused
    assert_eq!(transport.sent().len(), 1);
}
