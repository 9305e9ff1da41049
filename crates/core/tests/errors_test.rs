use std::error::Error;

use presensi_core::conflict::ConflictReport;
use presensi_core::errors::{JadwalError, JadwalResult};

#[test]
fn test_jadwal_error_display() {
    let not_found = JadwalError::NotFound("Kelas not found".to_string());
    let validation = JadwalError::Validation("Invalid time".to_string());
    let conflict = JadwalError::Conflict(ConflictReport::default());
    let authentication = JadwalError::Authentication("Missing token".to_string());
    let authorization = JadwalError::Authorization("Admin only".to_string());
    let database = JadwalError::Database(eyre::eyre!("Database connection failed"));
    let internal = JadwalError::Internal(Box::new(std::io::Error::new(
        std::io::ErrorKind::Other,
        "Internal error",
    )));

    assert_eq!(not_found.to_string(), "Resource not found: Kelas not found");
    assert_eq!(validation.to_string(), "Validation error: Invalid time");
    assert_eq!(
        conflict.to_string(),
        "Schedule conflict: 0 overlapping slot(s) detected"
    );
    assert_eq!(
        authentication.to_string(),
        "Authentication error: Missing token"
    );
    assert_eq!(authorization.to_string(), "Authorization error: Admin only");
    assert!(database.to_string().contains("Database error:"));
    assert!(internal.to_string().contains("Internal server error:"));
}

#[test]
fn test_error_conversion() {
    let io_error = std::io::Error::new(std::io::ErrorKind::Other, "IO error");
    let jadwal_error = JadwalError::Internal(Box::new(io_error));

    assert!(jadwal_error.source().is_some());
}

#[test]
fn test_jadwal_result() {
    let result: JadwalResult<i32> = Ok(42);
    assert_eq!(result.unwrap(), 42);

    let result: JadwalResult<i32> = Err(JadwalError::NotFound("Not found".to_string()));
    assert!(result.is_err());
}

#[test]
fn test_from_trait_implementation() {
    let eyre_error = eyre::eyre!("Database error");
    let jadwal_error = JadwalError::Database(eyre_error);

    assert!(jadwal_error.to_string().contains("Database error"));
}

#[test]
fn test_conflict_carries_the_report() {
    let report = ConflictReport::default();
    let err = JadwalError::Conflict(report.clone());

    match err {
        JadwalError::Conflict(inner) => assert_eq!(inner, report),
        other => panic!("expected Conflict, got {:?}", other),
    }
}
