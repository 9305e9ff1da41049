//! # Presensi Core
//!
//! Domain types and pure logic for the presensi scheduling engine:
//! the jadwal data model, the period catalog template, the conflict
//! detector, and the spreadsheet import pipeline. This crate performs
//! no I/O; the database and HTTP layers live in `presensi-db` and
//! `presensi-api`.

pub mod conflict;
pub mod errors;
pub mod import;
pub mod models;
