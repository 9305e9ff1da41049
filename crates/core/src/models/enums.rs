//! Closed enumerations for the schedule domain. Days, activity kinds,
//! and row status are sum types so the detector and validators match
//! exhaustively instead of comparing strings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// School day. Sunday is excluded by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hari {
    Senin,
    Selasa,
    Rabu,
    Kamis,
    Jumat,
    Sabtu,
}

impl Hari {
    pub const ALL: [Hari; 6] = [
        Hari::Senin,
        Hari::Selasa,
        Hari::Rabu,
        Hari::Kamis,
        Hari::Jumat,
        Hari::Sabtu,
    ];

    /// Canonical lowercase form stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Hari::Senin => "senin",
            Hari::Selasa => "selasa",
            Hari::Rabu => "rabu",
            Hari::Kamis => "kamis",
            Hari::Jumat => "jumat",
            Hari::Sabtu => "sabtu",
        }
    }
}

impl fmt::Display for Hari {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Hari {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "senin" => Ok(Hari::Senin),
            "selasa" => Ok(Hari::Selasa),
            "rabu" => Ok(Hari::Rabu),
            "kamis" => Ok(Hari::Kamis),
            "jumat" | "jum'at" => Ok(Hari::Jumat),
            "sabtu" => Ok(Hari::Sabtu),
            other => Err(format!(
                "Invalid day '{}': expected senin, selasa, rabu, kamis, jumat, or sabtu",
                other
            )),
        }
    }
}

/// Kind of activity occupying a slot. Lessons carry a subject and at
/// least one teacher; anything else carries a free-text note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JenisAktivitas {
    #[serde(rename = "lesson")]
    Pelajaran,
    #[serde(rename = "other")]
    Lainnya,
}

impl JenisAktivitas {
    pub fn as_str(&self) -> &'static str {
        match self {
            JenisAktivitas::Pelajaran => "lesson",
            JenisAktivitas::Lainnya => "other",
        }
    }
}

impl fmt::Display for JenisAktivitas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JenisAktivitas {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "lesson" | "pelajaran" => Ok(JenisAktivitas::Pelajaran),
            "other" | "lainnya" => Ok(JenisAktivitas::Lainnya),
            other => Err(format!(
                "Invalid activity kind '{}': expected lesson or other",
                other
            )),
        }
    }
}

/// Row status. Rows are deactivated instead of deleted so attendance
/// records keep a valid jadwal reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[serde(rename = "active")]
    Aktif,
    #[serde(rename = "inactive")]
    Nonaktif,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Aktif => "active",
            Status::Nonaktif => "inactive",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" | "aktif" => Ok(Status::Aktif),
            "inactive" | "nonaktif" => Ok(Status::Nonaktif),
            other => Err(format!("Invalid status '{}'", other)),
        }
    }
}
