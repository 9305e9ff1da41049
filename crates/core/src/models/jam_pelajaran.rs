//! Period catalog: per-class mapping of period ordinal to clock times.
//! Classes without custom rows fall back to the default template.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{JadwalError, JadwalResult};
use crate::models::enums::Status;
use crate::models::jadwal::{format_jam, parse_jam};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JamPelajaran {
    pub id: Uuid,
    pub kelas_id: Uuid,
    pub jam_ke: i16,
    pub jam_mulai: NaiveTime,
    pub jam_selesai: NaiveTime,
    pub label: Option<String>,
    pub status: Status,
}

/// One period as submitted by upsert or produced by the template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodDef {
    pub jam_ke: i16,
    pub jam_mulai: NaiveTime,
    pub jam_selesai: NaiveTime,
    pub label: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodInput {
    pub jam_ke: i16,
    pub jam_mulai: String,
    pub jam_selesai: String,
    pub label: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertPeriodsRequest {
    pub periods: Vec<PeriodInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopyPeriodsRequest {
    pub source_kelas_id: Uuid,
    pub target_kelas_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodResponse {
    pub jam_ke: i16,
    pub jam_mulai: String,
    pub jam_selesai: String,
    pub label: Option<String>,
}

impl From<&PeriodDef> for PeriodResponse {
    fn from(p: &PeriodDef) -> Self {
        PeriodResponse {
            jam_ke: p.jam_ke,
            jam_mulai: format_jam(p.jam_mulai),
            jam_selesai: format_jam(p.jam_selesai),
            label: p.label.clone(),
        }
    }
}

/// Validates a submitted period set: parseable times, start < end,
/// no duplicate jam_ke. Returns the typed definitions in jam_ke order.
pub fn validate_periods(periods: &[PeriodInput]) -> JadwalResult<Vec<PeriodDef>> {
    if periods.is_empty() {
        return Err(JadwalError::Validation(
            "At least one period is required".to_string(),
        ));
    }

    let mut defs = Vec::with_capacity(periods.len());
    for p in periods {
        if p.jam_ke < 1 {
            return Err(JadwalError::Validation(format!(
                "jam_ke must be >= 1, got {}",
                p.jam_ke
            )));
        }
        let jam_mulai = parse_jam(&p.jam_mulai).map_err(JadwalError::Validation)?;
        let jam_selesai = parse_jam(&p.jam_selesai).map_err(JadwalError::Validation)?;
        if jam_mulai >= jam_selesai {
            return Err(JadwalError::Validation(format!(
                "Period {}: start time {} must be before end time {}",
                p.jam_ke, p.jam_mulai, p.jam_selesai
            )));
        }
        defs.push(PeriodDef {
            jam_ke: p.jam_ke,
            jam_mulai,
            jam_selesai,
            label: p.label.clone(),
        });
    }

    defs.sort_by_key(|d| d.jam_ke);
    for pair in defs.windows(2) {
        if pair[0].jam_ke == pair[1].jam_ke {
            return Err(JadwalError::Validation(format!(
                "Duplicate jam_ke {} in submitted periods",
                pair[0].jam_ke
            )));
        }
    }

    Ok(defs)
}

/// The system default template: ten 45-minute periods starting 07:00
/// with a 20-minute break before periods 5 and 9.
pub fn default_template() -> Vec<PeriodDef> {
    fn jam(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).expect("static template time")
    }

    let mut periods = Vec::with_capacity(10);
    let mut mulai = jam(7, 0);
    for jam_ke in 1..=10i16 {
        // Break slots resume twenty minutes later.
        let after_break = jam_ke == 5 || jam_ke == 9;
        if after_break {
            mulai += chrono::Duration::minutes(20);
        }
        let selesai = mulai + chrono::Duration::minutes(45);
        periods.push(PeriodDef {
            jam_ke,
            jam_mulai: mulai,
            jam_selesai: selesai,
            label: after_break.then(|| "Setelah istirahat".to_string()),
        });
        mulai = selesai;
    }
    periods
}
