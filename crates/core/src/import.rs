//! Spreadsheet import pipeline (pure stage).
//!
//! Rows arrive in one of two shapes: id-based (entity ids given
//! directly) or name-based (human-readable names resolved through a
//! [`NameDirectory`]). The shape is decided once from the header row
//! and carried as a tagged union, so validation downstream is
//! shape-agnostic. Each row maps to `Result<SlotDraft, RowError>` and
//! a single pass splits the batch into valid rows and accumulated
//! errors; a bad row never aborts the scan.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::conflict::{find_conflicts, SlotCandidate};
use crate::errors::{JadwalError, JadwalResult};
use crate::models::enums::{Hari, JenisAktivitas};
use crate::models::jadwal::{parse_jam, SlotDraft};

/// Which spreadsheet shape the file uses, decided once from headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowFormat {
    ById,
    ByName,
}

/// One raw spreadsheet row, already tagged with its shape.
#[derive(Debug, Clone, PartialEq)]
pub enum RawRow {
    ById {
        kelas_id: String,
        hari: String,
        jam_ke: String,
        jam_mulai: String,
        jam_selesai: String,
        jenis_aktivitas: String,
        mapel_id: String,
        /// Comma-separated; the first id is the primary teacher.
        guru_ids: String,
        ruang_id: String,
        catatan: String,
    },
    ByName {
        kelas: String,
        hari: String,
        jam_ke: String,
        jam_mulai: String,
        jam_selesai: String,
        jenis_aktivitas: String,
        mapel: String,
        /// Primary teacher display name.
        guru: String,
        /// Comma-separated co-teacher names ("Guru Tambahan" column).
        guru_tambahan: String,
        ruang: String,
        catatan: String,
    },
}

/// Errors for a single input row; the row number is 1-based with the
/// header on row 1, matching what users see in their spreadsheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowError {
    pub row: usize,
    pub messages: Vec<String>,
}

/// Display-name to id lookup for the name-based format, loaded from
/// active reference rows by the CRUD layer. Matching is
/// case-insensitive on the trimmed name.
#[derive(Debug, Clone, Default)]
pub struct NameDirectory {
    kelas: HashMap<String, Uuid>,
    guru: HashMap<String, Uuid>,
    mapel: HashMap<String, Uuid>,
    ruang: HashMap<String, Uuid>,
}

impl NameDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(name: &str) -> String {
        name.trim().to_lowercase()
    }

    pub fn add_kelas(&mut self, name: &str, id: Uuid) {
        self.kelas.insert(Self::key(name), id);
    }

    pub fn add_guru(&mut self, name: &str, id: Uuid) {
        self.guru.insert(Self::key(name), id);
    }

    pub fn add_mapel(&mut self, name: &str, id: Uuid) {
        self.mapel.insert(Self::key(name), id);
    }

    pub fn add_ruang(&mut self, name: &str, id: Uuid) {
        self.ruang.insert(Self::key(name), id);
    }

    pub fn resolve_kelas(&self, name: &str) -> Option<Uuid> {
        self.kelas.get(&Self::key(name)).copied()
    }

    pub fn resolve_guru(&self, name: &str) -> Option<Uuid> {
        self.guru.get(&Self::key(name)).copied()
    }

    pub fn resolve_mapel(&self, name: &str) -> Option<Uuid> {
        self.mapel.get(&Self::key(name)).copied()
    }

    pub fn resolve_ruang(&self, name: &str) -> Option<Uuid> {
        self.ruang.get(&Self::key(name)).copied()
    }
}

/// Normalizes a header cell: trimmed, lowercased, spaces to
/// underscores, so "Guru Tambahan" and "guru_tambahan" both match.
pub fn normalize_header(header: &str) -> String {
    header.trim().to_lowercase().replace(' ', "_")
}

/// Decides the file's shape from its (normalized) headers.
pub fn detect_format(headers: &[String]) -> JadwalResult<RowFormat> {
    let has = |name: &str| headers.iter().any(|h| h == name);
    if has("kelas_id") {
        Ok(RowFormat::ById)
    } else if has("kelas") {
        Ok(RowFormat::ByName)
    } else {
        Err(JadwalError::Validation(
            "Unrecognized import format: expected a 'kelas_id' or 'kelas' column".to_string(),
        ))
    }
}

fn field(map: &HashMap<String, String>, name: &str) -> String {
    map.get(name).map(|v| v.trim().to_string()).unwrap_or_default()
}

/// Builds a tagged raw row from one record's normalized field map.
pub fn raw_row_from_fields(format: RowFormat, map: &HashMap<String, String>) -> RawRow {
    match format {
        RowFormat::ById => RawRow::ById {
            kelas_id: field(map, "kelas_id"),
            hari: field(map, "hari"),
            jam_ke: field(map, "jam_ke"),
            jam_mulai: field(map, "jam_mulai"),
            jam_selesai: field(map, "jam_selesai"),
            jenis_aktivitas: field(map, "jenis_aktivitas"),
            mapel_id: field(map, "mapel_id"),
            guru_ids: field(map, "guru_ids"),
            ruang_id: field(map, "ruang_id"),
            catatan: field(map, "catatan"),
        },
        RowFormat::ByName => RawRow::ByName {
            kelas: field(map, "kelas"),
            hari: field(map, "hari"),
            jam_ke: field(map, "jam_ke"),
            jam_mulai: field(map, "jam_mulai"),
            jam_selesai: field(map, "jam_selesai"),
            jenis_aktivitas: field(map, "jenis_aktivitas"),
            mapel: field(map, "mapel"),
            guru: field(map, "guru"),
            guru_tambahan: field(map, "guru_tambahan"),
            ruang: field(map, "ruang"),
            catatan: field(map, "catatan"),
        },
    }
}

struct RowErrors {
    row: usize,
    messages: Vec<String>,
}

impl RowErrors {
    fn new(row: usize) -> Self {
        RowErrors {
            row,
            messages: Vec::new(),
        }
    }

    fn push(&mut self, message: String) {
        self.messages.push(message);
    }

    fn into_result(self, draft: Option<SlotDraft>) -> Result<SlotDraft, RowError> {
        match (self.messages.is_empty(), draft) {
            (true, Some(draft)) => Ok(draft),
            _ => Err(RowError {
                row: self.row,
                messages: self.messages,
            }),
        }
    }
}

fn parse_uuid(value: &str, what: &str, errors: &mut RowErrors) -> Option<Uuid> {
    if value.is_empty() {
        return None;
    }
    match Uuid::parse_str(value) {
        Ok(id) => Some(id),
        Err(_) => {
            errors.push(format!("Invalid {} '{}': not a valid id", what, value));
            None
        }
    }
}

fn resolve_name(
    value: &str,
    what: &str,
    resolve: impl Fn(&str) -> Option<Uuid>,
    errors: &mut RowErrors,
) -> Option<Uuid> {
    if value.is_empty() {
        return None;
    }
    match resolve(value) {
        Some(id) => Some(id),
        None => {
            errors.push(format!("Unknown {} '{}'", what, value));
            None
        }
    }
}

/// Validates one raw row into a [`SlotDraft`]. Every problem in the
/// row is reported together rather than stopping at the first.
pub fn validate_row(
    raw: &RawRow,
    directory: &NameDirectory,
    row: usize,
) -> Result<SlotDraft, RowError> {
    let mut errors = RowErrors::new(row);

    let (kelas_id, hari, jam_ke, jam_mulai, jam_selesai, jenis, mapel_id, guru_ids, ruang_id, catatan) =
        match raw {
            RawRow::ById {
                kelas_id,
                hari,
                jam_ke,
                jam_mulai,
                jam_selesai,
                jenis_aktivitas,
                mapel_id,
                guru_ids,
                ruang_id,
                catatan,
            } => {
                let kelas = if kelas_id.is_empty() {
                    errors.push("kelas_id is required".to_string());
                    None
                } else {
                    parse_uuid(kelas_id, "kelas_id", &mut errors)
                };
                let mapel = parse_uuid(mapel_id, "mapel_id", &mut errors);
                let ruang = parse_uuid(ruang_id, "ruang_id", &mut errors);
                let guru: Vec<Uuid> = guru_ids
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .filter_map(|s| parse_uuid(s, "guru id", &mut errors))
                    .collect();
                (
                    kelas, hari, jam_ke, jam_mulai, jam_selesai, jenis_aktivitas, mapel, guru,
                    ruang, catatan,
                )
            }
            RawRow::ByName {
                kelas,
                hari,
                jam_ke,
                jam_mulai,
                jam_selesai,
                jenis_aktivitas,
                mapel,
                guru,
                guru_tambahan,
                ruang,
                catatan,
            } => {
                let kelas_id = if kelas.is_empty() {
                    errors.push("kelas is required".to_string());
                    None
                } else {
                    resolve_name(kelas, "class", |n| directory.resolve_kelas(n), &mut errors)
                };
                let mapel_id =
                    resolve_name(mapel, "subject", |n| directory.resolve_mapel(n), &mut errors);
                let ruang_id =
                    resolve_name(ruang, "room", |n| directory.resolve_ruang(n), &mut errors);

                // First resolved teacher becomes primary.
                let mut guru_ids = Vec::new();
                if let Some(id) =
                    resolve_name(guru, "teacher", |n| directory.resolve_guru(n), &mut errors)
                {
                    guru_ids.push(id);
                }
                for name in guru_tambahan.split(',').map(str::trim).filter(|s| !s.is_empty()) {
                    if let Some(id) =
                        resolve_name(name, "teacher", |n| directory.resolve_guru(n), &mut errors)
                    {
                        if !guru_ids.contains(&id) {
                            guru_ids.push(id);
                        }
                    }
                }
                (
                    kelas_id,
                    hari,
                    jam_ke,
                    jam_mulai,
                    jam_selesai,
                    jenis_aktivitas,
                    mapel_id,
                    guru_ids,
                    ruang_id,
                    catatan,
                )
            }
        };

    let hari = match Hari::from_str(hari) {
        Ok(h) => Some(h),
        Err(e) => {
            errors.push(e);
            None
        }
    };

    let jam_ke: Option<i16> = if jam_ke.is_empty() {
        errors.push("jam_ke is required".to_string());
        None
    } else {
        match jam_ke.parse() {
            Ok(n) => Some(n),
            Err(_) => {
                errors.push(format!("Invalid jam_ke '{}'", jam_ke));
                None
            }
        }
    };

    let jam_mulai = if jam_mulai.is_empty() {
        errors.push("jam_mulai is required".to_string());
        None
    } else {
        match parse_jam(jam_mulai) {
            Ok(t) => Some(t),
            Err(e) => {
                errors.push(e);
                None
            }
        }
    };
    let jam_selesai = if jam_selesai.is_empty() {
        errors.push("jam_selesai is required".to_string());
        None
    } else {
        match parse_jam(jam_selesai) {
            Ok(t) => Some(t),
            Err(e) => {
                errors.push(e);
                None
            }
        }
    };

    // Activity kind defaults to lesson when the column is absent.
    let jenis = if jenis.is_empty() {
        Some(JenisAktivitas::Pelajaran)
    } else {
        match JenisAktivitas::from_str(jenis) {
            Ok(j) => Some(j),
            Err(e) => {
                errors.push(e);
                None
            }
        }
    };

    let draft = match (kelas_id, hari, jam_ke, jam_mulai, jam_selesai, jenis) {
        (Some(kelas_id), Some(hari), Some(jam_ke), Some(jam_mulai), Some(jam_selesai), Some(jenis)) => {
            let draft = SlotDraft {
                kelas_id,
                hari,
                jam_ke,
                jam_mulai,
                jam_selesai,
                jenis_aktivitas: jenis,
                mapel_id,
                ruang_id,
                catatan: (!catatan.is_empty()).then(|| catatan.clone()),
                guru_ids,
            };
            for message in draft.validation_messages() {
                errors.push(message);
            }
            Some(draft)
        }
        _ => None,
    };

    errors.into_result(draft)
}

/// A validated row as echoed back by dry-run previews.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportPreviewRow {
    pub row: usize,
    pub kelas_id: Uuid,
    pub hari: Hari,
    pub jam_ke: i16,
    pub jam_mulai: String,
    pub jam_selesai: String,
    pub jenis_aktivitas: JenisAktivitas,
    pub guru_ids: Vec<Uuid>,
}

impl ImportPreviewRow {
    pub fn from_draft(row: usize, draft: &SlotDraft) -> Self {
        ImportPreviewRow {
            row,
            kelas_id: draft.kelas_id,
            hari: draft.hari,
            jam_ke: draft.jam_ke,
            jam_mulai: crate::models::jadwal::format_jam(draft.jam_mulai),
            jam_selesai: crate::models::jadwal::format_jam(draft.jam_selesai),
            jenis_aktivitas: draft.jenis_aktivitas,
            guru_ids: draft.guru_ids.clone(),
        }
    }
}

/// Import endpoint payload, shared by dry-run and commit modes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportReport {
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
    pub errors: Vec<RowError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_data: Option<Vec<ImportPreviewRow>>,
    pub message: String,
}

/// Active reference ids for the id-based shape, loaded from active
/// rows by the CRUD layer. A row pointing at an unknown or inactive id
/// becomes a row error, mirroring how the name-based shape treats an
/// unresolved name.
#[derive(Debug, Clone, Default)]
pub struct IdDirectory {
    kelas: HashSet<Uuid>,
    guru: HashSet<Uuid>,
    mapel: HashSet<Uuid>,
    ruang: HashSet<Uuid>,
}

impl IdDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_kelas(&mut self, id: Uuid) {
        self.kelas.insert(id);
    }

    pub fn add_guru(&mut self, id: Uuid) {
        self.guru.insert(id);
    }

    pub fn add_mapel(&mut self, id: Uuid) {
        self.mapel.insert(id);
    }

    pub fn add_ruang(&mut self, id: Uuid) {
        self.ruang.insert(id);
    }

    /// Every reference in the draft that is not in the directory, as
    /// row-error messages.
    pub fn missing_messages(&self, draft: &SlotDraft) -> Vec<String> {
        let mut messages = Vec::new();
        if !self.kelas.contains(&draft.kelas_id) {
            messages.push(format!("Unknown kelas_id '{}'", draft.kelas_id));
        }
        for guru_id in &draft.guru_ids {
            if !self.guru.contains(guru_id) {
                messages.push(format!("Unknown guru id '{}'", guru_id));
            }
        }
        if let Some(mapel_id) = draft.mapel_id {
            if !self.mapel.contains(&mapel_id) {
                messages.push(format!("Unknown mapel_id '{}'", mapel_id));
            }
        }
        if let Some(ruang_id) = draft.ruang_id {
            if !self.ruang.contains(&ruang_id) {
                messages.push(format!("Unknown ruang_id '{}'", ruang_id));
            }
        }
        messages
    }
}

/// Splits id-based rows into resolvable rows and row errors.
pub fn screen_references(
    valid: Vec<(usize, SlotDraft)>,
    directory: &IdDirectory,
) -> (Vec<(usize, SlotDraft)>, Vec<RowError>) {
    let mut clean = Vec::with_capacity(valid.len());
    let mut errors = Vec::new();
    for (row, draft) in valid {
        let messages = directory.missing_messages(&draft);
        if messages.is_empty() {
            clean.push((row, draft));
        } else {
            errors.push(RowError { row, messages });
        }
    }
    (clean, errors)
}

/// Dry-run conflict screen: the whole batch is evaluated together and
/// every row on either side of a conflict is flagged, so the caller
/// sees the full picture before anything is written.
pub fn flag_conflicting_rows(
    valid: Vec<(usize, SlotDraft)>,
    existing: &[SlotCandidate],
) -> (Vec<(usize, SlotDraft)>, Vec<RowError>) {
    if valid.is_empty() {
        return (valid, Vec::new());
    }

    let candidates: Vec<SlotCandidate> = valid.iter().map(|(_, d)| d.candidate(None)).collect();
    let report = find_conflicts(&candidates, existing, &[]);

    let mut by_row: BTreeMap<usize, Vec<String>> = BTreeMap::new();
    for conflict in &report.conflicts {
        for index in [conflict.candidate.candidate_index, conflict.other.candidate_index]
            .into_iter()
            .flatten()
        {
            by_row
                .entry(valid[index].0)
                .or_default()
                .push(conflict.message.clone());
        }
    }

    let clean = valid
        .into_iter()
        .filter(|(row, _)| !by_row.contains_key(row))
        .collect();
    let errors = by_row
        .into_iter()
        .map(|(row, mut messages)| {
            messages.dedup();
            RowError { row, messages }
        })
        .collect();
    (clean, errors)
}

/// Commit screen: rows are admitted in file order. A row that
/// conflicts with the committed store or with an earlier admitted row
/// becomes a row error; the earlier row keeps its place.
pub fn admit_rows(
    valid: Vec<(usize, SlotDraft)>,
    existing: &[SlotCandidate],
) -> (Vec<(usize, SlotDraft)>, Vec<RowError>) {
    let mut pool = existing.to_vec();
    let mut admitted = Vec::with_capacity(valid.len());
    let mut errors = Vec::new();

    for (row, draft) in valid {
        let report = find_conflicts(&[draft.candidate(None)], &pool, &[]);
        if report.is_empty() {
            pool.push(draft.candidate(None));
            admitted.push((row, draft));
        } else {
            let mut messages: Vec<String> =
                report.conflicts.iter().map(|c| c.message.clone()).collect();
            messages.dedup();
            errors.push(RowError { row, messages });
        }
    }
    (admitted, errors)
}

/// Splits a batch into valid drafts and row errors in one pass. Row
/// numbers are preserved so later conflict checks can point back at
/// the offending spreadsheet lines.
pub fn collect_rows(
    rows: &[(usize, RawRow)],
    directory: &NameDirectory,
) -> (Vec<(usize, SlotDraft)>, Vec<RowError>) {
    let mut valid = Vec::new();
    let mut errors = Vec::new();
    for (row, raw) in rows {
        match validate_row(raw, directory, *row) {
            Ok(draft) => valid.push((*row, draft)),
            Err(err) => errors.push(err),
        }
    }
    (valid, errors)
}
