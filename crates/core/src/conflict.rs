//! Conflict detection over schedule slots.
//!
//! The detector is a pure function: it takes a candidate set plus the
//! committed rows it may collide with and returns every overlap found,
//! classified by dimension (class, teacher, room). Both single and
//! bulk mutation paths run through it before writing, and candidates
//! are also checked pairwise against each other so a batch cannot
//! smuggle in an internally inconsistent set.
//!
//! Overlap uses half-open intervals: `[s1,e1)` and `[s2,e2)` collide
//! iff `s1 < e2 && s2 < e1`, so back-to-back slots never conflict.

use std::collections::HashSet;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::enums::Hari;
use crate::models::jadwal::format_jam;

/// The resource dimension a conflict was detected on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConflictKind {
    ClassConflict,
    TeacherConflict,
    RoomConflict,
}

/// A slot as seen by the detector: either a committed row (`id` set)
/// or an uncommitted candidate (`id` = None).
#[derive(Debug, Clone, PartialEq)]
pub struct SlotCandidate {
    pub id: Option<Uuid>,
    pub kelas_id: Uuid,
    pub hari: Hari,
    pub jam_ke: i16,
    pub jam_mulai: NaiveTime,
    pub jam_selesai: NaiveTime,
    pub guru_ids: Vec<Uuid>,
    pub ruang_id: Option<Uuid>,
}

/// Identifies one side of a conflict in the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictParty {
    /// Committed row id, or None for an uncommitted candidate.
    pub jadwal_id: Option<Uuid>,
    /// Position in the candidate batch, or None for a committed row.
    pub candidate_index: Option<usize>,
    pub kelas_id: Uuid,
    pub jam_ke: i16,
    pub jam_mulai: String,
    pub jam_selesai: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    pub kind: ConflictKind,
    pub hari: Hari,
    /// Id of the contested resource: the class, teacher, or room.
    pub resource_id: Uuid,
    pub candidate: ConflictParty,
    pub other: ConflictParty,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConflictReport {
    pub conflicts: Vec<Conflict>,
}

impl ConflictReport {
    pub fn is_empty(&self) -> bool {
        self.conflicts.is_empty()
    }

    pub fn summary(&self) -> String {
        format!("{} overlapping slot(s) detected", self.conflicts.len())
    }
}

/// How a rule scopes its pair of slots relative to the class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RuleScope {
    /// Only pairs within the same class (class dimension).
    SameKelas,
    /// Only pairs across different classes (teacher dimension; a
    /// same-class pair is already a class conflict).
    CrossKelas,
    /// Any pair (room dimension).
    AnyKelas,
}

/// One classification dimension. Adding a resource dimension (say,
/// equipment) means adding a row here, not new branching.
struct ConflictRule {
    kind: ConflictKind,
    scope: RuleScope,
    keys: fn(&SlotCandidate) -> Vec<Uuid>,
}

fn kelas_keys(slot: &SlotCandidate) -> Vec<Uuid> {
    vec![slot.kelas_id]
}

fn guru_keys(slot: &SlotCandidate) -> Vec<Uuid> {
    slot.guru_ids.clone()
}

fn ruang_keys(slot: &SlotCandidate) -> Vec<Uuid> {
    slot.ruang_id.into_iter().collect()
}

const RULES: [ConflictRule; 3] = [
    ConflictRule {
        kind: ConflictKind::ClassConflict,
        scope: RuleScope::SameKelas,
        keys: kelas_keys,
    },
    ConflictRule {
        kind: ConflictKind::TeacherConflict,
        scope: RuleScope::CrossKelas,
        keys: guru_keys,
    },
    ConflictRule {
        kind: ConflictKind::RoomConflict,
        scope: RuleScope::AnyKelas,
        keys: ruang_keys,
    },
];

fn overlaps(a: &SlotCandidate, b: &SlotCandidate) -> bool {
    a.jam_mulai < b.jam_selesai && b.jam_mulai < a.jam_selesai
}

fn party(slot: &SlotCandidate, candidate_index: Option<usize>) -> ConflictParty {
    ConflictParty {
        jadwal_id: slot.id,
        candidate_index,
        kelas_id: slot.kelas_id,
        jam_ke: slot.jam_ke,
        jam_mulai: format_jam(slot.jam_mulai),
        jam_selesai: format_jam(slot.jam_selesai),
    }
}

fn describe(kind: ConflictKind, resource: Uuid, a: &SlotCandidate, b: &SlotCandidate) -> String {
    let what = match kind {
        ConflictKind::ClassConflict => "Class",
        ConflictKind::TeacherConflict => "Teacher",
        ConflictKind::RoomConflict => "Room",
    };
    format!(
        "{} {} double-booked on {}: {}-{} vs {}-{}",
        what,
        resource,
        a.hari,
        format_jam(a.jam_mulai),
        format_jam(a.jam_selesai),
        format_jam(b.jam_mulai),
        format_jam(b.jam_selesai),
    )
}

/// Classifies one pair of slots. `a` is the candidate under test,
/// `b` the slot it is compared against.
fn check_pair(
    a: &SlotCandidate,
    a_index: usize,
    b: &SlotCandidate,
    b_index: Option<usize>,
) -> Vec<Conflict> {
    if a.hari != b.hari {
        return Vec::new();
    }
    // Same committed row on both sides means co-teaching, not a clash.
    if let (Some(a_id), Some(b_id)) = (a.id, b.id) {
        if a_id == b_id {
            return Vec::new();
        }
    }

    let time_overlap = overlaps(a, b);
    // Two active rows may never share (kelas, hari, jam_ke), even with
    // hand-edited times that do not overlap.
    let duplicate_period = a.kelas_id == b.kelas_id && a.jam_ke == b.jam_ke;

    let mut conflicts = Vec::new();
    for rule in &RULES {
        let scope_ok = match rule.scope {
            RuleScope::SameKelas => a.kelas_id == b.kelas_id,
            RuleScope::CrossKelas => a.kelas_id != b.kelas_id,
            RuleScope::AnyKelas => true,
        };
        if !scope_ok {
            continue;
        }
        let triggered =
            time_overlap || (rule.kind == ConflictKind::ClassConflict && duplicate_period);
        if !triggered {
            continue;
        }

        let a_keys = (rule.keys)(a);
        let b_keys: HashSet<Uuid> = (rule.keys)(b).into_iter().collect();
        for key in a_keys {
            if b_keys.contains(&key) {
                conflicts.push(Conflict {
                    kind: rule.kind,
                    hari: a.hari,
                    resource_id: key,
                    candidate: party(a, Some(a_index)),
                    other: party(b, b_index),
                    message: describe(rule.kind, key, a, b),
                });
            }
        }
    }
    conflicts
}

/// Finds every conflict a candidate set would introduce.
///
/// Candidates are checked against the committed `existing` rows
/// (minus `exclude_ids`, the self-exclusion used by updates) and then
/// pairwise against each other. The full list is returned so callers
/// can report all problems at once; an empty report means the set is
/// safe to commit.
pub fn find_conflicts(
    candidates: &[SlotCandidate],
    existing: &[SlotCandidate],
    exclude_ids: &[Uuid],
) -> ConflictReport {
    let excluded: HashSet<Uuid> = exclude_ids.iter().copied().collect();
    let mut conflicts = Vec::new();

    for (i, candidate) in candidates.iter().enumerate() {
        for row in existing {
            if row.id.is_some_and(|id| excluded.contains(&id)) {
                continue;
            }
            if candidate.id.is_some() && candidate.id == row.id {
                continue;
            }
            conflicts.extend(check_pair(candidate, i, row, None));
        }
        for (j, other) in candidates.iter().enumerate().skip(i + 1) {
            conflicts.extend(check_pair(candidate, i, other, Some(j)));
        }
    }

    ConflictReport { conflicts }
}
