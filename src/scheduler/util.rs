use super::SchedError;
use crate::calendar::unix_days;
use crate::model::{RoleId, ShiftAssignment, ShiftId, ShiftType, ShiftTypeId};
use crate::snapshot::Snapshot;
use crate::storage::Store;
use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::SeedableRng;

pub(super) fn overlaps(a_start: i64, a_end: i64, b_start: i64, b_end: i64) -> bool {
    a_start < b_end && b_start < a_end
}

/// Intervalle absolu en minutes (depuis l'époque) d'un shift daté.
pub(super) fn shift_interval(date: NaiveDate, shift_type: &ShiftType) -> (i64, i64) {
    let base = unix_days(date) * 24 * 60;
    let (start, end) = shift_type.bounds_minutes();
    (base + i64::from(start), base + i64::from(end))
}

/// Affectations d'un rôle sur un type de shift parmi `shifts`.
pub(super) fn count_role<'a>(
    snapshot: &Snapshot,
    shifts: impl IntoIterator<Item = &'a ShiftAssignment>,
    shift_type: &ShiftTypeId,
    role: &RoleId,
) -> u32 {
    shifts
        .into_iter()
        .filter(|s| s.is_shift_type(shift_type))
        .filter(|s| snapshot.role_of(&s.employee_id) == Some(role))
        .count() as u32
}

pub(super) fn rng_from(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

pub(super) fn find_shift<S: Store + ?Sized>(
    store: &S,
    date: NaiveDate,
    id: &ShiftId,
) -> Result<ShiftAssignment, SchedError> {
    store
        .shifts_for_date(date)?
        .into_iter()
        .find(|s| &s.id == id)
        .ok_or_else(|| SchedError::UnknownShift(id.as_str().to_string()))
}
