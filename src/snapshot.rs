//! Vue en lecture seule du store, capturée une fois par exécution.
//!
//! Le moteur et les patterns ne lisent que cette vue : pas d'état global,
//! l'appelant rafraîchit la capture entre deux exécutions.

use crate::model::{
    calculate_shift_duration, Constraints, Employee, EmployeeId, PolicySettings, Role, RoleId,
    RotationSettings, ShiftAssignment, ShiftRules, ShiftType, ShiftTypeId,
};
use crate::pattern::Template;
use crate::storage::Store;
use anyhow::Context;
use chrono::NaiveDate;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub employees: Vec<Employee>,
    pub roles: Vec<Role>,
    pub shift_types: Vec<ShiftType>,
    pub rules: ShiftRules,
    pub rotation: RotationSettings,
    pub policy: PolicySettings,
    pub templates: Vec<Template>,
    shifts: BTreeMap<NaiveDate, Vec<ShiftAssignment>>,
}

impl Snapshot {
    pub fn capture<S: Store + ?Sized>(store: &S) -> anyhow::Result<Self> {
        let mut shifts: BTreeMap<NaiveDate, Vec<ShiftAssignment>> = BTreeMap::new();
        for shift in store.all_shifts().context("loading shifts")? {
            shifts.entry(shift.date).or_default().push(shift);
        }
        Ok(Self {
            employees: store.employees().context("loading employees")?,
            roles: store.roles().context("loading roles")?,
            shift_types: store.shift_types().context("loading shift types")?,
            rules: store.shift_rules().context("loading shift rules")?,
            rotation: store.rotation_settings().context("loading rotation settings")?,
            policy: store.policy_settings().context("loading policy settings")?,
            templates: store.shift_templates().context("loading templates")?,
            shifts,
        })
    }

    /// Remplace les shifts de la vue (utile pour rejouer une analyse).
    pub fn with_shifts(mut self, shifts: impl IntoIterator<Item = ShiftAssignment>) -> Self {
        self.shifts.clear();
        for shift in shifts {
            self.shifts.entry(shift.date).or_default().push(shift);
        }
        self
    }

    pub fn constraints(&self) -> &Constraints {
        &self.rules.constraints
    }

    pub fn employee(&self, id: &EmployeeId) -> Option<&Employee> {
        self.employees.iter().find(|e| &e.id == id)
    }

    pub fn shift_type(&self, id: &ShiftTypeId) -> Option<&ShiftType> {
        self.shift_types.iter().find(|st| &st.id == id)
    }

    pub fn shift_type_by_name(&self, name: &str) -> Option<&ShiftType> {
        self.shift_types.iter().find(|st| st.name == name)
    }

    pub fn template(&self, id: &str) -> Option<&Template> {
        self.templates.iter().find(|t| t.id.as_str() == id)
    }

    /// Nom lisible d'un rôle, l'identifiant à défaut.
    pub fn role_name(&self, id: &RoleId) -> String {
        self.roles
            .iter()
            .find(|r| &r.id == id)
            .map_or_else(|| id.to_string(), |r| r.name.clone())
    }

    pub fn shifts_for_date(&self, date: NaiveDate) -> &[ShiftAssignment] {
        self.shifts.get(&date).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn all_shifts(&self) -> impl Iterator<Item = &ShiftAssignment> {
        self.shifts.values().flatten()
    }

    /// Shifts dont la date est dans `[from, to]`.
    pub fn shifts_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> impl Iterator<Item = &ShiftAssignment> {
        self.shifts
            .iter()
            .filter(move |(date, _)| **date >= from && **date <= to)
            .flat_map(|(_, day)| day.iter())
    }

    /// Rôle d'un employé déjà affecté (`None` s'il n'est plus dans la liste).
    pub fn role_of(&self, employee: &EmployeeId) -> Option<&RoleId> {
        self.employee(employee).map(|e| &e.role_id)
    }

    pub fn duration_of(&self, shift: &ShiftAssignment) -> f64 {
        calculate_shift_duration(shift.shift_type_id.as_ref().and_then(|id| self.shift_type(id)))
    }

    /// Heures déjà affectées à un employé sur une journée.
    pub fn daily_hours(&self, employee: &EmployeeId, date: NaiveDate) -> f64 {
        self.shifts_for_date(date)
            .iter()
            .filter(|s| &s.employee_id == employee)
            .map(|s| self.duration_of(s))
            .sum()
    }

    /// Heures de la semaine de 7 jours commençant à `week_start`.
    pub fn weekly_hours(&self, employee: &EmployeeId, week_start: NaiveDate) -> f64 {
        let week_end = week_start + chrono::Duration::days(6);
        self.shifts_between(week_start, week_end)
            .filter(|s| &s.employee_id == employee)
            .map(|s| self.duration_of(s))
            .sum()
    }

    pub fn shift_count_between(&self, employee: &EmployeeId, from: NaiveDate, to: NaiveDate) -> usize {
        self.shifts_between(from, to)
            .filter(|s| &s.employee_id == employee)
            .count()
    }
}
