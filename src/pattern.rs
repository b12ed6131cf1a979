use crate::calendar::{day_name, days_between, is_weekend};
use crate::model::{
    Employee, EmployeeId, RoleId, ShiftAssignment, ShiftId, ShiftStatus, ShiftTypeId, TemplateId,
};
use crate::scheduler::SchedError;
use crate::snapshot::Snapshot;
use crate::storage::Store;
use crate::validation::validate_assignment;
use anyhow::{bail, Result};
use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

pub const PATTERN_ASSIGNER: &str = "PatternEngine";

/// Description complète d'un template de pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub id: TemplateId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub pattern: Pattern,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "pattern_type", rename_all = "lowercase")]
pub enum Pattern {
    Rotating(RotatingConfig),
    Fixed(FixedConfig),
    Split(SplitConfig),
    Custom(CustomConfig),
}

impl Pattern {
    pub fn kind(&self) -> &'static str {
        match self {
            Pattern::Rotating(_) => "rotating",
            Pattern::Fixed(_) => "fixed",
            Pattern::Split(_) => "split",
            Pattern::Custom(_) => "custom",
        }
    }
}

impl Template {
    pub fn validate(&self) -> Result<()> {
        if self.id.as_str().trim().is_empty() {
            bail!("template id cannot be empty");
        }
        if self.name.trim().is_empty() {
            bail!("template name cannot be empty");
        }
        match &self.pattern {
            Pattern::Rotating(cfg) => {
                if cfg.pattern.is_empty() {
                    bail!("rotating pattern must contain at least one day");
                }
            }
            Pattern::Fixed(cfg) => {
                for day in cfg.weekly_schedule.keys() {
                    if !is_day_name(day) {
                        bail!("unknown day name in weekly schedule: {day}");
                    }
                }
            }
            Pattern::Split(cfg) => {
                if cfg.shift_rotation.is_empty() {
                    bail!("split pattern must list at least one shift type");
                }
            }
            Pattern::Custom(cfg) => {
                for rule in &cfg.custom_rules {
                    rule.validate()?;
                }
            }
        }
        Ok(())
    }
}

/// Choix du type de shift dans une rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShiftAssignmentRule {
    /// Table rôle → type de shift, puis type par défaut.
    RoleBased,
    /// Tourne sur la liste des types de shift.
    Rotation,
    #[default]
    Default,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotatingConfig {
    pub pattern: Vec<u8>,
    pub offset: usize,
    pub shift_assignment: ShiftAssignmentRule,
    pub role_shift_mapping: BTreeMap<RoleId, ShiftTypeId>,
    pub default_shift_type_id: Option<ShiftTypeId>,
}

impl Default for RotatingConfig {
    fn default() -> Self {
        Self {
            // 2 jours travaillés, 2 jours de repos
            pattern: vec![1, 1, 0, 0],
            offset: 0,
            shift_assignment: ShiftAssignmentRule::Default,
            role_shift_mapping: BTreeMap::new(),
            default_shift_type_id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedAssignment {
    pub employee_id: EmployeeId,
    pub shift_type_id: ShiftTypeId,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixedConfig {
    /// Nom de jour anglais → affectations de ce jour.
    pub weekly_schedule: BTreeMap<String, Vec<FixedAssignment>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Noms de types de shift.
    pub shift_rotation: Vec<String>,
    pub include_weekends: bool,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            shift_rotation: vec!["Morning".into(), "Evening".into(), "Night".into()],
            include_weekends: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomConfig {
    pub custom_rules: Vec<CustomRule>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Règle de pattern personnalisé ; les listes vides ne filtrent pas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomRule {
    pub id: String,
    pub shift_type_id: ShiftTypeId,
    #[serde(default)]
    pub day_of_week: Vec<String>,
    #[serde(default)]
    pub frequency: Option<u32>,
    #[serde(default)]
    pub date_range: Option<DateRange>,
    #[serde(default)]
    pub role_ids: Vec<RoleId>,
    #[serde(default)]
    pub department_ids: Vec<String>,
    #[serde(default)]
    pub employee_ids: Vec<EmployeeId>,
    #[serde(default)]
    pub max_assignments: Option<u32>,
    #[serde(default)]
    pub probability: Option<f64>,
}

impl CustomRule {
    fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            bail!("custom rule id cannot be empty");
        }
        if let Some(p) = self.probability {
            if !(0.0..=1.0).contains(&p) {
                bail!("rule {}: probability must be within [0, 1]", self.id);
            }
        }
        if let Some(range) = self.date_range {
            if range.end < range.start {
                bail!("rule {}: date range end must not precede start", self.id);
            }
        }
        if let Some(day) = self.day_of_week.iter().find(|d| !is_day_name(d)) {
            bail!("rule {}: unknown day name {day}", self.id);
        }
        Ok(())
    }

    /// Le jour `day_index` (depuis le début du pattern) est-il visé ?
    pub fn matches(&self, date: NaiveDate, day_index: u32) -> bool {
        if !self.day_of_week.is_empty() && !self.day_of_week.iter().any(|d| d == day_name(date)) {
            return false;
        }
        if let Some(freq) = self.frequency {
            if freq > 1 && day_index % freq != 0 {
                return false;
            }
        }
        if let Some(range) = self.date_range {
            if !range.contains(date) {
                return false;
            }
        }
        true
    }

    pub fn applies_to(&self, employee: &Employee) -> bool {
        (self.role_ids.is_empty() || self.role_ids.contains(&employee.role_id))
            && (self.department_ids.is_empty()
                || employee
                    .department_id
                    .as_ref()
                    .is_some_and(|d| self.department_ids.contains(d)))
            && (self.employee_ids.is_empty() || self.employee_ids.contains(&employee.id))
    }
}

fn is_day_name(s: &str) -> bool {
    [
        "Sunday",
        "Monday",
        "Tuesday",
        "Wednesday",
        "Thursday",
        "Friday",
        "Saturday",
    ]
    .contains(&s)
}

/// Génère des propositions de shifts à partir d'un template, sans consulter
/// les règles de capacité.
pub struct PatternEngine<'a> {
    snapshot: &'a Snapshot,
    rng: StdRng,
}

impl<'a> PatternEngine<'a> {
    pub fn new(snapshot: &'a Snapshot) -> Self {
        Self {
            snapshot,
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn generate(
        &mut self,
        template: &Template,
        employees: &[Employee],
        start: NaiveDate,
        duration_days: u32,
    ) -> Vec<ShiftAssignment> {
        let days: Vec<NaiveDate> = start.iter_days().take(duration_days as usize).collect();
        let shifts = match &template.pattern {
            Pattern::Rotating(cfg) => self.rotating(template, cfg, employees, &days),
            Pattern::Fixed(cfg) => self.fixed(template, cfg, employees, &days),
            Pattern::Split(cfg) => self.split(template, cfg, employees, &days),
            Pattern::Custom(cfg) => self.custom(template, cfg, employees, &days),
        };
        tracing::debug!(
            template = %template.id,
            kind = template.pattern.kind(),
            generated = shifts.len(),
            "pattern generated"
        );
        shifts
    }

    fn rotating(
        &self,
        template: &Template,
        cfg: &RotatingConfig,
        employees: &[Employee],
        days: &[NaiveDate],
    ) -> Vec<ShiftAssignment> {
        let mut out = Vec::new();
        if cfg.pattern.is_empty() {
            return out;
        }
        for (d, date) in days.iter().enumerate() {
            for (i, employee) in employees.iter().enumerate() {
                let rotation_day = (d + i * cfg.offset) % cfg.pattern.len();
                if cfg.pattern[rotation_day] == 0 {
                    continue;
                }
                match self.rotating_shift_type(cfg, employee, d, i) {
                    Some(st) => out.push(self.pattern_shift(template, *date, employee, st)),
                    None => tracing::debug!(
                        employee = %employee.id,
                        date = %date,
                        "no shift type resolved for rotation day"
                    ),
                }
            }
        }
        out
    }

    fn rotating_shift_type(
        &self,
        cfg: &RotatingConfig,
        employee: &Employee,
        day: usize,
        index: usize,
    ) -> Option<ShiftTypeId> {
        match cfg.shift_assignment {
            ShiftAssignmentRule::RoleBased => cfg
                .role_shift_mapping
                .get(&employee.role_id)
                .or(cfg.default_shift_type_id.as_ref())
                .cloned(),
            ShiftAssignmentRule::Rotation => {
                let types = &self.snapshot.shift_types;
                if types.is_empty() {
                    cfg.default_shift_type_id.clone()
                } else {
                    Some(types[(day + index) % types.len()].id.clone())
                }
            }
            ShiftAssignmentRule::Default => cfg.default_shift_type_id.clone(),
        }
    }

    fn fixed(
        &self,
        template: &Template,
        cfg: &FixedConfig,
        employees: &[Employee],
        days: &[NaiveDate],
    ) -> Vec<ShiftAssignment> {
        let mut out = Vec::new();
        for date in days {
            let Some(entries) = cfg.weekly_schedule.get(day_name(*date)) else {
                continue;
            };
            for entry in entries {
                if let Some(employee) = employees.iter().find(|e| e.id == entry.employee_id) {
                    out.push(self.pattern_shift(
                        template,
                        *date,
                        employee,
                        entry.shift_type_id.clone(),
                    ));
                }
            }
        }
        out
    }

    fn split(
        &self,
        template: &Template,
        cfg: &SplitConfig,
        employees: &[Employee],
        days: &[NaiveDate],
    ) -> Vec<ShiftAssignment> {
        let mut out = Vec::new();
        if cfg.shift_rotation.is_empty() {
            return out;
        }
        for (d, date) in days.iter().enumerate() {
            if is_weekend(*date) && !cfg.include_weekends {
                continue;
            }
            for (i, employee) in employees.iter().enumerate() {
                let name = &cfg.shift_rotation[(d + i) % cfg.shift_rotation.len()];
                if let Some(st) = self.snapshot.shift_type_by_name(name) {
                    out.push(self.pattern_shift(template, *date, employee, st.id.clone()));
                }
            }
        }
        out
    }

    fn custom(
        &mut self,
        template: &Template,
        cfg: &CustomConfig,
        employees: &[Employee],
        days: &[NaiveDate],
    ) -> Vec<ShiftAssignment> {
        let mut out: Vec<ShiftAssignment> = Vec::new();
        for (d, date) in days.iter().enumerate() {
            for rule in &cfg.custom_rules {
                if !rule.matches(*date, d as u32) {
                    continue;
                }
                for employee in employees.iter().filter(|e| rule.applies_to(e)) {
                    if !self.under_rule_cap(rule, employee, &out) {
                        continue;
                    }
                    if let Some(p) = rule.probability {
                        if p < 1.0 && self.rng.random::<f64>() >= p {
                            continue;
                        }
                    }
                    let mut shift =
                        self.pattern_shift(template, *date, employee, rule.shift_type_id.clone());
                    shift.rule_id = Some(rule.id.clone());
                    out.push(shift);
                }
            }
        }
        out
    }

    /// Plafond `max_assignments` : shifts déjà stockés + générés dans ce passage.
    fn under_rule_cap(&self, rule: &CustomRule, employee: &Employee, generated: &[ShiftAssignment]) -> bool {
        let Some(cap) = rule.max_assignments.filter(|c| *c > 0) else {
            return true;
        };
        let tagged = |s: &&ShiftAssignment| {
            s.employee_id == employee.id && s.rule_id.as_deref() == Some(rule.id.as_str())
        };
        let count = self.snapshot.all_shifts().filter(tagged).count()
            + generated.iter().filter(tagged).count();
        count < cap as usize
    }

    fn pattern_shift(
        &self,
        template: &Template,
        date: NaiveDate,
        employee: &Employee,
        shift_type_id: ShiftTypeId,
    ) -> ShiftAssignment {
        ShiftAssignment {
            id: ShiftId::proposal(date, &employee.id, &shift_type_id),
            date,
            employee_id: employee.id.clone(),
            employee_name: Some(employee.name.clone()),
            shift_type_name: self.snapshot.shift_type(&shift_type_id).map(|st| st.name.clone()),
            shift_type_id: Some(shift_type_id),
            shift_type: None,
            role_id: Some(employee.role_id.clone()),
            status: ShiftStatus::Scheduled,
            covered_by: None,
            swap: None,
            assigned_by: Some(PATTERN_ASSIGNER.to_string()),
            assigned_at: None,
            pattern_id: Some(template.id.clone()),
            rule_id: None,
        }
    }
}

/// Dédoublonne par (date, employé) en gardant le premier, puis écarte les
/// propositions refusées par la validation.
pub fn validate_and_optimize_shifts(
    snapshot: &Snapshot,
    shifts: Vec<ShiftAssignment>,
) -> Vec<ShiftAssignment> {
    let mut seen: HashSet<(NaiveDate, EmployeeId)> = HashSet::new();
    shifts
        .into_iter()
        .filter(|s| seen.insert((s.date, s.employee_id.clone())))
        .filter(|s| match &s.shift_type_id {
            Some(st) => validate_assignment(snapshot, st, &s.employee_id, s.date).is_ok(),
            None => false,
        })
        .collect()
}

/// Génère, sans les valider, les shifts d'un template sur une vue capturée.
fn generate_pattern(
    snapshot: &Snapshot,
    template_id: &str,
    start: NaiveDate,
    duration_days: u32,
    employee_ids: Option<&[EmployeeId]>,
    seed: Option<u64>,
) -> Result<Vec<ShiftAssignment>, SchedError> {
    let template = snapshot
        .template(template_id)
        .ok_or_else(|| SchedError::UnknownTemplate(template_id.to_string()))?;
    template.validate()?;

    let employees: Vec<Employee> = match employee_ids {
        Some(ids) => snapshot
            .employees
            .iter()
            .filter(|e| ids.contains(&e.id))
            .cloned()
            .collect(),
        None => snapshot.employees.clone(),
    };

    let mut engine = PatternEngine::new(snapshot);
    if let Some(seed) = seed {
        engine = engine.with_seed(seed);
    }
    Ok(engine.generate(template, &employees, start, duration_days))
}

/// Génère et valide les shifts d'un template sur une vue capturée.
pub fn plan_pattern(
    snapshot: &Snapshot,
    template_id: &str,
    start: NaiveDate,
    duration_days: u32,
    employee_ids: Option<&[EmployeeId]>,
    seed: Option<u64>,
) -> Result<Vec<ShiftAssignment>, SchedError> {
    let shifts = generate_pattern(snapshot, template_id, start, duration_days, employee_ids, seed)?;
    Ok(validate_and_optimize_shifts(snapshot, shifts))
}

/// Applique un template (sans persistance) à partir de l'état courant du store.
///
/// Avec la même graine, le résultat est celui qu'écrirait [`bulk_apply_pattern`]
/// sans `overwrite`.
pub fn apply_pattern<S: Store + ?Sized>(
    store: &S,
    template_id: &str,
    start: NaiveDate,
    duration_days: u32,
    employee_ids: Option<&[EmployeeId]>,
    seed: Option<u64>,
) -> Result<Vec<ShiftAssignment>, SchedError> {
    let snapshot = Snapshot::capture(store)?;
    plan_pattern(&snapshot, template_id, start, duration_days, employee_ids, seed)
}

#[derive(Debug, Clone, Default)]
pub struct BulkApplyOptions {
    pub employee_ids: Option<Vec<EmployeeId>>,
    /// Remplace les shifts existants de l'employé ce jour-là.
    pub overwrite: bool,
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BulkApplyOutcome {
    Success {
        shifts_generated: usize,
        shifts_written: usize,
        message: String,
    },
    Failure {
        error: String,
    },
}

impl BulkApplyOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, BulkApplyOutcome::Success { .. })
    }
}

/// Génère puis persiste un template sur `[start, end)`.
pub fn bulk_apply_pattern<S: Store + ?Sized>(
    store: &mut S,
    template_id: &str,
    start: NaiveDate,
    end: NaiveDate,
    opts: &BulkApplyOptions,
) -> BulkApplyOutcome {
    match bulk_apply_inner(store, template_id, start, end, opts) {
        Ok((generated, written)) => BulkApplyOutcome::Success {
            shifts_generated: generated,
            shifts_written: written,
            message: format!("Successfully generated {generated} shifts using pattern"),
        },
        Err(err) => {
            tracing::warn!(template = template_id, error = %err, "bulk pattern application failed");
            BulkApplyOutcome::Failure {
                error: err.to_string(),
            }
        }
    }
}

fn bulk_apply_inner<S: Store + ?Sized>(
    store: &mut S,
    template_id: &str,
    start: NaiveDate,
    end: NaiveDate,
    opts: &BulkApplyOptions,
) -> Result<(usize, usize), SchedError> {
    if end < start {
        return Err(SchedError::InvalidDateRange { start, end });
    }
    let duration = u32::try_from(days_between(start, end)).map_err(anyhow::Error::from)?;
    let snapshot = Snapshot::capture(&*store)?;
    let raw = generate_pattern(
        &snapshot,
        template_id,
        start,
        duration,
        opts.employee_ids.as_deref(),
        opts.seed,
    )?;
    let shifts = if opts.overwrite {
        // on valide contre l'état où les shifts remplacés ont disparu
        let replaced: HashSet<(NaiveDate, EmployeeId)> = raw
            .iter()
            .map(|s| (s.date, s.employee_id.clone()))
            .collect();
        let remaining: Vec<ShiftAssignment> = snapshot
            .all_shifts()
            .filter(|s| !replaced.contains(&(s.date, s.employee_id.clone())))
            .cloned()
            .collect();
        let view = snapshot.clone().with_shifts(remaining);
        validate_and_optimize_shifts(&view, raw)
    } else {
        validate_and_optimize_shifts(&snapshot, raw)
    };

    let generated = shifts.len();
    let mut written = 0;
    for shift in shifts {
        let date = shift.date;
        let existing: Vec<ShiftId> = store
            .shifts_for_date(date)?
            .into_iter()
            .filter(|s| s.employee_id == shift.employee_id)
            .map(|s| s.id)
            .collect();
        if !existing.is_empty() && !opts.overwrite {
            continue;
        }
        // ajout d'abord : un échec laisse les anciens shifts en place
        store.add_shift(date, shift)?;
        for id in &existing {
            store.delete_shift(date, id)?;
        }
        written += 1;
    }
    Ok((generated, written))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayPatternCoverage {
    pub shifts_scheduled: usize,
    pub employees_working: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmployeePatternLoad {
    pub name: String,
    pub total_shifts: usize,
    pub shift_dates: Vec<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShiftTypeShare {
    pub name: String,
    pub count: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternCoverage {
    pub total_shifts: usize,
    pub coverage: BTreeMap<NaiveDate, DayPatternCoverage>,
    pub employee_workload: BTreeMap<EmployeeId, EmployeePatternLoad>,
    pub shift_distribution: BTreeMap<ShiftTypeId, ShiftTypeShare>,
}

/// Analyse ce que produirait un template : couverture par jour, charge, répartition.
pub fn analyze_pattern_coverage(
    snapshot: &Snapshot,
    template_id: &str,
    start: NaiveDate,
    duration_days: u32,
    seed: Option<u64>,
) -> Result<PatternCoverage, SchedError> {
    let shifts = plan_pattern(snapshot, template_id, start, duration_days, None, seed)?;
    let total = shifts.len();

    let coverage = start
        .iter_days()
        .take(duration_days as usize)
        .map(|date| {
            let day: Vec<&ShiftAssignment> = shifts.iter().filter(|s| s.date == date).collect();
            let working: HashSet<&EmployeeId> = day.iter().map(|s| &s.employee_id).collect();
            (
                date,
                DayPatternCoverage {
                    shifts_scheduled: day.len(),
                    employees_working: working.len(),
                },
            )
        })
        .collect();

    let employee_workload = snapshot
        .employees
        .iter()
        .map(|e| {
            let dates: Vec<NaiveDate> = shifts
                .iter()
                .filter(|s| s.employee_id == e.id)
                .map(|s| s.date)
                .collect();
            (
                e.id.clone(),
                EmployeePatternLoad {
                    name: e.name.clone(),
                    total_shifts: dates.len(),
                    shift_dates: dates,
                },
            )
        })
        .collect();

    let shift_distribution = snapshot
        .shift_types
        .iter()
        .map(|st| {
            let count = shifts.iter().filter(|s| s.is_shift_type(&st.id)).count();
            let percentage = if total == 0 {
                0.0
            } else {
                count as f64 / total as f64 * 100.0
            };
            (
                st.id.clone(),
                ShiftTypeShare {
                    name: st.name.clone(),
                    count,
                    percentage,
                },
            )
        })
        .collect();

    Ok(PatternCoverage {
        total_shifts: total,
        coverage,
        employee_workload,
        shift_distribution,
    })
}

/// Rotations classiques prêtes à l'emploi (le type de shift reste à renseigner).
pub fn predefined_patterns() -> Vec<Template> {
    let rotating = |id: &str, name: &str, description: &str, pattern: &[u8]| Template {
        id: TemplateId::new(id),
        name: name.to_string(),
        description: Some(description.to_string()),
        pattern: Pattern::Rotating(RotatingConfig {
            pattern: pattern.to_vec(),
            ..RotatingConfig::default()
        }),
    };
    vec![
        rotating(
            "continental",
            "Continental Rotation",
            "2-2-3 rotating schedule (2 days on, 2 off, 3 on, 2 off, 2 on, 3 off)",
            &[1, 1, 0, 0, 1, 1, 1, 0, 0, 1, 1, 0, 0, 0],
        ),
        rotating(
            "panama",
            "Panama Schedule",
            "2-2-3 schedule with 12-hour shifts",
            &[1, 1, 0, 0, 1, 1, 1],
        ),
        rotating(
            "dupont",
            "DuPont Schedule",
            "4-day rotation with day and night shifts",
            &[1, 1, 1, 1, 0, 0, 0],
        ),
        rotating(
            "pitman",
            "Pitman Schedule",
            "2-3-2 rotating schedule",
            &[1, 1, 0, 1, 1, 1, 0, 0, 1, 1, 0, 1, 1, 1],
        ),
        rotating(
            "4-10",
            "4-10 Compressed",
            "4 days on, 10 hours each, 3 days off",
            &[1, 1, 1, 1, 0, 0, 0],
        ),
    ]
}
