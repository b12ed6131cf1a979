use crate::pattern::Template;
use crate::strategy::Algorithm;
use chrono::{DateTime, NaiveDate, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new<S: AsRef<str>>(s: S) -> Self {
                Self(s.as_ref().to_owned())
            }
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Identifiant fort pour Employee
    EmployeeId
);
string_id!(
    /// Identifiant fort pour Role
    RoleId
);
string_id!(
    /// Identifiant fort pour ShiftType
    ShiftTypeId
);
string_id!(
    /// Identifiant fort pour un template de pattern
    TemplateId
);
string_id!(
    /// Identifiant fort pour ShiftAssignment
    ShiftId
);

impl ShiftId {
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Identifiant stable d'une proposition pas encore persistée.
    pub fn proposal(date: NaiveDate, employee: &EmployeeId, shift_type: &ShiftTypeId) -> Self {
        Self(format!("proposal:{date}:{employee}:{shift_type}"))
    }
}

/// Employé (donnée de référence, jamais modifiée par le moteur)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub name: String,
    pub role_id: RoleId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department_id: Option<String>,
    /// Date d'entrée, sert de critère d'ancienneté.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Employee {
    pub fn new<N: Into<String>>(id: &str, name: N, role_id: &str) -> Self {
        Self {
            id: EmployeeId::new(id),
            name: name.into(),
            role_id: RoleId::new(role_id),
            department_id: None,
            created_at: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
}

impl Role {
    pub fn new<N: Into<String>>(id: &str, name: N) -> Self {
        Self {
            id: RoleId::new(id),
            name: name.into(),
        }
    }
}

/// Type de créneau (heures locales, `end <= start` = créneau de nuit)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftType {
    pub id: ShiftTypeId,
    pub name: String,
    #[serde(with = "time_of_day")]
    pub start_time: NaiveTime,
    #[serde(with = "time_of_day")]
    pub end_time: NaiveTime,
    #[serde(default = "default_priority")]
    pub priority: i32,
}

fn default_priority() -> i32 {
    1
}

impl ShiftType {
    pub fn new<N: Into<String>>(id: &str, name: N, start_time: NaiveTime, end_time: NaiveTime) -> Self {
        Self {
            id: ShiftTypeId::new(id),
            name: name.into(),
            start_time,
            end_time,
            priority: default_priority(),
        }
    }

    /// Bornes en minutes depuis minuit ; la fin passe au lendemain si besoin.
    pub fn bounds_minutes(&self) -> (u32, u32) {
        let start = self.start_time.num_seconds_from_midnight() / 60;
        let mut end = self.end_time.num_seconds_from_midnight() / 60;
        if end <= start {
            end += 24 * 60;
        }
        (start, end)
    }

    /// Durée en heures.
    pub fn duration_hours(&self) -> f64 {
        let (start, end) = self.bounds_minutes();
        f64::from(end - start) / 60.0
    }
}

/// Durée d'un type de shift, 0 si le type est inconnu.
pub fn calculate_shift_duration(shift_type: Option<&ShiftType>) -> f64 {
    shift_type.map_or(0.0, ShiftType::duration_hours)
}

/// Effectif min/max d'un rôle pour un type de shift, chaque jour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityRule {
    pub shift_type_id: ShiftTypeId,
    pub role_id: RoleId,
    pub min_required: u32,
    pub max_allowed: u32,
}

impl CapacityRule {
    pub fn new(shift_type_id: &str, role_id: &str, min_required: u32, max_allowed: u32) -> Self {
        Self {
            shift_type_id: ShiftTypeId::new(shift_type_id),
            role_id: RoleId::new(role_id),
            min_required,
            max_allowed,
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.max_allowed >= self.min_required
    }
}

/// Contraintes globales de temps de travail.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Constraints {
    pub min_hours_between: u32,
    pub max_consecutive_days: u32,
    pub max_weekly_hours: f64,
    pub max_daily_hours: f64,
}

impl Default for Constraints {
    fn default() -> Self {
        Self {
            min_hours_between: 8,
            max_consecutive_days: 7,
            max_weekly_hours: 40.0,
            max_daily_hours: 12.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShiftRules {
    pub capacity_rules: Vec<CapacityRule>,
    pub constraints: Constraints,
}

impl ShiftRules {
    pub fn rules_for<'a>(&'a self, shift_type: &'a ShiftTypeId) -> impl Iterator<Item = &'a CapacityRule> {
        self.capacity_rules
            .iter()
            .filter(move |rule| &rule.shift_type_id == shift_type)
    }

    pub fn rule_for(&self, shift_type: &ShiftTypeId, role: &RoleId) -> Option<&CapacityRule> {
        self.capacity_rules
            .iter()
            .find(|rule| &rule.shift_type_id == shift_type && &rule.role_id == role)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationSettings {
    pub enable_auto_rotation: bool,
    pub rotation_period_days: u32,
    pub rotation_start_date: Option<NaiveDate>,
    pub fairness_algorithm: Algorithm,
}

impl Default for RotationSettings {
    fn default() -> Self {
        Self {
            enable_auto_rotation: false,
            rotation_period_days: 14,
            rotation_start_date: None,
            fairness_algorithm: Algorithm::RoundRobin,
        }
    }
}

/// Jours de repos : noms de jour anglais (`Monday`) ou dates ISO.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicySettings {
    pub default_off_days: Vec<String>,
    pub employee_off_days: BTreeMap<EmployeeId, Vec<String>>,
}

impl PolicySettings {
    pub fn personal_off_days(&self, employee: &EmployeeId) -> &[String] {
        self.employee_off_days
            .get(employee)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Vrai si une entrée de repos vise `date` (par nom de jour ou date exacte).
pub fn off_day_matches(entries: &[String], date: NaiveDate) -> bool {
    let day = crate::calendar::day_name(date);
    let iso = date.format("%Y-%m-%d").to_string();
    entries.iter().any(|e| {
        let e = e.trim();
        e.eq_ignore_ascii_case(day) || e == iso
    })
}

/// Statut d'un shift (ensemble ouvert : les valeurs inconnues sont conservées).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ShiftStatus {
    #[default]
    Scheduled,
    Sick,
    Off,
    Covered,
    Open,
    SwapRequested,
    Other(String),
}

impl From<String> for ShiftStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Scheduled" => Self::Scheduled,
            "Sick" => Self::Sick,
            "Off" => Self::Off,
            "Covered" => Self::Covered,
            "Open" => Self::Open,
            "SwapRequested" => Self::SwapRequested,
            _ => Self::Other(s),
        }
    }
}

impl From<ShiftStatus> for String {
    fn from(s: ShiftStatus) -> Self {
        match s {
            ShiftStatus::Scheduled => "Scheduled".into(),
            ShiftStatus::Sick => "Sick".into(),
            ShiftStatus::Off => "Off".into(),
            ShiftStatus::Covered => "Covered".into(),
            ShiftStatus::Open => "Open".into(),
            ShiftStatus::SwapRequested => "SwapRequested".into(),
            ShiftStatus::Other(other) => other,
        }
    }
}

/// Demande d'échange en attente sur un shift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapInfo {
    pub with: EmployeeId,
    pub requested_at: DateTime<Utc>,
}

/// Affectation d'un employé à un type de shift, pour un jour calendaire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftAssignment {
    pub id: ShiftId,
    pub date: NaiveDate,
    pub employee_id: EmployeeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shift_type_id: Option<ShiftTypeId>,
    /// Libellé libre des anciennes saisies manuelles.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shift_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shift_type_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_id: Option<RoleId>,
    #[serde(default)]
    pub status: ShiftStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub covered_by: Option<EmployeeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swap: Option<SwapInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern_id: Option<TemplateId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,
}

impl ShiftAssignment {
    /// Proposition `Scheduled` complète pour `employee` sur `shift_type`.
    pub fn scheduled(
        date: NaiveDate,
        employee: &Employee,
        shift_type: &ShiftType,
        assigned_by: &str,
    ) -> Self {
        Self {
            id: ShiftId::proposal(date, &employee.id, &shift_type.id),
            date,
            employee_id: employee.id.clone(),
            employee_name: Some(employee.name.clone()),
            shift_type_id: Some(shift_type.id.clone()),
            shift_type: None,
            shift_type_name: Some(shift_type.name.clone()),
            role_id: Some(employee.role_id.clone()),
            status: ShiftStatus::Scheduled,
            covered_by: None,
            swap: None,
            assigned_by: Some(assigned_by.to_string()),
            assigned_at: None,
            pattern_id: None,
            rule_id: None,
        }
    }

    pub fn is_shift_type(&self, id: &ShiftTypeId) -> bool {
        self.shift_type_id.as_ref() == Some(id)
    }

    /// Même clé (date, employé, type de shift).
    pub fn same_slot(&self, other: &ShiftAssignment) -> bool {
        self.date == other.date
            && self.employee_id == other.employee_id
            && self.shift_type_id == other.shift_type_id
    }
}

/// Configuration complète lue depuis le store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub employees: Vec<Employee>,
    pub roles: Vec<Role>,
    pub shift_types: Vec<ShiftType>,
    pub shift_rules: ShiftRules,
    pub rotation_settings: RotationSettings,
    pub policy: PolicySettings,
    pub shift_templates: Vec<Template>,
}

/// Sérialisation `HH:MM` des heures de shift (accepte aussi `HH:MM:SS`).
mod time_of_day {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(t: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&t.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveTime::parse_from_str(&raw, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(&raw, "%H:%M:%S"))
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn overnight_duration_wraps_midnight() {
        let night = ShiftType::new("night", "Night", hm(22, 0), hm(6, 0));
        assert_eq!(night.duration_hours(), 8.0);
        let morning = ShiftType::new("morning", "Morning", hm(8, 0), hm(16, 30));
        assert_eq!(morning.duration_hours(), 8.5);
        assert_eq!(calculate_shift_duration(None), 0.0);
    }

    #[test]
    fn shift_type_accepts_short_times() {
        let raw = r#"{"id":"m","name":"Morning","start_time":"08:00","end_time":"16:00:00"}"#;
        let st: ShiftType = serde_json::from_str(raw).unwrap();
        assert_eq!(st.start_time, hm(8, 0));
        assert_eq!(st.priority, 1);
        let back = serde_json::to_string(&st).unwrap();
        assert!(back.contains(r#""end_time":"16:00""#));
    }

    #[test]
    fn unknown_status_is_preserved() {
        let s: ShiftStatus = serde_json::from_str(r#""Uncovered""#).unwrap();
        assert_eq!(s, ShiftStatus::Other("Uncovered".into()));
        assert_eq!(serde_json::to_string(&s).unwrap(), r#""Uncovered""#);
        let s: ShiftStatus = serde_json::from_str(r#""SwapRequested""#).unwrap();
        assert_eq!(s, ShiftStatus::SwapRequested);
    }

    #[test]
    fn off_days_match_names_and_dates() {
        let monday = NaiveDate::from_ymd_opt(2025, 7, 7).unwrap();
        assert!(off_day_matches(&["Monday".into()], monday));
        assert!(off_day_matches(&["2025-07-07".into()], monday));
        assert!(!off_day_matches(&["Tuesday".into()], monday));
    }
}
