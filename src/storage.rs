use crate::model::{
    Employee, PolicySettings, Role, RotationSettings, Settings, ShiftAssignment, ShiftId,
    ShiftRules, ShiftType,
};
use crate::pattern::Template;
use anyhow::{bail, Context};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Accès aux données de référence et aux shifts, indexés par jour.
pub trait Store {
    fn employees(&self) -> anyhow::Result<Vec<Employee>>;
    fn roles(&self) -> anyhow::Result<Vec<Role>>;
    fn shift_types(&self) -> anyhow::Result<Vec<ShiftType>>;
    fn shift_rules(&self) -> anyhow::Result<ShiftRules>;
    fn rotation_settings(&self) -> anyhow::Result<RotationSettings>;
    fn policy_settings(&self) -> anyhow::Result<PolicySettings>;
    fn shift_templates(&self) -> anyhow::Result<Vec<Template>>;

    fn shifts_for_date(&self, date: NaiveDate) -> anyhow::Result<Vec<ShiftAssignment>>;
    fn all_shifts(&self) -> anyhow::Result<Vec<ShiftAssignment>>;

    /// Ajoute un shift ; le store génère l'identifiant et horodate l'affectation.
    fn add_shift(&mut self, date: NaiveDate, shift: ShiftAssignment) -> anyhow::Result<ShiftId>;
    fn update_shift(&mut self, date: NaiveDate, shift: ShiftAssignment) -> anyhow::Result<()>;
    fn delete_shift(&mut self, date: NaiveDate, id: &ShiftId) -> anyhow::Result<()>;
}

/// Contenu persistant : réglages + shifts par date.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreData {
    pub settings: Settings,
    pub shifts: BTreeMap<NaiveDate, Vec<ShiftAssignment>>,
}

impl StoreData {
    fn add(&mut self, date: NaiveDate, mut shift: ShiftAssignment) -> ShiftId {
        let id = ShiftId::random();
        shift.id = id.clone();
        shift.date = date;
        if shift.assigned_at.is_none() {
            shift.assigned_at = Some(Utc::now());
        }
        self.shifts.entry(date).or_default().push(shift);
        id
    }

    fn update(&mut self, date: NaiveDate, shift: ShiftAssignment) -> anyhow::Result<()> {
        let Some(day) = self.shifts.get_mut(&date) else {
            bail!("no shifts stored for {date}");
        };
        let Some(slot) = day.iter_mut().find(|s| s.id == shift.id) else {
            bail!("unknown shift {} on {date}", shift.id);
        };
        *slot = shift;
        Ok(())
    }

    fn delete(&mut self, date: NaiveDate, id: &ShiftId) {
        if let Some(day) = self.shifts.get_mut(&date) {
            day.retain(|s| &s.id != id);
            if day.is_empty() {
                self.shifts.remove(&date);
            }
        }
    }
}

/// Store en mémoire (tests, aperçus).
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    data: StoreData,
}

impl MemoryStore {
    pub fn new(settings: Settings) -> Self {
        Self {
            data: StoreData {
                settings,
                shifts: BTreeMap::new(),
            },
        }
    }

    pub fn from_data(data: StoreData) -> Self {
        Self { data }
    }

    pub fn data(&self) -> &StoreData {
        &self.data
    }

    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.data.settings
    }
}

impl Store for MemoryStore {
    fn employees(&self) -> anyhow::Result<Vec<Employee>> {
        Ok(self.data.settings.employees.clone())
    }
    fn roles(&self) -> anyhow::Result<Vec<Role>> {
        Ok(self.data.settings.roles.clone())
    }
    fn shift_types(&self) -> anyhow::Result<Vec<ShiftType>> {
        Ok(self.data.settings.shift_types.clone())
    }
    fn shift_rules(&self) -> anyhow::Result<ShiftRules> {
        Ok(self.data.settings.shift_rules.clone())
    }
    fn rotation_settings(&self) -> anyhow::Result<RotationSettings> {
        Ok(self.data.settings.rotation_settings.clone())
    }
    fn policy_settings(&self) -> anyhow::Result<PolicySettings> {
        Ok(self.data.settings.policy.clone())
    }
    fn shift_templates(&self) -> anyhow::Result<Vec<Template>> {
        Ok(self.data.settings.shift_templates.clone())
    }

    fn shifts_for_date(&self, date: NaiveDate) -> anyhow::Result<Vec<ShiftAssignment>> {
        Ok(self.data.shifts.get(&date).cloned().unwrap_or_default())
    }
    fn all_shifts(&self) -> anyhow::Result<Vec<ShiftAssignment>> {
        Ok(self.data.shifts.values().flatten().cloned().collect())
    }

    fn add_shift(&mut self, date: NaiveDate, shift: ShiftAssignment) -> anyhow::Result<ShiftId> {
        Ok(self.data.add(date, shift))
    }
    fn update_shift(&mut self, date: NaiveDate, shift: ShiftAssignment) -> anyhow::Result<()> {
        self.data.update(date, shift)
    }
    fn delete_shift(&mut self, date: NaiveDate, id: &ShiftId) -> anyhow::Result<()> {
        self.data.delete(date, id);
        Ok(())
    }
}

/// Store fichier JSON, réécrit de manière atomique à chaque mutation.
#[derive(Debug)]
pub struct JsonStorage {
    path: PathBuf,
    inner: MemoryStore,
}

impl JsonStorage {
    /// Ouvre le fichier ; un fichier absent donne un store vide.
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let data = if path.exists() {
            let raw = fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_slice(&raw)
                .with_context(|| format!("parsing {}", path.display()))?
        } else {
            StoreData::default()
        };
        Ok(Self {
            path,
            inner: MemoryStore::from_data(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn data(&self) -> &StoreData {
        self.inner.data()
    }

    /// Sauvegarde de manière atomique.
    pub fn save(&self) -> anyhow::Result<()> {
        let json = serde_json::to_vec_pretty(self.inner.data())?;
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir).with_context(|| "creating temp file")?;
        tmp.write_all(&json)?;
        tmp.flush()?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).with_context(|| "atomic rename")?;
        Ok(())
    }
}

impl Store for JsonStorage {
    fn employees(&self) -> anyhow::Result<Vec<Employee>> {
        self.inner.employees()
    }
    fn roles(&self) -> anyhow::Result<Vec<Role>> {
        self.inner.roles()
    }
    fn shift_types(&self) -> anyhow::Result<Vec<ShiftType>> {
        self.inner.shift_types()
    }
    fn shift_rules(&self) -> anyhow::Result<ShiftRules> {
        self.inner.shift_rules()
    }
    fn rotation_settings(&self) -> anyhow::Result<RotationSettings> {
        self.inner.rotation_settings()
    }
    fn policy_settings(&self) -> anyhow::Result<PolicySettings> {
        self.inner.policy_settings()
    }
    fn shift_templates(&self) -> anyhow::Result<Vec<Template>> {
        self.inner.shift_templates()
    }

    fn shifts_for_date(&self, date: NaiveDate) -> anyhow::Result<Vec<ShiftAssignment>> {
        self.inner.shifts_for_date(date)
    }
    fn all_shifts(&self) -> anyhow::Result<Vec<ShiftAssignment>> {
        self.inner.all_shifts()
    }

    fn add_shift(&mut self, date: NaiveDate, shift: ShiftAssignment) -> anyhow::Result<ShiftId> {
        let id = self.inner.add_shift(date, shift)?;
        self.save()?;
        Ok(id)
    }
    fn update_shift(&mut self, date: NaiveDate, shift: ShiftAssignment) -> anyhow::Result<()> {
        self.inner.update_shift(date, shift)?;
        self.save()
    }
    fn delete_shift(&mut self, date: NaiveDate, id: &ShiftId) -> anyhow::Result<()> {
        self.inner.delete_shift(date, id)?;
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Employee, ShiftType, ShiftTypeId};
    use chrono::NaiveTime;

    fn sample(date: NaiveDate) -> ShiftAssignment {
        let emp = Employee::new("emp_1", "Alice", "nurse");
        let st = ShiftType::new(
            "morning",
            "Morning",
            NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(16, 0, 0).unwrap(),
        );
        ShiftAssignment::scheduled(date, &emp, &st, "test")
    }

    #[test]
    fn add_assigns_id_and_timestamp() {
        let date = NaiveDate::from_ymd_opt(2025, 7, 7).unwrap();
        let mut store = MemoryStore::default();
        let id = store.add_shift(date, sample(date)).unwrap();
        let day = store.shifts_for_date(date).unwrap();
        assert_eq!(day.len(), 1);
        assert_eq!(day[0].id, id);
        assert!(day[0].assigned_at.is_some());
        assert!(!id.as_str().starts_with("proposal:"));
    }

    #[test]
    fn update_and_delete() {
        let date = NaiveDate::from_ymd_opt(2025, 7, 7).unwrap();
        let mut store = MemoryStore::default();
        let id = store.add_shift(date, sample(date)).unwrap();

        let mut shift = store.shifts_for_date(date).unwrap().remove(0);
        shift.shift_type_id = Some(ShiftTypeId::new("evening"));
        store.update_shift(date, shift).unwrap();
        let stored = store.shifts_for_date(date).unwrap();
        assert!(stored[0].is_shift_type(&ShiftTypeId::new("evening")));

        store.delete_shift(date, &id).unwrap();
        assert!(store.shifts_for_date(date).unwrap().is_empty());
        assert!(store.data().shifts.is_empty());
    }

    #[test]
    fn update_unknown_shift_fails() {
        let date = NaiveDate::from_ymd_opt(2025, 7, 7).unwrap();
        let mut store = MemoryStore::default();
        assert!(store.update_shift(date, sample(date)).is_err());
    }
}
