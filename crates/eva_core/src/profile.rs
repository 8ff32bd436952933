//! Limits & Baseline Registry
//!
//! A [`PhysiologyProfile`] holds every number the engine uses:
//! - per-variable clamp bounds and resting baseline
//! - per-task-class target-seeking rules `(target, rate)` and flat drifts
//! - instantaneous shock events
//!
//! The shape is the stable contract; the built-in values are one profile and
//! can be swapped for a TOML file with the same layout. Profiles are validated
//! when built, so a usable profile never fails lazily mid-simulation.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::EvaError;
use crate::state::Variable;

// =============================================================================
// Building blocks
// =============================================================================

/// Inclusive clamp bounds. Missing bounds are infinite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Limits {
    pub min: f64,
    pub max: f64,
}

impl Limits {
    pub const UNBOUNDED: Limits = Limits {
        min: f64::NEG_INFINITY,
        max: f64::INFINITY,
    };

    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    #[inline]
    pub fn clamp(&self, value: f64) -> f64 {
        value.max(self.min).min(self.max)
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn is_bounded(&self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self::UNBOUNDED
    }
}

/// Per-minute target-seeking rule: move toward `target` by at most `rate`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeekRule {
    pub target: f64,
    pub rate: f64,
}

impl SeekRule {
    pub fn new(target: f64, rate: f64) -> Self {
        Self { target, rate }
    }
}

/// How a variable is updated by multi-minute tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateMode {
    /// Relaxes toward a task-specific target without overshooting.
    Seek,
    /// Accumulates a flat per-minute delta.
    Drift,
}

// =============================================================================
// Task classes
// =============================================================================

/// Multi-minute task classes, each with its own table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskClass {
    Rest,
    Low,
    Normal,
    Hard,
    Cognitive,
    Emergency,
}

impl TaskClass {
    pub const COUNT: usize = 6;

    pub const ALL: [TaskClass; Self::COUNT] = [
        TaskClass::Rest,
        TaskClass::Low,
        TaskClass::Normal,
        TaskClass::Hard,
        TaskClass::Cognitive,
        TaskClass::Emergency,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TaskClass::Rest => "rest",
            TaskClass::Low => "low",
            TaskClass::Normal => "normal",
            TaskClass::Hard => "hard",
            TaskClass::Cognitive => "cognitive",
            TaskClass::Emergency => "emergency",
        }
    }

    /// Letter used in mission task sequences.
    pub fn letter(self) -> char {
        match self {
            TaskClass::Rest => 'R',
            TaskClass::Low => 'L',
            TaskClass::Normal => 'N',
            TaskClass::Hard => 'H',
            TaskClass::Cognitive => 'C',
            TaskClass::Emergency => 'E',
        }
    }

    pub fn from_letter(letter: char) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.letter() == letter)
    }
}

impl fmt::Display for TaskClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TaskClass {
    type Err = EvaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| EvaError::missing(format!("unknown task class '{}'", s)))
    }
}

/// Update rules of one task class. A variable absent from both maps is left
/// untouched by the task.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskTable {
    pub seek: BTreeMap<Variable, SeekRule>,
    pub drift: BTreeMap<Variable, f64>,
}

impl TaskTable {
    fn from_entries(seek: &[(Variable, f64, f64)], drift: &[(Variable, f64)]) -> Self {
        Self {
            seek: seek
                .iter()
                .map(|&(v, target, rate)| (v, SeekRule::new(target, rate)))
                .collect(),
            drift: drift.iter().copied().collect(),
        }
    }
}

/// Instantaneous perturbation. `add` deltas are applied first, then `set`
/// overwrites with absolute values.
#[derive(Debug, Clone, PartialEq)]
pub struct ShockEvent {
    pub id: String,
    pub letter: char,
    pub set: BTreeMap<Variable, f64>,
    pub add: BTreeMap<Variable, f64>,
}

impl ShockEvent {
    /// Variables touched by this event.
    pub fn affected(&self) -> BTreeSet<Variable> {
        self.set.keys().chain(self.add.keys()).copied().collect()
    }
}

// =============================================================================
// Profile
// =============================================================================

/// Read-only configuration consumed by the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct PhysiologyProfile {
    baseline: [f64; Variable::COUNT],
    limits: BTreeMap<Variable, Limits>,
    tasks: [TaskTable; TaskClass::COUNT],
    shocks: BTreeMap<String, ShockEvent>,
}

impl PhysiologyProfile {
    /// Load a profile from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read profile file: {}", path.as_ref().display()))?;
        let profile = Self::from_toml_str(&content)
            .with_context(|| format!("Invalid profile: {}", path.as_ref().display()))?;
        tracing::info!(
            "Loaded physiology profile from {} ({} shock events)",
            path.as_ref().display(),
            profile.shocks.len()
        );
        Ok(profile)
    }

    /// Parse and validate a profile from TOML text.
    pub fn from_toml_str(s: &str) -> Result<Self, EvaError> {
        let file: ProfileFile = toml::from_str(s)
            .map_err(|e| EvaError::missing(format!("malformed profile: {}", e.message())))?;
        Self::try_from(file)
    }

    /// Serialize to the TOML layout accepted by [`PhysiologyProfile::from_toml_str`].
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(&ProfileFile::from(self)).context("Failed to serialize profile")
    }

    /// Resting value of `var`; also the rest task's seek target.
    pub fn baseline(&self, var: Variable) -> f64 {
        self.baseline[var.index()]
    }

    /// Clamp bounds of `var`, unbounded when the table has no entry.
    pub fn limits(&self, var: Variable) -> Limits {
        self.limits.get(&var).copied().unwrap_or_default()
    }

    pub fn task(&self, class: TaskClass) -> &TaskTable {
        &self.tasks[class as usize]
    }

    /// `(target, rate)` for `var` under `class`, if that combination seeks.
    pub fn seek_rule(&self, class: TaskClass, var: Variable) -> Option<SeekRule> {
        self.task(class).seek.get(&var).copied()
    }

    /// Flat per-minute delta for `var` under `class`, if any.
    pub fn drift(&self, class: TaskClass, var: Variable) -> Option<f64> {
        self.task(class).drift.get(&var).copied()
    }

    /// Mode `var` is updated with, or `None` if no task touches it.
    pub fn update_mode(&self, var: Variable) -> Option<UpdateMode> {
        self.tasks.iter().find_map(|t| {
            if t.seek.contains_key(&var) {
                Some(UpdateMode::Seek)
            } else if t.drift.contains_key(&var) {
                Some(UpdateMode::Drift)
            } else {
                None
            }
        })
    }

    pub fn shock(&self, id: &str) -> Option<&ShockEvent> {
        self.shocks.get(id)
    }

    pub fn shock_by_letter(&self, letter: char) -> Option<&ShockEvent> {
        self.shocks.values().find(|s| s.letter == letter)
    }

    pub fn shocks(&self) -> impl Iterator<Item = &ShockEvent> {
        self.shocks.values()
    }

    fn validate(&self) -> Result<(), EvaError> {
        for (var, limits) in &self.limits {
            if limits.min.is_nan() || limits.max.is_nan() || limits.min > limits.max {
                return Err(EvaError::missing(format!(
                    "limits for '{}' are invalid ({}, {})",
                    var, limits.min, limits.max
                )));
            }
        }
        for var in Variable::ALL {
            if !self.baseline(var).is_finite() {
                return Err(EvaError::missing(format!("baseline for '{}' is not finite", var)));
            }
        }

        let mut modes: BTreeMap<Variable, (UpdateMode, TaskClass)> = BTreeMap::new();
        for class in TaskClass::ALL {
            let table = self.task(class);
            for (var, rule) in &table.seek {
                if !rule.target.is_finite() || !rule.rate.is_finite() || rule.rate < 0.0 {
                    return Err(EvaError::missing(format!(
                        "seek rule for '{}' in task '{}' must have a finite target and a non-negative rate",
                        var, class
                    )));
                }
                check_mode(&mut modes, *var, UpdateMode::Seek, class)?;
            }
            for (var, delta) in &table.drift {
                if !delta.is_finite() {
                    return Err(EvaError::missing(format!(
                        "drift for '{}' in task '{}' is not finite",
                        var, class
                    )));
                }
                check_mode(&mut modes, *var, UpdateMode::Drift, class)?;
            }
        }

        let mut letters: BTreeSet<char> = TaskClass::ALL.iter().map(|t| t.letter()).collect();
        for shock in self.shocks.values() {
            if !letters.insert(shock.letter) {
                return Err(EvaError::missing(format!(
                    "shock '{}' reuses task letter '{}'",
                    shock.id, shock.letter
                )));
            }
            if let Some((var, _)) = shock.set.iter().chain(shock.add.iter()).find(|(_, v)| !v.is_finite()) {
                return Err(EvaError::missing(format!(
                    "shock '{}' has a non-finite value for '{}'",
                    shock.id, var
                )));
            }
        }
        Ok(())
    }
}

fn check_mode(
    modes: &mut BTreeMap<Variable, (UpdateMode, TaskClass)>,
    var: Variable,
    mode: UpdateMode,
    class: TaskClass,
) -> Result<(), EvaError> {
    match modes.get(&var) {
        Some(&(existing, first)) if existing != mode => Err(EvaError::missing(format!(
            "'{}' is {:?} in task '{}' but {:?} in task '{}'; a variable needs one update mode",
            var, existing, first, mode, class
        ))),
        Some(_) => Ok(()),
        None => {
            modes.insert(var, (mode, class));
            Ok(())
        }
    }
}

// =============================================================================
// Built-in profile
// =============================================================================

impl Default for PhysiologyProfile {
    fn default() -> Self {
        use Variable::*;

        let mut baseline = [0.0; Variable::COUNT];
        for (var, value) in [
            (HeartRate, 70.0),
            (BloodPressureSys, 120.0),
            (BloodPressureDia, 80.0),
            (RespirationRate, 12.0),
            (OxygenSaturation, 0.98),
            (BloodO2Pa, 95.0),
            (BloodCo2Pa, 40.0),
            (N2Saturation, 1.0),
            (MetabolicRate, 80.0),
            (CoreTemp, 37.0),
            (SkinTemp, 33.0),
            (SweatRate, 0.0),
            (GlucoseLevel, 90.0),
            (MuscleFatigue, 0.0),
            (CognitiveLoad, 0.0),
            (StressIndex, 0.0),
            (Fear, 0.0),
            (AdrenalineLvl, 0.0),
            (RadiationDose, 0.0),
        ] {
            baseline[var.index()] = value;
        }

        let limits = [
            (HeartRate, 40.0, 180.0),          // bradycardia to tachycardia
            (BloodPressureSys, 90.0, 180.0),
            (BloodPressureDia, 60.0, 120.0),
            (RespirationRate, 6.0, 30.0),
            (OxygenSaturation, 0.80, 1.0),     // life-threatening below 0.85
            (BloodO2Pa, 60.0, 110.0),
            (BloodCo2Pa, 30.0, 55.0),          // respiratory acidosis/alkalosis
            (N2Saturation, 0.0, 1.0),
            (MetabolicRate, 80.0, 400.0),
            (CoreTemp, 34.0, 39.0),
            (SkinTemp, 28.0, 36.0),
            (SweatRate, 0.0, 2.0),
            (GlucoseLevel, 60.0, 180.0),
            (MuscleFatigue, 0.0, 1.0),
            (CognitiveLoad, 0.0, 1.0),
            (StressIndex, 0.0, 1.0),
            (Fear, 0.0, 1.0),
            (AdrenalineLvl, 0.0, 1.0),
            (RadiationDose, 0.0, 1.0),
        ]
        .into_iter()
        .map(|(v, min, max)| (v, Limits::new(min, max)))
        .collect();

        // Suit EVA exposure, per minute outside the vehicle.
        const RADIATION: f64 = 0.00005;

        let rest = TaskTable::from_entries(
            &[
                (HeartRate, baseline[HeartRate.index()], 5.0),
                (RespirationRate, baseline[RespirationRate.index()], 3.0),
                (BloodO2Pa, baseline[BloodO2Pa.index()], 0.2),
                (BloodCo2Pa, baseline[BloodCo2Pa.index()], 1.0),
                (MetabolicRate, baseline[MetabolicRate.index()], 10.0),
                (CoreTemp, baseline[CoreTemp.index()], 0.01),
                (BloodPressureSys, baseline[BloodPressureSys.index()], 0.5),
                (BloodPressureDia, baseline[BloodPressureDia.index()], 0.5),
                (OxygenSaturation, baseline[OxygenSaturation.index()], 0.002),
                (GlucoseLevel, baseline[GlucoseLevel.index()], 0.1),
                (SkinTemp, baseline[SkinTemp.index()], 0.02),
                (SweatRate, baseline[SweatRate.index()], 0.005),
            ],
            &[
                // Suit burden keeps fatigue creeping up even at rest.
                (MuscleFatigue, 0.0005),
                (CognitiveLoad, -0.01),
                (StressIndex, -0.005),
                (Fear, -0.02),
                (AdrenalineLvl, -0.05),
                (RadiationDose, RADIATION),
            ],
        );

        let low = TaskTable::from_entries(
            &[
                (HeartRate, 80.0, 2.0),
                (RespirationRate, 15.0, 0.3),
                (MetabolicRate, 100.0, 2.0),
                (BloodPressureSys, 120.0, 0.5),
                (BloodPressureDia, 80.0, 0.5),
                (BloodCo2Pa, 45.0, 0.5),
                (OxygenSaturation, 0.975, 0.001),
                (CoreTemp, 37.05, 0.002),
                (SkinTemp, 33.2, 0.005),
                (SweatRate, 0.1, 0.005),
                (GlucoseLevel, 89.0, 0.05),
            ],
            &[
                (MuscleFatigue, 0.001),
                (CognitiveLoad, 0.001),
                (StressIndex, 0.001),
                (Fear, -0.01),
                (AdrenalineLvl, -0.02),
                (RadiationDose, RADIATION),
            ],
        );

        let normal = TaskTable::from_entries(
            &[
                (HeartRate, 110.0, 4.0),
                (RespirationRate, 22.0, 1.0),
                (MetabolicRate, 230.0, 15.0),
                (BloodPressureSys, 125.0, 0.5),
                (BloodPressureDia, 80.2, 0.02),
                (BloodO2Pa, 93.0, 0.2),
                (BloodCo2Pa, 50.0, 1.0),
                (OxygenSaturation, 0.95, 0.003),
                (CoreTemp, 37.1, 0.010),
                (SkinTemp, 33.2, 0.020),
                (SweatRate, 0.2, 0.02),
                (GlucoseLevel, 88.0, 0.20),
            ],
            &[
                (MuscleFatigue, 0.004),
                (CognitiveLoad, 0.004),
                (StressIndex, 0.003),
                (Fear, -0.005),
                (AdrenalineLvl, -0.01),
                (RadiationDose, RADIATION),
            ],
        );

        // PaCO2 target sits above its limit; the clamp wins.
        let hard = TaskTable::from_entries(
            &[
                (HeartRate, 160.0, 18.0),
                (RespirationRate, 30.0, 5.0),
                (MetabolicRate, 330.0, 50.0),
                (BloodPressureSys, 130.0, 2.0),
                (BloodPressureDia, 85.0, 1.0),
                (BloodO2Pa, 90.0, 1.0),
                (BloodCo2Pa, 57.5, 3.5),
                (OxygenSaturation, 0.94, 0.008),
                (CoreTemp, 37.15, 0.030),
                (SkinTemp, 33.3, 0.060),
                (SweatRate, 0.35, 0.07),
                (GlucoseLevel, 85.0, 0.1),
            ],
            &[
                (MuscleFatigue, 0.010),
                (CognitiveLoad, 0.008),
                (StressIndex, 0.006),
                (Fear, 0.0),
                (AdrenalineLvl, 0.005),
                (RadiationDose, RADIATION),
            ],
        );

        let cognitive = TaskTable::from_entries(
            &[
                (HeartRate, 80.0, 1.0),
                (RespirationRate, 14.0, 0.2),
                (MetabolicRate, 110.0, 3.0),
                (BloodPressureSys, 120.0, 0.1),
                (CoreTemp, 37.03, 0.003),
                (SkinTemp, 33.05, 0.005),
                (SweatRate, 0.05, 0.005),
                (BloodO2Pa, 94.0, 0.1),
                (BloodCo2Pa, 41.0, 0.1),
                (GlucoseLevel, 89.2, 0.08),
            ],
            &[
                (CognitiveLoad, 0.05),
                (StressIndex, 0.02),
                (MuscleFatigue, 0.0005),
                (Fear, -0.005),
                (AdrenalineLvl, -0.01),
                (RadiationDose, RADIATION),
            ],
        );

        let emergency = TaskTable::from_entries(
            &[
                (HeartRate, 130.0, 6.0),
                (RespirationRate, 30.0, 2.0),
                (MetabolicRate, 280.0, 20.0),
                (BloodPressureSys, 125.0, 0.5),
                (BloodPressureDia, 85.0, 0.5),
                (CoreTemp, 37.20, 0.02),
                (SkinTemp, 33.30, 0.03),
                (SweatRate, 0.30, 0.03),
                (BloodO2Pa, 90.0, 0.5),
                (BloodCo2Pa, 50.0, 2.0),
                (OxygenSaturation, 0.92, 0.006),
                (GlucoseLevel, 87.5, 0.25),
            ],
            &[
                (CognitiveLoad, 0.015),
                (StressIndex, 0.05),
                (MuscleFatigue, 0.004),
                (Fear, 0.01),
                (AdrenalineLvl, 0.02),
                (RadiationDose, RADIATION),
            ],
        );

        let shocks = [
            ShockEvent {
                id: "lost_tether".to_string(),
                letter: 'T',
                set: [(Fear, 1.0), (AdrenalineLvl, 1.0)].into_iter().collect(),
                add: [
                    (HeartRate, 25.0),
                    (RespirationRate, 6.0),
                    (BloodPressureSys, 15.0),
                    (BloodPressureDia, 8.0),
                    (MetabolicRate, 40.0),
                    (StressIndex, 0.3),
                    (CognitiveLoad, 0.2),
                ]
                .into_iter()
                .collect(),
            },
            ShockEvent {
                id: "solar_particle_event".to_string(),
                letter: 'P',
                set: BTreeMap::new(),
                add: [
                    (RadiationDose, 0.15),
                    (StressIndex, 0.2),
                    (Fear, 0.3),
                    (HeartRate, 10.0),
                ]
                .into_iter()
                .collect(),
            },
        ]
        .into_iter()
        .map(|s| (s.id.clone(), s))
        .collect();

        Self {
            baseline,
            limits,
            tasks: [rest, low, normal, hard, cognitive, emergency],
            shocks,
        }
    }
}

// =============================================================================
// File layout
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
struct ProfileFile {
    baseline: BTreeMap<String, f64>,
    #[serde(default)]
    limits: BTreeMap<String, LimitsFile>,
    tasks: BTreeMap<String, TaskTableFile>,
    #[serde(default)]
    shocks: BTreeMap<String, ShockFile>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct LimitsFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max: Option<f64>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct TaskTableFile {
    #[serde(default)]
    seek: BTreeMap<String, SeekRule>,
    #[serde(default)]
    drift: BTreeMap<String, f64>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ShockFile {
    letter: char,
    #[serde(default)]
    set: BTreeMap<String, f64>,
    #[serde(default)]
    add: BTreeMap<String, f64>,
}

fn typed_keys<T: Copy>(map: &BTreeMap<String, T>) -> Result<BTreeMap<Variable, T>, EvaError> {
    map.iter()
        .map(|(name, value)| Ok((name.parse::<Variable>()?, *value)))
        .collect()
}

fn named_keys<T: Copy>(map: &BTreeMap<Variable, T>) -> BTreeMap<String, T> {
    map.iter().map(|(v, value)| (v.name().to_string(), *value)).collect()
}

impl TryFrom<ProfileFile> for PhysiologyProfile {
    type Error = EvaError;

    fn try_from(file: ProfileFile) -> Result<Self, Self::Error> {
        let given = typed_keys(&file.baseline)?;
        let mut baseline = [0.0; Variable::COUNT];
        for var in Variable::ALL {
            baseline[var.index()] = *given
                .get(&var)
                .ok_or_else(|| EvaError::missing(format!("no baseline for '{}'", var)))?;
        }

        let mut limits = BTreeMap::new();
        for (name, l) in &file.limits {
            let var: Variable = name.parse()?;
            limits.insert(
                var,
                Limits::new(l.min.unwrap_or(f64::NEG_INFINITY), l.max.unwrap_or(f64::INFINITY)),
            );
        }

        for name in file.tasks.keys() {
            name.parse::<TaskClass>()?;
        }
        let mut tasks: [TaskTable; TaskClass::COUNT] = Default::default();
        for class in TaskClass::ALL {
            let table = file
                .tasks
                .get(class.name())
                .ok_or_else(|| EvaError::missing(format!("task table '{}'", class)))?;
            tasks[class as usize] = TaskTable {
                seek: typed_keys(&table.seek)?,
                drift: typed_keys(&table.drift)?,
            };
        }

        let mut shocks = BTreeMap::new();
        for (id, s) in file.shocks {
            let event = ShockEvent {
                id: id.clone(),
                letter: s.letter,
                set: typed_keys(&s.set)?,
                add: typed_keys(&s.add)?,
            };
            shocks.insert(id, event);
        }

        let profile = Self {
            baseline,
            limits,
            tasks,
            shocks,
        };
        profile.validate()?;
        Ok(profile)
    }
}

impl From<&PhysiologyProfile> for ProfileFile {
    fn from(p: &PhysiologyProfile) -> Self {
        let finite = |v: f64| v.is_finite().then_some(v);
        Self {
            baseline: Variable::ALL
                .iter()
                .map(|v| (v.name().to_string(), p.baseline(*v)))
                .collect(),
            limits: p
                .limits
                .iter()
                .map(|(v, l)| {
                    (
                        v.name().to_string(),
                        LimitsFile {
                            min: finite(l.min),
                            max: finite(l.max),
                        },
                    )
                })
                .collect(),
            tasks: TaskClass::ALL
                .iter()
                .map(|c| {
                    let t = p.task(*c);
                    (
                        c.name().to_string(),
                        TaskTableFile {
                            seek: named_keys(&t.seek),
                            drift: named_keys(&t.drift),
                        },
                    )
                })
                .collect(),
            shocks: p
                .shocks
                .iter()
                .map(|(id, s)| {
                    (
                        id.clone(),
                        ShockFile {
                            letter: s.letter,
                            set: named_keys(&s.set),
                            add: named_keys(&s.add),
                        },
                    )
                })
                .collect(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[baseline]
heart_rate = 70.0
blood_pressure_sys = 120.0
blood_pressure_dia = 80.0
respiration_rate = 12.0
oxygen_saturation = 0.98
blood_o2_pa = 95.0
blood_co2_pa = 40.0
n2_saturation = 1.0
metabolic_rate = 80.0
core_temp = 37.0
skin_temp = 33.0
sweat_rate = 0.0
glucose_level = 90.0
muscle_fatigue = 0.0
cognitive_load = 0.0
stress_index = 0.0
fear = 0.0
adrenaline_lvl = 0.0
radiation_dose = 0.0

[limits]
heart_rate = { min = 40.0, max = 180.0 }
fear = { max = 1.0 }

[tasks.rest.seek]
heart_rate = { target = 70.0, rate = 5.0 }

[tasks.low]
[tasks.normal.seek]
heart_rate = { target = 110.0, rate = 4.0 }
[tasks.normal.drift]
muscle_fatigue = 0.004
[tasks.hard]
[tasks.cognitive]
[tasks.emergency]

[shocks.lost_tether]
letter = "T"
set = { fear = 1.0 }
add = { heart_rate = 25.0 }
"#;

    #[test]
    fn test_default_profile_is_valid() {
        let profile = PhysiologyProfile::default();
        profile.validate().unwrap();
        assert_eq!(profile.baseline(Variable::HeartRate), 70.0);
        assert_eq!(
            profile.seek_rule(TaskClass::Normal, Variable::HeartRate),
            Some(SeekRule::new(110.0, 4.0))
        );
        assert_eq!(profile.limits(Variable::CoreTemp), Limits::new(34.0, 39.0));
    }

    #[test]
    fn test_rest_seeks_baseline() {
        let profile = PhysiologyProfile::default();
        for (var, rule) in &profile.task(TaskClass::Rest).seek {
            assert_eq!(rule.target, profile.baseline(*var), "{} rest target", var);
        }
    }

    #[test]
    fn test_sparse_tables_report_not_applicable() {
        let profile = PhysiologyProfile::default();
        // Cognitive work leaves diastolic pressure and SpO2 alone.
        assert!(profile
            .seek_rule(TaskClass::Cognitive, Variable::BloodPressureDia)
            .is_none());
        assert!(profile
            .seek_rule(TaskClass::Cognitive, Variable::OxygenSaturation)
            .is_none());
        assert!(profile.drift(TaskClass::Hard, Variable::HeartRate).is_none());
        assert_eq!(profile.update_mode(Variable::N2Saturation), None);
        assert_eq!(profile.update_mode(Variable::GlucoseLevel), Some(UpdateMode::Seek));
        assert_eq!(profile.update_mode(Variable::Fear), Some(UpdateMode::Drift));
    }

    #[test]
    fn test_parse_minimal_toml() {
        let profile = PhysiologyProfile::from_toml_str(MINIMAL).unwrap();
        assert_eq!(profile.limits(Variable::HeartRate), Limits::new(40.0, 180.0));
        let fear = profile.limits(Variable::Fear);
        assert_eq!(fear.min, f64::NEG_INFINITY);
        assert_eq!(fear.max, 1.0);
        // Absent entries are unbounded.
        assert_eq!(profile.limits(Variable::CoreTemp), Limits::UNBOUNDED);
        assert_eq!(profile.drift(TaskClass::Normal, Variable::MuscleFatigue), Some(0.004));
        assert!(profile.task(TaskClass::Hard).seek.is_empty());
        let shock = profile.shock_by_letter('T').unwrap();
        assert_eq!(shock.id, "lost_tether");
        assert_eq!(shock.set[&Variable::Fear], 1.0);
    }

    #[test]
    fn test_missing_task_table_fails_at_load() {
        let text = MINIMAL.replace("[tasks.emergency]", "");
        let err = PhysiologyProfile::from_toml_str(&text).unwrap_err();
        assert_eq!(err, EvaError::missing("task table 'emergency'"));
    }

    #[test]
    fn test_missing_baseline_fails_at_load() {
        let text = MINIMAL.replace("radiation_dose = 0.0\n", "");
        let err = PhysiologyProfile::from_toml_str(&text).unwrap_err();
        assert!(err.to_string().contains("radiation_dose"), "{}", err);
    }

    #[test]
    fn test_unknown_variable_fails_at_load() {
        let text = MINIMAL.replace("muscle_fatigue = 0.004", "muscle_fatigues = 0.004");
        let err = PhysiologyProfile::from_toml_str(&text).unwrap_err();
        assert!(matches!(err, EvaError::MissingConfiguration(_)));
        assert!(err.to_string().contains("muscle_fatigues"));
    }

    #[test]
    fn test_malformed_toml_fails_at_load() {
        let err = PhysiologyProfile::from_toml_str("[baseline\nheart_rate = ").unwrap_err();
        assert!(err.to_string().contains("malformed profile"));
    }

    #[test]
    fn test_negative_rate_rejected() {
        let text = MINIMAL.replace("target = 110.0, rate = 4.0", "target = 110.0, rate = -4.0");
        let err = PhysiologyProfile::from_toml_str(&text).unwrap_err();
        assert!(err.to_string().contains("non-negative rate"), "{}", err);
    }

    #[test]
    fn test_inverted_limits_rejected() {
        let text = MINIMAL.replace("min = 40.0, max = 180.0", "min = 180.0, max = 40.0");
        assert!(PhysiologyProfile::from_toml_str(&text).is_err());
    }

    #[test]
    fn test_mixed_update_mode_rejected() {
        let text = MINIMAL.replace(
            "[tasks.hard]",
            "[tasks.hard.drift]\nheart_rate = 1.0",
        );
        let err = PhysiologyProfile::from_toml_str(&text).unwrap_err();
        assert!(err.to_string().contains("one update mode"), "{}", err);
    }

    #[test]
    fn test_shock_letter_collision_rejected() {
        let text = MINIMAL.replace("letter = \"T\"", "letter = \"R\"");
        let err = PhysiologyProfile::from_toml_str(&text).unwrap_err();
        assert!(err.to_string().contains("reuses task letter"), "{}", err);
    }

    #[test]
    fn test_default_profile_survives_toml() {
        let profile = PhysiologyProfile::default();
        let text = profile.to_toml_string().unwrap();
        let parsed = PhysiologyProfile::from_toml_str(&text).unwrap();
        assert_eq!(parsed, profile);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.toml");
        std::fs::write(&path, MINIMAL).unwrap();
        let profile = PhysiologyProfile::load(&path).unwrap();
        assert_eq!(profile.baseline(Variable::GlucoseLevel), 90.0);

        assert!(PhysiologyProfile::load(dir.path().join("absent.toml")).is_err());
    }

    #[test]
    fn test_task_letters() {
        for class in TaskClass::ALL {
            assert_eq!(TaskClass::from_letter(class.letter()), Some(class));
            assert_eq!(class.name().parse::<TaskClass>().unwrap(), class);
        }
        assert_eq!(TaskClass::from_letter('X'), None);
    }

    #[test]
    fn test_limits_clamp() {
        let l = Limits::new(0.0, 1.0);
        assert_eq!(l.clamp(1.3), 1.0);
        assert_eq!(l.clamp(-0.2), 0.0);
        assert_eq!(l.clamp(0.4), 0.4);
        assert_eq!(Limits::UNBOUNDED.clamp(1e300), 1e300);
        assert!(!Limits::UNBOUNDED.is_bounded());
    }
}
