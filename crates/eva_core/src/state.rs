//! Physiological state of one astronaut.
//!
//! The state is a fixed, strongly-typed record. Every dynamic field is
//! addressable through [`Variable`], which is what the profile tables are
//! keyed by, so the engine never dispatches on attribute names.
//!
//! - Cardiopulmonary: heart rate, blood pressure, respiration, gas exchange
//! - Metabolic/thermal: metabolic rate, temperatures, sweat, glucose
//! - Progressive load: fatigue, cognitive load, stress, fear, adrenaline, radiation

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::EvaError;

/// Guard against NaN and Infinity in state values.
/// If the value is not finite, replace it with the provided fallback (baseline).
#[inline]
pub(crate) fn sanitize_f64(v: f64, fallback: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        tracing::warn!("NaN/Inf detected in state, resetting to fallback {}", fallback);
        fallback
    }
}

// =============================================================================
// Variable identifiers
// =============================================================================

/// Identifier of one dynamic physiological variable.
///
/// Declaration order is the stable logging order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variable {
    HeartRate,
    BloodPressureSys,
    BloodPressureDia,
    RespirationRate,
    OxygenSaturation,
    BloodO2Pa,
    BloodCo2Pa,
    N2Saturation,
    MetabolicRate,
    CoreTemp,
    SkinTemp,
    SweatRate,
    GlucoseLevel,
    MuscleFatigue,
    CognitiveLoad,
    StressIndex,
    Fear,
    AdrenalineLvl,
    RadiationDose,
}

impl Variable {
    pub const COUNT: usize = 19;

    pub const ALL: [Variable; Self::COUNT] = [
        Variable::HeartRate,
        Variable::BloodPressureSys,
        Variable::BloodPressureDia,
        Variable::RespirationRate,
        Variable::OxygenSaturation,
        Variable::BloodO2Pa,
        Variable::BloodCo2Pa,
        Variable::N2Saturation,
        Variable::MetabolicRate,
        Variable::CoreTemp,
        Variable::SkinTemp,
        Variable::SweatRate,
        Variable::GlucoseLevel,
        Variable::MuscleFatigue,
        Variable::CognitiveLoad,
        Variable::StressIndex,
        Variable::Fear,
        Variable::AdrenalineLvl,
        Variable::RadiationDose,
    ];

    /// Position in [`Variable::ALL`].
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Name used in profile files and log headers.
    pub fn name(self) -> &'static str {
        match self {
            Variable::HeartRate => "heart_rate",
            Variable::BloodPressureSys => "blood_pressure_sys",
            Variable::BloodPressureDia => "blood_pressure_dia",
            Variable::RespirationRate => "respiration_rate",
            Variable::OxygenSaturation => "oxygen_saturation",
            Variable::BloodO2Pa => "blood_o2_pa",
            Variable::BloodCo2Pa => "blood_co2_pa",
            Variable::N2Saturation => "n2_saturation",
            Variable::MetabolicRate => "metabolic_rate",
            Variable::CoreTemp => "core_temp",
            Variable::SkinTemp => "skin_temp",
            Variable::SweatRate => "sweat_rate",
            Variable::GlucoseLevel => "glucose_level",
            Variable::MuscleFatigue => "muscle_fatigue",
            Variable::CognitiveLoad => "cognitive_load",
            Variable::StressIndex => "stress_index",
            Variable::Fear => "fear",
            Variable::AdrenalineLvl => "adrenaline_lvl",
            Variable::RadiationDose => "radiation_dose",
        }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Variable {
    type Err = EvaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Variable::ALL
            .iter()
            .copied()
            .find(|v| v.name() == s)
            .ok_or_else(|| EvaError::missing(format!("unknown physiological variable '{}'", s)))
    }
}

// =============================================================================
// Anthropometrics
// =============================================================================

/// Static body data. Never touched by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Anthropometrics {
    /// kg
    pub mass: f64,
    /// m³
    pub volume: f64,
    /// years
    pub age: u32,
}

impl Default for Anthropometrics {
    fn default() -> Self {
        Self {
            mass: 80.0,
            volume: 0.075,
            age: 40,
        }
    }
}

// =============================================================================
// Physiological state
// =============================================================================

/// Complete per-astronaut state.
///
/// Construct through [`PhysiologicalState::from_baseline`] so every dynamic
/// field starts at its resting value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysiologicalState {
    // Cardiopulmonary
    /// bpm
    pub heart_rate: f64,
    /// mmHg
    pub blood_pressure_sys: f64,
    /// mmHg
    pub blood_pressure_dia: f64,
    /// breaths/min
    pub respiration_rate: f64,
    /// fraction
    pub oxygen_saturation: f64,
    /// mmHg
    pub blood_o2_pa: f64,
    /// mmHg
    pub blood_co2_pa: f64,
    /// fraction
    pub n2_saturation: f64,

    // Metabolic / thermal
    /// W
    pub metabolic_rate: f64,
    /// °C
    pub core_temp: f64,
    /// °C
    pub skin_temp: f64,
    /// g/h
    pub sweat_rate: f64,
    /// mg/dL
    pub glucose_level: f64,

    // Progressive load (0–1)
    pub muscle_fatigue: f64,
    pub cognitive_load: f64,
    pub stress_index: f64,
    pub fear: f64,
    pub adrenaline_lvl: f64,
    pub radiation_dose: f64,

    pub anthropometrics: Anthropometrics,

    /// Simulated minutes since the start of the mission segment. Only ever grows.
    pub mission_elapsed_time: u64,
}

impl PhysiologicalState {
    /// Build a state at the given baseline values with the clock at zero.
    pub fn from_baseline(baseline: impl Fn(Variable) -> f64, anthropometrics: Anthropometrics) -> Self {
        let mut state = Self {
            heart_rate: 0.0,
            blood_pressure_sys: 0.0,
            blood_pressure_dia: 0.0,
            respiration_rate: 0.0,
            oxygen_saturation: 0.0,
            blood_o2_pa: 0.0,
            blood_co2_pa: 0.0,
            n2_saturation: 0.0,
            metabolic_rate: 0.0,
            core_temp: 0.0,
            skin_temp: 0.0,
            sweat_rate: 0.0,
            glucose_level: 0.0,
            muscle_fatigue: 0.0,
            cognitive_load: 0.0,
            stress_index: 0.0,
            fear: 0.0,
            adrenaline_lvl: 0.0,
            radiation_dose: 0.0,
            anthropometrics,
            mission_elapsed_time: 0,
        };
        for var in Variable::ALL {
            state.set(var, baseline(var));
        }
        state
    }

    pub fn get(&self, var: Variable) -> f64 {
        *self.field(var)
    }

    pub fn set(&mut self, var: Variable, value: f64) {
        *self.field_mut(var) = value;
    }

    /// All dynamic values in stable order.
    pub fn values(&self) -> impl Iterator<Item = (Variable, f64)> + '_ {
        Variable::ALL.into_iter().map(move |v| (v, self.get(v)))
    }

    fn field(&self, var: Variable) -> &f64 {
        match var {
            Variable::HeartRate => &self.heart_rate,
            Variable::BloodPressureSys => &self.blood_pressure_sys,
            Variable::BloodPressureDia => &self.blood_pressure_dia,
            Variable::RespirationRate => &self.respiration_rate,
            Variable::OxygenSaturation => &self.oxygen_saturation,
            Variable::BloodO2Pa => &self.blood_o2_pa,
            Variable::BloodCo2Pa => &self.blood_co2_pa,
            Variable::N2Saturation => &self.n2_saturation,
            Variable::MetabolicRate => &self.metabolic_rate,
            Variable::CoreTemp => &self.core_temp,
            Variable::SkinTemp => &self.skin_temp,
            Variable::SweatRate => &self.sweat_rate,
            Variable::GlucoseLevel => &self.glucose_level,
            Variable::MuscleFatigue => &self.muscle_fatigue,
            Variable::CognitiveLoad => &self.cognitive_load,
            Variable::StressIndex => &self.stress_index,
            Variable::Fear => &self.fear,
            Variable::AdrenalineLvl => &self.adrenaline_lvl,
            Variable::RadiationDose => &self.radiation_dose,
        }
    }

    fn field_mut(&mut self, var: Variable) -> &mut f64 {
        match var {
            Variable::HeartRate => &mut self.heart_rate,
            Variable::BloodPressureSys => &mut self.blood_pressure_sys,
            Variable::BloodPressureDia => &mut self.blood_pressure_dia,
            Variable::RespirationRate => &mut self.respiration_rate,
            Variable::OxygenSaturation => &mut self.oxygen_saturation,
            Variable::BloodO2Pa => &mut self.blood_o2_pa,
            Variable::BloodCo2Pa => &mut self.blood_co2_pa,
            Variable::N2Saturation => &mut self.n2_saturation,
            Variable::MetabolicRate => &mut self.metabolic_rate,
            Variable::CoreTemp => &mut self.core_temp,
            Variable::SkinTemp => &mut self.skin_temp,
            Variable::SweatRate => &mut self.sweat_rate,
            Variable::GlucoseLevel => &mut self.glucose_level,
            Variable::MuscleFatigue => &mut self.muscle_fatigue,
            Variable::CognitiveLoad => &mut self.cognitive_load,
            Variable::StressIndex => &mut self.stress_index,
            Variable::Fear => &mut self.fear,
            Variable::AdrenalineLvl => &mut self.adrenaline_lvl,
            Variable::RadiationDose => &mut self.radiation_dose,
        }
    }
}
