//! Closed vocabulary of trainee actions.
//!
//! Kinds travel as SCREAMING_SNAKE_CASE names. A name outside the vocabulary
//! parses into [`ActionKind::Unknown`] so that it can still be recorded.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActionKind {
    // Ventilator
    VentToggle,
    VentFio2Up,
    VentFio2Down,
    VentPeepUp,
    VentPeepDown,
    // Airway
    AirwayBagValve,
    AirwayIntubate,
    AirwaySuction,
    AirwayO2Flow,
    // Monitor / defibrillator / compressions
    MonitorCheckRhythm,
    DefibCharge,
    DefibShock,
    CprStart,
    CprStop,
    // Medications
    MedEpi,
    MedAmio,
    MedAntibiotics,
    MedDiuretic,
    MedAntiplatelet,
    MedThrombolytic,
    // Fluids, pressors, blood
    IvFluidBolus,
    PressorStart,
    PressorTitrateUp,
    BloodTransfuse,
    // Diagnostics
    LabsAbg,
    LabsCbcBmpTrop,
    ImagingCxr,
    ImagingFast,
    // Consults
    CallRrt,
    CallCathlab,
    CallOr,
    CallNeuro,
    // Bedside checks and procedures
    CheckGlucose,
    CheckTemp,
    ProcNeedleDecomp,
    ProcChestTube,
    /// A name outside the vocabulary. Logged, never acted on.
    Unknown(String),
}

/// Every recognised action name, in vocabulary order.
pub const KNOWN_ACTION_NAMES: [&str; 36] = [
    "VENT_TOGGLE",
    "VENT_FIO2_UP",
    "VENT_FIO2_DOWN",
    "VENT_PEEP_UP",
    "VENT_PEEP_DOWN",
    "AIRWAY_BAGVALVE",
    "AIRWAY_INTUBATE",
    "AIRWAY_SUCTION",
    "AIRWAY_O2_FLOW",
    "MONITOR_CHECK_RHYTHM",
    "DEFIB_CHARGE",
    "DEFIB_SHOCK",
    "CPR_START",
    "CPR_STOP",
    "MED_EPI",
    "MED_AMIO",
    "MED_ANTIBIOTICS",
    "MED_DIURETIC",
    "MED_ANTIPLATELET",
    "MED_THROMBOLYTIC",
    "IV_FLUID_BOLUS",
    "PRESSOR_START",
    "PRESSOR_TITRATE_UP",
    "BLOOD_TRANSFUSE",
    "LABS_ABG",
    "LABS_CBC_BMP_TROP",
    "IMAGING_CXR",
    "IMAGING_FAST",
    "CALL_RRT",
    "CALL_CATHLAB",
    "CALL_OR",
    "CALL_NEURO",
    "CHECK_GLUCOSE",
    "CHECK_TEMP",
    "PROC_NEEDLE_DECOMP",
    "PROC_CHEST_TUBE",
];

impl ActionKind {
    pub fn from_name(name: &str) -> Self {
        match name {
            "VENT_TOGGLE" => Self::VentToggle,
            "VENT_FIO2_UP" => Self::VentFio2Up,
            "VENT_FIO2_DOWN" => Self::VentFio2Down,
            "VENT_PEEP_UP" => Self::VentPeepUp,
            "VENT_PEEP_DOWN" => Self::VentPeepDown,
            "AIRWAY_BAGVALVE" => Self::AirwayBagValve,
            "AIRWAY_INTUBATE" => Self::AirwayIntubate,
            "AIRWAY_SUCTION" => Self::AirwaySuction,
            "AIRWAY_O2_FLOW" => Self::AirwayO2Flow,
            "MONITOR_CHECK_RHYTHM" => Self::MonitorCheckRhythm,
            "DEFIB_CHARGE" => Self::DefibCharge,
            "DEFIB_SHOCK" => Self::DefibShock,
            "CPR_START" => Self::CprStart,
            "CPR_STOP" => Self::CprStop,
            "MED_EPI" => Self::MedEpi,
            "MED_AMIO" => Self::MedAmio,
            "MED_ANTIBIOTICS" => Self::MedAntibiotics,
            "MED_DIURETIC" => Self::MedDiuretic,
            "MED_ANTIPLATELET" => Self::MedAntiplatelet,
            "MED_THROMBOLYTIC" => Self::MedThrombolytic,
            "IV_FLUID_BOLUS" => Self::IvFluidBolus,
            "PRESSOR_START" => Self::PressorStart,
            "PRESSOR_TITRATE_UP" => Self::PressorTitrateUp,
            "BLOOD_TRANSFUSE" => Self::BloodTransfuse,
            "LABS_ABG" => Self::LabsAbg,
            "LABS_CBC_BMP_TROP" => Self::LabsCbcBmpTrop,
            "IMAGING_CXR" => Self::ImagingCxr,
            "IMAGING_FAST" => Self::ImagingFast,
            "CALL_RRT" => Self::CallRrt,
            "CALL_CATHLAB" => Self::CallCathlab,
            "CALL_OR" => Self::CallOr,
            "CALL_NEURO" => Self::CallNeuro,
            "CHECK_GLUCOSE" => Self::CheckGlucose,
            "CHECK_TEMP" => Self::CheckTemp,
            "PROC_NEEDLE_DECOMP" => Self::ProcNeedleDecomp,
            "PROC_CHEST_TUBE" => Self::ProcChestTube,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::VentToggle => "VENT_TOGGLE",
            Self::VentFio2Up => "VENT_FIO2_UP",
            Self::VentFio2Down => "VENT_FIO2_DOWN",
            Self::VentPeepUp => "VENT_PEEP_UP",
            Self::VentPeepDown => "VENT_PEEP_DOWN",
            Self::AirwayBagValve => "AIRWAY_BAGVALVE",
            Self::AirwayIntubate => "AIRWAY_INTUBATE",
            Self::AirwaySuction => "AIRWAY_SUCTION",
            Self::AirwayO2Flow => "AIRWAY_O2_FLOW",
            Self::MonitorCheckRhythm => "MONITOR_CHECK_RHYTHM",
            Self::DefibCharge => "DEFIB_CHARGE",
            Self::DefibShock => "DEFIB_SHOCK",
            Self::CprStart => "CPR_START",
            Self::CprStop => "CPR_STOP",
            Self::MedEpi => "MED_EPI",
            Self::MedAmio => "MED_AMIO",
            Self::MedAntibiotics => "MED_ANTIBIOTICS",
            Self::MedDiuretic => "MED_DIURETIC",
            Self::MedAntiplatelet => "MED_ANTIPLATELET",
            Self::MedThrombolytic => "MED_THROMBOLYTIC",
            Self::IvFluidBolus => "IV_FLUID_BOLUS",
            Self::PressorStart => "PRESSOR_START",
            Self::PressorTitrateUp => "PRESSOR_TITRATE_UP",
            Self::BloodTransfuse => "BLOOD_TRANSFUSE",
            Self::LabsAbg => "LABS_ABG",
            Self::LabsCbcBmpTrop => "LABS_CBC_BMP_TROP",
            Self::ImagingCxr => "IMAGING_CXR",
            Self::ImagingFast => "IMAGING_FAST",
            Self::CallRrt => "CALL_RRT",
            Self::CallCathlab => "CALL_CATHLAB",
            Self::CallOr => "CALL_OR",
            Self::CallNeuro => "CALL_NEURO",
            Self::CheckGlucose => "CHECK_GLUCOSE",
            Self::CheckTemp => "CHECK_TEMP",
            Self::ProcNeedleDecomp => "PROC_NEEDLE_DECOMP",
            Self::ProcChestTube => "PROC_CHEST_TUBE",
            Self::Unknown(name) => name,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }

    /// All recognised kinds, in vocabulary order.
    pub fn known() -> impl Iterator<Item = ActionKind> {
        KNOWN_ACTION_NAMES.iter().map(|name| ActionKind::from_name(name))
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_name(s))
    }
}

impl From<String> for ActionKind {
    fn from(name: String) -> Self {
        match Self::from_name(&name) {
            Self::Unknown(_) => Self::Unknown(name),
            known => known,
        }
    }
}

impl From<ActionKind> for String {
    fn from(kind: ActionKind) -> Self {
        match kind {
            ActionKind::Unknown(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_known_name_round_trips() {
        for name in KNOWN_ACTION_NAMES {
            let kind = ActionKind::from_name(name);
            assert!(kind.is_known(), "{name} should be known");
            assert_eq!(kind.as_str(), name);
        }
        assert_eq!(ActionKind::known().count(), 36);
    }

    #[test]
    fn unknown_names_are_preserved() {
        let kind: ActionKind = "SING_LULLABY".parse().unwrap();
        assert_eq!(kind, ActionKind::Unknown("SING_LULLABY".to_string()));
        assert_eq!(kind.to_string(), "SING_LULLABY");
    }

    #[test]
    fn serializes_as_plain_name() {
        let json = serde_json::to_string(&ActionKind::BloodTransfuse).unwrap();
        assert_eq!(json, "\"BLOOD_TRANSFUSE\"");
        let back: ActionKind = serde_json::from_str("\"CALL_OR\"").unwrap();
        assert_eq!(back, ActionKind::CallOr);
    }
}
