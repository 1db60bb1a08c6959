//! Intervention flags mutated by action dispatch and read by the physiology step.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interventions {
    pub cpr: bool,
    /// Defibrillator charged and ready.
    pub defib: bool,
    pub epi: bool,
    pub amio: bool,
    pub fluids: bool,
    pub pressors: bool,
    pub intubated: bool,
    pub suction: bool,
    /// Bag-valve-mask ventilation in progress.
    pub bagging: bool,
    /// Supplemental oxygen flow (L/min).
    pub o2_flow: f64,
    pub antibiotics: bool,
    pub blood: bool,
    pub cath_lab: bool,
    pub thrombolysis: bool,
    pub needle_decomp: bool,
    pub chest_tube: bool,
}

impl Default for Interventions {
    /// Patients start intubated on 6 L/min oxygen with nothing else running.
    fn default() -> Self {
        Self {
            cpr: false,
            defib: false,
            epi: false,
            amio: false,
            fluids: false,
            pressors: false,
            intubated: true,
            suction: false,
            bagging: false,
            o2_flow: 6.0,
            antibiotics: false,
            blood: false,
            cath_lab: false,
            thrombolysis: false,
            needle_decomp: false,
            chest_tube: false,
        }
    }
}
