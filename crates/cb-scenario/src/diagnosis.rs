//! Clinical presentation data: baseline vitals, progression, win/loss
//! conditions, labs and imaging.

use crate::action_kind::ActionKind;
use cb_physio::Vitals;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Progression {
    /// Hypoxia severity in [0, 1].
    pub hypoxia_rate: f64,
    /// Shock severity in [0, 1].
    pub shock_rate: f64,
    /// Arrhythmia risk in [0, 1]; at or above 0.2 the arrest comes early.
    pub arrhythmia_risk: f64,
}

/// Vital below `threshold` for longer than `duration_sec` counts as a loss.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SustainedThreshold {
    pub threshold: f64,
    pub duration_sec: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LossConditions {
    /// Longest tolerated continuous arrest (asystole/PEA), seconds.
    pub asystole_sec: f64,
    pub spo2_below: SustainedThreshold,
    pub map_below: SustainedThreshold,
}

/// Arterial blood gas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Abg {
    pub ph: f64,
    pub pco2: f64,
    pub po2: f64,
    pub hco3: f64,
    pub lactate: f64,
}

/// Basic metabolic panel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bmp {
    pub na: f64,
    pub k: f64,
    pub cl: f64,
    pub co2: f64,
    pub bun: f64,
    pub cr: f64,
}

/// Complete blood count.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cbc {
    pub hgb: f64,
    pub wbc: f64,
    pub plt: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Labs {
    pub abg: Abg,
    pub bmp: Bmp,
    pub cbc: Cbc,
    pub trop: f64,
    pub d_dimer: f64,
}

impl Default for Labs {
    fn default() -> Self {
        Self {
            abg: Abg {
                ph: 7.38,
                pco2: 42.0,
                po2: 78.0,
                hco3: 24.0,
                lactate: 1.6,
            },
            bmp: Bmp {
                na: 138.0,
                k: 4.2,
                cl: 101.0,
                co2: 24.0,
                bun: 14.0,
                cr: 0.9,
            },
            cbc: Cbc {
                hgb: 12.8,
                wbc: 9.4,
                plt: 240.0,
            },
            trop: 0.02,
            d_dimer: 0.4,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Imaging {
    #[serde(default)]
    pub cxr_ordered: bool,
    #[serde(default)]
    pub cxr_result: Option<String>,
    #[serde(default)]
    pub us_fast_ordered: bool,
    #[serde(default)]
    pub us_fast_result: Option<String>,
}

/// One clinical presentation. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnosis {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub short_blurb: String,
    pub baseline_vitals: Vitals,
    pub progression: Progression,
    /// Action kinds that earn points for this presentation.
    pub win_conditions: Vec<ActionKind>,
    pub loss_conditions: LossConditions,
    #[serde(default)]
    pub labs: Labs,
    #[serde(default)]
    pub imaging: Imaging,
}

impl Diagnosis {
    pub fn is_win_action(&self, kind: &ActionKind) -> bool {
        self.win_conditions.contains(kind)
    }
}
