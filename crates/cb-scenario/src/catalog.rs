//! Diagnosis catalog: the built-in presentations plus lookup helpers.

use crate::action_kind::ActionKind;
use crate::diagnosis::{
    Abg, Cbc, Diagnosis, Imaging, Labs, LossConditions, Progression, SustainedThreshold,
};
use crate::validate::validate_catalog;
use crate::ScenarioResult;
use cb_physio::{Rhythm, Vitals, compute_map};
use serde::{Deserialize, Serialize};

/// On-disk catalog layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogFile {
    pub diagnoses: Vec<Diagnosis>,
}

/// Validated, non-empty list of diagnoses. The first entry is the default.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosisCatalog {
    diagnoses: Vec<Diagnosis>,
}

impl DiagnosisCatalog {
    /// Build a catalog, rejecting anything [`validate_catalog`] rejects.
    pub fn new(diagnoses: Vec<Diagnosis>) -> ScenarioResult<Self> {
        validate_catalog(&diagnoses)?;
        Ok(Self { diagnoses })
    }

    pub fn builtin() -> Self {
        Self {
            diagnoses: builtin_diagnoses(),
        }
    }

    pub fn default_diagnosis(&self) -> &Diagnosis {
        &self.diagnoses[0]
    }

    pub fn find(&self, id: &str) -> Option<&Diagnosis> {
        self.diagnoses.iter().find(|dx| dx.id == id)
    }

    /// Look up `id`, falling back to the default diagnosis when unknown.
    pub fn get(&self, id: &str) -> &Diagnosis {
        self.find(id).unwrap_or_else(|| self.default_diagnosis())
    }

    /// Index the catalog with `seed mod len`.
    pub fn pick(&self, seed: u64) -> &Diagnosis {
        let index = (seed % self.diagnoses.len() as u64) as usize;
        &self.diagnoses[index]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnosis> {
        self.diagnoses.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.diagnoses.iter().map(|dx| dx.id.as_str())
    }

    pub fn len(&self) -> usize {
        self.diagnoses.len()
    }

    /// Never true for a constructed catalog.
    pub fn is_empty(&self) -> bool {
        self.diagnoses.is_empty()
    }

    pub fn to_file(&self) -> CatalogFile {
        CatalogFile {
            diagnoses: self.diagnoses.clone(),
        }
    }
}

impl Default for DiagnosisCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl TryFrom<CatalogFile> for DiagnosisCatalog {
    type Error = crate::ScenarioError;

    fn try_from(file: CatalogFile) -> ScenarioResult<Self> {
        Self::new(file.diagnoses)
    }
}

fn base_vitals() -> Vitals {
    Vitals {
        hr: 88.0,
        rr: 18.0,
        spo2: 94.0,
        sbp: 118.0,
        dbp: 70.0,
        map: 86.0,
        temp_c: 37.2,
        etco2: 34.0,
        fio2: 0.3,
        peep: 6.0,
        vent_on: true,
        rhythm: Rhythm::Nsr,
    }
}

fn loss(asystole_sec: f64, spo2: (f64, f64), map: (f64, f64)) -> LossConditions {
    LossConditions {
        asystole_sec,
        spo2_below: SustainedThreshold {
            threshold: spo2.0,
            duration_sec: spo2.1,
        },
        map_below: SustainedThreshold {
            threshold: map.0,
            duration_sec: map.1,
        },
    }
}

fn imaging(cxr: Option<&str>, fast: Option<&str>) -> Imaging {
    Imaging {
        cxr_result: cxr.map(str::to_string),
        us_fast_result: fast.map(str::to_string),
        ..Imaging::default()
    }
}

fn builtin_diagnoses() -> Vec<Diagnosis> {
    let base_labs = Labs::default();
    vec![
        Diagnosis {
            id: "dx_legionella".to_string(),
            name: "Legionella Pneumonia".to_string(),
            short_blurb: "Worsening hypoxia with fever and rising RR.".to_string(),
            baseline_vitals: Vitals {
                temp_c: 39.1,
                spo2: 90.0,
                rr: 26.0,
                fio2: 0.35,
                ..base_vitals()
            },
            progression: Progression {
                hypoxia_rate: 0.5,
                shock_rate: 0.1,
                arrhythmia_risk: 0.05,
            },
            win_conditions: vec![
                ActionKind::MedAntibiotics,
                ActionKind::VentFio2Up,
                ActionKind::VentPeepUp,
            ],
            loss_conditions: loss(20.0, (82.0, 18.0), (55.0, 18.0)),
            labs: Labs {
                abg: Abg {
                    ph: 7.31,
                    pco2: 48.0,
                    po2: 52.0,
                    hco3: 22.0,
                    lactate: 2.4,
                },
                bmp: crate::diagnosis::Bmp {
                    na: 130.0,
                    co2: 21.0,
                    ..base_labs.bmp
                },
                ..base_labs
            },
            imaging: imaging(Some("Diffuse patchy opacities, worse RLL"), None),
        },
        Diagnosis {
            id: "dx_volume_overload".to_string(),
            name: "Iatrogenic Volume Overload".to_string(),
            short_blurb: "Pulmonary edema with hypertension then decomp.".to_string(),
            baseline_vitals: Vitals {
                sbp: 150.0,
                dbp: 92.0,
                map: 111.0,
                spo2: 91.0,
                rr: 24.0,
                fio2: 0.4,
                ..base_vitals()
            },
            progression: Progression {
                hypoxia_rate: 0.4,
                shock_rate: 0.15,
                arrhythmia_risk: 0.08,
            },
            win_conditions: vec![
                ActionKind::MedDiuretic,
                ActionKind::VentPeepUp,
                ActionKind::VentFio2Up,
            ],
            loss_conditions: loss(25.0, (84.0, 20.0), (58.0, 22.0)),
            labs: Labs {
                abg: Abg {
                    ph: 7.34,
                    pco2: 50.0,
                    po2: 58.0,
                    hco3: 26.0,
                    lactate: 1.9,
                },
                ..base_labs
            },
            imaging: imaging(
                Some("Pulmonary vascular congestion and interstitial edema"),
                None,
            ),
        },
        Diagnosis {
            id: "dx_postop_hemorrhage".to_string(),
            name: "Post-op Hemorrhage".to_string(),
            short_blurb: "Rapid blood loss with shock and rising lactate.".to_string(),
            baseline_vitals: Vitals {
                hr: 118.0,
                sbp: 94.0,
                dbp: 52.0,
                map: 66.0,
                spo2: 92.0,
                fio2: 0.35,
                ..base_vitals()
            },
            progression: Progression {
                hypoxia_rate: 0.2,
                shock_rate: 0.7,
                arrhythmia_risk: 0.15,
            },
            win_conditions: vec![
                ActionKind::BloodTransfuse,
                ActionKind::PressorStart,
                ActionKind::CallOr,
            ],
            loss_conditions: loss(18.0, (80.0, 18.0), (50.0, 15.0)),
            labs: Labs {
                cbc: Cbc {
                    hgb: 7.4,
                    ..base_labs.cbc
                },
                abg: Abg {
                    ph: 7.28,
                    pco2: 38.0,
                    po2: 68.0,
                    hco3: 19.0,
                    lactate: 4.2,
                },
                ..base_labs
            },
            imaging: imaging(None, Some("Free fluid in RUQ")),
        },
        Diagnosis {
            id: "dx_acute_mi".to_string(),
            name: "Acute MI".to_string(),
            short_blurb: "Chest pain with rising troponin and VT/VF risk.".to_string(),
            baseline_vitals: Vitals {
                hr: 105.0,
                sbp: 112.0,
                dbp: 68.0,
                map: 83.0,
                spo2: 93.0,
                fio2: 0.3,
                ..base_vitals()
            },
            progression: Progression {
                hypoxia_rate: 0.15,
                shock_rate: 0.35,
                arrhythmia_risk: 0.4,
            },
            win_conditions: vec![
                ActionKind::MedAntiplatelet,
                ActionKind::CallCathlab,
                ActionKind::DefibShock,
            ],
            loss_conditions: loss(14.0, (82.0, 16.0), (55.0, 16.0)),
            labs: Labs {
                trop: 2.4,
                ..base_labs
            },
            imaging: imaging(Some("Mild pulmonary congestion"), None),
        },
        Diagnosis {
            id: "dx_stroke".to_string(),
            name: "Acute Stroke".to_string(),
            short_blurb: "Airway risk and aspiration concerns with BP management.".to_string(),
            baseline_vitals: Vitals {
                hr: 90.0,
                sbp: 168.0,
                dbp: 92.0,
                map: 117.0,
                spo2: 92.0,
                fio2: 0.28,
                ..base_vitals()
            },
            progression: Progression {
                hypoxia_rate: 0.3,
                shock_rate: 0.2,
                arrhythmia_risk: 0.1,
            },
            win_conditions: vec![
                ActionKind::CallNeuro,
                ActionKind::AirwayIntubate,
                ActionKind::VentFio2Up,
            ],
            loss_conditions: loss(22.0, (84.0, 20.0), (60.0, 20.0)),
            labs: Labs {
                abg: Abg {
                    ph: 7.33,
                    pco2: 46.0,
                    po2: 60.0,
                    hco3: 23.0,
                    lactate: 2.1,
                },
                ..base_labs
            },
            imaging: imaging(Some("Patchy aspiration changes"), None),
        },
    ]
}

/// MAP of a diagnosis' baseline, recomputed from its pressures.
pub fn baseline_map(dx: &Diagnosis) -> f64 {
    compute_map(dx.baseline_vitals.sbp, dx.baseline_vitals.dbp)
}
