//! `<SECONDS>:<ACTION>` schedule entries for scripted runs.

use crate::error::CliError;
use cb_engine::TitrationAction;
use cb_scenario::ActionKind;
use std::str::FromStr;

/// An action fired once simulation time reaches `at_ms`.
#[derive(Debug, Clone, PartialEq)]
pub struct Scheduled<A> {
    pub at_ms: f64,
    pub action: A,
}

fn split_entry(entry: &str) -> Result<(f64, &str), CliError> {
    let (at, action) = entry
        .split_once(':')
        .ok_or_else(|| CliError::InvalidInput(format!("expected <SECONDS>:<ACTION>, got '{entry}'")))?;
    let seconds: f64 = at
        .trim()
        .parse()
        .map_err(|_| CliError::InvalidInput(format!("bad time in '{entry}'")))?;
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(CliError::InvalidInput(format!(
            "time must be a non-negative number in '{entry}'"
        )));
    }
    Ok((seconds * 1000.0, action.trim()))
}

impl FromStr for Scheduled<ActionKind> {
    type Err = CliError;

    /// `12.5:DEFIB_SHOCK`. Unknown names are kept; the engine records them inertly.
    fn from_str(s: &str) -> Result<Self, CliError> {
        let (at_ms, name) = split_entry(s)?;
        Ok(Self {
            at_ms,
            action: ActionKind::from_name(name),
        })
    }
}

fn number(value: Option<&str>, entry: &str) -> Result<f64, CliError> {
    value
        .and_then(|v| v.parse::<f64>().ok())
        .ok_or_else(|| CliError::InvalidInput(format!("missing or bad number in '{entry}'")))
}

impl FromStr for Scheduled<TitrationAction> {
    type Err = CliError;

    /// `30:VENT_OFF`, `45:FIO2=0.6`, `60:PRESSOR=0.2`, `61:SILENCE=30`,
    /// `62:BAG`, `63:BOLUS`, `64:SIM_CHECK`.
    fn from_str(s: &str) -> Result<Self, CliError> {
        let (at_ms, spec) = split_entry(s)?;
        let (name, value) = match spec.split_once('=') {
            Some((name, value)) => (name, Some(value.trim())),
            None => (spec, None),
        };
        let action = match name.trim().to_ascii_uppercase().as_str() {
            "VENT_ON" => TitrationAction::SetVent { on: true },
            "VENT_OFF" => TitrationAction::SetVent { on: false },
            "FIO2" => TitrationAction::SetFio2 {
                fio2: number(value, s)?,
            },
            "BAG" => TitrationAction::Bag,
            "BOLUS" => TitrationAction::Bolus,
            "PRESSOR" => TitrationAction::SetPressor {
                dose: number(value, s)?,
            },
            "SILENCE" => TitrationAction::SilenceAlarms {
                duration_sec: number(value, s)?,
            },
            "SIM_CHECK" => TitrationAction::RunSimCheck,
            other => {
                return Err(CliError::InvalidInput(format!(
                    "unknown titration action '{other}'"
                )));
            }
        };
        Ok(Self { at_ms, action })
    }
}

/// Pop every entry due at `now_ms`, in schedule order.
pub fn due<A>(schedule: &mut Vec<Scheduled<A>>, now_ms: f64) -> Vec<A> {
    let (ready, later): (Vec<_>, Vec<_>) = schedule.drain(..).partition(|s| s.at_ms <= now_ms);
    *schedule = later;
    ready.into_iter().map(|s| s.action).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_code_blue_entry() {
        let s: Scheduled<ActionKind> = "12.5:DEFIB_SHOCK".parse().unwrap();
        assert_eq!(s.at_ms, 12_500.0);
        assert_eq!(s.action, ActionKind::DefibShock);
        let unknown: Scheduled<ActionKind> = "1:DANCE".parse().unwrap();
        assert!(!unknown.action.is_known());
    }

    #[test]
    fn parses_titration_entries() {
        let s: Scheduled<TitrationAction> = "45:FIO2=0.6".parse().unwrap();
        assert_eq!(s.action, TitrationAction::SetFio2 { fio2: 0.6 });
        let s: Scheduled<TitrationAction> = "3:vent_off".parse().unwrap();
        assert_eq!(s.action, TitrationAction::SetVent { on: false });
        assert!("3:PRESSOR".parse::<Scheduled<TitrationAction>>().is_err());
        assert!("3:WAVE".parse::<Scheduled<TitrationAction>>().is_err());
    }

    #[test]
    fn rejects_malformed_entries() {
        assert!("DEFIB_SHOCK".parse::<Scheduled<ActionKind>>().is_err());
        assert!("x:DEFIB_SHOCK".parse::<Scheduled<ActionKind>>().is_err());
        assert!("-1:DEFIB_SHOCK".parse::<Scheduled<ActionKind>>().is_err());
    }

    #[test]
    fn due_keeps_order_and_rest() {
        let mut schedule: Vec<Scheduled<ActionKind>> = ["5:CPR_START", "1:MED_EPI", "9:CPR_STOP"]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect();
        assert_eq!(
            due(&mut schedule, 6_000.0),
            vec![ActionKind::CprStart, ActionKind::MedEpi]
        );
        assert_eq!(schedule.len(), 1);
    }
}
