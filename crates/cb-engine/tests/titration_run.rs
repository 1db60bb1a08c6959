//! Integration test: titration scenarios through the store.

use cb_engine::titration::{AlertSeverity, ObjectiveKind, Trend};
use cb_engine::{SimStore, TitrationAction, TitrationEngine};
use std::cell::Cell;
use std::rc::Rc;

#[test]
fn ventilated_patient_meets_objectives() {
    let mut store = SimStore::new(TitrationEngine::builtin("resp_failure"));
    store.dispatch(TitrationAction::SetFio2 { fio2: 0.5 });
    for _ in 0..1_200 {
        store.tick(100.0);
    }
    let snap = store.snapshot();
    assert!(snap.objectives.iter().all(|o| o.done), "{:?}", snap.objectives);
    assert!(snap.vitals.spo2_pct > 95.0);
    assert!(
        snap.alerts
            .iter()
            .all(|a| a.severity == AlertSeverity::Info)
    );
}

#[test]
fn shock_clears_with_fluids_and_pressor() {
    let mut store = SimStore::new(TitrationEngine::builtin("shock"));
    for _ in 0..200 {
        store.tick(100.0);
    }
    assert!(store.snapshot().shock_suspected);
    assert!(store.snapshot().alerts.iter().any(|a| a.id == "shock"));

    store.dispatch(TitrationAction::Bolus);
    store.dispatch(TitrationAction::SetPressor { dose: 1.0 });
    for _ in 0..1_200 {
        store.tick(100.0);
    }
    let snap = store.snapshot();
    assert!(!snap.shock_suspected);
    assert!(snap.vitals.map_mmhg > 60.0);
    let map = snap
        .objectives
        .iter()
        .find(|o| o.kind == ObjectiveKind::Map)
        .map(|o| o.done);
    assert_eq!(map, Some(true));
}

#[test]
fn vent_off_trends_downward() {
    let mut store = SimStore::new(TitrationEngine::builtin("resp_failure"));
    let ticks = Rc::new(Cell::new(0));
    let counter = Rc::clone(&ticks);
    store.subscribe(move |_| counter.set(counter.get() + 1));

    store.dispatch(TitrationAction::SetVent { on: false });
    for _ in 0..100 {
        store.tick(100.0);
    }
    let snap = store.snapshot();
    assert_eq!(snap.trends.spo2, Trend::Falling);
    assert!(snap.alerts.iter().any(|a| a.id == "vent-off"));
    assert_eq!(ticks.get(), 101);
}
