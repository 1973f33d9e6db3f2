use crate::ctrl::Rule;
use crate::net::{Entry, SwitchId};
use crate::predict::{
    FixedPredictor, HeuristicParams, HeuristicPredictor, Predictor, PredictorChoice,
    PredictorEvent, PredictorKind,
};
use crate::sim::{ConfigError, SimTime};

fn rule() -> Rule {
    "10.0.2.0/24".parse().expect("rule")
}

fn sample(p: &mut HeuristicPredictor, switch: SwitchId, sizes: impl IntoIterator<Item = usize>) {
    for size in sizes {
        p.notify(PredictorEvent::TableSizeSample {
            switch,
            at: SimTime::ZERO,
            size,
        });
    }
}

#[test]
fn heuristic_ceiling_shrinks_under_pressure() {
    let s0 = SwitchId(0);
    let mut p = HeuristicPredictor::new(HeuristicParams::default());
    assert_eq!(p.predict(&rule(), SimTime::ZERO, s0), SimTime::from_secs(10));

    sample(&mut p, s0, (1..=10).map(|i| 1000 + 10 * i));
    p.update_ceiling();
    assert_eq!(p.ceiling(s0), SimTime::from_micros(6_125_000));
    assert_eq!(p.predict(&rule(), SimTime::ZERO, s0), SimTime::from_secs(6));

    // other switches keep their own ceiling
    assert_eq!(p.ceiling(SwitchId(1)), SimTime::from_secs(10));
}

#[test]
fn heuristic_uses_gap_since_last_removal() {
    let s0 = SwitchId(0);
    let mut p = HeuristicPredictor::new(HeuristicParams::default());
    sample(&mut p, s0, (1..=10).map(|i| 1000 + 10 * i));
    p.refresh();

    let removed = Entry::for_rule(rule(), Vec::new());
    p.notify(PredictorEvent::FlowRemoved {
        switch: s0,
        at: SimTime::from_secs(11),
        entry: &removed,
    });
    p.notify(PredictorEvent::PacketIn {
        switch: s0,
        at: SimTime::from_secs(12),
        rule: rule(),
    });
    assert_eq!(p.predict(&rule(), SimTime::from_secs(12), s0), SimTime::from_secs(3));

    // a long gap is capped by the ceiling
    p.notify(PredictorEvent::PacketIn {
        switch: s0,
        at: SimTime::from_secs(30),
        rule: rule(),
    });
    assert_eq!(p.predict(&rule(), SimTime::from_secs(30), s0), SimTime::from_secs(6));
}

#[test]
fn heuristic_ceiling_stays_within_bounds() {
    let s0 = SwitchId(0);
    let mut p = HeuristicPredictor::new(HeuristicParams::default());

    sample(&mut p, s0, [5000; 10]);
    p.update_ceiling();
    assert_eq!(p.ceiling(s0), SimTime::from_secs(1));

    sample(&mut p, s0, [0; 10]);
    for _ in 0..5 {
        p.update_ceiling();
    }
    assert_eq!(p.ceiling(s0), SimTime::from_secs(10));
}

#[test]
fn heuristic_averages_only_the_latest_window() {
    let s0 = SwitchId(0);
    let mut p = HeuristicPredictor::new(HeuristicParams::default());
    // old pressure falls out of the window
    sample(&mut p, s0, [5000; 10]);
    sample(&mut p, s0, (1..=10).map(|i| 1000 + 10 * i));
    p.update_ceiling();
    assert_eq!(p.ceiling(s0), SimTime::from_micros(6_125_000));
}

#[test]
fn fixed_predictor_ignores_feedback() {
    let mut p = FixedPredictor::new(SimTime::from_secs(5));
    assert_eq!(p.kind(), PredictorKind::Fixed);
    p.notify(PredictorEvent::TableSizeSample {
        switch: SwitchId(0),
        at: SimTime::ZERO,
        size: 10_000,
    });
    p.refresh();
    assert_eq!(p.predict(&rule(), SimTime::from_secs(99), SwitchId(0)), SimTime::from_secs(5));
}

#[test]
fn predictor_names_parse() {
    assert_eq!("simple".parse::<PredictorChoice>().ok(), Some(PredictorChoice::Simple));
    assert_eq!("ITM".parse::<PredictorChoice>().ok(), Some(PredictorChoice::Simple));
    assert_eq!("no".parse::<PredictorChoice>().ok(), Some(PredictorChoice::Fixed));
    assert!(matches!(
        "dqn".parse::<PredictorChoice>(),
        Err(ConfigError::UnsupportedPredictor(_))
    ));
    assert!(matches!(
        "oracle".parse::<PredictorChoice>(),
        Err(ConfigError::UnknownPredictor(_))
    ));

    let built = PredictorChoice::Simple.build(SimTime::from_secs(5), HeuristicParams::default());
    assert_eq!(built.kind(), PredictorKind::Heuristic);
}
