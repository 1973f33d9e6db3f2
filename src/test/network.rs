use crate::ctrl::{Controller, PacketInMode, Rule};
use crate::net::{
    Action, DelayModel, Entry, Hop, Instruction, Network, NetworkError, Query, QueryReply,
    SwitchId, SwitchKind, TableCapacity,
};
use crate::predict::FixedPredictor;
use crate::sim::SimTime;
use crate::topo::Builtin;

fn network() -> Network {
    let topo = Builtin::Bridge.build().expect("topology");
    let software = Builtin::Bridge.software_switches();
    let ctrl = Controller::new(
        topo.clone(),
        DelayModel::new(Default::default(), software.iter().copied()),
        PacketInMode::Default,
        Box::new(FixedPredictor::new(SimTime::from_secs(5))),
        SimTime::from_secs(5),
    );
    Network::new(&topo, &software, TableCapacity::default(), ctrl)
}

fn entry(net: &str) -> Entry {
    let rule: Rule = net.parse().expect("rule");
    Entry::for_rule(rule, vec![Action::Forward(Hop::Switch(SwitchId(1)))])
}

#[test]
fn network_marks_software_switches() {
    let net = network();
    assert_eq!(net.len(), 10);
    let kinds: Vec<_> = net
        .switches()
        .iter()
        .filter(|sw| sw.kind() == SwitchKind::Software)
        .map(|sw| sw.id())
        .collect();
    assert_eq!(kinds, vec![SwitchId(2), SwitchId(7)]);
}

#[test]
fn apply_runs_instructions_in_order_and_answers_queries() {
    let mut net = network();
    let replies = net
        .apply(vec![
            Instruction::Add { switch: SwitchId(0), entry: entry("10.0.1.0/24") },
            Instruction::Add { switch: SwitchId(0), entry: entry("10.0.2.0/24") },
            Instruction::Query(Query::TableSize(SwitchId(0))),
            Instruction::Add { switch: SwitchId(3), entry: entry("10.0.3.0/24") },
            Instruction::Delete { switch: SwitchId(0), entry: entry("10.0.1.0/24") },
            Instruction::Query(Query::TotalSize),
        ])
        .expect("apply");
    assert_eq!(replies, vec![QueryReply::TableSize(2), QueryReply::TotalSize(2)]);

    match net.query(Query::Entries(SwitchId(0))).expect("query") {
        QueryReply::Entries(entries) => assert_eq!(entries, vec![entry("10.0.2.0/24")]),
        other => panic!("unexpected reply {other:?}"),
    }
}

#[test]
fn deleting_missing_entry_is_not_fatal() {
    let mut net = network();
    let replies = net
        .apply(vec![
            Instruction::Delete { switch: SwitchId(4), entry: entry("10.0.9.0/24") },
            Instruction::Query(Query::TotalSize),
        ])
        .expect("apply");
    assert_eq!(replies, vec![QueryReply::TotalSize(0)]);
}

#[test]
fn unknown_switch_is_rejected() {
    let mut net = network();
    let err = net
        .apply(vec![Instruction::Add { switch: SwitchId(42), entry: entry("10.0.1.0/24") }])
        .unwrap_err();
    assert!(matches!(err, NetworkError::UnknownSwitch(SwitchId(42))));
    assert!(net.query(Query::TableSize(SwitchId(10))).is_err());
}

#[test]
fn count_queries_reject_entry_listings() {
    let mut net = network();
    net.apply(vec![Instruction::Add { switch: SwitchId(0), entry: entry("10.0.1.0/24") }])
        .expect("apply");
    assert_eq!(net.query_count(Query::TotalSize).expect("count"), 1);
    assert_eq!(net.query_count(Query::TableSize(SwitchId(0))).expect("count"), 1);
    assert!(matches!(
        net.query_count(Query::Entries(SwitchId(0))),
        Err(NetworkError::UnexpectedReply(Query::Entries(SwitchId(0))))
    ));
}
