use crate::ctrl::Rule;
use crate::net::{
    Action, AddOutcome, Entry, FieldKind, FiveTuple, FlowTable, Hop, MatchValue, Packet, SwitchId,
    TimeoutKind,
};
use crate::sim::SimTime;
use std::net::Ipv4Addr;

fn fwd(to: usize) -> Vec<Action> {
    vec![Action::Forward(Hop::Switch(SwitchId(to)))]
}

fn pkt_to(dst: Ipv4Addr, src_port: u16) -> Packet {
    let tuple = FiveTuple {
        src_ip: Ipv4Addr::new(10, 0, 0, 1),
        dst_ip: dst,
        src_port,
        dst_port: 80,
        protocol: 6,
    };
    Packet::from_tuple(0, tuple, 1500)
}

fn rule(s: &str) -> Rule {
    s.parse().expect("rule")
}

fn next_hop(entry: Option<&Entry>) -> Option<Hop> {
    entry.and_then(|e| {
        e.actions.iter().find_map(|a| match a {
            Action::Forward(h) => Some(*h),
            Action::Tag(_) => None,
        })
    })
}

#[test]
fn five_tuple_beats_destination_ip() {
    let dst = Ipv4Addr::new(10, 0, 2, 1);
    let pkt = pkt_to(dst, 1000);
    let mut table = FlowTable::new(100);
    table.add(Entry::for_rule(Rule::host(dst), fwd(1)));
    table.add(Entry::five_tuple(pkt.tuple, fwd(2)));

    assert_eq!(next_hop(table.lookup(&pkt, None)), Some(Hop::Switch(SwitchId(2))));

    // other flows to the same host still hit the destination rule
    let other = pkt_to(dst, 1001);
    assert_eq!(next_hop(table.lookup(&other, None)), Some(Hop::Switch(SwitchId(1))));
}

#[test]
fn longest_prefix_wins_when_no_exact_match() {
    let mut table = FlowTable::new(100);
    table.add(Entry::for_rule(rule("10.0.0.0/8"), fwd(1)));
    table.add(Entry::for_rule(rule("10.0.2.0/24"), fwd(2)));
    table.add(Entry::for_rule(rule("10.0.0.0/16"), fwd(3)));

    let hit = table.lookup(&pkt_to(Ipv4Addr::new(10, 0, 2, 77), 1), None);
    assert_eq!(next_hop(hit), Some(Hop::Switch(SwitchId(2))));
    let hit = table.lookup(&pkt_to(Ipv4Addr::new(10, 0, 9, 1), 1), None);
    assert_eq!(next_hop(hit), Some(Hop::Switch(SwitchId(3))));
    let hit = table.lookup(&pkt_to(Ipv4Addr::new(10, 7, 0, 1), 1), None);
    assert_eq!(next_hop(hit), Some(Hop::Switch(SwitchId(1))));
    assert!(table.lookup(&pkt_to(Ipv4Addr::new(192, 168, 0, 1), 1), None).is_none());
}

#[test]
fn add_replaces_only_at_same_or_higher_priority() {
    let ip = Ipv4Addr::new(10, 0, 1, 1);
    let entry = |prio: u8, to: usize| Entry::new(FieldKind::DstIp, prio, MatchValue::Ip(ip), fwd(to));
    let mut table = FlowTable::new(100);

    assert_eq!(table.add(entry(10, 1)), AddOutcome::Inserted);
    assert_eq!(table.add(entry(10, 2)), AddOutcome::Replaced);
    assert_eq!(table.add(entry(5, 3)), AddOutcome::Ignored);
    assert_eq!(table.len(), 1);

    let kept = table.get(&entry(0, 0).key()).expect("entry");
    assert_eq!(kept.priority, 10);
    assert_eq!(kept.actions, fwd(2));
}

#[test]
fn remove_requires_matching_identity() {
    let ip = Ipv4Addr::new(10, 0, 1, 1);
    let mut table = FlowTable::new(100);
    table.add(Entry::new(FieldKind::DstIp, 32, MatchValue::Ip(ip), fwd(1)));

    let wrong_prio = Entry::new(FieldKind::DstIp, 31, MatchValue::Ip(ip), Vec::new());
    assert!(table.remove(&wrong_prio).is_none());
    assert_eq!(table.len(), 1);

    // actions are not part of identity
    let same = Entry::new(FieldKind::DstIp, 32, MatchValue::Ip(ip), Vec::new());
    assert!(table.remove(&same).is_some());
    assert!(table.is_empty());
}

#[test]
fn idle_timer_resets_on_hit_but_hard_timer_does_not() {
    let idle_ip = Ipv4Addr::new(10, 0, 1, 1);
    let hard_ip = Ipv4Addr::new(10, 0, 1, 2);
    let timeout = SimTime::from_secs(5);
    let mut table = FlowTable::new(100);
    table.add(
        Entry::for_rule(Rule::host(idle_ip), fwd(1)).with_timer(SimTime::ZERO, timeout, TimeoutKind::Idle),
    );
    table.add(
        Entry::for_rule(Rule::host(hard_ip), fwd(1)).with_timer(SimTime::ZERO, timeout, TimeoutKind::Hard),
    );

    let at = SimTime::from_secs(4);
    table.lookup(&pkt_to(idle_ip, 1), Some(at));
    table.lookup(&pkt_to(hard_ip, 1), Some(at));

    let idle = table.get(&Entry::for_rule(Rule::host(idle_ip), Vec::new()).key()).expect("idle");
    let hard = table.get(&Entry::for_rule(Rule::host(hard_ip), Vec::new()).key()).expect("hard");
    assert_eq!(idle.installed_at(), at);
    assert_eq!(idle.hits, 1);
    assert_eq!(hard.installed_at(), SimTime::ZERO);

    let out = table.tick(Some(SimTime::from_secs(5)));
    assert!(out.expired.is_empty(), "no remove-notify flag set");
    assert_eq!(table.len(), 1, "hard entry aged out, idle entry refreshed");
}

#[test]
fn tick_reports_only_notify_entries_as_expired() {
    let t = SimTime::from_secs(1);
    let mut table = FlowTable::new(100);
    table.add(
        Entry::for_rule(rule("10.0.1.0/24"), fwd(1))
            .notify_on_remove()
            .with_timer(SimTime::ZERO, t, TimeoutKind::Hard),
    );
    table.add(Entry::for_rule(rule("10.0.2.0/24"), fwd(1)).with_timer(SimTime::ZERO, t, TimeoutKind::Hard));
    table.add(Entry::for_rule(rule("10.0.3.0/24"), fwd(1)));

    assert!(table.tick(Some(SimTime::from_millis(999))).is_empty());

    let out = table.tick(Some(t));
    assert_eq!(out.expired.len(), 1);
    assert_eq!(out.expired[0].rule(), Some(rule("10.0.1.0/24")));
    assert!(out.overflowed.is_empty());
    assert_eq!(table.len(), 1, "untimed entry never expires");
}

#[test]
fn overflow_with_known_time_evicts_oldest_installed() {
    let long = SimTime::from_secs(100);
    let mut table = FlowTable::new(2);
    for (net, at) in [("10.0.1.0/24", 3), ("10.0.2.0/24", 1), ("10.0.3.0/24", 2)] {
        table.add(
            Entry::for_rule(rule(net), fwd(1)).with_timer(SimTime::from_secs(at), long, TimeoutKind::Idle),
        );
    }
    assert_eq!(table.len(), 3, "add never evicts by itself");

    let out = table.tick(Some(SimTime::from_secs(4)));
    assert_eq!(out.overflowed.len(), 1);
    assert_eq!(out.overflowed[0].rule(), Some(rule("10.0.2.0/24")));
    assert_eq!(table.len(), table.capacity());
}

#[test]
fn overflow_without_time_evicts_least_hit() {
    let mut table = FlowTable::new(1);
    table.add(Entry::for_rule(rule("10.0.1.0/24"), fwd(1)));
    table.add(Entry::for_rule(rule("10.0.2.0/24"), fwd(1)));
    table.add(Entry::for_rule(rule("10.0.3.0/24"), fwd(1)));
    for _ in 0..3 {
        table.lookup(&pkt_to(Ipv4Addr::new(10, 0, 3, 1), 1), None);
    }
    table.lookup(&pkt_to(Ipv4Addr::new(10, 0, 2, 1), 1), None);

    let out = table.tick(None);
    let evicted: Vec<_> = out.overflowed.iter().filter_map(|e| e.rule()).collect();
    assert_eq!(evicted, vec![rule("10.0.1.0/24"), rule("10.0.2.0/24")]);
    assert_eq!(table.len(), 1);
    assert_eq!(table.entries()[0].rule(), Some(rule("10.0.3.0/24")));
}

#[test]
fn entries_are_listed_in_insertion_order() {
    let mut table = FlowTable::new(100);
    let nets = ["10.0.9.0/24", "10.0.1.0/24", "10.0.5.0/24"];
    for net in nets {
        table.add(Entry::for_rule(rule(net), fwd(1)));
    }
    // in-place replacement keeps the original slot
    table.add(Entry::for_rule(rule("10.0.9.0/24"), fwd(2)));

    let listed: Vec<_> = table.entries().iter().filter_map(|e| e.rule()).collect();
    assert_eq!(listed, nets.iter().map(|n| rule(n)).collect::<Vec<_>>());
}

#[test]
fn table_size_matches_full_scan_after_mixed_operations() {
    let mut table = FlowTable::new(3);
    let check = |t: &FlowTable| assert_eq!(t.len(), t.entries().len());

    for i in 0..6u8 {
        let net = format!("10.0.{i}.0/24");
        table.add(
            Entry::for_rule(rule(&net), fwd(1))
                .notify_on_remove()
                .with_timer(SimTime::from_secs(i as u64), SimTime::from_secs(4), TimeoutKind::Idle),
        );
        check(&table);
    }
    table.add(Entry::for_rule(rule("10.0.0.0/24"), fwd(2)));
    check(&table);
    table.remove(&Entry::for_rule(rule("10.0.1.0/24"), Vec::new()));
    check(&table);

    let out = table.tick(Some(SimTime::from_secs(6)));
    check(&table);
    assert!(table.len() <= table.capacity());
    // 10.0.2.0/24 is due at 6s; the untimed replacement counts as oldest
    let rules = |v: &[Entry]| v.iter().filter_map(|e| e.rule()).collect::<Vec<_>>();
    assert_eq!(rules(&out.expired), vec![rule("10.0.2.0/24")]);
    assert_eq!(rules(&out.overflowed), vec![rule("10.0.0.0/24")]);
    assert_eq!(table.len(), 3);

    table.tick(None);
    check(&table);
}
