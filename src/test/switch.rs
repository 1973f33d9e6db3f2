use crate::net::{
    Action, Entry, FiveTuple, Hop, Packet, Switch, SwitchId, SwitchKind, TableCapacity, TableError,
};
use crate::sim::SimTime;
use std::net::Ipv4Addr;

fn packet() -> Packet {
    let tuple = FiveTuple {
        src_ip: Ipv4Addr::new(10, 0, 0, 1),
        dst_ip: Ipv4Addr::new(10, 0, 2, 1),
        src_port: 1234,
        dst_port: 80,
        protocol: 17,
    };
    Packet::from_tuple(7, tuple, 1500)
}

fn switch(id: usize) -> Switch {
    Switch::new(SwitchId(id), SwitchKind::Hardware, &TableCapacity::default())
}

#[test]
fn miss_goes_to_controller_and_marks_detour() {
    let mut sw = switch(0);
    let mut pkt = packet();
    let next = sw.recv(&mut pkt, SimTime::ZERO).expect("recv");
    assert_eq!(next, Hop::Controller);
    assert_eq!(pkt.path, vec![Hop::Switch(SwitchId(0)), Hop::Controller]);
}

#[test]
fn hit_applies_actions_in_order() {
    let mut sw = switch(1);
    let mut pkt = packet();
    sw.add_entry(Entry::five_tuple(
        pkt.tuple,
        vec![Action::Tag(9), Action::Forward(Hop::Switch(SwitchId(2)))],
    ));

    let next = sw.recv(&mut pkt, SimTime::ZERO).expect("recv");
    assert_eq!(next, Hop::Switch(SwitchId(2)));
    assert_eq!(pkt.tag, Some(9));
    assert_eq!(pkt.path, vec![Hop::Switch(SwitchId(1))]);
    assert_eq!(sw.entries()[0].hits, 1);
}

#[test]
fn forward_local_terminates_here() {
    let mut sw = switch(3);
    let mut pkt = packet();
    sw.set_default_actions(vec![Action::Forward(Hop::Local)]);
    assert_eq!(sw.recv(&mut pkt, SimTime::ZERO).expect("recv"), Hop::Local);
    assert_eq!(pkt.path, vec![Hop::Switch(SwitchId(3))]);
}

#[test]
fn action_list_without_forward_is_an_error() {
    let mut sw = switch(4);
    let mut pkt = packet();
    sw.add_entry(Entry::five_tuple(pkt.tuple, vec![Action::Tag(1)]));
    let err = sw.recv(&mut pkt, SimTime::ZERO).unwrap_err();
    assert!(matches!(err, TableError::NoForwardAction { switch } if switch == SwitchId(4)));
    assert!(pkt.path.is_empty());
}

#[test]
fn deleting_absent_entry_reports_not_found() {
    let mut sw = switch(0);
    let entry = Entry::five_tuple(packet().tuple, Vec::new());
    assert!(matches!(
        sw.delete_entry(&entry),
        Err(TableError::EntryNotFound { .. })
    ));

    sw.add_entry(entry.clone());
    assert_eq!(sw.table_size(), 1);
    sw.delete_entry(&entry).expect("delete");
    assert_eq!(sw.table_size(), 0);
}

#[test]
fn switch_kind_sets_table_capacity() {
    let caps = TableCapacity::default();
    let mut sw = switch(0);
    assert_eq!(sw.table().capacity(), 3000);
    sw.set_kind(SwitchKind::Software, &caps);
    assert_eq!(sw.kind(), SwitchKind::Software);
    assert_eq!(sw.table().capacity(), 1_000_000_000);
}
