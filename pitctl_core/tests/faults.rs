use pitctl_core::config::FireOutCfg;
use pitctl_core::faults::{FaultKind, FaultMonitor, MAX_FAULTS};
use pitctl_core::probe::{ProbeId, ProbeStatus};

const MIN: u64 = 60_000;

fn monitor() -> FaultMonitor {
    FaultMonitor::new(
        FireOutCfg::default(),
        [
            String::from("Pit"),
            String::from("Meat 1"),
            String::from("Meat 2"),
        ],
    )
}

fn all_ok() -> [ProbeStatus; 3] {
    [ProbeStatus::Ok; 3]
}

#[test]
fn probe_open_and_short_entries_track_status() {
    let mut m = monitor();

    m.update(0, Some(225.0), 0.0, [ProbeStatus::Open, ProbeStatus::Ok, ProbeStatus::Short]);
    assert!(m.has(FaultKind::ProbeOpen));
    assert!(m.has(FaultKind::ProbeShort));
    assert_eq!(m.count(), 2);
    let messages = m.messages();
    assert!(messages.contains(&String::from("Pit probe disconnected")));
    assert!(messages.contains(&String::from("Meat 2 probe shorted")));

    // Open flips to short: the open entry for that probe goes away.
    m.update(100, Some(225.0), 0.0, [ProbeStatus::Short, ProbeStatus::Ok, ProbeStatus::Ok]);
    assert!(!m.has(FaultKind::ProbeOpen));
    let entries = m.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].probe, Some(ProbeId::Pit));

    m.update(200, Some(225.0), 0.0, all_ok());
    assert_eq!(m.count(), 0);
}

#[test]
fn adds_are_idempotent_per_probe() {
    let mut m = monitor();
    for t in 0..5u64 {
        m.update(t, Some(225.0), 0.0, [ProbeStatus::Open, ProbeStatus::Open, ProbeStatus::Ok]);
    }
    assert_eq!(m.count(), 2);
    assert!(m.count() <= MAX_FAULTS);
}

#[test]
fn fire_out_requires_sustained_decline_at_saturated_fan() {
    let mut m = monitor();

    // Minute samples: 250, then dropping 6 deg/min with the fan pegged.
    m.update(0, Some(250.0), 100.0, all_ok());
    let mut temp = 250.0;
    for i in 1..=10u64 {
        temp -= 6.0;
        m.update(i * MIN, Some(temp), 100.0, all_ok());
    }
    // Decline started at minute 2 (first sample with a measurable rate);
    // ten minutes of decline have elapsed by minute 12.
    m.update(11 * MIN, Some(temp - 6.0), 100.0, all_ok());
    m.update(12 * MIN, Some(temp - 12.0), 100.0, all_ok());
    assert!(m.is_fire_out());
    assert!(m.messages().contains(&String::from("Fire may be out")));
}

#[test]
fn fire_out_clears_when_the_decline_stops() {
    let mut m = monitor();
    m.update(0, Some(250.0), 100.0, all_ok());
    for i in 1..=12u64 {
        m.update(i * MIN, Some(250.0 - 6.0 * i as f32), 100.0, all_ok());
    }
    assert!(m.is_fire_out());

    // Temperature recovers: the decline state and the fault clear.
    m.update(13 * MIN, Some(400.0), 100.0, all_ok());
    assert!(!m.is_fire_out());
}

#[test]
fn no_fire_out_below_fan_saturation() {
    let mut m = monitor();
    m.update(0, Some(250.0), 50.0, all_ok());
    for i in 1..=12u64 {
        m.update(i * MIN, Some(250.0 - 6.0 * i as f32), 50.0, all_ok());
    }
    assert!(!m.is_fire_out());
}

#[test]
fn sub_minute_dips_are_invisible() {
    let mut m = monitor();
    m.update(0, Some(250.0), 100.0, all_ok());
    // A deep dip 30 s later lands between minute samples and is never seen.
    m.update(30_000, Some(150.0), 100.0, all_ok());
    m.update(MIN, Some(249.0), 100.0, all_ok());
    assert!(!m.is_fire_out());
}

#[test]
fn link_state_toggles_the_fault() {
    let mut m = monitor();
    m.update(0, Some(225.0), 0.0, all_ok());
    assert!(!m.has(FaultKind::LinkLost));

    m.set_link_connected(false);
    m.update(100, Some(225.0), 0.0, all_ok());
    assert!(m.has(FaultKind::LinkLost));

    m.set_link_connected(true);
    m.update(200, Some(225.0), 0.0, all_ok());
    assert!(!m.has(FaultKind::LinkLost));
}

#[test]
fn clear_all_resets_entries_and_decline_state() {
    let mut m = monitor();
    m.update(0, Some(250.0), 100.0, [ProbeStatus::Open, ProbeStatus::Ok, ProbeStatus::Ok]);
    assert!(m.count() > 0);
    m.clear_all();
    assert_eq!(m.count(), 0);
}
