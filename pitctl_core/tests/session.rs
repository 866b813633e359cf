use pitctl_core::config::SessionCfg;
use pitctl_core::mocks::MemoryStore;
use pitctl_core::session::{CookSession, DATA_POINT_LEN, DataPoint, SessionSample, flags};

const START: u32 = 1_700_000_000;

fn small_cfg(capacity: usize) -> SessionCfg {
    SessionCfg {
        capacity,
        sample_interval_ms: 5_000,
        flush_interval_ms: 60_000,
    }
}

fn point(ts: u32) -> DataPoint {
    DataPoint {
        timestamp: ts,
        pit_deci: 2255,
        meat1_deci: 1450,
        meat2_deci: -105,
        fan_pct: 42,
        damper_pct: 77,
        flags: flags::LID_OPEN | flags::MEAT2_DISC,
    }
}

#[test]
fn data_point_codec_is_bit_exact() {
    let dp = point(START);
    let bytes = dp.encode();
    assert_eq!(bytes.len(), DATA_POINT_LEN);

    // Little-endian layout pinned byte by byte.
    assert_eq!(&bytes[0..4], &START.to_le_bytes());
    assert_eq!(&bytes[4..6], &2255i16.to_le_bytes());
    assert_eq!(&bytes[6..8], &1450i16.to_le_bytes());
    assert_eq!(&bytes[8..10], &(-105i16).to_le_bytes());
    assert_eq!(bytes[10], 42);
    assert_eq!(bytes[11], 77);
    assert_eq!(bytes[12], 0x81);

    assert_eq!(DataPoint::decode(&bytes), dp);
}

#[test]
fn ring_wrap_keeps_newest_and_counts_all() {
    let capacity = 100;
    let mut session = CookSession::new(MemoryStore::new(), small_cfg(capacity));
    session.start_session(0, Some(START));

    for i in 0..(capacity as u32 + 50) {
        session.add_point(point(i));
    }

    assert_eq!(session.count(), capacity);
    assert_eq!(session.total_points(), capacity as u64 + 50);
    assert!(session.is_wrapped());

    // Oldest surviving point is number 50; newest is the last added.
    assert_eq!(session.get_point(0).unwrap().timestamp, 50);
    assert_eq!(
        session.get_point(capacity - 1).unwrap().timestamp,
        capacity as u32 + 49
    );
    assert!(session.get_point(capacity).is_none());
}

#[test]
fn flush_writes_header_then_records() {
    let store = MemoryStore::new();
    let mut session = CookSession::new(store.clone(), small_cfg(16));
    session.start_session(0, Some(START));

    session.add_point(point(START));
    session.add_point(point(START + 5));
    session.flush();

    let bytes = store.contents().unwrap();
    assert_eq!(bytes.len(), 4 + 2 * DATA_POINT_LEN);
    assert_eq!(&bytes[0..4], &START.to_le_bytes());

    let mut record = [0u8; DATA_POINT_LEN];
    record.copy_from_slice(&bytes[4..4 + DATA_POINT_LEN]);
    assert_eq!(DataPoint::decode(&record), point(START));

    assert_eq!(session.flushed_up_to(), 2);

    // A second flush with nothing pending appends nothing.
    session.flush();
    assert_eq!(store.contents().unwrap().len(), 4 + 2 * DATA_POINT_LEN);

    // Later points append without a second header.
    session.add_point(point(START + 10));
    session.flush();
    assert_eq!(store.contents().unwrap().len(), 4 + 3 * DATA_POINT_LEN);
}

#[test]
fn flush_failure_keeps_points_pending() {
    let store = MemoryStore::new();
    let mut session = CookSession::new(store.clone(), small_cfg(16));
    session.start_session(0, Some(START));
    session.add_point(point(START));

    store.set_fail_appends(true);
    session.flush();
    assert_eq!(session.flushed_up_to(), 0);
    assert!(store.contents().is_none());

    // Next interval retries the same span, header included.
    store.set_fail_appends(false);
    session.flush();
    assert_eq!(session.flushed_up_to(), 1);
    let bytes = store.contents().unwrap();
    assert_eq!(bytes.len(), 4 + DATA_POINT_LEN);
}

#[test]
fn flush_is_bounded_by_ring_contents() {
    // More unflushed points than the ring holds: only the ring tail goes
    // out; older points are lost by construction.
    let store = MemoryStore::new();
    let mut session = CookSession::new(store.clone(), small_cfg(8));
    session.start_session(0, Some(START));

    for i in 0..20u32 {
        session.add_point(point(i));
    }
    session.flush();

    let bytes = store.contents().unwrap();
    assert_eq!(bytes.len(), 4 + 8 * DATA_POINT_LEN);
    // The flushed tail is points 12..=19.
    let mut record = [0u8; DATA_POINT_LEN];
    record.copy_from_slice(&bytes[4..4 + DATA_POINT_LEN]);
    assert_eq!(DataPoint::decode(&record).timestamp, 12);
    assert_eq!(session.flushed_up_to(), 20);
}

#[test]
fn recovery_restores_a_prior_session() {
    // Hand-written file image: header + 5 points.
    let mut image = Vec::new();
    image.extend_from_slice(&START.to_le_bytes());
    for i in 0..5u32 {
        image.extend_from_slice(&point(START + i * 5).encode());
    }

    let store = MemoryStore::with_contents(image);
    let mut session = CookSession::new(store, small_cfg(100));
    session.begin();

    assert!(session.is_active());
    assert_eq!(session.start_epoch(), START);
    assert_eq!(session.count(), 5);
    assert_eq!(session.total_points(), 5);
    assert_eq!(session.flushed_up_to(), 5);
    assert!(!session.is_wrapped());
    assert_eq!(*session.get_point(0).unwrap(), point(START));
    assert_eq!(*session.get_point(4).unwrap(), point(START + 20));
}

#[test]
fn recovery_discards_points_older_than_the_ring() {
    let mut image = Vec::new();
    image.extend_from_slice(&START.to_le_bytes());
    for i in 0..10u32 {
        image.extend_from_slice(&point(i).encode());
    }

    let store = MemoryStore::with_contents(image);
    let mut session = CookSession::new(store, small_cfg(4));
    session.begin();

    assert!(session.is_active());
    assert_eq!(session.count(), 4);
    assert_eq!(session.total_points(), 10);
    assert!(session.is_wrapped());
    assert_eq!(session.get_point(0).unwrap().timestamp, 6);
    assert_eq!(session.get_point(3).unwrap().timestamp, 9);
}

#[test]
fn recovery_treats_garbage_as_no_session() {
    // Too short for a header.
    let store = MemoryStore::with_contents(vec![1, 2]);
    let mut session = CookSession::new(store, small_cfg(8));
    session.begin();
    assert!(!session.is_active());
    assert_eq!(session.count(), 0);

    // Header only, no points.
    let store = MemoryStore::with_contents(START.to_le_bytes().to_vec());
    let mut session = CookSession::new(store, small_cfg(8));
    session.begin();
    assert!(!session.is_active());
}

#[test]
fn update_samples_and_flushes_on_their_own_cadences() {
    let store = MemoryStore::new();
    let mut session = CookSession::new(store.clone(), small_cfg(100));
    session.start_session(0, Some(START));

    let sample = SessionSample {
        pit: 225.5,
        meat1: 145.0,
        meat2: 0.0,
        fan_pct: 42,
        damper_pct: 77,
        flags: flags::MEAT2_DISC,
    };

    // Inside the sample interval: nothing recorded.
    session.update(4_999, Some(START + 4), &sample);
    assert_eq!(session.count(), 0);

    session.update(5_000, Some(START + 5), &sample);
    assert_eq!(session.count(), 1);
    let dp = session.get_point(0).unwrap();
    assert_eq!(dp.pit_deci, 2255);
    assert_eq!(dp.meat1_deci, 1450);
    assert_eq!(dp.timestamp, START + 5);

    // Flush interval fires inside update at the 60 s mark.
    for step in 2..=13u64 {
        session.update(step * 5_000, Some(START + (step * 5) as u32), &sample);
    }
    assert!(store.contents().is_some());
    assert_eq!(session.flushed_up_to(), 12);
    assert_eq!(session.total_points(), 13);
}

#[test]
fn start_session_wipes_ram_and_store() {
    let store = MemoryStore::new();
    let mut session = CookSession::new(store.clone(), small_cfg(16));
    session.start_session(0, Some(START));
    session.add_point(point(START));
    session.flush();
    assert!(store.contents().is_some());

    session.start_session(100_000, Some(START + 100));
    assert!(session.is_active());
    assert_eq!(session.count(), 0);
    assert_eq!(session.total_points(), 0);
    assert_eq!(session.start_epoch(), START + 100);
    assert!(store.contents().is_none());
}

#[test]
fn end_session_flushes_the_tail_and_deactivates() {
    let store = MemoryStore::new();
    let mut session = CookSession::new(store.clone(), small_cfg(16));
    session.start_session(0, Some(START));
    session.add_point(point(START));

    session.end_session();
    assert!(!session.is_active());
    assert_eq!(store.contents().unwrap().len(), 4 + DATA_POINT_LEN);

    // The file survives for export; clear removes it.
    session.clear();
    assert!(store.contents().is_none());
    assert!(!session.is_active());
}

#[test]
fn csv_and_json_walk_oldest_to_newest() {
    let mut session = CookSession::new(MemoryStore::new(), small_cfg(16));
    session.start_session(0, Some(START));
    session.add_point(point(START));
    session.add_point(DataPoint {
        timestamp: START + 5,
        pit_deci: 2260,
        ..point(START + 5)
    });

    let csv = session.to_csv();
    let mut lines = csv.lines();
    assert_eq!(
        lines.next().unwrap(),
        "timestamp,pit,meat1,meat2,fan,damper,flags"
    );
    assert_eq!(
        lines.next().unwrap(),
        format!("{START},225.5,145.0,-10.5,42,77,129")
    );
    assert!(lines.next().unwrap().starts_with(&format!("{},226.0", START + 5)));

    let json = session.to_json().unwrap();
    assert!(json.starts_with('['));
    assert!(json.contains("\"ts\":1700000000"));
    assert!(json.contains("\"pit\":225.5"));
    assert_eq!(json.matches("\"ts\"").count(), 2);
}

#[test]
fn elapsed_tracks_the_wall_clock() {
    let mut session = CookSession::new(MemoryStore::new(), small_cfg(16));
    assert_eq!(session.elapsed_secs(Some(START)), 0);

    session.start_session(0, Some(START));
    assert_eq!(session.elapsed_secs(Some(START + 90)), 90);
    assert_eq!(session.elapsed_secs(None), 0);
    // A wall clock stepping backwards never underflows.
    assert_eq!(session.elapsed_secs(Some(START - 10)), 0);
}
