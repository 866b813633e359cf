use pitctl_core::alarm::{AlarmCenter, AlarmInputs, AlarmKind};
use pitctl_core::config::AlarmCfg;
use pitctl_core::mocks::RecordingBuzzer;
use pitctl_core::probe::MeatProbe;

fn center() -> (AlarmCenter<RecordingBuzzer>, RecordingBuzzer) {
    let buzzer = RecordingBuzzer::new();
    (AlarmCenter::new(buzzer.clone(), AlarmCfg::default()), buzzer)
}

fn inputs(pit: f32, setpoint: f32, pit_reached: bool) -> AlarmInputs {
    AlarmInputs {
        pit: Some(pit),
        meat1: None,
        meat2: None,
        setpoint,
        pit_reached,
    }
}

#[test]
fn pit_alarm_armed_only_after_first_approach() {
    let (mut alarms, _buzzer) = center();
    alarms.set_pit_band(15.0);

    // 300F against a 250F setpoint, but the pit never reached setpoint:
    // ramp-up deviation stays silent.
    alarms.update(0, &inputs(300.0, 250.0, false));
    assert!(alarms.active().is_empty());

    alarms.update(1_000, &inputs(300.0, 250.0, true));
    assert!(alarms.is_active(AlarmKind::PitHigh));
    assert!(alarms.is_alarming());

    // Back in band clears the alarm.
    alarms.update(2_000, &inputs(255.0, 250.0, true));
    assert!(!alarms.is_active(AlarmKind::PitHigh));
    assert!(alarms.active().is_empty());
}

#[rstest::rstest]
#[case(265.0, None)] // exactly setpoint + band: strict inequality, no alarm
#[case(265.1, Some(AlarmKind::PitHigh))]
#[case(235.0, None)] // exactly setpoint - band
#[case(234.9, Some(AlarmKind::PitLow))]
#[case(250.0, None)]
fn pit_band_is_a_strict_inequality(#[case] pit: f32, #[case] expected: Option<AlarmKind>) {
    let (mut alarms, _buzzer) = center();
    alarms.set_pit_band(15.0);
    alarms.update(0, &inputs(pit, 250.0, true));
    match expected {
        Some(kind) => assert!(alarms.is_active(kind)),
        None => assert!(alarms.active().is_empty()),
    }
}

#[test]
fn pit_high_and_low_are_mutually_exclusive() {
    let (mut alarms, _buzzer) = center();
    for (t, ms) in [(300.0, 0u64), (200.0, 1_000), (255.0, 2_000), (190.0, 3_000)] {
        alarms.update(ms, &inputs(t, 250.0, true));
        let both = alarms.is_active(AlarmKind::PitHigh) && alarms.is_active(AlarmKind::PitLow);
        assert!(!both, "PitHigh and PitLow both active at {t}");
    }
}

#[test]
fn acknowledged_pit_alarm_rearms_only_after_returning_in_band() {
    let (mut alarms, buzzer) = center();
    alarms.update(0, &inputs(300.0, 250.0, true));
    assert!(alarms.is_alarming());

    alarms.acknowledge();
    assert!(!alarms.is_alarming());
    assert!(!buzzer.is_on());

    // Still out of band: the acknowledged alarm must not re-fire.
    alarms.update(1_000, &inputs(301.0, 250.0, true));
    assert!(alarms.active().is_empty());

    // In band, then out again: fires fresh.
    alarms.update(2_000, &inputs(250.0, 250.0, true));
    alarms.update(3_000, &inputs(300.0, 250.0, true));
    assert!(alarms.is_active(AlarmKind::PitHigh));
}

#[test]
fn meat_completion_hysteresis() {
    let (mut alarms, _buzzer) = center();
    alarms.set_meat_target(MeatProbe::Meat1, 200.0);

    let meat = |t: f32| AlarmInputs {
        pit: None,
        meat1: Some(t),
        meat2: None,
        setpoint: 0.0,
        pit_reached: false,
    };

    alarms.update(0, &meat(200.0));
    assert!(alarms.is_active(AlarmKind::Meat1Done));

    alarms.acknowledge();
    alarms.update(1_000, &meat(205.0));
    assert!(alarms.active().is_empty(), "must not re-fire after ack");

    // A new target re-arms the alarm.
    alarms.set_meat_target(MeatProbe::Meat1, 210.0);
    alarms.update(2_000, &meat(210.0));
    assert!(alarms.is_active(AlarmKind::Meat1Done));
}

#[test]
fn meat_alarm_skips_invalid_probe() {
    let (mut alarms, _buzzer) = center();
    alarms.set_meat_target(MeatProbe::Meat2, 150.0);

    // Disconnected probe (None) never completes, whatever the target.
    alarms.update(0, &AlarmInputs {
        pit: None,
        meat1: None,
        meat2: None,
        setpoint: 0.0,
        pit_reached: false,
    });
    assert!(alarms.active().is_empty());
}

#[test]
fn buzzer_alternates_at_the_configured_cadence() {
    let (mut alarms, buzzer) = center();
    let hot = inputs(300.0, 250.0, true);

    alarms.update(1_000, &hot);
    assert!(alarms.is_alarming());
    assert!(buzzer.is_on());
    assert_eq!(buzzer.last_freq(), 2000);

    // Still inside the 500 ms on-slice.
    alarms.update(1_400, &hot);
    assert!(buzzer.is_on());

    alarms.update(1_600, &hot);
    assert!(!buzzer.is_on());

    alarms.update(2_200, &hot);
    assert!(buzzer.is_on());
}

#[test]
fn disable_silences_and_bypasses_evaluation() {
    let (mut alarms, buzzer) = center();
    alarms.update(1_000, &inputs(300.0, 250.0, true));
    assert!(buzzer.is_on());

    alarms.set_enabled(false);
    assert!(!buzzer.is_on());

    // Evaluation is bypassed entirely while disabled.
    alarms.update(2_000, &inputs(400.0, 250.0, true));
    assert!(!buzzer.is_on());
}

#[test]
fn nonpositive_band_is_rejected() {
    let (mut alarms, _buzzer) = center();
    let before = alarms.pit_band();
    alarms.set_pit_band(0.0);
    assert_eq!(alarms.pit_band(), before);
    alarms.set_pit_band(-3.0);
    assert_eq!(alarms.pit_band(), before);
    alarms.set_pit_band(20.0);
    assert_eq!(alarms.pit_band(), 20.0);
}
