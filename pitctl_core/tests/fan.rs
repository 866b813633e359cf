use pitctl_core::config::FanCfg;
use pitctl_core::fan::{FanDrive, percent_to_duty};
use pitctl_core::mocks::RecordingPwm;

fn drive() -> (FanDrive<RecordingPwm>, RecordingPwm) {
    let pwm = RecordingPwm::new();
    (FanDrive::new(pwm.clone(), FanCfg::default()), pwm)
}

#[test]
fn initial_state_is_off() {
    let (fan, _pwm) = drive();
    assert_eq!(fan.current_pct(), 0.0);
    assert_eq!(fan.current_duty(), 0);
    assert!(!fan.is_kick_starting());
}

#[test]
fn kickstart_fires_on_zero_to_nonzero() {
    let (mut fan, pwm) = drive();
    fan.set_speed(30.0);
    fan.update(0);

    assert!(fan.is_kick_starting());
    assert_eq!(fan.current_pct(), 75.0);
    assert_eq!(pwm.last_duty(), Some(percent_to_duty(75.0)));
}

#[test]
fn kickstart_holds_until_deadline_then_applies_target() {
    let (mut fan, pwm) = drive();
    fan.set_speed(30.0);
    fan.update(0);
    fan.update(499);
    assert!(fan.is_kick_starting());
    assert_eq!(fan.current_pct(), 75.0);

    fan.update(500);
    assert!(!fan.is_kick_starting());
    assert_eq!(fan.current_pct(), 30.0);
    assert_eq!(pwm.last_duty(), Some(percent_to_duty(30.0)));
}

#[test]
fn min_speed_clamp_in_normal_mode() {
    let (mut fan, _pwm) = drive();
    // 12% is above the 10% long-pulse threshold but below the 15% min speed.
    fan.set_speed(12.0);
    fan.update(0);
    fan.update(500);
    assert!(!fan.is_long_pulsing());
    assert_eq!(fan.current_pct(), 15.0);
}

#[test]
fn long_pulse_cycles_between_min_speed_and_off() {
    let (mut fan, _pwm) = drive();
    fan.set_speed(5.0);
    fan.update(0); // kickstart
    fan.update(500); // kickstart done, enters long-pulse anchored at 500

    assert!(fan.is_long_pulsing());
    // On-fraction = 5/10 = 0.5 of the 10 s cycle.
    assert_eq!(fan.current_pct(), 15.0); // on-slice runs at min speed

    fan.update(500 + 4_999);
    assert_eq!(fan.current_pct(), 15.0);

    fan.update(500 + 5_000);
    assert_eq!(fan.current_pct(), 0.0);
    assert_eq!(fan.current_duty(), 0);
    assert!(fan.is_long_pulsing());

    // Next cycle wraps back to the on-slice.
    fan.update(500 + 10_001);
    assert_eq!(fan.current_pct(), 15.0);
}

#[test]
fn long_pulse_off_slice_does_not_rearm_kickstart() {
    let (mut fan, _pwm) = drive();
    fan.set_speed(5.0);
    fan.update(0);
    fan.update(500);
    fan.update(500 + 6_000); // off-slice
    assert_eq!(fan.current_duty(), 0);

    fan.update(500 + 10_001); // back to on-slice, no kickstart
    assert!(!fan.is_kick_starting());
    assert_eq!(fan.current_pct(), 15.0);
}

#[test]
fn normal_to_long_pulse_and_back_tracks_threshold() {
    let (mut fan, _pwm) = drive();
    fan.set_speed(30.0);
    fan.update(0);
    fan.update(500);
    assert!(!fan.is_long_pulsing());

    fan.set_speed(8.0);
    fan.update(1_000);
    assert!(fan.is_long_pulsing());

    fan.set_speed(40.0);
    fan.update(1_100);
    assert!(!fan.is_long_pulsing());
    assert_eq!(fan.current_pct(), 40.0);
}

#[test]
fn off_clears_everything_and_rearms_kickstart() {
    let (mut fan, pwm) = drive();
    fan.set_speed(50.0);
    fan.update(0);
    assert!(fan.is_kick_starting());

    fan.off();
    assert_eq!(fan.current_pct(), 0.0);
    assert_eq!(fan.current_duty(), 0);
    assert!(!fan.is_kick_starting());
    assert!(!fan.is_long_pulsing());
    assert_eq!(pwm.last_duty(), Some(0));

    // Next non-zero speed kick-starts again.
    fan.set_speed(60.0);
    fan.update(100);
    assert!(fan.is_kick_starting());
}

#[test]
fn target_zero_stops_and_rearms() {
    let (mut fan, _pwm) = drive();
    fan.set_speed(30.0);
    fan.update(0);
    fan.update(500);
    assert_eq!(fan.current_pct(), 30.0);

    fan.set_speed(0.0);
    fan.update(600);
    assert_eq!(fan.current_duty(), 0);

    fan.set_speed(20.0);
    fan.update(700);
    assert!(fan.is_kick_starting());
}

#[test]
fn manual_duty_freezes_the_state_machine() {
    let (mut fan, pwm) = drive();
    fan.set_manual_duty(99);
    assert!(fan.is_manual());
    assert_eq!(fan.current_duty(), 99);

    // Automatic requests are ignored while latched.
    fan.set_speed(80.0);
    fan.update(0);
    assert_eq!(fan.current_duty(), 99);
    assert_eq!(pwm.last_duty(), Some(99));

    // off() exits manual mode.
    fan.off();
    assert!(!fan.is_manual());
    fan.set_speed(80.0);
    fan.update(100);
    assert!(fan.is_kick_starting());
}

#[test]
fn speed_requests_are_clamped() {
    let (mut fan, _pwm) = drive();
    fan.set_speed(250.0);
    assert_eq!(fan.target_pct(), 100.0);
    fan.set_speed(-10.0);
    assert_eq!(fan.target_pct(), 0.0);
}
