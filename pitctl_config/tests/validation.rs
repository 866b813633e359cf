use pitctl_config::load_toml;

const FULL: &str = r#"
units = "F"
setpoint = 225.0

[pid]
kp = 4.0
ki = 0.02
kd = 5.0
sample_ms = 1000

[fan]
on_threshold = 70.0
min_speed = 15.0
kickstart_pct = 75.0
kickstart_ms = 500
longpulse_threshold = 10.0
longpulse_cycle_ms = 10000

[alarms]
pit_band = 15.0
buzzer_freq = 2000
buzzer_on_ms = 500
buzzer_off_ms = 500

[sampler]
interval_ms = 1000
reference_ohms = 10000.0
adc_max = 32767
open_threshold = 32000
short_threshold = 200

[[probes]]
name = "Pit"
a = 7.739251279e-4
b = 2.088025997e-4
c = 1.154400438e-7

[[probes]]
name = "Brisket"
a = 7.739251279e-4
b = 2.088025997e-4
c = 1.154400438e-7
offset = 1.5

[[probes]]
name = "Ribs"
a = 7.739251279e-4
b = 2.088025997e-4
c = 1.154400438e-7
"#;

#[test]
fn full_config_parses_with_defaults_for_optional_sections() {
    let cfg = load_toml(FULL).unwrap();
    assert!(cfg.is_fahrenheit());
    assert_eq!(cfg.setpoint, 225.0);
    assert_eq!(cfg.pid.kp, 4.0);
    assert_eq!(cfg.fan.on_threshold, 70.0);
    assert_eq!(cfg.probes.len(), 3);
    assert_eq!(cfg.probes[1].offset, 1.5);
    assert_eq!(cfg.probes[0].offset, 0.0);

    // Optional sections fall back to compiled-in values.
    assert_eq!(cfg.lid.drop_pct, 6.0);
    assert_eq!(cfg.damper.open_deg, 90);
    assert_eq!(cfg.fireout.duration_ms, 600_000);
    assert_eq!(cfg.session.capacity, 5760);
    assert!(cfg.session.file.is_none());
    assert!(cfg.logging.level.is_none());
}

#[test]
fn optional_sections_can_be_overridden() {
    let toml = format!(
        "{FULL}\n[lid]\ndrop_pct = 8.0\nrecover_pct = 3.0\n\n[session]\ncapacity = 100\nsample_interval_ms = 1000\nflush_interval_ms = 5000\nfile = \"/tmp/cook.bin\"\n"
    );
    let cfg = load_toml(&toml).unwrap();
    assert_eq!(cfg.lid.drop_pct, 8.0);
    assert_eq!(cfg.session.capacity, 100);
    assert_eq!(cfg.session.file.as_deref(), Some("/tmp/cook.bin"));
}

#[test]
fn missing_required_section_is_an_error() {
    let broken = FULL.replace("[pid]", "[notpid]");
    assert!(load_toml(&broken).is_err());
}

#[test]
fn missing_required_field_is_an_error() {
    let broken = FULL.replace("kp = 4.0\n", "");
    assert!(load_toml(&broken).is_err());
}

#[test]
fn celsius_units_parse() {
    let toml = FULL.replace("units = \"F\"", "units = \"C\"");
    let cfg = load_toml(&toml).unwrap();
    assert!(!cfg.is_fahrenheit());
}

#[test]
fn garbage_is_rejected_not_panicked() {
    assert!(load_toml("this is not toml [").is_err());
    assert!(load_toml("").is_err());
}
