//! Integration test: controller configuration from TOML files.

use freedrive_common::config::{ConfigError, ConfigLoader, LogLevel, Validate};
use freedrive_common::slots::{SlotNamespace, SlotRegistry};
use freedrive_controller::{ControllerConfig, FreedriveController, NullChannel};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tempfile::NamedTempFile;

const FULL_TOML: &str = r#"
cycle_time_us = 1000
driver = "simulation"

[shared]
log_level = "debug"
service_name = "cell-07"

[params]
maximum_retries = 25
action_monitor_period = 0.1
tf_prefix = "arm_"
allow_preemption = false

[simulation]
response_latency_cycles = 4
initialize_after_cycles = 10
"#;

const EXPLICIT_SLOTS_TOML: &str = r#"
[[slots]]
name = "system_interface/initialized"
namespace = "state"
index = 3
encoding = "flag"

[[slots]]
name = "freedrive_mode/async_success"
namespace = "command"
index = 10
encoding = "async_status"

[[slots]]
name = "freedrive_mode/enable"
namespace = "command"
index = 11
encoding = "flag"
"#;

fn write_temp(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn loads_full_file() {
    let file = write_temp(FULL_TOML);
    let config = ControllerConfig::load_validated(file.path()).unwrap();

    assert_eq!(config.cycle_time_us, 1000);
    assert_eq!(config.shared.log_level, LogLevel::Debug);
    assert_eq!(config.shared.service_name, "cell-07");
    assert_eq!(config.params.maximum_retries, 25);
    assert_eq!(config.params.monitor_period().as_millis(), 100);
    assert!(!config.params.allow_preemption);
    assert_eq!(config.simulation.response_latency_cycles, 4);

    let registry = SlotRegistry::from_layout(&config.layout()).unwrap();
    assert!(registry.lookup("arm_freedrive_mode/enable").is_some());
}

#[test]
fn loaded_file_configures_controller() {
    let file = write_temp(FULL_TOML);
    let config = ControllerConfig::load_validated(file.path()).unwrap();
    let registry = SlotRegistry::from_layout(&config.layout()).unwrap();

    let mut controller = FreedriveController::new(Arc::new(NullChannel));
    controller.on_configure(config.params, &registry).unwrap();
    assert_eq!(controller.params().tf_prefix, "arm_");
    assert!(
        controller
            .command_interface_configuration()
            .iter()
            .all(|name| name.starts_with("arm_"))
    );
}

#[test]
fn explicit_layout_without_optional_slots() {
    let file = write_temp(EXPLICIT_SLOTS_TOML);
    let config = ControllerConfig::load_validated(file.path()).unwrap();
    let registry = SlotRegistry::from_layout(&config.layout()).unwrap();

    let mut controller = FreedriveController::new(Arc::new(NullChannel));
    controller
        .on_configure(config.params.clone(), &registry)
        .unwrap();
    assert_eq!(controller.command_interface_configuration().len(), 2);
    assert_eq!(config.layout().slots[0].namespace, SlotNamespace::State);
}

#[test]
fn out_of_range_values_fail_validation() {
    let cases = [
        "[params]\nmaximum_retries = 100001\n",
        "[params]\naction_monitor_period = 0.0\n",
        "[params]\naction_monitor_period = 11.0\n",
        "[params]\ntf_prefix = \"left arm\"\n",
        "cycle_time_us = 100\n",
        "[shared]\nservice_name = \"  \"\n",
    ];
    for case in cases {
        let file = write_temp(case);
        let err = ControllerConfig::load_validated(file.path()).unwrap_err();
        assert!(
            matches!(err, ConfigError::ValidationError(_)),
            "{case:?} gave {err:?}"
        );
    }
}

#[test]
fn malformed_file_is_parse_error() {
    let file = write_temp("[params\nmaximum_retries = ");
    assert!(matches!(
        ControllerConfig::load(file.path()),
        Err(ConfigError::ParseError(_))
    ));
}

#[test]
fn missing_file_is_reported() {
    assert_eq!(
        ControllerConfig::load(Path::new("/nonexistent/freedrive.toml")).unwrap_err(),
        ConfigError::FileNotFound
    );
}

#[test]
fn default_config_round_trips_through_toml() {
    let text = toml::to_string_pretty(&ControllerConfig::default()).unwrap();
    let parsed = ControllerConfig::parse(&text).unwrap();
    assert_eq!(parsed, ControllerConfig::default());
    parsed.validate().unwrap();
}

#[test]
fn shipped_config_is_valid() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../config/freedrive.toml");
    let config = ControllerConfig::load_validated(&path).unwrap();
    assert_eq!(config.driver, "simulation");
}
