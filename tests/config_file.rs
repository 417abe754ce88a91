use std::fs;
use std::sync::Arc;

use plansim::{
    Environment, Fluent, ModelError, ProblemBuilder, SensingActionBuilder, SequentialSimulator,
    SimError, SimulatorConfig, Type, Value,
};

#[test]
fn config_loads_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("simulator.json");
    fs::write(&path, r#"{ "error_on_failed_checks": false, "max_state_ancestors": 4 }"#).unwrap();

    let config = SimulatorConfig::from_json_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert!(!config.error_on_failed_checks);
    assert_eq!(config.max_state_ancestors, 4);

    let written = serde_json::to_string(&config).unwrap();
    fs::write(&path, written).unwrap();
    let reloaded = SimulatorConfig::from_json_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(reloaded, config);
}

#[test]
fn lenient_config_accepts_unsupported_problem() {
    // Sensing actions make the problem contingent.
    let env = Environment::new();
    let door_open = Fluent::new(&env, "door_open", Type::Bool, vec![]).unwrap();
    let mut peek = SensingActionBuilder::new(&env, "peek", vec![]).unwrap();
    peek.add_observed_fluent(door_open.call(vec![]).unwrap()).unwrap();
    let problem = Arc::new(
        ProblemBuilder::new(&env, "door")
            .add_fluent(&door_open, Some(Value::Bool(false)))
            .add_action(peek.build())
            .build()
            .unwrap(),
    );

    let strict = SequentialSimulator::new(Arc::clone(&problem), SimulatorConfig::default());
    assert!(matches!(strict, Err(ref e) if e.is_unsupported()));

    let lenient = SimulatorConfig::from_json_str(r#"{ "error_on_failed_checks": false }"#).unwrap();
    assert!(SequentialSimulator::new(problem, lenient).is_ok());
}

#[test]
fn invalid_config_is_rejected_by_simulator() {
    let env = Environment::new();
    let problem = Arc::new(ProblemBuilder::new(&env, "empty").build().unwrap());
    let config = SimulatorConfig {
        max_state_ancestors: 0,
        ..SimulatorConfig::default()
    };
    let err = SequentialSimulator::new(problem, config).unwrap_err();
    assert!(matches!(err, SimError::Model(ModelError::InvalidConfig { .. })));
}
