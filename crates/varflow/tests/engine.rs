//! Tests for reactive propagation through the engine

use std::sync::{Arc, Mutex};
use varflow::prelude::*;

/// Shared log of notifications, safe to capture in Send callbacks
fn shared_log() -> Arc<Mutex<Vec<ValueChange>>> {
    Arc::new(Mutex::new(Vec::new()))
}

fn subscribe_log(engine: &mut Engine, name: &str, log: &Arc<Mutex<Vec<ValueChange>>>) {
    let log = Arc::clone(log);
    engine
        .subscribe(
            name,
            Box::new(move |change| log.lock().unwrap().push(change.clone())),
        )
        .unwrap();
}

/// Diamond: y and z both derive from x, w derives from both. A change to x
/// recomputes and notifies each variable exactly once.
#[test]
fn test_diamond_propagation() {
    let mut engine = Engine::new();
    engine.define_input("x", 1.0).unwrap();
    engine.define_formula("y", "x * 2").unwrap();
    engine.define_formula("z", "x * 3").unwrap();
    engine.define_formula("w", "y + z").unwrap();

    // Settle the graph before observing
    assert_eq!(engine.value("w").unwrap(), 5.0);

    let log = shared_log();
    for name in ["x", "y", "z", "w"] {
        subscribe_log(&mut engine, name, &log);
    }

    let stats = engine.set_value("x", 2.0).unwrap();
    assert_eq!(stats.recomputed, 3);
    assert_eq!(stats.changed, 4);

    assert_eq!(engine.get("y").unwrap().value(), 4.0);
    assert_eq!(engine.get("z").unwrap().value(), 6.0);
    assert_eq!(engine.get("w").unwrap().value(), 10.0);

    let log = log.lock().unwrap();
    let names: Vec<&str> = log.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["x", "y", "z", "w"]);
    let news: Vec<f64> = log.iter().map(|c| c.new).collect();
    assert_eq!(news, [2.0, 4.0, 6.0, 10.0]);
}

/// Registering a cycle fails atomically: the graph answers exactly as before
/// the attempt.
#[test]
fn test_cycle_rejected_atomically() {
    let mut engine = Engine::new();
    engine.define_input("a", 1.0).unwrap();
    engine.define_input("b", 2.0).unwrap();
    engine.define_formula("c", "a + b").unwrap();
    engine.define_formula("d", "c + a").unwrap();

    assert_eq!(engine.value("c").unwrap(), 3.0);
    assert_eq!(engine.value("d").unwrap(), 4.0);

    // Rebinding a to depend on d would close a -> c -> d -> a
    let err = engine.set_formula("a", "d + 1").unwrap_err();
    assert!(matches!(
        err,
        Error::Core(varflow::CoreError::CircularDependency { .. })
    ));
    let message = err.to_string();
    assert!(message.contains('a'), "error should name the variable: {message}");

    // Everything still reads exactly as before
    assert_eq!(engine.value("a").unwrap(), 1.0);
    assert_eq!(engine.value("b").unwrap(), 2.0);
    assert_eq!(engine.value("c").unwrap(), 3.0);
    assert_eq!(engine.value("d").unwrap(), 4.0);

    // And a is still an input that propagates normally
    engine.set_value("a", 2.0).unwrap();
    assert_eq!(engine.value("c").unwrap(), 4.0);
    assert_eq!(engine.value("d").unwrap(), 6.0);
}

/// A rebind that fails to compile leaves the old binding and edges in force
#[test]
fn test_failed_rebind_keeps_old_binding() {
    let mut engine = Engine::new();
    engine.define_input("a", 2.0).unwrap();
    engine.define_formula("c", "a * 2").unwrap();
    assert_eq!(engine.value("c").unwrap(), 4.0);

    assert!(engine.set_formula("c", "unknown + 1").is_err());
    assert!(engine.set_formula("c", "a + * 3").is_err());

    // Old formula still evaluates and still reacts to a
    assert_eq!(engine.value("c").unwrap(), 4.0);
    let stats = engine.set_value("a", 5.0).unwrap();
    assert_eq!(stats.recomputed, 1);
    assert_eq!(engine.get("c").unwrap().value(), 10.0);
}

/// Direct self-reference through set_formula is also a cycle
#[test]
fn test_self_reference_rejected() {
    let mut engine = Engine::new();
    engine.define_input("a", 1.0).unwrap();
    assert!(engine.set_formula("a", "a + 1").is_err());
    assert_eq!(engine.value("a").unwrap(), 1.0);
}

/// Setting an input to its current value is a no-op: no recomputation, no
/// notification.
#[test]
fn test_short_circuit_law() {
    let mut engine = Engine::new();
    engine.define_input("x", 5.0).unwrap();
    engine.define_formula("y", "x ^ 2").unwrap();
    engine.value("y").unwrap();

    let log = shared_log();
    subscribe_log(&mut engine, "x", &log);
    subscribe_log(&mut engine, "y", &log);

    let stats = engine.set_value("x", 5.0).unwrap();
    assert_eq!(stats, PropagationStats::default());
    assert!(log.lock().unwrap().is_empty());
}

/// Same-bits NaN is no change: the bitwise compare short-circuits even
/// though NaN != NaN numerically
#[test]
fn test_repeated_nan_set_is_a_no_op() {
    let mut engine = Engine::new();
    engine.define_input("x", 1.0).unwrap();
    engine.define_formula("y", "x + 1").unwrap();
    engine.value("y").unwrap();

    let log = shared_log();
    subscribe_log(&mut engine, "x", &log);
    subscribe_log(&mut engine, "y", &log);

    let stats = engine.set_value("x", f64::NAN).unwrap();
    assert_eq!(stats.changed, 2);
    log.lock().unwrap().clear();

    let stats = engine.set_value("x", f64::NAN).unwrap();
    assert_eq!(stats, PropagationStats::default());
    assert!(log.lock().unwrap().is_empty());
}

/// A recomputation that lands on the same bits does not notify
#[test]
fn test_unchanged_recomputation_not_notified() {
    let mut engine = Engine::new();
    engine.define_input("x", 2.0).unwrap();
    engine.define_formula("y", "abs(x)").unwrap();
    engine.value("y").unwrap();

    let log = shared_log();
    subscribe_log(&mut engine, "y", &log);

    // x changes sign; abs(x) does not change
    let stats = engine.set_value("x", -2.0).unwrap();
    assert_eq!(stats.recomputed, 1);
    assert_eq!(stats.changed, 1); // only x itself
    assert!(log.lock().unwrap().is_empty());
}

/// NaN flows through dependents without being treated as an error
#[test]
fn test_nan_propagates_transparently() {
    let mut engine = Engine::new();
    engine.define_input("x", 4.0).unwrap();
    engine.define_formula("y", "sqrt(x)").unwrap();
    engine.define_formula("z", "y + 1").unwrap();
    assert_eq!(engine.value("z").unwrap(), 3.0);

    engine.set_value("x", -4.0).unwrap();
    assert!(engine.value("y").unwrap().is_nan());
    assert!(engine.value("z").unwrap().is_nan());

    // and recovers
    engine.set_value("x", 9.0).unwrap();
    assert_eq!(engine.value("z").unwrap(), 4.0);
}

/// Chained formulas recompute bottom-up in one pass
#[test]
fn test_chain_recomputes_in_order() {
    let mut engine = Engine::new();
    engine.define_input("x", 1.0).unwrap();
    engine.define_formula("a", "x + 1").unwrap();
    engine.define_formula("b", "a + 1").unwrap();
    engine.define_formula("c", "b + 1").unwrap();
    assert_eq!(engine.value("c").unwrap(), 4.0);

    let stats = engine.set_value("x", 10.0).unwrap();
    assert_eq!(stats.recomputed, 3);
    assert_eq!(engine.get("a").unwrap().value(), 11.0);
    assert_eq!(engine.get("b").unwrap().value(), 12.0);
    assert_eq!(engine.get("c").unwrap().value(), 13.0);
}

#[test]
fn test_unsubscribe_stops_delivery() {
    let mut engine = Engine::new();
    engine.define_input("x", 1.0).unwrap();

    let log = shared_log();
    let captured = Arc::clone(&log);
    let sub = engine
        .subscribe(
            "x",
            Box::new(move |change| captured.lock().unwrap().push(change.clone())),
        )
        .unwrap();

    engine.set_value("x", 2.0).unwrap();
    assert_eq!(log.lock().unwrap().len(), 1);

    assert!(engine.unsubscribe(sub));
    engine.set_value("x", 3.0).unwrap();
    assert_eq!(log.lock().unwrap().len(), 1);

    // second removal reports unknown
    assert!(!engine.unsubscribe(sub));
}

/// Multiple observers of one variable fire in subscription order
#[test]
fn test_observer_ordering() {
    let mut engine = Engine::new();
    engine.define_input("x", 0.0).unwrap();

    let order = Arc::new(Mutex::new(Vec::new()));
    for tag in ["first", "second", "third"] {
        let order = Arc::clone(&order);
        engine
            .subscribe("x", Box::new(move |_| order.lock().unwrap().push(tag)))
            .unwrap();
    }

    engine.set_value("x", 1.0).unwrap();
    assert_eq!(*order.lock().unwrap(), ["first", "second", "third"]);
}

/// A failed definition leaves no trace in the engine
#[test]
fn test_failed_definition_leaves_state_untouched() {
    let mut engine = Engine::new();
    engine.define_input("x", 1.0).unwrap();

    assert!(engine.define_formula("y", "x + undefined").is_err());
    assert!(engine.define_formula("z", "2 + * 3").is_err());

    assert_eq!(engine.len(), 1);
    assert!(engine.get("y").is_none());
    assert!(engine.get("z").is_none());
    assert_eq!(engine.value("x").unwrap(), 1.0);
}

/// First read of a freshly defined formula settles it without an input change
#[test]
fn test_first_read_settles() {
    let mut engine = Engine::new();
    engine.define_input("r", 2.0).unwrap();
    engine.define_formula("area", "pi() * r ^ 2").unwrap();

    let area = engine.value("area").unwrap();
    assert!((area - std::f64::consts::PI * 4.0).abs() < 1e-12);
    assert!(!engine.get("area").unwrap().is_dirty());
}
