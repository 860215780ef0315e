//! Reload and freeze scenarios through root and derived facades.

use super::test_utils::{reload_to_next, root_with_bucket, Buckets};
use hotroute::{Extension, Facade, FacadeError, Level, Record};
use serde_json::json;
use std::sync::Arc;

fn record(text: &str) -> Record {
    Record::from_text(Level::Info, text)
}

#[test]
fn test_reload_then_freeze_routes_to_live_generation() {
    let buckets = Buckets::new();
    let root = root_with_bucket(&buckets);
    let logger = root.logger();
    let child = logger
        .derive(Extension::property("Component", "scenario").unwrap())
        .unwrap();

    logger.emit(record("first")).unwrap();
    assert_eq!(buckets.get(0).received(), 1);

    reload_to_next(&root, &buckets);
    logger.emit(record("second")).unwrap();
    assert_eq!(buckets.get(1).received(), 1);
    assert_eq!(buckets.get(0).received(), 1);

    // The child never resolved before the reload; it resolves against P1 now.
    child.emit(record("third")).unwrap();
    assert_eq!(buckets.get(1).received(), 2);

    root.freeze().unwrap();
    for _ in 0..10 {
        logger.emit(record("root")).unwrap();
        child.emit(record("child")).unwrap();
    }

    assert_eq!(buckets.get(1).received(), 22);
    assert_eq!(buckets.get(0).received(), 1);
    assert_eq!(buckets.get(0).dispose_calls(), 1);
    assert_eq!(buckets.get(1).dispose_calls(), 0);
    assert_eq!(buckets.total_after_dispose(), 0);

    root.dispose();
    assert!(buckets.all_disposed_once());
}

#[test]
fn test_child_resolved_before_reload_moves_to_new_pipeline() {
    let buckets = Buckets::new();
    let root = root_with_bucket(&buckets);
    let child = root
        .logger()
        .derive(Extension::property("Component", "early").unwrap())
        .unwrap();

    child.emit(record("before")).unwrap();
    reload_to_next(&root, &buckets);
    reload_to_next(&root, &buckets);
    child.emit(record("after")).unwrap();

    assert_eq!(buckets.get(0).received(), 1);
    assert_eq!(buckets.get(1).received(), 0);
    assert_eq!(buckets.get(2).received(), 1);
    // Skipped generations cost one re-derivation, not one per reload.
    assert_eq!(child.derivation_count(), 2);
}

#[test]
fn test_derived_facades_created_after_reload_see_new_pipeline() {
    let buckets = Buckets::retaining();
    let root = root_with_bucket(&buckets);
    let service = root
        .logger()
        .derive(Extension::property("Service", "orders").unwrap())
        .unwrap();
    service.emit(record("warmup")).unwrap();

    reload_to_next(&root, &buckets);
    let request = service
        .derive(Extension::property("Request", 9).unwrap())
        .unwrap();
    request.emit(record("handled")).unwrap();

    let records = buckets.get(1).records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].property("Service"), Some(&json!("orders")));
    assert_eq!(records[0].property("Request"), Some(&json!(9)));
}

#[test]
fn test_cache_reused_between_reloads() {
    let buckets = Buckets::new();
    let root = root_with_bucket(&buckets);
    let child = root
        .logger()
        .derive(Extension::property("Component", "cache").unwrap())
        .unwrap();

    let first = child.pipeline().unwrap();
    for _ in 0..100 {
        child.emit(record("x")).unwrap();
        assert!(Arc::ptr_eq(&first, &child.pipeline().unwrap()));
    }
    assert_eq!(child.derivation_count(), 1);

    reload_to_next(&root, &buckets);
    let second = child.pipeline().unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
    assert!(Arc::ptr_eq(&second, &child.pipeline().unwrap()));
}

#[test]
fn test_freeze_monotonicity() {
    let buckets = Buckets::new();
    let root = root_with_bucket(&buckets);
    reload_to_next(&root, &buckets);
    let generation = root.generation().unwrap();

    root.freeze().unwrap();
    for _ in 0..3 {
        assert!(matches!(root.freeze(), Err(FacadeError::AlreadyFrozen)));
        let sink = buckets.next();
        let result = root.reload(move |b: hotroute::pipeline::RoutingBuilder| b.write_to(sink));
        assert!(matches!(result, Err(FacadeError::AlreadyFrozen)));
    }

    assert_eq!(root.generation().unwrap(), generation);
    assert_eq!(buckets.get(1).dispose_calls(), 0);
    root.logger().emit(record("still live")).unwrap();
    assert_eq!(buckets.get(1).received(), 1);
}

#[test]
fn test_write_skips_binding_for_disabled_levels() {
    let buckets = Buckets::retaining();
    let sink = buckets.next();
    let root = hotroute::RootFacade::build(move |b: hotroute::pipeline::RoutingBuilder| {
        b.minimum_level(Level::Warn).write_to(sink)
    })
    .unwrap();
    let logger = root.logger();

    logger
        .write(Level::Info, "ignored {n}", &[json!(1)])
        .unwrap();
    logger
        .write(Level::Error, "Disk {disk} at {pct}%", &[json!("sda"), json!(97)])
        .unwrap();
    logger.write(Level::Error, "broken {template", &[]).unwrap();

    let records = buckets.get(0).records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].message(), "Disk sda at 97%");
    assert_eq!(records[1].message(), "broken {template");
}
