use satchel_sync::ConnectivityMonitor;

#[tokio::test]
async fn starts_with_initial_value() {
    let monitor = ConnectivityMonitor::new(false);
    assert!(!monitor.is_online());

    let rx = monitor.observe();
    assert!(!*rx.borrow());
}

#[tokio::test]
async fn set_online_reports_transitions() {
    let monitor = ConnectivityMonitor::new(true);

    assert!(!monitor.set_online(true)); // no transition
    assert!(monitor.set_online(false));
    assert!(!monitor.set_online(false));
    assert!(monitor.set_online(true));
}

#[tokio::test]
async fn duplicate_states_emit_nothing() {
    let monitor = ConnectivityMonitor::new(true);
    let mut rx = monitor.observe();

    monitor.set_online(true);
    assert!(!rx.has_changed().unwrap());

    monitor.set_online(false);
    assert!(rx.has_changed().unwrap());
    rx.changed().await.unwrap();
    assert!(!*rx.borrow());

    monitor.set_online(false);
    assert!(!rx.has_changed().unwrap());
}

#[tokio::test]
async fn observer_sees_each_transition() {
    let monitor = ConnectivityMonitor::new(true);
    let mut rx = monitor.observe();

    monitor.set_online(false);
    rx.changed().await.unwrap();
    assert!(!*rx.borrow_and_update());

    monitor.set_online(true);
    rx.changed().await.unwrap();
    assert!(*rx.borrow_and_update());
}

#[tokio::test]
async fn late_observer_starts_with_current_value() {
    let monitor = ConnectivityMonitor::new(true);
    monitor.set_online(false);

    let rx = monitor.observe();
    assert!(!*rx.borrow());
}
