//! End-to-end scheduler scenarios through the public API.

use chronos::{
    Context, Disposition, Event, EventScheduler, EventStatus, SchedulerError, SimTime,
};

fn foo_bar() -> Context {
    let mut ctx = Context::new();
    ctx.insert("foo".into(), "bar".into());
    ctx
}

#[test]
fn timeout_then_step_returns_executed_event() {
    let s = EventScheduler::new();
    let ev = s.timeout(10.0, || 2018, Some(foo_bar())).unwrap();

    let out = s.step().unwrap().unwrap();
    assert_eq!(out, ev);
    assert_eq!(out.time(), SimTime::from(10));
    assert_eq!(out.result(), Some(&2018));
    assert_eq!(out.context(), Some(&foo_bar()));
    assert_eq!(s.current_time(), SimTime::from(10));
}

#[test]
fn equal_times_run_in_insertion_order() {
    let s = EventScheduler::new();
    let e1 = s.timeout(5.0, || "a", None).unwrap();
    let e2 = s.timeout(5.0, || "b", None).unwrap();
    assert!(e1.id() < e2.id());

    assert_eq!(s.step().unwrap().unwrap().result(), Some(&"a"));
    assert_eq!(s.step().unwrap().unwrap().result(), Some(&"b"));
}

#[test]
fn activate_restores_active_from_either_state() {
    let e: Event<()> = Event::at(SimTime::from(2018));
    e.activate();
    assert_eq!(e.status(), EventStatus::Active);
    e.set_status(EventStatus::Inactive);
    e.activate();
    assert_eq!(e.status(), EventStatus::Active);
}

#[test]
fn deactivate_then_activate() {
    let e: Event<()> = Event::at(SimTime::from(2018));
    e.deactivate();
    e.activate();
    assert_eq!(e.status(), EventStatus::Active);
}

#[test]
fn deactivated_event_is_logged_without_result() {
    let s = EventScheduler::new();
    let e = s.timeout(3.0, || 1, None).unwrap();
    e.deactivate();

    let out = s.step().unwrap().unwrap();
    assert!(out.result().is_none());
    assert!(s.event_log().contains(&out));
    assert_eq!(s.event_log().get(0).unwrap().disposition, Disposition::Skipped);
}

#[test]
fn step_on_empty_queue_returns_none() {
    let s: EventScheduler<()> = EventScheduler::new();
    assert!(s.step().unwrap().is_none());
    assert_eq!(s.current_time(), SimTime::ZERO);
    assert!(s.event_log().is_empty());
}

#[test]
fn negative_delay_is_rejected() {
    let s: EventScheduler<()> = EventScheduler::new();
    assert_eq!(
        s.timeout(-0.1, || (), None).unwrap_err(),
        SchedulerError::InvalidDelay { delay: -0.1 }
    );
    assert_eq!(s.pending_count(), 0);
}

#[test]
fn cancelling_a_follow_up_from_inside_an_action() {
    use std::cell::RefCell;
    use std::rc::Rc;

    let s: EventScheduler<&'static str> = EventScheduler::new();
    let retry: Rc<RefCell<Option<Event<&'static str>>>> = Rc::default();

    let handle = s.downgrade();
    let slot = Rc::clone(&retry);
    s.timeout(
        1.0,
        move || {
            let event = handle.timeout(5.0, || "retry", None).unwrap();
            *slot.borrow_mut() = Some(event);
            "request"
        },
        None,
    )
    .unwrap();

    let slot = Rc::clone(&retry);
    s.timeout(
        2.0,
        move || {
            if let Some(event) = slot.borrow().as_ref() {
                event.deactivate();
            }
            "response"
        },
        None,
    )
    .unwrap();

    assert_eq!(s.run_until_empty().unwrap(), 3);
    let dispositions: Vec<Disposition> = s
        .event_log()
        .entries()
        .iter()
        .map(|entry| entry.disposition)
        .collect();
    assert_eq!(
        dispositions,
        vec![
            Disposition::Dispatched,
            Disposition::Dispatched,
            Disposition::Skipped
        ]
    );
    assert_eq!(s.current_time(), SimTime::from(6));
    assert!(retry.borrow().as_ref().unwrap().result().is_none());
}
