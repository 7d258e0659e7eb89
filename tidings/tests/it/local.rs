use std::{
    cell::RefCell,
    convert::Infallible,
    rc::{Rc, Weak},
};

use assert_matches::assert_matches;
use tidings::{
    local::{Dispatcher, WeakDispatcher},
    DeliveryError, FailurePolicy, Observer,
};

use crate::{new_log, Log, Recorder, Refused};

#[test]
fn notify_in_registration_order() {
    let log = new_log::<i32>();
    let dispatcher = Dispatcher::<i32, Refused>::new();
    let a = Recorder::new("A", &log);
    let b = Recorder::new("B", &log);
    dispatcher.attach(a.clone());
    dispatcher.attach(b.clone());

    dispatcher.notify(&5).unwrap();
    assert_eq!(*log.borrow(), [("A", 5), ("B", 5)]);

    assert!(dispatcher.detach(&a));
    dispatcher.notify(&7).unwrap();
    assert_eq!(*log.borrow(), [("A", 5), ("B", 5), ("B", 7)]);
}

#[test]
fn attach_twice() {
    let log = new_log::<i32>();
    let dispatcher = Dispatcher::<i32, Refused>::new();
    let a = Recorder::new("A", &log);

    assert!(dispatcher.attach(a.clone()));
    assert!(!dispatcher.attach(a.clone()));
    assert_eq!(dispatcher.len(), 1);

    dispatcher.notify(&1).unwrap();
    assert_eq!(*log.borrow(), [("A", 1)]);
}

#[test]
fn detach_unknown() {
    let log = new_log::<i32>();
    let dispatcher = Dispatcher::<i32, Refused>::new();
    let a = Recorder::new("A", &log);
    let stranger = Recorder::new("stranger", &log);
    dispatcher.attach(a.clone());

    assert!(!dispatcher.detach(&stranger));
    assert!(dispatcher.contains(&a));
    assert!(!dispatcher.contains(&stranger));
    assert_eq!(dispatcher.len(), 1);
}

#[test]
fn clones_share_registry() {
    let log = new_log::<i32>();
    let dispatcher = Dispatcher::<i32, Refused>::default();
    let other = dispatcher.clone();
    assert!(other.is_empty());

    other.attach(Recorder::new("A", &log));
    assert_eq!(dispatcher.len(), 1);

    dispatcher.notify(&3).unwrap();
    assert_eq!(*log.borrow(), [("A", 3)]);
}

struct DetachSelf {
    me: Weak<DetachSelf>,
    dispatcher: WeakDispatcher<i32, Refused>,
    log: Log<i32>,
}

impl Observer<i32> for DetachSelf {
    type Error = Refused;

    fn update(&self, payload: &i32) -> Result<(), Refused> {
        self.log.borrow_mut().push(("quitter", *payload));
        if let (Some(dispatcher), Some(me)) = (self.dispatcher.upgrade(), self.me.upgrade()) {
            assert!(dispatcher.detach(&me));
        }
        Ok(())
    }
}

#[test]
fn detach_self_during_notify() {
    let log = new_log::<i32>();
    let dispatcher = Dispatcher::<i32, Refused>::new();
    let quitter = Rc::new_cyclic(|me| DetachSelf {
        me: me.clone(),
        dispatcher: dispatcher.downgrade(),
        log: log.clone(),
    });

    dispatcher.attach(Recorder::new("A", &log));
    dispatcher.attach(quitter.clone());
    dispatcher.attach(Recorder::new("B", &log));

    dispatcher.notify(&1).unwrap();
    assert_eq!(*log.borrow(), [("A", 1), ("quitter", 1), ("B", 1)]);
    assert!(!dispatcher.contains(&quitter));

    dispatcher.notify(&2).unwrap();
    assert_eq!(*log.borrow(), [("A", 1), ("quitter", 1), ("B", 1), ("A", 2), ("B", 2)]);
}

#[test]
fn detach_later_observer_during_notify() {
    let log = new_log::<i32>();
    let dispatcher = Dispatcher::<i32, Refused>::new();
    let b = Recorder::new("B", &log);

    let weak = dispatcher.downgrade();
    let victim = b.clone();
    dispatcher.attach(Rc::new(move |_: &i32| {
        if let Some(dispatcher) = weak.upgrade() {
            dispatcher.detach(&victim);
        }
        Ok::<_, Refused>(())
    }));
    dispatcher.attach(b);

    // B was registered when the pass started, so it still gets this one.
    dispatcher.notify(&1).unwrap();
    assert_eq!(*log.borrow(), [("B", 1)]);

    dispatcher.notify(&2).unwrap();
    assert_eq!(*log.borrow(), [("B", 1)]);
}

#[test]
fn attach_during_notify() {
    let log = new_log::<i32>();
    let dispatcher = Dispatcher::<i32, Refused>::new();
    let late = Recorder::new("late", &log);

    dispatcher.attach(Recorder::new("A", &log));
    let weak = dispatcher.downgrade();
    let recruit = late.clone();
    dispatcher.attach(Rc::new(move |_: &i32| {
        if let Some(dispatcher) = weak.upgrade() {
            dispatcher.attach(recruit.clone());
        }
        Ok::<_, Refused>(())
    }));

    dispatcher.notify(&1).unwrap();
    assert_eq!(*log.borrow(), [("A", 1)]);
    assert!(dispatcher.contains(&late));

    dispatcher.notify(&2).unwrap();
    assert_eq!(*log.borrow(), [("A", 1), ("A", 2), ("late", 2)]);
    // The second attach of `late` was ignored.
    assert_eq!(dispatcher.len(), 3);
}

#[test]
fn nested_notify() {
    let log = new_log::<i32>();
    let dispatcher = Dispatcher::<i32, Refused>::new();
    dispatcher.attach(Recorder::new("A", &log));

    let weak = dispatcher.downgrade();
    dispatcher.attach(Rc::new(move |value: &i32| -> Result<(), Refused> {
        if *value < 100 {
            if let Some(dispatcher) = weak.upgrade() {
                dispatcher.notify(&(value + 100)).map_err(DeliveryError::into_source)?;
            }
        }
        Ok(())
    }));

    dispatcher.notify(&1).unwrap();
    assert_eq!(*log.borrow(), [("A", 1), ("A", 101)]);
}

#[test]
fn abort_on_first_failure() {
    let log = new_log::<i32>();
    let dispatcher = Dispatcher::<i32, Refused>::new();
    assert_eq!(dispatcher.policy(), FailurePolicy::Abort);

    dispatcher.attach(Recorder::new("A", &log));
    dispatcher.attach(Recorder::failing_on("B", &log, 3));
    dispatcher.attach(Recorder::new("C", &log));

    let error = dispatcher.notify(&3).unwrap_err();
    assert_matches!(error, DeliveryError { position: 1, failures: 1, source: Refused("B") });
    assert_eq!(*log.borrow(), [("A", 3), ("B", 3)]);

    dispatcher.notify(&4).unwrap();
    assert_eq!(*log.borrow(), [("A", 3), ("B", 3), ("A", 4), ("B", 4), ("C", 4)]);
}

#[test]
fn continue_after_failure() {
    let log = new_log::<i32>();
    let dispatcher = Dispatcher::<i32, Refused>::with_policy(FailurePolicy::Continue);

    dispatcher.attach(Recorder::failing_on("A", &log, 3));
    dispatcher.attach(Recorder::new("B", &log));
    dispatcher.attach(Recorder::failing_on("C", &log, 3));

    let error = dispatcher.notify(&3).unwrap_err();
    assert_matches!(error, DeliveryError { position: 0, failures: 2, source: Refused("A") });
    assert_eq!(*log.borrow(), [("A", 3), ("B", 3), ("C", 3)]);
}

#[test]
fn unsized_payload() {
    let dispatcher = Dispatcher::<str>::new();
    let seen = Rc::new(RefCell::new(String::new()));

    let sink = seen.clone();
    dispatcher.attach(Rc::new(move |text: &str| {
        sink.borrow_mut().push_str(text);
        Ok::<_, Infallible>(())
    }));

    dispatcher.broadcast("hello, ");
    dispatcher.broadcast("world!");
    assert_eq!(*seen.borrow(), "hello, world!");
}

#[test]
fn weak_dispatcher() {
    let dispatcher = Dispatcher::<i32>::new();
    let weak = dispatcher.downgrade();
    assert!(weak.upgrade().is_some());

    drop(dispatcher);
    assert!(weak.upgrade().is_none());
}
