mod common;

use std::{
    panic::{self, AssertUnwindSafe},
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Barrier,
    },
    thread,
};

use common::{init_logger, wait_until};
use hoarekit::{Condition, Monitor, MonitorRef};

/// Client state recording the order in which things happened.
struct Journal {
    events: Vec<&'static str>,
    queue: Condition,
}

fn journal(name: &str) -> MonitorRef<Journal> {
    MonitorRef::create(name, |conditions| Journal {
        events: Vec::new(),
        queue: conditions.create_condition(),
    })
}

fn wait_for_queue(monitor: &MonitorRef<Journal>, waiters: usize) {
    wait_until("condition waiters", || {
        let call = monitor.call();
        call.queue.waiters(&call) == waiters
    });
}

#[test]
fn at_most_one_occupant_under_contention() {
    init_logger();
    let monitor = MonitorRef::create("counter", |_| 0usize);
    let inside = Arc::new(AtomicUsize::new(0));
    let start = Arc::new(Barrier::new(8));

    let workers = (0..8)
        .map(|_| {
            let monitor = monitor.clone();
            let inside = inside.clone();
            let start = start.clone();
            thread::spawn(move || {
                start.wait();
                for _ in 0..500 {
                    let mut call = monitor.call();
                    assert_eq!(inside.fetch_add(1, Ordering::SeqCst), 0);
                    *call += 1;
                    thread::yield_now();
                    assert_eq!(inside.fetch_sub(1, Ordering::SeqCst), 1);
                }
            })
        })
        .collect::<Vec<_>>();

    for worker in workers {
        worker.join().unwrap();
    }
    assert_eq!(*monitor.call(), 8 * 500);
    assert!(!monitor.is_occupied());
}

struct BoundedBuffer {
    items: Vec<usize>,
    capacity: usize,
    not_full: Condition,
    not_empty: Condition,
}

#[test]
fn bounded_buffer_with_if_guards() {
    // Checking the guards with `if` is only correct when a signalled waiter
    // runs before anybody else can change the state.
    init_logger();
    let buffer = MonitorRef::create("bounded buffer", |conditions| BoundedBuffer {
        items: Vec::new(),
        capacity: 2,
        not_full: conditions.create_condition(),
        not_empty: conditions.create_condition(),
    });
    let inside = Arc::new(AtomicUsize::new(0));
    const PER_PRODUCER: usize = 200;

    let producers = (0..3)
        .map(|producer| {
            let buffer = buffer.clone();
            let inside = inside.clone();
            thread::spawn(move || {
                for item in 0..PER_PRODUCER {
                    let mut call = buffer.call();
                    if call.items.len() == call.capacity {
                        call.not_full.wait(&mut call);
                    }
                    assert_eq!(inside.fetch_add(1, Ordering::SeqCst), 0);
                    assert!(call.items.len() < call.capacity);
                    call.items.push(producer * PER_PRODUCER + item);
                    inside.fetch_sub(1, Ordering::SeqCst);
                    call.not_empty.signal(&mut call);
                }
            })
        })
        .collect::<Vec<_>>();

    let consumers = (0..2)
        .map(|_| {
            let buffer = buffer.clone();
            let inside = inside.clone();
            thread::spawn(move || {
                let mut taken = Vec::new();
                for _ in 0..(3 * PER_PRODUCER / 2) {
                    let mut call = buffer.call();
                    if call.items.is_empty() {
                        call.not_empty.wait(&mut call);
                    }
                    assert_eq!(inside.fetch_add(1, Ordering::SeqCst), 0);
                    let item = call.items.pop().expect("signalled buffer is not empty");
                    inside.fetch_sub(1, Ordering::SeqCst);
                    taken.push(item);
                    call.not_full.signal(&mut call);
                }
                taken
            })
        })
        .collect::<Vec<_>>();

    for producer in producers {
        producer.join().unwrap();
    }
    let mut taken = consumers
        .into_iter()
        .flat_map(|consumer| consumer.join().unwrap())
        .collect::<Vec<_>>();
    taken.sort_unstable();
    assert_eq!(taken, (0..3 * PER_PRODUCER).collect::<Vec<_>>());
}

#[test]
fn signalled_waiter_and_signaller_run_before_entrants() {
    init_logger();
    let monitor = journal("urgent priority");

    let waiter = {
        let monitor = monitor.clone();
        thread::spawn(move || {
            let mut call = monitor.call();
            call.queue.wait(&mut call);
            call.events.push("waiter resumed");
        })
    };
    wait_for_queue(&monitor, 1);

    let mut call = monitor.call();

    let entrant = {
        let monitor = monitor.clone();
        thread::spawn(move || {
            monitor.call().events.push("entrant entered");
        })
    };
    wait_until("entrant blocked", || monitor.entry_waiters() == 1);

    call.events.push("signalling");
    call.queue.signal(&mut call);
    call.events.push("signaller resumed");
    drop(call);

    waiter.join().unwrap();
    entrant.join().unwrap();
    assert_eq!(
        monitor.call().events,
        [
            "signalling",
            "waiter resumed",
            "signaller resumed",
            "entrant entered"
        ]
    );
}

#[test]
fn fresh_entrants_cannot_barge_into_a_hand_off() {
    init_logger();
    for _ in 0..100 {
        let monitor = journal("barging");
        let stop = Arc::new(AtomicBool::new(false));

        let waiter = {
            let monitor = monitor.clone();
            thread::spawn(move || {
                let mut call = monitor.call();
                call.queue.wait(&mut call);
                call.events.push("woken");
            })
        };
        wait_for_queue(&monitor, 1);

        let entrants = (0..4)
            .map(|_| {
                let monitor = monitor.clone();
                let stop = stop.clone();
                thread::spawn(move || {
                    while !stop.load(Ordering::Relaxed) {
                        monitor.call().events.push("entrant");
                        thread::yield_now();
                    }
                })
            })
            .collect::<Vec<_>>();
        wait_until("entrants running", || monitor.call().events.len() >= 8);

        {
            let mut call = monitor.call();
            call.events.push("signal");
            call.queue.signal(&mut call);
            call.events.push("signaller");
        }
        waiter.join().unwrap();
        stop.store(true, Ordering::Relaxed);
        for entrant in entrants {
            entrant.join().unwrap();
        }

        let call = monitor.call();
        let signal = call
            .events
            .iter()
            .position(|event| *event == "signal")
            .unwrap();
        assert_eq!(
            call.events[signal..signal + 3],
            ["signal", "woken", "signaller"]
        );
    }
}

#[test]
fn signal_on_empty_condition_is_a_no_op() {
    init_logger();
    let monitor = journal("no-op signal");
    let mut call = monitor.call();
    let me = thread::current().id();

    assert!(call.queue.is_empty(&call));
    call.queue.signal(&mut call);

    assert_eq!(call.monitor().occupant(), Some(me));
    assert_eq!(monitor.urgent_waiters(), 0);
    call.events.push("still inside");
    drop(call);
    assert!(!monitor.is_occupied());
}

#[test]
fn woken_waiter_owns_the_monitor() {
    init_logger();
    let monitor = journal("wait symmetry");

    let waiter = {
        let monitor = monitor.clone();
        thread::spawn(move || {
            let mut call = monitor.call();
            call.queue.wait(&mut call);
            let me = thread::current().id();
            assert_eq!(call.monitor().occupant(), Some(me));
            me
        })
    };
    wait_for_queue(&monitor, 1);
    assert!(!monitor.is_occupied());

    let mut call = monitor.call();
    call.queue.signal(&mut call);
    assert_eq!(call.monitor().occupant(), Some(thread::current().id()));
    drop(call);

    let waiter_id = waiter.join().unwrap();
    assert_ne!(waiter_id, thread::current().id());
}

#[test]
fn rendezvous_interleaving() {
    init_logger();
    let monitor = journal("rendezvous");

    let t1 = {
        let monitor = monitor.clone();
        thread::spawn(move || {
            let mut call = monitor.call();
            call.queue.wait(&mut call);
            call.events.push("t1 resumed");
            call.events.push("t1 leaving");
        })
    };
    wait_for_queue(&monitor, 1);

    let t2 = {
        let monitor = monitor.clone();
        thread::spawn(move || {
            let mut call = monitor.call();
            call.queue.signal(&mut call);
            call.events.push("t2 resumed from signal");
            assert!(call.queue.is_empty(&call));
            call.queue.signal(&mut call);
            call.events.push("t2 second signal was a no-op");
            call.events.push("t2 leaving");
        })
    };

    t1.join().unwrap();
    t2.join().unwrap();
    assert_eq!(
        monitor.call().events,
        [
            "t1 resumed",
            "t1 leaving",
            "t2 resumed from signal",
            "t2 second signal was a no-op",
            "t2 leaving"
        ]
    );
}

#[test]
fn same_condition_waiters_resume_in_arrival_order() {
    // parking_lot queues condvar waiters in FIFO order and has no spurious
    // wakeups, so a condition serves its waiters first come, first served.
    init_logger();
    let monitor = MonitorRef::create("fifo", |conditions| {
        (Vec::<usize>::new(), conditions.create_condition())
    });
    let queue = monitor.call().1;

    let waiters = (0..4)
        .map(|id| {
            let handle = monitor.clone();
            let waiter = thread::spawn(move || {
                let mut call = handle.call();
                queue.wait(&mut call);
                call.0.push(id);
            });
            wait_until("waiter queued", || {
                let call = monitor.call();
                queue.waiters(&call) == id + 1
            });
            waiter
        })
        .collect::<Vec<_>>();

    {
        let mut call = monitor.call();
        for _ in 0..4 {
            queue.signal(&mut call);
        }
        assert_eq!(call.0, [0, 1, 2, 3]);
    }
    for waiter in waiters {
        waiter.join().unwrap();
    }
}

#[test]
fn chained_signals_unwind_through_urgent_gate() {
    init_logger();
    let monitor = MonitorRef::create("relay", |conditions| {
        (
            Vec::<&'static str>::new(),
            conditions.create_condition(),
            conditions.create_condition(),
        )
    });
    let (first, second) = {
        let call = monitor.call();
        (call.1, call.2)
    };

    let last = {
        let monitor = monitor.clone();
        thread::spawn(move || {
            let mut call = monitor.call();
            second.wait(&mut call);
            call.0.push("last runner");
        })
    };
    wait_until("last runner queued", || {
        let call = monitor.call();
        second.waiters(&call) == 1
    });

    let middle = {
        let monitor = monitor.clone();
        thread::spawn(move || {
            let mut call = monitor.call();
            first.wait(&mut call);
            call.0.push("middle runner");
            second.signal(&mut call);
            call.0.push("middle runner resumed");
        })
    };
    wait_until("middle runner queued", || {
        let call = monitor.call();
        first.waiters(&call) == 1
    });

    {
        let mut call = monitor.call();
        call.0.push("first runner");
        first.signal(&mut call);
        call.0.push("first runner resumed");
    }
    last.join().unwrap();
    middle.join().unwrap();

    let events = monitor.call().0.clone();
    assert_eq!(&events[..3], ["first runner", "middle runner", "last runner"]);
    // both signallers resume after the relay ends, in some order
    let mut resumed = events[3..].to_vec();
    resumed.sort_unstable();
    assert_eq!(resumed, ["first runner resumed", "middle runner resumed"]);
}

#[test]
fn panicking_inside_the_monitor_releases_it() {
    init_logger();
    let monitor = MonitorRef::create("panicky", |_| 0u32);

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        let mut call = monitor.call();
        *call += 1;
        panic!("client operation failed");
    }));
    assert!(result.is_err());
    assert!(!monitor.is_occupied());

    let other = {
        let monitor = monitor.clone();
        thread::spawn(move || {
            let mut call = monitor.call();
            *call += 1;
        })
    };
    other.join().unwrap();
    assert_eq!(*monitor.call(), 2);
}

#[test]
fn clean_monitor_drops_silently() {
    init_logger();
    let mut monitor = Monitor::new("plain", |conditions| {
        vec![conditions.create_condition()]
    });
    let late = monitor.create_condition();
    monitor.get_mut().push(late);
    assert_eq!(monitor.conditions(), 2);
    assert_eq!(late.index(), 1);
    assert_eq!(late.monitor_id(), monitor.id());

    {
        let mut call = monitor.call();
        let queue = call[1];
        queue.signal(&mut call);
    }
    drop(monitor);

    let shared = journal("shared");
    let clone = shared.clone();
    assert_eq!(MonitorRef::handle_count(&shared), 2);
    assert!(MonitorRef::ptr_eq(&shared, &clone));
    thread::spawn(move || {
        clone.call().events.push("from another thread");
    })
    .join()
    .unwrap();
    assert_eq!(MonitorRef::handle_count(&shared), 1);
    drop(shared);
}

#[test]
fn thread_names_are_per_monitor() {
    init_logger();
    let a = journal("a");
    let b = journal("b");
    a.register_thread_role("smoker", 1);
    assert_eq!(a.thread_name(), "smoker 1");
    assert_eq!(b.thread_name(), "(unknown)");
    b.register_thread_name("tobacconist");
    assert_eq!(b.thread_name(), "tobacconist");

    let debug = format!("{:?}", a);
    assert!(debug.contains("named_threads: 1"), "{debug}");
    assert!(debug.contains("entry_open: true"), "{debug}");
}
