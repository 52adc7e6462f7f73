//! Sleeping barbers.
//!
//! Customers either wake a sleeping barber or wait in the waiting room until a
//! barber calls them, then sit in that barber's chair until the haircut is
//! finished. Both hand-offs rely on urgent-wait semantics: the thread being
//! signalled runs before the signaller continues, so the barber's number
//! stored in `called_by` is read by the customer it was meant for.

use std::{thread, time::Duration};

use hoarekit::{Condition, Conditions, MonitorCall, MonitorRef};

use super::random_delay;

#[derive(Debug, Clone, Copy)]
pub struct Config {
    pub barbers: usize,
    pub customers: usize,
    pub waiting_room: Option<usize>,
    pub haircuts: usize,
    pub max_delay: Duration,
}

pub struct Barbershop {
    waiting_room_seats: Option<usize>,
    open: bool,
    /// Barber that just called (or was woken for) the next customer.
    called_by: Option<usize>,
    served: usize,
    waiting_room: Condition,
    sleeping_barbers: Condition,
    chairs: Vec<Condition>,
}

impl Barbershop {
    pub fn new(
        conditions: &mut Conditions<'_>,
        barbers: usize,
        waiting_room: Option<usize>,
    ) -> Self {
        Self {
            waiting_room_seats: waiting_room,
            open: true,
            called_by: None,
            served: 0,
            waiting_room: conditions.create_condition(),
            sleeping_barbers: conditions.create_condition(),
            chairs: (0..barbers).map(|_| conditions.create_condition()).collect(),
        }
    }

    pub fn served(&self) -> usize {
        self.served
    }
}

pub trait BarbershopCalls {
    /// Get a haircut. Returns `false` without a haircut when the waiting room
    /// is full.
    fn get_haircut(&mut self, customer: usize) -> bool;
    /// Wait for the next customer and seat them in `barber`'s chair. Returns
    /// `false` once the shop is closed and nobody is waiting.
    fn next_customer(&mut self, barber: usize) -> bool;
    /// Let the customer in `barber`'s chair go.
    fn finish_customer(&mut self, barber: usize);
    /// Close the shop and send sleeping barbers home.
    fn close(&mut self);
}

impl BarbershopCalls for MonitorCall<'_, Barbershop> {
    fn get_haircut(&mut self, customer: usize) -> bool {
        if self.sleeping_barbers.is_empty(self) {
            let seated = self.waiting_room.waiters(self);
            if self.waiting_room_seats.is_some_and(|seats| seated >= seats) {
                log::info!("customer {customer}: waiting room is full, coming back later");
                return false;
            }
            log::info!("customer {customer}: sitting in the waiting room ({seated} ahead)");
            self.waiting_room.wait(self);
        } else {
            log::info!("customer {customer}: waking up a barber");
            self.sleeping_barbers.signal(self);
        }

        let barber = self
            .called_by
            .take()
            .expect("a barber hands over before the customer resumes");
        log::info!("customer {customer}: in the chair of barber {barber}");
        let chair = self.chairs[barber];
        chair.wait(self);

        self.served += 1;
        log::info!("customer {customer}: done, see you");
        true
    }

    fn next_customer(&mut self, barber: usize) -> bool {
        if self.waiting_room.is_empty(self) {
            if !self.open {
                return false;
            }
            log::info!("barber {barber}: nobody here, sleeping");
            self.sleeping_barbers.wait(self);
            if !self.open {
                log::info!("barber {barber}: shop closed, going home");
                return false;
            }
            // the customer who woke us resumes as soon as we leave
            self.called_by = Some(barber);
        } else {
            log::info!("barber {barber}: next, please");
            self.called_by = Some(barber);
            self.waiting_room.signal(self);
        }
        true
    }

    fn finish_customer(&mut self, barber: usize) {
        log::info!("barber {barber}: finished");
        let chair = self.chairs[barber];
        chair.signal(self);
    }

    fn close(&mut self) {
        self.open = false;
        while !self.sleeping_barbers.is_empty(self) {
            self.sleeping_barbers.signal(self);
        }
    }
}

/// Run the barbershop until every customer got `config.haircuts` haircuts.
/// Returns the number of haircuts given.
pub fn run(config: Config) -> usize {
    if config.barbers == 0 {
        log::warn!("barbershop without barbers stays closed");
        return 0;
    }
    let shop = MonitorRef::create("barbershop", |conditions| {
        Barbershop::new(conditions, config.barbers, config.waiting_room)
    });

    let barbers = (0..config.barbers)
        .map(|barber| {
            let shop = shop.clone();
            thread::spawn(move || {
                shop.register_thread_role("barber", barber);
                loop {
                    if !shop.call().next_customer(barber) {
                        break;
                    }
                    random_delay(config.max_delay);
                    shop.call().finish_customer(barber);
                }
            })
        })
        .collect::<Vec<_>>();

    let customers = (0..config.customers)
        .map(|customer| {
            let shop = shop.clone();
            thread::spawn(move || {
                shop.register_thread_role("customer", customer);
                for _ in 0..config.haircuts {
                    while !shop.call().get_haircut(customer) {
                        random_delay(config.max_delay);
                    }
                    // growing hair
                    random_delay(config.max_delay);
                }
            })
        })
        .collect::<Vec<_>>();

    for customer in customers {
        customer.join().expect("customer thread panicked");
    }
    shop.call().close();
    for barber in barbers {
        barber.join().expect("barber thread panicked");
    }

    let served = shop.call().served();
    served
}
