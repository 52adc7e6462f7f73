//! Cigarette smokers.
//!
//! A tobacconist puts one ingredient at a time on the counter. Each smoker
//! misses exactly one ingredient, takes it when it shows up and smokes.

use std::{thread, time::Duration};

use hoarekit::{Condition, Conditions, MonitorCall, MonitorRef};
use rand::Rng;

use super::random_delay;

pub struct Tobacconist {
    counter: Option<usize>,
    open: bool,
    smoked: Vec<usize>,
    counter_empty: Condition,
    smokers: Vec<Condition>,
}

impl Tobacconist {
    pub fn new(conditions: &mut Conditions<'_>, smokers: usize) -> Self {
        Self {
            counter: None,
            open: true,
            smoked: vec![0; smokers],
            counter_empty: conditions.create_condition(),
            smokers: (0..smokers).map(|_| conditions.create_condition()).collect(),
        }
    }
}

pub trait TobacconistCalls {
    fn put_ingredient(&mut self, ingredient: usize);
    fn wait_for_empty_counter(&mut self);
    /// Take `smoker`'s ingredient, waiting until it is on the counter. Returns
    /// `false` once the shop is closed.
    fn take_ingredient(&mut self, smoker: usize) -> bool;
    fn close(&mut self);
}

impl TobacconistCalls for MonitorCall<'_, Tobacconist> {
    fn put_ingredient(&mut self, ingredient: usize) {
        self.counter = Some(ingredient);
        log::info!("tobacconist: ingredient {ingredient} on the counter");
        let smoker = self.smokers[ingredient];
        smoker.signal(self);
    }

    fn wait_for_empty_counter(&mut self) {
        if self.counter.is_some() {
            self.counter_empty.wait(self);
        }
    }

    fn take_ingredient(&mut self, smoker: usize) -> bool {
        if self.counter != Some(smoker) {
            if !self.open {
                return false;
            }
            let queue = self.smokers[smoker];
            queue.wait(self);
            if self.counter != Some(smoker) {
                // woken by `close`
                return false;
            }
        }
        log::info!("smoker {smoker}: took ingredient {smoker}");
        self.counter = None;
        self.smoked[smoker] += 1;
        self.counter_empty.signal(self);
        true
    }

    fn close(&mut self) {
        self.wait_for_empty_counter();
        self.open = false;
        for smoker in 0..self.smokers.len() {
            let queue = self.smokers[smoker];
            while !queue.is_empty(self) {
                queue.signal(self);
            }
        }
    }
}

/// Sell `rounds` random ingredients to `smokers` smokers. Returns how often
/// each smoker smoked.
pub fn run(smokers: usize, rounds: usize, max_delay: Duration) -> Vec<usize> {
    if smokers == 0 {
        log::warn!("tobacconist without smokers stays closed");
        return Vec::new();
    }
    let shop = MonitorRef::create("tobacconist", |conditions| {
        Tobacconist::new(conditions, smokers)
    });

    let smoker_threads = (0..smokers)
        .map(|smoker| {
            let shop = shop.clone();
            thread::spawn(move || {
                shop.register_thread_role("smoker", smoker);
                while shop.call().take_ingredient(smoker) {
                    log::info!("smoker {smoker}: smoking");
                    random_delay(max_delay);
                }
            })
        })
        .collect::<Vec<_>>();

    shop.register_thread_name("tobacconist");
    for _ in 0..rounds {
        random_delay(max_delay / 4);
        let ingredient = rand::rng().random_range(0..smokers);
        let mut call = shop.call();
        call.wait_for_empty_counter();
        call.put_ingredient(ingredient);
    }
    shop.call().close();

    for smoker in smoker_threads {
        smoker.join().expect("smoker thread panicked");
    }
    let smoked = shop.call().smoked.clone();
    smoked
}
