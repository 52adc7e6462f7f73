//! Client monitors built on the public `hoarekit` API.
pub mod barbershop;
pub mod smokers;

use std::{thread, time::Duration};

use rand::Rng;

/// Sleep for a random duration up to `max`, simulating work done outside the
/// monitor.
pub fn random_delay(max: Duration) {
    let max = max.as_millis() as u64;
    if max == 0 {
        return;
    }
    let millis = rand::rng().random_range(max / 10..=max);
    thread::sleep(Duration::from_millis(millis));
}
