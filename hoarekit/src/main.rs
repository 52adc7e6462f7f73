use std::time::Duration;

use options::{Demo, OPTIONS};

mod demos;
mod options;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let max_delay = Duration::from_millis(OPTIONS.max_delay_ms);
    match OPTIONS.demo {
        Demo::Barbershop {
            barbers,
            customers,
            waiting_room,
            haircuts,
        } => {
            let served = demos::barbershop::run(demos::barbershop::Config {
                barbers,
                customers,
                waiting_room,
                haircuts,
                max_delay,
            });
            log::info!("barbershop closed after {} haircut(s)", served);
        }
        Demo::Smokers { smokers, rounds } => {
            let smoked = demos::smokers::run(smokers, rounds, max_delay);
            log::info!("tobacconist closed, smokes per smoker: {:?}", smoked);
        }
    }
}
