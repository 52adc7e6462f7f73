use std::sync::LazyLock;

use clap::{builder::RangedU64ValueParser, Parser, Subcommand};

#[derive(Parser)]
#[clap(about = "Classic concurrency puzzles solved with Hoare monitors")]
pub struct Options {
    /// Upper bound, in milliseconds, of the random delays simulating work.
    #[clap(long, global = true, default_value_t = 200)]
    pub max_delay_ms: u64,

    #[clap(subcommand)]
    pub demo: Demo,
}

#[derive(Subcommand)]
pub enum Demo {
    /// Sleeping barbers with a waiting room.
    Barbershop {
        #[clap(long, default_value_t = 1, value_parser = at_least_one())]
        barbers: usize,

        #[clap(long, default_value_t = 3)]
        customers: usize,

        /// Seats in the waiting room. Customers finding it full come back later.
        /// Unlimited if not given.
        #[clap(long)]
        waiting_room: Option<usize>,

        /// Haircuts each customer gets before the shop closes.
        #[clap(long, default_value_t = 3)]
        haircuts: usize,
    },
    /// A tobacconist serving smokers that each miss one ingredient.
    Smokers {
        #[clap(long, default_value_t = 3, value_parser = at_least_one())]
        smokers: usize,

        /// Ingredients sold before the shop closes.
        #[clap(long, default_value_t = 10)]
        rounds: usize,
    },
}

fn at_least_one() -> RangedU64ValueParser<usize> {
    RangedU64ValueParser::new().range(1..)
}

pub static OPTIONS: LazyLock<Options> = LazyLock::new(Options::parse);
