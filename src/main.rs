extern crate dotenvy;
extern crate env_logger;
extern crate envy;
extern crate iron;
#[macro_use]
extern crate log;
extern crate logger;
extern crate router;
extern crate serde;
#[macro_use]
extern crate serde_derive;
#[macro_use]
extern crate serde_json;
extern crate urlencoded;

#[cfg(test)]
extern crate iron_test;

mod config;
mod database;
mod error;
mod handlers;
mod model;

use std::process;

use config::Config;
use database::Database;

use iron::Iron;
use logger::Logger;

// RUST_LOG=info,logger=info posts_api
fn main() {
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("invalid configuration: {}", e);
            process::exit(1);
        }
    };

    let (logger_before, logger_after) = Logger::new(None);

    let database = Database::seeded();
    info!("starting with {} seeded posts", database.posts().len());

    let mut chain = handlers::chain(database);
    chain.link_before(logger_before); // Should be first!
    chain.link_after(logger_after); // Should be last!

    let address = config.bind_address();
    match Iron::new(chain).http(address.as_str()) {
        Ok(_) => info!("listening on {}", address),
        Err(e) => {
            error!("could not bind {}: {}", address, e);
            process::exit(1);
        }
    }
}
