#[macro_use]
extern crate rocket;

#[macro_use]
extern crate log;

pub mod api;
pub mod config;
pub mod error;
pub mod events;
pub mod ledger;
pub mod logging;
pub mod model;
pub mod store;
pub mod tally;

pub use config::Config;

use rocket::{figment::Figment, Build, Rocket};

use events::UpdateBus;
use logging::LoggerFairing;
use store::SharedStore;

/// Assemble the production server: application config plus the
/// MongoDB-backed vote store.
pub fn build() -> Rocket<Build> {
    rocket::build()
        .mount("/", api::routes())
        .attach(config::ConfigFairing)
        .attach(config::DatabaseFairing)
        .attach(LoggerFairing)
        .manage(UpdateBus::new())
}

/// Assemble a server over an explicit figment and store.
///
/// Used by the test suite; also handy for running the server against the
/// in-memory store without a database.
pub fn custom(figment: Figment, store: SharedStore) -> Rocket<Build> {
    rocket::custom(figment)
        .mount("/", api::routes())
        .attach(config::ConfigFairing)
        .attach(LoggerFairing)
        .manage(store)
        .manage(UpdateBus::new())
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use rocket::http::Cookie;
    use rocket::local::asynchronous::Client;

    use crate::model::{
        auth::{Admin, AuthToken, Voter},
        position::Position,
    };
    use crate::store::{MemoryVoteStore, SharedStore};
    use crate::Config;

    pub fn sample_positions() -> Vec<Position> {
        vec![
            Position::example("President", 1),
            Position::example("Secretary", 2),
        ]
    }

    /// A local client over the in-memory store, plus a handle on the store
    /// for direct assertions.
    pub async fn client_with_store(
        positions: Vec<Position>,
    ) -> (Client, Arc<MemoryVoteStore>) {
        let store = Arc::new(MemoryVoteStore::with_positions(positions));
        let shared: SharedStore = store.clone();
        let figment = rocket::Config::figment()
            .merge(("jwt_secret", "unit-test-secret"))
            .merge(("auth_ttl", 3600));
        let client = Client::tracked(crate::custom(figment, shared))
            .await
            .unwrap();
        (client, store)
    }

    pub fn voter_cookie(client: &Client, id: &str, email: &str) -> Cookie<'static> {
        let config = client.rocket().state::<Config>().unwrap();
        AuthToken::<Voter>::new(id, email).into_cookie(config)
    }

    pub fn admin_cookie(client: &Client, id: &str, email: &str) -> Cookie<'static> {
        let config = client.rocket().state::<Config>().unwrap();
        AuthToken::<Admin>::new(id, email).into_cookie(config)
    }
}
