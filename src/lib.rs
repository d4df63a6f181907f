#[macro_use]
extern crate rocket;

#[macro_use]
extern crate log;

#[cfg(test)]
#[macro_use]
extern crate backend_test;

use rocket::{Build, Rocket};

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;

pub use config::Config;

/// Assemble the server: the API routes plus the config, database, and
/// logging fairings.
pub fn build() -> Rocket<Build> {
    rocket::build()
        .mount("/", api::routes())
        .attach(config::ConfigFairing)
        .attach(config::DatabaseFairing)
        .attach(logging::LoggerFairing)
}

/// Connect to the test database configured via `db_uri`.
#[cfg(test)]
pub(crate) async fn db_client() -> mongodb::Client {
    let rocket = rocket::build();
    let db_uri = rocket
        .figment()
        .extract_inner::<String>("db_uri")
        .expect("`db_uri` not set");
    mongodb::Client::with_uri_str(&db_uri)
        .await
        .expect("Failed to connect to the test database")
}

/// A fresh database name for this test.
#[cfg(test)]
pub(crate) fn database() -> String {
    config::get_database_name()
}

/// Build a rocket instance against an existing connection, bypassing the
/// database fairing so every test gets its own throwaway database.
#[cfg(test)]
pub(crate) async fn rocket_for_db(client: mongodb::Client, db_name: &str) -> Rocket<Build> {
    let db = client.database(db_name);
    model::mongodb::ensure_indexes_exist(&db)
        .await
        .expect("Failed to create indexes");
    model::db::election::ensure_election_control_exists(&model::mongodb::Coll::from_db(&db))
        .await
        .expect("Failed to create election control");
    rocket::build()
        .mount("/", api::routes())
        .attach(config::ConfigFairing)
        .attach(logging::LoggerFairing)
        .manage(client)
        .manage(db)
}
