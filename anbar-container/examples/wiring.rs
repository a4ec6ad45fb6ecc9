//! Wiring an application graph with the anbar container.

use std::collections::HashMap;
use std::sync::Arc;

use anbar_container::catalog::{Catalog, TypeDescriptor};
use anbar_container::container::Container;
use anbar_container::error::Result;
use anbar_container::lazy::Arg;
use anbar_container::value::{cast, receiver, shared, typed, value};

// === Define your types ===

struct Logger {
    level: String,
}

impl Logger {
    fn log(&self, msg: &str) {
        println!("[{}] {msg}", self.level);
    }
}

struct Database {
    dsn: String,
    logger: Arc<Logger>,
}

impl Database {
    fn query(&self, sql: &str) -> String {
        self.logger.log(&format!("executing: {sql}"));
        format!("rows from {}", self.dsn)
    }
}

struct UserRepo {
    db: Arc<Database>,
}

impl UserRepo {
    fn find_user(&self, id: u64) -> String {
        self.db.query(&format!("SELECT * FROM users WHERE id = {id}"))
    }
}

// === Describe them once ===

fn catalog() -> Catalog {
    Catalog::new()
        .add(
            TypeDescriptor::of::<Logger>("Logger", |args| {
                Ok(value(Logger { level: typed(args, 0)? }))
            })
            .arg_default("level", String::from("info"))
            .method("log", |recv, args| {
                receiver::<Logger>(recv)?.log(&typed::<String>(args, 0)?);
                Ok(value(()))
            })
            .build(),
        )
        .add(
            TypeDescriptor::of::<Database>("Database", |args| {
                Ok(value(Database {
                    logger: shared(args, 0)?,
                    dsn: typed(args, 1)?,
                }))
            })
            .arg_class("logger", "Logger")
            .arg("dsn")
            .build(),
        )
        .add(
            TypeDescriptor::of::<UserRepo>("UserRepo", |args| {
                Ok(value(UserRepo { db: shared(args, 0)? }))
            })
            .arg_class("db", "Database")
            .build(),
        )
}

fn main() -> Result<()> {
    // Initialize tracing (logging)
    tracing_subscriber::fmt()
        .with_env_filter("anbar=debug")
        .init();

    let container = Container::with_env(
        catalog(),
        HashMap::from([(
            String::from("APP_DSN"),
            String::from("postgres://localhost/app"),
        )]),
    );

    // Declare the shared services. Nothing is constructed yet.
    container.provide("Logger");
    container.provide("Database");
    container.provide("UserRepo");

    // Database has an untyped `dsn` parameter, so its recipe is explicit:
    // the shared Logger plus a value from the environment.
    let dsn = container
        .env("APP_DSN")
        .unwrap_or_else(|| String::from("sqlite::memory:"));
    container.default("Database").args([
        Arg::from(container.service("Logger")),
        Arg::of(dsn),
    ]);

    // First request builds the whole chain: UserRepo -> Database -> Logger.
    let repo = cast::<UserRepo>(&container.get("UserRepo")?)?;
    println!("{}", repo.find_user(42));

    // The same shared instances back the whole container.
    let db = cast::<Database>(&container.get("Database")?)?;
    assert!(Arc::ptr_eq(&repo.db, &db));

    // A bound method call as a lazy value.
    let ready = container.service_call(
        "Logger",
        "log",
        vec![Arg::of(String::from("container ready"))],
    );
    ready.force()?;

    Ok(())
}
