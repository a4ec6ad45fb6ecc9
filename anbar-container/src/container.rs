//! # The Container — the front door of anbar
//!
//! Owns one [`Catalog`], one [`Registry`], and one [`Factory`], and
//! exposes the builder surface wiring code uses to describe an
//! application: register services, alias classes, refine recipes, and
//! hand out lazy values. Nothing here constructs anything; construction
//! happens when a lazy is forced, typically inside [`Container::get`].
//!
//! # Architecture
//! ```text
//! Catalog ──> Container ──owns──> Registry (id → value | lazy)
//!                   └────owns──> Factory  (class → recipe, aliases)
//! ```
//!
//! # Examples
//! ```rust,ignore
//! let container = Container::new(catalog);
//! container.provide("Logger");
//! container.provide("Database");
//! container.default("Database").args([
//!     Arg::from(container.service("Logger")),
//!     Arg::of(String::from("postgres://localhost/app")),
//! ]);
//!
//! let db = cast::<Database>(&container.get("Database")?)?;
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::catalog::Catalog;
use crate::config::Config;
use crate::error::Result;
use crate::factory::Factory;
use crate::lazy::{Arg, Lazy};
use crate::registry::Registry;
use crate::value::Value;

/// A service container: one catalog, one registry, one factory.
///
/// Containers are independent; two containers share nothing, including
/// aliases and memoized services.
pub struct Container {
    catalog: Arc<Catalog>,
    registry: Arc<Registry>,
    factory: Arc<Factory>,
    env: HashMap<String, String>,
}

impl Container {
    /// Creates a container over `catalog` with no environment overrides.
    pub fn new(catalog: Catalog) -> Self {
        Self::with_env(catalog, HashMap::new())
    }

    /// Creates a container with an environment override map consulted
    /// before process environment variables.
    pub fn with_env(catalog: Catalog, env: HashMap<String, String>) -> Self {
        let catalog = Arc::new(catalog);
        let registry = Arc::new(Registry::new());
        let factory = Factory::new(Arc::clone(&catalog), Arc::clone(&registry));
        debug!(described = catalog.classes().len(), "container created");
        Self { catalog, registry, factory, env }
    }

    /// The catalog of type descriptors.
    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// The service registry.
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// The instantiation engine.
    pub fn factory(&self) -> &Arc<Factory> {
        &self.factory
    }

    /// Looks up a configuration key: the override map first, then the
    /// process environment.
    pub fn env(&self, key: &str) -> Option<String> {
        if let Some(v) = self.env.get(key) {
            return Some(v.clone());
        }
        std::env::var(key).ok()
    }

    // ── declaring services ──

    /// Declares `class` as a service under its own name and returns the
    /// lazy that will build it.
    pub fn provide(&self, class: impl Into<String>) -> Lazy {
        let class = class.into();
        let lazy = Lazy::make(&self.factory, class.clone(), Vec::new());
        self.registry.set(class, lazy.clone());
        lazy
    }

    /// Declares a service under `id` backed by an arbitrary lazy.
    pub fn provide_with(&self, id: impl Into<String>, lazy: Lazy) {
        self.registry.set(id, lazy);
    }

    // ── lazy value constructors ──

    /// A lazy reference to the service under `id`.
    pub fn service(&self, id: impl Into<String>) -> Lazy {
        Lazy::service(&self.registry, id)
    }

    /// A lazy method call on the service under `id`.
    pub fn service_call(
        &self,
        id: impl Into<String>,
        method: impl Into<String>,
        args: Vec<Arg>,
    ) -> Lazy {
        Lazy::bound_call(self.service(id), method, &self.catalog, args)
    }

    /// A lazy invocation of an arbitrary callable.
    pub fn call(
        &self,
        f: impl Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
        args: Vec<Arg>,
    ) -> Lazy {
        Lazy::call(f, args)
    }

    /// A lazy construction of `class`, not registered anywhere.
    pub fn construct(&self, class: impl Into<String>) -> Lazy {
        Lazy::make(&self.factory, class, Vec::new())
    }

    // ── configuration ──

    /// Redirects requests for `from` to `to`.
    pub fn alias(&self, from: impl Into<String>, to: impl Into<String>) {
        self.factory.alias(from, to);
    }

    /// The recipe for `class`, created empty on first request.
    pub fn default(&self, class: impl Into<String>) -> Arc<Config> {
        self.factory.default(class)
    }

    // ── eager access ──

    /// The memoized service under `id`, built on first request.
    pub fn get(&self, id: &str) -> Result<Value> {
        self.registry.get(id)
    }

    /// A fresh instance of `class`, never memoized.
    pub fn make(&self, class: &str, args: Vec<Arg>) -> Result<Value> {
        self.factory.new_instance(class, args, Vec::new())
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("catalog", &self.catalog)
            .field("registry", &self.registry)
            .field("factory", &self.factory)
            .finish()
    }
}

// ═══════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════

pub mod prelude {
    pub use super::Container;
    pub use crate::catalog::{Catalog, DescriptorBuilder, MethodFn, Param, TypeDescriptor};
    pub use crate::config::{Config, MethodCall, Producer};
    pub use crate::error::{AnbarError, Result, UnknownServiceError};
    pub use crate::factory::Factory;
    pub use crate::lazy::{resolve_args, Arg, CallTarget, Lazy, LazyInfo, LazyKind};
    pub use crate::registry::{Entry, Registry};
    pub use crate::value::{cast, receiver, shared, typed, value, CallableFn, Value};
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::TypeDescriptor;
    use crate::value::{cast, receiver, shared, typed, value};
    use parking_lot::RwLock;

    struct Logger {
        level: String,
        lines: RwLock<Vec<String>>,
    }

    struct Database {
        dsn: String,
        logger: Arc<Logger>,
    }

    struct UserRepo {
        db: Arc<Database>,
    }

    fn catalog() -> Catalog {
        Catalog::new()
            .add(
                TypeDescriptor::of::<Logger>("Logger", |args| {
                    Ok(value(Logger {
                        level: typed(args, 0)?,
                        lines: RwLock::new(Vec::new()),
                    }))
                })
                .arg_default("level", String::from("info"))
                .method("log", |recv, args| {
                    let logger = receiver::<Logger>(recv)?;
                    let line: String = typed(args, 0)?;
                    logger.lines.write().push(line);
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

    #[test]
    fn provide_and_get_memoizes() {
        let container = Container::new(catalog());
        container.provide("Logger");

        let a = container.get("Logger").unwrap();
        let b = container.get("Logger").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn full_graph_wires_through_services() {
        let container = Container::new(catalog());
        container.provide("Logger");
        container.provide("Database");
        container.provide("UserRepo");
        container.default("Database").args([
            Arg::from(container.service("Logger")),
            Arg::of(String::from("postgres://localhost/app")),
        ]);

        let repo = cast::<UserRepo>(&container.get("UserRepo").unwrap()).unwrap();
        assert_eq!(repo.db.dsn, "postgres://localhost/app");

        // the repo's database IS the shared service
        let db = cast::<Database>(&container.get("Database").unwrap()).unwrap();
        assert!(Arc::ptr_eq(&repo.db, &db));

        // and the database's logger IS the shared logger
        let logger = cast::<Logger>(&container.get("Logger").unwrap()).unwrap();
        assert!(Arc::ptr_eq(&db.logger, &logger));
        assert_eq!(logger.level, "info");
    }

    #[test]
    fn make_is_never_memoized() {
        let container = Container::new(catalog());
        container.provide("Logger");

        let a = container.make("Logger", Vec::new()).unwrap();
        let b = container.make("Logger", Vec::new()).unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        // the registered service stays untouched
        let svc = container.get("Logger").unwrap();
        assert!(!Arc::ptr_eq(&a, &svc));
    }

    #[test]
    fn provide_with_custom_lazy() {
        let container = Container::new(catalog());
        container.provide_with("answer", container.call(|_| Ok(value(42i32)), Vec::new()));

        let out = container.get("answer").unwrap();
        assert_eq!(*out.downcast_ref::<i32>().unwrap(), 42);
    }

    #[test]
    fn service_call_invokes_on_shared_instance() {
        let container = Container::new(catalog());
        container.provide("Logger");

        let hello = container.service_call(
            "Logger",
            "log",
            vec![Arg::of(String::from("container ready"))],
        );
        hello.force().unwrap();

        let logger = cast::<Logger>(&container.get("Logger").unwrap()).unwrap();
        assert_eq!(*logger.lines.read(), vec!["container ready"]);
    }

    #[test]
    fn alias_through_container() {
        let container = Container::new(catalog());
        container.alias("Log", "Logger");

        let out = container.make("Log", Vec::new()).unwrap();
        assert!(out.downcast_ref::<Logger>().is_some());
    }

    #[test]
    fn construct_returns_unregistered_lazy() {
        let container = Container::new(catalog());
        let lazy = container.construct("Logger");

        assert!(!container.registry().has("Logger"));
        let a = lazy.force().unwrap();
        let b = lazy.force().unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn env_map_wins_over_process() {
        let container = Container::with_env(
            catalog(),
            HashMap::from([(String::from("APP_DSN"), String::from("sqlite::memory:"))]),
        );

        assert_eq!(container.env("APP_DSN").as_deref(), Some("sqlite::memory:"));
        assert_eq!(container.env("ANBAR_TEST_UNSET_KEY"), None);
    }

    #[test]
    fn containers_are_independent() {
        let a = Container::new(catalog());
        let b = Container::new(catalog());
        a.provide("Logger");

        assert!(a.registry().has("Logger"));
        assert!(!b.registry().has("Logger"));
    }
}
