//! The instantiation engine.
//!
//! `new_instance` is where everything meets: the requested class is
//! redirected through the alias table, a recipe is found or derived from
//! the class's descriptor, call-time arguments are merged over declared
//! ones, every lazy among them is forced, the instance is built (by the
//! descriptor's constructor or a custom factory), and the recipe's
//! post-construction calls run in order.
//!
//! # Auto-wiring
//! When a class has no explicit recipe, one is derived from its
//! descriptor's parameter list: a parameter with a declared class becomes
//! an auto-resolving lazy (shared service if one is registered under that
//! name, fresh instance otherwise); a parameter with a default becomes
//! that literal. The first parameter with neither stops derivation; later
//! parameters are left unfilled even if they have defaults. Positional
//! construction admits no holes, so filling anything past the gap would
//! bind arguments to the wrong positions.
//!
//! # Aliases
//! One redirect, never iterated. `alias` overwrites the `from` slot, so
//! the last alias for a name wins, and mutually-aliased names simply swap
//! which class each builds; no chain or cycle can form.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::catalog::Catalog;
use crate::config::{Config, MethodCall, Producer};
use crate::error::{AnbarError, Result};
use crate::lazy::{resolve_args, Arg, Lazy};
use crate::registry::Registry;
use crate::value::{CallableFn, Value};

/// Builds instances from per-class recipes and descriptors.
pub struct Factory {
    catalog: Arc<Catalog>,
    registry: Arc<Registry>,
    defaults: RwLock<HashMap<String, Arc<Config>>>,
    aliases: RwLock<HashMap<String, String>>,
    // handle to ourselves for the auto lazies embedded in derived recipes
    weak: Weak<Factory>,
}

impl Factory {
    /// Creates a factory over a catalog and the registry its auto-wired
    /// dependencies consult.
    ///
    /// Handed out behind `Arc`: recipes derived by auto-wiring embed weak
    /// back-references to the factory that derived them.
    pub fn new(catalog: Arc<Catalog>, registry: Arc<Registry>) -> Arc<Self> {
        Arc::new_cyclic(|weak| Self {
            catalog,
            registry,
            defaults: RwLock::new(HashMap::new()),
            aliases: RwLock::new(HashMap::new()),
            weak: weak.clone(),
        })
    }

    /// The recipe for `class`, created empty on first request.
    ///
    /// The returned handle is shared with the factory; refining it
    /// changes how `class` will be built.
    pub fn default(&self, class: impl Into<String>) -> Arc<Config> {
        let class = class.into();
        if let Some(config) = self.defaults.read().get(&class) {
            return Arc::clone(config);
        }
        Arc::clone(
            self.defaults
                .write()
                .entry(class)
                .or_insert_with(|| Arc::new(Config::new())),
        )
    }

    /// Redirects `from` to `to`. Last alias for `from` wins.
    pub fn alias(&self, from: impl Into<String>, to: impl Into<String>) {
        let (from, to) = (from.into(), to.into());
        debug!(from = %from, to = %to, "alias registered");
        self.aliases.write().insert(from, to);
    }

    /// Builds an instance of `class`.
    ///
    /// `args` override the recipe's declared arguments positionally;
    /// `calls` run after the recipe's own declared calls.
    pub fn new_instance(
        &self,
        class: &str,
        args: Vec<Arg>,
        calls: Vec<MethodCall>,
    ) -> Result<Value> {
        let class = self.resolve_alias(class);

        // an explicit recipe spares us deriving the implicit one
        if !self.defaults.read().contains_key(&class) {
            let derived = self.auto_default(&class)?;
            self.defaults
                .write()
                .entry(class.clone())
                .or_insert_with(|| Arc::new(derived));
        }

        let config = self.default(class.as_str());
        let instance = self.instantiate(&config, &class, args)?;

        let mut all_calls = config.get_calls();
        all_calls.extend(calls);
        for call in &all_calls {
            let argv = resolve_args(&call.args)?;
            trace!(class = %class, method = %call.method, "post-construction call");
            self.catalog.invoke(&instance, &call.method, &argv)?;
        }

        Ok(instance)
    }

    fn resolve_alias(&self, class: &str) -> String {
        match self.aliases.read().get(class) {
            Some(to) => {
                trace!(from = %class, to = %to, "following alias");
                to.clone()
            }
            None => class.to_owned(),
        }
    }

    fn instantiate(&self, config: &Config, class: &str, args: Vec<Arg>) -> Result<Value> {
        let Some(producer) = config.get_factory() else {
            // plain construction: call-time args win at matching
            // positions, declared args fill the rest
            let merged = merge_args(config.get_args(), args);
            let argv = resolve_args(&merged)?;
            let descriptor = self.catalog.lookup(class)?;
            debug!(class = %class, args = argv.len(), "constructing");
            return descriptor
                .construct(&argv)
                .map_err(|source| AnbarError::ConstructionFailed {
                    class: class.to_owned(),
                    source: Box::new(source),
                });
        };

        // a custom factory replaces plain construction entirely; the
        // recipe's declared args are not consulted
        let callable: CallableFn = match producer {
            Producer::Callable(f) => f,
            Producer::Lazy(lazy) => {
                let forced = lazy.force()?;
                forced
                    .downcast_ref::<CallableFn>()
                    .cloned()
                    .ok_or_else(|| AnbarError::NotCallable { class: class.to_owned() })?
            }
            Producer::BoundMethod { target, method } => {
                let receiver = target.force()?;
                let catalog = Arc::clone(&self.catalog);
                Arc::new(move |argv: &[Value]| catalog.invoke(&receiver, &method, argv))
            }
        };

        let argv = resolve_args(&args)?;
        debug!(class = %class, args = argv.len(), "constructing via custom factory");
        callable(&argv).map_err(|source| AnbarError::ConstructionFailed {
            class: class.to_owned(),
            source: Box::new(source),
        })
    }

    /// Derives the implicit recipe for `class` from its descriptor.
    fn auto_default(&self, class: &str) -> Result<Config> {
        let descriptor = self.catalog.lookup(class)?;
        let config = Config::new();

        let mut args = Vec::new();
        for param in descriptor.params() {
            if let Some(dep) = param.class() {
                args.push(Arg::Lazy(Lazy::Auto {
                    registry: Arc::downgrade(&self.registry),
                    factory: self.weak.clone(),
                    class: dep.to_owned(),
                }));
            } else if let Some(default) = param.default() {
                args.push(Arg::Value(Value::clone(default)));
            } else {
                trace!(
                    class = %class,
                    param = %param.name(),
                    "untyped parameter without default halts auto-wiring"
                );
                break;
            }
        }

        config.args(args);
        Ok(config)
    }
}

impl std::fmt::Debug for Factory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Factory")
            .field("defaults", &self.defaults.read().len())
            .field("aliases", &self.aliases.read().len())
            .finish()
    }
}

fn merge_args(declared: Vec<Arg>, overrides: Vec<Arg>) -> Vec<Arg> {
    let mut merged = declared;
    for (index, arg) in overrides.into_iter().enumerate() {
        if index < merged.len() {
            merged[index] = arg;
        } else {
            merged.push(arg);
        }
    }
    merged
}
