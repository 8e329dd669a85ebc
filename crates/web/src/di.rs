//! Dependency injection container.
//!
//! Types describe how they are built by implementing [`Injectable`], pulling each dependency
//! out of the [`Resolver`] they are handed. The [`Container`] maps a key type to one of two
//! bindings:
//!
//! - direct: the key type itself is built
//! - swapped: a concrete type is built and exposed under the key, usually a trait object
//!
//! A cached dependency is built once per container and shared afterwards, others are built on
//! every resolution. Dependency cycles are detected and reported instead of recursing forever.
//!
//! ```
//! use micro_dispatch::di::{Container, Injectable, Resolver};
//! use micro_dispatch::DependencyError;
//! use std::sync::Arc;
//!
//! struct Repository;
//!
//! impl Injectable for Repository {
//!     fn inject(_resolver: &mut Resolver<'_>) -> Result<Self, DependencyError> {
//!         Ok(Repository)
//!     }
//! }
//!
//! struct Service {
//!     repository: Arc<Repository>,
//! }
//!
//! impl Injectable for Service {
//!     fn inject(resolver: &mut Resolver<'_>) -> Result<Self, DependencyError> {
//!         Ok(Service { repository: resolver.resolve()? })
//!     }
//! }
//!
//! let mut container = Container::new();
//! container.register::<Repository>(true).register::<Service>(false);
//!
//! let service = container.resolve::<Service>().unwrap();
//! assert!(Arc::ptr_eq(&service.repository, &container.resolve::<Repository>().unwrap()));
//! ```

use crate::error::DependencyError;
use once_cell::sync::OnceCell;
use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// A type the container knows how to build.
pub trait Injectable: Sized + Send + Sync + 'static {
    fn inject(resolver: &mut Resolver<'_>) -> Result<Self, DependencyError>;
}

/// Always an `Arc<T>` behind the `Any`, so unsized keys like `dyn Trait` fit too.
type Instance = Arc<dyn Any + Send + Sync>;

type Constructor = Box<dyn Fn(&mut Resolver<'_>) -> Result<Instance, DependencyError> + Send + Sync>;

fn constructor<F>(f: F) -> Constructor
where
    F: Fn(&mut Resolver<'_>) -> Result<Instance, DependencyError> + Send + Sync + 'static,
{
    Box::new(f)
}

fn construct_direct<T: Injectable>(resolver: &mut Resolver<'_>) -> Result<Instance, DependencyError> {
    let instance: Instance = Arc::new(Arc::new(T::inject(resolver)?));
    Ok(instance)
}

enum Binding {
    Direct(Constructor),
    Swapped { concrete: &'static str, construct: Constructor },
}

struct Dependency {
    name: &'static str,
    binding: Binding,
    cached: bool,
    cached_value: OnceCell<Instance>,
}

impl Dependency {
    fn new(name: &'static str, binding: Binding, cached: bool) -> Self {
        Self { name, binding, cached, cached_value: OnceCell::new() }
    }

    fn construct(&self, resolver: &mut Resolver<'_>) -> Result<Instance, DependencyError> {
        match &self.binding {
            Binding::Direct(construct) => construct(resolver),
            Binding::Swapped { concrete, construct } => {
                debug!(key = self.name, concrete, "building swapped implementation");
                construct(resolver)
            }
        }
    }
}

#[derive(Default)]
pub struct Container {
    dependencies: HashMap<TypeId, Dependency>,
}

impl Container {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `T` built by [`Injectable::inject`], replacing any previous registration.
    pub fn register<T: Injectable>(&mut self, cached: bool) -> &mut Self {
        self.insert::<T>(Binding::Direct(constructor(construct_direct::<T>)), cached)
    }

    /// Registers `T` built by a closure, for types that can't implement [`Injectable`].
    pub fn register_factory<T, F>(&mut self, cached: bool, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&mut Resolver<'_>) -> Result<T, DependencyError> + Send + Sync + 'static,
    {
        let construct = constructor(move |resolver| {
            let instance: Instance = Arc::new(Arc::new(factory(resolver)?));
            Ok(instance)
        });
        self.insert::<T>(Binding::Direct(construct), cached)
    }

    /// Registers `N` so that resolving it builds a `C` instead.
    ///
    /// `upcast` turns the concrete instance into the key type, typically an unsizing coercion
    /// such as `|c| c as Arc<dyn Repository>`.
    pub fn register_swappable<N, C, U>(&mut self, cached: bool, upcast: U) -> &mut Self
    where
        N: ?Sized + Send + Sync + 'static,
        C: Injectable,
        U: Fn(Arc<C>) -> Arc<N> + Send + Sync + 'static,
    {
        let construct = constructor(move |resolver| {
            let instance: Instance = Arc::new(upcast(Arc::new(C::inject(resolver)?)));
            Ok(instance)
        });
        self.insert::<N>(Binding::Swapped { concrete: type_name::<C>(), construct }, cached)
    }

    pub fn is_registered<T: ?Sized + 'static>(&self) -> bool {
        self.dependencies.contains_key(&TypeId::of::<T>())
    }

    pub fn resolve<T: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<T>, DependencyError> {
        Resolver::new(self).resolve::<T>()
    }

    /// Builds every cached dependency on the calling thread, returning how many are cached.
    ///
    /// A thread resolving a cached dependency blocks while another thread is building it. Two
    /// threads first resolving cached types that depend on each other would wait on each other
    /// instead of reporting [`DependencyError::Cyclic`], so cached slots should be filled here
    /// before concurrent resolution starts.
    pub fn warm_up(&self) -> Result<usize, DependencyError> {
        let mut warmed = 0;
        for (key, dependency) in &self.dependencies {
            if dependency.cached {
                Resolver::new(self).resolve_instance(*key, dependency.name)?;
                warmed += 1;
            }
        }
        debug!(warmed, "dependency caches filled");
        Ok(warmed)
    }

    fn insert<T: ?Sized + 'static>(&mut self, binding: Binding, cached: bool) -> &mut Self {
        let name = type_name::<T>();
        debug!(name, cached, "dependency registered");
        self.dependencies.insert(TypeId::of::<T>(), Dependency::new(name, binding, cached));
        self
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.dependencies.values().map(|dependency| dependency.name)).finish()
    }
}

/// One resolution in progress, tracking the chain of types being built.
#[derive(Debug)]
pub struct Resolver<'c> {
    container: &'c Container,
    stack: Vec<(TypeId, &'static str)>,
}

impl<'c> Resolver<'c> {
    fn new(container: &'c Container) -> Self {
        Self { container, stack: Vec::new() }
    }

    /// Resolves a required dependency.
    ///
    /// A cached dependency being built by another thread is waited for, see
    /// [`Container::warm_up`].
    pub fn resolve<T: ?Sized + Send + Sync + 'static>(&mut self) -> Result<Arc<T>, DependencyError> {
        let instance = self.resolve_instance(TypeId::of::<T>(), type_name::<T>())?;
        downcast::<T>(&instance, type_name::<T>())
    }

    fn resolve_instance(&mut self, key: TypeId, requested: &'static str) -> Result<Instance, DependencyError> {
        let container = self.container;
        let dependency = container.dependencies.get(&key).ok_or(DependencyError::Undefined(requested))?;

        if let Some(instance) = dependency.cached_value.get() {
            return Ok(Arc::clone(instance));
        }

        if let Some(position) = self.stack.iter().position(|(id, _)| *id == key) {
            let cycle = self.stack[position..]
                .iter()
                .map(|(_, name)| *name)
                .chain(std::iter::once(dependency.name))
                .collect::<Vec<_>>()
                .join(" -> ");
            return Err(DependencyError::Cyclic(cycle));
        }

        self.stack.push((key, dependency.name));
        let instance = if dependency.cached {
            dependency
                .cached_value
                .get_or_try_init(|| {
                    trace!(name = dependency.name, "caching dependency");
                    dependency.construct(self)
                })
                .cloned()
        } else {
            dependency.construct(self)
        };
        self.stack.pop();

        instance
    }

    /// Resolves `T` if it is registered, otherwise calls `default`.
    pub fn resolve_or_else<T, F>(&mut self, default: F) -> Result<Arc<T>, DependencyError>
    where
        T: ?Sized + Send + Sync + 'static,
        F: FnOnce() -> Arc<T>,
    {
        if self.container.is_registered::<T>() { self.resolve::<T>() } else { Ok(default()) }
    }
}

fn downcast<T: ?Sized + Send + Sync + 'static>(instance: &Instance, name: &'static str) -> Result<Arc<T>, DependencyError> {
    instance.downcast_ref::<Arc<T>>().cloned().ok_or(DependencyError::Mismatch(name))
}
