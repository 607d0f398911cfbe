//! 作用域声明器

use crate::binding::{
    constructor, downcast, erase, keyed_constructor, scoped_constructor, AliasBinding, Binding,
    Constructor, Instance, NameConstructor, PerThreadCache, Slot, Strategy, TypeConstructor,
    Upcast,
};
use crate::scope::Scope;
use dashmap::DashMap;
use di_abstractions::{Module, Registrar};
use di_common::{QualifierValue, TypeInfo, TypeKey};
use std::sync::Arc;
use tracing::info;

/// 向作用域注册绑定的声明器
pub struct ScopeRegistrar<'s> {
    scope: &'s Scope,
}

impl<'s> ScopeRegistrar<'s> {
    pub(crate) fn new(scope: &'s Scope) -> Self {
        Self { scope }
    }

    fn bind(&mut self, key: TypeKey, strategy: Strategy) -> &mut Self {
        self.scope.registry().insert(Binding::new(key, strategy));
        self
    }

    fn alias(&mut self, alias: AliasBinding) -> &mut Self {
        self.scope.registry().insert(alias);
        self
    }
}

impl Registrar for ScopeRegistrar<'_> {
    type Scope = Scope;

    fn add_factory<T, F>(&mut self, ctor: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.try_add_factory(move || Ok(ctor()))
    }

    fn try_add_factory<T, F>(&mut self, ctor: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn() -> anyhow::Result<T> + Send + Sync + 'static,
    {
        self.bind(TypeKey::of::<T>(), Strategy::Factory(constructor(ctor)))
    }

    fn add_singleton_arc<T>(&mut self, value: Arc<T>) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let instance = erase(value);
        let cached = Arc::clone(&instance);
        let ctor: Constructor = Arc::new(move || -> anyhow::Result<Instance> {
            Ok(Arc::clone(&cached))
        });
        self.bind(
            TypeKey::of::<T>(),
            Strategy::Singleton {
                ctor,
                slot: Slot::built(instance),
            },
        )
    }

    fn add_singleton_factory<T, F>(&mut self, ctor: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.try_add_singleton_factory(move || Ok(ctor()))
    }

    fn try_add_singleton_factory<T, F>(&mut self, ctor: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn() -> anyhow::Result<T> + Send + Sync + 'static,
    {
        self.bind(
            TypeKey::of::<T>(),
            Strategy::Singleton {
                ctor: constructor(ctor),
                slot: Slot::new(),
            },
        )
    }

    fn add_scoped_factory<T, F>(&mut self, ctor: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&Scope) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        self.bind(
            TypeKey::of::<T>(),
            Strategy::ScopedFactory(scoped_constructor(ctor)),
        )
    }

    fn add_scoped_singleton_factory<T, F>(&mut self, ctor: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&Scope) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        self.bind(
            TypeKey::of::<T>(),
            Strategy::ScopedSingleton {
                ctor: scoped_constructor(ctor),
                slot: Slot::new(),
            },
        )
    }

    fn add_per_thread_factory<T, F>(&mut self, ctor: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.bind(
            TypeKey::of::<T>(),
            Strategy::PerThread {
                ctor: constructor(move || Ok(ctor())),
                cache: PerThreadCache::new(),
            },
        )
    }

    fn add_per_key_factory<T, K, F>(&mut self, ctor: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        K: QualifierValue,
        F: Fn(&K) -> T + Send + Sync + 'static,
    {
        self.bind(
            TypeKey::of::<T>(),
            Strategy::PerKey {
                ctor: keyed_constructor(ctor),
                expected: TypeInfo::of::<K>(),
                slots: DashMap::new(),
            },
        )
    }

    fn add_alias<A, T, C>(&mut self, upcast: C) -> &mut Self
    where
        A: ?Sized + Send + Sync + 'static,
        T: ?Sized + Send + Sync + 'static,
        C: Fn(Arc<T>) -> Arc<A> + Send + Sync + 'static,
    {
        let convert: Upcast = Arc::new(move |instance: &Instance| -> Option<Instance> {
            downcast::<T>(instance).map(|target| erase(upcast(target)))
        });
        self.alias(AliasBinding::new(
            TypeKey::of::<A>(),
            TypeKey::of::<T>(),
            convert,
        ))
    }

    fn add_key_alias(&mut self, from: TypeKey, to: TypeKey) -> &mut Self {
        let identity: Upcast = Arc::new(|instance: &Instance| -> Option<Instance> {
            Some(Arc::clone(instance))
        });
        self.alias(AliasBinding::new(from, to, identity))
    }

    fn add_logger_factory<L, N, C>(&mut self, by_name: N, by_type: C) -> &mut Self
    where
        L: Send + Sync + 'static,
        N: Fn(&str) -> L + Send + Sync + 'static,
        C: Fn(&TypeInfo) -> L + Send + Sync + 'static,
    {
        let by_name: NameConstructor =
            Arc::new(move |name: &str| -> Instance { erase(Arc::new(by_name(name))) });
        let by_type: TypeConstructor = Arc::new(move |type_info: &TypeInfo| -> Instance {
            erase(Arc::new(by_type(type_info)))
        });
        self.bind(TypeKey::of::<L>(), Strategy::Logger { by_name, by_type })
    }

    fn import_module<M: Module>(&mut self, module: &M) -> &mut Self {
        info!("导入模块: {} -> 作用域 {}", module.name(), self.scope.name());
        module.register(self);
        self
    }
}
