//! 绑定与实例缓存
//!
//! 一个绑定 = 一种构造策略 + 该策略对应的缓存状态。

use crate::scope::Scope;
use dashmap::DashMap;
use di_common::{
    BindingKind, BuildPhase, DependencyError, DependencyResult, LoggerKey, Qualifier,
    QualifierValue, TypeInfo, TypeKey,
};
use once_cell::sync::Lazy;
use parking_lot::{Condvar, Mutex};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, ThreadId};
use tracing::debug;

/// 类型擦除后的实例，内部保存的是 `Arc<T>`
pub(crate) type Instance = Arc<dyn Any + Send + Sync>;
pub(crate) type Constructor = Arc<dyn Fn() -> anyhow::Result<Instance> + Send + Sync>;
pub(crate) type ScopedConstructor = Arc<dyn Fn(&Scope) -> anyhow::Result<Instance> + Send + Sync>;
pub(crate) type KeyedConstructor = Arc<dyn Fn(&Qualifier) -> Option<Instance> + Send + Sync>;
pub(crate) type NameConstructor = Arc<dyn Fn(&str) -> Instance + Send + Sync>;
pub(crate) type TypeConstructor = Arc<dyn Fn(&TypeInfo) -> Instance + Send + Sync>;
pub(crate) type Upcast = Arc<dyn Fn(&Instance) -> Option<Instance> + Send + Sync>;

static NEXT_BINDING_ID: AtomicU64 = AtomicU64::new(1);

/// 等待关系：正在等待的线程 -> 它等待的槽的构建线程
static WAITS_FOR: Lazy<Mutex<HashMap<ThreadId, ThreadId>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

fn next_binding_id() -> u64 {
    NEXT_BINDING_ID.fetch_add(1, Ordering::Relaxed)
}

/// 沿等待关系从 `owner` 出发，是否会回到 `current`
fn waits_on(owner: ThreadId, current: ThreadId, waits: &HashMap<ThreadId, ThreadId>) -> bool {
    std::iter::successors(Some(owner), |thread| waits.get(thread).copied())
        .take(waits.len() + 1)
        .any(|thread| thread == current)
}

/// 擦除实例类型
pub(crate) fn erase<T>(value: Arc<T>) -> Instance
where
    T: ?Sized + Send + Sync + 'static,
{
    Arc::new(value)
}

/// 还原实例类型
pub(crate) fn downcast<T>(instance: &Instance) -> Option<Arc<T>>
where
    T: ?Sized + Send + Sync + 'static,
{
    instance.downcast_ref::<Arc<T>>().cloned()
}

pub(crate) fn constructor<T, F>(ctor: F) -> Constructor
where
    T: Send + Sync + 'static,
    F: Fn() -> anyhow::Result<T> + Send + Sync + 'static,
{
    Arc::new(move || ctor().map(|value| erase(Arc::new(value))))
}

pub(crate) fn scoped_constructor<T, F>(ctor: F) -> ScopedConstructor
where
    T: Send + Sync + 'static,
    F: Fn(&Scope) -> anyhow::Result<T> + Send + Sync + 'static,
{
    Arc::new(move |scope: &Scope| ctor(scope).map(|value| erase(Arc::new(value))))
}

pub(crate) fn keyed_constructor<T, K, F>(ctor: F) -> KeyedConstructor
where
    T: Send + Sync + 'static,
    K: QualifierValue,
    F: Fn(&K) -> T + Send + Sync + 'static,
{
    Arc::new(move |qualifier: &Qualifier| {
        qualifier
            .downcast_ref::<K>()
            .map(|key| erase(Arc::new(ctor(key))))
    })
}

/// 把构造函数返回的错误映射为解析错误
///
/// 嵌套的结构性错误原样传播，其余错误附加当前绑定键。
fn constructor_failed(key: &TypeKey, err: anyhow::Error) -> DependencyError {
    match err.downcast::<DependencyError>() {
        Ok(inner) if inner.is_structural() => inner,
        Ok(inner) => DependencyError::ConstructorFailed {
            key: key.clone(),
            source: Box::new(inner),
        },
        Err(err) => DependencyError::ConstructorFailed {
            key: key.clone(),
            source: err.into(),
        },
    }
}

enum SlotState {
    Unbuilt,
    Building(ThreadId),
    Built(Instance),
}

/// 单实例缓存槽
///
/// 首次访问的线程负责构建，其他线程等待构建完成；同一线程在构建过程中
/// 再次访问同一个槽视为循环依赖。跨线程的相互等待同样视为循环依赖，
/// 由进程级的等待关系表检测。
pub(crate) struct Slot {
    state: Mutex<SlotState>,
    ready: Condvar,
}

impl Slot {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(SlotState::Unbuilt),
            ready: Condvar::new(),
        }
    }

    pub(crate) fn built(instance: Instance) -> Self {
        Self {
            state: Mutex::new(SlotState::Built(instance)),
            ready: Condvar::new(),
        }
    }

    pub(crate) fn phase(&self) -> BuildPhase {
        match &*self.state.lock() {
            SlotState::Unbuilt => BuildPhase::Unbuilt,
            SlotState::Building(_) => BuildPhase::Building,
            SlotState::Built(_) => BuildPhase::Built,
        }
    }

    pub(crate) fn get_or_build<F>(&self, key: &TypeKey, build: F) -> DependencyResult<Instance>
    where
        F: FnOnce() -> DependencyResult<Instance>,
    {
        let current = thread::current().id();
        {
            let mut state = self.state.lock();
            loop {
                let owner = match &*state {
                    SlotState::Built(instance) => return Ok(Arc::clone(instance)),
                    SlotState::Building(owner) => *owner,
                    SlotState::Unbuilt => break,
                };
                if owner == current {
                    return Err(DependencyError::CircularDependency {
                        dependency_chain: format!("{key} -> {key}"),
                    });
                }
                {
                    let mut waits = WAITS_FOR.lock();
                    if waits_on(owner, current, &waits) {
                        return Err(DependencyError::CircularDependency {
                            dependency_chain: format!(
                                "{key} -> {key} (线程 {current:?} 与 {owner:?} 相互等待)"
                            ),
                        });
                    }
                    waits.insert(current, owner);
                }
                self.ready.wait(&mut state);
                WAITS_FOR.lock().remove(&current);
            }
            *state = SlotState::Building(current);
        }

        let mut guard = BuildingGuard {
            slot: self,
            armed: true,
        };
        let result = build();
        {
            let mut state = self.state.lock();
            *state = match &result {
                Ok(instance) => SlotState::Built(Arc::clone(instance)),
                Err(_) => SlotState::Unbuilt,
            };
            guard.armed = false;
        }
        self.ready.notify_all();
        result
    }
}

/// 构造函数 panic 时把槽恢复为未构建，唤醒等待者
struct BuildingGuard<'a> {
    slot: &'a Slot,
    armed: bool,
}

impl Drop for BuildingGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            *self.slot.state.lock() = SlotState::Unbuilt;
            self.slot.ready.notify_all();
        }
    }
}

/// 线程级实例缓存，随绑定一起释放
pub(crate) struct PerThreadCache {
    instances: DashMap<ThreadId, Instance>,
}

impl PerThreadCache {
    pub(crate) fn new() -> Self {
        Self {
            instances: DashMap::new(),
        }
    }

    fn get_or_build<F>(&self, build: F) -> DependencyResult<Instance>
    where
        F: FnOnce() -> DependencyResult<Instance>,
    {
        let current = thread::current().id();
        if let Some(instance) = self.instances.get(&current) {
            return Ok(Arc::clone(instance.value()));
        }

        // 构建期间不持有分片锁，构造函数可以继续解析其他绑定
        let instance = build()?;
        Ok(Arc::clone(
            self.instances.entry(current).or_insert(instance).value(),
        ))
    }
}

pub(crate) enum Strategy {
    Factory(Constructor),
    Singleton {
        ctor: Constructor,
        slot: Slot,
    },
    PerThread {
        ctor: Constructor,
        cache: PerThreadCache,
    },
    PerKey {
        ctor: KeyedConstructor,
        expected: TypeInfo,
        slots: DashMap<Qualifier, Arc<Slot>>,
    },
    ScopedFactory(ScopedConstructor),
    ScopedSingleton {
        ctor: ScopedConstructor,
        slot: Slot,
    },
    Logger {
        by_name: NameConstructor,
        by_type: TypeConstructor,
    },
}

/// 构造实例的绑定
pub struct Binding {
    id: u64,
    key: TypeKey,
    strategy: Strategy,
}

impl Binding {
    pub(crate) fn new(key: TypeKey, strategy: Strategy) -> Self {
        Self {
            id: next_binding_id(),
            key,
            strategy,
        }
    }

    /// 全局唯一的绑定ID
    pub fn id(&self) -> u64 {
        self.id
    }

    /// 注册时使用的绑定键
    pub fn key(&self) -> &TypeKey {
        &self.key
    }

    /// 生命周期类型
    pub fn kind(&self) -> BindingKind {
        match &self.strategy {
            Strategy::Factory(_) => BindingKind::Factory,
            Strategy::Singleton { .. } => BindingKind::Singleton,
            Strategy::PerThread { .. } => BindingKind::PerThread,
            Strategy::PerKey { .. } => BindingKind::PerKey,
            Strategy::ScopedFactory(_) => BindingKind::ScopedFactory,
            Strategy::ScopedSingleton { .. } => BindingKind::ScopedSingleton,
            Strategy::Logger { .. } => BindingKind::Logger,
        }
    }

    /// 单例类绑定的构建阶段，其他类型返回 `None`
    pub fn phase(&self) -> Option<BuildPhase> {
        match &self.strategy {
            Strategy::Singleton { slot, .. } | Strategy::ScopedSingleton { slot, .. } => {
                Some(slot.phase())
            }
            _ => None,
        }
    }

    /// 按生命周期获取或构建实例
    ///
    /// `key` 是实际请求的绑定键，按键工厂和日志工厂从中读取限定符。
    pub(crate) fn instantiate(&self, scope: &Scope, key: &TypeKey) -> DependencyResult<Instance> {
        match &self.strategy {
            Strategy::Factory(ctor) => self.construct(scope, key, || ctor()),
            Strategy::Singleton { ctor, slot } => {
                slot.get_or_build(key, || self.construct(scope, key, || ctor()))
            }
            Strategy::PerThread { ctor, cache } => {
                cache.get_or_build(|| self.construct(scope, key, || ctor()))
            }
            Strategy::PerKey {
                ctor,
                expected,
                slots,
            } => {
                let qualifier = key
                    .qualifier()
                    .ok_or_else(|| DependencyError::MissingQualifier { key: key.clone() })?;
                let mismatch = || DependencyError::QualifierMismatch {
                    key: key.clone(),
                    expected: expected.name(),
                };
                if qualifier.value_type() != *expected {
                    return Err(mismatch());
                }
                let slot = Arc::clone(
                    &slots
                        .entry(qualifier.clone())
                        .or_insert_with(|| Arc::new(Slot::new())),
                );
                slot.get_or_build(key, || {
                    scope.record_construction();
                    debug!("构建按键实例: {}", key);
                    ctor(qualifier).ok_or_else(mismatch)
                })
            }
            Strategy::ScopedFactory(ctor) => self.construct(scope, key, || ctor(scope)),
            Strategy::ScopedSingleton { ctor, slot } => {
                slot.get_or_build(key, || self.construct(scope, key, || ctor(scope)))
            }
            Strategy::Logger { by_name, by_type } => {
                let qualifier = key
                    .qualifier()
                    .ok_or_else(|| DependencyError::MissingQualifier { key: key.clone() })?;
                scope.record_construction();
                Ok(match LoggerKey::from_qualifier(qualifier) {
                    LoggerKey::ByName(name) => by_name(name.as_str()),
                    LoggerKey::ByType(type_info) => by_type(&type_info),
                })
            }
        }
    }

    fn construct<F>(&self, scope: &Scope, key: &TypeKey, ctor: F) -> DependencyResult<Instance>
    where
        F: FnOnce() -> anyhow::Result<Instance>,
    {
        scope.record_construction();
        debug!("构建实例: {} ({})", key, self.kind());
        ctor().map_err(|err| constructor_failed(key, err))
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("id", &self.id)
            .field("key", &self.key)
            .field("kind", &self.kind())
            .field("constructor", &"<function>")
            .finish()
    }
}

/// 别名绑定：把请求转发到目标绑定键
pub struct AliasBinding {
    id: u64,
    key: TypeKey,
    target: TypeKey,
    upcast: Upcast,
}

impl AliasBinding {
    pub(crate) fn new(key: TypeKey, target: TypeKey, upcast: Upcast) -> Self {
        Self {
            id: next_binding_id(),
            key,
            target,
            upcast,
        }
    }

    /// 别名自身的绑定键
    pub fn key(&self) -> &TypeKey {
        &self.key
    }

    /// 目标绑定键
    pub fn target(&self) -> &TypeKey {
        &self.target
    }

    /// 把目标实例转换为别名类型
    pub(crate) fn upcast(&self, instance: &Instance) -> DependencyResult<Instance> {
        (self.upcast)(instance).ok_or_else(|| DependencyError::TypeMismatch {
            key: self.key.clone(),
            expected: self.target.type_info().name(),
        })
    }
}

impl fmt::Debug for AliasBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AliasBinding")
            .field("id", &self.id)
            .field("key", &self.key)
            .field("target", &self.target)
            .finish()
    }
}

/// 注册表中的一项：构造实例的绑定或别名
#[derive(Debug, Clone)]
pub enum Registration {
    /// 构造实例的绑定
    Binding(Arc<Binding>),
    /// 别名
    Alias(Arc<AliasBinding>),
}

impl Registration {
    /// 全局唯一的绑定ID
    pub fn id(&self) -> u64 {
        match self {
            Self::Binding(binding) => binding.id,
            Self::Alias(alias) => alias.id,
        }
    }

    /// 注册时使用的绑定键
    pub fn key(&self) -> &TypeKey {
        match self {
            Self::Binding(binding) => binding.key(),
            Self::Alias(alias) => alias.key(),
        }
    }

    /// 生命周期类型
    pub fn kind(&self) -> BindingKind {
        match self {
            Self::Binding(binding) => binding.kind(),
            Self::Alias(_) => BindingKind::Alias,
        }
    }

    /// 单例类绑定的构建阶段
    pub fn phase(&self) -> Option<BuildPhase> {
        match self {
            Self::Binding(binding) => binding.phase(),
            Self::Alias(_) => None,
        }
    }
}

impl From<Binding> for Registration {
    fn from(binding: Binding) -> Self {
        Self::Binding(Arc::new(binding))
    }
}

impl From<AliasBinding> for Registration {
    fn from(alias: AliasBinding) -> Self {
        Self::Alias(Arc::new(alias))
    }
}
