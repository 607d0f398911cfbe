//! 作用域：解析的基本单元

use crate::binding::{downcast, Instance};
use crate::lazy::LazyInstance;
use crate::registrar::ScopeRegistrar;
use crate::registry::Registry;
use crate::resolver;
use di_abstractions::Resolver;
use di_common::{
    BindingKind, ContainerConfig, DependencyError, DependencyResult, LoggerKey, TypeKey,
};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// 作用域运行统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContainerStats {
    /// 已注册绑定数量（含别名）
    pub registered_bindings: usize,
    /// 别名绑定数量
    pub alias_bindings: usize,
    /// 解析调用次数（含嵌套解析）
    pub resolutions: u64,
    /// 失败的解析次数
    pub resolution_errors: u64,
    /// 构造函数执行次数
    pub constructions: u64,
}

struct ScopeInner {
    id: Uuid,
    name: String,
    config: ContainerConfig,
    registry: Registry,
    resolutions: AtomicU64,
    resolution_errors: AtomicU64,
    constructions: AtomicU64,
}

/// 作用域
///
/// 拥有一个注册表，负责解析其中的绑定。`Scope` 是共享句柄，克隆后
/// 指向同一个注册表和同一批缓存实例；不同作用域之间互不影响。
///
/// ```rust,ignore
/// let scope = Scope::builder().name("app").build_with(|r| {
///     r.add_singleton_factory(|| Database::connect("memory"));
///     r.add_scoped_factory(|scope| Ok(UserService::new(scope.resolve()?)));
/// });
/// let service = scope.resolve::<UserService>()?;
/// ```
#[derive(Clone)]
pub struct Scope {
    inner: Arc<ScopeInner>,
}

impl Scope {
    /// 创建空作用域
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// 创建带名称的空作用域
    pub fn named(name: impl Into<String>) -> Self {
        Self::builder().name(name).build()
    }

    /// 作用域构建器
    pub fn builder() -> ScopeBuilder {
        ScopeBuilder::new()
    }

    fn with_config(name: String, config: ContainerConfig) -> Self {
        let id = Uuid::new_v4();
        info!("创建作用域: {} ({})", name, id);
        Self {
            inner: Arc::new(ScopeInner {
                id,
                name,
                config,
                registry: Registry::new(),
                resolutions: AtomicU64::new(0),
                resolution_errors: AtomicU64::new(0),
                constructions: AtomicU64::new(0),
            }),
        }
    }

    /// 作用域ID
    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    /// 作用域名称
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// 容器配置
    pub fn config(&self) -> &ContainerConfig {
        &self.inner.config
    }

    /// 只读的注册表视图
    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    /// 获取声明器
    ///
    /// 初始化之后继续注册绑定，主要用于测试。并发注册由调用方自行协调。
    pub fn registrar(&self) -> ScopeRegistrar<'_> {
        ScopeRegistrar::new(self)
    }

    /// 两个句柄是否指向同一个作用域
    pub fn ptr_eq(&self, other: &Scope) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// 延迟解析：首次访问时才解析，结果缓存在句柄中
    pub fn resolve_lazy<T>(&self) -> LazyInstance<T>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.resolve_lazy_key(TypeKey::of::<T>())
    }

    /// 按绑定键延迟解析
    pub fn resolve_lazy_key<T>(&self, key: TypeKey) -> LazyInstance<T>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        LazyInstance::new(self.clone(), key)
    }

    /// 解析日志实例
    pub fn logger<L>(&self, key: LoggerKey) -> DependencyResult<Arc<L>>
    where
        L: Send + Sync + 'static,
    {
        self.resolve_key(&TypeKey::qualified::<L>(key))
    }

    /// 解析以 `Owner` 类型命名的日志实例
    pub fn logger_for<L, Owner>(&self) -> DependencyResult<Arc<L>>
    where
        L: Send + Sync + 'static,
        Owner: ?Sized + 'static,
    {
        self.logger(LoggerKey::of::<Owner>())
    }

    /// 检查所有别名绑定，报告悬空目标与循环，不构建任何实例
    pub fn validate(&self) -> Result<(), Vec<DependencyError>> {
        let registry = self.registry();
        let errors: Vec<DependencyError> = registry
            .bindings()
            .iter()
            .filter(|binding| binding.kind() == BindingKind::Alias)
            .filter_map(|binding| {
                resolver::locate(registry, binding.key(), self.config().max_alias_hops).err()
            })
            .collect();

        if errors.is_empty() {
            return Ok(());
        }
        for err in &errors {
            warn!("作用域 {} 校验失败: {}", self.name(), err);
        }
        Err(errors)
    }

    /// 运行统计
    pub fn stats(&self) -> ContainerStats {
        let bindings = self.registry().bindings();
        ContainerStats {
            registered_bindings: bindings.len(),
            alias_bindings: bindings
                .iter()
                .filter(|binding| binding.kind() == BindingKind::Alias)
                .count(),
            resolutions: self.inner.resolutions.load(Ordering::Relaxed),
            resolution_errors: self.inner.resolution_errors.load(Ordering::Relaxed),
            constructions: self.inner.constructions.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn record_construction(&self) {
        self.inner.constructions.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn resolve_instance(&self, key: &TypeKey) -> DependencyResult<Instance> {
        resolver::resolve_instance(self, key)
    }
}

impl Resolver for Scope {
    fn resolve_key<T>(&self, key: &TypeKey) -> DependencyResult<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.inner.resolutions.fetch_add(1, Ordering::Relaxed);
        let result = self.resolve_instance(key).and_then(|instance| {
            downcast::<T>(&instance).ok_or_else(|| DependencyError::TypeMismatch {
                key: key.clone(),
                expected: std::any::type_name::<T>(),
            })
        });
        if result.is_err() {
            self.inner.resolution_errors.fetch_add(1, Ordering::Relaxed);
        }
        result
    }

    fn contains_key(&self, key: &TypeKey) -> bool {
        resolver::locate(self.registry(), key, self.config().max_alias_hops).is_ok()
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .field("bindings", &self.inner.registry.len())
            .finish()
    }
}

/// 作用域构建器
#[derive(Debug, Default)]
pub struct ScopeBuilder {
    name: Option<String>,
    config: ContainerConfig,
}

impl ScopeBuilder {
    /// 创建新的构建器
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置作用域名称
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// 设置容器配置
    pub fn config(mut self, config: ContainerConfig) -> Self {
        self.config = config;
        self
    }

    /// 构建空作用域
    pub fn build(self) -> Scope {
        let name = self.name.unwrap_or_else(|| "anonymous".to_string());
        Scope::with_config(name, self.config)
    }

    /// 构建作用域，并在返回前执行一次初始化声明
    pub fn build_with<F>(self, setup: F) -> Scope
    where
        F: FnOnce(&mut ScopeRegistrar<'_>),
    {
        let scope = self.build();
        {
            let mut registrar = scope.registrar();
            setup(&mut registrar);
        }
        info!(
            "作用域初始化完成: {} ({} 个绑定)",
            scope.name(),
            scope.registry().len()
        );
        scope
    }
}
