//! 延迟解析句柄

use crate::scope::Scope;
use di_abstractions::Resolver;
use di_common::{DependencyResult, TypeKey};
use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::Arc;

/// 延迟解析句柄
///
/// 创建时不解析；首次 [`get`](LazyInstance::get) 成功后把结果缓存在句柄内。
/// 缓存与绑定自身的缓存无关：通过同一个句柄访问工厂绑定，始终得到同一个实例。
/// 解析失败不会被缓存，下次访问会重新解析。
pub struct LazyInstance<T: ?Sized> {
    scope: Scope,
    key: TypeKey,
    cell: OnceCell<Arc<T>>,
}

impl<T> LazyInstance<T>
where
    T: ?Sized + Send + Sync + 'static,
{
    pub(crate) fn new(scope: Scope, key: TypeKey) -> Self {
        Self {
            scope,
            key,
            cell: OnceCell::new(),
        }
    }

    /// 获取实例，首次调用时解析
    pub fn get(&self) -> DependencyResult<Arc<T>> {
        self.cell
            .get_or_try_init(|| self.scope.resolve_key::<T>(&self.key))
            .map(Arc::clone)
    }

    /// 是否已经解析过
    pub fn is_resolved(&self) -> bool {
        self.cell.get().is_some()
    }

    /// 绑定键
    pub fn key(&self) -> &TypeKey {
        &self.key
    }
}

impl<T: ?Sized> fmt::Debug for LazyInstance<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyInstance")
            .field("key", &self.key)
            .field("scope", &self.scope.name())
            .field("resolved", &self.cell.get().is_some())
            .finish()
    }
}
