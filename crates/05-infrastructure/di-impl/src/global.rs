//! 进程级默认作用域
//!
//! 进程启动时创建的一个空作用域，供单作用域应用使用。它只是普通的共享
//! 可变状态，可以随时替换（例如在测试中隔离状态）。

use crate::scope::Scope;
use di_abstractions::Resolver;
use di_common::DependencyResult;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::info;

const DEFAULT_SCOPE_NAME: &str = "global";

static DEFAULT_SCOPE: Lazy<RwLock<Scope>> =
    Lazy::new(|| RwLock::new(Scope::named(DEFAULT_SCOPE_NAME)));

/// 获取默认作用域句柄
pub fn default_scope() -> Scope {
    DEFAULT_SCOPE.read().clone()
}

/// 替换默认作用域，返回原来的作用域
pub fn replace_default_scope(scope: Scope) -> Scope {
    info!("替换默认作用域: {} ({})", scope.name(), scope.id());
    std::mem::replace(&mut *DEFAULT_SCOPE.write(), scope)
}

/// 把默认作用域重置为新的空作用域
pub fn reset_default_scope() -> Scope {
    replace_default_scope(Scope::named(DEFAULT_SCOPE_NAME))
}

/// 从默认作用域解析
pub fn resolve<T>() -> DependencyResult<Arc<T>>
where
    T: ?Sized + Send + Sync + 'static,
{
    default_scope().resolve::<T>()
}
