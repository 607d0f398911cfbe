//! 依赖解析器抽象接口
//!
//! 提供按绑定键获取实例的能力

use di_common::{DependencyResult, Qualifier, TypeKey};
use std::sync::Arc;

/// 依赖解析器 trait
///
/// 实现者只需提供 [`Resolver::resolve_key`] 与 [`Resolver::contains_key`]，
/// 其余方法都是基于这两者的默认实现。
pub trait Resolver {
    /// 解析指定绑定键的实例
    ///
    /// 按绑定的生命周期首次使用时构建。没有绑定（直接或经别名）时返回
    /// `UnregisteredBinding`。
    fn resolve_key<T>(&self, key: &TypeKey) -> DependencyResult<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static;

    /// 检查绑定键是否可解析（不构建实例）
    fn contains_key(&self, key: &TypeKey) -> bool;

    /// 解析指定类型的组件
    fn resolve<T>(&self) -> DependencyResult<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.resolve_key(&TypeKey::of::<T>())
    }

    /// 按限定符解析
    fn resolve_keyed<T>(&self, qualifier: impl Into<Qualifier>) -> DependencyResult<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.resolve_key(&TypeKey::qualified::<T>(qualifier))
    }

    /// 解析，未注册时返回 `None`
    ///
    /// 只屏蔽 `UnregisteredBinding`，其他错误照常返回。
    fn resolve_key_or_none<T>(&self, key: &TypeKey) -> DependencyResult<Option<Arc<T>>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        match self.resolve_key(key) {
            Ok(instance) => Ok(Some(instance)),
            Err(err) if err.is_unregistered() => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// 解析指定类型，未注册时返回 `None`
    fn resolve_or_none<T>(&self) -> DependencyResult<Option<Arc<T>>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.resolve_key_or_none(&TypeKey::of::<T>())
    }

    /// 解析，未注册时使用默认值函数的结果
    fn resolve_key_or_else<T, F>(&self, key: &TypeKey, default: F) -> DependencyResult<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
        F: FnOnce() -> Arc<T>,
    {
        Ok(self.resolve_key_or_none(key)?.unwrap_or_else(default))
    }

    /// 解析指定类型，未注册时使用默认值函数的结果
    fn resolve_or_else<T, F>(&self, default: F) -> DependencyResult<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
        F: FnOnce() -> Arc<T>,
    {
        self.resolve_key_or_else(&TypeKey::of::<T>(), default)
    }

    /// 解析指定类型，未注册时返回给定的默认值
    fn resolve_or<T>(&self, default: Arc<T>) -> DependencyResult<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.resolve_or_else(|| default)
    }

    /// 检查类型是否已注册
    fn contains<T>(&self) -> bool
    where
        T: ?Sized + 'static,
    {
        self.contains_key(&TypeKey::of::<T>())
    }
}
