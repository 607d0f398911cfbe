//! 绑定声明抽象接口
//!
//! 作用域初始化阶段使用的声明 API。重复声明同一绑定键时后者覆盖前者，
//! 因此局部作用域可以在导入模块之后覆盖模块提供的默认绑定。

use crate::module::Module;
use crate::resolver::Resolver;
use di_common::{QualifierValue, TypeInfo, TypeKey};
use std::sync::Arc;

/// 绑定声明 trait
pub trait Registrar: Sized {
    /// 作用域构造函数接收的作用域类型
    type Scope: Resolver;

    /// 注册工厂：每次解析创建新实例
    fn add_factory<T, F>(&mut self, ctor: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn() -> T + Send + Sync + 'static;

    /// 注册可失败的工厂
    fn try_add_factory<T, F>(&mut self, ctor: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn() -> anyhow::Result<T> + Send + Sync + 'static;

    /// 注册已构建好的单例
    fn add_singleton<T>(&mut self, value: T) -> &mut Self
    where
        T: Send + Sync + 'static,
    {
        self.add_singleton_arc(Arc::new(value))
    }

    /// 注册已构建好的单例（支持 trait 对象）
    fn add_singleton_arc<T>(&mut self, value: Arc<T>) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static;

    /// 注册延迟单例：首次解析时构建
    fn add_singleton_factory<T, F>(&mut self, ctor: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn() -> T + Send + Sync + 'static;

    /// 注册可失败的延迟单例
    fn try_add_singleton_factory<T, F>(&mut self, ctor: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn() -> anyhow::Result<T> + Send + Sync + 'static;

    /// 注册作用域工厂：构造函数接收所属作用域，每次解析创建新实例
    fn add_scoped_factory<T, F>(&mut self, ctor: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&Self::Scope) -> anyhow::Result<T> + Send + Sync + 'static;

    /// 注册作用域单例：构造函数接收所属作用域，只构建一次
    fn add_scoped_singleton_factory<T, F>(&mut self, ctor: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&Self::Scope) -> anyhow::Result<T> + Send + Sync + 'static;

    /// 注册线程工厂：每个调用线程一个实例
    fn add_per_thread_factory<T, F>(&mut self, ctor: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn() -> T + Send + Sync + 'static;

    /// 注册按键工厂：每个不同的限定符值一个实例，构造函数接收限定符值
    fn add_per_key_factory<T, K, F>(&mut self, ctor: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        K: QualifierValue,
        F: Fn(&K) -> T + Send + Sync + 'static;

    /// 注册别名：解析 `A` 时委托给 `T` 当前（或之后）注册的绑定
    ///
    /// `upcast` 把目标实例转换为别名类型，例如 `Arc<Concrete>` 到
    /// `Arc<dyn Trait>`，实例本身保持同一个。
    fn add_alias<A, T, C>(&mut self, upcast: C) -> &mut Self
    where
        A: ?Sized + Send + Sync + 'static,
        T: ?Sized + Send + Sync + 'static,
        C: Fn(Arc<T>) -> Arc<A> + Send + Sync + 'static;

    /// 注册同类型绑定键之间的别名（通常用于限定符）
    fn add_key_alias(&mut self, from: TypeKey, to: TypeKey) -> &mut Self;

    /// 注册日志工厂：名称限定符交给 `by_name`，类型限定符交给 `by_type`
    fn add_logger_factory<L, N, C>(&mut self, by_name: N, by_type: C) -> &mut Self
    where
        L: Send + Sync + 'static,
        N: Fn(&str) -> L + Send + Sync + 'static,
        C: Fn(&TypeInfo) -> L + Send + Sync + 'static;

    /// 导入模块：在当前声明器上重放模块的全部声明
    fn import_module<M: Module>(&mut self, module: &M) -> &mut Self {
        module.register(self);
        self
    }
}
