//! 模块抽象接口
//!
//! 模块是可复用、无状态的绑定声明集合，导入时才在目标作用域中生成绑定。

use crate::registrar::Registrar;

/// 模块 trait
///
/// ```rust,ignore
/// struct StorageModule;
///
/// impl Module for StorageModule {
///     fn register<R: Registrar>(&self, registrar: &mut R) {
///         registrar.add_singleton_factory(|| ConnectionPool::new(4));
///     }
/// }
/// ```
pub trait Module: Send + Sync {
    /// 模块名称
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// 在声明器上执行本模块的全部声明
    fn register<R: Registrar>(&self, registrar: &mut R);
}
