//! # 依赖注入具体实现
//!
//! 提供作用域、绑定注册表与解析算法的具体实现。
//!
//! ## 核心类型
//!
//! - [`Scope`] - 拥有注册表的解析单元
//! - [`ScopeBuilder`] - 带初始化声明的作用域构建器
//! - [`ScopeRegistrar`] - [`Registrar`] 的实现
//! - [`LazyInstance`] - 延迟解析句柄
//! - [`global`] - 进程级默认作用域
//!
//! ## 生命周期
//!
//! | 类型 | 实例数量 |
//! |------|----------|
//! | Factory / ScopedFactory | 每次解析一个 |
//! | Singleton / ScopedSingleton | 每个作用域一个 |
//! | PerThread | 每个线程一个 |
//! | PerKey | 每个限定符值一个 |
//! | Alias | 与目标绑定相同 |

pub mod binding;
pub mod global;
pub mod lazy;
pub mod registrar;
pub mod registry;
mod resolver;
pub mod scope;

pub use binding::{AliasBinding, Binding, Registration};
pub use global::{default_scope, replace_default_scope, reset_default_scope};
pub use lazy::LazyInstance;
pub use registrar::ScopeRegistrar;
pub use registry::Registry;
pub use scope::{ContainerStats, Scope, ScopeBuilder};

pub use di_abstractions::{Module, Registrar, Resolver};
pub use di_common::{
    BindingKind, BuildPhase, ConfigError, ContainerConfig, DependencyError, DependencyResult,
    LoggerKey, Qualifier, QualifierValue, TypeInfo, TypeKey,
};
