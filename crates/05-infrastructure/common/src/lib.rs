//! # DI Common
//!
//! 这个 crate 提供了 Lorn DI 容器各层共享的基础类型。
//!
//! ## 核心类型
//!
//! - [`TypeInfo`] - 显式的类型标识
//! - [`Qualifier`] - 类型擦除的限定符
//! - [`TypeKey`] - 绑定键：类型标识 + 可选限定符
//! - [`BindingKind`] - 绑定的生命周期类型
//! - [`DependencyError`] - 解析错误
//! - [`ContainerConfig`] - 容器配置
//!
//! ## 设计原则
//!
//! - 键在构造后不可变，可以安全地跨线程共享
//! - 显式类型标识，不依赖运行时反射

pub mod configuration;
pub mod errors;
pub mod key;
pub mod lifecycle;
pub mod metadata;

pub use configuration::*;
pub use errors::*;
pub use key::*;
pub use lifecycle::*;
pub use metadata::*;
