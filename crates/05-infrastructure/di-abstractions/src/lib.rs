//! # Dependency Injection Abstractions
//!
//! 依赖注入抽象层，定义绑定声明与依赖解析的核心接口。
//!
//! ## 核心接口
//!
//! - [`Resolver`] - 依赖解析接口
//! - [`Registrar`] - 绑定声明接口（作用域的初始化阶段使用）
//! - [`Module`] - 可复用的绑定声明集合

pub mod module;
pub mod registrar;
pub mod resolver;

pub use module::*;
pub use registrar::*;
pub use resolver::*;
