//! 绑定生命周期类型

use std::fmt;

/// 绑定生命周期类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingKind {
    /// 工厂模式 - 每次解析都创建新实例
    Factory,
    /// 单例模式 - 只创建一个实例（预先构建或首次解析时构建）
    Singleton,
    /// 线程模式 - 每个调用线程一个实例
    PerThread,
    /// 按键模式 - 每个不同的限定符一个实例
    PerKey,
    /// 作用域工厂 - 构造函数接收所属作用域，每次解析创建新实例
    ScopedFactory,
    /// 作用域单例 - 构造函数接收所属作用域，只创建一个实例
    ScopedSingleton,
    /// 日志工厂 - 按限定符形态（名称或类型）分派
    Logger,
    /// 别名 - 重定向到另一个绑定键
    Alias,
}

impl BindingKind {
    /// 是否接收限定符（带限定符的请求可回退到此类无限定符绑定）
    pub fn accepts_qualifier(self) -> bool {
        matches!(self, Self::PerKey | Self::Logger | Self::Alias)
    }
}

impl fmt::Display for BindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Factory => "factory",
            Self::Singleton => "singleton",
            Self::PerThread => "per-thread",
            Self::PerKey => "per-key",
            Self::ScopedFactory => "scoped-factory",
            Self::ScopedSingleton => "scoped-singleton",
            Self::Logger => "logger",
            Self::Alias => "alias",
        };
        f.write_str(name)
    }
}

/// 缓存槽的构建阶段
///
/// `Unbuilt → Building → Built`；构建失败时回到 `Unbuilt`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildPhase {
    /// 未构建
    #[default]
    Unbuilt,
    /// 构建中
    Building,
    /// 已构建
    Built,
}
