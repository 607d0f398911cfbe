//! 绑定键定义
//!
//! 绑定由 [`TypeKey`] 标识：类型信息加上一个可选的 [`Qualifier`]。

use crate::metadata::TypeInfo;
use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// 可作为限定符的值
///
/// 所有 `Eq + Hash + Debug + Send + Sync + 'static` 的类型自动实现此 trait。
pub trait QualifierValue: Any + Send + Sync + fmt::Debug {
    /// 转换为 `Any` 以便向下转型
    fn as_any(&self) -> &dyn Any;

    /// 与另一个限定符值比较（类型不同则不相等）
    fn dyn_eq(&self, other: &dyn QualifierValue) -> bool;

    /// 写入哈希状态
    fn dyn_hash(&self, state: &mut dyn Hasher);

    /// 值的运行时类型
    fn value_type(&self) -> TypeInfo;
}

impl<T> QualifierValue for T
where
    T: Any + Send + Sync + fmt::Debug + Eq + Hash,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn dyn_eq(&self, other: &dyn QualifierValue) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .map_or(false, |other| other == self)
    }

    fn dyn_hash(&self, mut state: &mut dyn Hasher) {
        TypeId::of::<T>().hash(&mut state);
        self.hash(&mut state);
    }

    fn value_type(&self) -> TypeInfo {
        TypeInfo::of::<T>()
    }
}

/// 限定符
///
/// 区分同一类型下的多个实例（按键工厂、日志工厂）。克隆只增加引用计数。
#[derive(Clone)]
pub struct Qualifier {
    value: Arc<dyn QualifierValue>,
}

impl Qualifier {
    /// 包装任意可比较的值
    ///
    /// 注意 `&'static str` 与 `String` 是不同的类型；需要字符串限定符时
    /// 请使用 `Qualifier::from("name")`，它会统一存储为 `String`。
    /// 传入的值本身就是 `Qualifier` 时直接复用，不会再包装一层。
    pub fn new<V: QualifierValue>(value: V) -> Self {
        if let Some(existing) = (&value as &dyn Any).downcast_ref::<Self>() {
            return existing.clone();
        }
        Self {
            value: Arc::new(value),
        }
    }

    /// 尝试以指定类型读取限定符的值
    pub fn downcast_ref<V: 'static>(&self) -> Option<&V> {
        self.value.as_any().downcast_ref::<V>()
    }

    /// 字符串限定符的内容
    pub fn as_str(&self) -> Option<&str> {
        self.downcast_ref::<String>().map(String::as_str)
    }

    /// 值的运行时类型
    pub fn value_type(&self) -> TypeInfo {
        self.value.value_type()
    }
}

impl PartialEq for Qualifier {
    fn eq(&self, other: &Self) -> bool {
        self.value.dyn_eq(&*other.value)
    }
}

impl Eq for Qualifier {}

impl Hash for Qualifier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.dyn_hash(state);
    }
}

impl fmt::Debug for Qualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Qualifier").field(&self.value).finish()
    }
}

impl fmt::Display for Qualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_str() {
            Some(name) => f.write_str(name),
            None => write!(f, "{:?}", self.value),
        }
    }
}

impl From<&str> for Qualifier {
    fn from(value: &str) -> Self {
        Self::new(value.to_string())
    }
}

impl From<String> for Qualifier {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<i64> for Qualifier {
    fn from(value: i64) -> Self {
        Self::new(value)
    }
}

impl From<u64> for Qualifier {
    fn from(value: u64) -> Self {
        Self::new(value)
    }
}

impl From<TypeInfo> for Qualifier {
    fn from(value: TypeInfo) -> Self {
        Self::new(value)
    }
}

impl From<LoggerKey> for Qualifier {
    fn from(value: LoggerKey) -> Self {
        Self::new(value)
    }
}

/// 绑定键
///
/// 两个键相等当且仅当类型与限定符都相等。键构造后不可变。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeKey {
    type_info: TypeInfo,
    qualifier: Option<Qualifier>,
}

impl TypeKey {
    /// 创建新的绑定键
    pub fn new(type_info: TypeInfo, qualifier: Option<Qualifier>) -> Self {
        Self {
            type_info,
            qualifier,
        }
    }

    /// 无限定符的类型键
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::new(TypeInfo::of::<T>(), None)
    }

    /// 带限定符的类型键
    pub fn qualified<T: ?Sized + 'static>(qualifier: impl Into<Qualifier>) -> Self {
        Self::new(TypeInfo::of::<T>(), Some(qualifier.into()))
    }

    /// 替换限定符
    #[must_use]
    pub fn with_qualifier(&self, qualifier: Qualifier) -> Self {
        Self::new(self.type_info, Some(qualifier))
    }

    /// 去掉限定符
    #[must_use]
    pub fn unqualified(&self) -> Self {
        Self::new(self.type_info, None)
    }

    /// 类型信息
    pub fn type_info(&self) -> TypeInfo {
        self.type_info
    }

    /// 限定符
    pub fn qualifier(&self) -> Option<&Qualifier> {
        self.qualifier.as_ref()
    }

    /// 是否带限定符
    pub fn is_qualified(&self) -> bool {
        self.qualifier.is_some()
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.qualifier {
            Some(qualifier) => write!(f, "{}[{}]", self.type_info, qualifier),
            None => write!(f, "{}", self.type_info),
        }
    }
}

/// 日志工厂的限定符
///
/// 按名称或按类型请求日志实例，在调用处显式给出。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LoggerKey {
    /// 按名称
    ByName(String),
    /// 按类型
    ByType(TypeInfo),
}

impl LoggerKey {
    /// 按名称请求
    pub fn by_name(name: impl Into<String>) -> Self {
        Self::ByName(name.into())
    }

    /// 按类型请求
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::ByType(TypeInfo::of::<T>())
    }

    /// 从任意限定符推导
    ///
    /// `LoggerKey` 原样使用；`String` 视为名称；`TypeInfo` 视为类型；
    /// 其他值使用其自身的运行时类型。
    pub fn from_qualifier(qualifier: &Qualifier) -> Self {
        if let Some(key) = qualifier.downcast_ref::<Self>() {
            key.clone()
        } else if let Some(name) = qualifier.as_str() {
            Self::ByName(name.to_string())
        } else if let Some(type_info) = qualifier.downcast_ref::<TypeInfo>() {
            Self::ByType(*type_info)
        } else {
            Self::ByType(qualifier.value_type())
        }
    }
}
