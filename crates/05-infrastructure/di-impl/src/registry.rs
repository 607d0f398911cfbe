//! 绑定注册表

use crate::binding::Registration;
use di_common::{BindingKind, TypeKey};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

/// 绑定注册表
///
/// 绑定键到绑定的映射。同一键重复注册时后者替换前者。
/// 读取是并发安全的；解析前会释放锁，构造函数可以在其中继续解析。
pub struct Registry {
    bindings: RwLock<HashMap<TypeKey, Registration>>,
}

impl Registry {
    /// 创建空注册表
    pub fn new() -> Self {
        Self {
            bindings: RwLock::new(HashMap::new()),
        }
    }

    /// 插入绑定，返回被替换的旧绑定
    pub(crate) fn insert(&self, registration: impl Into<Registration>) -> Option<Registration> {
        let registration = registration.into();
        let key = registration.key().clone();
        let kind = registration.kind();
        let previous = self.bindings.write().insert(key.clone(), registration);

        match &previous {
            Some(old) => debug!("覆盖已有绑定: {} ({} -> {})", key, old.kind(), kind),
            None => debug!("注册绑定: {} ({})", key, kind),
        }
        previous
    }

    /// 按绑定键精确查找
    pub fn get(&self, key: &TypeKey) -> Option<Registration> {
        self.bindings.read().get(key).cloned()
    }

    /// 查找绑定
    ///
    /// 带限定符的键先精确匹配；找不到时回退到同类型的无限定符绑定，
    /// 但只接受会消费限定符的绑定（按键、日志、别名）。
    pub(crate) fn lookup(&self, key: &TypeKey) -> Option<Registration> {
        let bindings = self.bindings.read();
        if let Some(registration) = bindings.get(key) {
            return Some(registration.clone());
        }
        if !key.is_qualified() {
            return None;
        }
        bindings
            .get(&key.unqualified())
            .filter(|registration| registration.kind().accepts_qualifier())
            .cloned()
    }

    /// 绑定的生命周期类型
    pub fn kind_of(&self, key: &TypeKey) -> Option<BindingKind> {
        self.get(key).map(|registration| registration.kind())
    }

    /// 所有已注册的绑定键
    pub fn keys(&self) -> Vec<TypeKey> {
        self.bindings.read().keys().cloned().collect()
    }

    /// 当前所有绑定的快照
    pub(crate) fn bindings(&self) -> Vec<Registration> {
        self.bindings.read().values().cloned().collect()
    }

    /// 已注册绑定数量
    pub fn len(&self) -> usize {
        self.bindings.read().len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.bindings.read().is_empty()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("bindings", &self.len())
            .finish()
    }
}
