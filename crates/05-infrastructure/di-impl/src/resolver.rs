//! 解析算法
//!
//! 给定绑定键：沿别名链找到实际绑定，在当前线程的解析链上登记，
//! 按生命周期获取或构建实例，最后沿别名链逆序转换为请求的类型。

use crate::binding::{AliasBinding, Binding, Instance, Registration};
use crate::registry::Registry;
use crate::scope::Scope;
use di_common::{ContainerConfig, DependencyError, DependencyResult, TypeKey};
use std::cell::RefCell;
use std::sync::Arc;
use tracing::debug;

thread_local! {
    /// 当前线程正在进行的嵌套解析
    static RESOLUTION_CHAIN: RefCell<Vec<Frame>> = const { RefCell::new(Vec::new()) };
}

struct Frame {
    binding_id: u64,
    key: TypeKey,
}

fn render_chain(chain: &[Frame], last: &TypeKey) -> String {
    chain
        .iter()
        .map(|frame| frame.key.to_string())
        .chain(std::iter::once(last.to_string()))
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// 解析链上的一帧，离开作用域时出栈
struct ResolutionGuard;

impl ResolutionGuard {
    fn enter(binding: &Binding, key: &TypeKey, config: &ContainerConfig) -> DependencyResult<Self> {
        RESOLUTION_CHAIN.with(|chain| {
            let mut chain = chain.borrow_mut();
            if config.enable_circular_dependency_detection
                && chain
                    .iter()
                    .any(|frame| frame.binding_id == binding.id() && frame.key == *key)
            {
                return Err(DependencyError::CircularDependency {
                    dependency_chain: render_chain(&chain, key),
                });
            }
            if chain.len() >= config.max_resolution_depth {
                return Err(DependencyError::ResolutionDepthExceeded {
                    key: key.clone(),
                    max_depth: config.max_resolution_depth,
                });
            }
            chain.push(Frame {
                binding_id: binding.id(),
                key: key.clone(),
            });
            Ok(Self)
        })
    }
}

impl Drop for ResolutionGuard {
    fn drop(&mut self) {
        RESOLUTION_CHAIN.with(|chain| {
            chain.borrow_mut().pop();
        });
    }
}

/// 别名链的终点
pub(crate) struct Located {
    /// 非别名的实际绑定
    pub(crate) binding: Arc<Binding>,
    /// 到达实际绑定时的绑定键
    pub(crate) key: TypeKey,
    /// 经过的别名，按访问顺序
    pub(crate) hops: Vec<Arc<AliasBinding>>,
}

/// 沿别名链查找实际绑定
///
/// 经回退命中的无限定符别名会把请求的限定符带到目标键上。
pub(crate) fn locate(
    registry: &Registry,
    requested: &TypeKey,
    max_hops: usize,
) -> DependencyResult<Located> {
    let mut current = requested.clone();
    let mut visited = vec![requested.clone()];
    let mut hops: Vec<Arc<AliasBinding>> = Vec::new();

    loop {
        let registration = registry
            .lookup(&current)
            .ok_or_else(|| DependencyError::unregistered(&current))?;
        let alias = match registration {
            Registration::Binding(binding) => {
                return Ok(Located {
                    binding,
                    key: current,
                    hops,
                })
            }
            Registration::Alias(alias) => alias,
        };

        let target = alias.target();
        let next = match current.qualifier() {
            Some(qualifier) if !alias.key().is_qualified() && !target.is_qualified() => {
                target.with_qualifier(qualifier.clone())
            }
            _ => target.clone(),
        };
        let revisited = visited.contains(&next);
        visited.push(next.clone());
        if revisited || hops.len() >= max_hops {
            return Err(DependencyError::AliasCycle {
                chain: visited
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(" -> "),
                max_hops,
            });
        }

        hops.push(alias);
        current = next;
    }
}

/// 解析绑定键对应的实例
pub(crate) fn resolve_instance(scope: &Scope, requested: &TypeKey) -> DependencyResult<Instance> {
    let config = scope.config();
    let located = locate(scope.registry(), requested, config.max_alias_hops)?;
    if config.trace_resolutions {
        debug!(
            "解析绑定: {} => {} ({}, 经过 {} 个别名)",
            requested,
            located.key,
            located.binding.kind(),
            located.hops.len()
        );
    }

    let instance = {
        let _guard = ResolutionGuard::enter(&located.binding, &located.key, config)?;
        located.binding.instantiate(scope, &located.key)?
    };

    located
        .hops
        .iter()
        .rev()
        .try_fold(instance, |instance, hop| hop.upcast(&instance))
}
