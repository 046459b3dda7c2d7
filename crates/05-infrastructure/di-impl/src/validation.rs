//! 构建期注册校验

use di_abstractions::{
    CircularDependencyDetector, ContainerConfig, DefaultCircularDependencyDetector,
    ServiceDescriptor,
};
use infrastructure_common::{DependencyError, DependencyResult, Lifetime};
use std::any::TypeId;
use std::collections::HashMap;
use tracing::{debug, error};

/// 校验服务注册
///
/// 检查声明的依赖均已注册、单例不捕获作用域服务（开启作用域校验时）以及依赖图无环
pub(crate) fn validate_descriptors(
    descriptors: &[ServiceDescriptor],
    config: &ContainerConfig,
) -> DependencyResult<()> {
    debug!("校验服务注册: {} 个", descriptors.len());

    // 同一服务以最后一次注册的生命周期为准
    let lifetimes: HashMap<TypeId, Lifetime> = descriptors
        .iter()
        .map(|descriptor| (descriptor.key().service(), descriptor.lifetime()))
        .collect();

    for descriptor in descriptors {
        for dependency in descriptor.dependencies() {
            let Some(lifetime) = dependency.id.and_then(|id| lifetimes.get(&id)) else {
                error!(
                    "服务 {} 的依赖 {} 未注册",
                    descriptor.service_type().name,
                    dependency.name
                );
                return Err(DependencyError::DependencyResolutionFailed {
                    type_name: descriptor.service_type().full_name.clone(),
                    message: format!("依赖 {} 未注册", dependency.full_name),
                });
            };

            if config.validate_scopes
                && descriptor.lifetime() == Lifetime::Singleton
                && *lifetime == Lifetime::Scoped
            {
                error!(
                    "单例服务 {} 依赖作用域服务 {}",
                    descriptor.service_type().name,
                    dependency.name
                );
                return Err(DependencyError::ScopeMismatch {
                    expected: format!("单例 {} 仅依赖单例或瞬时服务", descriptor.service_type().name),
                    actual: format!("作用域服务 {}", dependency.name),
                });
            }
        }
    }

    if config.enable_circular_dependency_detection {
        let detector = DefaultCircularDependencyDetector;
        let graph = detector.build_dependency_graph(descriptors);
        detector.detect_circular_dependencies(&graph)?;
    }

    Ok(())
}
