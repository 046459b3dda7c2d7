//! 依赖图与循环依赖检测

use crate::descriptor::ServiceDescriptor;
use infrastructure_common::{DependencyError, DependencyResult, TypeInfo};
use std::any::TypeId;
use std::collections::HashSet;

/// 依赖图节点
#[derive(Debug, Clone)]
pub struct DependencyGraphNode {
    /// 服务类型
    pub service: TypeInfo,
    /// 依赖的服务类型列表
    pub dependencies: Vec<TypeInfo>,
}

/// 循环依赖检测器
pub trait CircularDependencyDetector: Send + Sync {
    /// 检测循环依赖
    fn detect_circular_dependencies(&self, graph: &[DependencyGraphNode]) -> DependencyResult<()>;

    /// 构建依赖图
    fn build_dependency_graph(&self, descriptors: &[ServiceDescriptor]) -> Vec<DependencyGraphNode>;
}

/// 默认循环依赖检测器
#[derive(Debug, Default)]
pub struct DefaultCircularDependencyDetector;

impl CircularDependencyDetector for DefaultCircularDependencyDetector {
    fn detect_circular_dependencies(&self, graph: &[DependencyGraphNode]) -> DependencyResult<()> {
        // 使用深度优先搜索检测循环依赖
        let mut visited = HashSet::new();
        let mut path = Vec::new();

        for node in graph {
            if let Some(id) = node.service.id {
                if !visited.contains(&id) {
                    self.dfs_check(&node.service, graph, &mut visited, &mut path)?;
                }
            }
        }

        Ok(())
    }

    fn build_dependency_graph(&self, descriptors: &[ServiceDescriptor]) -> Vec<DependencyGraphNode> {
        descriptors
            .iter()
            .map(|descriptor| DependencyGraphNode {
                service: descriptor.service_type().clone(),
                dependencies: descriptor.dependencies().to_vec(),
            })
            .collect()
    }
}

impl DefaultCircularDependencyDetector {
    fn dfs_check(
        &self,
        current: &TypeInfo,
        graph: &[DependencyGraphNode],
        visited: &mut HashSet<TypeId>,
        path: &mut Vec<TypeInfo>,
    ) -> DependencyResult<()> {
        let Some(current_id) = current.id else {
            return Ok(());
        };

        if path.iter().any(|step| step.same_type(current)) {
            let chain = path
                .iter()
                .map(|step| step.name.as_str())
                .collect::<Vec<_>>()
                .join(" -> ");

            return Err(DependencyError::CircularDependency {
                dependency_chain: format!("{} -> {}", chain, current.name),
            });
        }

        if visited.contains(&current_id) {
            return Ok(());
        }

        path.push(current.clone());

        // 同一服务可能有多个注册，全部纳入检查
        for node in graph.iter().filter(|n| n.service.same_type(current)) {
            for dependency in &node.dependencies {
                self.dfs_check(dependency, graph, visited, path)?;
            }
        }

        path.pop();
        visited.insert(current_id);

        Ok(())
    }
}
