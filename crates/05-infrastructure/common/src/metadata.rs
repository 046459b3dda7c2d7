//! 元数据定义
//!
//! 提供服务类型的元数据信息

use serde::Serialize;
use std::any::TypeId;
use std::fmt;

/// 类型信息
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TypeInfo {
    /// 类型名称
    pub name: String,
    /// 类型ID，按名称创建的类型信息没有类型ID
    #[serde(skip)]
    pub id: Option<TypeId>,
    /// 完整类型名称
    pub full_name: String,
}

impl TypeInfo {
    /// 创建新的类型信息
    pub fn new(type_id: TypeId, full_name: impl Into<String>) -> Self {
        let full_name = full_name.into();
        Self {
            name: short_type_name(&full_name).to_string(),
            id: Some(type_id),
            full_name,
        }
    }

    /// 从类型获取类型信息
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::new(TypeId::of::<T>(), std::any::type_name::<T>())
    }

    /// 从类型名称创建类型信息（用于配置）
    pub fn from_name(name: &str) -> Self {
        Self {
            name: short_type_name(name).to_string(),
            id: None,
            full_name: name.to_string(),
        }
    }

    /// 是否已解析为具体类型
    pub fn is_resolved(&self) -> bool {
        self.id.is_some()
    }

    /// 获取简短的类型名称（不包含模块路径）
    pub fn short_name(&self) -> &str {
        &self.name
    }

    /// 是否与另一个类型信息指向同一类型
    pub fn same_type(&self, other: &TypeInfo) -> bool {
        matches!((self.id, other.id), (Some(a), Some(b)) if a == b)
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name)
    }
}

// `dyn a::B` 与 `a::b::C<d::E>` 都只保留最外层类型的名称
fn short_type_name(full_name: &str) -> &str {
    let head = full_name.split('<').next().unwrap_or(full_name);
    let head = head.strip_prefix("dyn ").unwrap_or(head);
    head.rsplit("::").next().unwrap_or(head)
}
