//! 服务激活抽象
//!
//! 提供服务实例的类型擦除、构造注入与接口转换支持

use crate::resolver::ServiceResolver;
use infrastructure_common::{DependencyResult, TypeInfo};
use std::any::Any;
use std::sync::Arc;

/// 类型擦除的服务实例
///
/// 内部保存的是 `Arc<S>`，其中 `S` 为服务类型（可以是 trait 对象）
pub type ServiceInstance = Arc<dyn Any + Send + Sync>;

/// 服务激活器
pub type Activator =
    Arc<dyn Fn(&dyn ServiceResolver) -> DependencyResult<ServiceInstance> + Send + Sync>;

/// 擦除服务实例的具体类型
pub fn erase<S>(service: Arc<S>) -> ServiceInstance
where
    S: ?Sized + Send + Sync + 'static,
{
    Arc::new(service)
}

/// 还原服务实例
pub fn downcast_instance<S>(instance: &ServiceInstance) -> Option<Arc<S>>
where
    S: ?Sized + Send + Sync + 'static,
{
    instance.downcast_ref::<Arc<S>>().cloned()
}

/// 可注入服务 trait
///
/// 通过服务解析器获取依赖并构造实例，相当于构造函数注入
pub trait Injectable: Sized + Send + Sync + 'static {
    /// 创建服务实例
    fn inject(resolver: &dyn ServiceResolver) -> DependencyResult<Self>;

    /// 获取依赖类型列表
    fn dependencies() -> Vec<TypeInfo> {
        Vec::new()
    }
}

/// 实现关系 trait
///
/// 表示 `Self` 可以作为服务 `S` 提供。每个类型都实现了其自身，
/// trait 对象服务通过 [`implements!`](crate::implements) 宏声明。
pub trait Implements<S: ?Sized>: Send + Sync + 'static {
    /// 转换为服务类型
    fn upcast(self: Arc<Self>) -> Arc<S>;
}

impl<T: Send + Sync + 'static> Implements<T> for T {
    fn upcast(self: Arc<Self>) -> Arc<T> {
        self
    }
}

/// 声明实现类型可以作为 trait 对象服务提供
///
/// ```ignore
/// trait Greeter: Send + Sync {}
/// struct EnglishGreeter;
/// impl Greeter for EnglishGreeter {}
///
/// implements!(EnglishGreeter => dyn Greeter);
/// ```
#[macro_export]
macro_rules! implements {
    ($implementation:ty => $($service:ty),+ $(,)?) => {
        $(
            impl $crate::Implements<$service> for $implementation {
                fn upcast(self: ::std::sync::Arc<Self>) -> ::std::sync::Arc<$service> {
                    self
                }
            }
        )+
    };
}

/// 创建按实现类型构造的激活器
pub fn type_activator<S, I>() -> Activator
where
    S: ?Sized + Send + Sync + 'static,
    I: Injectable + Implements<S>,
{
    Arc::new(|resolver: &dyn ServiceResolver| -> DependencyResult<ServiceInstance> {
        let instance = Arc::new(I::inject(resolver)?);
        Ok(erase::<S>(<I as Implements<S>>::upcast(instance)))
    })
}

/// 创建由工厂函数构造的激活器
pub fn factory_activator<S, F>(factory: F) -> Activator
where
    S: ?Sized + Send + Sync + 'static,
    F: Fn(&dyn ServiceResolver) -> DependencyResult<Arc<S>> + Send + Sync + 'static,
{
    Arc::new(move |resolver: &dyn ServiceResolver| factory(resolver).map(erase::<S>))
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Counter: Send + Sync {
        fn count(&self) -> usize;
    }

    struct FixedCounter(usize);

    impl Counter for FixedCounter {
        fn count(&self) -> usize {
            self.0
        }
    }

    crate::implements!(FixedCounter => dyn Counter);

    #[test]
    fn test_erase_and_downcast_trait_object() {
        let counter: Arc<dyn Counter> = <FixedCounter as Implements<dyn Counter>>::upcast(
            Arc::new(FixedCounter(3)),
        );
        let instance = erase(counter.clone());

        let restored = downcast_instance::<dyn Counter>(&instance).unwrap();
        assert_eq!(restored.count(), 3);
        assert!(Arc::ptr_eq(&counter, &restored));
        assert!(downcast_instance::<FixedCounter>(&instance).is_none());
    }

    #[test]
    fn test_identity_upcast() {
        let counter = Arc::new(FixedCounter(7));
        let same: Arc<FixedCounter> = <FixedCounter as Implements<FixedCounter>>::upcast(counter.clone());
        assert!(Arc::ptr_eq(&counter, &same));
    }
}
