//! 示例领域：问候服务

use di_abstractions::{implements, Injectable, ServiceResolver, ServiceResolverExt};
use infrastructure_common::{DependencyResult, TypeInfo};
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;

/// 问候语提供者
pub trait Greeter: Send + Sync {
    /// 生成问候语
    fn greet(&self, name: &str) -> String;
}

/// 英文问候
pub struct EnglishGreeter;

impl Greeter for EnglishGreeter {
    fn greet(&self, name: &str) -> String {
        format!("Hello, {name}!")
    }
}

impl Injectable for EnglishGreeter {
    fn inject(_resolver: &dyn ServiceResolver) -> DependencyResult<Self> {
        Ok(EnglishGreeter)
    }
}

implements!(EnglishGreeter => dyn Greeter);

/// 中文问候
pub struct ChineseGreeter;

impl Greeter for ChineseGreeter {
    fn greet(&self, name: &str) -> String {
        format!("你好，{name}！")
    }
}

impl Injectable for ChineseGreeter {
    fn inject(_resolver: &dyn ServiceResolver) -> DependencyResult<Self> {
        Ok(ChineseGreeter)
    }
}

implements!(ChineseGreeter => dyn Greeter);

static NEXT_REQUEST_ID: AtomicUsize = AtomicUsize::new(1);

/// 请求上下文，每个作用域一个
#[derive(Debug)]
pub struct RequestContext {
    pub request_id: usize,
}

impl Injectable for RequestContext {
    fn inject(_resolver: &dyn ServiceResolver) -> DependencyResult<Self> {
        let request_id = NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed);
        debug!("创建请求上下文: {}", request_id);
        Ok(RequestContext { request_id })
    }
}

/// 应用信息，以单例实例注册
#[derive(Debug, Clone, Serialize)]
pub struct AppInfo {
    pub name: String,
    pub version: String,
}

impl AppInfo {
    pub fn current() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// 问候服务
pub struct GreetingService {
    greeter: Arc<dyn Greeter>,
    context: Arc<RequestContext>,
    app: Arc<AppInfo>,
}

impl GreetingService {
    pub fn new(greeter: Arc<dyn Greeter>, context: Arc<RequestContext>, app: Arc<AppInfo>) -> Self {
        Self {
            greeter,
            context,
            app,
        }
    }

    /// 在当前请求中问候
    pub fn greet(&self, name: &str) -> Greeting {
        Greeting {
            request_id: self.context.request_id,
            message: self.greeter.greet(name),
            served_by: format!("{} {}", self.app.name, self.app.version),
        }
    }
}

impl Injectable for GreetingService {
    fn inject(resolver: &dyn ServiceResolver) -> DependencyResult<Self> {
        Ok(Self::new(
            resolver.resolve::<dyn Greeter>()?,
            resolver.resolve::<RequestContext>()?,
            resolver.resolve::<AppInfo>()?,
        ))
    }

    fn dependencies() -> Vec<TypeInfo> {
        vec![
            TypeInfo::of::<dyn Greeter>(),
            TypeInfo::of::<RequestContext>(),
            TypeInfo::of::<AppInfo>(),
        ]
    }
}

/// 问候结果
#[derive(Debug, Clone, Serialize)]
pub struct Greeting {
    pub request_id: usize,
    pub message: String,
    pub served_by: String,
}
