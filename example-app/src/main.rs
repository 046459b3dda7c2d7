//! # 示例应用程序
//!
//! 演示如何通过生命周期参数化的注册扩展组装服务，并在多个作用域中解析

mod greeting;
mod logging;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use di_abstractions::{ContainerStats, Injectable, ServiceResolverExt, ServiceType};
use di_extensions::ServiceCollectionExtensions;
use di_impl::{load_container_config, RegistrationSummary, ServiceCollectionImpl};
use greeting::{
    AppInfo, ChineseGreeter, EnglishGreeter, Greeter, Greeting, GreetingService, RequestContext,
};
use infrastructure_common::{DependencyResult, Lifetime};
use logging::LoggingConfig;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// 命令行参数
#[derive(Parser, Debug)]
#[command(name = "example-app")]
#[command(about = "Lorn DI 示例应用")]
struct Args {
    /// 配置文件路径（包含 [container] 节）
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 问候语言
    #[arg(long, value_enum, default_value_t = Language::En)]
    language: Language,

    /// 问候对象
    #[arg(default_values_t = vec!["Lorn".to_string()])]
    names: Vec<String>,

    /// 以 JSON 输出结果
    #[arg(long)]
    json: bool,

    /// 日志级别
    #[arg(long, default_value = "info")]
    log_level: String,

    /// 以 JSON 格式输出日志
    #[arg(long)]
    log_json: bool,
}

impl Args {
    /// 由命令行参数构造日志配置
    fn logging_config(&self) -> anyhow::Result<LoggingConfig> {
        Ok(LoggingConfig {
            level: self
                .log_level
                .parse()
                .with_context(|| format!("无效的日志级别: {}", self.log_level))?,
            json_format: self.log_json,
            ..LoggingConfig::default()
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Language {
    En,
    Zh,
}

/// JSON 输出
#[derive(Debug, Serialize)]
struct Report {
    registrations: Vec<RegistrationSummary>,
    greetings: Vec<Greeting>,
    stats: ContainerStats,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    args.logging_config()?.init()?;

    info!("启动 Lorn DI 示例应用");

    let config = load_container_config(args.config.as_deref()).context("加载容器配置失败")?;
    debug!("容器配置: {:?}", config);

    let mut services = ServiceCollectionImpl::new();
    register_services(&mut services, args.language)?;

    let provider = services
        .build_service_provider_with(config)
        .context("构建服务提供者失败")?;

    let mut greetings = Vec::new();
    for _ in 0..2 {
        let scope = provider.create_scope();
        for name in &args.names {
            let service = scope.resolve::<GreetingService>()?;
            greetings.push(service.greet(name));
        }
    }

    if args.json {
        let report = Report {
            registrations: services.summaries(),
            greetings,
            stats: provider.stats(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for greeting in &greetings {
            println!(
                "[request {}] {} ({})",
                greeting.request_id, greeting.message, greeting.served_by
            );
        }
    }

    info!("应用已退出");
    Ok(())
}

/// 注册应用服务
fn register_services(services: &mut ServiceCollectionImpl, language: Language) -> DependencyResult<()> {
    match language {
        Language::En => services.add_implementation::<dyn Greeter, EnglishGreeter>(Lifetime::Singleton),
        Language::Zh => services.add_implementation::<dyn Greeter, ChineseGreeter>(Lifetime::Singleton),
    };

    services
        .add_service_type(&ServiceType::of::<RequestContext>(), Lifetime::Scoped)?
        .add_factory::<GreetingService, _>(
            |resolver| Ok(Arc::new(GreetingService::inject(resolver)?)),
            Lifetime::Transient,
        );

    // 模块重复注册默认服务时不会覆盖已有注册
    if !services.try_add_service::<RequestContext>(Lifetime::Scoped) {
        debug!("RequestContext 已注册");
    }
    if !services.try_add_singleton_instance::<AppInfo, AppInfo>(Arc::new(AppInfo::current())) {
        debug!("AppInfo 已注册");
    }

    info!("注册服务完成");
    Ok(())
}
