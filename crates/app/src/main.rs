#![cfg_attr(target_os = "windows", windows_subsystem = "windows")]
// 非 Windows 平台只编译状态机和测试
#![cfg_attr(not(target_os = "windows"), allow(dead_code))]

mod command;
mod engine;
mod watcher;

#[cfg(target_os = "windows")]
mod dock;
#[cfg(target_os = "windows")]
mod tray;

#[cfg(test)]
mod fakes;

use anyhow::Result;
use dockbar_core::config::DockConfig;
use std::net::TcpListener;

const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// 使用 TCP 端口锁实现单实例检测
fn try_lock_single_instance() -> bool {
    match TcpListener::bind("127.0.0.1:57833") {
        Ok(listener) => {
            // 泄露监听器，进程退出前一直持有端口
            Box::leak(Box::new(listener));
            true
        }
        Err(_) => false,
    }
}

fn inner_main() -> Result<()> {
    if !try_lock_single_instance() {
        log::warn!("DockBar 已在运行中，退出");
        return Ok(());
    }

    // 配置损坏时退回默认值继续运行
    let config = match DockConfig::load() {
        Ok(config) => config,
        Err(e) => {
            log::error!("加载配置失败，使用默认配置: {:#}", e);
            DockConfig::default()
        }
    };
    log::info!("配置已加载: {:?}", config);

    #[cfg(target_os = "windows")]
    {
        // 创建 Dock 窗口 + 托盘 + 消息循环（阻塞）
        dock::run(config)?;
    }

    #[cfg(not(target_os = "windows"))]
    {
        log::error!("DockBar 仅支持 Windows，当前平台不会创建窗口");
        drop(config);
    }

    log::info!("DockBar 已退出");
    Ok(())
}

fn main() {
    let temp_dir = std::env::temp_dir();
    let run_log_path = temp_dir.join("dockbar_run.log");
    let err_log_path = temp_dir.join("dockbar_fatal_err.log");

    // 隐藏窗口运行时没有控制台，日志写到临时目录
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    builder.format_timestamp_millis();
    if let Ok(log_file) = std::fs::File::create(&run_log_path) {
        builder.target(env_logger::Target::Pipe(Box::new(log_file)));
    }
    builder.init();

    log::info!("DockBar v{} 启动中...", APP_VERSION);

    if let Err(e) = inner_main() {
        log::error!("致命错误导致应用退出: {:?}", e);
        std::fs::write(&err_log_path, format!("{:?}", e)).ok();
    }
}
