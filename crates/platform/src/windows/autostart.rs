use anyhow::{Context, Result};
use std::process::Command;

use crate::AutoStart;

/// Windows 自启动管理器（HKCU Run 注册表项，通过 reg.exe 读写）
pub struct WinAutoStart;

impl Default for WinAutoStart {
    fn default() -> Self {
        Self::new()
    }
}

impl WinAutoStart {
    pub fn new() -> Self {
        Self
    }
}

const RUN_KEY: &str = r"HKCU\Software\Microsoft\Windows\CurrentVersion\Run";
const VALUE_NAME: &str = "DockBar";

impl AutoStart for WinAutoStart {
    fn is_enabled(&self) -> bool {
        let output = Command::new("reg.exe")
            .args(["query", RUN_KEY, "/v", VALUE_NAME])
            .output();

        match output {
            Ok(o) => o.status.success(),
            Err(_) => false,
        }
    }

    fn set_enabled(&self, enabled: bool) -> Result<()> {
        if enabled {
            let exe_path = std::env::current_exe().context("获取当前程序路径失败")?;
            let exe_str = exe_path.to_str().context("程序路径转换失败")?;
            let quoted = format!("\"{}\"", exe_str);

            let output = Command::new("reg.exe")
                .args(["add", RUN_KEY, "/v", VALUE_NAME, "/t", "REG_SZ", "/d", &quoted, "/f"])
                .output()
                .context("执行 reg.exe 失败")?;

            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                anyhow::bail!("写入自启动注册表项失败: {}", stderr);
            }

            log::info!("已写入开机自启动注册表项");
        } else {
            let output = Command::new("reg.exe")
                .args(["delete", RUN_KEY, "/v", VALUE_NAME, "/f"])
                .output()
                .context("执行 reg.exe 失败")?;

            if !output.status.success() {
                log::warn!("删除自启动注册表项失败（可能不存在）");
            } else {
                log::info!("已删除开机自启动注册表项");
            }
        }

        Ok(())
    }
}
