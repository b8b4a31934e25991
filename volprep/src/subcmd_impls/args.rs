use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "volprep")]
#[command(about = "将CT体数据及其标签切块、分batch，并由batch恢复体数据的工具集.")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// 子命令。
    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    pub fn run_program(&mut self) -> anyhow::Result<()> {
        match self.command {
            Commands::Prepare(ref mut v) => v.run(),
            Commands::Recover(ref mut v) => v.run(),
            Commands::Window(ref mut v) => v.run(),
            Commands::Verify(ref mut v) => v.run(),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 将一对npy图像与标签预处理为训练/验证batch。
    Prepare(crate::subcmd_impls::prepare::Prepare),
    /// 由batch文件恢复体数据。
    Recover(crate::subcmd_impls::recover::Recover),
    /// 按照给定的CT窗位和窗宽规范化npy文件，可选地输出每层的灰度图。
    Window(crate::subcmd_impls::window::Window),
    /// 自动验证切块与恢复互为逆运算。
    Verify(crate::subcmd_impls::verify::Verify),
}
