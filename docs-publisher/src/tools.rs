//! Wires configured commands to process-backed tools.

use anyhow::{bail, Result};
use docs_publisher_core::config::PipelineConfig;
use docs_publisher_core::contract::{ProcessTool, Toolchain};

/// Splits `["bundle", "exec", "jekyll"]` into a program and its fixed args.
fn command_tool(what: &str, command: &[String]) -> Result<ProcessTool> {
    let Some((program, args)) = command.split_first() else {
        bail!("{what} command is empty");
    };
    Ok(ProcessTool::new(program.as_str()).with_base_args(args.iter().cloned()))
}

pub fn process_toolchain(config: &PipelineConfig) -> Result<Toolchain> {
    Ok(Toolchain {
        git: Box::new(ProcessTool::new("git")),
        build: Box::new(command_tool("build shell", &config.build.shell)?),
        site: Box::new(command_tool("site generator", &config.site.generator)?),
        remote: Box::new(ProcessTool::new("aws")),
    })
}
