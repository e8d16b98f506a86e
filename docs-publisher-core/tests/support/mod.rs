#![allow(dead_code)]

use docs_publisher_core::contract::{MockExternalTool, ToolCall, ToolOutput, Toolchain};
use docs_publisher_core::error::ToolError;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Shared, ordered log of every call made to any recording tool.
pub type CallLog = Arc<Mutex<Vec<(&'static str, ToolCall)>>>;

pub fn new_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// A mock that appends every call to `log` under `label` and answers with
/// `respond`.
pub fn recording_tool<F>(label: &'static str, log: &CallLog, respond: F) -> MockExternalTool
where
    F: Fn(&ToolCall) -> Result<ToolOutput, ToolError> + Send + 'static,
{
    let log = Arc::clone(log);
    let mut tool = MockExternalTool::new();
    tool.expect_execute().returning(move |call: ToolCall| {
        log.lock().unwrap().push((label, call.clone()));
        respond(&call)
    });
    tool
}

/// A mock that fails the test if it is ever called.
pub fn unused_tool() -> MockExternalTool {
    let mut tool = MockExternalTool::new();
    tool.expect_execute().never();
    tool
}

pub fn ok() -> Result<ToolOutput, ToolError> {
    Ok(ToolOutput::default())
}

pub fn failed(program: &str) -> Result<ToolOutput, ToolError> {
    Err(ToolError::Failed {
        program: program.to_owned(),
        code: Some(1),
        stderr: "boom".to_owned(),
    })
}

pub fn toolchain(
    git: MockExternalTool,
    build: MockExternalTool,
    site: MockExternalTool,
    remote: MockExternalTool,
) -> Toolchain {
    Toolchain {
        git: Box::new(git),
        build: Box::new(build),
        site: Box::new(site),
        remote: Box::new(remote),
    }
}

pub fn write(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

/// Lays out a library checkout the default build settings can patch, with
/// generated docs already in `build/site`.
pub fn library_checkout(root: &Path, name: &str) {
    let dir = root.join(name);
    write(&dir.join("gradle.properties"), "COMMON_SETUP=local.gradle\nGROUP=io.arrow-kt\n");
    write(&dir.join("settings.gradle"), "include ':core'\n");
    write(
        &dir.join("arrow-docs/build.gradle"),
        "repositories {\n    mavenCentral()\n}\n",
    );
    write(
        &dir.join("build/site").join(name).join("index.html"),
        &format!("<h1>{name}</h1>"),
    );
}

/// Value following `flag` in the call's arguments.
pub fn flag_value<'a>(call: &'a ToolCall, flag: &str) -> Option<&'a str> {
    call.args
        .iter()
        .position(|a| a == flag)
        .and_then(|i| call.args.get(i + 1))
        .map(String::as_str)
}
