//! Molchat - 分子结构查看器对话控制
//!
//! 入口：加载配置、初始化日志、创建无界面引擎与会话，运行逐行读取 stdin 的交互循环。
//! 用法：`molchat [--config <file>] [structure.pdb]`

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use molchat::config::{load_config, AppConfig};
use molchat::core::SessionBuilder;
use molchat::observability;
use molchat::selection::TrackerConfig;
use molchat::viewer::{HeadlessEngine, ViewerController};
use tokio::io::{AsyncBufReadExt, BufReader};

const USAGE: &str = "Commands: /load <path>, /select <chain> <residue>, /click <atom>, /clear, /status, /verify, /quit. Anything else is sent to the viewer.";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init();

    let mut config_path: Option<PathBuf> = None;
    let mut initial: Option<String> = None;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                config_path = Some(args.next().context("--config requires a file path")?.into())
            }
            _ => initial = Some(arg),
        }
    }

    let cfg = load_config(config_path).unwrap_or_else(|e| {
        tracing::warn!("Config load failed ({}), using defaults", e);
        AppConfig::default()
    });

    let engine = Arc::new(HeadlessEngine::new());
    let controller = Arc::new(ViewerController::new(
        engine.clone(),
        TrackerConfig::from(&cfg.selection),
    ));
    let mut session = SessionBuilder::new(cfg).build(controller.clone());

    let status = session.api_key_status();
    println!(
        "molchat ready (AI assistant: {}, key source: {:?}). {}",
        if session.has_assistant() { "on" } else { "off" },
        status.source,
        USAGE
    );

    if let Some(path) = initial {
        match session.load_structure(&path, None).await {
            Ok(()) => println!("Loaded {path}."),
            Err(e) => println!("Could not load {path}: {e}"),
        }
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let mut parts = line.split_whitespace();
        match parts.next() {
            Some("/quit") | Some("/exit") => break,
            Some("/help") => println!("{USAGE}"),
            Some("/load") => match parts.next() {
                Some(path) => match session.load_structure(path, None).await {
                    Ok(()) => println!("Loaded {path}."),
                    Err(e) => println!("Could not load {path}: {e}"),
                },
                None => println!("Usage: /load <path>"),
            },
            Some("/select") => {
                let chain = parts.next().unwrap_or("A");
                match parts.next().and_then(|n| n.parse::<i32>().ok()) {
                    Some(number) => engine.select_residue(chain, number),
                    None => println!("Usage: /select <chain> <residue>"),
                }
            }
            Some("/click") => {
                let atom = parts.next().and_then(|n| n.parse::<usize>().ok());
                engine.click(atom);
            }
            Some("/clear") => engine.clear_selection(),
            Some("/status") => {
                let status = session.api_key_status();
                println!(
                    "AI assistant: {} | key present: {} | key valid: {} | source: {:?} | messages: {}",
                    if session.has_assistant() { "on" } else { "off" },
                    status.present,
                    status.valid,
                    status.source,
                    session.log().len()
                );
                match controller.tracker().current() {
                    Some(info) => println!("Selection: {}", info.description),
                    None => println!("Selection: none"),
                }
            }
            Some("/verify") => match session.verify_api_key().await {
                Ok(()) => println!("API key OK."),
                Err(e) => println!("{e}"),
            },
            _ => match session.handle_input(line).await {
                Ok(reply) => println!("{}", reply.text),
                Err(e) => println!("{e}"),
            },
        }
    }

    controller.shutdown();
    Ok(())
}
