// ==========================================
// 仓储异常检测引擎 - 命令行入口
// ==========================================
// analyze   : 记录文件 + 配置（文件或配置库）→ JSON 报告
// defaults  : 输出默认配置
// init-store: 将配置写入配置库
// ==========================================

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn};
use warehouse_rule_engine::config::default_store_path;
use warehouse_rule_engine::i18n::{resolve_locale, t_with_args};
use warehouse_rule_engine::importer::load_records_async;
use warehouse_rule_engine::{logging, ConfigStore, EngineConfig, RuleEngine};

#[derive(Parser, Debug)]
#[command(name = "warehouse-rule-engine", version, about = "仓储异常检测规则引擎")]
struct Cli {
    /// 以 JSON 行格式输出日志
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 分析一份库存快照
    Analyze {
        /// 记录文件（.csv / .xlsx / .xls）
        #[arg(long)]
        records: PathBuf,

        /// 配置文件（JSON）；与 --store 互斥
        #[arg(long, conflicts_with = "store")]
        config: Option<PathBuf>,

        /// 配置库路径（SQLite）
        #[arg(long)]
        store: Option<PathBuf>,

        /// 报告输出路径（缺省输出到 stdout）
        #[arg(long)]
        output: Option<PathBuf>,

        /// 语言（zh-CN / en）
        #[arg(long)]
        locale: Option<String>,
    },

    /// 输出默认配置
    Defaults {
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// 将配置写入配置库
    InitStore {
        /// 配置文件（缺省写入默认配置）
        #[arg(long)]
        config: Option<PathBuf>,

        /// 配置库路径（缺省为用户数据目录）
        #[arg(long)]
        store: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    if cli.json_logs {
        logging::init_json();
    } else {
        logging::init();
    }

    info!(
        "{} v{}",
        warehouse_rule_engine::APP_NAME,
        warehouse_rule_engine::VERSION
    );

    match cli.command {
        Command::Analyze {
            records,
            config,
            store,
            output,
            locale,
        } => analyze(records, config, store, output, locale).await,
        Command::Defaults { output } => {
            let json = EngineConfig::default().to_json_pretty()?;
            write_output(output, &json)
        }
        Command::InitStore { config, store } => {
            let config = match config {
                Some(path) => EngineConfig::from_json_file(&path)
                    .with_context(|| format!("读取配置文件失败: {}", path.display()))?,
                None => EngineConfig::default(),
            };
            config.validate()?;
            let path = store.unwrap_or_else(default_store_path);
            let store = ConfigStore::new(&path.to_string_lossy())
                .with_context(|| format!("打开配置库失败: {}", path.display()))?;
            store.save_engine_config(&config)?;
            info!(path = %path.display(), rules = config.rules.len(), "配置已写入配置库");
            Ok(())
        }
    }
}

async fn analyze(
    records: PathBuf,
    config: Option<PathBuf>,
    store: Option<PathBuf>,
    output: Option<PathBuf>,
    locale: Option<String>,
) -> Result<()> {
    let mut engine_config = match (config, store) {
        (Some(path), _) => EngineConfig::from_json_file(&path)
            .with_context(|| format!("读取配置文件失败: {}", path.display()))?,
        (None, Some(path)) => load_from_store(&path).await?,
        (None, None) => {
            let path = default_store_path();
            if path.exists() {
                load_from_store(&path).await?
            } else {
                info!("未指定配置，使用默认规则目录");
                EngineConfig::default()
            }
        }
    };
    if locale.is_some() {
        engine_config.settings.locale = locale;
    }

    let loaded = load_records_async(records.clone())
        .await
        .with_context(|| format!("载入记录失败: {}", records.display()))?;
    for rejected in &loaded.rejected_rows {
        warn!(row = rejected.row_number, reason = %rejected.message, "行已跳过");
    }

    let engine = RuleEngine::new(engine_config)?;
    let report = engine.evaluate_all(loaded.records).await?;

    info!(
        "{}",
        t_with_args(
            resolve_locale(engine.config().settings.locale.as_deref()),
            "cli.analysis_done",
            &[
                ("anomalies", &report.anomalies.len().to_string()),
                ("warnings", &report.warnings.len().to_string()),
            ],
        )
    );

    let json = serde_json::to_string_pretty(&report)?;
    write_output(output, &json)
}

async fn load_from_store(path: &std::path::Path) -> Result<EngineConfig> {
    let store = ConfigStore::new(&path.to_string_lossy())
        .with_context(|| format!("打开配置库失败: {}", path.display()))?;
    let engine = RuleEngine::from_source(&store).await?;
    Ok(engine.config().clone())
}

fn write_output(output: Option<PathBuf>, content: &str) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(&path, content)
                .with_context(|| format!("写入输出失败: {}", path.display()))?;
            info!(path = %path.display(), "输出已写入");
        }
        None => println!("{}", content),
    }
    Ok(())
}
