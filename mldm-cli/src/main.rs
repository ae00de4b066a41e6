//! 数据集管理命令行程序

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use mldm_admin::{init_logging, initialize_database, AdminCredentials, AuthService, LoggingConfig, Settings};
use mldm_database::{DocumentStore, MetadataStore, StoreSettings};
use mldm_dicom::DicomRecord;
use mldm_pipeline::{
    augment_folder, export_snapshot, ingest_file, ingest_folder, list_stage, split_dataset,
    stage_statistics, PipelineContext, Stage,
};
use std::path::PathBuf;
use tracing::{error, info};

/// 命令行参数
#[derive(Parser, Debug)]
#[command(name = "mldm")]
#[command(about = "医学影像机器学习数据集管理工具")]
struct Cli {
    /// 配置文件路径
    #[arg(short, long, default_value = "config.yaml", global = true)]
    config: String,

    /// 日志级别，覆盖配置文件
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 建立索引并创建默认管理员
    InitDb,
    /// 校验用户名和密码
    Login {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        password: String,
    },
    /// 导入并脱敏DICOM文件
    Ingest {
        /// 单个DICOM文件
        #[arg(long, conflicts_with = "folder")]
        file: Option<PathBuf>,
        /// 输入目录，默认为原始数据目录
        #[arg(long)]
        folder: Option<PathBuf>,
        /// 输出子目录名
        #[arg(short, long)]
        subfolder: String,
    },
    /// 生成增强图像
    Augment {
        /// 输入目录，默认为脱敏数据目录
        #[arg(long)]
        folder: Option<PathBuf>,
    },
    /// 划分训练/验证/测试集
    Split,
    /// 为增强目录创建快照
    Snapshot,
    /// 列出阶段目录中的文件
    List { stage: Stage },
    /// 阶段目录统计
    Stats { stage: Stage },
    /// 列出全部影像元数据记录
    Images,
    /// 查看DICOM文件元数据摘要
    Inspect { file: PathBuf },
}

fn main() {
    if let Err(e) = run() {
        error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let settings = Settings::load(&cli.config);

    let mut logging = settings
        .as_ref()
        .map(|s| s.logging.clone())
        .unwrap_or_else(|_| LoggingConfig::default());
    if let Some(level) = &cli.log_level {
        logging.level = level.clone();
    }
    init_logging(&logging)?;

    // 流水线命令需要有效配置
    let context = || -> Result<PipelineContext> {
        match &settings {
            Ok(s) => Ok(s.clone().into_context()),
            Err(e) => bail!("Failed to load configuration {}: {:#}", cli.config, e),
        }
    };

    match cli.command {
        Command::InitDb => {
            let mut store = open_store()?;
            let outcome = initialize_database(&mut store, &AdminCredentials::from_env())?;
            println!("{}", outcome);
            println!("Database setup complete.");
        }
        Command::Login { username, password } => {
            let store = open_store()?;
            let user = AuthService::new(&store).login(&username, &password)?;
            println!("Welcome, {} ({})", user.username, user.role);
        }
        Command::Ingest {
            file,
            folder,
            subfolder,
        } => {
            let ctx = context()?;
            let mut store = open_store()?;
            let report = match file {
                Some(file) => ingest_file(&ctx, &mut store, &file, &subfolder)?,
                None => {
                    let folder = folder.unwrap_or_else(|| ctx.layout.raw.clone());
                    ingest_folder(&ctx, &mut store, &folder, &subfolder)?
                }
            };
            println!("{}", report);
        }
        Command::Augment { folder } => {
            let ctx = context()?;
            let folder = folder.unwrap_or_else(|| ctx.layout.anonymized.clone());
            println!("{}", augment_folder(&ctx, &folder)?);
        }
        Command::Split => {
            let ctx = context()?;
            println!("{}", split_dataset(&ctx)?);
        }
        Command::Snapshot => {
            let ctx = context()?;
            println!("{}", export_snapshot(&ctx)?);
        }
        Command::List { stage } => {
            let ctx = context()?;
            for path in list_stage(&ctx.layout, stage)? {
                println!("{}", path.display());
            }
        }
        Command::Stats { stage } => {
            let ctx = context()?;
            println!("{}", stage_statistics(&ctx.layout, stage)?);
        }
        Command::Images => {
            let store = open_store()?;
            for record in store.list_images()? {
                println!(
                    "{}\t{}\t{}\t{}",
                    record.filename, record.status, record.hash, record.path
                );
            }
        }
        Command::Inspect { file } => {
            let record = DicomRecord::open(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            println!("{}", record.summary());
        }
    }

    Ok(())
}

fn open_store() -> Result<DocumentStore> {
    let settings = StoreSettings::from_env();
    info!("打开元数据存储: {:?}", settings.file_path());
    DocumentStore::open(settings).context("Failed to open metadata store")
}
