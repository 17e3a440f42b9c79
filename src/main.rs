use anyhow::{bail, Result};
use batch_keyword_check::models::KeywordSetCreate;
use batch_keyword_check::orchestrator::ActionOutcome;
use batch_keyword_check::render::{self, match_report};
use batch_keyword_check::services::FileContent;
use batch_keyword_check::utils::logging;
use batch_keyword_check::workflow::NoticeLevel;
use batch_keyword_check::{App, Batch, Config, MatchData, Stage};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "kwcheck")]
#[command(author, version, about = "批次清洗与关键词检查")]
struct Cli {
    /// TOML 配置文件（环境变量优先）
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// 显示详细日志
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 列出所有批次（最新的在前）和关键词组
    Batches,

    /// 查看单个批次
    Batch { batch_id: i64 },

    /// 查看文件内容
    Content {
        batch_id: i64,
        /// 阶段: original / cleaned1 / cleaned2
        stage: Stage,
        file_id: i64,
        /// 输出 HTML 标记
        #[arg(long)]
        markup: bool,
    },

    /// 执行二次清洗
    Clean2 { batch_id: i64 },

    /// 列出关键词组
    Sets,

    /// 查看关键词组
    Set { keyword_set_id: i64 },

    /// 创建关键词组
    CreateSet {
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        description: Option<String>,
        /// 关键词（可多次指定）
        #[arg(short, long = "keyword")]
        keywords: Vec<String>,
        /// 从文件读取关键词，每行一个
        #[arg(short = 'f', long)]
        from_file: Option<PathBuf>,
    },

    /// 执行关键词检查
    Match {
        batch_id: i64,
        /// 关键词组（默认使用配置或第一个关键词组）
        #[arg(short, long)]
        set: Option<i64>,
    },

    /// 查看文件的关键词匹配结果
    Matches {
        batch_id: i64,
        file_id: i64,
        #[arg(short, long)]
        set: Option<i64>,
        /// 输出 HTML 标记
        #[arg(long)]
        markup: bool,
    },

    /// 上传文件，创建新批次
    Upload {
        #[arg(required = true, num_args = 1..)]
        files: Vec<PathBuf>,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(short, long)]
        set: Option<i64>,
    },

    /// 在本地扫描二次清洗后的 JSON 文件
    Scan {
        file: PathBuf,
        #[arg(short, long)]
        set: Option<i64>,
        /// 关键词（可多次指定，优先于关键词组）
        #[arg(short, long = "keyword")]
        keywords: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 加载配置
    let config = Config::load(cli.config.as_deref())?;

    // 初始化日志
    logging::init(cli.verbose || config.verbose_logging);

    let mut app = App::initialize(config)?;
    run(&mut app, cli.command).await
}

async fn run(app: &mut App, command: Commands) -> Result<()> {
    match command {
        Commands::Batches => {
            let overview = app.overview().await?;
            if overview.batches.is_empty() {
                println!("暂无批次");
            }
            for batch in &overview.batches {
                print_batch(batch);
            }
            println!();
            for set in &overview.keyword_sets {
                println!("{}", set);
            }
        }
        Commands::Batch { batch_id } => {
            let batch = app.batch(batch_id).await?;
            print_batch(&batch);
            for stage in Stage::ALL {
                for file in batch.files(stage) {
                    println!("  [{}] #{} {}", stage.label(), file.id, file.filename);
                }
            }
        }
        Commands::Content {
            batch_id,
            stage,
            file_id,
            markup,
        } => {
            let content = app.file_content(batch_id, stage, file_id).await?;
            match (&content, markup) {
                (FileContent::Structured { value, .. }, true) => {
                    println!("{}", render::render_document(value))
                }
                (FileContent::Raw(text), true) => {
                    println!("<pre>{}</pre>", render::escape_html(text))
                }
                (_, false) => println!("{}", content.to_plain_text()),
            }
        }
        Commands::Clean2 { batch_id } => {
            let outcome = app.run_second_cleaning(batch_id).await;
            report_outcome(&outcome)?;
        }
        Commands::Sets => {
            let sets = app.keyword_sets().await?;
            if sets.is_empty() {
                println!("暂无关键词组");
            }
            for set in &sets {
                println!("{}", set);
            }
        }
        Commands::Set { keyword_set_id } => {
            let set = app.keyword_set(keyword_set_id).await?;
            println!("{}", set);
            if let Some(description) = &set.description {
                println!("{}", description);
            }
            for keyword in &set.keywords {
                println!("  {}", keyword);
            }
        }
        Commands::CreateSet {
            name,
            description,
            keywords,
            from_file,
        } => {
            let request = match from_file {
                Some(path) => {
                    let text = tokio::fs::read_to_string(&path).await?;
                    KeywordSetCreate::from_lines(name, description, &text)?
                }
                None => KeywordSetCreate::new(name, description, keywords)?,
            };
            let created = app.create_keyword_set(&request).await?;
            println!("✓ 已创建关键词组 {}", created);
        }
        Commands::Match { batch_id, set } => {
            let outcome = app.run_keyword_match(batch_id, set).await;
            report_outcome(&outcome)?;
        }
        Commands::Matches {
            batch_id,
            file_id,
            set,
            markup,
        } => {
            let report = app.file_matches(batch_id, file_id, set).await?;
            if markup {
                println!("{}", match_report::to_markup(&report));
            } else {
                print!("{}", match_report::to_text(&report));
            }
        }
        Commands::Upload {
            files,
            description,
            set,
        } => {
            let batch = app.upload(&files, description.as_deref(), set).await?;
            println!("✓ 上传完成");
            print_batch(&batch);
        }
        Commands::Scan {
            file,
            set,
            keywords,
        } => {
            let data = app.scan_local_file(&file, set, keywords).await?;
            print_scan(&data);
        }
    }
    Ok(())
}

fn print_batch(batch: &Batch) {
    let id = batch
        .id
        .map(|id| format!("#{}", id))
        .unwrap_or_else(|| "(未保存)".to_string());
    let time = batch
        .timestamp
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default();
    let actions = batch.actions();

    println!(
        "{} {} {} | 原始 {} / 初次清洗 {} / 二次清洗 {}{}{}",
        id,
        time,
        batch.description_or_default(),
        batch.original_files.len(),
        batch.cleaned_files_1.len(),
        batch.cleaned_files_2.len(),
        if actions.run_second_cleaning {
            " | 可执行二次清洗"
        } else {
            ""
        },
        if actions.run_keyword_match {
            " | 可执行关键词检查"
        } else {
            ""
        },
    );
}

fn print_scan(data: &MatchData) {
    println!(
        "设备厂商: {} | 匹配: {} 处",
        data.vendor.as_deref().unwrap_or("unknown"),
        data.total_matches()
    );
    for (section, matches) in &data.matches {
        println!("\n[{}]", section);
        for m in matches {
            println!("  第 {:>4} 行 | {:<16} | {}", m.line, m.keyword, m.content);
        }
    }
}

fn report_outcome(outcome: &ActionOutcome) -> Result<()> {
    for notice in &outcome.notices {
        match notice.level {
            NoticeLevel::Info => println!("✓ {}", notice.message),
            NoticeLevel::Warning => eprintln!("⚠️ {}", notice.message),
            NoticeLevel::Error => eprintln!("❌ {}", notice.message),
        }
    }
    if outcome.has_failures() {
        bail!("操作未完成");
    }
    Ok(())
}
