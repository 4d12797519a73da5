//! Market bar collector CLI.

use std::sync::Arc;
use std::time::Instant;

use clap::{Parser, Subcommand};
use market_collector::{modules, CollectorConfig};
use market_core::{crate_filter, init_logging, parse_compact_date, LogConfig, LogFormat, Progress};

#[derive(Parser)]
#[command(name = "market-collector")]
#[command(about = "Daily-to-periodic stock bar collector", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 로그 레벨 (trace, debug, info, warn, error). 생략 시 RUST_LOG 또는 info
    #[arg(long)]
    log_level: Option<String>,

    /// 로그 형식 (pretty, json, compact). 생략 시 LOG_FORMAT 또는 pretty
    #[arg(long)]
    log_format: Option<LogFormat>,
}

#[derive(Subcommand)]
enum Commands {
    /// 전체 파이프라인 실행 (일봉 수집 → 주기봉 생성 → 적재 → 통계 갱신)
    Run {
        /// 특정 종목만 수집 (쉼표로 구분, 예: "000001.SZ,600000.SH")
        #[arg(long)]
        symbols: Option<String>,

        /// 수집 시작일 (YYYYMMDD)
        #[arg(long)]
        start_date: Option<String>,

        /// 수집 종료일 (YYYYMMDD)
        #[arg(long)]
        end_date: Option<String>,
    },

    /// 대상 테이블 생성
    InitSchema,

    /// 대상 테이블 통계 갱신 (ANALYZE)
    Analyze,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();

    // 로깅 초기화 (RUST_LOG가 있으면 RUST_LOG 우선)
    let mut log_config = LogConfig::from_env();
    if let Some(level) = cli.log_level.as_deref() {
        log_config.level = crate_filter(level);
    }
    if let Some(format) = cli.log_format {
        log_config = log_config.with_format(format);
    }
    init_logging(log_config)?;

    tracing::info!("Market Bar Collector 시작");
    let started = Instant::now();

    // 설정 로드
    let mut config = CollectorConfig::from_env()?;
    tracing::debug!(table = %config.load.table, "설정 로드 완료");

    match cli.command {
        Commands::Run {
            symbols,
            start_date,
            end_date,
        } => {
            if let Some(date) = start_date {
                config.fetch.start_date = parse_compact_date(&date)?;
            }
            if let Some(date) = end_date {
                config.fetch.end_date = parse_compact_date(&date)?;
            }
            config.validate()?;

            tracing::info!("=== 전체 파이프라인 시작 ===");

            // 1. 일봉 수집
            tracing::info!("Step 1/3: 일봉 수집");
            let (outcome, fetch_stats) = modules::collect_daily(&config, symbols).await?;
            fetch_stats.log_summary("일봉 수집");

            // 2. 주기봉 생성
            tracing::info!("Step 2/3: 주기봉 생성");
            let progress = Arc::new(Progress::new("주기봉 생성", outcome.series.len() as u64));
            let (rows, build_stats) = modules::build_rows(outcome.series, Arc::clone(&progress)).await?;
            progress.finish();
            build_stats.log_summary("주기봉 생성");

            // 3. 적재
            tracing::info!("Step 3/3: 적재");
            let (_, load_stats) = modules::upload_bars(&config, rows).await?;
            load_stats.log_summary("적재");

            tracing::info!("=== 전체 파이프라인 완료 ===");
        }
        Commands::InitSchema => {
            modules::init_schema(&config).await?;
            tracing::info!(table = %config.load.table, "테이블 준비 완료");
        }
        Commands::Analyze => {
            modules::analyze_table(&config).await?;
        }
    }

    tracing::info!(
        elapsed = format!("{:.1}s", started.elapsed().as_secs_f64()),
        "Market Bar Collector 종료"
    );

    Ok(())
}
