use clap::Parser;
use handtable::{cli, client, config, display, doctor, error, export, workflow};
use cli::{Cli, Commands};
use client::HttpBackend;
use config::Config;
use error::{HandtableError, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("handtable=debug,handtable_common=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("  {spinner} {msg} ({elapsed})") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

fn output_dir(output: Option<PathBuf>, config: &Config) -> PathBuf {
    output
        .or_else(|| config.output_dir.clone())
        .unwrap_or_else(|| PathBuf::from("."))
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        match &e {
            HandtableError::Ui(ui) => eprint!("\n{}", display::render_error(ui)),
            other => eprintln!("\n✖ {}", other),
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    // 壊れた設定ファイルでも config コマンドだけは実行できる
    let mut config = if matches!(cli.command, Commands::Config { .. }) {
        Config::load_for_repair()?
    } else {
        Config::load()?
    };
    if let Some(url) = cli.backend_url {
        config.backend_url = url;
    }

    if let Commands::Config { set_backend_url, show } = cli.command {
        if let Some(url) = set_backend_url {
            config.set_backend_url(url)?;
            println!("✔ バックエンドURLを設定しました");
        }

        if show {
            println!("設定:");
            println!("  設定ファイル: {}", Config::config_path()?.display());
            println!("  バックエンドURL: {}", config.backend_url);
            println!("  抽出タイムアウト: {}秒", config.extract_timeout_secs);
            println!("  出力タイムアウト: {}秒", config.export_timeout_secs);
            println!(
                "  出力先: {}",
                config
                    .output_dir
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "カレントディレクトリ".into())
            );
        }
        return Ok(());
    }

    config.validate()?;
    let backend = HttpBackend::new(&config)?;

    match cli.command {
        Commands::Extract { image, json } => {
            println!("📋 handtable - 表の抽出\n");

            println!("[1/2] 画像を読み込み中...");
            let session = workflow::new_session();
            workflow::select_image(&session, &image)?;
            println!("✔ {}\n", image.display());

            println!("[2/2] 表を抽出中...");
            let pb = spinner("AIが表を解析しています");
            let result = workflow::extract(&session, &backend).await;
            pb.finish_and_clear();
            let extraction = result?;
            println!("✔ 抽出完了\n");

            print!("{}", display::render_table(&extraction.table));
            println!("\n処理ID: {}", extraction.processing_id);

            if let Some(json_path) = json {
                let file_name = session
                    .borrow()
                    .image()
                    .map(|img| img.file_name.clone())
                    .unwrap_or_default();
                let payload = serde_json::json!({
                    "file_name": file_name,
                    "processing_id": extraction.processing_id,
                    "table_data": extraction.table,
                });
                std::fs::write(&json_path, serde_json::to_string_pretty(&payload)?)?;
                println!("✔ 結果を保存: {}", json_path.display());
            }

            println!("\n✅ 抽出完了（Excel出力: handtable export {}）", extraction.processing_id);
        }

        Commands::Export { processing_id, name, output } => {
            println!("📄 handtable - Excel出力\n");

            let session = workflow::resume(&backend, &processing_id, name).await?;
            let sink = export::DiskSink::new(output_dir(output, &config));

            let pb = spinner("Excelをダウンロードしています");
            let result = workflow::export(&session, &backend, &sink).await;
            pb.finish_and_clear();
            let path = result?;

            println!("✔ Excel出力: {}", path.display());
            println!("\n✅ 出力完了");
        }

        Commands::Run { image, output } => {
            println!("🚀 handtable - 一括処理\n");

            println!("[1/3] 画像を読み込み中...");
            let session = workflow::new_session();
            workflow::select_image(&session, &image)?;
            println!("✔ {}\n", image.display());

            println!("[2/3] 表を抽出中...");
            let pb = spinner("AIが表を解析しています");
            let result = workflow::extract(&session, &backend).await;
            pb.finish_and_clear();
            let extraction = result?;
            println!("✔ 抽出完了\n");
            print!("{}", display::render_table(&extraction.table));
            println!();

            println!("[3/3] Excelをダウンロード中...");
            let sink = export::DiskSink::new(output_dir(output, &config));
            let pb = spinner("Excelを生成しています");
            let result = workflow::export(&session, &backend, &sink).await;
            pb.finish_and_clear();
            let path = result?;
            println!("✔ Excel出力: {}", path.display());

            println!("\n✅ 完了");
        }

        Commands::Health => {
            let health = backend.health().await?;
            println!("バックエンド: {}", backend.base_url());
            println!("  状態: {}", health.status);
            println!("  {}", health.message);
        }

        Commands::History { limit } => {
            let records = backend.list_extractions().await?;
            if records.is_empty() {
                println!("抽出履歴はありません");
            }
            for record in records.iter().take(limit) {
                println!("{}", display::render_record(record));
            }
        }

        Commands::Doctor => {
            println!("🔍 handtable - 接続診断\n");
            let checks = doctor::run_checks(&config, &backend).await;
            for check in &checks {
                let mark = if check.ok { "✔" } else { "✖" };
                println!("{} {}: {}", mark, check.name, check.detail);
            }

            if checks.iter().all(|c| c.ok) {
                println!("\n✅ すべて正常です");
            } else {
                println!("\n💡 対処方法:");
                println!("  1. バックエンドサーバーを起動・再起動する");
                println!("  2. バックエンドのコンソールでエラーを確認する");
                println!("  3. `handtable config --set-backend-url URL` で接続先を確認する");
            }
        }

        Commands::Config { .. } => {}
    }

    Ok(())
}
