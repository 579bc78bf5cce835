use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "handtable")]
#[command(about = "手書き表の画像から表データを抽出し、Excelとして保存するツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// バックエンドURL（設定ファイル・環境変数より優先）
    #[arg(long, global = true)]
    pub backend_url: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 画像をアップロードして表を抽出
    Extract {
        /// 手書き表の画像ファイル
        #[arg(required = true)]
        image: PathBuf,

        /// 抽出結果をJSONで保存
        #[arg(long)]
        json: Option<PathBuf>,
    },

    /// 処理IDを指定してExcelをダウンロード
    Export {
        /// 抽出時に発行された処理ID
        #[arg(required = true)]
        processing_id: String,

        /// 元画像のファイル名（省略時は履歴から検索）
        #[arg(short, long)]
        name: Option<String>,

        /// 出力ファイル/ディレクトリ
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 抽出からExcel保存まで一括実行
    Run {
        /// 手書き表の画像ファイル
        #[arg(required = true)]
        image: PathBuf,

        /// 出力ファイル/ディレクトリ
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// バックエンドの稼働確認
    Health,

    /// 最近の抽出履歴を表示
    History {
        /// 表示件数
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// 接続設定とバックエンドを診断
    Doctor,

    /// 設定を表示/編集
    Config {
        /// バックエンドURLを設定
        #[arg(long)]
        set_backend_url: Option<String>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}
