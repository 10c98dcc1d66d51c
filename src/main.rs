use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use tinyprep::augment::{augment, source_tag};
use tinyprep::jar::JarClasses;
use tinyprep::project::project;
use tinyprep::rewrite::{RewriteEngine, TinyWriter};
use tinyprep::tiny::parse_tiny;

/// Tinyマッピングの射影とリファレンスjarによる補完
#[derive(Debug, Parser)]
#[command(name = "tinyprep")]
struct Cli {
    /// 書き換え対象のソースディレクトリ
    input_dir: PathBuf,

    /// 出力ディレクトリ（無ければ作成される）
    output_dir: PathBuf,

    /// Tiny v1マッピングファイル
    mapping_file: PathBuf,

    /// 射影元ネームスペース
    from_namespace: String,

    /// 射影先ネームスペース
    to_namespace: String,

    /// 書き換えエンジンに渡すクラスパスエントリ
    classpath: Vec<PathBuf>,

    /// パッケージ無しのリネーム先クラス名に none/ を前置する
    #[arg(long = "appendnone")]
    append_none: bool,

    /// リファレンスjarと、合成名に埋め込むタグの種
    #[arg(long = "gamejar", num_args = 2, value_names = ["JAR", "TAG_SEED"])]
    game_jar: Option<Vec<String>>,

    /// 完成したツリーをJSONで書き出す（デバッグ用）
    #[arg(long = "dump-json", value_name = "FILE")]
    dump_json: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let cli = Cli::try_parse().unwrap_or_else(|e| {
        use clap::error::ErrorKind;
        // --help / --version は正常終了、使い方の誤りは終了コード1
        if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) {
            e.exit();
        }
        let _ = e.print();
        process::exit(1);
    });

    run(cli)
}

fn run(cli: Cli) -> Result<()> {
    let text = std::fs::read_to_string(&cli.mapping_file)
        .with_context(|| format!("failed to read mapping file {}", cli.mapping_file.display()))?;
    let table = parse_tiny(&text)?;

    let mut tree = project(&table, &cli.from_namespace, &cli.to_namespace, cli.append_none)?;
    info!(
        "projected {} classes from '{}' to '{}'",
        tree.len(),
        cli.from_namespace,
        cli.to_namespace
    );

    if let Some(game_jar) = &cli.game_jar {
        let jar_path = PathBuf::from(&game_jar[0]);
        let tag = source_tag(&game_jar[1]);

        info!("checking against reference jar {}...", jar_path.display());
        let classes = JarClasses::open(&jar_path)?;
        augment(&mut tree, classes, &tag, cli.append_none)?;
        info!("tree holds {} classes after augmentation", tree.len());
    }

    if let Some(dump_path) = &cli.dump_json {
        let file = std::fs::File::create(dump_path)
            .with_context(|| format!("failed to create {}", dump_path.display()))?;
        serde_json::to_writer_pretty(file, &tree)?;
        info!("dumped mapping tree to {}", dump_path.display());
    }

    info!("handing off to the rewriter...");
    let writer = TinyWriter::new(&cli.from_namespace, &cli.to_namespace);
    writer.rewrite(&tree, &cli.input_dir, &cli.classpath, &cli.output_dir)?;

    Ok(())
}
