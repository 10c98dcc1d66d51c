/// エラー型定義
///
/// 途中で失敗したら実行全体を中止する。部分的なツリーは使えない

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TinyPrepError {
    /// マッピング行に要求されたネームスペースが存在しない
    #[error("namespace '{namespace}' is not present in the mapping table (line {line})")]
    MissingNamespace { namespace: String, line: usize },

    /// リファレンスjar内のclassファイルが解析できない
    #[error("failed to read reference class '{entry}': {message}")]
    ReferenceRead { entry: String, message: String },

    /// マッピングファイルの書式不正
    #[error("malformed mapping file: {message} (line {line})")]
    MalformedTable { message: String, line: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TinyPrepError>;
