/// tinyprep ライブラリ
///
/// Tinyマッピングテーブルを (from, to) ペアへ射影し、リファレンスjarで
/// 欠けたエントリを補完したマッピングツリーを作る

pub mod model;
pub mod error;
pub mod tiny;
pub mod project;

// リファレンスjar側（構造解析と走査）
pub mod classfile;
pub mod jar;
pub mod augment;

// 下流の書き換えエンジンへの受け渡し
pub mod rewrite;
