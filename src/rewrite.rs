/// 下流のソース書き換えへの受け渡し
///
/// 実際のソース書き換えは外部コラボレータの仕事。ここではその入力契約
/// （完成したツリー + 入力ディレクトリ + クラスパス + 出力ディレクトリ）
/// をトレイトとして固定し、完成テーブルを出力ディレクトリに実体化する
/// 実装を提供する

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{Result, TinyPrepError};
use crate::model::MappingTree;

/// 書き換えエンジンの入力契約
pub trait RewriteEngine {
    fn rewrite(
        &self,
        tree: &MappingTree,
        input_dir: &Path,
        classpath: &[PathBuf],
        output_dir: &Path,
    ) -> Result<()>;
}

/// 完成した2ネームスペーステーブルをTiny v1として出力する実装
pub struct TinyWriter {
    from_namespace: String,
    to_namespace: String,
}

impl TinyWriter {
    pub fn new(from_namespace: impl Into<String>, to_namespace: impl Into<String>) -> Self {
        Self {
            from_namespace: from_namespace.into(),
            to_namespace: to_namespace.into(),
        }
    }

    fn render(&self, tree: &MappingTree) -> String {
        let mut out = String::new();
        out.push_str(&format!("v1\t{}\t{}\n", self.from_namespace, self.to_namespace));
        for (from_name, mapping) in tree.classes() {
            // 名前無しのシェル（メンバー行だけで作られたクラス）はfrom名のまま出す
            let deobf = mapping.deobfuscated_name.as_deref().unwrap_or(from_name);
            out.push_str(&format!("CLASS\t{from_name}\t{deobf}\n"));
            for (sig, name) in mapping.field_mappings() {
                out.push_str(&format!(
                    "FIELD\t{from_name}\t{}\t{}\t{name}\n",
                    sig.descriptor, sig.name
                ));
            }
            for (sig, name) in mapping.method_mappings() {
                out.push_str(&format!(
                    "METHOD\t{from_name}\t{}\t{}\t{name}\n",
                    sig.descriptor, sig.name
                ));
            }
        }
        out
    }
}

impl RewriteEngine for TinyWriter {
    fn rewrite(
        &self,
        tree: &MappingTree,
        input_dir: &Path,
        classpath: &[PathBuf],
        output_dir: &Path,
    ) -> Result<()> {
        if !input_dir.is_dir() {
            return Err(TinyPrepError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("input must be a directory: {}", input_dir.display()),
            )));
        }
        if output_dir.exists() {
            if !output_dir.is_dir() {
                return Err(TinyPrepError::Io(std::io::Error::new(
                    std::io::ErrorKind::AlreadyExists,
                    format!("output must be a directory: {}", output_dir.display()),
                )));
            }
        } else {
            fs::create_dir_all(output_dir)?;
        }

        if !classpath.is_empty() {
            info!("classpath entries for the rewriter: {}", classpath.len());
        }

        let path = output_dir.join("mappings.tiny");
        let mut file = fs::File::create(&path)?;
        file.write_all(self.render(tree).as_bytes())?;
        info!("wrote completed mapping table to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Signature;

    fn sample_tree() -> MappingTree {
        let mut tree = MappingTree::new();
        let mapping = tree.get_or_create_class("a");
        mapping.set_deobfuscated_name("com/foo/Bar");
        mapping.set_field_mapping(Signature::new("b", "I"), "count");
        mapping.set_method_mapping(Signature::new("c", "()V"), "run");
        tree.get_or_create_class("q");
        tree
    }

    #[test]
    fn test_render_tiny_v1() {
        let writer = TinyWriter::new("official", "named");
        let text = writer.render(&sample_tree());

        assert_eq!(
            text,
            "v1\tofficial\tnamed\n\
             CLASS\ta\tcom/foo/Bar\n\
             FIELD\ta\tI\tb\tcount\n\
             METHOD\ta\t()V\tc\trun\n\
             CLASS\tq\tq\n"
        );
    }

    #[test]
    fn test_rendered_output_reparses() {
        let writer = TinyWriter::new("official", "named");
        let text = writer.render(&sample_tree());
        let reparsed = crate::tiny::parse_tiny(&text).unwrap();
        assert_eq!(reparsed.class_entries().len(), 2);
        assert_eq!(reparsed.field_entries().len(), 1);
    }

    #[test]
    fn test_rewrite_validates_directories() {
        let base = tempfile::tempdir().unwrap();
        let input = base.path().join("in");
        let output = base.path().join("out");
        fs::create_dir_all(&input).unwrap();

        let writer = TinyWriter::new("official", "named");
        writer
            .rewrite(&sample_tree(), &input, &[], &output)
            .unwrap();
        assert!(output.join("mappings.tiny").is_file());

        // 入力ディレクトリが無ければエラー
        let missing = base.path().join("nope");
        assert!(writer.rewrite(&sample_tree(), &missing, &[], &output).is_err());
    }
}
