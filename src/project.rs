/// ネームスペース射影
///
/// マルチネームスペーステーブルを (from, to) の1ペアに落として
/// MappingTreeを構築する

use tracing::warn;

use crate::error::Result;
use crate::model::{MappingTree, Signature};
use crate::tiny::Mappings;

/// パッケージ無しクラス名に付ける合成パッケージマーカー
pub const NONE_PACKAGE: &str = "none/";

/// リネーム先クラス名の正規化
///
/// append_noneが有効でパッケージ区切りを含まない名前には "none/" を前置する。
/// 下流ツールがパッケージ無しの名前を特別扱いするため、全てのリネーム先を
/// パッケージ付きの形に揃える
pub fn normalize_class_name(name: &str, append_none: bool) -> String {
    if append_none && !name.contains('/') {
        format!("{NONE_PACKAGE}{name}")
    } else {
        name.to_string()
    }
}

/// テーブルを (from, to) ペアへ射影してMappingTreeを作る
///
/// どの行かでネームスペースが欠けていれば全体を中止する
pub fn project(
    table: &Mappings,
    from_namespace: &str,
    to_namespace: &str,
    append_none: bool,
) -> Result<MappingTree> {
    let from = table.namespace_index(from_namespace)?;
    let to = table.namespace_index(to_namespace)?;

    let mut tree = MappingTree::new();

    for entry in table.class_entries() {
        let from_name = entry.name_in(from)?;
        let to_name = entry.name_in(to)?;
        let mapping = tree.get_or_create_class(from_name);
        if mapping.deobfuscated_name.is_some() {
            // 同じfrom名を指す行が重複している。最後の値で上書きする
            warn!("duplicate class row for '{}', keeping the later name", from_name);
        }
        mapping.set_deobfuscated_name(normalize_class_name(to_name, append_none));
    }

    for entry in table.field_entries() {
        let from_triple = entry.triple_in(from)?;
        let to_triple = entry.triple_in(to)?;
        // キーは常にfrom側のシグネチャ。ディスクリプタは変換しない
        tree.get_or_create_class(&from_triple.owner).set_field_mapping(
            Signature::new(from_triple.name, from_triple.descriptor),
            to_triple.name,
        );
    }

    for entry in table.method_entries() {
        let from_triple = entry.triple_in(from)?;
        let to_triple = entry.triple_in(to)?;
        tree.get_or_create_class(&from_triple.owner).set_method_mapping(
            Signature::new(from_triple.name, from_triple.descriptor),
            to_triple.name,
        );
    }

    Ok(tree)
}
