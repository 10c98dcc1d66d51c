/// リファレンスjarによるマッピング補完
///
/// jarに構造として存在するのにテーブルに載っていないクラス/メンバーへ
/// 目立つプレースホルダ名を合成して入れる。既存のマッピングは決して
/// 上書きしないため、同じ入力に対して何度実行しても結果は変わらない

use crate::classfile::ClassStructure;
use crate::error::Result;
use crate::model::MappingTree;
use crate::project::NONE_PACKAGE;

/// プレースホルダ名に埋め込む出所タグを作る
///
/// `.` `-` `/` を `_` に置換して識別子/ファイル名として安全にする
pub fn source_tag(seed: &str) -> String {
    seed.replace(['.', '-', '/'], "_")
}

fn placeholder(tag: &str, name: &str) -> String {
    format!("XX_{tag}_{name}_XX")
}

/// クラスがアプリケーション側とみなせるか
///
/// パッケージ無し、またはappend_none有効時に合成noneパッケージ付きの
/// クラスだけを補完対象にする。それ以外のテーブルに無いパッケージ付き
/// クラスはサードパーティ扱いで触らない
fn is_in_scope(name: &str, append_none: bool) -> bool {
    !name.contains('/') || (append_none && name.starts_with(NONE_PACKAGE))
}

/// リファレンスクラス列でツリーを補完する
///
/// `reference_classes` の順序は不定でよい。判断は全てクラス/シグネチャ
/// 単位でツリーの現在状態だけを見て行う
pub fn augment(
    tree: &mut MappingTree,
    reference_classes: impl Iterator<Item = Result<ClassStructure>>,
    tag: &str,
    append_none: bool,
) -> Result<()> {
    for class in reference_classes {
        let class = class?;

        if let Some(mapping) = tree.get_class_mut(&class.name) {
            for sig in &class.fields {
                if !mapping.has_field_mapping(sig) {
                    let name = placeholder(tag, &sig.name);
                    mapping.set_field_mapping(sig.clone(), name);
                }
            }
            for sig in &class.methods {
                if !mapping.has_method_mapping(sig) {
                    let name = placeholder(tag, &sig.name);
                    mapping.set_method_mapping(sig.clone(), name);
                }
            }
        } else if is_in_scope(&class.name, append_none) {
            let underscored = class.name.replace('/', "_");
            let prefix = if append_none { NONE_PACKAGE } else { "" };
            let deobf = format!("{prefix}{}", placeholder(tag, &underscored));
            let mapping = tree.get_or_create_class(&class.name);
            mapping.set_deobfuscated_name(deobf);
            // 観測されたメンバーも同じパスで埋める。再実行時に初回と
            // 違うツリーにならないこと
            for sig in &class.fields {
                let name = placeholder(tag, &sig.name);
                mapping.set_field_mapping(sig.clone(), name);
            }
            for sig in &class.methods {
                let name = placeholder(tag, &sig.name);
                mapping.set_method_mapping(sig.clone(), name);
            }
        }
        // テーブルに無いパッケージ付きクラスは対象外のまま残す
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Signature;
    use crate::project::project;
    use crate::tiny::parse_tiny;

    fn base_tree() -> MappingTree {
        let table = parse_tiny(
            "v1\tofficial\tnamed\n\
             CLASS\ta\tcom/foo/Bar\n\
             FIELD\ta\tI\tb\tcount\n",
        )
        .unwrap();
        project(&table, "official", "named", false).unwrap()
    }

    fn class(name: &str, fields: &[(&str, &str)], methods: &[(&str, &str)]) -> ClassStructure {
        ClassStructure {
            name: name.to_string(),
            fields: fields.iter().map(|(n, d)| Signature::new(*n, *d)).collect(),
            methods: methods.iter().map(|(n, d)| Signature::new(*n, *d)).collect(),
        }
    }

    fn run(tree: &mut MappingTree, classes: Vec<ClassStructure>, tag: &str, append_none: bool) {
        augment(tree, classes.into_iter().map(Ok), tag, append_none).unwrap();
    }

    #[test]
    fn test_source_tag_sanitized() {
        assert_eq!(source_tag("1.19"), "1_19");
        assert_eq!(source_tag("a-b/c.d"), "a_b_c_d");
        assert_eq!(source_tag("missing"), "missing");
    }

    #[test]
    fn test_fills_unmapped_members() {
        let mut tree = base_tree();
        run(
            &mut tree,
            vec![class("a", &[("b", "I"), ("d", "Z")], &[("e", "()V")])],
            "1_19",
            false,
        );

        let mapping = tree.get_class("a").unwrap();
        let fields: Vec<_> = mapping.field_mappings().collect();
        assert_eq!(fields.len(), 2);
        assert_eq!(
            mapping
                .field_mappings()
                .find(|(sig, _)| **sig == Signature::new("d", "Z"))
                .map(|(_, name)| name.as_str()),
            Some("XX_1_19_d_XX")
        );
        assert_eq!(
            mapping
                .method_mappings()
                .find(|(sig, _)| **sig == Signature::new("e", "()V"))
                .map(|(_, name)| name.as_str()),
            Some("XX_1_19_e_XX")
        );
    }

    #[test]
    fn test_never_overwrites_existing_mapping() {
        let mut tree = base_tree();
        run(&mut tree, vec![class("a", &[("b", "I")], &[])], "tag", false);

        let mapping = tree.get_class("a").unwrap();
        assert_eq!(
            mapping
                .field_mappings()
                .find(|(sig, _)| **sig == Signature::new("b", "I"))
                .map(|(_, name)| name.as_str()),
            Some("count")
        );
    }

    #[test]
    fn test_packageless_unknown_class_synthesized() {
        let mut tree = base_tree();
        run(&mut tree, vec![class("y", &[], &[])], "tag", false);

        assert_eq!(
            tree.get_class("y").unwrap().deobfuscated_name.as_deref(),
            Some("XX_tag_y_XX")
        );
    }

    #[test]
    fn test_synthesized_class_gets_member_placeholders_first_run() {
        let mut tree = base_tree();
        run(
            &mut tree,
            vec![class("y", &[("q", "J")], &[("m", "()V")])],
            "t",
            false,
        );

        let mapping = tree.get_class("y").unwrap();
        assert_eq!(mapping.deobfuscated_name.as_deref(), Some("XX_t_y_XX"));
        assert_eq!(
            mapping
                .field_mappings()
                .find(|(sig, _)| **sig == Signature::new("q", "J"))
                .map(|(_, name)| name.as_str()),
            Some("XX_t_q_XX")
        );
        assert_eq!(
            mapping
                .method_mappings()
                .find(|(sig, _)| **sig == Signature::new("m", "()V"))
                .map(|(_, name)| name.as_str()),
            Some("XX_t_m_XX")
        );
    }

    #[test]
    fn test_packaged_unknown_class_left_out() {
        let mut tree = base_tree();
        run(&mut tree, vec![class("com/bar/Z", &[("f", "J")], &[])], "tag", false);
        assert!(tree.get_class("com/bar/Z").is_none());
    }

    #[test]
    fn test_none_packaged_class_in_scope_with_append_none() {
        let mut tree = base_tree();
        run(&mut tree, vec![class("none/y", &[], &[])], "tag", true);

        assert_eq!(
            tree.get_class("none/y").unwrap().deobfuscated_name.as_deref(),
            Some("none/XX_tag_none_y_XX")
        );

        // append_none無効なら対象外
        let mut tree = base_tree();
        run(&mut tree, vec![class("none/y", &[], &[])], "tag", false);
        assert!(tree.get_class("none/y").is_none());
    }

    #[test]
    fn test_idempotent() {
        let reference = vec![
            class("a", &[("b", "I"), ("d", "Z")], &[("e", "()V")]),
            class("y", &[("q", "J")], &[]),
        ];

        let mut once = base_tree();
        run(&mut once, reference.clone(), "t", false);
        let mut twice = base_tree();
        run(&mut twice, reference.clone(), "t", false);
        run(&mut twice, reference, "t", false);

        assert_eq!(
            serde_json::to_value(&once).unwrap(),
            serde_json::to_value(&twice).unwrap()
        );
    }

    #[test]
    fn test_order_insensitive() {
        let forward = vec![class("a", &[("d", "Z")], &[]), class("y", &[], &[])];
        let mut reversed = forward.clone();
        reversed.reverse();

        let mut t1 = base_tree();
        run(&mut t1, forward, "t", false);
        let mut t2 = base_tree();
        run(&mut t2, reversed, "t", false);

        assert_eq!(
            serde_json::to_value(&t1).unwrap(),
            serde_json::to_value(&t2).unwrap()
        );
    }
}
