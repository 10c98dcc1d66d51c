/// マッピングツリーのデータモデル
///
/// fromネームスペースのクラス名をキーとして、クラス・フィールド・
/// メソッドのリネーム先を保持する

use indexmap::IndexMap;
use serde::{Serialize, Serializer};

/// メンバーのシグネチャ（名前 + 型ディスクリプタ）
///
/// ディスクリプタは大文字小文字を区別する完全一致。同名でディスクリプタが
/// 異なるオーバーロードは別のキーになる
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature {
    pub name: String,
    pub descriptor: String,
}

impl Serialize for Signature {
    /// JSONのマップキーとして使えるよう "name:descriptor" 形式で出力する
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("{}:{}", self.name, self.descriptor))
    }
}

impl Signature {
    pub fn new(name: impl Into<String>, descriptor: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            descriptor: descriptor.into(),
        }
    }
}

/// 1クラス分のマッピング
///
/// フィールドとメソッドは独立したキー空間（同じ形のシグネチャが両方に
/// 存在しても衝突しない）
#[derive(Debug, Default, Serialize)]
pub struct ClassMapping {
    /// リネーム先のクラス名。メンバー行だけで作られたクラスはNoneのまま
    pub deobfuscated_name: Option<String>,
    field_mappings: IndexMap<Signature, String>,
    method_mappings: IndexMap<Signature, String>,
}

impl ClassMapping {
    pub fn set_deobfuscated_name(&mut self, name: impl Into<String>) {
        self.deobfuscated_name = Some(name.into());
    }

    pub fn has_field_mapping(&self, sig: &Signature) -> bool {
        self.field_mappings.contains_key(sig)
    }

    pub fn has_method_mapping(&self, sig: &Signature) -> bool {
        self.method_mappings.contains_key(sig)
    }

    pub fn set_field_mapping(&mut self, sig: Signature, deobf_name: impl Into<String>) {
        self.field_mappings.insert(sig, deobf_name.into());
    }

    pub fn set_method_mapping(&mut self, sig: Signature, deobf_name: impl Into<String>) {
        self.method_mappings.insert(sig, deobf_name.into());
    }

    pub fn field_mappings(&self) -> impl Iterator<Item = (&Signature, &String)> {
        self.field_mappings.iter()
    }

    pub fn method_mappings(&self) -> impl Iterator<Item = (&Signature, &String)> {
        self.method_mappings.iter()
    }
}

/// fromネームスペースのクラス名 → ClassMapping
///
/// エントリは実行中に増えるだけで削除されない。キーは常にfrom側の名前で、
/// リネーム先の名前では引けない
#[derive(Debug, Default, Serialize)]
pub struct MappingTree {
    classes: IndexMap<String, ClassMapping>,
}

impl MappingTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_class(&self, from_name: &str) -> Option<&ClassMapping> {
        self.classes.get(from_name)
    }

    pub fn get_or_create_class(&mut self, from_name: &str) -> &mut ClassMapping {
        self.classes.entry(from_name.to_string()).or_default()
    }

    pub fn get_class_mut(&mut self, from_name: &str) -> Option<&mut ClassMapping> {
        self.classes.get_mut(from_name)
    }

    pub fn contains_class(&self, from_name: &str) -> bool {
        self.classes.contains_key(from_name)
    }

    pub fn classes(&self) -> impl Iterator<Item = (&String, &ClassMapping)> {
        self.classes.iter()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_overloads_are_distinct() {
        let mut mapping = ClassMapping::default();
        mapping.set_method_mapping(Signature::new("a", "()V"), "run");
        mapping.set_method_mapping(Signature::new("a", "(I)V"), "runWith");

        assert!(mapping.has_method_mapping(&Signature::new("a", "()V")));
        assert!(mapping.has_method_mapping(&Signature::new("a", "(I)V")));
        assert_eq!(mapping.method_mappings().count(), 2);
    }

    #[test]
    fn test_field_and_method_keyspaces_independent() {
        let mut mapping = ClassMapping::default();
        mapping.set_field_mapping(Signature::new("x", "I"), "count");

        assert!(mapping.has_field_mapping(&Signature::new("x", "I")));
        assert!(!mapping.has_method_mapping(&Signature::new("x", "I")));
    }

    #[test]
    fn test_get_or_create_keeps_existing() {
        let mut tree = MappingTree::new();
        tree.get_or_create_class("a").set_deobfuscated_name("com/foo/Bar");
        let mapping = tree.get_or_create_class("a");

        assert_eq!(mapping.deobfuscated_name.as_deref(), Some("com/foo/Bar"));
        assert_eq!(tree.len(), 1);
    }
}
