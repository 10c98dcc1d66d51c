/// Tiny v1マッピングテーブルの読み込み
///
/// 書式:
///   v1<TAB>nsA<TAB>nsB...
///   CLASS<TAB>nameA<TAB>nameB...
///   FIELD<TAB>ownerA<TAB>descA<TAB>nameA<TAB>nameB...
///   METHOD<TAB>ownerA<TAB>descA<TAB>nameA<TAB>nameB...
///
/// ネームスペースは不透明なラベルとして扱い、2つ以上あってもよい。
/// ディスクリプタは最初のネームスペースで書かれたまま保持し、
/// ネームスペース間で変換しない

use std::collections::HashMap;

use tracing::warn;

use crate::error::{Result, TinyPrepError};

/// あるネームスペースから見たメンバー（所有クラス名・メンバー名・ディスクリプタ）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryTriple {
    pub owner: String,
    pub name: String,
    pub descriptor: String,
}

/// クラス1行分。ネームスペースごとの名前を持つ
#[derive(Debug)]
pub struct ClassEntry {
    names: Vec<String>,
    line: usize,
}

impl ClassEntry {
    /// 指定ネームスペースでのクラス名
    pub fn name_in(&self, ns: usize) -> Result<&str> {
        self.names
            .get(ns)
            .map(String::as_str)
            .ok_or_else(|| TinyPrepError::MissingNamespace {
                namespace: format!("#{ns}"),
                line: self.line,
            })
    }
}

/// フィールド/メソッド1行分
///
/// 所有クラス名はネームスペースごとにクラステーブル経由で解決済み。
/// ディスクリプタは全ネームスペース共通（最初の列の表記）
#[derive(Debug)]
pub struct MemberEntry {
    owners: Vec<String>,
    names: Vec<String>,
    descriptor: String,
    line: usize,
}

impl MemberEntry {
    /// 指定ネームスペースでのEntryTriple
    pub fn triple_in(&self, ns: usize) -> Result<EntryTriple> {
        let (Some(owner), Some(name)) = (self.owners.get(ns), self.names.get(ns)) else {
            return Err(TinyPrepError::MissingNamespace {
                namespace: format!("#{ns}"),
                line: self.line,
            });
        };
        Ok(EntryTriple {
            owner: owner.clone(),
            name: name.clone(),
            descriptor: self.descriptor.clone(),
        })
    }
}

/// 読み込んだマルチネームスペーステーブル
#[derive(Debug)]
pub struct Mappings {
    namespaces: Vec<String>,
    class_entries: Vec<ClassEntry>,
    field_entries: Vec<MemberEntry>,
    method_entries: Vec<MemberEntry>,
}

impl Mappings {
    /// ラベルからネームスペース番号を引く。ヘッダに無ければエラー
    pub fn namespace_index(&self, label: &str) -> Result<usize> {
        self.namespaces
            .iter()
            .position(|ns| ns == label)
            .ok_or_else(|| TinyPrepError::MissingNamespace {
                namespace: label.to_string(),
                line: 1,
            })
    }

    pub fn namespaces(&self) -> &[String] {
        &self.namespaces
    }

    pub fn class_entries(&self) -> &[ClassEntry] {
        &self.class_entries
    }

    pub fn field_entries(&self) -> &[MemberEntry] {
        &self.field_entries
    }

    pub fn method_entries(&self) -> &[MemberEntry] {
        &self.method_entries
    }
}

fn malformed(message: impl Into<String>, line: usize) -> TinyPrepError {
    TinyPrepError::MalformedTable {
        message: message.into(),
        line,
    }
}

/// Tiny v1テキストを解析する
pub fn parse_tiny(text: &str) -> Result<Mappings> {
    let mut lines = text.lines().enumerate();

    let (_, header) = lines
        .next()
        .ok_or_else(|| malformed("empty mapping file", 1))?;
    let mut header_cols = header.split('\t');
    match header_cols.next() {
        Some("v1") => {}
        other => {
            return Err(malformed(
                format!("expected 'v1' header, got '{}'", other.unwrap_or("")),
                1,
            ))
        }
    }
    let namespaces: Vec<String> = header_cols.map(str::to_string).collect();
    if namespaces.len() < 2 {
        return Err(malformed("header must declare at least two namespaces", 1));
    }

    let ns_count = namespaces.len();
    let mut class_entries = Vec::new();
    let mut raw_fields: Vec<(String, String, Vec<String>, usize)> = Vec::new();
    let mut raw_methods: Vec<(String, String, Vec<String>, usize)> = Vec::new();

    for (idx, raw) in lines {
        let line = idx + 1;
        if raw.is_empty() {
            continue;
        }
        let cols: Vec<&str> = raw.split('\t').collect();
        match cols[0] {
            "CLASS" => {
                if cols.len() != ns_count + 1 {
                    return Err(malformed(
                        format!("CLASS row has {} name columns, expected {ns_count}", cols.len() - 1),
                        line,
                    ));
                }
                class_entries.push(ClassEntry {
                    names: cols[1..].iter().map(|s| s.to_string()).collect(),
                    line,
                });
            }
            "FIELD" | "METHOD" => {
                if cols.len() != ns_count + 3 {
                    return Err(malformed(
                        format!("{} row has {} columns, expected {}", cols[0], cols.len(), ns_count + 3),
                        line,
                    ));
                }
                let entry = (
                    cols[1].to_string(),
                    cols[2].to_string(),
                    cols[3..].iter().map(|s| s.to_string()).collect(),
                    line,
                );
                if cols[0] == "FIELD" {
                    raw_fields.push(entry);
                } else {
                    raw_methods.push(entry);
                }
            }
            other => {
                // 未知の行種別は読み飛ばす
                warn!("skipping unknown mapping row type '{}' at line {}", other, line);
            }
        }
    }

    // 所有クラス名のネームスペース別解決用テーブル（最初の列の名前 → 全列）
    let class_names: HashMap<&str, &[String]> = class_entries
        .iter()
        .map(|e| (e.names[0].as_str(), e.names.as_slice()))
        .collect();

    let resolve = |(owner, descriptor, names, line): (String, String, Vec<String>, usize)| {
        let owners = match class_names.get(owner.as_str()) {
            Some(all) => all.to_vec(),
            // クラス行が無い所有者は全ネームスペースで同名扱い
            None => vec![owner; ns_count],
        };
        MemberEntry {
            owners,
            names,
            descriptor,
            line,
        }
    };

    let field_entries: Vec<MemberEntry> = raw_fields.into_iter().map(&resolve).collect();
    let method_entries: Vec<MemberEntry> = raw_methods.into_iter().map(&resolve).collect();

    Ok(Mappings {
        namespaces,
        class_entries,
        field_entries,
        method_entries,
    })
}
