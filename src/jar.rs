/// リファレンスjarの走査
///
/// jar（zipアーカイブ）内の.classエントリを1つずつ構造解析して返す。
/// 順序はアーカイブ順で、呼び出し側はそれに依存してはならない

use std::fs::File;
use std::io::Read;
use std::path::Path;

use zip::ZipArchive;

use crate::classfile::ClassStructure;
use crate::error::{Result, TinyPrepError};

/// .classエントリの遅延イテレータ
pub struct JarClasses {
    archive: ZipArchive<File>,
    index: usize,
}

impl JarClasses {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let archive = ZipArchive::new(file).map_err(|e| TinyPrepError::ReferenceRead {
            entry: path.display().to_string(),
            message: format!("not a readable jar: {e}"),
        })?;
        Ok(Self { archive, index: 0 })
    }

    fn next_class(&mut self) -> Result<Option<ClassStructure>> {
        while self.index < self.archive.len() {
            let index = self.index;
            self.index += 1;

            let mut entry = self.archive.by_index(index).map_err(|e| {
                TinyPrepError::ReferenceRead {
                    entry: format!("#{index}"),
                    message: e.to_string(),
                }
            })?;
            if !entry.name().ends_with(".class") {
                continue;
            }
            let name = entry.name().to_string();

            let mut data = Vec::with_capacity(entry.size() as usize);
            entry
                .read_to_end(&mut data)
                .map_err(|e| TinyPrepError::ReferenceRead {
                    entry: name.clone(),
                    message: e.to_string(),
                })?;

            let class = ClassStructure::parse(&data).map_err(|e| {
                TinyPrepError::ReferenceRead {
                    entry: name,
                    message: e.to_string(),
                }
            })?;
            return Ok(Some(class));
        }
        Ok(None)
    }
}

impl Iterator for JarClasses {
    type Item = Result<ClassStructure>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_class().transpose()
    }
}
