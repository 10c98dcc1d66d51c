/// JVM classファイルの構造解析
///
/// クラス名とフィールド/メソッドの (名前, ディスクリプタ) だけを取り出す。
/// メソッド本体やデバッグ情報は不要なので属性は全て読み飛ばす

use thiserror::Error;

use crate::model::Signature;

const MAGIC: u32 = 0xCAFE_BABE;

#[derive(Debug, Error)]
#[error("{message} (offset {offset:#x})")]
pub struct ClassFormatError {
    pub message: String,
    pub offset: usize,
}

type ParseResult<T> = std::result::Result<T, ClassFormatError>;

/// 1クラス分の構造情報
#[derive(Debug, Clone)]
pub struct ClassStructure {
    /// バイナリ名（例: "com/foo/Bar"）
    pub name: String,
    pub fields: Vec<Signature>,
    pub methods: Vec<Signature>,
}

/// ビッグエンディアンのバイト列カーソル
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn error(&self, message: impl Into<String>) -> ClassFormatError {
        ClassFormatError {
            message: message.into(),
            offset: self.pos,
        }
    }

    fn take(&mut self, len: usize) -> ParseResult<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or_else(|| self.error("unexpected end of class file"))?;
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    fn read_u8(&mut self) -> ParseResult<u8> {
        Ok(self.take(1)?[0])
    }

    fn read_u16(&mut self) -> ParseResult<u16> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn read_u32(&mut self) -> ParseResult<u32> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn skip(&mut self, len: usize) -> ParseResult<()> {
        self.take(len).map(|_| ())
    }
}

/// 定数プールのうち構造解析に必要な項目だけ保持する
struct ConstantPool {
    /// インデックス → Utf8文字列
    utf8: Vec<Option<String>>,
    /// インデックス → Classのname_index
    classes: Vec<Option<u16>>,
}

impl ConstantPool {
    fn read(reader: &mut Reader<'_>) -> ParseResult<Self> {
        let count = reader.read_u16()? as usize;
        let mut utf8 = vec![None; count];
        let mut classes = vec![None; count];

        // インデックス0は欠番。LongとDoubleは2スロット消費する
        let mut index = 1;
        while index < count {
            let tag = reader.read_u8()?;
            match tag {
                // Utf8
                1 => {
                    let len = reader.read_u16()? as usize;
                    let bytes = reader.take(len)?;
                    // Modified UTF-8だが、クラス/メンバー名の範囲ではUTF-8と一致する
                    utf8[index] = Some(String::from_utf8_lossy(bytes).into_owned());
                }
                // Integer, Float
                3 | 4 => reader.skip(4)?,
                // Long, Double
                5 | 6 => {
                    reader.skip(8)?;
                    index += 1;
                }
                // Class
                7 => classes[index] = Some(reader.read_u16()?),
                // String, MethodType, Module, Package
                8 | 16 | 19 | 20 => reader.skip(2)?,
                // Fieldref, Methodref, InterfaceMethodref, NameAndType,
                // Dynamic, InvokeDynamic
                9 | 10 | 11 | 12 | 17 | 18 => reader.skip(4)?,
                // MethodHandle
                15 => reader.skip(3)?,
                other => {
                    return Err(reader.error(format!("unknown constant pool tag {other}")));
                }
            }
            index += 1;
        }

        Ok(Self { utf8, classes })
    }

    fn utf8(&self, index: u16, reader: &Reader<'_>) -> ParseResult<&str> {
        self.utf8
            .get(index as usize)
            .and_then(Option::as_deref)
            .ok_or_else(|| reader.error(format!("invalid Utf8 constant index {index}")))
    }

    fn class_name(&self, index: u16, reader: &Reader<'_>) -> ParseResult<&str> {
        let name_index = self
            .classes
            .get(index as usize)
            .and_then(|c| *c)
            .ok_or_else(|| reader.error(format!("invalid Class constant index {index}")))?;
        self.utf8(name_index, reader)
    }
}

impl ClassStructure {
    /// classファイルのバイト列から構造情報を取り出す
    pub fn parse(data: &[u8]) -> ParseResult<Self> {
        let mut reader = Reader::new(data);

        if reader.read_u32()? != MAGIC {
            return Err(reader.error("not a class file (bad magic)"));
        }
        // minor, major
        reader.skip(4)?;

        let pool = ConstantPool::read(&mut reader)?;

        // access_flags
        reader.skip(2)?;
        let this_class = reader.read_u16()?;
        let name = pool.class_name(this_class, &reader)?.to_string();
        // super_class
        reader.skip(2)?;

        let interface_count = reader.read_u16()? as usize;
        reader.skip(interface_count * 2)?;

        let fields = read_members(&mut reader, &pool)?;
        let methods = read_members(&mut reader, &pool)?;
        // クラス属性は不要

        Ok(Self {
            name,
            fields,
            methods,
        })
    }
}

fn read_members(reader: &mut Reader<'_>, pool: &ConstantPool) -> ParseResult<Vec<Signature>> {
    let count = reader.read_u16()? as usize;
    let mut members = Vec::with_capacity(count);
    for _ in 0..count {
        // access_flags
        reader.skip(2)?;
        let name_index = reader.read_u16()?;
        let descriptor_index = reader.read_u16()?;
        let name = pool.utf8(name_index, reader)?.to_string();
        let descriptor = pool.utf8(descriptor_index, reader)?.to_string();

        let attribute_count = reader.read_u16()? as usize;
        for _ in 0..attribute_count {
            // attribute_name_index
            reader.skip(2)?;
            let length = reader.read_u32()? as usize;
            reader.skip(length)?;
        }

        members.push(Signature::new(name, descriptor));
    }
    Ok(members)
}


#[cfg(test)]
mod tests {
    use super::test_support::build_class;
    use super::*;

    #[test]
    fn test_parse_structure() {
        let data = build_class("com/foo/Bar", &[("b", "I")], &[("c", "()V"), ("c", "(I)V")]);
        let class = ClassStructure::parse(&data).unwrap();

        assert_eq!(class.name, "com/foo/Bar");
        assert_eq!(class.fields, vec![Signature::new("b", "I")]);
        assert_eq!(
            class.methods,
            vec![Signature::new("c", "()V"), Signature::new("c", "(I)V")]
        );
    }

    #[test]
    fn test_bad_magic_rejected() {
        let err = ClassStructure::parse(&[0, 1, 2, 3, 0, 0]).unwrap_err();
        assert!(err.message.contains("bad magic"));
    }

    #[test]
    fn test_truncated_file_rejected() {
        let mut data = build_class("a", &[], &[]);
        data.truncate(data.len() - 3);
        assert!(ClassStructure::parse(&data).is_err());
    }
}
