//! JNI type descriptors
//!
//! `(I[BLjava/lang/String;)V` style method descriptors, parsed into boundary
//! types and formatted back for overload mangling.

use super::types::Type;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DescriptorError {
    #[error("unexpected end of descriptor")]
    UnexpectedEnd,
    #[error("unexpected {found:?} at offset {offset}")]
    Unexpected { found: char, offset: usize },
    #[error("method descriptor must start with '('")]
    MissingParams,
    #[error("trailing input at offset {0}")]
    Trailing(usize),
}

/// Parameter and return types of a method descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDescriptor {
    pub params: Vec<Type>,
    pub ret: Option<Type>,
}

struct Cursor<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Result<char, DescriptorError> {
        let c = self.peek().ok_or(DescriptorError::UnexpectedEnd)?;
        self.pos += c.len_utf8();
        Ok(c)
    }

    fn field(&mut self) -> Result<Type, DescriptorError> {
        let offset = self.pos;
        let ty = match self.bump()? {
            'Z' => Type::Bool,
            'B' => Type::I8,
            'C' => Type::U16,
            'S' => Type::I16,
            'I' => Type::I32,
            'J' => Type::I64,
            'F' => Type::F32,
            'D' => Type::F64,
            'L' => {
                let rest = &self.text[self.pos..];
                let end = rest.find(';').ok_or(DescriptorError::UnexpectedEnd)?;
                let path = &rest[..end];
                self.pos += end + 1;
                match path {
                    "java/lang/String" => Type::String,
                    _ => Type::Object(path.replace(['/', '$'], ".")),
                }
            }
            '[' => match self.peek() {
                Some('B') => {
                    self.pos += 1;
                    Type::Bytes
                }
                _ => Type::Array(Box::new(self.field()?)),
            },
            found => return Err(DescriptorError::Unexpected { found, offset }),
        };
        Ok(ty)
    }
}

/// Parse a single field descriptor such as `[B` or `Ljava/io/File;`
pub fn parse_field(desc: &str) -> Result<Type, DescriptorError> {
    let mut cursor = Cursor { text: desc, pos: 0 };
    let ty = cursor.field()?;
    if cursor.pos != desc.len() {
        return Err(DescriptorError::Trailing(cursor.pos));
    }
    Ok(ty)
}

pub fn parse_method(desc: &str) -> Result<MethodDescriptor, DescriptorError> {
    let mut cursor = Cursor { text: desc, pos: 0 };
    if cursor.peek() != Some('(') {
        return Err(DescriptorError::MissingParams);
    }
    cursor.pos += 1;

    let mut params = Vec::new();
    loop {
        match cursor.peek() {
            Some(')') => {
                cursor.pos += 1;
                break;
            }
            Some(_) => params.push(cursor.field()?),
            None => return Err(DescriptorError::UnexpectedEnd),
        }
    }

    let ret = match cursor.peek() {
        Some('V') => {
            cursor.pos += 1;
            None
        }
        _ => Some(cursor.field()?),
    };
    if cursor.pos != desc.len() {
        return Err(DescriptorError::Trailing(cursor.pos));
    }
    Ok(MethodDescriptor { params, ret })
}

/// Argument part of a method descriptor: the text between the parentheses
pub fn args_part(desc: &str) -> &str {
    let start = desc.find('(').map_or(0, |i| i + 1);
    let end = desc.rfind(')').unwrap_or(desc.len());
    desc.get(start..end).unwrap_or("")
}

/// Field descriptor of a boundary type; `None` for types Java cannot name
pub fn type_descriptor(ty: &Type) -> Option<String> {
    let desc = match ty {
        Type::Bool => "Z".to_string(),
        Type::I8 => "B".to_string(),
        Type::U16 => "C".to_string(),
        Type::I16 => "S".to_string(),
        Type::I32 => "I".to_string(),
        Type::I64 => "J".to_string(),
        Type::F32 => "F".to_string(),
        Type::F64 => "D".to_string(),
        Type::String => "Ljava/lang/String;".to_string(),
        Type::Bytes => "[B".to_string(),
        Type::Object(class) => format!("L{};", class.replace('.', "/")),
        Type::Array(elem) => format!("[{}", type_descriptor(elem)?),
        _ => return None,
    };
    Some(desc)
}

pub fn method_descriptor(params: &[Type], ret: Option<&Type>) -> Option<String> {
    let mut desc = String::from("(");
    for param in params {
        desc.push_str(&type_descriptor(param)?);
    }
    desc.push(')');
    match ret {
        Some(ty) => desc.push_str(&type_descriptor(ty)?),
        None => desc.push('V'),
    }
    Some(desc)
}
