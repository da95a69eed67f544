use super::tags::{self, SOH};
use crate::domain::errors::CodecError;
use std::fmt;
use std::str::FromStr;

/// Ordered tag=value pairs. Repeated tags are allowed (News pairs rely on it).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMap {
    fields: Vec<(u32, String)>,
}

impl FieldMap {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Set a field, replacing the first occurrence of the tag if present
    pub fn set(&mut self, tag: u32, value: impl Into<String>) {
        let value = value.into();
        match self.fields.iter_mut().find(|(t, _)| *t == tag) {
            Some(field) => field.1 = value,
            None => self.fields.push((tag, value)),
        }
    }

    /// Append a field even if the tag already exists
    pub fn push(&mut self, tag: u32, value: impl Into<String>) {
        self.fields.push((tag, value.into()));
    }

    pub fn get(&self, tag: u32) -> Option<&str> {
        self.fields
            .iter()
            .find(|(t, _)| *t == tag)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, tag: u32) -> bool {
        self.fields.iter().any(|(t, _)| *t == tag)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &str)> {
        self.fields.iter().map(|(t, v)| (*t, v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A FIX message as exchanged with the transport engine.
///
/// Header and body are kept apart so session-scoped header fields (e.g.
/// TargetSubID on Logon) can be injected without touching the body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FixMessage {
    header: FieldMap,
    body: FieldMap,
}

impl FixMessage {
    pub fn new(begin_string: &str, msg_type: &str) -> Self {
        let mut header = FieldMap::new();
        header.set(tags::BEGIN_STRING, begin_string);
        header.set(tags::MSG_TYPE, msg_type);
        Self {
            header,
            body: FieldMap::new(),
        }
    }

    pub fn header(&self) -> &FieldMap {
        &self.header
    }

    pub fn header_mut(&mut self) -> &mut FieldMap {
        &mut self.header
    }

    pub fn body(&self) -> &FieldMap {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut FieldMap {
        &mut self.body
    }

    pub fn msg_type(&self) -> Result<&str, CodecError> {
        self.header
            .get(tags::MSG_TYPE)
            .ok_or(CodecError::MissingTag {
                tag: tags::MSG_TYPE,
            })
    }

    pub fn is_msg_type(&self, msg_type: &str) -> bool {
        self.header.get(tags::MSG_TYPE) == Some(msg_type)
    }

    pub fn set_field(&mut self, tag: u32, value: impl Into<String>) {
        self.body.set(tag, value);
    }

    pub fn is_set(&self, tag: u32) -> bool {
        self.body.contains(tag)
    }

    /// Raw body field. Absence is an error: callers check `is_set` first when
    /// a tag is optional.
    pub fn get_field(&self, tag: u32) -> Result<&str, CodecError> {
        self.body.get(tag).ok_or(CodecError::MissingTag { tag })
    }

    /// Typed body field
    pub fn get<T: FromStr>(&self, tag: u32) -> Result<T, CodecError> {
        let raw = self.get_field(tag)?;
        raw.parse::<T>().map_err(|_| CodecError::InvalidValue {
            tag,
            value: raw.to_string(),
        })
    }

    /// Single-character body field (Side, ExecType, OrdType...)
    pub fn get_char(&self, tag: u32) -> Result<char, CodecError> {
        let raw = self.get_field(tag)?;
        let mut chars = raw.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(CodecError::InvalidValue {
                tag,
                value: raw.to_string(),
            }),
        }
    }

    /// Encode as SOH-delimited wire text with BodyLength(9) and CheckSum(10)
    pub fn to_wire(&self) -> String {
        let begin_string = self
            .header
            .get(tags::BEGIN_STRING)
            .unwrap_or(tags::BEGIN_STRING_FIX42);

        let mut content = String::new();
        if let Some(msg_type) = self.header.get(tags::MSG_TYPE) {
            content.push_str(&format!("{}={}{}", tags::MSG_TYPE, msg_type, SOH));
        }
        for (tag, value) in self.header.iter() {
            if matches!(
                tag,
                tags::BEGIN_STRING | tags::BODY_LENGTH | tags::MSG_TYPE | tags::CHECKSUM
            ) {
                continue;
            }
            content.push_str(&format!("{}={}{}", tag, value, SOH));
        }
        for (tag, value) in self.body.iter() {
            content.push_str(&format!("{}={}{}", tag, value, SOH));
        }

        let pre_checksum = format!(
            "{}={}{SOH}{}={}{SOH}{}",
            tags::BEGIN_STRING,
            begin_string,
            tags::BODY_LENGTH,
            content.len(),
            content,
        );
        let checksum = calculate_checksum(&pre_checksum);

        format!("{}{}={:03}{}", pre_checksum, tags::CHECKSUM, checksum, SOH)
    }

    /// Decode SOH-delimited wire text. BodyLength and CheckSum are dropped;
    /// the transport engine has already validated them.
    pub fn from_wire(raw: &str) -> Result<Self, CodecError> {
        let mut message = FixMessage::default();

        for item in raw.split(SOH).filter(|item| !item.is_empty()) {
            let (tag, value) = item
                .split_once('=')
                .ok_or_else(|| CodecError::MalformedMessage {
                    reason: format!("field without '=': {}", item),
                })?;
            let tag = tag
                .parse::<u32>()
                .map_err(|_| CodecError::MalformedMessage {
                    reason: format!("non-numeric tag: {}", tag),
                })?;

            match tag {
                tags::BODY_LENGTH | tags::CHECKSUM => {}
                t if tags::HEADER_TAGS.contains(&t) => message.header.set(t, value),
                t => message.body.push(t, value),
            }
        }

        if !message.header.contains(tags::MSG_TYPE) {
            return Err(CodecError::MalformedMessage {
                reason: "missing MsgType(35)".to_string(),
            });
        }

        Ok(message)
    }
}

/// Human-readable form for logs: SOH shown as '|'
impl fmt::Display for FixMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_wire().replace(SOH, "|"))
    }
}

fn calculate_checksum(data: &str) -> u32 {
    data.bytes().map(u32::from).sum::<u32>() % 256
}
