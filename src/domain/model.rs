use crate::utils::error::{EtlError, Result};
use serde::Serialize;
use std::collections::HashSet;

/// Separator between `key：value` pairs in a model reply.
pub const PAIR_SEPARATOR: char = ',';
/// Separator between key and value (full-width colon).
pub const KEY_SEPARATOR: char = '：';

const CUSTOMER_CARD_FIELDS: [&str; 11] = [
    "NO",
    "氏名",
    "性別",
    "生年月日",
    "住所",
    "電話番号",
    "携帯番号",
    "メールアドレス",
    "日付",
    "内容",
    "金額",
];

/// Ordered set of field names every record carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Schema {
    fields: Vec<String>,
}

impl Schema {
    pub fn new<I, S>(fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields: Vec<String> = fields
            .into_iter()
            .map(|f| f.into().trim().to_string())
            .collect();

        if fields.is_empty() {
            return Err(EtlError::InvalidConfigValueError {
                field: "schema.fields".to_string(),
                value: String::new(),
                reason: "Schema needs at least one field".to_string(),
            });
        }

        let mut seen = HashSet::new();
        for field in &fields {
            if field.is_empty() {
                return Err(EtlError::InvalidConfigValueError {
                    field: "schema.fields".to_string(),
                    value: field.clone(),
                    reason: "Field names cannot be blank".to_string(),
                });
            }
            if field.contains(PAIR_SEPARATOR) || field.contains(KEY_SEPARATOR) {
                return Err(EtlError::InvalidConfigValueError {
                    field: "schema.fields".to_string(),
                    value: field.clone(),
                    reason: format!(
                        "Field names cannot contain '{}' or '{}'",
                        PAIR_SEPARATOR, KEY_SEPARATOR
                    ),
                });
            }
            if !seen.insert(field.as_str()) {
                return Err(EtlError::InvalidConfigValueError {
                    field: "schema.fields".to_string(),
                    value: field.clone(),
                    reason: "Duplicate field name".to_string(),
                });
            }
        }

        Ok(Self { fields })
    }

    /// 顧客卡片（顧客カード）的既定欄位
    pub fn customer_card() -> Self {
        Self {
            fields: CUSTOMER_CARD_FIELDS.iter().map(|f| f.to_string()).collect(),
        }
    }

    /// 空清單代表使用既定欄位
    pub fn from_fields_or_default(fields: &[String]) -> Result<Self> {
        if fields.is_empty() {
            Ok(Self::customer_card())
        } else {
            Self::new(fields.iter().cloned())
        }
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn empty_record(&self) -> Record {
        Record {
            entries: self
                .fields
                .iter()
                .map(|f| (f.clone(), String::new()))
                .collect(),
        }
    }

    /// Builds a record from explicit pairs; keys outside the schema are dropped.
    pub fn record_from_pairs<'a, I>(&self, pairs: I) -> Record
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut record = self.empty_record();
        for (key, value) in pairs {
            record.set(key, value);
        }
        record
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::customer_card()
    }
}

/// One card's field values, in schema order. Every schema field is present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    entries: Vec<(String, String)>,
}

impl Record {
    pub fn get(&self, field: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value.as_str())
    }

    pub fn contains_field(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<(String, String)> {
        self.entries
    }

    /// Returns false when `field` is not part of the record.
    pub(crate) fn set(&mut self, field: &str, value: &str) -> bool {
        match self.entries.iter_mut().find(|(name, _)| name == field) {
            Some((_, slot)) => {
                *slot = value.to_string();
                true
            }
            None => false,
        }
    }
}

/// Column-oriented rows of every processed card, in processing order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateTable {
    pub(crate) schema: Schema,
    pub(crate) columns: Vec<Vec<String>>,
    pub(crate) rows: usize,
}

impl AggregateTable {
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn headers(&self) -> &[String] {
        self.schema.fields()
    }

    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn column(&self, field: &str) -> Option<&[String]> {
        self.schema
            .position(field)
            .map(|idx| self.columns[idx].as_slice())
    }

    pub fn row(&self, index: usize) -> Option<Record> {
        if index >= self.rows {
            return None;
        }
        let entries = self
            .schema
            .fields()
            .iter()
            .zip(&self.columns)
            .map(|(field, column)| (field.clone(), column[index].clone()))
            .collect();
        Some(Record { entries })
    }

    /// Row-wise view in header order.
    pub fn rows(&self) -> impl Iterator<Item = Vec<&str>> + '_ {
        (0..self.rows).map(move |i| self.columns.iter().map(|c| c[i].as_str()).collect())
    }
}

/// Base64 payload of one image, ready for the model request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub name: String,
    pub mime_type: String,
    pub data: String,
}

impl EncodedImage {
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

/// Everything the model boundary needs for one card.
#[derive(Debug, Clone, Copy)]
pub struct VisionRequest<'a> {
    pub prompt: &'a str,
    pub image: &'a EncodedImage,
    pub max_tokens: u32,
}

#[derive(Debug, Clone)]
pub struct TransformResult {
    pub table: AggregateTable,
    pub images: Vec<String>,
}
