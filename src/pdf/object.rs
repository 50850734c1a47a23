//! # PDF Object Model
//!
//! In-memory values for everything that ends up between `N 0 obj` and
//! `endobj`. Values are normalized into PDF syntax only when written, so
//! the same graph can be serialized any number of times.

use std::fmt::Write as FmtWrite;

use chrono::{DateTime, FixedOffset};
use indexmap::IndexMap;
use miniz_oxide::deflate::compress_to_vec_zlib;

use crate::error::Result;

/// The number of an indirect object. Serialized as `N 0 R` when referenced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u32);

impl ObjectId {
    pub fn number(self) -> u32 {
        self.0
    }

    /// The resource name content streams use for this object (`R12`).
    pub fn resource_name(self) -> String {
        format!("R{}", self.0)
    }
}

/// Hands out object ids for one document. Starts at 1 and never reuses
/// a number; a new document gets a new allocator.
#[derive(Debug)]
pub struct IdAllocator {
    next: u32,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> ObjectId {
        let id = ObjectId(self.next);
        self.next += 1;
        id
    }

    /// How many ids have been handed out so far.
    pub fn allocated(&self) -> u32 {
        self.next - 1
    }
}

/// A dictionary or array entry.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Number(f64),
    /// Wrapped in `(...)` on output unless it already starts with `(`,
    /// `/` or `<`.
    String(String),
    /// Prefixed with `/` on output, first letter capitalized.
    Name(String),
    Date(DateTime<FixedOffset>),
    Array(Vec<Value>),
    Dict(Dictionary),
    Ref(ObjectId),
}

impl Value {
    pub fn name(name: impl Into<String>) -> Self {
        Value::Name(name.into())
    }

    pub fn string(text: impl Into<String>) -> Self {
        Value::String(text.into())
    }

    /// A numeric array such as a `/MediaBox`.
    pub fn numbers<I, N>(values: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<f64>,
    {
        Value::Array(values.into_iter().map(|v| Value::Number(v.into())).collect())
    }

    fn collect_refs(&self, out: &mut Vec<ObjectId>) {
        match self {
            Value::Ref(id) => out.push(*id),
            Value::Array(items) => items.iter().for_each(|v| v.collect_refs(out)),
            Value::Dict(dict) => dict.values().for_each(|v| v.collect_refs(out)),
            _ => {}
        }
    }

    fn map_refs(&mut self, f: &mut dyn FnMut(ObjectId) -> Result<ObjectId>) -> Result<()> {
        match self {
            Value::Ref(id) => *id = f(*id)?,
            Value::Array(items) => {
                for item in items {
                    item.map_refs(f)?;
                }
            }
            Value::Dict(dict) => dict.map_refs(f)?,
            _ => {}
        }
        Ok(())
    }

    fn write_into(&self, out: &mut String) {
        match self {
            Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
            Value::Number(n) => out.push_str(&format_number(*n)),
            Value::String(s) => out.push_str(&format_string(s)),
            Value::Name(n) => out.push_str(&format_name(n)),
            Value::Date(d) => out.push_str(&format_date(d)),
            Value::Array(items) => {
                out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(' ');
                    }
                    item.write_into(out);
                }
                out.push(']');
            }
            Value::Dict(dict) => dict.write_into(out),
            Value::Ref(id) => {
                let _ = write!(out, "{} 0 R", id.0);
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<f32> for Value {
    fn from(n: f32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<u16> for Value {
    fn from(n: u16) -> Self {
        Value::Number(n as f64)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<ObjectId> for Value {
    fn from(id: ObjectId) -> Self {
        Value::Ref(id)
    }
}

impl From<Dictionary> for Value {
    fn from(dict: Dictionary) -> Self {
        Value::Dict(dict)
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(date: DateTime<FixedOffset>) -> Self {
        Value::Date(date)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}

/// An ordered PDF dictionary. Keys are stored without the leading slash
/// and written in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dictionary {
    entries: IndexMap<String, Value>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// A dictionary starting with `/Type /<kind>`.
    pub fn typed(kind: &str) -> Self {
        let mut dict = Self::new();
        dict.set("Type", Value::name(kind));
        dict
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> &mut Self {
        self.entries
            .insert(key.trim_start_matches('/').to_string(), value.into());
        self
    }

    /// Set `key` only when `value` is present; absent values never reach
    /// the output.
    pub fn set_opt<V: Into<Value>>(&mut self, key: &str, value: Option<V>) -> &mut Self {
        if let Some(value) = value {
            self.set(key, value);
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key.trim_start_matches('/'))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.values()
    }

    /// Every object this dictionary references, nested values included.
    pub fn references(&self) -> Vec<ObjectId> {
        let mut out = Vec::new();
        self.values().for_each(|v| v.collect_refs(&mut out));
        out
    }

    pub(crate) fn map_refs(&mut self, f: &mut dyn FnMut(ObjectId) -> Result<ObjectId>) -> Result<()> {
        for value in self.entries.values_mut() {
            value.map_refs(f)?;
        }
        Ok(())
    }

    fn write_into(&self, out: &mut String) {
        out.push_str("<<");
        for (key, value) in &self.entries {
            out.push(' ');
            out.push_str(&format_name(key));
            out.push(' ');
            value.write_into(out);
        }
        out.push_str(" >>");
    }

    /// The dictionary in PDF syntax.
    pub fn to_pdf(&self) -> String {
        let mut out = String::new();
        self.write_into(&mut out);
        out
    }
}

/// Stream filters. Only deflate is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    FlateDecode,
}

impl Filter {
    pub fn name(self) -> &'static str {
        match self {
            Filter::FlateDecode => "FlateDecode",
        }
    }

    fn apply(self, data: &[u8]) -> Vec<u8> {
        match self {
            Filter::FlateDecode => compress_to_vec_zlib(data, 6),
        }
    }
}

/// Stream payload of an indirect object. Holds the encoded bytes, so the
/// `/Length` written is always the post-filter length.
#[derive(Debug, Clone, PartialEq)]
pub struct Stream {
    data: Vec<u8>,
    filters: Vec<Filter>,
    raw_len: usize,
}

impl Stream {
    /// An unfiltered stream.
    pub fn raw(data: Vec<u8>) -> Self {
        Self {
            raw_len: data.len(),
            data,
            filters: Vec::new(),
        }
    }

    /// A stream passed through `filters` in order.
    pub fn filtered(data: &[u8], filters: &[Filter]) -> Self {
        let mut encoded = data.to_vec();
        for filter in filters {
            encoded = filter.apply(&encoded);
        }
        Self {
            data: encoded,
            filters: filters.to_vec(),
            raw_len: data.len(),
        }
    }

    pub fn deflated(data: &[u8]) -> Self {
        Self::filtered(data, &[Filter::FlateDecode])
    }

    /// Encoded bytes, exactly as written between `stream` and `endstream`.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Length before any filter ran.
    pub fn raw_len(&self) -> usize {
        self.raw_len
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }
}

/// One `N 0 obj ... endobj` block.
#[derive(Debug, Clone, PartialEq)]
pub struct IndirectObject {
    pub id: ObjectId,
    pub dict: Dictionary,
    pub stream: Option<Stream>,
}

impl IndirectObject {
    pub fn new(id: ObjectId, dict: Dictionary) -> Self {
        Self { id, dict, stream: None }
    }

    pub fn with_stream(id: ObjectId, dict: Dictionary, stream: Stream) -> Self {
        Self {
            id,
            dict,
            stream: Some(stream),
        }
    }

    /// The dictionary as written: stream objects gain `/Length` and, when
    /// filtered, `/Filter`.
    pub fn output_dict(&self) -> Dictionary {
        let mut dict = self.dict.clone();
        if let Some(stream) = &self.stream {
            dict.set("Length", stream.data().len());
            match stream.filters() {
                [] => {}
                [single] => {
                    dict.set("Filter", Value::name(single.name()));
                }
                many => {
                    dict.set(
                        "Filter",
                        Value::Array(many.iter().map(|f| Value::name(f.name())).collect()),
                    );
                }
            }
        }
        dict
    }
}

/// Integers print bare; everything else with four decimals. Non-finite
/// numbers have no PDF form and print as 0.
pub fn format_number(n: f64) -> String {
    if !n.is_finite() {
        return "0".to_string();
    }
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{:.4}", n)
    }
}

/// Strings already in PDF form (`(...)`, `<...>`, names) pass through.
/// Others are wrapped as literals, or as UTF-16BE hex when they hold
/// characters outside ASCII.
pub fn format_string(s: &str) -> String {
    if s.starts_with('(') || s.starts_with('/') || s.starts_with('<') {
        return s.to_string();
    }
    if !s.is_ascii() {
        let mut hex = String::from("<FEFF");
        for unit in s.encode_utf16() {
            let _ = write!(hex, "{:04X}", unit);
        }
        hex.push('>');
        return hex;
    }
    let mut out = String::with_capacity(s.len() + 2);
    out.push('(');
    for ch in s.chars() {
        if matches!(ch, '\\' | '(' | ')') {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push(')');
    out
}

pub fn format_name(name: &str) -> String {
    if name.starts_with('/') {
        return name.to_string();
    }
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => format!("/{}{}", first.to_uppercase(), chars.as_str()),
        None => "/".to_string(),
    }
}

/// `(D:YYYYMMDDHHmmSS+HH'mm')`
pub fn format_date(date: &DateTime<FixedOffset>) -> String {
    let offset = date.offset().local_minus_utc();
    let sign = if offset < 0 { '-' } else { '+' };
    let offset = offset.abs();
    format!(
        "(D:{}{}{:02}'{:02}')",
        date.format("%Y%m%d%H%M%S"),
        sign,
        offset / 3600,
        offset % 3600 / 60
    )
}
