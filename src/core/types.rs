use parking_lot::Mutex;
use serde::ser::{Error as _, SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use std::any::{Any, TypeId};
use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;
use std::sync::Arc;

use crate::core::error::{GqlError, Result};
use crate::utils::mime::{detect_content_type, DEFAULT_CONTENT_TYPE};

pub type FileMap = BTreeMap<String, Handle>;

/// Objects keep their keys sorted, so every walk visits keys in the same order.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Variables {
    #[default]
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    List(Vec<Variables>),
    Object(BTreeMap<String, Variables>),
    Handle(Handle),
}

impl Variables {
    pub fn object<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Variables>,
    {
        entries.into_iter().collect()
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Variables::Null)
    }

    pub fn get(&self, key: &str) -> Option<&Variables> {
        match self {
            Variables::Object(map) => map.get(key),
            _ => None,
        }
    }

    pub fn index(&self, index: usize) -> Option<&Variables> {
        match self {
            Variables::List(items) => items.get(index),
            _ => None,
        }
    }

    pub fn as_handle(&self) -> Option<&Handle> {
        match self {
            Variables::Handle(handle) => Some(handle),
            _ => None,
        }
    }

    // Leaves count as 1.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self, 1usize)];

        while let Some((node, level)) = stack.pop() {
            deepest = deepest.max(level);
            match node {
                Variables::List(items) => {
                    stack.extend(items.iter().map(|item| (item, level + 1)));
                }
                Variables::Object(map) => {
                    stack.extend(map.values().map(|value| (value, level + 1)));
                }
                _ => {}
            }
        }

        deepest
    }

    pub fn to_json(&self) -> Result<serde_json::Value> {
        serde_json::to_value(self).map_err(|e| GqlError::UnextractedFile(e.to_string()))
    }
}

impl Serialize for Variables {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Variables::Null => serializer.serialize_unit(),
            Variables::Bool(b) => serializer.serialize_bool(*b),
            Variables::Number(n) => n.serialize(serializer),
            Variables::String(s) => serializer.serialize_str(s),
            Variables::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Variables::Object(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (key, value) in map {
                    out.serialize_entry(key, value)?;
                }
                out.end()
            }
            Variables::Handle(handle) => Err(S::Error::custom(format!(
                "cannot serialize {} handle",
                handle.type_name()
            ))),
        }
    }
}

impl From<serde_json::Value> for Variables {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Variables::Null,
            serde_json::Value::Bool(b) => Variables::Bool(b),
            serde_json::Value::Number(n) => Variables::Number(n),
            serde_json::Value::String(s) => Variables::String(s),
            serde_json::Value::Array(items) => {
                Variables::List(items.into_iter().map(Variables::from).collect())
            }
            serde_json::Value::Object(map) => map.into_iter().collect(),
        }
    }
}

impl From<Handle> for Variables {
    fn from(handle: Handle) -> Self {
        Variables::Handle(handle)
    }
}

impl From<Upload> for Variables {
    fn from(upload: Upload) -> Self {
        Variables::Handle(Handle::upload(upload))
    }
}

impl From<&str> for Variables {
    fn from(s: &str) -> Self {
        Variables::String(s.to_string())
    }
}

impl From<String> for Variables {
    fn from(s: String) -> Self {
        Variables::String(s)
    }
}

impl From<bool> for Variables {
    fn from(b: bool) -> Self {
        Variables::Bool(b)
    }
}

impl From<i64> for Variables {
    fn from(n: i64) -> Self {
        Variables::Number(n.into())
    }
}

impl From<u64> for Variables {
    fn from(n: u64) -> Self {
        Variables::Number(n.into())
    }
}

impl From<f64> for Variables {
    fn from(n: f64) -> Self {
        serde_json::Number::from_f64(n)
            .map(Variables::Number)
            .unwrap_or(Variables::Null)
    }
}

impl<T: Into<Variables>> From<Vec<T>> for Variables {
    fn from(items: Vec<T>) -> Self {
        Variables::List(items.into_iter().map(Into::into).collect())
    }
}

impl<K: Into<String>, V: Into<Variables>> FromIterator<(K, V)> for Variables {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Variables::Object(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

/// Clones point at the same object and compare equal.
#[derive(Clone)]
pub struct Handle {
    inner: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl Handle {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            inner: Arc::new(value),
            type_name: std::any::type_name::<T>(),
        }
    }

    pub fn upload(upload: Upload) -> Self {
        Self::new(upload)
    }

    pub fn is<T: Any>(&self) -> bool {
        self.inner.is::<T>()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    pub fn as_upload(&self) -> Option<&Upload> {
        self.downcast_ref::<Upload>()
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// `TypeId` of the wrapped object, not of the handle.
    pub fn value_type_id(&self) -> TypeId {
        Any::type_id(self.inner.as_ref())
    }

    pub fn ptr_eq(&self, other: &Handle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl PartialEq for Handle {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("type", &self.type_name)
            .field("ptr", &Arc::as_ptr(&self.inner).cast::<()>())
            .finish()
    }
}

pub struct Upload {
    reader: Mutex<Box<dyn Read + Send>>,
    filename: Option<String>,
    content_type: Option<String>,
}

impl Upload {
    pub fn new<R: Read + Send + 'static>(reader: R) -> Self {
        Self {
            reader: Mutex::new(Box::new(reader)),
            filename: None,
            content_type: None,
        }
    }

    pub fn from_bytes<B: Into<Vec<u8>>>(bytes: B) -> Self {
        Self::new(Cursor::new(bytes.into()))
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let upload = Self::new(file);

        match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => Ok(upload.with_filename(name)),
            None => Ok(upload),
        }
    }

    /// Sets the filename, guessing a content type when none is set yet.
    pub fn with_filename<S: Into<String>>(mut self, filename: S) -> Self {
        let filename = filename.into();
        if self.content_type.is_none() {
            self.content_type = detect_content_type(&filename);
        }
        self.filename = Some(filename);
        self
    }

    pub fn with_content_type<S: Into<String>>(mut self, content_type: S) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn content_type_or_default(&self) -> &str {
        self.content_type.as_deref().unwrap_or(DEFAULT_CONTENT_TYPE)
    }

    pub fn read_to_end(&self) -> Result<Vec<u8>> {
        let mut reader = self.reader.lock();
        let mut buffer = Vec::new();
        reader.read_to_end(&mut buffer)?;
        Ok(buffer)
    }
}

impl fmt::Debug for Upload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Upload")
            .field("filename", &self.filename)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}
