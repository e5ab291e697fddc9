//! # In-Memory Array Model
//!
//! Metadata-only implementations of [`ArrayLike`] and [`DatasetLike`]. They
//! carry everything a schema inspects (dtype, dims, shape, chunk layout,
//! attributes, coordinates, storage kind) but no element data, and can be
//! described in JSON through their `serde` derives.
//!
//! Constructors check internal consistency: one extent per dimension name,
//! one chunk entry per dimension, and chunks that cover each extent.
//! Deserialization goes through the same constructors, so a JSON
//! description is held to the same rules.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::array::{ArrayLike, ArrayType, Attrs, ChunkLayout, DataObject, DatasetLike};
use crate::dtype::DType;
use crate::error::ModelError;

/// A labeled N-dimensional array description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDataArray")]
pub struct DataArray {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    dtype: DType,
    dims: Vec<String>,
    shape: Vec<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    chunks: Option<ChunkLayout>,
    attrs: Attrs,
    coords: BTreeMap<String, DataArray>,
    array_type: ArrayType,
}

impl DataArray {
    /// Create an unnamed, unchunked, dense array.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::DimsShape`] if `dims` and `shape` differ in
    /// length.
    pub fn new<I, S>(dtype: DType, dims: I, shape: Vec<usize>) -> Result<Self, ModelError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let dims: Vec<String> = dims.into_iter().map(Into::into).collect();
        if dims.len() != shape.len() {
            return Err(ModelError::DimsShape {
                dims: dims.len(),
                shape: shape.len(),
            });
        }
        Ok(Self {
            name: None,
            dtype,
            dims,
            shape,
            chunks: None,
            attrs: Attrs::new(),
            coords: BTreeMap::new(),
            array_type: ArrayType::Dense,
        })
    }

    /// A one-dimensional array whose single dimension is named `dim`.
    pub fn vector(dtype: DType, dim: impl Into<String>, len: usize) -> Self {
        Self {
            name: None,
            dtype,
            dims: vec![dim.into()],
            shape: vec![len],
            chunks: None,
            attrs: Attrs::new(),
            coords: BTreeMap::new(),
            array_type: ArrayType::Dense,
        }
    }

    /// Set the name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Attach a chunk layout and switch the storage kind to
    /// [`ArrayType::Chunked`].
    ///
    /// # Errors
    ///
    /// Returns [`ModelError`] if the layout does not have one entry per
    /// dimension or the chunks along a dimension do not sum to its extent.
    pub fn with_chunks(mut self, chunks: ChunkLayout) -> Result<Self, ModelError> {
        if chunks.len() != self.ndim() {
            return Err(ModelError::ChunkRank {
                chunks: chunks.len(),
                ndim: self.ndim(),
            });
        }
        for ((dim, extent), sizes) in self.dims.iter().zip(&self.shape).zip(&chunks) {
            let sum: usize = sizes.iter().sum();
            if sum != *extent {
                return Err(ModelError::ChunkExtent {
                    dim: dim.clone(),
                    sum,
                    extent: *extent,
                });
            }
        }
        self.chunks = Some(chunks);
        self.array_type = ArrayType::Chunked;
        Ok(self)
    }

    /// Set one attribute.
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    /// Attach a coordinate array.
    pub fn with_coord(mut self, name: impl Into<String>, coord: DataArray) -> Self {
        self.coords.insert(name.into(), coord);
        self
    }

    /// Override the storage kind.
    pub fn with_array_type(mut self, array_type: ArrayType) -> Self {
        self.array_type = array_type;
        self
    }

    /// A copy with a different dtype.
    pub fn astype(&self, dtype: DType) -> Self {
        Self {
            dtype,
            ..self.clone()
        }
    }

    /// Number of dimensions.
    pub fn ndim(&self) -> usize {
        self.dims.len()
    }
}

/// Wire form of [`DataArray`], checked by [`TryFrom`] on the way in.
#[derive(Deserialize)]
struct RawDataArray {
    #[serde(default)]
    name: Option<String>,
    dtype: DType,
    dims: Vec<String>,
    shape: Vec<usize>,
    #[serde(default)]
    chunks: Option<ChunkLayout>,
    #[serde(default)]
    attrs: Attrs,
    #[serde(default)]
    coords: BTreeMap<String, DataArray>,
    #[serde(default)]
    array_type: Option<ArrayType>,
}

impl TryFrom<RawDataArray> for DataArray {
    type Error = ModelError;

    fn try_from(raw: RawDataArray) -> Result<Self, Self::Error> {
        let mut array = Self::new(raw.dtype, raw.dims, raw.shape)?;
        if let Some(chunks) = raw.chunks {
            array = array.with_chunks(chunks)?;
        }
        if let Some(array_type) = raw.array_type {
            array.array_type = array_type;
        }
        array.name = raw.name;
        array.attrs = raw.attrs;
        array.coords = raw.coords;
        Ok(array)
    }
}

impl DataObject for DataArray {
    fn kind(&self) -> &'static str {
        "DataArray"
    }

    fn as_array(&self) -> Option<&dyn ArrayLike> {
        Some(self)
    }
}

impl ArrayLike for DataArray {
    fn dtype(&self) -> DType {
        self.dtype
    }

    fn shape(&self) -> &[usize] {
        &self.shape
    }

    fn dims(&self) -> &[String] {
        &self.dims
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn attrs(&self) -> &Attrs {
        &self.attrs
    }

    fn coords(&self) -> BTreeMap<&str, &dyn ArrayLike> {
        self.coords
            .iter()
            .map(|(k, v)| (k.as_str(), v as &dyn ArrayLike))
            .collect()
    }

    fn chunks(&self) -> Option<&[Vec<usize>]> {
        self.chunks.as_deref()
    }

    fn array_type(&self) -> ArrayType {
        self.array_type
    }
}

/// A collection of named arrays sharing coordinates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    data_vars: BTreeMap<String, DataArray>,
    #[serde(default)]
    coords: BTreeMap<String, DataArray>,
    #[serde(default)]
    attrs: Attrs,
}

impl Dataset {
    /// Create an empty dataset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a data variable. The variable takes `name` as its own name.
    pub fn with_var(mut self, name: impl Into<String>, var: DataArray) -> Self {
        let name = name.into();
        let var = var.with_name(name.clone());
        self.data_vars.insert(name, var);
        self
    }

    /// Add a coordinate array. The array takes `name` as its own name.
    pub fn with_coord(mut self, name: impl Into<String>, coord: DataArray) -> Self {
        let name = name.into();
        let coord = coord.with_name(name.clone());
        self.coords.insert(name, coord);
        self
    }

    /// Set one attribute.
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    /// Replace or insert a data variable.
    pub fn set_var(&mut self, name: impl Into<String>, var: DataArray) {
        let name = name.into();
        let var = var.with_name(name.clone());
        self.data_vars.insert(name, var);
    }

    /// Remove a data variable, returning it if present.
    pub fn drop_var(&mut self, name: &str) -> Option<DataArray> {
        self.data_vars.remove(name)
    }

    /// Look up a data variable.
    pub fn var(&self, name: &str) -> Option<&DataArray> {
        self.data_vars.get(name)
    }
}

impl DataObject for Dataset {
    fn kind(&self) -> &'static str {
        "Dataset"
    }

    fn as_dataset(&self) -> Option<&dyn DatasetLike> {
        Some(self)
    }
}

impl DatasetLike for Dataset {
    fn data_vars(&self) -> BTreeMap<&str, &dyn ArrayLike> {
        self.data_vars
            .iter()
            .map(|(k, v)| (k.as_str(), v as &dyn ArrayLike))
            .collect()
    }

    fn coords(&self) -> BTreeMap<&str, &dyn ArrayLike> {
        self.coords
            .iter()
            .map(|(k, v)| (k.as_str(), v as &dyn ArrayLike))
            .collect()
    }

    fn attrs(&self) -> &Attrs {
        &self.attrs
    }
}
