use std::any::Any;
use std::fmt;
use std::sync::Arc;

use smallvec::SmallVec;

use crate::Symbol;

/// A constant attribute carried by a node, most often the `value` of a
/// `prim::constant`.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    IntList(Vec<i64>),
    Str(String),
    Tensor(TensorData),
    Packed(PackedConstant),
}

impl AttrValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_int_list(&self) -> Option<&[i64]> {
        match self {
            Self::IntList(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_tensor(&self) -> Option<&TensorData> {
        match self {
            Self::Tensor(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_packed(&self) -> Option<&PackedConstant> {
        match self {
            Self::Packed(p) => Some(p),
            _ => None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// The static type this literal carries.
    pub fn type_ann(&self) -> TypeAnn {
        match self {
            Self::None => TypeAnn::NoneType,
            Self::Bool(_) => TypeAnn::Bool,
            Self::Int(_) => TypeAnn::Int,
            Self::Float(_) => TypeAnn::Float,
            Self::IntList(_) => TypeAnn::IntList,
            Self::Str(_) => TypeAnn::Str,
            Self::Tensor(_) => TypeAnn::Tensor,
            Self::Packed(p) => TypeAnn::Opaque(p.kind.clone()),
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(v) => {
                if v.fract() == 0.0 && v.is_finite() {
                    write!(f, "{v:.1}")
                } else {
                    write!(f, "{v}")
                }
            }
            Self::IntList(l) => {
                f.write_str("[")?;
                for (i, x) in l.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{x}")?;
                }
                f.write_str("]")
            }
            Self::Str(s) => write!(f, "{s:?}"),
            Self::Tensor(t) => write!(f, "<tensor {:?}>", t.shape.as_slice()),
            Self::Packed(p) => write!(f, "<packed {}>", p.kind),
        }
    }
}

/// A concrete constant tensor, dense row-major `f32` storage.
#[derive(Debug, Clone, PartialEq)]
pub struct TensorData {
    pub shape: SmallVec<[usize; 4]>,
    pub data: Vec<f32>,
}

impl TensorData {
    pub fn new(shape: impl IntoIterator<Item = usize>, data: Vec<f32>) -> Self {
        let shape: SmallVec<[usize; 4]> = shape.into_iter().collect();
        debug_assert_eq!(shape.iter().product::<usize>(), data.len());
        Self { shape, data }
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Swap the two axes of a rank-2 tensor. Panics on other ranks.
    pub fn transpose2d(&self) -> Self {
        assert_eq!(self.rank(), 2, "transpose2d on rank-{} tensor", self.rank());
        let (rows, cols) = (self.shape[0], self.shape[1]);
        let mut data = vec![0.0; self.data.len()];
        for r in 0..rows {
            for c in 0..cols {
                data[c * rows + r] = self.data[r * cols + c];
            }
        }
        Self::new([cols, rows], data)
    }
}

/// An opaque backend blob produced by folding a prepack operation.
///
/// Payloads are not introspectable here; equality is payload identity.
#[derive(Clone)]
pub struct PackedConstant {
    pub kind: Symbol,
    payload: Arc<dyn Any + Send + Sync>,
}

impl PackedConstant {
    pub fn new<T: Any + Send + Sync>(kind: Symbol, payload: T) -> Self {
        Self { kind, payload: Arc::new(payload) }
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.payload.downcast_ref()
    }
}

impl PartialEq for PackedConstant {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.payload, &other.payload)
    }
}

impl fmt::Debug for PackedConstant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PackedConstant").field("kind", &self.kind).finish_non_exhaustive()
    }
}

/// Optional static type annotation attached to a value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeAnn {
    Tensor,
    Int,
    Float,
    Bool,
    Str,
    IntList,
    NoneType,
    /// Backend-defined context classes such as `vk::LinearContext`.
    Opaque(Symbol),
}

impl fmt::Display for TypeAnn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tensor => f.write_str("Tensor"),
            Self::Int => f.write_str("int"),
            Self::Float => f.write_str("float"),
            Self::Bool => f.write_str("bool"),
            Self::Str => f.write_str("str"),
            Self::IntList => f.write_str("int[]"),
            Self::NoneType => f.write_str("None"),
            Self::Opaque(s) => write!(f, "{s}"),
        }
    }
}

impl TypeAnn {
    pub(crate) fn parse(text: &str) -> Self {
        match text {
            "Tensor" => Self::Tensor,
            "int" => Self::Int,
            "float" => Self::Float,
            "bool" => Self::Bool,
            "str" => Self::Str,
            "int[]" => Self::IntList,
            "None" => Self::NoneType,
            other => Self::Opaque(Symbol::new(other)),
        }
    }
}
