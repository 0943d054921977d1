//! # Property Values
//!
//! The closed set of value types a property can hold, plus the cubic
//! spline used to blend between keyframes.

use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Discriminant of a [`PropertyValue`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Int,
    Double,
    String,
    Vec2,
    Vec3,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::Int => "int",
            ValueType::Double => "double",
            ValueType::String => "string",
            ValueType::Vec2 => "vec2",
            ValueType::Vec3 => "vec3",
        };
        f.write_str(name)
    }
}

/// Uniform value type for property keyframes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyValue {
    Int(i64),
    Double(f64),
    String(String),
    Vec2(Vec2),
    Vec3(Vec3),
}

impl PropertyValue {
    pub fn value_type(&self) -> ValueType {
        match self {
            PropertyValue::Int(_) => ValueType::Int,
            PropertyValue::Double(_) => ValueType::Double,
            PropertyValue::String(_) => ValueType::String,
            PropertyValue::Vec2(_) => ValueType::Vec2,
            PropertyValue::Vec3(_) => ValueType::Vec3,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            PropertyValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            PropertyValue::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_vec2(&self) -> Option<Vec2> {
        match self {
            PropertyValue::Vec2(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_vec3(&self) -> Option<Vec3> {
        match self {
            PropertyValue::Vec3(v) => Some(*v),
            _ => None,
        }
    }

    /// Parse `text` as a value of the given type.
    ///
    /// Vectors are written as comma separated components (`"1.5,-2"`).
    pub fn parse_as(value_type: ValueType, text: &str) -> Result<Self, ModelError> {
        let invalid = || ModelError::InvalidValue {
            value_type,
            text: text.to_string(),
        };
        let components = || -> Result<Vec<f64>, ModelError> {
            text.split(',')
                .map(|part| part.trim().parse::<f64>().map_err(|_| invalid()))
                .collect()
        };

        match value_type {
            ValueType::Int => text.trim().parse().map(PropertyValue::Int).map_err(|_| invalid()),
            ValueType::Double => text.trim().parse().map(PropertyValue::Double).map_err(|_| invalid()),
            ValueType::String => Ok(PropertyValue::String(text.to_string())),
            ValueType::Vec2 => match components()?.as_slice() {
                [x, y] => Ok(PropertyValue::Vec2(Vec2::new(*x, *y))),
                _ => Err(invalid()),
            },
            ValueType::Vec3 => match components()?.as_slice() {
                [x, y, z] => Ok(PropertyValue::Vec3(Vec3::new(*x, *y, *z))),
                _ => Err(invalid()),
            },
        }
    }

    /// Blend between `p1` and `p2` with the Catmull-Rom basis.
    ///
    /// `p0` and `p3` are the outer control points. Strings (and any
    /// mismatched combination) step to `p1`. Ints are blended in floating
    /// point and rounded to the nearest integer.
    pub fn catmull_rom(p0: &Self, p1: &Self, p2: &Self, p3: &Self, alpha: f64) -> Self {
        use PropertyValue as V;

        match (p0, p1, p2, p3) {
            (V::Int(a), V::Int(b), V::Int(c), V::Int(d)) => {
                V::Int(spline(*a as f64, *b as f64, *c as f64, *d as f64, alpha).round() as i64)
            }
            (V::Double(a), V::Double(b), V::Double(c), V::Double(d)) => {
                V::Double(spline(*a, *b, *c, *d, alpha))
            }
            (V::Vec2(a), V::Vec2(b), V::Vec2(c), V::Vec2(d)) => V::Vec2(Vec2::new(
                spline(a.x, b.x, c.x, d.x, alpha),
                spline(a.y, b.y, c.y, d.y, alpha),
            )),
            (V::Vec3(a), V::Vec3(b), V::Vec3(c), V::Vec3(d)) => V::Vec3(Vec3::new(
                spline(a.x, b.x, c.x, d.x, alpha),
                spline(a.y, b.y, c.y, d.y, alpha),
                spline(a.z, b.z, c.z, d.z, alpha),
            )),
            _ => p1.clone(),
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Int(v) => write!(f, "{}", v),
            PropertyValue::Double(v) => write!(f, "{}", v),
            PropertyValue::String(v) => write!(f, "{:?}", v),
            PropertyValue::Vec2(v) => write!(f, "({}, {})", v.x, v.y),
            PropertyValue::Vec3(v) => write!(f, "({}, {}, {})", v.x, v.y, v.z),
        }
    }
}

impl From<i64> for PropertyValue {
    fn from(v: i64) -> Self {
        PropertyValue::Int(v)
    }
}

impl From<f64> for PropertyValue {
    fn from(v: f64) -> Self {
        PropertyValue::Double(v)
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        PropertyValue::String(v.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(v: String) -> Self {
        PropertyValue::String(v)
    }
}

impl From<Vec2> for PropertyValue {
    fn from(v: Vec2) -> Self {
        PropertyValue::Vec2(v)
    }
}

impl From<Vec3> for PropertyValue {
    fn from(v: Vec3) -> Self {
        PropertyValue::Vec3(v)
    }
}

// Standard 4-point Catmull-Rom basis
fn spline(p0: f64, p1: f64, p2: f64, p3: f64, t: f64) -> f64 {
    let t2 = t * t;
    let t3 = t2 * t;
    0.5 * (2.0 * p1
        + (-p0 + p2) * t
        + (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * t2
        + (-p0 + 3.0 * p1 - 3.0 * p2 + p3) * t3)
}
