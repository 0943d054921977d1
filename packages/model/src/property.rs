//! # Keyframed Properties
//!
//! A [`Property`] is an immutable timeline of values for one property slot
//! of a node. Keys are unique per frame and kept in ascending frame order.
//!
//! ## Sampling
//!
//! - No keys: the metadata default
//! - Exactly on a key: that key's value
//! - Before the first / after the last key: the boundary key's value
//! - Between two keys: Catmull-Rom spline through the bracketing pair and
//!   their outer neighbours; string values step to the earlier key
//!
//! Near the ends of the timeline a missing outer neighbour is replaced by
//! the bracketing key on that side, so a two-key timeline is sampled with
//! control points `(k0, k0, k1, k1)`.

use crate::error::{ModelError, ModelResult};
use crate::id::ContentHash;
use crate::registry::PropertyMetadata;
use crate::value::{PropertyValue, ValueType};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Frame number on the timeline
pub type Frame = f64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub frame: Frame,
    pub value: PropertyValue,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    metadata: Arc<PropertyMetadata>,
    keys: Vec<Keyframe>,
}

impl Property {
    /// Property without keys, sampling to the metadata default
    pub fn new(metadata: Arc<PropertyMetadata>) -> Self {
        Self {
            metadata,
            keys: Vec::new(),
        }
    }

    pub fn metadata(&self) -> &Arc<PropertyMetadata> {
        &self.metadata
    }

    /// Property type hash
    pub fn hash(&self) -> ContentHash {
        self.metadata.hash
    }

    /// Type hash of the node type declaring this property
    pub fn owner(&self) -> ContentHash {
        self.metadata.owner
    }

    pub fn title(&self) -> &str {
        &self.metadata.title
    }

    pub fn value_type(&self) -> ValueType {
        self.metadata.value_type()
    }

    pub fn keys(&self) -> &[Keyframe] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Sample the timeline at `frame`
    pub fn get(&self, frame: Frame) -> PropertyValue {
        let keys = &self.keys;
        if keys.is_empty() {
            return self.metadata.default.clone();
        }

        let next = keys.partition_point(|k| k.frame < frame);
        if next < keys.len() && keys[next].frame == frame {
            return keys[next].value.clone();
        }
        if next == 0 {
            return keys[0].value.clone();
        }
        if next == keys.len() {
            return keys[keys.len() - 1].value.clone();
        }

        let prev = next - 1;
        if self.value_type() == ValueType::String {
            return keys[prev].value.clone();
        }

        let before = prev.saturating_sub(1);
        let after = (next + 1).min(keys.len() - 1);
        let alpha = (frame - keys[prev].frame) / (keys[next].frame - keys[prev].frame);

        PropertyValue::catmull_rom(
            &keys[before].value,
            &keys[prev].value,
            &keys[next].value,
            &keys[after].value,
            alpha,
        )
    }

    pub fn builder(&self) -> PropertyBuilder {
        PropertyBuilder {
            metadata: self.metadata.clone(),
            keys: self.keys.clone(),
        }
    }
}

/// Produces a new [`Property`] from an existing one plus key edits
#[derive(Debug, Clone)]
pub struct PropertyBuilder {
    metadata: Arc<PropertyMetadata>,
    keys: Vec<Keyframe>,
}

impl PropertyBuilder {
    pub fn new(metadata: Arc<PropertyMetadata>) -> Self {
        Self {
            metadata,
            keys: Vec::new(),
        }
    }

    /// Insert or overwrite the key at `frame`
    pub fn set(&mut self, frame: Frame, value: impl Into<PropertyValue>) -> ModelResult<&mut Self> {
        if !frame.is_finite() {
            return Err(ModelError::InvalidFrame {
                property: self.metadata.hash,
                frame,
            });
        }

        let value = value.into();
        let expected = self.metadata.value_type();
        if value.value_type() != expected {
            return Err(ModelError::ValueTypeMismatch {
                property: self.metadata.hash,
                expected,
                actual: value.value_type(),
            });
        }

        let index = self.keys.partition_point(|k| k.frame < frame);
        match self.keys.get_mut(index) {
            Some(key) if key.frame == frame => key.value = value,
            _ => self.keys.insert(index, Keyframe { frame, value }),
        }
        Ok(self)
    }

    /// Remove the key at `frame`, returning whether one existed
    pub fn erase(&mut self, frame: Frame) -> bool {
        match self.keys.iter().position(|k| k.frame == frame) {
            Some(index) => {
                self.keys.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) -> &mut Self {
        self.keys.clear();
        self
    }

    pub fn build(self) -> Property {
        Property {
            metadata: self.metadata,
            keys: self.keys,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Vec2;

    fn metadata(default: impl Into<PropertyValue>) -> Arc<PropertyMetadata> {
        Arc::new(PropertyMetadata::new(ContentHash::of("Test"), "value", default))
    }

    fn property(default: impl Into<PropertyValue>, keys: Vec<(f64, PropertyValue)>) -> Property {
        let mut builder = PropertyBuilder::new(metadata(default));
        for (frame, value) in keys {
            builder.set(frame, value).unwrap();
        }
        builder.build()
    }

    #[test]
    fn test_empty_property_returns_default() {
        let prop = property(7i64, vec![]);
        assert_eq!(prop.get(0.0), PropertyValue::Int(7));
        assert_eq!(prop.get(1000.0), PropertyValue::Int(7));
    }

    #[test]
    fn test_numeric_interpolation() {
        let prop = property(0i64, vec![(0.0, (-500i64).into()), (100.0, 500i64.into())]);
        assert_eq!(prop.get(50.0), PropertyValue::Int(0));
        assert_eq!(prop.get(0.0), PropertyValue::Int(-500));
        assert_eq!(prop.get(100.0), PropertyValue::Int(500));
    }

    #[test]
    fn test_string_steps() {
        let prop = property("", vec![(0.0, "a".into()), (100.0, "b".into())]);
        assert_eq!(prop.get(50.0), PropertyValue::from("a"));
        assert_eq!(prop.get(99.9), PropertyValue::from("a"));
        assert_eq!(prop.get(100.0), PropertyValue::from("b"));
    }

    #[test]
    fn test_vec2_interpolation() {
        let prop = property(
            Vec2::default(),
            vec![
                (0.0, Vec2::new(-500.0, 50.0).into()),
                (100.0, Vec2::new(500.0, -50.0).into()),
            ],
        );
        assert_eq!(prop.get(50.0), PropertyValue::Vec2(Vec2::new(0.0, 0.0)));
    }

    #[test]
    fn test_clamps_outside_key_range() {
        let prop = property(0.0, vec![(10.0, 1.0.into()), (20.0, 2.0.into())]);
        assert_eq!(prop.get(-5.0), PropertyValue::Double(1.0));
        assert_eq!(prop.get(500.0), PropertyValue::Double(2.0));
    }

    #[test]
    fn test_interior_segment_uses_neighbours() {
        // Evenly spaced collinear keys: the spline reproduces the line
        let prop = property(
            0.0,
            vec![
                (0.0, 0.0.into()),
                (10.0, 10.0.into()),
                (20.0, 20.0.into()),
                (30.0, 30.0.into()),
            ],
        );
        let v = prop.get(15.0).as_double().unwrap();
        assert!((v - 15.0).abs() < 1e-9);

        // First segment clamps the missing outer neighbour
        let v = prop.get(5.0).as_double().unwrap();
        assert!(v > 0.0 && v < 10.0);
    }

    #[test]
    fn test_set_overwrites_and_keeps_order() {
        let mut builder = PropertyBuilder::new(metadata(0i64));
        builder.set(50.0, 1i64).unwrap();
        builder.set(10.0, 2i64).unwrap();
        builder.set(50.0, 3i64).unwrap();
        let prop = builder.build();

        let frames: Vec<_> = prop.keys().iter().map(|k| k.frame).collect();
        assert_eq!(frames, vec![10.0, 50.0]);
        assert_eq!(prop.get(50.0), PropertyValue::Int(3));
    }

    #[test]
    fn test_set_rejects_wrong_type() {
        let mut builder = PropertyBuilder::new(metadata(0i64));
        let err = builder.set(0.0, "nope").unwrap_err();
        assert!(matches!(err, ModelError::ValueTypeMismatch { .. }));
    }

    #[test]
    fn test_set_rejects_non_finite_frames() {
        let mut builder = PropertyBuilder::new(metadata(0i64));
        builder.set(0.0, 1i64).unwrap();
        for frame in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = builder.set(frame, 2i64).unwrap_err();
            assert!(matches!(err, ModelError::InvalidFrame { .. }));
        }

        let prop = builder.build();
        assert_eq!(prop.len(), 1);
        assert_eq!(prop.get(0.0), PropertyValue::Int(1));
    }

    #[test]
    fn test_erase() {
        let prop = property(0i64, vec![(0.0, 1i64.into()), (10.0, 2i64.into())]);
        let mut builder = prop.builder();
        assert!(builder.erase(0.0));
        assert!(!builder.erase(5.0));
        let edited = builder.build();

        assert_eq!(edited.len(), 1);
        // Original untouched
        assert_eq!(prop.len(), 2);
    }
}
