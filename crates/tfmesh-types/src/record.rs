//! [`TransformRecord`] – one observed parent → child edge at one instant.

use serde::Serialize;

use crate::geometry::{Quaternion, Transform3D, Vec3};
use crate::stamp::Stamp;
use crate::TfError;

/// An immutable, validated observation of `child`'s pose in `parent` at
/// `stamp`.
///
/// Construction is the only validation point: once a record exists its
/// translation is finite and its rotation is a unit quaternion.  Non-unit
/// rotations are normalized; non-finite components and degenerate
/// quaternions are rejected.
///
/// A record marked static (see [`TransformRecord::into_static`]) describes a
/// fixed relation such as a sensor mount: it holds at every instant, not just
/// at its stamp.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransformRecord {
    parent: String,
    child: String,
    transform: Transform3D,
    stamp: Stamp,
    is_static: bool,
}

impl TransformRecord {
    pub fn new(
        parent: impl Into<String>,
        child: impl Into<String>,
        translation: Vec3,
        rotation: Quaternion,
        stamp: Stamp,
    ) -> Result<Self, TfError> {
        let parent = parent.into();
        let child = child.into();

        let malformed = |reason: &str| TfError::MalformedRecord {
            parent: parent.clone(),
            child: child.clone(),
            reason: reason.to_string(),
        };

        if parent.is_empty() || child.is_empty() {
            return Err(malformed("empty frame id"));
        }
        if parent == child {
            return Err(malformed("parent and child are the same frame"));
        }
        if !translation.is_finite() {
            return Err(malformed("non-finite translation"));
        }
        let rotation = rotation
            .normalized()
            .ok_or_else(|| malformed("rotation is not a valid quaternion"))?;

        Ok(Self {
            parent,
            child,
            transform: Transform3D::new(translation, rotation),
            stamp,
            is_static: false,
        })
    }

    /// Mark this record as a fixed relation, valid at any time.
    pub fn into_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn is_static(&self) -> bool {
        self.is_static
    }

    pub fn parent(&self) -> &str {
        &self.parent
    }

    pub fn child(&self) -> &str {
        &self.child
    }

    pub fn stamp(&self) -> Stamp {
        self.stamp
    }

    pub fn translation(&self) -> Vec3 {
        self.transform.translation
    }

    pub fn rotation(&self) -> Quaternion {
        self.transform.rotation
    }

    /// The child's pose in the parent frame.
    pub fn transform(&self) -> Transform3D {
        self.transform
    }
}
