//! Uniform Resources
//!
//! [`UniformVariable`] carries one typed shader parameter; binding records
//! its current value into the command stream. [`UniformBuffer`] carries a
//! whole POD block. Both are freely shared between passes and nodes, so
//! value updates go through interior mutability.

use std::cell::{Cell, RefCell};

use bytemuck::Pod;
use glam::{Mat4, Vec2, Vec3, Vec4};

use super::bindable::{Bindable, ResourceId, next_resource_id};
use super::state::GraphicsState;

/// A uniform value snapshot travelling through the command stream.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UniformValue {
    Int(i32),
    UInt(u32),
    Float(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat4(Mat4),
}

impl UniformValue {
    /// Raw bytes of the value, padded the way std140 lays it out.
    #[must_use]
    pub fn as_bytes(&self) -> Vec<u8> {
        match self {
            UniformValue::Int(v) => bytemuck::bytes_of(v).to_vec(),
            UniformValue::UInt(v) => bytemuck::bytes_of(v).to_vec(),
            UniformValue::Float(v) => bytemuck::bytes_of(v).to_vec(),
            UniformValue::Vec2(v) => bytemuck::bytes_of(v).to_vec(),
            UniformValue::Vec3(v) => {
                let padded = Vec4::new(v.x, v.y, v.z, 0.0);
                bytemuck::bytes_of(&padded).to_vec()
            }
            UniformValue::Vec4(v) => bytemuck::bytes_of(v).to_vec(),
            UniformValue::Mat4(v) => bytemuck::bytes_of(v).to_vec(),
        }
    }
}

macro_rules! impl_uniform_from {
    ($($ty:ty => $variant:ident),+ $(,)?) => {
        $(impl From<$ty> for UniformValue {
            fn from(value: $ty) -> Self {
                UniformValue::$variant(value)
            }
        })+
    };
}

impl_uniform_from! {
    i32 => Int,
    u32 => UInt,
    f32 => Float,
    Vec2 => Vec2,
    Vec3 => Vec3,
    Vec4 => Vec4,
    Mat4 => Mat4,
}

/// A single typed shader parameter.
///
/// The value is a [`Cell`]: passes hold the variable behind an `Arc` and
/// systems update it between frames.
pub struct UniformVariable<T: Copy + Into<UniformValue> + 'static> {
    id: ResourceId,
    name: String,
    value: Cell<T>,
}

impl<T: Copy + Into<UniformValue> + 'static> UniformVariable<T> {
    #[must_use]
    pub fn new(name: &str, value: T) -> Self {
        Self {
            id: next_resource_id(),
            name: name.to_string(),
            value: Cell::new(value),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn value(&self) -> T {
        self.value.get()
    }

    pub fn set_value(&self, value: T) {
        self.value.set(value);
    }
}

impl<T: Copy + Into<UniformValue> + 'static> Bindable for UniformVariable<T> {
    fn resource_id(&self) -> ResourceId {
        self.id
    }

    fn bind(&self, state: &mut GraphicsState) {
        state.set_uniform(self.id, self.value.get().into());
    }

    fn unbind(&self, _state: &mut GraphicsState) {
        // Uniform writes are not stateful; nothing to restore.
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

/// A uniform block: one POD struct uploaded as a whole.
pub struct UniformBuffer {
    id: ResourceId,
    label: String,
    data: RefCell<Vec<u8>>,
    dirty: Cell<bool>,
}

impl UniformBuffer {
    #[must_use]
    pub fn new<T: Pod>(label: &str, value: &T) -> Self {
        Self {
            id: next_resource_id(),
            label: label.to_string(),
            data: RefCell::new(bytemuck::bytes_of(value).to_vec()),
            dirty: Cell::new(true),
        }
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Replaces the block contents.
    pub fn set_data<T: Pod>(&self, value: &T) {
        let mut data = self.data.borrow_mut();
        data.clear();
        data.extend_from_slice(bytemuck::bytes_of(value));
        self.dirty.set(true);
    }

    #[must_use]
    pub fn bytes(&self) -> Vec<u8> {
        self.data.borrow().clone()
    }

    /// True when the contents changed since the last upload; clears the
    /// flag.
    pub fn take_dirty(&self) -> bool {
        self.dirty.replace(false)
    }
}

impl Bindable for UniformBuffer {
    fn resource_id(&self) -> ResourceId {
        self.id
    }

    fn bind(&self, _state: &mut GraphicsState) {
        // Blocks are resident; residency and upload are backend concerns
        // keyed by the resource id recorded at draw time.
    }

    fn unbind(&self, _state: &mut GraphicsState) {}

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
