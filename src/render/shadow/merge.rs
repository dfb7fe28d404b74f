//! Shadow Merge Node
//!
//! Combines every shadow map into one screen-space shadow texture: a
//! full-screen plane draw that, per pixel, reconstructs the world position
//! from the camera depth (via the inverse camera view-projection) and tests
//! it against each active light's map.

use std::any::Any;
use std::sync::Arc;

use glam::Mat4;

use super::MAX_SHADOWS;
use crate::graph::{BindableSlot, NodeContext, NodeSpec, RenderNode};
use crate::graphics::{
    Bindable, FrameBuffer, GraphicsState, Mesh, PrimitiveType, Program, Texture, UniformVariable,
};

/// Texture unit of the camera-space position texture.
pub const POSITION_UNIT: u32 = MAX_SHADOWS as u32;

/// Texture unit of the camera-space normal texture.
pub const NORMAL_UNIT: u32 = MAX_SHADOWS as u32 + 1;

/// Slot of the pass-through target framebuffer.
const TARGET_SLOT: usize = 0;
/// Slots `SHADOW_SLOT0 .. SHADOW_SLOT0 + MAX_SHADOWS` hold the shadow maps.
const SHADOW_SLOT0: usize = 1;
const POSITION_SLOT: usize = SHADOW_SLOT0 + MAX_SHADOWS;
const NORMAL_SLOT: usize = POSITION_SLOT + 1;

struct ShadowUniforms {
    active: Arc<UniformVariable<i32>>,
    view_projection: Arc<UniformVariable<Mat4>>,
}

/// Merges the shadow maps into the target under the camera's perspective.
pub struct MergeShadowsNode {
    program: Arc<Program>,
    plane: Arc<Mesh>,
    inv_camera_vp: Arc<UniformVariable<Mat4>>,
    shadows: Vec<ShadowUniforms>,
}

impl MergeShadowsNode {
    /// `program` is the pre-compiled merge program, `plane` the full-screen
    /// triangle pair it samples with.
    #[must_use]
    pub fn new(program: Arc<Program>, plane: Arc<Mesh>) -> Self {
        let shadows = (0..MAX_SHADOWS)
            .map(|i| ShadowUniforms {
                active: Arc::new(UniformVariable::new(&format!("u_shadows[{i}].active"), 0)),
                view_projection: Arc::new(UniformVariable::new(
                    &format!("u_shadows[{i}].view_projection"),
                    Mat4::IDENTITY,
                )),
            })
            .collect();

        Self {
            program,
            plane,
            inv_camera_vp: Arc::new(UniformVariable::new(
                "u_inv_camera_view_projection",
                Mat4::IDENTITY,
            )),
            shadows,
        }
    }

    /// Updates the inverse view-projection of the scene camera.
    pub fn set_inv_camera_vp(&self, inv_view_projection: Mat4) {
        self.inv_camera_vp.set_value(inv_view_projection);
    }

    /// Enables or disables shadow `index` in the merge.
    pub fn enable_shadow(&self, index: usize, active: bool) {
        if let Some(shadow) = self.shadows.get(index) {
            shadow.active.set_value(i32::from(active));
        }
    }

    /// Updates the view-projection the shadow map at `index` was rendered
    /// with.
    pub fn set_shadow_vp(&self, index: usize, view_projection: Mat4) {
        if let Some(shadow) = self.shadows.get(index) {
            shadow.view_projection.set_value(view_projection);
        }
    }

    fn bind_texture_slot(
        slots: &[BindableSlot],
        state: &mut GraphicsState,
        slot: usize,
        unit: u32,
    ) {
        if let Some(bindable) = slots.get(slot).and_then(BindableSlot::value) {
            if let Some(texture) = bindable.as_any().downcast_ref::<Texture>() {
                texture.set_unit(unit);
            }
            bindable.bind(state);
        }
    }
}

impl RenderNode for MergeShadowsNode {
    fn spec(&self) -> NodeSpec {
        let mut spec = NodeSpec::new()
            .slot(None, true)
            .input::<FrameBuffer>("target", TARGET_SLOT)
            .output::<FrameBuffer>("target", TARGET_SLOT)
            .attach_input("attach")
            .attach_output("attach");
        for i in 0..MAX_SHADOWS {
            // Bound manually after unit assignment, hence no auto-bind.
            spec = spec
                .slot(None, false)
                .input::<Texture>(&format!("shadow{i}"), SHADOW_SLOT0 + i);
        }
        spec = spec
            .slot(None, false)
            .input::<Texture>("position", POSITION_SLOT)
            .slot(None, false)
            .input::<Texture>("normal", NORMAL_SLOT);
        spec
    }

    fn execute(&mut self, ctx: &mut NodeContext<'_>) {
        // The slot array reference is Copy; lift it out so the state can be
        // reborrowed mutably alongside it.
        let slots = ctx.slots;
        let state = &mut *ctx.state;

        self.program.bind(state);
        self.inv_camera_vp.bind(state);

        for (i, shadow) in self.shadows.iter().enumerate() {
            shadow.active.bind(state);
            shadow.view_projection.bind(state);
            Self::bind_texture_slot(slots, state, SHADOW_SLOT0 + i, i as u32);
        }
        Self::bind_texture_slot(slots, state, POSITION_SLOT, POSITION_UNIT);
        Self::bind_texture_slot(slots, state, NORMAL_SLOT, NORMAL_UNIT);

        self.plane.draw(state, PrimitiveType::Triangles);

        for i in 0..self.shadows.len() {
            if let Some(bindable) = slots.get(SHADOW_SLOT0 + i).and_then(BindableSlot::value) {
                bindable.unbind(state);
            }
        }
        if let Some(bindable) = slots.get(POSITION_SLOT).and_then(BindableSlot::value) {
            bindable.unbind(state);
        }
        if let Some(bindable) = slots.get(NORMAL_SLOT).and_then(BindableSlot::value) {
            bindable.unbind(state);
        }
        self.program.unbind(state);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
