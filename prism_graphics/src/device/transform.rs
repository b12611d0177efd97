/// Projection / view / world matrices and the projection stack

use glam::{Mat4, Vec4};

use crate::error::Result;
use crate::gfx_bail;
use super::device::Device;
use super::device_bindings::BindingDirty;

#[derive(Debug, Clone)]
pub(crate) struct TransformStack {
    projection: Mat4,
    view: Mat4,
    world: Mat4,
    saved: Vec<Mat4>,
}

impl TransformStack {
    pub(crate) fn new() -> Self {
        Self {
            projection: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
            world: Mat4::IDENTITY,
            saved: Vec::new(),
        }
    }

    pub(crate) fn view_proj(&self) -> Mat4 {
        self.projection * self.view
    }

    pub(crate) fn world(&self) -> Mat4 {
        self.world
    }
}

fn check_range(low: f32, high: f32, what: &str) -> Result<()> {
    if (high - low).abs() <= f32::EPSILON || !low.is_finite() || !high.is_finite() {
        gfx_bail!("prism::Device", Configuration, "degenerate {} range ({}, {})", what, low, high);
    }
    Ok(())
}

/// Off-center perspective projection, right-handed, depth mapped to 0..1
fn frustum_rh(left: f32, right: f32, top: f32, bottom: f32, znear: f32, zfar: f32) -> Mat4 {
    let width = right - left;
    let height = top - bottom;
    let depth = zfar - znear;
    Mat4::from_cols(
        Vec4::new(2.0 * znear / width, 0.0, 0.0, 0.0),
        Vec4::new(0.0, 2.0 * znear / height, 0.0, 0.0),
        Vec4::new((right + left) / width, (top + bottom) / height, -zfar / depth, -1.0),
        Vec4::new(0.0, 0.0, -zfar * znear / depth, 0.0),
    )
}

impl Device {
    pub fn set_projection(&mut self, projection: Mat4) {
        self.transforms.projection = projection;
        self.bindings.dirty |= BindingDirty::VIEW_PROJ;
    }

    pub fn set_view(&mut self, view: Mat4) {
        self.transforms.view = view;
        self.bindings.dirty |= BindingDirty::VIEW_PROJ;
    }

    /// Object transform written into the vertex shader's `World` parameter
    pub fn set_world(&mut self, world: Mat4) {
        self.transforms.world = world;
        self.bindings.dirty |= BindingDirty::WORLD;
    }

    pub fn world(&self) -> Mat4 {
        self.transforms.world
    }

    pub fn projection(&self) -> Mat4 {
        self.transforms.projection
    }

    pub fn view(&self) -> Mat4 {
        self.transforms.view
    }

    /// Projection × view, as written into `ViewProj`
    pub fn view_proj(&self) -> Mat4 {
        self.transforms.view_proj()
    }

    /// Orthographic projection with `top` / `bottom` in screen order
    pub fn ortho(&mut self, left: f32, right: f32, top: f32, bottom: f32, znear: f32, zfar: f32) -> Result<()> {
        check_range(left, right, "horizontal")?;
        check_range(top, bottom, "vertical")?;
        check_range(znear, zfar, "depth")?;
        self.set_projection(Mat4::orthographic_rh(left, right, bottom, top, znear, zfar));
        Ok(())
    }

    /// Perspective projection from the near-plane rectangle
    pub fn frustum(&mut self, left: f32, right: f32, top: f32, bottom: f32, znear: f32, zfar: f32) -> Result<()> {
        check_range(left, right, "horizontal")?;
        check_range(top, bottom, "vertical")?;
        check_range(znear, zfar, "depth")?;
        if znear <= 0.0 {
            gfx_bail!("prism::Device", Configuration, "frustum near plane must be positive (got {})", znear);
        }
        self.set_projection(frustum_rh(left, right, top, bottom, znear, zfar));
        Ok(())
    }

    /// Save the current projection
    pub fn push_projection(&mut self) {
        self.transforms.saved.push(self.transforms.projection);
    }

    /// Restore the last saved projection
    pub fn pop_projection(&mut self) {
        match self.transforms.saved.pop() {
            Some(projection) => self.set_projection(projection),
            None => crate::gfx_warn!("prism::Device", "pop_projection() on an empty projection stack"),
        }
    }

    pub fn projection_depth(&self) -> usize {
        self.transforms.saved.len()
    }
}

#[cfg(test)]
#[path = "transform_tests.rs"]
mod tests;
