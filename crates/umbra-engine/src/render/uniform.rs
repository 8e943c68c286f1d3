use std::fmt;

use thiserror::Error;

use crate::coords::Vec2;
use crate::paint::Color;

/// Declared shape of a uniform block member.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum UniformType {
    Float,
    Vec2,
    Vec3,
    Vec4,
}

impl UniformType {
    #[inline]
    pub const fn components(self) -> usize {
        match self {
            UniformType::Float => 1,
            UniformType::Vec2 => 2,
            UniformType::Vec3 => 3,
            UniformType::Vec4 => 4,
        }
    }

    #[inline]
    pub const fn byte_size(self) -> usize {
        self.components() * 4
    }
}

impl fmt::Display for UniformType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UniformType::Float => "f32",
            UniformType::Vec2 => "vec2<f32>",
            UniformType::Vec3 => "vec3<f32>",
            UniformType::Vec4 => "vec4<f32>",
        })
    }
}

/// Typed uniform value.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
}

impl UniformValue {
    #[inline]
    pub fn ty(&self) -> UniformType {
        match self {
            UniformValue::Float(_) => UniformType::Float,
            UniformValue::Vec2(_) => UniformType::Vec2,
            UniformValue::Vec3(_) => UniformType::Vec3,
            UniformValue::Vec4(_) => UniformType::Vec4,
        }
    }

    #[inline]
    pub fn components(&self) -> &[f32] {
        match self {
            UniformValue::Float(v) => std::slice::from_ref(v),
            UniformValue::Vec2(v) => v,
            UniformValue::Vec3(v) => v,
            UniformValue::Vec4(v) => v,
        }
    }

    pub fn zero(ty: UniformType) -> Self {
        match ty {
            UniformType::Float => UniformValue::Float(0.0),
            UniformType::Vec2 => UniformValue::Vec2([0.0; 2]),
            UniformType::Vec3 => UniformValue::Vec3([0.0; 3]),
            UniformType::Vec4 => UniformValue::Vec4([0.0; 4]),
        }
    }
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        UniformValue::Float(v)
    }
}

impl From<[f32; 2]> for UniformValue {
    fn from(v: [f32; 2]) -> Self {
        UniformValue::Vec2(v)
    }
}

impl From<Vec2> for UniformValue {
    fn from(v: Vec2) -> Self {
        UniformValue::Vec2(v.to_array())
    }
}

impl From<[f32; 3]> for UniformValue {
    fn from(v: [f32; 3]) -> Self {
        UniformValue::Vec3(v)
    }
}

impl From<[f32; 4]> for UniformValue {
    fn from(v: [f32; 4]) -> Self {
        UniformValue::Vec4(v)
    }
}

impl From<Color> for UniformValue {
    fn from(c: Color) -> Self {
        UniformValue::Vec4(c.to_array())
    }
}

/// A write whose value shape differs from the declared member type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("uniform `{name}` is declared {declared} but was written with {got}")]
pub struct TypeMismatchError {
    pub name: String,
    pub declared: UniformType,
    pub got: UniformType,
}

/// Reflected uniform block member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformDecl {
    pub name: String,
    pub ty: UniformType,
    /// Byte offset inside the block.
    pub offset: u32,
}

/// Index of a member inside a `UniformBlock`, resolved once by name.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct UniformSlot(usize);

/// One uniform: declaration plus the last accepted value.
#[derive(Debug, Clone, PartialEq)]
pub struct Uniform {
    decl: UniformDecl,
    value: UniformValue,
}

impl Uniform {
    pub fn name(&self) -> &str {
        &self.decl.name
    }

    pub fn ty(&self) -> UniformType {
        self.decl.ty
    }

    pub fn offset(&self) -> u32 {
        self.decl.offset
    }

    pub fn value(&self) -> UniformValue {
        self.value
    }
}

/// CPU image of one uniform buffer.
///
/// Values are stored both typed (for inspection) and packed at their reflected
/// offsets (for upload). The packed bytes are flagged dirty on every accepted write.
#[derive(Debug, Clone)]
pub struct UniformBlock {
    uniforms: Vec<Uniform>,
    bytes: Vec<u8>,
    dirty: bool,
}

impl UniformBlock {
    /// Builds a zero-initialized block. `size` is raised to cover every member
    /// and rounded up to 16 bytes.
    pub fn new(decls: Vec<UniformDecl>, size: u32) -> Self {
        let end = decls
            .iter()
            .map(|d| d.offset as usize + d.ty.byte_size())
            .max()
            .unwrap_or(0);
        let len = (size as usize).max(end).max(16).next_multiple_of(16);

        let uniforms = decls
            .into_iter()
            .map(|decl| Uniform {
                value: UniformValue::zero(decl.ty),
                decl,
            })
            .collect();

        Self {
            uniforms,
            bytes: vec![0; len],
            dirty: true,
        }
    }

    pub fn slot(&self, name: &str) -> Option<UniformSlot> {
        self.uniforms
            .iter()
            .position(|u| u.decl.name == name)
            .map(UniformSlot)
    }

    pub fn get(&self, slot: UniformSlot) -> Option<&Uniform> {
        self.uniforms.get(slot.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Uniform> {
        self.uniforms.iter()
    }

    /// Writes `value` if its shape matches the declared type.
    ///
    /// On mismatch the stored value and packed bytes are left untouched.
    pub fn write(&mut self, slot: UniformSlot, value: UniformValue) -> Result<(), TypeMismatchError> {
        let Some(uniform) = self.uniforms.get_mut(slot.0) else {
            // Slots only come from `slot()` on this block.
            debug_assert!(false, "uniform slot {slot:?} out of range");
            return Ok(());
        };

        if value.ty() != uniform.decl.ty {
            return Err(TypeMismatchError {
                name: uniform.decl.name.clone(),
                declared: uniform.decl.ty,
                got: value.ty(),
            });
        }

        uniform.value = value;

        let start = uniform.decl.offset as usize;
        let src: &[u8] = bytemuck::cast_slice(value.components());
        self.bytes[start..start + src.len()].copy_from_slice(src);
        self.dirty = true;
        Ok(())
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns whether the packed bytes changed since the last call.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decl(name: &str, ty: UniformType, offset: u32) -> UniformDecl {
        UniformDecl { name: name.to_string(), ty, offset }
    }

    fn block() -> UniformBlock {
        UniformBlock::new(
            vec![
                decl("extent", UniformType::Vec2, 0),
                decl("light_color", UniformType::Vec3, 16),
                decl("intensity", UniformType::Float, 28),
            ],
            32,
        )
    }

    fn f32_at(bytes: &[u8], offset: usize) -> f32 {
        f32::from_ne_bytes(bytes[offset..offset + 4].try_into().unwrap())
    }

    // ── type checking ─────────────────────────────────────────────────────

    #[test]
    fn vec3_written_to_vec2_is_rejected_and_value_kept() {
        let mut b = block();
        let slot = b.slot("extent").unwrap();
        b.write(slot, UniformValue::Vec2([10.0, 20.0])).unwrap();
        b.take_dirty();

        let err = b.write(slot, UniformValue::Vec3([1.0, 2.0, 3.0])).unwrap_err();
        assert_eq!(err.name, "extent");
        assert_eq!(err.declared, UniformType::Vec2);
        assert_eq!(err.got, UniformType::Vec3);

        assert_eq!(b.get(slot).unwrap().value(), UniformValue::Vec2([10.0, 20.0]));
        assert_eq!(f32_at(b.bytes(), 0), 10.0);
        assert_eq!(f32_at(b.bytes(), 4), 20.0);
        assert!(!b.take_dirty());
    }

    #[test]
    fn scalar_written_to_vector_is_rejected() {
        let mut b = block();
        let slot = b.slot("light_color").unwrap();
        assert!(b.write(slot, UniformValue::Float(1.0)).is_err());
        assert_eq!(b.get(slot).unwrap().value(), UniformValue::Vec3([0.0; 3]));
    }

    #[test]
    fn mismatch_message_names_both_types() {
        let mut b = block();
        let slot = b.slot("intensity").unwrap();
        let msg = b.write(slot, UniformValue::Vec2([1.0, 2.0])).unwrap_err().to_string();
        assert!(msg.contains("intensity"));
        assert!(msg.contains("f32"));
        assert!(msg.contains("vec2<f32>"));
    }

    // ── packing ───────────────────────────────────────────────────────────

    #[test]
    fn accepted_write_packs_at_offset() {
        let mut b = block();
        let slot = b.slot("light_color").unwrap();
        b.write(slot, UniformValue::Vec3([0.25, 0.5, 0.75])).unwrap();
        assert_eq!(f32_at(b.bytes(), 16), 0.25);
        assert_eq!(f32_at(b.bytes(), 20), 0.5);
        assert_eq!(f32_at(b.bytes(), 24), 0.75);
        assert_eq!(f32_at(b.bytes(), 28), 0.0);
        assert!(b.take_dirty());
    }

    #[test]
    fn block_size_rounds_up_to_sixteen() {
        let b = UniformBlock::new(vec![decl("x", UniformType::Float, 0)], 4);
        assert_eq!(b.bytes().len(), 16);
        let b = UniformBlock::new(vec![decl("v", UniformType::Vec4, 16)], 0);
        assert_eq!(b.bytes().len(), 32);
    }

    // ── lookup ────────────────────────────────────────────────────────────

    #[test]
    fn unknown_name_has_no_slot() {
        assert_eq!(block().slot("missing"), None);
    }

    #[test]
    fn value_shapes() {
        assert_eq!(UniformValue::from(Vec2::new(1.0, 2.0)).ty(), UniformType::Vec2);
        assert_eq!(UniformValue::from(Color::white()).components(), &[1.0, 1.0, 1.0, 1.0]);
        assert_eq!(UniformType::Vec3.byte_size(), 12);
    }
}
