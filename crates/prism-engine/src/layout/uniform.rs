use crate::error::LayoutError;

/// Size of one scalar component (`f32`) in bytes.
pub const SCALAR_SIZE: u64 = 4;

/// Record alignment mandated for uniform structs by WGSL.
pub const UNIFORM_ALIGNMENT: u64 = 16;

pub const COLOR: &str = "color";
pub const SCALE: &str = "scale";
pub const OFFSET: &str = "offset";

/// One named field of a uniform record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformField {
    pub name: String,
    /// Offset in scalars (4-byte units) from the start of the record.
    pub offset: usize,
    /// Number of 4-byte scalar components.
    pub components: u32,
}

impl UniformField {
    /// Scalar index range covered by this field.
    #[inline]
    pub fn range(&self) -> std::ops::Range<usize> {
        self.offset..self.offset + self.components as usize
    }
}

/// Fixed byte layout of one object's uniform record.
///
/// Fields are packed sequentially in declaration order. A field is never
/// padded into place: if the running offset does not satisfy the field's WGSL
/// alignment (scalar 4, vec2 8, vec3/vec4 16 bytes) construction fails with
/// [`LayoutError::Misaligned`]. The record size is rounded up to the record
/// alignment.
///
/// Immutable once built; share it behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformLayout {
    fields: Vec<UniformField>,
    total_size: u64,
}

impl UniformLayout {
    /// Builds a layout from `(name, component_count)` pairs.
    pub fn new(fields: &[(&str, u32)], alignment: u64) -> Result<Self, LayoutError> {
        if alignment < SCALAR_SIZE || !alignment.is_power_of_two() {
            return Err(LayoutError::Alignment(alignment));
        }
        if fields.is_empty() {
            return Err(LayoutError::Empty);
        }

        let mut packed: Vec<UniformField> = Vec::with_capacity(fields.len());
        let mut cursor: u64 = 0; // bytes

        for &(name, components) in fields {
            if packed.iter().any(|f| f.name == name) {
                return Err(LayoutError::DuplicateField(name.to_string()));
            }

            let align = component_alignment(components).ok_or_else(|| {
                LayoutError::ComponentCount {
                    name: name.to_string(),
                    components,
                }
            })?;

            if cursor % align != 0 {
                return Err(LayoutError::Misaligned {
                    name: name.to_string(),
                    offset: cursor,
                    align,
                });
            }

            packed.push(UniformField {
                name: name.to_string(),
                offset: (cursor / SCALAR_SIZE) as usize,
                components,
            });
            cursor += u64::from(components) * SCALAR_SIZE;
        }

        Ok(Self {
            fields: packed,
            total_size: cursor.next_multiple_of(alignment),
        })
    }

    /// The `color: vec4f, scale: vec2f, offset: vec2f` record read by the
    /// bundled triangle shader.
    pub fn color_scale_offset() -> Result<Self, LayoutError> {
        Self::new(&[(COLOR, 4), (SCALE, 2), (OFFSET, 2)], UNIFORM_ALIGNMENT)
    }

    /// Scalar offset of `name`.
    pub fn offset_of(&self, name: &str) -> Result<usize, LayoutError> {
        self.field(name)
            .map(|f| f.offset)
            .ok_or_else(|| LayoutError::UnknownField(name.to_string()))
    }

    pub fn field(&self, name: &str) -> Option<&UniformField> {
        self.fields.iter().find(|f| f.name == name)
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Fields in declaration (and offset) order.
    #[inline]
    pub fn fields(&self) -> &[UniformField] {
        &self.fields
    }

    /// Record size in bytes, a multiple of the alignment passed to [`new`](Self::new).
    #[inline]
    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    /// Record size in 4-byte scalars.
    #[inline]
    pub fn scalar_count(&self) -> usize {
        (self.total_size / SCALAR_SIZE) as usize
    }
}

fn component_alignment(components: u32) -> Option<u64> {
    match components {
        1 => Some(4),
        2 => Some(8),
        3 | 4 => Some(16),
        _ => None,
    }
}
