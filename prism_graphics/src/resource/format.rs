/// Pixel formats for colour textures and depth-stencil buffers

// ===== COLOR FORMAT =====

/// Colour texture format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorFormat {
    A8,
    R8,
    RGBA,
    BGRX,
    BGRA,
    R10G10B10A2,
    RGBA16,
    R16,
    RGBA16F,
    RGBA32F,
    RG16F,
    RG32F,
    R16F,
    R32F,
    DXT1,
    DXT3,
    DXT5,
}

impl ColorFormat {
    /// Every colour format, in declaration order
    pub const ALL: [ColorFormat; 17] = [
        ColorFormat::A8,
        ColorFormat::R8,
        ColorFormat::RGBA,
        ColorFormat::BGRX,
        ColorFormat::BGRA,
        ColorFormat::R10G10B10A2,
        ColorFormat::RGBA16,
        ColorFormat::R16,
        ColorFormat::RGBA16F,
        ColorFormat::RGBA32F,
        ColorFormat::RG16F,
        ColorFormat::RG32F,
        ColorFormat::R16F,
        ColorFormat::R32F,
        ColorFormat::DXT1,
        ColorFormat::DXT3,
        ColorFormat::DXT5,
    ];

    /// Bits per pixel (block formats report their average)
    pub fn bits_per_pixel(&self) -> u32 {
        match self {
            ColorFormat::A8 | ColorFormat::R8 => 8,
            ColorFormat::R16 | ColorFormat::R16F => 16,
            ColorFormat::RGBA
            | ColorFormat::BGRX
            | ColorFormat::BGRA
            | ColorFormat::R10G10B10A2
            | ColorFormat::RG16F
            | ColorFormat::R32F => 32,
            ColorFormat::RGBA16 | ColorFormat::RGBA16F | ColorFormat::RG32F => 64,
            ColorFormat::RGBA32F => 128,
            ColorFormat::DXT1 => 4,
            ColorFormat::DXT3 | ColorFormat::DXT5 => 8,
        }
    }

    /// True for 4x4 block-compressed formats
    pub fn is_compressed(&self) -> bool {
        matches!(self, ColorFormat::DXT1 | ColorFormat::DXT3 | ColorFormat::DXT5)
    }

    /// Byte size of one mip level of `width` x `height` pixels
    pub fn level_size(&self, width: u32, height: u32) -> usize {
        let width = width.max(1) as usize;
        let height = height.max(1) as usize;
        if self.is_compressed() {
            // 4x4 blocks, 16 pixels per block
            let block_bytes = self.bits_per_pixel() as usize * 16 / 8;
            width.div_ceil(4) * height.div_ceil(4) * block_bytes
        } else {
            width * height * self.bits_per_pixel() as usize / 8
        }
    }

    /// Byte size of one row of level 0 (one row of blocks for compressed formats)
    pub fn row_pitch(&self, width: u32) -> usize {
        let width = width.max(1) as usize;
        if self.is_compressed() {
            width.div_ceil(4) * self.bits_per_pixel() as usize * 16 / 8
        } else {
            width * self.bits_per_pixel() as usize / 8
        }
    }
}

// ===== DEPTH-STENCIL FORMAT =====

/// Depth-stencil buffer format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ZStencilFormat {
    Z16,
    Z24S8,
    Z32F,
    Z32FS8X24,
}

impl ZStencilFormat {
    /// Bytes per texel
    pub fn bytes_per_pixel(&self) -> u32 {
        match self {
            ZStencilFormat::Z16 => 2,
            ZStencilFormat::Z24S8 | ZStencilFormat::Z32F => 4,
            ZStencilFormat::Z32FS8X24 => 8,
        }
    }

    /// True if the format carries stencil bits
    pub fn has_stencil(&self) -> bool {
        matches!(self, ZStencilFormat::Z24S8 | ZStencilFormat::Z32FS8X24)
    }
}

// ===== MIP CHAIN =====

/// Number of levels in a full mip chain: `floor(log2(max(w, h))) + 1`
pub fn full_mip_chain(width: u32, height: u32) -> u32 {
    let size = width.max(height).max(1);
    32 - size.leading_zeros()
}

/// Dimensions of mip `level` for a `width` x `height` base level
pub fn mip_dimensions(width: u32, height: u32, level: u32) -> (u32, u32) {
    let w = width.checked_shr(level).unwrap_or(0).max(1);
    let h = height.checked_shr(level).unwrap_or(0).max(1);
    (w, h)
}

#[cfg(test)]
#[path = "format_tests.rs"]
mod tests;
