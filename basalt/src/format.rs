use ash::vk;

use crate::types::TextureAspect;

/// Texture formats exposed by the device surface. One-to-one with the
/// Vulkan formats the original set covers; the mapping lives in
/// [`TextureFormat::to_vk`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    R4G4,
    R4G4B4A4,
    B4G4R4A4,
    R5G6B5,
    B5G6R5,
    R5G5B5A1,
    B5G5R5A1,
    A1R5G5B5,
    R8Uint,
    R8Sint,
    R8Unorm,
    R8Snorm,
    R8G8Uint,
    R8G8Sint,
    R8G8Unorm,
    R8G8Snorm,
    R8G8B8Uint,
    R8G8B8Sint,
    R8G8B8Unorm,
    R8G8B8Snorm,
    B8G8R8Uint,
    B8G8R8Sint,
    B8G8R8Unorm,
    B8G8R8Snorm,
    R8G8B8A8Uint,
    R8G8B8A8Sint,
    R8G8B8A8Unorm,
    R8G8B8A8Snorm,
    B8G8R8A8Uint,
    B8G8R8A8Sint,
    B8G8R8A8Unorm,
    B8G8R8A8Snorm,
    A8B8G8R8Uint,
    A8B8G8R8Sint,
    A8B8G8R8Unorm,
    A8B8G8R8Snorm,
    A2R10G10B10Uint,
    A2R10G10B10Sint,
    A2R10G10B10Unorm,
    A2R10G10B10Snorm,
    A2B10G10R10Uint,
    A2B10G10R10Sint,
    A2B10G10R10Unorm,
    A2B10G10R10Snorm,
    R16Uint,
    R16Sint,
    R16Unorm,
    R16Snorm,
    R16Float,
    R16G16Uint,
    R16G16Sint,
    R16G16Unorm,
    R16G16Snorm,
    R16G16Float,
    R16G16B16Uint,
    R16G16B16Sint,
    R16G16B16Unorm,
    R16G16B16Snorm,
    R16G16B16Float,
    R16G16B16A16Uint,
    R16G16B16A16Sint,
    R16G16B16A16Unorm,
    R16G16B16A16Snorm,
    R16G16B16A16Float,
    R32Uint,
    R32Sint,
    R32Float,
    R32G32Uint,
    R32G32Sint,
    R32G32Float,
    R32G32B32Uint,
    R32G32B32Sint,
    R32G32B32Float,
    R32G32B32A32Uint,
    R32G32B32A32Sint,
    R32G32B32A32Float,
    R64Uint,
    R64Sint,
    R64Float,
    R64G64Uint,
    R64G64Sint,
    R64G64Float,
    R64G64B64Uint,
    R64G64B64Sint,
    R64G64B64Float,
    R64G64B64A64Uint,
    R64G64B64A64Sint,
    R64G64B64A64Float,
    B10G11R11Float,
    D16Unorm,
    D32Float,
    S8Uint,
    D16UnormS8Uint,
    D24UnormS8Uint,
    D32FloatS8Uint,
    Bc1RgbaUnorm,
    Bc1RgbaSrgb,
    Bc2Unorm,
    Bc2Srgb,
    Bc3Unorm,
    Bc3Srgb,
    Bc4Unorm,
    Bc4Snorm,
    Bc5Unorm,
    Bc5Snorm,
    Bc7Unorm,
    Bc7Srgb,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TextureFormatDesc {
    pub aspect: TextureAspect,
}

impl TextureFormat {
    pub fn desc(&self) -> TextureFormatDesc {
        let aspect = match self {
            TextureFormat::D16Unorm | TextureFormat::D32Float => TextureAspect::DEPTH,
            TextureFormat::S8Uint => TextureAspect::STENCIL,
            TextureFormat::D16UnormS8Uint
            | TextureFormat::D24UnormS8Uint
            | TextureFormat::D32FloatS8Uint => TextureAspect::DEPTH | TextureAspect::STENCIL,
            _ => TextureAspect::COLOR,
        };
        TextureFormatDesc { aspect }
    }

    pub fn to_vk(&self) -> vk::Format {
        match self {
            TextureFormat::R4G4 => vk::Format::R4G4_UNORM_PACK8,
            TextureFormat::R4G4B4A4 => vk::Format::R4G4B4A4_UNORM_PACK16,
            TextureFormat::B4G4R4A4 => vk::Format::B4G4R4A4_UNORM_PACK16,
            TextureFormat::R5G6B5 => vk::Format::R5G6B5_UNORM_PACK16,
            TextureFormat::B5G6R5 => vk::Format::B5G6R5_UNORM_PACK16,
            TextureFormat::R5G5B5A1 => vk::Format::R5G5B5A1_UNORM_PACK16,
            TextureFormat::B5G5R5A1 => vk::Format::B5G5R5A1_UNORM_PACK16,
            TextureFormat::A1R5G5B5 => vk::Format::A1R5G5B5_UNORM_PACK16,
            TextureFormat::R8Uint => vk::Format::R8_UINT,
            TextureFormat::R8Sint => vk::Format::R8_SINT,
            TextureFormat::R8Unorm => vk::Format::R8_UNORM,
            TextureFormat::R8Snorm => vk::Format::R8_SNORM,
            TextureFormat::R8G8Uint => vk::Format::R8G8_UINT,
            TextureFormat::R8G8Sint => vk::Format::R8G8_SINT,
            TextureFormat::R8G8Unorm => vk::Format::R8G8_UNORM,
            TextureFormat::R8G8Snorm => vk::Format::R8G8_SNORM,
            TextureFormat::R8G8B8Uint => vk::Format::R8G8B8_UINT,
            TextureFormat::R8G8B8Sint => vk::Format::R8G8B8_SINT,
            TextureFormat::R8G8B8Unorm => vk::Format::R8G8B8_UNORM,
            TextureFormat::R8G8B8Snorm => vk::Format::R8G8B8_SNORM,
            TextureFormat::B8G8R8Uint => vk::Format::B8G8R8_UINT,
            TextureFormat::B8G8R8Sint => vk::Format::B8G8R8_SINT,
            TextureFormat::B8G8R8Unorm => vk::Format::B8G8R8_UNORM,
            TextureFormat::B8G8R8Snorm => vk::Format::B8G8R8_SNORM,
            TextureFormat::R8G8B8A8Uint => vk::Format::R8G8B8A8_UINT,
            TextureFormat::R8G8B8A8Sint => vk::Format::R8G8B8A8_SINT,
            TextureFormat::R8G8B8A8Unorm => vk::Format::R8G8B8A8_UNORM,
            TextureFormat::R8G8B8A8Snorm => vk::Format::R8G8B8A8_SNORM,
            TextureFormat::B8G8R8A8Uint => vk::Format::B8G8R8A8_UINT,
            TextureFormat::B8G8R8A8Sint => vk::Format::B8G8R8A8_SINT,
            TextureFormat::B8G8R8A8Unorm => vk::Format::B8G8R8A8_UNORM,
            TextureFormat::B8G8R8A8Snorm => vk::Format::B8G8R8A8_SNORM,
            TextureFormat::A8B8G8R8Uint => vk::Format::A8B8G8R8_UINT_PACK32,
            TextureFormat::A8B8G8R8Sint => vk::Format::A8B8G8R8_SINT_PACK32,
            TextureFormat::A8B8G8R8Unorm => vk::Format::A8B8G8R8_UNORM_PACK32,
            TextureFormat::A8B8G8R8Snorm => vk::Format::A8B8G8R8_SNORM_PACK32,
            TextureFormat::A2R10G10B10Uint => vk::Format::A2R10G10B10_UINT_PACK32,
            TextureFormat::A2R10G10B10Sint => vk::Format::A2R10G10B10_SINT_PACK32,
            TextureFormat::A2R10G10B10Unorm => vk::Format::A2R10G10B10_UNORM_PACK32,
            TextureFormat::A2R10G10B10Snorm => vk::Format::A2R10G10B10_SNORM_PACK32,
            TextureFormat::A2B10G10R10Uint => vk::Format::A2B10G10R10_UINT_PACK32,
            TextureFormat::A2B10G10R10Sint => vk::Format::A2B10G10R10_SINT_PACK32,
            TextureFormat::A2B10G10R10Unorm => vk::Format::A2B10G10R10_UNORM_PACK32,
            TextureFormat::A2B10G10R10Snorm => vk::Format::A2B10G10R10_SNORM_PACK32,
            TextureFormat::R16Uint => vk::Format::R16_UINT,
            TextureFormat::R16Sint => vk::Format::R16_SINT,
            TextureFormat::R16Unorm => vk::Format::R16_UNORM,
            TextureFormat::R16Snorm => vk::Format::R16_SNORM,
            TextureFormat::R16Float => vk::Format::R16_SFLOAT,
            TextureFormat::R16G16Uint => vk::Format::R16G16_UINT,
            TextureFormat::R16G16Sint => vk::Format::R16G16_SINT,
            TextureFormat::R16G16Unorm => vk::Format::R16G16_UNORM,
            TextureFormat::R16G16Snorm => vk::Format::R16G16_SNORM,
            TextureFormat::R16G16Float => vk::Format::R16G16_SFLOAT,
            TextureFormat::R16G16B16Uint => vk::Format::R16G16B16_UINT,
            TextureFormat::R16G16B16Sint => vk::Format::R16G16B16_SINT,
            TextureFormat::R16G16B16Unorm => vk::Format::R16G16B16_UNORM,
            TextureFormat::R16G16B16Snorm => vk::Format::R16G16B16_SNORM,
            TextureFormat::R16G16B16Float => vk::Format::R16G16B16_SFLOAT,
            TextureFormat::R16G16B16A16Uint => vk::Format::R16G16B16A16_UINT,
            TextureFormat::R16G16B16A16Sint => vk::Format::R16G16B16A16_SINT,
            TextureFormat::R16G16B16A16Unorm => vk::Format::R16G16B16A16_UNORM,
            TextureFormat::R16G16B16A16Snorm => vk::Format::R16G16B16A16_SNORM,
            TextureFormat::R16G16B16A16Float => vk::Format::R16G16B16A16_SFLOAT,
            TextureFormat::R32Uint => vk::Format::R32_UINT,
            TextureFormat::R32Sint => vk::Format::R32_SINT,
            TextureFormat::R32Float => vk::Format::R32_SFLOAT,
            TextureFormat::R32G32Uint => vk::Format::R32G32_UINT,
            TextureFormat::R32G32Sint => vk::Format::R32G32_SINT,
            TextureFormat::R32G32Float => vk::Format::R32G32_SFLOAT,
            TextureFormat::R32G32B32Uint => vk::Format::R32G32B32_UINT,
            TextureFormat::R32G32B32Sint => vk::Format::R32G32B32_SINT,
            TextureFormat::R32G32B32Float => vk::Format::R32G32B32_SFLOAT,
            TextureFormat::R32G32B32A32Uint => vk::Format::R32G32B32A32_UINT,
            TextureFormat::R32G32B32A32Sint => vk::Format::R32G32B32A32_SINT,
            TextureFormat::R32G32B32A32Float => vk::Format::R32G32B32A32_SFLOAT,
            TextureFormat::R64Uint => vk::Format::R64_UINT,
            TextureFormat::R64Sint => vk::Format::R64_SINT,
            TextureFormat::R64Float => vk::Format::R64_SFLOAT,
            TextureFormat::R64G64Uint => vk::Format::R64G64_UINT,
            TextureFormat::R64G64Sint => vk::Format::R64G64_SINT,
            TextureFormat::R64G64Float => vk::Format::R64G64_SFLOAT,
            TextureFormat::R64G64B64Uint => vk::Format::R64G64B64_UINT,
            TextureFormat::R64G64B64Sint => vk::Format::R64G64B64_SINT,
            TextureFormat::R64G64B64Float => vk::Format::R64G64B64_SFLOAT,
            TextureFormat::R64G64B64A64Uint => vk::Format::R64G64B64A64_UINT,
            TextureFormat::R64G64B64A64Sint => vk::Format::R64G64B64A64_SINT,
            TextureFormat::R64G64B64A64Float => vk::Format::R64G64B64A64_SFLOAT,
            TextureFormat::B10G11R11Float => vk::Format::B10G11R11_UFLOAT_PACK32,
            TextureFormat::D16Unorm => vk::Format::D16_UNORM,
            TextureFormat::D32Float => vk::Format::D32_SFLOAT,
            TextureFormat::S8Uint => vk::Format::S8_UINT,
            TextureFormat::D16UnormS8Uint => vk::Format::D16_UNORM_S8_UINT,
            TextureFormat::D24UnormS8Uint => vk::Format::D24_UNORM_S8_UINT,
            TextureFormat::D32FloatS8Uint => vk::Format::D32_SFLOAT_S8_UINT,
            TextureFormat::Bc1RgbaUnorm => vk::Format::BC1_RGBA_UNORM_BLOCK,
            TextureFormat::Bc1RgbaSrgb => vk::Format::BC1_RGBA_SRGB_BLOCK,
            TextureFormat::Bc2Unorm => vk::Format::BC2_UNORM_BLOCK,
            TextureFormat::Bc2Srgb => vk::Format::BC2_SRGB_BLOCK,
            TextureFormat::Bc3Unorm => vk::Format::BC3_UNORM_BLOCK,
            TextureFormat::Bc3Srgb => vk::Format::BC3_SRGB_BLOCK,
            TextureFormat::Bc4Unorm => vk::Format::BC4_UNORM_BLOCK,
            TextureFormat::Bc4Snorm => vk::Format::BC4_SNORM_BLOCK,
            TextureFormat::Bc5Unorm => vk::Format::BC5_UNORM_BLOCK,
            TextureFormat::Bc5Snorm => vk::Format::BC5_SNORM_BLOCK,
            TextureFormat::Bc7Unorm => vk::Format::BC7_UNORM_BLOCK,
            TextureFormat::Bc7Srgb => vk::Format::BC7_SRGB_BLOCK,
        }
    }
}

pub fn map_texture_aspect(aspect: TextureAspect) -> vk::ImageAspectFlags {
    let mut flags = vk::ImageAspectFlags::empty();
    if aspect.contains(TextureAspect::COLOR) {
        flags |= vk::ImageAspectFlags::COLOR;
    }
    if aspect.contains(TextureAspect::DEPTH) {
        flags |= vk::ImageAspectFlags::DEPTH;
    }
    if aspect.contains(TextureAspect::STENCIL) {
        flags |= vk::ImageAspectFlags::STENCIL;
    }
    flags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_formats_have_depth_aspect() {
        assert_eq!(TextureFormat::D32Float.desc().aspect, TextureAspect::DEPTH);
        assert_eq!(
            TextureFormat::D24UnormS8Uint.desc().aspect,
            TextureAspect::DEPTH | TextureAspect::STENCIL
        );
        assert_eq!(TextureFormat::S8Uint.desc().aspect, TextureAspect::STENCIL);
    }

    #[test]
    fn test_color_formats_have_color_aspect() {
        assert_eq!(
            TextureFormat::R8G8B8A8Unorm.desc().aspect,
            TextureAspect::COLOR
        );
        assert_eq!(TextureFormat::Bc7Srgb.desc().aspect, TextureAspect::COLOR);
    }
}
