// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Pixel formats an attachment can use.

/// Defines the memory format of pixels in an attachment.
///
/// The discriminants are the driver's native format codes, so a format can be
/// forwarded with [`Format::raw`] and hashed as a plain word.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Format {
    /// No format; only valid for unused attachment slots.
    #[default]
    Undefined = 0,
    // 8-bit, one component
    /// One 8-bit unsigned normalized component.
    R8Unorm = 9,
    /// One 8-bit signed normalized component.
    R8Snorm = 10,
    /// One 8-bit unsigned scaled component.
    R8Uscaled = 11,
    /// One 8-bit signed scaled component.
    R8Sscaled = 12,
    /// One 8-bit unsigned integer component.
    R8Uint = 13,
    /// One 8-bit signed integer component.
    R8Sint = 14,
    /// One 8-bit sRGB component.
    R8Srgb = 15,
    // 8-bit, two components
    /// Two 8-bit unsigned normalized components.
    Rg8Unorm = 16,
    /// Two 8-bit signed normalized components.
    Rg8Snorm = 17,
    /// Two 8-bit unsigned scaled components.
    Rg8Uscaled = 18,
    /// Two 8-bit signed scaled components.
    Rg8Sscaled = 19,
    /// Two 8-bit unsigned integer components.
    Rg8Uint = 20,
    /// Two 8-bit signed integer components.
    Rg8Sint = 21,
    /// Two 8-bit sRGB components.
    Rg8Srgb = 22,
    // 8-bit, three components
    /// Three 8-bit unsigned normalized components.
    Rgb8Unorm = 23,
    /// Three 8-bit signed normalized components.
    Rgb8Snorm = 24,
    /// Three 8-bit unsigned scaled components.
    Rgb8Uscaled = 25,
    /// Three 8-bit signed scaled components.
    Rgb8Sscaled = 26,
    /// Three 8-bit unsigned integer components.
    Rgb8Uint = 27,
    /// Three 8-bit signed integer components.
    Rgb8Sint = 28,
    /// Three 8-bit sRGB components.
    Rgb8Srgb = 29,
    // 8-bit, four components
    /// Four 8-bit unsigned normalized components (RGBA).
    Rgba8Unorm = 37,
    /// Four 8-bit signed normalized components (RGBA).
    Rgba8Snorm = 38,
    /// Four 8-bit unsigned scaled components (RGBA).
    Rgba8Uscaled = 39,
    /// Four 8-bit signed scaled components (RGBA).
    Rgba8Sscaled = 40,
    /// Four 8-bit unsigned integer components (RGBA).
    Rgba8Uint = 41,
    /// Four 8-bit signed integer components (RGBA).
    Rgba8Sint = 42,
    /// Four 8-bit sRGB components (RGBA).
    Rgba8Srgb = 43,
    /// Four 8-bit unsigned normalized components (BGRA). A common swapchain format.
    Bgra8Unorm = 44,
    /// Four 8-bit sRGB components (BGRA). A common swapchain format.
    Bgra8Srgb = 50,
    // Depth/stencil formats
    /// A 16-bit unsigned normalized depth format.
    D16Unorm = 124,
    /// A 32-bit float depth format.
    D32Sfloat = 126,
    /// A 24-bit unsigned normalized depth format with an 8-bit stencil component.
    D24UnormS8Uint = 129,
    /// A 32-bit float depth format with an 8-bit stencil component.
    D32SfloatS8Uint = 130,
}

impl Format {
    /// Returns the driver's native format code.
    pub const fn raw(self) -> u32 {
        self as u32
    }

    /// Whether this format carries a depth component.
    pub const fn has_depth(self) -> bool {
        matches!(
            self,
            Format::D16Unorm | Format::D32Sfloat | Format::D24UnormS8Uint | Format::D32SfloatS8Uint
        )
    }
}
