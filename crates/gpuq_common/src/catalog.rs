//! The baseline requirement list.
//!
//! Declaration order is the waterfall order: a device is charged to the
//! first requirement it misses, so cheap, broad rules come first and
//! format-specific rules last.

use crate::constants::VkConstants;
use crate::error::Result;
use crate::requirement::{format_supported_with_tiling_features, Requirement, Tiling};
use crate::view::CapabilityView;

/// Build the baseline requirements in waterfall order.
///
/// Fails with `UnknownConstant` if the registry lacks a format or flag
/// the list refers to.
pub fn baseline(vk: &VkConstants) -> Result<Vec<Requirement>> {
    let mut rqs = vec![
        Requirement::new("API version variant is 0", |v: &CapabilityView| v.api_version.variant == 0),
        Requirement::new("API version is 1.x.x", |v: &CapabilityView| v.api_version.major == 1),
        Requirement::feature("robustBufferAccess"),
        Requirement::new("standardSampleLocations", |v: &CapabilityView| {
            v.limits.scalar("standardSampleLocations") == Some(1.0)
        }),
    ];

    for (name, min) in [
        ("maxBoundDescriptorSets", 4),
        ("maxDescriptorSetUniformBuffersDynamic", 8),
        ("maxDescriptorSetStorageBuffersDynamic", 4),
        ("maxPerStageDescriptorSampledImages", 16),
        ("maxPerStageDescriptorSamplers", 16),
        ("maxPerStageDescriptorStorageBuffers", 8),
        ("maxPerStageDescriptorStorageImages", 4),
        ("maxPerStageDescriptorUniformBuffers", 12),
        ("maxUniformBufferRange", 65536),
        ("maxStorageBufferRange", 134_217_728),
    ] {
        rqs.push(Requirement::min_limit(name, min));
    }

    rqs.push(Requirement::max_limit("minUniformBufferOffsetAlignment", 256));
    rqs.push(Requirement::max_limit("minStorageBufferOffsetAlignment", 256));

    for (name, min) in [
        ("maxVertexInputBindings", 8),
        ("maxVertexInputAttributes", 16),
        ("maxVertexInputBindingStride", 2048),
        ("maxVertexInputAttributeOffset", 2047),
        ("maxVertexOutputComponents", 64),
        ("maxFragmentInputComponents", 64),
        ("maxComputeSharedMemorySize", 16384),
        ("maxComputeWorkGroupInvocations", 256),
    ] {
        rqs.push(Requirement::min_limit(name, min));
    }
    rqs.push(Requirement::min_components("maxComputeWorkGroupSize", &[256.0, 256.0, 64.0]));
    rqs.push(Requirement::min_components("maxComputeWorkGroupCount", &[65535.0, 65535.0, 65535.0]));

    for (name, min) in [
        ("maxColorAttachments", 8),
        ("maxImageDimension2D", 8192),
        ("maxImageDimensionCube", 8192),
        ("maxFramebufferWidth", 8192),
        ("maxFramebufferHeight", 8192),
    ] {
        rqs.push(Requirement::min_limit(name, min));
    }
    rqs.push(Requirement::min_component("maxViewportDimensions", 0, 8192.0));
    rqs.push(Requirement::min_component("maxViewportDimensions", 1, 8192.0));
    rqs.push(Requirement::max_component("viewportBoundsRange", 0, -8192.0));
    rqs.push(Requirement::min_component("viewportBoundsRange", 1, 8192.0));
    for (name, min) in [
        ("maxImageDimension1D", 8192),
        ("maxImageDimension3D", 2048),
        ("maxImageArrayLayers", 256),
    ] {
        rqs.push(Requirement::min_limit(name, min));
    }

    let samples_1_4 = vk.sample_count("1")? | vk.sample_count("4")?;
    rqs.push(Requirement::bits_limit("framebufferColorSampleCounts", samples_1_4));
    rqs.push(Requirement::bits_limit("framebufferDepthSampleCounts", samples_1_4));

    rqs.push(Requirement::min_limit("maxFragmentCombinedOutputResources", 8));

    for feature in [
        "fragmentStoresAndAtomics",
        "fullDrawIndexUint32",
        "depthBiasClamp",
        "imageCubeArray",
        "independentBlend",
        "sampleRateShading",
    ] {
        rqs.push(Requirement::feature(feature));
    }

    rqs.push(Requirement::new("has BC || (ETC2 && ASTC LDR 2D)", |v: &CapabilityView| {
        v.has_feature("textureCompressionBC")
            || (v.has_feature("textureCompressionETC2") && v.has_feature("textureCompressionASTC_LDR"))
    }));

    rqs.push(Requirement::new(
        "viewport Y-flip: Vulkan 1.1 or VK_KHR_maintenance1 or VK_AMD_negative_viewport_height",
        |v: &CapabilityView| {
            v.api_version.at_least(1, 1, 0)
                || v.has_extension("VK_KHR_maintenance1")
                || v.has_extension("VK_AMD_negative_viewport_height")
        },
    ));

    rqs.extend(depth_stencil_formats(vk)?);
    Ok(rqs)
}

/// Depth/stencil texture formats. Each must be sampleable and usable as a
/// depth-stencil attachment with optimal tiling.
fn depth_stencil_formats(vk: &VkConstants) -> Result<Vec<Requirement>> {
    let ds_flags = vk.format_feature("SAMPLED_IMAGE")? | vk.format_feature("DEPTH_STENCIL_ATTACHMENT")?;

    let any_of = |name: &str, formats: Vec<u32>| {
        Requirement::new(name, move |v: &CapabilityView| {
            formats
                .iter()
                .any(|f| format_supported_with_tiling_features(&v.formats, *f, ds_flags, Tiling::Optimal))
        })
    };

    let d16 = vk.format("D16_UNORM")?;
    let x8_d24 = vk.format("X8_D24_UNORM_PACK32")?;
    let d32 = vk.format("D32_SFLOAT")?;
    let s8 = vk.format("S8_UINT")?;
    let d16_s8 = vk.format("D16_UNORM_S8_UINT")?;
    let d24_s8 = vk.format("D24_UNORM_S8_UINT")?;
    let d32_s8 = vk.format("D32_SFLOAT_S8_UINT")?;

    Ok(vec![
        any_of("depth16unorm", vec![d16]),
        any_of("depth32float", vec![d32]),
        any_of("depth24plus", vec![x8_d24, d32]),
        any_of("depth24plus-stencil8", vec![d24_s8, d32_s8]),
        any_of("stencil8 any format", vec![d24_s8, d16_s8, d32_s8, s8]),
        any_of("stencil8 <= 4 bytes", vec![d24_s8, s8]),
    ])
}
