//! Unreal-style bloom.
//!
//! Bright pixels are extracted with a luminosity high-pass at half resolution,
//! blurred by a separable gaussian through a chain of halving mip levels, and the
//! levels are weighted and added back onto the input scene.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::data_structures::texture::{self, Texture};

pub const NUM_MIPS: usize = 5;
/// Base weight of each mip level before the radius mix.
pub const BLOOM_FACTORS: [f32; NUM_MIPS] = [1.0, 0.8, 0.6, 0.4, 0.2];
/// Gaussian kernel radius per mip level; the sigma equals the radius.
pub const KERNEL_RADII: [u32; NUM_MIPS] = [3, 5, 7, 9, 11];

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BloomConfig {
    /// Luminance above which pixels start to bloom.
    pub threshold: f32,
    /// Width of the smoothstep ramp above the threshold.
    pub smooth_width: f32,
    pub strength: f32,
    /// Shifts weight from the fine mips towards the wide ones, in `[0, 1]`.
    pub radius: f32,
}

impl Default for BloomConfig {
    fn default() -> Self {
        Self {
            threshold: 0.2,
            smooth_width: 0.01,
            strength: 0.45,
            radius: 0.1,
        }
    }
}

/// Per-level weights: `mix(f, 1.2 - f, radius)`.
pub fn mix_bloom_factors(radius: f32) -> [f32; NUM_MIPS] {
    BLOOM_FACTORS.map(|f| f + (1.2 - f - f) * radius)
}

/// Sizes of the blur levels. The first is half the viewport, each next one halves again.
pub fn mip_sizes(width: u32, height: u32) -> [[u32; 2]; NUM_MIPS] {
    let mut sizes = [[1, 1]; NUM_MIPS];
    let mut w = (width as f32 / 2.0).round() as u32;
    let mut h = (height as f32 / 2.0).round() as u32;
    for size in sizes.iter_mut() {
        *size = [w.max(1), h.max(1)];
        w = (w as f32 / 2.0).round() as u32;
        h = (h as f32 / 2.0).round() as u32;
    }
    sizes
}

pub fn gaussian_pdf(x: f32, sigma: f32) -> f32 {
    0.39894 * (-0.5 * x * x / (sigma * sigma)).exp() / sigma
}

/// Normalised one-sided weights `[w0, w1, ...]` of the separable blur as the shader applies them.
pub fn gaussian_weights(kernel_radius: u32) -> Vec<f32> {
    let sigma = kernel_radius as f32;
    let raw: Vec<f32> = (0..kernel_radius.max(1))
        .map(|i| gaussian_pdf(i as f32, sigma))
        .collect();
    let sum = raw[0] + 2.0 * raw[1..].iter().sum::<f32>();
    raw.into_iter().map(|w| w / sum).collect()
}

/// Widest kernel the blur uniform has room for.
const MAX_KERNEL_RADIUS: usize = 12;

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct BlurParams {
    pub direction: [f32; 2],
    pub texel_size: [f32; 2],
    pub kernel_radius: f32,
    pub threshold: f32,
    pub smooth_width: f32,
    pub _padding: f32,
    /// `gaussian_weights(kernel_radius)` packed four to a row.
    pub weights: [[f32; 4]; MAX_KERNEL_RADIUS / 4],
}

impl BlurParams {
    fn high_pass(size: [u32; 2], config: &BloomConfig) -> Self {
        Self {
            direction: [0.0, 0.0],
            texel_size: texel_size(size),
            kernel_radius: 0.0,
            threshold: config.threshold,
            smooth_width: config.smooth_width,
            _padding: 0.0,
            weights: [[0.0; 4]; MAX_KERNEL_RADIUS / 4],
        }
    }

    fn blur(direction: [f32; 2], size: [u32; 2], kernel_radius: u32, config: &BloomConfig) -> Self {
        let mut weights = [[0.0; 4]; MAX_KERNEL_RADIUS / 4];
        let coefficients = gaussian_weights(kernel_radius);
        for (i, w) in coefficients.iter().take(MAX_KERNEL_RADIUS).enumerate() {
            weights[i / 4][i % 4] = *w;
        }
        Self {
            direction,
            kernel_radius: coefficients.len().min(MAX_KERNEL_RADIUS) as f32,
            weights,
            ..Self::high_pass(size, config)
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct CompositeParams {
    pub weights: [f32; 4],
    pub last_weight: f32,
    pub strength: f32,
    pub _padding: [f32; 2],
}

impl CompositeParams {
    fn new(config: &BloomConfig) -> Self {
        let w = mix_bloom_factors(config.radius);
        Self {
            weights: [w[0], w[1], w[2], w[3]],
            last_weight: w[4],
            strength: config.strength,
            _padding: [0.0; 2],
        }
    }
}

/// A render target, the bind group sampling it, and the params of the pass writing it.
struct Stage {
    target: Texture,
    source: wgpu::BindGroup,
    params: wgpu::BindGroup,
}

struct MipLevel {
    horizontal: Stage,
    vertical: Stage,
}

struct Layouts {
    params: wgpu::BindGroupLayout,
    texture: wgpu::BindGroupLayout,
    blurred: wgpu::BindGroupLayout,
}

struct Targets {
    bright: Stage,
    mips: Vec<MipLevel>,
    blurred: wgpu::BindGroup,
}

pub struct BloomPipeline {
    pub config: BloomConfig,
    format: wgpu::TextureFormat,
    layouts: Layouts,
    high_pass_pipeline: wgpu::RenderPipeline,
    blur_pipeline: wgpu::RenderPipeline,
    composite_pipeline: wgpu::RenderPipeline,
    composite_params: wgpu::BindGroup,
    sampler: wgpu::Sampler,
    targets: Targets,
    /// Samples the scene image the bloom is added onto.
    input: Option<wgpu::BindGroup>,
}

impl BloomPipeline {
    /// `format` is used for the internal targets, `output_format` for the composite.
    pub fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        output_format: wgpu::TextureFormat,
        config: BloomConfig,
        size: [u32; 2],
    ) -> Self {
        let params_layout = super::uniform_layout(device, "bloom-params-layout");
        let texture_layout = texture::sampled_texture_layout(device, "bloom-texture-layout");
        let blurred_layout = blurred_layout(device);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("bloom-shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("bloom.wgsl").into()),
        });
        let composite_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("bloom-composite-shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("bloom_composite.wgsl").into()),
        });

        let blur_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("bloom-blur-layout"),
            bind_group_layouts: &[&params_layout, &texture_layout],
            immediate_size: 0,
        });
        let composite_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("bloom-composite-layout"),
            bind_group_layouts: &[&params_layout, &texture_layout, &blurred_layout],
            immediate_size: 0,
        });

        let high_pass_pipeline = super::mk_fullscreen_pipeline(
            device,
            &shader,
            &blur_layout,
            "fs_high_pass",
            format,
            None,
            "bloom-high-pass",
        );
        let blur_pipeline =
            super::mk_fullscreen_pipeline(device, &shader, &blur_layout, "fs_blur", format, None, "bloom-blur");
        let composite_pipeline = super::mk_fullscreen_pipeline(
            device,
            &composite_shader,
            &composite_layout,
            "fs_composite",
            output_format,
            None,
            "bloom-composite",
        );

        let composite_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("bloom-composite-params"),
            contents: bytemuck::cast_slice(&[CompositeParams::new(&config)]),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let composite_params =
            super::uniform_bind_group(device, &params_layout, &composite_buffer, "bloom-composite-params-bg");

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("bloom-sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let layouts = Layouts {
            params: params_layout,
            texture: texture_layout,
            blurred: blurred_layout,
        };
        let targets = Targets::new(device, &layouts, &sampler, format, &config, size);

        Self {
            config,
            format,
            layouts,
            high_pass_pipeline,
            blur_pipeline,
            composite_pipeline,
            composite_params,
            sampler,
            targets,
            input: None,
        }
    }

    /// Recreate the bright and mip targets for a new viewport size.
    pub fn resize(&mut self, device: &wgpu::Device, size: [u32; 2]) {
        self.targets = Targets::new(device, &self.layouts, &self.sampler, self.format, &self.config, size);
    }

    /// Sample `input` from now on. Call again whenever the input texture is recreated.
    pub fn bind_input(&mut self, device: &wgpu::Device, input: &Texture) {
        self.input = match input.sampler.as_ref() {
            Some(sampler) => Some(texture::sampled_texture_bind_group(
                device,
                &self.layouts.texture,
                &input.view,
                sampler,
                "bloom-input",
            )),
            None => {
                log::warn!("Bloom input has no sampler");
                None
            }
        };
    }

    /// Sizes of the bright-pass target followed by every blur level.
    pub fn target_sizes(&self) -> Vec<[u32; 2]> {
        std::iter::once(self.targets.bright.target.size())
            .chain(self.targets.mips.iter().map(|level| level.vertical.target.size()))
            .collect()
    }

    /// Run high-pass, blur chain and composite, writing `input + bloom` to `output`.
    pub fn render(&self, encoder: &mut wgpu::CommandEncoder, output: &wgpu::TextureView) {
        let Some(input_bind_group) = self.input.as_ref() else {
            log::warn!("Bloom has no bound input, skipping");
            return;
        };

        let targets = &self.targets;
        run_pass(
            encoder,
            &self.high_pass_pipeline,
            &[&targets.bright.params, input_bind_group],
            &targets.bright.target.view,
            "bloom-high-pass",
        );

        let mut source = &targets.bright.source;
        for (i, level) in targets.mips.iter().enumerate() {
            run_pass(
                encoder,
                &self.blur_pipeline,
                &[&level.horizontal.params, source],
                &level.horizontal.target.view,
                &format!("bloom-blur-h-{i}"),
            );
            run_pass(
                encoder,
                &self.blur_pipeline,
                &[&level.vertical.params, &level.horizontal.source],
                &level.vertical.target.view,
                &format!("bloom-blur-v-{i}"),
            );
            source = &level.vertical.source;
        }

        run_pass(
            encoder,
            &self.composite_pipeline,
            &[&self.composite_params, input_bind_group, &targets.blurred],
            output,
            "bloom-composite",
        );
    }
}

impl Targets {
    fn new(
        device: &wgpu::Device,
        layouts: &Layouts,
        sampler: &wgpu::Sampler,
        format: wgpu::TextureFormat,
        config: &BloomConfig,
        size: [u32; 2],
    ) -> Self {
        let stage = |size, params, label: &str| Stage::new(device, layouts, sampler, format, size, params, label);
        let sizes = mip_sizes(size[0], size[1]);
        let bright = stage(sizes[0], BlurParams::high_pass(sizes[0], config), "bloom-bright");
        let mips: Vec<MipLevel> = sizes
            .iter()
            .zip(KERNEL_RADII)
            .enumerate()
            .map(|(i, (&mip_size, radius))| {
                let blur = |direction| BlurParams::blur(direction, mip_size, radius, config);
                MipLevel {
                    horizontal: stage(mip_size, blur([1.0, 0.0]), &format!("bloom-mip-h-{i}")),
                    vertical: stage(mip_size, blur([0.0, 1.0]), &format!("bloom-mip-v-{i}")),
                }
            })
            .collect();

        let mut entries: Vec<wgpu::BindGroupEntry> = mips
            .iter()
            .enumerate()
            .map(|(i, level)| wgpu::BindGroupEntry {
                binding: i as u32,
                resource: wgpu::BindingResource::TextureView(&level.vertical.target.view),
            })
            .collect();
        entries.push(wgpu::BindGroupEntry {
            binding: NUM_MIPS as u32,
            resource: wgpu::BindingResource::Sampler(sampler),
        });
        let blurred = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("bloom-blurred-bg"),
            layout: &layouts.blurred,
            entries: &entries,
        });

        Targets { bright, mips, blurred }
    }
}

impl Stage {
    fn new(
        device: &wgpu::Device,
        layouts: &Layouts,
        sampler: &wgpu::Sampler,
        format: wgpu::TextureFormat,
        size: [u32; 2],
        params: BlurParams,
        label: &str,
    ) -> Self {
        let target = Texture::create_render_target(device, size, format, label);
        let source = texture::sampled_texture_bind_group(device, &layouts.texture, &target.view, sampler, label);
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&[params]),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let params = super::uniform_bind_group(device, &layouts.params, &buffer, label);
        Self { target, source, params }
    }
}

fn texel_size(size: [u32; 2]) -> [f32; 2] {
    [1.0 / size[0].max(1) as f32, 1.0 / size[1].max(1) as f32]
}

fn blurred_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    let mut entries: Vec<wgpu::BindGroupLayoutEntry> = (0..NUM_MIPS as u32)
        .map(|binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                multisampled: false,
                view_dimension: wgpu::TextureViewDimension::D2,
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
            },
            count: None,
        })
        .collect();
    entries.push(wgpu::BindGroupLayoutEntry {
        binding: NUM_MIPS as u32,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    });
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("bloom-blurred-layout"),
        entries: &entries,
    })
}

fn run_pass(
    encoder: &mut wgpu::CommandEncoder,
    pipeline: &wgpu::RenderPipeline,
    bind_groups: &[&wgpu::BindGroup],
    target: &wgpu::TextureView,
    label: &str,
) {
    let mut pass = super::begin_color_pass(encoder, target, wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT), label);
    pass.set_pipeline(pipeline);
    for (i, group) in bind_groups.iter().enumerate() {
        pass.set_bind_group(i as u32, *group, &[]);
    }
    pass.draw(0..3, 0..1);
}
