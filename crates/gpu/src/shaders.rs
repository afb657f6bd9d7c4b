//! WGSL sources. wgpu exposes no hardware tessellation stages, so tessellation
//! control runs as a compute pass that appends grid cells, and tessellation
//! evaluation is a vertex shader that pulls its cell from a storage buffer.
//!
//! The arithmetic mirrors `terrain::tessellation` and `terrain::shading`.

use crate::error::ShaderStage;

/// Uniform block shared by every stage. Layout matches `buffers::Globals`.
const GLOBALS: &str = r#"
struct Globals {
    view_proj: mat4x4<f32>,
    camera_pos: vec4<f32>,
    // xyz towards the sun, w ambient
    sun: vec4<f32>,
    // width, height, 1/width, 1/height
    viewport: vec4<f32>,
    // extent x, extent z, height scale, texture tiling
    terrain: vec4<f32>,
    // texel step u, texel step v
    texel: vec4<f32>,
    // error px, max level
    tess: vec4<f32>,
    // rgb, density
    fog: vec4<f32>,
    wire: vec4<f32>,
    wire_fill: vec4<f32>,
    frustum: array<vec4<f32>, 6>,
    // height map width, height map height, patch count, display mode
    dims: vec4<u32>,
    // cell capacity
    limits: vec4<u32>,
};

@group(0) @binding(0)
var<uniform> globals: Globals;
"#;

/// Height field access and patch records, used by control and evaluation.
const TERRAIN: &str = r#"
struct Quad {
    corners: array<vec2<f32>, 4>,
};

@group(0) @binding(1)
var height_map: texture_2d<f32>;

@group(0) @binding(2)
var<storage, read> patches: array<Quad>;

fn height_texel(x: i32, y: i32) -> f32 {
    let size = vec2<i32>(globals.dims.xy);
    let p = clamp(vec2<i32>(x, y), vec2<i32>(0, 0), size - vec2<i32>(1, 1));
    return textureLoad(height_map, p, 0).r;
}

fn sample_height(uv: vec2<f32>) -> f32 {
    let p = uv * vec2<f32>(globals.dims.xy - vec2<u32>(1u, 1u));
    let base = floor(p);
    let f = p - base;
    let x0 = i32(base.x);
    let y0 = i32(base.y);
    let bottom = mix(height_texel(x0, y0), height_texel(x0 + 1, y0), f.x);
    let top = mix(height_texel(x0, y0 + 1), height_texel(x0 + 1, y0 + 1), f.x);
    return mix(bottom, top, f.y);
}

fn world_position(uv: vec2<f32>, h: f32) -> vec3<f32> {
    return vec3<f32>(uv.x * globals.terrain.x, h * globals.terrain.z, uv.y * globals.terrain.y);
}

fn displace(uv: vec2<f32>) -> vec3<f32> {
    return world_position(uv, sample_height(uv));
}
"#;

const TESS_CONTROL: &str = r#"
struct Counter {
    cells: atomic<u32>,
    overflow: atomic<u32>,
};

@group(0) @binding(3)
var<storage, read_write> levels: array<vec4<f32>>;

@group(0) @binding(4)
var<storage, read_write> cells: array<vec2<u32>>;

@group(0) @binding(5)
var<storage, read_write> counter: Counter;

@group(0) @binding(6)
var<storage, read_write> draw_args: array<u32, 4>;

const CLIP_W_EPSILON: f32 = 1e-4;
const MIN_ERROR_PX: f32 = 1e-3;

// xy in pixels; z is 0 when the point is on or behind the camera plane.
fn to_pixels(p: vec3<f32>) -> vec3<f32> {
    let clip = globals.view_proj * vec4<f32>(p, 1.0);
    if (clip.w <= CLIP_W_EPSILON) {
        return vec3<f32>(0.0, 0.0, 0.0);
    }
    let ndc = clip.xy / clip.w;
    return vec3<f32>(
        (ndc.x + 1.0) * 0.5 * globals.viewport.x,
        (1.0 - ndc.y) * 0.5 * globals.viewport.y,
        1.0,
    );
}

fn edge_factor(a: vec3<f32>, b: vec3<f32>) -> f32 {
    let max_level = globals.tess.y;
    let pa = to_pixels(a);
    let pb = to_pixels(b);
    if (pa.z == 0.0 || pb.z == 0.0) {
        return max_level;
    }
    let raw = distance(pa.xy, pb.xy) / max(globals.tess.x, MIN_ERROR_PX);
    return ceil(clamp(raw, 1.0, max_level));
}

fn outside_frustum(lo: vec3<f32>, hi: vec3<f32>) -> bool {
    for (var i = 0u; i < 6u; i = i + 1u) {
        let plane = globals.frustum[i];
        let p = select(lo, hi, plane.xyz >= vec3<f32>(0.0, 0.0, 0.0));
        if (dot(plane.xyz, p) + plane.w < 0.0) {
            return true;
        }
    }
    return false;
}

@compute @workgroup_size(64)
fn tess_control(@builtin(global_invocation_id) gid: vec3<u32>) {
    let index = gid.x;
    if (index >= globals.dims.z) {
        return;
    }

    let quad = patches[index];
    let c0 = displace(quad.corners[0]);
    let c1 = displace(quad.corners[1]);
    let c2 = displace(quad.corners[2]);
    let c3 = displace(quad.corners[3]);

    let min_xz = min(min(c0.xz, c1.xz), min(c2.xz, c3.xz));
    let max_xz = max(max(c0.xz, c1.xz), max(c2.xz, c3.xz));
    let lo = vec3<f32>(min_xz.x, min(globals.terrain.z, 0.0), min_xz.y);
    let hi = vec3<f32>(max_xz.x, max(globals.terrain.z, 0.0), max_xz.y);
    if (outside_frustum(lo, hi)) {
        levels[index] = vec4<f32>(0.0, 0.0, 0.0, 0.0);
        return;
    }

    let outer = vec4<f32>(
        edge_factor(c0, c1),
        edge_factor(c1, c2),
        edge_factor(c2, c3),
        edge_factor(c3, c0),
    );
    levels[index] = outer;

    let n = u32(max(max(outer.x, outer.y), max(outer.z, outer.w)));
    let count = n * n;
    let capacity = globals.limits.x;
    let base = atomicAdd(&counter.cells, count);
    if (base >= capacity) {
        atomicAdd(&counter.overflow, 1u);
        return;
    }
    let writable = min(count, capacity - base);
    if (writable < count) {
        atomicAdd(&counter.overflow, 1u);
    }
    for (var c = 0u; c < writable; c = c + 1u) {
        cells[base + c] = vec2<u32>(index, c);
    }
}

@compute @workgroup_size(1)
fn finalize_draw() {
    let total = min(atomicLoad(&counter.cells), globals.limits.x);
    draw_args[0] = total * 6u;
    draw_args[1] = 1u;
    draw_args[2] = 0u;
    draw_args[3] = 0u;
}
"#;

const TESS_EVALUATION: &str = r#"
@group(0) @binding(3)
var<storage, read> levels: array<vec4<f32>>;

@group(0) @binding(4)
var<storage, read> cells: array<vec2<u32>>;

struct VsOut {
    @builtin(position) clip: vec4<f32>,
    @location(0) world: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
    @location(3) height: f32,
    @location(4) bary: vec3<f32>,
};

fn snap(t: f32, factor: f32) -> f32 {
    if (factor <= 0.0) {
        return t;
    }
    return floor(t * factor + 0.5) / factor;
}

fn grid_coordinate(ij: vec2<u32>, n: u32, outer: vec4<f32>) -> vec2<f32> {
    let nf = f32(max(n, 1u));
    var t = vec2<f32>(ij) / nf;
    if (ij.y == 0u) {
        t.x = snap(t.x, outer.x);
    } else if (ij.y == n) {
        t.x = snap(t.x, outer.z);
    }
    if (ij.x == n) {
        t.y = snap(t.y, outer.y);
    } else if (ij.x == 0u) {
        t.y = snap(t.y, outer.w);
    }
    return t;
}

fn patch_uv(quad: Quad, t: vec2<f32>) -> vec2<f32> {
    let bottom = mix(quad.corners[0], quad.corners[1], t.x);
    let top = mix(quad.corners[3], quad.corners[2], t.x);
    return mix(bottom, top, t.y);
}

fn surface_normal(uv: vec2<f32>) -> vec3<f32> {
    let dx = vec2<f32>(globals.texel.x, 0.0);
    let dz = vec2<f32>(0.0, globals.texel.y);
    let slope_x = (sample_height(uv + dx) - sample_height(uv - dx)) * globals.terrain.z;
    let slope_z = (sample_height(uv + dz) - sample_height(uv - dz)) * globals.terrain.z;
    let run_x = max(abs(2.0 * globals.texel.x * globals.terrain.x), 1.1920929e-7);
    let run_z = max(abs(2.0 * globals.texel.y * globals.terrain.y), 1.1920929e-7);
    return normalize(vec3<f32>(-slope_x / run_x, 1.0, -slope_z / run_z));
}

@vertex
fn vs_main(@builtin(vertex_index) vid: u32) -> VsOut {
    // Two triangles per cell, counter-clockwise seen from above.
    var offsets = array<vec2<u32>, 6>(
        vec2<u32>(0u, 0u),
        vec2<u32>(0u, 1u),
        vec2<u32>(1u, 1u),
        vec2<u32>(0u, 0u),
        vec2<u32>(1u, 1u),
        vec2<u32>(1u, 0u),
    );
    var corners = array<vec3<f32>, 3>(
        vec3<f32>(1.0, 0.0, 0.0),
        vec3<f32>(0.0, 1.0, 0.0),
        vec3<f32>(0.0, 0.0, 1.0),
    );

    let cell = cells[vid / 6u];
    let quad = patches[cell.x];
    let outer = levels[cell.x];
    let n = max(u32(max(max(outer.x, outer.y), max(outer.z, outer.w))), 1u);
    let ij = vec2<u32>(cell.y % n, cell.y / n) + offsets[vid % 6u];

    let uv = patch_uv(quad, grid_coordinate(ij, n, outer));
    let h = sample_height(uv);
    let world = world_position(uv, h);

    var out: VsOut;
    out.clip = globals.view_proj * vec4<f32>(world, 1.0);
    out.world = world;
    out.normal = surface_normal(uv);
    out.uv = uv;
    out.height = h;
    out.bary = corners[vid % 3u];
    return out;
}
"#;

const FRAGMENT: &str = r#"
@group(0) @binding(5)
var material_sampler: sampler;

@group(0) @binding(6)
var grass_tex: texture_2d<f32>;

@group(0) @binding(7)
var rock_tex: texture_2d<f32>;

@group(0) @binding(8)
var snow_tex: texture_2d<f32>;

struct FsIn {
    @location(0) world: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
    @location(3) height: f32,
    @location(4) bary: vec3<f32>,
};

fn lighting_factor(n: vec3<f32>) -> f32 {
    let ambient = globals.sun.w;
    return ambient + (1.0 - ambient) * max(dot(n, globals.sun.xyz), 0.0);
}

// x: rock weight, y: snow weight
fn layer_weights(n: vec3<f32>, h: f32) -> vec2<f32> {
    let slope = clamp(1.0 - n.y, 0.0, 1.0);
    let rock = smoothstep(0.1, 0.25, slope);
    let snow = smoothstep(0.65, 0.8, h) * (1.0 - smoothstep(0.25, 0.45, slope));
    return vec2<f32>(rock, snow);
}

@fragment
fn fs_main(in: FsIn) -> @location(0) vec4<f32> {
    let n = normalize(in.normal);
    let tiled = in.uv * globals.terrain.w;
    let grass = textureSample(grass_tex, material_sampler, tiled).rgb;
    let rock = textureSample(rock_tex, material_sampler, tiled).rgb;
    let snow = textureSample(snow_tex, material_sampler, tiled).rgb;

    let edge_width = max(fwidth(in.bary) * 1.5, vec3<f32>(1e-4, 1e-4, 1e-4));
    let edge = smoothstep(vec3<f32>(0.0, 0.0, 0.0), edge_width, in.bary);
    let line = 1.0 - min(min(edge.x, edge.y), edge.z);

    let light = lighting_factor(n);
    let w = layer_weights(n, in.height);
    let grass_rock = mix(grass, rock, w.x);
    let blended = mix(grass_rock, snow, w.y);

    var color: vec3<f32>;
    switch globals.dims.w {
        case 0u: {
            color = mix(globals.wire_fill.rgb, globals.wire.rgb, line);
        }
        case 1u: {
            color = vec3<f32>(clamp(in.height, 0.0, 1.0));
        }
        case 2u: {
            color = n * 0.5 + 0.5;
        }
        case 3u: {
            color = grass * light;
        }
        case 4u: {
            color = grass_rock * light;
        }
        case 5u: {
            color = blended * light;
        }
        case 6u: {
            color = vec3<f32>(light);
        }
        default: {
            let distance_to_eye = distance(in.world, globals.camera_pos.xyz);
            let fog = clamp(1.0 - exp(-distance_to_eye * globals.fog.w), 0.0, 1.0);
            color = mix(blended * light, globals.fog.rgb, fog);
        }
    }
    return vec4<f32>(color, 1.0);
}
"#;

/// One shader module's full source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSource {
    pub stage: ShaderStage,
    pub label: &'static str,
    pub wgsl: String,
}

pub fn tess_control() -> ShaderSource {
    ShaderSource {
        stage: ShaderStage::TessControl,
        label: "terrain-tess-control",
        wgsl: [GLOBALS, TERRAIN, TESS_CONTROL].concat(),
    }
}

pub fn tess_evaluation() -> ShaderSource {
    ShaderSource {
        stage: ShaderStage::TessEvaluation,
        label: "terrain-tess-evaluation",
        wgsl: [GLOBALS, TERRAIN, TESS_EVALUATION].concat(),
    }
}

pub fn fragment() -> ShaderSource {
    ShaderSource {
        stage: ShaderStage::Fragment,
        label: "terrain-fragment",
        wgsl: [GLOBALS, FRAGMENT].concat(),
    }
}

pub const CONTROL_WORKGROUP_SIZE: u32 = 64;

pub fn control_workgroups(patch_count: u32) -> u32 {
    patch_count.div_ceil(CONTROL_WORKGROUP_SIZE).max(1)
}

#[cfg(test)]
mod tests {
    use super::{control_workgroups, fragment, tess_control, tess_evaluation};
    use terrain::DisplayMode;

    #[test]
    fn entry_points_are_present() {
        assert!(tess_control().wgsl.contains("fn tess_control("));
        assert!(tess_control().wgsl.contains("fn finalize_draw("));
        assert!(tess_evaluation().wgsl.contains("fn vs_main("));
        assert!(fragment().wgsl.contains("fn fs_main("));
    }

    #[test]
    fn fragment_switch_covers_every_mode() {
        let src = fragment().wgsl;
        for mode in DisplayMode::ALL {
            if mode == DisplayMode::TexturedAndLit {
                assert!(src.contains("default: {"));
            } else {
                assert!(src.contains(&format!("case {}u:", mode.index())), "{mode}");
            }
        }
    }

    #[test]
    fn workgroups_cover_all_patches() {
        assert_eq!(control_workgroups(0), 1);
        assert_eq!(control_workgroups(64), 1);
        assert_eq!(control_workgroups(65), 2);
    }
}
