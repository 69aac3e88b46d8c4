use std::str::FromStr;

use anyhow::{bail, Context, Result};

use prism_engine::device::GpuInit;
use prism_engine::frame::SceneConfig;
use prism_engine::logging::{init_logging, LoggingConfig};
use prism_engine::render::ShaderVariant;
use prism_engine::resource::{FixedPolicy, HuePolicy, ObjectAttributes, RandomPolicy};
use prism_engine::window::{Runtime, RuntimeConfig, SceneSetup};

const USAGE: &str = "usage: prism-demo [triangle|triangle-rgb|builtin-position|uniforms|triangles] [count] [seed]";

/// Built-in scenes.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Preset {
    /// One red triangle.
    Triangle,
    /// One triangle with red, green and blue corners.
    TriangleRgb,
    /// One triangle checkered by fragment position.
    BuiltinPosition,
    /// One green triangle, offset and aspect corrected.
    Uniforms,
    /// Many triangles with random hue, offset and scale.
    Triangles,
}

impl FromStr for Preset {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            "triangle" => Self::Triangle,
            "triangle-rgb" => Self::TriangleRgb,
            "builtin-position" => Self::BuiltinPosition,
            "uniforms" => Self::Uniforms,
            "triangles" => Self::Triangles,
            other => bail!("unknown preset `{other}`\n{USAGE}"),
        })
    }
}

impl Preset {
    fn name(self) -> &'static str {
        match self {
            Self::Triangle => "triangle",
            Self::TriangleRgb => "triangle-rgb",
            Self::BuiltinPosition => "builtin-position",
            Self::Uniforms => "uniforms",
            Self::Triangles => "triangles",
        }
    }

    fn default_count(self) -> usize {
        match self {
            Self::Triangles => 100,
            _ => 1,
        }
    }

    fn variant(self) -> ShaderVariant {
        match self {
            Self::TriangleRgb => ShaderVariant::VertexColor,
            Self::BuiltinPosition => ShaderVariant::Checker,
            _ => ShaderVariant::UniformColor,
        }
    }

    fn policy(self, seed: Option<u64>) -> Box<dyn RandomPolicy> {
        let red = ObjectAttributes {
            color: [1.0, 0.0, 0.0, 1.0],
            offset: [0.0, 0.0],
            base_scale: 1.0,
        };
        match self {
            Self::Triangle | Self::TriangleRgb | Self::BuiltinPosition => {
                Box::new(FixedPolicy(red))
            }
            Self::Uniforms => Box::new(FixedPolicy(ObjectAttributes {
                color: [0.0, 1.0, 0.0, 1.0],
                offset: [-0.5, -0.25],
                base_scale: 0.5,
            })),
            Self::Triangles => match seed {
                Some(seed) => Box::new(HuePolicy::seeded(seed)),
                None => Box::new(HuePolicy::from_entropy()),
            },
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
struct Args {
    preset: Preset,
    count: usize,
    seed: Option<u64>,
}

fn parse_args<I>(mut args: I) -> Result<Args>
where
    I: Iterator<Item = String>,
{
    let preset = match args.next() {
        Some(p) => p.parse::<Preset>()?,
        None => Preset::Triangles,
    };
    let count = match args.next() {
        Some(c) => c
            .parse::<usize>()
            .with_context(|| format!("invalid object count `{c}`\n{USAGE}"))?,
        None => preset.default_count(),
    };
    let seed = args
        .next()
        .map(|s| {
            s.parse::<u64>()
                .with_context(|| format!("invalid seed `{s}`\n{USAGE}"))
        })
        .transpose()?;

    if args.next().is_some() {
        bail!("too many arguments\n{USAGE}");
    }

    Ok(Args { preset, count, seed })
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let args = parse_args(std::env::args().skip(1))?;
    log::info!(
        "preset `{}` with {} object(s)",
        args.preset.name(),
        args.count
    );

    let scene = SceneConfig {
        object_count: args.count,
        ..SceneConfig::default()
    };
    let setup = SceneSetup::new(scene, args.preset.variant(), args.preset.policy(args.seed))?;

    let config = RuntimeConfig {
        title: format!("prism: {}", args.preset.name()),
        ..RuntimeConfig::default()
    };

    Runtime::run(config, GpuInit::default(), setup)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Result<Args> {
        parse_args(list.iter().map(|s| s.to_string()))
    }

    #[test]
    fn defaults_to_hundred_triangles() {
        let a = args(&[]).unwrap();
        assert_eq!(a.preset, Preset::Triangles);
        assert_eq!(a.count, 100);
        assert_eq!(a.seed, None);
    }

    #[test]
    fn single_object_presets() {
        for name in ["triangle", "triangle-rgb", "builtin-position", "uniforms"] {
            let a = args(&[name]).unwrap();
            assert_eq!(a.preset.name(), name);
            assert_eq!(a.count, 1);
        }
    }

    #[test]
    fn count_and_seed_are_parsed() {
        let a = args(&["triangles", "250", "7"]).unwrap();
        assert_eq!(a.count, 250);
        assert_eq!(a.seed, Some(7));
    }

    #[test]
    fn bad_input_is_rejected() {
        assert!(args(&["squares"]).is_err());
        assert!(args(&["triangles", "-1"]).is_err());
        assert!(args(&["triangles", "10", "x"]).is_err());
        assert!(args(&["triangles", "10", "1", "extra"]).is_err());
    }

    #[test]
    fn uniforms_preset_matches_single_green_triangle() {
        let mut policy = Preset::Uniforms.policy(None);
        let a = policy.attributes(0);
        assert_eq!(a.color, [0.0, 1.0, 0.0, 1.0]);
        assert_eq!(a.offset, [-0.5, -0.25]);
        assert_eq!(a.base_scale, 0.5);
    }

    #[test]
    fn seeded_triangles_are_reproducible() {
        let mut a = Preset::Triangles.policy(Some(3));
        let mut b = Preset::Triangles.policy(Some(3));
        for i in 0..5 {
            assert_eq!(a.attributes(i), b.attributes(i));
        }
    }
}
