//! CLI argument definitions using Clap v4

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use glyphcache_core::cache_config::parse_byte_size;
use glyphcache_core::{CacheConfig, Fixed, StyleFlags};

/// glyphcache - rasterize text through a byte-budgeted glyph cache
#[derive(Parser, Debug)]
#[command(name = "glyphcache")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Verbose logging (debug level)
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the fonts and aliases found in the given files and directories
    #[command(alias = "i")]
    Info(InfoArgs),

    /// Render a line of text to a PGM image through the cache
    #[command(alias = "r")]
    Render(RenderArgs),

    /// Run text through the cache and print hit/miss and eviction statistics
    Stats(StatsArgs),
}

/// Where fonts are loaded from
#[derive(Args, Debug, Clone)]
pub struct FontSources {
    /// Font file (.ttf, .otf, .ttc, .otc); may be repeated
    #[arg(short = 'f', long = "font")]
    pub fonts: Vec<PathBuf>,

    /// Directory scanned recursively for font files; may be repeated
    #[arg(short = 'd', long = "dir")]
    pub dirs: Vec<PathBuf>,
}

/// Which face to use and how the cache is sized
#[derive(Args, Debug, Clone)]
pub struct FaceArgs {
    /// Family, full or PostScript name; the first loaded font when omitted
    #[arg(short = 'n', long = "family")]
    pub family: Option<String>,

    /// Pixel size, fractions allowed
    #[arg(short = 's', long = "size", default_value = "32")]
    pub size: f32,

    /// Ask for a bold face (synthesized when the font has none)
    #[arg(long)]
    pub bold: bool,

    /// Ask for an italic face (synthesized when the font has none)
    #[arg(long)]
    pub italic: bool,

    /// Render 1-bit glyphs instead of antialiased coverage
    #[arg(long)]
    pub mono: bool,

    /// Eviction target in bytes (accepts K/M/G suffixes)
    #[arg(long = "min-bytes", value_parser = parse_bytes)]
    pub min_bytes: Option<usize>,

    /// Eviction trigger in bytes (accepts K/M/G suffixes)
    #[arg(long = "max-bytes", value_parser = parse_bytes)]
    pub max_bytes: Option<usize>,
}

impl FaceArgs {
    pub fn size(&self) -> Fixed {
        Fixed::from_f32(self.size)
    }

    pub fn flags(&self) -> StyleFlags {
        let mut flags = StyleFlags::empty();
        flags.set(StyleFlags::BOLD, self.bold);
        flags.set(StyleFlags::ITALIC, self.italic);
        flags.set(StyleFlags::ANTIALIAS, !self.mono);
        flags
    }

    /// Environment defaults with the command-line budget on top
    pub fn cache_config(&self) -> CacheConfig {
        let mut config = CacheConfig::from_env();
        match (self.min_bytes, self.max_bytes) {
            (Some(min), Some(max)) => {
                config.min_bytes = min;
                config.max_bytes = max;
            },
            (Some(min), None) => {
                config.min_bytes = min;
                config.max_bytes = config.max_bytes.max(min);
            },
            (None, Some(max)) => {
                config.max_bytes = max;
                config.min_bytes = config.min_bytes.min(max);
            },
            (None, None) => {},
        }
        config
    }
}

#[derive(Args, Debug)]
pub struct InfoArgs {
    #[command(flatten)]
    pub sources: FontSources,
}

#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Text to render
    pub text: String,

    #[command(flatten)]
    pub sources: FontSources,

    #[command(flatten)]
    pub face: FaceArgs,

    /// Output file
    #[arg(short = 'o', long = "output", default_value = "glyphcache.pgm")]
    pub output: PathBuf,
}

#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Text to run through the cache
    pub text: String,

    #[command(flatten)]
    pub sources: FontSources,

    #[command(flatten)]
    pub face: FaceArgs,

    /// How many times the text is looked up
    #[arg(short = 'p', long = "passes", default_value = "2")]
    pub passes: u32,

    /// Also list every live face
    #[arg(long)]
    pub faces: bool,
}

fn parse_bytes(raw: &str) -> Result<usize, String> {
    parse_byte_size(raw).ok_or_else(|| format!("'{raw}' is not a byte size (e.g. 4096, 64K, 8M)"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_render_defaults() {
        let cli = parse(&["glyphcache", "render", "Hi", "-f", "a.ttf"]);
        let Commands::Render(args) = cli.command else {
            panic!("expected render");
        };
        assert_eq!(args.text, "Hi");
        assert_eq!(args.sources.fonts, vec![PathBuf::from("a.ttf")]);
        assert_eq!(args.face.size(), Fixed::from_int(32));
        assert_eq!(args.face.flags(), StyleFlags::ANTIALIAS);
        assert_eq!(args.output, PathBuf::from("glyphcache.pgm"));
    }

    #[test]
    fn test_style_flags() {
        let cli = parse(&["glyphcache", "stats", "x", "--bold", "--italic", "--mono"]);
        let Commands::Stats(args) = cli.command else {
            panic!("expected stats");
        };
        assert_eq!(args.face.flags(), StyleFlags::BOLD | StyleFlags::ITALIC);
    }

    #[test]
    fn test_budget_flags() {
        let cli = parse(&[
            "glyphcache",
            "stats",
            "x",
            "--min-bytes",
            "64K",
            "--max-bytes",
            "1M",
        ]);
        let Commands::Stats(args) = cli.command else {
            panic!("expected stats");
        };
        let config = args.face.cache_config();
        assert_eq!(config.min_bytes, 64 * 1024);
        assert_eq!(config.max_bytes, 1024 * 1024);
    }

    #[test]
    fn test_min_only_raises_max() {
        let cli = parse(&["glyphcache", "stats", "x", "--min-bytes", "1G"]);
        let Commands::Stats(args) = cli.command else {
            panic!("expected stats");
        };
        let config = args.face.cache_config();
        assert_eq!(config.min_bytes, 1 << 30);
        assert!(config.max_bytes >= config.min_bytes);
    }

    #[test]
    fn test_bad_byte_size_is_rejected() {
        assert!(Cli::try_parse_from(["glyphcache", "stats", "x", "--max-bytes", "lots"]).is_err());
    }
}
