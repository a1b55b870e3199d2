//! Stats command implementation

use anyhow::Result;
use glyphcache_core::GlyphCacheError;

use crate::cli::StatsArgs;
use crate::commands::open_face;

pub fn run(args: &StatsArgs) -> Result<()> {
    let (manager, face) = open_face(&args.sources, &args.face)?;

    let mut missing = 0usize;
    for pass in 0..args.passes {
        for ch in args.text.chars() {
            match manager.get_glyph(&face, ch as u32) {
                Ok(_) => {},
                Err(GlyphCacheError::GlyphNotFound { .. }) => missing += 1,
                Err(e) => return Err(e.into()),
            }
        }
        log::debug!(
            "Pass {}: {} glyphs, {} bytes cached",
            pass + 1,
            manager.glyph_count(),
            manager.running_total()
        );
    }

    println!("{}", manager.stats().report());
    if missing > 0 {
        println!("- Missing glyph lookups: {}", missing);
    }

    if args.faces {
        println!();
        println!("Faces:");
        for summary in manager.faces() {
            println!(
                "  #{} {} {} @ {}px, refs {}, {} glyphs, {} bytes",
                summary.id.index(),
                summary.family,
                summary.style,
                summary.key.size(),
                summary.ref_count,
                summary.glyphs,
                summary.cache_size
            );
        }
    }

    manager.release_face(face);
    Ok(())
}
