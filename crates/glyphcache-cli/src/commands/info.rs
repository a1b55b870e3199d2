//! Info command implementation
//!
//! Lists what a font scan registered: faces with their names, then aliases.

use anyhow::Result;

use crate::cli::InfoArgs;
use crate::commands::load_fonts;

pub fn run(args: &InfoArgs) -> Result<()> {
    let (loader, loaded) = load_fonts(&args.sources)?;
    let registry = loader.registry();

    println!("glyphcache v{}", env!("CARGO_PKG_VERSION"));
    println!();

    println!("Faces ({}):", loaded.len());
    for face in &loaded {
        let info = &face.info;
        let origin = face
            .path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<memory>".to_string());
        println!(
            "  {:<32} weight {:>4.0}{} {} glyphs, {} upem  [{}#{}]",
            info.full_name(),
            info.weight,
            if info.italic { " italic" } else { "" },
            info.glyph_count,
            info.units_per_em,
            origin,
            info.face_index
        );
    }
    println!();

    println!("Registered names:");
    for name in registry.font_names() {
        println!("  {}", name);
    }

    let aliases = registry.aliases();
    if !aliases.is_empty() {
        println!();
        println!("Aliases:");
        for (alias, target) in aliases {
            println!("  {:<32} -> {}", alias, target);
        }
    }

    if let Some(default) = registry.default_font() {
        println!();
        println!("Default: {}", default.full_name());
    }
    Ok(())
}
