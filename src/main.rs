use std::{
    fs,
    fs::File,
    io::BufWriter,
    path::{Path, PathBuf},
};

use clap::{Parser, Subcommand};
use itertools::Itertools;
use log::info;

use wasteland_extract::{
    cursor::Cursors,
    ending::Ending,
    exe::Exe,
    font::Font,
    image::IndexedImage,
    map::{Game, GameMap},
    portrait::Portraits,
    sprite::Sprites,
    tile::{Tileset, Tilesets},
    title::Title,
    Error, Result,
};

#[derive(Debug, Parser)]
#[command(name = "wasteland-extract")]
struct Cli {
    /// Directory containing the original game files
    #[arg(long)]
    data_path: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Extracts the mouse cursors from CURS
    Cursors,
    /// Extracts the color font from COLORF.FNT
    Font,
    /// Extracts the end game sprites from IC0_9.WLF and MASKS.WLF
    Sprites,
    /// Extracts the tilesets from ALLHTDS1 and ALLHTDS2
    Tiles,
    /// Extracts the title image from TITLE.PIC
    Title,
    /// Extracts the end game animation from END.CPA
    Ending,
    /// Extracts the portrait animations from ALLPICS1 and ALLPICS2
    Portraits,
    /// Prints the string tables from WL.EXE
    Strings,
    /// Extracts the maps from GAME1 and GAME2
    Maps,
}

fn load(data_path: &Path, name: &str) -> Result<Vec<u8>> {
    let path = data_path.join(name);
    info!("reading {}", path.display());
    Ok(fs::read(path)?)
}

/// Writes a grid of equally sized images into a single PNG sheet.
fn write_sheet(images: &[&dyn IndexedImage], columns: usize, filename: &str) -> Result<()> {
    if images.is_empty() {
        return Ok(());
    }
    let (width, height) = (images[0].width(), images[0].height());
    let rows = (images.len() + columns - 1) / columns;
    let sheet_width = columns * width;
    let sheet_height = rows * height;

    let mut rgba = vec![0u8; sheet_width * sheet_height * 4];
    for (i, image) in images.iter().enumerate() {
        image.blit(
            &mut rgba,
            sheet_width,
            (i % columns) * width,
            (i / columns) * height,
        )?;
    }

    let file = File::create(Path::new(filename))?;
    let w = &mut BufWriter::new(file);
    let mut encoder = png::Encoder::new(w, sheet_width as u32, sheet_height as u32);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(&rgba)?;

    println!("Extracted {} images to `{}`", images.len(), filename);
    Ok(())
}

fn extract_cursors(data_path: &Path) -> Result<()> {
    let cursors = Cursors::parse(&load(data_path, "CURS")?)?;
    let images = cursors
        .cursors()
        .iter()
        .map(|c| c as &dyn IndexedImage)
        .collect::<Vec<_>>();
    write_sheet(&images, cursors.len(), "cursors.png")
}

fn extract_font(data_path: &Path) -> Result<()> {
    let font = Font::parse(&load(data_path, "COLORF.FNT")?)?;
    let images = font
        .chars()
        .iter()
        .map(|c| c as &dyn IndexedImage)
        .collect::<Vec<_>>();
    write_sheet(&images, 16, "font.png")
}

fn extract_sprites(data_path: &Path) -> Result<()> {
    let sprites = Sprites::parse(
        &load(data_path, "IC0_9.WLF")?,
        &load(data_path, "MASKS.WLF")?,
    )?;
    let images = sprites
        .sprites()
        .iter()
        .map(|s| s as &dyn IndexedImage)
        .collect::<Vec<_>>();
    write_sheet(&images, sprites.len(), "sprites.png")
}

fn extract_tiles(data_path: &Path) -> Result<()> {
    for (file_index, name) in ["ALLHTDS1", "ALLHTDS2"].iter().enumerate() {
        let tilesets = Tilesets::parse(&load(data_path, name)?)?;
        for (i, tileset) in tilesets.tilesets().iter().enumerate() {
            let images = tileset
                .tiles()
                .iter()
                .map(|t| t.image() as &dyn IndexedImage)
                .collect::<Vec<_>>();
            let filename = format!("tileset-{}-{:02}.png", file_index + 1, i);
            write_sheet(&images, 16, &filename)?;
        }
    }
    Ok(())
}

fn extract_title(data_path: &Path) -> Result<()> {
    let title = Title::parse(&load(data_path, "TITLE.PIC")?)?;
    title.image().write_png("title.png")?;
    println!("Extracted title image to `title.png`");
    Ok(())
}

fn extract_ending(data_path: &Path) -> Result<()> {
    let ending = Ending::parse(&load(data_path, "END.CPA")?)?;
    let frames = ending.updates().len().min(15);
    let mut player = ending.create_player();
    player.frame().write_png("ending-000.png")?;
    // One pass through the animation, stopping before the tail loop repeats.
    for i in 1..frames {
        player.next();
        player.frame().write_png(&format!("ending-{:03}.png", i))?;
    }
    println!("Extracted {} animation frames", frames);
    Ok(())
}

fn extract_portraits(data_path: &Path) -> Result<()> {
    for (file_index, name) in ["ALLPICS1", "ALLPICS2"].iter().enumerate() {
        let portraits = Portraits::parse(&load(data_path, name)?)?;
        for (i, portrait) in portraits.portraits().iter().enumerate() {
            let filename = format!("portrait-{}-{:02}.png", file_index + 1, i);
            portrait.base_frame().write_png(&filename)?;
            println!(
                "Extracted portrait with {} scripts and {} updates to `{}`",
                portrait.scripts().len(),
                portrait.updates().len(),
                filename
            );
        }
    }
    Ok(())
}

fn print_string_table(title: &str, groups: &[Vec<String>]) {
    println!("=== {} ===", title);
    for (i, group) in groups.iter().enumerate() {
        for (j, string) in group.iter().enumerate() {
            println!("{:3}.{}: {}", i, j, string);
        }
    }
}

fn extract_strings(data_path: &Path) -> Result<()> {
    let exe = Exe::parse(&load(data_path, "WL.EXE")?)?;
    print_string_table("intro", &exe.intro_strings()?);
    print_string_table("messages", &exe.message_strings()?);
    print_string_table("inventory", &exe.inventory_strings()?);
    print_string_table("create character", &exe.create_character_strings()?);
    print_string_table("promotion", &exe.promotion_strings()?);
    print_string_table("library", &exe.library_strings()?);
    print_string_table("shop", &exe.shop_strings()?);
    print_string_table("infirmary", &exe.infirmary_strings()?);
    Ok(())
}

fn extract_maps(data_path: &Path) -> Result<()> {
    let exe = Exe::parse(&load(data_path, "WL.EXE")?)?;
    let tilesets_1 = Tilesets::parse(&load(data_path, "ALLHTDS1")?)?;
    let tilesets_2 = Tilesets::parse(&load(data_path, "ALLHTDS2")?)?;
    let tilesets = tilesets_1
        .tilesets()
        .iter()
        .chain(tilesets_2.tilesets())
        .collect::<Vec<_>>();

    for name in ["GAME1", "GAME2"] {
        let game = Game::parse(&load(data_path, name)?, &exe)?;
        for map in game.maps() {
            let filename = format!("map-{}-{:02}.png", game.disk() + 1, map.index());
            let tileset = tilesets
                .get(map.info().tileset() as usize)
                .copied()
                .ok_or(Error::Format("unknown tileset"))?;
            render_map(map, tileset, &filename)?;
            println!(
                "Extracted map {} of {} to `{}`: {} monsters: {}",
                map.index(),
                name,
                filename,
                map.mobs().len(),
                map.mobs().iter().map(|m| m.name()).join(", ")
            );
        }
    }
    Ok(())
}

fn render_map(map: &GameMap, tileset: &Tileset, filename: &str) -> Result<()> {
    let size = map.tile_map().size();
    let sheet_width = size * 16;
    let mut rgba = vec![0u8; sheet_width * sheet_width * 4];
    for y in 0..size {
        for x in 0..size {
            let index = map.tile_map().tile(x, y) as usize;
            // Tile indices past the tileset reference sprites, which are
            // drawn by the engine at run time.
            if let Ok(tile) = tileset.tile(index) {
                tile.image().blit(&mut rgba, sheet_width, x * 16, y * 16)?;
            }
        }
    }

    let file = File::create(Path::new(filename))?;
    let w = &mut BufWriter::new(file);
    let mut encoder = png::Encoder::new(w, sheet_width as u32, sheet_width as u32);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(&rgba)?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let data_path = cli.data_path.unwrap_or_else(|| PathBuf::from("."));

    match &cli.command {
        Commands::Cursors => extract_cursors(&data_path),
        Commands::Font => extract_font(&data_path),
        Commands::Sprites => extract_sprites(&data_path),
        Commands::Tiles => extract_tiles(&data_path),
        Commands::Title => extract_title(&data_path),
        Commands::Ending => extract_ending(&data_path),
        Commands::Portraits => extract_portraits(&data_path),
        Commands::Strings => extract_strings(&data_path),
        Commands::Maps => extract_maps(&data_path),
    }
}
