use std::{fs, path::Path};

mod common;
use common::{color_close, pattern, tile_color, two_by_two, write_gup, EntrySpec, JPEG, ZLIB};
use libgug::{open_image_entry, Compression, Error, TiledImage};
use mktemp::Temp;

fn assert_tile_matches(image: &mut TiledImage, spec: &EntrySpec, tx: u32, ty: u32) {
    let tile = image.load_tile(i64::from(tx), i64::from(ty)).unwrap();
    let (tw, th) = spec.tile;
    assert_eq!((tile.width(), tile.height()), (tw, th));
    assert_eq!(tile.as_raw().len(), (tw * th * 3) as usize);
    for (x, y) in [(0, 0), (tw - 1, 0), (0, th - 1), (tw - 1, th - 1), (tw / 3, th / 2)] {
        assert_eq!(
            tile.pixel(x, y),
            Some(pattern(spec.seed, tx * tw + x, ty * th + y)),
            "tile ({tx}, {ty}) pixel ({x}, {y})"
        );
    }
}

#[test]
fn reads_tile_grid_geometry() -> anyhow::Result<()> {
    let dir = Temp::new_dir()?;
    let path = AsRef::<Path>::as_ref(&dir).join("map.gup");
    let spec = two_by_two();
    write_gup(&path, &[spec.clone()])?;

    let image = TiledImage::open(&path, 0, 0)?;
    assert_eq!((image.num_tiles_x(), image.num_tiles_y()), (2, 2));
    assert_eq!((image.tile_width(), image.tile_height()), (256, 256));
    assert_eq!((image.announced_width(), image.announced_height()), (512, 512));
    assert_eq!((image.real_width(), image.real_height()), (512, 512));
    assert_eq!(image.tile_index().len(), 4);
    assert_eq!(image.codec().compression, u32::from(Compression::Raw));
    assert!(!image.codec().top_down);
    assert_eq!(image.file_header().size as usize, spec.encode().len());
    assert_eq!(image.grid_header().unknown1, 0x4755_5031);
    assert_eq!(image.next_image_offset(), fs::metadata(&path)?.len());
    Ok(())
}

#[test]
fn pads_partial_tiles() -> anyhow::Result<()> {
    let dir = Temp::new_dir()?;
    let path = AsRef::<Path>::as_ref(&dir).join("map.gup");
    let spec = EntrySpec::new(300, 200, (128, 128));
    write_gup(&path, &[spec.clone()])?;

    let mut image = TiledImage::open(&path, 0, 0)?;
    assert_eq!((image.num_tiles_x(), image.num_tiles_y()), (3, 2));
    assert_eq!((image.announced_width(), image.announced_height()), (300, 200));
    assert_eq!((image.real_width(), image.real_height()), (384, 256));
    for ty in 0..2 {
        for tx in 0..3 {
            assert_tile_matches(&mut image, &spec, tx, ty);
        }
    }
    Ok(())
}

#[test]
fn normalizes_row_order() -> anyhow::Result<()> {
    let dir = Temp::new_dir()?;
    let dir: &Path = dir.as_ref();
    for top_down in [false, true] {
        let path = dir.join(format!("map_{top_down}.gup"));
        let spec = EntrySpec::new(256, 384, (128, 128)).top_down(top_down);
        write_gup(&path, &[spec.clone()])?;

        let mut image = TiledImage::open(&path, 0, 0)?;
        assert_eq!(image.codec().top_down, top_down);
        for ty in 0..3 {
            for tx in 0..2 {
                assert_tile_matches(&mut image, &spec, tx, ty);
            }
        }
    }
    Ok(())
}

#[test]
fn decodes_compressed_tiles() -> anyhow::Result<()> {
    let dir = Temp::new_dir()?;
    let dir: &Path = dir.as_ref();

    let zlib = two_by_two().compression(ZLIB).seed(9);
    write_gup(&dir.join("zlib.gup"), &[zlib.clone()])?;
    let mut image = TiledImage::open(dir.join("zlib.gup"), 0, 0)?;
    for (tx, ty) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
        assert_tile_matches(&mut image, &zlib, tx, ty);
    }

    let jpeg = EntrySpec::new(128, 128, (64, 64)).compression(JPEG);
    write_gup(&dir.join("jpeg.gup"), &[jpeg])?;
    let mut image = TiledImage::open(dir.join("jpeg.gup"), 0, 0)?;
    for (tx, ty) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
        let tile = image.load_tile(tx, ty)?;
        assert_eq!((tile.width(), tile.height()), (64, 64));
        for (x, y) in [(0, 0), (63, 63), (10, 50)] {
            let px = tile.pixel(x, y).unwrap();
            let expected = tile_color(tx as u32, ty as u32);
            assert!(color_close(px, expected), "{px:?} != {expected:?}");
        }
    }
    Ok(())
}

#[test]
fn returns_compressed_bytes_unmodified() -> anyhow::Result<()> {
    let dir = Temp::new_dir()?;
    let path = AsRef::<Path>::as_ref(&dir).join("map.gup");
    let spec = two_by_two().compression(ZLIB);
    write_gup(&path, &[spec.clone()])?;

    let mut image = TiledImage::open(&path, 0, 0)?;
    assert_eq!(image.load_compressed_tile(1, 0)?, spec.stored_tile(1, 0));
    assert_eq!(image.load_compressed_tile(0, 1)?, spec.stored_tile(0, 1));
    Ok(())
}

#[test]
fn signals_tile_errors() -> anyhow::Result<()> {
    let dir = Temp::new_dir()?;
    let path = AsRef::<Path>::as_ref(&dir).join("map.gup");
    let spec = two_by_two()
        .missing(1, 0)
        .dangling(0, 1)
        .override_tile(1, 1, vec![1, 2, 3]);
    write_gup(&path, &[spec])?;

    let mut image = TiledImage::open(&path, 0, 0)?;
    assert!(matches!(
        image.load_tile(5, 5),
        Err(Error::TileOutOfRange { tx: 5, ty: 5, tiles_x: 2, tiles_y: 2 })
    ));
    assert!(matches!(
        image.load_tile(-1, 0),
        Err(Error::TileOutOfRange { .. })
    ));
    assert!(matches!(
        image.load_tile(1, 0),
        Err(Error::MissingTile { tx: 1, ty: 0 })
    ));
    assert!(matches!(
        image.load_compressed_tile(1, 0),
        Err(Error::MissingTile { .. })
    ));
    // entries beyond the end of the file are treated as missing
    assert!(matches!(
        image.load_tile(0, 1),
        Err(Error::MissingTile { tx: 0, ty: 1 })
    ));
    assert!(matches!(
        image.load_tile(1, 1),
        Err(Error::CorruptTile { tx: 1, ty: 1, .. })
    ));
    assert!(image.load_tile(0, 0).is_ok());
    Ok(())
}

#[test]
fn signals_decoding_errors() -> anyhow::Result<()> {
    let dir = Temp::new_dir()?;
    let dir: &Path = dir.as_ref();

    let garbage = two_by_two()
        .compression(ZLIB)
        .override_tile(0, 0, b"definitely not zlib".to_vec());
    write_gup(&dir.join("zlib.gup"), &[garbage])?;
    let mut image = TiledImage::open(dir.join("zlib.gup"), 0, 0)?;
    assert!(matches!(image.load_tile(0, 0), Err(Error::CorruptTile { .. })));
    assert!(image.load_tile(1, 1).is_ok());

    let unknown = two_by_two().compression(7);
    write_gup(&dir.join("unknown.gup"), &[unknown])?;
    let mut image = TiledImage::open(dir.join("unknown.gup"), 0, 0)?;
    assert!(matches!(
        image.load_tile(0, 0),
        Err(Error::UnsupportedCompression(7))
    ));
    // the stored bytes are still available
    assert!(image.load_compressed_tile(0, 0).is_ok());
    Ok(())
}

#[test]
fn rejects_invalid_headers() -> anyhow::Result<()> {
    let dir = Temp::new_dir()?;
    let dir: &Path = dir.as_ref();
    let good = two_by_two().encode();

    let mut bad_magic = good.clone();
    bad_magic[0] = b'X';
    fs::write(dir.join("magic.gup"), bad_magic)?;
    let err = TiledImage::open(dir.join("magic.gup"), 0, 0).unwrap_err();
    assert!(matches!(err, Error::InvalidImage { offset: 0, .. }));
    assert!(err.is_open_error());

    fs::write(dir.join("short.gup"), &good[..30])?;
    assert!(matches!(
        TiledImage::open(dir.join("short.gup"), 0, 0),
        Err(Error::InvalidImage { .. })
    ));

    // index cut off
    fs::write(dir.join("index.gup"), &good[..14 + 64 + 20])?;
    assert!(matches!(
        TiledImage::open(dir.join("index.gup"), 0, 0),
        Err(Error::InvalidImage { .. })
    ));

    let mut small_info = good.clone();
    small_info[14..18].copy_from_slice(&40u32.to_le_bytes());
    fs::write(dir.join("info.gup"), small_info)?;
    assert!(matches!(
        TiledImage::open(dir.join("info.gup"), 0, 0),
        Err(Error::InvalidImage { .. })
    ));

    let mut zero_tiles = good;
    zero_tiles[14 + 40 + 12..14 + 40 + 16].copy_from_slice(&0u32.to_le_bytes());
    fs::write(dir.join("tiles.gup"), zero_tiles)?;
    assert!(matches!(
        TiledImage::open(dir.join("tiles.gup"), 0, 0),
        Err(Error::InvalidImage { .. })
    ));

    assert!(matches!(
        TiledImage::open(dir.join("absent.gup"), 0, 0),
        Err(Error::Io(_))
    ));
    Ok(())
}

#[test]
fn walks_chained_image_entries() -> anyhow::Result<()> {
    let dir = Temp::new_dir()?;
    let path = AsRef::<Path>::as_ref(&dir).join("map.gup");
    let entries = [
        two_by_two().seed(1),
        EntrySpec::new(256, 256, (128, 128)).seed(2).compression(ZLIB),
        EntrySpec::new(128, 100, (64, 64)).seed(3).top_down(true),
    ];
    let offsets = write_gup(&path, &entries)?;

    let first = open_image_entry(&path, 0)?;
    assert_eq!(first.next_image_offset(), offsets[1]);

    let mut second = open_image_entry(&path, 1)?;
    assert_eq!(second.index(), 1);
    assert_eq!(second.offset(), offsets[1]);
    assert_eq!((second.num_tiles_x(), second.num_tiles_y()), (2, 2));
    assert_tile_matches(&mut second, &entries[1], 1, 1);

    let mut third = open_image_entry(&path, 2)?;
    assert_eq!(third.offset(), offsets[2]);
    assert_eq!((third.real_width(), third.real_height()), (128, 128));
    assert_tile_matches(&mut third, &entries[2], 1, 1);

    assert!(matches!(
        open_image_entry(&path, 5),
        Err(Error::ImageEntryNotFound { index: 5, found: 3 })
    ));
    Ok(())
}

#[test]
fn clones_reopen_the_file() -> anyhow::Result<()> {
    let dir = Temp::new_dir()?;
    let path = AsRef::<Path>::as_ref(&dir).join("map.gup");
    let spec = two_by_two().seed(4);
    write_gup(&path, &[spec.clone()])?;

    let mut image = TiledImage::open(&path, 0, 0)?;
    let mut copy = image.try_clone()?;
    assert_eq!(copy.tile_index(), image.tile_index());
    assert_eq!(copy.info_header(), image.info_header());

    assert_tile_matches(&mut image, &spec, 1, 1);
    assert_tile_matches(&mut copy, &spec, 0, 0);
    assert_tile_matches(&mut image, &spec, 0, 1);
    assert_tile_matches(&mut copy, &spec, 1, 0);
    Ok(())
}

#[test]
fn treats_non_positive_index_entries_as_missing() -> anyhow::Result<()> {
    let dir = Temp::new_dir()?;
    let path = AsRef::<Path>::as_ref(&dir).join("map.gup");
    let spec = EntrySpec::new(384, 256, (128, 128))
        .patch_index(0, 0, Some(-16), None)
        .patch_index(1, 0, None, Some(0))
        .patch_index(2, 0, None, Some(-1))
        .patch_index(0, 1, Some(0), None);
    write_gup(&path, &[spec.clone()])?;

    let mut image = TiledImage::open(&path, 0, 0)?;
    for (tx, ty) in [(0, 0), (1, 0), (2, 0), (0, 1)] {
        assert!(
            matches!(image.load_tile(tx, ty), Err(Error::MissingTile { .. })),
            "tile ({tx}, {ty})"
        );
        assert!(matches!(
            image.load_compressed_tile(tx, ty),
            Err(Error::MissingTile { .. })
        ));
    }
    assert_tile_matches(&mut image, &spec, 1, 1);
    assert_tile_matches(&mut image, &spec, 2, 1);
    Ok(())
}
