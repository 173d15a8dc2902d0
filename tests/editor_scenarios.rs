use lumaedit::components::crop::{CropInteraction, CropRect};
use lumaedit::components::history::{DEFAULT_MAX_HISTORY, HistoryManager};
use lumaedit::io::{self, SaveFormat};
use lumaedit::ops::adjustments::{FilterSettings, apply_filters};
use lumaedit::ops::transform::{FlipAxis, RotateDirection};
use lumaedit::{DecodeError, Editor, PixelBuffer};

fn patterned(w: u32, h: u32) -> PixelBuffer {
    let mut buf = PixelBuffer::new(w, h);
    for y in 0..h {
        for x in 0..w {
            buf.put_pixel(x, y, [(x * 13) as u8, (y * 29) as u8, (x ^ y) as u8, 200 + (x % 50) as u8]);
        }
    }
    buf
}

fn loaded(buf: PixelBuffer) -> Editor {
    let mut editor = Editor::default();
    editor.load_buffer(buf);
    editor
}

#[test]
fn grayscale_red_image_becomes_76() {
    let mut editor = loaded(PixelBuffer::filled(4, 4, [255, 0, 0, 255]));
    assert!(editor.set_grayscale(true));
    assert_eq!(editor.display().dimensions(), (4, 4));
    for px in editor.display().as_raw().chunks_exact(4) {
        assert_eq!(px, [76, 76, 76, 255]);
    }
    // The source is never touched by filters.
    assert_eq!(editor.source().unwrap().pixel(3, 3), Some([255, 0, 0, 255]));
}

#[test]
fn one_pixel_crop_of_two_by_two() {
    let mut buf = PixelBuffer::new(2, 2);
    buf.put_pixel(0, 0, [1, 2, 3, 4]);
    buf.put_pixel(1, 0, [5, 6, 7, 8]);
    buf.put_pixel(0, 1, [9, 10, 11, 12]);
    buf.put_pixel(1, 1, [13, 14, 15, 16]);
    let out = buf.crop(&CropRect { x: 0.0, y: 0.0, width: 1.0, height: 1.0 });
    assert_eq!(out.dimensions(), (1, 1));
    assert_eq!(out.as_raw(), &[1, 2, 3, 4]);
}

#[test]
fn resize_with_nan_is_a_noop() {
    let mut editor = loaded(patterned(100, 100));
    let before = editor.source().cloned();
    assert!(!editor.resize_image(f64::NAN, 100.0));
    assert_eq!(editor.dimensions(), Some((100, 100)));
    assert_eq!(editor.source().cloned(), before);
    assert!(!editor.can_undo());
}

#[test]
fn undo_redo_inverse_law() {
    let mut editor = loaded(patterned(12, 7));
    let s0 = (editor.source().cloned(), editor.settings());

    editor.rotate_90(RotateDirection::Right);
    editor.set_contrast(-80);
    let s1 = (editor.source().cloned(), editor.settings());
    let d1 = editor.display().clone();

    assert!(editor.undo());
    assert_eq!((editor.source().cloned(), editor.settings()), s0);
    assert_eq!(editor.display(), &patterned(12, 7));

    assert!(editor.redo());
    assert_eq!((editor.source().cloned(), editor.settings()), s1);
    assert_eq!(editor.display(), &d1);
    assert!(!editor.can_redo());
}

#[test]
fn history_bound_keeps_most_recent() {
    let mut editor = loaded(patterned(3, 3));
    for i in 0..35 {
        editor.set_brightness(i);
        editor.commit_filters();
        assert!(editor.history().undo_count() <= DEFAULT_MAX_HISTORY);
    }
    assert_eq!(editor.history().undo_count(), DEFAULT_MAX_HISTORY);
    let kept: Vec<i16> = editor
        .history()
        .undo_entries()
        .map(|cp| cp.settings().brightness())
        .collect();
    let expected: Vec<i16> = (15..35).collect();
    assert_eq!(kept, expected);

    let mut h = HistoryManager::default();
    for i in 0..21u8 {
        h.checkpoint(&PixelBuffer::filled(1, 1, [i; 4]), &FilterSettings::default(), "edit");
    }
    assert_eq!(h.undo_count(), 20);
}

#[test]
fn filter_reapplication_is_idempotent() {
    let src = patterned(31, 17);
    for settings in [
        FilterSettings::new(true, 0, 0),
        FilterSettings::new(false, -200, 255),
        FilterSettings::new(true, 77, -130),
    ] {
        assert_eq!(apply_filters(&src, &settings), apply_filters(&src, &settings));
    }

    let mut editor = loaded(src.clone());
    editor.set_brightness(90);
    editor.set_brightness(-90);
    editor.set_brightness(0);
    assert_eq!(editor.display(), &src);
}

#[test]
fn flip_and_rotate_round_trip() {
    let src = patterned(9, 5);
    for axis in [FlipAxis::Horizontal, FlipAxis::Vertical] {
        let mut editor = loaded(src.clone());
        editor.flip(axis);
        assert_ne!(editor.source(), Some(&src));
        editor.flip(axis);
        assert_eq!(editor.source(), Some(&src));
    }

    let mut editor = loaded(src.clone());
    editor.rotate_90(RotateDirection::Left);
    assert_eq!(editor.dimensions(), Some((5, 9)));
    editor.rotate_90(RotateDirection::Right);
    assert_eq!(editor.source(), Some(&src));
}

#[test]
fn crop_drag_never_breaks_bounds() {
    let mut crop = CropInteraction::default();
    crop.enter(120, 90);
    let mut seed: u64 = 0x2545_F491_4F6C_DD1D;
    let mut next = || {
        seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        ((seed >> 33) % 400) as f64 - 200.0
    };
    for _ in 0..500 {
        let rect = crop.rect().unwrap();
        let grab = [
            (rect.x, rect.y + rect.height / 2.0),
            (rect.right(), rect.y + rect.height / 2.0),
            (rect.x + rect.width / 2.0, rect.y),
            (rect.x + rect.width / 2.0, rect.bottom()),
        ];
        let (gx, gy) = grab[(next().abs() as usize) % 4];
        if crop.pointer_down(gx, gy).is_some() {
            let r = crop.pointer_move(gx + next(), gy + next()).unwrap();
            assert!(r.width >= 20.0 && r.height >= 20.0);
            assert!(r.x >= 0.0 && r.y >= 0.0);
            assert!(r.right() <= 120.0 && r.bottom() <= 90.0);
            crop.pointer_up();
        }
    }
}

#[test]
fn failed_load_leaves_state_untouched() {
    let mut editor = Editor::default();
    assert!(editor.load_bytes(b"garbage").is_err());
    assert!(!editor.has_image());

    editor.load_buffer(patterned(6, 6));
    editor.flip(FlipAxis::Horizontal);
    let source = editor.source().cloned();
    let undo = editor.history().undo_count();

    let result = editor.finish_load(Err(DecodeError::WorkerDisconnected));
    assert!(matches!(result, Err(DecodeError::WorkerDisconnected)));
    assert_eq!(editor.source().cloned(), source);
    assert_eq!(editor.history().undo_count(), undo);
}

#[test]
fn background_load_then_export() {
    let src = patterned(8, 6);
    let png = io::encode_image(&src, SaveFormat::Png, 90).unwrap();

    let mut editor = Editor::default();
    let pending = io::spawn_decode(png);
    editor.finish_load(pending.wait()).unwrap();
    assert_eq!(editor.source(), Some(&src));

    editor.set_grayscale(true);
    let exported = editor.export(SaveFormat::Png, 90).unwrap();
    let back = io::decode_image(&exported).unwrap();
    assert_eq!(&back, editor.display());
}

#[test]
fn crop_through_editor_events() {
    let mut editor = loaded(patterned(50, 40));
    editor.enter_crop();
    assert!(editor.crop_pointer_down(25.0, 0.0).is_some());
    editor.crop_pointer_move(25.0, 10.0);
    editor.crop_pointer_up();
    assert!(editor.commit_crop());
    assert_eq!(editor.dimensions(), Some((50, 30)));
    assert_eq!(editor.source().unwrap().pixel(0, 0), patterned(50, 40).pixel(0, 10));

    assert!(editor.undo());
    assert_eq!(editor.dimensions(), Some((50, 40)));
}

#[test]
fn fractional_left_edge_drag_keeps_last_column_opaque() {
    let mut editor = loaded(PixelBuffer::filled(100, 40, [10, 20, 30, 255]));
    editor.enter_crop();
    assert!(editor.crop_pointer_down(0.0, 20.0).is_some());
    let rect = editor.crop_pointer_move(10.5, 20.0).unwrap();
    assert_eq!((rect.x, rect.width), (10.5, 89.5));
    editor.crop_pointer_up();
    assert!(editor.commit_crop());

    let out = editor.source().unwrap();
    assert_eq!(out.dimensions(), (90, 40));
    assert_eq!(out.pixel(0, 0), Some([10, 20, 30, 255]));
    assert_eq!(out.pixel(89, 0), Some([10, 20, 30, 255]));
    assert_eq!(out.pixel(89, 38), Some([10, 20, 30, 255]));
    // Only the overhang of the final row runs past the end of the source.
    assert_eq!(out.pixel(89, 39), Some([0, 0, 0, 0]));
}
