//! End-to-end assembly tests against real acquisition folders written to
//! temporary directories.

use std::fs;
use std::num::NonZeroUsize;
use std::path::Path;

use ndarray::s;
use tempfile::TempDir;
use tiff::encoder::{TiffEncoder, colortype};
use zstack_volume::error::StackError;
use zstack_volume::metadata::AcquisitionParameters;
use zstack_volume::scale::PhysicalScale;
use zstack_volume::stack_loader::{CancelToken, Diagnostic, LoadOptions, StackLoader};

const DESCRIPTOR: &str =
    r#"{"dz(um)": 1.0, "sensor_pixel_size_um": 6.5, "objective": {"magnification": 20.0}}"#;

fn acquisition_folder() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("acquisition parameters.json"), DESCRIPTOR).unwrap();
    fs::create_dir(dir.path().join("0")).unwrap();
    dir
}

fn image_folder(dir: &TempDir) -> std::path::PathBuf {
    dir.path().join("0")
}

fn write_slice(folder: &Path, z: i64, channel: &str, width: usize, height: usize, value: u16) {
    let name = format!("scan_region0_t0_{z}_plane_{channel}.tiff");
    let file = fs::File::create(folder.join(name)).unwrap();
    let mut encoder = TiffEncoder::new(file).unwrap();
    let data = vec![value; width * height];
    encoder
        .write_image::<colortype::Gray16>(width as u32, height as u32, &data)
        .unwrap();
}

fn factor(n: usize) -> NonZeroUsize {
    NonZeroUsize::new(n).unwrap()
}

#[test]
fn assembles_one_stack_per_channel_with_matching_shapes() {
    let dir = acquisition_folder();
    let images = image_folder(&dir);
    for z in 0..3 {
        write_slice(&images, z, "488_nm_Ex", 8, 6, 100 + z as u16);
        write_slice(&images, z, "561_nm_Ex", 8, 6, 200 + z as u16);
    }

    let assembled = StackLoader::load_from_folder(dir.path(), &LoadOptions::default()).unwrap();

    let channels: Vec<&String> = assembled.stacks.keys().collect();
    assert_eq!(channels, ["488_nm_Ex", "561_nm_Ex"]);
    assert_eq!(assembled.plan, vec![0, 1, 2]);
    for stack in assembled.stacks.values() {
        assert_eq!(stack.dim(), (3, 6, 8));
    }
    assert_eq!(assembled.stacks["488_nm_Ex"][[2, 0, 0]], 102.0);
    assert_eq!(assembled.stacks["561_nm_Ex"][[0, 5, 7]], 200.0);
    assert!(assembled.diagnostics.is_empty());
}

#[test]
fn missing_slice_leaves_a_zero_plane_and_one_diagnostic() {
    let dir = acquisition_folder();
    let images = image_folder(&dir);
    for z in [4, 5, 6] {
        write_slice(&images, z, "561_nm_Ex", 4, 4, 50);
    }
    // 488_nm_Ex has no file at z=5.
    write_slice(&images, 4, "488_nm_Ex", 4, 4, 10);
    write_slice(&images, 6, "488_nm_Ex", 4, 4, 30);

    let assembled = StackLoader::load_from_folder(dir.path(), &LoadOptions::default()).unwrap();

    let stack = &assembled.stacks["488_nm_Ex"];
    assert_eq!(assembled.plan, vec![4, 5, 6]);
    assert!(stack.slice(s![1, .., ..]).iter().all(|&v| v == 0.0));
    assert!(stack.slice(s![0, .., ..]).iter().all(|&v| v == 10.0));
    assert!(stack.slice(s![2, .., ..]).iter().all(|&v| v == 30.0));

    let missing: Vec<&Diagnostic> = assembled
        .diagnostics
        .iter()
        .filter(|diagnostic| {
            matches!(
                diagnostic,
                Diagnostic::MissingSlice { z_index: 5, channel } if channel == "488_nm_Ex"
            )
        })
        .collect();
    assert_eq!(missing.len(), 1);
}

#[test]
fn crop_applies_before_binning_and_shrinks_the_planes() {
    let dir = acquisition_folder();
    let images = image_folder(&dir);
    for z in 0..2 {
        write_slice(&images, z, "488_nm_Ex", 10, 10, 300);
    }

    let options = LoadOptions {
        xy_binning: factor(2),
        crop_size: Some(factor(8)),
        ..LoadOptions::default()
    };
    let assembled = StackLoader::load_from_folder(dir.path(), &options).unwrap();

    let stack = &assembled.stacks["488_nm_Ex"];
    assert_eq!(stack.dim(), (2, 4, 4));
    // Constant input stays constant through block-mean binning.
    assert!(stack.iter().all(|&v| v == 300.0));
}

#[test]
fn z_range_and_downsample_select_the_documented_subsequence() {
    let dir = acquisition_folder();
    let images = image_folder(&dir);
    for z in 0..10 {
        write_slice(&images, z, "488_nm_Ex", 4, 4, 1);
    }

    let options = LoadOptions {
        z_downsample: factor(3),
        z_range: Some((1, 9)),
        ..LoadOptions::default()
    };
    let assembled = StackLoader::load_from_folder(dir.path(), &options).unwrap();

    assert_eq!(assembled.plan, vec![1, 4, 7]);
    assert_eq!(assembled.stacks["488_nm_Ex"].dim(), (3, 4, 4));
}

#[test]
fn empty_selection_fails_before_allocation() {
    let dir = acquisition_folder();
    let images = image_folder(&dir);
    write_slice(&images, 0, "488_nm_Ex", 4, 4, 1);

    let options = LoadOptions {
        z_range: Some((100, 200)),
        ..LoadOptions::default()
    };
    let err = StackLoader::load_from_folder(dir.path(), &options).unwrap_err();
    assert!(matches!(err, StackError::EmptySelection));
}

#[test]
fn folder_with_no_usable_images_is_an_empty_selection() {
    let dir = acquisition_folder();
    let err = StackLoader::load_from_folder(dir.path(), &LoadOptions::default()).unwrap_err();
    assert!(matches!(err, StackError::EmptySelection));
}

#[test]
fn mismatched_slice_dimensions_abort_the_request() {
    let dir = acquisition_folder();
    let images = image_folder(&dir);
    write_slice(&images, 0, "488_nm_Ex", 4, 4, 1);
    write_slice(&images, 1, "488_nm_Ex", 6, 6, 1);

    let err = StackLoader::load_from_folder(dir.path(), &LoadOptions::default()).unwrap_err();
    assert!(matches!(err, StackError::InconsistentDimensions));
}

#[test]
fn rgb_images_are_rejected_as_unsupported() {
    let dir = acquisition_folder();
    let images = image_folder(&dir);
    let file = fs::File::create(images.join("scan_region0_t0_0_plane_488_nm_Ex.tiff")).unwrap();
    let mut encoder = TiffEncoder::new(file).unwrap();
    let data = vec![128u8; 4 * 4 * 3];
    encoder.write_image::<colortype::RGB8>(4, 4, &data).unwrap();

    let err = StackLoader::load_from_folder(dir.path(), &LoadOptions::default()).unwrap_err();
    assert!(matches!(err, StackError::UnsupportedSampleFormat(_)));
}

#[test]
fn hidden_and_malformed_files_are_skipped_not_fatal() {
    let dir = acquisition_folder();
    let images = image_folder(&dir);
    write_slice(&images, 0, "488_nm_Ex", 4, 4, 7);
    fs::write(images.join("._scan_region0_t0_0_plane_488_nm_Ex.tiff"), b"junk").unwrap();
    fs::write(images.join("notes.tiff"), b"not an image").unwrap();

    let assembled = StackLoader::load_from_folder(dir.path(), &LoadOptions::default()).unwrap();

    assert_eq!(assembled.stacks.len(), 1);
    assert_eq!(
        assembled
            .diagnostics
            .iter()
            .filter(|d| matches!(d, Diagnostic::SkippedFile { filename, .. } if filename == "notes.tiff"))
            .count(),
        1
    );
    // The hidden sidecar never enters the scan, so it produces no diagnostic.
    assert_eq!(assembled.diagnostics.len(), 1);
}

#[test]
fn oversized_crop_aborts_the_request() {
    let dir = acquisition_folder();
    let images = image_folder(&dir);
    write_slice(&images, 0, "488_nm_Ex", 4, 4, 1);

    let options = LoadOptions {
        crop_size: Some(factor(64)),
        ..LoadOptions::default()
    };
    let err = StackLoader::load_from_folder(dir.path(), &options).unwrap_err();
    assert!(matches!(err, StackError::CropTooLarge { size: 64, .. }));
}

#[test]
fn cancelled_token_aborts_the_assembly() {
    let dir = acquisition_folder();
    let images = image_folder(&dir);
    for z in 0..4 {
        write_slice(&images, z, "488_nm_Ex", 4, 4, 1);
    }

    let cancel = CancelToken::new();
    cancel.cancel();
    let err =
        StackLoader::load_from_folder_with_cancel(dir.path(), &LoadOptions::default(), &cancel)
            .unwrap_err();
    assert!(matches!(err, StackError::Cancelled));
}

#[test]
fn metadata_loads_and_scales_for_the_request_factors() {
    let dir = acquisition_folder();
    let params = AcquisitionParameters::load(dir.path()).unwrap();
    let scale = PhysicalScale::from_parameters(&params, factor(2), factor(3)).unwrap();
    assert_eq!(scale.pixel_size_um, 0.65);
    assert_eq!(scale.z_spacing_um, 3.0);
}

#[test]
fn metadata_not_found_names_the_expected_path() {
    let dir = TempDir::new().unwrap();
    let err = AcquisitionParameters::load(dir.path()).unwrap_err();
    match err {
        StackError::MetadataNotFound(path) => {
            assert!(path.ends_with("acquisition parameters.json"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn malformed_metadata_is_reported() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("acquisition parameters.json"),
        r#"{"dz(um)": "not a number"}"#,
    )
    .unwrap();
    let err = AcquisitionParameters::load(dir.path()).unwrap_err();
    assert!(matches!(err, StackError::MetadataMalformed(_)));
}
