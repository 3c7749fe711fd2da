//! End-to-end tests driving registered nodes the way a host runtime does.

use image::{DynamicImage, GrayImage, Luma};
use imgproc_nodes::prelude::*;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn run(node: &mut NodeInstance, inputs: Vec<(&str, Value)>) -> Result<StatusCode, ExecutionError> {
    for (name, value) in inputs {
        node.bind_input(name, value)?;
    }
    node.execute()
}

fn configured(registry: &NodeRegistry, id: &str, params: &[(&str, Value)]) -> NodeInstance {
    let mut node = registry.instantiate(id).unwrap();
    for (name, value) in params {
        node.set_parameter(name, value.clone()).unwrap();
    }
    node.configure().unwrap();
    node
}

fn image_output(node: &mut NodeInstance, port: &str) -> Mat {
    match node.take_output(port) {
        Some(Value::Image(mat)) => mat,
        other => panic!("expected image on {}, got {:?}", port, other),
    }
}

#[test]
fn test_swap_split_add_normalize() {
    init_logging();
    let registry = NodeRegistry::with_builtins().unwrap();

    let rgb = Mat::from_u8(
        2,
        2,
        3,
        vec![10, 20, 30, 40, 50, 60, 70, 80, 90, 100, 0, 5],
    )
    .unwrap();

    let mut swap = configured(
        &registry,
        "cvt_color",
        &[("flag", Value::Integer(ColorConversion::RGB2BGR))],
    );
    run(&mut swap, vec![("input", Value::Image(rgb))]).unwrap();
    let bgr = image_output(&mut swap, "out");
    assert_eq!(bgr.as_u8().unwrap(), &[30, 20, 10, 60, 50, 40, 90, 80, 70, 5, 0, 100]);

    let mut splitter = configured(&registry, "channel_splitter", &[]);
    run(&mut splitter, vec![("input", Value::Image(bgr))]).unwrap();
    let blue = image_output(&mut splitter, "out_0");
    let green = image_output(&mut splitter, "out_1");
    assert_eq!(blue.shape(), (2, 2, 1));

    let mut add = configured(&registry, "add_image", &[]);
    run(
        &mut add,
        vec![("a", Value::Image(blue)), ("b", Value::Image(green))],
    )
    .unwrap();
    let sum = image_output(&mut add, "out");
    assert_eq!(sum.as_u8().unwrap(), &[50, 110, 170, 5]);

    let mut normalize = configured(&registry, "abs_normalized", &[]);
    run(&mut normalize, vec![("input", Value::Image(sum))]).unwrap();
    let out = image_output(&mut normalize, "out");

    assert_eq!(out.shape(), (2, 2, 1));
    assert_eq!(out.depth(), Depth::F32);
    let expected = [100.0 / 170.0, 220.0 / 170.0, 2.0, 10.0 / 170.0];
    for (got, want) in out.as_f32().unwrap().iter().zip(expected) {
        assert!((got - want).abs() < 1e-6, "{} != {}", got, want);
    }
}

#[test]
fn test_fan_out_with_cloned_instances() {
    let registry = NodeRegistry::with_builtins().unwrap();
    let mut first = configured(&registry, "add_integer", &[]);
    let mut second = first.clone();

    assert_ne!(first.id(), second.id());
    assert!(second.is_configured());

    run(&mut first, vec![("a", Value::Integer(1)), ("b", Value::Integer(2))]).unwrap();
    run(&mut second, vec![("a", Value::Integer(10)), ("b", Value::Integer(20))]).unwrap();
    assert_eq!(first.output_as::<i64>("out"), Ok(&3));
    assert_eq!(second.output_as::<i64>("out"), Ok(&30));
}

#[test]
fn test_global_registry_instantiates_builtins() {
    let registry = NodeRegistry::global().read();
    for id in ["cvt_color", "channel_splitter", "sobel", "add_float", "abs_normalized"] {
        let node = registry.instantiate(id).unwrap();
        assert_eq!(node.node_type(), id);
        assert!(!node.is_configured());
    }
    assert!(matches!(
        registry.instantiate("gaussian_blur"),
        Err(RegistryError::NodeNotFound(_))
    ));
}

#[test]
fn test_sobel_defaults_smooth() {
    let registry = NodeRegistry::with_builtins().unwrap();
    let mut sobel = configured(&registry, "sobel", &[]);

    let input = Mat::filled(4, 3, 1, Depth::U8, 10.0).unwrap();
    run(&mut sobel, vec![("input", Value::Image(input))]).unwrap();
    let out = image_output(&mut sobel, "out");

    assert_eq!(out.depth(), Depth::F32);
    assert!(out.as_f32().unwrap().iter().all(|&v| v == 160.0));
}

#[test]
fn test_sobel_matches_imageproc_interior() {
    let gray = GrayImage::from_fn(7, 5, |x, y| Luma([((x * 37 + y * 11) % 251) as u8]));
    let reference = imageproc::gradients::horizontal_sobel(&gray);

    let registry = NodeRegistry::with_builtins().unwrap();
    let mut sobel = configured(&registry, "sobel", &[("x", Value::Integer(1))]);
    let input = Mat::from_dynamic(&DynamicImage::ImageLuma8(gray)).unwrap();
    run(&mut sobel, vec![("input", Value::Image(input))]).unwrap();
    let out = image_output(&mut sobel, "out");

    for y in 1..4 {
        for x in 1..6 {
            let ours = out.sample(x, y, 0).unwrap().abs();
            let theirs = f64::from(reference.get_pixel(x, y)[0]).abs();
            assert_eq!(ours, theirs, "mismatch at ({}, {})", x, y);
        }
    }
}

#[test]
fn test_png_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rgb.png");

    let original = Mat::from_u8(3, 2, 3, (0..18).map(|v| v * 13).collect()).unwrap();
    original.to_dynamic().unwrap().save(&path).unwrap();

    let loaded = Mat::from_dynamic(&image::open(&path).unwrap()).unwrap();
    assert_eq!(loaded, original);
}

#[test]
fn test_json_parameters_then_execute() {
    let registry = NodeRegistry::with_builtins().unwrap();
    let mut sobel = registry.instantiate("sobel").unwrap();
    sobel
        .set_parameters_json(&serde_json::json!({ "x": 0, "y": 1, "ksize": 3 }))
        .unwrap();
    sobel.configure().unwrap();

    // Horizontal stripes have a vertical gradient only.
    let stripes = Mat::from_u8(3, 3, 1, vec![0, 0, 0, 10, 10, 10, 20, 20, 20]).unwrap();
    run(&mut sobel, vec![("input", Value::Image(stripes))]).unwrap();
    let out = image_output(&mut sobel, "out");
    assert_eq!(out.sample(1, 1, 0), Some(80.0));
}
