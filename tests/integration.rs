use deep_volume::curve::{ColorCurve, FloatCurve, NonMonotonicPolicy, ResampleOptions};
use deep_volume::deep::{DeepImageError, DeepPixelGrid};
use deep_volume::geom::{Color, Point3, Ray, Tolerance, Transform, Vec3};
use deep_volume::volume::{
    FieldInterp, FieldMapping, FrustumMapping, MatrixMapping, UniformMappingIntersection,
    VolumeError, VoxelBufferInfo, VoxelGrid, VoxelVolume,
};

const WIDTH: usize = 4;
const HEIGHT: usize = 3;

/// Beer-Lambert falloff sampled at integer depths `0..=10`.
fn falloff(density: f64) -> ColorCurve {
    let mut curve = ColorCurve::new();
    for step in 0..=10 {
        let depth = f64::from(step);
        curve.add_sample(depth, Color::splat((-density * depth).exp()));
    }
    curve
}

fn filled_grid() -> DeepPixelGrid {
    let mut grid = DeepPixelGrid::with_size(WIDTH, HEIGHT).expect("grid");
    grid.set_num_samples(16).expect("sample budget");
    let curves: Vec<ColorCurve> = (0..WIDTH * HEIGHT)
        .map(|i| falloff(0.1 * f64::from(u32::try_from(i + 1).unwrap())))
        .collect();
    let diag = grid.set_pixels(&curves).expect("fill");
    assert_eq!(diag.pixel_count, WIDTH * HEIGHT);
    assert_eq!(diag.non_monotonic_pixel_count, 0);
    assert!(diag.warnings.is_empty());
    grid
}

#[test]
fn deep_grid_lookup_follows_transmittance() {
    let grid = filled_grid();
    let tol = Tolerance::LOOSE;

    for y in 0..HEIGHT {
        for x in 0..WIDTH {
            let curve = grid.pixel_function(x, y).expect("pixel");
            assert_eq!(curve.num_samples(), 16);

            let (rs_x, rs_y) = (f64::from(x as u32), f64::from(y as u32));
            assert!(tol.approx_eq_f64(grid.lookup(rs_x, rs_y, 0.0).r, 1.0));

            let mut previous = f64::INFINITY;
            for step in 0..=24 {
                let value = grid.lookup(rs_x, rs_y, f64::from(step) * 0.5).r;
                assert!((0.0..=1.0 + 1e-12).contains(&value));
                assert!(value <= previous + 1e-12);
                previous = value;
            }
        }
    }

    // Past the last source sample the curve holds its final value.
    let density = 0.1;
    let far = grid.lookup(0.0, 0.0, 50.0).r;
    assert!(tol.approx_eq_f64(far, (-density * 10.0_f64).exp()));
}

#[test]
fn deep_grid_filters_between_pixels() {
    let grid = filled_grid();
    let depth = 3.0;
    let left = grid.lookup(0.0, 0.0, depth).r;
    let right = grid.lookup(1.0, 0.0, depth).r;
    let between = grid.lookup(0.5, 0.0, depth).r;

    assert!(right < left);
    assert!(Tolerance::LOOSE.approx_eq_f64(between, 0.5 * (left + right)));
}

#[test]
fn deep_grid_serves_concurrent_lookups() {
    let grid = filled_grid();
    let expected: Vec<f64> = (0..8)
        .map(|i| grid.lookup(1.5, 1.25, f64::from(i)).g)
        .collect();

    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                for (i, want) in expected.iter().enumerate() {
                    let got = grid.lookup(1.5, 1.25, f64::from(i as u32)).g;
                    assert_eq!(got.to_bits(), want.to_bits());
                }
            });
        }
    });
}

#[test]
fn deep_grid_reports_non_monotonic_pixels() {
    let mut grid = DeepPixelGrid::with_size(2, 1).expect("grid");
    let mut bumpy = ColorCurve::new();
    bumpy.add_sample(0.0, Color::ONE);
    bumpy.add_sample(1.0, Color::splat(0.3));
    bumpy.add_sample(2.0, Color::splat(0.6));

    let diag = grid
        .set_pixels(&[falloff(0.5), bumpy.clone()])
        .expect("fill");
    assert_eq!(diag.non_monotonic_pixel_count, 1);
    assert_eq!(diag.warnings.len(), 1);
    assert!(diag.warnings[0].starts_with("pixel (1, 0)"));
    assert_eq!(grid.lookup(1.0, 0.0, 0.0), Color::ZERO);

    grid.set_resample_options(
        ResampleOptions::new(8).with_non_monotonic(NonMonotonicPolicy::UniformDepth),
    )
    .expect("options");
    let diag = grid.set_pixel(1, 0, &bumpy).expect("pixel");
    assert!(diag.fallback_used());
    assert_eq!(grid.lookup(1.0, 0.0, 0.0), Color::ONE);
    assert_eq!(grid.lookup(1.0, 0.0, 2.0), Color::splat(0.6));
}

#[test]
fn deep_grid_rejects_bad_coordinates() {
    let mut grid = DeepPixelGrid::with_size(2, 2).expect("grid");
    assert!(matches!(
        grid.set_pixel(2, 0, &falloff(1.0)),
        Err(DeepImageError::PixelOutOfBounds { x: 2, .. })
    ));
    assert!(matches!(
        grid.pixel_function(0, 9),
        Err(DeepImageError::PixelOutOfBounds { y: 9, .. })
    ));
}

#[test]
fn deep_grid_statistics_report() {
    let grid = filled_grid();
    let stats = grid.statistics();
    assert_eq!(stats.total_samples, WIDTH * HEIGHT * 16);
    assert_eq!(stats.average_samples_per_pixel, 16.0);

    let report = stats.to_string();
    assert!(report.contains("Average # samples per pixel: 16"));
    assert!(report.contains("Approximate memory use:"));
}

#[test]
fn float_curve_behaves_as_piecewise_linear_function() {
    let mut curve = FloatCurve::new();
    curve.add_sample(1.0, 10.0);
    curve.add_sample(0.0, 5.0);
    curve.add_sample(2.0, 0.0);

    assert_eq!(curve.interpolate(0.5), 7.5);
    assert_eq!(curve.interpolate(1.5), 5.0);
    assert_eq!(curve.interpolate(-3.0), 5.0);
    assert_eq!(curve.interpolate(3.0), 0.0);
}

#[test]
fn volume_bounds_for_matrix_mapping() {
    let mapping = MatrixMapping::from_bounds(
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(4.0, 2.0, 2.0),
        [40, 20, 20],
    )
    .expect("mapping");
    let volume =
        VoxelVolume::with_buffer(VoxelBufferInfo::new("density", mapping.into())).expect("volume");

    let ray = Ray::new(Point3::new(-1.0, 1.0, 1.0), Vec3::X);
    let hits = volume.intersect(&ray, 0.0).expect("buffer present");
    assert_eq!(hits.len(), 1);
    let tol = Tolerance::new(1e-9);
    assert!(tol.approx_eq_f64(hits[0].t_min, 1.0));
    assert!(tol.approx_eq_f64(hits[0].t_max, 5.0));

    let miss = Ray::new(Point3::new(-1.0, 5.0, 1.0), Vec3::X);
    assert!(volume.intersect(&miss, 0.0).expect("buffer present").is_empty());
}

#[test]
fn matrix_volume_samples_along_hit_span() {
    let mapping = MatrixMapping::from_bounds(
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(8.0, 1.0, 1.0),
        [8, 2, 2],
    )
    .expect("mapping");
    let [nx, ny, nz] = mapping.resolution();
    // Density rises by one per voxel along x.
    let data: Vec<f64> = (0..nx * ny * nz)
        .map(|idx| f64::from(u32::try_from(idx % nx).expect("small grid")))
        .collect();
    let grid = VoxelGrid::new(&data, mapping.resolution()).expect("grid");
    let handler = UniformMappingIntersection::new(&mapping);

    let ray = Ray::new(Point3::new(-2.0, 0.5, 0.5), Vec3::X);
    let hits = handler.intersect(&ray, 0.0);
    assert_eq!(hits.len(), 1);
    let tol = Tolerance::new(1e-9);
    assert!(tol.approx_eq_f64(hits[0].t_min, 2.0));
    assert!(tol.approx_eq_f64(hits[0].t_max, 10.0));

    let to_voxel = handler.world_to_voxel();
    for t in [4.0, 5.25, 7.5] {
        let vs_p = to_voxel.apply_point(ray.at(t));
        let expected = t - 2.5;
        for interp in [FieldInterp::Trilinear, FieldInterp::Tricubic] {
            assert!(tol.approx_eq_f64(interp.sample(&grid, vs_p), expected));
        }
    }
}

#[test]
fn volume_bounds_for_camera_frustum() {
    let camera = Transform::translate(Vec3::new(0.0, 0.0, 5.0));
    let mapping = FrustumMapping::perspective(
        camera,
        std::f64::consts::FRAC_PI_2,
        1.0,
        1.0,
        4.0,
        [32, 32, 16],
    )
    .expect("frustum");
    let volume =
        VoxelVolume::with_buffer(VoxelBufferInfo::new("fog", FieldMapping::from(mapping)))
            .expect("volume");

    // Straight down the view axis from the camera position.
    let ray = Ray::new(Point3::new(0.0, 0.0, 5.0), -Vec3::Z);
    let hits = volume.intersect(&ray, 0.0).expect("buffer present");
    assert_eq!(hits.len(), 1);
    let tol = Tolerance::new(1e-9);
    assert!(tol.approx_eq_f64(hits[0].t_min, 1.0));
    assert!(tol.approx_eq_f64(hits[0].t_max, 4.0));

    // Sideways, far outside the field of view.
    let side = Ray::new(Point3::new(0.0, 50.0, 3.0), Vec3::X);
    assert!(volume.intersect(&side, 0.0).expect("buffer present").is_empty());
}

#[test]
fn volume_errors_are_distinct() {
    let empty = VoxelVolume::new();
    let ray = Ray::new(Point3::ORIGIN, Vec3::Z);
    assert_eq!(empty.intersect(&ray, 0.0), Err(VolumeError::MissingBuffer));

    assert_eq!(
        VoxelVolume::with_buffer(VoxelBufferInfo::unmapped("density")).err(),
        Some(VolumeError::MissingMapping)
    );
    assert_eq!(
        VoxelVolume::with_buffer(VoxelBufferInfo::new("density", FieldMapping::Null)).err(),
        Some(VolumeError::UnsupportedMapping { kind: "null" })
    );
}
