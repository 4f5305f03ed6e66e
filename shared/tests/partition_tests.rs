//! Partitioning properties on rectangular, triangular and geographic parcels

use geo::{polygon, Area};
use proptest::prelude::*;
use shared::{area_hectares, partition, Crs, Parcel};

fn projected(polygon: geo::Polygon<f64>) -> Parcel {
    Parcel::new(Crs::Projected { epsg: 32720 }, vec![polygon])
}

// =============================================================================
// Rectangular parcels
// =============================================================================

mod rectangle {
    use super::*;

    #[test]
    fn hundred_hectares_into_sixteen_equal_zones() {
        let parcel = projected(polygon![
            (x: 0.0, y: 0.0),
            (x: 1000.0, y: 0.0),
            (x: 1000.0, y: 1000.0),
            (x: 0.0, y: 1000.0),
        ]);
        let zones = partition(&parcel, 16);
        assert_eq!(zones.len(), 16);
        for zone in &zones {
            assert!((zone.area_ha - 6.25).abs() < 1e-6, "zone {} = {}", zone.id, zone.area_ha);
        }
        let total: f64 = zones.iter().map(|z| z.area_ha).sum();
        assert!((total - area_hectares(&parcel)[0]).abs() < 1e-6);
    }

    #[test]
    fn ids_follow_scan_order() {
        let parcel = projected(polygon![
            (x: 0.0, y: 0.0),
            (x: 300.0, y: 0.0),
            (x: 300.0, y: 300.0),
            (x: 0.0, y: 300.0),
        ]);
        let zones = partition(&parcel, 9);
        let ids: Vec<u32> = zones.iter().map(|z| z.id).collect();
        assert_eq!(ids, (1..=9).collect::<Vec<_>>());
        // row-major: x grows first, then y
        assert!(zones[1].centroid.x > zones[0].centroid.x);
        assert!(zones[3].centroid.y > zones[0].centroid.y);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        /// Requesting rows × cols zones on a rectangle yields exactly that many equal zones
        #[test]
        fn prop_even_grid_conserves_area(side in 1u32..=7, width in 50.0f64..5000.0, height in 50.0f64..5000.0) {
            let n = side * side;
            let parcel = projected(polygon![
                (x: 0.0, y: 0.0),
                (x: width, y: 0.0),
                (x: width, y: height),
                (x: 0.0, y: height),
            ]);
            let zones = partition(&parcel, n);
            prop_assert_eq!(zones.len() as u32, n);

            let expected = width * height / 10_000.0 / n as f64;
            for zone in &zones {
                prop_assert!((zone.area_ha - expected).abs() <= expected * 1e-6);
            }
            let total: f64 = zones.iter().map(|z| z.area_ha).sum();
            prop_assert!((total - width * height / 10_000.0).abs() <= total * 1e-6);
        }
    }
}

// =============================================================================
// Triangular and concave parcels
// =============================================================================

mod triangle {
    use super::*;

    #[test]
    fn thirty_two_zones_cover_the_triangle() {
        let triangle = polygon![(x: 0.0, y: 0.0), (x: 800.0, y: 0.0), (x: 0.0, y: 600.0)];
        let parcel = projected(triangle.clone());
        let zones = partition(&parcel, 32);

        assert!(!zones.is_empty());
        assert!(zones.len() <= 32);
        for zone in &zones {
            assert!(!zone.geometry.0.is_empty());
            assert!(zone.area_ha > 0.0);
            assert!(zone.geometry.unsigned_area() > 0.0);
        }

        // 32 of the 6×6 cells are attempted; the 4 skipped ones lie beyond the hypotenuse
        let total: f64 = zones.iter().map(|z| z.area_ha).sum();
        let triangle_ha = triangle.unsigned_area() / 10_000.0;
        assert!((total - triangle_ha).abs() < 1e-6);
    }

    #[test]
    fn cells_beyond_the_hypotenuse_are_dropped() {
        let parcel = projected(polygon![(x: 0.0, y: 0.0), (x: 400.0, y: 0.0), (x: 0.0, y: 400.0)]);
        // 4×4 grid: the 6 cells strictly above the diagonal never touch the triangle
        let zones = partition(&parcel, 16);
        assert_eq!(zones.len(), 10);
        let total: f64 = zones.iter().map(|z| z.area_ha).sum();
        assert!((total - 8.0).abs() < 1e-6);
    }
}

// =============================================================================
// Geographic parcels
// =============================================================================

mod geographic {
    use super::*;

    #[test]
    fn degree_areas_use_the_planar_constant() {
        let parcel = Parcel::new(
            Crs::Geographic,
            vec![polygon![
                (x: -60.00, y: -33.00),
                (x: -59.99, y: -33.00),
                (x: -59.99, y: -32.99),
                (x: -60.00, y: -32.99),
            ]],
        );
        let area = area_hectares(&parcel)[0];
        assert!((area - 123.21).abs() < 1e-3);

        let zones = partition(&parcel, 4);
        assert_eq!(zones.len(), 4);
        let total: f64 = zones.iter().map(|z| z.area_ha).sum();
        assert!((total - area).abs() < 1e-3);
    }
}
