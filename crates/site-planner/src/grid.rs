//! Viewport grid sampling

use suitability_core::{GeoPoint, Viewport};

/// Sample an evenly spaced `steps × steps` grid over the viewport, edges included.
///
/// Points are emitted row-major: latitude south→north outer, longitude
/// west→east inner. The index of each point becomes its candidate id, so
/// the order must stay stable for a given viewport.
pub fn sample_grid(viewport: &Viewport, steps: usize) -> Vec<GeoPoint> {
    if steps == 0 {
        return Vec::new();
    }

    let lat_range = viewport.north - viewport.south;
    let lng_range = viewport.east - viewport.west;

    let (lat_step, lng_step) = if steps > 1 {
        let divisions = (steps - 1) as f64;
        (lat_range / divisions, lng_range / divisions)
    } else {
        (lat_range, lng_range)
    };

    let mut points = Vec::with_capacity(steps * steps);
    for i in 0..steps {
        let lat = viewport.south + lat_step * i as f64;
        for j in 0..steps {
            let lng = viewport.west + lng_step * j as f64;
            points.push(GeoPoint::new(lat, lng));
        }
    }
    points
}
