//! Great-circle distance and the delivery radius check built on it.

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn distance_to(&self, other: &Coordinates) -> f64 {
        distance_km(self.latitude, self.longitude, other.latitude, other.longitude)
    }
}

/// Haversine distance in kilometers between two points.
pub fn distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    // Rounding can push `a` a hair past 1.0 for antipodal points.
    let c = 2.0 * a.sqrt().min(1.0).asin();

    (EARTH_RADIUS_KM * c).max(0.0)
}

/// Inclusive distance threshold for in-house delivery.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeliveryRadius {
    max_distance_km: f64,
}

impl DeliveryRadius {
    pub fn new(max_distance_km: f64) -> Self {
        Self { max_distance_km }
    }

    pub fn max_distance_km(&self) -> f64 {
        self.max_distance_km
    }

    pub fn is_deliverable(&self, distance_km: f64) -> bool {
        distance_km <= self.max_distance_km
    }
}

impl Default for DeliveryRadius {
    fn default() -> Self {
        Self::new(7.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_points_are_zero_apart() {
        assert_eq!(distance_km(-23.5505, -46.6333, -23.5505, -46.6333), 0.0);
    }

    #[test]
    fn antipodal_points_are_half_the_circumference_apart() {
        let d = distance_km(0.0, 0.0, 0.0, 180.0);
        assert!((d - 20015.09).abs() < 0.1, "got {d}");
    }

    #[test]
    fn one_degree_of_latitude_is_about_111_km() {
        let d = distance_km(0.0, 0.0, 1.0, 0.0);
        assert!((d - 111.19).abs() < 0.01, "got {d}");
    }

    #[test]
    fn distance_is_symmetric() {
        let a = Coordinates::new(-23.5505, -46.6333);
        let b = Coordinates::new(-23.5614, -46.6559);
        assert_eq!(a.distance_to(&b), b.distance_to(&a));
    }

    #[test]
    fn radius_boundary_is_inclusive() {
        let radius = DeliveryRadius::default();
        assert!(radius.is_deliverable(0.0));
        assert!(radius.is_deliverable(7.0));
        assert!(!radius.is_deliverable(7.01));
        assert!(!radius.is_deliverable(11.0));
    }
}
