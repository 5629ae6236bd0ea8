// 🗺️ Shapefile Layer Mappings
// Entity field → .dbf attribute label or geometry label

use crate::shapefile_import::LayerMapping;

/// tz_world_mp: one multipolygon per zone id.
pub fn timezone_mapping() -> LayerMapping {
    LayerMapping::new(&[("tzid", "TZID"), ("geometry", "POLYGON")])
}

/// Natural Earth populated places.
pub fn city_mapping() -> LayerMapping {
    LayerMapping::new(&[
        ("name", "NAME"),
        ("sov0", "SOV0NAME"),
        ("adm0", "ADM0NAME"),
        ("adm1", "ADM1NAME"),
        ("timezone", "TIMEZONE"),
        ("geometry", "POINT"),
        ("worldcity", "WORLDCITY"),
        ("megacity", "MEGACITY"),
        ("meganame", "MEGANAME"),
    ])
}
