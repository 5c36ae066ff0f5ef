/// Station registry for the irradiance QC service.
///
/// Defines the radiometric stations this service has been run against,
/// with the metadata the external solar-position routine needs (location,
/// altitude, timezone) and the surface defaults substituted for missing
/// pressure and temperature. Config files can add stations or override
/// registry entries; `resolve_station` is the single lookup path.

use crate::config::StationConfig;

// ---------------------------------------------------------------------------
// Networks
// ---------------------------------------------------------------------------

/// Baseline Surface Radiation Network.
pub const NETWORK_BSRN: &str = "BSRN";

/// Southern African Universities Radiometric Network.
pub const NETWORK_SAURAN: &str = "SAURAN";

/// Surface pressure substituted when a minute has none, in Pa.
pub const DEFAULT_PRESSURE_PA: f64 = 87_324.65;

/// Air temperature substituted when a minute has none, in °C.
pub const DEFAULT_TEMPERATURE_C: f64 = 18.0;

// ---------------------------------------------------------------------------
// Station metadata
// ---------------------------------------------------------------------------

/// Metadata for a single radiometric station.
#[derive(Debug, Clone, PartialEq)]
pub struct Station {
    /// Network station abbreviation, e.g. "DAA".
    pub id: String,
    pub name: String,
    pub network: String,
    /// WGS84 latitude.
    pub latitude: f64,
    /// WGS84 longitude.
    pub longitude: f64,
    /// Altitude above mean sea level, metres.
    pub altitude_m: f64,
    /// IANA zone the logger clock runs in, e.g. "Etc/GMT+2".
    pub timezone: String,
    pub default_pressure_pa: f64,
    pub default_temperature_c: f64,
}

struct StationEntry {
    id: &'static str,
    name: &'static str,
    network: &'static str,
    latitude: f64,
    longitude: f64,
    altitude_m: f64,
    timezone: &'static str,
}

impl StationEntry {
    fn to_station(&self) -> Station {
        Station {
            id: self.id.to_string(),
            name: self.name.to_string(),
            network: self.network.to_string(),
            latitude: self.latitude,
            longitude: self.longitude,
            altitude_m: self.altitude_m,
            timezone: self.timezone.to_string(),
            default_pressure_pa: DEFAULT_PRESSURE_PA,
            default_temperature_c: DEFAULT_TEMPERATURE_C,
        }
    }
}

/// Built-in stations.
static STATION_REGISTRY: &[StationEntry] = &[
    StationEntry {
        id: "DAA",
        name: "De Aar, South Africa",
        network: NETWORK_BSRN,
        latitude: -30.6667,
        longitude: 23.9930,
        altitude_m: 1287.0,
        timezone: "Etc/GMT+2",
    },
    StationEntry {
        id: "SUN",
        name: "Stellenbosch University, South Africa",
        network: NETWORK_SAURAN,
        latitude: -33.92810059,
        longitude: 18.86540031,
        altitude_m: 119.0,
        timezone: "Etc/GMT+2",
    },
];

/// Returns the ids of all built-in stations.
pub fn all_station_ids() -> Vec<&'static str> {
    STATION_REGISTRY.iter().map(|s| s.id).collect()
}

/// Returns the built-in stations belonging to a network.
pub fn stations_for_network(network: &str) -> Vec<Station> {
    STATION_REGISTRY
        .iter()
        .filter(|s| s.network.eq_ignore_ascii_case(network))
        .map(StationEntry::to_station)
        .collect()
}

/// Looks up a built-in station by id. Returns `None` if not found.
pub fn find_station(id: &str) -> Option<Station> {
    STATION_REGISTRY
        .iter()
        .find(|s| s.id.eq_ignore_ascii_case(id))
        .map(StationEntry::to_station)
}

impl From<&StationConfig> for Station {
    fn from(config: &StationConfig) -> Self {
        Station {
            id: config.id.clone(),
            name: config.name.clone(),
            network: config.network.clone(),
            latitude: config.latitude,
            longitude: config.longitude,
            altitude_m: config.altitude_m,
            timezone: config.timezone.clone(),
            default_pressure_pa: config.default_pressure_pa.unwrap_or(DEFAULT_PRESSURE_PA),
            default_temperature_c: config
                .default_temperature_c
                .unwrap_or(DEFAULT_TEMPERATURE_C),
        }
    }
}

/// Looks a station up in the config first, then the built-in registry.
pub fn resolve_station(id: &str, configured: &[StationConfig]) -> Option<Station> {
    configured
        .iter()
        .find(|s| s.id.eq_ignore_ascii_case(id))
        .map(Station::from)
        .or_else(|| find_station(id))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
