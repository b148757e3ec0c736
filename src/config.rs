use anyhow::Result;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;
use std::net::SocketAddr;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub publish: PublishConfig,
    pub fleet: FleetConfig,
    pub battery: BatteryConfig,
    pub vehicle: VehicleConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}
impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PublishConfig {
    /// Per-battery destination is `topic_prefix` + battery id.
    pub topic_prefix: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FleetConfig {
    pub battery_count: u32,
    pub tick_seconds: u64,
    /// Base seed for the driving-profile walks; each battery derives its own
    /// offset. Unset means entropy-seeded.
    pub rng_seed: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BatteryConfig {
    pub capacity_kwh: f64,
    pub nominal_voltage_v: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VehicleConfig {
    pub weight_kg: f64,
    pub drag_coefficient: f64,
    pub width_m: f64,
    pub height_m: f64,
    pub tire_rolling_resistance: f64,
    pub max_wheel_speed_mps: f64,
}

impl Config {
    pub fn load() -> Result<Self> {
        let figment = Figment::new()
            .merge(Toml::file("config/default.toml"))
            .merge(Env::prefixed("FLEETSIM__").split("__"));
        Ok(figment.extract()?)
    }

    /// Startup validation; a bad configuration prevents any battery loop
    /// from starting.
    pub fn validate(&self) -> Result<()> {
        if self.battery.capacity_kwh <= 0.0 {
            anyhow::bail!("battery.capacity_kwh must be positive");
        }
        if self.battery.nominal_voltage_v <= 0.0 {
            anyhow::bail!("battery.nominal_voltage_v must be positive");
        }
        if self.fleet.battery_count == 0 {
            anyhow::bail!("fleet.battery_count must be at least 1");
        }
        if self.fleet.tick_seconds == 0 {
            anyhow::bail!("fleet.tick_seconds must be at least 1");
        }
        Ok(())
    }
}
