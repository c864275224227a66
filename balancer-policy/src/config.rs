use envconfig::Envconfig;

use crate::error::Result;
use crate::policy::BalancerPolicy;
use crate::threshold::ImbalanceThreshold;
use crate::types::CapacityLimit;

#[derive(Envconfig, Clone, Debug)]
pub struct Config {
    #[envconfig(default = "topology.json")]
    pub snapshot_path: String,

    // "adaptive" or a fixed chunk-count gap
    #[envconfig(default = "adaptive")]
    pub balance_threshold: ImbalanceThreshold,

    // Percentage of max_size_bytes a receiver must keep free
    #[envconfig(default = "0")]
    pub capacity_headroom_percent: u8,

    #[envconfig(default = "false")]
    pub balanced_last_round: bool,

    #[envconfig(default = "false")]
    pub log_json: bool,
}

impl Config {
    pub fn init_with_defaults() -> Result<Self> {
        Ok(Config::init_from_env()?)
    }

    pub fn policy(&self) -> Result<BalancerPolicy> {
        let capacity = CapacityLimit::new(self.capacity_headroom_percent)?;
        Ok(BalancerPolicy::new(self.balance_threshold, capacity))
    }
}
